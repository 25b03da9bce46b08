use clap::builder::styling::{AnsiColor, Styles};
use clap::{ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::Path;

use grassmod::commands;
use grassmod::commands::bench::BenchArgs;
use grassmod::commands::describe::DescribeArgs;
use grassmod::commands::list::ListArgs;
use grassmod::commands::resolve::ResolveArgs;
use grassmod::commands::run::RunArgs;
use grassmod::config::GrassmodConfig;
use grassmod::output::{ColorMode, OutputFormat};
use grassmod::session::Session;

#[derive(Parser)]
#[command(name = "grassmod")]
#[command(about = "Browse, resolve and run GRASS GIS modules by namespace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Human-friendly output with colors and formatting
    #[arg(long, global = true, conflicts_with = "compact")]
    pretty: bool,

    /// Compact output without colors (overrides TTY detection)
    #[arg(long, global = true, conflicts_with = "pretty")]
    compact: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List command groups, or the commands in one group
    List(ListArgs),

    /// Show the full command a short name resolves to
    Resolve(ResolveArgs),

    /// Run a module: grassmod run r.info map=elevation -r
    Run(RunArgs),

    /// Show a module's options and flags
    Describe(DescribeArgs),

    /// Time module call overhead across invocation strategies
    Bench(BenchArgs),
}

/// Help output styling.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().bold())
    .usage(AnsiColor::Green.on_default().bold())
    .literal(AnsiColor::Cyan.on_default().bold())
    .placeholder(AnsiColor::Cyan.on_default());

/// Determine color choice for help output.
/// Checks args, config, and NO_COLOR before parsing since --help may exit early.
fn help_color_choice() -> ColorChoice {
    if std::env::var("NO_COLOR").is_ok() {
        return ColorChoice::Never;
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--compact") {
        return ColorChoice::Never;
    }
    if args.iter().any(|a| a == "--pretty") {
        return ColorChoice::Always;
    }

    let config = GrassmodConfig::load(Path::new("."));
    match config.pretty.colors {
        Some(ColorMode::Always) => ColorChoice::Always,
        Some(ColorMode::Never) => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Reset SIGPIPE to default behavior so piping to `head` etc. doesn't panic.
#[cfg(unix)]
fn reset_sigpipe() {
    // SAFETY: libc::signal is a standard POSIX function; this only changes
    // the disposition of SIGPIPE back to terminate-on-broken-pipe.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}

fn main() {
    reset_sigpipe();

    let matches = Cli::command()
        .styles(HELP_STYLES)
        .color(help_color_choice())
        .get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    grassmod::logging::init(cli.verbose);

    // Loaded again now that config warnings have somewhere to go
    let config = GrassmodConfig::load(Path::new("."));

    let format = OutputFormat::from_cli(cli.json, cli.pretty, cli.compact, &config.pretty);
    let session = Session::from_config(&config.grass);

    let exit_code = match cli.command {
        Commands::List(args) => commands::list::run(args, &session, &format),
        Commands::Resolve(args) => commands::resolve::run(args, &session, &format),
        Commands::Run(args) => commands::run::run(args, &session, &config.run, &format),
        Commands::Describe(args) => commands::describe::run(args, &session, &format),
        Commands::Bench(args) => commands::bench::run(args, &session, &config.bench, &format),
    };

    std::process::exit(exit_code);
}

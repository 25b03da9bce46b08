//! Run command - invoke a module with GRASS-style arguments.

use crate::config::RunConfig;
use crate::output::OutputFormat;
use crate::session::Session;
use clap::Args;
use grassmod_modules::{InvocationError, Module};
use std::io::Write;

#[derive(Args)]
pub struct RunArgs {
    /// Full command name, e.g. `r.slope.aspect`
    pub command: String,

    /// Module arguments: `key=value`, `-abc`, `--o`, `--q`, `--v`. Put them
    /// after `--` when a flag clashes with grassmod's own (`-v`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Parsed GRASS command-line arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleArgs {
    pub options: Vec<(String, String)>,
    pub flags: String,
    pub overwrite: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl ModuleArgs {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = Self::default();
        for arg in args {
            match arg.as_str() {
                "--o" | "--overwrite" => parsed.overwrite = true,
                "--q" | "--quiet" => parsed.quiet = true,
                "--v" | "--verbose" => parsed.verbose = true,
                s if s.starts_with("--") => return Err(format!("unknown switch: {s}")),
                s if s.starts_with('-') && s.len() > 1 => parsed.flags.push_str(&s[1..]),
                s => match s.split_once('=') {
                    Some((key, value)) if !key.is_empty() => {
                        parsed.options.push((key.to_string(), value.to_string()))
                    }
                    _ => return Err(format!("expected key=value, got `{s}`")),
                },
            }
        }
        Ok(parsed)
    }

    /// Apply to `module`, with `[run]` defaults for the switches.
    pub fn apply(self, module: Module, defaults: &RunConfig) -> Module {
        let module = self
            .options
            .into_iter()
            .fold(module, |m, (key, value)| m.option(key, value));
        let module = if self.flags.is_empty() {
            module
        } else {
            module.flags(&self.flags)
        };
        module
            .overwrite(self.overwrite || defaults.overwrite())
            .quiet(self.quiet || defaults.quiet())
            .verbose(self.verbose)
    }
}

pub fn run(args: RunArgs, session: &Session, defaults: &RunConfig, format: &OutputFormat) -> i32 {
    let parsed = match ModuleArgs::parse(&args.args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    let module = parsed.apply(Module::new(args.command, session.invoker.clone()), defaults);
    tracing::debug!(argv = ?module.argv(), "running");

    match module.run() {
        Ok(output) => {
            if format.is_json() {
                println!("{}", serde_json::to_string(&output).unwrap_or_default());
            } else {
                print!("{}", output.stdout);
                eprint!("{}", output.stderr);
                let _ = std::io::stdout().flush();
            }
            output.code
        }
        Err(InvocationError::Failed { stderr, code, .. }) => {
            eprint!("{stderr}");
            code
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

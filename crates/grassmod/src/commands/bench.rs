//! Bench command - measure module call overhead.
//!
//! Times the same module run several ways: through a namespace shortcut,
//! through a direct handle, as a plain child process, and `true` as the
//! process-start floor.

use super::run::ModuleArgs;
use crate::config::{BenchConfig, RunConfig};
use crate::output::{OutputFormat, OutputFormatter};
use crate::session::Session;
use clap::Args;
use grassmod_modules::{Module, ProcessInvoker, denormalize};
use nu_ansi_term::Color::{Green, Red, Yellow};
use serde::Serialize;
use std::fmt::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[derive(Args)]
pub struct BenchArgs {
    /// Full command name, e.g. `r.simple`
    pub command: String,

    /// Module arguments: `key=value`, `-abc`, `--o`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<String>,

    /// Runs per strategy (default from `[bench] repeat`, else 10)
    #[arg(short = 'n', long)]
    pub repeat: Option<usize>,
}

/// Timings of one strategy, in seconds.
#[derive(Debug, Serialize)]
pub struct StrategyResult {
    pub strategy: &'static str,
    pub runs: usize,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub error: Option<String>,
    /// Set when the strategy cannot run this command at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl StrategyResult {
    fn from_samples(strategy: &'static str, samples: &[Duration]) -> Self {
        let secs: Vec<f64> = samples.iter().map(Duration::as_secs_f64).collect();
        let min = secs.iter().copied().reduce(f64::min);
        let max = secs.iter().copied().reduce(f64::max);
        let mean = (!secs.is_empty()).then(|| secs.iter().sum::<f64>() / secs.len() as f64);
        Self {
            strategy,
            runs: secs.len(),
            min,
            mean,
            max,
            error: None,
            skipped: None,
        }
    }

    fn failed(strategy: &'static str, runs: usize, error: String) -> Self {
        Self {
            strategy,
            runs,
            min: None,
            mean: None,
            max: None,
            error: Some(error),
            skipped: None,
        }
    }

    fn not_applicable(strategy: &'static str, reason: String) -> Self {
        Self {
            strategy,
            runs: 0,
            min: None,
            mean: None,
            max: None,
            error: None,
            skipped: Some(reason),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BenchResult {
    pub command: String,
    pub repeat: usize,
    pub strategies: Vec<StrategyResult>,
}

fn ms(secs: Option<f64>) -> String {
    secs.map_or_else(|| "-".to_string(), |s| format!("{:.2}ms", s * 1000.0))
}

impl BenchResult {
    fn render(&self, colors: bool) -> String {
        let mut out = format!("{} x{}\n", self.command, self.repeat);
        for s in &self.strategies {
            if let Some(reason) = &s.skipped {
                let msg = format!("not applicable: {reason}");
                let msg = if colors { Yellow.paint(msg).to_string() } else { msg };
                let _ = writeln!(out, "  {:<9} {msg}", s.strategy);
                continue;
            }
            match &s.error {
                Some(e) => {
                    let msg = format!("failed after {} runs: {e}", s.runs);
                    let msg = if colors { Red.paint(msg).to_string() } else { msg };
                    let _ = writeln!(out, "  {:<9} {msg}", s.strategy);
                }
                None => {
                    let mean = ms(s.mean);
                    let mean = if colors { Green.paint(mean).to_string() } else { mean };
                    let _ = writeln!(
                        out,
                        "  {:<9} min {:>10}  mean {:>10}  max {:>10}",
                        s.strategy,
                        ms(s.min),
                        mean,
                        ms(s.max)
                    );
                }
            }
        }
        out
    }
}

impl OutputFormatter for BenchResult {
    fn format_text(&self) -> String {
        self.render(false)
    }

    fn format_pretty(&self, colors: bool) -> String {
        self.render(colors)
    }
}

/// Run `f` up to `repeat` times, stopping at the first failure.
fn time<E: std::fmt::Display>(
    strategy: &'static str,
    repeat: usize,
    mut f: impl FnMut() -> Result<(), E>,
) -> StrategyResult {
    let mut samples = Vec::with_capacity(repeat);
    for _ in 0..repeat {
        let start = Instant::now();
        if let Err(e) = f() {
            return StrategyResult::failed(strategy, samples.len(), e.to_string());
        }
        samples.push(start.elapsed());
    }
    StrategyResult::from_samples(strategy, &samples)
}

/// Whether resolving `short` in `prefix` gives back `command`. Subnames
/// containing `_` do not survive the round trip.
fn shortcut_reaches(prefix: &str, short: &str, command: &str) -> bool {
    format!("{prefix}.{}", denormalize(short)) == command
}

/// `Command` with stdout/stderr discarded; fails on non-zero exit.
fn spawn_plain(program: &std::path::Path, args: &[String]) -> Result<(), String> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| e.to_string())?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("exited with {status}"))
    }
}

pub fn run(args: BenchArgs, session: &Session, bench: &BenchConfig, format: &OutputFormat) -> i32 {
    let parsed = match ModuleArgs::parse(&args.params) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    let Some((prefix, short)) = super::split_command(&args.command) else {
        eprintln!("error: `{}` is not a prefixed command name", args.command);
        return 1;
    };
    let repeat = args.repeat.unwrap_or_else(|| bench.repeat()).max(1);
    // Switches are passed exactly as given; `[run]` defaults do not apply
    let no_defaults = RunConfig::default();

    let direct = parsed.clone().apply(Module::new(args.command.as_str(), session.invoker.clone()), &no_defaults);
    let argv = direct.argv();
    let program = ProcessInvoker::for_source(&session.source).locate(&args.command);
    let ns = super::namespace_for(session, prefix);

    tracing::debug!(?argv, repeat, "benchmarking");
    let shortcut = if shortcut_reaches(prefix, &short, &args.command) {
        time("shortcut", repeat, || {
            parsed
                .clone()
                .apply(ns.resolve(&short), &no_defaults)
                .run()
                .map(|_| ())
        })
    } else {
        StrategyResult::not_applicable(
            "shortcut",
            format!("`{short}` resolves to {}", ns.resolve(&short).name()),
        )
    };
    let strategies = vec![
        shortcut,
        time("handle", repeat, || direct.run().map(|_| ())),
        time("process", repeat, || spawn_plain(&program, &argv[1..])),
        time("plain", repeat, || {
            spawn_plain(std::path::Path::new("true"), &[])
        }),
    ];

    let any_failed = strategies.iter().any(|s| s.error.is_some());
    BenchResult {
        command: args.command,
        repeat,
        strategies,
    }
    .print(format);

    if any_failed { 1 } else { 0 }
}

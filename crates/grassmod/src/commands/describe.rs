//! Describe command - show a module's parameters.

use crate::output::{OutputFormat, OutputFormatter};
use crate::session::Session;
use clap::Args;
use grassmod_interface::{ModuleInterface, ParamSpec};
use grassmod_modules::Module;
use nu_ansi_term::Color::{Cyan, Yellow};
use nu_ansi_term::Style;
use serde::Serialize;
use std::fmt::Write;

#[derive(Args)]
pub struct DescribeArgs {
    /// Full command name, e.g. `r.slope.aspect`
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct DescribeResult {
    pub command: String,
    #[serde(flatten)]
    pub interface: ModuleInterface,
}

fn option_line(opt: &ParamSpec) -> String {
    let mut line = format!("{}=<{}>", opt.key, opt.param_type.as_str());
    if opt.multiple {
        line.push_str("[,...]");
    }
    if let Some(default) = &opt.default {
        let _ = write!(line, " (default: {default})");
    }
    if !opt.choices.is_empty() {
        let _ = write!(line, " [{}]", opt.choices.join("|"));
    }
    line
}

impl DescribeResult {
    fn render(&self, colors: bool) -> String {
        let bold = |s: &str| {
            if colors {
                Style::new().bold().paint(s).to_string()
            } else {
                s.to_string()
            }
        };
        let key = |s: String| if colors { Cyan.paint(s).to_string() } else { s };

        let iface = &self.interface;
        let mut out = String::new();
        let summary = iface
            .label
            .as_deref()
            .or(iface.description.as_deref())
            .unwrap_or("");
        let _ = writeln!(out, "{}: {}", bold(&self.command), summary);
        if !iface.keywords.is_empty() {
            let _ = writeln!(out, "keywords: {}", iface.keywords.join(", "));
        }

        let required: Vec<&ParamSpec> = iface.options.iter().filter(|o| o.required).collect();
        let optional: Vec<&ParamSpec> = iface.options.iter().filter(|o| !o.required).collect();
        for (title, group) in [("required", required), ("optional", optional)] {
            if group.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{}:", bold(title));
            for opt in group {
                let desc = opt.label.as_deref().or(opt.description.as_deref()).unwrap_or("");
                let _ = writeln!(out, "  {}  {}", key(option_line(opt)), desc);
            }
        }

        if !iface.flags.is_empty() {
            let _ = writeln!(out, "\n{}:", bold("flags"));
            for flag in &iface.flags {
                let desc = flag.label.as_deref().or(flag.description.as_deref()).unwrap_or("");
                let _ = writeln!(out, "  {}  {}", key(format!("-{}", flag.key)), desc);
            }
        }

        for rule in &iface.rules {
            let line = format!("{}: {}", rule.kind, rule.items.join(", "));
            let line = if colors { Yellow.paint(line).to_string() } else { line };
            let _ = writeln!(out, "rule {line}");
        }
        out
    }
}

impl OutputFormatter for DescribeResult {
    fn format_text(&self) -> String {
        self.render(false)
    }

    fn format_pretty(&self, colors: bool) -> String {
        self.render(colors)
    }
}

pub fn run(args: DescribeArgs, session: &Session, format: &OutputFormat) -> i32 {
    match Module::new(args.command.as_str(), session.invoker.clone()).describe() {
        Ok(interface) => {
            DescribeResult {
                command: args.command,
                interface,
            }
            .print(format);
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

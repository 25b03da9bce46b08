//! List command - show groups or the commands in one namespace.

use crate::output::{OutputFormat, OutputFormatter};
use crate::session::Session;
use clap::Args;
use grassmod_modules::Group;
use nu_ansi_term::Color::{Cyan, Green};
use serde::Serialize;
use std::fmt::Write;

#[derive(Args)]
pub struct ListArgs {
    /// Group prefix or name (`r`, `raster3d`, ...). Lists all groups when omitted.
    pub prefix: Option<String>,

    /// Re-scan installed modules before listing
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub prefix: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub commands: usize,
}

/// Result of `list` without a prefix.
#[derive(Debug, Serialize)]
pub struct GroupsResult {
    pub groups: Vec<GroupSummary>,
    pub total: usize,
}

impl OutputFormatter for GroupsResult {
    fn format_text(&self) -> String {
        let mut out = String::new();
        for g in &self.groups {
            let _ = writeln!(out, "{:<3} {:<14} {:>4}", g.prefix, g.name, g.commands);
        }
        let _ = write!(out, "{} commands", self.total);
        out
    }

    fn format_pretty(&self, colors: bool) -> String {
        let mut out = String::new();
        for g in &self.groups {
            let prefix = format!("{:<3}", g.prefix);
            let prefix = if colors {
                Green.bold().paint(prefix).to_string()
            } else {
                prefix
            };
            let _ = writeln!(
                out,
                "{} {:<14} {:>4}  {}",
                prefix, g.name, g.commands, g.description
            );
        }
        let _ = write!(out, "{} commands installed", self.total);
        out
    }
}

/// Result of `list <prefix>`.
#[derive(Debug, Serialize)]
pub struct MembersResult {
    pub prefix: String,
    pub names: Vec<String>,
}

impl OutputFormatter for MembersResult {
    fn format_text(&self) -> String {
        self.names.join("\n")
    }

    fn format_pretty(&self, colors: bool) -> String {
        let mut out = String::new();
        for name in &self.names {
            if colors {
                let _ = writeln!(out, "{}", Cyan.paint(name));
            } else {
                let _ = writeln!(out, "{name}");
            }
        }
        let _ = write!(out, "{} commands in {}", self.names.len(), self.prefix);
        out
    }
}

pub fn run(args: ListArgs, session: &Session, format: &OutputFormat) -> i32 {
    if args.refresh {
        if let Err(e) = session.registry().refresh() {
            eprintln!("error: {e}");
            return 1;
        }
    }

    match args.prefix {
        Some(prefix) => {
            let ns = super::namespace_for(session, &prefix);
            match ns.enumerate() {
                Ok(members) => {
                    MembersResult {
                        prefix: ns.prefix().to_string(),
                        names: members.collect(),
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
        None => match session.registry().ensure_populated() {
            Ok(set) => {
                let groups = Group::ALL
                    .iter()
                    .map(|g| GroupSummary {
                        prefix: g.prefix(),
                        name: g.name(),
                        description: g.description(),
                        commands: set.with_prefix(&format!("{}.", g.prefix())).len(),
                    })
                    .collect();
                GroupsResult {
                    groups,
                    total: set.len(),
                }
                .print(format);
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        },
    }
}

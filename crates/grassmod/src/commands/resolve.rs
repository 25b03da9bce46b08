//! Resolve command - map a short name to its full command.

use crate::output::{OutputFormat, OutputFormatter};
use crate::session::Session;
use clap::Args;
use nu_ansi_term::Color::{Green, Red, Yellow};
use serde::Serialize;

#[derive(Args)]
pub struct ResolveArgs {
    /// Group prefix or name (`v`, `vector`)
    pub prefix: String,

    /// Short name, e.g. `slope_aspect` or `import_`
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResult {
    pub name: String,
    pub command: String,
    /// `None` when the installed commands could not be listed.
    pub registered: Option<bool>,
}

impl ResolveResult {
    fn status(&self) -> &'static str {
        match self.registered {
            Some(true) => "registered",
            Some(false) => "not registered",
            None => "unknown",
        }
    }
}

impl OutputFormatter for ResolveResult {
    fn format_text(&self) -> String {
        format!("{} ({})", self.command, self.status())
    }

    fn format_pretty(&self, colors: bool) -> String {
        if !colors {
            return self.format_text();
        }
        let status = match self.registered {
            Some(true) => Green.paint(self.status()),
            Some(false) => Red.paint(self.status()),
            None => Yellow.paint(self.status()),
        };
        format!("{} → {} ({})", self.name, self.command, status)
    }
}

pub fn run(args: ResolveArgs, session: &Session, format: &OutputFormat) -> i32 {
    let ns = super::namespace_for(session, &args.prefix);
    let handle = ns.resolve(&args.name);

    let (registered, exit_code) = match ns.lookup(&args.name) {
        Ok(found) => (Some(found.is_some()), 0),
        Err(e) => {
            eprintln!("error: {e}");
            (None, 1)
        }
    };

    // The resolved name is still printed when discovery fails
    ResolveResult {
        name: args.name,
        command: handle.name().to_string(),
        registered,
    }
    .print(format);
    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_output() {
        let result = ResolveResult {
            name: "import_".to_string(),
            command: "v.import".to_string(),
            registered: Some(true),
        };
        assert_eq!(result.format_text(), "v.import (registered)");

        let unknown = ResolveResult {
            registered: None,
            ..result
        };
        assert_eq!(unknown.format_text(), "v.import (unknown)");
    }
}

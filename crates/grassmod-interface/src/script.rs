//! Parser for the `#%` block format.
//!
//! Format characteristics:
//! - Blocks open with `#%module`, `#%option`, `#%flag` or `#%rules`, optionally
//!   followed by a standard definition name (`#%option G_OPT_R_OUTPUT`)
//! - Attributes are `#% name: value` lines inside a block
//! - Every block closes with `#%end`
//! - Anything else (shebang, `# MODULE:` banner, code) is ignored, except that
//!   the banner's module name is picked up when present

use crate::standard::{standard_flag, standard_option};
use crate::{FlagSpec, InterfaceError, ModuleInterface, ParamSpec, ParamType, Rule};
use regex::Regex;
use std::sync::LazyLock;

static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#%([a-z]+)(?:\s+(\S+))?\s*$").expect("valid block regex"));
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#%\s+([A-Za-z_]+)\s*:\s?(.*)$").expect("valid attribute regex"));
static BANNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*MODULE:\s*(\S+)").expect("valid banner regex"));

/// Block currently being filled.
enum Block {
    Module,
    Option(ParamSpec),
    Flag(PendingFlag),
    Rules(Vec<Rule>),
}

/// Flag key is validated when the block closes, so collect it as text first.
#[derive(Default)]
struct PendingFlag {
    key: Option<String>,
    label: Option<String>,
    description: Option<String>,
    standard: Option<String>,
}

/// Parse `--script` output (or a Python module header) into a [`ModuleInterface`].
pub fn parse_script(text: &str) -> Result<ModuleInterface, InterfaceError> {
    let mut iface = ModuleInterface::default();
    let mut open: Option<(usize, Block)> = None;
    let mut saw_module = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();

        if !line.starts_with("#%") {
            if iface.name.is_none() {
                if let Some(caps) = BANNER_RE.captures(line) {
                    let name = caps[1].trim_end_matches("_wrapper");
                    iface.name = Some(name.to_string());
                }
            }
            continue;
        }

        if let Some(caps) = BLOCK_RE.captures(line) {
            let directive = &caps[1];
            let standard = caps.get(2).map(|m| m.as_str());

            if directive == "end" {
                let Some((start, block)) = open.take() else {
                    return Err(InterfaceError::Malformed {
                        line: line_no,
                        text: line.to_string(),
                    });
                };
                close_block(&mut iface, start, block)?;
                continue;
            }

            if open.is_some() {
                return Err(InterfaceError::Unclosed {
                    line: line_no,
                    directive: directive.to_string(),
                });
            }

            let block = match (directive, standard) {
                ("module", _) => {
                    saw_module = true;
                    Block::Module
                }
                ("option", None) => Block::Option(ParamSpec::default()),
                ("option", Some(name)) => Block::Option(standard_option(name).ok_or_else(|| {
                    InterfaceError::UnknownStandard {
                        line: line_no,
                        name: name.to_string(),
                    }
                })?),
                ("flag", None) => Block::Flag(PendingFlag::default()),
                ("flag", Some(name)) => {
                    let flag = standard_flag(name).ok_or_else(|| InterfaceError::UnknownStandard {
                        line: line_no,
                        name: name.to_string(),
                    })?;
                    Block::Flag(PendingFlag {
                        key: Some(flag.key.to_string()),
                        label: flag.label,
                        description: flag.description,
                        standard: flag.standard,
                    })
                }
                ("rules", _) => Block::Rules(Vec::new()),
                (other, _) => {
                    return Err(InterfaceError::UnknownBlock {
                        line: line_no,
                        name: other.to_string(),
                    });
                }
            };
            open = Some((line_no, block));
            continue;
        }

        let Some(caps) = ATTR_RE.captures(line) else {
            return Err(InterfaceError::Malformed {
                line: line_no,
                text: line.to_string(),
            });
        };
        let Some((_, block)) = open.as_mut() else {
            return Err(InterfaceError::Orphan { line: line_no });
        };
        apply_attribute(&mut iface, block, &caps[1], caps[2].trim());
    }

    if let Some((start, _)) = open {
        return Err(InterfaceError::Unterminated { line: start });
    }
    if !saw_module {
        return Err(InterfaceError::NoModule);
    }

    Ok(iface)
}

fn apply_attribute(iface: &mut ModuleInterface, block: &mut Block, name: &str, value: &str) {
    let text = || Some(value.to_string());
    match block {
        Block::Module => match name {
            "description" => iface.description = text(),
            "label" => iface.label = text(),
            "keyword" => iface.keywords.push(value.to_string()),
            // Older modules list keywords comma-separated in one attribute
            "keywords" => iface
                .keywords
                .extend(split_list(value).map(str::to_string)),
            _ => {}
        },
        Block::Option(spec) => match name {
            "key" => spec.key = value.to_string(),
            "type" => {
                spec.param_type = match value {
                    "integer" => ParamType::Integer,
                    "double" | "float" => ParamType::Double,
                    _ => ParamType::String,
                }
            }
            "required" => spec.required = is_yes(value),
            "multiple" => spec.multiple = is_yes(value),
            "key_desc" => spec.key_desc = text(),
            "label" => spec.label = text(),
            "description" => spec.description = text(),
            "answer" => spec.default = text(),
            "options" => spec.choices = split_list(value).map(str::to_string).collect(),
            "gisprompt" => spec.gisprompt = text(),
            _ => {}
        },
        Block::Flag(flag) => match name {
            "key" => flag.key = text(),
            "label" => flag.label = text(),
            "description" => flag.description = text(),
            _ => {}
        },
        Block::Rules(rules) => rules.push(Rule {
            kind: name.to_string(),
            items: split_list(value).map(str::to_string).collect(),
        }),
    }
}

fn close_block(iface: &mut ModuleInterface, start: usize, block: Block) -> Result<(), InterfaceError> {
    match block {
        Block::Module => {}
        Block::Option(spec) => {
            if spec.key.is_empty() {
                return Err(InterfaceError::MissingKey {
                    line: start,
                    kind: "option",
                });
            }
            iface.options.push(spec);
        }
        Block::Flag(flag) => {
            let Some(key_text) = flag.key else {
                return Err(InterfaceError::MissingKey {
                    line: start,
                    kind: "flag",
                });
            };
            let mut chars = key_text.chars();
            let (Some(key), None) = (chars.next(), chars.next()) else {
                return Err(InterfaceError::BadFlagKey {
                    line: start,
                    key: key_text,
                });
            };
            iface.flags.push(FlagSpec {
                key,
                label: flag.label,
                description: flag.description,
                standard: flag.standard,
            });
        }
        Block::Rules(rules) => iface.rules.extend(rules),
    }
    Ok(())
}

fn is_yes(value: &str) -> bool {
    matches!(value, "yes" | "y" | "true" | "1")
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_option_with_override() {
        let script = "#%module\n#% description: demo\n#%end\n#%option G_OPT_R_OUTPUT\n#% required: no\n#% key: result\n#%end\n";
        let iface = parse_script(script).unwrap();
        let opt = &iface.options[0];
        assert_eq!(opt.key, "result");
        assert!(!opt.required);
        assert_eq!(opt.standard.as_deref(), Some("G_OPT_R_OUTPUT"));
    }

    #[test]
    fn test_flag_key_must_be_single_char() {
        let script = "#%module\n#%end\n#%flag\n#% key: ab\n#%end\n";
        assert_eq!(
            parse_script(script),
            Err(InterfaceError::BadFlagKey {
                line: 3,
                key: "ab".to_string()
            })
        );
    }

    #[test]
    fn test_unclosed_block() {
        let script = "#%module\n#% description: x\n#%option\n#% key: input\n#%end\n";
        assert_eq!(
            parse_script(script),
            Err(InterfaceError::Unclosed {
                line: 3,
                directive: "option".to_string()
            })
        );
    }

    #[test]
    fn test_unterminated_block() {
        let script = "#%module\n#% description: x\n";
        assert_eq!(
            parse_script(script),
            Err(InterfaceError::Unterminated { line: 1 })
        );
    }

    #[test]
    fn test_attribute_outside_block() {
        let script = "#% description: stray\n#%module\n#%end\n";
        assert_eq!(parse_script(script), Err(InterfaceError::Orphan { line: 1 }));
    }

    #[test]
    fn test_missing_module_block() {
        let script = "#%option\n#% key: input\n#%end\n";
        assert_eq!(parse_script(script), Err(InterfaceError::NoModule));
    }

    #[test]
    fn test_unknown_standard_reported_with_line() {
        let script = "#%module\n#%end\n#%option G_OPT_BOGUS\n#%end\n";
        assert_eq!(
            parse_script(script),
            Err(InterfaceError::UnknownStandard {
                line: 3,
                name: "G_OPT_BOGUS".to_string()
            })
        );
    }

    #[test]
    fn test_rules_block() {
        let script = "#%module\n#%end\n#%rules\n#% exclusive: slope, aspect\n#% required: slope,aspect,pcurvature\n#%end\n";
        let iface = parse_script(script).unwrap();
        assert_eq!(iface.rules.len(), 2);
        assert_eq!(iface.rules[0].kind, "exclusive");
        assert_eq!(iface.rules[0].items, vec!["slope", "aspect"]);
        assert_eq!(iface.rules[1].items.len(), 3);
    }
}

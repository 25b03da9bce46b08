//! Parse GRASS module interface descriptions.
//!
//! Every GRASS module can describe its own parameters. `r.slope.aspect --script`
//! prints a block-structured header that Python modules also use as their
//! parser definition:
//!
//! ```text
//! #%module
//! #% description: Generates raster maps of slope, aspect, curvatures ...
//! #% keyword: raster
//! #%end
//! #%option G_OPT_R_ELEV
//! #%end
//! #%flag
//! #% key: a
//! #% description: Do not align the current region to the raster elevation map
//! #%end
//! ```
//!
//! Blocks may reference standard options (`G_OPT_R_INPUT`), which are expanded
//! before the block's own attributes are applied.
//!
//! # Example
//!
//! ```ignore
//! use grassmod_interface::parse_script;
//!
//! let iface = parse_script(&script_text)?;
//! println!("required: {:?}", iface.required());
//! ```

mod script;
mod standard;

pub use script::parse_script;
pub use standard::{standard_flag, standard_option};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parsed description of a module's command-line interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleInterface {
    /// Module name, when the header carries one (`# MODULE: r.slope.aspect`)
    pub name: Option<String>,
    /// Short label
    pub label: Option<String>,
    /// Module description
    pub description: Option<String>,
    /// Keywords, in declaration order
    pub keywords: Vec<String>,
    /// Key/value options
    pub options: Vec<ParamSpec>,
    /// Single-character flags
    pub flags: Vec<FlagSpec>,
    /// Relations between options and flags (`exclusive`, `requires`, ...)
    pub rules: Vec<Rule>,
}

impl ModuleInterface {
    /// Keys of required options, in declaration order.
    pub fn required(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| o.required)
            .map(|o| o.key.as_str())
            .collect()
    }

    pub fn option(&self, key: &str) -> Option<&ParamSpec> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn flag(&self, key: char) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.key == key)
    }
}

/// Value type of an option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Double,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
        }
    }
}

/// A `key=value` option.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParamSpec {
    /// Option key (e.g., "elevation")
    pub key: String,
    pub param_type: ParamType,
    pub required: bool,
    /// Whether a comma-separated list is accepted
    pub multiple: bool,
    /// Value placeholder (e.g., "name", "east,north")
    pub key_desc: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    /// Default answer
    pub default: Option<String>,
    /// Allowed values, if restricted
    pub choices: Vec<String>,
    /// GUI prompt hint (e.g., "old,cell,raster")
    pub gisprompt: Option<String>,
    /// Standard option this was expanded from (e.g., "G_OPT_R_INPUT")
    pub standard: Option<String>,
}

/// A single-character flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagSpec {
    pub key: char,
    pub label: Option<String>,
    pub description: Option<String>,
    /// Standard flag this was expanded from (e.g., "G_FLG_V_TABLE")
    pub standard: Option<String>,
}

/// A relation declared in a `#%rules` block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    /// Rule kind (e.g., "exclusive", "required", "requires")
    pub kind: String,
    /// Option keys or `-x` flags the rule applies to
    pub items: Vec<String>,
}

/// Error raised while parsing an interface description.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("line {line}: `#%{directive}` opened inside an unclosed block")]
    Unclosed { line: usize, directive: String },
    #[error("line {line}: attribute outside of any block")]
    Orphan { line: usize },
    #[error("line {line}: unknown block `#%{name}`")]
    UnknownBlock { line: usize, name: String },
    #[error("line {line}: unknown standard definition `{name}`")]
    UnknownStandard { line: usize, name: String },
    #[error("line {line}: malformed line `{text}`")]
    Malformed { line: usize, text: String },
    #[error("line {line}: {kind} block has no key")]
    MissingKey { line: usize, kind: &'static str },
    #[error("line {line}: flag key `{key}` must be a single character")]
    BadFlagKey { line: usize, key: String },
    #[error("block opened on line {line} is never closed")]
    Unterminated { line: usize },
    #[error("no #%module block found")]
    NoModule,
}

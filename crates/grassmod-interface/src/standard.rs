//! Standard option and flag definitions.
//!
//! Modules reference these by name (`#%option G_OPT_R_INPUT`) instead of
//! spelling every attribute out. Only the definitions that appear in common
//! raster, vector and file modules are listed here.

use crate::{FlagSpec, ParamSpec, ParamType};

struct StandardOption {
    name: &'static str,
    key: &'static str,
    param_type: ParamType,
    required: bool,
    multiple: bool,
    key_desc: &'static str,
    description: &'static str,
    gisprompt: Option<&'static str>,
}

const OPTIONS: &[StandardOption] = &[
    StandardOption {
        name: "G_OPT_R_INPUT",
        key: "input",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of input raster map",
        gisprompt: Some("old,cell,raster"),
    },
    StandardOption {
        name: "G_OPT_R_INPUTS",
        key: "input",
        param_type: ParamType::String,
        required: true,
        multiple: true,
        key_desc: "name",
        description: "Name of input raster map(s)",
        gisprompt: Some("old,cell,raster"),
    },
    StandardOption {
        name: "G_OPT_R_OUTPUT",
        key: "output",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name for output raster map",
        gisprompt: Some("new,cell,raster"),
    },
    StandardOption {
        name: "G_OPT_R_MAP",
        key: "map",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of raster map",
        gisprompt: Some("old,cell,raster"),
    },
    StandardOption {
        name: "G_OPT_R_ELEV",
        key: "elevation",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of input elevation raster map",
        gisprompt: Some("old,cell,raster"),
    },
    StandardOption {
        name: "G_OPT_R3_INPUT",
        key: "input",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of input 3D raster map",
        gisprompt: Some("old,grid3,raster_3d"),
    },
    StandardOption {
        name: "G_OPT_V_INPUT",
        key: "input",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of input vector map",
        gisprompt: Some("old,vector,vector"),
    },
    StandardOption {
        name: "G_OPT_V_OUTPUT",
        key: "output",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name for output vector map",
        gisprompt: Some("new,vector,vector"),
    },
    StandardOption {
        name: "G_OPT_V_MAP",
        key: "map",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of vector map",
        gisprompt: Some("old,vector,vector"),
    },
    StandardOption {
        name: "G_OPT_DB_WHERE",
        key: "where",
        param_type: ParamType::String,
        required: false,
        multiple: false,
        key_desc: "sql_query",
        description: "WHERE conditions of SQL statement without 'where' keyword",
        gisprompt: None,
    },
    StandardOption {
        name: "G_OPT_F_INPUT",
        key: "input",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name of input file",
        gisprompt: Some("old,file,file"),
    },
    StandardOption {
        name: "G_OPT_F_OUTPUT",
        key: "output",
        param_type: ParamType::String,
        required: true,
        multiple: false,
        key_desc: "name",
        description: "Name for output file",
        gisprompt: Some("new,file,file"),
    },
    StandardOption {
        name: "G_OPT_M_COORDS",
        key: "coordinates",
        param_type: ParamType::Double,
        required: false,
        multiple: false,
        key_desc: "east,north",
        description: "Coordinates",
        gisprompt: Some("old,coords,coords"),
    },
];

const FLAGS: &[(&str, char, &str)] = &[
    ("G_FLG_V_TABLE", 'c', "Print column names"),
    ("G_FLG_V_TOPO", 'b', "Do not build topology"),
];

/// Expand a standard option reference, or `None` if it is unknown.
pub fn standard_option(name: &str) -> Option<ParamSpec> {
    OPTIONS.iter().find(|o| o.name == name).map(|o| ParamSpec {
        key: o.key.to_string(),
        param_type: o.param_type,
        required: o.required,
        multiple: o.multiple,
        key_desc: Some(o.key_desc.to_string()),
        label: None,
        description: Some(o.description.to_string()),
        default: None,
        choices: Vec::new(),
        gisprompt: o.gisprompt.map(str::to_string),
        standard: Some(o.name.to_string()),
    })
}

/// Expand a standard flag reference, or `None` if it is unknown.
pub fn standard_flag(name: &str) -> Option<FlagSpec> {
    FLAGS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(n, key, description)| FlagSpec {
            key: *key,
            label: None,
            description: Some(description.to_string()),
            standard: Some(n.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_input_expands_to_required_input() {
        let spec = standard_option("G_OPT_R_INPUT").unwrap();
        assert_eq!(spec.key, "input");
        assert!(spec.required);
        assert!(!spec.multiple);
        assert_eq!(spec.standard.as_deref(), Some("G_OPT_R_INPUT"));
    }

    #[test]
    fn test_unknown_standard_names() {
        assert!(standard_option("G_OPT_NOT_A_THING").is_none());
        assert!(standard_flag("G_FLG_NOPE").is_none());
        assert_eq!(standard_flag("G_FLG_V_TABLE").unwrap().key, 'c');
    }
}

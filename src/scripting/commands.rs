//! Stable names shared by the config serializer and the script bindings.
//!
//! A script produced by serialization only references names from this
//! module, so it is guaranteed to parse against the bindings that will
//! later execute it.

pub const RENDERER_VAR: &str = "r";
pub const TIME_VAR: &str = "t";

pub const LOAD_SCRIPT: &str = "loadScript";
pub const LOAD_SCENE: &str = "loadScene";
pub const USE_NEXT_CAMERA: &str = "useNextCamera";
pub const SAVE_CONFIG: &str = "saveConfig";
pub const ADD_GRAPH: &str = "addGraph";
pub const REMOVE_GRAPH: &str = "removeGraph";
pub const GET_GRAPH: &str = "getGraph";
pub const RESIZE_SWAP_CHAIN: &str = "resizeSwapChain";

pub const SCENE: &str = "scene";
pub const ACTIVE_GRAPH: &str = "activeGraph";
pub const UI: &str = "ui";

// Kept for old scripts; not advertised in the help listing.
pub const GRAPH_DEPRECATED: &str = "graph";
pub const ENV_MAP_DEPRECATED: &str = "envMap";

pub const GRAPH_CONSTRUCTOR: &str = "RenderGraph";
pub const RENDER_FRAME: &str = "renderFrame";
pub const EXIT: &str = "exit";
pub const HELP: &str = "help";

/// One command parameter; required when `default` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

/// Descriptor of one command exposed by the binding registry.
///
/// Deprecated entries point at the same underlying operation as their
/// replacement and are excluded from the help listing.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub deprecated: bool,
}

pub const COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: LOAD_SCRIPT,
        params: &[ParamSpec {
            name: "filename",
            default: Some("\"\""),
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: LOAD_SCENE,
        params: &[
            ParamSpec {
                name: "filename",
                default: Some("\"\""),
            },
            ParamSpec {
                name: "buildFlags",
                default: Some("default build flags"),
            },
        ],
        deprecated: false,
    },
    CommandDescriptor {
        name: USE_NEXT_CAMERA,
        params: &[ParamSpec {
            name: "filename",
            default: Some("\"\""),
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: SAVE_CONFIG,
        params: &[ParamSpec {
            name: "filename",
            default: None,
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: ADD_GRAPH,
        params: &[ParamSpec {
            name: "graph",
            default: None,
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: REMOVE_GRAPH,
        params: &[ParamSpec {
            name: "name",
            default: None,
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: REMOVE_GRAPH,
        params: &[ParamSpec {
            name: "graph",
            default: None,
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: GET_GRAPH,
        params: &[ParamSpec {
            name: "name",
            default: None,
        }],
        deprecated: false,
    },
    CommandDescriptor {
        name: RESIZE_SWAP_CHAIN,
        params: &[
            ParamSpec {
                name: "width",
                default: None,
            },
            ParamSpec {
                name: "height",
                default: None,
            },
        ],
        deprecated: false,
    },
    CommandDescriptor {
        name: GRAPH_DEPRECATED,
        params: &[ParamSpec {
            name: "name",
            default: None,
        }],
        deprecated: true,
    },
    CommandDescriptor {
        name: ENV_MAP_DEPRECATED,
        params: &[ParamSpec {
            name: "filename",
            default: None,
        }],
        deprecated: true,
    },
    // Old spelling of the resize command, routed straight through the
    // window subsystem. Behaviour is identical to the current one.
    CommandDescriptor {
        name: RESIZE_SWAP_CHAIN,
        params: &[
            ParamSpec {
                name: "width",
                default: None,
            },
            ParamSpec {
                name: "height",
                default: None,
            },
        ],
        deprecated: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertised_commands_have_unique_names() {
        let advertised: Vec<_> = COMMANDS
            .iter()
            .filter(|c| !c.deprecated)
            .map(|c| (c.name, c.params))
            .collect();
        for (index, (name, params)) in advertised.iter().enumerate() {
            let dup = advertised
                .iter()
                .skip(index + 1)
                .any(|(n, p)| n == name && p == params);
            assert!(!dup, "duplicate descriptor for {name}");
        }
    }

    #[test]
    fn deprecated_aliases_are_marked() {
        assert!(COMMANDS
            .iter()
            .any(|c| c.name == GRAPH_DEPRECATED && c.deprecated));
        assert!(COMMANDS
            .iter()
            .any(|c| c.name == ENV_MAP_DEPRECATED && c.deprecated));
    }
}

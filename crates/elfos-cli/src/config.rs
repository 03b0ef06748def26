//! Configuration – reads/writes `~/.elfos/config.toml`.
//!
//! The on-disk schema is a flat rendition of
//! [`TreeSpec`][elfos_runtime::TreeSpec]: nodes reference their parent by
//! name, variables and components reference their node by name, and the
//! loader assembles the nested spec.  Guards and responses are full
//! [`Expression`] trees, written in TOML as tagged tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use elfos_interp::{Expression, Predicate};
use elfos_runtime::{ComponentSpec, NodeSpec, ResourceSpec, TreeSpec, VariableSpec};
use elfos_state::StateVariable;
use elfos_types::{Value, VarType};

/// Persisted configuration stored in `~/.elfos/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the root node.
    pub root: String,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    /// Every node other than the root, each naming its parent.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    #[serde(default)]
    pub variables: Vec<VariableConfig>,

    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub parent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    /// Node the variable is declared on.
    pub node: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: VarType,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Node the component is attached to.
    pub node: String,
    pub id: String,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ComponentKind {
    ConsoleSensor {
        target: String,
    },
    ConsoleActuator {
        resource: String,
    },
    RequestActuatorSensor {
        target: String,
    },
    // Scalar fields first: the TOML writer cannot emit a plain value after
    // a sub-table like `guard`.
    EchoBehavior {
        /// Name of a declared variable receiving each observed input.
        input: String,
        target: String,
        /// Id of a schedule-judge component; tasks are routed through it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        judge: Option<String>,
        #[serde(default = "default_importance")]
        importance: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        guard: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<Expression>,
    },
    ScheduleJudge {
        threshold: f64,
        target: String,
    },
}

fn default_importance() -> f64 {
    0.5
}

impl Default for Config {
    /// The demo tree: a `dialog` node under the root, wired
    /// console-sensor → echo-behavior → console-actuator, with a guard that
    /// drops the literal input `quit`.
    fn default() -> Self {
        let input = StateVariable::new("latestInput", VarType::Text, "");
        Self {
            root: "robot".to_string(),
            resources: vec![ResourceConfig {
                name: "console".to_string(),
                kind: "device".to_string(),
            }],
            nodes: vec![NodeConfig {
                name: "dialog".to_string(),
                parent: "robot".to_string(),
            }],
            variables: vec![VariableConfig {
                node: "dialog".to_string(),
                name: "latestInput".to_string(),
                ty: VarType::Text,
                comment: "most recent console line".to_string(),
                initial: None,
            }],
            components: vec![
                ComponentConfig {
                    node: "dialog".to_string(),
                    id: "console-sensor".to_string(),
                    kind: ComponentKind::ConsoleSensor {
                        target: "echo-behavior".to_string(),
                    },
                },
                ComponentConfig {
                    node: "dialog".to_string(),
                    id: "echo-behavior".to_string(),
                    kind: ComponentKind::EchoBehavior {
                        input: "latestInput".to_string(),
                        target: "console-actuator".to_string(),
                        guard: Some(Expression::test(
                            Predicate::Different,
                            vec![
                                Expression::variable(input),
                                Expression::literal("quit"),
                            ],
                        )),
                        response: None,
                        judge: None,
                        importance: default_importance(),
                    },
                },
                ComponentConfig {
                    node: "dialog".to_string(),
                    id: "console-actuator".to_string(),
                    kind: ComponentKind::ConsoleActuator {
                        resource: "console".to_string(),
                    },
                },
            ],
        }
    }
}

impl Config {
    /// Assemble the nested [`TreeSpec`] from the flat on-disk form.
    pub fn into_tree_spec(self) -> Result<TreeSpec, String> {
        let mut declared: HashMap<String, StateVariable> = HashMap::new();
        let mut specs: HashMap<String, NodeSpec> = HashMap::new();
        specs.insert(self.root.clone(), NodeSpec::new(self.root.clone()));
        for node in &self.nodes {
            if specs
                .insert(node.name.clone(), NodeSpec::new(node.name.clone()))
                .is_some()
            {
                return Err(format!("node '{}' is declared twice", node.name));
            }
        }

        for var in self.variables {
            let variable = StateVariable::new(var.name.clone(), var.ty, var.comment);
            declared.insert(var.name.clone(), variable.clone());
            specs
                .get_mut(&var.node)
                .ok_or_else(|| format!("variable '{}' names unknown node '{}'", var.name, var.node))?
                .variables
                .push(VariableSpec {
                    variable,
                    initial: var.initial,
                });
        }

        for component in self.components {
            let spec = match component.kind {
                ComponentKind::ConsoleSensor { target } => ComponentSpec::ConsoleSensor {
                    id: component.id,
                    target,
                },
                ComponentKind::ConsoleActuator { resource } => ComponentSpec::ConsoleActuator {
                    id: component.id,
                    resource,
                },
                ComponentKind::RequestActuatorSensor { target } => {
                    ComponentSpec::RequestActuatorSensor {
                        id: component.id,
                        target,
                    }
                }
                ComponentKind::EchoBehavior {
                    input,
                    target,
                    guard,
                    response,
                    judge,
                    importance,
                } => ComponentSpec::EchoBehavior {
                    input: declared
                        .get(&input)
                        .cloned()
                        .ok_or_else(|| {
                            format!(
                                "component '{}' reads undeclared variable '{input}'",
                                component.id
                            )
                        })?,
                    id: component.id,
                    target,
                    guard,
                    response,
                    judge: judge.map(|j| (j, importance)),
                    tasks: Vec::new(),
                },
                ComponentKind::ScheduleJudge { threshold, target } => {
                    ComponentSpec::ScheduleJudge {
                        id: component.id,
                        threshold,
                        target,
                    }
                }
            };
            specs
                .get_mut(&component.node)
                .ok_or_else(|| {
                    format!(
                        "component '{}' names unknown node '{}'",
                        spec.id(),
                        component.node
                    )
                })?
                .components
                .push(spec);
        }

        // Nest children under parents, leaves first so each move is final.
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for node in &self.nodes {
            if !specs.contains_key(&node.parent) {
                return Err(format!(
                    "node '{}' names unknown parent '{}'",
                    node.name, node.parent
                ));
            }
            children
                .entry(node.parent.clone())
                .or_default()
                .push(node.name.clone());
        }
        let root = assemble(&self.root, &mut specs, &children)?;
        // Anything still unassembled sits on a parent cycle (or hangs off
        // one) and would otherwise be dropped silently.
        if !specs.is_empty() {
            let mut orphans: Vec<String> = specs.into_keys().collect();
            orphans.sort();
            return Err(format!(
                "node(s) not reachable from root '{}': {}",
                self.root,
                orphans.join(", ")
            ));
        }

        Ok(TreeSpec {
            root,
            resources: self
                .resources
                .into_iter()
                .map(|r| ResourceSpec {
                    name: r.name,
                    kind: r.kind,
                })
                .collect(),
        })
    }
}

/// Recursively move `name` and its children out of `specs`.
fn assemble(
    name: &str,
    specs: &mut HashMap<String, NodeSpec>,
    children: &HashMap<String, Vec<String>>,
) -> Result<NodeSpec, String> {
    let mut spec = specs
        .remove(name)
        .ok_or_else(|| format!("node '{name}' appears in a parent cycle"))?;
    if let Some(kids) = children.get(name) {
        for kid in kids {
            spec.children.push(assemble(kid, specs, children)?);
        }
    }
    Ok(spec)
}

/// Return the path to `~/.elfos/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".elfos").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Save the config to disk, creating `~/.elfos/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

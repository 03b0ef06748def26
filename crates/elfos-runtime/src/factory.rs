//! Declarative tree assembly and the run lifecycle.
//!
//! A [`TreeSpec`] describes the whole control hierarchy up front: nodes
//! with their variables and initial bindings, the components attached to
//! each node, the channel wiring between them, and the pooled resources.
//! [`NodeFactory::build`] turns one into a [`ControlTree`] with every
//! channel created and every component constructed but nothing running
//! yet.  [`ControlTree::start`] spawns all worker and producer loops and
//! hands back a [`RunningTree`]; [`RunningTree::stop`] shuts everything
//! down cooperatively.  Nothing survives a restart: a new run starts from
//! a freshly built tree.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use elfos_hal::{EchoResponder, LineDevice, RequestResponder, StdConsole};
use elfos_interp::{Command, Expression};
use elfos_kernel::{ResourcePool, Watchdog};
use elfos_middleware::{
    ChannelReceiver, ChannelSender, DEFAULT_CAPACITY, MessageHandler, MessageSource, StopFlag,
    channel, spawn_producer, spawn_worker,
};
use elfos_state::StateVariable;
use elfos_types::{ElfError, Message, MessageBody, Value};

use crate::component::{
    ConsoleActuator, ConsoleSensor, EchoBehavior, RequestActuatorSensor, ScheduleJudge,
};
use crate::node::{NodeId, NodeTree};

/// How long `stop` waits for a producer task that may be parked on a
/// blocking device read.
const PRODUCER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Heartbeat deadline registered for every worker.  Generous because an
/// idle worker blocked on an empty channel sends no heartbeats.
const WORKER_DEADLINE: Duration = Duration::from_secs(300);

// ─────────────────────────────────────────────────────────────────────────────
// Specs
// ─────────────────────────────────────────────────────────────────────────────

/// A variable declared on a node, with an optional initial binding.
#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub variable: StateVariable,
    pub initial: Option<Value>,
}

/// One component attached to a node.  `target` names the consumer the
/// component's outbound channel feeds; it must be the id of a consumer
/// component declared somewhere in the same tree.
#[derive(Debug, Clone)]
pub enum ComponentSpec {
    ConsoleSensor {
        id: String,
        target: String,
    },
    ConsoleActuator {
        id: String,
        /// Pool resource acquired around each write.
        resource: String,
    },
    RequestActuatorSensor {
        id: String,
        target: String,
    },
    EchoBehavior {
        id: String,
        /// Variable receiving each observed input; must be declared on the
        /// component's node or an ancestor.
        input: StateVariable,
        target: String,
        guard: Option<Expression>,
        response: Option<Expression>,
        /// When set, tasks are routed through this value-judgement
        /// component with the given importance.
        judge: Option<(String, f64)>,
        tasks: Vec<(String, Command)>,
    },
    ScheduleJudge {
        id: String,
        threshold: f64,
        target: String,
    },
}

impl ComponentSpec {
    pub fn id(&self) -> &str {
        match self {
            ComponentSpec::ConsoleSensor { id, .. }
            | ComponentSpec::ConsoleActuator { id, .. }
            | ComponentSpec::RequestActuatorSensor { id, .. }
            | ComponentSpec::EchoBehavior { id, .. }
            | ComponentSpec::ScheduleJudge { id, .. } => id,
        }
    }

    /// Producers have no inbound channel; everything else is a consumer.
    fn is_consumer(&self) -> bool {
        !matches!(self, ComponentSpec::ConsoleSensor { .. })
    }
}

/// One node with its variables, components, and children.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub name: String,
    pub variables: Vec<VariableSpec>,
    pub components: Vec<ComponentSpec>,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A pooled resource shared between components.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub name: String,
    pub kind: String,
}

/// The complete declarative description handed to the factory.
#[derive(Debug, Clone)]
pub struct TreeSpec {
    pub root: NodeSpec,
    pub resources: Vec<ResourceSpec>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

type ConsoleFactory = Box<dyn Fn() -> Box<dyn LineDevice> + Send>;
type ResponderFactory = Box<dyn Fn() -> Box<dyn RequestResponder> + Send>;

/// Builds a [`ControlTree`] from a [`TreeSpec`].
///
/// Device construction is pluggable so tests can substitute simulated
/// consoles and responders; the defaults are the real stdin/stdout console
/// and the echo responder.
pub struct NodeFactory {
    console: ConsoleFactory,
    responder: ResponderFactory,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self {
            console: Box::new(|| Box::new(StdConsole::new())),
            responder: Box::new(|| Box::new(EchoResponder::new())),
        }
    }
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitute the device behind every console component.
    pub fn with_console_factory(
        mut self,
        factory: impl Fn() -> Box<dyn LineDevice> + Send + 'static,
    ) -> Self {
        self.console = Box::new(factory);
        self
    }

    /// Substitute the collaborator behind every request component.
    pub fn with_responder_factory(
        mut self,
        factory: impl Fn() -> Box<dyn RequestResponder> + Send + 'static,
    ) -> Self {
        self.responder = Box::new(factory);
        self
    }

    /// Assemble the node tree, state scopes, channels, and components.
    ///
    /// # Errors
    ///
    /// [`ElfError::Configuration`] for duplicate component ids, wiring
    /// targets that are not consumers, or actuator resources the spec does
    /// not declare; scope errors propagate from initial bindings.
    pub fn build(&self, spec: TreeSpec) -> Result<ControlTree, ElfError> {
        let pool = ResourcePool::new();
        for resource in &spec.resources {
            pool.register(resource.name.clone(), resource.kind.clone());
        }
        let resource_names: Vec<&str> = spec.resources.iter().map(|r| r.name.as_str()).collect();

        // Walk the node specs once, growing the tree and collecting each
        // component with the node it lives on.
        let mut tree = NodeTree::new(spec.root.name.clone());
        let mut placed: Vec<(NodeId, ComponentSpec)> = Vec::new();
        let mut pending: Vec<(NodeId, NodeSpec)> = vec![(tree.root(), spec.root)];
        while let Some((node_id, node_spec)) = pending.pop() {
            let state = tree.state(node_id);
            for var in &node_spec.variables {
                if let Some(initial) = &var.initial {
                    state.set(&var.variable, initial.clone())?;
                }
            }
            for component in node_spec.components {
                tree.attach_component(node_id, component.id());
                placed.push((node_id, component));
            }
            for child in node_spec.children {
                let child_id = tree.add_child(node_id, child.name.clone());
                pending.push((child_id, child));
            }
        }
        debug_assert!(tree.check_lockstep());

        // One inbound channel per consumer, created before any component so
        // wiring can reference targets in either direction.
        let mut ids: HashSet<String> = HashSet::new();
        let mut senders: HashMap<String, ChannelSender> = HashMap::new();
        let mut receivers: HashMap<String, ChannelReceiver> = HashMap::new();
        for (_, component) in &placed {
            let id = component.id();
            if !ids.insert(id.to_string()) {
                return Err(ElfError::Configuration(format!(
                    "component id '{id}' is declared more than once"
                )));
            }
            if component.is_consumer() {
                let (tx, rx) = channel(id, DEFAULT_CAPACITY);
                senders.insert(id.to_string(), tx);
                receivers.insert(id.to_string(), rx);
            }
        }

        let mut workers: Vec<(ChannelReceiver, Box<dyn MessageHandler>)> = Vec::new();
        let mut producers: Vec<(Box<dyn MessageSource>, ChannelSender)> = Vec::new();
        for (node_id, component) in placed {
            match component {
                ComponentSpec::ConsoleSensor { id, target } => {
                    let out = outbound(&senders, &target, &id)?;
                    producers.push((Box::new(ConsoleSensor::new(id, (self.console)())), out));
                }
                ComponentSpec::ConsoleActuator { id, resource } => {
                    if !resource_names.contains(&resource.as_str()) {
                        return Err(ElfError::Configuration(format!(
                            "component '{id}' uses undeclared resource '{resource}'"
                        )));
                    }
                    let rx = receivers.remove(&id).expect("consumer channel exists");
                    let actuator =
                        ConsoleActuator::new(id, (self.console)(), pool.clone(), resource);
                    workers.push((rx, Box::new(actuator)));
                }
                ComponentSpec::RequestActuatorSensor { id, target } => {
                    let out = outbound(&senders, &target, &id)?;
                    let rx = receivers.remove(&id).expect("consumer channel exists");
                    let component = RequestActuatorSensor::new(id, (self.responder)(), out);
                    workers.push((rx, Box::new(component)));
                }
                ComponentSpec::EchoBehavior {
                    id,
                    input,
                    target,
                    guard,
                    response,
                    judge,
                    tasks,
                } => {
                    let out = outbound(&senders, &target, &id)?;
                    let rx = receivers.remove(&id).expect("consumer channel exists");
                    let state = tree.state(node_id).clone();
                    let mut behavior = EchoBehavior::new(id.clone(), state, input, out)
                        .with_action("log", |args: &[Value]| {
                            for arg in args {
                                info!(action = "log", value = %arg);
                            }
                            Ok(())
                        });
                    if let Some(g) = guard {
                        behavior = behavior.with_guard(g);
                    }
                    if let Some(r) = response {
                        behavior = behavior.with_response(r);
                    }
                    if let Some((judge_id, importance)) = judge {
                        behavior =
                            behavior.with_judge(outbound(&senders, &judge_id, &id)?, importance);
                    }
                    for (name, command) in tasks {
                        command.validate()?;
                        behavior = behavior.with_task(name, command);
                    }
                    workers.push((rx, Box::new(behavior)));
                }
                ComponentSpec::ScheduleJudge {
                    id,
                    threshold,
                    target,
                } => {
                    let out = outbound(&senders, &target, &id)?;
                    let rx = receivers.remove(&id).expect("consumer channel exists");
                    workers.push((rx, Box::new(ScheduleJudge::new(id, threshold, out))));
                }
            }
        }

        Ok(ControlTree {
            tree,
            pool,
            workers,
            producers,
            senders,
        })
    }
}

/// Resolve a wiring target to a clone of its inbound sender.
fn outbound(
    senders: &HashMap<String, ChannelSender>,
    target: &str,
    owner: &str,
) -> Result<ChannelSender, ElfError> {
    senders.get(target).cloned().ok_or_else(|| {
        ElfError::Configuration(format!(
            "component '{owner}' targets '{target}', which is not a consumer in this tree"
        ))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlTree / RunningTree
// ─────────────────────────────────────────────────────────────────────────────

/// A fully assembled, not yet running control hierarchy.
pub struct ControlTree {
    tree: NodeTree,
    pool: ResourcePool,
    workers: Vec<(ChannelReceiver, Box<dyn MessageHandler>)>,
    producers: Vec<(Box<dyn MessageSource>, ChannelSender)>,
    senders: HashMap<String, ChannelSender>,
}

// Manual impl: the worker and producer halves are boxed trait objects.
impl std::fmt::Debug for ControlTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlTree")
            .field("nodes", &self.tree.len())
            .field("workers", &self.workers.len())
            .field("producers", &self.producers.len())
            .finish_non_exhaustive()
    }
}

impl ControlTree {
    pub fn nodes(&self) -> &NodeTree {
        &self.tree
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Sender handle for a consumer component's inbound channel, for
    /// injecting messages from outside the tree (tests, the CLI).
    pub fn sender(&self, component: &str) -> Option<ChannelSender> {
        self.senders.get(component).cloned()
    }

    /// Spawn every worker and producer loop.
    pub fn start(self) -> RunningTree {
        let stop = StopFlag::new();
        let watchdog = Watchdog::new();

        let worker_handles: Vec<JoinHandle<()>> = self
            .workers
            .into_iter()
            .map(|(rx, handler)| {
                let id = handler.id().to_string();
                watchdog.register(&id, WORKER_DEADLINE);
                let wd = watchdog.clone();
                let beat_id = id.clone();
                let handle = spawn_worker(rx, handler, Some(std::sync::Arc::new(move || {
                    wd.heartbeat(&beat_id);
                })));
                info!(component = %id, "worker spawned");
                handle
            })
            .collect();

        let producer_handles: Vec<JoinHandle<()>> = self
            .producers
            .into_iter()
            .map(|(source, out)| {
                let id = source.id().to_string();
                let handle = spawn_producer(source, out, stop.clone());
                info!(component = %id, "producer spawned");
                handle
            })
            .collect();

        RunningTree {
            tree: self.tree,
            pool: self.pool,
            stop,
            watchdog,
            senders: self.senders,
            worker_handles,
            producer_handles,
        }
    }
}

/// A started tree: live loops plus the handles needed to stop them.
pub struct RunningTree {
    tree: NodeTree,
    pool: ResourcePool,
    stop: StopFlag,
    watchdog: Watchdog,
    senders: HashMap<String, ChannelSender>,
    worker_handles: Vec<JoinHandle<()>>,
    producer_handles: Vec<JoinHandle<()>>,
}

impl RunningTree {
    pub fn nodes(&self) -> &NodeTree {
        &self.tree
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Sender handle for a consumer component's inbound channel.
    pub fn sender(&self, component: &str) -> Option<ChannelSender> {
        self.senders.get(component).cloned()
    }

    /// Cooperative shutdown: raise the producer stop flag, send `Release`
    /// to every consumer, await the loops.
    ///
    /// A producer parked on a blocking device read cannot observe the stop
    /// flag until the read returns, so producer handles are only awaited up
    /// to [`PRODUCER_STOP_TIMEOUT`] and then abandoned with a warning.
    pub async fn stop(self) {
        info!("stopping control tree");
        self.stop.raise();
        for (id, tx) in &self.senders {
            if tx
                .send(Message::new("runtime", MessageBody::Release))
                .await
                .is_err()
            {
                // Already gone; nothing to release.
                info!(component = %id, "consumer already stopped");
            }
        }
        drop(self.senders);
        for handle in self.worker_handles {
            if let Err(error) = handle.await {
                warn!(%error, "worker task panicked");
            }
        }
        for handle in self.producer_handles {
            match tokio::time::timeout(PRODUCER_STOP_TIMEOUT, handle).await {
                Ok(Err(error)) => warn!(%error, "producer task panicked"),
                Err(_) => warn!("producer still blocked on its device, abandoning"),
                Ok(Ok(())) => {}
            }
        }
        info!("control tree stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elfos_hal::SimConsole;
    use elfos_interp::Predicate;
    use elfos_types::{TaskCommand, VarType};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn input_var() -> StateVariable {
        StateVariable::new("latestInput", VarType::Text, "most recent observed input")
    }

    /// Echo tree: console-sensor → echo-behavior → console-actuator.
    fn echo_spec() -> TreeSpec {
        let mut dialog = NodeSpec::new("dialog");
        dialog.variables.push(VariableSpec {
            variable: input_var(),
            initial: None,
        });
        dialog.components = vec![
            ComponentSpec::ConsoleSensor {
                id: "console-sensor".into(),
                target: "echo-behavior".into(),
            },
            ComponentSpec::EchoBehavior {
                id: "echo-behavior".into(),
                input: input_var(),
                target: "console-actuator".into(),
                guard: None,
                response: None,
                judge: None,
                tasks: Vec::new(),
            },
            ComponentSpec::ConsoleActuator {
                id: "console-actuator".into(),
                resource: "console".into(),
            },
        ];
        let mut root = NodeSpec::new("robot");
        root.children.push(dialog);
        TreeSpec {
            root,
            resources: vec![ResourceSpec {
                name: "console".into(),
                kind: "device".into(),
            }],
        }
    }

    async fn settle(output: &Arc<Mutex<Vec<String>>>, expected: usize) {
        for _ in 0..100 {
            if output.lock().unwrap().len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn echo_tree_runs_end_to_end() {
        // The sensor's console is built first and gets the script; the
        // actuator's console is built second and only captures writes.
        let sinks: Arc<Mutex<Vec<Arc<Mutex<Vec<String>>>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_log = sinks.clone();
        let script = Arc::new(Mutex::new(vec!["hello".to_string(), "world".to_string()]));
        let factory = NodeFactory::new().with_console_factory(move || {
            let console = SimConsole::new(script.lock().unwrap().drain(..).collect::<Vec<_>>());
            sink_log.lock().unwrap().push(console.output());
            Box::new(console)
        });

        let tree = factory.build(echo_spec()).unwrap();
        assert!(tree.nodes().check_lockstep());
        let running = tree.start();

        let sink = sinks.lock().unwrap()[1].clone();
        settle(&sink, 2).await;
        running.stop().await;
        assert_eq!(sink.lock().unwrap().as_slice(), ["hello", "world"]);
    }

    #[tokio::test]
    async fn guarded_tree_filters_quit() {
        let sinks: Arc<Mutex<Vec<Arc<Mutex<Vec<String>>>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_log = sinks.clone();

        let mut spec = echo_spec();
        let dialog = &mut spec.root.children[0];
        let ComponentSpec::EchoBehavior { guard, .. } = &mut dialog.components[1] else {
            panic!("expected behavior component");
        };
        *guard = Some(Expression::test(
            Predicate::Different,
            vec![
                Expression::variable(input_var()),
                Expression::literal("quit"),
            ],
        ));

        let script = Arc::new(Mutex::new(vec!["quit".to_string(), "hi".to_string()]));
        let factory = NodeFactory::new().with_console_factory(move || {
            let console = SimConsole::new(script.lock().unwrap().drain(..).collect::<Vec<_>>());
            sink_log.lock().unwrap().push(console.output());
            Box::new(console)
        });

        let running = factory.build(spec).unwrap().start();
        let sink = sinks.lock().unwrap()[1].clone();
        settle(&sink, 1).await;
        running.stop().await;
        assert_eq!(sink.lock().unwrap().as_slice(), ["hi"]);
    }

    #[tokio::test]
    async fn control_tree_debug_summarises_without_trait_objects() {
        let factory = NodeFactory::new()
            .with_console_factory(|| Box::new(SimConsole::new(Vec::<String>::new())));
        let tree = factory.build(echo_spec()).unwrap();
        let rendered = format!("{tree:?}");
        assert!(rendered.contains("workers: 2"));
        assert!(rendered.contains("producers: 1"));
    }

    #[tokio::test]
    async fn duplicate_component_ids_are_rejected() {
        let mut spec = echo_spec();
        spec.root.children[0]
            .components
            .push(ComponentSpec::ConsoleActuator {
                id: "console-actuator".into(),
                resource: "console".into(),
            });
        let err = NodeFactory::new().build(spec).unwrap_err();
        assert!(matches!(err, ElfError::Configuration(_)));
    }

    #[tokio::test]
    async fn wiring_to_a_non_consumer_is_rejected() {
        let mut spec = echo_spec();
        let ComponentSpec::ConsoleSensor { target, .. } =
            &mut spec.root.children[0].components[0]
        else {
            panic!("expected sensor");
        };
        *target = "console-sensor".into();
        let err = NodeFactory::new().build(spec).unwrap_err();
        assert!(matches!(err, ElfError::Configuration(_)));
    }

    #[tokio::test]
    async fn undeclared_resource_is_rejected() {
        let mut spec = echo_spec();
        spec.resources.clear();
        let err = NodeFactory::new().build(spec).unwrap_err();
        assert!(matches!(err, ElfError::Configuration(_)));
    }

    #[tokio::test]
    async fn initial_bindings_are_applied() {
        let mut spec = echo_spec();
        spec.root.variables.push(VariableSpec {
            variable: StateVariable::new("consolePrompt", VarType::Text, "prompt"),
            initial: Some(Value::text("ready>")),
        });
        let factory = NodeFactory::new()
            .with_console_factory(|| Box::new(SimConsole::new(Vec::<String>::new())));
        let tree = factory.build(spec).unwrap();
        let root_state = tree.nodes().state(tree.nodes().root());
        assert_eq!(
            root_state.get(&StateVariable::new("consolePrompt", VarType::Text, "prompt")),
            Some(Value::text("ready>"))
        );
    }

    #[tokio::test]
    async fn injected_task_flows_through_judge_to_actuator() {
        let mut spec = echo_spec();
        let dialog = &mut spec.root.children[0];
        let ComponentSpec::EchoBehavior { judge, tasks, .. } = &mut dialog.components[1] else {
            panic!("expected behavior component");
        };
        *judge = Some(("schedule-judge".into(), 0.8));
        tasks.push((
            "greet".into(),
            Command::Call {
                action: "log".into(),
                args: vec![Expression::literal("hello from task")],
            },
        ));
        dialog.components.push(ComponentSpec::ScheduleJudge {
            id: "schedule-judge".into(),
            threshold: 0.5,
            target: "echo-behavior".into(),
        });

        let factory = NodeFactory::new()
            .with_console_factory(|| Box::new(SimConsole::new(Vec::<String>::new())));
        let running = factory.build(spec).unwrap().start();

        let bg = running.sender("echo-behavior").unwrap();
        bg.send(Message::new(
            "test",
            MessageBody::DoTask(TaskCommand::new("greet")),
        ))
        .await
        .unwrap();

        // Give the proposal/verdict round trip a moment to complete.
        tokio::time::sleep(Duration::from_millis(50)).await;
        running.stop().await;
    }
}

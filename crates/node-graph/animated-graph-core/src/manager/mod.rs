//! The engine: node and driver registries, the command surface and event routing.
//!
//! A [`NodesManager`] is owned by a single execution context. Commands produced
//! elsewhere are marshaled through a [`CommandQueue`] and applied between frames.

mod traversal;


pub use traversal::FrameReport;

use indexmap::{IndexMap, IndexSet};

use crate::callbacks::{Completion, DriverEnded, EndResult, ValueListener, ValueUpdate};
use crate::commands::{Command, CommandQueue};
use crate::config::EngineConfig;
use crate::driver::Driver;
use crate::error::GraphError;
use crate::events::{self, EventBinding, EventRouter};
use crate::node::value::{Listener, ValueState};
use crate::node::{Node, NodeKind, NodeRegistry};
use crate::sink::PropsSink;
use crate::types::{AnimationId, DriverConfig, NodeConfig, NodeTag, SinkId};

pub struct NodesManager {
    config: EngineConfig,
    nodes: NodeRegistry,
    drivers: IndexMap<AnimationId, Driver>,
    /// Nodes touched by commands since the last pass.
    dirty: IndexSet<NodeTag>,
    events: EventRouter,
    sink: Box<dyn PropsSink + Send>,
    bfs_color: u32,
    value_updates: Vec<ValueUpdate>,
    ended_drivers: Vec<DriverEnded>,
    warned_about_traversal: bool,
}

impl std::fmt::Debug for NodesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodesManager")
            .field("nodes", &self.nodes.len())
            .field("drivers", &self.drivers.len())
            .field("dirty", &self.dirty)
            .field("bfs_color", &self.bfs_color)
            .finish_non_exhaustive()
    }
}

impl NodesManager {
    pub fn new(sink: impl PropsSink + Send + 'static) -> Self {
        Self::build(sink, EngineConfig::default())
    }

    /// Build a manager with custom tuning. Invalid knobs are rejected up front.
    pub fn with_config(
        sink: impl PropsSink + Send + 'static,
        config: EngineConfig,
    ) -> Result<Self, GraphError> {
        config.validate().map_err(GraphError::InvalidEngineConfig)?;
        Ok(Self::build(sink, config))
    }

    fn build(sink: impl PropsSink + Send + 'static, config: EngineConfig) -> Self {
        Self {
            config,
            nodes: NodeRegistry::new(),
            drivers: IndexMap::new(),
            dirty: IndexSet::new(),
            events: EventRouter::new(),
            sink: Box::new(sink),
            bfs_color: crate::node::INITIAL_BFS_COLOR,
            value_updates: Vec::new(),
            ended_drivers: Vec::new(),
            warned_about_traversal: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn node(&self, tag: NodeTag) -> Option<&Node> {
        self.nodes.get(tag)
    }

    pub fn driver(&self, id: AnimationId) -> Option<&Driver> {
        self.drivers.get(&id)
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// `true` while drivers are running or nodes await the next pass.
    pub fn has_active_work(&self) -> bool {
        !self.drivers.is_empty() || !self.dirty.is_empty()
    }

    /// Take every value update queued for outbox listeners.
    pub fn drain_value_updates(&mut self) -> Vec<ValueUpdate> {
        std::mem::take(&mut self.value_updates)
    }

    /// Take the completions of drivers that were started without a callback.
    pub fn drain_ended_drivers(&mut self) -> Vec<DriverEnded> {
        std::mem::take(&mut self.ended_drivers)
    }

    /// Deliver a removed driver's outcome with its target's current value.
    fn end_driver(&mut self, driver: Driver, finished: bool) {
        let value = self
            .nodes
            .value_state(driver.target)
            .map_or(f64::NAN, ValueState::get);
        if let Some(ended) = driver.complete(finished, value) {
            self.ended_drivers.push(ended);
        }
    }

    fn node_ref(&self, tag: NodeTag) -> Result<&Node, GraphError> {
        self.nodes.get(tag).ok_or(GraphError::UnknownNode(tag))
    }

    fn node_mut(&mut self, tag: NodeTag) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(tag).ok_or(GraphError::UnknownNode(tag))
    }

    fn value_mut(&mut self, tag: NodeTag) -> Result<&mut ValueState, GraphError> {
        let node = self.node_mut(tag)?;
        let found = node.kind.name();
        node.kind.value_state_mut().ok_or(GraphError::WrongKind {
            tag,
            expected: "value",
            found,
        })
    }

    fn require_value(&self, tag: NodeTag) -> Result<&ValueState, GraphError> {
        let node = self.node_ref(tag)?;
        node.kind.value_state().ok_or(GraphError::WrongKind {
            tag,
            expected: "value",
            found: node.kind.name(),
        })
    }

    // --- nodes ---

    pub fn create_node(&mut self, tag: NodeTag, config: &NodeConfig) -> Result<(), GraphError> {
        if self.nodes.contains(tag) {
            return Err(GraphError::DuplicateNode(tag));
        }
        config
            .validate()
            .map_err(|reason| GraphError::InvalidConfig { tag, reason })?;
        self.nodes.insert(Node::new(tag, NodeKind::from_config(config)));
        self.dirty.insert(tag);
        log::debug!("created {} node [{tag}]", config.kind_name());
        Ok(())
    }

    /// Replace a node's configuration in place. Edges, value and listener are kept.
    pub fn update_node_config(&mut self, tag: NodeTag, config: &NodeConfig) -> Result<(), GraphError> {
        config
            .validate()
            .map_err(|reason| GraphError::InvalidConfig { tag, reason })?;
        self.node_mut(tag)?.kind.reconfigure(tag, config)?;
        self.stop_drivers_on(tag);
        self.dirty.insert(tag);
        Ok(())
    }

    /// Remove a node. Children are not dropped; edges into the node, drivers on it
    /// and event bindings feeding it are.
    pub fn drop_node(&mut self, tag: NodeTag) -> Result<(), GraphError> {
        self.node_ref(tag)?;
        self.stop_drivers_on(tag);
        let node = self.nodes.remove(tag).ok_or(GraphError::UnknownNode(tag))?;
        for other in self.nodes.iter_mut() {
            other.children.retain(|child| *child != tag);
            if let NodeKind::Interpolation(interp) = &mut other.kind {
                if interp.parent == Some(tag) {
                    interp.parent = None;
                }
            }
        }
        self.events.remove_target(tag);
        self.dirty.shift_remove(&tag);
        self.value_updates.retain(|update| update.tag != tag);
        log::debug!(
            "dropped {} node [{tag}] ({} children detached)",
            node.kind.name(),
            node.children.len()
        );
        Ok(())
    }

    pub fn connect(&mut self, parent: NodeTag, child: NodeTag) -> Result<(), GraphError> {
        let parent_kind = self.node_ref(parent)?.kind.name();
        let parent_is_value = self.node_ref(parent)?.kind.is_value();
        if let NodeKind::Interpolation(interp) = &self.node_ref(child)?.kind {
            if !parent_is_value {
                return Err(GraphError::WrongKind {
                    tag: parent,
                    expected: "value",
                    found: parent_kind,
                });
            }
            interp.check_attach(child)?;
        }
        if let NodeKind::Interpolation(interp) = &mut self.node_mut(child)?.kind {
            interp.parent = Some(parent);
        }
        self.node_mut(parent)?.children.push(child);
        self.dirty.insert(child);
        Ok(())
    }

    pub fn disconnect(&mut self, parent: NodeTag, child: NodeTag) -> Result<(), GraphError> {
        self.node_ref(parent)?;
        if let NodeKind::Interpolation(interp) = &self.node_ref(child)?.kind {
            interp.check_detach(child, parent)?;
        }
        if let NodeKind::Interpolation(interp) = &mut self.node_mut(child)?.kind {
            interp.parent = None;
        }
        let children = &mut self.node_mut(parent)?.children;
        if let Some(pos) = children.iter().position(|c| *c == child) {
            children.remove(pos);
        }
        self.dirty.insert(child);
        Ok(())
    }

    fn props_mut(&mut self, tag: NodeTag) -> Result<&mut crate::node::props::PropsNode, GraphError> {
        match &mut self.node_mut(tag)?.kind {
            NodeKind::Props(props) => Ok(props),
            other => Err(GraphError::WrongKind {
                tag,
                expected: "props",
                found: other.name(),
            }),
        }
    }

    pub fn connect_to_sink(&mut self, node: NodeTag, sink: SinkId) -> Result<(), GraphError> {
        let props = self.props_mut(node)?;
        if let Some(existing) = &props.sink {
            return Err(GraphError::SinkAlreadyConnected {
                tag: node,
                existing: existing.clone(),
            });
        }
        props.sink = Some(sink);
        self.dirty.insert(node);
        Ok(())
    }

    pub fn disconnect_from_sink(&mut self, node: NodeTag, sink: &str) -> Result<(), GraphError> {
        let props = self.props_mut(node)?;
        if props.sink.as_deref() != Some(sink) {
            return Err(GraphError::SinkNotConnected {
                tag: node,
                sink: sink.to_string(),
            });
        }
        props.sink = None;
        Ok(())
    }

    /// Send `Null` for every property the node has delivered, then forget them.
    pub fn restore_defaults(&mut self, node: NodeTag) -> Result<(), GraphError> {
        let props = self.props_mut(node)?;
        let Some(sink) = props.sink.clone() else {
            return Ok(());
        };
        let defaults = props.defaults();
        props.prop_map.clear();
        if defaults.is_empty() {
            return Ok(());
        }
        if let Err(err) = self.sink.apply_props(&sink, &defaults) {
            log::warn!("dropping default props for node [{node}]: {err}");
        }
        Ok(())
    }

    // --- values ---

    /// Overwrite the raw value. Running drivers on the node are cancelled.
    pub fn set_value(&mut self, tag: NodeTag, value: f64) -> Result<(), GraphError> {
        self.require_value(tag)?;
        self.stop_drivers_on(tag);
        self.value_mut(tag)?.value = value;
        self.dirty.insert(tag);
        Ok(())
    }

    pub fn set_offset(&mut self, tag: NodeTag, offset: f64) -> Result<(), GraphError> {
        self.value_mut(tag)?.offset = offset;
        self.dirty.insert(tag);
        Ok(())
    }

    pub fn flatten_offset(&mut self, tag: NodeTag) -> Result<(), GraphError> {
        self.value_mut(tag)?.flatten_offset();
        Ok(())
    }

    pub fn extract_offset(&mut self, tag: NodeTag) -> Result<(), GraphError> {
        self.value_mut(tag)?.extract_offset();
        Ok(())
    }

    /// Observable value (`raw + offset`) of a value-kind node.
    pub fn value(&self, tag: NodeTag) -> Result<f64, GraphError> {
        self.require_value(tag).map(ValueState::get)
    }

    pub fn listen(&mut self, tag: NodeTag, listener: Option<ValueListener>) -> Result<(), GraphError> {
        let state = self.value_mut(tag)?;
        state.listener = Some(match listener {
            Some(callback) => Listener::Callback(callback),
            None => Listener::Outbox,
        });
        Ok(())
    }

    /// Remove the listener. Updates still queued for the node are discarded.
    pub fn unlisten(&mut self, tag: NodeTag) -> Result<(), GraphError> {
        self.value_mut(tag)?.listener = None;
        self.value_updates.retain(|update| update.tag != tag);
        Ok(())
    }

    // --- drivers ---

    /// Start a driver, or reconfigure the running driver with the same id in place.
    ///
    /// A new driver cancels any other drivers on its target. When reconfiguring, a
    /// supplied callback replaces the previous one, which is invoked as cancelled.
    pub fn start_driver(
        &mut self,
        id: AnimationId,
        target: NodeTag,
        config: DriverConfig,
        on_done: Option<Completion>,
    ) -> Result<(), GraphError> {
        self.require_value(target)?;
        config
            .validate()
            .map_err(|reason| GraphError::InvalidDriverConfig { id, reason })?;

        if let Some(driver) = self.drivers.get_mut(&id) {
            driver.reset_config(&config);
            if let Some(previous) = on_done.and_then(|cb| driver.replace_callback(cb)) {
                let value = self
                    .nodes
                    .value_state(driver.target)
                    .map_or(f64::NAN, ValueState::get);
                previous.invoke(EndResult {
                    finished: false,
                    value,
                });
            }
            log::debug!("reconfigured {} animation [{id}]", config.kind_name());
            return Ok(());
        }

        self.stop_drivers_on(target);
        self.drivers
            .insert(id, Driver::new(id, target, &config, on_done));
        log::debug!(
            "started {} animation [{id}] on node [{target}]",
            config.kind_name()
        );
        Ok(())
    }

    /// Cancel a driver. Unknown or already removed ids are ignored.
    pub fn stop_driver(&mut self, id: AnimationId) {
        if let Some(driver) = self.drivers.shift_remove(&id) {
            self.end_driver(driver, false);
        }
    }

    fn stop_drivers_on(&mut self, target: NodeTag) {
        let ids: Vec<AnimationId> = self
            .drivers
            .values()
            .filter(|d| d.target == target)
            .map(|d| d.id)
            .collect();
        for id in ids {
            self.stop_driver(id);
        }
    }

    // --- events ---

    pub fn add_event_route(
        &mut self,
        sink: SinkId,
        event: String,
        path: Vec<String>,
        target: NodeTag,
    ) -> Result<(), GraphError> {
        self.require_value(target)?;
        self.events.add(sink, event, EventBinding { path, target });
        Ok(())
    }

    pub fn remove_event_route(&mut self, sink: &str, event: &str, target: NodeTag) {
        self.events.remove(sink, event, target);
    }

    /// Write event fields into their bound value nodes and mark them dirty.
    ///
    /// Every path is resolved before anything is written, so a malformed payload
    /// leaves the graph untouched. Returns the number of nodes written.
    pub fn handle_event(
        &mut self,
        sink: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<usize, GraphError> {
        let mut writes = Vec::new();
        for binding in self.events.bindings(sink, event) {
            match events::extract(payload, &binding.path) {
                Some(value) => writes.push((binding.target, value)),
                None => {
                    log::warn!("event '{event}' on '{sink}' is missing {:?}", binding.path);
                    return Err(GraphError::UnknownEventPath {
                        sink: sink.to_string(),
                        event: event.to_string(),
                        path: binding.path.clone(),
                    });
                }
            }
        }
        for (target, value) in &writes {
            self.stop_drivers_on(*target);
            if let Some(state) = self.nodes.value_state_mut(*target) {
                state.value = *value;
            }
            self.dirty.insert(*target);
        }
        Ok(writes.len())
    }

    // --- commands ---

    pub fn apply(&mut self, command: Command) -> Result<(), GraphError> {
        match command {
            Command::CreateNode { tag, config } => self.create_node(tag, &config),
            Command::UpdateNodeConfig { tag, config } => self.update_node_config(tag, &config),
            Command::DropNode { tag } => self.drop_node(tag),
            Command::Connect { parent, child } => self.connect(parent, child),
            Command::Disconnect { parent, child } => self.disconnect(parent, child),
            Command::ConnectToSink { node, sink } => self.connect_to_sink(node, sink),
            Command::DisconnectFromSink { node, sink } => self.disconnect_from_sink(node, &sink),
            Command::RestoreDefaults { node } => self.restore_defaults(node),
            Command::SetValue { tag, value } => self.set_value(tag, value),
            Command::SetOffset { tag, value } => self.set_offset(tag, value),
            Command::FlattenOffset { tag } => self.flatten_offset(tag),
            Command::ExtractOffset { tag } => self.extract_offset(tag),
            Command::StartDriver {
                id,
                target,
                config,
                on_done,
            } => self.start_driver(id, target, config, on_done),
            Command::StopDriver { id } => {
                self.stop_driver(id);
                Ok(())
            }
            Command::AddEventRoute {
                sink,
                event,
                path,
                target,
            } => self.add_event_route(sink, event, path, target),
            Command::RemoveEventRoute {
                sink,
                event,
                target,
            } => {
                self.remove_event_route(&sink, &event, target);
                Ok(())
            }
            Command::Listen { tag, listener } => self.listen(tag, listener),
            Command::Unlisten { tag } => self.unlisten(tag),
        }
    }

    /// Apply commands in order, stopping at the first error. Commands after the
    /// failing one are discarded. Returns how many were applied.
    pub fn apply_batch(
        &mut self,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<usize, GraphError> {
        let mut applied = 0;
        for command in commands {
            let name = command.name();
            if let Err(err) = self.apply(command) {
                log::warn!("{name} failed after {applied} commands: {err}");
                return Err(err);
            }
            applied += 1;
        }
        Ok(applied)
    }

    pub fn drain_queue(&mut self, queue: &CommandQueue) -> Result<usize, GraphError> {
        self.apply_batch(queue.take())
    }
}

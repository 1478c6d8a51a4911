//! Per-frame driver stepping and the two-pass topological update.

use std::collections::VecDeque;

use crate::callbacks::ValueUpdate;
use crate::error::GraphError;
use crate::node::value::Listener;
use crate::node::{NodeKind, NodeUpdate, INITIAL_BFS_COLOR};
use crate::types::{AnimationId, NodeTag};

use super::NodesManager;

/// Outcome of a pass that completed its traversal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Nodes reachable from this pass's roots.
    pub active_nodes: usize,
    /// Nodes visited in topological order (equal to `active_nodes`).
    pub updated_nodes: usize,
    /// Drivers removed after completing.
    pub finished_drivers: usize,
    /// Per-node evaluation failures. The failing node kept its previous state.
    pub errors: Vec<GraphError>,
    /// Sink deliveries that failed and were skipped.
    pub dropped_sink_updates: usize,
}

impl FrameReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.dropped_sink_updates == 0
    }
}

impl NodesManager {
    /// Step every driver, then update the nodes reachable from the dirty set and the
    /// driver targets, parents before children.
    ///
    /// Returns `Err(GraphError::Cycle)` when the traversal could not order every
    /// active node. In that case the dirty set is kept for the next pass and no
    /// driver is removed.
    pub fn run_updates(&mut self, frame_time_ns: u64) -> Result<FrameReport, GraphError> {
        let mut roots = std::mem::take(&mut self.dirty);
        for driver in self.drivers.values_mut() {
            if let Some(state) = self.nodes.value_state_mut(driver.target) {
                driver.step(frame_time_ns, &mut state.value, &self.config);
                roots.insert(driver.target);
            }
        }

        let roots: Vec<NodeTag> = roots.into_iter().collect();
        match self.update_nodes(&roots) {
            Ok(mut report) => {
                report.finished_drivers = self.remove_finished_drivers();
                Ok(report)
            }
            Err(err) => {
                self.dirty.extend(roots);
                Err(err)
            }
        }
    }

    fn next_color(&mut self) -> u32 {
        self.bfs_color = self.bfs_color.wrapping_add(1);
        if self.bfs_color == INITIAL_BFS_COLOR {
            self.bfs_color = self.bfs_color.wrapping_add(1);
        }
        self.bfs_color
    }

    fn take_children(&mut self, tag: NodeTag) -> Vec<NodeTag> {
        self.nodes
            .get_mut(tag)
            .map(|node| std::mem::take(&mut node.children))
            .unwrap_or_default()
    }

    fn restore_children(&mut self, tag: NodeTag, children: Vec<NodeTag>) {
        if let Some(node) = self.nodes.get_mut(tag) {
            node.children = children;
        }
    }

    fn update_nodes(&mut self, roots: &[NodeTag]) -> Result<FrameReport, GraphError> {
        let mut queue = VecDeque::new();
        let mut active = Vec::new();

        // Pass A: stamp the active subgraph and count active parents per node.
        let color = self.next_color();
        for &tag in roots {
            if let Some(node) = self.nodes.get_mut(tag) {
                if node.bfs_color != color {
                    node.bfs_color = color;
                    active.push(tag);
                    queue.push_back(tag);
                }
            }
        }
        while let Some(tag) = queue.pop_front() {
            let children = self.take_children(tag);
            for &child in &children {
                if let Some(node) = self.nodes.get_mut(child) {
                    node.active_incoming += 1;
                    if node.bfs_color != color {
                        node.bfs_color = color;
                        active.push(child);
                        queue.push_back(child);
                    }
                }
            }
            self.restore_children(tag, children);
        }

        // Pass B: visit nodes whose active parents have all been updated.
        let color = self.next_color();
        let mut report = FrameReport {
            active_nodes: active.len(),
            ..FrameReport::default()
        };
        for &tag in &active {
            if let Some(node) = self.nodes.get_mut(tag) {
                if node.active_incoming == 0 && node.bfs_color != color {
                    node.bfs_color = color;
                    report.updated_nodes += 1;
                    queue.push_back(tag);
                }
            }
        }
        let mut cycles = 0;
        while let Some(tag) = queue.pop_front() {
            self.update_node(tag, &mut report);

            let children = self.take_children(tag);
            for &child in &children {
                if let Some(node) = self.nodes.get_mut(child) {
                    node.active_incoming = node.active_incoming.saturating_sub(1);
                    if node.bfs_color != color && node.active_incoming == 0 {
                        node.bfs_color = color;
                        report.updated_nodes += 1;
                        queue.push_back(child);
                    } else if node.bfs_color == color {
                        cycles += 1;
                    }
                }
            }
            self.restore_children(tag, children);
        }

        if report.active_nodes != report.updated_nodes {
            for &tag in &active {
                if let Some(node) = self.nodes.get_mut(tag) {
                    node.active_incoming = 0;
                }
            }
            if !self.warned_about_traversal {
                self.warned_about_traversal = true;
                if self.config.log_graph_on_cycle {
                    self.log_graph(roots);
                }
            }
            let err = GraphError::Cycle {
                active: report.active_nodes,
                updated: report.updated_nodes,
                cycles,
            };
            log::error!("{err}");
            return Err(err);
        }
        self.warned_about_traversal = false;
        Ok(report)
    }

    /// Evaluate one node, write the result back and emit its side effects.
    fn update_node(&mut self, tag: NodeTag, report: &mut FrameReport) {
        let update = match NodeUpdate::evaluate(&self.nodes, tag) {
            Ok(update) => update,
            Err(err) => {
                log::debug!("update of node [{tag}] failed: {err}");
                report.errors.push(err);
                return;
            }
        };
        let Some(node) = self.nodes.get_mut(tag) else {
            return;
        };
        update.apply(&mut node.kind);

        match update {
            NodeUpdate::Props(props) => {
                let sink = match &node.kind {
                    NodeKind::Props(p) => p.sink.clone(),
                    _ => None,
                };
                if let Some(sink) = sink {
                    if let Err(err) = self.sink.apply_props(&sink, &props) {
                        log::warn!("dropping props update of node [{tag}]: {err}");
                        report.dropped_sink_updates += 1;
                    }
                }
            }
            NodeUpdate::Track(restart) => {
                if let Err(err) =
                    self.start_driver(restart.animation_id, restart.target, restart.config, None)
                {
                    report.errors.push(err);
                }
            }
            _ => {}
        }

        self.notify_listener(tag);
    }

    fn notify_listener(&mut self, tag: NodeTag) {
        let Some(state) = self.nodes.value_state_mut(tag) else {
            return;
        };
        let value = state.value;
        match &mut state.listener {
            Some(Listener::Callback(listener)) => listener.call(value),
            Some(Listener::Outbox) => self.value_updates.push(ValueUpdate { tag, value }),
            None => {}
        }
    }

    fn remove_finished_drivers(&mut self) -> usize {
        let finished: Vec<AnimationId> = self
            .drivers
            .values()
            .filter(|d| d.is_finished())
            .map(|d| d.id)
            .collect();
        for id in &finished {
            if let Some(driver) = self.drivers.shift_remove(id) {
                self.end_driver(driver, true);
            }
        }
        finished.len()
    }

    fn log_graph(&self, roots: &[NodeTag]) {
        let mut dump = String::new();
        for &tag in roots {
            if let Some(node) = self.nodes.get(tag) {
                dump.push_str(&format!(
                    "\n  [{tag}] {} -> {:?}",
                    node.kind.name(),
                    node.children()
                ));
            }
        }
        log::error!("animated graph traversal failed, roots:{dump}");
    }
}

//! Error types surfaced by commands, frame passes and sinks.

use crate::types::{AnimationId, NodeTag, SinkId};
use thiserror::Error;

/// Errors produced by the engine.
///
/// Configuration variants are returned by the command that caused them, before any
/// mutation. Evaluation variants are collected per node in a
/// [`FrameReport`](crate::FrameReport) and do not stop sibling nodes. `Cycle` aborts
/// the pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GraphError {
    // --- configuration ---
    #[error("animated node [{0}] already exists")]
    DuplicateNode(NodeTag),
    #[error("animated node [{0}] does not exist")]
    UnknownNode(NodeTag),
    #[error("animated node [{tag}] should be of kind {expected}, found {found}")]
    WrongKind {
        tag: NodeTag,
        expected: &'static str,
        found: &'static str,
    },
    #[error("interpolation node [{child}] already has parent [{existing}] attached")]
    ParentAlreadyAttached { child: NodeTag, existing: NodeTag },
    #[error("interpolation node [{child}] is not attached to parent [{parent}]")]
    ParentNotAttached { child: NodeTag, parent: NodeTag },
    #[error("invalid configuration for node [{tag}]: {reason}")]
    InvalidConfig { tag: NodeTag, reason: String },
    #[error("invalid configuration for animation [{id}]: {reason}")]
    InvalidDriverConfig { id: AnimationId, reason: String },
    #[error("invalid engine configuration: {0}")]
    InvalidEngineConfig(String),
    #[error("props node [{tag}] is already connected to sink '{existing}'")]
    SinkAlreadyConnected { tag: NodeTag, existing: SinkId },
    #[error("props node [{tag}] is not connected to sink '{sink}'")]
    SinkNotConnected { tag: NodeTag, sink: SinkId },
    #[error("event '{event}' on sink '{sink}' has no numeric field at path {path:?}")]
    UnknownEventPath {
        sink: SinkId,
        event: String,
        path: Vec<String>,
    },

    // --- evaluation ---
    #[error("division by zero in division node [{tag}]")]
    DivisionByZero { tag: NodeTag },
    #[error("interpolation node [{tag}] updated before a parent was attached")]
    MissingParent { tag: NodeTag },
    #[error("node [{tag}] references missing input node [{input}]")]
    MissingInput { tag: NodeTag, input: NodeTag },
    #[error("node [{tag}] cannot use {found} node [{input}] as a property")]
    UnsupportedPropertyNode {
        tag: NodeTag,
        input: NodeTag,
        found: &'static str,
    },

    // --- traversal ---
    #[error(
        "animated node graph has {}, there are {active} active nodes but toposort visited only {updated}",
        cycle_reason(.cycles)
    )]
    Cycle {
        active: usize,
        updated: usize,
        cycles: usize,
    },
}

fn cycle_reason(cycles: &usize) -> String {
    if *cycles > 0 {
        format!("cycles ({cycles})")
    } else {
        "disconnected regions".to_string()
    }
}

/// Delivery failure reported by a [`PropsSink`](crate::PropsSink).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    #[error("sink '{0}' has no live entry")]
    Missing(SinkId),
    #[error("sink '{sink}' rejected update: {reason}")]
    Rejected { sink: SinkId, reason: String },
}

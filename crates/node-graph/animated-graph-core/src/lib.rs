//! Incremental animated node graph engine.
//!
//! A [`NodesManager`] owns a graph of value, arithmetic and composite nodes plus a
//! set of drivers (keyframes, decay, spring) that write into value nodes. Each call
//! to [`NodesManager::run_updates`] steps the drivers and re-evaluates only the
//! subgraph reachable from touched nodes, in topological order, delivering resolved
//! property maps to a [`PropsSink`].

pub mod callbacks;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod manager;
pub mod node;
pub mod sink;
pub mod types;

pub use callbacks::{Completion, DriverEnded, EndResult, ValueListener, ValueUpdate};
pub use commands::{Command, CommandQueue};
pub use config::EngineConfig;
pub use driver::{Driver, DriverKind};
pub use error::{GraphError, SinkError};
pub use events::{EventBinding, EventRouter};
pub use manager::{FrameReport, NodesManager};
pub use node::{Node, NodeKind, NodeRegistry};
pub use sink::{PropsSink, RecordingSink};
pub use types::*;

//! Serializable command surface and a thread-safe queue for marshaling it.
//!
//! Commands may be produced on any thread, pushed into a [`CommandQueue`], and
//! drained by the engine's owner between frames.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::callbacks::{Completion, ValueListener};
use crate::types::{AnimationId, DriverConfig, NodeConfig, NodeTag, SinkId};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateNode {
        tag: NodeTag,
        config: NodeConfig,
    },
    UpdateNodeConfig {
        tag: NodeTag,
        config: NodeConfig,
    },
    DropNode {
        tag: NodeTag,
    },
    Connect {
        parent: NodeTag,
        child: NodeTag,
    },
    Disconnect {
        parent: NodeTag,
        child: NodeTag,
    },
    ConnectToSink {
        node: NodeTag,
        sink: SinkId,
    },
    DisconnectFromSink {
        node: NodeTag,
        sink: SinkId,
    },
    RestoreDefaults {
        node: NodeTag,
    },
    SetValue {
        tag: NodeTag,
        value: f64,
    },
    SetOffset {
        tag: NodeTag,
        value: f64,
    },
    FlattenOffset {
        tag: NodeTag,
    },
    ExtractOffset {
        tag: NodeTag,
    },
    StartDriver {
        id: AnimationId,
        target: NodeTag,
        config: DriverConfig,
        #[serde(skip)]
        on_done: Option<Completion>,
    },
    StopDriver {
        id: AnimationId,
    },
    AddEventRoute {
        sink: SinkId,
        event: String,
        path: Vec<String>,
        target: NodeTag,
    },
    RemoveEventRoute {
        sink: SinkId,
        event: String,
        target: NodeTag,
    },
    /// Register a listener. Without a closure, updates go to the outbox drained by
    /// [`NodesManager::drain_value_updates`](crate::NodesManager::drain_value_updates).
    Listen {
        tag: NodeTag,
        #[serde(skip)]
        listener: Option<ValueListener>,
    },
    Unlisten {
        tag: NodeTag,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateNode { .. } => "create_node",
            Command::UpdateNodeConfig { .. } => "update_node_config",
            Command::DropNode { .. } => "drop_node",
            Command::Connect { .. } => "connect",
            Command::Disconnect { .. } => "disconnect",
            Command::ConnectToSink { .. } => "connect_to_sink",
            Command::DisconnectFromSink { .. } => "disconnect_from_sink",
            Command::RestoreDefaults { .. } => "restore_defaults",
            Command::SetValue { .. } => "set_value",
            Command::SetOffset { .. } => "set_offset",
            Command::FlattenOffset { .. } => "flatten_offset",
            Command::ExtractOffset { .. } => "extract_offset",
            Command::StartDriver { .. } => "start_driver",
            Command::StopDriver { .. } => "stop_driver",
            Command::AddEventRoute { .. } => "add_event_route",
            Command::RemoveEventRoute { .. } => "remove_event_route",
            Command::Listen { .. } => "listen",
            Command::Unlisten { .. } => "unlisten",
        }
    }
}

/// Cloneable handle to a shared batch of pending commands.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<Vec<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Command>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, command: Command) {
        self.lock().push(command);
    }

    pub fn extend(&self, commands: impl IntoIterator<Item = Command>) {
        self.lock().extend(commands);
    }

    /// Take every pending command, leaving the queue empty.
    pub fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

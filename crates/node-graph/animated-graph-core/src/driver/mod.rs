//! Time-stepping drivers that write into a single value node once per frame.

mod decay;
mod frames;
mod spring;

pub use decay::DecayDriver;
pub use frames::FramesDriver;
pub use spring::SpringDriver;

use crate::callbacks::{Completion, DriverEnded, EndResult};
use crate::config::EngineConfig;
use crate::types::{AnimationId, DriverConfig, NodeTag};

pub(crate) const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Loop bookkeeping shared by every driver kind. `-1` repeats forever.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Iterations {
    total: i32,
    current: i32,
}

impl Iterations {
    pub(crate) fn new(total: i32) -> Self {
        Self { total, current: 1 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub(crate) fn is_first_loop(&self) -> bool {
        self.current == 1
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> i32 {
        self.current
    }

    /// Move to the next loop if one remains. Returns `false` when the driver is done.
    pub(crate) fn advance(&mut self) -> bool {
        if self.total == -1 || self.current < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
pub enum DriverKind {
    Frames(FramesDriver),
    Decay(DecayDriver),
    Spring(SpringDriver),
}

impl DriverKind {
    pub fn from_config(config: &DriverConfig) -> Self {
        match config {
            DriverConfig::Frames(cfg) => DriverKind::Frames(FramesDriver::new(cfg)),
            DriverConfig::Decay(cfg) => DriverKind::Decay(DecayDriver::new(cfg)),
            DriverConfig::Spring(cfg) => DriverKind::Spring(SpringDriver::new(cfg)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Frames(_) => "frames",
            DriverKind::Decay(_) => "decay",
            DriverKind::Spring(_) => "spring",
        }
    }

    fn is_done_before_start(&self) -> bool {
        match self {
            DriverKind::Frames(d) => d.is_done_before_start(),
            DriverKind::Decay(d) => d.is_done_before_start(),
            DriverKind::Spring(d) => d.is_done_before_start(),
        }
    }
}

/// A running animation bound to one value node.
#[derive(Debug)]
pub struct Driver {
    pub id: AnimationId,
    pub target: NodeTag,
    finished: bool,
    on_done: Option<Completion>,
    kind: DriverKind,
}

impl Driver {
    pub fn new(
        id: AnimationId,
        target: NodeTag,
        config: &DriverConfig,
        on_done: Option<Completion>,
    ) -> Self {
        let kind = DriverKind::from_config(config);
        Self {
            id,
            target,
            finished: kind.is_done_before_start(),
            on_done,
            kind,
        }
    }

    pub fn kind(&self) -> &DriverKind {
        &self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reconfigure in place. A config of another kind replaces the driver state.
    pub fn reset_config(&mut self, config: &DriverConfig) {
        match (&mut self.kind, config) {
            (DriverKind::Frames(d), DriverConfig::Frames(cfg)) => d.reset(cfg),
            (DriverKind::Decay(d), DriverConfig::Decay(cfg)) => d.reset(cfg),
            (DriverKind::Spring(d), DriverConfig::Spring(cfg)) => d.reset(cfg),
            (kind, cfg) => *kind = DriverKind::from_config(cfg),
        }
        self.finished = self.kind.is_done_before_start();
    }

    /// Swap the completion callback, returning the one it replaces.
    pub(crate) fn replace_callback(&mut self, on_done: Completion) -> Option<Completion> {
        self.on_done.replace(on_done)
    }

    /// Advance to `now_ns`, writing the new raw value into `value`.
    pub fn step(&mut self, now_ns: u64, value: &mut f64, config: &EngineConfig) {
        if self.finished {
            return;
        }
        self.finished = match &mut self.kind {
            DriverKind::Frames(d) => d.step(now_ns, value, config),
            DriverKind::Decay(d) => d.step(now_ns, value, config),
            DriverKind::Spring(d) => d.step(now_ns, value, config),
        };
    }

    /// Consume the driver and deliver its completion callback. Without a callback
    /// the outcome is returned for the host's outbox.
    pub(crate) fn complete(self, finished: bool, value: f64) -> Option<DriverEnded> {
        log::debug!(
            "animation [{}] on node [{}] ended (finished: {finished})",
            self.id,
            self.target
        );
        match self.on_done {
            Some(on_done) => {
                on_done.invoke(EndResult { finished, value });
                None
            }
            None => Some(DriverEnded {
                id: self.id,
                finished,
                value,
            }),
        }
    }
}

//! Restarts a driver toward another node's value whenever it updates.

use crate::error::GraphError;
use crate::types::{AnimationId, DriverConfig, NodeTag};

use super::NodeRegistry;

#[derive(Debug)]
pub struct TrackingNode {
    pub animation_id: AnimationId,
    pub to_value: NodeTag,
    pub value: NodeTag,
    pub animation_config: DriverConfig,
}

/// Driver (re)start requested by a tracking node during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRestart {
    pub animation_id: AnimationId,
    pub target: NodeTag,
    pub config: DriverConfig,
}

impl TrackingNode {
    /// Current `to_value` pushed into a copy of the stored driver config.
    pub(crate) fn evaluate(
        &self,
        tag: NodeTag,
        registry: &NodeRegistry,
    ) -> Result<TrackingRestart, GraphError> {
        let to = registry.input_value(tag, self.to_value)?;
        let mut config = self.animation_config.clone();
        config.set_to_value(to);
        Ok(TrackingRestart {
            animation_id: self.animation_id,
            target: self.value,
            config,
        })
    }
}

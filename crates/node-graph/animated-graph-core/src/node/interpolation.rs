//! Piecewise-linear interpolation driven by a single structural parent.

use crate::error::GraphError;
use crate::types::{Extrapolate, InterpolationConfig, NodeTag};

use super::value::ValueState;
use super::NodeRegistry;

#[derive(Debug)]
pub struct InterpolationNode {
    pub config: InterpolationConfig,
    pub parent: Option<NodeTag>,
    pub state: ValueState,
}

impl InterpolationNode {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            parent: None,
            state: ValueState::default(),
        }
    }

    /// Check that `parent` may be attached; does not mutate.
    pub(crate) fn check_attach(&self, tag: NodeTag) -> Result<(), GraphError> {
        match self.parent {
            Some(existing) => Err(GraphError::ParentAlreadyAttached {
                child: tag,
                existing,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn check_detach(&self, tag: NodeTag, parent: NodeTag) -> Result<(), GraphError> {
        if self.parent == Some(parent) {
            Ok(())
        } else {
            Err(GraphError::ParentNotAttached { child: tag, parent })
        }
    }

    pub(crate) fn evaluate(&self, tag: NodeTag, registry: &NodeRegistry) -> Result<f64, GraphError> {
        let parent = self.parent.ok_or(GraphError::MissingParent { tag })?;
        let input = registry.input_value(tag, parent)?;
        Ok(interpolate(input, &self.config))
    }
}

/// Map `value` through the breakpoint tables in `config`.
pub fn interpolate(value: f64, config: &InterpolationConfig) -> f64 {
    let inputs = &config.input_range;
    let outputs = &config.output_range;
    let i = find_range_index(value, inputs);
    interpolate_segment(
        value,
        (inputs[i], inputs[i + 1]),
        (outputs[i], outputs[i + 1]),
        config.extrapolate_left,
        config.extrapolate_right,
    )
}

/// Lower breakpoint of the active segment: one before the lowest `i` in
/// `[1, n-2]` with `ranges[i] >= value`, else the last segment.
fn find_range_index(value: f64, ranges: &[f64]) -> usize {
    let mut index = 1;
    while index < ranges.len() - 1 {
        if ranges[index] >= value {
            break;
        }
        index += 1;
    }
    index - 1
}

fn interpolate_segment(
    value: f64,
    (input_min, input_max): (f64, f64),
    (output_min, output_max): (f64, f64),
    left: Extrapolate,
    right: Extrapolate,
) -> f64 {
    let mut result = value;

    if result < input_min {
        match left {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = input_min,
            Extrapolate::Extend => {}
        }
    }
    if result > input_max {
        match right {
            Extrapolate::Identity => return result,
            Extrapolate::Clamp => result = input_max,
            Extrapolate::Extend => {}
        }
    }

    if output_min == output_max {
        return output_min;
    }
    if input_min == input_max {
        return if value <= input_min {
            output_min
        } else {
            output_max
        };
    }
    output_min + (output_max - output_min) * (result - input_min) / (input_max - input_min)
}

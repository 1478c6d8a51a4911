//! Identifiers, node/driver configuration records and resolved property values.
//!
//! Configuration records are serde-tagged on `"type"` so command scripts can be
//! authored as JSON, e.g. `{ "type": "interpolation", "input_range": [0, 1], ... }`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, externally assigned identity of a graph node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTag(pub u32);

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a running driver. At most one driver exists per id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationId(pub u32);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an external consumer (usually a view) of resolved property maps.
pub type SinkId = String;

/// Flat property-name → value map delivered to a sink.
pub type PropMap = IndexMap<String, PropValue>;

fn nan() -> f64 {
    f64::NAN
}

/// Kind-specific configuration used by `CreateNode` / `UpdateNodeConfig`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    Value {
        #[serde(default = "nan")]
        value: f64,
        #[serde(default)]
        offset: f64,
    },
    Addition {
        input: Vec<NodeTag>,
    },
    Subtraction {
        input: Vec<NodeTag>,
    },
    Multiplication {
        input: Vec<NodeTag>,
    },
    Division {
        input: Vec<NodeTag>,
    },
    Modulus {
        input: NodeTag,
        modulus: f64,
    },
    #[serde(rename = "diffclamp")]
    DiffClamp {
        input: NodeTag,
        min: f64,
        max: f64,
    },
    Interpolation(InterpolationConfig),
    Color {
        r: NodeTag,
        g: NodeTag,
        b: NodeTag,
        a: NodeTag,
    },
    Style {
        style: IndexMap<String, NodeTag>,
    },
    Props {
        props: IndexMap<String, NodeTag>,
    },
    Transform {
        transforms: Vec<TransformConfig>,
    },
    Tracking {
        animation_id: AnimationId,
        to_value: NodeTag,
        value: NodeTag,
        animation_config: DriverConfig,
    },
}

impl NodeConfig {
    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeConfig::Value { .. } => "value",
            NodeConfig::Addition { .. } => "addition",
            NodeConfig::Subtraction { .. } => "subtraction",
            NodeConfig::Multiplication { .. } => "multiplication",
            NodeConfig::Division { .. } => "division",
            NodeConfig::Modulus { .. } => "modulus",
            NodeConfig::DiffClamp { .. } => "diffclamp",
            NodeConfig::Interpolation(_) => "interpolation",
            NodeConfig::Color { .. } => "color",
            NodeConfig::Style { .. } => "style",
            NodeConfig::Props { .. } => "props",
            NodeConfig::Transform { .. } => "transform",
            NodeConfig::Tracking { .. } => "tracking",
        }
    }

    /// Structural checks that do not need the registry.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            NodeConfig::Addition { input }
            | NodeConfig::Subtraction { input }
            | NodeConfig::Multiplication { input }
            | NodeConfig::Division { input } => {
                if input.is_empty() {
                    return Err(format!("{} node requires at least one input", self.kind_name()));
                }
                Ok(())
            }
            NodeConfig::DiffClamp { min, max, .. } => {
                if min > max {
                    return Err(format!("diffclamp min ({min}) is greater than max ({max})"));
                }
                Ok(())
            }
            NodeConfig::Interpolation(cfg) => cfg.validate(),
            NodeConfig::Tracking {
                animation_config, ..
            } => animation_config.validate(),
            _ => Ok(()),
        }
    }
}

/// Behaviour outside the first/last input breakpoints.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolate {
    #[default]
    Extend,
    Clamp,
    Identity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    pub input_range: Vec<f64>,
    pub output_range: Vec<f64>,
    #[serde(default)]
    pub extrapolate_left: Extrapolate,
    #[serde(default)]
    pub extrapolate_right: Extrapolate,
}

impl InterpolationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.input_range.len() < 2 {
            return Err("interpolation requires at least two breakpoints".into());
        }
        if self.input_range.len() != self.output_range.len() {
            return Err(format!(
                "input_range has {} entries but output_range has {}",
                self.input_range.len(),
                self.output_range.len()
            ));
        }
        if self.input_range.windows(2).any(|w| w[1] < w[0]) {
            return Err("input_range must be monotonically non-decreasing".into());
        }
        Ok(())
    }
}

/// One entry of a transform list: either bound to a value node or a constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformConfig {
    Animated { property: String, node_tag: NodeTag },
    Static { property: String, value: f64 },
}

fn one_iteration() -> i32 {
    1
}

fn unit_mass() -> f64 {
    1.0
}

fn default_rest_threshold() -> f64 {
    0.001
}

/// Driver configuration used by `StartDriver` and tracking nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverConfig {
    Frames(FramesConfig),
    Decay(DecayConfig),
    Spring(SpringConfig),
}

impl DriverConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DriverConfig::Frames(_) => "frames",
            DriverConfig::Decay(_) => "decay",
            DriverConfig::Spring(_) => "spring",
        }
    }

    /// Retarget the driver. Decay has no target and ignores the call.
    pub fn set_to_value(&mut self, to_value: f64) {
        match self {
            DriverConfig::Frames(cfg) => cfg.to_value = to_value,
            DriverConfig::Spring(cfg) => cfg.to_value = to_value,
            DriverConfig::Decay(_) => {}
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let iterations = match self {
            DriverConfig::Frames(cfg) => cfg.iterations,
            DriverConfig::Decay(cfg) => {
                if !cfg.deceleration.is_finite() || cfg.deceleration >= 1.0 {
                    return Err(format!(
                        "decay deceleration must be below 1, got {}",
                        cfg.deceleration
                    ));
                }
                if !cfg.velocity.is_finite() {
                    return Err(format!("decay velocity must be finite, got {}", cfg.velocity));
                }
                cfg.iterations
            }
            DriverConfig::Spring(cfg) => {
                if !cfg.mass.is_finite() || cfg.mass <= 0.0 {
                    return Err(format!("spring mass must be positive, got {}", cfg.mass));
                }
                let fields = [
                    ("tension", cfg.tension),
                    ("friction", cfg.friction),
                    ("initial_velocity", cfg.initial_velocity),
                    ("to_value", cfg.to_value),
                ];
                if let Some((name, v)) = fields.iter().find(|(_, v)| !v.is_finite()) {
                    return Err(format!("spring {name} must be finite, got {v}"));
                }
                cfg.iterations
            }
        };
        if iterations < -1 {
            return Err(format!("iterations must be -1 (infinite) or >= 0, got {iterations}"));
        }
        Ok(())
    }
}

/// Keyframe curve sampled once per virtual frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FramesConfig {
    pub frames: Vec<f64>,
    #[serde(default)]
    pub to_value: f64,
    #[serde(default = "one_iteration")]
    pub iterations: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    pub velocity: f64,
    pub deceleration: f64,
    #[serde(default = "one_iteration")]
    pub iterations: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub tension: f64,
    pub friction: f64,
    #[serde(default = "unit_mass")]
    pub mass: f64,
    #[serde(default)]
    pub initial_velocity: f64,
    #[serde(default)]
    pub to_value: f64,
    #[serde(default = "default_rest_threshold")]
    pub rest_speed_threshold: f64,
    #[serde(default = "default_rest_threshold")]
    pub rest_displacement_threshold: f64,
    #[serde(default)]
    pub overshoot_clamping: bool,
    #[serde(default = "one_iteration")]
    pub iterations: i32,
}

/// A single resolved transform entry, e.g. `translateX: 10`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformEntry {
    pub property: String,
    pub value: f64,
}

/// Value of one property in a sink's property map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PropValue {
    /// Property reset to the sink's default.
    Null,
    Number(f64),
    /// Packed 0xAARRGGBB color.
    Color(u32),
    Transform(Vec<TransformEntry>),
}

impl PropValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

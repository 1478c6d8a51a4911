//! Graph vertices, their kind-specific payloads and the tag-keyed registry.

pub mod arithmetic;
pub mod color;
pub mod interpolation;
pub mod props;
pub mod tracking;
pub mod value;

use hashbrown::HashMap;

use crate::error::GraphError;
use crate::types::{NodeConfig, NodeTag, PropMap};

use arithmetic::{ArithmeticNode, ArithmeticOp, DiffClampNode, ModulusNode};
use color::ColorNode;
use interpolation::InterpolationNode;
use props::{PropsNode, StyleNode, TransformNode};
use tracking::{TrackingNode, TrackingRestart};
use value::ValueState;

/// Pass stamp of a node that has never been visited. The manager's counter skips it.
pub(crate) const INITIAL_BFS_COLOR: u32 = 0;

#[derive(Debug)]
pub struct Node {
    pub tag: NodeTag,
    pub(crate) children: Vec<NodeTag>,
    pub(crate) active_incoming: u32,
    pub(crate) bfs_color: u32,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(tag: NodeTag, kind: NodeKind) -> Self {
        Self {
            tag,
            children: Vec::new(),
            active_incoming: 0,
            bfs_color: INITIAL_BFS_COLOR,
            kind,
        }
    }

    /// Structural children in connection order. Duplicates are kept.
    pub fn children(&self) -> &[NodeTag] {
        &self.children
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Value(ValueState),
    Arithmetic(ArithmeticNode),
    Modulus(ModulusNode),
    DiffClamp(DiffClampNode),
    Interpolation(InterpolationNode),
    Color(ColorNode),
    Style(StyleNode),
    Props(PropsNode),
    Transform(TransformNode),
    Tracking(TrackingNode),
}

impl NodeKind {
    pub fn from_config(config: &NodeConfig) -> Self {
        match config.clone() {
            NodeConfig::Value { value, offset } => NodeKind::Value(ValueState::new(value, offset)),
            NodeConfig::Addition { input } => {
                NodeKind::Arithmetic(ArithmeticNode::new(ArithmeticOp::Add, input))
            }
            NodeConfig::Subtraction { input } => {
                NodeKind::Arithmetic(ArithmeticNode::new(ArithmeticOp::Subtract, input))
            }
            NodeConfig::Multiplication { input } => {
                NodeKind::Arithmetic(ArithmeticNode::new(ArithmeticOp::Multiply, input))
            }
            NodeConfig::Division { input } => {
                NodeKind::Arithmetic(ArithmeticNode::new(ArithmeticOp::Divide, input))
            }
            NodeConfig::Modulus { input, modulus } => NodeKind::Modulus(ModulusNode {
                input,
                modulus,
                state: ValueState::default(),
            }),
            NodeConfig::DiffClamp { input, min, max } => {
                NodeKind::DiffClamp(DiffClampNode::new(input, min, max))
            }
            NodeConfig::Interpolation(cfg) => NodeKind::Interpolation(InterpolationNode::new(cfg)),
            NodeConfig::Color { r, g, b, a } => NodeKind::Color(ColorNode::new(r, g, b, a)),
            NodeConfig::Style { style } => NodeKind::Style(StyleNode { style }),
            NodeConfig::Props { props } => NodeKind::Props(PropsNode::new(props)),
            NodeConfig::Transform { transforms } => NodeKind::Transform(TransformNode { transforms }),
            NodeConfig::Tracking {
                animation_id,
                to_value,
                value,
                animation_config,
            } => NodeKind::Tracking(TrackingNode {
                animation_id,
                to_value,
                value,
                animation_config,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Value(_) => "value",
            NodeKind::Arithmetic(a) => a.op.name(),
            NodeKind::Modulus(_) => "modulus",
            NodeKind::DiffClamp(_) => "diffclamp",
            NodeKind::Interpolation(_) => "interpolation",
            NodeKind::Color(_) => "color",
            NodeKind::Style(_) => "style",
            NodeKind::Props(_) => "props",
            NodeKind::Transform(_) => "transform",
            NodeKind::Tracking(_) => "tracking",
        }
    }

    /// Value state of value-kind nodes (sources and numeric combinators).
    pub fn value_state(&self) -> Option<&ValueState> {
        match self {
            NodeKind::Value(state) => Some(state),
            NodeKind::Arithmetic(n) => Some(&n.state),
            NodeKind::Modulus(n) => Some(&n.state),
            NodeKind::DiffClamp(n) => Some(&n.state),
            NodeKind::Interpolation(n) => Some(&n.state),
            _ => None,
        }
    }

    pub fn value_state_mut(&mut self) -> Option<&mut ValueState> {
        match self {
            NodeKind::Value(state) => Some(state),
            NodeKind::Arithmetic(n) => Some(&mut n.state),
            NodeKind::Modulus(n) => Some(&mut n.state),
            NodeKind::DiffClamp(n) => Some(&mut n.state),
            NodeKind::Interpolation(n) => Some(&mut n.state),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        self.value_state().is_some()
    }

    /// Replace kind-specific configuration, keeping runtime state (value, listener,
    /// attached parent, sink binding).
    pub(crate) fn reconfigure(&mut self, tag: NodeTag, config: &NodeConfig) -> Result<(), GraphError> {
        let mismatch = |found: &'static str| GraphError::WrongKind {
            tag,
            expected: config.kind_name(),
            found,
        };
        match (self, config.clone()) {
            (NodeKind::Value(_), NodeConfig::Value { .. }) => Err(GraphError::InvalidConfig {
                tag,
                reason: "value nodes are changed with set_value/set_offset".into(),
            }),
            (NodeKind::Arithmetic(n), NodeConfig::Addition { input })
                if n.op == ArithmeticOp::Add =>
            {
                n.inputs = input;
                Ok(())
            }
            (NodeKind::Arithmetic(n), NodeConfig::Subtraction { input })
                if n.op == ArithmeticOp::Subtract =>
            {
                n.inputs = input;
                Ok(())
            }
            (NodeKind::Arithmetic(n), NodeConfig::Multiplication { input })
                if n.op == ArithmeticOp::Multiply =>
            {
                n.inputs = input;
                Ok(())
            }
            (NodeKind::Arithmetic(n), NodeConfig::Division { input })
                if n.op == ArithmeticOp::Divide =>
            {
                n.inputs = input;
                Ok(())
            }
            (NodeKind::Modulus(n), NodeConfig::Modulus { input, modulus }) => {
                n.input = input;
                n.modulus = modulus;
                Ok(())
            }
            (NodeKind::DiffClamp(n), NodeConfig::DiffClamp { input, min, max }) => {
                n.input = input;
                n.min = min;
                n.max = max;
                Ok(())
            }
            (NodeKind::Interpolation(n), NodeConfig::Interpolation(cfg)) => {
                n.config = cfg;
                Ok(())
            }
            (NodeKind::Color(n), NodeConfig::Color { r, g, b, a }) => {
                n.r = r;
                n.g = g;
                n.b = b;
                n.a = a;
                Ok(())
            }
            (NodeKind::Style(n), NodeConfig::Style { style }) => {
                n.style = style;
                Ok(())
            }
            (NodeKind::Props(n), NodeConfig::Props { props }) => {
                n.props = props;
                Ok(())
            }
            (NodeKind::Transform(n), NodeConfig::Transform { transforms }) => {
                n.transforms = transforms;
                Ok(())
            }
            (
                NodeKind::Tracking(n),
                NodeConfig::Tracking {
                    animation_id,
                    to_value,
                    value,
                    animation_config,
                },
            ) => {
                n.animation_id = animation_id;
                n.to_value = to_value;
                n.value = value;
                n.animation_config = animation_config;
                Ok(())
            }
            (kind, _) => Err(mismatch(kind.name())),
        }
    }
}

/// Exclusive owner of every node, keyed by tag. Edges are tags resolved here.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeTag, Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: NodeTag) -> Option<&Node> {
        self.nodes.get(&tag)
    }

    pub fn get_mut(&mut self, tag: NodeTag) -> Option<&mut Node> {
        self.nodes.get_mut(&tag)
    }

    pub fn contains(&self, tag: NodeTag) -> bool {
        self.nodes.contains_key(&tag)
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.tag, node);
    }

    pub(crate) fn remove(&mut self, tag: NodeTag) -> Option<Node> {
        self.nodes.remove(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn value_state(&self, tag: NodeTag) -> Option<&ValueState> {
        self.get(tag).and_then(|n| n.kind.value_state())
    }

    pub fn value_state_mut(&mut self, tag: NodeTag) -> Option<&mut ValueState> {
        self.get_mut(tag).and_then(|n| n.kind.value_state_mut())
    }

    /// Observable value of `input`, read on behalf of `owner` during an update.
    pub(crate) fn input_value(&self, owner: NodeTag, input: NodeTag) -> Result<f64, GraphError> {
        let node = self
            .get(input)
            .ok_or(GraphError::MissingInput { tag: owner, input })?;
        node.kind
            .value_state()
            .map(ValueState::get)
            .ok_or(GraphError::WrongKind {
                tag: input,
                expected: "value",
                found: node.kind.name(),
            })
    }
}

/// Result of evaluating one node against a read-only registry.
///
/// Evaluation borrows the registry immutably; the result is then written back
/// through [`NodeUpdate::apply`] once the shared borrow has ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeUpdate {
    None,
    Value(f64),
    DiffClamp { value: f64, last: f64 },
    Color(u32),
    Props(PropMap),
    Track(TrackingRestart),
}

impl NodeUpdate {
    pub(crate) fn evaluate(registry: &NodeRegistry, tag: NodeTag) -> Result<Self, GraphError> {
        let node = registry.get(tag).ok_or(GraphError::UnknownNode(tag))?;
        Ok(match &node.kind {
            NodeKind::Value(_) | NodeKind::Style(_) | NodeKind::Transform(_) => NodeUpdate::None,
            NodeKind::Arithmetic(n) => NodeUpdate::Value(n.evaluate(tag, registry)?),
            NodeKind::Modulus(n) => NodeUpdate::Value(n.evaluate(tag, registry)?),
            NodeKind::DiffClamp(n) => {
                let (value, last) = n.evaluate(tag, registry)?;
                NodeUpdate::DiffClamp { value, last }
            }
            NodeKind::Interpolation(n) => NodeUpdate::Value(n.evaluate(tag, registry)?),
            NodeKind::Color(n) => NodeUpdate::Color(n.resolve(tag, registry)?),
            NodeKind::Props(n) => match n.sink {
                Some(_) => NodeUpdate::Props(n.collect(tag, registry)?),
                None => NodeUpdate::None,
            },
            NodeKind::Tracking(n) => NodeUpdate::Track(n.evaluate(tag, registry)?),
        })
    }

    pub(crate) fn apply(&self, kind: &mut NodeKind) {
        match (self, kind) {
            (NodeUpdate::Value(v), kind) => {
                if let Some(state) = kind.value_state_mut() {
                    state.value = *v;
                }
            }
            (NodeUpdate::DiffClamp { value, last }, NodeKind::DiffClamp(n)) => {
                n.state.value = *value;
                n.last_value = *last;
            }
            (NodeUpdate::Color(packed), NodeKind::Color(n)) => n.packed = Some(*packed),
            (NodeUpdate::Props(map), NodeKind::Props(n)) => n.prop_map = map.clone(),
            (NodeUpdate::Track(restart), NodeKind::Tracking(n)) => {
                n.animation_config = restart.config.clone();
            }
            _ => {}
        }
    }
}

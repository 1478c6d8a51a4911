//! Style, props and transform aggregation into flat property maps.

use indexmap::IndexMap;

use crate::error::GraphError;
use crate::types::{NodeTag, PropMap, PropValue, SinkId, TransformConfig, TransformEntry};

use super::{NodeKind, NodeRegistry};

#[derive(Debug)]
pub struct StyleNode {
    pub style: IndexMap<String, NodeTag>,
}

#[derive(Debug)]
pub struct TransformNode {
    pub transforms: Vec<TransformConfig>,
}

/// Terminal node whose resolved map is delivered to a connected sink.
#[derive(Debug)]
pub struct PropsNode {
    pub props: IndexMap<String, NodeTag>,
    pub sink: Option<SinkId>,
    /// Map produced by the last successful update.
    pub prop_map: PropMap,
}

impl PropsNode {
    pub fn new(props: IndexMap<String, NodeTag>) -> Self {
        Self {
            props,
            sink: None,
            prop_map: PropMap::new(),
        }
    }

    pub(crate) fn collect(&self, tag: NodeTag, registry: &NodeRegistry) -> Result<PropMap, GraphError> {
        let mut out = PropMap::with_capacity(self.props.len());
        for (name, input) in &self.props {
            let node = registry
                .get(*input)
                .ok_or(GraphError::MissingInput { tag, input: *input })?;
            match &node.kind {
                NodeKind::Style(style) => style.collect_into(*input, registry, &mut out)?,
                _ => {
                    let value = property_value(tag, *input, registry)?;
                    out.insert(name.clone(), value);
                }
            }
        }
        Ok(out)
    }

    /// Map with every previously emitted property reset to `Null`.
    pub(crate) fn defaults(&self) -> PropMap {
        self.prop_map
            .keys()
            .map(|k| (k.clone(), PropValue::Null))
            .collect()
    }
}

impl StyleNode {
    /// Write this style's properties directly into `out` (styles are flattened).
    pub(crate) fn collect_into(
        &self,
        tag: NodeTag,
        registry: &NodeRegistry,
        out: &mut PropMap,
    ) -> Result<(), GraphError> {
        for (name, input) in &self.style {
            let value = property_value(tag, *input, registry)?;
            out.insert(name.clone(), value);
        }
        Ok(())
    }
}

impl TransformNode {
    pub(crate) fn collect(
        &self,
        tag: NodeTag,
        registry: &NodeRegistry,
    ) -> Result<Vec<TransformEntry>, GraphError> {
        self.transforms
            .iter()
            .map(|t| match t {
                TransformConfig::Static { property, value } => Ok(TransformEntry {
                    property: property.clone(),
                    value: *value,
                }),
                TransformConfig::Animated { property, node_tag } => Ok(TransformEntry {
                    property: property.clone(),
                    value: registry.input_value(tag, *node_tag)?,
                }),
            })
            .collect()
    }
}

/// Resolve a non-style node referenced from a style or props map.
fn property_value(owner: NodeTag, input: NodeTag, registry: &NodeRegistry) -> Result<PropValue, GraphError> {
    let node = registry
        .get(input)
        .ok_or(GraphError::MissingInput { tag: owner, input })?;
    if let Some(state) = node.kind.value_state() {
        return Ok(PropValue::Number(state.get()));
    }
    match &node.kind {
        NodeKind::Color(color) => Ok(PropValue::Color(color.resolve(input, registry)?)),
        NodeKind::Transform(transform) => {
            Ok(PropValue::Transform(transform.collect(input, registry)?))
        }
        other => Err(GraphError::UnsupportedPropertyNode {
            tag: owner,
            input,
            found: other.name(),
        }),
    }
}

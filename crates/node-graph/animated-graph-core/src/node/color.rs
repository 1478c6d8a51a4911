//! Packs four channel nodes into a single ARGB integer.

use crate::error::GraphError;
use crate::types::NodeTag;

use super::NodeRegistry;

#[derive(Debug)]
pub struct ColorNode {
    pub r: NodeTag,
    pub g: NodeTag,
    pub b: NodeTag,
    pub a: NodeTag,
    /// Last packed color computed by an update.
    pub packed: Option<u32>,
}

impl ColorNode {
    pub fn new(r: NodeTag, g: NodeTag, b: NodeTag, a: NodeTag) -> Self {
        Self {
            r,
            g,
            b,
            a,
            packed: None,
        }
    }

    pub(crate) fn resolve(&self, tag: NodeTag, registry: &NodeRegistry) -> Result<u32, GraphError> {
        let r = registry.input_value(tag, self.r)?;
        let g = registry.input_value(tag, self.g)?;
        let b = registry.input_value(tag, self.b)?;
        let a = registry.input_value(tag, self.a)?;
        Ok(pack_argb(r, g, b, a))
    }
}

/// `r`, `g`, `b` in `[0, 255]`, `a` in `[0, 1]`. Channels are rounded and clamped.
pub fn pack_argb(r: f64, g: f64, b: f64, a: f64) -> u32 {
    let channel = |v: f64| -> u32 {
        if v.is_nan() {
            0
        } else {
            v.round().clamp(0.0, 255.0) as u32
        }
    };
    let alpha = channel(a * 255.0);
    (alpha << 24) | (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

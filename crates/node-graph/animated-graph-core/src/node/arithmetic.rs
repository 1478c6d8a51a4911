//! Arithmetic combinators: variadic folds, modulus and diff-clamp.

use crate::error::GraphError;
use crate::types::NodeTag;

use super::value::ValueState;
use super::NodeRegistry;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "addition",
            ArithmeticOp::Subtract => "subtraction",
            ArithmeticOp::Multiply => "multiplication",
            ArithmeticOp::Divide => "division",
        }
    }
}

/// Variadic left fold over input value nodes, resolved by tag at update time.
#[derive(Debug)]
pub struct ArithmeticNode {
    pub op: ArithmeticOp,
    pub inputs: Vec<NodeTag>,
    pub state: ValueState,
}

impl ArithmeticNode {
    pub fn new(op: ArithmeticOp, inputs: Vec<NodeTag>) -> Self {
        Self {
            op,
            inputs,
            state: ValueState::default(),
        }
    }

    pub(crate) fn evaluate(&self, tag: NodeTag, registry: &NodeRegistry) -> Result<f64, GraphError> {
        let mut values = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            values.push(registry.input_value(tag, *input)?);
        }
        fold(self.op, tag, &values)
    }
}

/// Fold `values` left to right. The first value seeds subtraction and division.
pub fn fold(op: ArithmeticOp, tag: NodeTag, values: &[f64]) -> Result<f64, GraphError> {
    match op {
        ArithmeticOp::Add => Ok(values.iter().sum()),
        ArithmeticOp::Multiply => Ok(values.iter().product()),
        ArithmeticOp::Subtract | ArithmeticOp::Divide => {
            let mut iter = values.iter();
            let mut acc = iter.next().copied().unwrap_or(f64::NAN);
            for v in iter {
                if op == ArithmeticOp::Subtract {
                    acc -= v;
                } else {
                    if *v == 0.0 {
                        return Err(GraphError::DivisionByZero { tag });
                    }
                    acc /= v;
                }
            }
            Ok(acc)
        }
    }
}

#[derive(Debug)]
pub struct ModulusNode {
    pub input: NodeTag,
    pub modulus: f64,
    pub state: ValueState,
}

impl ModulusNode {
    pub(crate) fn evaluate(&self, tag: NodeTag, registry: &NodeRegistry) -> Result<f64, GraphError> {
        let value = registry.input_value(tag, self.input)?;
        Ok(((value % self.modulus) + self.modulus) % self.modulus)
    }
}

/// Accumulates input deltas and clamps the running total into `[min, max]`.
#[derive(Debug)]
pub struct DiffClampNode {
    pub input: NodeTag,
    pub min: f64,
    pub max: f64,
    pub last_value: f64,
    pub state: ValueState,
}

impl DiffClampNode {
    pub fn new(input: NodeTag, min: f64, max: f64) -> Self {
        Self {
            input,
            min,
            max,
            last_value: 0.0,
            state: ValueState::new(0.0, 0.0),
        }
    }

    /// Returns `(value, last_value)` to store.
    pub(crate) fn evaluate(
        &self,
        tag: NodeTag,
        registry: &NodeRegistry,
    ) -> Result<(f64, f64), GraphError> {
        let input = registry.input_value(tag, self.input)?;
        let diff = input - self.last_value;
        let value = (self.state.value + diff).min(self.max).max(self.min);
        Ok((value, input))
    }
}

//! Keyframe driver: samples a progress curve once per virtual frame.

use crate::config::EngineConfig;
use crate::types::FramesConfig;

use super::{Iterations, NANOS_PER_MILLI};

#[derive(Debug)]
pub struct FramesDriver {
    frames: Vec<f64>,
    to_value: f64,
    from_value: f64,
    start_ns: Option<u64>,
    iterations: Iterations,
}

impl FramesDriver {
    pub fn new(config: &FramesConfig) -> Self {
        Self {
            frames: config.frames.clone(),
            to_value: config.to_value,
            from_value: 0.0,
            start_ns: None,
            iterations: Iterations::new(config.iterations),
        }
    }

    /// Replace the curve and target. The next step re-captures its origin from the
    /// node's current value, so the animation continues from where it is.
    pub fn reset(&mut self, config: &FramesConfig) {
        *self = Self::new(config);
    }

    pub fn is_done_before_start(&self) -> bool {
        self.iterations.is_empty()
    }

    /// Returns `true` once the last iteration reaches the end of the curve.
    pub fn step(&mut self, now_ns: u64, value: &mut f64, config: &EngineConfig) -> bool {
        let start = match self.start_ns {
            Some(start) => start,
            None => {
                if self.iterations.is_first_loop() {
                    self.from_value = *value;
                }
                self.start_ns = Some(now_ns);
                now_ns
            }
        };
        let elapsed_ms = now_ns.saturating_sub(start) as f64 / NANOS_PER_MILLI;
        let index = (elapsed_ms / config.frame_interval_ms).round() as usize;

        if index >= self.frames.len().saturating_sub(1) {
            *value = self.to_value;
            if self.iterations.advance() {
                self.start_ns = None;
                return false;
            }
            return true;
        }
        *value = self.from_value + self.frames[index] * (self.to_value - self.from_value);
        false
    }
}

//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Configuration for driver stepping and diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of one keyframe-driver sample in milliseconds.
    pub frame_interval_ms: f64,
    /// Decay drivers stop once consecutive steps differ by less than this.
    pub decay_rest_delta: f64,
    /// Fixed RK4 sub-step for spring drivers, in seconds.
    pub spring_solver_step_secs: f64,
    /// Upper bound on elapsed time a spring consumes per step, in seconds.
    pub spring_max_delta_secs: f64,
    /// Dump the pass roots through `log::error!` on a traversal mismatch.
    pub log_graph_on_cycle: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 1000.0 / 60.0,
            decay_rest_delta: 0.1,
            spring_solver_step_secs: 0.001,
            spring_max_delta_secs: 0.064,
            log_graph_on_cycle: true,
        }
    }
}

impl EngineConfig {
    /// Reject values that would stall or corrupt driver stepping.
    pub fn validate(&self) -> Result<(), String> {
        if !self.frame_interval_ms.is_finite() || self.frame_interval_ms <= 0.0 {
            return Err(format!(
                "frame_interval_ms must be positive, got {}",
                self.frame_interval_ms
            ));
        }
        if self.decay_rest_delta.is_nan() || self.decay_rest_delta < 0.0 {
            return Err(format!(
                "decay_rest_delta must not be negative, got {}",
                self.decay_rest_delta
            ));
        }
        if !self.spring_solver_step_secs.is_finite() || self.spring_solver_step_secs <= 0.0 {
            return Err(format!(
                "spring_solver_step_secs must be positive, got {}",
                self.spring_solver_step_secs
            ));
        }
        if !self.spring_max_delta_secs.is_finite() || self.spring_max_delta_secs < 0.0 {
            return Err(format!(
                "spring_max_delta_secs must not be negative, got {}",
                self.spring_max_delta_secs
            ));
        }
        Ok(())
    }
}

//! Damped spring integrated with fixed-step RK4.

use crate::config::EngineConfig;
use crate::types::SpringConfig;

use super::{Iterations, NANOS_PER_MILLI};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct PhysicsState {
    position: f64,
    velocity: f64,
}

#[derive(Debug)]
pub struct SpringDriver {
    config: SpringConfig,
    current: PhysicsState,
    previous: PhysicsState,
    start_value: f64,
    original_value: Option<f64>,
    last_time_ms: f64,
    time_accumulator: f64,
    started: bool,
    iterations: Iterations,
}

impl SpringDriver {
    pub fn new(config: &SpringConfig) -> Self {
        Self {
            config: config.clone(),
            current: PhysicsState {
                position: 0.0,
                velocity: config.initial_velocity,
            },
            previous: PhysicsState::default(),
            start_value: 0.0,
            original_value: None,
            last_time_ms: 0.0,
            time_accumulator: 0.0,
            started: false,
            iterations: Iterations::new(config.iterations),
        }
    }

    pub fn reset(&mut self, config: &SpringConfig) {
        *self = Self::new(config);
    }

    pub fn is_done_before_start(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn step(&mut self, now_ns: u64, value: &mut f64, config: &EngineConfig) -> bool {
        let now_ms = now_ns as f64 / NANOS_PER_MILLI;
        if !self.started {
            match self.original_value {
                Some(original) => *value = original,
                None => self.original_value = Some(*value),
            }
            self.start_value = *value;
            self.current.position = *value;
            self.last_time_ms = now_ms;
            self.time_accumulator = 0.0;
            self.started = true;
        }
        self.advance((now_ms - self.last_time_ms) / 1000.0, config);
        self.last_time_ms = now_ms;
        *value = self.current.position;

        if self.is_at_rest() {
            if self.iterations.advance() {
                self.started = false;
                self.current.velocity = self.config.initial_velocity;
                if let Some(original) = self.original_value {
                    *value = original;
                }
                return false;
            }
            return true;
        }
        false
    }

    fn is_at_rest(&self) -> bool {
        self.current.velocity.abs() <= self.config.rest_speed_threshold
            && ((self.config.to_value - self.current.position).abs()
                <= self.config.rest_displacement_threshold
                || self.config.tension == 0.0)
    }

    fn is_overshooting(&self) -> bool {
        let to = self.config.to_value;
        self.config.tension > 0.0
            && ((self.start_value < to && self.current.position > to)
                || (self.start_value > to && self.current.position < to))
    }

    fn acceleration(&self, position: f64, velocity: f64) -> f64 {
        (self.config.tension * (self.config.to_value - position) - self.config.friction * velocity)
            / self.config.mass
    }

    fn advance(&mut self, real_delta_secs: f64, engine: &EngineConfig) {
        if self.is_at_rest() {
            return;
        }
        let dt = engine.spring_solver_step_secs;
        self.time_accumulator += real_delta_secs.clamp(0.0, engine.spring_max_delta_secs);

        let mut position = self.current.position;
        let mut velocity = self.current.velocity;
        while self.time_accumulator >= dt {
            self.time_accumulator -= dt;
            if self.time_accumulator < dt {
                self.previous = PhysicsState { position, velocity };
            }

            let a_v = velocity;
            let a_a = self.acceleration(position, velocity);

            let b_v = velocity + a_a * dt * 0.5;
            let b_a = self.acceleration(position + a_v * dt * 0.5, b_v);

            let c_v = velocity + b_a * dt * 0.5;
            let c_a = self.acceleration(position + b_v * dt * 0.5, c_v);

            let d_v = velocity + c_a * dt;
            let d_a = self.acceleration(position + c_v * dt, d_v);

            position += (a_v + 2.0 * (b_v + c_v) + d_v) / 6.0 * dt;
            velocity += (a_a + 2.0 * (b_a + c_a) + d_a) / 6.0 * dt;
        }
        self.current = PhysicsState { position, velocity };

        if self.time_accumulator > 0.0 {
            let alpha = self.time_accumulator / dt;
            self.current.position = position * alpha + self.previous.position * (1.0 - alpha);
            self.current.velocity = velocity * alpha + self.previous.velocity * (1.0 - alpha);
        }

        if self.is_at_rest() || (self.config.overshoot_clamping && self.is_overshooting()) {
            if self.config.tension > 0.0 {
                self.start_value = self.config.to_value;
                self.current.position = self.config.to_value;
            } else {
                self.config.to_value = self.current.position;
                self.start_value = self.config.to_value;
            }
            self.current.velocity = 0.0;
        }
    }
}

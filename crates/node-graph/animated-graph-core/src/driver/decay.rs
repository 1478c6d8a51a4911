//! Exponential decay driver.

use crate::config::EngineConfig;
use crate::types::DecayConfig;

use super::{Iterations, NANOS_PER_MILLI};

#[derive(Debug)]
pub struct DecayDriver {
    /// Units per millisecond.
    velocity: f64,
    deceleration: f64,
    start_ms: Option<f64>,
    /// Value captured on the first step; every iteration restarts here.
    origin: Option<f64>,
    last_value: f64,
    iterations: Iterations,
}

impl DecayDriver {
    pub fn new(config: &DecayConfig) -> Self {
        Self {
            velocity: config.velocity,
            deceleration: config.deceleration,
            start_ms: None,
            origin: None,
            last_value: 0.0,
            iterations: Iterations::new(config.iterations),
        }
    }

    pub fn reset(&mut self, config: &DecayConfig) {
        *self = Self::new(config);
    }

    pub fn is_done_before_start(&self) -> bool {
        self.iterations.is_empty()
    }

    pub fn step(&mut self, now_ns: u64, value: &mut f64, config: &EngineConfig) -> bool {
        let now_ms = now_ns as f64 / NANOS_PER_MILLI;
        let start = match self.start_ms {
            Some(start) => start,
            None => {
                // pretend one frame already elapsed so the first step moves
                let start = now_ms - config.frame_interval_ms;
                self.start_ms = Some(start);
                match self.origin {
                    Some(origin) => *value = origin,
                    None => self.origin = Some(*value),
                }
                self.last_value = *value;
                start
            }
        };
        let from = self.origin.unwrap_or(*value);
        let k = 1.0 - self.deceleration;
        let next = from + self.velocity / k * (1.0 - (-k * (now_ms - start)).exp());

        if (self.last_value - next).abs() < config.decay_rest_delta {
            if !self.iterations.advance() {
                return true;
            }
            // next loop restarts from the origin on the following step
            self.start_ms = None;
        }
        self.last_value = next;
        *value = next;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_NS: u64 = 16_666_667;

    fn config(iterations: i32) -> DecayConfig {
        DecayConfig {
            velocity: 1.0,
            deceleration: 0.997,
            iterations,
        }
    }

    #[test]
    fn moves_monotonically_then_rests() {
        let cfg = EngineConfig::default();
        let mut driver = DecayDriver::new(&config(1));
        let mut value = 0.0;
        let mut prev = value;
        let mut t = 0;
        let mut finished = false;
        for _ in 0..2_000 {
            t += FRAME_NS;
            if driver.step(t, &mut value, &cfg) {
                finished = true;
                break;
            }
            assert!(value >= prev);
            prev = value;
        }
        assert!(finished);
        // asymptote is velocity / (1 - deceleration)
        assert!(value < 1.0 / 0.003 + 1e-6);
        assert!(value > 300.0);
    }

    #[test]
    fn first_step_advances_by_one_frame() {
        let cfg = EngineConfig::default();
        let mut driver = DecayDriver::new(&config(1));
        let mut value = 10.0;
        driver.step(5 * FRAME_NS, &mut value, &cfg);
        let k = 1.0 - 0.997;
        let expected = 10.0 + 1.0 / k * (1.0 - (-k * cfg.frame_interval_ms).exp());
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn second_iteration_restarts_from_origin() {
        let cfg = EngineConfig::default();
        let mut driver = DecayDriver::new(&config(2));
        let mut value = 0.0;
        let mut t = 0;
        let mut rests = 0;
        while rests == 0 {
            t += FRAME_NS;
            let before = driver.iterations.current();
            driver.step(t, &mut value, &cfg);
            if driver.iterations.current() != before {
                rests += 1;
            }
        }
        t += FRAME_NS;
        driver.step(t, &mut value, &cfg);
        assert!(value < 20.0);
    }

    #[test]
    fn loop_boundary_still_writes_the_step() {
        let cfg = EngineConfig::default();
        let mut driver = DecayDriver::new(&config(2));
        let k = 1.0 - 0.997;
        let start_ms = FRAME_NS as f64 / NANOS_PER_MILLI - cfg.frame_interval_ms;
        let mut value = 0.0;
        let mut t = 0;
        loop {
            t += FRAME_NS;
            let before = driver.iterations.current();
            let finished = driver.step(t, &mut value, &cfg);
            assert!(!finished);
            if driver.iterations.current() != before {
                break;
            }
        }
        let now_ms = t as f64 / NANOS_PER_MILLI;
        let expected = 1.0 / k * (1.0 - (-k * (now_ms - start_ms)).exp());
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn reset_restarts_from_current_value() {
        let cfg = EngineConfig::default();
        let mut driver = DecayDriver::new(&config(1));
        let mut value = 0.0;
        let mut t = 0;
        for _ in 0..30 {
            t += FRAME_NS;
            driver.step(t, &mut value, &cfg);
        }
        let current = value;
        assert!(current > 100.0);

        driver.reset(&DecayConfig {
            velocity: -0.5,
            deceleration: 0.99,
            iterations: 1,
        });
        t += FRAME_NS;
        driver.step(t, &mut value, &cfg);
        let k = 1.0 - 0.99;
        let expected = current + -0.5 / k * (1.0 - (-k * cfg.frame_interval_ms).exp());
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_iterations_is_done_immediately() {
        let driver = DecayDriver::new(&config(0));
        assert!(driver.is_done_before_start());
    }
}

//! Temporal conditioning of the raw ambient light stream.
//!
//! Light sensors are noisy and report at irregular intervals, so the engine never feeds
//! raw readings to the curve during continuous operation. Two interchangeable strategies
//! sit behind the same `ingest`/`reset` contract:
//!
//! - **Exponential** (default): an exponential moving average whose weight depends on
//!   the elapsed time, `alpha = 1 - e^(-dt/tau)`. Irregular sample spacing is handled
//!   naturally because a long gap weighs the new reading more.
//! - **Window**: the arithmetic mean of the readings in the trailing time window.

use std::collections::VecDeque;

use anyhow::Result;

use super::sample::Sample;

/// Smoothing strategy and its time parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingStrategy {
    /// Time-decayed exponential moving average with time constant tau
    Exponential { time_constant_ms: u64 },
    /// Mean of the samples within the trailing window
    Window { window_ms: u64 },
}

impl SmoothingStrategy {
    /// Resolve the configured strategy name (`"ema"` or `"window"`).
    pub fn parse(name: &str, time_constant_ms: u64, window_ms: u64) -> Result<Self> {
        match name {
            "ema" => Ok(Self::Exponential { time_constant_ms }),
            "window" => Ok(Self::Window { window_ms }),
            other => anyhow::bail!("smoothing must be \"ema\" or \"window\" (got \"{other}\")"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exponential { .. } => "ema",
            Self::Window { .. } => "window",
        }
    }

    /// Time constant or window length, whichever the strategy uses.
    pub fn period_ms(&self) -> u64 {
        match self {
            Self::Exponential { time_constant_ms } => *time_constant_ms,
            Self::Window { window_ms } => *window_ms,
        }
    }
}

#[derive(Debug, Clone)]
enum SmootherState {
    Empty,
    Exponential {
        smoothed_lux: f64,
        last_update_ms: i64,
    },
    Window {
        samples: VecDeque<Sample>,
        sum: f64,
    },
}

/// Filters raw samples into a stable lux value.
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    strategy: SmoothingStrategy,
    state: SmootherState,
}

impl TemporalSmoother {
    pub fn new(strategy: SmoothingStrategy) -> Self {
        Self {
            strategy,
            state: SmootherState::Empty,
        }
    }

    /// Discard all retained state; the next sample is treated as the first.
    pub fn reset(&mut self) {
        self.state = SmootherState::Empty;
    }

    /// Current filtered value, if any sample has been ingested since the last reset.
    pub fn value(&self) -> Option<f64> {
        match &self.state {
            SmootherState::Empty => None,
            SmootherState::Exponential { smoothed_lux, .. } => Some(*smoothed_lux),
            SmootherState::Window { samples, sum } => {
                (!samples.is_empty()).then(|| sum / samples.len() as f64)
            }
        }
    }

    /// Feed one sample and return the filtered lux.
    pub fn ingest(&mut self, sample: Sample) -> f64 {
        match self.strategy {
            SmoothingStrategy::Exponential { time_constant_ms } => {
                self.ingest_exponential(sample, time_constant_ms)
            }
            SmoothingStrategy::Window { window_ms } => self.ingest_window(sample, window_ms),
        }
    }

    fn ingest_exponential(&mut self, sample: Sample, time_constant_ms: u64) -> f64 {
        let SmootherState::Exponential {
            smoothed_lux,
            last_update_ms,
        } = &mut self.state
        else {
            self.state = SmootherState::Exponential {
                smoothed_lux: sample.lux,
                last_update_ms: sample.timestamp_ms,
            };
            return sample.lux;
        };

        let dt = sample.timestamp_ms - *last_update_ms;
        if dt <= 0 {
            // Duplicate or out-of-order timestamp: no-op tick
            return *smoothed_lux;
        }

        let tau = time_constant_ms.max(1) as f64;
        let alpha = 1.0 - (-(dt as f64) / tau).exp();
        *smoothed_lux += alpha * (sample.lux - *smoothed_lux);
        *last_update_ms = sample.timestamp_ms;
        *smoothed_lux
    }

    fn ingest_window(&mut self, sample: Sample, window_ms: u64) -> f64 {
        let SmootherState::Window { samples, sum } = &mut self.state else {
            self.state = SmootherState::Window {
                samples: VecDeque::from([sample]),
                sum: sample.lux,
            };
            return sample.lux;
        };

        if let Some(newest) = samples.back()
            && sample.timestamp_ms < newest.timestamp_ms
        {
            return *sum / samples.len() as f64;
        }

        samples.push_back(sample);
        *sum += sample.lux;

        let cutoff = sample.timestamp_ms.saturating_sub(window_ms as i64);
        while let Some(oldest) = samples.front() {
            if oldest.timestamp_ms >= cutoff {
                break;
            }
            *sum -= oldest.lux;
            samples.pop_front();
        }

        if samples.len() == 1 {
            // Re-anchor so rounding drift never outlives the window contents
            *sum = sample.lux;
        }

        *sum / samples.len() as f64
    }
}

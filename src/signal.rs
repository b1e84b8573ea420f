//! # Chain signal
//! Weighted-random stand-in for on-chain telemetry. Every call is independent;
//! an injectable [`Pacing`] strategy emulates the latency of a real lookup.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Categorical auxiliary signal attached to each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainSignal {
    #[serde(rename = "LOW_GAS")]
    LowGas,
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "WHALE_ALERT")]
    WhaleAlert,
    /// Simulation disabled for the run.
    #[serde(rename = "N/A")]
    NotApplicable,
}

/// Sampling weights; they sum to 1.0.
pub const SIGNAL_WEIGHTS: [(ChainSignal, f64); 3] = [
    (ChainSignal::LowGas, 0.4),
    (ChainSignal::Normal, 0.5),
    (ChainSignal::WhaleAlert, 0.1),
];

impl ChainSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainSignal::LowGas => "LOW_GAS",
            ChainSignal::Normal => "NORMAL",
            ChainSignal::WhaleAlert => "WHALE_ALERT",
            ChainSignal::NotApplicable => "N/A",
        }
    }

    /// Lenient parse of the stored label; unknown labels map to `None`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW_GAS" => Some(ChainSignal::LowGas),
            "NORMAL" => Some(ChainSignal::Normal),
            "WHALE_ALERT" => Some(ChainSignal::WhaleAlert),
            "N/A" => Some(ChainSignal::NotApplicable),
            _ => None,
        }
    }

    /// Map a uniform draw `u` in [0, 1) onto the weight table.
    pub fn from_uniform(u: f64) -> Self {
        let mut acc = 0.0;
        for (signal, weight) in SIGNAL_WEIGHTS {
            acc += weight;
            if u < acc {
                return signal;
            }
        }
        // Floating-point slack at the top end.
        SIGNAL_WEIGHTS[SIGNAL_WEIGHTS.len() - 1].0
    }

    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_uniform(rng.random::<f64>())
    }
}

impl fmt::Display for ChainSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delay applied before each simulated lookup returns.
pub trait Pacing: Send + Sync {
    fn next_delay(&self) -> Option<Duration>;
}

/// Uniform random delay in `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    min: Duration,
    max: Duration,
}

impl RandomDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }
}

impl Default for RandomDelay {
    fn default() -> Self {
        Self::from_millis(50, 150)
    }
}

impl Pacing for RandomDelay {
    fn next_delay(&self) -> Option<Duration> {
        let lo = self.min.as_micros() as u64;
        let hi = self.max.as_micros() as u64;
        let us = rand::rng().random_range(lo..=hi);
        Some(Duration::from_micros(us))
    }
}

/// No delay; for tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacing for NoDelay {
    fn next_delay(&self) -> Option<Duration> {
        None
    }
}

pub struct ChainSimulator {
    pacing: Box<dyn Pacing>,
}

impl ChainSimulator {
    pub fn new(pacing: impl Pacing + 'static) -> Self {
        Self {
            pacing: Box::new(pacing),
        }
    }

    pub fn without_delay() -> Self {
        Self::new(NoDelay)
    }

    /// Draw one signal, then wait out the pacing delay.
    pub async fn simulate(&self) -> ChainSignal {
        let signal = ChainSignal::sample(&mut rand::rng());
        if let Some(delay) = self.pacing.next_delay() {
            tokio::time::sleep(delay).await;
        }
        signal
    }
}

impl Default for ChainSimulator {
    fn default() -> Self {
        Self::new(RandomDelay::default())
    }
}

impl fmt::Debug for ChainSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainSimulator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = SIGNAL_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_draw_maps_onto_buckets() {
        assert_eq!(ChainSignal::from_uniform(0.0), ChainSignal::LowGas);
        assert_eq!(ChainSignal::from_uniform(0.39), ChainSignal::LowGas);
        assert_eq!(ChainSignal::from_uniform(0.41), ChainSignal::Normal);
        assert_eq!(ChainSignal::from_uniform(0.89), ChainSignal::Normal);
        assert_eq!(ChainSignal::from_uniform(0.95), ChainSignal::WhaleAlert);
        assert_eq!(ChainSignal::from_uniform(1.0), ChainSignal::WhaleAlert);
    }

    #[test]
    fn labels_roundtrip_through_from_label() {
        for s in [
            ChainSignal::LowGas,
            ChainSignal::Normal,
            ChainSignal::WhaleAlert,
            ChainSignal::NotApplicable,
        ] {
            assert_eq!(ChainSignal::from_label(s.as_str()), Some(s));
        }
        assert_eq!(ChainSignal::from_label("whale_alert"), Some(ChainSignal::WhaleAlert));
        assert_eq!(ChainSignal::from_label("MEGA_WHALE"), None);
    }

    #[test]
    fn random_delay_stays_in_bounds() {
        let pacing = RandomDelay::from_millis(150, 50);
        for _ in 0..200 {
            let d = pacing.next_delay().unwrap();
            assert!(d >= Duration::from_millis(50) && d <= Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn simulate_waits_for_the_pacing_delay() {
        let sim = ChainSimulator::new(RandomDelay::from_millis(100, 100));
        let start = tokio::time::Instant::now();
        let _ = sim.simulate().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}

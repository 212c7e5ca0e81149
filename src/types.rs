use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Samples from the device ────────────────────────────────────────────────

/// One validated line from the device: a reading for each of the two channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub ch0: u32,
    pub ch1: u32,
}

impl Sample {
    pub fn new(ch0: u32, ch1: u32) -> Self {
        Self { ch0, ch1 }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH0={:>4}  CH1={:>4}", self.ch0, self.ch1)
    }
}

// ─── Render output ──────────────────────────────────────────────────────────

/// What a render tick hands to a display: the trailing window of both
/// channels plus the axis bounds to draw them against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub ch0: Vec<u32>,
    pub ch1: Vec<u32>,
    /// (low, high) of the vertical axis in ADC counts
    pub vertical_range: (u32, u32),
    /// Horizontal axis span in samples
    pub window_width: usize,
}

impl RenderFrame {
    pub fn len(&self) -> usize {
        self.ch0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ch0.is_empty()
    }

    pub fn latest(&self) -> Option<Sample> {
        Some(Sample::new(*self.ch0.last()?, *self.ch1.last()?))
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

pub const CHANNEL_NAMES: [&str; 2] = ["CH0", "CH1"];

/// History kept per channel, in samples.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Full scale of the device's 12-bit ADC.
pub const ADC_MAX: u32 = 4095;
/// The vertical axis never zooms in past this upper bound.
pub const MIN_VERTICAL_HIGH: u32 = 100;
/// Step applied to the vertical upper bound by the sensitivity commands.
pub const VERTICAL_STEP: u32 = 500;

pub const DEFAULT_WINDOW: usize = 200;
pub const MIN_WINDOW: usize = 50;
pub const WINDOW_STEP: usize = 50;

pub const DEFAULT_BAUD: u32 = 115_200;
pub const SERIAL_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_TICK_MS: u64 = 10;

use crate::line_source::LineSource;
use crate::types::ADC_MAX;
use std::f64::consts::PI;
use std::io;
use std::thread;
use std::time::Duration;

/// Every this many lines the simulator emits a truncated line, the way a
/// real device does when the host attaches mid-print.
const NOISE_EVERY: u64 = 997;

/// Generates device-shaped text lines so the whole pipeline runs without
/// hardware: a sine on CH0 and a sawtooth on CH1, both within ADC range.
pub struct Simulator {
    rate_hz: u32,
    /// Sleep between lines to mimic the device's output rate.
    paced: bool,
    /// Monotonic line counter. Waveform phase is derived from it rather than
    /// wall-clock time, so the output is deterministic.
    counter: u64,
}

impl Simulator {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.max(1),
            paced: true,
            counter: 0,
        }
    }

    /// Emit lines as fast as they are read. For tests.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    fn next_text(&mut self) -> String {
        let n = self.counter;
        self.counter += 1;

        let t = n as f64 / self.rate_hz as f64;
        let mid = ADC_MAX as f64 / 2.0;
        let ch0 = (mid + 0.85 * mid * (2.0 * PI * 5.0 * t).sin()).round() as u32;
        let saw_period = (self.rate_hz as u64 / 2).max(1);
        let ch1 = ((n % saw_period) as f64 / saw_period as f64 * ADC_MAX as f64) as u32;

        if n > 0 && n % NOISE_EVERY == 0 {
            format!("{},\r\n", ch0)
        } else {
            format!("{},{}\r\n", ch0.min(ADC_MAX), ch1.min(ADC_MAX))
        }
    }
}

impl LineSource for Simulator {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.paced {
            thread::sleep(Duration::from_micros(1_000_000 / self.rate_hz as u64));
        }
        Ok(Some(self.next_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_parser::parse_line;

    #[test]
    fn test_lines_parse_and_stay_in_range() {
        let mut sim = Simulator::new(1000).unpaced();
        let mut accepted = 0;
        for _ in 0..NOISE_EVERY {
            let line = sim.read_line().unwrap().unwrap();
            let s = parse_line(&line).expect("clean line");
            assert!(s.ch0 <= ADC_MAX && s.ch1 <= ADC_MAX);
            accepted += 1;
        }
        assert_eq!(accepted, NOISE_EVERY);
    }

    #[test]
    fn test_emits_occasional_noise() {
        let mut sim = Simulator::new(1000).unpaced();
        let rejected = (0..3 * NOISE_EVERY + 1)
            .map(|_| sim.read_line().unwrap().unwrap())
            .filter(|l| parse_line(l).is_none())
            .count();
        assert_eq!(rejected, 3);
    }

    #[test]
    fn test_deterministic() {
        let mut a = Simulator::new(500).unpaced();
        let mut b = Simulator::new(500).unpaced();
        for _ in 0..100 {
            assert_eq!(a.read_line().unwrap(), b.read_line().unwrap());
        }
    }
}

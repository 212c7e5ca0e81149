//! View parameters shared between the keyboard thread and the render loop.
//!
//! Every field is an atomic so a command applied on one thread is visible to
//! the next render tick on another. Adjustments go through `fetch_update`, so
//! they stay saturating even if more than one input source is ever attached.

use crate::types::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// Discrete commands from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    /// Narrower vertical range (lower upper bound)
    IncreaseSensitivity,
    DecreaseSensitivity,
    ResetView,
    NarrowWindow,
    WidenWindow,
    TogglePause,
}

/// Point-in-time copy of the view parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub vertical_range: (u32, u32),
    pub window_width: usize,
    pub paused: bool,
}

impl fmt::Display for ViewSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vertical: [{}, {}], Horizontal: {}{}",
            self.vertical_range.0,
            self.vertical_range.1,
            self.window_width,
            if self.paused { " (paused)" } else { "" },
        )
    }
}

pub struct ViewState {
    /// Upper bound of the vertical axis. The lower bound is fixed at zero.
    high: AtomicU32,
    window_width: AtomicUsize,
    paused: AtomicBool,
    /// Upper bound for `window_width`: the buffer capacity.
    max_window: usize,
    /// Width restored by `ResetView`.
    default_window: usize,
}

impl ViewState {
    /// `max_window` is the ring buffer capacity. It is raised to
    /// `MIN_WINDOW` if smaller, and the starting window shrinks to fit it.
    pub fn new(max_window: usize) -> Self {
        let max_window = max_window.max(MIN_WINDOW);
        let default_window = DEFAULT_WINDOW.min(max_window);
        Self {
            high: AtomicU32::new(ADC_MAX),
            window_width: AtomicUsize::new(default_window),
            paused: AtomicBool::new(false),
            max_window,
            default_window,
        }
    }

    pub fn vertical_range(&self) -> (u32, u32) {
        (0, self.high.load(Ordering::Acquire))
    }

    pub fn window_width(&self) -> usize {
        self.window_width.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn max_window(&self) -> usize {
        self.max_window
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            vertical_range: self.vertical_range(),
            window_width: self.window_width(),
            paused: self.is_paused(),
        }
    }

    /// Apply one command and return the resulting view. Out-of-bound
    /// adjustments clamp; nothing here fails.
    pub fn apply(&self, cmd: ViewCommand) -> ViewSnapshot {
        match cmd {
            ViewCommand::IncreaseSensitivity => {
                update(&self.high, |h| {
                    h.saturating_sub(VERTICAL_STEP).max(MIN_VERTICAL_HIGH)
                });
            }
            ViewCommand::DecreaseSensitivity => {
                update(&self.high, |h| h.saturating_add(VERTICAL_STEP).min(ADC_MAX));
            }
            ViewCommand::ResetView => {
                self.high.store(ADC_MAX, Ordering::Release);
                self.window_width.store(self.default_window, Ordering::Release);
            }
            ViewCommand::NarrowWindow => {
                update_usize(&self.window_width, |w| {
                    w.saturating_sub(WINDOW_STEP).max(MIN_WINDOW)
                });
            }
            ViewCommand::WidenWindow => {
                let max = self.max_window;
                update_usize(&self.window_width, |w| {
                    w.saturating_add(WINDOW_STEP).min(max)
                });
            }
            ViewCommand::TogglePause => {
                self.paused.fetch_xor(true, Ordering::AcqRel);
            }
        }
        self.snapshot()
    }
}

fn update(cell: &AtomicU32, f: impl Fn(u32) -> u32) {
    // The closure always returns Some, so this cannot fail.
    let _ = cell.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(f(v)));
}

fn update_usize(cell: &AtomicUsize, f: impl Fn(usize) -> usize) {
    let _ = cell.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(f(v)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        let snap = view.snapshot();
        assert_eq!(snap.vertical_range, (0, 4095));
        assert_eq!(snap.window_width, 200);
        assert!(!snap.paused);
    }

    #[test]
    fn test_increase_sensitivity_saturates_at_100() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        let expected = [3595, 3095, 2595, 2095, 1595, 1095, 595, 100, 100, 100];
        for &high in &expected {
            let snap = view.apply(ViewCommand::IncreaseSensitivity);
            assert_eq!(snap.vertical_range, (0, high));
        }
    }

    #[test]
    fn test_decrease_sensitivity_saturates_at_full_scale() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        assert_eq!(view.apply(ViewCommand::DecreaseSensitivity).vertical_range, (0, 4095));
        view.apply(ViewCommand::IncreaseSensitivity);
        view.apply(ViewCommand::IncreaseSensitivity);
        assert_eq!(view.vertical_range(), (0, 3095));
        assert_eq!(view.apply(ViewCommand::DecreaseSensitivity).vertical_range, (0, 3595));
        assert_eq!(view.apply(ViewCommand::DecreaseSensitivity).vertical_range, (0, 4095));
    }

    #[test]
    fn test_sensitivity_round_trip_from_floor() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        for _ in 0..20 {
            view.apply(ViewCommand::IncreaseSensitivity);
        }
        assert_eq!(view.apply(ViewCommand::DecreaseSensitivity).vertical_range, (0, 600));
    }

    #[test]
    fn test_window_bounds() {
        let view = ViewState::new(300);
        assert_eq!(view.apply(ViewCommand::WidenWindow).window_width, 250);
        assert_eq!(view.apply(ViewCommand::WidenWindow).window_width, 300);
        assert_eq!(view.apply(ViewCommand::WidenWindow).window_width, 300);
        for _ in 0..10 {
            view.apply(ViewCommand::NarrowWindow);
        }
        assert_eq!(view.window_width(), 50);
    }

    #[test]
    fn test_small_capacity_shrinks_window() {
        let view = ViewState::new(100);
        assert_eq!(view.window_width(), 100);
        assert_eq!(view.apply(ViewCommand::WidenWindow).window_width, 100);
        assert_eq!(view.apply(ViewCommand::NarrowWindow).window_width, 50);
        assert_eq!(view.apply(ViewCommand::NarrowWindow).window_width, 50);
        assert_eq!(view.apply(ViewCommand::ResetView).window_width, 100);
    }

    #[test]
    fn test_capacity_below_min_window_is_raised() {
        let view = ViewState::new(10);
        assert_eq!(view.max_window(), MIN_WINDOW);
        assert_eq!(view.window_width(), MIN_WINDOW);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        view.apply(ViewCommand::IncreaseSensitivity);
        view.apply(ViewCommand::NarrowWindow);
        view.apply(ViewCommand::NarrowWindow);
        for _ in 0..2 {
            let snap = view.apply(ViewCommand::ResetView);
            assert_eq!(snap.vertical_range, (0, 4095));
            assert_eq!(snap.window_width, 200);
        }
    }

    #[test]
    fn test_reset_leaves_pause_alone() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        view.apply(ViewCommand::TogglePause);
        assert!(view.apply(ViewCommand::ResetView).paused);
    }

    #[test]
    fn test_toggle_pause_twice_restores() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        assert!(view.apply(ViewCommand::TogglePause).paused);
        assert!(!view.apply(ViewCommand::TogglePause).paused);
    }

    #[test]
    fn test_concurrent_commands_stay_in_bounds() {
        use std::sync::Arc;
        use std::thread;

        let view = Arc::new(ViewState::new(DEFAULT_CAPACITY));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let view = Arc::clone(&view);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let cmd = if i % 2 == 0 {
                            ViewCommand::WidenWindow
                        } else {
                            ViewCommand::IncreaseSensitivity
                        };
                        view.apply(cmd);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(view.window_width(), DEFAULT_CAPACITY);
        assert_eq!(view.vertical_range(), (0, 100));
    }

    #[test]
    fn test_display() {
        let view = ViewState::new(DEFAULT_CAPACITY);
        assert_eq!(view.snapshot().to_string(), "Vertical: [0, 4095], Horizontal: 200");
    }
}

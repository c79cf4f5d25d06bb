//! Vibration-style pulse patterns.
//!
//! A terminal cannot vibrate, so [`FlashVibrator`] exposes the pulse as a
//! shared flag that the UI renders as an inverted flash. The timing follows
//! the device pattern exactly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::NotifyError;

/// Something that can be switched on and off to signal the user.
pub trait Vibrator: Send + Sync {
    fn set(&self, active: bool) -> Result<(), NotifyError>;
}

/// Alternating wait/vibrate durations in milliseconds, starting with a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePattern(pub &'static [u64]);

impl PulsePattern {
    /// Wait 0, vibrate 500, pause 200, vibrate 500.
    pub const ALERT: PulsePattern = PulsePattern(&[0, 500, 200, 500]);

    /// Iterate `(active, duration)` steps. Even positions are pauses.
    pub fn steps(&self) -> impl Iterator<Item = (bool, Duration)> + '_ {
        self.0.iter().enumerate().map(|(i, ms)| (i % 2 == 1, Duration::from_millis(*ms)))
    }

    /// Drive the vibrator through the pattern and leave it off.
    ///
    /// Stops at the first failed state change.
    pub async fn play(&self, vibrator: &dyn Vibrator) -> Result<(), NotifyError> {
        for (active, duration) in self.steps() {
            vibrator.set(active)?;
            if !duration.is_zero() {
                tokio::time::sleep(duration).await;
            }
        }
        vibrator.set(false)
    }
}

/// Renders the pulse as a screen flash.
#[derive(Debug, Clone, Default)]
pub struct FlashVibrator {
    active: Arc<AtomicBool>,
}

impl FlashVibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flash is currently on.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

impl Vibrator for FlashVibrator {
    fn set(&self, active: bool) -> Result<(), NotifyError> {
        self.active.store(active, Ordering::Relaxed);
        Ok(())
    }
}

/// Ignores pulses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVibrator;

impl Vibrator for NoopVibrator {
    fn set(&self, _active: bool) -> Result<(), NotifyError> {
        Ok(())
    }
}

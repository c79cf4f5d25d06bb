//! Alert dispatch: surface the message, play the sound, pulse.
//!
//! ```text
//! AlertDispatcher::on_alert(msg)
//!        │
//!        ├──▶ AlertSurface::show(msg)          (synchronous)
//!        ├──▶ spawn: SoundHandle::acquire → play (fire-and-forget)
//!        └──▶ spawn: PulsePattern::ALERT.play    (fire-and-forget)
//! ```
//!
//! Failures in the spawned tasks are logged and dropped. Repeated alerts are
//! not coalesced: every call surfaces and notifies independently.

pub mod pulse;
pub mod sound;

pub use pulse::{FlashVibrator, NoopVibrator, PulsePattern, Vibrator};
pub use sound::{BellLoader, CommandLoader, Sound, SoundHandle, SoundLoader};

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Where alert messages are shown to the user.
pub trait AlertSurface: Send {
    fn show(&mut self, message: &str);
}

/// An alert waiting for the user to dismiss it.
#[derive(Debug, Clone)]
pub struct PendingAlert {
    pub message: String,
    pub received: Instant,
}

/// FIFO of undismissed alerts, shared between the dispatcher and the UI.
///
/// The front alert is rendered as a modal overlay until dismissed.
#[derive(Debug, Clone, Default)]
pub struct AlertQueue {
    pending: Arc<Mutex<VecDeque<PendingAlert>>>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn front(&self) -> Option<PendingAlert> {
        self.pending.lock().front().cloned()
    }

    /// Dismiss the front alert, returning it.
    pub fn dismiss(&self) -> Option<PendingAlert> {
        self.pending.lock().pop_front()
    }

    /// All pending alerts, oldest first.
    pub fn snapshot(&self) -> Vec<PendingAlert> {
        self.pending.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl AlertSurface for AlertQueue {
    fn show(&mut self, message: &str) {
        self.pending.lock().push_back(PendingAlert {
            message: message.to_string(),
            received: Instant::now(),
        });
    }
}

/// Routes alert messages to the surface, the sound and the vibrator.
pub struct AlertDispatcher {
    surface: Box<dyn AlertSurface>,
    sound: SoundHandle,
    vibrator: Arc<dyn Vibrator>,
    pattern: PulsePattern,
    runtime: Handle,
}

impl AlertDispatcher {
    /// Create a dispatcher that spawns its notification tasks on `runtime`.
    pub fn new(
        surface: Box<dyn AlertSurface>,
        sound: SoundHandle,
        vibrator: Arc<dyn Vibrator>,
        runtime: Handle,
    ) -> Self {
        Self {
            surface,
            sound,
            vibrator,
            pattern: PulsePattern::ALERT,
            runtime,
        }
    }

    pub fn sound(&self) -> &SoundHandle {
        &self.sound
    }

    /// Start loading the sound in the background.
    pub fn preload(&self) {
        self.sound.preload(&self.runtime);
    }

    /// Notify the user about an alert. Returns without waiting for sound or pulse.
    pub fn on_alert(&mut self, message: &str) {
        info!(alert = message, "Alert received");
        self.surface.show(message);

        let sound = self.sound.clone();
        self.runtime.spawn(async move {
            if let Err(e) = sound.acquire().and_then(|s| s.play()) {
                warn!(error = %e, "Failed to play alert sound");
            }
        });

        let vibrator = self.vibrator.clone();
        let pattern = self.pattern;
        self.runtime.spawn(async move {
            if let Err(e) = pattern.play(vibrator.as_ref()).await {
                warn!(error = %e, "Failed to vibrate");
            }
        });
    }

    /// Release the sound resource.
    pub fn shutdown(&self) {
        self.sound.release();
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("sound", &self.sound)
            .field("pattern", &self.pattern)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::sound::tests::CountingLoader;
    use super::*;
    use crate::error::NotifyError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingVibrator {
        ons: AtomicUsize,
    }

    impl Vibrator for CountingVibrator {
        fn set(&self, active: bool) -> Result<(), NotifyError> {
            if active {
                self.ons.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    struct BrokenVibrator;

    impl Vibrator for BrokenVibrator {
        fn set(&self, _active: bool) -> Result<(), NotifyError> {
            Err(NotifyError::Vibration("unsupported".to_string()))
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_surfaces_and_notifies() {
        let queue = AlertQueue::new();
        let loader = CountingLoader::default();
        let plays = loader.plays.clone();
        let vibrator = Arc::new(CountingVibrator::default());

        let mut dispatcher = AlertDispatcher::new(
            Box::new(queue.clone()),
            SoundHandle::new(Box::new(loader)),
            vibrator.clone(),
            Handle::current(),
        );

        dispatcher.on_alert("Fire detected");
        assert_eq!(queue.front().unwrap().message, "Fire detected");

        settle().await;
        assert_eq!(plays.load(Ordering::SeqCst), 1);
        assert_eq!(vibrator.ons.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_alert_not_coalesced() {
        let queue = AlertQueue::new();
        let loader = CountingLoader::default();
        let plays = loader.plays.clone();
        let loads = loader.loads.clone();
        let vibrator = Arc::new(CountingVibrator::default());

        let mut dispatcher = AlertDispatcher::new(
            Box::new(queue.clone()),
            SoundHandle::new(Box::new(loader)),
            vibrator.clone(),
            Handle::current(),
        );

        dispatcher.on_alert("one");
        dispatcher.on_alert("two");
        assert_eq!(queue.len(), 2);

        settle().await;
        assert_eq!(plays.load(Ordering::SeqCst), 2);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(vibrator.ons.load(Ordering::SeqCst), 4);

        assert_eq!(queue.dismiss().unwrap().message, "one");
        assert_eq!(queue.dismiss().unwrap().message, "two");
        assert!(queue.dismiss().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sound_failure_does_not_block_other_channels() {
        let queue = AlertQueue::new();
        let loader = CountingLoader::default();
        loader.failures_left.store(usize::MAX, Ordering::SeqCst);
        let vibrator = Arc::new(CountingVibrator::default());

        let mut dispatcher = AlertDispatcher::new(
            Box::new(queue.clone()),
            SoundHandle::new(Box::new(loader)),
            vibrator.clone(),
            Handle::current(),
        );

        dispatcher.on_alert("Gas leak");
        settle().await;

        assert_eq!(queue.len(), 1);
        assert_eq!(vibrator.ons.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vibration_failure_does_not_block_sound() {
        let queue = AlertQueue::new();
        let loader = CountingLoader::default();
        let plays = loader.plays.clone();

        let mut dispatcher = AlertDispatcher::new(
            Box::new(queue.clone()),
            SoundHandle::new(Box::new(loader)),
            Arc::new(BrokenVibrator),
            Handle::current(),
        );

        dispatcher.on_alert("Gas leak");
        settle().await;

        assert_eq!(queue.len(), 1);
        assert_eq!(plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_releases_sound() {
        let loader = CountingLoader::default();
        let unloads = loader.unloads.clone();
        let sound = SoundHandle::new(Box::new(loader));
        sound.acquire().unwrap();

        let dispatcher = AlertDispatcher::new(
            Box::new(AlertQueue::new()),
            sound.clone(),
            Arc::new(NoopVibrator),
            Handle::current(),
        );
        dispatcher.shutdown();

        assert_eq!(unloads.load(Ordering::SeqCst), 1);
        assert!(!sound.is_loaded());
    }
}

//! Alert sound resource.
//!
//! The sound is loaded at most once per session and shared by every alert.
//! [`SoundHandle`] owns that lifecycle: it is preloaded at session start,
//! lazily loaded if preloading failed, and released on teardown.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::NotifyError;

/// A loaded, playable sound.
pub trait Sound: Send + Sync {
    /// Start playback from the beginning. Must not block on completion.
    fn play(&self) -> Result<(), NotifyError>;

    /// Free the underlying resource.
    fn unload(&self) {}
}

/// Produces a [`Sound`].
pub trait SoundLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Sound>, NotifyError>;

    /// Short name for logs and the status bar.
    fn describe(&self) -> String;
}

enum Slot {
    Empty,
    Loaded(Arc<dyn Sound>),
    Released,
}

struct Inner {
    loader: Box<dyn SoundLoader>,
    slot: Mutex<Slot>,
}

/// Shared acquire-once handle around the alert sound.
#[derive(Clone)]
pub struct SoundHandle {
    inner: Arc<Inner>,
}

impl SoundHandle {
    pub fn new(loader: Box<dyn SoundLoader>) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                slot: Mutex::new(Slot::Empty),
            }),
        }
    }

    /// Return the loaded sound, loading it now if necessary.
    ///
    /// A failed load leaves the handle empty, so the next call tries again.
    pub fn acquire(&self) -> Result<Arc<dyn Sound>, NotifyError> {
        let mut slot = self.inner.slot.lock();
        match &*slot {
            Slot::Loaded(sound) => Ok(sound.clone()),
            Slot::Released => Err(NotifyError::Playback("sound already released".to_string())),
            Slot::Empty => {
                let sound = self.inner.loader.load()?;
                debug!(sound = %self.inner.loader.describe(), "Loaded alert sound");
                *slot = Slot::Loaded(sound.clone());
                Ok(sound)
            }
        }
    }

    /// Load in the background so the first alert does not pay for it.
    ///
    /// Loaders may touch the filesystem, so this runs on the blocking pool.
    pub fn preload(&self, runtime: &tokio::runtime::Handle) -> JoinHandle<()> {
        let handle = self.clone();
        runtime.spawn_blocking(move || {
            if let Err(e) = handle.acquire() {
                warn!(error = %e, "Failed to preload alert sound");
            }
        })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.inner.slot.lock(), Slot::Loaded(_))
    }

    /// Unload the sound. Safe to call more than once.
    pub fn release(&self) {
        let previous = std::mem::replace(&mut *self.inner.slot.lock(), Slot::Released);
        if let Slot::Loaded(sound) = previous {
            sound.unload();
            info!("Released alert sound");
        }
    }

    pub fn describe(&self) -> String {
        self.inner.loader.describe()
    }
}

impl fmt::Debug for SoundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundHandle")
            .field("sound", &self.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Rings the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellLoader;

struct Bell;

impl Sound for Bell {
    fn play(&self) -> Result<(), NotifyError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(b"\x07")
            .and_then(|_| stdout.flush())
            .map_err(|e| NotifyError::Playback(e.to_string()))
    }
}

impl SoundLoader for BellLoader {
    fn load(&self) -> Result<Arc<dyn Sound>, NotifyError> {
        Ok(Arc::new(Bell))
    }

    fn describe(&self) -> String {
        "bell".to_string()
    }
}

/// Plays a sound file through an external player, e.g. `paplay alarm.ogg`.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    player: String,
    path: PathBuf,
}

impl CommandLoader {
    pub fn new(player: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            player: player.into(),
            path: path.into(),
        }
    }
}

struct CommandSound {
    player: String,
    path: PathBuf,
}

impl Sound for CommandSound {
    fn play(&self) -> Result<(), NotifyError> {
        // The child is reaped by tokio in the background once dropped.
        tokio::process::Command::new(&self.player)
            .arg(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|e| NotifyError::Playback(format!("{}: {}", self.player, e)))
    }
}

impl SoundLoader for CommandLoader {
    fn load(&self) -> Result<Arc<dyn Sound>, NotifyError> {
        std::fs::File::open(&self.path).map_err(|source| NotifyError::SoundUnavailable {
            path: self.path.clone(),
            source,
        })?;
        Ok(Arc::new(CommandSound {
            player: self.player.clone(),
            path: self.path.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("{} {}", self.player, self.path.display())
    }
}

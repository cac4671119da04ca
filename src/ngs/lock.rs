// lock.rs - Scheduler and voice lock scopes

//! The two nested lock scopes a voice module runs under.
//!
//! The caller enters a module with the scheduler-wide (reentrant) lock held,
//! then the voice lock. Guest callbacks may call back into the scheduler, so
//! both scopes are dropped around every callback: voice first, then
//! scheduler, and reacquired scheduler first afterwards.

use std::ops::{Deref, DerefMut};

use parking_lot::{MutexGuard, ReentrantMutexGuard};

/// Both lock guards held while a voice is processed.
///
/// Derefs to the data protected by the voice lock.
pub struct VoiceLocks<'a, S, V> {
    scheduler: ReentrantMutexGuard<'a, S>,
    voice: MutexGuard<'a, V>,
}

impl<'a, S, V> VoiceLocks<'a, S, V> {
    /// Wrap guards that were acquired scheduler first, voice second
    pub fn new(scheduler: ReentrantMutexGuard<'a, S>, voice: MutexGuard<'a, V>) -> Self {
        Self { scheduler, voice }
    }

    /// Run `f` with both scopes released.
    ///
    /// Anything borrowed from the voice data must not be held across this
    /// call; the borrow checker enforces it since `self` is borrowed mutably.
    pub fn unlocked<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let scheduler = &mut self.scheduler;
        MutexGuard::unlocked(&mut self.voice, || {
            ReentrantMutexGuard::unlocked(scheduler, f)
        })
    }
}

impl<S, V> Deref for VoiceLocks<'_, S, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.voice
    }
}

impl<S, V> DerefMut for VoiceLocks<'_, S, V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.voice
    }
}

//! Tween scheduler — time-based interpolation of scalar parameters.
//!
//! DESIGN
//! ======
//! A `TweenManager` owns a list of tween slots. Each slot is shared with a
//! cloneable `Tweener` handle so HTTP handlers can retrigger transitions while
//! the frame driver advances them. The driver calls `update()` once per frame;
//! every active slot samples its easing curve and delivers the value to its
//! callback.
//!
//! Retriggering a handle mid-flight starts the new transition from the value
//! interpolated at that instant, so the output never jumps.
//!
//! Callbacks run while the slot lock is held. They must not block and must
//! not call back into their own `Tweener`.

pub mod easing;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Easing curve mapping normalized time `[0, 1]` to normalized progress.
pub type Easing = fn(f64) -> f64;

type Callback = Box<dyn FnMut(f64) + Send>;

// =============================================================================
// TRANSITION
// =============================================================================

#[derive(Clone, Copy)]
struct Transition {
    start: f64,
    target: f64,
    duration: Duration,
    easing: Easing,
    started_at: Instant,
}

impl Transition {
    /// Interpolated value at `now`, and whether the transition has finished.
    fn sample(&self, now: Instant) -> (f64, bool) {
        let elapsed = now.saturating_duration_since(self.started_at);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        };

        if t >= 1.0 {
            return (self.target, true);
        }

        let progress = (self.easing)(t);
        (self.start + (self.target - self.start) * progress, false)
    }
}

// =============================================================================
// SLOT
// =============================================================================

struct TweenSlot {
    current: f64,
    transition: Option<Transition>,
    callback: Callback,
}

impl TweenSlot {
    fn value_at(&self, now: Instant) -> f64 {
        self.transition
            .map_or(self.current, |tr| tr.sample(now).0)
    }

    fn advance(&mut self, now: Instant) {
        let Some(transition) = self.transition else {
            return;
        };
        let (value, done) = transition.sample(now);
        self.current = value;
        if done {
            self.transition = None;
        }
        (self.callback)(value);
    }
}

fn lock(slot: &Mutex<TweenSlot>) -> MutexGuard<'_, TweenSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// TWEENER HANDLE
// =============================================================================

/// Handle to one registered tween slot.
#[derive(Clone)]
pub struct Tweener {
    slot: Arc<Mutex<TweenSlot>>,
}

impl Tweener {
    /// Start a transition from the current interpolated value to `target`.
    ///
    /// Replaces any transition already in flight on this handle.
    pub fn tween(&self, target: f64, duration: Duration, easing: Easing) {
        self.tween_at(target, duration, easing, Instant::now());
    }

    pub(crate) fn tween_at(&self, target: f64, duration: Duration, easing: Easing, now: Instant) {
        let mut slot = lock(&self.slot);
        let start = slot.value_at(now);
        slot.current = start;
        slot.transition = Some(Transition { start, target, duration, easing, started_at: now });
    }

    /// Last value delivered by the scheduler (or the initial value).
    #[must_use]
    pub fn value(&self) -> f64 {
        lock(&self.slot).current
    }

    /// Target of the running transition, or the settled value when idle.
    #[must_use]
    pub fn target(&self) -> f64 {
        let slot = lock(&self.slot);
        slot.transition.map_or(slot.current, |tr| tr.target)
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        lock(&self.slot).transition.is_some()
    }
}

// =============================================================================
// MANAGER
// =============================================================================

/// Registry of tween slots advanced together once per frame.
#[derive(Default)]
pub struct TweenManager {
    slots: Vec<Arc<Mutex<TweenSlot>>>,
}

impl TweenManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot holding `initial` and return its handle.
    ///
    /// `callback` receives every interpolated value while a transition runs,
    /// including the exact target once on completion.
    pub fn new_tweener<F>(&mut self, callback: F, initial: f64) -> Tweener
    where
        F: FnMut(f64) + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(TweenSlot {
            current: initial,
            transition: None,
            callback: Box::new(callback),
        }));
        self.slots.push(Arc::clone(&slot));
        Tweener { slot }
    }

    /// Advance every active tween to the current instant.
    pub fn update(&self) {
        self.update_at(Instant::now());
    }

    pub(crate) fn update_at(&self, now: Instant) {
        for slot in &self.slots {
            lock(slot).advance(now);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

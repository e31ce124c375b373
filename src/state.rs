//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the `active` flag plus handles to the opacity and brightness tweens;
//! the tweens themselves are advanced by the frame driver, so handlers only
//! retrigger them and return immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::tween::{Tweener, easing};

/// Shared application state, injected into Axum handlers via State extractor.
/// Cheap to clone: the flag is shared and tween handles point at the same slots.
#[derive(Clone)]
pub struct AppState {
    active: Arc<AtomicBool>,
    pub opacity: Tweener,
    pub brightness: Tweener,
    pub active_fade: Duration,
    pub brightness_fade: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(
        active: bool,
        opacity: Tweener,
        brightness: Tweener,
        active_fade: Duration,
        brightness_fade: Duration,
    ) -> Self {
        Self { active: Arc::new(AtomicBool::new(active)), opacity, brightness, active_fade, brightness_fade }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Record the new state and fade opacity toward fully on or fully off.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
        let target = if active { 1.0 } else { 0.0 };
        self.opacity
            .tween(target, self.active_fade, easing::ease_out);
    }

    /// Fade device brightness toward `percent` (clamped to 0–100).
    pub fn set_brightness(&self, percent: u8) {
        self.brightness
            .tween(f64::from(percent.min(100)), self.brightness_fade, easing::ease_in_out_cubic);
    }
}

/// Round an animated level to an integer percentage.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::tween::TweenManager;

    /// Create a test `AppState` with tweens registered on `manager`.
    #[must_use]
    pub fn test_app_state(manager: &mut TweenManager, active: bool) -> AppState {
        let opacity = manager.new_tweener(|_| {}, if active { 1.0 } else { 0.0 });
        let brightness = manager.new_tweener(|_| {}, 100.0);
        AppState::new(active, opacity, brightness, Duration::from_millis(2000), Duration::from_millis(1000))
    }
}

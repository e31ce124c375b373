//! Frame driver — paces tween updates and pattern frames to the device rate.
//!
//! DESIGN
//! ======
//! One task owns the tween scheduler and the frame source. Each tick it
//! advances every tween, renders a frame, applies the opacity fade and hands
//! the result to the realtime link. Enqueueing never waits on the network,
//! so a tick always finishes before the next one starts; a slow tick simply
//! skips the missed deadlines instead of bursting to catch up.
//!
//! The tick period follows the device's reported frame rate and is rebuilt
//! whenever a re-initialization reports a different one. Until the first
//! successful init the driver ticks at 25 fps and sends nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::color::{Frame, black_frame, fade_frame};
use crate::device::DeviceClient;
use crate::device::realtime::FrameError;
use crate::pattern::FrameSource;
use crate::state::percent;
use crate::tween::{TweenManager, Tweener};

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(40);

pub struct FrameDriver<S> {
    device: Arc<DeviceClient>,
    tweens: TweenManager,
    opacity: Tweener,
    source: S,
    started: Instant,
    black: Frame,
}

impl<S: FrameSource> FrameDriver<S> {
    /// `opacity` must be registered on `tweens`.
    #[must_use]
    pub fn new(device: Arc<DeviceClient>, tweens: TweenManager, opacity: Tweener, source: S) -> Self {
        Self { device, tweens, opacity, source, started: Instant::now(), black: Frame::new() }
    }

    /// Run until a frame cannot be encoded.
    ///
    /// # Errors
    ///
    /// Returns the [`FrameError`] that stopped the loop.
    pub async fn run(mut self) -> Result<(), FrameError> {
        let mut period = DEFAULT_FRAME_INTERVAL;
        let mut interval = frame_interval(Instant::now(), period);
        loop {
            interval.tick().await;
            self.tick().await?;

            let next = self
                .device
                .session()
                .device_info()
                .await
                .map_or(DEFAULT_FRAME_INTERVAL, |i| i.frame_interval());
            if next != period {
                info!(period_ms = next.as_millis(), "frame interval changed");
                period = next;
                interval = frame_interval(Instant::now() + period, period);
            }
        }
    }

    /// One frame: advance tweens, render, fade, enqueue.
    ///
    /// Returns whether a frame was queued.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when the device profile cannot be encoded.
    pub async fn tick(&mut self) -> Result<bool, FrameError> {
        self.tick_at(Instant::now()).await
    }

    pub(crate) async fn tick_at(&mut self, now: Instant) -> Result<bool, FrameError> {
        self.tweens.update_at(now.into_std());

        let Some(info) = self.device.session().device_info().await else {
            return Ok(false);
        };
        let leds = info.number_of_leds;

        let opacity = self.opacity.value().clamp(0.0, 1.0);
        if opacity <= 0.0 {
            if self.black.len() != leds {
                self.black = black_frame(leds);
            }
            return self.device.send_frame(&self.black).await;
        }

        let frame = self
            .source
            .frame(leds, now.saturating_duration_since(self.started));
        if opacity < 1.0 {
            self.device
                .send_frame(&fade_frame(&frame, opacity))
                .await
        } else {
            self.device.send_frame(&frame).await
        }
    }
}

fn frame_interval(start: Instant, period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Tween callback that forwards brightness levels to the device.
///
/// Levels are rounded to whole percent and repeated values are dropped, so a
/// one-second fade issues at most one request per percent step.
pub fn brightness_callback(device: Arc<DeviceClient>) -> impl FnMut(f64) + Send + 'static {
    let mut last = None;
    move |value| {
        let level = percent(value);
        if last == Some(level) {
            return;
        }
        last = Some(level);
        if !device.request_brightness(level) {
            debug!(level, "brightness coalesced into in-flight request");
        }
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;

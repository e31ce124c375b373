//! Device client — one authenticated session plus its realtime UDP link.
//!
//! DESIGN
//! ======
//! `DeviceClient` is the single owner of everything tied to one device: the
//! HTTP session (token + metadata) and the realtime link (socket + writer).
//! It is shared by `Arc` between the frame driver, the keep-alive task and
//! HTTP handlers; nothing about the device lives in globals.
//!
//! ERROR HANDLING
//! ==============
//! Transport and protocol failures are logged and returned as `DeviceError`
//! so callers can decide to carry on. Frame encoding errors (`FrameError`)
//! are configuration mistakes and propagate to the caller unchanged.

pub mod realtime;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::color::Color;
use realtime::{FrameError, RealtimeLink, encode_frame};
use session::Session;
use transport::HttpTransport;
use types::{DeviceError, DeviceInfo, LedMode};

pub struct DeviceClient {
    session: Session,
    realtime_target: SocketAddr,
    link: RwLock<Option<RealtimeLink>>,
    brightness_in_flight: AtomicBool,
    brightness_target: AtomicU8,
    /// Mode the device was in before the first switch to realtime.
    restore_mode: OnceLock<LedMode>,
}

impl DeviceClient {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, realtime_target: SocketAddr) -> Self {
        Self {
            session: Session::new(transport),
            realtime_target,
            link: RwLock::new(None),
            brightness_in_flight: AtomicBool::new(false),
            brightness_target: AtomicU8::new(100),
            restore_mode: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full (re)initialization: login, verify, read metadata, switch to
    /// realtime mode and replace the UDP link.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeviceError`] encountered; later steps are skipped.
    pub async fn init(&self) -> Result<DeviceInfo, DeviceError> {
        self.session.login_and_verify().await?;
        let info = self.session.get_device_info().await?;
        self.remember_mode().await;
        self.session.set_mode(LedMode::Rt).await?;
        self.reset_realtime().await?;
        info!(
            leds = info.number_of_leds,
            bytes_per_led = info.bytes_per_led,
            frame_rate = info.frame_rate,
            "device ready for realtime streaming"
        );
        Ok(info)
    }

    /// Record the device's own mode once, before realtime takes over.
    async fn remember_mode(&self) {
        if self.restore_mode.get().is_some() {
            return;
        }
        match self.session.get_mode().await {
            Ok(LedMode::Rt) => debug!("device already in realtime mode; nothing to restore"),
            Ok(mode) => {
                debug!(mode = mode.as_str(), "remembering device mode");
                let _ = self.restore_mode.set(mode);
            }
            Err(e) => warn!(error = %e, "could not read device mode"),
        }
    }

    /// Hand the device back: close the realtime link and restore the mode it
    /// had before the first init (`movie` when unknown).
    ///
    /// # Errors
    ///
    /// Returns the [`DeviceError`] from the mode change. The link is closed
    /// either way.
    pub async fn release(&self) -> Result<LedMode, DeviceError> {
        *self.link.write().await = None;
        let mode = self
            .restore_mode
            .get()
            .copied()
            .unwrap_or(LedMode::Movie);
        self.session.set_mode(mode).await?;
        info!(mode = mode.as_str(), "device released");
        Ok(mode)
    }

    /// Open a fresh UDP link. The previous link is dropped, which stops its
    /// writer and closes its socket.
    async fn reset_realtime(&self) -> Result<(), DeviceError> {
        let link = RealtimeLink::open(self.realtime_target)
            .await
            .map_err(|e| DeviceError::Transport(format!("realtime socket: {e}")))?;
        debug!(local_addr = %link.local_addr(), "realtime link replaced");
        *self.link.write().await = Some(link);
        Ok(())
    }

    pub async fn has_realtime_link(&self) -> bool {
        self.link.read().await.is_some()
    }

    /// Encode `frame` with the current token and queue it for transmission.
    ///
    /// Returns `Ok(false)` when nothing was queued: no session yet, no link,
    /// or the writer is backed up.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] when the device profile cannot be encoded.
    pub async fn send_frame(&self, frame: &[Color]) -> Result<bool, FrameError> {
        let Some(info) = self.session.device_info().await else {
            return Ok(false);
        };
        let token = self.session.token().await;
        if token.is_empty() {
            return Ok(false);
        }

        let packets = encode_frame(&token.bytes, frame, info.bytes_per_led)?;
        let link = self.link.read().await;
        Ok(link.as_ref().is_some_and(|l| l.enqueue(packets)))
    }

    /// Request an output brightness without waiting for it.
    ///
    /// Only one brightness request is in flight at a time. A call made while
    /// one is running is not queued (returns `false`); it only records the
    /// newest target, which the running request sends once it finishes.
    pub fn request_brightness(self: &Arc<Self>, percent: u8) -> bool {
        self.brightness_target
            .store(percent.min(100), Ordering::Release);
        if self.brightness_in_flight.swap(true, Ordering::AcqRel) {
            debug!(percent, "brightness request in flight; skipping");
            return false;
        }
        let client = Arc::clone(self);
        tokio::spawn(async move { client.flush_brightness().await });
        true
    }

    /// Caller must have set `brightness_in_flight`.
    async fn flush_brightness(&self) {
        let mut sent = None;
        loop {
            let percent = self.brightness_target.load(Ordering::Acquire);
            if sent != Some(percent) {
                if let Err(e) = self.session.set_brightness(percent).await {
                    warn!(error = %e, percent, "brightness update failed");
                }
                sent = Some(percent);
                continue;
            }
            self.brightness_in_flight
                .store(false, Ordering::Release);
            // A request may have landed between the load and the store.
            if self.brightness_target.load(Ordering::Acquire) == percent
                || self.brightness_in_flight.swap(true, Ordering::AcqRel)
            {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

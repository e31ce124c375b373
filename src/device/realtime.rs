//! Realtime frame protocol — pixel packing, fragmentation, ordered UDP delivery.
//!
//! WIRE FORMAT
//! ===========
//! Each datagram carries one fragment of one frame:
//!
//! ```text
//! ┌──────┬──────────────┬──────┬──────┬───────┬─────────────────────┐
//! │ 0x03 │ token bytes  │ 0x00 │ 0x00 │ index │ pixel bytes (<=900) │
//! └──────┴──────────────┴──────┴──────┴───────┴─────────────────────┘
//! ```
//!
//! Pixels pack as `[r, g, b]` on 3-channel devices and `[w, r, g, b]` on
//! 4-channel devices. The receiver reassembles by fragment index.
//!
//! DELIVERY
//! ========
//! A `RealtimeLink` owns one UDP socket and a single writer task fed by a
//! bounded queue of whole frames. One writer sending fragments in index order
//! makes ordering structural. Enqueue never blocks the frame timer: when the
//! queue is full the frame is dropped. Dropping the link closes the queue,
//! which ends the writer and closes the socket.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::color::{Color, channel_byte};

pub const PROTOCOL_VERSION: u8 = 0x03;
pub const REALTIME_PORT: u16 = 7777;
pub const MAX_FRAGMENT_PAYLOAD: usize = 900;
pub const MAX_FRAGMENTS: usize = 256;

const FRAME_QUEUE_CAPACITY: usize = 4;

/// Configuration errors in frame encoding. These indicate a wrong device
/// profile or a programming mistake and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("unsupported bytes per LED: {0} (expected 3 or 4)")]
    UnsupportedChannelCount(usize),
    #[error("frame needs {count} fragments, protocol allows at most 256")]
    TooManyFragments { count: usize },
    #[error("fragment payload of {len} bytes exceeds 900")]
    OversizedFragment { len: usize },
}

// =============================================================================
// ENCODING
// =============================================================================

/// Pack a frame into wire pixel bytes.
///
/// # Errors
///
/// Returns [`FrameError::UnsupportedChannelCount`] unless `bytes_per_led` is 3 or 4.
pub fn pack_pixels(frame: &[Color], bytes_per_led: usize) -> Result<Vec<u8>, FrameError> {
    let mut out = Vec::with_capacity(frame.len() * bytes_per_led);
    match bytes_per_led {
        3 => {
            for c in frame {
                out.extend_from_slice(&[channel_byte(c.r), channel_byte(c.g), channel_byte(c.b)]);
            }
        }
        4 => {
            for c in frame {
                out.extend_from_slice(&[
                    channel_byte(c.w.unwrap_or(0.0)),
                    channel_byte(c.r),
                    channel_byte(c.g),
                    channel_byte(c.b),
                ]);
            }
        }
        other => return Err(FrameError::UnsupportedChannelCount(other)),
    }
    Ok(out)
}

/// Build one datagram: header followed by `payload`.
///
/// # Errors
///
/// Returns [`FrameError::OversizedFragment`] if `payload` exceeds 900 bytes.
pub fn encode_packet(token: &[u8], index: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_FRAGMENT_PAYLOAD {
        return Err(FrameError::OversizedFragment { len: payload.len() });
    }
    let mut packet = Vec::with_capacity(1 + token.len() + 3 + payload.len());
    packet.push(PROTOCOL_VERSION);
    packet.extend_from_slice(token);
    packet.extend_from_slice(&[0x00, 0x00, index]);
    packet.extend_from_slice(payload);
    Ok(packet)
}

/// Split packed pixels into datagrams of at most 900 payload bytes each.
///
/// # Errors
///
/// Returns [`FrameError::TooManyFragments`] if the payload needs more than 256 fragments.
pub fn fragment_packets(token: &[u8], payload: &[u8]) -> Result<Vec<Vec<u8>>, FrameError> {
    let count = payload.len().div_ceil(MAX_FRAGMENT_PAYLOAD);
    if count > MAX_FRAGMENTS {
        return Err(FrameError::TooManyFragments { count });
    }
    payload
        .chunks(MAX_FRAGMENT_PAYLOAD)
        .zip(0..=u8::MAX)
        .map(|(chunk, index)| encode_packet(token, index, chunk))
        .collect()
}

/// Pack and fragment a frame in one step.
///
/// # Errors
///
/// Propagates [`FrameError`] from packing or fragmentation.
pub fn encode_frame(token: &[u8], frame: &[Color], bytes_per_led: usize) -> Result<Vec<Vec<u8>>, FrameError> {
    let payload = pack_pixels(frame, bytes_per_led)?;
    fragment_packets(token, &payload)
}

// =============================================================================
// LINK
// =============================================================================

/// One UDP socket plus its ordered writer task.
pub struct RealtimeLink {
    tx: mpsc::Sender<Vec<Vec<u8>>>,
    local_addr: SocketAddr,
}

impl RealtimeLink {
    /// Bind an ephemeral local port and start the writer.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the socket cannot be bound.
    pub async fn open(target: SocketAddr) -> std::io::Result<Self> {
        let bind: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        let local_addr = socket.local_addr()?;
        let (tx, rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
        tokio::spawn(run_writer(socket, target, rx));
        debug!(%local_addr, %target, "realtime link opened");
        Ok(Self { tx, local_addr })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Queue one frame's datagrams. Returns `false` if the frame was dropped.
    pub fn enqueue(&self, packets: Vec<Vec<u8>>) -> bool {
        match self.tx.try_send(packets) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("realtime queue full; dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("realtime writer stopped; dropping frame");
                false
            }
        }
    }
}

async fn run_writer(socket: UdpSocket, target: SocketAddr, mut rx: mpsc::Receiver<Vec<Vec<u8>>>) {
    while let Some(packets) = rx.recv().await {
        for (fragment, packet) in packets.iter().enumerate() {
            if let Err(e) = socket.send_to(packet, target).await {
                warn!(error = %e, fragment, %target, "realtime fragment send failed");
            }
        }
    }
    debug!(%target, "realtime writer stopped");
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;

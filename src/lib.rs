//! twinkly-rt — realtime frame streaming for network-controlled LED strings.
//!
//! ARCHITECTURE
//! ============
//! - `device`: authenticated HTTP session and the realtime UDP link.
//! - `tween` / `color` / `pattern`: animation primitives and frame sources.
//! - `services`: the frame-pacing driver and the keep-alive task.
//! - `routes` / `state`: the small HTTP control plane.

pub mod color;
pub mod config;
pub mod device;
pub mod pattern;
pub mod routes;
pub mod services;
pub mod state;
pub mod tween;

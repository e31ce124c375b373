use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::net::UdpSocket;

use crate::color::Color;
use crate::device::test_helpers::MockDevice;
use crate::device::transport::HttpTransport;
use crate::device::types::DeviceInfo;
use crate::tween::easing;

/// Solid-color source that counts how often it is asked for a frame.
struct FixedSource {
    color: Color,
    calls: Arc<AtomicUsize>,
}

impl FrameSource for FixedSource {
    fn frame(&mut self, number_of_leds: usize, _elapsed: Duration) -> Frame {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![self.color; number_of_leds]
    }
}

struct Harness {
    device: Arc<MockDevice>,
    client: Arc<DeviceClient>,
    receiver: UdpSocket,
    calls: Arc<AtomicUsize>,
    opacity: Tweener,
    driver: FrameDriver<FixedSource>,
}

async fn harness(bytes_per_led: usize, opacity: f64) -> Harness {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let device = Arc::new(MockDevice::new(DeviceInfo { number_of_leds: 4, bytes_per_led, frame_rate: 25.0 }));
    let transport: Arc<dyn HttpTransport> = device.clone();
    let client = Arc::new(DeviceClient::new(transport, receiver.local_addr().unwrap()));

    let mut tweens = TweenManager::new();
    let opacity = tweens.new_tweener(|_| {}, opacity);
    let calls = Arc::new(AtomicUsize::new(0));
    let source = FixedSource { color: Color::rgb(200.0, 100.0, 50.0), calls: Arc::clone(&calls) };
    let driver = FrameDriver::new(Arc::clone(&client), tweens, opacity.clone(), source);
    Harness { device, client, receiver, calls, opacity, driver }
}

/// Pixel bytes of the next datagram (token is `token-1`).
async fn recv_pixels(receiver: &UdpSocket) -> Vec<u8> {
    let mut buf = [0u8; 256];
    let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .expect("frame should arrive")
        .unwrap();
    let header = 1 + b"token-1".len() + 3;
    buf[header..len].to_vec()
}

#[tokio::test]
async fn tick_before_init_sends_nothing() {
    let mut h = harness(3, 1.0).await;
    assert!(!h.driver.tick().await.unwrap());
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn full_opacity_sends_source_frame() {
    let mut h = harness(3, 1.0).await;
    h.client.init().await.unwrap();

    assert!(h.driver.tick().await.unwrap());
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(recv_pixels(&h.receiver).await, [200, 100, 50].repeat(4));
}

#[tokio::test]
async fn zero_opacity_sends_black_without_rendering() {
    let mut h = harness(3, 0.0).await;
    h.client.init().await.unwrap();

    assert!(h.driver.tick().await.unwrap());
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(recv_pixels(&h.receiver).await, vec![0; 12]);
}

#[tokio::test]
async fn partial_opacity_fades_toward_black() {
    let mut h = harness(3, 0.0).await;
    h.client.init().await.unwrap();

    let start = Instant::now();
    h.opacity
        .tween_at(1.0, Duration::from_millis(1000), easing::linear, start.into_std());
    assert!(h.driver.tick_at(start + Duration::from_millis(500)).await.unwrap());

    assert_eq!(recv_pixels(&h.receiver).await, [100, 50, 25].repeat(4));
}

#[tokio::test]
async fn unsupported_profile_fails_tick_and_run() {
    let mut h = harness(5, 1.0).await;
    h.client.init().await.unwrap();

    assert_eq!(h.driver.tick().await, Err(FrameError::UnsupportedChannelCount(5)));

    let result = tokio::time::timeout(Duration::from_secs(2), h.driver.run())
        .await
        .expect("driver should stop on a frame error");
    assert_eq!(result, Err(FrameError::UnsupportedChannelCount(5)));
}

#[tokio::test]
async fn run_streams_frames_after_init() {
    let h = harness(3, 1.0).await;
    h.client.init().await.unwrap();

    let driver = tokio::spawn(h.driver.run());
    assert_eq!(recv_pixels(&h.receiver).await, [200, 100, 50].repeat(4));
    assert_eq!(recv_pixels(&h.receiver).await, [200, 100, 50].repeat(4));
    driver.abort();
    assert!(h.calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn brightness_callback_drops_repeated_levels() {
    let h = harness(3, 1.0).await;
    let mut callback = brightness_callback(Arc::clone(&h.client));

    callback(30.2);
    callback(29.8);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.device.brightness_calls(), vec![30]);

    callback(55.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.device.brightness_calls(), vec![30, 55]);
}

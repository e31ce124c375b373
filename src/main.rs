use std::future::IntoFuture;
use std::sync::Arc;

use twinkly_rt::device::DeviceClient;
use twinkly_rt::device::transport::{HttpTransport, ReqwestTransport};
use twinkly_rt::pattern::{PatternSource, find_palette};
use twinkly_rt::services::driver::{FrameDriver, brightness_callback};
use twinkly_rt::tween::TweenManager;
use twinkly_rt::{config, routes, services, state};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");

    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::new(&config.device_host(), config.http_timeout).expect("http client init failed"),
    );
    let device = Arc::new(DeviceClient::new(transport, config.realtime_target()));

    // Non-fatal: the keep-alive retries until the device answers.
    if let Err(e) = device.init().await {
        tracing::warn!(error = %e, device_ip = %config.device_ip, "initial device init failed");
    }

    let mut tweens = TweenManager::new();
    let opacity = tweens.new_tweener(|_| {}, if config.start_active { 1.0 } else { 0.0 });
    let brightness = tweens.new_tweener(brightness_callback(Arc::clone(&device)), 100.0);

    let palette = find_palette(&config.pattern).expect("pattern validated by config");
    let source = PatternSource::new(palette, config.pattern_step);
    tracing::info!(pattern = source.palette_name(), active = config.start_active, "frame source ready");

    let state = state::AppState::new(
        config.start_active,
        opacity.clone(),
        brightness,
        config.active_fade,
        config.brightness_fade,
    );

    let keepalive = services::keepalive::spawn_keepalive_task(Arc::clone(&device), config.keepalive);
    let mut driver = tokio::spawn(FrameDriver::new(Arc::clone(&device), tweens, opacity, source).run());

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "twinkly-rt listening");
    tokio::select! {
        result = axum::serve(listener, app).into_future() => result.expect("server failed"),
        result = &mut driver => {
            match result {
                Ok(Ok(())) => tracing::error!("frame driver stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "frame driver failed"),
                Err(e) => tracing::error!(error = %e, "frame driver panicked"),
            }
            std::process::exit(1);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            driver.abort();
            keepalive.abort();
            if let Err(e) = device.release().await {
                tracing::warn!(error = %e, "failed to restore device mode");
            }
        }
    }
}

use super::*;
use std::time::Duration;

#[test]
fn device_info_parses_gestalt_fields() {
    let body = serde_json::json!({
        "product_name": "Twinkly",
        "number_of_led": 250,
        "bytes_per_led": 3,
        "frame_rate": 23.5,
        "code": 1000
    });
    let info: DeviceInfo = serde_json::from_value(body).unwrap();
    assert_eq!(info.number_of_leds, 250);
    assert_eq!(info.bytes_per_led, 3);
    assert!((info.frame_rate - 23.5).abs() < f64::EPSILON);
}

#[test]
fn frame_interval_follows_rate() {
    let info = DeviceInfo { number_of_leds: 1, bytes_per_led: 3, frame_rate: 20.0 };
    assert_eq!(info.frame_interval(), Duration::from_millis(50));
}

#[test]
fn frame_interval_falls_back_for_zero_rate() {
    let info = DeviceInfo { number_of_leds: 1, bytes_per_led: 3, frame_rate: 0.0 };
    assert_eq!(info.frame_interval(), Duration::from_millis(40));
}

#[test]
fn frame_interval_falls_back_for_non_finite_rate() {
    for rate in [f64::NAN, f64::INFINITY, -5.0] {
        let info = DeviceInfo { number_of_leds: 1, bytes_per_led: 3, frame_rate: rate };
        assert_eq!(info.frame_interval(), Duration::from_millis(40), "rate {rate}");
    }
}

#[test]
fn frame_interval_clamps_tiny_rate_to_one_second() {
    let info = DeviceInfo { number_of_leds: 1, bytes_per_led: 3, frame_rate: 1e-30 };
    assert_eq!(info.frame_interval(), Duration::from_secs(1));
}

#[test]
fn frame_interval_clamps_huge_rate_to_nonzero_period() {
    let info = DeviceInfo { number_of_leds: 1, bytes_per_led: 3, frame_rate: 1e12 };
    assert_eq!(info.frame_interval(), Duration::from_millis(1));
    assert!(!info.frame_interval().is_zero());
}

#[test]
fn device_info_without_frame_rate_uses_default_interval() {
    let body = serde_json::json!({ "number_of_led": 250, "bytes_per_led": 3, "code": 1000 });
    let info: DeviceInfo = serde_json::from_value(body).unwrap();
    assert_eq!(info.number_of_leds, 250);
    assert_eq!(info.frame_interval(), Duration::from_millis(40));
}

#[test]
fn response_code_and_unauthorized() {
    let ok = DeviceResponse { status: 200, body: serde_json::json!({"code": 1000}) };
    assert_eq!(ok.code(), Some(CODE_OK));
    assert!(!ok.is_unauthorized());

    let denied = DeviceResponse { status: 401, body: serde_json::Value::Null };
    assert!(denied.is_unauthorized());
    assert_eq!(denied.code(), None);
}

#[test]
fn led_mode_wire_names() {
    assert_eq!(serde_json::to_value(LedMode::Rt).unwrap(), serde_json::json!("rt"));
    let parsed: LedMode = serde_json::from_value(serde_json::json!("movie")).unwrap();
    assert_eq!(parsed, LedMode::Movie);
    assert_eq!(LedMode::Off.as_str(), "off");
}

#[test]
fn request_builders_set_fields() {
    let req = DeviceRequest::post("led/mode", serde_json::json!({"mode": "rt"})).with_token("abc");
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.path, "led/mode");
    assert_eq!(req.token.as_deref(), Some("abc"));

    let req = DeviceRequest::get("gestalt");
    assert!(req.body.is_none());
    assert!(req.token.is_none());
}

#[test]
fn display_protocol_error_includes_code() {
    let err = DeviceError::Protocol { code: 1104 };
    assert!(err.to_string().contains("1104"));
}

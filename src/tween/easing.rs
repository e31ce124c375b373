//! Easing curves. Each maps `[0, 1]` onto `[0, 1]` with `f(0) = 0` and `f(1) = 1`.

#[must_use]
pub fn linear(t: f64) -> f64 {
    t
}

#[must_use]
pub fn ease_in_quad(t: f64) -> f64 {
    t * t
}

/// Quadratic deceleration. Used for on/off fades.
#[must_use]
pub fn ease_out(t: f64) -> f64 {
    t * (2.0 - t)
}

#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

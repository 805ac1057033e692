//! Refraction angles and reflectance at the boundary between two media.

use crate::utils::clamp;

/// Snell's law, solved for the transmitted angle. The incoming angle is the
/// signed angle from the surface normal, and the sign survives into the
/// result so the transmitted ray bends on the correct side. Beyond the
/// critical angle the sine is clamped and the result saturates at a quarter
/// turn; reflectance is 1 there, so the transmitted ray carries no energy.
pub fn refraction_angle(incoming_angle: f64, n_from: f64, n_to: f64) -> f64 {
    clamp(incoming_angle.sin() * n_from / n_to, -1.0, 1.0).asin()
}

/// Fraction of energy reflected at the boundary, averaging the s- and
/// p-polarization forms of the Fresnel equations. A negative radicand in
/// the transmitted cosine means total internal reflection and is clamped to
/// zero, which drives both polarization terms to 1.
pub fn reflectance(incoming_angle: f64, n_from: f64, n_to: f64) -> f64 {
    let cos_i = incoming_angle.cos();
    let sin_t = incoming_angle.sin() * n_from / n_to;
    let cos_t = f64::sqrt(f64::max(1.0 - sin_t * sin_t, 0.0));

    let s = ((n_from * cos_i - n_to * cos_t) / (n_from * cos_i + n_to * cos_t)).powi(2);
    let p = ((n_from * cos_t - n_to * cos_i) / (n_from * cos_t + n_to * cos_i)).powi(2);

    clamp((s + p) / 2.0, 0.0, 1.0)
}

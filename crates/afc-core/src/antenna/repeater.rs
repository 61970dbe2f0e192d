//! Passive repeater gains
//!
//! Two repeater types relay FS links around obstructions:
//!
//! - **Billboard reflector**: a flat plate of `width × height` meters. For
//!   the intended path, the two-way gain is `20·log10(4π·A·cos α / λ²)`,
//!   where `α` is half the included angle at the reflector. Signals arriving
//!   from other directions see the rectangular-aperture sinc² pattern.
//! - **Back-to-back**: two dishes joined by a waveguide. The input dish's
//!   broad pattern applies toward the interferer, the output dish radiates
//!   at peak gain toward the next hop, less the insertion loss.

use std::f64::consts::PI;

/// Two-way gain of a flat reflector for the intended path (dBi)
pub fn reflector_two_way_gain_db(width_m: f64, height_m: f64, wavelength_m: f64, half_included_angle_deg: f64) -> f64 {
    let cos_alpha = half_included_angle_deg.to_radians().cos().max(1e-6);
    let area = width_m * height_m;
    20.0 * (4.0 * PI * area * cos_alpha / (wavelength_m * wavelength_m)).log10()
}

/// Continuous upper envelope of `sinc²(u) = (sin πu / πu)²`.
///
/// Follows the main lobe down to the half-power level, then the `1/(πu)²`
/// sidelobe envelope; nulls are filled.
pub fn sinc_squared_envelope(u: f64) -> f64 {
    let u = u.abs();
    if u < 1e-9 {
        return 1.0;
    }
    let x = PI * u;
    let sinc2 = (x.sin() / x).powi(2);
    sinc2.max((1.0 / (x * x)).min(0.5))
}

/// Reflector discrimination (dB, ≤ 0) toward a direction offset from the
/// intended incoming ray by `delta_az_deg` in the plate's horizontal plane
/// and `delta_el_deg` vertically.
pub fn reflector_discrimination_db(
    width_m: f64,
    height_m: f64,
    wavelength_m: f64,
    half_included_angle_deg: f64,
    delta_az_deg: f64,
    delta_el_deg: f64,
) -> f64 {
    let projected_width = width_m * half_included_angle_deg.to_radians().cos().abs();
    let u_w = projected_width / wavelength_m * delta_az_deg.to_radians().sin();
    let u_h = height_m / wavelength_m * delta_el_deg.to_radians().sin();
    10.0 * sinc_squared_envelope(u_w).log10() + 10.0 * sinc_squared_envelope(u_h).log10()
}

/// Net back-to-back repeater gain toward an interferer (dB)
pub fn back_to_back_gain_db(input_gain_toward_interferer_dbi: f64, output_gain_dbi: f64, insertion_loss_db: f64) -> f64 {
    input_gain_toward_interferer_dbi + output_gain_dbi - insertion_loss_db
}

use std::f64::consts::{PI, TAU};

/// Signed azimuthal difference `phi1 - phi2`, wrapped into (-pi, pi].
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let wrapped = (phi1 - phi2 + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Absolute azimuthal separation in [0, pi].
///
/// Computed from `|phi1 - phi2|` so that swapping the arguments gives a
/// bit-identical result.
fn abs_delta_phi(phi1: f64, phi2: f64) -> f64 {
    let d = (phi1 - phi2).abs() % TAU;
    if d > PI {
        TAU - d
    } else {
        d
    }
}

/// Angular separation in pseudorapidity-azimuth space.
///
/// # Arguments
///
/// * `eta1`, `phi1` - direction of the first object
/// * `eta2`, `phi2` - direction of the second object
///
/// # Example
///
/// ```rust
/// # use jetcore::kinematics::geometry::delta_r;
/// let dr = delta_r(0.0, 0.0, 0.3, 0.4);
/// assert!((dr - 0.5).abs() < 1e-12);
/// ```
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    let dphi = abs_delta_phi(phi1, phi2);
    (deta * deta + dphi * dphi).sqrt()
}

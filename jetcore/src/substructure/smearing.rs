//! Soft-drop mass scale and resolution variations.
//!
//! Each draw builds its own generator seeded from the jet azimuth, so a jet
//! gets the same smearing no matter in which order or on which thread it is
//! processed.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

/// Mass-scale and mass-resolution factors for simulated jets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassScaleResolution {
    /// Numerator of the relative resolution `numerator / mass`.
    pub resolution_numerator: f64,
    pub resolution_factor: f64,
    pub resolution_uncertainty: f64,
    pub scale_factor: f64,
    pub scale_uncertainty: f64,
}

impl Default for MassScaleResolution {
    fn default() -> Self {
        MassScaleResolution {
            resolution_numerator: 8.753,
            resolution_factor: 1.09,
            resolution_uncertainty: 0.05,
            scale_factor: 0.982,
            scale_uncertainty: 0.004,
        }
    }
}

/// Nominal soft-drop mass and its four systematic variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoftDropMassVariants {
    pub nominal: f64,
    pub jms_up: f64,
    pub jms_down: f64,
    pub jmr_up: f64,
    pub jmr_down: f64,
}

impl SoftDropMassVariants {
    /// All variants equal to `mass`.
    pub fn unsmeared(mass: f64) -> Self {
        SoftDropMassVariants { nominal: mass, jms_up: mass, jms_down: mass, jmr_up: mass, jmr_down: mass }
    }
}

/// Seed derived from the jet azimuth, `|round(phi * 1e4)|`.
pub fn smearing_seed(phi: f64) -> u64 {
    (phi * 1e4).round().abs() as u64
}

/// Resolution multiplier `1 + z * sqrt(factor^2 - 1)` with `z ~ N(0, sigma)`.
///
/// Returns exactly 1 when `factor <= 1` or `sigma` is not a usable width.
pub fn resolution_multiplier(seed: u64, sigma: f64, factor: f64) -> f64 {
    if factor <= 1.0 || !sigma.is_finite() || sigma <= 0.0 {
        return 1.0;
    }
    let normal = match Normal::new(0.0, sigma) {
        Ok(normal) => normal,
        Err(_) => return 1.0,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    1.0 + normal.sample(&mut rng) * (factor * factor - 1.0).sqrt()
}

impl MassScaleResolution {
    /// Smeared and scaled variants of a corrected soft-drop mass.
    ///
    /// # Arguments
    ///
    /// * `corrected_mass` - soft-drop mass after the calibration functions
    /// * `phi` - jet azimuth, source of the seed
    /// * `is_mc` - data passes through with all factors equal to 1
    pub fn variants(&self, corrected_mass: f64, phi: f64, is_mc: bool) -> SoftDropMassVariants {
        if !is_mc {
            return SoftDropMassVariants::unsmeared(corrected_mass);
        }

        let seed = smearing_seed(phi);
        let sigma = self.resolution_numerator / corrected_mass;

        let jmr = resolution_multiplier(seed, sigma, self.resolution_factor);
        let jmr_up = resolution_multiplier(seed, sigma, self.resolution_factor + self.resolution_uncertainty);
        let jmr_down = resolution_multiplier(seed, sigma, self.resolution_factor - self.resolution_uncertainty);

        let jms = self.scale_factor;
        let jms_up = self.scale_factor + self.scale_uncertainty;
        let jms_down = self.scale_factor - self.scale_uncertainty;

        SoftDropMassVariants {
            nominal: corrected_mass * jmr * jms,
            jms_up: corrected_mass * jmr * jms_up,
            jms_down: corrected_mass * jmr * jms_down,
            jmr_up: corrected_mass * jmr_up * jms,
            jmr_down: corrected_mass * jmr_down * jms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_seed_from_phi() {
        assert_eq!(smearing_seed(1.23456), 12346);
        assert_eq!(smearing_seed(-1.23456), 12346);
        assert_eq!(smearing_seed(0.0), 0);
    }

    #[test]
    fn test_no_smearing_below_unity() {
        assert_eq!(resolution_multiplier(42, 0.1, 1.0), 1.0);
        assert_eq!(resolution_multiplier(42, 0.1, 0.9), 1.0);
        assert_eq!(resolution_multiplier(42, f64::INFINITY, 1.2), 1.0);
        assert_eq!(resolution_multiplier(42, -0.1, 1.2), 1.0);
    }

    #[test]
    fn test_multiplier_is_reproducible() {
        let a = resolution_multiplier(31415, 0.07, 1.09);
        let b = resolution_multiplier(31415, 0.07, 1.09);
        assert_eq!(a, b);
        assert_ne!(a, 1.0);
    }

    #[test]
    fn test_variants_share_one_draw() {
        let smearing = MassScaleResolution::default();
        let mass = 120.0;
        let v = smearing.variants(mass, 0.7, true);

        // every resolution variant reuses the same standard normal draw
        let nominal_shift = v.nominal / (mass * 0.982) - 1.0;
        let up_shift = v.jmr_up / (mass * 0.982) - 1.0;
        let down_shift = v.jmr_down / (mass * 0.982) - 1.0;
        let norm = |f: f64| (f * f - 1.0_f64).sqrt();
        assert_relative_eq!(up_shift / nominal_shift, norm(1.14) / norm(1.09), max_relative = 1e-9);
        assert_relative_eq!(down_shift / nominal_shift, norm(1.04) / norm(1.09), max_relative = 1e-9);

        assert_relative_eq!(v.jms_up / v.nominal, 0.986 / 0.982, max_relative = 1e-12);
        assert_relative_eq!(v.jms_down / v.nominal, 0.978 / 0.982, max_relative = 1e-12);
    }

    #[test]
    fn test_data_is_untouched() {
        let v = MassScaleResolution::default().variants(95.0, -2.1, false);
        assert_eq!(v, SoftDropMassVariants::unsmeared(95.0));
    }

    #[test]
    fn test_zero_mass_is_not_smeared() {
        let v = MassScaleResolution::default().variants(0.0, 1.0, true);
        assert_eq!(v.nominal, 0.0);
        assert_eq!(v.jmr_up, 0.0);
    }
}

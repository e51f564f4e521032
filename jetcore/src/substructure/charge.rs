use crate::data::particle::Particle;

/// Momentum-weighted jet charge `sum(q_i * pt_i^kappa) / pt_jet^kappa`.
///
/// # Arguments
///
/// * `jet_pt` - transverse momentum of the jet
/// * `constituents` - particles clustered into the jet
/// * `kappa` - weighting exponent, typically between 0.5 and 1.0
pub fn jet_charge(jet_pt: f64, constituents: &[Particle], kappa: f64) -> f64 {
    let weighted: f64 = constituents
        .iter()
        .map(|c| c.charge as f64 * c.pt.powf(kappa))
        .sum();
    weighted / jet_pt.powf(kappa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constituent(pt: f64, charge: i32) -> Particle {
        Particle::new(pt, 0.0, 0.0, pt, charge, if charge == 0 { 22 } else { 211 }, 3)
    }

    #[test]
    fn test_jet_charge_kappa_one() {
        let constituents = vec![constituent(60.0, 1), constituent(30.0, -1), constituent(10.0, 0)];
        assert_relative_eq!(jet_charge(100.0, &constituents, 1.0), 0.3);
    }

    #[test]
    fn test_jet_charge_kappa_half() {
        let constituents = vec![constituent(64.0, 1), constituent(36.0, 1)];
        assert_relative_eq!(jet_charge(100.0, &constituents, 0.5), (8.0 + 6.0) / 10.0);
    }

    #[test]
    fn test_neutral_jet() {
        assert_eq!(jet_charge(250.0, &[], 0.6), 0.0);
        assert_eq!(jet_charge(250.0, &[constituent(250.0, 0)], 0.6), 0.0);
    }
}

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

/// Four-momentum stored as (px, py, pz, E).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LorentzVector {
    pub components: Vector4<f64>,
}

impl LorentzVector {
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        LorentzVector { components: Vector4::new(px, py, pz, e) }
    }

    pub fn zero() -> Self {
        LorentzVector { components: Vector4::zeros() }
    }

    /// Builds a four-vector from transverse momentum, pseudorapidity, azimuth and energy.
    pub fn from_pt_eta_phi_e(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        let pt = pt.abs();
        LorentzVector::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh(), e)
    }

    /// Builds a four-vector from transverse momentum, pseudorapidity, azimuth and mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let pt = pt.abs();
        let pz = pt * eta.sinh();
        let p2 = pt * pt + pz * pz;
        let e = if m >= 0.0 {
            (p2 + m * m).sqrt()
        } else {
            (p2 - m * m).max(0.0).sqrt()
        };
        LorentzVector::new(pt * phi.cos(), pt * phi.sin(), pz, e)
    }

    pub fn px(&self) -> f64 {
        self.components[0]
    }

    pub fn py(&self) -> f64 {
        self.components[1]
    }

    pub fn pz(&self) -> f64 {
        self.components[2]
    }

    pub fn e(&self) -> f64 {
        self.components[3]
    }

    pub fn pt(&self) -> f64 {
        self.px().hypot(self.py())
    }

    pub fn phi(&self) -> f64 {
        if self.px() == 0.0 && self.py() == 0.0 {
            0.0
        } else {
            self.py().atan2(self.px())
        }
    }

    /// Pseudorapidity; a vector along the beam axis reports +/- 1e10.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            return if self.pz() >= 0.0 { 1e10 } else { -1e10 };
        }
        (self.pz() / pt).asinh()
    }

    pub fn mass2(&self) -> f64 {
        let p = self.components.xyz();
        self.e() * self.e() - p.norm_squared()
    }

    /// Invariant mass; space-like vectors return `-sqrt(-m2)`.
    pub fn mass(&self) -> f64 {
        let m2 = self.mass2();
        if m2 < 0.0 {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }
}

impl Default for LorentzVector {
    fn default() -> Self {
        LorentzVector::zero()
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;

    fn add(self, other: LorentzVector) -> LorentzVector {
        LorentzVector { components: self.components + other.components }
    }
}

impl AddAssign for LorentzVector {
    fn add_assign(&mut self, other: LorentzVector) {
        self.components += other.components;
    }
}

impl Sum for LorentzVector {
    fn sum<I: Iterator<Item = LorentzVector>>(iter: I) -> Self {
        iter.fold(LorentzVector::zero(), |acc, v| acc + v)
    }
}

/// Reconstructed kinematics as delivered by upstream reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Kinematics {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub energy: f64,
}

impl Kinematics {
    pub fn new(pt: f64, eta: f64, phi: f64, energy: f64) -> Self {
        Kinematics { pt, eta, phi, energy }
    }

    /// Kinematics of a massive object given its mass instead of its energy.
    pub fn from_mass(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let p4 = LorentzVector::from_pt_eta_phi_m(pt, eta, phi, mass);
        Kinematics { pt, eta, phi, energy: p4.e() }
    }

    pub fn p4(&self) -> LorentzVector {
        LorentzVector::from_pt_eta_phi_e(self.pt, self.eta, self.phi, self.energy)
    }

    pub fn mass(&self) -> f64 {
        self.p4().mass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mass_round_trip() {
        let v = LorentzVector::from_pt_eta_phi_m(250.0, 1.1, -0.4, 80.4);
        assert_relative_eq!(v.mass(), 80.4, max_relative = 1e-9);
        assert_relative_eq!(v.pt(), 250.0, max_relative = 1e-12);
        assert_relative_eq!(v.eta(), 1.1, max_relative = 1e-12);
        assert_relative_eq!(v.phi(), -0.4, max_relative = 1e-12);
    }

    #[test]
    fn test_back_to_back_pair_mass() {
        // two massless 50 GeV objects back to back form a 100 GeV system
        let a = LorentzVector::from_pt_eta_phi_m(50.0, 0.0, 0.0, 0.0);
        let b = LorentzVector::from_pt_eta_phi_m(50.0, 0.0, std::f64::consts::PI, 0.0);
        let sum: LorentzVector = [a, b].into_iter().sum();
        assert_relative_eq!(sum.mass(), 100.0, max_relative = 1e-12);
        assert!(sum.pt() < 1e-9);
    }

    #[test]
    fn test_space_like_mass_is_negative() {
        let v = LorentzVector::new(3.0, 0.0, 4.0, 1.0);
        assert_relative_eq!(v.mass(), -24.0_f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_kinematics_from_mass() {
        let k = Kinematics::from_mass(40.0, -0.3, 2.0, 12.0);
        assert_relative_eq!(k.mass(), 12.0, max_relative = 1e-9);
    }
}

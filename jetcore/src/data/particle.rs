use serde::{Deserialize, Serialize};

use crate::kinematics::lorentz::{Kinematics, LorentzVector};

pub const PDG_CHARGED_HADRON: i32 = 211;
pub const PDG_NEUTRAL_HADRON: i32 = 130;
pub const PDG_PHOTON: i32 = 22;

/// Particles with a smaller absolute type code (neutrinos, undefined) never enter a cone sum.
pub const MIN_ISOLATION_PDG: i32 = 7;

/// Category of a particle-flow candidate, derived from its type code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParticleCategory {
    ChargedHadron,
    NeutralHadron,
    Photon,
    Other,
}

impl ParticleCategory {
    pub fn from_pdg_id(pdg_id: i32) -> ParticleCategory {
        match pdg_id.abs() {
            PDG_CHARGED_HADRON => ParticleCategory::ChargedHadron,
            PDG_NEUTRAL_HADRON => ParticleCategory::NeutralHadron,
            PDG_PHOTON => ParticleCategory::Photon,
            _ => ParticleCategory::Other,
        }
    }
}

/// Particle-flow candidate.
///
/// `from_pv` follows the packed-candidate convention: 0 no association,
/// 1 loose, 2 tight, 3 used in the primary vertex fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    #[serde(default)]
    pub energy: f64,
    #[serde(default)]
    pub charge: i32,
    #[serde(default)]
    pub pdg_id: i32,
    #[serde(default)]
    pub from_pv: u8,
}

impl Particle {
    pub fn new(pt: f64, eta: f64, phi: f64, energy: f64, charge: i32, pdg_id: i32, from_pv: u8) -> Self {
        Particle { pt, eta, phi, energy, charge, pdg_id, from_pv }
    }

    pub fn category(&self) -> ParticleCategory {
        ParticleCategory::from_pdg_id(self.pdg_id)
    }

    /// True when the candidate is firmly associated with the primary vertex.
    pub fn is_from_primary_vertex(&self) -> bool {
        self.from_pv > 1
    }

    pub fn is_neutral(&self) -> bool {
        self.charge == 0
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics::new(self.pt, self.eta, self.phi, self.energy)
    }

    pub fn p4(&self) -> LorentzVector {
        self.kinematics().p4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_uses_absolute_code() {
        assert_eq!(ParticleCategory::from_pdg_id(-211), ParticleCategory::ChargedHadron);
        assert_eq!(ParticleCategory::from_pdg_id(130), ParticleCategory::NeutralHadron);
        assert_eq!(ParticleCategory::from_pdg_id(22), ParticleCategory::Photon);
        assert_eq!(ParticleCategory::from_pdg_id(13), ParticleCategory::Other);
    }

    #[test]
    fn test_primary_vertex_association() {
        let loose = Particle::new(1.0, 0.0, 0.0, 1.0, 1, 211, 1);
        let tight = Particle::new(1.0, 0.0, 0.0, 1.0, 1, 211, 2);
        assert!(!loose.is_from_primary_vertex());
        assert!(tight.is_from_primary_vertex());
    }
}

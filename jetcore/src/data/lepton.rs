use serde::{Deserialize, Serialize};

use crate::kinematics::lorentz::Kinematics;

/// Lepton flavor, carrying the fields the isolation paths need.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeptonFlavor {
    Electron { supercluster_eta: f64 },
    Muon,
    Other,
}

impl LeptonFlavor {
    pub fn is_electron(&self) -> bool {
        matches!(self, LeptonFlavor::Electron { .. })
    }

    pub fn is_muon(&self) -> bool {
        matches!(self, LeptonFlavor::Muon)
    }
}

/// Isolation sums computed by upstream reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PrecomputedIsolation {
    pub charged_hadron: f64,
    pub neutral_hadron: f64,
    pub photon: f64,
}

/// A lepton candidate whose isolation is to be evaluated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateLepton {
    pub kinematics: Kinematics,
    pub flavor: LeptonFlavor,
    #[serde(default)]
    pub precomputed: Option<PrecomputedIsolation>,
}

impl CandidateLepton {
    pub fn new(kinematics: Kinematics, flavor: LeptonFlavor) -> Self {
        CandidateLepton { kinematics, flavor, precomputed: None }
    }

    pub fn electron(pt: f64, eta: f64, phi: f64, supercluster_eta: f64) -> Self {
        CandidateLepton::new(
            Kinematics::from_mass(pt, eta, phi, 0.000511),
            LeptonFlavor::Electron { supercluster_eta },
        )
    }

    pub fn muon(pt: f64, eta: f64, phi: f64) -> Self {
        CandidateLepton::new(Kinematics::from_mass(pt, eta, phi, 0.10566), LeptonFlavor::Muon)
    }

    pub fn with_precomputed(mut self, precomputed: PrecomputedIsolation) -> Self {
        self.precomputed = Some(precomputed);
        self
    }

    pub fn pt(&self) -> f64 {
        self.kinematics.pt
    }

    pub fn eta(&self) -> f64 {
        self.kinematics.eta
    }

    pub fn phi(&self) -> f64 {
        self.kinematics.phi
    }

    /// Pseudorapidity used for detector-region decisions: the supercluster for electrons.
    pub fn region_eta(&self) -> f64 {
        match self.flavor {
            LeptonFlavor::Electron { supercluster_eta } => supercluster_eta,
            LeptonFlavor::Muon | LeptonFlavor::Other => self.kinematics.eta,
        }
    }
}

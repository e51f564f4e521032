// Purpose: calibration tables used by the mini-isolation computations
use serde::{Deserialize, Serialize};

use crate::data::lepton::LeptonFlavor;

/// Returned by every isolation path when the candidate is too soft to evaluate.
pub const ISOLATION_UNDEFINED: f64 = 99999.0;

/// Candidates below this pt (GeV) get [`ISOLATION_UNDEFINED`].
pub const MIN_CANDIDATE_PT: f64 = 5.0;

/// Neutral and pileup pt threshold (GeV); electrons use no threshold.
pub const NEUTRAL_PT_THRESHOLD: f64 = 0.5;

/// Delta-beta weight applied to the charged pileup sum.
pub const DELTA_BETA_FACTOR: f64 = 0.5;

/// Effective areas are quoted for a cone of this radius.
pub const EFFECTIVE_AREA_REFERENCE_CONE: f64 = 0.3;

/// Supercluster |eta| above which an electron is in the endcap.
pub const ELECTRON_ENDCAP_ETA: f64 = 1.479;

/// Particles closer than this to a neutral are ignored when PF-weighting it.
pub const PF_WEIGHT_MIN_DR: f64 = 1e-5;

/// Species dependent veto cones around the candidate.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DeadCones {
    pub charged: f64,
    pub neutral: f64,
    pub photon: f64,
    pub pileup: f64,
}

impl DeadCones {
    pub const NONE: DeadCones = DeadCones { charged: 0.0, neutral: 0.0, photon: 0.0, pileup: 0.0 };

    pub const ELECTRON_ENDCAP: DeadCones = DeadCones { charged: 0.015, neutral: 0.0, photon: 0.08, pileup: 0.015 };

    pub const MUON: DeadCones = DeadCones { charged: 0.0001, neutral: 0.01, photon: 0.01, pileup: 0.01 };

    pub fn for_flavor(flavor: &LeptonFlavor) -> DeadCones {
        match flavor {
            LeptonFlavor::Electron { supercluster_eta } if supercluster_eta.abs() > ELECTRON_ENDCAP_ETA => {
                DeadCones::ELECTRON_ENDCAP
            }
            LeptonFlavor::Electron { .. } => DeadCones::NONE,
            LeptonFlavor::Muon => DeadCones::MUON,
            LeptonFlavor::Other => DeadCones::NONE,
        }
    }
}

/// Upper |eta| bin edges for muon effective areas; the last bin is open.
pub const MUON_EA_ETA_EDGES: [f64; 4] = [0.8, 1.3, 2.0, 2.2];

/// Upper |supercluster eta| bin edges for electron effective areas; the last bin is open.
pub const ELECTRON_EA_ETA_EDGES: [f64; 6] = [1.0, 1.479, 2.0, 2.2, 2.3, 2.4];

/// Effective areas per pseudorapidity bin for one calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveAreaTable {
    pub muon: [f64; 5],
    pub electron: [f64; 7],
}

/// Fall17 neutral hadron + photon effective areas, 92X release.
pub const EA_FALL17_92X: EffectiveAreaTable = EffectiveAreaTable {
    muon: [0.0566, 0.0562, 0.0363, 0.0119, 0.0064],
    electron: [0.1566, 0.1626, 0.1073, 0.0854, 0.1051, 0.1204, 0.1524],
};

/// Fall17 neutral hadron + photon effective areas, 94X release.
pub const EA_FALL17_94X: EffectiveAreaTable = EffectiveAreaTable {
    muon: [0.0566, 0.0562, 0.0363, 0.0119, 0.0064],
    electron: [0.1440, 0.1562, 0.1032, 0.0859, 0.1116, 0.1321, 0.1654],
};

/// Spring15 areas used with PF-weighted neutrals.
pub const EA_SPRING15_SUSY: EffectiveAreaTable = EffectiveAreaTable {
    muon: [0.0735, 0.0619, 0.0465, 0.0433, 0.0577],
    electron: [0.1752, 0.1862, 0.1411, 0.1534, 0.1903, 0.2243, 0.2687],
};

/// Which published effective-area calibration to subtract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveAreaGeneration {
    Fall17V1,
    #[default]
    Fall17V2,
}

impl EffectiveAreaGeneration {
    pub fn table(&self) -> &'static EffectiveAreaTable {
        match self {
            EffectiveAreaGeneration::Fall17V1 => &EA_FALL17_92X,
            EffectiveAreaGeneration::Fall17V2 => &EA_FALL17_94X,
        }
    }
}

fn bin_index(abs_eta: f64, edges: &[f64]) -> usize {
    edges.iter().position(|&edge| abs_eta < edge).unwrap_or(edges.len())
}

impl EffectiveAreaTable {
    /// Effective area for a candidate, looked up on |eta| (muons) or |supercluster eta| (electrons).
    ///
    /// Candidates that are neither get an area of zero.
    pub fn area(&self, flavor: &LeptonFlavor, eta: f64) -> f64 {
        match flavor {
            LeptonFlavor::Muon => self.muon[bin_index(eta.abs(), &MUON_EA_ETA_EDGES)],
            LeptonFlavor::Electron { supercluster_eta } => {
                self.electron[bin_index(supercluster_eta.abs(), &ELECTRON_EA_ETA_EDGES)]
            }
            LeptonFlavor::Other => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_cones_by_flavor() {
        let barrel = LeptonFlavor::Electron { supercluster_eta: 1.2 };
        let endcap = LeptonFlavor::Electron { supercluster_eta: -1.6 };
        assert_eq!(DeadCones::for_flavor(&barrel), DeadCones::NONE);
        assert_eq!(DeadCones::for_flavor(&endcap), DeadCones::ELECTRON_ENDCAP);
        assert_eq!(DeadCones::for_flavor(&LeptonFlavor::Muon).neutral, 0.01);
        assert_eq!(DeadCones::for_flavor(&LeptonFlavor::Other), DeadCones::NONE);
    }

    #[test]
    fn test_muon_bins() {
        let t = &EA_FALL17_94X;
        assert_eq!(t.area(&LeptonFlavor::Muon, 0.5), 0.0566);
        assert_eq!(t.area(&LeptonFlavor::Muon, -0.8), 0.0562);
        assert_eq!(t.area(&LeptonFlavor::Muon, 1.9), 0.0363);
        assert_eq!(t.area(&LeptonFlavor::Muon, 2.1), 0.0119);
        assert_eq!(t.area(&LeptonFlavor::Muon, 2.4), 0.0064);
        assert_eq!(t.area(&LeptonFlavor::Muon, 3.0), 0.0064);
    }

    #[test]
    fn test_electron_bins_use_supercluster() {
        let t = &EA_SPRING15_SUSY;
        let el = |sc| LeptonFlavor::Electron { supercluster_eta: sc };
        assert_eq!(t.area(&el(0.2), 2.0), 0.1752);
        assert_eq!(t.area(&el(1.2), 0.0), 0.1862);
        assert_eq!(t.area(&el(1.5), 0.0), 0.1411);
        assert_eq!(t.area(&el(2.1), 0.0), 0.1534);
        assert_eq!(t.area(&el(2.25), 0.0), 0.1903);
        assert_eq!(t.area(&el(-2.35), 0.0), 0.2243);
        assert_eq!(t.area(&el(2.45), 0.0), 0.2687);
    }

    #[test]
    fn test_generation_selects_table() {
        let el = LeptonFlavor::Electron { supercluster_eta: 0.3 };
        let old = EffectiveAreaGeneration::Fall17V1.table().area(&el, 0.3);
        let new = EffectiveAreaGeneration::Fall17V2.table().area(&el, 0.3);
        assert_ne!(old, new);
        assert!((old - new).abs() < 0.02);
    }
}

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::particle::Particle;
use crate::kinematics::lorentz::{Kinematics, LorentzVector};

// upstream attribute names
pub const CHS_PT: &str = "ak8PFJetsCHSValueMap:pt";
pub const CHS_ETA: &str = "ak8PFJetsCHSValueMap:eta";
pub const CHS_PHI: &str = "ak8PFJetsCHSValueMap:phi";
pub const CHS_MASS: &str = "ak8PFJetsCHSValueMap:mass";
pub const CHS_PRUNED_MASS: &str = "ak8PFJetsCHSValueMap:ak8PFJetsCHSPrunedMass";
pub const CHS_SOFT_DROP_MASS: &str = "ak8PFJetsCHSValueMap:ak8PFJetsCHSSoftDropMass";
pub const CHS_TAU1: &str = "ak8PFJetsCHSValueMap:NjettinessAK8CHSTau1";
pub const CHS_TAU2: &str = "ak8PFJetsCHSValueMap:NjettinessAK8CHSTau2";
pub const CHS_TAU3: &str = "ak8PFJetsCHSValueMap:NjettinessAK8CHSTau3";
pub const PUPPI_TAU1: &str = "NjettinessAK8Puppi:tau1";
pub const PUPPI_TAU2: &str = "NjettinessAK8Puppi:tau2";
pub const PUPPI_TAU3: &str = "NjettinessAK8Puppi:tau3";
pub const SOFT_DROP_N2_B1: &str = "ak8PFJetsPuppiSoftDropValueMap:nb1AK8PuppiSoftDropN2";
pub const SOFT_DROP_N3_B1: &str = "ak8PFJetsPuppiSoftDropValueMap:nb1AK8PuppiSoftDropN3";
pub const SOFT_DROP_N2_B2: &str = "ak8PFJetsPuppiSoftDropValueMap:nb2AK8PuppiSoftDropN2";
pub const SOFT_DROP_N3_B2: &str = "ak8PFJetsPuppiSoftDropValueMap:nb2AK8PuppiSoftDropN3";
pub const PILEUP_JET_ID_DISCRIMINANT: &str = "pileupJetIdUpdated:fullDiscriminant";
pub const PILEUP_JET_ID: &str = "pileupJetIdUpdated:fullId";

// discriminator names
pub const CSV_V2: &str = "pfCombinedInclusiveSecondaryVertexV2BJetTags";
pub const DOUBLE_B: &str = "pfBoostedDoubleSecondaryVertexAK8BJetTags";
pub const DEEP_CSV_B: [&str; 2] = ["pfDeepCSVJetTags:probb", "pfDeepCSVJetTags:probbb"];
pub const DEEP_FLAVOUR_B: [&str; 3] = [
    "pfDeepFlavourJetTags:probb",
    "pfDeepFlavourJetTags:probbb",
    "pfDeepFlavourJetTags:problepb",
];

/// Value reported for an unset attribute on the "low" side.
pub const MISSING_LOW: f64 = -f64::MAX;
/// Value reported for an unset attribute on the "high" side.
pub const MISSING_HIGH: f64 = f64::MAX;

/// Named b-tag discriminator scores of a jet or subjet.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discriminators {
    pub scores: BTreeMap<String, f64>,
}

impl Discriminators {
    pub fn new() -> Self {
        Discriminators { scores: BTreeMap::new() }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.scores.insert(name.to_string(), value);
        self
    }

    /// Score for `name`, or [`MISSING_LOW`] when the algorithm was not run.
    pub fn get(&self, name: &str) -> f64 {
        self.scores.get(name).copied().unwrap_or(MISSING_LOW)
    }

    /// Sum of several sub-scores; [`MISSING_LOW`] if any of them is absent.
    pub fn sum(&self, names: &[&str]) -> f64 {
        names
            .iter()
            .map(|name| self.scores.get(*name).copied())
            .fold_options(0.0, |total, value| total + value)
            .unwrap_or(MISSING_LOW)
    }
}

/// Soft-drop subjet of a large-radius jet.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Subjet {
    pub kinematics: Kinematics,
    #[serde(default)]
    pub discriminators: Discriminators,
    #[serde(default)]
    pub hadron_flavour: i32,
}

impl Subjet {
    pub fn new(kinematics: Kinematics, discriminators: Discriminators, hadron_flavour: i32) -> Self {
        Subjet { kinematics, discriminators, hadron_flavour }
    }

    pub fn p4(&self) -> LorentzVector {
        self.kinematics.p4()
    }

    pub fn btag_candidate(&self) -> BTagCandidate<'_> {
        BTagCandidate {
            kinematics: &self.kinematics,
            discriminators: &self.discriminators,
            hadron_flavour: self.hadron_flavour,
        }
    }
}

/// Read-only view on whatever the b-tag decision needs from a jet or subjet.
#[derive(Clone, Copy, Debug)]
pub struct BTagCandidate<'a> {
    pub kinematics: &'a Kinematics,
    pub discriminators: &'a Discriminators,
    pub hadron_flavour: i32,
}

/// Reconstructed jet, pre-selected and pre-corrected upstream.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Jet {
    pub kinematics: Kinematics,
    #[serde(default)]
    pub discriminators: Discriminators,
    #[serde(default)]
    pub parton_flavour: i32,
    #[serde(default)]
    pub hadron_flavour: i32,
    /// Soft-drop subjets; `None` when the collection is not available at all.
    #[serde(default)]
    pub subjets: Option<Vec<Subjet>>,
    #[serde(default)]
    pub constituents: Vec<Particle>,
    #[serde(default)]
    pub n_daughters: usize,
    #[serde(default)]
    pub user_floats: BTreeMap<String, f64>,
    #[serde(default)]
    pub user_ints: BTreeMap<String, i32>,
    #[serde(default)]
    pub gen_jet: Option<Kinematics>,
}

impl Jet {
    pub fn new(kinematics: Kinematics) -> Self {
        Jet { kinematics, ..Default::default() }
    }

    pub fn with_user_float(mut self, name: &str, value: f64) -> Self {
        self.user_floats.insert(name.to_string(), value);
        self
    }

    pub fn with_user_int(mut self, name: &str, value: i32) -> Self {
        self.user_ints.insert(name.to_string(), value);
        self
    }

    pub fn with_discriminator(mut self, name: &str, value: f64) -> Self {
        self.discriminators.scores.insert(name.to_string(), value);
        self
    }

    pub fn with_subjets(mut self, subjets: Vec<Subjet>) -> Self {
        self.subjets = Some(subjets);
        self
    }

    pub fn with_constituents(mut self, constituents: Vec<Particle>) -> Self {
        self.n_daughters = constituents.len();
        self.constituents = constituents;
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

    pub fn energy(&self) -> f64 {
        self.kinematics.energy
    }

    pub fn mass(&self) -> f64 {
        self.kinematics.mass()
    }

    pub fn p4(&self) -> LorentzVector {
        self.kinematics.p4()
    }

    /// Upstream float attribute, or `missing` when it was not filled.
    pub fn user_float_or(&self, name: &str, missing: f64) -> f64 {
        self.user_floats.get(name).copied().unwrap_or(missing)
    }

    pub fn user_int(&self, name: &str) -> Option<i32> {
        self.user_ints.get(name).copied()
    }

    pub fn btag_candidate(&self) -> BTagCandidate<'_> {
        BTagCandidate {
            kinematics: &self.kinematics,
            discriminators: &self.discriminators,
            hadron_flavour: self.hadron_flavour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_discriminator_sum() {
        let d = Discriminators::new().with(DEEP_CSV_B[0], 0.3);
        assert_eq!(d.sum(&DEEP_CSV_B), MISSING_LOW);

        let d = d.with(DEEP_CSV_B[1], 0.1);
        assert!((d.sum(&DEEP_CSV_B) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_user_float_sentinels() {
        let jet = Jet::new(Kinematics::new(300.0, 0.1, 0.2, 320.0)).with_user_float(PUPPI_TAU1, 0.3);
        assert_eq!(jet.user_float_or(PUPPI_TAU1, MISSING_HIGH), 0.3);
        assert_eq!(jet.user_float_or(PUPPI_TAU2, MISSING_HIGH), f64::MAX);
        assert_eq!(jet.user_float_or(CHS_PT, MISSING_LOW), -f64::MAX);
    }
}

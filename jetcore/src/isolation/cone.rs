//! Cone accumulation of particle-flow pt around a lepton candidate.
//!
//! The accumulated sums are split by species so that the different pileup
//! corrections in [`crate::isolation::correction`] can be applied on top.

use serde::{Deserialize, Serialize};

use crate::data::lepton::CandidateLepton;
use crate::data::particle::{Particle, ParticleCategory, MIN_ISOLATION_PDG};
use crate::isolation::constants::{DeadCones, MIN_CANDIDATE_PT, NEUTRAL_PT_THRESHOLD, PF_WEIGHT_MIN_DR};
use crate::kinematics::geometry::delta_r;

/// Parameters of the pt-dependent isolation cone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiniIsolationParams {
    pub r_iso_min: f64,
    pub r_iso_max: f64,
    pub kt_scale: f64,
}

impl Default for MiniIsolationParams {
    fn default() -> Self {
        MiniIsolationParams {
            r_iso_min: 0.05,
            r_iso_max: 0.2,
            kt_scale: 10.0,
        }
    }
}

/// How the cone radius is derived from the candidate pt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConeRadiusPolicy {
    /// `max(r_min, min(r_max, kt / pt))`
    Standard,
    /// `kt / min(max(pt, r_max), r_min)`, the bounds applied to pt instead of the radius.
    SwappedBounds,
}

impl ConeRadiusPolicy {
    pub fn radius(&self, params: &MiniIsolationParams, pt: f64) -> f64 {
        match self {
            ConeRadiusPolicy::Standard => params.r_iso_min.max(params.r_iso_max.min(params.kt_scale / pt)),
            ConeRadiusPolicy::SwappedBounds => params.kt_scale / pt.max(params.r_iso_max).min(params.r_iso_min),
        }
    }
}

/// Per-species pt sums inside the isolation cone.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct IsolationSums {
    pub charged_pv: f64,
    pub charged_pu: f64,
    pub neutral_hadron: f64,
    pub photon: f64,
}

impl IsolationSums {
    pub fn neutral(&self) -> f64 {
        self.photon + self.neutral_hadron
    }
}

/// Weight of a neutral particle from the charged activity around it.
///
/// `ln(1 + S_pv) / (ln(1 + S_pv) + ln(1 + S_pu))` with `S = sum(pt / dr)` over
/// charged particles within `radius` of the neutral; 1 when no charged
/// particle contributes.
pub fn pf_weight(neutral: &Particle, particles: &[Particle], radius: f64) -> f64 {
    let mut sum_pv = 0.0;
    let mut sum_pu = 0.0;
    for other in particles {
        if other.is_neutral() {
            continue;
        }
        let dr = delta_r(neutral.eta, neutral.phi, other.eta, other.phi);
        if dr < PF_WEIGHT_MIN_DR || dr > radius {
            continue;
        }
        if other.is_from_primary_vertex() {
            sum_pv += other.pt / dr;
        } else {
            sum_pu += other.pt / dr;
        }
    }

    let w_pv = sum_pv.ln_1p();
    let w_pu = sum_pu.ln_1p();
    if w_pv + w_pu > 0.0 {
        w_pv / (w_pv + w_pu)
    } else {
        1.0
    }
}

/// Sums particle pt inside a cone of `radius` around `candidate`.
///
/// Returns `None` for candidates below 5 GeV, whose isolation is undefined.
/// With `pf_weighting` every neutral contribution is scaled by [`pf_weight`].
pub fn accumulate(
    candidate: &CandidateLepton,
    particles: &[Particle],
    radius: f64,
    pf_weighting: bool,
) -> Option<IsolationSums> {
    if candidate.pt() < MIN_CANDIDATE_PT {
        return None;
    }

    let dead_cones = DeadCones::for_flavor(&candidate.flavor);
    let pt_threshold = if candidate.flavor.is_electron() { 0.0 } else { NEUTRAL_PT_THRESHOLD };

    let mut sums = IsolationSums::default();

    for particle in particles {
        if particle.pdg_id.abs() < MIN_ISOLATION_PDG {
            continue;
        }

        let dr = delta_r(particle.eta, particle.phi, candidate.eta(), candidate.phi());
        if dr > radius {
            continue;
        }

        if particle.is_neutral() {
            if particle.pt <= pt_threshold {
                continue;
            }
            match particle.category() {
                ParticleCategory::Photon if dr >= dead_cones.photon => {
                    sums.photon += neutral_pt(particle, particles, radius, pf_weighting);
                }
                ParticleCategory::NeutralHadron if dr >= dead_cones.neutral => {
                    sums.neutral_hadron += neutral_pt(particle, particles, radius, pf_weighting);
                }
                _ => {}
            }
        } else if particle.is_from_primary_vertex() {
            if particle.category() == ParticleCategory::ChargedHadron && dr >= dead_cones.charged {
                sums.charged_pv += particle.pt;
            }
        } else if particle.pt > pt_threshold && dr >= dead_cones.pileup {
            sums.charged_pu += particle.pt;
        }
    }

    Some(sums)
}

fn neutral_pt(particle: &Particle, particles: &[Particle], radius: f64, pf_weighting: bool) -> f64 {
    if pf_weighting {
        pf_weight(particle, particles, radius) * particle.pt
    } else {
        particle.pt
    }
}

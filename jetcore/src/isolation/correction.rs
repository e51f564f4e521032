//! Pileup-corrected mini-isolation.
//!
//! Every entry point returns the isolation as a fraction of the candidate pt,
//! or [`ISOLATION_UNDEFINED`] for candidates below 5 GeV.

use serde::{Deserialize, Serialize};

use crate::data::lepton::{CandidateLepton, LeptonFlavor, PrecomputedIsolation};
use crate::data::particle::Particle;
use crate::kinematics::lorentz::Kinematics;
use crate::isolation::cone::{accumulate, ConeRadiusPolicy, IsolationSums, MiniIsolationParams};
use crate::isolation::constants::{
    EffectiveAreaGeneration, EffectiveAreaTable, DELTA_BETA_FACTOR, EA_SPRING15_SUSY,
    EFFECTIVE_AREA_REFERENCE_CONE, ISOLATION_UNDEFINED, MIN_CANDIDATE_PT,
};

/// Pileup correction applied on top of the cone sums.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IsolationCorrection {
    /// Subtract half of the charged pileup sum from the neutral sum.
    DeltaBeta { charged_only: bool },
    /// Subtract `rho * EA` from the neutral sum.
    EffectiveArea { rho: f64, generation: EffectiveAreaGeneration },
    /// PF-weighted neutrals with the Spring15 areas subtracted.
    PfWeighted { rho: f64, charged_only: bool },
}

impl IsolationCorrection {
    pub fn cone_policy(&self) -> ConeRadiusPolicy {
        match self {
            IsolationCorrection::DeltaBeta { .. } => ConeRadiusPolicy::Standard,
            IsolationCorrection::EffectiveArea { .. } => ConeRadiusPolicy::SwappedBounds,
            IsolationCorrection::PfWeighted { .. } => ConeRadiusPolicy::Standard,
        }
    }

    fn uses_pf_weighting(&self) -> bool {
        matches!(self, IsolationCorrection::PfWeighted { .. })
    }
}

/// Pileup estimate `rho * EA * (R / 0.3)^2` for a cone of radius `radius`.
pub fn effective_area_correction(table: &EffectiveAreaTable, candidate: &CandidateLepton, radius: f64, rho: f64) -> f64 {
    let area = table.area(&candidate.flavor, candidate.eta());
    let scale = radius / EFFECTIVE_AREA_REFERENCE_CONE;
    rho * area * scale * scale
}

/// Neutral sum after `subtrahend`, falling back to the charged sum when nothing is left.
fn floor_or_fallback(sums: &IsolationSums, subtrahend: f64) -> f64 {
    let neutral = sums.neutral() - subtrahend;
    if neutral > 0.0 {
        neutral + sums.charged_pv
    } else {
        sums.charged_pv
    }
}

/// Combines cone sums into an absolute isolation according to `correction`.
pub fn corrected_isolation(
    sums: &IsolationSums,
    candidate: &CandidateLepton,
    radius: f64,
    correction: &IsolationCorrection,
) -> f64 {
    match *correction {
        IsolationCorrection::DeltaBeta { charged_only: true }
        | IsolationCorrection::PfWeighted { charged_only: true, .. } => sums.charged_pv,
        IsolationCorrection::DeltaBeta { charged_only: false } => {
            floor_or_fallback(sums, DELTA_BETA_FACTOR * sums.charged_pu)
        }
        IsolationCorrection::EffectiveArea { rho, generation } => {
            let pileup = effective_area_correction(generation.table(), candidate, radius, rho);
            sums.charged_pv + (sums.neutral() - pileup).max(0.0)
        }
        IsolationCorrection::PfWeighted { rho, charged_only: false } => {
            let pileup = effective_area_correction(&EA_SPRING15_SUSY, candidate, radius, rho);
            floor_or_fallback(sums, pileup)
        }
    }
}

/// Mini-isolation of `candidate` from the surrounding particles.
///
/// # Arguments
///
/// * `candidate` - lepton whose isolation is computed
/// * `particles` - all particle-flow candidates of the event
/// * `params` - cone parameters
/// * `correction` - pileup correction, which also fixes the cone radius policy
///
/// # Example
///
/// ```rust
/// # use jetcore::data::lepton::CandidateLepton;
/// # use jetcore::isolation::cone::MiniIsolationParams;
/// # use jetcore::isolation::correction::{mini_isolation, IsolationCorrection};
/// let mu = CandidateLepton::muon(3.0, 0.0, 0.0);
/// let iso = mini_isolation(&mu, &[], &MiniIsolationParams::default(), &IsolationCorrection::DeltaBeta { charged_only: false });
/// assert_eq!(iso, 99999.0);
/// ```
pub fn mini_isolation(
    candidate: &CandidateLepton,
    particles: &[Particle],
    params: &MiniIsolationParams,
    correction: &IsolationCorrection,
) -> f64 {
    if candidate.pt() < MIN_CANDIDATE_PT {
        return ISOLATION_UNDEFINED;
    }

    let radius = correction.cone_policy().radius(params, candidate.pt());
    match accumulate(candidate, particles, radius, correction.uses_pf_weighting()) {
        Some(sums) => corrected_isolation(&sums, candidate, radius, correction) / candidate.pt(),
        None => ISOLATION_UNDEFINED,
    }
}

/// Effective-area mini-isolation from sums already computed upstream.
///
/// Skips the cone accumulation entirely; only the pileup subtraction is applied.
pub fn mini_isolation_precomputed(
    candidate: &CandidateLepton,
    precomputed: &PrecomputedIsolation,
    params: &MiniIsolationParams,
    rho: f64,
    generation: EffectiveAreaGeneration,
) -> f64 {
    if candidate.pt() < MIN_CANDIDATE_PT {
        return ISOLATION_UNDEFINED;
    }

    let radius = ConeRadiusPolicy::SwappedBounds.radius(params, candidate.pt());
    let pileup = effective_area_correction(generation.table(), candidate, radius, rho);
    let neutral = precomputed.neutral_hadron + precomputed.photon;
    (precomputed.charged_hadron + (neutral - pileup).max(0.0)) / candidate.pt()
}

/// Muon fast path over the upstream mini-isolation triple.
pub fn mini_isolation_muon(
    pt: f64,
    eta: f64,
    precomputed: &PrecomputedIsolation,
    params: &MiniIsolationParams,
    rho: f64,
    generation: EffectiveAreaGeneration,
) -> f64 {
    let muon = CandidateLepton::new(
        Kinematics::new(pt, eta, 0.0, 0.0),
        LeptonFlavor::Muon,
    );
    mini_isolation_precomputed(&muon, precomputed, params, rho, generation)
}

/// Electron fast path over the upstream isolation triple, binned on the supercluster.
pub fn mini_isolation_electron(
    pt: f64,
    supercluster_eta: f64,
    precomputed: &PrecomputedIsolation,
    params: &MiniIsolationParams,
    rho: f64,
    generation: EffectiveAreaGeneration,
) -> f64 {
    let electron = CandidateLepton::new(
        Kinematics::new(pt, supercluster_eta, 0.0, 0.0),
        LeptonFlavor::Electron { supercluster_eta },
    );
    mini_isolation_precomputed(&electron, precomputed, params, rho, generation)
}

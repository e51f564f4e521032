use tracing::debug;

use crate::data::jet::{
    Jet, CHS_ETA, CHS_MASS, CHS_PHI, CHS_PRUNED_MASS, CHS_PT, CHS_SOFT_DROP_MASS, CHS_TAU1, CHS_TAU2,
    CHS_TAU3, CSV_V2, DOUBLE_B, MISSING_HIGH, MISSING_LOW, PUPPI_TAU1, PUPPI_TAU2, PUPPI_TAU3,
    SOFT_DROP_N2_B1, SOFT_DROP_N2_B2, SOFT_DROP_N3_B1, SOFT_DROP_N3_B2,
};
use crate::kinematics::geometry::delta_r;
use crate::substructure::calibration::SoftDropMassCalibration;
use crate::substructure::category::{classify, CategoryInputs, JetCategory};
use crate::substructure::charge::jet_charge;
use crate::substructure::smearing::{MassScaleResolution, SoftDropMassVariants};
use crate::substructure::subjets::{aggregate_subjets, BTagger, JetCorrector, JetSystematic, SubjetArrays, SubjetSummary};

/// Minimum pt of a large-radius jet to be analysed.
pub const AK8_MIN_PT: f64 = 170.0;
/// |eta| above which jets are dropped when the high-eta cut is enabled.
pub const HIGH_ETA_CUT: f64 = 2.4;
/// Generator-jet quantities reported for jets without a match.
pub const GEN_JET_MISSING: f64 = -99.0;

/// Event-wide settings shared by every large-radius jet.
#[derive(Clone, Debug)]
pub struct SubstructureContext<'a> {
    pub kappa: f64,
    pub is_mc: bool,
    pub kill_high_eta: bool,
    pub systematic: JetSystematic,
    pub calibration: &'a SoftDropMassCalibration,
    pub smearing: MassScaleResolution,
}

impl SubstructureContext<'_> {
    /// Whether a jet at `eta` survives the optional high-eta cut.
    pub fn accepts_eta(&self, eta: f64) -> bool {
        !(self.kill_high_eta && eta.abs() > HIGH_ETA_CUT)
    }
}

/// Upstream n-subjettiness values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Taus {
    pub tau1: f64,
    pub tau2: f64,
    pub tau3: f64,
}

impl Taus {
    fn read(jet: &Jet, names: [&str; 3]) -> Self {
        Taus {
            tau1: jet.user_float_or(names[0], MISSING_HIGH),
            tau2: jet.user_float_or(names[1], MISSING_HIGH),
            tau3: jet.user_float_or(names[2], MISSING_HIGH),
        }
    }
}

/// Everything computed for one retained large-radius jet.
#[derive(Clone, Debug, PartialEq)]
pub struct Ak8Features {
    /// Position of the jet in the input collection.
    pub index: usize,
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub energy: f64,
    pub mass: f64,
    pub csv: f64,
    pub double_b: f64,
    pub jet_charge: f64,
    pub gen_pt: f64,
    pub gen_mass: f64,
    pub gen_delta_r: f64,
    pub chs_pt: f64,
    pub chs_eta: f64,
    pub chs_phi: f64,
    pub chs_mass: f64,
    pub chs_pruned_mass: f64,
    pub chs_soft_drop_mass: f64,
    pub puppi_taus: Taus,
    pub chs_taus: Taus,
    pub n2_b1: f64,
    pub n3_b1: f64,
    pub n2_b2: f64,
    pub n3_b2: f64,
    pub n_daughters: usize,
    pub soft_drop_raw: f64,
    /// Product of the generator and reco calibration functions.
    pub soft_drop_correction: f64,
    pub soft_drop_corrected: f64,
    pub soft_drop: SoftDropMassVariants,
    pub subjets: SubjetSummary,
    pub category: JetCategory,
}

/// Computes the substructure features of one large-radius jet.
///
/// Subjets of retained jets are appended to `subjet_arrays`; skipped jets
/// leave it untouched and return `None`.
///
/// # Arguments
///
/// * `jet` - the large-radius jet
/// * `index` - its position in the input collection
/// * `ctx` - event-wide settings
/// * `corrector` - subjet energy corrections
/// * `tagger` - subjet b-tag decisions
/// * `subjet_arrays` - event-wide flat subjet output
pub fn extract_ak8_features(
    jet: &Jet,
    index: usize,
    ctx: &SubstructureContext<'_>,
    corrector: &dyn JetCorrector,
    tagger: &dyn BTagger,
    subjet_arrays: &mut SubjetArrays,
) -> Option<Ak8Features> {
    if jet.pt() < AK8_MIN_PT {
        debug!(index, pt = jet.pt(), "skipping AK8 jet below pt threshold");
        return None;
    }
    if !ctx.accepts_eta(jet.eta()) {
        debug!(index, eta = jet.eta(), "skipping forward AK8 jet");
        return None;
    }

    let (gen_pt, gen_mass, gen_delta_r) = match &jet.gen_jet {
        Some(gen) => (gen.pt, gen.mass(), delta_r(gen.eta, gen.phi, jet.eta(), jet.phi())),
        None => (GEN_JET_MISSING, GEN_JET_MISSING, GEN_JET_MISSING),
    };

    let subjets = aggregate_subjets(jet, ctx.systematic, ctx.is_mc, corrector, tagger, subjet_arrays);

    let soft_drop_raw = subjets.soft_drop_p4.mass();
    let soft_drop_correction = ctx.calibration.correction(jet.pt(), jet.eta());
    let soft_drop_corrected = soft_drop_raw * soft_drop_correction;
    let soft_drop = ctx.smearing.variants(soft_drop_corrected, jet.phi(), ctx.is_mc);

    let puppi_taus = Taus::read(jet, [PUPPI_TAU1, PUPPI_TAU2, PUPPI_TAU3]);
    let double_b = jet.discriminators.get(DOUBLE_B);

    let category = classify(&CategoryInputs {
        soft_drop_mass: soft_drop_corrected,
        tau1: puppi_taus.tau1,
        tau2: puppi_taus.tau2,
        tau3: puppi_taus.tau3,
        double_b,
        tagged_subjets: subjets.tagged,
    });

    Some(Ak8Features {
        index,
        pt: jet.pt(),
        eta: jet.eta(),
        phi: jet.phi(),
        energy: jet.energy(),
        mass: jet.mass(),
        csv: jet.discriminators.get(CSV_V2),
        double_b,
        jet_charge: jet_charge(jet.pt(), &jet.constituents, ctx.kappa),
        gen_pt,
        gen_mass,
        gen_delta_r,
        chs_pt: jet.user_float_or(CHS_PT, MISSING_LOW),
        chs_eta: jet.user_float_or(CHS_ETA, MISSING_LOW),
        chs_phi: jet.user_float_or(CHS_PHI, MISSING_LOW),
        chs_mass: jet.user_float_or(CHS_MASS, MISSING_LOW),
        chs_pruned_mass: jet.user_float_or(CHS_PRUNED_MASS, MISSING_LOW),
        chs_soft_drop_mass: jet.user_float_or(CHS_SOFT_DROP_MASS, MISSING_LOW),
        puppi_taus,
        chs_taus: Taus::read(jet, [CHS_TAU1, CHS_TAU2, CHS_TAU3]),
        n2_b1: jet.user_float_or(SOFT_DROP_N2_B1, MISSING_HIGH),
        n3_b1: jet.user_float_or(SOFT_DROP_N3_B1, MISSING_HIGH),
        n2_b2: jet.user_float_or(SOFT_DROP_N2_B2, MISSING_HIGH),
        n3_b2: jet.user_float_or(SOFT_DROP_N3_B2, MISSING_HIGH),
        n_daughters: jet.n_daughters,
        soft_drop_raw,
        soft_drop_correction,
        soft_drop_corrected,
        soft_drop,
        subjets,
        category,
    })
}

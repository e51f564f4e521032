use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use jetcore::data::jet::{Jet, DEEP_FLAVOUR_B, MISSING_LOW, PILEUP_JET_ID, PILEUP_JET_ID_DISCRIMINANT};
use jetcore::data::lepton::{CandidateLepton, LeptonFlavor};
use jetcore::data::particle::Particle;
use jetcore::isolation::cone::MiniIsolationParams;
use jetcore::isolation::constants::{EffectiveAreaGeneration, ISOLATION_UNDEFINED};
use jetcore::isolation::correction::{
    mini_isolation, mini_isolation_electron, mini_isolation_muon, mini_isolation_precomputed, IsolationCorrection,
};
use jetcore::substructure::calibration::SoftDropMassCalibration;
use jetcore::substructure::features::{extract_ak8_features, Ak8Features, SubstructureContext, HIGH_ETA_CUT};
use jetcore::substructure::smearing::MassScaleResolution;
use jetcore::substructure::subjets::{BTagVariant, BTagger, JetCorrector, JetSystematic, SubjetArrays};

use crate::config::CalcConfig;
use crate::error::Result;
use crate::event::Event;
use crate::features::FeatureVectorSet;
use crate::strategies::{PassThroughCorrector, WorkingPointTagger};

/// Leading and sub-leading jet pt when there is no such jet.
pub const NO_JET_PT: f64 = -999.0;

/// Arrays with one entry per retained small-radius jet.
pub const AK4_JET_ARRAYS: &[&str] = &[
    "theJetPt",
    "theJetEta",
    "theJetPhi",
    "theJetEnergy",
    "theJetDeepFlavB",
    "theJetPFlav",
    "theJetHFlav",
    "theJetBTag",
    "theJetBTag_bSFup",
    "theJetBTag_bSFdn",
    "theJetBTag_lSFup",
    "theJetBTag_lSFdn",
    "theJetPileupJetId",
    "theJetPileupJetLoose",
    "theJetPileupJetMedium",
    "theJetPileupJetTight",
    "theJetnDaughters",
];

/// Arrays with one entry per retained large-radius jet.
pub const AK8_JET_ARRAYS: &[&str] = &[
    "theJetAK8Pt",
    "theJetAK8Eta",
    "theJetAK8Phi",
    "theJetAK8Energy",
    "theJetAK8Mass",
    "theJetAK8Index",
    "theJetAK8CSV",
    "theJetAK8DoubleB",
    "theJetAK8JetCharge",
    "theJetAK8GenPt",
    "theJetAK8GenDR",
    "theJetAK8GenMass",
    "theJetAK8CHSPt",
    "theJetAK8CHSEta",
    "theJetAK8CHSPhi",
    "theJetAK8CHSMass",
    "theJetAK8CHSPrunedMass",
    "theJetAK8CHSSoftDropMass",
    "theJetAK8NjettinessTau1",
    "theJetAK8NjettinessTau2",
    "theJetAK8NjettinessTau3",
    "theJetAK8CHSTau1",
    "theJetAK8CHSTau2",
    "theJetAK8CHSTau3",
    "theJetAK8SoftDropn2b1",
    "theJetAK8SoftDropn3b1",
    "theJetAK8SoftDropn2b2",
    "theJetAK8SoftDropn3b2",
    "theJetAK8nDaughters",
    "theJetAK8SoftDropRaw",
    "theJetAK8SoftDropCorr",
    "theJetAK8SoftDrop",
    "theJetAK8SoftDrop_JMSup",
    "theJetAK8SoftDrop_JMSdn",
    "theJetAK8SoftDrop_JMRup",
    "theJetAK8SoftDrop_JMRdn",
    "theJetAK8SDSubjetIndex",
    "theJetAK8SDSubjetSize",
    "theJetAK8SDSubjetNDeepCSVL",
    "theJetAK8SDSubjetNDeepCSVMSF",
    "theJetAK8SDSubjetNDeepCSVM_bSFup",
    "theJetAK8SDSubjetNDeepCSVM_bSFdn",
    "theJetAK8SDSubjetNDeepCSVM_lSFup",
    "theJetAK8SDSubjetNDeepCSVM_lSFdn",
    "maxProb",
];

/// Arrays with one entry per soft-drop subjet of the retained large-radius jets.
pub const AK8_SUBJET_ARRAYS: &[&str] = &[
    "theJetAK8SDSubjetPt",
    "theJetAK8SDSubjetEta",
    "theJetAK8SDSubjetPhi",
    "theJetAK8SDSubjetMass",
    "theJetAK8SDSubjetDeepCSVb",
    "theJetAK8SDSubjetHFlav",
    "theJetAK8SDSubjetBTag",
    "theJetAK8SDSubjetDR",
];

/// Arrays with one entry per lepton candidate.
pub const LEPTON_ARRAYS: &[&str] = &[
    "theLeptonPt",
    "theLeptonEta",
    "theLeptonPhi",
    "theLeptonFlavor",
    "theLeptonMiniIsoDeltaBeta",
    "theLeptonMiniIsoEA",
    "theLeptonMiniIsoPFWeighted",
    "theLeptonMiniIsoUpstream",
];

/// Loose, medium and tight pileup-jet-id flags from the packed integer id.
pub fn pileup_id_flags(id: Option<i32>) -> (bool, bool, bool) {
    match id {
        Some(7) => (true, true, true),
        Some(6) => (true, true, false),
        Some(4) => (true, false, false),
        _ => (false, false, false),
    }
}

/// Leading pt and the largest pt strictly below it.
pub fn leading_pts(pts: &[f64]) -> (f64, f64) {
    let lead = pts.iter().copied().reduce(f64::max).unwrap_or(NO_JET_PT);
    let sub_lead = pts
        .iter()
        .copied()
        .filter(|&pt| pt < lead)
        .reduce(f64::max)
        .unwrap_or(NO_JET_PT);
    (lead, sub_lead)
}

fn flavor_code(flavor: &LeptonFlavor) -> i64 {
    match flavor {
        LeptonFlavor::Electron { .. } => 11,
        LeptonFlavor::Muon => 13,
        LeptonFlavor::Other => 0,
    }
}

/// Effective-area isolation from the upstream triple, [`ISOLATION_UNDEFINED`] without one.
fn upstream_isolation(
    lepton: &CandidateLepton,
    params: &MiniIsolationParams,
    rho: f64,
    generation: EffectiveAreaGeneration,
) -> f64 {
    let precomputed = match &lepton.precomputed {
        Some(precomputed) => precomputed,
        None => return ISOLATION_UNDEFINED,
    };
    match lepton.flavor {
        LeptonFlavor::Muon => mini_isolation_muon(lepton.pt(), lepton.eta(), precomputed, params, rho, generation),
        LeptonFlavor::Electron { supercluster_eta } => {
            mini_isolation_electron(lepton.pt(), supercluster_eta, precomputed, params, rho, generation)
        }
        LeptonFlavor::Other => mini_isolation_precomputed(lepton, precomputed, params, rho, generation),
    }
}

/// Turns one event into the flat feature collection.
pub struct EventFeatureDriver {
    config: CalcConfig,
    systematic: JetSystematic,
    calibration: SoftDropMassCalibration,
    smearing: MassScaleResolution,
    corrector: Box<dyn JetCorrector>,
    tagger: Box<dyn BTagger>,
}

impl EventFeatureDriver {
    /// Validates `config` and wires in the given strategies.
    pub fn new(
        config: CalcConfig,
        calibration: SoftDropMassCalibration,
        corrector: Box<dyn JetCorrector>,
        tagger: Box<dyn BTagger>,
    ) -> Result<Self> {
        config.validate()?;
        let systematic = config.systematic()?;
        info!(
            is_mc = config.is_mc,
            kill_high_eta = config.kill_high_eta,
            kappa = config.jet_charge_kappa,
            systematic = ?systematic,
            "configured event feature driver"
        );
        Ok(EventFeatureDriver {
            config,
            systematic,
            calibration,
            smearing: MassScaleResolution::default(),
            corrector,
            tagger,
        })
    }

    /// Driver with the bundled strategies and the configured calibration.
    pub fn from_config(config: CalcConfig) -> Result<Self> {
        let calibration = config.load_calibration()?;
        let tagger = WorkingPointTagger::new(config.btag);
        Self::new(config, calibration, Box::new(PassThroughCorrector), Box::new(tagger))
    }

    pub fn config(&self) -> &CalcConfig {
        &self.config
    }

    pub fn analyze(&self, event: &Event) -> FeatureVectorSet {
        let mut features = FeatureVectorSet::new();
        self.fill_ak4(&event.jets, &mut features);
        self.fill_ak8(&event.ak8_jets, &mut features);
        self.fill_leptons(&event.leptons, &event.particles, event.rho, &mut features);
        features
    }

    fn accepts_eta(&self, eta: f64) -> bool {
        !(self.config.kill_high_eta && eta.abs() > HIGH_ETA_CUT)
    }

    fn fill_ak4(&self, jets: &[Jet], features: &mut FeatureVectorSet) {
        let is_mc = self.config.is_mc;

        let mut pt = Vec::new();
        let mut eta = Vec::new();
        let mut phi = Vec::new();
        let mut energy = Vec::new();
        let mut deep_flavour_b = Vec::new();
        let mut parton_flavour = Vec::new();
        let mut hadron_flavour = Vec::new();
        let mut btag: [Vec<i64>; 5] = Default::default();
        let mut pileup_id = Vec::new();
        let mut pileup_loose = Vec::new();
        let mut pileup_medium = Vec::new();
        let mut pileup_tight = Vec::new();
        let mut n_daughters = Vec::new();
        let mut ht = 0.0;

        for (index, jet) in jets.iter().enumerate() {
            if !self.accepts_eta(jet.eta()) {
                debug!(index, eta = jet.eta(), "skipping forward AK4 jet");
                continue;
            }

            pt.push(jet.pt());
            eta.push(jet.eta());
            phi.push(jet.phi());
            energy.push(jet.energy());
            deep_flavour_b.push(jet.discriminators.sum(&DEEP_FLAVOUR_B));
            parton_flavour.push(jet.parton_flavour.abs() as i64);
            hadron_flavour.push(jet.hadron_flavour.abs() as i64);

            let candidate = jet.btag_candidate();
            let reference = jet.p4();
            for (column, variant) in btag.iter_mut().zip(BTagVariant::ALL) {
                column.push(self.tagger.is_tagged(&candidate, &reference, is_mc, variant, false) as i64);
            }

            pileup_id.push(jet.user_float_or(PILEUP_JET_ID_DISCRIMINANT, MISSING_LOW));
            let (loose, medium, tight) = pileup_id_flags(jet.user_int(PILEUP_JET_ID));
            pileup_loose.push(loose as i64);
            pileup_medium.push(medium as i64);
            pileup_tight.push(tight as i64);

            n_daughters.push(jet.n_daughters as i64);
            ht += jet.pt();
        }

        let (lead_pt, sub_lead_pt) = leading_pts(&pt);
        let [btag_nominal, btag_b_up, btag_b_down, btag_light_up, btag_light_down] = btag;

        features.set_floats("theJetPt", pt);
        features.set_floats("theJetEta", eta);
        features.set_floats("theJetPhi", phi);
        features.set_floats("theJetEnergy", energy);
        features.set_floats("theJetDeepFlavB", deep_flavour_b);
        features.set_ints("theJetPFlav", parton_flavour);
        features.set_ints("theJetHFlav", hadron_flavour);
        features.set_ints("theJetBTag", btag_nominal);
        features.set_ints("theJetBTag_bSFup", btag_b_up);
        features.set_ints("theJetBTag_bSFdn", btag_b_down);
        features.set_ints("theJetBTag_lSFup", btag_light_up);
        features.set_ints("theJetBTag_lSFdn", btag_light_down);
        features.set_floats("theJetPileupJetId", pileup_id);
        features.set_ints("theJetPileupJetLoose", pileup_loose);
        features.set_ints("theJetPileupJetMedium", pileup_medium);
        features.set_ints("theJetPileupJetTight", pileup_tight);
        features.set_ints("theJetnDaughters", n_daughters);
        features.set_float("theJetHT", ht);
        features.set_float("theJetLeadPt", lead_pt);
        features.set_float("theJetSubLeadPt", sub_lead_pt);

        if !features.is_aligned(AK4_JET_ARRAYS) {
            warn!("AK4 jet arrays are not index aligned");
        }
    }

    fn fill_ak8(&self, jets: &[Jet], features: &mut FeatureVectorSet) {
        let ctx = SubstructureContext {
            kappa: self.config.jet_charge_kappa,
            is_mc: self.config.is_mc,
            kill_high_eta: self.config.kill_high_eta,
            systematic: self.systematic,
            calibration: &self.calibration,
            smearing: self.smearing,
        };

        let mut subjets = SubjetArrays::new();
        let retained: Vec<Ak8Features> = jets
            .iter()
            .enumerate()
            .filter_map(|(index, jet)| {
                extract_ak8_features(jet, index, &ctx, self.corrector.as_ref(), self.tagger.as_ref(), &mut subjets)
            })
            .collect();

        let floats = |value: fn(&Ak8Features) -> f64| retained.iter().map(value).collect::<Vec<f64>>();
        let ints = |value: fn(&Ak8Features) -> i64| retained.iter().map(value).collect::<Vec<i64>>();

        features.set_floats("theJetAK8Pt", floats(|j| j.pt));
        features.set_floats("theJetAK8Eta", floats(|j| j.eta));
        features.set_floats("theJetAK8Phi", floats(|j| j.phi));
        features.set_floats("theJetAK8Energy", floats(|j| j.energy));
        features.set_floats("theJetAK8Mass", floats(|j| j.mass));
        features.set_ints("theJetAK8Index", ints(|j| j.index as i64));
        features.set_floats("theJetAK8CSV", floats(|j| j.csv));
        features.set_floats("theJetAK8DoubleB", floats(|j| j.double_b));
        features.set_floats("theJetAK8JetCharge", floats(|j| j.jet_charge));
        features.set_floats("theJetAK8GenPt", floats(|j| j.gen_pt));
        features.set_floats("theJetAK8GenDR", floats(|j| j.gen_delta_r));
        features.set_floats("theJetAK8GenMass", floats(|j| j.gen_mass));

        features.set_floats("theJetAK8CHSPt", floats(|j| j.chs_pt));
        features.set_floats("theJetAK8CHSEta", floats(|j| j.chs_eta));
        features.set_floats("theJetAK8CHSPhi", floats(|j| j.chs_phi));
        features.set_floats("theJetAK8CHSMass", floats(|j| j.chs_mass));
        features.set_floats("theJetAK8CHSPrunedMass", floats(|j| j.chs_pruned_mass));
        features.set_floats("theJetAK8CHSSoftDropMass", floats(|j| j.chs_soft_drop_mass));

        features.set_floats("theJetAK8NjettinessTau1", floats(|j| j.puppi_taus.tau1));
        features.set_floats("theJetAK8NjettinessTau2", floats(|j| j.puppi_taus.tau2));
        features.set_floats("theJetAK8NjettinessTau3", floats(|j| j.puppi_taus.tau3));
        features.set_floats("theJetAK8CHSTau1", floats(|j| j.chs_taus.tau1));
        features.set_floats("theJetAK8CHSTau2", floats(|j| j.chs_taus.tau2));
        features.set_floats("theJetAK8CHSTau3", floats(|j| j.chs_taus.tau3));
        features.set_floats("theJetAK8SoftDropn2b1", floats(|j| j.n2_b1));
        features.set_floats("theJetAK8SoftDropn3b1", floats(|j| j.n3_b1));
        features.set_floats("theJetAK8SoftDropn2b2", floats(|j| j.n2_b2));
        features.set_floats("theJetAK8SoftDropn3b2", floats(|j| j.n3_b2));
        features.set_ints("theJetAK8nDaughters", ints(|j| j.n_daughters as i64));

        features.set_floats("theJetAK8SoftDropRaw", floats(|j| j.soft_drop_raw));
        features.set_floats("theJetAK8SoftDropCorr", floats(|j| j.soft_drop_corrected));
        features.set_floats("theJetAK8SoftDrop", floats(|j| j.soft_drop.nominal));
        features.set_floats("theJetAK8SoftDrop_JMSup", floats(|j| j.soft_drop.jms_up));
        features.set_floats("theJetAK8SoftDrop_JMSdn", floats(|j| j.soft_drop.jms_down));
        features.set_floats("theJetAK8SoftDrop_JMRup", floats(|j| j.soft_drop.jmr_up));
        features.set_floats("theJetAK8SoftDrop_JMRdn", floats(|j| j.soft_drop.jmr_down));

        features.set_ints("theJetAK8SDSubjetIndex", ints(|j| j.subjets.index as i64));
        features.set_ints("theJetAK8SDSubjetSize", ints(|j| j.subjets.size as i64));
        features.set_ints("theJetAK8SDSubjetNDeepCSVL", ints(|j| j.subjets.n_loose as i64));
        features.set_ints("theJetAK8SDSubjetNDeepCSVMSF", ints(|j| j.subjets.n_tagged as i64));
        features.set_ints("theJetAK8SDSubjetNDeepCSVM_bSFup", ints(|j| j.subjets.n_tagged_b_sf_up as i64));
        features.set_ints("theJetAK8SDSubjetNDeepCSVM_bSFdn", ints(|j| j.subjets.n_tagged_b_sf_down as i64));
        features.set_ints("theJetAK8SDSubjetNDeepCSVM_lSFup", ints(|j| j.subjets.n_tagged_light_sf_up as i64));
        features.set_ints("theJetAK8SDSubjetNDeepCSVM_lSFdn", ints(|j| j.subjets.n_tagged_light_sf_down as i64));
        features.set_ints("maxProb", ints(|j| j.category.code() as i64));

        let to_i64 = |values: Vec<i32>| values.into_iter().map(i64::from).collect::<Vec<i64>>();
        features.set_floats("theJetAK8SDSubjetPt", subjets.pt);
        features.set_floats("theJetAK8SDSubjetEta", subjets.eta);
        features.set_floats("theJetAK8SDSubjetPhi", subjets.phi);
        features.set_floats("theJetAK8SDSubjetMass", subjets.mass);
        features.set_floats("theJetAK8SDSubjetDeepCSVb", subjets.deep_csv_b);
        features.set_ints("theJetAK8SDSubjetHFlav", to_i64(subjets.hadron_flavour));
        features.set_ints("theJetAK8SDSubjetBTag", to_i64(subjets.btag));
        features.set_floats("theJetAK8SDSubjetDR", subjets.delta_r);

        if !features.is_aligned(AK8_JET_ARRAYS) {
            warn!("AK8 jet arrays are not index aligned");
        }
        if !features.is_aligned(AK8_SUBJET_ARRAYS) {
            warn!("AK8 subjet arrays are not index aligned");
        }
    }

    fn fill_leptons(&self, leptons: &[CandidateLepton], particles: &[Particle], rho: f64, features: &mut FeatureVectorSet) {
        let params = self.config.mini_isolation.params();
        let charged_only = self.config.mini_isolation.charged_only;
        let generation = self.config.effective_area_generation;

        let delta_beta = IsolationCorrection::DeltaBeta { charged_only };
        let effective_area = IsolationCorrection::EffectiveArea { rho, generation };
        let pf_weighted = IsolationCorrection::PfWeighted { rho, charged_only };

        let mut pt = Vec::with_capacity(leptons.len());
        let mut eta = Vec::with_capacity(leptons.len());
        let mut phi = Vec::with_capacity(leptons.len());
        let mut flavor = Vec::with_capacity(leptons.len());
        let mut iso_delta_beta = Vec::with_capacity(leptons.len());
        let mut iso_effective_area = Vec::with_capacity(leptons.len());
        let mut iso_pf_weighted = Vec::with_capacity(leptons.len());
        let mut iso_upstream = Vec::with_capacity(leptons.len());

        for lepton in leptons {
            pt.push(lepton.pt());
            eta.push(lepton.eta());
            phi.push(lepton.phi());
            flavor.push(flavor_code(&lepton.flavor));
            iso_delta_beta.push(mini_isolation(lepton, particles, &params, &delta_beta));
            iso_effective_area.push(mini_isolation(lepton, particles, &params, &effective_area));
            iso_pf_weighted.push(mini_isolation(lepton, particles, &params, &pf_weighted));
            iso_upstream.push(upstream_isolation(lepton, &params, rho, generation));
        }

        features.set_floats("theLeptonPt", pt);
        features.set_floats("theLeptonEta", eta);
        features.set_floats("theLeptonPhi", phi);
        features.set_ints("theLeptonFlavor", flavor);
        features.set_floats("theLeptonMiniIsoDeltaBeta", iso_delta_beta);
        features.set_floats("theLeptonMiniIsoEA", iso_effective_area);
        features.set_floats("theLeptonMiniIsoPFWeighted", iso_pf_weighted);
        features.set_floats("theLeptonMiniIsoUpstream", iso_upstream);
    }
}

/// Analyses `events` in parallel on a dedicated pool, preserving their order.
pub fn analyze_events(driver: &EventFeatureDriver, events: &[Event], num_threads: usize) -> Result<Vec<FeatureVectorSet>> {
    let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;
    let results: Vec<FeatureVectorSet> = pool.install(|| events.par_iter().map(|event| driver.analyze(event)).collect());
    info!(events = results.len(), threads = pool.current_num_threads(), "analyzed events");
    Ok(results)
}

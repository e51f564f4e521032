use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::jet::{BTagCandidate, Jet, Subjet, DEEP_CSV_B};
use crate::kinematics::geometry::delta_r;
use crate::kinematics::lorentz::LorentzVector;

/// Loose DeepCSV working point applied to subjets.
pub const DEEP_CSV_LOOSE: f64 = 0.1522;

/// Energy scale or resolution shift applied to every corrected object of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JetSystematic {
    #[default]
    Nominal,
    JecUp,
    JecDown,
    JerUp,
    JerDown,
}

impl JetSystematic {
    /// Integer code understood by correction services (0 nominal, 1..4 shifts).
    pub fn code(&self) -> i32 {
        match self {
            JetSystematic::Nominal => 0,
            JetSystematic::JecUp => 1,
            JetSystematic::JecDown => 2,
            JetSystematic::JerUp => 3,
            JetSystematic::JerDown => 4,
        }
    }
}

/// Scale-factor variation under which a b-tag decision is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BTagVariant {
    Nominal,
    BSfUp,
    BSfDown,
    LightSfUp,
    LightSfDown,
}

impl BTagVariant {
    pub const ALL: [BTagVariant; 5] = [
        BTagVariant::Nominal,
        BTagVariant::BSfUp,
        BTagVariant::BSfDown,
        BTagVariant::LightSfUp,
        BTagVariant::LightSfDown,
    ];
}

/// Applies energy corrections to a subjet.
pub trait JetCorrector: Send + Sync {
    fn correct(&self, subjet: &Subjet, systematic: JetSystematic) -> Subjet;
}

impl<F> JetCorrector for F
where
    F: Fn(&Subjet, JetSystematic) -> Subjet + Send + Sync,
{
    fn correct(&self, subjet: &Subjet, systematic: JetSystematic) -> Subjet {
        self(subjet, systematic)
    }
}

/// Decides whether a jet or subjet counts as b-tagged.
pub trait BTagger: Send + Sync {
    /// # Arguments
    ///
    /// * `candidate` - the object being tagged
    /// * `reference` - momentum used to look up scale factors (the parent jet for subjets)
    /// * `is_mc` - scale factors only apply to simulation
    /// * `variant` - scale-factor variation
    /// * `is_subjet` - selects the subjet calibration
    fn is_tagged(
        &self,
        candidate: &BTagCandidate<'_>,
        reference: &LorentzVector,
        is_mc: bool,
        variant: BTagVariant,
        is_subjet: bool,
    ) -> bool;
}

impl<F> BTagger for F
where
    F: Fn(&BTagCandidate<'_>, &LorentzVector, bool, BTagVariant, bool) -> bool + Send + Sync,
{
    fn is_tagged(
        &self,
        candidate: &BTagCandidate<'_>,
        reference: &LorentzVector,
        is_mc: bool,
        variant: BTagVariant,
        is_subjet: bool,
    ) -> bool {
        self(candidate, reference, is_mc, variant, is_subjet)
    }
}

/// Flat per-subjet output arrays shared by all jets of an event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubjetArrays {
    pub pt: Vec<f64>,
    pub eta: Vec<f64>,
    pub phi: Vec<f64>,
    pub mass: Vec<f64>,
    pub deep_csv_b: Vec<f64>,
    pub hadron_flavour: Vec<i32>,
    pub btag: Vec<i32>,
    pub delta_r: Vec<f64>,
}

impl SubjetArrays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pt.is_empty()
    }

    fn push(&mut self, subjet: &Subjet, deep_csv_b: f64, tagged: bool, distance: f64) {
        self.pt.push(subjet.kinematics.pt);
        self.eta.push(subjet.kinematics.eta);
        self.phi.push(subjet.kinematics.phi);
        self.mass.push(subjet.kinematics.mass());
        self.deep_csv_b.push(deep_csv_b);
        self.hadron_flavour.push(subjet.hadron_flavour);
        self.btag.push(tagged as i32);
        self.delta_r.push(distance);
    }
}

/// Per-jet bookkeeping produced while filling [`SubjetArrays`].
#[derive(Clone, Debug, PartialEq)]
pub struct SubjetSummary {
    /// Position of the first subjet of this jet in the flat arrays.
    pub index: usize,
    pub size: usize,
    pub n_loose: i32,
    pub n_tagged: i32,
    pub n_tagged_b_sf_up: i32,
    pub n_tagged_b_sf_down: i32,
    pub n_tagged_light_sf_up: i32,
    pub n_tagged_light_sf_down: i32,
    /// Sum of the corrected subjet four-vectors.
    pub soft_drop_p4: LorentzVector,
    /// Nominal tag count, `None` when the jet carries no subjet collection.
    pub tagged: Option<i32>,
}

impl SubjetSummary {
    fn empty(index: usize) -> Self {
        SubjetSummary {
            index,
            size: 0,
            n_loose: 0,
            n_tagged: 0,
            n_tagged_b_sf_up: 0,
            n_tagged_b_sf_down: 0,
            n_tagged_light_sf_up: 0,
            n_tagged_light_sf_down: 0,
            soft_drop_p4: LorentzVector::zero(),
            tagged: None,
        }
    }

    fn count(&mut self, variant: BTagVariant) {
        let counter = match variant {
            BTagVariant::Nominal => &mut self.n_tagged,
            BTagVariant::BSfUp => &mut self.n_tagged_b_sf_up,
            BTagVariant::BSfDown => &mut self.n_tagged_b_sf_down,
            BTagVariant::LightSfUp => &mut self.n_tagged_light_sf_up,
            BTagVariant::LightSfDown => &mut self.n_tagged_light_sf_down,
        };
        *counter += 1;
    }
}

/// Corrects and tags the soft-drop subjets of `jet`, appending them to `arrays`.
///
/// # Arguments
///
/// * `jet` - parent large-radius jet
/// * `corrector` - applied once per subjet under `systematic`
/// * `tagger` - evaluated under every [`BTagVariant`], parent momentum as reference
/// * `arrays` - event-wide subjet arrays, extended in place
///
/// # Returns
///
/// * `SubjetSummary` - start index and length of the appended range plus the tag counts
pub fn aggregate_subjets(
    jet: &Jet,
    systematic: JetSystematic,
    is_mc: bool,
    corrector: &dyn JetCorrector,
    tagger: &dyn BTagger,
    arrays: &mut SubjetArrays,
) -> SubjetSummary {
    let mut summary = SubjetSummary::empty(arrays.len());

    let subjets = match &jet.subjets {
        Some(subjets) => subjets,
        None => {
            warn!(pt = jet.pt(), eta = jet.eta(), "jet has no soft-drop subjet collection");
            return summary;
        }
    };

    let reference = jet.p4();

    for subjet in subjets {
        let corrected = corrector.correct(subjet, systematic);
        let deep_csv_b = corrected.discriminators.sum(&DEEP_CSV_B);
        let candidate = corrected.btag_candidate();

        if deep_csv_b > DEEP_CSV_LOOSE {
            summary.n_loose += 1;
        }

        let mut nominal = false;
        for variant in BTagVariant::ALL {
            if tagger.is_tagged(&candidate, &reference, is_mc, variant, true) {
                summary.count(variant);
                nominal |= variant == BTagVariant::Nominal;
            }
        }

        let distance = delta_r(
            corrected.kinematics.eta,
            corrected.kinematics.phi,
            jet.eta(),
            jet.phi(),
        );

        summary.soft_drop_p4 += corrected.p4();
        arrays.push(&corrected, deep_csv_b, nominal, distance);
    }

    summary.size = subjets.len();
    summary.tagged = Some(summary.n_tagged);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::jet::Discriminators;
    use crate::kinematics::lorentz::Kinematics;
    use approx::assert_relative_eq;

    fn subjet(pt: f64, eta: f64, phi: f64, probb: f64) -> Subjet {
        Subjet::new(
            Kinematics::from_mass(pt, eta, phi, 10.0),
            Discriminators::new()
                .with(DEEP_CSV_B[0], probb)
                .with(DEEP_CSV_B[1], 0.0),
            5,
        )
    }

    fn identity(subjet: &Subjet, _: JetSystematic) -> Subjet {
        subjet.clone()
    }

    fn score_tagger(candidate: &BTagCandidate<'_>, _: &LorentzVector, _: bool, variant: BTagVariant, _: bool) -> bool {
        let threshold = match variant {
            BTagVariant::BSfUp => 0.3,
            BTagVariant::BSfDown => 0.7,
            _ => 0.5,
        };
        candidate.discriminators.sum(&DEEP_CSV_B) > threshold
    }

    #[test]
    fn test_counts() {
        let jet = Jet::new(Kinematics::from_mass(400.0, 0.0, 0.0, 120.0))
            .with_subjets(vec![subjet(250.0, 0.1, 0.1, 0.6), subjet(150.0, -0.2, -0.1, 0.4), subjet(20.0, 0.3, 0.3, 0.1)]);
        let mut arrays = SubjetArrays::new();

        let summary = aggregate_subjets(&jet, JetSystematic::Nominal, true, &identity, &score_tagger, &mut arrays);

        assert_eq!(summary.index, 0);
        assert_eq!(summary.size, 3);
        assert_eq!(summary.n_loose, 2);
        assert_eq!(summary.n_tagged, 1);
        assert_eq!(summary.n_tagged_b_sf_up, 2);
        assert_eq!(summary.n_tagged_b_sf_down, 0);
        assert_eq!(summary.n_tagged_light_sf_up, 1);
        assert_eq!(summary.tagged, Some(1));
        assert_eq!(arrays.btag, vec![1, 0, 0]);
        assert_eq!(arrays.hadron_flavour, vec![5, 5, 5]);
        assert_relative_eq!(arrays.delta_r[0], (0.02_f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(arrays.mass[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ranges_partition_arrays() {
        let jets = vec![
            Jet::new(Kinematics::from_mass(400.0, 0.0, 0.0, 120.0)).with_subjets(vec![subjet(200.0, 0.0, 0.0, 0.9); 2]),
            Jet::new(Kinematics::from_mass(300.0, 1.0, 1.0, 80.0)),
            Jet::new(Kinematics::from_mass(250.0, -1.0, 2.0, 60.0)).with_subjets(vec![]),
            Jet::new(Kinematics::from_mass(220.0, 0.5, -2.0, 40.0)).with_subjets(vec![subjet(100.0, 0.5, -2.0, 0.0); 3]),
        ];
        let mut arrays = SubjetArrays::new();
        let summaries: Vec<SubjetSummary> = jets
            .iter()
            .map(|jet| aggregate_subjets(jet, JetSystematic::Nominal, false, &identity, &score_tagger, &mut arrays))
            .collect();

        let mut next = 0;
        for summary in &summaries {
            assert_eq!(summary.index, next);
            next += summary.size;
        }
        assert_eq!(next, arrays.len());
        assert_eq!(arrays.len(), 5);
        assert_eq!(summaries[1].tagged, None);
        assert_eq!(summaries[2].tagged, Some(0));
    }

    #[test]
    fn test_corrector_sees_systematic() {
        let scale_up = |subjet: &Subjet, systematic: JetSystematic| {
            let mut corrected = subjet.clone();
            if systematic == JetSystematic::JecUp {
                corrected.kinematics.pt *= 1.1;
                corrected.kinematics.energy *= 1.1;
            }
            corrected
        };
        let jet = Jet::new(Kinematics::from_mass(400.0, 0.0, 0.0, 120.0)).with_subjets(vec![subjet(100.0, 0.0, 0.0, 0.0)]);
        let mut arrays = SubjetArrays::new();

        let summary = aggregate_subjets(&jet, JetSystematic::JecUp, true, &scale_up, &score_tagger, &mut arrays);

        assert_relative_eq!(arrays.pt[0], 110.0, epsilon = 1e-9);
        assert_relative_eq!(summary.soft_drop_p4.pt(), 110.0, epsilon = 1e-9);
        assert_relative_eq!(summary.soft_drop_p4.mass(), 11.0, epsilon = 1e-6);
    }

    #[test]
    fn test_systematic_codes() {
        assert_eq!(JetSystematic::Nominal.code(), 0);
        assert_eq!(JetSystematic::JerDown.code(), 4);
    }
}

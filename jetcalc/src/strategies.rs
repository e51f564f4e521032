//! Built-in correction and tagging strategies used when no external service is wired in.

use jetcore::data::jet::{BTagCandidate, Subjet, DEEP_CSV_B, DEEP_FLAVOUR_B};
use jetcore::kinematics::lorentz::LorentzVector;
use jetcore::substructure::subjets::{BTagVariant, BTagger, JetCorrector, JetSystematic};

use crate::config::BTagWorkingPoints;

/// Returns subjets unchanged; the inputs are expected to be corrected upstream.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThroughCorrector;

impl JetCorrector for PassThroughCorrector {
    fn correct(&self, subjet: &Subjet, _systematic: JetSystematic) -> Subjet {
        subjet.clone()
    }
}

/// Cut on a discriminant sum, the threshold moved per variant in simulation.
///
/// Scale-factor variations only touch the flavour they belong to: `b` variants
/// shift the cut for jets with hadron flavour 5, light variants for flavours
/// other than 4 and 5.
#[derive(Clone, Copy, Debug)]
pub struct WorkingPointTagger {
    pub working_points: BTagWorkingPoints,
}

impl WorkingPointTagger {
    pub fn new(working_points: BTagWorkingPoints) -> Self {
        WorkingPointTagger { working_points }
    }

    fn threshold(&self, hadron_flavour: i32, is_mc: bool, variant: BTagVariant, is_subjet: bool) -> f64 {
        let nominal = if is_subjet {
            self.working_points.deep_csv_subjet
        } else {
            self.working_points.deep_flavour
        };
        if !is_mc {
            return nominal;
        }

        let shift = self.working_points.variation_shift;
        let flavour = hadron_flavour.abs();
        let is_b = flavour == 5;
        let is_light = flavour != 4 && flavour != 5;

        // a scale factor above one tags more jets, hence a lower cut
        match variant {
            BTagVariant::BSfUp if is_b => nominal - shift,
            BTagVariant::BSfDown if is_b => nominal + shift,
            BTagVariant::LightSfUp if is_light => nominal - shift,
            BTagVariant::LightSfDown if is_light => nominal + shift,
            _ => nominal,
        }
    }
}

impl BTagger for WorkingPointTagger {
    fn is_tagged(
        &self,
        candidate: &BTagCandidate<'_>,
        _reference: &LorentzVector,
        is_mc: bool,
        variant: BTagVariant,
        is_subjet: bool,
    ) -> bool {
        let score = if is_subjet {
            candidate.discriminators.sum(&DEEP_CSV_B)
        } else {
            candidate.discriminators.sum(&DEEP_FLAVOUR_B)
        };
        score > self.threshold(candidate.hadron_flavour, is_mc, variant, is_subjet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jetcore::data::jet::Jet;
    use jetcore::kinematics::lorentz::Kinematics;

    fn jet(score: f64, hadron_flavour: i32) -> Jet {
        let mut jet = Jet::new(Kinematics::from_mass(60.0, 0.0, 0.0, 8.0))
            .with_discriminator(DEEP_FLAVOUR_B[0], score)
            .with_discriminator(DEEP_FLAVOUR_B[1], 0.0)
            .with_discriminator(DEEP_FLAVOUR_B[2], 0.0);
        jet.hadron_flavour = hadron_flavour;
        jet
    }

    #[test]
    fn test_variants_move_matching_flavour() {
        let tagger = WorkingPointTagger::new(BTagWorkingPoints::default());
        let b_jet = jet(0.26, 5);
        let light_jet = jet(0.26, 0);
        let p4 = b_jet.p4();
        let tag = |j: &Jet, is_mc: bool, variant: BTagVariant| tagger.is_tagged(&j.btag_candidate(), &p4, is_mc, variant, false);

        assert!(!tag(&b_jet, true, BTagVariant::Nominal));
        assert!(tag(&b_jet, true, BTagVariant::BSfUp));
        assert!(!tag(&b_jet, true, BTagVariant::LightSfUp));
        assert!(tag(&light_jet, true, BTagVariant::LightSfUp));
        assert!(!tag(&light_jet, true, BTagVariant::BSfUp));
        assert!(!tag(&b_jet, false, BTagVariant::BSfUp));
    }

    #[test]
    fn test_missing_scores_never_tag() {
        let tagger = WorkingPointTagger::new(BTagWorkingPoints::default());
        let bare = Jet::new(Kinematics::from_mass(60.0, 0.0, 0.0, 8.0));
        assert!(!tagger.is_tagged(&bare.btag_candidate(), &bare.p4(), true, BTagVariant::BSfUp, true));
    }
}

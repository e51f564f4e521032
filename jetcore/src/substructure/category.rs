use std::fmt;
use std::fmt::{Display, Formatter};

/// Open soft-drop mass interval in GeV.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassWindow {
    pub low: f64,
    pub high: f64,
}

impl MassWindow {
    pub fn contains(&self, mass: f64) -> bool {
        mass > self.low && mass < self.high
    }
}

pub const TOP_MASS_WINDOW: MassWindow = MassWindow { low: 135.0, high: 210.0 };
pub const HIGGS_MASS_WINDOW: MassWindow = MassWindow { low: 105.0, high: 135.0 };
pub const Z_MASS_WINDOW: MassWindow = MassWindow { low: 85.0, high: 105.0 };
pub const W_MASS_WINDOW: MassWindow = MassWindow { low: 65.0, high: 85.0 };

/// Upper bound on tau3/tau2 for a top candidate.
pub const TOP_TAU32_MAX: f64 = 0.65;
/// Lower bound on the double-b discriminant for a Higgs candidate.
pub const HIGGS_DOUBLE_B_MIN: f64 = 0.6;
/// Upper bound on tau2/tau1 for Z and W candidates.
pub const BOSON_TAU21_MAX: f64 = 0.55;

/// Most probable origin of a large-radius jet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JetCategory {
    BackgroundNoB,
    Top,
    Higgs,
    Z,
    W,
    BackgroundWithB,
    Unclassified,
}

impl JetCategory {
    /// Returns the `JetCategory` corresponding to the stored integer code.
    pub fn new(code: i32) -> JetCategory {
        match code {
            0 => JetCategory::BackgroundNoB,
            1 => JetCategory::Top,
            2 => JetCategory::Higgs,
            3 => JetCategory::Z,
            4 => JetCategory::W,
            5 => JetCategory::BackgroundWithB,
            _ => JetCategory::Unclassified,
        }
    }

    /// Integer code written to the `maxProb` feature.
    pub fn code(&self) -> i32 {
        match self {
            JetCategory::BackgroundNoB => 0,
            JetCategory::Top => 1,
            JetCategory::Higgs => 2,
            JetCategory::Z => 3,
            JetCategory::W => 4,
            JetCategory::BackgroundWithB => 5,
            JetCategory::Unclassified => 10,
        }
    }
}

impl Display for JetCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JetCategory::BackgroundNoB => write!(f, "BackgroundNoB"),
            JetCategory::Top => write!(f, "Top"),
            JetCategory::Higgs => write!(f, "Higgs"),
            JetCategory::Z => write!(f, "Z"),
            JetCategory::W => write!(f, "W"),
            JetCategory::BackgroundWithB => write!(f, "BackgroundWithB"),
            JetCategory::Unclassified => write!(f, "Unclassified"),
        }
    }
}

/// Quantities the category decision looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryInputs {
    /// Corrected, unsmeared soft-drop mass.
    pub soft_drop_mass: f64,
    pub tau1: f64,
    pub tau2: f64,
    pub tau3: f64,
    pub double_b: f64,
    /// Subjets passing the nominal b-tag; `None` when no subjet information exists.
    pub tagged_subjets: Option<i32>,
}

/// Assigns the category; the first matching rule wins.
///
/// 1. top mass window and tau3/tau2 < 0.65
/// 2. Higgs mass window and double-b > 0.6
/// 3. Z mass window and tau2/tau1 < 0.55
/// 4. W mass window and tau2/tau1 < 0.55
/// 5. b-tagged subjet count > 0, == 0, or unknown
pub fn classify(inputs: &CategoryInputs) -> JetCategory {
    let mass = inputs.soft_drop_mass;
    let tau32 = inputs.tau3 / inputs.tau2;
    let tau21 = inputs.tau2 / inputs.tau1;

    if TOP_MASS_WINDOW.contains(mass) && tau32 < TOP_TAU32_MAX {
        JetCategory::Top
    } else if HIGGS_MASS_WINDOW.contains(mass) && inputs.double_b > HIGGS_DOUBLE_B_MIN {
        JetCategory::Higgs
    } else if Z_MASS_WINDOW.contains(mass) && tau21 < BOSON_TAU21_MAX {
        JetCategory::Z
    } else if W_MASS_WINDOW.contains(mass) && tau21 < BOSON_TAU21_MAX {
        JetCategory::W
    } else {
        match inputs.tagged_subjets {
            Some(n) if n > 0 => JetCategory::BackgroundWithB,
            Some(0) => JetCategory::BackgroundNoB,
            _ => JetCategory::Unclassified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(mass: f64, tau21: f64, tau32: f64, double_b: f64, tagged: Option<i32>) -> CategoryInputs {
        // tau1 = 1 so the ratios can be set directly
        CategoryInputs {
            soft_drop_mass: mass,
            tau1: 1.0,
            tau2: tau21,
            tau3: tau32 * tau21,
            double_b,
            tagged_subjets: tagged,
        }
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(classify(&inputs(150.0, 0.8, 0.5, 0.0, Some(0))), JetCategory::Top);
        assert_eq!(classify(&inputs(120.0, 0.8, 0.9, 0.8, Some(0))), JetCategory::Higgs);
        assert_eq!(classify(&inputs(95.0, 0.5, 0.9, 0.0, Some(0))), JetCategory::Z);
        assert_eq!(classify(&inputs(80.0, 0.5, 0.9, 0.0, Some(0))), JetCategory::W);
        assert_eq!(classify(&inputs(200.0, 0.8, 0.9, 0.0, Some(2))), JetCategory::BackgroundWithB);
        assert_eq!(classify(&inputs(200.0, 0.8, 0.9, 0.0, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(200.0, 0.8, 0.9, 0.0, None)), JetCategory::Unclassified);
        assert_eq!(classify(&inputs(200.0, 0.8, 0.9, 0.0, Some(-1))), JetCategory::Unclassified);
    }

    #[test]
    fn test_window_edges_are_excluded() {
        // 135 is neither top nor Higgs
        assert_eq!(classify(&inputs(135.0, 0.1, 0.1, 0.9, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(210.0, 0.1, 0.1, 0.9, Some(1))), JetCategory::BackgroundWithB);
        assert_eq!(classify(&inputs(105.0, 0.1, 0.1, 0.9, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(85.0, 0.1, 0.1, 0.9, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(65.0, 0.1, 0.1, 0.9, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(135.0001, 0.1, 0.1, 0.0, Some(0))), JetCategory::Top);
    }

    #[test]
    fn test_cut_edges_are_excluded() {
        assert_eq!(classify(&inputs(150.0, 1.0, 0.65, 0.0, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(120.0, 0.8, 0.9, 0.6, Some(0))), JetCategory::BackgroundNoB);
        assert_eq!(classify(&inputs(95.0, 0.55, 0.9, 0.0, Some(0))), JetCategory::BackgroundNoB);
    }

    #[test]
    fn test_fallback_only_without_window_match() {
        let masses = [0.0, 64.9, 65.0, 70.0, 85.0, 90.0, 105.0, 120.0, 135.0, 150.0, 210.0, 300.0];
        let ratios = [0.1, 0.55, 0.9];
        let counts = [None, Some(-3), Some(0), Some(3)];
        for &m in &masses {
            for &r21 in &ratios {
                for &r32 in &ratios {
                    for &tagged in &counts {
                        let input = inputs(m, r21, r32, 0.7, tagged);
                        let windows_match = (TOP_MASS_WINDOW.contains(m) && input.tau3 / input.tau2 < TOP_TAU32_MAX)
                            || HIGGS_MASS_WINDOW.contains(m)
                            || ((Z_MASS_WINDOW.contains(m) || W_MASS_WINDOW.contains(m)) && r21 < BOSON_TAU21_MAX);
                        let category = classify(&input);
                        let is_fallback = matches!(
                            category,
                            JetCategory::BackgroundNoB | JetCategory::BackgroundWithB | JetCategory::Unclassified
                        );
                        assert_eq!(is_fallback, !windows_match, "mass {m} tau21 {r21} tau32 {r32}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_undefined_ratios_fall_through() {
        let degenerate = CategoryInputs {
            soft_drop_mass: 150.0,
            tau1: 0.0,
            tau2: 0.0,
            tau3: 0.0,
            double_b: 0.0,
            tagged_subjets: Some(0),
        };
        assert_eq!(classify(&degenerate), JetCategory::BackgroundNoB);
    }

    #[test]
    fn test_codes() {
        assert_eq!(JetCategory::Top.code(), 1);
        assert_eq!(JetCategory::Unclassified.code(), 10);
        assert_eq!(JetCategory::new(42), JetCategory::Unclassified);
        assert_eq!(JetCategory::W.to_string(), "W");
    }
}

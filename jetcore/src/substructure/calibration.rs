use serde::{Deserialize, Serialize};

/// |eta| boundary between the central and forward reco-level corrections.
pub const CENTRAL_ETA_MAX: f64 = 1.3;

/// One-dimensional calibration function of jet pt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationFunction {
    Constant { value: f64 },
    /// `c0 + c1 x + c2 x^2 + ...`
    Polynomial { coefficients: Vec<f64> },
    /// `p0 + p1 (p2 x)^(-p3)`
    PowerLaw { p0: f64, p1: f64, p2: f64, p3: f64 },
}

impl CalibrationFunction {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            CalibrationFunction::Constant { value } => *value,
            CalibrationFunction::Polynomial { coefficients } => {
                // Horner
                coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
            }
            CalibrationFunction::PowerLaw { p0, p1, p2, p3 } => p0 + p1 * (p2 * x).powf(-p3),
        }
    }
}

/// Generator- and reco-level soft-drop mass corrections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftDropMassCalibration {
    pub gen: CalibrationFunction,
    pub reco_central: CalibrationFunction,
    pub reco_forward: CalibrationFunction,
}

impl SoftDropMassCalibration {
    /// Calibration that leaves the mass untouched.
    pub fn identity() -> Self {
        SoftDropMassCalibration {
            gen: CalibrationFunction::Constant { value: 1.0 },
            reco_central: CalibrationFunction::Constant { value: 1.0 },
            reco_forward: CalibrationFunction::Constant { value: 1.0 },
        }
    }

    /// Multiplicative correction `gen(pt) * reco(pt)`, reco split at |eta| 1.3.
    pub fn correction(&self, pt: f64, eta: f64) -> f64 {
        let reco = if eta.abs() <= CENTRAL_ETA_MAX {
            self.reco_central.eval(pt)
        } else {
            self.reco_forward.eval(pt)
        };
        self.gen.eval(pt) * reco
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polynomial() {
        let f = CalibrationFunction::Polynomial { coefficients: vec![1.0, 2.0, 3.0] };
        assert_relative_eq!(f.eval(2.0), 1.0 + 4.0 + 12.0);
        let empty = CalibrationFunction::Polynomial { coefficients: vec![] };
        assert_eq!(empty.eval(5.0), 0.0);
    }

    #[test]
    fn test_power_law() {
        let f = CalibrationFunction::PowerLaw { p0: 1.0, p1: -1.0, p2: 0.1, p3: 1.0 };
        assert_relative_eq!(f.eval(200.0), 1.0 - 1.0 / 20.0);
    }

    #[test]
    fn test_eta_split() {
        let calibration = SoftDropMassCalibration {
            gen: CalibrationFunction::Constant { value: 2.0 },
            reco_central: CalibrationFunction::Constant { value: 3.0 },
            reco_forward: CalibrationFunction::Constant { value: 5.0 },
        };
        assert_eq!(calibration.correction(300.0, 1.3), 6.0);
        assert_eq!(calibration.correction(300.0, -1.31), 10.0);
        assert_eq!(SoftDropMassCalibration::identity().correction(300.0, 2.0), 1.0);
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use jetcore::isolation::cone::MiniIsolationParams;
use jetcore::isolation::constants::EffectiveAreaGeneration;
use jetcore::substructure::calibration::SoftDropMassCalibration;
use jetcore::substructure::subjets::JetSystematic;

use crate::error::{Error, Result};

/// Calibration shipped with the crate, used when no path is configured.
pub const DEFAULT_CALIBRATION: &str = include_str!("../data/puppi_softdrop_corr.json");

/// Mini-isolation cone settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniIsolationConfig {
    pub r_iso_min: f64,
    pub r_iso_max: f64,
    pub kt_scale: f64,
    /// Report only the charged-PV sum for delta-beta and PF-weighted isolation.
    pub charged_only: bool,
}

impl Default for MiniIsolationConfig {
    fn default() -> Self {
        let params = MiniIsolationParams::default();
        MiniIsolationConfig {
            r_iso_min: params.r_iso_min,
            r_iso_max: params.r_iso_max,
            kt_scale: params.kt_scale,
            charged_only: false,
        }
    }
}

impl MiniIsolationConfig {
    pub fn params(&self) -> MiniIsolationParams {
        MiniIsolationParams {
            r_iso_min: self.r_iso_min,
            r_iso_max: self.r_iso_max,
            kt_scale: self.kt_scale,
        }
    }
}

/// Working points of the built-in b-tagger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BTagWorkingPoints {
    /// DeepFlavour threshold for small-radius jets.
    pub deep_flavour: f64,
    /// DeepCSV threshold for soft-drop subjets.
    pub deep_csv_subjet: f64,
    /// Threshold shift emulating a scale-factor variation in simulation.
    pub variation_shift: f64,
}

impl Default for BTagWorkingPoints {
    fn default() -> Self {
        BTagWorkingPoints {
            deep_flavour: 0.2770,
            deep_csv_subjet: 0.4941,
            variation_shift: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConfig {
    #[serde(alias = "isMonteCarlo", alias = "isMc")]
    pub is_mc: bool,
    #[serde(alias = "killHF", alias = "killHighEta")]
    pub kill_high_eta: bool,
    #[serde(alias = "kappa", alias = "jetChargeKappa")]
    pub jet_charge_kappa: f64,
    #[serde(alias = "JECup")]
    pub jec_up: bool,
    #[serde(alias = "JECdown")]
    pub jec_down: bool,
    #[serde(alias = "JERup")]
    pub jer_up: bool,
    #[serde(alias = "JERdown")]
    pub jer_down: bool,
    pub effective_area_generation: EffectiveAreaGeneration,
    /// Soft-drop mass calibration file; the bundled one when unset.
    pub calibration_path: Option<PathBuf>,
    pub mini_isolation: MiniIsolationConfig,
    pub btag: BTagWorkingPoints,
}

impl Default for CalcConfig {
    fn default() -> Self {
        CalcConfig {
            is_mc: true,
            kill_high_eta: false,
            jet_charge_kappa: 0.6,
            jec_up: false,
            jec_down: false,
            jer_up: false,
            jer_down: false,
            effective_area_generation: EffectiveAreaGeneration::default(),
            calibration_path: None,
            mini_isolation: MiniIsolationConfig::default(),
            btag: BTagWorkingPoints::default(),
        }
    }
}

impl CalcConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: CalcConfig = serde_json::from_str(&text)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), is_mc = config.is_mc, "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.systematic()?;

        if !self.jet_charge_kappa.is_finite() {
            return Err(Error::Config(format!("jet charge kappa must be finite, got {}", self.jet_charge_kappa)));
        }

        let iso = &self.mini_isolation;
        if !(iso.r_iso_min > 0.0 && iso.r_iso_min <= iso.r_iso_max) {
            return Err(Error::Config(format!(
                "isolation cone bounds must satisfy 0 < r_iso_min <= r_iso_max, got {} and {}",
                iso.r_iso_min, iso.r_iso_max
            )));
        }
        if !(iso.kt_scale > 0.0) {
            return Err(Error::Config(format!("kt_scale must be positive, got {}", iso.kt_scale)));
        }
        Ok(())
    }

    /// Resolves the four systematic flags; at most one may be set.
    pub fn systematic(&self) -> Result<JetSystematic> {
        let flags = [
            (self.jec_up, JetSystematic::JecUp),
            (self.jec_down, JetSystematic::JecDown),
            (self.jer_up, JetSystematic::JerUp),
            (self.jer_down, JetSystematic::JerDown),
        ];
        let mut active = flags.iter().filter(|(set, _)| *set).map(|(_, systematic)| *systematic);

        match (active.next(), active.next()) {
            (None, _) => Ok(JetSystematic::Nominal),
            (Some(systematic), None) => Ok(systematic),
            (Some(first), Some(second)) => Err(Error::Config(format!(
                "systematic shifts are mutually exclusive, got {:?} and {:?}",
                first, second
            ))),
        }
    }

    /// Loads the soft-drop calibration from `calibration_path` or the bundled default.
    pub fn load_calibration(&self) -> Result<SoftDropMassCalibration> {
        let calibration = match &self.calibration_path {
            Some(path) => {
                info!(path = %path.display(), "reading soft-drop mass calibration");
                serde_json::from_str(&fs::read_to_string(path)?)?
            }
            None => serde_json::from_str(DEFAULT_CALIBRATION)?,
        };
        Ok(calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aliases() {
        let config: CalcConfig = serde_json::from_str(
            r#"{"isMonteCarlo": false, "killHF": true, "kappa": 0.5, "JERdown": true,
                "effective_area_generation": "fall17_v1"}"#,
        )
        .unwrap();

        assert!(!config.is_mc);
        assert!(config.kill_high_eta);
        assert_eq!(config.jet_charge_kappa, 0.5);
        assert_eq!(config.systematic().unwrap(), JetSystematic::JerDown);
        assert_eq!(config.effective_area_generation, EffectiveAreaGeneration::Fall17V1);
        assert_eq!(config.mini_isolation, MiniIsolationConfig::default());
    }

    #[test]
    fn test_exclusive_systematics() {
        let config = CalcConfig { jec_up: true, jer_up: true, ..Default::default() };
        assert!(matches!(config.systematic(), Err(Error::Config(_))));
        assert!(config.validate().is_err());
        assert_eq!(CalcConfig::default().systematic().unwrap(), JetSystematic::Nominal);
    }

    #[test]
    fn test_validation() {
        assert!(CalcConfig::default().validate().is_ok());

        let mut config = CalcConfig::default();
        config.jet_charge_kappa = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = CalcConfig::default();
        config.mini_isolation.r_iso_min = 0.3;
        assert!(config.validate().is_err());

        let mut config = CalcConfig::default();
        config.mini_isolation.kt_scale = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bundled_calibration() {
        let calibration = CalcConfig::default().load_calibration().unwrap();
        // gen correction approaches p0 at high pt, reco polynomials start near their constant term
        let central = calibration.correction(500.0, 0.5);
        let forward = calibration.correction(500.0, 2.0);
        assert!(central > 0.9 && central < 1.2, "central {central}");
        assert!(forward > 0.9 && forward < 1.3, "forward {forward}");
        assert_relative_eq!(calibration.reco_central.eval(0.0), 1.09302);
    }

    #[test]
    fn test_missing_calibration_file() {
        let config = CalcConfig {
            calibration_path: Some(PathBuf::from("/nonexistent/puppi_softdrop_corr.json")),
            ..Default::default()
        };
        assert!(matches!(config.load_calibration(), Err(Error::Io(_))));
    }
}

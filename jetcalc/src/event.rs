use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use jetcore::data::jet::Jet;
use jetcore::data::lepton::CandidateLepton;
use jetcore::data::particle::Particle;

use crate::error::Result;

/// Reconstructed content of one collision event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Small-radius jets, in upstream order.
    #[serde(default)]
    pub jets: Vec<Jet>,
    /// Large-radius jets, in upstream order.
    #[serde(default)]
    pub ak8_jets: Vec<Jet>,
    #[serde(default)]
    pub leptons: Vec<CandidateLepton>,
    /// Particle-flow candidates used for isolation.
    #[serde(default)]
    pub particles: Vec<Particle>,
    /// Median pileup energy density.
    #[serde(default)]
    pub rho: f64,
}

/// Reads a JSON array of events.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        let events: Vec<Event> = serde_json::from_str(
            r#"[{
                "jets": [{"kinematics": {"pt": 50.0, "eta": 0.1, "phi": 0.2, "energy": 52.0}}],
                "leptons": [{"kinematics": {"pt": 30.0, "eta": 1.6, "phi": 0.0, "energy": 80.0},
                             "flavor": {"kind": "electron", "supercluster_eta": 1.55}}],
                "rho": 21.5
            }, {}]"#,
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].jets[0].subjets, None);
        assert!(events[0].leptons[0].flavor.is_electron());
        assert_eq!(events[0].rho, 21.5);
        assert_eq!(events[1], Event::default());
    }
}

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A single named output: scalar or array, integer or floating point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl FeatureValue {
    /// Number of entries for arrays, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            FeatureValue::IntArray(values) => Some(values.len()),
            FeatureValue::FloatArray(values) => Some(values.len()),
            FeatureValue::Int(_) | FeatureValue::Float(_) => None,
        }
    }
}

/// Per-event named features, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVectorSet {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureVectorSet {
    pub fn new() -> Self {
        FeatureVectorSet { values: BTreeMap::new() }
    }

    pub fn set_int(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_string(), FeatureValue::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), FeatureValue::Float(value));
    }

    pub fn set_ints(&mut self, name: &str, values: Vec<i64>) {
        self.values.insert(name.to_string(), FeatureValue::IntArray(values));
    }

    pub fn set_floats(&mut self, name: &str, values: Vec<f64>) {
        self.values.insert(name.to_string(), FeatureValue::FloatArray(values));
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(FeatureValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(FeatureValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn ints(&self, name: &str) -> Option<&[i64]> {
        match self.values.get(name) {
            Some(FeatureValue::IntArray(values)) => Some(values),
            _ => None,
        }
    }

    pub fn floats(&self, name: &str) -> Option<&[f64]> {
        match self.values.get(name) {
            Some(FeatureValue::FloatArray(values)) => Some(values),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// True when every listed array that is present has the same length.
    pub fn is_aligned(&self, names: &[&str]) -> bool {
        names
            .iter()
            .filter_map(|name| self.values.get(*name).and_then(FeatureValue::array_len))
            .all_equal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let mut features = FeatureVectorSet::new();
        features.set_floats("theJetAK8Pt", vec![400.0, 300.0]);
        features.set_ints("theJetAK8SDSubjetSize", vec![2, 0]);
        features.set_floats("theJetAK8SDSubjetPt", vec![250.0, 150.0]);
        features.set_float("theJetHT", 700.0);

        assert!(features.is_aligned(&["theJetAK8Pt", "theJetAK8SDSubjetSize", "theJetHT", "absent"]));

        features.set_ints("maxProb", vec![1]);
        assert!(!features.is_aligned(&["theJetAK8Pt", "maxProb"]));
    }

    #[test]
    fn test_json_shape() {
        let mut features = FeatureVectorSet::new();
        features.set_int("n", 3);
        features.set_floats("x", vec![1.5]);

        let json = serde_json::to_string(&features).unwrap();
        assert_eq!(json, r#"{"n":3,"x":[1.5]}"#);

        let back: FeatureVectorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.int("n"), Some(3));
        assert_eq!(back.floats("x"), Some(&[1.5][..]));
    }
}

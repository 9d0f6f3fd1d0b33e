//! Plain mapping form of the record exchanged with the review collaborator.
//!
//! The mapping is a `serde_json::Value` tree: objects for records, arrays for
//! repeated groups, strings for every leaf. The review layer edits leaves in
//! its own copy and hands the mapping back for serialization.

use serde_json::Value;

use crate::error::Result;
use crate::record::ClinicalTrialRecord;

impl ClinicalTrialRecord {
    /// Convert into the nested mapping form.
    pub fn to_mapping(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Build a record from a mapping. Missing keys take their defaults; keys
    /// with a mismatched type fail with [`crate::RecordError::Shape`].
    pub fn from_mapping(mapping: Value) -> Result<Self> {
        Ok(serde_json::from_value(mapping)?)
    }

    /// Parse the mapping form from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON of the mapping form.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

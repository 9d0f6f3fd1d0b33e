//! The canonical clinical trial record.
//!
//! Every scalar is a plain `String` that defaults to empty and every repeated
//! group defaults to an empty `Vec`, so consumers never branch on missing keys.
//! Serde names follow the review form's keys (see [`crate::mapping`]).

use serde::{Deserialize, Serialize};

use crate::design::StudyDesign;

/// All structured fields extracted from one protocol document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalTrialRecord {
    pub brief_title: String,
    pub official_title: String,
    pub acronym: String,
    pub org_study_id: String,
    pub enrollment: String,
    pub enrollment_type: String,
    pub overall_status: String,
    pub start_date: String,
    #[serde(alias = "primary_compl_date")]
    pub primary_completion_date: String,
    pub brief_summary: String,
    pub detailed_description: String,
    pub study_design: StudyDesign,
    pub eligibility: Eligibility,
    pub primary_outcomes: Vec<Outcome>,
    pub secondary_outcomes: Vec<Outcome>,
    pub arm_groups: Vec<ArmGroup>,
    pub interventions: Vec<Intervention>,
    pub sponsors: Sponsors,
    pub conditions: Vec<String>,
    pub keywords: Vec<String>,
}

impl ClinicalTrialRecord {
    /// True when nothing was extracted (every field at its default).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Scalar fields in schema order, paired with their mapping key.
    pub fn scalars(&self) -> [(&'static str, &str); 11] {
        [
            ("brief_title", &self.brief_title),
            ("official_title", &self.official_title),
            ("acronym", &self.acronym),
            ("org_study_id", &self.org_study_id),
            ("enrollment", &self.enrollment),
            ("enrollment_type", &self.enrollment_type),
            ("overall_status", &self.overall_status),
            ("start_date", &self.start_date),
            ("primary_completion_date", &self.primary_completion_date),
            ("brief_summary", &self.brief_summary),
            ("detailed_description", &self.detailed_description),
        ]
    }

    /// Mutable access to the scalar fields, in the same order as [`Self::scalars`].
    pub fn scalars_mut(&mut self) -> [&mut String; 11] {
        [
            &mut self.brief_title,
            &mut self.official_title,
            &mut self.acronym,
            &mut self.org_study_id,
            &mut self.enrollment,
            &mut self.enrollment_type,
            &mut self.overall_status,
            &mut self.start_date,
            &mut self.primary_completion_date,
            &mut self.brief_summary,
            &mut self.detailed_description,
        ]
    }
}

/// Participant eligibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eligibility {
    pub criteria: String,
    pub gender: String,
    pub minimum_age: String,
    pub maximum_age: String,
    pub healthy_volunteers: String,
}

impl Eligibility {
    pub fn fields_mut(&mut self) -> [&mut String; 5] {
        [
            &mut self.criteria,
            &mut self.gender,
            &mut self.minimum_age,
            &mut self.maximum_age,
            &mut self.healthy_volunteers,
        ]
    }

    pub fn fields(&self) -> [&str; 5] {
        [
            &self.criteria,
            &self.gender,
            &self.minimum_age,
            &self.maximum_age,
            &self.healthy_volunteers,
        ]
    }
}

/// A primary or secondary outcome measure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Outcome {
    #[serde(rename = "outcome_measure")]
    pub measure: String,
    #[serde(rename = "outcome_time_frame")]
    pub time_frame: String,
    #[serde(rename = "outcome_description")]
    pub description: String,
}

/// One study arm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmGroup {
    #[serde(rename = "arm_group_label")]
    pub label: String,
    pub arm_type: String,
    #[serde(rename = "arm_group_description")]
    pub description: String,
}

/// A drug, device, procedure or other intervention under study.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intervention {
    #[serde(rename = "intervention_name")]
    pub name: String,
    pub intervention_type: String,
    #[serde(rename = "intervention_description")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sponsors {
    pub lead_sponsor: String,
    pub collaborators: Vec<String>,
}

/// Repeated groups are de-duplicated on one identifying subfield.
pub trait GroupKey {
    fn group_key(&self) -> &str;
}

impl GroupKey for Outcome {
    fn group_key(&self) -> &str {
        &self.measure
    }
}

impl GroupKey for ArmGroup {
    fn group_key(&self) -> &str {
        &self.label
    }
}

impl GroupKey for Intervention {
    fn group_key(&self) -> &str {
        &self.name
    }
}

impl GroupKey for String {
    fn group_key(&self) -> &str {
        self
    }
}

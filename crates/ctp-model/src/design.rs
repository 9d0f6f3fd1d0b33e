//! Study design: a variant tagged by study type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discriminator for [`StudyDesign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StudyType {
    Interventional,
    Observational,
    #[default]
    Unknown,
}

impl StudyType {
    /// Label written to the `study_type` key and XML element.
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::Interventional => "Interventional",
            StudyType::Observational => "Observational",
            StudyType::Unknown => "",
        }
    }

    /// Lenient parse of free text such as "Interventional (Clinical Trial)".
    ///
    /// Anything that names neither type is `Unknown`.
    pub fn detect(text: &str) -> Self {
        let lowered = text.trim().to_lowercase();
        let interventional = lowered.contains("interventional");
        let observational = lowered.contains("observational");
        match (interventional, observational) {
            (true, false) => StudyType::Interventional,
            (false, true) => StudyType::Observational,
            _ => StudyType::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StudyType::Unknown)
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StudyType {
    type Err = String;

    /// Strict parse of the canonical labels (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interventional" => Ok(StudyType::Interventional),
            "observational" => Ok(StudyType::Observational),
            "" => Ok(StudyType::Unknown),
            other => Err(format!("unknown study type: {other}")),
        }
    }
}

/// Design of the study. At most one sub-design exists, and only the one
/// matching the study type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "study_type")]
pub enum StudyDesign {
    #[default]
    #[serde(rename = "")]
    Unknown,
    Interventional {
        #[serde(default)]
        interventional_design: InterventionalDesign,
    },
    Observational {
        #[serde(default)]
        observational_design: ObservationalDesign,
    },
}

impl StudyDesign {
    pub fn study_type(&self) -> StudyType {
        match self {
            StudyDesign::Unknown => StudyType::Unknown,
            StudyDesign::Interventional { .. } => StudyType::Interventional,
            StudyDesign::Observational { .. } => StudyType::Observational,
        }
    }

    pub fn interventional(design: InterventionalDesign) -> Self {
        StudyDesign::Interventional {
            interventional_design: design,
        }
    }

    pub fn observational(design: ObservationalDesign) -> Self {
        StudyDesign::Observational {
            observational_design: design,
        }
    }
}

/// Sub-design for interventional studies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionalDesign {
    /// Primary purpose (treatment, prevention, ...).
    #[serde(rename = "interventional_subtype")]
    pub subtype: String,
    pub phase: String,
    pub assignment: String,
    pub allocation: String,
}

impl InterventionalDesign {
    pub fn fields(&self) -> [&str; 4] {
        [&self.subtype, &self.phase, &self.assignment, &self.allocation]
    }

    pub fn fields_mut(&mut self) -> [&mut String; 4] {
        [
            &mut self.subtype,
            &mut self.phase,
            &mut self.assignment,
            &mut self.allocation,
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|value| value.trim().is_empty())
    }
}

/// Sub-design for observational studies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationalDesign {
    #[serde(rename = "observational_study_design")]
    pub study_design: String,
    pub timing: String,
    pub biospecimen_retention: String,
    pub number_of_groups: String,
}

impl ObservationalDesign {
    pub fn fields(&self) -> [&str; 4] {
        [
            &self.study_design,
            &self.timing,
            &self.biospecimen_retention,
            &self.number_of_groups,
        ]
    }

    pub fn fields_mut(&mut self) -> [&mut String; 4] {
        [
            &mut self.study_design,
            &mut self.timing,
            &mut self.biospecimen_retention,
            &mut self.number_of_groups,
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|value| value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_handles_decorated_labels() {
        assert_eq!(
            StudyType::detect("Interventional (Clinical Trial)"),
            StudyType::Interventional
        );
        assert_eq!(
            StudyType::detect("  observational cohort "),
            StudyType::Observational
        );
        assert_eq!(StudyType::detect("Expanded Access"), StudyType::Unknown);
        assert_eq!(StudyType::detect(""), StudyType::Unknown);
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!(
            "INTERVENTIONAL".parse::<StudyType>(),
            Ok(StudyType::Interventional)
        );
        assert_eq!("".parse::<StudyType>(), Ok(StudyType::Unknown));
        assert!("Interventional study".parse::<StudyType>().is_err());
    }

    #[test]
    fn design_reports_its_type() {
        let design = StudyDesign::observational(ObservationalDesign {
            timing: "Prospective".to_string(),
            ..Default::default()
        });
        assert_eq!(design.study_type(), StudyType::Observational);
        assert_eq!(StudyDesign::default().study_type(), StudyType::Unknown);
    }

    #[test]
    fn sub_design_emptiness_ignores_whitespace() {
        let mut design = InterventionalDesign::default();
        assert!(design.is_empty());
        design.phase = "   ".to_string();
        assert!(design.is_empty());
        design.phase = "Phase 2".to_string();
        assert!(!design.is_empty());
    }
}

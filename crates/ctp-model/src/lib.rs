//! Data model for extracted clinical trial protocols.
//!
//! [`ClinicalTrialRecord`] is the single canonical value produced per document.
//! It is built fresh by the field extractor, optionally edited through its
//! mapping form, and consumed by the XML serializer.

pub mod design;
pub mod error;
pub mod fields;
pub mod mapping;
pub mod record;

pub use design::{InterventionalDesign, ObservationalDesign, StudyDesign, StudyType};
pub use error::{RecordError, Result};
pub use fields::{FIELD_CATALOG, FieldKind, FieldSpec};
pub use record::{
    ArmGroup, ClinicalTrialRecord, Eligibility, GroupKey, Intervention, Outcome, Sponsors,
};

//! XML output for clinical trial records.
//!
//! The serializer is total over [`ClinicalTrialRecord`](ctp_model::ClinicalTrialRecord):
//! any record, including the all-default one, renders to a well-formed
//! document with every element present.

pub mod error;
pub mod xml;

pub use error::{Result, SerializationError};
pub use xml::{ROOT_ELEMENT, SCHEMA_VERSION, to_xml, to_xml_from_mapping, write_xml, write_xml_file};

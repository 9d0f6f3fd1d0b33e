//! Record to XML rendering.
//!
//! Every element is always written, in a fixed order, so the document shape
//! never depends on what was extracted. Empty values and empty containers
//! become empty elements. Text is escaped so it parses back unchanged,
//! carriage returns included.

use std::fs;
use std::io::Write;
use std::path::Path;

use ctp_model::{
    ArmGroup, ClinicalTrialRecord, Eligibility, Intervention, Outcome, Sponsors, StudyDesign,
};
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SerializationError};

/// Root element name.
pub const ROOT_ELEMENT: &str = "clinical_study";

/// Value of the root `schema_version` attribute.
pub const SCHEMA_VERSION: &str = "1.0";

/// Render a record as an XML document.
///
/// Rendering the same record twice yields identical strings.
pub fn to_xml(record: &ClinicalTrialRecord) -> Result<String> {
    let mut buffer = Vec::new();
    write_xml(record, &mut buffer)?;
    buffer.push(b'\n');
    Ok(String::from_utf8(buffer)?)
}

/// Validate a mapping through the record type, then render it.
///
/// # Errors
///
/// Returns [`SerializationError::Record`] when the mapping does not have the
/// record's shape.
pub fn to_xml_from_mapping(mapping: &Value) -> Result<String> {
    let record = ClinicalTrialRecord::from_mapping(mapping.clone())?;
    to_xml(&record)
}

/// Write the XML document to `path`, creating parent directories.
pub fn write_xml_file(record: &ClinicalTrialRecord, path: &Path) -> Result<()> {
    let xml = to_xml(record)?;
    let file_error = |source: std::io::Error| SerializationError::File {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(file_error)?;
    }
    fs::write(path, xml).map_err(file_error)?;
    debug!(path = %path.display(), "wrote XML");
    Ok(())
}

/// Stream the XML document (without a trailing newline) into `writer`.
pub fn write_xml<W: Write>(record: &ClinicalTrialRecord, writer: W) -> Result<()> {
    let mut xml = RecordWriter {
        xml: Writer::new_with_indent(writer, b' ', 2),
    };
    xml.document(record)
}

struct RecordWriter<W: Write> {
    xml: Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    fn document(&mut self, record: &ClinicalTrialRecord) -> Result<()> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new(ROOT_ELEMENT);
        root.push_attribute(("schema_version", SCHEMA_VERSION));
        self.xml.write_event(Event::Start(root))?;

        self.text("brief_title", &record.brief_title)?;
        self.text("official_title", &record.official_title)?;
        self.text("acronym", &record.acronym)?;
        self.text("org_study_id", &record.org_study_id)?;
        self.sponsors(&record.sponsors)?;
        self.text("brief_summary", &record.brief_summary)?;
        self.text("detailed_description", &record.detailed_description)?;
        self.text("overall_status", &record.overall_status)?;
        self.text("start_date", &record.start_date)?;
        self.text("primary_completion_date", &record.primary_completion_date)?;
        self.text("enrollment", &record.enrollment)?;
        self.text("enrollment_type", &record.enrollment_type)?;
        self.study_design(&record.study_design)?;
        self.list("conditions", "condition", &record.conditions)?;
        self.list("keywords", "keyword", &record.keywords)?;
        self.group("arm_groups", &record.arm_groups, Self::arm_group)?;
        self.group("interventions", &record.interventions, Self::intervention)?;
        self.group("primary_outcomes", &record.primary_outcomes, |w, o| {
            w.outcome("primary_outcome", o)
        })?;
        self.group("secondary_outcomes", &record.secondary_outcomes, |w, o| {
            w.outcome("secondary_outcome", o)
        })?;
        self.eligibility(&record.eligibility)?;

        self.end(ROOT_ELEMENT)
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::Empty(BytesStart::new(name)))?;
        Ok(())
    }

    fn text(&mut self, name: &str, value: &str) -> Result<()> {
        let cleaned = xml_safe(value);
        if cleaned.is_empty() {
            return self.empty(name);
        }
        // Parsers fold a literal CR into LF, so carriage returns go out as a
        // character reference.
        let escaped = escape(cleaned.as_str()).replace('\r', "&#13;");
        self.start(name)?;
        self.xml.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
        self.end(name)
    }

    fn list(&mut self, container: &str, item: &str, values: &[String]) -> Result<()> {
        self.group(container, values, |w, value| w.text(item, value))
    }

    fn group<T>(
        &mut self,
        container: &str,
        entries: &[T],
        mut write_entry: impl FnMut(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        if entries.is_empty() {
            return self.empty(container);
        }
        self.start(container)?;
        for entry in entries {
            write_entry(self, entry)?;
        }
        self.end(container)
    }

    fn sponsors(&mut self, sponsors: &Sponsors) -> Result<()> {
        self.start("sponsors")?;
        self.text("lead_sponsor", &sponsors.lead_sponsor)?;
        self.list("collaborators", "collaborator", &sponsors.collaborators)?;
        self.end("sponsors")
    }

    fn study_design(&mut self, design: &StudyDesign) -> Result<()> {
        self.start("study_design")?;
        self.text("study_type", design.study_type().as_str())?;
        match design {
            StudyDesign::Unknown => {}
            StudyDesign::Interventional {
                interventional_design,
            } => {
                self.start("interventional_design")?;
                self.text("interventional_subtype", &interventional_design.subtype)?;
                self.text("phase", &interventional_design.phase)?;
                self.text("assignment", &interventional_design.assignment)?;
                self.text("allocation", &interventional_design.allocation)?;
                self.end("interventional_design")?;
            }
            StudyDesign::Observational {
                observational_design,
            } => {
                self.start("observational_design")?;
                self.text(
                    "observational_study_design",
                    &observational_design.study_design,
                )?;
                self.text("timing", &observational_design.timing)?;
                self.text(
                    "biospecimen_retention",
                    &observational_design.biospecimen_retention,
                )?;
                self.text("number_of_groups", &observational_design.number_of_groups)?;
                self.end("observational_design")?;
            }
        }
        self.end("study_design")
    }

    fn arm_group(&mut self, arm: &ArmGroup) -> Result<()> {
        self.start("arm_group")?;
        self.text("arm_group_label", &arm.label)?;
        self.text("arm_group_type", &arm.arm_type)?;
        self.text("description", &arm.description)?;
        self.end("arm_group")
    }

    fn intervention(&mut self, intervention: &Intervention) -> Result<()> {
        self.start("intervention")?;
        self.text("intervention_name", &intervention.name)?;
        self.text("intervention_type", &intervention.intervention_type)?;
        self.text("description", &intervention.description)?;
        self.end("intervention")
    }

    fn outcome(&mut self, name: &str, outcome: &Outcome) -> Result<()> {
        self.start(name)?;
        self.text("measure", &outcome.measure)?;
        self.text("time_frame", &outcome.time_frame)?;
        self.text("description", &outcome.description)?;
        self.end(name)
    }

    fn eligibility(&mut self, eligibility: &Eligibility) -> Result<()> {
        self.start("eligibility")?;
        self.text("criteria", &eligibility.criteria)?;
        self.text("gender", &eligibility.gender)?;
        self.text("minimum_age", &eligibility.minimum_age)?;
        self.text("maximum_age", &eligibility.maximum_age)?;
        self.text("healthy_volunteers", &eligibility.healthy_volunteers)?;
        self.end("eligibility")
    }
}

/// Drop characters XML 1.0 cannot represent.
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}

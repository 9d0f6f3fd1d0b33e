use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use ctp_extract::ChunkWarning;
use ctp_model::{ClinicalTrialRecord, FIELD_CATALOG, StudyDesign};

use crate::types::ExtractResult;

const INTERVENTIONAL_KEYS: [&str; 4] = [
    "study_design.interventional_design.interventional_subtype",
    "study_design.interventional_design.phase",
    "study_design.interventional_design.assignment",
    "study_design.interventional_design.allocation",
];

const OBSERVATIONAL_KEYS: [&str; 4] = [
    "study_design.observational_design.observational_study_design",
    "study_design.observational_design.timing",
    "study_design.observational_design.biospecimen_retention",
    "study_design.observational_design.number_of_groups",
];

const ELIGIBILITY_KEYS: [&str; 5] = [
    "eligibility.criteria",
    "eligibility.gender",
    "eligibility.minimum_age",
    "eligibility.maximum_age",
    "eligibility.healthy_volunteers",
];

/// Longest value shown in the field table before eliding.
const MAX_VALUE_CHARS: usize = 80;

pub fn print_summary(result: &ExtractResult) {
    println!("Document: {}", result.source);
    println!("Backend: {}", result.backend);
    println!("XML: {}", result.xml_path.display());
    if let Some(path) = &result.record_path {
        println!("Record: {}", path.display());
    }

    let stats = &result.document.stats;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Pages"),
        header_cell("With text"),
        header_cell("Characters"),
        header_cell("Chunks"),
        header_cell("Failed"),
        header_cell("Duration"),
    ]);
    apply_table_style(&mut table);
    for index in 0..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(stats.page_count),
        Cell::new(stats.pages_with_text),
        Cell::new(stats.char_count),
        Cell::new(stats.chunk_count),
        count_cell(stats.failed_chunks, Color::Yellow),
        Cell::new(format!("{} ms", stats.duration_ms)),
    ]);
    println!("{table}");

    print_field_table(&result.document.record);
    print_warning_table(&result.document.warnings);
}

fn print_field_table(record: &ClinicalTrialRecord) {
    let rows = populated_fields(record);
    if rows.is_empty() {
        println!();
        println!("No fields were extracted.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_detail_table_style(&mut table);
    for (key, value) in rows {
        table.add_row(vec![
            Cell::new(key).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(elide(&value, MAX_VALUE_CHARS)),
        ]);
    }
    println!();
    println!("Fields:");
    println!("{table}");
}

fn print_warning_table(warnings: &[ChunkWarning]) {
    if warnings.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chunk"),
        header_cell("Kind"),
        header_cell("Message"),
    ]);
    apply_detail_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Center);
    for warning in warnings {
        table.add_row(vec![
            Cell::new(warning.chunk_index),
            Cell::new(warning.failure.kind()).fg(Color::Yellow),
            Cell::new(warning.failure.to_string()),
        ]);
    }
    println!();
    println!("Warnings:");
    println!("{table}");
}

/// `ctp fields` output.
pub fn print_field_catalog() {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Mapping key"),
        header_cell("XML path"),
        header_cell("Kind"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for field in FIELD_CATALOG {
        table.add_row(vec![
            Cell::new(field.mapping_key),
            Cell::new(field.xml_path),
            dim_cell(field.kind.label()),
        ]);
    }
    println!("{table}");
}

/// Non-empty values in document order, sequences summarized on one line.
fn populated_fields(record: &ClinicalTrialRecord) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    let mut push = |key: &'static str, value: &str| {
        if !value.trim().is_empty() {
            rows.push((key, value.to_string()));
        }
    };

    for (key, value) in record.scalars() {
        push(key, value);
    }
    push("sponsors.lead_sponsor", &record.sponsors.lead_sponsor);
    push(
        "sponsors.collaborators",
        &record.sponsors.collaborators.join("; "),
    );
    push(
        "study_design.study_type",
        record.study_design.study_type().as_str(),
    );
    match &record.study_design {
        StudyDesign::Unknown => {}
        StudyDesign::Interventional {
            interventional_design,
        } => {
            for (key, value) in INTERVENTIONAL_KEYS
                .into_iter()
                .zip(interventional_design.fields())
            {
                push(key, value);
            }
        }
        StudyDesign::Observational {
            observational_design,
        } => {
            for (key, value) in OBSERVATIONAL_KEYS
                .into_iter()
                .zip(observational_design.fields())
            {
                push(key, value);
            }
        }
    }
    for (key, value) in ELIGIBILITY_KEYS.into_iter().zip(record.eligibility.fields()) {
        push(key, value);
    }
    push("conditions", &record.conditions.join("; "));
    push("keywords", &record.keywords.join("; "));

    let labels = |names: Vec<&str>| format!("{} ({})", names.len(), names.join("; "));
    if !record.arm_groups.is_empty() {
        let names = record.arm_groups.iter().map(|a| a.label.as_str()).collect();
        push("arm_groups", &labels(names));
    }
    if !record.interventions.is_empty() {
        let names = record.interventions.iter().map(|i| i.name.as_str()).collect();
        push("interventions", &labels(names));
    }
    if !record.primary_outcomes.is_empty() {
        let names = record.primary_outcomes.iter().map(|o| o.measure.as_str()).collect();
        push("primary_outcomes", &labels(names));
    }
    if !record.secondary_outcomes.is_empty() {
        let names = record
            .secondary_outcomes
            .iter()
            .map(|o| o.measure.as_str())
            .collect();
        push("secondary_outcomes", &labels(names));
    }
    rows
}

/// First line of `value`, cut to `max` chars.
fn elide(value: &str, max: usize) -> String {
    let first_line = value.lines().next().unwrap_or_default();
    let multi_line = value.trim_end().contains('\n');
    if first_line.chars().count() <= max && !multi_line {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_detail_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() == 2 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
            ColumnConstraint::LowerBoundary(Width::Percentage(50)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctp_model::{ArmGroup, InterventionalDesign};

    #[test]
    fn default_record_has_no_rows() {
        assert!(populated_fields(&ClinicalTrialRecord::default()).is_empty());
    }

    #[test]
    fn rows_follow_document_order() {
        let record = ClinicalTrialRecord {
            brief_title: "Trial A".to_string(),
            study_design: StudyDesign::interventional(InterventionalDesign {
                phase: "Phase 2".to_string(),
                ..Default::default()
            }),
            conditions: vec!["Asthma".to_string(), "COPD".to_string()],
            arm_groups: vec![
                ArmGroup {
                    label: "Aspirin".to_string(),
                    ..Default::default()
                },
                ArmGroup {
                    label: "Placebo".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let rows = populated_fields(&record);
        assert_eq!(
            rows,
            [
                ("brief_title", "Trial A".to_string()),
                ("study_design.study_type", "Interventional".to_string()),
                (
                    "study_design.interventional_design.phase",
                    "Phase 2".to_string()
                ),
                ("conditions", "Asthma; COPD".to_string()),
                ("arm_groups", "2 (Aspirin; Placebo)".to_string()),
            ]
        );
    }

    #[test]
    fn elide_keeps_short_values() {
        assert_eq!(elide("Trial A", 10), "Trial A");
        assert_eq!(elide("abcdefghijkl", 6), "abcde…");
        assert_eq!(elide("line one\nline two", 40), "line one…");
    }
}

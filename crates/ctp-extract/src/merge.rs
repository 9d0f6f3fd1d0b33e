//! Merging partial per-chunk records into one canonical record.
//!
//! Partials are absorbed in chunk order and the first non-blank value of a
//! scalar wins. Repeated groups are concatenated with case-insensitive
//! de-duplication on their identifying subfield. The first recognized study
//! type fixes the design variant; later sub-designs of the same variant only
//! fill blanks. All values are trimmed.

use ctp_model::{
    ArmGroup, ClinicalTrialRecord, GroupKey, Intervention, InterventionalDesign,
    ObservationalDesign, Outcome, StudyDesign,
};
use tracing::debug;

/// Merge partials in the order given.
///
/// Merging an empty sequence yields the default record; merging a single
/// partial yields that partial with its values trimmed.
pub fn merge_records<I>(partials: I) -> ClinicalTrialRecord
where
    I: IntoIterator<Item = ClinicalTrialRecord>,
{
    let mut merger = RecordMerger::default();
    for partial in partials {
        merger.absorb(partial);
    }
    merger.finish()
}

/// Incremental form of [`merge_records`].
#[derive(Debug, Default)]
pub struct RecordMerger {
    record: ClinicalTrialRecord,
    absorbed: usize,
}

impl RecordMerger {
    pub fn absorb(&mut self, partial: ClinicalTrialRecord) {
        let merged = &mut self.record;
        for (slot, (key, candidate)) in merged.scalars_mut().into_iter().zip(partial.scalars()) {
            let candidate = candidate.trim();
            if !fill(slot, candidate) && !candidate.is_empty() && slot.as_str() != candidate {
                debug!(field = key, partial = self.absorbed, "kept earlier value");
            }
        }

        merge_design(&mut merged.study_design, partial.study_design);

        for (slot, candidate) in merged
            .eligibility
            .fields_mut()
            .into_iter()
            .zip(partial.eligibility.fields())
        {
            fill(slot, candidate);
        }

        fill(
            &mut merged.sponsors.lead_sponsor,
            &partial.sponsors.lead_sponsor,
        );
        append_unique(
            &mut merged.sponsors.collaborators,
            partial.sponsors.collaborators,
        );
        append_unique(&mut merged.primary_outcomes, partial.primary_outcomes);
        append_unique(&mut merged.secondary_outcomes, partial.secondary_outcomes);
        append_unique(&mut merged.arm_groups, partial.arm_groups);
        append_unique(&mut merged.interventions, partial.interventions);
        append_unique(&mut merged.conditions, partial.conditions);
        append_unique(&mut merged.keywords, partial.keywords);

        self.absorbed += 1;
    }

    /// Number of partials absorbed so far.
    pub fn absorbed(&self) -> usize {
        self.absorbed
    }

    pub fn finish(self) -> ClinicalTrialRecord {
        self.record
    }
}

/// Set an empty slot to the trimmed candidate. Returns whether it was set.
fn fill(slot: &mut String, candidate: &str) -> bool {
    let candidate = candidate.trim();
    if slot.is_empty() && !candidate.is_empty() {
        *slot = candidate.to_string();
        true
    } else {
        false
    }
}

fn merge_design(target: &mut StudyDesign, incoming: StudyDesign) {
    if matches!(target, StudyDesign::Unknown) {
        if incoming.study_type().is_known() {
            *target = trim_design(incoming);
        }
        return;
    }

    match (target, incoming) {
        (
            StudyDesign::Interventional {
                interventional_design: merged,
            },
            StudyDesign::Interventional {
                interventional_design: partial,
            },
        ) => fill_all(merged.fields_mut(), partial.fields()),
        (
            StudyDesign::Observational {
                observational_design: merged,
            },
            StudyDesign::Observational {
                observational_design: partial,
            },
        ) => fill_all(merged.fields_mut(), partial.fields()),
        (_, StudyDesign::Unknown) => {}
        (merged, partial) => debug!(
            kept = %merged.study_type(),
            ignored = %partial.study_type(),
            "conflicting study type ignored"
        ),
    }
}

fn fill_all<const N: usize>(slots: [&mut String; N], candidates: [&str; N]) {
    for (slot, candidate) in slots.into_iter().zip(candidates) {
        fill(slot, candidate);
    }
}

fn trim_design(design: StudyDesign) -> StudyDesign {
    match design {
        StudyDesign::Unknown => StudyDesign::Unknown,
        StudyDesign::Interventional {
            interventional_design: partial,
        } => {
            let mut design = InterventionalDesign::default();
            fill_all(design.fields_mut(), partial.fields());
            StudyDesign::interventional(design)
        }
        StudyDesign::Observational {
            observational_design: partial,
        } => {
            let mut design = ObservationalDesign::default();
            fill_all(design.fields_mut(), partial.fields());
            StudyDesign::observational(design)
        }
    }
}

/// Append entries whose key is neither blank nor already present.
fn append_unique<T: GroupKey + Trimmed>(merged: &mut Vec<T>, partial: Vec<T>) {
    for entry in partial {
        let entry = entry.trimmed();
        let key = entry.group_key();
        if key.is_empty() {
            continue;
        }
        let key = key.to_lowercase();
        if merged
            .iter()
            .any(|existing| existing.group_key().to_lowercase() == key)
        {
            continue;
        }
        merged.push(entry);
    }
}

trait Trimmed {
    fn trimmed(self) -> Self;
}

fn trim_owned(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

impl Trimmed for String {
    fn trimmed(self) -> Self {
        trim_owned(self)
    }
}

impl Trimmed for Outcome {
    fn trimmed(self) -> Self {
        Outcome {
            measure: trim_owned(self.measure),
            time_frame: trim_owned(self.time_frame),
            description: trim_owned(self.description),
        }
    }
}

impl Trimmed for ArmGroup {
    fn trimmed(self) -> Self {
        ArmGroup {
            label: trim_owned(self.label),
            arm_type: trim_owned(self.arm_type),
            description: trim_owned(self.description),
        }
    }
}

impl Trimmed for Intervention {
    fn trimmed(self) -> Self {
        Intervention {
            name: trim_owned(self.name),
            intervention_type: trim_owned(self.intervention_type),
            description: trim_owned(self.description),
        }
    }
}

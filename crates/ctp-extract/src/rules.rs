//! Offline inference from labelled protocol text.
//!
//! Protocol synopses and registry print-outs are mostly `Label: value` lines
//! with a few free-text sections. The [`RuleInferer`] recognizes a fixed
//! vocabulary of labels and section headings and fills the matching fields.
//! It never fails: a chunk without recognizable labels yields an empty
//! partial record.

use std::collections::HashMap;
use std::sync::LazyLock;

use ctp_ingest::Chunk;
use ctp_model::{
    ArmGroup, ClinicalTrialRecord, Intervention, InterventionalDesign, ObservationalDesign,
    Outcome, StudyDesign, StudyType,
};
use regex::Regex;

use crate::error::InferenceFailure;
use crate::inferer::ChunkInferer;

/// Regex for `Label: value` lines, with optional section numbering.
static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)*\.?\s+)?([A-Za-z][A-Za-z0-9 ./()'&-]{0,60}?)\s*:\s*(.*)$")
        .expect("Invalid label line regex")
});

/// Regex for leading section numbers such as `4.1 ` or `2. `.
static SECTION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+").expect("Invalid section number regex"));

/// Regex for list bullets and item numbering.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•·▪◦]\s*|\(?\d{1,3}[.)]\s+|\(?[a-z][.)]\s+)")
        .expect("Invalid list marker regex")
});

/// Regex for a bracketed time frame trailing an outcome measure.
static TIME_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*time\s*frame\s*:\s*([^\]]*?)\s*\]").expect("Invalid time frame regex")
});

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("Invalid number regex"));

const ARM_TYPES: &[&str] = &[
    "Experimental",
    "Active Comparator",
    "Placebo Comparator",
    "Sham Comparator",
    "No Intervention",
];

const INTERVENTION_TYPES: &[&str] = &[
    "Drug",
    "Device",
    "Biological",
    "Procedure",
    "Radiation",
    "Behavioral",
    "Genetic",
    "Dietary Supplement",
    "Combination Product",
    "Diagnostic Test",
];

/// A recognized label and the field it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    BriefTitle,
    OfficialTitle,
    Acronym,
    OrgStudyId,
    /// Enrollment count, optionally with the enrollment type implied by the label.
    Enrollment(Option<&'static str>),
    EnrollmentType,
    OverallStatus,
    StartDate,
    PrimaryCompletionDate,
    BriefSummary,
    DetailedDescription,
    StudyType,
    PrimaryPurpose,
    Phase,
    Assignment,
    Allocation,
    ObservationalModel,
    TimePerspective,
    BiospecimenRetention,
    NumberOfGroups,
    Criteria,
    InclusionCriteria,
    ExclusionCriteria,
    Gender,
    MinimumAge,
    MaximumAge,
    HealthyVolunteers,
    PrimaryOutcome,
    SecondaryOutcome,
    TimeFrame,
    Description,
    Arm,
    TypedArm(&'static str),
    ArmType,
    ArmDescription,
    Intervention,
    TypedIntervention(&'static str),
    InterventionType,
    InterventionDescription,
    LeadSponsor,
    Collaborators,
    Conditions,
    Keywords,
}

/// How a label with no inline value captures the lines that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    /// The next non-empty line is the value.
    Line,
    /// Each following line is one entry.
    List,
    /// Everything up to the next label is the value.
    Block,
    /// Attaches to the current group entry; ignored when empty.
    Member,
}

impl Label {
    fn capture_kind(self) -> CaptureKind {
        match self {
            Label::BriefSummary
            | Label::DetailedDescription
            | Label::Criteria
            | Label::InclusionCriteria
            | Label::ExclusionCriteria => CaptureKind::Block,
            Label::PrimaryOutcome
            | Label::SecondaryOutcome
            | Label::Arm
            | Label::Intervention
            | Label::Collaborators
            | Label::Conditions
            | Label::Keywords => CaptureKind::List,
            Label::TimeFrame
            | Label::Description
            | Label::ArmType
            | Label::ArmDescription
            | Label::InterventionType
            | Label::InterventionDescription => CaptureKind::Member,
            _ => CaptureKind::Line,
        }
    }
}

static LABELS: LazyLock<HashMap<String, Label>> = LazyLock::new(|| {
    let mut labels: HashMap<String, Label> = [
        ("brief title", Label::BriefTitle),
        ("short title", Label::BriefTitle),
        ("official title", Label::OfficialTitle),
        ("protocol title", Label::OfficialTitle),
        ("full title", Label::OfficialTitle),
        ("title", Label::OfficialTitle),
        ("acronym", Label::Acronym),
        ("study acronym", Label::Acronym),
        ("org study id", Label::OrgStudyId),
        ("organization study id", Label::OrgStudyId),
        ("protocol number", Label::OrgStudyId),
        ("protocol no", Label::OrgStudyId),
        ("protocol id", Label::OrgStudyId),
        ("protocol code", Label::OrgStudyId),
        ("study id", Label::OrgStudyId),
        ("enrollment", Label::Enrollment(None)),
        ("sample size", Label::Enrollment(None)),
        ("number of participants", Label::Enrollment(None)),
        ("number of subjects", Label::Enrollment(None)),
        ("planned enrollment", Label::Enrollment(Some("Anticipated"))),
        ("estimated enrollment", Label::Enrollment(Some("Anticipated"))),
        ("anticipated enrollment", Label::Enrollment(Some("Anticipated"))),
        ("target enrollment", Label::Enrollment(Some("Anticipated"))),
        ("actual enrollment", Label::Enrollment(Some("Actual"))),
        ("enrollment type", Label::EnrollmentType),
        ("overall status", Label::OverallStatus),
        ("recruitment status", Label::OverallStatus),
        ("study status", Label::OverallStatus),
        ("start date", Label::StartDate),
        ("study start", Label::StartDate),
        ("study start date", Label::StartDate),
        ("primary completion date", Label::PrimaryCompletionDate),
        ("primary completion", Label::PrimaryCompletionDate),
        ("estimated primary completion date", Label::PrimaryCompletionDate),
        ("brief summary", Label::BriefSummary),
        ("summary", Label::BriefSummary),
        ("abstract", Label::BriefSummary),
        ("detailed description", Label::DetailedDescription),
        ("study type", Label::StudyType),
        ("primary purpose", Label::PrimaryPurpose),
        ("interventional subtype", Label::PrimaryPurpose),
        ("phase", Label::Phase),
        ("study phase", Label::Phase),
        ("clinical phase", Label::Phase),
        ("intervention model", Label::Assignment),
        ("interventional model", Label::Assignment),
        ("assignment", Label::Assignment),
        ("allocation", Label::Allocation),
        ("observational model", Label::ObservationalModel),
        ("observational study design", Label::ObservationalModel),
        ("time perspective", Label::TimePerspective),
        ("timing", Label::TimePerspective),
        ("biospecimen retention", Label::BiospecimenRetention),
        ("biospecimen", Label::BiospecimenRetention),
        ("number of groups", Label::NumberOfGroups),
        ("number of groups/cohorts", Label::NumberOfGroups),
        ("number of cohorts", Label::NumberOfGroups),
        ("eligibility criteria", Label::Criteria),
        ("criteria", Label::Criteria),
        ("inclusion criteria", Label::InclusionCriteria),
        ("exclusion criteria", Label::ExclusionCriteria),
        ("gender", Label::Gender),
        ("sex", Label::Gender),
        ("sexes eligible for study", Label::Gender),
        ("minimum age", Label::MinimumAge),
        ("maximum age", Label::MaximumAge),
        ("healthy volunteers", Label::HealthyVolunteers),
        ("accepts healthy volunteers", Label::HealthyVolunteers),
        ("primary outcome", Label::PrimaryOutcome),
        ("primary outcome measure", Label::PrimaryOutcome),
        ("primary outcome measures", Label::PrimaryOutcome),
        ("primary endpoint", Label::PrimaryOutcome),
        ("primary endpoints", Label::PrimaryOutcome),
        ("secondary outcome", Label::SecondaryOutcome),
        ("secondary outcome measure", Label::SecondaryOutcome),
        ("secondary outcome measures", Label::SecondaryOutcome),
        ("secondary endpoint", Label::SecondaryOutcome),
        ("secondary endpoints", Label::SecondaryOutcome),
        ("time frame", Label::TimeFrame),
        ("description", Label::Description),
        ("outcome description", Label::Description),
        ("measure description", Label::Description),
        ("arm", Label::Arm),
        ("arms", Label::Arm),
        ("arm group", Label::Arm),
        ("arm groups", Label::Arm),
        ("arm group label", Label::Arm),
        ("study arm", Label::Arm),
        ("study arms", Label::Arm),
        ("arm type", Label::ArmType),
        ("arm description", Label::ArmDescription),
        ("arm group description", Label::ArmDescription),
        ("intervention", Label::Intervention),
        ("interventions", Label::Intervention),
        ("intervention name", Label::Intervention),
        ("intervention type", Label::InterventionType),
        ("intervention description", Label::InterventionDescription),
        ("sponsor", Label::LeadSponsor),
        ("lead sponsor", Label::LeadSponsor),
        ("collaborator", Label::Collaborators),
        ("collaborators", Label::Collaborators),
        ("condition", Label::Conditions),
        ("conditions", Label::Conditions),
        ("condition or disease", Label::Conditions),
        ("health condition", Label::Conditions),
        ("indication", Label::Conditions),
        ("keyword", Label::Keywords),
        ("keywords", Label::Keywords),
    ]
    .into_iter()
    .map(|(label, target)| (label.to_string(), target))
    .collect();
    for &arm_type in ARM_TYPES {
        labels.insert(arm_type.to_lowercase(), Label::TypedArm(arm_type));
    }
    for &intervention_type in INTERVENTION_TYPES {
        labels.insert(
            intervention_type.to_lowercase(),
            Label::TypedIntervention(intervention_type),
        );
    }
    labels
});

/// Lowercase, drop `(s)` and periods, collapse whitespace.
fn normalize_label(label: &str) -> String {
    let lowered = label.to_lowercase().replace("(s)", "").replace('.', "");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lookup(label: &str) -> Option<Label> {
    LABELS.get(normalize_label(label).as_str()).copied()
}

/// Recognize a `Label: value` line.
fn label_line(line: &str) -> Option<(Label, &str)> {
    let captures = LABEL_LINE.captures(line)?;
    let label = lookup(captures.get(1)?.as_str())?;
    Some((label, captures.get(2).map_or("", |m| m.as_str())))
}

/// Recognize a bare section heading such as `INCLUSION CRITERIA`.
fn heading(line: &str) -> Option<Label> {
    let stripped = SECTION_NUMBER.replace(line, "");
    let label = lookup(stripped.trim_end_matches(':'))?;
    (label.capture_kind() == CaptureKind::Block).then_some(label)
}

/// Split `Type: rest` when `Type` is one of `types` (case-insensitive).
fn typed_prefix<'a>(value: &'a str, types: &[&'static str]) -> Option<(&'static str, &'a str)> {
    let (prefix, rest) = value.split_once(':')?;
    let prefix = normalize_label(prefix);
    types
        .iter()
        .find(|candidate| candidate.to_lowercase() == prefix)
        .map(|candidate| (*candidate, rest.trim()))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn strip_list_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(marker) => line[marker.end()..].trim(),
        None => line,
    }
}

fn set_if_empty(slot: &mut String, value: &str) {
    if slot.is_empty() {
        *slot = value.trim().to_string();
    }
}

/// Which repeated group later member labels attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    PrimaryOutcome,
    SecondaryOutcome,
    Arm,
    Intervention,
}

#[derive(Debug)]
enum Capture {
    None,
    Line(Label),
    List(Label),
    Block(Label, Vec<String>),
}

/// Line-oriented state machine over one chunk.
#[derive(Debug)]
struct ChunkParser {
    record: ClinicalTrialRecord,
    study_type: StudyType,
    interventional: InterventionalDesign,
    observational: ObservationalDesign,
    criteria: Vec<String>,
    group: Option<Group>,
    capture: Capture,
}

impl ChunkParser {
    fn new() -> Self {
        Self {
            record: ClinicalTrialRecord::default(),
            study_type: StudyType::Unknown,
            interventional: InterventionalDesign::default(),
            observational: ObservationalDesign::default(),
            criteria: Vec::new(),
            group: None,
            capture: Capture::None,
        }
    }

    fn parse(mut self, text: &str) -> ClinicalTrialRecord {
        for raw in text.lines() {
            self.line(raw.trim());
        }
        self.finish()
    }

    fn line(&mut self, line: &str) {
        if let Some((label, value)) = label_line(line) {
            let keeps_list = label.capture_kind() == CaptureKind::Member
                && matches!(self.capture, Capture::List(_));
            if !keeps_list {
                self.close_capture();
            }
            self.apply(label, value);
            return;
        }
        if let Some(label) = heading(line) {
            self.close_capture();
            self.capture = Capture::Block(label, Vec::new());
            return;
        }

        match &mut self.capture {
            Capture::Block(_, lines) => lines.push(line.to_string()),
            _ if line.is_empty() => {}
            Capture::Line(label) => {
                let label = *label;
                self.capture = Capture::None;
                self.apply(label, line);
            }
            Capture::List(label) => {
                let label = *label;
                self.apply_value(label, strip_list_marker(line));
            }
            Capture::None => {}
        }
    }

    fn apply(&mut self, label: Label, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.capture = match label.capture_kind() {
                CaptureKind::Line => Capture::Line(label),
                CaptureKind::List => Capture::List(label),
                CaptureKind::Block => Capture::Block(label, Vec::new()),
                CaptureKind::Member => return,
            };
            return;
        }
        if label.capture_kind() == CaptureKind::Block {
            self.capture = Capture::Block(label, vec![value.to_string()]);
            return;
        }
        self.apply_value(label, value);
        match label {
            Label::TypedArm(_) => self.capture = Capture::Line(Label::ArmDescription),
            Label::TypedIntervention(_) => {
                self.capture = Capture::Line(Label::InterventionDescription);
            }
            _ => {}
        }
    }

    fn apply_value(&mut self, label: Label, value: &str) {
        let record = &mut self.record;
        match label {
            Label::BriefTitle => set_if_empty(&mut record.brief_title, value),
            Label::OfficialTitle => set_if_empty(&mut record.official_title, value),
            Label::Acronym => set_if_empty(&mut record.acronym, value),
            Label::OrgStudyId => set_if_empty(&mut record.org_study_id, value),
            Label::Enrollment(implied_type) => {
                let count = FIRST_NUMBER
                    .find(value)
                    .map_or_else(|| value.to_string(), |m| m.as_str().replace(',', ""));
                set_if_empty(&mut record.enrollment, &count);
                if let Some(enrollment_type) = implied_type.or_else(|| enrollment_type(value)) {
                    set_if_empty(&mut record.enrollment_type, enrollment_type);
                }
            }
            Label::EnrollmentType => {
                let normalized = enrollment_type(value).unwrap_or(value);
                set_if_empty(&mut record.enrollment_type, normalized);
            }
            Label::OverallStatus => set_if_empty(&mut record.overall_status, value),
            Label::StartDate => set_if_empty(&mut record.start_date, value),
            Label::PrimaryCompletionDate => {
                set_if_empty(&mut record.primary_completion_date, value);
            }
            Label::BriefSummary => set_if_empty(&mut record.brief_summary, value),
            Label::DetailedDescription => set_if_empty(&mut record.detailed_description, value),
            Label::StudyType => {
                if !self.study_type.is_known() {
                    self.study_type = StudyType::detect(value);
                }
            }
            Label::PrimaryPurpose => set_if_empty(&mut self.interventional.subtype, value),
            Label::Phase => set_if_empty(&mut self.interventional.phase, value),
            Label::Assignment => set_if_empty(&mut self.interventional.assignment, value),
            Label::Allocation => set_if_empty(&mut self.interventional.allocation, value),
            Label::ObservationalModel => {
                set_if_empty(&mut self.observational.study_design, value);
            }
            Label::TimePerspective => set_if_empty(&mut self.observational.timing, value),
            Label::BiospecimenRetention => {
                set_if_empty(&mut self.observational.biospecimen_retention, value);
            }
            Label::NumberOfGroups => set_if_empty(&mut self.observational.number_of_groups, value),
            Label::Criteria => self.criteria.push(value.to_string()),
            Label::InclusionCriteria => {
                self.criteria.push(format!("Inclusion Criteria:\n{value}"));
            }
            Label::ExclusionCriteria => {
                self.criteria.push(format!("Exclusion Criteria:\n{value}"));
            }
            Label::Gender => set_if_empty(&mut record.eligibility.gender, value),
            Label::MinimumAge => set_if_empty(&mut record.eligibility.minimum_age, value),
            Label::MaximumAge => set_if_empty(&mut record.eligibility.maximum_age, value),
            Label::HealthyVolunteers => {
                set_if_empty(&mut record.eligibility.healthy_volunteers, value);
            }
            Label::PrimaryOutcome => {
                record.primary_outcomes.push(outcome(value));
                self.group = Some(Group::PrimaryOutcome);
            }
            Label::SecondaryOutcome => {
                record.secondary_outcomes.push(outcome(value));
                self.group = Some(Group::SecondaryOutcome);
            }
            Label::TimeFrame => {
                if let Some(outcome) = self.current_outcome() {
                    set_if_empty(&mut outcome.time_frame, value);
                }
            }
            Label::Description => match self.group {
                Some(Group::PrimaryOutcome | Group::SecondaryOutcome) => {
                    if let Some(outcome) = self.current_outcome() {
                        set_if_empty(&mut outcome.description, value);
                    }
                }
                Some(Group::Arm) => self.apply_value(Label::ArmDescription, value),
                Some(Group::Intervention) => {
                    self.apply_value(Label::InterventionDescription, value);
                }
                None => {
                    self.capture =
                        Capture::Block(Label::DetailedDescription, vec![value.to_string()]);
                }
            },
            Label::Arm => match typed_prefix(value, ARM_TYPES) {
                Some((arm_type, label)) => self.push_arm(label, arm_type),
                None => self.push_arm(value, ""),
            },
            Label::TypedArm(arm_type) => self.push_arm(value, arm_type),
            Label::ArmType => {
                if let Some(arm) = self.current_arm() {
                    set_if_empty(&mut arm.arm_type, value);
                }
            }
            Label::ArmDescription => {
                if let Some(arm) = self.current_arm() {
                    set_if_empty(&mut arm.description, value);
                }
            }
            Label::Intervention => match typed_prefix(value, INTERVENTION_TYPES) {
                Some((intervention_type, name)) => self.push_intervention(name, intervention_type),
                None => self.push_intervention(value, ""),
            },
            Label::TypedIntervention(intervention_type) => {
                self.push_intervention(value, intervention_type);
            }
            Label::InterventionType => {
                if let Some(intervention) = self.current_intervention() {
                    set_if_empty(&mut intervention.intervention_type, value);
                }
            }
            Label::InterventionDescription => {
                if let Some(intervention) = self.current_intervention() {
                    set_if_empty(&mut intervention.description, value);
                }
            }
            Label::LeadSponsor => set_if_empty(&mut record.sponsors.lead_sponsor, value),
            Label::Collaborators => record
                .sponsors
                .collaborators
                .extend(split_list(value).map(str::to_string)),
            Label::Conditions => record
                .conditions
                .extend(split_list(value).map(str::to_string)),
            Label::Keywords => record.keywords.extend(split_list(value).map(str::to_string)),
        }
    }

    fn push_arm(&mut self, label: &str, arm_type: &str) {
        self.record.arm_groups.push(ArmGroup {
            label: label.trim().to_string(),
            arm_type: arm_type.to_string(),
            description: String::new(),
        });
        self.group = Some(Group::Arm);
    }

    fn push_intervention(&mut self, name: &str, intervention_type: &str) {
        self.record.interventions.push(Intervention {
            name: name.trim().to_string(),
            intervention_type: intervention_type.to_string(),
            description: String::new(),
        });
        self.group = Some(Group::Intervention);
    }

    fn current_outcome(&mut self) -> Option<&mut Outcome> {
        match self.group {
            Some(Group::PrimaryOutcome) => self.record.primary_outcomes.last_mut(),
            Some(Group::SecondaryOutcome) => self.record.secondary_outcomes.last_mut(),
            _ => None,
        }
    }

    fn current_arm(&mut self) -> Option<&mut ArmGroup> {
        match self.group {
            Some(Group::Arm) => self.record.arm_groups.last_mut(),
            _ => None,
        }
    }

    fn current_intervention(&mut self) -> Option<&mut Intervention> {
        match self.group {
            Some(Group::Intervention) => self.record.interventions.last_mut(),
            _ => None,
        }
    }

    fn close_capture(&mut self) {
        let capture = std::mem::replace(&mut self.capture, Capture::None);
        if let Capture::Block(label, lines) = capture {
            let text = join_block(&lines);
            if !text.is_empty() {
                self.apply_value(label, &text);
            }
        }
    }

    fn finish(mut self) -> ClinicalTrialRecord {
        self.close_capture();
        let mut record = self.record;
        record.eligibility.criteria = self.criteria.join("\n\n");
        record.study_design = match self.study_type {
            StudyType::Interventional => StudyDesign::interventional(self.interventional),
            StudyType::Observational => StudyDesign::observational(self.observational),
            StudyType::Unknown => {
                match (self.interventional.is_empty(), self.observational.is_empty()) {
                    (false, true) => StudyDesign::interventional(self.interventional),
                    (true, false) => StudyDesign::observational(self.observational),
                    _ => StudyDesign::Unknown,
                }
            }
        };
        record
    }
}

/// Join block lines, trimming the ends and collapsing blank runs.
fn join_block(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && out.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|last| last.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn enrollment_type(value: &str) -> Option<&'static str> {
    let lowered = value.to_lowercase();
    if ["anticipated", "estimated", "planned", "target"]
        .iter()
        .any(|word| lowered.contains(word))
    {
        Some("Anticipated")
    } else if lowered.contains("actual") {
        Some("Actual")
    } else {
        None
    }
}

/// An outcome from a measure that may carry a bracketed time frame.
fn outcome(value: &str) -> Outcome {
    let mut outcome = Outcome::default();
    match TIME_FRAME.captures(value) {
        Some(captures) => {
            outcome.time_frame = captures
                .get(1)
                .map_or_else(String::new, |m| m.as_str().to_string());
            outcome.measure = TIME_FRAME.replace(value, "").trim().to_string();
        }
        None => outcome.measure = value.trim().to_string(),
    }
    outcome
}

/// Rule-based inferer for labelled protocol text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleInferer;

impl RuleInferer {
    pub fn new() -> Self {
        Self
    }

    /// Infer a partial record from raw text.
    pub fn infer_text(&self, text: &str) -> ClinicalTrialRecord {
        ChunkParser::new().parse(text)
    }
}

impl ChunkInferer for RuleInferer {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn infer(&self, chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure> {
        Ok(self.infer_text(&chunk.text))
    }
}

//! Catalog of record fields with their mapping keys and XML element paths.

/// How a field is shaped in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    /// Repeated plain strings.
    List,
    /// Subfield of a repeated group.
    GroupMember,
    /// Subfield of one study design variant.
    DesignMember,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::List => "list",
            FieldKind::GroupMember => "group",
            FieldKind::DesignMember => "design",
        }
    }
}

/// One documented field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub mapping_key: &'static str,
    pub xml_path: &'static str,
    pub kind: FieldKind,
}

const fn spec(mapping_key: &'static str, xml_path: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        mapping_key,
        xml_path,
        kind,
    }
}

use FieldKind::{DesignMember, GroupMember, List, Scalar};

/// Fields in XML document order.
pub const FIELD_CATALOG: &[FieldSpec] = &[
    spec("brief_title", "clinical_study/brief_title", Scalar),
    spec("official_title", "clinical_study/official_title", Scalar),
    spec("acronym", "clinical_study/acronym", Scalar),
    spec("org_study_id", "clinical_study/org_study_id", Scalar),
    spec(
        "sponsors.lead_sponsor",
        "clinical_study/sponsors/lead_sponsor",
        Scalar,
    ),
    spec(
        "sponsors.collaborators[]",
        "clinical_study/sponsors/collaborators/collaborator",
        List,
    ),
    spec("brief_summary", "clinical_study/brief_summary", Scalar),
    spec(
        "detailed_description",
        "clinical_study/detailed_description",
        Scalar,
    ),
    spec("overall_status", "clinical_study/overall_status", Scalar),
    spec("start_date", "clinical_study/start_date", Scalar),
    spec(
        "primary_completion_date",
        "clinical_study/primary_completion_date",
        Scalar,
    ),
    spec("enrollment", "clinical_study/enrollment", Scalar),
    spec("enrollment_type", "clinical_study/enrollment_type", Scalar),
    spec(
        "study_design.study_type",
        "clinical_study/study_design/study_type",
        Scalar,
    ),
    spec(
        "study_design.interventional_design.interventional_subtype",
        "clinical_study/study_design/interventional_design/interventional_subtype",
        DesignMember,
    ),
    spec(
        "study_design.interventional_design.phase",
        "clinical_study/study_design/interventional_design/phase",
        DesignMember,
    ),
    spec(
        "study_design.interventional_design.assignment",
        "clinical_study/study_design/interventional_design/assignment",
        DesignMember,
    ),
    spec(
        "study_design.interventional_design.allocation",
        "clinical_study/study_design/interventional_design/allocation",
        DesignMember,
    ),
    spec(
        "study_design.observational_design.observational_study_design",
        "clinical_study/study_design/observational_design/observational_study_design",
        DesignMember,
    ),
    spec(
        "study_design.observational_design.timing",
        "clinical_study/study_design/observational_design/timing",
        DesignMember,
    ),
    spec(
        "study_design.observational_design.biospecimen_retention",
        "clinical_study/study_design/observational_design/biospecimen_retention",
        DesignMember,
    ),
    spec(
        "study_design.observational_design.number_of_groups",
        "clinical_study/study_design/observational_design/number_of_groups",
        DesignMember,
    ),
    spec("conditions[]", "clinical_study/conditions/condition", List),
    spec("keywords[]", "clinical_study/keywords/keyword", List),
    spec(
        "arm_groups[].arm_group_label",
        "clinical_study/arm_groups/arm_group/arm_group_label",
        GroupMember,
    ),
    spec(
        "arm_groups[].arm_type",
        "clinical_study/arm_groups/arm_group/arm_group_type",
        GroupMember,
    ),
    spec(
        "arm_groups[].arm_group_description",
        "clinical_study/arm_groups/arm_group/description",
        GroupMember,
    ),
    spec(
        "interventions[].intervention_name",
        "clinical_study/interventions/intervention/intervention_name",
        GroupMember,
    ),
    spec(
        "interventions[].intervention_type",
        "clinical_study/interventions/intervention/intervention_type",
        GroupMember,
    ),
    spec(
        "interventions[].intervention_description",
        "clinical_study/interventions/intervention/description",
        GroupMember,
    ),
    spec(
        "primary_outcomes[].outcome_measure",
        "clinical_study/primary_outcomes/primary_outcome/measure",
        GroupMember,
    ),
    spec(
        "primary_outcomes[].outcome_time_frame",
        "clinical_study/primary_outcomes/primary_outcome/time_frame",
        GroupMember,
    ),
    spec(
        "primary_outcomes[].outcome_description",
        "clinical_study/primary_outcomes/primary_outcome/description",
        GroupMember,
    ),
    spec(
        "secondary_outcomes[].outcome_measure",
        "clinical_study/secondary_outcomes/secondary_outcome/measure",
        GroupMember,
    ),
    spec(
        "secondary_outcomes[].outcome_time_frame",
        "clinical_study/secondary_outcomes/secondary_outcome/time_frame",
        GroupMember,
    ),
    spec(
        "secondary_outcomes[].outcome_description",
        "clinical_study/secondary_outcomes/secondary_outcome/description",
        GroupMember,
    ),
    spec("eligibility.criteria", "clinical_study/eligibility/criteria", Scalar),
    spec("eligibility.gender", "clinical_study/eligibility/gender", Scalar),
    spec(
        "eligibility.minimum_age",
        "clinical_study/eligibility/minimum_age",
        Scalar,
    ),
    spec(
        "eligibility.maximum_age",
        "clinical_study/eligibility/maximum_age",
        Scalar,
    ),
    spec(
        "eligibility.healthy_volunteers",
        "clinical_study/eligibility/healthy_volunteers",
        Scalar,
    ),
];

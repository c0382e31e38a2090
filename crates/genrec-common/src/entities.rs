/// Row types mirroring the recommendation tables.
/// These are Rust representations of the rows the external store hands us;
/// the resolution core never writes them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GenrecError;

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

/// Sex filter carried by groups, risks and cancer recommendations.
///
/// Stored rows encode "any sex" either as SQL `NULL` or as the literal
/// `ANY`; both collapse to [`SexFilter::Any`] at ingestion so the
/// resolver only ever compares three values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub enum SexFilter {
    Male,
    Female,
    #[default]
    Any,
}

impl SexFilter {
    /// Normalise a stored value. `None`, empty and `ANY` all mean "any".
    pub fn parse(raw: Option<&str>) -> Result<Self, GenrecError> {
        let Some(raw) = raw else {
            return Ok(SexFilter::Any);
        };
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "ANY" => Ok(SexFilter::Any),
            "M" => Ok(SexFilter::Male),
            "F" => Ok(SexFilter::Female),
            _ => Err(GenrecError::InvalidSex(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SexFilter::Male => "M",
            SexFilter::Female => "F",
            SexFilter::Any => "ANY",
        }
    }

    pub fn matches(&self, patient: PatientSex) -> bool {
        match self {
            SexFilter::Any => true,
            SexFilter::Male => patient == PatientSex::Male,
            SexFilter::Female => patient == PatientSex::Female,
        }
    }
}

impl TryFrom<Option<String>> for SexFilter {
    type Error = GenrecError;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        SexFilter::parse(value.as_deref())
    }
}

impl From<SexFilter> for Option<String> {
    fn from(value: SexFilter) -> Self {
        Some(value.as_str().to_string())
    }
}

/// Sex of the patient a report is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientSex {
    #[serde(rename = "M", alias = "m")]
    Male,
    #[serde(rename = "F", alias = "f")]
    Female,
}

impl PatientSex {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientSex::Male => "M",
            PatientSex::Female => "F",
        }
    }
}

// ---------------------------------------------------------------------------
// Gene / classes / groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub id: Uuid,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Gene-scoped tag used to propagate mutation → group inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationClass {
    pub id: Uuid,
    pub gene_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Age/sex-scoped guidance block of a gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationGroup {
    pub id: Uuid,
    pub gene_id: Uuid,
    #[serde(default)]
    pub sex: SexFilter,
    #[serde(default)]
    pub age_min: Option<i32>,
    /// Carried through to the report but never used to gate inclusion.
    #[serde(default)]
    pub age_max: Option<i32>,
    pub recommendations: String,
    /// Associated with every class of the gene, present and future.
    #[serde(default)]
    pub applies_to_all_classes: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupClassLink {
    pub group_id: Uuid,
    pub class_id: Uuid,
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathogenicity {
    Pathogenic,
    LikelyPathogenic,
}

impl Pathogenicity {
    /// Serialize to the string stored in the DB.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pathogenicity::Pathogenic => "pathogenic",
            Pathogenicity::LikelyPathogenic => "likely_pathogenic",
        }
    }

    /// Parse from the string stored in the DB.
    pub fn parse(s: &str) -> Result<Self, GenrecError> {
        match s.trim() {
            "pathogenic" => Ok(Pathogenicity::Pathogenic),
            "likely_pathogenic" => Ok(Pathogenicity::LikelyPathogenic),
            other => Err(GenrecError::InvalidPathogenicity(other.to_string())),
        }
    }
}

/// Unique per (gene_id, mutation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub id: Uuid,
    pub gene_id: Uuid,
    pub mutation: String,
    pub pathogenicity: Pathogenicity,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Manual "this mutation includes this group" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationGroupLink {
    pub mutation_id: Uuid,
    pub group_id: Uuid,
}

/// "This mutation belongs to this class" edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationClassLink {
    pub mutation_id: Uuid,
    pub class_id: Uuid,
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    Include,
    Exclude,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Include => "include",
            OverrideKind::Exclude => "exclude",
        }
    }

    pub fn parse(s: &str) -> Result<Self, GenrecError> {
        match s.trim() {
            "include" => Ok(OverrideKind::Include),
            "exclude" => Ok(OverrideKind::Exclude),
            other => Err(GenrecError::InvalidOverride(other.to_string())),
        }
    }
}

/// At most one row per (mutation_id, group_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationGroupOverride {
    pub mutation_id: Uuid,
    pub group_id: Uuid,
    #[serde(rename = "override")]
    pub kind: OverrideKind,
}

// ---------------------------------------------------------------------------
// Risks / cancer recommendations
// ---------------------------------------------------------------------------

/// Informational, sex-filtered risk note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub id: Uuid,
    pub gene_id: Uuid,
    #[serde(default)]
    pub sex: SexFilter,
    pub risk: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Guidance for cancer-positive patients. Same age/sex filtering as a
/// group, no class or override machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancerRecommendation {
    pub id: Uuid,
    pub gene_id: Uuid,
    #[serde(default)]
    pub sex: SexFilter,
    #[serde(default)]
    pub age_min: Option<i32>,
    #[serde(default)]
    pub age_max: Option<i32>,
    pub recommendations: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

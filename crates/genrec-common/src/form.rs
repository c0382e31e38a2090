//! Generator form: the raw patient inputs and selections a report is built from.
//!
//! Values are kept as typed by the clinician (symbols and mutation texts,
//! free-text age) so the validation gate can report per-field errors.
//! Forms can be authored as YAML/JSON files and fed to the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Complete generator form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorForm {
    /// Patient age in whole years
    #[serde(default)]
    pub age: Option<AgeInput>,

    /// Patient sex as typed (`M` or `F`)
    #[serde(default)]
    pub sex: Option<String>,

    /// Cancer status answers
    #[serde(default)]
    pub cancer: CancerAnswers,

    /// Gene entries, each with its typed mutations
    #[serde(default)]
    pub entries: Vec<GeneEntryForm>,
}

/// Age as typed. YAML/JSON authors may write either `30` or `"30"`;
/// anything else still deserializes so the gate can flag the `age` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Years(i64),
    Fractional(f64),
    Text(String),
    Other(serde_yaml::Value),
}

// ── Cancer answers ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancerAnswers {
    /// Is the patient cancer-positive?
    #[serde(default)]
    pub positive: Option<bool>,

    /// Only asked when `positive` is true: is the cancer linked to a gene?
    #[serde(default)]
    pub linked_to_gene: Option<bool>,

    /// Only asked when linked: typed symbols of the cancer-linked genes
    #[serde(default)]
    pub genes: Vec<String>,
}

// ── Gene entries ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneEntryForm {
    /// Typed gene symbol
    #[serde(default)]
    pub gene: String,

    /// Typed mutation texts of that gene
    #[serde(default)]
    pub mutations: Vec<String>,
}

impl GeneEntryForm {
    /// A row the clinician left completely empty. Blank rows are skipped,
    /// not flagged.
    pub fn is_blank(&self) -> bool {
        self.gene.trim().is_empty() && self.mutations.iter().all(|m| m.trim().is_empty())
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl GeneratorForm {
    /// Load from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let form: Self = serde_yaml::from_str(&content)?;
        Ok(form)
    }

    /// Load from JSON file
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let form: Self = serde_json::from_str(&content)?;
        Ok(form)
    }

    /// Load from a file, picking the format by extension (YAML otherwise).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        }
    }

    /// Entries that carry at least some typed text.
    pub fn filled_entries(&self) -> impl Iterator<Item = (usize, &GeneEntryForm)> {
        self.entries.iter().enumerate().filter(|(_, e)| !e.is_blank())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

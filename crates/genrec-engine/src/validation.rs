//! Validation gate between the generator form and the resolution core.
//!
//! Typed symbols and mutation texts are resolved against a [`Catalog`]
//! loaded from the store; every problem is reported against the field
//! it came from and the core is not run at all.

use std::collections::HashMap;
use std::fmt;

use genrec_common::entities::{Gene, PatientSex};
use genrec_common::form::{AgeInput, GeneratorForm};
use genrec_common::Snapshot;
use genrec_db::{RecommendationStore, SnapshotRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{CancerContext, GeneSelection, PatientProfile};
use crate::report::merge_selections;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form path, e.g. `age` or `entries[1].mutations[0]`
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError { field: field.into(), message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// ── Validated request ─────────────────────────────────────────────────────────

/// A form that passed the gate, reduced to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub patient: PatientProfile,
    pub cancer: CancerContext,
    pub selections: Vec<GeneSelection>,
}

impl GenerationRequest {
    /// Ids the store must return rows for.
    pub fn snapshot_request(&self) -> SnapshotRequest {
        SnapshotRequest {
            gene_ids: self.selections.iter().map(|s| s.gene_id).collect(),
            mutation_ids: self.selections.iter().flat_map(|s| s.mutation_ids.iter().copied()).collect(),
            cancer_gene_ids: self.cancer.linked_gene_ids().to_vec(),
        }
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

fn symbol_key(typed: &str) -> String {
    typed.trim().to_ascii_uppercase()
}

/// Known genes and their mutations, for resolving typed entries.
#[derive(Debug, Default)]
pub struct Catalog {
    genes: HashMap<String, Gene>,
    mutations: HashMap<Uuid, HashMap<String, Uuid>>,
}

impl Catalog {
    /// Look up every symbol typed on the form, then the mutations of the
    /// genes that resolved.
    pub async fn load<S>(store: &S, form: &GeneratorForm) -> genrec_db::Result<Self>
    where
        S: RecommendationStore + ?Sized,
    {
        let mut symbols: Vec<String> = form
            .entries
            .iter()
            .map(|e| e.gene.trim().to_string())
            .chain(form.cancer.genes.iter().map(|g| g.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();
        symbols.sort();
        symbols.dedup();
        if symbols.is_empty() {
            return Ok(Self::default());
        }

        let genes = store.genes_by_symbols(&symbols).await?;
        let gene_ids: Vec<Uuid> = genes.iter().map(|g| g.id).collect();
        let mutations = store.mutations_by_genes(&gene_ids).await?;
        Ok(Self::from_rows(genes, mutations))
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::from_rows(snapshot.genes.clone(), snapshot.mutations.clone())
    }

    fn from_rows(genes: Vec<Gene>, mutations: Vec<genrec_common::entities::Mutation>) -> Self {
        let mut catalog = Self::default();
        for gene in genes {
            catalog.genes.insert(symbol_key(&gene.symbol), gene);
        }
        for m in mutations {
            catalog
                .mutations
                .entry(m.gene_id)
                .or_default()
                .insert(m.mutation.trim().to_string(), m.id);
        }
        catalog
    }

    /// Case-insensitive, whitespace-trimmed symbol lookup.
    pub fn gene(&self, typed: &str) -> Option<&Gene> {
        self.genes.get(&symbol_key(typed))
    }

    /// Exact (trimmed) mutation text lookup within one gene.
    pub fn mutation(&self, gene_id: Uuid, typed: &str) -> Option<Uuid> {
        self.mutations.get(&gene_id)?.get(typed.trim()).copied()
    }
}

// ── Gate ──────────────────────────────────────────────────────────────────────

fn parse_age(input: Option<&AgeInput>) -> Result<u32, &'static str> {
    const INVALID: &str = "must be a non-negative whole number";
    match input {
        None => Err("age is required"),
        Some(AgeInput::Years(n)) => u32::try_from(*n).map_err(|_| INVALID),
        Some(AgeInput::Fractional(x)) if x.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(x) => {
            Ok(*x as u32)
        }
        Some(AgeInput::Fractional(_) | AgeInput::Other(_)) => Err(INVALID),
        Some(AgeInput::Text(s)) if s.trim().is_empty() => Err("age is required"),
        Some(AgeInput::Text(s)) => s.trim().parse::<u32>().map_err(|_| INVALID),
    }
}

fn parse_sex(input: Option<&str>) -> Result<PatientSex, &'static str> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Err("sex is required");
    };
    match raw.to_ascii_uppercase().as_str() {
        "M" | "MALE" => Ok(PatientSex::Male),
        "F" | "FEMALE" => Ok(PatientSex::Female),
        _ => Err("must be M or F"),
    }
}

/// Check the form for completeness and resolve it to ids.
pub fn validate_form(form: &GeneratorForm, catalog: &Catalog) -> Result<GenerationRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let age = parse_age(form.age.as_ref()).map_err(|m| errors.push("age", m)).ok();
    let sex = parse_sex(form.sex.as_deref()).map_err(|m| errors.push("sex", m)).ok();

    // Cancer answers: each question is only asked once the previous one is "yes".
    let mut cancer = CancerContext::default();
    match form.cancer.positive {
        None => errors.push("cancer.positive", "answer whether the patient is cancer-positive"),
        Some(false) => {}
        Some(true) => {
            cancer.positive = true;
            match form.cancer.linked_to_gene {
                None => errors.push("cancer.linked_to_gene", "answer whether the cancer is linked to a gene"),
                Some(false) => {}
                Some(true) => {
                    cancer.linked_to_gene = true;
                    let mut any_typed = false;
                    for (k, typed) in form.cancer.genes.iter().enumerate() {
                        if typed.trim().is_empty() {
                            continue;
                        }
                        any_typed = true;
                        match catalog.gene(typed) {
                            Some(gene) if !cancer.gene_ids.contains(&gene.id) => cancer.gene_ids.push(gene.id),
                            Some(_) => {}
                            None => errors.push(format!("cancer.genes[{k}]"), format!("unknown gene '{}'", typed.trim())),
                        }
                    }
                    if !any_typed {
                        errors.push("cancer.genes", "choose at least one cancer-linked gene");
                    }
                }
            }
        }
    }

    let mut selections: Vec<GeneSelection> = Vec::new();
    for (i, entry) in form.filled_entries() {
        let typed_gene = entry.gene.trim();
        if typed_gene.is_empty() {
            errors.push(format!("entries[{i}].gene"), "gene is required when mutations are entered");
            continue;
        }
        let Some(gene) = catalog.gene(typed_gene) else {
            errors.push(format!("entries[{i}].gene"), format!("unknown gene '{typed_gene}'"));
            continue;
        };
        let mut selection = GeneSelection { gene_id: gene.id, mutation_ids: Vec::new() };
        for (j, typed) in entry.mutations.iter().enumerate() {
            if typed.trim().is_empty() {
                continue;
            }
            match catalog.mutation(gene.id, typed) {
                Some(id) => selection.mutation_ids.push(id),
                None => errors.push(
                    format!("entries[{i}].mutations[{j}]"),
                    format!("unknown mutation '{}' for {}", typed.trim(), gene.symbol),
                ),
            }
        }
        selections.push(selection);
    }

    // Entries that were typed but failed to resolve are already flagged.
    if form.filled_entries().next().is_none() && cancer.linked_gene_ids().is_empty() {
        errors.push("entries", "enter at least one gene");
    }

    match (age, sex) {
        (Some(age), Some(sex)) if errors.is_empty() => Ok(GenerationRequest {
            patient: PatientProfile { age, sex },
            cancer,
            selections: merge_selections(&selections),
        }),
        _ => Err(errors),
    }
}

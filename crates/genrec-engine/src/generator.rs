//! Report generation over a store.
//!
//! One call runs: catalog lookup, validation, one snapshot fetch, index
//! build, resolution and assembly. Only one generation may be in flight
//! per generator; a second call while one is running fails with
//! [`GenerateError::Busy`] instead of queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use genrec_common::entities::{Gene, Mutation};
use genrec_common::form::GeneratorForm;
use genrec_db::{fetch_snapshot, RecommendationStore, SnapshotRequest};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GenerateError, Result};
use crate::index::ReferenceIndex;
use crate::report::{assemble_report, Report};
use crate::resolver::{explain_mutation, GroupDecision};
use crate::validation::{validate_form, Catalog, FieldError, GenerationRequest, ValidationErrors};

/// Holds the in-flight flag until dropped, including on early return.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| GenerateError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Resolution of one mutation against every group of its gene.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub gene: Gene,
    pub mutation: Mutation,
    pub decisions: Vec<GroupDecision>,
}

pub struct ReportGenerator<S: RecommendationStore + ?Sized> {
    store: Arc<S>,
    busy: AtomicBool,
}

impl<S: RecommendationStore + ?Sized> ReportGenerator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, busy: AtomicBool::new(false) }
    }

    /// Whether a generation is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }

    /// Validate the form and, if it passes, build the report.
    pub async fn generate(&self, form: &GeneratorForm) -> Result<Report> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let catalog = Catalog::load(self.store.as_ref(), form).await?;
        let request = validate_form(form, &catalog).map_err(|errors| {
            warn!(errors = errors.errors.len(), "Form rejected");
            GenerateError::Invalid(errors)
        })?;
        self.run(&request).await
    }

    /// Build the report for an already validated request.
    pub async fn generate_request(&self, request: &GenerationRequest) -> Result<Report> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        self.run(request).await
    }

    async fn run(&self, request: &GenerationRequest) -> Result<Report> {
        let started = Instant::now();
        let snapshot = fetch_snapshot(self.store.as_ref(), &request.snapshot_request()).await?;
        let index = ReferenceIndex::build(&snapshot);
        let report = assemble_report(&index, &request.selections, &request.patient, &request.cancer);

        info!(
            boxes = report.boxes.len(),
            rows = snapshot.row_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Report generated"
        );
        Ok(report)
    }

    /// Show how one mutation resolves against each group of its gene.
    pub async fn explain(&self, gene_symbol: &str, mutation_text: &str) -> Result<Explanation> {
        let form = GeneratorForm {
            entries: vec![genrec_common::form::GeneEntryForm {
                gene: gene_symbol.to_string(),
                mutations: vec![mutation_text.to_string()],
            }],
            ..Default::default()
        };
        let catalog = Catalog::load(self.store.as_ref(), &form).await?;

        let mut errors = ValidationErrors::default();
        let gene = catalog.gene(gene_symbol).cloned();
        let mutation_id = gene.as_ref().and_then(|g| catalog.mutation(g.id, mutation_text));
        let (gene, mutation_id) = match (gene, mutation_id) {
            (Some(gene), Some(id)) => (gene, id),
            (None, _) => {
                errors.errors.push(FieldError {
                    field: "gene".to_string(),
                    message: format!("unknown gene '{}'", gene_symbol.trim()),
                });
                return Err(errors.into());
            }
            (Some(gene), None) => {
                errors.errors.push(FieldError {
                    field: "mutation".to_string(),
                    message: format!("unknown mutation '{}' for {}", mutation_text.trim(), gene.symbol),
                });
                return Err(errors.into());
            }
        };

        let request = SnapshotRequest {
            gene_ids: vec![gene.id],
            mutation_ids: vec![mutation_id],
            cancer_gene_ids: Vec::new(),
        };
        let snapshot = fetch_snapshot(self.store.as_ref(), &request).await?;
        let index = ReferenceIndex::build(&snapshot);
        let mutation = index
            .mutation(mutation_id)
            .cloned()
            .ok_or_else(|| GenerateError::Fetch(genrec_db::DbError::NotFound(format!("mutation {mutation_id}"))))?;

        Ok(Explanation { gene, mutation, decisions: explain_mutation(&index, mutation_id) })
    }
}

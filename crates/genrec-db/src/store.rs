//! Read seam over the external recommendation store.
//!
//! The resolution core never talks to storage directly: it asks a
//! [`RecommendationStore`] for the rows of one report generation and
//! works on the resulting [`Snapshot`].

use async_trait::async_trait;
use genrec_common::entities::*;
use genrec_common::Snapshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Typed, id-keyed reads against the recommendation tables.
///
/// Every read is independent of the others. Unknown ids are not an
/// error; they simply produce no rows.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Every gene row; used by whole-store checks, not by generation.
    async fn all_genes(&self) -> Result<Vec<Gene>>;

    async fn genes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Gene>>;

    /// Case-insensitive lookup by symbol, used to resolve typed entries.
    async fn genes_by_symbols(&self, symbols: &[String]) -> Result<Vec<Gene>>;

    async fn classes_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<RecommendationClass>>;

    async fn groups_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<RecommendationGroup>>;

    async fn group_classes_by_groups(&self, group_ids: &[Uuid]) -> Result<Vec<GroupClassLink>>;

    async fn mutations_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Mutation>>;

    async fn mutations_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<Mutation>>;

    async fn mutation_groups_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationGroupLink>>;

    async fn mutation_classes_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationClassLink>>;

    async fn overrides_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationGroupOverride>>;

    async fn risks_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<Risk>>;

    async fn cancer_recommendations_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<CancerRecommendation>>;
}

/// Ids one report generation needs rows for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRequest {
    /// Genes with a mutation entry on the form
    pub gene_ids: Vec<Uuid>,
    /// Selected mutations across all entries
    pub mutation_ids: Vec<Uuid>,
    /// Cancer-linked genes whose cancer recommendations are wanted
    pub cancer_gene_ids: Vec<Uuid>,
}

impl SnapshotRequest {
    /// Entry genes followed by cancer-only genes, without duplicates.
    pub fn all_gene_ids(&self) -> Vec<Uuid> {
        let mut ids = self.gene_ids.clone();
        for id in &self.cancer_gene_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// Fetch every row a generation needs.
///
/// The independent reads are issued concurrently and joined; the first
/// failing read aborts the whole fetch and its error is returned. Group
/// class links are keyed by group id, so they are read once the group
/// rows are in.
pub async fn fetch_snapshot<S>(store: &S, request: &SnapshotRequest) -> Result<Snapshot>
where
    S: RecommendationStore + ?Sized,
{
    let all_gene_ids = request.all_gene_ids();
    let gene_ids = request.gene_ids.as_slice();
    let mutation_ids = request.mutation_ids.as_slice();

    let (
        genes,
        classes,
        groups,
        mutations,
        mutation_groups,
        mutation_classes,
        overrides,
        risks,
        cancer_recommendations,
    ) = tokio::try_join!(
        store.genes_by_ids(&all_gene_ids),
        store.classes_by_genes(gene_ids),
        store.groups_by_genes(gene_ids),
        store.mutations_by_ids(mutation_ids),
        store.mutation_groups_by_mutations(mutation_ids),
        store.mutation_classes_by_mutations(mutation_ids),
        store.overrides_by_mutations(mutation_ids),
        store.risks_by_genes(gene_ids),
        store.cancer_recommendations_by_genes(&request.cancer_gene_ids),
    )?;

    let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    let group_classes = if group_ids.is_empty() {
        Vec::new()
    } else {
        store.group_classes_by_groups(&group_ids).await?
    };

    let snapshot = Snapshot {
        genes,
        classes,
        groups,
        group_classes,
        mutations,
        mutation_groups,
        mutation_classes,
        overrides,
        risks,
        cancer_recommendations,
    };

    debug!(
        genes = snapshot.genes.len(),
        groups = snapshot.groups.len(),
        mutations = snapshot.mutations.len(),
        rows = snapshot.row_count(),
        "Fetched snapshot"
    );

    Ok(snapshot)
}

/// Fetch every row reachable from a gene, for whole-store checks.
pub async fn fetch_all<S>(store: &S) -> Result<Snapshot>
where
    S: RecommendationStore + ?Sized,
{
    let genes = store.all_genes().await?;
    let gene_ids: Vec<Uuid> = genes.iter().map(|g| g.id).collect();
    let mutations = store.mutations_by_genes(&gene_ids).await?;
    let request = SnapshotRequest {
        mutation_ids: mutations.iter().map(|m| m.id).collect(),
        cancer_gene_ids: gene_ids.clone(),
        gene_ids,
    };
    fetch_snapshot(store, &request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_gene_ids_dedups_and_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let request = SnapshotRequest {
            gene_ids: vec![a, b],
            mutation_ids: vec![],
            cancer_gene_ids: vec![b, c],
        };
        assert_eq!(request.all_gene_ids(), vec![a, b, c]);
    }
}

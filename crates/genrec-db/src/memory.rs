//! In-memory recommendation store.
//!
//! Backs the CLI's fixture mode and the test suites. Reads implement
//! [`RecommendationStore`]; the typed write methods enforce the table
//! invariants the hosted store enforces with constraints (unique gene
//! symbol, unique mutation per gene, one override per pair, no class
//! links on applies-to-all groups).

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use genrec_common::entities::*;
use genrec_common::Snapshot;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::schema::*;
use crate::store::RecommendationStore;

/// Repository over a single in-process [`Snapshot`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Snapshot>,
}

fn id_set(ids: &[Uuid]) -> HashSet<Uuid> {
    ids.iter().copied().collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing snapshot. Rows are taken as-is; use the typed
    /// writers when the invariants must be checked.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { tables: RwLock::new(snapshot) }
    }

    /// Open a YAML/JSON fixture file.
    pub fn open_fixture(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let snapshot = Snapshot::load(path)?;
        debug!(path = %path.display(), rows = snapshot.row_count(), "Loaded fixture");
        Ok(Self::from_snapshot(snapshot))
    }

    /// Copy of every row currently held.
    pub async fn snapshot(&self) -> Snapshot {
        self.tables.read().await.clone()
    }

    /// Row count per table.
    pub async fn table_counts(&self) -> Vec<(&'static str, usize)> {
        table_counts(&*self.tables.read().await)
    }

    // ── Genes, classes, groups ───────────────────────────────────────────────

    pub async fn insert_gene(&self, gene: Gene) -> Result<()> {
        let mut t = self.tables.write().await;
        let symbol = gene.symbol.trim();
        if symbol.is_empty() {
            return Err(DbError::InvalidRow {
                table: TABLE_GENES,
                message: "symbol is required".to_string(),
            });
        }
        if t.genes.iter().any(|g| g.id == gene.id || g.symbol.trim().eq_ignore_ascii_case(symbol)) {
            return Err(DbError::Duplicate(format!("gene {}", gene.symbol)));
        }
        t.genes.push(gene);
        Ok(())
    }

    pub async fn insert_class(&self, class: RecommendationClass) -> Result<()> {
        let mut t = self.tables.write().await;
        require_gene(&t, class.gene_id, TABLE_CLASSES)?;
        if t.classes.iter().any(|c| c.id == class.id) {
            return Err(DbError::Duplicate(format!("class {}", class.id)));
        }
        t.classes.push(class);
        Ok(())
    }

    pub async fn insert_group(&self, group: RecommendationGroup) -> Result<()> {
        let mut t = self.tables.write().await;
        require_gene(&t, group.gene_id, TABLE_GROUPS)?;
        if t.groups.iter().any(|g| g.id == group.id) {
            return Err(DbError::Duplicate(format!("group {}", group.id)));
        }
        t.groups.push(group);
        Ok(())
    }

    /// Tag a group with a class of the same gene.
    pub async fn link_group_class(&self, group_id: Uuid, class_id: Uuid) -> Result<()> {
        let mut t = self.tables.write().await;
        let group = t
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or_else(|| DbError::NotFound(format!("group {group_id}")))?;
        if group.applies_to_all_classes {
            return Err(DbError::InvalidRow {
                table: TABLE_GROUP_CLASSES,
                message: format!("group {group_id} applies to all classes and takes no class links"),
            });
        }
        let class = t
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .ok_or_else(|| DbError::NotFound(format!("class {class_id}")))?;
        if class.gene_id != group.gene_id {
            return Err(DbError::InvalidRow {
                table: TABLE_GROUP_CLASSES,
                message: format!("class {class_id} belongs to another gene"),
            });
        }
        let link = GroupClassLink { group_id, class_id };
        if !t.group_classes.contains(&link) {
            t.group_classes.push(link);
        }
        Ok(())
    }

    /// Remove a group together with every edge and override pointing at it.
    pub async fn delete_group(&self, group_id: Uuid) -> Result<()> {
        let mut t = self.tables.write().await;
        let before = t.groups.len();
        t.groups.retain(|g| g.id != group_id);
        if t.groups.len() == before {
            return Err(DbError::NotFound(format!("group {group_id}")));
        }
        t.group_classes.retain(|l| l.group_id != group_id);
        t.mutation_groups.retain(|l| l.group_id != group_id);
        t.overrides.retain(|o| o.group_id != group_id);
        Ok(())
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    pub async fn insert_mutation(&self, mutation: Mutation) -> Result<()> {
        let mut t = self.tables.write().await;
        require_gene(&t, mutation.gene_id, TABLE_MUTATIONS)?;
        let text = mutation.mutation.trim();
        if t.mutations.iter().any(|m| {
            m.id == mutation.id || (m.gene_id == mutation.gene_id && m.mutation.trim() == text)
        }) {
            return Err(DbError::Duplicate(format!("mutation {}", mutation.mutation)));
        }
        t.mutations.push(mutation);
        Ok(())
    }

    /// Manually include a group for a mutation.
    pub async fn link_mutation_group(&self, mutation_id: Uuid, group_id: Uuid) -> Result<()> {
        let mut t = self.tables.write().await;
        require_same_gene(&t, mutation_id, group_id, TABLE_MUTATION_GROUPS)?;
        let link = MutationGroupLink { mutation_id, group_id };
        if !t.mutation_groups.contains(&link) {
            t.mutation_groups.push(link);
        }
        Ok(())
    }

    pub async fn link_mutation_class(&self, mutation_id: Uuid, class_id: Uuid) -> Result<()> {
        let mut t = self.tables.write().await;
        let mutation = find_mutation(&t, mutation_id)?;
        let class = t
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .ok_or_else(|| DbError::NotFound(format!("class {class_id}")))?;
        if class.gene_id != mutation.gene_id {
            return Err(DbError::InvalidRow {
                table: TABLE_MUTATION_CLASSES,
                message: format!("class {class_id} belongs to another gene"),
            });
        }
        let link = MutationClassLink { mutation_id, class_id };
        if !t.mutation_classes.contains(&link) {
            t.mutation_classes.push(link);
        }
        Ok(())
    }

    /// Set or clear the override of a (mutation, group) pair. Setting
    /// replaces any existing row, so at most one row exists per pair.
    pub async fn set_override(
        &self,
        mutation_id: Uuid,
        group_id: Uuid,
        kind: Option<OverrideKind>,
    ) -> Result<()> {
        let mut t = self.tables.write().await;
        require_same_gene(&t, mutation_id, group_id, TABLE_OVERRIDES)?;
        t.overrides
            .retain(|o| !(o.mutation_id == mutation_id && o.group_id == group_id));
        if let Some(kind) = kind {
            t.overrides.push(MutationGroupOverride { mutation_id, group_id, kind });
        }
        Ok(())
    }

    /// Remove a mutation together with its links and overrides.
    pub async fn delete_mutation(&self, mutation_id: Uuid) -> Result<()> {
        let mut t = self.tables.write().await;
        let before = t.mutations.len();
        t.mutations.retain(|m| m.id != mutation_id);
        if t.mutations.len() == before {
            return Err(DbError::NotFound(format!("mutation {mutation_id}")));
        }
        t.mutation_groups.retain(|l| l.mutation_id != mutation_id);
        t.mutation_classes.retain(|l| l.mutation_id != mutation_id);
        t.overrides.retain(|o| o.mutation_id != mutation_id);
        Ok(())
    }

    // ── Risks, cancer recommendations ────────────────────────────────────────

    pub async fn insert_risk(&self, risk: Risk) -> Result<()> {
        let mut t = self.tables.write().await;
        require_gene(&t, risk.gene_id, TABLE_RISKS)?;
        t.risks.push(risk);
        Ok(())
    }

    pub async fn insert_cancer_recommendation(&self, rec: CancerRecommendation) -> Result<()> {
        let mut t = self.tables.write().await;
        require_gene(&t, rec.gene_id, TABLE_CANCER_RECOMMENDATIONS)?;
        t.cancer_recommendations.push(rec);
        Ok(())
    }
}

fn require_gene(t: &Snapshot, gene_id: Uuid, table: &'static str) -> Result<()> {
    if t.genes.iter().any(|g| g.id == gene_id) {
        Ok(())
    } else {
        Err(DbError::InvalidRow { table, message: format!("unknown gene {gene_id}") })
    }
}

fn find_mutation(t: &Snapshot, mutation_id: Uuid) -> Result<&Mutation> {
    t.mutations
        .iter()
        .find(|m| m.id == mutation_id)
        .ok_or_else(|| DbError::NotFound(format!("mutation {mutation_id}")))
}

fn require_same_gene(t: &Snapshot, mutation_id: Uuid, group_id: Uuid, table: &'static str) -> Result<()> {
    let mutation = find_mutation(t, mutation_id)?;
    let group = t
        .groups
        .iter()
        .find(|g| g.id == group_id)
        .ok_or_else(|| DbError::NotFound(format!("group {group_id}")))?;
    if group.gene_id != mutation.gene_id {
        return Err(DbError::InvalidRow {
            table,
            message: format!("group {group_id} belongs to another gene than mutation {mutation_id}"),
        });
    }
    Ok(())
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn all_genes(&self) -> Result<Vec<Gene>> {
        Ok(self.tables.read().await.genes.clone())
    }

    async fn genes_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Gene>> {
        let wanted = id_set(ids);
        let t = self.tables.read().await;
        Ok(t.genes.iter().filter(|g| wanted.contains(&g.id)).cloned().collect())
    }

    async fn genes_by_symbols(&self, symbols: &[String]) -> Result<Vec<Gene>> {
        let wanted: HashSet<String> = symbols.iter().map(|s| s.trim().to_ascii_uppercase()).collect();
        let t = self.tables.read().await;
        Ok(t
            .genes
            .iter()
            .filter(|g| wanted.contains(&g.symbol.trim().to_ascii_uppercase()))
            .cloned()
            .collect())
    }

    async fn classes_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<RecommendationClass>> {
        let wanted = id_set(gene_ids);
        let t = self.tables.read().await;
        Ok(t.classes.iter().filter(|c| wanted.contains(&c.gene_id)).cloned().collect())
    }

    async fn groups_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<RecommendationGroup>> {
        let wanted = id_set(gene_ids);
        let t = self.tables.read().await;
        Ok(t.groups.iter().filter(|g| wanted.contains(&g.gene_id)).cloned().collect())
    }

    async fn group_classes_by_groups(&self, group_ids: &[Uuid]) -> Result<Vec<GroupClassLink>> {
        let wanted = id_set(group_ids);
        let t = self.tables.read().await;
        Ok(t.group_classes.iter().filter(|l| wanted.contains(&l.group_id)).copied().collect())
    }

    async fn mutations_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Mutation>> {
        let wanted = id_set(ids);
        let t = self.tables.read().await;
        Ok(t.mutations.iter().filter(|m| wanted.contains(&m.id)).cloned().collect())
    }

    async fn mutations_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<Mutation>> {
        let wanted = id_set(gene_ids);
        let t = self.tables.read().await;
        Ok(t.mutations.iter().filter(|m| wanted.contains(&m.gene_id)).cloned().collect())
    }

    async fn mutation_groups_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationGroupLink>> {
        let wanted = id_set(mutation_ids);
        let t = self.tables.read().await;
        Ok(t.mutation_groups.iter().filter(|l| wanted.contains(&l.mutation_id)).copied().collect())
    }

    async fn mutation_classes_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationClassLink>> {
        let wanted = id_set(mutation_ids);
        let t = self.tables.read().await;
        Ok(t.mutation_classes.iter().filter(|l| wanted.contains(&l.mutation_id)).copied().collect())
    }

    async fn overrides_by_mutations(&self, mutation_ids: &[Uuid]) -> Result<Vec<MutationGroupOverride>> {
        let wanted = id_set(mutation_ids);
        let t = self.tables.read().await;
        Ok(t.overrides.iter().filter(|o| wanted.contains(&o.mutation_id)).copied().collect())
    }

    async fn risks_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<Risk>> {
        let wanted = id_set(gene_ids);
        let t = self.tables.read().await;
        Ok(t.risks.iter().filter(|r| wanted.contains(&r.gene_id)).cloned().collect())
    }

    async fn cancer_recommendations_by_genes(&self, gene_ids: &[Uuid]) -> Result<Vec<CancerRecommendation>> {
        let wanted = id_set(gene_ids);
        let t = self.tables.read().await;
        Ok(t
            .cancer_recommendations
            .iter()
            .filter(|r| wanted.contains(&r.gene_id))
            .cloned()
            .collect())
    }
}

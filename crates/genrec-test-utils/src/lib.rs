//! Shared testing utilities for the genrec workspace.
//!
//! `SnapshotBuilder` assembles row snapshots with fresh v4 ids and
//! strictly increasing `created_at` stamps, so tests can describe a
//! scenario in a few lines and still get deterministic ordering.

use chrono::{DateTime, TimeZone, Utc};
use genrec_common::entities::*;
use genrec_common::Snapshot;
use uuid::Uuid;

pub use pretty_assertions;

#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
    seq: i64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp(&mut self) -> Option<DateTime<Utc>> {
        self.seq += 1;
        Utc.timestamp_opt(1_700_000_000 + self.seq, 0).single()
    }

    // ── Bare rows (no created_at), for store-level tests ────────────────────

    pub fn gene_row(symbol: &str) -> Gene {
        Gene { id: Uuid::new_v4(), symbol: symbol.to_string(), name: None, created_at: None }
    }

    pub fn class_row(gene_id: Uuid, name: &str) -> RecommendationClass {
        RecommendationClass { id: Uuid::new_v4(), gene_id, name: name.to_string(), created_at: None }
    }

    pub fn group_row(gene_id: Uuid, age_min: Option<i32>, applies_to_all_classes: bool) -> RecommendationGroup {
        RecommendationGroup {
            id: Uuid::new_v4(),
            gene_id,
            sex: SexFilter::Any,
            age_min,
            age_max: None,
            recommendations: format!("Recommendation from age {age_min:?}"),
            applies_to_all_classes,
            created_at: None,
        }
    }

    pub fn mutation_row(gene_id: Uuid, text: &str) -> Mutation {
        Mutation {
            id: Uuid::new_v4(),
            gene_id,
            mutation: text.to_string(),
            pathogenicity: Pathogenicity::Pathogenic,
            created_at: None,
        }
    }

    pub fn cancer_rec_row(gene_id: Uuid, age_min: Option<i32>) -> CancerRecommendation {
        CancerRecommendation {
            id: Uuid::new_v4(),
            gene_id,
            sex: SexFilter::Any,
            age_min,
            age_max: None,
            recommendations: format!("Cancer follow-up from age {age_min:?}"),
            created_at: None,
        }
    }

    // ── Fluent scenario building ─────────────────────────────────────────────

    pub fn gene(&mut self, symbol: &str) -> Uuid {
        let mut row = Self::gene_row(symbol);
        row.created_at = self.stamp();
        let id = row.id;
        self.snapshot.genes.push(row);
        id
    }

    pub fn class(&mut self, gene_id: Uuid, name: &str) -> Uuid {
        let mut row = Self::class_row(gene_id, name);
        row.created_at = self.stamp();
        let id = row.id;
        self.snapshot.classes.push(row);
        id
    }

    /// A group open to any sex.
    pub fn group(&mut self, gene_id: Uuid, age_min: Option<i32>, applies_to_all_classes: bool) -> Uuid {
        self.group_for(gene_id, SexFilter::Any, age_min, applies_to_all_classes)
    }

    pub fn group_for(
        &mut self,
        gene_id: Uuid,
        sex: SexFilter,
        age_min: Option<i32>,
        applies_to_all_classes: bool,
    ) -> Uuid {
        let mut row = Self::group_row(gene_id, age_min, applies_to_all_classes);
        row.sex = sex;
        row.created_at = self.stamp();
        let id = row.id;
        self.snapshot.groups.push(row);
        id
    }

    pub fn link_group_class(&mut self, group_id: Uuid, class_id: Uuid) -> &mut Self {
        self.snapshot.group_classes.push(GroupClassLink { group_id, class_id });
        self
    }

    pub fn mutation(&mut self, gene_id: Uuid, text: &str) -> Uuid {
        let mut row = Self::mutation_row(gene_id, text);
        row.created_at = self.stamp();
        let id = row.id;
        self.snapshot.mutations.push(row);
        id
    }

    pub fn link_mutation_class(&mut self, mutation_id: Uuid, class_id: Uuid) -> &mut Self {
        self.snapshot.mutation_classes.push(MutationClassLink { mutation_id, class_id });
        self
    }

    pub fn link_mutation_group(&mut self, mutation_id: Uuid, group_id: Uuid) -> &mut Self {
        self.snapshot.mutation_groups.push(MutationGroupLink { mutation_id, group_id });
        self
    }

    pub fn set_override(&mut self, mutation_id: Uuid, group_id: Uuid, kind: OverrideKind) -> &mut Self {
        self.snapshot.overrides.push(MutationGroupOverride { mutation_id, group_id, kind });
        self
    }

    pub fn risk(&mut self, gene_id: Uuid, sex: SexFilter, text: &str) -> Uuid {
        let row = Risk {
            id: Uuid::new_v4(),
            gene_id,
            sex,
            risk: text.to_string(),
            created_at: self.stamp(),
        };
        let id = row.id;
        self.snapshot.risks.push(row);
        id
    }

    pub fn cancer_rec(&mut self, gene_id: Uuid, sex: SexFilter, age_min: Option<i32>) -> Uuid {
        let mut row = Self::cancer_rec_row(gene_id, age_min);
        row.sex = sex;
        row.created_at = self.stamp();
        let id = row.id;
        self.snapshot.cancer_recommendations.push(row);
        id
    }

    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}

//! Reference index: lookup maps built from one row snapshot.
//!
//! Built once per report generation and never mutated afterwards.
//! Rows whose foreign keys point at ids missing from the snapshot are
//! kept but simply never looked up; a missing relation reads as "none".

use std::collections::{HashMap, HashSet};

use genrec_common::entities::*;
use genrec_common::Snapshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::resolver::{GroupProfile, MutationLinks};

#[derive(Debug, Default)]
pub struct ReferenceIndex {
    genes: HashMap<Uuid, Gene>,
    gene_classes: HashMap<Uuid, Vec<RecommendationClass>>,
    gene_groups: HashMap<Uuid, Vec<RecommendationGroup>>,
    gene_mutations: HashMap<Uuid, Vec<Uuid>>,
    mutations: HashMap<Uuid, Mutation>,
    group_classes: HashMap<Uuid, HashSet<Uuid>>,
    mutation_groups: HashMap<Uuid, HashSet<Uuid>>,
    mutation_classes: HashMap<Uuid, HashSet<Uuid>>,
    mutation_overrides: HashMap<Uuid, HashMap<Uuid, OverrideKind>>,
    gene_risks: HashMap<Uuid, Vec<Risk>>,
    gene_cancer_recs: HashMap<Uuid, Vec<CancerRecommendation>>,
    empty_ids: HashSet<Uuid>,
    empty_overrides: HashMap<Uuid, OverrideKind>,
}

impl ReferenceIndex {
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut index = Self::default();

        for gene in &snapshot.genes {
            index.genes.insert(gene.id, gene.clone());
        }
        for class in &snapshot.classes {
            index.gene_classes.entry(class.gene_id).or_default().push(class.clone());
        }
        for group in &snapshot.groups {
            index.gene_groups.entry(group.gene_id).or_default().push(group.clone());
        }
        for link in &snapshot.group_classes {
            index.group_classes.entry(link.group_id).or_default().insert(link.class_id);
        }
        for mutation in &snapshot.mutations {
            index.gene_mutations.entry(mutation.gene_id).or_default().push(mutation.id);
            index.mutations.insert(mutation.id, mutation.clone());
        }
        for link in &snapshot.mutation_groups {
            index.mutation_groups.entry(link.mutation_id).or_default().insert(link.group_id);
        }
        for link in &snapshot.mutation_classes {
            index.mutation_classes.entry(link.mutation_id).or_default().insert(link.class_id);
        }
        for row in &snapshot.overrides {
            let by_group = index.mutation_overrides.entry(row.mutation_id).or_default();
            if let Some(previous) = by_group.insert(row.group_id, row.kind) {
                warn!(
                    mutation_id = %row.mutation_id,
                    group_id = %row.group_id,
                    previous = previous.as_str(),
                    kept = row.kind.as_str(),
                    "Duplicate override row; the later row wins"
                );
            }
        }
        for risk in &snapshot.risks {
            index.gene_risks.entry(risk.gene_id).or_default().push(risk.clone());
        }
        for rec in &snapshot.cancer_recommendations {
            index.gene_cancer_recs.entry(rec.gene_id).or_default().push(rec.clone());
        }

        debug!(
            genes = index.genes.len(),
            groups = snapshot.groups.len(),
            mutations = index.mutations.len(),
            overrides = snapshot.overrides.len(),
            "Built reference index"
        );

        index
    }

    pub fn gene(&self, gene_id: Uuid) -> Option<&Gene> {
        self.genes.get(&gene_id)
    }

    pub fn classes_of(&self, gene_id: Uuid) -> &[RecommendationClass] {
        self.gene_classes.get(&gene_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn groups_of(&self, gene_id: Uuid) -> &[RecommendationGroup] {
        self.gene_groups.get(&gene_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn mutation(&self, mutation_id: Uuid) -> Option<&Mutation> {
        self.mutations.get(&mutation_id)
    }

    pub fn mutations_of(&self, gene_id: Uuid) -> impl Iterator<Item = &Mutation> {
        self.gene_mutations
            .get(&gene_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.mutations.get(id))
    }

    /// Class ids explicitly linked to a group.
    pub fn group_classes(&self, group_id: Uuid) -> &HashSet<Uuid> {
        self.group_classes.get(&group_id).unwrap_or(&self.empty_ids)
    }

    pub fn risks_of(&self, gene_id: Uuid) -> &[Risk] {
        self.gene_risks.get(&gene_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cancer_recs_of(&self, gene_id: Uuid) -> &[CancerRecommendation] {
        self.gene_cancer_recs.get(&gene_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Everything the resolver needs to know about one mutation.
    pub fn mutation_links(&self, mutation_id: Uuid) -> MutationLinks<'_> {
        MutationLinks {
            manual_groups: self.mutation_groups.get(&mutation_id).unwrap_or(&self.empty_ids),
            classes: self.mutation_classes.get(&mutation_id).unwrap_or(&self.empty_ids),
            overrides: self.mutation_overrides.get(&mutation_id).unwrap_or(&self.empty_overrides),
        }
    }

    /// Everything the resolver needs to know about one group.
    pub fn group_profile<'a>(&'a self, group: &RecommendationGroup) -> GroupProfile<'a> {
        GroupProfile {
            id: group.id,
            applies_to_all_classes: group.applies_to_all_classes,
            classes: self.group_classes(group.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genrec_test_utils::SnapshotBuilder;

    #[test]
    fn test_lookups_for_unknown_ids_are_empty() {
        let index = ReferenceIndex::build(&Snapshot::default());
        let id = Uuid::new_v4();
        assert!(index.gene(id).is_none());
        assert!(index.groups_of(id).is_empty());
        assert!(index.group_classes(id).is_empty());
        assert_eq!(index.mutations_of(id).count(), 0);
        let links = index.mutation_links(id);
        assert!(links.manual_groups.is_empty());
        assert!(links.classes.is_empty());
        assert!(links.overrides.is_empty());
    }

    #[test]
    fn test_rows_are_grouped_by_owner() {
        let mut b = SnapshotBuilder::new();
        let brca1 = b.gene("BRCA1");
        let brca2 = b.gene("BRCA2");
        let c1 = b.class(brca1, "Truncating");
        let g1 = b.group(brca1, Some(25), false);
        b.group(brca2, None, true);
        b.link_group_class(g1, c1);
        let m1 = b.mutation(brca1, "c.5266dupC");
        b.link_mutation_class(m1, c1).set_override(m1, g1, OverrideKind::Include);
        let index = ReferenceIndex::build(&b.build());

        assert_eq!(index.groups_of(brca1).len(), 1);
        assert_eq!(index.groups_of(brca2).len(), 1);
        assert_eq!(index.classes_of(brca1).len(), 1);
        assert!(index.group_classes(g1).contains(&c1));
        assert_eq!(index.mutations_of(brca1).map(|m| m.id).collect::<Vec<_>>(), vec![m1]);
        let links = index.mutation_links(m1);
        assert!(links.classes.contains(&c1));
        assert_eq!(links.overrides.get(&g1), Some(&OverrideKind::Include));
    }

    #[test]
    fn test_duplicate_override_keeps_later_row() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("MLH1");
        let group = b.group(gene, None, false);
        let mutation = b.mutation(gene, "c.1852_1854del");
        b.set_override(mutation, group, OverrideKind::Include)
            .set_override(mutation, group, OverrideKind::Exclude);
        let index = ReferenceIndex::build(&b.build());
        assert_eq!(
            index.mutation_links(mutation).overrides.get(&group),
            Some(&OverrideKind::Exclude)
        );
    }
}

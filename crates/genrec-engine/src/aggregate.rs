//! Per-gene aggregation: turns one gene entry into one report box.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use genrec_common::entities::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::index::ReferenceIndex;
use crate::resolver::{resolve_inclusion, InclusionSource};

/// Patient attributes the filters run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: u32,
    pub sex: PatientSex,
}

/// Cancer status of the patient and the genes the cancer is linked to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancerContext {
    pub positive: bool,
    pub linked_to_gene: bool,
    pub gene_ids: Vec<Uuid>,
}

impl CancerContext {
    /// Genes whose cancer recommendations apply; empty unless the patient
    /// is cancer-positive and the cancer is linked to a gene.
    pub fn linked_gene_ids(&self) -> &[Uuid] {
        if self.positive && self.linked_to_gene {
            &self.gene_ids
        } else {
            &[]
        }
    }

    pub fn wants_cancer_recs(&self, gene_id: Uuid) -> bool {
        self.linked_gene_ids().contains(&gene_id)
    }
}

/// One gene entry of the form, resolved to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneSelection {
    pub gene_id: Uuid,
    pub mutation_ids: Vec<Uuid>,
}

/// A group included for the entry, with where the inclusion came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludedGroup {
    pub group: RecommendationGroup,
    /// Union of the sources across the entry's mutations
    pub sources: BTreeSet<InclusionSource>,
    /// Selected mutations that include the group, in selection order
    pub via_mutations: Vec<Uuid>,
}

/// One box of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportBox {
    pub gene: Gene,
    pub mutations: Vec<Mutation>,
    pub risks: Vec<Risk>,
    pub done_recs: Vec<IncludedGroup>,
    pub future_recs: Vec<IncludedGroup>,
    pub cancer_done_recs: Vec<CancerRecommendation>,
    pub cancer_future_recs: Vec<CancerRecommendation>,
    /// Produced only because the gene is cancer-linked; no mutation entry
    pub cancer_only: bool,
}

// ── Age partition ─────────────────────────────────────────────────────────────

/// Anything with a minimum age that can be split into done / future.
pub trait AgeGated {
    fn age_min(&self) -> Option<i32>;
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn id(&self) -> Uuid;

    /// Applicable now: no lower bound, or the bound is already reached.
    fn is_due(&self, age: u32) -> bool {
        match self.age_min() {
            None => true,
            Some(min) => i64::from(min) <= i64::from(age),
        }
    }
}

impl AgeGated for RecommendationGroup {
    fn age_min(&self) -> Option<i32> { self.age_min }
    fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }
    fn id(&self) -> Uuid { self.id }
}

impl AgeGated for CancerRecommendation {
    fn age_min(&self) -> Option<i32> { self.age_min }
    fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }
    fn id(&self) -> Uuid { self.id }
}

impl AgeGated for IncludedGroup {
    fn age_min(&self) -> Option<i32> { self.group.age_min }
    fn created_at(&self) -> Option<DateTime<Utc>> { self.group.created_at }
    fn id(&self) -> Uuid { self.group.id }
}

/// Split into (done, future), each ascending by `age_min` with a missing
/// minimum first. `age_max` plays no part.
pub fn partition_by_age<T: AgeGated>(items: Vec<T>, age: u32) -> (Vec<T>, Vec<T>) {
    let (mut done, mut future): (Vec<T>, Vec<T>) = items.into_iter().partition(|i| i.is_due(age));
    let key = |i: &T| (i.age_min(), i.created_at(), i.id());
    done.sort_by_key(key);
    future.sort_by_key(key);
    (done, future)
}

fn cancer_recs_for(index: &ReferenceIndex, gene_id: Uuid, patient: &PatientProfile) -> (Vec<CancerRecommendation>, Vec<CancerRecommendation>) {
    let recs: Vec<CancerRecommendation> = index
        .cancer_recs_of(gene_id)
        .iter()
        .filter(|r| r.sex.matches(patient.sex))
        .cloned()
        .collect();
    partition_by_age(recs, patient.age)
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Groups of the gene included by at least one of the given mutations,
/// keyed by group id.
pub fn included_groups(
    index: &ReferenceIndex,
    gene_id: Uuid,
    mutation_ids: &[Uuid],
) -> BTreeMap<Uuid, IncludedGroup> {
    let mut included: BTreeMap<Uuid, IncludedGroup> = BTreeMap::new();
    for group in index.groups_of(gene_id) {
        let profile = index.group_profile(group);
        for &mutation_id in mutation_ids {
            let inclusion = resolve_inclusion(&index.mutation_links(mutation_id), &profile);
            if !inclusion.is_included() {
                continue;
            }
            let entry = included.entry(group.id).or_insert_with(|| IncludedGroup {
                group: group.clone(),
                sources: BTreeSet::new(),
                via_mutations: Vec::new(),
            });
            entry.sources.extend(inclusion.sources());
            entry.via_mutations.push(mutation_id);
        }
    }
    included
}

/// Build the box of one gene entry. Returns `None` when the gene itself
/// is missing from the snapshot.
pub fn aggregate_gene(
    index: &ReferenceIndex,
    selection: &GeneSelection,
    patient: &PatientProfile,
    cancer: &CancerContext,
) -> Option<ReportBox> {
    let Some(gene) = index.gene(selection.gene_id) else {
        debug!(gene_id = %selection.gene_id, "Gene missing from snapshot, entry skipped");
        return None;
    };

    let mut mutations: Vec<Mutation> = Vec::new();
    for &mutation_id in &selection.mutation_ids {
        match index.mutation(mutation_id) {
            Some(m) if m.gene_id == gene.id => {
                if !mutations.iter().any(|seen| seen.id == m.id) {
                    mutations.push(m.clone());
                }
            }
            Some(_) => debug!(%mutation_id, gene = %gene.symbol, "Mutation belongs to another gene, dropped"),
            None => debug!(%mutation_id, gene = %gene.symbol, "Mutation missing from snapshot, dropped"),
        }
    }
    let mutation_ids: Vec<Uuid> = mutations.iter().map(|m| m.id).collect();

    let groups: Vec<IncludedGroup> = included_groups(index, gene.id, &mutation_ids)
        .into_values()
        .filter(|g| g.group.sex.matches(patient.sex))
        .collect();
    let (done_recs, future_recs) = partition_by_age(groups, patient.age);

    let mut risks: Vec<Risk> = index
        .risks_of(gene.id)
        .iter()
        .filter(|r| r.sex.matches(patient.sex))
        .cloned()
        .collect();
    risks.sort_by_key(|r| (r.created_at, r.id));

    let (cancer_done_recs, cancer_future_recs) = if cancer.wants_cancer_recs(gene.id) {
        cancer_recs_for(index, gene.id, patient)
    } else {
        (Vec::new(), Vec::new())
    };

    Some(ReportBox {
        gene: gene.clone(),
        mutations,
        risks,
        done_recs,
        future_recs,
        cancer_done_recs,
        cancer_future_recs,
        cancer_only: false,
    })
}

/// Box for a cancer-linked gene without a mutation entry: cancer
/// recommendations only.
pub fn cancer_only_box(index: &ReferenceIndex, gene_id: Uuid, patient: &PatientProfile) -> Option<ReportBox> {
    let Some(gene) = index.gene(gene_id) else {
        debug!(%gene_id, "Cancer-linked gene missing from snapshot, skipped");
        return None;
    };
    let (cancer_done_recs, cancer_future_recs) = cancer_recs_for(index, gene_id, patient);
    Some(ReportBox {
        gene: gene.clone(),
        mutations: Vec::new(),
        risks: Vec::new(),
        done_recs: Vec::new(),
        future_recs: Vec::new(),
        cancer_done_recs,
        cancer_future_recs,
        cancer_only: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use genrec_test_utils::SnapshotBuilder;

    fn patient(age: u32, sex: PatientSex) -> PatientProfile {
        PatientProfile { age, sex }
    }

    #[test]
    fn test_null_age_min_is_always_done() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("BRCA1");
        let group = b.group(gene, None, true);
        let snapshot = b.build();
        let row = snapshot.groups.iter().find(|g| g.id == group).unwrap().clone();
        for age in [0, 17, 99] {
            let (done, future) = partition_by_age(vec![row.clone()], age);
            assert_eq!(done.len(), 1);
            assert!(future.is_empty());
        }
    }

    #[test]
    fn test_age_min_boundary() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("BRCA1");
        b.group(gene, Some(10), true);
        let row = b.build().groups.remove(0);

        let (done, future) = partition_by_age(vec![row.clone()], 9);
        assert!(done.is_empty());
        assert_eq!(future.len(), 1);

        let (done, _) = partition_by_age(vec![row.clone()], 10);
        assert_eq!(done.len(), 1);
        let (done, _) = partition_by_age(vec![row], 11);
        assert_eq!(done.len(), 1);
    }

    #[test]
    fn test_partition_orders_by_age_min_nulls_first() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("BRCA2");
        b.group(gene, Some(30), true);
        b.group(gene, None, true);
        b.group(gene, Some(20), true);
        b.group(gene, Some(60), true);
        b.group(gene, Some(45), true);
        let rows = b.build().groups;

        let (done, future) = partition_by_age(rows, 35);
        let done_ages: Vec<Option<i32>> = done.iter().map(|g| g.age_min).collect();
        let future_ages: Vec<Option<i32>> = future.iter().map(|g| g.age_min).collect();
        assert_eq!(done_ages, vec![None, Some(20), Some(30)]);
        assert_eq!(future_ages, vec![Some(45), Some(60)]);
    }

    #[test]
    fn test_age_max_is_ignored() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("PALB2");
        b.group(gene, Some(20), true);
        let mut row = b.build().groups.remove(0);
        row.age_max = Some(25);
        let (done, future) = partition_by_age(vec![row], 70);
        assert_eq!(done.len(), 1);
        assert!(future.is_empty());
    }

    #[test]
    fn test_missing_and_foreign_mutations_are_dropped() {
        let mut b = SnapshotBuilder::new();
        let brca1 = b.gene("BRCA1");
        let brca2 = b.gene("BRCA2");
        let own = b.mutation(brca1, "c.68_69del");
        let foreign = b.mutation(brca2, "c.5946del");
        b.group(brca1, None, true);
        let index = ReferenceIndex::build(&b.build());

        let selection = GeneSelection { gene_id: brca1, mutation_ids: vec![Uuid::new_v4(), foreign, own, own] };
        let boxed = aggregate_gene(&index, &selection, &patient(40, PatientSex::Female), &CancerContext::default())
            .unwrap();
        assert_eq!(boxed.mutations.iter().map(|m| m.id).collect::<Vec<_>>(), vec![own]);
        assert_eq!(boxed.done_recs.len(), 1);
        assert_eq!(boxed.done_recs[0].via_mutations, vec![own]);
    }

    #[test]
    fn test_missing_gene_yields_no_box() {
        let index = ReferenceIndex::build(&Default::default());
        let selection = GeneSelection { gene_id: Uuid::new_v4(), mutation_ids: vec![] };
        assert!(aggregate_gene(&index, &selection, &patient(30, PatientSex::Male), &CancerContext::default()).is_none());
    }

    #[test]
    fn test_risks_filtered_by_sex_only() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("BRCA2");
        b.risk(gene, SexFilter::Male, "Prostate cancer risk");
        b.risk(gene, SexFilter::Female, "Ovarian cancer risk");
        b.risk(gene, SexFilter::Any, "Pancreatic cancer risk");
        let index = ReferenceIndex::build(&b.build());
        let selection = GeneSelection { gene_id: gene, mutation_ids: vec![] };

        let boxed = aggregate_gene(&index, &selection, &patient(5, PatientSex::Male), &CancerContext::default()).unwrap();
        let texts: Vec<&str> = boxed.risks.iter().map(|r| r.risk.as_str()).collect();
        assert_eq!(texts, vec!["Prostate cancer risk", "Pancreatic cancer risk"]);
    }

    #[test]
    fn test_cancer_recs_need_positive_and_linked() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("MSH2");
        b.cancer_rec(gene, SexFilter::Any, None);
        b.cancer_rec(gene, SexFilter::Any, Some(50));
        let index = ReferenceIndex::build(&b.build());
        let selection = GeneSelection { gene_id: gene, mutation_ids: vec![] };
        let p = patient(40, PatientSex::Female);

        let not_linked = CancerContext { positive: true, linked_to_gene: false, gene_ids: vec![gene] };
        let boxed = aggregate_gene(&index, &selection, &p, &not_linked).unwrap();
        assert!(boxed.cancer_done_recs.is_empty());

        let linked = CancerContext { positive: true, linked_to_gene: true, gene_ids: vec![gene] };
        let boxed = aggregate_gene(&index, &selection, &p, &linked).unwrap();
        assert_eq!(boxed.cancer_done_recs.len(), 1);
        assert_eq!(boxed.cancer_future_recs.len(), 1);
        assert!(!boxed.cancer_only);
    }

    #[test]
    fn test_cancer_only_box_shape() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("APC");
        b.cancer_rec(gene, SexFilter::Male, None);
        b.cancer_rec(gene, SexFilter::Any, Some(12));
        b.risk(gene, SexFilter::Any, "Colorectal polyposis");
        let index = ReferenceIndex::build(&b.build());

        let boxed = cancer_only_box(&index, gene, &patient(30, PatientSex::Female)).unwrap();
        assert!(boxed.cancer_only);
        assert!(boxed.mutations.is_empty());
        assert!(boxed.risks.is_empty());
        assert!(boxed.done_recs.is_empty() && boxed.future_recs.is_empty());
        assert_eq!(boxed.cancer_done_recs.len(), 1);
        assert_eq!(boxed.cancer_done_recs[0].age_min, Some(12));
    }
}

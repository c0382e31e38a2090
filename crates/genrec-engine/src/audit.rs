//! Consistency audit of a full snapshot, used by `genrec check`.
//!
//! The store does not enforce these rules; reports stay well-defined when
//! they are broken, but the result is rarely what the editor meant.

use std::collections::{HashMap, HashSet};

use genrec_common::Snapshot;
use serde::Serialize;
use uuid::Uuid;

use genrec_db::schema::{
    TABLE_GROUPS, TABLE_GROUP_CLASSES, TABLE_MUTATIONS, TABLE_MUTATION_CLASSES, TABLE_MUTATION_GROUPS,
    TABLE_OVERRIDES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Class links on a group that already applies to all classes
    RedundantClassLink,
    /// Link between rows of two different genes
    CrossGeneLink,
    /// Link or row pointing at an id absent from the snapshot
    DanglingReference,
    /// More than one override for the same (mutation, group)
    DuplicateOverride,
    /// Same mutation text twice within one gene
    DuplicateMutation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub table: &'static str,
    pub message: String,
}

fn finding(kind: FindingKind, table: &'static str, message: String) -> Finding {
    Finding { kind, table, message }
}

pub fn audit_snapshot(snapshot: &Snapshot) -> Vec<Finding> {
    let mut findings = Vec::new();

    let genes: HashSet<Uuid> = snapshot.genes.iter().map(|g| g.id).collect();
    let class_gene: HashMap<Uuid, Uuid> = snapshot.classes.iter().map(|c| (c.id, c.gene_id)).collect();
    let group_gene: HashMap<Uuid, Uuid> = snapshot.groups.iter().map(|g| (g.id, g.gene_id)).collect();
    let mutation_gene: HashMap<Uuid, Uuid> = snapshot.mutations.iter().map(|m| (m.id, m.gene_id)).collect();
    let applies_to_all: HashSet<Uuid> = snapshot
        .groups
        .iter()
        .filter(|g| g.applies_to_all_classes)
        .map(|g| g.id)
        .collect();

    for group in &snapshot.groups {
        if !genes.contains(&group.gene_id) {
            findings.push(finding(
                FindingKind::DanglingReference,
                TABLE_GROUPS,
                format!("group {} references missing gene {}", group.id, group.gene_id),
            ));
        }
    }

    let mut seen_texts: HashSet<(Uuid, String)> = HashSet::new();
    for m in &snapshot.mutations {
        if !seen_texts.insert((m.gene_id, m.mutation.trim().to_string())) {
            findings.push(finding(
                FindingKind::DuplicateMutation,
                TABLE_MUTATIONS,
                format!("mutation '{}' appears more than once for gene {}", m.mutation.trim(), m.gene_id),
            ));
        }
    }

    for link in &snapshot.group_classes {
        if applies_to_all.contains(&link.group_id) {
            findings.push(finding(
                FindingKind::RedundantClassLink,
                TABLE_GROUP_CLASSES,
                format!("group {} applies to all classes but links class {}", link.group_id, link.class_id),
            ));
        }
        check_pair(
            &mut findings,
            TABLE_GROUP_CLASSES,
            ("group", link.group_id, group_gene.get(&link.group_id)),
            ("class", link.class_id, class_gene.get(&link.class_id)),
        );
    }

    for link in &snapshot.mutation_classes {
        check_pair(
            &mut findings,
            TABLE_MUTATION_CLASSES,
            ("mutation", link.mutation_id, mutation_gene.get(&link.mutation_id)),
            ("class", link.class_id, class_gene.get(&link.class_id)),
        );
    }

    for link in &snapshot.mutation_groups {
        check_pair(
            &mut findings,
            TABLE_MUTATION_GROUPS,
            ("mutation", link.mutation_id, mutation_gene.get(&link.mutation_id)),
            ("group", link.group_id, group_gene.get(&link.group_id)),
        );
    }

    let mut seen_overrides: HashSet<(Uuid, Uuid)> = HashSet::new();
    for row in &snapshot.overrides {
        if !seen_overrides.insert((row.mutation_id, row.group_id)) {
            findings.push(finding(
                FindingKind::DuplicateOverride,
                TABLE_OVERRIDES,
                format!("mutation {} has more than one override for group {}", row.mutation_id, row.group_id),
            ));
        }
        check_pair(
            &mut findings,
            TABLE_OVERRIDES,
            ("mutation", row.mutation_id, mutation_gene.get(&row.mutation_id)),
            ("group", row.group_id, group_gene.get(&row.group_id)),
        );
    }

    findings
}

/// Both ends of a link must exist and belong to the same gene.
fn check_pair(
    findings: &mut Vec<Finding>,
    table: &'static str,
    left: (&str, Uuid, Option<&Uuid>),
    right: (&str, Uuid, Option<&Uuid>),
) {
    for (what, id, gene) in [left, right] {
        if gene.is_none() {
            findings.push(finding(FindingKind::DanglingReference, table, format!("{what} {id} does not exist")));
        }
    }
    if let (Some(a), Some(b)) = (left.2, right.2) {
        if a != b {
            findings.push(finding(
                FindingKind::CrossGeneLink,
                table,
                format!("{} {} and {} {} belong to different genes", left.0, left.1, right.0, right.1),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genrec_common::entities::OverrideKind;
    use genrec_test_utils::SnapshotBuilder;

    fn kinds(findings: &[Finding]) -> Vec<FindingKind> {
        let mut k: Vec<FindingKind> = findings.iter().map(|f| f.kind).collect();
        k.sort();
        k
    }

    #[test]
    fn test_clean_snapshot_has_no_findings() {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("BRCA1");
        let class = b.class(gene, "Truncating");
        let group = b.group(gene, Some(25), false);
        let mutation = b.mutation(gene, "c.68_69del");
        b.link_group_class(group, class)
            .link_mutation_class(mutation, class)
            .set_override(mutation, group, OverrideKind::Exclude);
        assert!(audit_snapshot(&b.build()).is_empty());
    }

    #[test]
    fn test_each_rule_is_reported() {
        let mut b = SnapshotBuilder::new();
        let brca1 = b.gene("BRCA1");
        let brca2 = b.gene("BRCA2");
        let all = b.group(brca1, None, true);
        let class1 = b.class(brca1, "Missense");
        let class2 = b.class(brca2, "Missense");
        let m1 = b.mutation(brca1, "c.181T>G");
        b.mutation(brca1, " c.181T>G");
        b.link_group_class(all, class1)
            .link_mutation_class(m1, class2)
            .link_mutation_group(m1, Uuid::new_v4())
            .set_override(m1, all, OverrideKind::Include)
            .set_override(m1, all, OverrideKind::Exclude);

        let findings = audit_snapshot(&b.build());
        assert_eq!(
            kinds(&findings),
            vec![
                FindingKind::RedundantClassLink,
                FindingKind::CrossGeneLink,
                FindingKind::DanglingReference,
                FindingKind::DuplicateOverride,
                FindingKind::DuplicateMutation,
            ]
        );
    }
}

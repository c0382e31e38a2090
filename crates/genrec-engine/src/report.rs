//! Report assembly across genes.

use genrec_common::Snapshot;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{aggregate_gene, cancer_only_box, CancerContext, GeneSelection, PatientProfile, ReportBox};
use crate::index::ReferenceIndex;

/// Finished report: one box per gene, ordered by gene symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub patient: PatientProfile,
    pub boxes: Vec<ReportBox>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn find(&self, symbol: &str) -> Option<&ReportBox> {
        self.boxes.iter().find(|b| b.gene.symbol == symbol)
    }
}

/// Fold selections naming the same gene into one, unioning mutation ids
/// and keeping first-seen order.
pub fn merge_selections(selections: &[GeneSelection]) -> Vec<GeneSelection> {
    let mut merged: Vec<GeneSelection> = Vec::new();
    for selection in selections {
        let slot = match merged.iter().position(|s| s.gene_id == selection.gene_id) {
            Some(i) => i,
            None => {
                merged.push(GeneSelection { gene_id: selection.gene_id, mutation_ids: Vec::new() });
                merged.len() - 1
            }
        };
        let target = &mut merged[slot].mutation_ids;
        for id in &selection.mutation_ids {
            if !target.contains(id) {
                target.push(*id);
            }
        }
    }
    merged
}

/// Build every box and order them by gene symbol.
///
/// A cancer-linked gene that also has a mutation entry gets its cancer
/// recommendations inside the entry's box; only the remaining linked
/// genes produce cancer-only boxes.
pub fn assemble_report(
    index: &ReferenceIndex,
    selections: &[GeneSelection],
    patient: &PatientProfile,
    cancer: &CancerContext,
) -> Report {
    let selections = merge_selections(selections);

    let mut boxes: Vec<ReportBox> = selections
        .iter()
        .filter_map(|s| aggregate_gene(index, s, patient, cancer))
        .collect();

    let mut seen: Vec<Uuid> = selections.iter().map(|s| s.gene_id).collect();
    for &gene_id in cancer.linked_gene_ids() {
        if seen.contains(&gene_id) {
            continue;
        }
        seen.push(gene_id);
        if let Some(b) = cancer_only_box(index, gene_id, patient) {
            boxes.push(b);
        }
    }

    boxes.sort_by(|a, b| a.gene.symbol.cmp(&b.gene.symbol).then(a.gene.id.cmp(&b.gene.id)));

    Report { patient: *patient, boxes }
}

/// Pure entry point: snapshot in, report out.
pub fn build_report(
    snapshot: &Snapshot,
    selections: &[GeneSelection],
    patient: &PatientProfile,
    cancer: &CancerContext,
) -> Report {
    let index = ReferenceIndex::build(snapshot);
    assemble_report(&index, selections, patient, cancer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genrec_common::entities::{PatientSex, SexFilter};
    use genrec_test_utils::SnapshotBuilder;

    #[test]
    fn test_merge_selections_unions_mutations() {
        let gene = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (m1, m2) = (Uuid::new_v4(), Uuid::new_v4());
        let merged = merge_selections(&[
            GeneSelection { gene_id: gene, mutation_ids: vec![m1] },
            GeneSelection { gene_id: other, mutation_ids: vec![] },
            GeneSelection { gene_id: gene, mutation_ids: vec![m2, m1] },
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].mutation_ids, vec![m1, m2]);
        assert_eq!(merged[1].gene_id, other);
    }

    #[test]
    fn test_boxes_sorted_by_symbol() {
        let mut b = SnapshotBuilder::new();
        let tp53 = b.gene("TP53");
        let atm = b.gene("ATM");
        let chek2 = b.gene("CHEK2");
        b.cancer_rec(chek2, SexFilter::Any, None);
        let snapshot = b.build();

        let patient = PatientProfile { age: 50, sex: PatientSex::Male };
        let cancer = CancerContext { positive: true, linked_to_gene: true, gene_ids: vec![chek2] };
        let selections = vec![
            GeneSelection { gene_id: tp53, mutation_ids: vec![] },
            GeneSelection { gene_id: atm, mutation_ids: vec![] },
        ];
        let report = build_report(&snapshot, &selections, &patient, &cancer);
        let symbols: Vec<&str> = report.boxes.iter().map(|b| b.gene.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ATM", "CHEK2", "TP53"]);
        assert!(report.find("CHEK2").unwrap().cancer_only);
    }

    #[test]
    fn test_symbol_order_is_case_sensitive() {
        let mut b = SnapshotBuilder::new();
        let lower = b.gene("c11orf30");
        let upper = b.gene("EMSY");
        let snapshot = b.build();
        let patient = PatientProfile { age: 50, sex: PatientSex::Female };
        let selections = vec![
            GeneSelection { gene_id: lower, mutation_ids: vec![] },
            GeneSelection { gene_id: upper, mutation_ids: vec![] },
        ];
        let report = build_report(&snapshot, &selections, &patient, &CancerContext::default());
        assert_eq!(report.boxes[0].gene.symbol, "EMSY");
    }
}

//! Row snapshot handed to the resolution core.
//!
//! A snapshot is a plain bag of rows, one list per table. It doubles as
//! the on-disk fixture format: every table appears as a top-level list
//! named after the table.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::*;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub genes: Vec<Gene>,
    #[serde(default, rename = "recommendation_classes")]
    pub classes: Vec<RecommendationClass>,
    #[serde(default, rename = "recommendation_groups")]
    pub groups: Vec<RecommendationGroup>,
    #[serde(default, rename = "recommendation_group_classes")]
    pub group_classes: Vec<GroupClassLink>,
    #[serde(default, rename = "gene_mutations")]
    pub mutations: Vec<Mutation>,
    #[serde(default, rename = "gene_mutation_groups")]
    pub mutation_groups: Vec<MutationGroupLink>,
    #[serde(default, rename = "gene_mutation_classes")]
    pub mutation_classes: Vec<MutationClassLink>,
    #[serde(default, rename = "gene_mutation_group_overrides")]
    pub overrides: Vec<MutationGroupOverride>,
    #[serde(default, rename = "gene_risks")]
    pub risks: Vec<Risk>,
    #[serde(default, rename = "gene_cancer_recommendations")]
    pub cancer_recommendations: Vec<CancerRecommendation>,
}

impl Snapshot {
    /// Load from a YAML or JSON file, chosen by extension (YAML otherwise).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let snapshot = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(snapshot)
    }

    /// Total rows across all tables.
    pub fn row_count(&self) -> usize {
        self.genes.len()
            + self.classes.len()
            + self.groups.len()
            + self.group_classes.len()
            + self.mutations.len()
            + self.mutation_groups.len()
            + self.mutation_classes.len()
            + self.overrides.len()
            + self.risks.len()
            + self.cancer_recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_uses_table_names() {
        let yaml = r#"
genes:
  - id: 6f1c1a4e-2a51-4d4f-9a11-5b1f5b2a0d01
    symbol: BRCA1
gene_risks:
  - id: 6f1c1a4e-2a51-4d4f-9a11-5b1f5b2a0d03
    gene_id: 6f1c1a4e-2a51-4d4f-9a11-5b1f5b2a0d01
    sex: F
    risk: Elevated breast cancer risk
"#;
        let snapshot: Snapshot = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(snapshot.genes.len(), 1);
        assert_eq!(snapshot.risks[0].sex, SexFilter::Female);
        assert!(snapshot.groups.is_empty());
        assert_eq!(snapshot.row_count(), 2);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(Snapshot::default().is_empty());
    }
}

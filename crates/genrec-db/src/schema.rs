//! Table names of the external recommendation store.

use genrec_common::Snapshot;

pub const TABLE_GENES: &str = "genes";
pub const TABLE_CLASSES: &str = "recommendation_classes";
pub const TABLE_GROUPS: &str = "recommendation_groups";
pub const TABLE_GROUP_CLASSES: &str = "recommendation_group_classes";
pub const TABLE_MUTATIONS: &str = "gene_mutations";
pub const TABLE_MUTATION_GROUPS: &str = "gene_mutation_groups";
pub const TABLE_MUTATION_CLASSES: &str = "gene_mutation_classes";
pub const TABLE_OVERRIDES: &str = "gene_mutation_group_overrides";
pub const TABLE_RISKS: &str = "gene_risks";
pub const TABLE_CANCER_RECOMMENDATIONS: &str = "gene_cancer_recommendations";

/// Every table, in dependency order (parents first).
pub const ALL_TABLES: [&str; 10] = [
    TABLE_GENES,
    TABLE_CLASSES,
    TABLE_GROUPS,
    TABLE_GROUP_CLASSES,
    TABLE_MUTATIONS,
    TABLE_MUTATION_GROUPS,
    TABLE_MUTATION_CLASSES,
    TABLE_OVERRIDES,
    TABLE_RISKS,
    TABLE_CANCER_RECOMMENDATIONS,
];

/// Row count per table, in [`ALL_TABLES`] order.
pub fn table_counts(snapshot: &Snapshot) -> Vec<(&'static str, usize)> {
    let counts = [
        snapshot.genes.len(),
        snapshot.classes.len(),
        snapshot.groups.len(),
        snapshot.group_classes.len(),
        snapshot.mutations.len(),
        snapshot.mutation_groups.len(),
        snapshot.mutation_classes.len(),
        snapshot.overrides.len(),
        snapshot.risks.len(),
        snapshot.cancer_recommendations.len(),
    ];
    ALL_TABLES.iter().copied().zip(counts).collect()
}

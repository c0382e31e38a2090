use std::collections::{BTreeSet, HashMap, HashSet};

use genrec_common::entities::{OverrideKind, PatientSex, SexFilter};
use genrec_engine::aggregate::{included_groups, partition_by_age};
use genrec_engine::resolver::{resolve_inclusion, GroupProfile, MutationLinks};
use genrec_engine::ReferenceIndex;
use genrec_test_utils::SnapshotBuilder;
use proptest::prelude::*;
use uuid::Uuid;

fn ids(bits: u8) -> HashSet<Uuid> {
    (0..6u128).filter(|i| bits & (1 << i) != 0).map(Uuid::from_u128).collect()
}

fn group_id() -> Uuid {
    Uuid::from_u128(1_000)
}

fn resolve(
    manual: bool,
    mutation_classes: u8,
    group_classes: u8,
    applies_to_all: bool,
    kind: Option<OverrideKind>,
) -> bool {
    let manual_groups: HashSet<Uuid> = if manual { [group_id()].into() } else { HashSet::new() };
    let classes = ids(mutation_classes);
    let overrides: HashMap<Uuid, OverrideKind> = kind.into_iter().map(|k| (group_id(), k)).collect();
    let group_classes = ids(group_classes);
    let links = MutationLinks { manual_groups: &manual_groups, classes: &classes, overrides: &overrides };
    let group = GroupProfile { id: group_id(), applies_to_all_classes: applies_to_all, classes: &group_classes };
    resolve_inclusion(&links, &group).is_included()
}

fn sex_filter() -> impl Strategy<Value = SexFilter> {
    prop_oneof![Just(SexFilter::Male), Just(SexFilter::Female), Just(SexFilter::Any)]
}

proptest! {
    #[test]
    fn exclude_override_always_wins(manual: bool, mc in 0u8..64, gc in 0u8..64, all: bool) {
        prop_assert!(!resolve(manual, mc, gc, all, Some(OverrideKind::Exclude)));
    }

    #[test]
    fn include_override_always_wins(manual: bool, mc in 0u8..64, gc in 0u8..64, all: bool) {
        prop_assert!(resolve(manual, mc, gc, all, Some(OverrideKind::Include)));
    }

    #[test]
    fn no_override_is_auto_or_manual(manual: bool, mc in 0u8..64, gc in 0u8..64, all: bool) {
        let overlap = mc & gc != 0;
        prop_assert_eq!(resolve(manual, mc, gc, all, None), all || overlap || manual);
    }

    #[test]
    fn inclusion_is_union_over_mutations(
        groups in prop::collection::vec((any::<bool>(), 0u8..8), 1..6),
        m1_classes in 0u8..8,
        m2_classes in 0u8..8,
        m1_manual in 0u8..64,
        overrides in prop::collection::vec((any::<bool>(), 0usize..6, any::<bool>()), 0..6),
    ) {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("BRCA1");
        let classes: Vec<Uuid> = (0..3).map(|i| b.class(gene, &format!("C{i}"))).collect();
        let group_ids: Vec<Uuid> = groups.iter().map(|(all, _)| b.group(gene, None, *all)).collect();
        for (g, (_, bits)) in group_ids.iter().zip(&groups) {
            for (i, c) in classes.iter().enumerate() {
                if bits & (1 << i) != 0 {
                    b.link_group_class(*g, *c);
                }
            }
        }
        let m1 = b.mutation(gene, "m1");
        let m2 = b.mutation(gene, "m2");
        for (m, bits) in [(m1, m1_classes), (m2, m2_classes)] {
            for (i, c) in classes.iter().enumerate() {
                if bits & (1 << i) != 0 {
                    b.link_mutation_class(m, *c);
                }
            }
        }
        for (i, g) in group_ids.iter().enumerate() {
            if m1_manual & (1 << i) != 0 {
                b.link_mutation_group(m1, *g);
            }
        }
        for (first, slot, exclude) in overrides {
            if let Some(g) = group_ids.get(slot) {
                let kind = if exclude { OverrideKind::Exclude } else { OverrideKind::Include };
                b.set_override(if first { m1 } else { m2 }, *g, kind);
            }
        }
        let index = ReferenceIndex::build(&b.build());

        let keys = |mutations: &[Uuid]| -> BTreeSet<Uuid> {
            included_groups(&index, gene, mutations).into_keys().collect()
        };
        let both = keys(&[m1, m2]);
        let union: BTreeSet<Uuid> = keys(&[m1]).union(&keys(&[m2])).copied().collect();
        prop_assert_eq!(&both, &union);
        prop_assert_eq!(both, keys(&[m2, m1]));
    }

    #[test]
    fn sex_filter_matches(filter in sex_filter()) {
        for patient in [PatientSex::Male, PatientSex::Female] {
            let expected = match filter {
                SexFilter::Any => true,
                SexFilter::Male => patient == PatientSex::Male,
                SexFilter::Female => patient == PatientSex::Female,
            };
            prop_assert_eq!(filter.matches(patient), expected);
        }
    }

    #[test]
    fn age_partition_respects_age_min(ages in prop::collection::vec(prop::option::of(0i32..90), 0..12), age in 0u32..100) {
        let mut b = SnapshotBuilder::new();
        let gene = b.gene("TP53");
        for min in &ages {
            b.group(gene, *min, true);
        }
        let rows = b.build().groups;
        let total = rows.len();
        let (done, future) = partition_by_age(rows, age);

        prop_assert_eq!(done.len() + future.len(), total);
        for g in &done {
            prop_assert!(g.age_min.map_or(true, |m| i64::from(m) <= i64::from(age)));
        }
        for g in &future {
            prop_assert!(g.age_min.is_some_and(|m| i64::from(m) > i64::from(age)));
        }
        prop_assert!(done.windows(2).all(|w| w[0].age_min <= w[1].age_min));
        prop_assert!(future.windows(2).all(|w| w[0].age_min <= w[1].age_min));
    }
}

//! Inclusion resolution for a single (mutation, group) pair.
//!
//! Precedence, strongest first:
//! 1. an `exclude` override: never included
//! 2. an `include` override: always included
//! 3. automatic inclusion: the group applies to all classes, or shares a class with the mutation
//! 4. manual inclusion: the mutation links the group directly
//!
//! Absent an override the group is included when (3) or (4) holds.

use std::collections::{HashMap, HashSet};

use genrec_common::entities::{OverrideKind, RecommendationGroup};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::index::ReferenceIndex;

/// What the resolver knows about one mutation.
#[derive(Debug, Clone, Copy)]
pub struct MutationLinks<'a> {
    /// Groups the mutation includes by direct link
    pub manual_groups: &'a HashSet<Uuid>,
    /// Classes the mutation belongs to
    pub classes: &'a HashSet<Uuid>,
    /// Explicit decisions keyed by group id
    pub overrides: &'a HashMap<Uuid, OverrideKind>,
}

/// What the resolver knows about one group.
#[derive(Debug, Clone, Copy)]
pub struct GroupProfile<'a> {
    pub id: Uuid,
    pub applies_to_all_classes: bool,
    /// Explicitly linked classes; irrelevant when `applies_to_all_classes`
    pub classes: &'a HashSet<Uuid>,
}

/// Why a group ended up included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionSource {
    Override,
    AppliesToAll,
    ClassMatch,
    ManualLink,
}

/// Every signal observed for a pair. The verdict is [`Inclusion::is_included`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub override_kind: Option<OverrideKind>,
    pub applies_to_all: bool,
    pub class_match: bool,
    pub manual: bool,
}

impl Inclusion {
    /// Automatic inclusion through classes.
    pub fn auto(&self) -> bool {
        self.applies_to_all || self.class_match
    }

    pub fn is_included(&self) -> bool {
        match self.override_kind {
            Some(OverrideKind::Exclude) => false,
            Some(OverrideKind::Include) => true,
            None => self.auto() || self.manual,
        }
    }

    /// Sources that caused inclusion; empty when not included. An
    /// `include` override reports only itself.
    pub fn sources(&self) -> Vec<InclusionSource> {
        match self.override_kind {
            Some(OverrideKind::Exclude) => Vec::new(),
            Some(OverrideKind::Include) => vec![InclusionSource::Override],
            None => {
                let mut sources = Vec::new();
                if self.applies_to_all {
                    sources.push(InclusionSource::AppliesToAll);
                }
                if self.class_match {
                    sources.push(InclusionSource::ClassMatch);
                }
                if self.manual {
                    sources.push(InclusionSource::ManualLink);
                }
                sources
            }
        }
    }
}

/// Resolve one (mutation, group) pair.
pub fn resolve_inclusion(mutation: &MutationLinks<'_>, group: &GroupProfile<'_>) -> Inclusion {
    let class_match = !group.applies_to_all_classes
        && !mutation.classes.is_disjoint(group.classes);

    Inclusion {
        override_kind: mutation.overrides.get(&group.id).copied(),
        applies_to_all: group.applies_to_all_classes,
        class_match,
        manual: mutation.manual_groups.contains(&group.id),
    }
}

/// Decision for one group of a mutation's gene, as shown by `genrec explain`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDecision {
    pub group: RecommendationGroup,
    pub inclusion: Inclusion,
    pub included: bool,
}

/// Resolve a mutation against every group of its own gene.
pub fn explain_mutation(index: &ReferenceIndex, mutation_id: Uuid) -> Vec<GroupDecision> {
    let Some(mutation) = index.mutation(mutation_id) else {
        return Vec::new();
    };
    let links = index.mutation_links(mutation_id);
    let mut decisions: Vec<GroupDecision> = index
        .groups_of(mutation.gene_id)
        .iter()
        .map(|group| {
            let inclusion = resolve_inclusion(&links, &index.group_profile(group));
            GroupDecision {
                group: group.clone(),
                included: inclusion.is_included(),
                inclusion,
            }
        })
        .collect();
    decisions.sort_by(|a, b| {
        (a.group.age_min, a.group.created_at, a.group.id)
            .cmp(&(b.group.age_min, b.group.created_at, b.group.id))
    });
    decisions
}

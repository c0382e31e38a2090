//! genrec-common: row types, snapshot container and shared errors used across all genrec crates.

pub mod error;
pub mod entities;
pub mod snapshot;
pub mod form;

// Re-export commonly used types
pub use entities::{
    CancerRecommendation, Gene, GroupClassLink, Mutation, MutationClassLink, MutationGroupLink,
    MutationGroupOverride, OverrideKind, Pathogenicity, PatientSex, RecommendationClass,
    RecommendationGroup, Risk, SexFilter,
};
pub use error::{GenrecError, Result};
pub use form::{AgeInput, CancerAnswers, GeneEntryForm, GeneratorForm};
pub use snapshot::Snapshot;

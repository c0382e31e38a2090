//! genrec-engine: resolves which recommendation groups apply to a patient
//! and assembles the per-gene report.
//!
//! The core ([`index`], [`resolver`], [`aggregate`], [`report`]) is pure
//! and works on an in-memory [`genrec_common::Snapshot`]. [`generator`]
//! wraps it with validation and the store fetch.

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod generator;
pub mod index;
pub mod report;
pub mod resolver;
pub mod validation;

pub use aggregate::{CancerContext, GeneSelection, IncludedGroup, PatientProfile, ReportBox};
pub use audit::{audit_snapshot, Finding, FindingKind};
pub use error::{GenerateError, Result};
pub use generator::{Explanation, ReportGenerator};
pub use index::ReferenceIndex;
pub use report::{assemble_report, build_report, Report};
pub use resolver::{resolve_inclusion, GroupDecision, Inclusion, InclusionSource};
pub use validation::{validate_form, Catalog, FieldError, GenerationRequest, ValidationErrors};

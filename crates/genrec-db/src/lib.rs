//! genrec store layer
//!
//! This crate is the seam between the resolution core and the external
//! structured store that owns genes, groups, mutations and their links.
//!
//! # Features
//!
//! - `RecommendationStore`: typed, id-keyed reads over the ten tables
//! - `fetch_snapshot`: concurrent all-or-nothing fetch of one generation's rows
//! - `fetch_all`: every row reachable from a gene, for `genrec check`
//! - `MemoryStore`: fixture-backed in-process store with checked writes
//! - `PgStore` (feature `postgres`): read-only PostgreSQL store
//!
//! # Example
//!
//! ```rust,no_run
//! use genrec_db::{fetch_snapshot, MemoryStore, SnapshotRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::open_fixture("./genrec-data.yaml")?;
//!     let snapshot = fetch_snapshot(&store, &SnapshotRequest::default()).await?;
//!     println!("{} rows", snapshot.row_count());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod schema;
pub mod store;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{DbError, Result};
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use schema::{table_counts, ALL_TABLES};
pub use store::{fetch_all, fetch_snapshot, RecommendationStore, SnapshotRequest};

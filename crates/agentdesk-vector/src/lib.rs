//! Vector storage backends.
//!
//! [`LanceVectorIndex`] keeps points in a LanceDB table; provenance and ticket
//! tables live in the same database. [`InMemoryVectorIndex`] serves tests and
//! small deployments.

pub mod lance;
pub mod memory;
pub mod provenance;
pub mod schema;
pub mod table;

pub use lance::LanceVectorIndex;
pub use memory::InMemoryVectorIndex;
pub use provenance::{LanceProvenanceStore, LanceTicketStore};

//! Persistence layer — libSQL-backed storage for interview transcripts,
//! scores, summaries, and the descriptor records interviews are built from.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{DescriptorStore, PersistenceSink};

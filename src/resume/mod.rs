//! Resume capability for backfill runs
//!
//! Progress is persisted after every successful window with atomic writes and
//! removed once the final artifact is written.

pub mod checkpoint;
pub mod store;

pub use checkpoint::Checkpoint;
pub use store::{CheckpointStore, JsonFileStore, MemoryStore, ResumeError};

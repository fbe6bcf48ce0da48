//! Storage module for persistent data storage
//!
//! SQLite keeps everything relational; vectors live in the vector store.

mod database;

pub use database::{AttemptItemFact, NewVectorIndex, StoredMaterial, StudyDb};

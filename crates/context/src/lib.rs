//! In-process reference-document store
//!
//! Ingests documents, chunks them into overlapping word windows, and serves
//! relevance lookups and terminology extraction to the translation stage
//! through the `ContextProvider` trait.

pub mod chunker;
pub mod store;
pub mod vocab;

pub use store::{ContextInfo, ContextStore};

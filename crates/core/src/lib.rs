//! Core traits and types for the speech translation pipeline
//!
//! This crate provides foundational types used across all other crates:
//! - Transcript, translation, and synthesis result types
//! - Error taxonomy
//! - Collaborator traits (recognizer, translator, synthesizer, context)
//! - Audio and text utilities

pub mod audio;
pub mod error;
pub mod text;
pub mod traits;
pub mod types;

pub use error::{Error, Result, Stage};
pub use traits::{ContextProvider, SpeechRecognizer, SpeechSynthesizer, Translator};
pub use types::{
    AsrResult, AsrSegment, AudioBlob, FinalTranscript, PartialTranscript, TranslationOutcome,
    TranslationRequest, WordTiming,
};

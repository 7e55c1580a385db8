//! Pipeline stages
//!
//! Each stage validates its input, consults the result cache when the
//! caller opts in, and wraps the collaborator call in a configurable
//! timeout. Collaborator failures become `Error::Collaborator` attributed
//! to the stage; stages never retry.

mod asr;
mod translation;
mod tts;

pub use asr::AsrStage;
pub use translation::TranslationStage;
pub use tts::TtsStage;

use std::future::Future;
use std::time::Duration;

use speech_bridge_core::{Error, Result, Stage};

/// Stage output plus whether it was served from cache
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult<T> {
    pub value: T,
    pub cached: bool,
}

impl<T> StageResult<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            cached: false,
        }
    }

    pub fn cached(value: T) -> Self {
        Self {
            value,
            cached: true,
        }
    }
}

/// Run a collaborator call under the stage budget.
///
/// Expiry is a stage failure, not a session error; other collaborator
/// errors are rewrapped with the stage label so nothing model-specific
/// leaks past this boundary.
pub(crate) async fn call_collaborator<T, F>(
    stage: Stage,
    timeout: Duration,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Error::collaborator(stage, e.to_string())),
        Err(_) => Err(Error::StageTimeout {
            stage,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

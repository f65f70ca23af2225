// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Framework-level failures raised by the engine itself.
///
/// Handler errors use the pipeline's own error type; an application error
/// type only has to be `From<FlowError>` so these can be folded into it.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {type_name}")]
  NoPipelineRegistered { type_name: String },

  #[error("Context type mismatch at '{step_name}' (expected {expected_type})")]
  TypeMismatch { step_name: String, expected_type: String },

  #[error("Scoped context extraction failed for step '{step_name}': {source}")]
  ScopeExtraction {
    step_name: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Handler or external operation failed: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

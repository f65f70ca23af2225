// core/src/core/step.rs

/// A named step in a pipeline.
///
/// An optional step without handlers is skipped; a non-optional one is a
/// [`crate::FlowError::HandlerMissing`] at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

impl StepDef {
  pub fn new(name: impl Into<String>, optional: bool) -> Self {
    Self {
      name: name.into(),
      optional,
    }
  }
}

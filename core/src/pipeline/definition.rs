// core/src/pipeline/definition.rs

use crate::conditional::builder::ConditionalScopeBuilder;
use crate::core::handler::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered set of named steps over a shared `ContextData<TData>`.
///
/// `Err` is the error type of every handler in the pipeline; it must absorb
/// [`FlowError`] so the engine can report its own failures through it.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef>,
  pub(crate) before_handlers: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on_handlers: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after_handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, in execution order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    Self {
      steps: step_defs
        .iter()
        .map(|(name, optional)| StepDef::new(*name, *optional))
        .collect(),
      before_handlers: HashMap::new(),
      on_handlers: HashMap::new(),
      after_handlers: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name. Pipelines are assembled once at startup,
  /// so a typo here is a programming error rather than a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("flow setup error: step '{}' is not defined in this pipeline", step_name);
    }
  }

  pub(crate) fn set_optional(&mut self, step_name: &str, optional: bool) {
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.optional = optional;
    }
  }

  /// Starts configuring conditional scoped pipelines for `step_name`.
  /// The step is appended if it was not declared in [`Pipeline::new`].
  pub fn conditional_scopes_for_step(&mut self, step_name: &str) -> ConditionalScopeBuilder<'_, TData, Err> {
    if !self.steps.iter().any(|s| s.name == step_name) {
      self.steps.push(StepDef::new(step_name, false));
    }
    ConditionalScopeBuilder::new(self, step_name.to_string())
  }
}

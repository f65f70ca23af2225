// core/src/conditional/builder.rs

//! Fluent API for a conditional step:
//!
//! ```ignore
//! pipeline
//!   .conditional_scopes_for_step("route")
//!   .add_scope(scoped_pipeline, |parent| Ok(parent.read().child.clone()))
//!   .on_condition(|parent| parent.read().should_route)
//!   .if_no_scope_matches(PipelineControl::Continue)
//!   .finalize_conditional_step(false);
//! ```

use crate::conditional::scope::{control_for, AnyConditionalScope, ConditionalScope, ScopeExtractor};
use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tracing::{event, Level};

pub struct ConditionalScopeBuilder<'pipeline, TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: &'pipeline mut Pipeline<TData, Err>,
  step_name: String,
  collected_scopes: Vec<Arc<dyn AnyConditionalScope<TData, Err>>>,
  on_no_match: PipelineControl,
  on_scoped_stop: PipelineControl,
}

impl<'pipeline, TData, Err> ConditionalScopeBuilder<'pipeline, TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) fn new(pipeline: &'pipeline mut Pipeline<TData, Err>, step_name: String) -> Self {
    Self {
      pipeline,
      step_name,
      collected_scopes: Vec::new(),
      on_no_match: PipelineControl::Continue,
      on_scoped_stop: PipelineControl::Stop,
    }
  }

  /// Adds a scope running `scoped_pipeline` over the context produced by
  /// `extractor_fn`. Finish it with [`ConditionalScopeConfigurator::on_condition`].
  pub fn add_scope<SData>(
    self,
    scoped_pipeline: Arc<Pipeline<SData, Err>>,
    extractor_fn: impl Fn(ContextData<TData>) -> Result<ContextData<SData>, FlowError> + Send + Sync + 'static,
  ) -> ConditionalScopeConfigurator<'pipeline, TData, SData, Err>
  where
    SData: 'static + Send + Sync,
  {
    ConditionalScopeConfigurator {
      builder: self,
      pipeline: scoped_pipeline,
      extractor: Arc::new(extractor_fn),
    }
  }

  /// Control returned by the step when no scope condition holds. Defaults to `Continue`.
  pub fn if_no_scope_matches(mut self, behavior: PipelineControl) -> Self {
    self.on_no_match = behavior;
    self
  }

  /// Control returned by the step when the chosen scoped pipeline stops.
  /// Defaults to `Stop`, which halts the parent pipeline too.
  pub fn on_scoped_stop(mut self, behavior: PipelineControl) -> Self {
    self.on_scoped_stop = behavior;
    self
  }

  /// Installs the dispatching `on` handler for the step. The first scope
  /// whose condition holds runs; the others are not evaluated further.
  ///
  /// With `optional_step`, a failing scope is logged and the parent continues.
  pub fn finalize_conditional_step(self, optional_step: bool) {
    let scopes = Arc::new(self.collected_scopes);
    let step_name = self.step_name.clone();
    let on_no_match = self.on_no_match;
    let on_scoped_stop = self.on_scoped_stop;

    let dispatcher: Handler<TData, Err> = Box::new(move |main_ctx_data: ContextData<TData>| {
      let scopes = scopes.clone();
      let step_name = step_name.clone();
      Box::pin(async move {
        for scope in scopes.iter() {
          if !scope.is_condition_met(main_ctx_data.clone()) {
            continue;
          }
          event!(Level::DEBUG, step_name = %step_name, "Conditional scope matched.");
          return match scope.execute_scoped_pipeline(&step_name, main_ctx_data.clone()).await {
            Ok(result) => Ok(control_for(result, on_scoped_stop)),
            Err(e) if optional_step => {
              event!(Level::WARN, step_name = %step_name, error = %e, "Optional conditional step failed; continuing.");
              Ok(PipelineControl::Continue)
            }
            Err(e) => Err(e),
          };
        }
        event!(Level::DEBUG, step_name = %step_name, "No conditional scope matched; returning {:?}.", on_no_match);
        Ok(on_no_match)
      })
    });

    self.pipeline.set_optional(&self.step_name, optional_step);
    self.pipeline.on_handlers.insert(self.step_name.clone(), vec![dispatcher]);
    event!(Level::DEBUG, step_name = %self.step_name, "Conditional step finalized.");
  }
}

/// Holds one scope until its condition is supplied.
pub struct ConditionalScopeConfigurator<'pipeline, TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  builder: ConditionalScopeBuilder<'pipeline, TData, Err>,
  pipeline: Arc<Pipeline<SData, Err>>,
  extractor: ScopeExtractor<TData, SData>,
}

impl<'pipeline, TData, SData, Err> ConditionalScopeConfigurator<'pipeline, TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn on_condition(
    mut self,
    condition_fn: impl Fn(ContextData<TData>) -> bool + Send + Sync + 'static,
  ) -> ConditionalScopeBuilder<'pipeline, TData, Err> {
    self.builder.collected_scopes.push(Arc::new(ConditionalScope {
      pipeline: self.pipeline,
      extractor: self.extractor,
      condition: Arc::new(condition_fn),
    }));
    self.builder
  }
}

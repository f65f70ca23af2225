// core/src/conditional/scope.rs

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub(crate) type ScopeExtractor<TData, SData> =
  Arc<dyn Fn(ContextData<TData>) -> Result<ContextData<SData>, FlowError> + Send + Sync + 'static>;

pub(crate) type ScopeCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// One candidate execution path of a conditional step.
pub(crate) struct ConditionalScope<TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) pipeline: Arc<Pipeline<SData, Err>>,
  pub(crate) extractor: ScopeExtractor<TData, SData>,
  pub(crate) condition: ScopeCondition<TData>,
}

/// Erases `SData` so scopes over different sub-context types can share a step.
#[async_trait]
pub(crate) trait AnyConditionalScope<TData, Err>: Send + Sync
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn is_condition_met(&self, main_ctx_data: ContextData<TData>) -> bool;

  async fn execute_scoped_pipeline(
    &self,
    step_name: &str,
    main_ctx_data: ContextData<TData>,
  ) -> Result<PipelineResult, Err>;
}

#[async_trait]
impl<TData, SData, Err> AnyConditionalScope<TData, Err> for ConditionalScope<TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn is_condition_met(&self, main_ctx_data: ContextData<TData>) -> bool {
    (self.condition)(main_ctx_data)
  }

  #[instrument(
    name = "ConditionalScope::execute",
    skip(self, main_ctx_data),
    fields(scoped_context_type = %std::any::type_name::<SData>()),
    err(Display)
  )]
  async fn execute_scoped_pipeline(
    &self,
    step_name: &str,
    main_ctx_data: ContextData<TData>,
  ) -> Result<PipelineResult, Err> {
    let scoped_ctx = (self.extractor)(main_ctx_data).map_err(|e| {
      event!(Level::ERROR, error = %e, "Scoped context extraction failed.");
      let source = match e {
        FlowError::ScopeExtraction { source, .. } | FlowError::Handler { source } => source,
        other => anyhow::Error::new(other),
      };
      Err::from(FlowError::ScopeExtraction {
        step_name: step_name.to_string(),
        source,
      })
    })?;

    self.pipeline.run(scoped_ctx).await
  }
}

/// Maps a scoped run result onto the parent step's control signal.
pub(crate) fn control_for(result: PipelineResult, on_scoped_stop: PipelineControl) -> PipelineControl {
  match result {
    PipelineResult::Completed => PipelineControl::Continue,
    PipelineResult::Stopped => on_scoped_stop,
  }
}

// core/tests/conditional_scope_tests.rs
mod common;

use common::*;
use sealcart_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use std::sync::Arc;

fn scoped_pipeline(tag: &'static str) -> Arc<Pipeline<ScopedContext, TestError>> {
  let mut p = Pipeline::<ScopedContext, TestError>::new(&[("work", false)]);
  p.on("work", move |ctx: ContextData<ScopedContext>| async move {
    let mut guard = ctx.write();
    guard.output = format!("{}:{}", tag, guard.input);
    if guard.stop {
      return Ok::<_, TestError>(PipelineControl::Stop);
    }
    Ok(PipelineControl::Continue)
  });
  Arc::new(p)
}

fn extract_scoped(parent: ContextData<TestContext>) -> Result<ContextData<ScopedContext>, FlowError> {
  let existing = parent.read().scoped.clone();
  Ok(existing.unwrap_or_else(|| {
    let input = parent.read().scoped_input.clone();
    let scoped = ContextData::new(ScopedContext {
      input,
      ..Default::default()
    });
    parent.write().scoped = Some(scoped.clone());
    scoped
  }))
}

fn routed_pipeline(on_scoped_stop: PipelineControl, no_match: PipelineControl) -> Pipeline<TestContext, TestError> {
  let mut parent = Pipeline::<TestContext, TestError>::new(&[("route", false), ("finish", false)]);
  parent
    .conditional_scopes_for_step("route")
    .add_scope(scoped_pipeline("approved"), extract_scoped)
    .on_condition(|ctx| ctx.read().route.as_deref() == Some("approved"))
    .add_scope(scoped_pipeline("fallback"), extract_scoped)
    .on_condition(|ctx| ctx.read().route.is_some())
    .on_scoped_stop(on_scoped_stop)
    .if_no_scope_matches(no_match)
    .finalize_conditional_step(false);
  parent.on_boxed("finish", recording_handler("finish"));
  parent
}

fn scoped_output(ctx: &ContextData<TestContext>) -> Option<String> {
  ctx.read().scoped.as_ref().map(|s| s.read().output.clone())
}

#[tokio::test]
async fn first_matching_scope_runs() {
  setup_tracing();
  let pipeline = routed_pipeline(PipelineControl::Stop, PipelineControl::Continue);
  let ctx = ContextData::new(TestContext {
    route: Some("approved".into()),
    scoped_input: "INV-1".into(),
    ..Default::default()
  });

  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(scoped_output(&ctx).as_deref(), Some("approved:INV-1"));
  assert_eq!(ctx.read().trail, vec!["finish"]);
}

#[tokio::test]
async fn later_scope_runs_when_earlier_condition_fails() {
  setup_tracing();
  let pipeline = routed_pipeline(PipelineControl::Stop, PipelineControl::Continue);
  let ctx = ContextData::new(TestContext {
    route: Some("other".into()),
    scoped_input: "INV-2".into(),
    ..Default::default()
  });

  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(scoped_output(&ctx).as_deref(), Some("fallback:INV-2"));
}

#[tokio::test]
async fn no_match_uses_configured_control() {
  setup_tracing();
  let continuing = routed_pipeline(PipelineControl::Stop, PipelineControl::Continue);
  let ctx = ContextData::new(TestContext::default());
  assert_eq!(continuing.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert!(scoped_output(&ctx).is_none());
  assert_eq!(ctx.read().trail, vec!["finish"]);

  let stopping = routed_pipeline(PipelineControl::Stop, PipelineControl::Stop);
  let ctx = ContextData::new(TestContext::default());
  assert_eq!(stopping.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(ctx.read().trail.is_empty());
}

#[tokio::test]
async fn scoped_stop_halts_parent_by_default() {
  setup_tracing();
  let pipeline = routed_pipeline(PipelineControl::Stop, PipelineControl::Continue);
  let scoped = ContextData::new(ScopedContext {
    input: "INV-3".into(),
    stop: true,
    ..Default::default()
  });
  let ctx = ContextData::new(TestContext {
    route: Some("approved".into()),
    scoped: Some(scoped),
    ..Default::default()
  });

  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(ctx.read().trail.is_empty());
}

#[tokio::test]
async fn scoped_stop_can_be_absorbed() {
  setup_tracing();
  let pipeline = routed_pipeline(PipelineControl::Continue, PipelineControl::Continue);
  let scoped = ContextData::new(ScopedContext {
    input: "INV-4".into(),
    stop: true,
    ..Default::default()
  });
  let ctx = ContextData::new(TestContext {
    route: Some("approved".into()),
    scoped: Some(scoped),
    ..Default::default()
  });

  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(scoped_output(&ctx).as_deref(), Some("approved:INV-4"));
  assert_eq!(ctx.read().trail, vec!["finish"]);
}

fn failing_extractor(_: ContextData<TestContext>) -> Result<ContextData<ScopedContext>, FlowError> {
  Err(FlowError::Internal("no payload".into()))
}

#[tokio::test]
async fn extractor_failure_surfaces_as_scope_extraction() {
  setup_tracing();
  let mut parent = Pipeline::<TestContext, TestError>::new(&[("route", false)]);
  parent
    .conditional_scopes_for_step("route")
    .add_scope(scoped_pipeline("approved"), failing_extractor)
    .on_condition(|_| true)
    .finalize_conditional_step(false);

  let err = parent.run(ContextData::new(TestContext::default())).await.unwrap_err();
  match err {
    TestError::Flow(msg) => {
      assert!(msg.contains("ScopeExtraction"), "unexpected: {}", msg);
      assert!(msg.contains("route"));
    }
    other => panic!("expected scope extraction failure, got {:?}", other),
  }
}

#[tokio::test]
async fn optional_conditional_step_swallows_scope_errors() {
  setup_tracing();
  let mut parent = Pipeline::<TestContext, TestError>::new(&[("route", false), ("finish", false)]);
  parent
    .conditional_scopes_for_step("route")
    .add_scope(scoped_pipeline("approved"), failing_extractor)
    .on_condition(|_| true)
    .finalize_conditional_step(true);
  parent.on_boxed("finish", recording_handler("finish"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(parent.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["finish"]);
}

#[tokio::test]
async fn conditional_step_not_declared_up_front_is_appended() {
  setup_tracing();
  let mut parent = Pipeline::<TestContext, TestError>::new(&[("start", false)]);
  parent.on_boxed("start", recording_handler("start"));
  parent
    .conditional_scopes_for_step("late_route")
    .add_scope(scoped_pipeline("late"), extract_scoped)
    .on_condition(|_| true)
    .finalize_conditional_step(false);

  assert_eq!(parent.step_names(), vec!["start", "late_route"]);
  let ctx = ContextData::new(TestContext {
    scoped_input: "X".into(),
    ..Default::default()
  });
  parent.run(ctx.clone()).await.unwrap();
  assert_eq!(scoped_output(&ctx).as_deref(), Some("late:X"));
}

//! Tests for the loop, think and template helpers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

use shared::{LoopCount, ThinkDefaults, ThinkSpec};
use crate::core::tests::{trace_of, FailStep, RecordStep};
use crate::error::{EngineError, EngineResult};
use crate::services::helpers::{LoopStep, RealHelpers, ThinkStep, LOOP_COUNT_VAR};
use crate::traits::{Helpers, Step};
use crate::types::ScenarioContext;

/// Appends the current `$loopCount` to the `seen` variable under a label
struct LoopCountRecorder(&'static str);

#[async_trait]
impl Step for LoopCountRecorder {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        let current = context.vars.get(LOOP_COUNT_VAR).cloned().unwrap_or(Value::Null);
        let entry = json!([self.0, current]);
        match context.vars.get_mut("seen") {
            Some(Value::Array(items)) => items.push(entry),
            _ => {
                context.vars.insert("seen".to_string(), json!([entry]));
            }
        }
        Ok(())
    }
}

/// Fails once it has been executed `after` times
struct FailAfter {
    after: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Step for FailAfter {
    async fn execute(&self, _context: &mut ScenarioContext) -> EngineResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            return Err(EngineError::publish("stopped"));
        }
        Ok(())
    }
}

fn seen(context: &ScenarioContext) -> Value {
    context.vars.get("seen").cloned().unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_loop_runs_body_count_times() {
    let body: Vec<Arc<dyn Step>> = vec![Arc::new(RecordStep("a")), Arc::new(RecordStep("b"))];
    let step = LoopStep::new(LoopCount::Times(3), body);

    let mut context = ScenarioContext::new();
    step.execute(&mut context).await.unwrap();

    assert_eq!(trace_of(&context), vec!["a", "b", "a", "b", "a", "b"]);
}

#[tokio::test]
async fn test_loop_with_zero_times_runs_nothing() {
    let step = LoopStep::new(LoopCount::Times(0), vec![Arc::new(RecordStep("a")) as Arc<dyn Step>]);

    let mut context = ScenarioContext::new();
    step.execute(&mut context).await.unwrap();

    assert!(trace_of(&context).is_empty());
}

#[tokio::test]
async fn test_loop_count_is_one_based_and_cleared_afterwards() {
    let step = LoopStep::new(LoopCount::Times(3), vec![Arc::new(LoopCountRecorder("x")) as Arc<dyn Step>]);

    let mut context = ScenarioContext::new();
    step.execute(&mut context).await.unwrap();

    assert_eq!(seen(&context), json!([["x", 1], ["x", 2], ["x", 3]]));
    assert!(!context.vars.contains_key(LOOP_COUNT_VAR));
}

#[tokio::test]
async fn test_nested_loop_restores_outer_count() {
    let inner: Arc<dyn Step> = Arc::new(LoopStep::new(
        LoopCount::Times(2),
        vec![Arc::new(LoopCountRecorder("inner")) as Arc<dyn Step>],
    ));
    let body: Vec<Arc<dyn Step>> = vec![inner, Arc::new(LoopCountRecorder("outer"))];
    let outer = LoopStep::new(LoopCount::Times(2), body);

    let mut context = ScenarioContext::new();
    outer.execute(&mut context).await.unwrap();

    assert_eq!(
        seen(&context),
        json!([
            ["inner", 1], ["inner", 2], ["outer", 1],
            ["inner", 1], ["inner", 2], ["outer", 2]
        ])
    );
}

#[tokio::test]
async fn test_loop_stops_at_first_failure() {
    let body: Vec<Arc<dyn Step>> = vec![
        Arc::new(RecordStep("before")),
        Arc::new(FailStep("boom")),
        Arc::new(RecordStep("after")),
    ];
    let step = LoopStep::new(LoopCount::Times(5), body);

    let mut context = ScenarioContext::new();
    let err = step.execute(&mut context).await.unwrap_err();

    assert_eq!(err.to_string(), "Publish failed: boom");
    assert_eq!(trace_of(&context), vec!["before"]);
    assert!(!context.vars.contains_key(LOOP_COUNT_VAR));
}

#[tokio::test]
async fn test_infinite_loop_ends_only_on_failure() {
    let failing = Arc::new(FailAfter { after: 4, calls: AtomicUsize::new(0) });
    let body: Vec<Arc<dyn Step>> = vec![Arc::new(RecordStep("tick")), failing.clone()];
    let step = LoopStep::new(LoopCount::Infinite, body);

    let mut context = ScenarioContext::new();
    assert!(step.execute(&mut context).await.is_err());

    assert_eq!(trace_of(&context).len(), 4);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_think_sleeps_for_duration() {
    let step = ThinkStep::new(Duration::from_secs(2), None);

    let started = Instant::now();
    let mut context = ScenarioContext::new();
    step.execute(&mut context).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_millis(2100));
}

#[test]
fn test_think_without_jitter_is_exact() {
    let step = ThinkStep::new(Duration::from_millis(500), None);
    assert_eq!(step.effective_duration(), Duration::from_millis(500));

    let step = ThinkStep::new(Duration::from_millis(500), Some(0.0));
    assert_eq!(step.effective_duration(), Duration::from_millis(500));
}

#[test]
fn test_think_jitter_stays_in_bounds() {
    let step = ThinkStep::new(Duration::from_millis(1000), Some(10.0));

    for _ in 0..200 {
        let pause = step.effective_duration();
        assert!(pause >= Duration::from_millis(900), "{pause:?} below bound");
        assert!(pause <= Duration::from_millis(1100), "{pause:?} above bound");
    }
}

#[tokio::test(start_paused = true)]
async fn test_real_helpers_build_think_with_defaults() {
    let helpers = RealHelpers::new();
    let think = ThinkSpec::from_secs_f64(1.0).unwrap();
    let step = helpers.create_think(&think, &ThinkDefaults { jitter: Some(50.0) });

    let started = Instant::now();
    let mut context = ScenarioContext::new();
    step.execute(&mut context).await.unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed <= Duration::from_millis(1600));
}

#[tokio::test]
async fn test_real_helpers_build_loop() {
    let helpers = RealHelpers::new();
    let body: Vec<Arc<dyn Step>> = vec![Arc::new(RecordStep("r"))];
    let step = helpers.create_loop_with_count(LoopCount::Times(2), body);

    let mut context = ScenarioContext::new();
    step.execute(&mut context).await.unwrap();

    assert_eq!(trace_of(&context), vec!["r", "r"]);
}

#[test]
fn test_real_helpers_template_reads_context_vars() {
    let helpers = RealHelpers::new();
    let mut context = ScenarioContext::new();
    context.vars.insert("userId".to_string(), json!("u-7"));
    context.vars.insert(LOOP_COUNT_VAR.to_string(), json!(3));

    let rendered = helpers
        .template(&json!({ "user": "{{ userId }}", "n": "{{ $loopCount }}" }), &context)
        .unwrap();

    assert_eq!(rendered, json!({ "user": "u-7", "n": 3 }));
}

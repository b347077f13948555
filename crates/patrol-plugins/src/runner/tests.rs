//! Unit tests for the plugin runner lifecycle.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::event::Event;
use crate::tests::{HookCounters, RecordingSink, ScriptedPlugin, session};

#[fixture]
fn sink() -> Arc<RecordingSink> {
    RecordingSink::new()
}

fn runner_with(
    sink: &Arc<RecordingSink>,
    counters: &HookCounters,
    build: impl Fn(HookCounters) -> ScriptedPlugin + Send + Sync + 'static,
) -> PluginRunner {
    let mut registry = PluginRegistry::new();
    let captured = counters.clone();
    registry
        .register("scripted", move || Ok(Box::new(build(captured.clone()))))
        .expect("register scripted");
    let (_scheduler, context) = session(Arc::clone(sink) as Arc<dyn crate::sink::CallbackSink>);
    PluginRunner::load(&registry, "scripted", context).expect("load scripted")
}

#[rstest]
fn load_fails_for_unknown_plugin(sink: Arc<RecordingSink>) {
    let registry = PluginRegistry::new();
    let (_scheduler, context) = session(sink);
    let error = PluginRunner::load(&registry, "ghost", context).expect_err("should fail");
    assert!(matches!(error, PluginError::NotFound { .. }));
}

#[rstest]
fn load_surfaces_factory_failures(sink: Arc<RecordingSink>) {
    let mut registry = PluginRegistry::new();
    registry
        .register("broken", || Err(Fault::from("no scanner binary")))
        .expect("register broken");
    let (_scheduler, context) = session(sink);
    let error = PluginRunner::load(&registry, "broken", context).expect_err("should fail");
    assert!(matches!(error, PluginError::Construct { .. }));
    assert!(error.to_string().contains("no scanner binary"));
}

#[rstest]
fn configure_failure_reports_once_and_skips_start(sink: Arc<RecordingSink>) {
    let counters = HookCounters::default();
    let mut runner = runner_with(&sink, &counters, |counters| ScriptedPlugin {
        fail_configure: true,
        counters,
        ..ScriptedPlugin::default()
    });

    assert!(!runner.run());

    assert_eq!(counters.start_calls(), 0, "start must never run");
    assert_eq!(sink.finish_count(), 1);
    let events = sink.events();
    let Some(Event::Finish { state, failure }) = events.first() else {
        panic!("expected a single finish event, got {events:?}");
    };
    assert_eq!(*state, ExitState::Failed);
    let failure = failure.as_ref().expect("failure report");
    assert_eq!(failure.message, "Failed to configure plugin");
    assert_eq!(failure.exception, "configure exploded");
    assert!(!failure.hostname.is_empty());
}

#[rstest]
fn start_failure_reports_after_start_event(sink: Arc<RecordingSink>) {
    let counters = HookCounters::default();
    let mut runner = runner_with(&sink, &counters, |counters| ScriptedPlugin {
        fail_start: true,
        counters,
        ..ScriptedPlugin::default()
    });

    assert!(!runner.run());

    let events = sink.events();
    assert_eq!(events.len(), 2, "start then finish: {events:?}");
    assert_eq!(events.first(), Some(&Event::Start));
    let Some(Event::Finish { state, failure }) = events.get(1) else {
        panic!("expected finish event, got {events:?}");
    };
    assert_eq!(*state, ExitState::Failed);
    assert_eq!(
        failure.as_ref().map(|report| report.message.as_str()),
        Some("Failed to start plugin")
    );
}

#[rstest]
fn successful_run_emits_start_and_no_finish(sink: Arc<RecordingSink>) {
    let counters = HookCounters::default();
    let mut runner = runner_with(&sink, &counters, ScriptedPlugin::succeeding);

    assert!(runner.run());

    assert_eq!(counters.configure_calls(), 1);
    assert_eq!(counters.start_calls(), 1);
    assert_eq!(sink.events(), vec![Event::Start]);
    assert_eq!(sink.finish_count(), 0);
}

#[rstest]
fn stop_is_idempotent_and_swallows_hook_faults(sink: Arc<RecordingSink>) {
    let counters = HookCounters::default();
    let mut runner = runner_with(&sink, &counters, |counters| ScriptedPlugin {
        fail_stop: true,
        counters,
        ..ScriptedPlugin::default()
    });

    assert!(!runner.is_stopping());
    runner.stop();
    runner.stop();
    runner.stop();

    assert!(runner.is_stopping());
    assert_eq!(counters.stop_calls(), 3);
    assert_eq!(sink.finish_count(), 0, "stop must never emit finish");
}

#[rstest]
fn runner_exposes_name_and_context(sink: Arc<RecordingSink>) {
    let counters = HookCounters::default();
    let runner = runner_with(&sink, &counters, ScriptedPlugin::succeeding);
    assert_eq!(runner.name(), "scripted");
    assert_eq!(runner.context().session_id(), "session-under-test");
}

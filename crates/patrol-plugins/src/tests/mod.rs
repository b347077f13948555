//! Crate-level behaviour tests and shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Configuration;
use crate::error::PluginError;
use crate::event::Event;
use crate::plugin::{Fault, PluginContext, ScanPlugin};
use crate::scheduler::Scheduler;
use crate::sink::CallbackSink;

mod behaviour;

/// Sink double recording every event in emission order.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().expect("lock events").clone()
    }

    pub(crate) fn finish_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Finish { .. }))
            .count()
    }
}

impl CallbackSink for RecordingSink {
    fn emit(&self, event: &Event) -> Result<(), PluginError> {
        self.events.lock().expect("lock events").push(event.clone());
        Ok(())
    }
}

/// Counts how often each lifecycle hook ran, shared with the test body.
#[derive(Debug, Default, Clone)]
pub(crate) struct HookCounters {
    pub(crate) configure: Arc<AtomicUsize>,
    pub(crate) start: Arc<AtomicUsize>,
    pub(crate) stop: Arc<AtomicUsize>,
}

impl HookCounters {
    pub(crate) fn configure_calls(&self) -> usize {
        self.configure.load(Ordering::SeqCst)
    }

    pub(crate) fn start_calls(&self) -> usize {
        self.start.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Plugin double whose hooks succeed or fail per construction.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPlugin {
    pub(crate) fail_configure: bool,
    pub(crate) fail_start: bool,
    pub(crate) fail_stop: bool,
    pub(crate) counters: HookCounters,
}

impl ScriptedPlugin {
    pub(crate) fn succeeding(counters: HookCounters) -> Self {
        Self {
            counters,
            ..Self::default()
        }
    }
}

impl ScanPlugin for ScriptedPlugin {
    fn configure(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        self.counters.configure.fetch_add(1, Ordering::SeqCst);
        if self.fail_configure {
            return Err(Fault::from("configure exploded"));
        }
        Ok(())
    }

    fn start(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        self.counters.start.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(Fault::from("start exploded"));
        }
        Ok(())
    }

    fn stop(&mut self, _ctx: &PluginContext) -> Result<(), Fault> {
        self.counters.stop.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(Fault::from("stop exploded"));
        }
        Ok(())
    }
}

/// Builds a scheduler and a context wired to the given sink.
pub(crate) fn session(sink: Arc<dyn CallbackSink>) -> (Scheduler, PluginContext) {
    let scheduler = Scheduler::new();
    let context = PluginContext::new(
        scheduler.handle(),
        sink,
        std::env::temp_dir(),
        "session-under-test",
        Arc::new(Configuration::new()),
    );
    (scheduler, context)
}

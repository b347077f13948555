//! End-to-end behaviour of a full plugin session through the real sink.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::blocking::{BlockingScan, ScanEnv, ScanOutcome};
use crate::config::Configuration;
use crate::plugin::PluginContext;
use crate::registry::PluginRegistry;
use crate::runner::PluginRunner;
use crate::scheduler::Scheduler;
use crate::sink::JsonLineSink;

/// Clonable writer backed by shared memory, standing in for stdout.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        let bytes = self.0.lock().expect("lock buffer");
        String::from_utf8(bytes.clone()).expect("utf8 output")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("lock buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn scan_session_produces_the_protocol_stream_in_order() {
    let mut registry = PluginRegistry::new();
    registry
        .register("demo", || {
            Ok(Box::new(BlockingScan::new(|env: &ScanEnv| -> ScanOutcome {
                env.sink().report_progress(50, "scanning")?;
                env.sink().report_issues(&[json!({"id": 1})])?;
                Ok(None)
            })))
        })
        .expect("register demo");

    let buffer = SharedBuffer::default();
    let sink = Arc::new(JsonLineSink::new(buffer.clone()));
    let scheduler = Scheduler::new();
    let context = PluginContext::new(
        scheduler.handle(),
        sink,
        std::env::temp_dir(),
        "behaviour-session",
        Arc::new(Configuration::new()),
    );

    let mut runner = PluginRunner::load(&registry, "demo", context).expect("load demo");
    assert!(runner.run());
    scheduler.run(&mut runner);

    assert_eq!(
        buffer.text(),
        concat!(
            "{\"msg\":\"start\"}\n",
            "{\"msg\":\"progress\",\"data\":{\"percentage\":50,\"description\":\"scanning\"}}\n",
            "{\"msg\":\"issue\",\"data\":{\"id\":1}}\n",
            "{\"msg\":\"finish\",\"data\":{\"state\":\"FINISHED\",\"failure\":\"\"}}\n",
        )
    );
}

#[test]
fn lifecycle_failure_is_the_only_event_on_the_stream() {
    // The blocking adapter never fails configuration, so the fault comes
    // from a bespoke plugin.
    struct FailsConfigure;
    impl crate::plugin::ScanPlugin for FailsConfigure {
        fn configure(&mut self, _ctx: &PluginContext) -> Result<(), crate::plugin::Fault> {
            Err(crate::plugin::Fault::from("bad target"))
        }
        fn start(&mut self, _ctx: &PluginContext) -> Result<(), crate::plugin::Fault> {
            Ok(())
        }
        fn stop(&mut self, _ctx: &PluginContext) -> Result<(), crate::plugin::Fault> {
            Ok(())
        }
    }

    let mut registry = PluginRegistry::new();
    registry
        .register("failing", || Ok(Box::new(FailsConfigure)))
        .expect("register failing");

    let buffer = SharedBuffer::default();
    let sink = Arc::new(JsonLineSink::new(buffer.clone()));
    let scheduler = Scheduler::new();
    let context = PluginContext::new(
        scheduler.handle(),
        sink,
        std::env::temp_dir(),
        "behaviour-session",
        Arc::new(Configuration::new()),
    );

    let mut runner = PluginRunner::load(&registry, "failing", context).expect("load failing");
    assert!(!runner.run());

    let output = buffer.text();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1, "exactly one finish line: {output}");
    let line = lines.first().expect("finish line");
    assert!(line.contains("\"state\":\"FAILED\""));
    assert!(line.contains("\"message\":\"Failed to configure plugin\""));
    assert!(line.contains("\"exception\":\"bad target\""));
}

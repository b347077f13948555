//! Single-threaded execution context for plugin sessions.
//!
//! One [`Scheduler`] per process replaces a global reactor: every piece of
//! asynchronous plugin work and every signal-triggered stop request is posted
//! as a [`Task`] onto its queue and executed on the thread that drives
//! [`Scheduler::run`]. Runner and plugin state are only ever touched from
//! that thread, so the session needs no locking; worker threads communicate
//! exclusively by posting tasks through a cloned [`SchedulerHandle`].

use std::sync::mpsc::{Receiver, Sender, channel};

use tracing::{debug, trace};

use crate::runner::PluginRunner;

/// Tracing target for scheduler operations.
const SCHEDULER_TARGET: &str = "patrol_plugins::scheduler";

/// One unit of work on the scheduler queue.
pub enum Task {
    /// A closure to execute on the scheduler thread.
    Call(Box<dyn FnOnce() + Send + 'static>),
    /// A graceful stop request for the running plugin.
    Stop,
    /// Terminates the scheduler loop. Posted after the terminal `finish`
    /// event has been emitted.
    Shutdown,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call(_) => f.write_str("Task::Call"),
            Self::Stop => f.write_str("Task::Stop"),
            Self::Shutdown => f.write_str("Task::Shutdown"),
        }
    }
}

/// Cloneable, `Send` handle for posting tasks onto the scheduler queue.
///
/// Posting never executes work inline, which makes the handle safe to use
/// from signal listener threads and scan worker threads alike. Posts after
/// the scheduler has shut down are silently dropped.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    sender: Sender<Task>,
}

impl SchedulerHandle {
    /// Posts a closure for execution on the scheduler thread.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Task::Call(Box::new(task))).is_err() {
            trace!(target: SCHEDULER_TARGET, "dropped task posted after shutdown");
        }
    }

    /// Requests a graceful stop of the running plugin.
    pub fn request_stop(&self) {
        if self.sender.send(Task::Stop).is_err() {
            trace!(target: SCHEDULER_TARGET, "dropped stop request after shutdown");
        }
    }

    /// Asks the scheduler loop to exit.
    pub fn shutdown(&self) {
        if self.sender.send(Task::Shutdown).is_err() {
            trace!(target: SCHEDULER_TARGET, "duplicate shutdown request");
        }
    }
}

/// Owner of the task queue; drives a plugin session to completion.
#[derive(Debug)]
pub struct Scheduler {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates a scheduler with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    /// Returns a handle for posting tasks onto the queue.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            sender: self.sender.clone(),
        }
    }

    /// Drains the queue on the calling thread until shutdown.
    ///
    /// `Stop` tasks are dispatched to the runner; `Call` tasks execute their
    /// closure. Returns once a `Shutdown` task is processed, which the
    /// finishing path posts right after the terminal event.
    pub fn run(self, runner: &mut PluginRunner) {
        // The scheduler keeps its own sender alive, so recv() only fails if
        // something catastrophic dropped it; treat that as shutdown too.
        while let Ok(task) = self.receiver.recv() {
            match task {
                Task::Call(call) => call(),
                Task::Stop => {
                    debug!(target: SCHEDULER_TARGET, "dispatching stop request");
                    runner.stop();
                }
                Task::Shutdown => {
                    debug!(target: SCHEDULER_TARGET, "scheduler shutting down");
                    break;
                }
            }
        }
    }
}

use super::expr::{ExprError, evaluate};
use super::trace::{TraceEvent, TraceRecorder};
use super::watch::{WatchPool, WatchReport};
use crate::bus::SimBus;
use crate::proc::{Executed, SimBreak, SimProc};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

//===========================================================================//

/// The run state of a simulated environment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RunState {
    /// Not executing, ready to step.
    Stopped,
    /// Inside a call to [`SimEnv::step`].
    Running,
    /// The program has terminated; no more instructions will execute.
    Ended,
}

/// How many instructions a call to [`SimEnv::step`] may execute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StepCount {
    /// At most this many instructions.
    Bounded(u64),
    /// Until the program ends, a stop is requested, or an observer breaks.
    Unbounded,
}

/// Why a call to [`SimEnv::step`] returned successfully.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StopReason {
    /// The requested number of instructions was executed.
    Completed,
    /// A [`StopHandle`] requested a stop.
    StopRequested,
    /// The observer broke out after a watchpoint change.
    Watchpoint,
    /// The program reached its end condition.
    Ended,
}

/// An error that stopped a call to [`SimEnv::step`].
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum StepError {
    /// The processor faulted; the program has ended.
    #[error(transparent)]
    Break(#[from] SimBreak),
    /// The program had already ended before the call.
    #[error("the program is not being run")]
    AlreadyEnded,
}

//===========================================================================//

/// When a program is considered to have finished.  With the default (no
/// conditions), only a processor fault ends the program.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct EndCondition {
    /// End once the program counter reaches this address.
    pub at_pc: Option<u32>,
    /// End once an instruction branches to itself.
    pub on_self_loop: bool,
}

impl EndCondition {
    fn is_met(&self, executed: &Executed, next_pc: u32) -> bool {
        self.at_pc == Some(next_pc)
            || (self.on_self_loop && executed.pc == next_pc)
    }
}

//===========================================================================//

/// A handle for requesting that a running simulation stop.  The request
/// takes effect after the instruction currently executing commits.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests a stop.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if a stop was requested, clearing the request.  A call
    /// to [`SimEnv::step`] discards any request made before it started.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

//===========================================================================//

/// Receives notifications from [`SimEnv::step`].
pub trait StepObserver {
    /// Called after each instruction commits.
    fn executed(&mut self, _executed: &Executed) {}

    /// Called during unbounded stepping when any watchpoint changed.
    /// Returning `Break` stops the simulation.
    fn watchpoints_changed(
        &mut self,
        _report: &WatchReport,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl StepObserver for () {}

//===========================================================================//

/// A complete simulated environment: a processor, its memory, and the
/// debugging state attached to them.
pub struct SimEnv {
    proc: Box<dyn SimProc>,
    bus: Box<dyn SimBus>,
    trace: TraceRecorder,
    watchpoints: WatchPool,
    state: RunState,
    end: EndCondition,
    stop: StopHandle,
}

impl SimEnv {
    /// Returns a stopped environment with an in-memory trace and no end
    /// condition.
    pub fn new(proc: Box<dyn SimProc>, bus: Box<dyn SimBus>) -> SimEnv {
        SimEnv {
            proc,
            bus,
            trace: TraceRecorder::new(),
            watchpoints: WatchPool::new(),
            state: RunState::Stopped,
            end: EndCondition::default(),
            stop: StopHandle::default(),
        }
    }

    /// Replaces the trace recorder.
    pub fn with_trace(mut self, trace: TraceRecorder) -> SimEnv {
        self.trace = trace;
        self
    }

    /// Sets the end condition.
    pub fn with_end_condition(mut self, end: EndCondition) -> SimEnv {
        self.end = end;
        self
    }

    /// Returns a human-readable description of this environment.
    pub fn description(&self) -> String {
        format!(
            "{} with {}, pc={:08x}",
            self.proc.description(),
            self.bus.description(),
            self.proc.pc()
        )
    }

    /// Returns the simulated processor.
    pub fn proc(&self) -> &dyn SimProc {
        &*self.proc
    }

    /// Returns the simulated processor, mutably.
    pub fn proc_mut(&mut self) -> &mut dyn SimProc {
        &mut *self.proc
    }

    /// Returns the simulated memory.
    pub fn bus(&self) -> &dyn SimBus {
        &*self.bus
    }

    /// Returns the simulated memory, mutably.
    pub fn bus_mut(&mut self) -> &mut dyn SimBus {
        &mut *self.bus
    }

    /// Returns the register write trace.
    pub fn trace(&self) -> &TraceRecorder {
        &self.trace
    }

    /// Returns the watchpoint pool.
    pub fn watchpoints(&self) -> &WatchPool {
        &self.watchpoints
    }

    /// Returns the watchpoint pool, mutably.
    pub fn watchpoints_mut(&mut self) -> &mut WatchPool {
        &mut self.watchpoints
    }

    /// Returns the current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns a handle that can stop this environment while it runs.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Evaluates a debug expression against the current processor state.
    pub fn evaluate(&self, expr: &str) -> Result<u32, ExprError> {
        evaluate(expr, &*self.proc)
    }

    /// Executes instructions, as limited by `count`.
    ///
    /// Each instruction commits its register or memory writes, then its
    /// trace event, before anything else observes it.  During unbounded
    /// stepping, the watchpoints are checked after every instruction.  A
    /// processor fault ends the program, leaving the program counter on the
    /// faulting instruction.  An instruction that meets the end condition is
    /// still checked against the watchpoints before the program ends.
    pub fn step(
        &mut self,
        count: StepCount,
        observer: &mut dyn StepObserver,
    ) -> Result<StopReason, StepError> {
        if self.state == RunState::Ended {
            return Err(StepError::AlreadyEnded);
        }
        self.stop.take();
        self.state = RunState::Running;
        let mut num_executed: u64 = 0;
        loop {
            if let StepCount::Bounded(limit) = count {
                if num_executed >= limit {
                    self.state = RunState::Stopped;
                    return Ok(StopReason::Completed);
                }
            }
            let executed = match self.proc.step(&mut *self.bus) {
                Ok(executed) => executed,
                Err(fault) => {
                    log::error!("{fault}");
                    self.state = RunState::Ended;
                    return Err(fault.into());
                }
            };
            num_executed += 1;
            log::debug!(
                "{:08x}: {:08x}  {}",
                executed.pc,
                executed.word,
                executed.disassembly
            );
            if let Some(write) = executed.write {
                self.trace.record(TraceEvent {
                    pc: executed.pc,
                    reg: write.reg,
                    value: write.value,
                });
            }
            observer.executed(&executed);
            let mut watch_break = false;
            if count == StepCount::Unbounded {
                let report = self.watchpoints.check_all(&*self.proc);
                watch_break = report.any_changed()
                    && observer.watchpoints_changed(&report).is_break();
            }
            if self.end.is_met(&executed, self.proc.pc()) {
                log::info!("program ended at pc {:08x}", self.proc.pc());
                self.state = RunState::Ended;
                return Ok(StopReason::Ended);
            }
            if watch_break {
                self.state = RunState::Stopped;
                return Ok(StopReason::Watchpoint);
            }
            if self.stop.take() {
                self.state = RunState::Stopped;
                return Ok(StopReason::StopRequested);
            }
        }
    }
}

//===========================================================================//


//===========================================================================//

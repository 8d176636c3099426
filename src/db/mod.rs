//! Facilities for running and debugging a simulated program.

mod env;
mod expr;
mod load;
mod monitor;
mod trace;
mod watch;

pub use env::{
    EndCondition, RunState, SimEnv, StepCount, StepError, StepObserver,
    StopHandle, StopReason,
};
pub use expr::{ExprError, evaluate};
pub use load::{DATA_LOAD_ADDR, INST_LOAD_ADDR, load_image, load_program};
pub use monitor::{Monitor, PROMPT, Status};
pub use trace::{TRACE_HEADER, TraceEvent, TraceRecorder};
pub use watch::{
    Membership, NUM_WATCHPOINTS, WatchChange, WatchError, WatchFailure,
    WatchId, WatchListing, WatchPool, WatchReport, Watchpoint,
};

//===========================================================================//

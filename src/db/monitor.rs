use super::env::{SimEnv, StepCount, StepError, StepObserver, StopReason};
use super::watch::{WatchChange, WatchReport};
use crate::bus::Width;
use crate::proc::Executed;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;

//===========================================================================//

/// The prompt printed before each command in the interactive loop.
pub const PROMPT: &str = "(temu) ";

/// Stepping this many instructions or more does not echo each one.
const MAX_ECHOED_STEPS: u64 = 10;

//===========================================================================//

#[derive(Debug, Parser)]
#[command(multicall = true)]
struct MonitorLine {
    #[command(subcommand)]
    command: MonitorCommand,
}

#[derive(Debug, Subcommand)]
enum MonitorCommand {
    /// Continue the execution of the program
    #[command(name = "c")]
    Continue,
    /// Exit TEMU
    #[command(name = "q")]
    Quit,
    /// Step N instructions (default: 1)
    #[command(name = "si")]
    Step {
        #[arg(
            default_value_t = 1,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        count: u64,
    },
    /// Print program status
    Info {
        #[command(subcommand)]
        what: InfoCommand,
    },
    /// Examine N words of memory starting at EXPR
    #[command(name = "x")]
    Examine {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        expr: Vec<String>,
    },
    /// Set a watchpoint on EXPR
    #[command(name = "w")]
    Watch {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        expr: Vec<String>,
    },
    /// Delete watchpoint N
    #[command(name = "d")]
    Delete { number: u32 },
}

#[derive(Debug, Subcommand)]
enum InfoCommand {
    /// Show register values
    #[command(name = "r")]
    Registers,
    /// Show watchpoints
    #[command(name = "w")]
    Watchpoints,
}

//===========================================================================//

/// Whether the command loop should keep reading commands.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    /// Read the next command.
    Continue,
    /// Leave the command loop.
    Quit,
}

//===========================================================================//

struct Echo<'a> {
    out: &'a mut dyn Write,
    echo_steps: bool,
    result: io::Result<()>,
}

impl<'a> Echo<'a> {
    fn write_change(&mut self, change: &WatchChange) -> io::Result<()> {
        writeln!(self.out, "Watchpoint {}: {}", change.id, change.expression)?;
        writeln!(
            self.out,
            "Old value = 0x{:08x} ({})",
            change.old_value, change.old_value
        )?;
        writeln!(
            self.out,
            "New value = 0x{:08x} ({})",
            change.new_value, change.new_value
        )
    }
}

impl<'a> StepObserver for Echo<'a> {
    fn executed(&mut self, executed: &Executed) {
        if self.echo_steps && self.result.is_ok() {
            self.result = writeln!(
                self.out,
                "{:08x}:   {:08x}   {}",
                executed.pc, executed.word, executed.disassembly
            );
        }
    }

    fn watchpoints_changed(
        &mut self,
        report: &WatchReport,
    ) -> ControlFlow<()> {
        for change in report.changes.iter() {
            if self.result.is_ok() {
                self.result = self.write_change(change);
            }
        }
        ControlFlow::Break(())
    }
}

//===========================================================================//

/// An interactive debugging monitor wrapped around a simulated environment.
/// All command output goes to the given writer.
pub struct Monitor<W: Write> {
    env: SimEnv,
    out: W,
}

impl<W: Write> Monitor<W> {
    /// Returns a monitor that controls `env` and writes to `out`.
    pub fn new(env: SimEnv, out: W) -> Monitor<W> {
        Monitor { env, out }
    }

    /// Returns the simulated environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Returns the simulated environment, mutably.
    pub fn env_mut(&mut self) -> &mut SimEnv {
        &mut self.env
    }

    /// Returns the output writer.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Consumes the monitor, returning the environment and output writer.
    pub fn into_parts(self) -> (SimEnv, W) {
        (self.env, self.out)
    }

    /// Runs the command loop, reading one command per line from `input`
    /// until a `q` command or the end of input.
    pub fn run_repl<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        let mut line = String::new();
        loop {
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                return Ok(());
            }
            if self.execute(&line)? == Status::Quit {
                return Ok(());
            }
        }
    }

    /// Parses and executes a single command line.  Errors in the command
    /// itself are reported to the output; only failures writing to the
    /// output are returned.
    pub fn execute(&mut self, line: &str) -> io::Result<Status> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Status::Continue);
        }
        log::debug!("command: {}", words.join(" "));
        let command = match MonitorLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(error) => {
                write!(self.out, "{}", error.render())?;
                return Ok(Status::Continue);
            }
        };
        match command {
            MonitorCommand::Continue => self.run(StepCount::Unbounded)?,
            MonitorCommand::Quit => return Ok(Status::Quit),
            MonitorCommand::Step { count } => {
                self.run(StepCount::Bounded(count))?
            }
            MonitorCommand::Info { what: InfoCommand::Registers } => {
                self.show_registers()?
            }
            MonitorCommand::Info { what: InfoCommand::Watchpoints } => {
                self.show_watchpoints()?
            }
            MonitorCommand::Examine { count, expr } => {
                self.examine(count, &expr.join(" "))?
            }
            MonitorCommand::Watch { expr } => self.watch(expr.join(" "))?,
            MonitorCommand::Delete { number } => {
                match self.env.watchpoints_mut().release(number) {
                    Ok(()) => {
                        writeln!(self.out, "Deleted watchpoint {number}")?
                    }
                    Err(error) => writeln!(self.out, "{error}")?,
                }
            }
        }
        Ok(Status::Continue)
    }

    fn run(&mut self, count: StepCount) -> io::Result<()> {
        let echo_steps = match count {
            StepCount::Bounded(n) => n < MAX_ECHOED_STEPS,
            StepCount::Unbounded => false,
        };
        let mut echo = Echo { out: &mut self.out, echo_steps, result: Ok(()) };
        let outcome = self.env.step(count, &mut echo);
        echo.result?;
        match outcome {
            Ok(StopReason::Completed) | Ok(StopReason::Watchpoint) => {}
            Ok(StopReason::StopRequested) => writeln!(
                self.out,
                "Stopped at 0x{:08x}",
                self.env.proc().pc()
            )?,
            Ok(StopReason::Ended) => writeln!(
                self.out,
                "Program ended at 0x{:08x}",
                self.env.proc().pc()
            )?,
            Err(StepError::AlreadyEnded) => writeln!(
                self.out,
                "The program has ended; restart TEMU to run it again."
            )?,
            Err(StepError::Break(fault)) => writeln!(self.out, "{fault}")?,
        }
        Ok(())
    }

    fn show_registers(&mut self) -> io::Result<()> {
        let proc = self.env.proc();
        for (index, &name) in proc.register_names().iter().enumerate() {
            let value = proc.get_register(name).unwrap_or(0);
            write!(self.out, "${name}: 0x{value:08x}")?;
            if index % 4 == 3 {
                writeln!(self.out)?;
            } else {
                write!(self.out, "\t")?;
            }
        }
        writeln!(self.out, "PC: 0x{:08x}", proc.pc())
    }

    fn show_watchpoints(&mut self) -> io::Result<()> {
        let listings = self.env.watchpoints().list_all(self.env.proc());
        if listings.is_empty() {
            return writeln!(self.out, "No watchpoints.");
        }
        writeln!(self.out, "Num  Expression        Value")?;
        for listing in listings {
            match listing.value {
                Ok(value) => writeln!(
                    self.out,
                    "{:<4} {:<16} 0x{:08x} ({})",
                    listing.id, listing.expression, value, value
                )?,
                Err(_) => writeln!(
                    self.out,
                    "{:<4} {:<16} <error>",
                    listing.id, listing.expression
                )?,
            }
        }
        Ok(())
    }

    fn examine(&mut self, count: u32, expr: &str) -> io::Result<()> {
        let addr = match self.env.evaluate(expr) {
            Ok(addr) => addr,
            Err(error) => {
                return writeln!(self.out, "Invalid expression: {error}");
            }
        };
        writeln!(self.out, "Memory at 0x{addr:08x}:")?;
        for index in 0..count {
            let word_addr = addr.wrapping_add(4 * index);
            if index % 4 == 0 {
                write!(self.out, "0x{word_addr:08x}: ")?;
            }
            let value = self.env.bus().read(word_addr, Width::Word);
            write!(self.out, "0x{value:08x} ")?;
            if index % 4 == 3 {
                writeln!(self.out)?;
            }
        }
        if count % 4 != 0 {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn watch(&mut self, expr: String) -> io::Result<()> {
        let value = match self.env.evaluate(&expr) {
            Ok(value) => value,
            Err(error) => {
                return writeln!(self.out, "Invalid expression: {error}");
            }
        };
        match self.env.watchpoints_mut().allocate(expr.clone(), value) {
            Ok(id) => writeln!(
                self.out,
                "Watchpoint {id}: {expr} = 0x{value:08x} ({value})"
            ),
            Err(error) => writeln!(self.out, "{error}"),
        }
    }
}

//===========================================================================//


//===========================================================================//

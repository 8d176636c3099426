use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use temu::bus::{RamBus, SimBus};
use temu::db::{
    EndCondition, Monitor, SimEnv, StepCount, StepError, StopReason,
    TraceRecorder, load_program,
};
use temu::proc::{ENTRY_PC, Mips32};

//===========================================================================//

#[derive(Parser)]
#[clap(author, about, long_about = None, version)]
struct Cli {
    /// The instruction image, loaded at 0x80000000.
    #[arg(long, default_value = "inst.bin")]
    inst: PathBuf,
    /// The data image, loaded at 0x80010000, if it exists.
    #[arg(long, default_value = "data.bin")]
    data: PathBuf,
    /// Where to write the register write trace.
    #[arg(long, default_value = "golden_trace.txt")]
    trace: PathBuf,
    /// Where to write the log.
    #[arg(long, default_value = "log.txt")]
    log: PathBuf,
    /// Size of simulated memory in MiB (a power of two).
    #[arg(long, default_value_t = 128, value_parser = parse_mem_size)]
    mem_size_mb: usize,
    /// End the program when the PC reaches this (hex) address.
    #[arg(long, value_parser = parse_hex)]
    end_pc: Option<u32>,
    /// End the program when an instruction branches to itself.
    #[arg(long)]
    end_on_self_loop: bool,
    /// Run the program to completion instead of starting the monitor.
    #[arg(long)]
    batch: bool,
}

fn parse_hex(arg: &str) -> Result<u32, String> {
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u32::from_str_radix(digits, 16).map_err(|error| error.to_string())
}

fn parse_mem_size(arg: &str) -> Result<usize, String> {
    let size: usize = arg.parse().map_err(|_| format!("not a number: {arg}"))?;
    if size == 0 || !size.is_power_of_two() || size > 2048 {
        return Err(format!("{size} is not a power of two up to 2048"));
    }
    Ok(size)
}

//===========================================================================//

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .target(env_logger::Target::Pipe(Box::new(file)))
    .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;
    let mut bus: Box<dyn SimBus> = Box::new(RamBus::new(
        vec![0u8; cli.mem_size_mb << 20].into_boxed_slice(),
    ));
    load_program(&mut *bus, &cli.inst, &cli.data)?;
    let trace = match TraceRecorder::create(&cli.trace) {
        Ok(trace) => trace,
        Err(error) => {
            let path = cli.trace.display();
            println!("Warning: cannot open {path} for writing");
            log::warn!("trace file {}: {}", cli.trace.display(), error);
            TraceRecorder::new()
        }
    };
    let end = EndCondition {
        at_pc: cli.end_pc,
        on_self_loop: cli.end_on_self_loop,
    };
    let mut env = SimEnv::new(Box::new(Mips32::new(ENTRY_PC)), bus)
        .with_trace(trace)
        .with_end_condition(end);
    log::info!("{}", env.description());
    let stop = env.stop_handle();
    ctrlc::set_handler(move || stop.request())
        .map_err(|error| io::Error::other(error.to_string()))?;
    if cli.batch {
        match env.step(StepCount::Unbounded, &mut ()) {
            Ok(StopReason::Ended) => {}
            Ok(StopReason::StopRequested) => {
                println!("Stopped at 0x{:08x}", env.proc().pc())
            }
            Ok(reason) => log::info!("stopped: {reason:?}"),
            Err(StepError::Break(fault)) => println!("{fault}"),
            Err(StepError::AlreadyEnded) => {}
        }
        println!("{}", env.description());
        return Ok(());
    }
    println!(
        "Welcome to TEMU!\nThe executable is {}.\nFor help, type \"help\"",
        cli.inst.display()
    );
    let stdout = BufWriter::new(io::stdout());
    let mut monitor = Monitor::new(env, stdout);
    monitor.run_repl(io::stdin().lock())
}

//===========================================================================//

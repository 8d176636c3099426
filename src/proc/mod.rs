//! Facilities for simulating a processor.

use crate::bus::SimBus;
use thiserror::Error;

mod mips32;
mod operand;

pub use mips32::{ENTRY_PC, Mips32};
pub use operand::{Operand, OperandKind, Operands, Shape};

//===========================================================================//

/// A condition that halts the simulation.
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum SimBreak {
    /// The processor fetched an instruction word whose opcode (or funct, for
    /// R-type instructions) has no handler.  The program counter is left
    /// pointing at the offending word.
    #[error("illegal instruction 0x{word:08x} at pc 0x{pc:08x}")]
    IllegalInstruction {
        /// The address the word was fetched from.
        pc: u32,
        /// The raw instruction word.
        word: u32,
    },
}

//===========================================================================//

/// A register write-back performed by an instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RegWrite {
    /// The register number that was written.
    pub reg: u8,
    /// The value committed to the register.
    pub value: u32,
}

/// The architectural summary of one executed instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Executed {
    /// The address the instruction was fetched from.
    pub pc: u32,
    /// The raw instruction word.
    pub word: u32,
    /// Human-readable disassembly of the instruction.
    pub disassembly: String,
    /// The register write-back committed by the instruction, if any.
    pub write: Option<RegWrite>,
}

//===========================================================================//

/// A simulated processor.
pub trait SimProc {
    /// Returns a human-readable description of this simulated processor.
    fn description(&self) -> String;

    /// Disassembles the instruction at the given address, returning a
    /// human-readable string with the assembly code for that instruction.
    fn disassemble(&self, bus: &dyn SimBus, addr: u32) -> String;

    /// Returns the current address of the program counter.
    fn pc(&self) -> u32;

    /// Sets the current address of the program counter.
    fn set_pc(&mut self, addr: u32);

    /// Returns the names of this processor's registers.
    fn register_names(&self) -> &'static [&'static str];

    /// Gets the current value of the specified register, or `None` if the
    /// name is not one of this processor's registers.
    fn get_register(&self, name: &str) -> Option<u32>;

    /// Sets the value of the specified register.  Does nothing if the name is
    /// not one of this processor's registers.
    fn set_register(&mut self, name: &str, value: u32);

    /// Advances this processor by one instruction.
    fn step(&mut self, bus: &mut dyn SimBus) -> Result<Executed, SimBreak>;
}

//===========================================================================//

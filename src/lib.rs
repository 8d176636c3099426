//! Instruction-level simulator for a MIPS32 subset, with a debugging monitor.

#![warn(missing_docs)]

pub mod bus;
pub mod db;
pub mod dis;
pub mod parse;
pub mod proc;

//! Facilities for disassembling binary code.

pub mod mips32;

//===========================================================================//

//! Facilities for disassembling MIPS32 machine code.

use std::fmt;

//===========================================================================//

/// The conventional names of the 32 general-purpose registers, indexed by
/// register number.  Debugger expressions refer to these with a `$` prefix.
pub const REGISTER_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", //
    "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", //
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", //
    "t8", "t9", "k0", "k1", "gp", "sp", "fp", "ra", //
];

/// Returns the register number for the given register name (without the `$`
/// prefix), if there is one.
pub fn register_index(name: &str) -> Option<u8> {
    REGISTER_NAMES.iter().position(|&reg| reg == name).map(|i| i as u8)
}

fn reg(index: u8) -> String {
    format!("${}", REGISTER_NAMES[usize::from(index & 0x1f)])
}

//===========================================================================//

/// The primary opcode shared by all R-type instructions; the operation is
/// selected by the funct field instead.
pub const OPCODE_SPECIAL: u8 = 0x00;

/// A raw 32-bit instruction word.  Field extraction is purely positional.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct InstrWord(pub u32);

impl InstrWord {
    /// Returns the primary opcode, bits `[31:26]`.
    pub fn opcode(self) -> u8 {
        ((self.0 >> 26) & 0x3f) as u8
    }

    /// Returns the `rs` register field, bits `[25:21]`.
    pub fn rs(self) -> u8 {
        ((self.0 >> 21) & 0x1f) as u8
    }

    /// Returns the `rt` register field, bits `[20:16]`.
    pub fn rt(self) -> u8 {
        ((self.0 >> 16) & 0x1f) as u8
    }

    /// Returns the `rd` register field, bits `[15:11]`.
    pub fn rd(self) -> u8 {
        ((self.0 >> 11) & 0x1f) as u8
    }

    /// Returns the shift amount field, bits `[10:6]`.
    pub fn shamt(self) -> u8 {
        ((self.0 >> 6) & 0x1f) as u8
    }

    /// Returns the secondary opcode of an R-type instruction, bits `[5:0]`.
    pub fn funct(self) -> u8 {
        (self.0 & 0x3f) as u8
    }

    /// Returns the 16-bit immediate field, bits `[15:0]`.
    pub fn imm(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    /// Returns the immediate field sign-extended to 32 bits.
    pub fn imm_signed(self) -> u32 {
        ((u32::from(self.imm()) << 16) as i32 >> 16) as u32
    }

    /// Returns the immediate field sign-extended and scaled by four, as used
    /// by branch instructions.  Shifting left by 16 and arithmetically right
    /// by 14 does both at once.
    pub fn branch_offset(self) -> u32 {
        ((u32::from(self.imm()) << 16) as i32 >> 14) as u32
    }
}

impl fmt::LowerHex for InstrWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

//===========================================================================//

/// An operation mnemonic for the supported MIPS32 subset.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mnemonic {
    /// An ADDIU (add immediate unsigned, no overflow trap) operation.
    Addiu,
    /// An ADDU (add unsigned, no overflow trap) operation.
    Addu,
    /// An AND (bitwise AND) operation.
    And,
    /// An ANDI (bitwise AND with zero-extended immediate) operation.
    Andi,
    /// A BEQ (branch if equal) operation.
    Beq,
    /// A BLEZ (branch if less than or equal to zero) operation.
    Blez,
    /// A BNE (branch if not equal) operation.
    Bne,
    /// An LB (load sign-extended byte) operation.
    Lb,
    /// An LUI (load upper immediate) operation.
    Lui,
    /// An LW (load word) operation.
    Lw,
    /// An OR (bitwise OR) operation.
    Or,
    /// An ORI (bitwise OR with zero-extended immediate) operation.
    Ori,
    /// An SB (store byte) operation.
    Sb,
    /// An SLL (shift left logical by immediate) operation.
    Sll,
    /// An SLT (set on signed less than) operation.
    Slt,
    /// An SRLV (shift right logical by register) operation.
    Srlv,
    /// An SW (store word) operation.
    Sw,
    /// An XOR (bitwise exclusive OR) operation.
    Xor,
}

impl Mnemonic {
    /// Decodes the mnemonic of an instruction word, or returns `None` if the
    /// opcode (or funct, for R-type instructions) is not supported.
    pub fn decode(word: InstrWord) -> Option<Mnemonic> {
        let mnemonic = match word.opcode() {
            OPCODE_SPECIAL => match word.funct() {
                0x00 => Mnemonic::Sll,
                0x06 => Mnemonic::Srlv,
                0x21 => Mnemonic::Addu,
                0x24 => Mnemonic::And,
                0x25 => Mnemonic::Or,
                0x26 => Mnemonic::Xor,
                0x2a => Mnemonic::Slt,
                _ => return None,
            },
            0x04 => Mnemonic::Beq,
            0x05 => Mnemonic::Bne,
            0x06 => Mnemonic::Blez,
            0x09 => Mnemonic::Addiu,
            0x0c => Mnemonic::Andi,
            0x0d => Mnemonic::Ori,
            0x0f => Mnemonic::Lui,
            0x20 => Mnemonic::Lb,
            0x23 => Mnemonic::Lw,
            0x28 => Mnemonic::Sb,
            0x2b => Mnemonic::Sw,
            _ => return None,
        };
        Some(mnemonic)
    }

    /// Returns the assembler string for this mnemonic.
    pub fn string(self) -> &'static str {
        match self {
            Mnemonic::Addiu => "addiu",
            Mnemonic::Addu => "addu",
            Mnemonic::And => "and",
            Mnemonic::Andi => "andi",
            Mnemonic::Beq => "beq",
            Mnemonic::Blez => "blez",
            Mnemonic::Bne => "bne",
            Mnemonic::Lb => "lb",
            Mnemonic::Lui => "lui",
            Mnemonic::Lw => "lw",
            Mnemonic::Or => "or",
            Mnemonic::Ori => "ori",
            Mnemonic::Sb => "sb",
            Mnemonic::Sll => "sll",
            Mnemonic::Slt => "slt",
            Mnemonic::Srlv => "srlv",
            Mnemonic::Sw => "sw",
            Mnemonic::Xor => "xor",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.string())
    }
}

//===========================================================================//

/// Formats an instruction word with an already-decoded mnemonic as a
/// human-readable string.  `pc` gives the address the instruction was fetched
/// from, and is used to resolve branch targets.
pub fn format_instruction(
    mnemonic: Mnemonic,
    word: InstrWord,
    pc: u32,
) -> String {
    let (rs, rt, rd) = (reg(word.rs()), reg(word.rt()), reg(word.rd()));
    let imm = word.imm();
    match mnemonic {
        Mnemonic::Lui => format!("{mnemonic} {rt}, 0x{imm:04x}"),
        Mnemonic::Addiu | Mnemonic::Andi | Mnemonic::Ori => {
            format!("{mnemonic} {rt}, {rs}, 0x{imm:04x}")
        }
        Mnemonic::Beq | Mnemonic::Bne => {
            let dest = branch_target(word, pc);
            format!("{mnemonic} {rs}, {rt}, 0x{dest:08x}")
        }
        Mnemonic::Blez => {
            let dest = branch_target(word, pc);
            format!("{mnemonic} {rs}, 0x{dest:08x}")
        }
        Mnemonic::Lb | Mnemonic::Lw | Mnemonic::Sb | Mnemonic::Sw => {
            format!("{mnemonic} {rt}, {}({rs})", imm as i16)
        }
        Mnemonic::Addu
        | Mnemonic::And
        | Mnemonic::Or
        | Mnemonic::Slt
        | Mnemonic::Xor => format!("{mnemonic} {rd}, {rs}, {rt}"),
        Mnemonic::Sll => format!("{mnemonic} {rd}, {rt}, {}", word.shamt()),
        Mnemonic::Srlv => format!("{mnemonic} {rd}, {rt}, {rs}"),
    }
}

/// Returns the address a taken branch at `pc` would jump to.
pub fn branch_target(word: InstrWord, pc: u32) -> u32 {
    pc.wrapping_add(4).wrapping_add(word.branch_offset())
}

/// Disassembles a single instruction word fetched from `pc`.  Words that
/// don't decode to a supported instruction are shown as raw data.
pub fn disassemble(word: u32, pc: u32) -> String {
    let word = InstrWord(word);
    match Mnemonic::decode(word) {
        Some(mnemonic) => format_instruction(mnemonic, word, pc),
        None => format!(".word 0x{word:08x}"),
    }
}

//===========================================================================//


//===========================================================================//

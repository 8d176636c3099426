use crate::dis::mips32::InstrWord;

//===========================================================================//

/// What an operand refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperandKind {
    /// A general-purpose register, by number.
    Register(u8),
    /// A value encoded in the instruction word itself.
    Immediate,
}

/// A single decoded operand.  Operands are recomputed for every instruction
/// and reflect the register file as it was before the instruction executed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Operand {
    /// What this operand refers to.
    pub kind: OperandKind,
    /// The raw field bits from the instruction word.
    pub raw: u32,
    /// The resolved value: the register contents, or the extended
    /// immediate.
    pub value: u32,
}

impl Operand {
    fn register(index: u8, regs: &[u32; 32]) -> Operand {
        Operand {
            kind: OperandKind::Register(index),
            raw: u32::from(index),
            value: regs[usize::from(index)],
        }
    }

    // A destination register that the instruction overwrites without
    // reading.
    fn register_slot(index: u8) -> Operand {
        Operand {
            kind: OperandKind::Register(index),
            raw: u32::from(index),
            value: 0,
        }
    }

    fn immediate(raw: u32, value: u32) -> Operand {
        Operand { kind: OperandKind::Immediate, raw, value }
    }

    /// Returns the register number, if this operand is a register.
    pub fn register_index(&self) -> Option<u8> {
        match self.kind {
            OperandKind::Register(index) => Some(index),
            OperandKind::Immediate => None,
        }
    }
}

//===========================================================================//

/// The three operands every instruction is decoded into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Operands {
    /// The first source operand.
    pub src1: Operand,
    /// The second source operand.
    pub src2: Operand,
    /// The destination operand (for branches, the scaled branch offset).
    pub dest: Operand,
}

//===========================================================================//

/// The ways an instruction word can be decoded into [`Operands`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Shape {
    /// `rs`, zero-extended immediate, destination `rt`.
    ImmUnsigned,
    /// `rs`, sign-extended immediate, destination `rt`.
    ImmSigned,
    /// `rs`, `rt`, with the sign-extended immediate scaled by four in `dest`.
    Branch,
    /// Base register `rs`, sign-extended offset, and register `rt` (read as
    /// well, since stores use it as the value source).
    LoadStore,
    /// `rs`, `rt`, destination `rd`.
    Register,
    /// `rt`, unsigned shift amount, destination `rd`.
    RegisterShift,
}

impl Shape {
    /// Decodes the operands of `word` against the given register file.
    pub fn decode(self, word: InstrWord, regs: &[u32; 32]) -> Operands {
        let imm = u32::from(word.imm());
        match self {
            Shape::ImmUnsigned => Operands {
                src1: Operand::register(word.rs(), regs),
                src2: Operand::immediate(imm, imm),
                dest: Operand::register_slot(word.rt()),
            },
            Shape::ImmSigned => Operands {
                src1: Operand::register(word.rs(), regs),
                src2: Operand::immediate(imm, word.imm_signed()),
                dest: Operand::register_slot(word.rt()),
            },
            Shape::Branch => Operands {
                src1: Operand::register(word.rs(), regs),
                src2: Operand::register(word.rt(), regs),
                dest: Operand::immediate(imm, word.branch_offset()),
            },
            Shape::LoadStore => Operands {
                src1: Operand::register(word.rs(), regs),
                src2: Operand::immediate(imm, word.imm_signed()),
                dest: Operand::register(word.rt(), regs),
            },
            Shape::Register => Operands {
                src1: Operand::register(word.rs(), regs),
                src2: Operand::register(word.rt(), regs),
                dest: Operand::register_slot(word.rd()),
            },
            Shape::RegisterShift => {
                let shamt = u32::from(word.shamt());
                Operands {
                    src1: Operand::register(word.rt(), regs),
                    src2: Operand::immediate(shamt, shamt),
                    dest: Operand::register_slot(word.rd()),
                }
            }
        }
    }
}

//===========================================================================//


//===========================================================================//

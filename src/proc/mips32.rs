use super::operand::{Operand, OperandKind, Shape};
use crate::bus::{SimBus, Width};
use crate::dis::mips32::{
    InstrWord, Mnemonic, OPCODE_SPECIAL, REGISTER_NAMES, disassemble,
    format_instruction, register_index,
};
use crate::proc::{Executed, RegWrite, SimBreak, SimProc};

//===========================================================================//

/// The address execution starts from after a reset.
pub const ENTRY_PC: u32 = 0x8000_0000;

//===========================================================================//

/// What a single instruction handler did, for the fetch loop to commit.
struct Outcome {
    disassembly: String,
    write: Option<RegWrite>,
    jump: Option<u32>,
}

type Handler = fn(&mut Mips32, &mut dyn SimBus, InstrWord) -> Outcome;

const fn opcode_handlers() -> [Option<Handler>; 64] {
    let mut table: [Option<Handler>; 64] = [None; 64];
    table[0x04] = Some(op_beq as Handler);
    table[0x05] = Some(op_bne as Handler);
    table[0x06] = Some(op_blez as Handler);
    table[0x09] = Some(op_addiu as Handler);
    table[0x0c] = Some(op_andi as Handler);
    table[0x0d] = Some(op_ori as Handler);
    table[0x0f] = Some(op_lui as Handler);
    table[0x20] = Some(op_lb as Handler);
    table[0x23] = Some(op_lw as Handler);
    table[0x28] = Some(op_sb as Handler);
    table[0x2b] = Some(op_sw as Handler);
    table
}

const fn funct_handlers() -> [Option<Handler>; 64] {
    let mut table: [Option<Handler>; 64] = [None; 64];
    table[0x00] = Some(op_sll as Handler);
    table[0x06] = Some(op_srlv as Handler);
    table[0x21] = Some(op_addu as Handler);
    table[0x24] = Some(op_and as Handler);
    table[0x25] = Some(op_or as Handler);
    table[0x26] = Some(op_xor as Handler);
    table[0x2a] = Some(op_slt as Handler);
    table
}

static OPCODE_HANDLERS: [Option<Handler>; 64] = opcode_handlers();
static FUNCT_HANDLERS: [Option<Handler>; 64] = funct_handlers();

fn lookup_handler(word: InstrWord) -> Option<Handler> {
    if word.opcode() == OPCODE_SPECIAL {
        FUNCT_HANDLERS[usize::from(word.funct())]
    } else {
        OPCODE_HANDLERS[usize::from(word.opcode())]
    }
}

//===========================================================================//

fn op_lui(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Lui, Shape::ImmUnsigned, word, |_, imm| imm << 16)
}

fn op_ori(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Ori, Shape::ImmUnsigned, word, |lhs, rhs| lhs | rhs)
}

fn op_andi(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Andi, Shape::ImmUnsigned, word, |lhs, rhs| lhs & rhs)
}

fn op_addiu(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Addiu, Shape::ImmSigned, word, u32::wrapping_add)
}

fn op_beq(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.branch_if(Mnemonic::Beq, word, |lhs, rhs| lhs == rhs)
}

fn op_bne(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.branch_if(Mnemonic::Bne, word, |lhs, rhs| lhs != rhs)
}

fn op_blez(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.branch_if(Mnemonic::Blez, word, |lhs, _| (lhs as i32) <= 0)
}

fn op_lw(cpu: &mut Mips32, bus: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.load(Mnemonic::Lw, bus, word, |bus, addr| bus.read(addr, Width::Word))
}

fn op_lb(cpu: &mut Mips32, bus: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.load(Mnemonic::Lb, bus, word, |bus, addr| {
        bus.read(addr, Width::Byte) as u8 as i8 as i32 as u32
    })
}

fn op_sw(cpu: &mut Mips32, bus: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.store(Mnemonic::Sw, bus, word, Width::Word)
}

fn op_sb(cpu: &mut Mips32, bus: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.store(Mnemonic::Sb, bus, word, Width::Byte)
}

fn op_and(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::And, Shape::Register, word, |lhs, rhs| lhs & rhs)
}

fn op_or(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Or, Shape::Register, word, |lhs, rhs| lhs | rhs)
}

fn op_xor(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Xor, Shape::Register, word, |lhs, rhs| lhs ^ rhs)
}

fn op_addu(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Addu, Shape::Register, word, u32::wrapping_add)
}

fn op_sll(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Sll, Shape::RegisterShift, word, |value, shamt| {
        value << shamt
    })
}

fn op_slt(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    cpu.compute(Mnemonic::Slt, Shape::Register, word, |lhs, rhs| {
        u32::from((lhs as i32) < (rhs as i32))
    })
}

fn op_srlv(cpu: &mut Mips32, _: &mut dyn SimBus, word: InstrWord) -> Outcome {
    // The shift amount comes from rs (src1), the shifted value from rt.
    cpu.compute(Mnemonic::Srlv, Shape::Register, word, |shift, value| {
        value >> (shift & 0x1f)
    })
}

//===========================================================================//

/// A simulated MIPS32 processor, implementing the integer subset handled by
/// [`Mnemonic`].  There is no branch delay slot.
pub struct Mips32 {
    regs: [u32; 32],
    pc: u32,
}

impl Mips32 {
    /// Returns a new simulated processor with all registers cleared and the
    /// program counter at `entry`.
    pub fn new(entry: u32) -> Mips32 {
        Mips32 { regs: [0; 32], pc: entry }
    }

    /// Returns the value of the given general-purpose register.
    pub fn reg(&self, index: u8) -> u32 {
        self.regs[usize::from(index & 0x1f)]
    }

    /// Sets the value of the given general-purpose register.  Writes to
    /// `$zero` are discarded.
    pub fn set_reg(&mut self, index: u8, value: u32) {
        let index = index & 0x1f;
        if index != 0 {
            self.regs[usize::from(index)] = value;
        }
    }

    /// Returns the whole general-purpose register file.
    pub fn regs(&self) -> &[u32; 32] {
        &self.regs
    }

    fn format(&self, mnemonic: Mnemonic, word: InstrWord) -> String {
        format_instruction(mnemonic, word, self.pc)
    }

    fn write_back(&mut self, dest: Operand, value: u32) -> Option<RegWrite> {
        match dest.kind {
            OperandKind::Register(0) => None,
            OperandKind::Register(reg) => {
                self.regs[usize::from(reg)] = value;
                Some(RegWrite { reg, value })
            }
            OperandKind::Immediate => {
                debug_assert!(false, "write-back to an immediate operand");
                None
            }
        }
    }

    fn compute(
        &mut self,
        mnemonic: Mnemonic,
        shape: Shape,
        word: InstrWord,
        op: impl FnOnce(u32, u32) -> u32,
    ) -> Outcome {
        let ops = shape.decode(word, &self.regs);
        let result = op(ops.src1.value, ops.src2.value);
        let write = self.write_back(ops.dest, result);
        Outcome { disassembly: self.format(mnemonic, word), write, jump: None }
    }

    fn branch_if(
        &mut self,
        mnemonic: Mnemonic,
        word: InstrWord,
        taken: impl FnOnce(u32, u32) -> bool,
    ) -> Outcome {
        let ops = Shape::Branch.decode(word, &self.regs);
        let jump = if taken(ops.src1.value, ops.src2.value) {
            Some(self.pc.wrapping_add(4).wrapping_add(ops.dest.value))
        } else {
            None
        };
        Outcome { disassembly: self.format(mnemonic, word), write: None, jump }
    }

    fn load(
        &mut self,
        mnemonic: Mnemonic,
        bus: &mut dyn SimBus,
        word: InstrWord,
        read: impl FnOnce(&dyn SimBus, u32) -> u32,
    ) -> Outcome {
        let ops = Shape::LoadStore.decode(word, &self.regs);
        let addr = ops.src1.value.wrapping_add(ops.src2.value);
        let write = self.write_back(ops.dest, read(&*bus, addr));
        Outcome { disassembly: self.format(mnemonic, word), write, jump: None }
    }

    fn store(
        &mut self,
        mnemonic: Mnemonic,
        bus: &mut dyn SimBus,
        word: InstrWord,
        width: Width,
    ) -> Outcome {
        let ops = Shape::LoadStore.decode(word, &self.regs);
        let addr = ops.src1.value.wrapping_add(ops.src2.value);
        bus.write(addr, width, ops.dest.value);
        Outcome {
            disassembly: self.format(mnemonic, word),
            write: None,
            jump: None,
        }
    }
}

impl Default for Mips32 {
    fn default() -> Mips32 {
        Mips32::new(ENTRY_PC)
    }
}

impl SimProc for Mips32 {
    fn description(&self) -> String {
        "MIPS32 (integer subset)".to_string()
    }

    fn disassemble(&self, bus: &dyn SimBus, addr: u32) -> String {
        disassemble(bus.read(addr, Width::Word), addr)
    }

    fn pc(&self) -> u32 {
        self.pc
    }

    fn set_pc(&mut self, addr: u32) {
        self.pc = addr;
    }

    fn register_names(&self) -> &'static [&'static str] {
        &REGISTER_NAMES
    }

    fn get_register(&self, name: &str) -> Option<u32> {
        register_index(name).map(|index| self.reg(index))
    }

    fn set_register(&mut self, name: &str, value: u32) {
        if let Some(index) = register_index(name) {
            self.set_reg(index, value);
        }
    }

    fn step(&mut self, bus: &mut dyn SimBus) -> Result<Executed, SimBreak> {
        let pc = self.pc;
        let word = InstrWord(bus.read(pc, Width::Word));
        let Some(handler) = lookup_handler(word) else {
            return Err(SimBreak::IllegalInstruction { pc, word: word.0 });
        };
        let outcome = handler(self, bus, word);
        self.pc = outcome.jump.unwrap_or_else(|| pc.wrapping_add(4));
        Ok(Executed {
            pc,
            word: word.0,
            disassembly: outcome.disassembly,
            write: outcome.write,
        })
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{ENTRY_PC, Mips32, SimProc, lookup_handler};
    use crate::bus::{SimBus, Width, new_ram_bus};
    use crate::dis::mips32::{InstrWord, Mnemonic, REGISTER_NAMES};
    use crate::proc::SimBreak;

    #[test]
    fn handler_tables_match_decoder() {
        for opcode in 0..64u32 {
            for funct in 0..64u32 {
                let word = InstrWord((opcode << 26) | funct);
                assert_eq!(
                    lookup_handler(word).is_some(),
                    Mnemonic::decode(word).is_some(),
                    "word 0x{:08x}",
                    word.0
                );
            }
        }
    }

    #[test]
    fn get_registers() {
        let proc = Mips32::default();
        assert_eq!(proc.pc(), ENTRY_PC);
        for &register in proc.register_names() {
            assert_eq!(proc.get_register(register), Some(0));
        }
        assert_eq!(proc.get_register("pc"), None);
    }

    #[test]
    fn set_registers() {
        let mut proc = Mips32::default();
        for (index, &register) in REGISTER_NAMES.iter().enumerate().skip(1) {
            proc.set_register(register, index as u32 * 3);
            assert_eq!(proc.get_register(register), Some(index as u32 * 3));
        }
    }

    #[test]
    fn zero_register_is_hardwired() {
        let mut proc = Mips32::default();
        proc.set_register("zero", 0x1234);
        assert_eq!(proc.get_register("zero"), Some(0));
        let mut bus = new_ram_bus(0x100);
        // addiu $zero, $zero, 5
        bus.write(0, Width::Word, 0x2400_0005);
        let executed = proc.step(&mut *bus).unwrap();
        assert_eq!(executed.write, None);
        assert_eq!(proc.reg(0), 0);
        assert_eq!(proc.pc(), ENTRY_PC + 4);
    }

    #[test]
    fn illegal_instruction_leaves_pc() {
        let mut proc = Mips32::default();
        let mut bus = new_ram_bus(0x100);
        bus.write(0, Width::Word, 0xffff_ffff);
        assert_eq!(
            proc.step(&mut *bus),
            Err(SimBreak::IllegalInstruction {
                pc: ENTRY_PC,
                word: 0xffff_ffff
            })
        );
        assert_eq!(proc.pc(), ENTRY_PC);
    }

    #[test]
    fn disassemble_from_bus() {
        let proc = Mips32::default();
        let mut bus = new_ram_bus(0x100);
        bus.write(ENTRY_PC + 4, Width::Word, 0x3c08_1234);
        assert_eq!(proc.disassemble(&*bus, ENTRY_PC + 4), "lui $t0, 0x1234");
    }
}

//===========================================================================//

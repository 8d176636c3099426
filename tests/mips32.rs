use temu::bus::{SimBus, Width, new_ram_bus};
use temu::db::{SimEnv, StepCount, TraceEvent};
use temu::proc::{ENTRY_PC, Mips32, RegWrite, SimProc};

//===========================================================================//

fn make_test_bus() -> Box<dyn SimBus> {
    new_ram_bus(0x1000)
}

fn test_instruction_with_bus(
    bus: &mut dyn SimBus,
    pc: u32,
    word: u32,
    assembly: &str,
    registers_before: &[(&str, u32)],
    registers_after: &[(&str, u32)],
    pc_after: u32,
    write: Option<(u8, u32)>,
) {
    bus.write(pc, Width::Word, word);
    let mut proc = Mips32::new(pc);
    assert_eq!(proc.disassemble(bus, proc.pc()), assembly);
    for &(name, value) in registers_before {
        proc.set_register(name, value);
    }
    let executed = proc.step(bus).unwrap();
    assert_eq!(executed.pc, pc);
    assert_eq!(executed.word, word);
    assert_eq!(executed.disassembly, assembly);
    assert_eq!(
        executed.write,
        write.map(|(reg, value)| RegWrite { reg, value })
    );
    assert_eq!(proc.pc(), pc_after);
    for &(name, value) in registers_after {
        assert_eq!(proc.get_register(name), Some(value), "register {name}");
    }
}

fn test_instruction(
    word: u32,
    assembly: &str,
    registers_before: &[(&str, u32)],
    registers_after: &[(&str, u32)],
    write: Option<(u8, u32)>,
) {
    test_instruction_with_bus(
        &mut *make_test_bus(),
        ENTRY_PC,
        word,
        assembly,
        registers_before,
        registers_after,
        ENTRY_PC + 4,
        write,
    );
}

fn test_branch(
    pc: u32,
    word: u32,
    assembly: &str,
    registers_before: &[(&str, u32)],
    pc_after: u32,
) {
    test_instruction_with_bus(
        &mut *make_test_bus(),
        pc,
        word,
        assembly,
        registers_before,
        registers_before,
        pc_after,
        None,
    );
}

//===========================================================================//

#[test]
fn op_lui() {
    test_instruction(
        0x3c08_1234,
        "lui $t0, 0x1234",
        &[("t0", 0xffff_ffff)],
        &[("t0", 0x1234_0000)],
        Some((8, 0x1234_0000)),
    );
}

#[test]
fn op_ori_zero_extends() {
    test_instruction(
        0x3509_8001,
        "ori $t1, $t0, 0x8001",
        &[("t0", 0x1234_0000)],
        &[("t0", 0x1234_0000), ("t1", 0x1234_8001)],
        Some((9, 0x1234_8001)),
    );
}

#[test]
fn op_andi() {
    test_instruction(
        0x3109_00ff,
        "andi $t1, $t0, 0x00ff",
        &[("t0", 0x1234_5678)],
        &[("t1", 0x78)],
        Some((9, 0x78)),
    );
}

#[test]
fn op_addiu() {
    test_instruction(
        0x2408_0005,
        "addiu $t0, $zero, 0x0005",
        &[],
        &[("t0", 5)],
        Some((8, 5)),
    );
    test_instruction(
        0x2508_ffff,
        "addiu $t0, $t0, 0xffff",
        &[("t0", 0)],
        &[("t0", 0xffff_ffff)],
        Some((8, 0xffff_ffff)),
    );
    // Overflow wraps without trapping.
    test_instruction(
        0x2508_0001,
        "addiu $t0, $t0, 0x0001",
        &[("t0", 0x7fff_ffff)],
        &[("t0", 0x8000_0000)],
        Some((8, 0x8000_0000)),
    );
}

#[test]
fn op_beq() {
    test_branch(
        ENTRY_PC,
        0x1108_0002,
        "beq $t0, $t0, 0x8000000c",
        &[("t0", 17)],
        ENTRY_PC + 12,
    );
    test_branch(
        ENTRY_PC + 0x10,
        0x1000_fffd,
        "beq $zero, $zero, 0x80000008",
        &[],
        ENTRY_PC + 8,
    );
    test_branch(
        ENTRY_PC,
        0x1109_0002,
        "beq $t0, $t1, 0x8000000c",
        &[("t0", 1), ("t1", 2)],
        ENTRY_PC + 4,
    );
}

#[test]
fn op_bne() {
    test_branch(
        ENTRY_PC,
        0x1508_0002,
        "bne $t0, $t0, 0x8000000c",
        &[("t0", 17)],
        ENTRY_PC + 4,
    );
    test_branch(
        ENTRY_PC + 0x20,
        0x1509_ffff,
        "bne $t0, $t1, 0x80000020",
        &[("t0", 1), ("t1", 2)],
        ENTRY_PC + 0x20,
    );
}

#[test]
fn op_blez() {
    for (value, pc_after) in [
        (0, ENTRY_PC + 16),
        (0x8000_0000, ENTRY_PC + 16),
        (0xffff_ffff, ENTRY_PC + 16),
        (1, ENTRY_PC + 4),
        (0x7fff_ffff, ENTRY_PC + 4),
    ] {
        test_branch(
            ENTRY_PC,
            0x1900_0003,
            "blez $t0, 0x80000010",
            &[("t0", value)],
            pc_after,
        );
    }
}

#[test]
fn op_lw() {
    let mut bus = make_test_bus();
    bus.write(0x8000_0104, Width::Word, 0xdead_beef);
    test_instruction_with_bus(
        &mut *bus,
        ENTRY_PC,
        0x8fa8_0004,
        "lw $t0, 4($sp)",
        &[("sp", 0x8000_0100)],
        &[("t0", 0xdead_beef)],
        ENTRY_PC + 4,
        Some((8, 0xdead_beef)),
    );
}

#[test]
fn op_lb_sign_extends() {
    let mut bus = make_test_bus();
    bus.write(0x8000_00fc, Width::Byte, 0x80);
    bus.write(0x8000_00fd, Width::Byte, 0x7f);
    test_instruction_with_bus(
        &mut *bus,
        ENTRY_PC,
        0x83a8_fffc,
        "lb $t0, -4($sp)",
        &[("sp", 0x8000_0100)],
        &[("t0", 0xffff_ff80)],
        ENTRY_PC + 4,
        Some((8, 0xffff_ff80)),
    );
    test_instruction_with_bus(
        &mut *bus,
        ENTRY_PC,
        0x83a8_fffc,
        "lb $t0, -4($sp)",
        &[("sp", 0x8000_0101)],
        &[("t0", 0x7f)],
        ENTRY_PC + 4,
        Some((8, 0x7f)),
    );
}

#[test]
fn op_sw() {
    let mut bus = make_test_bus();
    test_instruction_with_bus(
        &mut *bus,
        ENTRY_PC,
        0xafbf_0000,
        "sw $ra, 0($sp)",
        &[("ra", 0x1122_3344), ("sp", 0x8000_0100)],
        &[("ra", 0x1122_3344)],
        ENTRY_PC + 4,
        None,
    );
    assert_eq!(bus.read(0x8000_0100, Width::Word), 0x1122_3344);
    assert_eq!(bus.read_byte(0x100), 0x44);
}

#[test]
fn op_sb() {
    let mut bus = make_test_bus();
    bus.write(0x8000_0100, Width::Word, 0x1111_1111);
    test_instruction_with_bus(
        &mut *bus,
        ENTRY_PC,
        0xa109_0001,
        "sb $t1, 1($t0)",
        &[("t0", 0x8000_0100), ("t1", 0xabcd)],
        &[("t1", 0xabcd)],
        ENTRY_PC + 4,
        None,
    );
    assert_eq!(bus.read(0x8000_0100, Width::Word), 0x1111_cd11);
}

#[test]
fn op_bitwise() {
    let before = [("t0", 0xff00_ff00), ("t1", 0x0ff0_0ff0)];
    test_instruction(
        0x0109_5024,
        "and $t2, $t0, $t1",
        &before,
        &[("t2", 0x0f00_0f00)],
        Some((10, 0x0f00_0f00)),
    );
    test_instruction(
        0x0109_5025,
        "or $t2, $t0, $t1",
        &before,
        &[("t2", 0xfff0_fff0)],
        Some((10, 0xfff0_fff0)),
    );
    test_instruction(
        0x0109_5026,
        "xor $t2, $t0, $t1",
        &before,
        &[("t2", 0xf0f0_f0f0)],
        Some((10, 0xf0f0_f0f0)),
    );
}

#[test]
fn op_addu() {
    test_instruction(
        0x0109_5021,
        "addu $t2, $t0, $t1",
        &[("t0", 0xffff_ffff), ("t1", 2)],
        &[("t2", 1)],
        Some((10, 1)),
    );
}

#[test]
fn op_slt_is_signed() {
    test_instruction(
        0x0109_502a,
        "slt $t2, $t0, $t1",
        &[("t0", 0xffff_ffff), ("t1", 1)],
        &[("t2", 1)],
        Some((10, 1)),
    );
    test_instruction(
        0x0109_502a,
        "slt $t2, $t0, $t1",
        &[("t0", 1), ("t1", 0xffff_ffff), ("t2", 7)],
        &[("t2", 0)],
        Some((10, 0)),
    );
}

#[test]
fn op_sll() {
    test_instruction(
        0x0009_5100,
        "sll $t2, $t1, 4",
        &[("t1", 0x8000_0001)],
        &[("t2", 0x10)],
        Some((10, 0x10)),
    );
}

#[test]
fn op_srlv_masks_shift_amount() {
    test_instruction(
        0x0109_5006,
        "srlv $t2, $t1, $t0",
        &[("t0", 0x24), ("t1", 0x8000_0000)],
        &[("t2", 0x0800_0000)],
        Some((10, 0x0800_0000)),
    );
}

//===========================================================================//

fn make_env(program: &[u32]) -> SimEnv {
    let mut bus = make_test_bus();
    for (index, &word) in program.iter().enumerate() {
        bus.write(ENTRY_PC + 4 * index as u32, Width::Word, word);
    }
    SimEnv::new(Box::new(Mips32::default()), bus)
}

#[test]
fn build_constant_and_trace() {
    let mut env = make_env(&[
        0x2408_0005, // addiu $t0, $zero, 5
        0x3c08_1234, // lui $t0, 0x1234
        0x3508_5678, // ori $t0, $t0, 0x5678
    ]);
    env.step(StepCount::Bounded(1), &mut ()).unwrap();
    assert_eq!(env.proc().get_register("t0"), Some(5));
    assert_eq!(env.proc().pc(), ENTRY_PC + 4);
    assert_eq!(
        env.trace().events(),
        &[TraceEvent { pc: ENTRY_PC, reg: 8, value: 5 }]
    );
    env.step(StepCount::Bounded(2), &mut ()).unwrap();
    assert_eq!(env.proc().get_register("t0"), Some(0x1234_5678));
    assert_eq!(
        env.trace().events()[1..],
        [
            TraceEvent { pc: ENTRY_PC + 4, reg: 8, value: 0x1234_0000 },
            TraceEvent { pc: ENTRY_PC + 8, reg: 8, value: 0x1234_5678 },
        ]
    );
}

#[test]
fn stores_and_branches_are_not_traced() {
    let mut env = make_env(&[
        0x3c1d_8000, // lui $sp, 0x8000
        0xafbd_0100, // sw $sp, 0x100($sp)
        0x1000_0001, // beq $zero, $zero, 1
        0x2408_0001, // addiu $t0, $zero, 1 (skipped)
        0x1508_0005, // bne $t0, $t0, 5
        0x2408_0002, // addiu $t0, $zero, 2
        0x2400_0003, // addiu $zero, $zero, 3
    ]);
    env.step(StepCount::Bounded(6), &mut ()).unwrap();
    assert_eq!(env.proc().pc(), ENTRY_PC + 28);
    assert_eq!(env.proc().get_register("t0"), Some(2));
    assert_eq!(env.proc().get_register("zero"), Some(0));
    assert_eq!(env.bus().read(0x8000_0100, Width::Word), 0x8000_0000);
    assert_eq!(
        env.trace().events(),
        &[
            TraceEvent { pc: ENTRY_PC, reg: 29, value: 0x8000_0000 },
            TraceEvent { pc: ENTRY_PC + 20, reg: 8, value: 2 },
        ]
    );
}

//===========================================================================//

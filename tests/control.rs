mod common;

use common::*;
use reil::OperandSize::*;
use reil_interp::{Error, Termination};
use reil_x86::Instruction;

#[test]
fn jmp_exits_to_target() {
    let mut machine = Machine::x86();

    let termination = machine.execute("jmp", [imm(Dword, 0x2000)]);

    assert_eq!(termination, Termination::Exited(0x2000));
    assert_eq!(machine.register("eip"), 0x2000);
}

#[test]
fn jmp_to_halt_address() {
    let mut machine = Machine::x86();

    let termination = machine.execute("jmp", [imm(Dword, 0xffff_ffffu32)]);

    assert_eq!(termination, Termination::Halted);
}

#[test]
fn conditional_jump() {
    let mut machine = Machine::x86();
    machine.set_register("ZF", 1);
    let termination = machine.execute("je", [imm(Dword, 0x2000)]);
    assert_eq!(termination, Termination::Exited(0x2000));

    let mut machine = Machine::x86();
    machine.set_register("ZF", 0);
    let termination = machine.execute("jz", [imm(Dword, 0x2000)]);
    assert_eq!(termination, Termination::EndOfProgram);
    assert_eq!(machine.register("eip"), CODE_ADDRESS.into());
}

#[test]
fn signed_and_unsigned_conditions() {
    // cmp 1, -1: below is false, less is false
    let mut machine = Machine::x86();
    machine.set_register("eax", 1);
    machine.execute("cmp", [reg(Dword, "eax"), imm(Dword, -1)]);

    for (mnemonic, taken) in [("jb", true), ("jl", false), ("ja", false), ("jg", true)] {
        let termination = machine.execute(mnemonic, [imm(Dword, 0x2000)]);
        let expected = if taken {
            Termination::Exited(0x2000)
        } else {
            Termination::EndOfProgram
        };
        assert_eq!(termination, expected, "{mnemonic}");
    }
}

#[test]
fn jecxz() {
    let mut machine = Machine::x86();
    machine.set_register("ecx", 0);
    assert_eq!(
        machine.execute("jecxz", [imm(Dword, 0x2000)]),
        Termination::Exited(0x2000)
    );

    machine.set_register("ecx", 1);
    assert_eq!(
        machine.execute("jecxz", [imm(Dword, 0x2000)]),
        Termination::EndOfProgram
    );
}

#[test]
fn loop_decrements_counter() {
    let mut machine = Machine::x86();
    machine.set_register("ecx", 2);
    assert_eq!(
        machine.execute("loop", [imm(Dword, 0x2000)]),
        Termination::Exited(0x2000)
    );
    assert_eq!(machine.register("ecx"), 1);

    assert_eq!(
        machine.execute("loop", [imm(Dword, 0x2000)]),
        Termination::EndOfProgram
    );
    assert_eq!(machine.register("ecx"), 0);
}

#[test]
fn loopne_checks_zero_flag() {
    let mut machine = Machine::x86();
    machine.set_register("ecx", 5);
    machine.set_register("ZF", 1);

    let termination = machine.execute("loopne", [imm(Dword, 0x2000)]);

    assert_eq!(termination, Termination::EndOfProgram);
    assert_eq!(machine.register("ecx"), 4);
}

#[test]
fn loope_checks_zero_flag() {
    let mut machine = Machine::x86();
    machine.set_register("ecx", 5);
    machine.set_register("ZF", 1);

    let termination = machine.execute("loope", [imm(Dword, 0x2000)]);

    assert_eq!(termination, Termination::Exited(0x2000));
}

#[test]
fn counted_loop() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0);
    machine.set_register("ecx", 5);

    let termination = machine.run(&[
        Instruction::new(0x1000, 3, "add", [reg(Dword, "eax"), imm(Byte, 2)]),
        Instruction::new(0x1003, 1, "dec", [reg(Dword, "ecx")]),
        Instruction::new(0x1004, 2, "jnz", [imm(Dword, 0x1000)]),
    ]);

    assert_eq!(termination, Termination::EndOfProgram);
    assert_eq!(machine.register("eax"), 10);
    assert_eq!(machine.register("ecx"), 0);
    assert_eq!(machine.register("eip"), 0x1004);
}

#[test]
fn system_instructions_need_a_policy() {
    let mut machine = Machine::x86();

    let result = machine.try_execute("hlt", []);

    assert!(matches!(result, Err(Error::UnknownOpcode { .. })));
}

#[test]
fn nop() {
    let mut machine = Machine::x86();

    assert_eq!(machine.execute("nop", []), Termination::EndOfProgram);
    assert_eq!(
        machine.interpreter().defined_native_registers().collect::<Vec<_>>(),
        ["eip"]
    );
}

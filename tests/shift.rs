mod common;

use common::*;
use reil::OperandSize::*;

#[test]
fn shl_by_one() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x8000_0001);

    machine.execute("shl", [reg(Dword, "eax"), imm(Byte, 1)]);

    assert_eq!(machine.register("eax"), 2);
    assert!(machine.flag("CF"));
    assert!(machine.flag("OF"));
    assert!(!machine.is_defined("AF"));
}

#[test]
fn shr_sets_carry_from_last_bit_out() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234);

    machine.execute("shr", [reg(Dword, "eax"), imm(Byte, 3)]);

    assert_eq!(machine.register("eax"), 0x246);
    assert!(machine.flag("CF"));
    assert!(!machine.is_defined("OF"));
}

#[test]
fn sar_keeps_sign() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x8000_0014);

    machine.execute("sar", [reg(Dword, "eax"), imm(Byte, 3)]);

    assert_eq!(machine.register("eax"), 0xf000_0002);
    assert!(machine.flag("CF"));
    assert!(machine.flag("SF"));
    assert!(!machine.flag("ZF"));
}

#[test]
fn sar_by_zero_changes_nothing() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x8000_0000);

    machine.execute("sar", [reg(Dword, "eax"), imm(Byte, 0)]);

    assert_eq!(machine.register("eax"), 0x8000_0000);
    for flag in STATUS_FLAGS {
        assert!(!machine.is_defined(flag), "{flag} is defined");
    }
}

#[test]
fn count_is_masked() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 1);

    machine.execute("shl", [reg(Dword, "eax"), imm(Byte, 33)]);

    assert_eq!(machine.register("eax"), 2);
}

#[test]
fn zero_count_register_keeps_flags() {
    let mut machine = Machine::x86();
    machine.clear_flags();
    machine.set_register("CF", 1);
    machine.set_register("eax", 0x1234);
    machine.set_register("ecx", 0xff00);

    machine.execute("shl", [reg(Dword, "eax"), reg(Byte, "cl")]);

    assert_eq!(machine.register("eax"), 0x1234);
    assert!(machine.flag("CF"));
    assert!(!machine.flag("ZF"));
}

#[test]
fn shift_by_register() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x10);
    machine.set_register("ecx", 4);

    machine.execute("shr", [reg(Dword, "eax"), reg(Byte, "cl")]);

    assert_eq!(machine.register("eax"), 1);
    assert!(!machine.flag("CF"));
    assert!(!machine.is_defined("OF"));
}

#[test]
fn shift_memory_operand() {
    let mut machine = Machine::x86();
    machine.set_memory(0x400, 0x81, 1);

    let operand = machine.mem(Byte, at(0x400));
    machine.execute("shl", [operand, imm(Byte, 1)]);

    assert_eq!(machine.memory(0x400, 1), 0x02);
    assert!(machine.flag("CF"));
}

#[test]
fn rol() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_5678);

    machine.execute("rol", [reg(Dword, "eax"), imm(Byte, 8)]);

    assert_eq!(machine.register("eax"), 0x3456_7812);
    assert!(!machine.flag("CF"));
    assert!(!machine.is_defined("ZF"));
}

#[test]
fn ror() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_5678);

    machine.execute("ror", [reg(Dword, "eax"), imm(Byte, 4)]);

    assert_eq!(machine.register("eax"), 0x8123_4567);
    assert!(machine.flag("CF"));
}

#[test]
fn rcl_through_carry() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x8000_0000);
    machine.set_register("CF", 0);

    machine.execute("rcl", [reg(Dword, "eax"), imm(Byte, 1)]);

    assert_eq!(machine.register("eax"), 0);
    assert!(machine.flag("CF"));
    assert!(machine.flag("OF"));
}

#[test]
fn rcr_through_carry() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 1);
    machine.set_register("CF", 1);

    machine.execute("rcr", [reg(Dword, "eax"), imm(Byte, 1)]);

    assert_eq!(machine.register("eax"), 0x8000_0000);
    assert!(machine.flag("CF"));
}

#[test]
fn shld() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_5678);
    machine.set_register("ebx", 0xabcd_ef01);

    machine.execute("shld", [reg(Dword, "eax"), reg(Dword, "ebx"), imm(Byte, 8)]);

    assert_eq!(machine.register("eax"), 0x3456_78ab);
    assert_eq!(machine.register("ebx"), 0xabcd_ef01);
    assert!(!machine.flag("CF"));
}

#[test]
fn shrd() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_5678);
    machine.set_register("ebx", 0xabcd_ef01);

    machine.execute("shrd", [reg(Dword, "eax"), reg(Dword, "ebx"), imm(Byte, 8)]);

    assert_eq!(machine.register("eax"), 0x0112_3456);
    assert!(!machine.flag("CF"));
}

#[test]
fn quad_word_shift_on_x64() {
    let mut machine = Machine::x64();
    machine.set_register("rax", 1);

    machine.execute("shl", [reg(Qword, "rax"), imm(Byte, 63)]);

    assert_eq!(machine.register("rax"), 0x8000_0000_0000_0000);
    assert!(machine.flag("SF"));
    assert!(!machine.flag("CF"));
}

#[test]
fn sar_byte_past_operand_width_fills_with_sign() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_5680);

    machine.execute("sar", [reg(Byte, "al"), imm(Byte, 10)]);

    assert_eq!(machine.register("eax"), 0x1234_56ff);
    assert!(machine.flag("CF"));
    assert!(machine.flag("SF"));
    assert!(!machine.flag("ZF"));
    assert!(machine.flag("PF"));
}

#[test]
fn sar_positive_byte_past_operand_width_is_zero() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x7f);

    machine.execute("sar", [reg(Byte, "al"), imm(Byte, 10)]);

    assert_eq!(machine.register("eax"), 0);
    assert!(!machine.flag("CF"));
    assert!(!machine.flag("SF"));
    assert!(machine.flag("ZF"));
}

#[test]
fn sar_word_past_operand_width_fills_with_sign() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_8000);

    machine.execute("sar", [reg(Word, "ax"), imm(Byte, 20)]);

    assert_eq!(machine.register("eax"), 0x1234_ffff);
    assert!(machine.flag("CF"));
    assert!(machine.flag("SF"));
}

#[test]
fn sar_byte_by_register_past_operand_width() {
    let mut machine = Machine::x86();
    machine.set_register("ebx", 0x80);
    machine.set_register("ecx", 9);

    machine.execute("sar", [reg(Byte, "bl"), reg(Byte, "cl")]);

    assert_eq!(machine.register("ebx"), 0xff);
    assert!(machine.flag("CF"));
}

#[test]
fn shr_word_past_operand_width_is_zero() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_8000);

    machine.execute("shr", [reg(Word, "ax"), imm(Byte, 20)]);

    assert_eq!(machine.register("eax"), 0x1234_0000);
    assert!(machine.flag("ZF"));
    assert!(!machine.flag("SF"));
}

#[test]
fn shl_byte_past_operand_width_is_zero() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_56ff);

    machine.execute("shl", [reg(Byte, "al"), imm(Byte, 12)]);

    assert_eq!(machine.register("eax"), 0x1234_5600);
    assert!(machine.flag("ZF"));
}

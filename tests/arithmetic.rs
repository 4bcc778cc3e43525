mod common;

use common::*;
use reil::OperandSize::*;
use reil_interp::Error;

#[test]
fn adc_adds_carry() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0xffff_ffff);
    machine.set_register("ebx", 0);
    machine.set_register("CF", 1);

    machine.execute("adc", [reg(Dword, "eax"), reg(Dword, "ebx")]);

    assert_eq!(machine.register("eax"), 0);
    assert!(machine.flag("CF"));
    assert!(machine.flag("ZF"));
    assert!(!machine.flag("OF"));
}

#[test]
fn sbb_subtracts_borrow() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0);
    machine.set_register("ebx", 0);
    machine.set_register("CF", 1);

    machine.execute("sbb", [reg(Dword, "eax"), reg(Dword, "ebx")]);

    assert_eq!(machine.register("eax"), 0xffff_ffff);
    assert!(machine.flag("CF"));
    assert!(machine.flag("SF"));
    assert!(!machine.flag("ZF"));
}

#[test]
fn sub_signed_overflow() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x8000_0000);

    machine.execute("sub", [reg(Dword, "eax"), imm(Byte, 1)]);

    assert_eq!(machine.register("eax"), 0x7fff_ffff);
    assert!(machine.flag("OF"));
    assert!(!machine.flag("CF"));
    assert!(!machine.flag("SF"));
    assert!(machine.flag("AF"));
}

#[test]
fn cmp_only_sets_flags() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 5);

    machine.execute("cmp", [reg(Dword, "eax"), imm(Dword, 7)]);

    assert_eq!(machine.register("eax"), 5);
    assert!(machine.flag("CF"));
    assert!(machine.flag("SF"));
    assert!(!machine.flag("ZF"));
    assert!(!machine.flag("OF"));
}

#[test]
fn inc_preserves_carry() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0xffff_ffff);
    machine.set_register("CF", 0);

    machine.execute("inc", [reg(Dword, "eax")]);

    assert_eq!(machine.register("eax"), 0);
    assert!(machine.flag("ZF"));
    assert!(!machine.flag("CF"));
}

#[test]
fn dec_to_negative() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0);

    machine.execute("dec", [reg(Dword, "eax")]);

    assert_eq!(machine.register("eax"), 0xffff_ffff);
    assert!(machine.flag("SF"));
    assert!(!machine.flag("OF"));
    assert!(!machine.is_defined("CF"));
}

#[test]
fn neg() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 5);
    machine.execute("neg", [reg(Dword, "eax")]);
    assert_eq!(machine.register("eax"), 0xffff_fffb);
    assert!(machine.flag("CF"));

    machine.set_register("eax", 0);
    machine.execute("neg", [reg(Dword, "eax")]);
    assert_eq!(machine.register("eax"), 0);
    assert!(!machine.flag("CF"));
    assert!(machine.flag("ZF"));
}

#[test]
fn byte_register_arithmetic() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x1234_5678);

    machine.execute("add", [reg(Byte, "al"), imm(Byte, 0x90)]);

    assert_eq!(machine.register("eax"), 0x1234_5608);
    assert!(machine.flag("CF"));
}

#[test]
fn high_byte_register_arithmetic() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x0000_ff00);

    machine.execute("add", [reg(Byte, "ah"), imm(Byte, 1)]);

    assert_eq!(machine.register("eax"), 0);
    assert!(machine.flag("CF"));
    assert!(machine.flag("ZF"));
}

#[test]
fn mul_writes_both_halves() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x8000_0000);
    machine.set_register("ebx", 4);
    machine.set_register("edx", 0xdead);

    machine.execute("mul", [reg(Dword, "ebx")]);

    assert_eq!(machine.register("eax"), 0);
    assert_eq!(machine.register("edx"), 2);
    assert!(machine.flag("CF"));
    assert!(machine.flag("OF"));
    assert!(!machine.is_defined("SF"));
    assert!(!machine.is_defined("ZF"));
}

#[test]
fn mul_byte_writes_ax() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0xffff_0010);
    machine.set_register("ebx", 0x20);

    machine.execute("mul", [reg(Byte, "bl")]);

    assert_eq!(machine.register("eax"), 0xffff_0200);
    assert!(machine.flag("CF"));
}

#[test]
fn imul_three_operands() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0);
    machine.set_register("ebx", 3);

    machine.execute("imul", [reg(Dword, "eax"), reg(Dword, "ebx"), imm(Byte, -2)]);

    assert_eq!(machine.register("eax"), 0xffff_fffa);
    assert!(!machine.flag("CF"));
    assert!(!machine.flag("OF"));
}

#[test]
fn imul_overflow() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 0x4000_0000);
    machine.set_register("ebx", 2);

    machine.execute("imul", [reg(Dword, "eax"), reg(Dword, "ebx")]);

    assert_eq!(machine.register("eax"), 0x8000_0000);
    assert!(machine.flag("CF"));
    assert!(machine.flag("OF"));
}

#[test]
fn div_unsigned() {
    let mut machine = Machine::x86();
    machine.set_register("edx", 0);
    machine.set_register("eax", 100);
    machine.set_register("ecx", 7);

    machine.execute("div", [reg(Dword, "ecx")]);

    assert_eq!(machine.register("eax"), 14);
    assert_eq!(machine.register("edx"), 2);
    for flag in STATUS_FLAGS {
        assert!(!machine.is_defined(flag), "{flag} is defined");
    }
}

#[test]
fn idiv_signed() {
    let mut machine = Machine::x86();
    machine.set_register("edx", 0xffff_ffff);
    machine.set_register("eax", (-100i32 as u32).into());
    machine.set_register("ecx", 7);

    machine.execute("idiv", [reg(Dword, "ecx")]);

    assert_eq!(machine.register("eax"), (-14i32 as u32).into());
    assert_eq!(machine.register("edx"), (-2i32 as u32).into());
}

#[test]
fn division_by_zero_faults() {
    let mut machine = Machine::x86();
    machine.set_register("edx", 0);
    machine.set_register("eax", 100);
    machine.set_register("ecx", 0);

    let result = machine.try_execute("div", [reg(Dword, "ecx")]);

    assert!(matches!(result, Err(Error::DivisionByZero { .. })));
    assert_eq!(machine.register("eax"), 100);
}

#[test]
fn xadd_exchanges_and_adds() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 1);
    machine.set_register("ebx", 2);

    machine.execute("xadd", [reg(Dword, "eax"), reg(Dword, "ebx")]);

    assert_eq!(machine.register("eax"), 3);
    assert_eq!(machine.register("ebx"), 1);
}

#[test]
fn cmpxchg_equal() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 5);
    machine.set_register("ebx", 5);
    machine.set_register("ecx", 9);

    machine.execute("cmpxchg", [reg(Dword, "ebx"), reg(Dword, "ecx")]);

    assert_eq!(machine.register("ebx"), 9);
    assert_eq!(machine.register("eax"), 5);
    assert!(machine.flag("ZF"));
}

#[test]
fn cmpxchg_not_equal() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 1);
    machine.set_register("ebx", 5);
    machine.set_register("ecx", 9);

    machine.execute("cmpxchg", [reg(Dword, "ebx"), reg(Dword, "ecx")]);

    assert_eq!(machine.register("ebx"), 5);
    assert_eq!(machine.register("eax"), 5);
    assert!(!machine.flag("ZF"));
}

#[test]
fn use_of_undefined_register_faults() {
    let mut machine = Machine::x86();
    machine.set_register("eax", 1);

    let result = machine.try_execute("add", [reg(Dword, "eax"), reg(Dword, "ebx")]);

    let Err(Error::UseOfUndefined { register, .. }) = result else {
        panic!("unexpected result {result:?}");
    };
    assert_eq!(register, "ebx");
}

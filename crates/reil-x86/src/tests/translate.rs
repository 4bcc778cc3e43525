use reil::{Opcode, OperandSize, OperandValue, ReilAddress, ReilInstruction, ReilOperand};

use crate::*;

fn translate_one(
    architecture: Architecture,
    instruction: &Instruction,
) -> Result<Vec<ReilInstruction>> {
    let mut environment = Environment::new(architecture);
    let mut out = Vec::new();
    translate(&mut environment, instruction, &mut out)?;
    Ok(out)
}

fn register(size: OperandSize, name: &str) -> OperandTree {
    OperandTree::register(size, name)
}

fn names(instructions: &[ReilInstruction]) -> Vec<&str> {
    instructions
        .iter()
        .flat_map(|instruction| instruction.operands())
        .flatten()
        .filter_map(ReilOperand::register_name)
        .collect()
}

#[test]
fn addresses_follow_native_address() -> Result<()> {
    let instruction = Instruction::new(
        0x1000,
        3,
        "add",
        [
            register(OperandSize::Dword, "eax"),
            OperandTree::immediate(OperandSize::Dword, 1),
        ],
    );

    let out = translate_one(Architecture::X86, &instruction)?;
    assert!(!out.is_empty());
    for (i, reil) in out.iter().enumerate() {
        assert_eq!(reil.address, ReilAddress::new(0x1000, i as u32));
    }

    Ok(())
}

#[test]
fn x64_dword_write_zero_extends() -> Result<()> {
    let instruction = Instruction::new(
        0,
        2,
        "mov",
        [
            register(OperandSize::Dword, "eax"),
            register(OperandSize::Dword, "ebx"),
        ],
    );

    let out = translate_one(Architecture::X64, &instruction)?;
    let last = out.last().expect("translation is not empty");
    assert_eq!(last.opcode, Opcode::Str);
    assert_eq!(
        last.third,
        Some(ReilOperand::register(OperandSize::Qword, "rax"))
    );

    Ok(())
}

#[test]
fn byte_write_merges_into_parent() -> Result<()> {
    let instruction = Instruction::new(
        0,
        2,
        "mov",
        [
            register(OperandSize::Byte, "al"),
            OperandTree::immediate(OperandSize::Byte, 1),
        ],
    );

    let out = translate_one(Architecture::X86, &instruction)?;
    let last = out.last().expect("translation is not empty");
    assert_eq!(last.opcode, Opcode::Or);
    assert_eq!(
        last.third,
        Some(ReilOperand::register(OperandSize::Dword, "eax"))
    );
    assert!(!names(&out).contains(&"al"));

    Ok(())
}

#[test]
fn failure_leaves_output_untouched() {
    let mut environment = Environment::new(Architecture::X86);
    let mut out = vec![ReilInstruction::nop(ReilAddress::new(0x10, 0))];

    let instruction = Instruction::new(0x20, 2, "mov", [register(OperandSize::Dword, "eax")]);
    assert_eq!(
        translate(&mut environment, &instruction, &mut out),
        Err(Error::InvalidOperandCount {
            mnemonic: "mov".to_owned(),
            expected: 2,
            actual: 1,
        })
    );

    let instruction = Instruction::new(
        0x20,
        2,
        "mov",
        [
            register(OperandSize::Qword, "rax"),
            register(OperandSize::Qword, "rbx"),
        ],
    );
    assert_eq!(
        translate(&mut environment, &instruction, &mut out),
        Err(Error::UnknownRegister("rbx".to_owned()))
    );

    let instruction = Instruction::new(0x20, 2, "fsqrt", []);
    assert!(translate(&mut environment, &instruction, &mut out).is_err());

    assert_eq!(out, vec![ReilInstruction::nop(ReilAddress::new(0x10, 0))]);
}

#[test]
fn immediate_destination_is_rejected() {
    let instruction = Instruction::new(
        0,
        2,
        "add",
        [
            OperandTree::immediate(OperandSize::Dword, 1),
            register(OperandSize::Dword, "eax"),
        ],
    );

    assert!(matches!(
        translate_one(Architecture::X86, &instruction),
        Err(Error::UnsupportedOperand { .. })
    ));
}

#[test]
fn repeated_string_operation_loops_internally() -> Result<()> {
    let instruction = Instruction::new(0x40, 2, "rep stosb", []);
    let out = translate_one(Architecture::X86, &instruction)?;

    let internal = out
        .iter()
        .filter(|reil| reil.opcode == Opcode::Jcc)
        .filter_map(|reil| match reil.third.as_ref().map(|operand| &operand.value) {
            Some(OperandValue::SubAddress(target)) => Some(*target),
            _ => None,
        })
        .collect::<Vec<_>>();

    // Exit when the counter is exhausted and the back edge to the start
    assert_eq!(internal.len(), 2);
    assert!(internal.contains(&ReilAddress::new(0x40, 0)));
    assert!(internal.iter().all(|target| target.native == 0x40));

    let mut environment = Environment::new(Architecture::X86);
    let function = translate_function(&mut environment, [&instruction])?;
    assert!(function.blocks().count() > 1);
    Ok(())
}

#[test]
fn system_instructions_are_unknown() -> Result<()> {
    let instruction = Instruction::new(0, 1, "hlt", []);
    let out = translate_one(Architecture::X64, &instruction)?;
    assert_eq!(out, vec![ReilInstruction::unknown(ReilAddress::new(0, 0))]);

    let instruction = Instruction::new(0, 1, "nop", []);
    let out = translate_one(Architecture::X64, &instruction)?;
    assert_eq!(out, vec![ReilInstruction::nop(ReilAddress::new(0, 0))]);
    Ok(())
}

#[test]
fn direct_jump() -> Result<()> {
    let instruction = Instruction::new(
        0x10,
        5,
        "jmp",
        [OperandTree::immediate(OperandSize::Dword, 0x2000)],
    );

    let out = translate_one(Architecture::X86, &instruction)?;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].opcode, Opcode::Jcc);
    assert_eq!(
        out[0].third,
        Some(ReilOperand::unsigned(OperandSize::Address, 0x2000))
    );
    Ok(())
}

#[test]
fn temporaries_are_unique_across_instructions() -> Result<()> {
    let mut environment = Environment::new(Architecture::X86);
    let add = Instruction::new(
        0,
        2,
        "add",
        [
            register(OperandSize::Dword, "eax"),
            register(OperandSize::Dword, "ebx"),
        ],
    );
    let sub = Instruction { address: 2, mnemonic: "sub".to_owned(), ..add.clone() };

    let mut first = Vec::new();
    translate(&mut environment, &add, &mut first)?;
    let mut second = Vec::new();
    translate(&mut environment, &sub, &mut second)?;

    let outputs = |instructions: &[ReilInstruction]| {
        instructions
            .iter()
            .filter_map(|reil| reil.third.as_ref())
            .filter(|operand| operand.is_temporary())
            .filter_map(|operand| operand.register_name().map(str::to_owned))
            .collect::<Vec<_>>()
    };

    let first = outputs(&first);
    assert!(!first.is_empty());
    for name in outputs(&second) {
        assert!(!first.contains(&name), "{name} reused");
    }

    Ok(())
}

#[test]
fn segment_bases() -> Result<()> {
    let read = |segment: Segment| {
        Instruction::new(
            0,
            6,
            "mov",
            [
                register(OperandSize::Dword, "eax"),
                OperandTree::memory(
                    OperandSize::Dword,
                    OperandSize::Dword,
                    OperandNode::segment(segment, OperandNode::Immediate(0x30)),
                ),
            ],
        )
    };

    let out = translate_one(Architecture::X86, &read(Segment::Fs))?;
    assert!(names(&out).contains(&"fsbase"));

    let out = translate_one(Architecture::X86, &read(Segment::Ds))?;
    assert!(!names(&out).contains(&"dsbase"));
    Ok(())
}

#[test]
fn rip_relative_address() -> Result<()> {
    let instruction = Instruction::new(
        0x1000,
        7,
        "lea",
        [
            register(OperandSize::Qword, "rax"),
            OperandTree::memory(
                OperandSize::Qword,
                OperandSize::Qword,
                OperandNode::add([
                    OperandNode::Register("rip".to_owned()),
                    OperandNode::Immediate(0x10),
                ]),
            ),
        ],
    );

    let out = translate_one(Architecture::X64, &instruction)?;
    assert!(!names(&out).contains(&"rip"));
    assert!(out
        .iter()
        .filter_map(|reil| reil.first.as_ref())
        .any(|operand| operand.immediate_value() == Some(0x1007)));
    Ok(())
}

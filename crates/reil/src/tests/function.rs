use crate::*;

fn reg(name: &str) -> ReilOperand {
    ReilOperand::register(OperandSize::Dword, name)
}

fn imm(value: i64) -> ReilOperand {
    ReilOperand::immediate(OperandSize::Dword, value)
}

/// Two native instructions. The first loops back to its own third REIL instruction.
fn instructions() -> Vec<ReilInstruction> {
    vec![
        ReilInstruction::str(ReilAddress::new(0x10, 0), imm(3), reg("t0")),
        ReilInstruction::sub(ReilAddress::new(0x10, 1), reg("t0"), imm(1), reg("t0")),
        ReilInstruction::jcc(
            ReilAddress::new(0x10, 2),
            reg("t0"),
            ReilOperand::sub_address(ReilAddress::new(0x10, 1)),
        ),
        ReilInstruction::nop(ReilAddress::new(0x10, 3)),
        ReilInstruction::jcc(
            ReilAddress::new(0x12, 0),
            ReilOperand::immediate(OperandSize::Byte, 1),
            ReilOperand::unsigned(OperandSize::Address, 0x10),
        ),
    ]
}

#[test]
fn splits_blocks() -> Result<()> {
    let function = ReilFunction::from_instructions(instructions())?;
    let starts = function.blocks().map(ReilBlock::address).collect::<Vec<_>>();
    assert_eq!(
        starts,
        vec![
            ReilAddress::new(0x10, 0),
            ReilAddress::new(0x10, 1),
            ReilAddress::new(0x10, 3),
            ReilAddress::new(0x12, 0),
        ]
    );
    Ok(())
}

#[test]
fn edges() -> Result<()> {
    let function = ReilFunction::from_instructions(instructions())?;

    let successors = function
        .successors(ReilAddress::new(0x10, 1))
        .collect::<Vec<_>>();
    assert_eq!(
        successors,
        vec![ReilAddress::new(0x10, 1), ReilAddress::new(0x10, 3)]
    );

    // Unconditional jump back to the start has no fallthrough
    let successors = function
        .successors(ReilAddress::new(0x12, 0))
        .collect::<Vec<_>>();
    assert_eq!(successors, vec![ReilAddress::new(0x10, 0)]);
    Ok(())
}

#[test]
fn invalid_jump_target() {
    let instructions = vec![ReilInstruction::jcc(
        ReilAddress::new(0x10, 0),
        imm(1),
        ReilOperand::sub_address(ReilAddress::new(0x10, 7)),
    )];

    assert_eq!(
        ReilFunction::from_instructions(instructions),
        Err(Error::InvalidJumpTarget {
            origin: ReilAddress::new(0x10, 0),
            target: ReilAddress::new(0x10, 7),
        })
    );
}

#[test]
fn program_groups_by_native_address() {
    let program = instructions().into_iter().rev().collect::<ReilProgram>();
    assert_eq!(program.len(), 5);
    assert_eq!(program.get(0x10).map(<[_]>::len), Some(4));
    assert_eq!(
        program.get(0x10).map(|list| list[0].address),
        Some(ReilAddress::new(0x10, 0))
    );
    assert_eq!(program.next_native_address(0x10, 15), Some(0x12));
    assert_eq!(program.next_native_address(0x10, 1), None);
    assert_eq!(program.next_native_address(0x12, 15), None);
}

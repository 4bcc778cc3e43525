use reil::{Opcode, OperandSize};

use super::stack::branch_target;
use crate::emitter::{imm, Emitter};
use crate::flags::{flag, ZERO};
use crate::{Architecture, Condition, Result};

pub(super) fn jmp(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let target = branch_target(e, 0)?;
    e.jcc(&imm(OperandSize::Byte, 1), &target);
    Ok(())
}

pub(super) fn jcc(e: &mut Emitter<'_>, condition: Condition) -> Result<()> {
    e.require_operands(1)?;
    let target = branch_target(e, 0)?;
    let taken = e.condition(condition);
    e.jcc(&taken, &target);
    Ok(())
}

/// JCXZ, JECXZ and JRCXZ jump when the counter register of the given size is zero.
pub(super) fn jcxz(e: &mut Emitter<'_>, size: OperandSize) -> Result<()> {
    e.require_operands(1)?;
    let counter = match size {
        OperandSize::Word => "cx",
        OperandSize::Dword => "ecx",
        _ => "rcx",
    };

    let target = branch_target(e, 0)?;
    let value = e.read_register(counter)?;
    let zero = e.unary(Opcode::Bisz, &value, OperandSize::Byte);
    e.jcc(&zero, &target);
    Ok(())
}

/// The counter register used by LOOP and the REP prefixes.
pub(crate) fn counter_register(e: &Emitter<'_>) -> &'static str {
    match e.environment.architecture() {
        Architecture::X86 => "ecx",
        Architecture::X64 => "rcx",
    }
}

/// Decrement the counter register and return it.
pub(crate) fn decrement_counter(e: &mut Emitter<'_>) -> Result<reil::ReilOperand> {
    let name = counter_register(e);
    let counter = e.read_register(name)?;
    let size = counter.size;
    let wide = e.binary(Opcode::Sub, &counter, &imm(size, 1), size.next_size());
    let decremented = e.truncate(&wide, size);
    e.write_register(name, &decremented)?;
    Ok(decremented)
}

/// LOOP, LOOPE and LOOPNE decrement the counter without affecting flags and jump while it is not
/// zero and the optional condition holds.
pub(super) fn loop_(e: &mut Emitter<'_>, condition: Option<Condition>) -> Result<()> {
    e.require_operands(1)?;
    let target = branch_target(e, 0)?;
    let counter = decrement_counter(e)?;
    let mut taken = e.is_not_zero(&counter);

    if let Some(condition) = condition {
        let holds = match condition {
            Condition::E => flag(ZERO),
            other => e.condition(other),
        };
        taken = e.binary(Opcode::And, &taken, &holds, OperandSize::Byte);
    }

    e.jcc(&taken, &target);
    Ok(())
}

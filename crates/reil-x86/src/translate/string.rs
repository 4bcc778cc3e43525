//! String instructions.
//!
//! With a repeat prefix the body is wrapped in a loop: the loop exits when the counter register
//! is zero, otherwise the body runs, the pointers advance, the counter is decremented and the
//! REPE and REPNE forms additionally exit when ZF is clear or set respectively.
use reil::{Opcode, OperandSize, ReilOperand};

use super::arithmetic::accumulator;
use super::control::{counter_register, decrement_counter};
use crate::emitter::{imm, reg, uimm, Emitter};
use crate::flags::{flag, DIRECTION, ZERO};
use crate::{Architecture, Prefix, Result, StringOperation};

fn source_index(e: &Emitter<'_>) -> ReilOperand {
    match e.environment.architecture() {
        Architecture::X86 => reg(OperandSize::Dword, "esi"),
        Architecture::X64 => reg(OperandSize::Qword, "rsi"),
    }
}

fn destination_index(e: &Emitter<'_>) -> ReilOperand {
    match e.environment.architecture() {
        Architecture::X86 => reg(OperandSize::Dword, "edi"),
        Architecture::X64 => reg(OperandSize::Qword, "rdi"),
    }
}

/// The signed distance a pointer moves per element: `size` when DF is clear and `-size` when it
/// is set.
fn step(e: &mut Emitter<'_>, element: OperandSize) -> ReilOperand {
    let size = e.architecture_size();
    let bytes = element.byte_size() as i128;
    let back = e.binary(Opcode::Mul, &flag(DIRECTION), &imm(size, 2 * bytes), size);
    e.binary(Opcode::Sub, &imm(size, bytes), &back, size)
}

fn advance(e: &mut Emitter<'_>, pointer: &ReilOperand, step: &ReilOperand) {
    let size = pointer.size;
    let moved = e.binary(Opcode::Add, pointer, step, size.next_size());
    e.and(&moved, &uimm(size, size.all_bits_mask()), pointer);
}

fn compare(e: &mut Emitter<'_>, lhs: &ReilOperand, rhs: &ReilOperand) -> Result<()> {
    let size = lhs.size;
    let wide = e.binary(Opcode::Sub, lhs, rhs, size.next_size());
    let result = e.truncate(&wide, size);
    e.set_sub_flags(lhs, rhs, &wide, &result)
}

/// The element size from the mnemonic suffix or the first operand.
fn element_size(e: &Emitter<'_>, size: Option<OperandSize>) -> Result<OperandSize> {
    match size {
        Some(size) => Ok(size),
        None => e.operand_size(0),
    }
}

fn body(e: &mut Emitter<'_>, operation: StringOperation, size: OperandSize) -> Result<()> {
    let source = source_index(e);
    let destination = destination_index(e);
    let step = step(e, size);

    match operation {
        StringOperation::Movs => {
            let value = e.temp(size);
            e.ldm(&source, &value);
            e.stm(&value, &destination);
            advance(e, &source, &step);
            advance(e, &destination, &step);
        }
        StringOperation::Stos => {
            let value = e.read_register(accumulator(e, size)?)?;
            e.stm(&value, &destination);
            advance(e, &destination, &step);
        }
        StringOperation::Lods => {
            let value = e.temp(size);
            e.ldm(&source, &value);
            e.write_register(accumulator(e, size)?, &value)?;
            advance(e, &source, &step);
        }
        StringOperation::Scas => {
            let value = e.temp(size);
            e.ldm(&destination, &value);
            let current = e.read_register(accumulator(e, size)?)?;
            compare(e, &current, &value)?;
            advance(e, &destination, &step);
        }
        StringOperation::Cmps => {
            let lhs = e.temp(size);
            let rhs = e.temp(size);
            e.ldm(&source, &lhs);
            e.ldm(&destination, &rhs);
            compare(e, &lhs, &rhs)?;
            advance(e, &source, &step);
            advance(e, &destination, &step);
        }
    }

    Ok(())
}

pub(super) fn string(
    e: &mut Emitter<'_>,
    operation: StringOperation,
    size: Option<OperandSize>,
    repeat: Option<Prefix>,
) -> Result<()> {
    let size = element_size(e, size)?;
    let Some(repeat) = repeat else {
        return body(e, operation, size);
    };

    let compares = matches!(operation, StringOperation::Scas | StringOperation::Cmps);
    let exit_on = match repeat {
        Prefix::Rep | Prefix::Repe if compares => Some(false),
        Prefix::Repne if compares => Some(true),
        _ => None,
    };

    let start = e.label();
    let end = e.label();
    e.bind(start);

    let counter = reg(e.architecture_size(), counter_register(e));
    let exhausted = e.unary(Opcode::Bisz, &counter, OperandSize::Byte);
    e.jcc_label(&exhausted, end);

    body(e, operation, size)?;
    decrement_counter(e)?;

    match exit_on {
        Some(false) => {
            let not_equal = e.unary(Opcode::Bisz, &flag(ZERO), OperandSize::Byte);
            e.jcc_label(&not_equal, end);
        }
        Some(true) => e.jcc_label(&flag(ZERO), end),
        None => {}
    }

    e.jump_label(start);
    e.bind(end);
    Ok(())
}

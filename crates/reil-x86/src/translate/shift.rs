//! Shifts and rotates.
//!
//! The count is masked to 5 bits, or 6 bits for quad-word operands. A masked count of zero
//! leaves the destination and every flag untouched, so the translation jumps over the whole
//! body in that case. OF is only defined for a count of one.
use reil::{Opcode, OperandSize, ReilOperand};

use crate::emitter::{imm, uimm, Emitter, Label};
use crate::flags::{flag, AUXILIARY, CARRY, OVERFLOW};
use crate::Result;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Kind {
    Left,
    LogicalRight,
    ArithmeticRight,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Rotation {
    Left,
    Right,
}

const BYTE: OperandSize = OperandSize::Byte;

/// A masked shift count. Immediate counts are resolved during translation.
enum Count {
    Immediate(u32),
    Dynamic(ReilOperand),
}

impl Count {
    fn operand(&self) -> ReilOperand {
        match self {
            Self::Immediate(count) => imm(BYTE, *count),
            Self::Dynamic(count) => count.clone(),
        }
    }
}

fn count_mask(size: OperandSize) -> u32 {
    if size == OperandSize::Qword {
        0x3F
    } else {
        0x1F
    }
}

/// Read and mask the count operand. Returns `None` if the count is the immediate zero, in which
/// case nothing is emitted.
fn read_count(e: &mut Emitter<'_>, index: usize, size: OperandSize) -> Result<Option<Count>> {
    let mask = count_mask(size);
    if let Some(count) = e.operand(index)?.immediate_value() {
        let count = (count as u32) & mask;
        return Ok((count != 0).then_some(Count::Immediate(count)));
    }

    let count = e.read(index)?;
    let masked = e.binary(Opcode::And, &count.value, &imm(count.size(), mask), BYTE);
    Ok(Some(Count::Dynamic(masked)))
}

/// Jump to `end` when a dynamic count is zero.
fn skip_if_zero(e: &mut Emitter<'_>, count: &Count, end: Label) {
    if let Count::Dynamic(count) = count {
        let zero = e.unary(Opcode::Bisz, count, BYTE);
        e.jcc_label(&zero, end);
    }
}

/// Evaluate `overflow` into OF when the count is one and undefine OF otherwise.
fn set_overflow_for_single_bit(
    e: &mut Emitter<'_>,
    count: &Count,
    overflow: impl FnOnce(&mut Emitter<'_>) -> ReilOperand,
) {
    match count {
        Count::Immediate(1) => {
            let value = overflow(&mut *e);
            e.str(&value, &flag(OVERFLOW));
        }
        Count::Immediate(_) => e.undef(&flag(OVERFLOW)),
        Count::Dynamic(count) => {
            let not_one = e.binary(Opcode::Xor, count, &imm(BYTE, 1), BYTE);
            let undefined = e.label();
            let done = e.label();
            e.jcc_label(&not_one, undefined);
            let value = overflow(&mut *e);
            e.str(&value, &flag(OVERFLOW));
            e.jump_label(done);
            e.bind(undefined);
            e.undef(&flag(OVERFLOW));
            e.bind(done);
        }
    }
}

/// `-count` as a signed byte shift amount.
fn negated(e: &mut Emitter<'_>, count: &Count) -> ReilOperand {
    match count {
        Count::Immediate(count) => imm(BYTE, -(*count as i128)),
        Count::Dynamic(count) => e.binary(Opcode::Sub, &imm(BYTE, 0), count, BYTE),
    }
}

/// `offset - count` as a signed byte shift amount.
fn offset_minus(e: &mut Emitter<'_>, offset: i128, count: &ReilOperand) -> ReilOperand {
    match count.immediate_value() {
        Some(count) => imm(BYTE, offset - count as i128),
        None => e.binary(Opcode::Sub, &imm(BYTE, offset), count, BYTE),
    }
}

/// `count + offset` as a signed byte shift amount.
fn plus(e: &mut Emitter<'_>, count: &ReilOperand, offset: i128) -> ReilOperand {
    match count.immediate_value() {
        Some(count) => imm(BYTE, count as i128 + offset),
        None => e.binary(Opcode::Add, count, &imm(BYTE, offset), BYTE),
    }
}

/// Bit `index` of `value` as a byte, where `index` is `count - 1`.
fn bit_before(e: &mut Emitter<'_>, value: &ReilOperand, count: &Count) -> ReilOperand {
    let shift = offset_minus(e, 1, &count.operand());
    let shifted = e.binary(Opcode::Bsh, value, &shift, value.size);
    e.binary(Opcode::And, &shifted, &imm(value.size, 1), BYTE)
}

/// SHL, SHR and SAR.
pub(super) fn shift(e: &mut Emitter<'_>, kind: Kind) -> Result<()> {
    e.require_operands(2)?;
    let dst = e.read(0)?;
    let size = dst.size();
    let Some(count) = read_count(e, 1, size)? else {
        e.nop();
        return Ok(());
    };

    let end = e.label();
    skip_if_zero(e, &count, end);

    let result = match kind {
        Kind::Left => {
            let wide = e.binary(Opcode::Bsh, &dst.value, &count.operand(), size.next_size());
            e.set_carry_from_wide(&wide, size)?;
            e.truncate(&wide, size)
        }
        Kind::LogicalRight => {
            let carry = bit_before(e, &dst.value, &count);
            e.str(&carry, &flag(CARRY));
            let shift = negated(e, &count);
            e.binary(Opcode::Bsh, &dst.value, &shift, size)
        }
        Kind::ArithmeticRight => {
            // The masked count may exceed the operand width
            let extended = e.sign_extend(&dst.value, OperandSize::Oword);
            let carry = bit_before(e, &extended, &count);
            e.str(&carry, &flag(CARRY));
            let shift = negated(e, &count);
            let shifted = e.binary(Opcode::Bsh, &extended, &shift, extended.size);
            e.truncate(&shifted, size)
        }
    };

    set_overflow_for_single_bit(e, &count, |e| match kind {
        Kind::Left => {
            let sign = e.msb(&result);
            e.binary(Opcode::Xor, &sign, &flag(CARRY), BYTE)
        }
        Kind::LogicalRight => e.msb(&dst.value),
        Kind::ArithmeticRight => imm(BYTE, 0),
    });
    e.set_result_flags(&result);
    e.undef(&flag(AUXILIARY));
    e.write(&dst.location, &result)?;

    e.bind(end);
    Ok(())
}

/// The rotation amount modulo `width`.
fn rotation_amount(e: &mut Emitter<'_>, count: &Count, width: u32) -> ReilOperand {
    match count {
        Count::Immediate(count) => imm(BYTE, count % width),
        Count::Dynamic(count) => e.binary(Opcode::Mod, count, &imm(BYTE, width), BYTE),
    }
}

/// Rotate the low `width` bits of `value` by `amount`.
fn rotate_bits(
    e: &mut Emitter<'_>,
    value: &ReilOperand,
    amount: &ReilOperand,
    width: u32,
    rotation: Rotation,
) -> ReilOperand {
    let size = value.size;
    let (first, second) = match rotation {
        Rotation::Left => (amount.clone(), plus(e, amount, -(width as i128))),
        Rotation::Right => {
            let right = offset_minus(e, 0, amount);
            let left = offset_minus(e, width as i128, amount);
            (right, left)
        }
    };

    let lhs = e.binary(Opcode::Bsh, value, &first, size);
    let rhs = e.binary(Opcode::Bsh, value, &second, size);
    let combined = e.binary(Opcode::Or, &lhs, &rhs, size);
    if width == size.bit_size() {
        return combined;
    }

    let mask = uimm(size, (1u128 << width) - 1);
    e.binary(Opcode::And, &combined, &mask, size)
}

/// OF after a one-bit rotation. Left rotations compare the sign with the new carry, right
/// rotations compare the two most significant bits of the result.
fn rotation_overflow(
    e: &mut Emitter<'_>,
    result: &ReilOperand,
    rotation: Rotation,
) -> ReilOperand {
    let sign = e.msb(result);
    match rotation {
        Rotation::Left => e.binary(Opcode::Xor, &sign, &flag(CARRY), BYTE),
        Rotation::Right => {
            let shift = imm(BYTE, -(result.size.bit_size() as i128 - 2));
            let shifted = e.binary(Opcode::Bsh, result, &shift, result.size);
            let next = e.binary(Opcode::And, &shifted, &imm(result.size, 1), BYTE);
            e.binary(Opcode::Xor, &sign, &next, BYTE)
        }
    }
}

/// ROL and ROR. Only CF and OF are affected.
pub(super) fn rotate(e: &mut Emitter<'_>, rotation: Rotation) -> Result<()> {
    e.require_operands(2)?;
    let dst = e.read(0)?;
    let size = dst.size();
    let Some(count) = read_count(e, 1, size)? else {
        e.nop();
        return Ok(());
    };

    let end = e.label();
    skip_if_zero(e, &count, end);

    let amount = rotation_amount(e, &count, size.bit_size());
    let result = rotate_bits(e, &dst.value, &amount, size.bit_size(), rotation);

    let carry = match rotation {
        Rotation::Left => e.binary(Opcode::And, &result, &imm(size, 1), BYTE),
        Rotation::Right => e.msb(&result),
    };
    e.str(&carry, &flag(CARRY));
    set_overflow_for_single_bit(e, &count, |e| rotation_overflow(e, &result, rotation));
    e.write(&dst.location, &result)?;

    e.bind(end);
    Ok(())
}

/// RCL and RCR rotate through CF. The value and the carry form a `size + 1` bit quantity which
/// is rotated at the next larger size.
pub(super) fn rotate_carry(e: &mut Emitter<'_>, rotation: Rotation) -> Result<()> {
    e.require_operands(2)?;
    let dst = e.read(0)?;
    let size = dst.size();
    let Some(count) = read_count(e, 1, size)? else {
        e.nop();
        return Ok(());
    };

    let end = e.label();
    skip_if_zero(e, &count, end);

    let bits = size.bit_size();
    let next = size.next_size();
    let carry_in = e.binary(Opcode::Bsh, &flag(CARRY), &imm(BYTE, bits), next);
    let value = e.binary(Opcode::Or, &carry_in, &dst.value, next);

    let amount = rotation_amount(e, &count, bits + 1);
    let rotated = rotate_bits(e, &value, &amount, bits + 1, rotation);
    let result = e.truncate(&rotated, size);
    e.bsh(&rotated, &imm(BYTE, -(bits as i128)), &flag(CARRY));

    set_overflow_for_single_bit(e, &count, |e| rotation_overflow(e, &result, rotation));
    e.write(&dst.location, &result)?;

    e.bind(end);
    Ok(())
}

/// SHLD and SHRD shift the destination while filling vacated bits from the source.
pub(super) fn double(e: &mut Emitter<'_>, direction: Rotation) -> Result<()> {
    e.require_operands(3)?;
    let dst = e.read(0)?;
    let size = dst.size();
    let src = e.read_as(1, size)?;
    let Some(count) = read_count(e, 2, size)? else {
        e.nop();
        return Ok(());
    };

    let end = e.label();
    skip_if_zero(e, &count, end);

    let bits = size.bit_size();
    let next = size.next_size();
    let result = match direction {
        Rotation::Left => {
            let high = e.binary(Opcode::Bsh, &dst.value, &imm(BYTE, bits), next);
            let joined = e.binary(Opcode::Or, &high, &src.value, next);
            let shifted = e.binary(Opcode::Bsh, &joined, &count.operand(), next);

            let carry_shift = plus(e, &count.operand(), -(bits as i128));
            let carry = e.binary(Opcode::Bsh, &dst.value, &carry_shift, size);
            e.and(&carry, &imm(size, 1), &flag(CARRY));

            e.binary(Opcode::Bsh, &shifted, &imm(BYTE, -(bits as i128)), size)
        }
        Rotation::Right => {
            let high = e.binary(Opcode::Bsh, &src.value, &imm(BYTE, bits), next);
            let joined = e.binary(Opcode::Or, &high, &dst.value, next);
            let shift = negated(e, &count);
            let shifted = e.binary(Opcode::Bsh, &joined, &shift, next);

            let carry = bit_before(e, &dst.value, &count);
            e.str(&carry, &flag(CARRY));

            e.truncate(&shifted, size)
        }
    };

    let original = dst.value.clone();
    set_overflow_for_single_bit(e, &count, |e| {
        let before = e.msb(&original);
        let after = e.msb(&result);
        e.binary(Opcode::Xor, &before, &after, BYTE)
    });
    e.set_result_flags(&result);
    e.undef(&flag(AUXILIARY));
    e.write(&dst.location, &result)?;

    e.bind(end);
    Ok(())
}

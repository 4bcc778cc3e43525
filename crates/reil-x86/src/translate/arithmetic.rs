//! Integer arithmetic. Results are computed at the next larger size so the carry is visible in
//! the untruncated value.
use reil::{Opcode, OperandSize, ReilOperand};

use crate::emitter::{imm, Emitter};
use crate::flags::{flag, AUXILIARY, CARRY, OVERFLOW, PARITY, SIGN, ZERO};
use crate::Result;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Direction {
    Add,
    Sub,
}

impl Direction {
    fn opcode(self) -> Opcode {
        match self {
            Self::Add => Opcode::Add,
            Self::Sub => Opcode::Sub,
        }
    }
}

/// Whether the carry flag feeds into the operation, as for ADC and SBB.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Carry {
    Ignore,
    Use,
}

struct Computed {
    wide: ReilOperand,
    result: ReilOperand,
}

fn compute(
    e: &mut Emitter<'_>,
    direction: Direction,
    lhs: &ReilOperand,
    rhs: &ReilOperand,
    carry: Carry,
) -> Computed {
    let size = lhs.size;
    let next = size.next_size();
    let mut wide = e.binary(direction.opcode(), lhs, rhs, next);
    if carry == Carry::Use {
        wide = e.binary(direction.opcode(), &wide, &flag(CARRY), next);
    }

    let result = e.truncate(&wide, size);
    Computed { wide, result }
}

fn set_flags(
    e: &mut Emitter<'_>,
    direction: Direction,
    lhs: &ReilOperand,
    rhs: &ReilOperand,
    computed: &Computed,
) -> Result<()> {
    match direction {
        Direction::Add => e.set_add_flags(lhs, rhs, &computed.wide, &computed.result),
        Direction::Sub => e.set_sub_flags(lhs, rhs, &computed.wide, &computed.result),
    }
}

/// ADD, ADC, SUB, SBB and CMP. CMP computes the flags of a subtraction without writing.
pub(super) fn add_sub(
    e: &mut Emitter<'_>,
    direction: Direction,
    carry: Carry,
    write: bool,
) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let dst = e.read(0)?;
    let src = e.read_as(1, size)?;

    let computed = compute(e, direction, &dst.value, &src.value, carry);
    set_flags(e, direction, &dst.value, &src.value, &computed)?;

    if write {
        e.write(&dst.location, &computed.result)?;
    }

    Ok(())
}

/// INC and DEC leave CF unchanged.
pub(super) fn inc_dec(e: &mut Emitter<'_>, direction: Direction) -> Result<()> {
    e.require_operands(1)?;
    let dst = e.read(0)?;
    let one = imm(dst.size(), 1);

    let computed = compute(e, direction, &dst.value, &one, Carry::Ignore);
    match direction {
        Direction::Add => e.set_add_overflow(&dst.value, &one, &computed.result),
        Direction::Sub => e.set_sub_overflow(&dst.value, &one, &computed.result),
    }
    e.set_auxiliary(&dst.value, &one, &computed.result);
    e.set_result_flags(&computed.result);

    e.write(&dst.location, &computed.result)
}

/// NEG is a subtraction from zero. CF is set unless the operand is zero.
pub(super) fn neg(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let dst = e.read(0)?;
    let zero = imm(dst.size(), 0);

    let computed = compute(e, Direction::Sub, &zero, &dst.value, Carry::Ignore);
    set_flags(e, Direction::Sub, &zero, &dst.value, &computed)?;

    e.write(&dst.location, &computed.result)
}

/// XADD stores the sum in the destination and the original destination in the source.
pub(super) fn xadd(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let dst = e.read(0)?;
    let src = e.read_as(1, size)?;
    let original = e.snapshot(&dst.value);

    let computed = compute(e, Direction::Add, &dst.value, &src.value, Carry::Ignore);
    set_flags(e, Direction::Add, &dst.value, &src.value, &computed)?;

    e.write(&src.location, &original)?;
    e.write(&dst.location, &computed.result)
}

/// CMPXCHG compares the accumulator with the destination. When equal the source is written to
/// the destination, otherwise the destination is loaded into the accumulator.
pub(super) fn cmpxchg(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let dst = e.read(0)?;
    let src = e.read_as(1, size)?;
    let accumulator = accumulator(e, size)?;
    let current = e.read_register(accumulator)?;

    let computed = compute(e, Direction::Sub, &current, &dst.value, Carry::Ignore);
    set_flags(e, Direction::Sub, &current, &dst.value, &computed)?;

    let equal = e.label();
    let end = e.label();
    e.jcc_label(&flag(ZERO), equal);
    e.write_register(accumulator, &dst.value)?;
    e.jump_label(end);
    e.bind(equal);
    e.write(&dst.location, &src.value)?;
    e.bind(end);

    Ok(())
}

/// The accumulator register of the given size.
pub(super) fn accumulator(e: &Emitter<'_>, size: OperandSize) -> Result<&'static str> {
    match size {
        OperandSize::Byte => Ok("al"),
        OperandSize::Word => Ok("ax"),
        OperandSize::Dword => Ok("eax"),
        OperandSize::Qword if e.architecture_size() == OperandSize::Qword => Ok("rax"),
        _ => Err(e.unsupported(format!("no accumulator of size {size}"))),
    }
}

/// The register receiving the upper half of a widened multiplication or division.
fn data_register(e: &Emitter<'_>, size: OperandSize) -> Result<&'static str> {
    match size {
        OperandSize::Word => Ok("dx"),
        OperandSize::Dword => Ok("edx"),
        OperandSize::Qword if e.architecture_size() == OperandSize::Qword => Ok("rdx"),
        _ => Err(e.unsupported(format!("no data register of size {size}"))),
    }
}

/// Split a double-width product into the accumulator and data registers. Byte products are
/// written to AX as a whole.
fn write_product(
    e: &mut Emitter<'_>,
    product: &ReilOperand,
    size: OperandSize,
) -> Result<ReilOperand> {
    let high = e.binary(
        Opcode::Bsh,
        product,
        &imm(OperandSize::Byte, -(size.bit_size() as i128)),
        size,
    );

    if size == OperandSize::Byte {
        e.write_register("ax", product)?;
        return Ok(high);
    }

    let low = e.truncate(product, size);
    let accumulator = accumulator(e, size)?;
    let data = data_register(e, size)?;
    e.write_register(accumulator, &low)?;
    e.write_register(data, &high)?;
    Ok(high)
}

/// MUL. CF and OF are set when the upper half of the product is not zero.
pub(super) fn mul(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let src = e.read(0)?;
    let size = src.size();
    let accumulator = accumulator(e, size)?;
    let lhs = e.read_register(accumulator)?;

    let product = e.binary(Opcode::Mul, &lhs, &src.value, size.next_size());
    let high = write_product(e, &product, size)?;

    e.bisz(&high, &flag(CARRY));
    e.bisz(&flag(CARRY), &flag(CARRY));
    e.str(&flag(CARRY), &flag(OVERFLOW));
    e.undefine_flags(&[SIGN, ZERO, AUXILIARY, PARITY]);

    Ok(())
}

/// Set CF and OF when a signed product does not fit in `size`.
fn set_signed_product_flags(e: &mut Emitter<'_>, product: &ReilOperand, size: OperandSize) {
    let low = e.truncate(product, size);
    let extended = e.sign_extend(&low, product.size);
    let difference = e.binary(Opcode::Xor, &extended, product, product.size);
    let overflow = e.is_not_zero(&difference);
    e.str(&overflow, &flag(CARRY));
    e.str(&overflow, &flag(OVERFLOW));
    e.undefine_flags(&[SIGN, ZERO, AUXILIARY, PARITY]);
}

/// IMUL in its one, two and three operand forms.
pub(super) fn imul(e: &mut Emitter<'_>) -> Result<()> {
    let count = e.instruction.operands.len();
    match count {
        1 => {
            let src = e.read(0)?;
            let size = src.size();
            let accumulator = accumulator(e, size)?;
            let current = e.read_register(accumulator)?;

            let lhs = e.sign_extend(&current, size.next_size());
            let rhs = e.sign_extend(&src.value, size.next_size());
            let product = e.binary(Opcode::Mul, &lhs, &rhs, size.next_size());
            set_signed_product_flags(e, &product, size);
            write_product(e, &product, size)?;
            Ok(())
        }
        2 | 3 => {
            let size = e.operand_size(0)?;
            let (lhs, rhs) = if count == 2 {
                (e.read(0)?, e.read_as(1, size)?)
            } else {
                (e.read_as(1, size)?, e.read_as(2, size)?)
            };
            let destination = e.locate(0)?;

            let lhs = e.sign_extend(&lhs.value, size.next_size());
            let rhs = e.sign_extend(&rhs.value, size.next_size());
            let product = e.binary(Opcode::Mul, &lhs, &rhs, size.next_size());
            set_signed_product_flags(e, &product, size);

            let result = e.truncate(&product, size);
            e.write(&destination, &result)
        }
        _ => e.require_operands(2),
    }
}

/// The double-width dividend of DIV and IDIV. Byte division divides AX.
fn dividend(e: &mut Emitter<'_>, size: OperandSize) -> Result<ReilOperand> {
    if size == OperandSize::Byte {
        return e.read_register("ax");
    }

    let accumulator = accumulator(e, size)?;
    let data = data_register(e, size)?;
    let low = e.read_register(accumulator)?;
    let high = e.read_register(data)?;

    let next = size.next_size();
    let shifted = e.binary(Opcode::Bsh, &high, &imm(OperandSize::Byte, size.bit_size()), next);
    Ok(e.binary(Opcode::Or, &shifted, &low, next))
}

/// Write the quotient to the accumulator and the remainder to the data register, or AL and AH
/// for byte division.
fn write_division(
    e: &mut Emitter<'_>,
    quotient: &ReilOperand,
    remainder: &ReilOperand,
    size: OperandSize,
) -> Result<()> {
    let quotient = e.truncate(quotient, size);
    let remainder = e.truncate(remainder, size);
    if size == OperandSize::Byte {
        e.write_register("al", &quotient)?;
        return e.write_register("ah", &remainder);
    }

    let accumulator = accumulator(e, size)?;
    let data = data_register(e, size)?;
    e.write_register(accumulator, &quotient)?;
    e.write_register(data, &remainder)
}

/// DIV. A quotient too large for the destination is truncated rather than faulting.
pub(super) fn div(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let divisor = e.read(0)?;
    let size = divisor.size();
    let dividend = dividend(e, size)?;

    let next = size.next_size();
    let quotient = e.binary(Opcode::Div, &dividend, &divisor.value, next);
    let remainder = e.binary(Opcode::Mod, &dividend, &divisor.value, next);
    write_division(e, &quotient, &remainder, size)?;

    e.undefine_flags(&[CARRY, OVERFLOW, SIGN, ZERO, AUXILIARY, PARITY]);
    Ok(())
}

/// IDIV divides magnitudes and then applies signs. The quotient is negative when the operand
/// signs differ and the remainder has the sign of the dividend.
pub(super) fn idiv(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let divisor = e.read(0)?;
    let size = divisor.size();
    let dividend = dividend(e, size)?;
    let next = size.next_size();

    let dividend_sign = e.msb(&dividend);
    let divisor_sign = e.msb(&divisor.value);
    let divisor_wide = e.sign_extend(&divisor.value, next);

    let dividend_magnitude = e.negate_if(&dividend, &dividend_sign);
    let divisor_magnitude = e.negate_if(&divisor_wide, &divisor_sign);

    let quotient = e.binary(Opcode::Div, &dividend_magnitude, &divisor_magnitude, next);
    let remainder = e.binary(Opcode::Mod, &dividend_magnitude, &divisor_magnitude, next);

    let quotient_sign = e.binary(Opcode::Xor, &dividend_sign, &divisor_sign, OperandSize::Byte);
    let quotient = e.negate_if(&quotient, &quotient_sign);
    let remainder = e.negate_if(&remainder, &dividend_sign);
    write_division(e, &quotient, &remainder, size)?;

    e.undefine_flags(&[CARRY, OVERFLOW, SIGN, ZERO, AUXILIARY, PARITY]);
    Ok(())
}

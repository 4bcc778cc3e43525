//! Bit scans, bit tests and byte swaps.
use reil::{Opcode, OperandSize};

use crate::emitter::{imm, uimm, Emitter};
use crate::flags::{flag, AUXILIARY, CARRY, OVERFLOW, PARITY, SIGN, ZERO};
use crate::Result;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Scan {
    /// BSF searches from the least significant bit.
    Forward,

    /// BSR searches from the most significant bit.
    Reverse,
}

/// BSF and BSR. A zero source sets ZF and leaves the destination unmodified. Otherwise ZF is
/// cleared and the index of the first set bit is written. The scan is a REIL loop over the bit
/// index.
pub(super) fn scan(e: &mut Emitter<'_>, direction: Scan) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let src = e.read_as(1, size)?;
    let destination = e.locate(0)?;

    e.undefine_flags(&[CARRY, OVERFLOW, SIGN, AUXILIARY, PARITY]);
    e.bisz(&src.value, &flag(ZERO));

    let end = e.label();
    e.jcc_label(&flag(ZERO), end);

    let (start, step) = match direction {
        Scan::Forward => (0, Opcode::Add),
        Scan::Reverse => (size.bit_size() - 1, Opcode::Sub),
    };

    let index = e.temp(size);
    e.str(&imm(size, start), &index);

    let check = e.label();
    let found = e.label();
    e.bind(check);
    let shift = e.binary(Opcode::Sub, &imm(OperandSize::Byte, 0), &index, OperandSize::Byte);
    let shifted = e.binary(Opcode::Bsh, &src.value, &shift, size);
    let bit = e.binary(Opcode::And, &shifted, &imm(size, 1), OperandSize::Byte);
    e.jcc_label(&bit, found);
    let next = e.binary(step, &index, &imm(size, 1), size);
    e.str(&next, &index);
    e.jump_label(check);

    e.bind(found);
    e.write(&destination, &index)?;
    e.bind(end);

    Ok(())
}

/// BT, BTC, BTR and BTS. The selected bit is copied to CF and then complemented, cleared or set
/// according to `update`. The bit offset is taken modulo the operand size for both register and
/// memory operands.
pub(super) fn test(e: &mut Emitter<'_>, update: Option<Opcode>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let base = e.read(0)?;
    let offset = e.read_as(1, size)?;

    let byte = OperandSize::Byte;
    let index = e.binary(Opcode::And, &offset.value, &imm(size, size.bit_size() - 1), byte);
    let shift = e.binary(Opcode::Sub, &imm(byte, 0), &index, byte);
    let shifted = e.binary(Opcode::Bsh, &base.value, &shift, size);
    e.and(&shifted, &imm(size, 1), &flag(CARRY));
    e.undefine_flags(&[OVERFLOW, SIGN, AUXILIARY, PARITY]);

    let Some(opcode) = update else {
        return Ok(());
    };

    let mask = e.binary(Opcode::Bsh, &imm(size, 1), &index, size);
    let mask = if opcode == Opcode::And {
        e.unary(Opcode::Not, &mask, size)
    } else {
        mask
    };

    let result = e.binary(opcode, &base.value, &mask, size);
    e.write(&base.location, &result)
}

/// BSWAP reverses the byte order of a 32 or 64-bit register.
pub(super) fn bswap(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let dst = e.read(0)?;
    let size = dst.size();
    if !matches!(size, OperandSize::Dword | OperandSize::Qword) {
        return Err(e.unsupported(format!("cannot swap bytes of a {size} operand")));
    }

    let bytes = size.byte_size() as i128;
    let mut result = None;
    for i in 0..bytes {
        // Byte i moves to byte (bytes - 1 - i)
        let distance = 8 * (bytes - 1 - 2 * i);
        let moved = e.binary(Opcode::Bsh, &dst.value, &imm(OperandSize::Byte, distance), size);
        let mask = uimm(size, 0xFF << (8 * (bytes - 1 - i)));
        let placed = e.binary(Opcode::And, &moved, &mask, size);

        result = Some(match result {
            None => placed,
            Some(result) => e.binary(Opcode::Or, &result, &placed, size),
        });
    }

    match result {
        Some(result) => e.write(&dst.location, &result),
        None => Ok(()),
    }
}

//! Data movement, sign extension and flag transfer.
use reil::{Opcode, OperandSize};

use crate::emitter::{imm, Emitter};
use crate::flags::{flag, AUXILIARY, CARRY, PARITY, SIGN, ZERO};
use crate::{Architecture, Condition, OperandNode, Result};

pub(super) fn mov(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let src = e.read_as(1, size)?;
    let destination = e.locate(0)?;
    e.write(&destination, &src.value)
}

/// MOVSX and MOVSXD.
pub(super) fn movsx(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let src = e.read(1)?;
    let destination = e.locate(0)?;

    let extended = e.sign_extend(&src.value, size);
    e.write(&destination, &extended)
}

pub(super) fn movzx(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let src = e.read(1)?;
    let destination = e.locate(0)?;

    let extended = e.truncate(&src.value, size);
    e.write(&destination, &extended)
}

/// LEA writes the effective address of its memory operand without accessing memory.
pub(super) fn lea(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let OperandNode::MemDeref(address) = e.operand(1)?.value().clone() else {
        return Err(e.unsupported("source must be a memory operand"));
    };

    let address = e.address(&address)?;
    let destination = e.locate(0)?;
    let address = e.truncate(&address, size);
    e.write(&destination, &address)
}

pub(super) fn xchg(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let first = e.read(0)?;
    let second = e.read_as(1, size)?;

    let saved = e.snapshot(&first.value);
    e.write(&first.location, &second.value)?;
    e.write(&second.location, &saved)
}

/// CMOVcc selects between the source and the destination without branching so that the
/// destination is always written. A 32-bit destination on x64 is therefore always zero-extended.
pub(super) fn cmov(e: &mut Emitter<'_>, condition: Condition) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let dst = e.read(0)?;
    let src = e.read_as(1, size)?;

    let taken = e.condition(condition);
    let value = e.select(&taken, &src.value, &dst.value, size);
    e.write(&dst.location, &value)
}

pub(super) fn set(e: &mut Emitter<'_>, condition: Condition) -> Result<()> {
    e.require_operands(1)?;
    let destination = e.locate(0)?;
    let value = e.condition(condition);
    e.write(&destination, &value)
}

/// CBW, CWDE and CDQE sign-extend the accumulator in place.
pub(super) fn extend_accumulator(e: &mut Emitter<'_>, from: &str, to: &str) -> Result<()> {
    e.require_operands(0)?;
    let to_size = e
        .environment
        .lookup(to)
        .map(|register| register.size)
        .ok_or_else(|| e.unsupported(format!("{to} is not available")))?;

    let value = e.read_register(from)?;
    let extended = e.sign_extend(&value, to_size);
    e.write_register(to, &extended)
}

/// CWD and CQO fill the data register with the sign of the accumulator.
pub(super) fn extend_into_data(e: &mut Emitter<'_>, from: &str, to: &str) -> Result<()> {
    e.require_operands(0)?;
    let value = e.read_register(from)?;
    let sign = e.msb(&value);
    let filled = e.spread(&sign, value.size);
    e.write_register(to, &filled)
}

/// CDQ fills EDX with the sign of EAX. On x64 the sign of RAX is spread across RDX, which makes
/// it equivalent to CQO.
pub(super) fn cdq(e: &mut Emitter<'_>) -> Result<()> {
    match e.environment.architecture() {
        Architecture::X86 => extend_into_data(e, "eax", "edx"),
        Architecture::X64 => extend_into_data(e, "rax", "rdx"),
    }
}

/// LAHF loads SF, ZF, AF, PF and CF into AH. Bit 1 is always set.
pub(super) fn lahf(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(0)?;
    let packed = e.pack_flags(OperandSize::Byte);
    e.write_register("ah", &packed)
}

/// SAHF stores AH into SF, ZF, AF, PF and CF.
pub(super) fn sahf(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(0)?;
    let value = e.read_register("ah")?;
    for (name, bit) in [(CARRY, 0), (PARITY, 2), (AUXILIARY, 4), (ZERO, 6), (SIGN, 7)] {
        let shifted = e.binary(Opcode::Bsh, &value, &imm(OperandSize::Byte, -bit), value.size);
        e.and(&shifted, &imm(value.size, 1), &flag(name));
    }

    Ok(())
}

/// XLAT loads AL from the table at EBX or RBX indexed by AL.
pub(super) fn xlat(e: &mut Emitter<'_>) -> Result<()> {
    let size = e.architecture_size();
    let base = match e.environment.architecture() {
        Architecture::X86 => "ebx",
        Architecture::X64 => "rbx",
    };

    let base = e.read_register(base)?;
    let index = e.read_register("al")?;
    let sum = e.binary(Opcode::Add, &base, &index, size.next_size());
    let address = e.truncate(&sum, size);

    let value = e.temp(OperandSize::Byte);
    e.ldm(&address, &value);
    e.write_register("al", &value)
}

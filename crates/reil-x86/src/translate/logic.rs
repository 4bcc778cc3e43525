use reil::Opcode;

use crate::emitter::Emitter;
use crate::Result;

/// AND, OR, XOR and TEST. TEST only sets flags.
pub(super) fn binary(e: &mut Emitter<'_>, opcode: Opcode, write: bool) -> Result<()> {
    e.require_operands(2)?;
    let size = e.operand_size(0)?;
    let dst = e.read(0)?;
    let src = e.read_as(1, size)?;

    let result = e.binary(opcode, &dst.value, &src.value, size);
    e.set_logic_flags(&result);

    if write {
        e.write(&dst.location, &result)?;
    }

    Ok(())
}

/// NOT does not affect any flag.
pub(super) fn not(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let dst = e.read(0)?;
    let result = e.unary(Opcode::Not, &dst.value, dst.size());
    e.write(&dst.location, &result)
}

use crate::emitter::Emitter;
use crate::flags::{flag, CARRY};
use crate::Result;

/// CLC, STC, CLD, STD, CLI and STI.
pub(super) fn set_flag(e: &mut Emitter<'_>, name: &str, value: bool) -> Result<()> {
    e.require_operands(0)?;
    e.set_flag(name, value);
    Ok(())
}

pub(super) fn complement_carry(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(0)?;
    e.bisz(&flag(CARRY), &flag(CARRY));
    Ok(())
}

/// Instructions whose effect lies outside the register file and memory are left to the
/// interpreter policy.
pub(super) fn unknown(e: &mut Emitter<'_>) -> Result<()> {
    e.unknown();
    Ok(())
}

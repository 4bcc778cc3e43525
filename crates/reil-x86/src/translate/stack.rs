//! Stack manipulation and subroutine calls.
//!
//! A push moves the stack pointer down before storing. A pop loads before moving the stack
//! pointer up, and a memory destination of a pop is located with the updated stack pointer.
use reil::{Opcode, OperandSize, ReilOperand};

use crate::emitter::{imm, reg, uimm, Emitter};
use crate::{Architecture, Result};

fn stack_pointer(e: &Emitter<'_>) -> ReilOperand {
    reg(e.architecture_size(), e.environment.stack_pointer())
}

/// Move the stack pointer by `delta` bytes, wrapping at the address size.
fn adjust_stack(e: &mut Emitter<'_>, delta: i128) {
    let size = e.architecture_size();
    let sp = stack_pointer(e);
    let moved = e.binary(Opcode::Add, &sp, &imm(size, delta), size.next_size());
    e.and(&moved, &uimm(size, size.all_bits_mask()), &sp);
}

/// Push a value whose size determines how far the stack pointer moves.
pub(super) fn push_value(e: &mut Emitter<'_>, value: &ReilOperand) {
    adjust_stack(e, -(value.size.byte_size() as i128));
    let sp = stack_pointer(e);
    e.stm(value, &sp);
}

/// Pop a value of the given size.
pub(super) fn pop_value(e: &mut Emitter<'_>, size: OperandSize) -> ReilOperand {
    let sp = stack_pointer(e);
    let value = e.temp(size);
    e.ldm(&sp, &value);
    adjust_stack(e, size.byte_size() as i128);
    value
}

/// Whether the operand at `index` names a register overlapping the stack pointer.
fn is_stack_pointer(e: &Emitter<'_>, index: usize) -> bool {
    let stack_pointer = e.environment.stack_pointer();
    e.operand(index)
        .ok()
        .and_then(|operand| operand.register_name())
        .and_then(|name| e.environment.slice(name).ok())
        .is_some_and(|slice| slice.root.name == stack_pointer)
}

/// PUSH. Immediates are pushed as at least 32-bit values.
pub(super) fn push(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let size = e.operand_size(0)?;
    let src = if e.operand(0)?.immediate_value().is_some() {
        let size = size.max(OperandSize::Dword);
        e.read_as(0, size)?
    } else {
        e.read(0)?
    };

    // The stored value is the stack pointer from before the push
    let value = if is_stack_pointer(e, 0) {
        e.snapshot(&src.value)
    } else {
        src.value
    };

    push_value(e, &value);
    Ok(())
}

pub(super) fn pop(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let size = e.operand_size(0)?;
    let value = pop_value(e, size);
    let destination = e.locate(0)?;
    e.write(&destination, &value)
}

const PUSHA_DWORD: [&str; 8] = ["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"];
const PUSHA_WORD: [&str; 8] = ["ax", "cx", "dx", "bx", "sp", "bp", "si", "di"];

fn pusha_registers(e: &Emitter<'_>, size: Option<OperandSize>) -> Result<[&'static str; 8]> {
    if e.environment.architecture() != Architecture::X86 {
        return Err(e.unsupported("not available in 64-bit mode"));
    }

    match size.unwrap_or(OperandSize::Dword) {
        OperandSize::Word => Ok(PUSHA_WORD),
        _ => Ok(PUSHA_DWORD),
    }
}

/// PUSHA pushes the general purpose registers. The stack pointer pushed is its value before the
/// first push.
pub(super) fn pusha(e: &mut Emitter<'_>, size: Option<OperandSize>) -> Result<()> {
    e.require_operands(0)?;
    let registers = pusha_registers(e, size)?;
    let original = {
        let sp = e.read_register(registers[4])?;
        e.snapshot(&sp)
    };

    for (i, name) in registers.into_iter().enumerate() {
        let value = if i == 4 {
            original.clone()
        } else {
            e.read_register(name)?
        };
        push_value(e, &value);
    }

    Ok(())
}

/// POPA restores the general purpose registers in reverse order. The saved stack pointer is
/// skipped.
pub(super) fn popa(e: &mut Emitter<'_>, size: Option<OperandSize>) -> Result<()> {
    e.require_operands(0)?;
    let registers = pusha_registers(e, size)?;
    let register_size = if registers == PUSHA_WORD {
        OperandSize::Word
    } else {
        OperandSize::Dword
    };

    for (i, name) in registers.into_iter().enumerate().rev() {
        if i == 4 {
            adjust_stack(e, register_size.byte_size() as i128);
            continue;
        }

        let value = pop_value(e, register_size);
        e.write_register(name, &value)?;
    }

    Ok(())
}

/// LEAVE releases the stack frame: the stack pointer is set to the frame pointer which is then
/// popped.
pub(super) fn leave(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(0)?;
    let size = e.architecture_size();
    let frame_pointer = match e.environment.architecture() {
        Architecture::X86 => "ebp",
        Architecture::X64 => "rbp",
    };

    let sp = stack_pointer(e);
    e.str(&reg(size, frame_pointer), &sp);
    let value = pop_value(e, size);
    e.write_register(frame_pointer, &value)
}

/// Flags register sizes for PUSHF and POPF.
fn flags_size(e: &Emitter<'_>, size: Option<OperandSize>) -> OperandSize {
    size.unwrap_or_else(|| e.architecture_size())
}

pub(super) fn pushf(e: &mut Emitter<'_>, size: Option<OperandSize>) -> Result<()> {
    e.require_operands(0)?;
    let size = flags_size(e, size);
    let packed = e.pack_flags(size);
    push_value(e, &packed);
    Ok(())
}

pub(super) fn popf(e: &mut Emitter<'_>, size: Option<OperandSize>) -> Result<()> {
    e.require_operands(0)?;
    let size = flags_size(e, size);
    let value = pop_value(e, size);
    e.unpack_flags(&value);
    Ok(())
}

/// The target of a branch: immediates are absolute native addresses.
pub(super) fn branch_target(e: &mut Emitter<'_>, index: usize) -> Result<ReilOperand> {
    if let Some(target) = e.operand(index)?.immediate_value() {
        let target = u64::try_from(target)
            .map_err(|_| e.unsupported(format!("invalid branch target {target:#x}")))?;
        return Ok(ReilOperand::unsigned(OperandSize::Address, u128::from(target)));
    }

    Ok(e.read(index)?.value)
}

/// CALL pushes the address of the next instruction and jumps to the target. The target is read
/// before the push so a target relative to the stack pointer sees its original value.
pub(super) fn call(e: &mut Emitter<'_>) -> Result<()> {
    e.require_operands(1)?;
    let target = branch_target(e, 0)?;
    let target = e.snapshot(&target);

    let size = e.architecture_size();
    let return_address = ReilOperand::unsigned(size, u128::from(e.instruction.next_address()));
    push_value(e, &return_address);
    e.jcc(&imm(OperandSize::Byte, 1), &target);
    Ok(())
}

/// RET pops the return address and optionally releases additional bytes of arguments.
pub(super) fn ret(e: &mut Emitter<'_>) -> Result<()> {
    let size = e.architecture_size();
    let release = match e.instruction.operands.len() {
        0 => 0,
        1 => e
            .operand(0)?
            .immediate_value()
            .ok_or_else(|| e.unsupported("release count must be an immediate"))?,
        _ => return e.require_operands(1),
    };

    let target = pop_value(e, size);
    if release != 0 {
        adjust_stack(e, release);
    }

    e.jcc(&imm(OperandSize::Byte, 1), &target);
    Ok(())
}

//! Status flag derivation. Flags are byte-sized registers holding 0 or 1.
use reil::{Opcode, OperandSize, ReilOperand};

use crate::emitter::{imm, reg, uimm, Emitter};
use crate::Result;

pub const CARRY: &str = "CF";
pub const PARITY: &str = "PF";
pub const AUXILIARY: &str = "AF";
pub const ZERO: &str = "ZF";
pub const SIGN: &str = "SF";
pub const INTERRUPT: &str = "IF";
pub const DIRECTION: &str = "DF";
pub const OVERFLOW: &str = "OF";

/// Every flag register written by translated code.
pub const FLAGS: [&str; 8] = [
    CARRY, PARITY, AUXILIARY, ZERO, SIGN, INTERRUPT, DIRECTION, OVERFLOW,
];

/// Bit positions of the flags in the native flags register.
pub(crate) const FLAG_BITS: [(&str, u32); 8] = [
    (CARRY, 0),
    (PARITY, 2),
    (AUXILIARY, 4),
    (ZERO, 6),
    (SIGN, 7),
    (INTERRUPT, 9),
    (DIRECTION, 10),
    (OVERFLOW, 11),
];

/// Bit 1 of the native flags register always reads as 1.
pub(crate) const RESERVED_FLAG_BITS: u128 = 1 << 1;

pub(crate) fn flag(name: &str) -> ReilOperand {
    reg(OperandSize::Byte, name)
}

impl Emitter<'_> {
    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.str(&imm(OperandSize::Byte, i128::from(value)), &flag(name));
    }

    pub fn undefine_flags(&mut self, names: &[&str]) {
        for name in names {
            self.undef(&flag(name));
        }
    }

    pub fn set_sign(&mut self, result: &ReilOperand) {
        let shift = imm(OperandSize::Byte, -(result.size.bit_size() as i128 - 1));
        self.bsh(result, &shift, &flag(SIGN));
    }

    pub fn set_zero(&mut self, result: &ReilOperand) {
        self.bisz(result, &flag(ZERO));
    }

    /// PF is 1 when the low byte of the result has an even number of set bits. The low byte is
    /// folded to a nibble which indexes the parity table `0x9669`.
    pub fn set_parity(&mut self, result: &ReilOperand) {
        let byte = OperandSize::Byte;
        let low = self.binary(Opcode::And, result, &uimm(result.size, 0xFF), byte);
        let high_nibble = self.binary(Opcode::Bsh, &low, &imm(byte, -4), byte);
        let folded = self.binary(Opcode::Xor, &low, &high_nibble, byte);
        let nibble = self.binary(Opcode::And, &folded, &imm(byte, 0xF), byte);

        let dword = OperandSize::Dword;
        let table = self.binary(Opcode::Bsh, &uimm(dword, 0x9669), &nibble, dword);
        let bit = self.binary(Opcode::And, &table, &uimm(dword, 0x8000), dword);
        self.bsh(&bit, &imm(byte, -15), &flag(PARITY));
    }

    /// AF is the carry or borrow out of bit 3.
    pub fn set_auxiliary(&mut self, lhs: &ReilOperand, rhs: &ReilOperand, result: &ReilOperand) {
        let size = result.size;
        let inputs = self.binary(Opcode::Xor, lhs, rhs, size);
        let carries = self.binary(Opcode::Xor, &inputs, result, size);
        let nibble_carry = self.binary(Opcode::And, &carries, &uimm(size, 0x10), size);
        self.bsh(&nibble_carry, &imm(OperandSize::Byte, -4), &flag(AUXILIARY));
    }

    /// CF is the bit just above the operand size in a widened result.
    pub fn set_carry_from_wide(&mut self, wide: &ReilOperand, size: OperandSize) -> Result<()> {
        let carry = self.binary(Opcode::And, wide, &uimm(wide.size, size.carry_mask()?), wide.size);
        let shift = imm(OperandSize::Byte, -(size.bit_size() as i128));
        self.bsh(&carry, &shift, &flag(CARRY));
        Ok(())
    }

    /// SF, ZF and PF from a truncated result.
    pub fn set_result_flags(&mut self, result: &ReilOperand) {
        self.set_sign(result);
        self.set_zero(result);
        self.set_parity(result);
    }

    /// Flags of AND, OR, XOR and TEST. CF and OF are cleared and AF is undefined.
    pub fn set_logic_flags(&mut self, result: &ReilOperand) {
        self.set_result_flags(result);
        self.set_flag(CARRY, false);
        self.set_flag(OVERFLOW, false);
        self.undef(&flag(AUXILIARY));
    }

    /// OF of an addition: both inputs have a sign different from the result.
    pub fn set_add_overflow(&mut self, lhs: &ReilOperand, rhs: &ReilOperand, result: &ReilOperand) {
        let size = result.size;
        let lhs_changed = self.binary(Opcode::Xor, lhs, result, size);
        let rhs_changed = self.binary(Opcode::Xor, rhs, result, size);
        let both = self.binary(Opcode::And, &lhs_changed, &rhs_changed, size);
        let shift = imm(OperandSize::Byte, -(size.bit_size() as i128 - 1));
        self.bsh(&both, &shift, &flag(OVERFLOW));
    }

    /// OF of a subtraction: the inputs have different signs and the result sign differs from the
    /// minuend.
    pub fn set_sub_overflow(&mut self, lhs: &ReilOperand, rhs: &ReilOperand, result: &ReilOperand) {
        let size = result.size;
        let inputs_differ = self.binary(Opcode::Xor, lhs, rhs, size);
        let lhs_changed = self.binary(Opcode::Xor, lhs, result, size);
        let both = self.binary(Opcode::And, &inputs_differ, &lhs_changed, size);
        let shift = imm(OperandSize::Byte, -(size.bit_size() as i128 - 1));
        self.bsh(&both, &shift, &flag(OVERFLOW));
    }

    /// All six arithmetic flags of an addition whose untruncated result is `wide`.
    pub fn set_add_flags(
        &mut self,
        lhs: &ReilOperand,
        rhs: &ReilOperand,
        wide: &ReilOperand,
        result: &ReilOperand,
    ) -> Result<()> {
        self.set_carry_from_wide(wide, result.size)?;
        self.set_add_overflow(lhs, rhs, result);
        self.set_auxiliary(lhs, rhs, result);
        self.set_result_flags(result);
        Ok(())
    }

    /// All six arithmetic flags of a subtraction. A borrow wraps the widened result so CF is
    /// also the bit above the operand size.
    pub fn set_sub_flags(
        &mut self,
        lhs: &ReilOperand,
        rhs: &ReilOperand,
        wide: &ReilOperand,
        result: &ReilOperand,
    ) -> Result<()> {
        self.set_carry_from_wide(wide, result.size)?;
        self.set_sub_overflow(lhs, rhs, result);
        self.set_auxiliary(lhs, rhs, result);
        self.set_result_flags(result);
        Ok(())
    }

    /// Pack the flags into the layout of the native flags register.
    pub fn pack_flags(&mut self, size: OperandSize) -> ReilOperand {
        let mut packed = uimm(size, RESERVED_FLAG_BITS);
        for (name, bit) in FLAG_BITS {
            if size.bit_size() <= bit {
                continue;
            }

            let shifted = self.binary(Opcode::Bsh, &flag(name), &imm(OperandSize::Byte, bit), size);
            packed = self.binary(Opcode::Or, &packed, &shifted, size);
        }

        packed
    }

    /// Set every flag that fits in `value` from its bit in the native flags register layout.
    pub fn unpack_flags(&mut self, value: &ReilOperand) {
        for (name, bit) in FLAG_BITS {
            if value.size.bit_size() <= bit {
                continue;
            }

            let shifted = self.binary(
                Opcode::Bsh,
                value,
                &imm(OperandSize::Byte, -(bit as i128)),
                value.size,
            );
            self.and(&shifted, &imm(value.size, 1), &flag(name));
        }
    }
}

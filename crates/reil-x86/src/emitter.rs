use reil::{Opcode, OperandSize, OperandValue, ReilAddress, ReilInstruction, ReilOperand};

use crate::{Environment, Error, Instruction, Result};

/// Immediate operand encoded at the given size.
pub(crate) fn imm(size: OperandSize, value: impl Into<i128>) -> ReilOperand {
    ReilOperand::immediate(size, value)
}

/// Immediate operand from an unsigned bit pattern truncated to the given size.
pub(crate) fn uimm(size: OperandSize, value: u128) -> ReilOperand {
    ReilOperand::unsigned(size, value)
}

pub(crate) fn reg(size: OperandSize, name: impl Into<String>) -> ReilOperand {
    ReilOperand::register(size, name)
}

/// Forward or backward reference to a position in the REIL code of the current instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Label(usize);

/// Accumulates the REIL translation of a single native instruction.
///
/// Instructions are addressed by the native address of the instruction being translated and their
/// position in the translation. Jumps to labels are patched with the bound sub-address when the
/// translation is finished.
pub(crate) struct Emitter<'a> {
    pub environment: &'a mut Environment,
    pub instruction: &'a Instruction,
    instructions: Vec<ReilInstruction>,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
}

impl<'a> Emitter<'a> {
    pub fn new(environment: &'a mut Environment, instruction: &'a Instruction) -> Self {
        Self {
            environment,
            instruction,
            instructions: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
        }
    }

    /// Build an [Error::UnsupportedOperand] for the instruction being translated.
    pub fn unsupported(&self, reason: impl Into<String>) -> Error {
        Error::UnsupportedOperand {
            mnemonic: self.instruction.mnemonic.clone(),
            reason: reason.into(),
        }
    }

    pub fn architecture_size(&self) -> OperandSize {
        self.environment.architecture_size()
    }

    /// A fresh temporary register of the given size.
    pub fn temp(&mut self, size: OperandSize) -> ReilOperand {
        reg(size, self.environment.next_temporary())
    }

    fn next_address(&self) -> ReilAddress {
        ReilAddress::new(self.instruction.address, self.instructions.len() as u32)
    }

    fn push(
        &mut self,
        opcode: Opcode,
        first: Option<&ReilOperand>,
        second: Option<&ReilOperand>,
        third: Option<&ReilOperand>,
    ) {
        let instruction = ReilInstruction::new(
            self.next_address(),
            opcode,
            first.cloned(),
            second.cloned(),
            third.cloned(),
        );
        tracing::trace!("{instruction}");
        self.instructions.push(instruction);
    }

    pub fn and(&mut self, lhs: &ReilOperand, rhs: &ReilOperand, out: &ReilOperand) {
        self.push(Opcode::And, Some(lhs), Some(rhs), Some(out));
    }

    pub fn bisz(&mut self, input: &ReilOperand, out: &ReilOperand) {
        self.push(Opcode::Bisz, Some(input), None, Some(out));
    }

    pub fn bsh(&mut self, value: &ReilOperand, shift: &ReilOperand, out: &ReilOperand) {
        self.push(Opcode::Bsh, Some(value), Some(shift), Some(out));
    }

    pub fn jcc(&mut self, condition: &ReilOperand, target: &ReilOperand) {
        self.push(Opcode::Jcc, Some(condition), None, Some(target));
    }

    pub fn ldm(&mut self, address: &ReilOperand, out: &ReilOperand) {
        self.push(Opcode::Ldm, Some(address), None, Some(out));
    }

    pub fn nop(&mut self) {
        self.push(Opcode::Nop, None, None, None);
    }

    pub fn or(&mut self, lhs: &ReilOperand, rhs: &ReilOperand, out: &ReilOperand) {
        self.push(Opcode::Or, Some(lhs), Some(rhs), Some(out));
    }

    pub fn stm(&mut self, value: &ReilOperand, address: &ReilOperand) {
        self.push(Opcode::Stm, Some(value), None, Some(address));
    }

    pub fn str(&mut self, input: &ReilOperand, out: &ReilOperand) {
        self.push(Opcode::Str, Some(input), None, Some(out));
    }

    pub fn undef(&mut self, out: &ReilOperand) {
        self.push(Opcode::Undef, None, None, Some(out));
    }

    pub fn unknown(&mut self) {
        self.push(Opcode::Unknown, None, None, None);
    }

    /// Emit `out = lhs <opcode> rhs` into a new temporary of the given size.
    pub fn binary(
        &mut self,
        opcode: Opcode,
        lhs: &ReilOperand,
        rhs: &ReilOperand,
        size: OperandSize,
    ) -> ReilOperand {
        let out = self.temp(size);
        self.push(opcode, Some(lhs), Some(rhs), Some(&out));
        out
    }

    /// Emit `out = <opcode> input` into a new temporary of the given size.
    pub fn unary(&mut self, opcode: Opcode, input: &ReilOperand, size: OperandSize) -> ReilOperand {
        let out = self.temp(size);
        self.push(opcode, Some(input), None, Some(&out));
        out
    }

    /// Copy a value into a fresh temporary so later writes cannot change it.
    pub fn snapshot(&mut self, value: &ReilOperand) -> ReilOperand {
        if value.is_immediate() || value.is_temporary() {
            return value.clone();
        }

        self.unary(Opcode::Str, value, value.size)
    }

    /// 1 if `value` is not zero, 0 otherwise.
    pub fn is_not_zero(&mut self, value: &ReilOperand) -> ReilOperand {
        let zero = self.unary(Opcode::Bisz, value, OperandSize::Byte);
        self.unary(Opcode::Bisz, &zero, OperandSize::Byte)
    }

    /// Truncate a value to the given size.
    pub fn truncate(&mut self, value: &ReilOperand, size: OperandSize) -> ReilOperand {
        if value.size == size {
            return value.clone();
        }

        if let OperandValue::Immediate(value) = value.value {
            return ReilOperand::unsigned(size, value);
        }

        let mask = uimm(value.size, size.all_bits_mask());
        self.binary(Opcode::And, value, &mask, size)
    }

    /// The most significant bit of `value` as a byte-sized 0 or 1.
    pub fn msb(&mut self, value: &ReilOperand) -> ReilOperand {
        let shift = imm(OperandSize::Byte, -(value.size.bit_size() as i128 - 1));
        self.binary(Opcode::Bsh, value, &shift, OperandSize::Byte)
    }

    /// Sign-extend `value` from its own size to `size`.
    pub fn sign_extend(&mut self, value: &ReilOperand, size: OperandSize) -> ReilOperand {
        let from = value.size;
        if from == size {
            return value.clone();
        }

        if let OperandValue::Immediate(raw) = value.value {
            let signed = reil::BitVector::sized(raw, from).signed_value();
            return imm(size, signed);
        }

        let msb = from.msb_mask();
        let flipped = self.binary(Opcode::Xor, value, &uimm(from, msb), from);
        self.binary(Opcode::Sub, &flipped, &uimm(size, msb), size)
    }

    /// All ones at `size` if `bit` is 1, zero otherwise.
    pub fn spread(&mut self, bit: &ReilOperand, size: OperandSize) -> ReilOperand {
        self.binary(Opcode::Sub, &imm(size, 0), bit, size)
    }

    /// Two's complement negation when `sign` is 1. Used to take absolute values and to apply
    /// signs to unsigned results.
    pub fn negate_if(&mut self, value: &ReilOperand, sign: &ReilOperand) -> ReilOperand {
        let size = value.size;
        let mask = self.spread(sign, size);
        let flipped = self.binary(Opcode::Xor, value, &mask, size);
        self.binary(Opcode::Sub, &flipped, &mask, size)
    }

    /// Pick `if_true` when `condition` is 1 and `if_false` otherwise without branching.
    pub fn select(
        &mut self,
        condition: &ReilOperand,
        if_true: &ReilOperand,
        if_false: &ReilOperand,
        size: OperandSize,
    ) -> ReilOperand {
        let mask = self.spread(condition, size);
        let inverse = self.unary(Opcode::Not, &mask, size);
        let taken = self.binary(Opcode::And, if_true, &mask, size);
        let kept = self.binary(Opcode::And, if_false, &inverse, size);
        self.binary(Opcode::Or, &taken, &kept, size)
    }

    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind a label to the position of the next emitted instruction.
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0] = Some(self.instructions.len() as u32);
    }

    /// Jump to a label within this translation if `condition` is not zero.
    pub fn jcc_label(&mut self, condition: &ReilOperand, label: Label) {
        self.fixups.push((self.instructions.len(), label));

        // Patched in finish
        let target = ReilOperand::sub_address(self.next_address());
        self.jcc(condition, &target);
    }

    pub fn jump_label(&mut self, label: Label) {
        self.jcc_label(&imm(OperandSize::Byte, 1), label);
    }

    /// Resolve label references and return the translation.
    pub fn finish(mut self) -> Result<Vec<ReilInstruction>> {
        let end = self.instructions.len() as u32;
        if self.instructions.is_empty() || self.labels.iter().any(|&bound| bound == Some(end)) {
            // Labels bound past the last instruction need an instruction to land on
            self.nop();
        }

        for (position, label) in std::mem::take(&mut self.fixups) {
            let index = self.labels[label.0].ok_or_else(|| Error::UnboundLabel {
                mnemonic: self.instruction.mnemonic.clone(),
            })?;

            let target = ReilAddress::new(self.instruction.address, index);
            self.instructions[position].third = Some(ReilOperand::sub_address(target));
        }

        Ok(self.instructions)
    }
}

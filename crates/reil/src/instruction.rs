use crate::{Opcode, OperandSize, ReilOperand};

/// Address of a REIL instruction: the native instruction it was translated from plus the position
/// of the REIL instruction within that translation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReilAddress {
    pub native: u64,
    pub index: u32,
}

impl ReilAddress {
    /// Number of REIL addresses reserved per native address in the flat encoding.
    pub const SUB_ADDRESSES: u64 = 0x100;

    pub const fn new(native: u64, index: u32) -> Self {
        Self { native, index }
    }

    /// The flat encoding `native * 0x100 + index`. Indices past `0xff` overlap the next native
    /// address in this encoding.
    pub fn to_flat(self) -> u128 {
        u128::from(self.native) * u128::from(Self::SUB_ADDRESSES) + u128::from(self.index)
    }

    pub fn from_flat(flat: u128) -> Self {
        let sub_addresses = u128::from(Self::SUB_ADDRESSES);
        Self {
            native: (flat / sub_addresses) as u64,
            index: (flat % sub_addresses) as u32,
        }
    }

    pub fn with_index(self, index: u32) -> Self {
        Self { index, ..self }
    }
}

impl std::fmt::Display for ReilAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{native:x}.{index:02x}", native = self.native, index = self.index)
    }
}

/// A single REIL instruction. The first and second operands are inputs; the third is the output,
/// the store address of [Opcode::Stm], or the target of [Opcode::Jcc].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReilInstruction {
    pub address: ReilAddress,
    pub opcode: Opcode,
    pub first: Option<ReilOperand>,
    pub second: Option<ReilOperand>,
    pub third: Option<ReilOperand>,
}

impl ReilInstruction {
    pub fn new(
        address: ReilAddress,
        opcode: Opcode,
        first: Option<ReilOperand>,
        second: Option<ReilOperand>,
        third: Option<ReilOperand>,
    ) -> Self {
        Self {
            address,
            opcode,
            first,
            second,
            third,
        }
    }

    fn binary(
        address: ReilAddress,
        opcode: Opcode,
        first: ReilOperand,
        second: ReilOperand,
        third: ReilOperand,
    ) -> Self {
        Self::new(address, opcode, Some(first), Some(second), Some(third))
    }

    pub fn add(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::Add, lhs, rhs, out)
    }

    pub fn and(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::And, lhs, rhs, out)
    }

    pub fn bisz(address: ReilAddress, input: ReilOperand, out: ReilOperand) -> Self {
        Self::new(address, Opcode::Bisz, Some(input), None, Some(out))
    }

    pub fn bsh(
        address: ReilAddress,
        value: ReilOperand,
        shift: ReilOperand,
        out: ReilOperand,
    ) -> Self {
        Self::binary(address, Opcode::Bsh, value, shift, out)
    }

    pub fn div(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::Div, lhs, rhs, out)
    }

    pub fn jcc(address: ReilAddress, condition: ReilOperand, target: ReilOperand) -> Self {
        Self::new(address, Opcode::Jcc, Some(condition), None, Some(target))
    }

    pub fn ldm(address: ReilAddress, source: ReilOperand, out: ReilOperand) -> Self {
        Self::new(address, Opcode::Ldm, Some(source), None, Some(out))
    }

    pub fn modulo(
        address: ReilAddress,
        lhs: ReilOperand,
        rhs: ReilOperand,
        out: ReilOperand,
    ) -> Self {
        Self::binary(address, Opcode::Mod, lhs, rhs, out)
    }

    pub fn mul(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::Mul, lhs, rhs, out)
    }

    pub fn nop(address: ReilAddress) -> Self {
        Self::new(address, Opcode::Nop, None, None, None)
    }

    pub fn not(address: ReilAddress, input: ReilOperand, out: ReilOperand) -> Self {
        Self::new(address, Opcode::Not, Some(input), None, Some(out))
    }

    pub fn or(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::Or, lhs, rhs, out)
    }

    pub fn stm(address: ReilAddress, value: ReilOperand, target: ReilOperand) -> Self {
        Self::new(address, Opcode::Stm, Some(value), None, Some(target))
    }

    pub fn str(address: ReilAddress, input: ReilOperand, out: ReilOperand) -> Self {
        Self::new(address, Opcode::Str, Some(input), None, Some(out))
    }

    pub fn sub(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::Sub, lhs, rhs, out)
    }

    pub fn undef(address: ReilAddress, out: ReilOperand) -> Self {
        Self::new(address, Opcode::Undef, None, None, Some(out))
    }

    pub fn unknown(address: ReilAddress) -> Self {
        Self::new(address, Opcode::Unknown, None, None, None)
    }

    pub fn xor(address: ReilAddress, lhs: ReilOperand, rhs: ReilOperand, out: ReilOperand) -> Self {
        Self::binary(address, Opcode::Xor, lhs, rhs, out)
    }

    /// The native address this instruction was translated from.
    pub fn native_address(&self) -> u64 {
        self.address.native
    }

    /// Size of the third operand or [OperandSize::Address] if there is none.
    pub fn output_size(&self) -> OperandSize {
        self.third
            .as_ref()
            .map(|operand| operand.size)
            .unwrap_or(OperandSize::Address)
    }

    /// Operands in slot order. Empty slots are `None`.
    pub fn operands(&self) -> [Option<&ReilOperand>; 3] {
        [self.first.as_ref(), self.second.as_ref(), self.third.as_ref()]
    }

    pub fn is_jump(&self) -> bool {
        self.opcode == Opcode::Jcc
    }
}

impl std::fmt::Display for ReilInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{address}: {opcode} [", address = self.address, opcode = self.opcode)?;
        for (i, operand) in self.operands().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }

            match operand {
                Some(operand) => write!(f, "{operand}")?,
                None => f.write_str("EMPTY")?,
            }
        }

        f.write_str("]")
    }
}

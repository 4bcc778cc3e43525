use crate::{BitVector, OperandSize, ReilAddress};

/// The value held by a REIL operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperandValue {
    /// A constant. Stored two's-complement encoded at the operand size.
    Immediate(u128),

    /// A native register, flag, or temporary register.
    Register(String),

    /// A REIL instruction address. Only valid as the target of a JCC.
    SubAddress(ReilAddress),
}

/// A sized REIL operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReilOperand {
    pub size: OperandSize,
    pub value: OperandValue,
}

impl ReilOperand {
    /// Construct an immediate operand. The value is truncated to the given size so negative values
    /// are encoded in two's complement.
    pub fn immediate(size: OperandSize, value: impl Into<i128>) -> Self {
        Self {
            size,
            value: OperandValue::Immediate(BitVector::from_signed(value.into(), size).value()),
        }
    }

    /// Construct an immediate operand from an unsigned value truncated to the given size.
    pub fn unsigned(size: OperandSize, value: u128) -> Self {
        Self {
            size,
            value: OperandValue::Immediate(value & size.all_bits_mask()),
        }
    }

    pub fn register(size: OperandSize, name: impl Into<String>) -> Self {
        Self {
            size,
            value: OperandValue::Register(name.into()),
        }
    }

    pub fn sub_address(address: ReilAddress) -> Self {
        Self {
            size: OperandSize::Address,
            value: OperandValue::SubAddress(address),
        }
    }

    /// The same operand value reinterpreted at a different size.
    pub fn with_size(&self, size: OperandSize) -> Self {
        let value = match &self.value {
            OperandValue::Immediate(value) => OperandValue::Immediate(value & size.all_bits_mask()),
            other => other.clone(),
        };

        Self { size, value }
    }

    pub fn register_name(&self) -> Option<&str> {
        match &self.value {
            OperandValue::Register(name) => Some(name),
            _ => None,
        }
    }

    pub fn immediate_value(&self) -> Option<u128> {
        match self.value {
            OperandValue::Immediate(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.value, OperandValue::Immediate(_))
    }

    pub fn is_temporary(&self) -> bool {
        self.register_name().is_some_and(is_temporary)
    }
}

/// Temporary registers are named `t` followed by a decimal index.
pub fn is_temporary(name: &str) -> bool {
    name.strip_prefix('t')
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

impl std::fmt::Display for OperandValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(value) => write!(f, "{value:#x}"),
            Self::Register(name) => f.write_str(name),
            Self::SubAddress(address) => write!(f, "{address}"),
        }
    }
}

impl std::fmt::Display for ReilOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{size} {value}", size = self.size, value = self.value)
    }
}

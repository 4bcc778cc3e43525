use crate::OperandSize;

/// Concrete value with a bit size no greater than 128.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitVector {
    value: u128,
    bits: u32,
}

/// Default value is a 0 byte (8 bits).
impl Default for BitVector {
    fn default() -> Self {
        Self { value: 0, bits: 8 }
    }
}

impl BitVector {
    pub fn new(value: u128, bits: u32) -> Self {
        assert!(bits <= u128::BITS && bits > 0);
        Self {
            value: value & Self::mask_for(bits),
            bits,
        }
    }

    /// Construct a value truncated to the given operand size.
    pub fn sized(value: u128, size: OperandSize) -> Self {
        Self::new(value, size.bit_size())
    }

    /// Encode a signed value in two's complement at the given size.
    pub fn from_signed(value: i128, size: OperandSize) -> Self {
        Self::sized(value as u128, size)
    }

    fn mask_for(bits: u32) -> u128 {
        u128::MAX >> (u128::BITS - bits)
    }

    pub fn mask(&self) -> u128 {
        Self::mask_for(self.bits)
    }

    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn msb(&self) -> bool {
        self.value >> (self.bits - 1) & 1 == 1
    }

    pub fn signed_value(&self) -> i128 {
        if self.bits == u128::BITS {
            return self.value as i128;
        }

        let value = if self.msb() {
            self.value | (u128::MAX << self.bits)
        } else {
            self.value
        };

        value as i128
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Truncate or zero-extend this value to a new size.
    pub fn resize(self, size: OperandSize) -> Self {
        Self::sized(self.value, size)
    }
}

impl From<u128> for BitVector {
    fn from(value: u128) -> Self {
        BitVector::new(value, u128::BITS)
    }
}

impl From<BitVector> for u128 {
    fn from(value: BitVector) -> Self {
        value.value()
    }
}

macro_rules! impl_from_value {
    ($type:ty) => {
        impl From<$type> for BitVector {
            fn from(value: $type) -> Self {
                BitVector::new(value.into(), <$type>::BITS)
            }
        }

        impl TryFrom<BitVector> for $type {
            type Error = std::num::TryFromIntError;
            fn try_from(value: BitVector) -> Result<Self, Self::Error> {
                <$type>::try_from(value.value())
            }
        }
    };
}

impl_from_value!(u64);
impl_from_value!(u32);
impl_from_value!(u16);
impl_from_value!(u8);

impl std::fmt::Display for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{value:#x}:{bits}", value = self.value, bits = self.bits)
    }
}

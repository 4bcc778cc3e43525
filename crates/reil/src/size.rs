use crate::{Error, Result};

/// The width of a REIL operand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum OperandSize {
    /// 8 bits
    Byte,

    /// 16 bits
    Word,

    /// 32 bits
    Dword,

    /// 64 bits
    Qword,

    /// 128 bits. Only produced as the widened result of quad-word arithmetic.
    Oword,

    /// Size of a jump target. Addresses are 64 bits wide.
    Address,
}

impl OperandSize {
    pub const fn byte_size(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
            Self::Qword | Self::Address => 8,
            Self::Oword => 16,
        }
    }

    pub const fn bit_size(self) -> u32 {
        8 * self.byte_size() as u32
    }

    /// The size used for the widened result of an operation on values of this size. An
    /// [OperandSize::Oword] is already the widest size and is its own successor.
    pub const fn next_size(self) -> Self {
        match self {
            Self::Byte => Self::Word,
            Self::Word => Self::Dword,
            Self::Dword => Self::Qword,
            Self::Qword | Self::Address | Self::Oword => Self::Oword,
        }
    }

    /// Mask with every bit of this size set.
    pub const fn all_bits_mask(self) -> u128 {
        u128::MAX >> (u128::BITS - self.bit_size())
    }

    /// Mask selecting the most significant bit of this size.
    pub const fn msb_mask(self) -> u128 {
        1 << (self.bit_size() - 1)
    }

    /// Mask selecting the bit just above this size, i.e. the carry out of an addition.
    pub fn carry_mask(self) -> Result<u128> {
        match self {
            Self::Oword => Err(Error::InvalidSize {
                size: self,
                reason: "no carry bit beyond 128 bits",
            }),
            _ => Ok(1 << self.bit_size()),
        }
    }

    /// Smallest size that holds the given number of bytes.
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        match bytes {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Word),
            4 => Ok(Self::Dword),
            8 => Ok(Self::Qword),
            16 => Ok(Self::Oword),
            _ => Err(Error::UnknownOperandSize(format!("{bytes} bytes"))),
        }
    }

    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits % 8 != 0 {
            return Err(Error::UnknownOperandSize(format!("{bits} bits")));
        }

        Self::from_bytes(bits as usize / 8)
    }
}

impl std::str::FromStr for OperandSize {
    type Err = Error;

    /// Parses the size prefixes emitted by instruction decoders.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "byte" | "b1" => Ok(Self::Byte),
            "word" | "b2" => Ok(Self::Word),
            "dword" | "b4" => Ok(Self::Dword),
            "qword" | "b8" => Ok(Self::Qword),
            "oword" | "b16" => Ok(Self::Oword),
            "address" => Ok(Self::Address),
            _ => Err(Error::UnknownOperandSize(s.to_owned())),
        }
    }
}

impl std::fmt::Display for OperandSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Byte => "BYTE",
            Self::Word => "WORD",
            Self::Dword => "DWORD",
            Self::Qword => "QWORD",
            Self::Oword => "OWORD",
            Self::Address => "ADDRESS",
        };

        f.write_str(name)
    }
}

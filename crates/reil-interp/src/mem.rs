use std::collections::BTreeMap;

use reil::OperandSize;

use crate::{Error, Result};

/// Byte order applied to every multi-byte load and store.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Sparse byte-addressable memory. Only bytes that have been stored are defined; addresses wrap
/// at 64 bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    endianness: Endianness,
    data: BTreeMap<u64, u8>,
}

impl Memory {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            data: Default::default(),
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Store the low `size` bytes of `value` at `address`.
    pub fn store(&mut self, address: u64, value: u128, size: OperandSize) {
        let bytes = value.to_le_bytes();
        let bytes = &bytes[..size.byte_size()];

        let mut offset = address;
        let mut store = |byte: u8| {
            self.data.insert(offset, byte);
            offset = offset.wrapping_add(1);
        };

        match self.endianness {
            Endianness::Little => bytes.iter().copied().for_each(&mut store),
            Endianness::Big => bytes.iter().rev().copied().for_each(&mut store),
        }
    }

    /// Load `size` bytes from `address`. Every byte must have been stored before.
    pub fn load(&self, address: u64, size: OperandSize) -> Result<u128> {
        let bytes = (0..size.byte_size())
            .map(|i| {
                let offset = address.wrapping_add(i as u64);
                self.data
                    .get(&offset)
                    .copied()
                    .ok_or(Error::UnmappedMemory {
                        address,
                        relative_offset: i,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let value = match self.endianness {
            Endianness::Little => bytes
                .iter()
                .rev()
                .fold(0u128, |value, &byte| value << 8 | u128::from(byte)),
            Endianness::Big => bytes
                .iter()
                .fold(0u128, |value, &byte| value << 8 | u128::from(byte)),
        };

        Ok(value)
    }

    pub fn is_defined(&self, address: u64) -> bool {
        self.data.contains_key(&address)
    }

    /// Number of defined bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Defined bytes in address order.
    pub fn bytes(&self) -> impl Iterator<Item = (u64, u8)> + '_ {
        self.data.iter().map(|(&address, &byte)| (address, byte))
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

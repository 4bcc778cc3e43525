use crate::OperandTree;

/// A decoded native instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub address: u64,

    /// Encoded length in bytes. Needed to compute return addresses and fall-through targets.
    pub length: u64,

    /// Mnemonic including any prefixes, e.g. `rep movsb`.
    pub mnemonic: String,
    pub operands: Vec<OperandTree>,
}

impl Instruction {
    pub fn new(
        address: u64,
        length: u64,
        mnemonic: impl Into<String>,
        operands: impl IntoIterator<Item = OperandTree>,
    ) -> Self {
        Self {
            address,
            length,
            mnemonic: mnemonic.into(),
            operands: operands.into_iter().collect(),
        }
    }

    /// Address of the instruction that follows this one in memory.
    pub fn next_address(&self) -> u64 {
        self.address.wrapping_add(self.length)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{address:x}: {mnemonic}", address = self.address, mnemonic = self.mnemonic)?;
        for (i, operand) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{operand}")?;
        }

        Ok(())
    }
}

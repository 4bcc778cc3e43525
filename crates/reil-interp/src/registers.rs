use std::collections::BTreeMap;

use reil::{BitVector, OperandSize};

/// Status requested when a register is set from outside REIL code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegisterStatus {
    Defined,
    Undefined,
}

/// Storage for a single register.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Cell {
    /// Never written, or explicitly undefined by `UNDEF`.
    #[default]
    Undefined,
    Defined(BitVector),
}

impl Cell {
    pub fn value(&self) -> Option<BitVector> {
        match self {
            Self::Defined(value) => Some(*value),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

/// Register file keyed by register name. Native registers, flags and temporaries all live here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    cells: BTreeMap<String, Cell>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cell(&self, name: &str) -> Cell {
        self.cells.get(name).copied().unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<BitVector> {
        self.cell(name).value()
    }

    /// Write a value truncated to `size`.
    pub fn set(&mut self, name: impl Into<String>, value: u128, size: OperandSize) {
        self.cells
            .insert(name.into(), Cell::Defined(BitVector::sized(value, size)));
    }

    pub fn undefine(&mut self, name: &str) {
        // Registers that were never defined have nothing to forget
        if let Some(cell) = self.cells.get_mut(name) {
            *cell = Cell::Undefined;
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.cell(name).is_defined()
    }

    /// Names of all defined registers in lexicographic order.
    pub fn defined(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.is_defined())
            .map(|(name, _)| name.as_str())
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

//! Lowering of operand trees into REIL reads and writes.
//!
//! Native registers are only ever accessed through their outermost parent. Reads of a
//! sub-register extract its bits from the parent and writes merge them back in, except that
//! 32-bit writes on x64 replace the whole 64-bit register with the zero-extended value.
use reil::{Opcode, OperandSize, ReilOperand};

use crate::emitter::{imm, reg, uimm, Emitter};
use crate::{Architecture, OperandNode, OperandTree, Operator, Result, Segment};

/// Where an operand lives so it can be written after being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    Register(String),

    /// Memory at the given lowered address.
    Memory(ReilOperand),

    Immediate,
}

/// The value of an operand together with its location.
#[derive(Debug, Clone)]
pub(crate) struct Operand {
    pub value: ReilOperand,
    pub location: Location,
}

impl Operand {
    pub fn size(&self) -> OperandSize {
        self.value.size
    }
}

impl Emitter<'_> {
    pub fn require_operands(&self, expected: usize) -> Result<()> {
        let actual = self.instruction.operands.len();
        if actual != expected {
            return Err(crate::Error::InvalidOperandCount {
                mnemonic: self.instruction.mnemonic.clone(),
                expected,
                actual,
            });
        }

        Ok(())
    }

    pub fn operand(&self, index: usize) -> Result<&OperandTree> {
        self.instruction.operands.get(index).ok_or_else(|| {
            crate::Error::InvalidOperandCount {
                mnemonic: self.instruction.mnemonic.clone(),
                expected: index + 1,
                actual: self.instruction.operands.len(),
            }
        })
    }

    pub fn operand_size(&self, index: usize) -> Result<OperandSize> {
        let operand = self.operand(index)?;
        operand
            .size()
            .ok_or_else(|| self.unsupported(format!("operand {operand} has no size prefix")))
    }

    /// Read an operand at its declared size.
    pub fn read(&mut self, index: usize) -> Result<Operand> {
        let size = self.operand_size(index)?;
        let node = self.operand(index)?.value().clone();
        match node {
            OperandNode::Register(name) => Ok(Operand {
                value: self.read_register(&name)?,
                location: Location::Register(name),
            }),
            OperandNode::Immediate(value) => Ok(Operand {
                value: imm(size, value),
                location: Location::Immediate,
            }),
            OperandNode::MemDeref(address) => {
                let address = self.address(&address)?;
                let value = self.temp(size);
                self.ldm(&address, &value);
                Ok(Operand {
                    value,
                    location: Location::Memory(address),
                })
            }
            other => Err(self.unsupported(format!("cannot read {other}"))),
        }
    }

    /// Read an operand that is combined with a value of `size`. Narrower immediates are
    /// sign-extended.
    pub fn read_as(&mut self, index: usize, size: OperandSize) -> Result<Operand> {
        let operand = self.read(index)?;
        if operand.location == Location::Immediate && operand.size() != size {
            let value = self.sign_extend(&operand.value, size);
            return Ok(Operand { value, ..operand });
        }

        if operand.size() != size {
            return Err(self.unsupported(format!(
                "operand {index} is {actual} but {size} is required",
                actual = operand.size()
            )));
        }

        Ok(operand)
    }

    /// The location of an operand without reading it.
    pub fn locate(&mut self, index: usize) -> Result<Location> {
        let node = self.operand(index)?.value().clone();
        match node {
            OperandNode::Register(name) => {
                self.environment.slice(&name)?;
                Ok(Location::Register(name))
            }
            OperandNode::Immediate(_) => Ok(Location::Immediate),
            OperandNode::MemDeref(address) => Ok(Location::Memory(self.address(&address)?)),
            other => Err(self.unsupported(format!("cannot locate {other}"))),
        }
    }

    pub fn write(&mut self, location: &Location, value: &ReilOperand) -> Result<()> {
        match location {
            Location::Register(name) => self.write_register(name, value),
            Location::Memory(address) => {
                self.stm(value, address);
                Ok(())
            }
            Location::Immediate => Err(self.unsupported("immediate destination")),
        }
    }

    pub fn read_register(&mut self, name: &str) -> Result<ReilOperand> {
        let slice = self.environment.slice(name)?;
        let root = reg(slice.root.size, slice.root.name);
        if slice.is_root() {
            return Ok(root);
        }

        let (size, offset) = (slice.size, slice.bit_offset);
        if offset == 0 {
            return Ok(self.truncate(&root, size));
        }

        let mask = uimm(root.size, size.all_bits_mask() << offset);
        let bits = self.binary(Opcode::And, &root, &mask, root.size);
        Ok(self.binary(Opcode::Bsh, &bits, &imm(OperandSize::Byte, -(offset as i128)), size))
    }

    pub fn write_register(&mut self, name: &str, value: &ReilOperand) -> Result<()> {
        let slice = self.environment.slice(name)?;
        let root = reg(slice.root.size, slice.root.name);
        let (size, offset) = (slice.size, slice.bit_offset);

        if slice.is_root() {
            self.str(value, &root);
            return Ok(());
        }

        let value = if value.size == size {
            value.clone()
        } else {
            self.unary(Opcode::Str, value, size)
        };

        let zero_extends = self.environment.architecture() == Architecture::X64
            && size == OperandSize::Dword
            && offset == 0;
        if zero_extends {
            self.str(&value, &root);
            return Ok(());
        }

        let keep = uimm(
            root.size,
            !(size.all_bits_mask() << offset) & root.size.all_bits_mask(),
        );
        let cleared = self.binary(Opcode::And, &root, &keep, root.size);
        let placed = if offset == 0 {
            value
        } else {
            self.binary(Opcode::Bsh, &value, &imm(OperandSize::Byte, offset), root.size)
        };
        self.or(&cleared, &placed, &root);

        Ok(())
    }

    /// Lower an address expression to a value of the architecture's address size.
    pub fn address(&mut self, node: &OperandNode) -> Result<ReilOperand> {
        let size = self.architecture_size();
        let value = self.expression(node, size)?;
        if value.size == size {
            return Ok(value);
        }

        Ok(self.truncate(&value, size))
    }

    fn expression(&mut self, node: &OperandNode, size: OperandSize) -> Result<ReilOperand> {
        match node {
            OperandNode::SizePrefix { size, child } => self.expression(child, *size),
            // Relative to the end of the instruction
            OperandNode::Register(name)
                if name.eq_ignore_ascii_case(self.environment.program_counter()) =>
            {
                let next = self.instruction.next_address();
                Ok(uimm(self.architecture_size(), u128::from(next)))
            }
            OperandNode::Register(name) => self.read_register(name),
            OperandNode::Immediate(value) => Ok(imm(size, *value)),
            OperandNode::Operator { operator, children } => match operator {
                Operator::Segment(segment) => self.segment_offset(*segment, children, size),
                Operator::Add => self.fold(Opcode::Add, children, size),
                Operator::Mul => self.fold(Opcode::Mul, children, size),
            },
            OperandNode::MemDeref(_) => Err(self.unsupported("nested memory dereference")),
        }
    }
}

impl Emitter<'_> {
    /// Combine operator children left to right. Intermediate results are widened so the final
    /// truncation to the address size discards any carry.
    fn fold(
        &mut self,
        opcode: Opcode,
        children: &[OperandNode],
        size: OperandSize,
    ) -> Result<ReilOperand> {
        let (first, rest) = children
            .split_first()
            .ok_or_else(|| self.unsupported("operator without operands"))?;

        let mut value = self.expression(first, size)?;
        for child in rest {
            let rhs = self.expression(child, size)?;
            value = self.binary(opcode, &value, &rhs, size.next_size());
        }

        Ok(value)
    }

    fn segment_offset(
        &mut self,
        segment: Segment,
        children: &[OperandNode],
        size: OperandSize,
    ) -> Result<ReilOperand> {
        let [offset] = children else {
            return Err(self.unsupported("segment override needs exactly one offset"));
        };

        let offset = self.expression(offset, size)?;
        if !applies_base(segment) {
            return Ok(offset);
        }

        let address_size = self.architecture_size();
        let base = reg(address_size, segment.base_register());
        Ok(self.binary(Opcode::Add, &offset, &base, address_size.next_size()))
    }
}

/// Only the fs and gs segments carry a base address. The remaining segments are flat.
fn applies_base(segment: Segment) -> bool {
    matches!(segment, Segment::Fs | Segment::Gs)
}

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Opcode, OperandValue, ReilAddress, ReilInstruction, Result};

/// A straight-line sequence of REIL instructions. Control only enters at the first instruction and
/// only leaves after the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReilBlock {
    instructions: Vec<ReilInstruction>,
}

impl ReilBlock {
    /// Address of the first instruction.
    pub fn address(&self) -> ReilAddress {
        // Blocks are never constructed empty
        self.instructions[0].address
    }

    pub fn instructions(&self) -> &[ReilInstruction] {
        &self.instructions
    }

    pub fn last_instruction(&self) -> &ReilInstruction {
        &self.instructions[self.instructions.len() - 1]
    }
}

/// The reason control moves from one block to another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    /// The source block ends and execution continues with the next block.
    Fallthrough,

    /// The source block ends in a jump whose target is the start of the destination block.
    Jump,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReilEdge {
    pub source: ReilAddress,
    pub target: ReilAddress,
    pub kind: EdgeKind,
}

/// Control-flow graph of REIL blocks. Block boundaries are placed at native instruction
/// boundaries, at every jump target inside a translation, and after every jump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReilFunction {
    blocks: BTreeMap<ReilAddress, ReilBlock>,
    edges: BTreeSet<ReilEdge>,
}

impl ReilFunction {
    pub fn from_instructions(instructions: impl IntoIterator<Item = ReilInstruction>) -> Result<Self> {
        let mut instructions = instructions.into_iter().collect::<Vec<_>>();
        instructions.sort_by_key(|instruction| instruction.address);

        let addresses = instructions
            .iter()
            .map(|instruction| instruction.address)
            .collect::<BTreeSet<_>>();

        // Block leaders
        let mut leaders = BTreeSet::new();
        let mut previous: Option<&ReilInstruction> = None;
        for instruction in &instructions {
            match previous {
                None => {
                    leaders.insert(instruction.address);
                }
                Some(previous) => {
                    if previous.address.native != instruction.address.native || previous.is_jump()
                    {
                        leaders.insert(instruction.address);
                    }
                }
            }

            if let Some(target) = sub_address_target(instruction) {
                if !addresses.contains(&target) {
                    return Err(Error::InvalidJumpTarget {
                        origin: instruction.address,
                        target,
                    });
                }
                leaders.insert(target);
            }

            previous = Some(instruction);
        }

        let mut blocks = BTreeMap::new();
        let mut current: Vec<ReilInstruction> = Vec::new();
        for instruction in instructions {
            if leaders.contains(&instruction.address) && !current.is_empty() {
                let block = ReilBlock {
                    instructions: std::mem::take(&mut current),
                };
                blocks.insert(block.address(), block);
            }
            current.push(instruction);
        }

        if !current.is_empty() {
            let block = ReilBlock {
                instructions: current,
            };
            blocks.insert(block.address(), block);
        }

        let mut edges = BTreeSet::new();
        let starts = blocks.keys().copied().collect::<Vec<_>>();
        for (i, block) in blocks.values().enumerate() {
            let last = block.last_instruction();
            let source = block.address();

            if let Some(target) = jump_target(last) {
                if blocks.contains_key(&target) {
                    edges.insert(ReilEdge {
                        source,
                        target,
                        kind: EdgeKind::Jump,
                    });
                }
            }

            if !is_unconditional_jump(last) {
                if let Some(&target) = starts.get(i + 1) {
                    edges.insert(ReilEdge {
                        source,
                        target,
                        kind: EdgeKind::Fallthrough,
                    });
                }
            }
        }

        Ok(Self { blocks, edges })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ReilBlock> {
        self.blocks.values()
    }

    pub fn block(&self, address: ReilAddress) -> Option<&ReilBlock> {
        self.blocks.get(&address)
    }

    pub fn edges(&self) -> impl Iterator<Item = &ReilEdge> {
        self.edges.iter()
    }

    /// Start addresses of the blocks control may reach directly from the given block.
    pub fn successors(&self, address: ReilAddress) -> impl Iterator<Item = ReilAddress> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.source == address)
            .map(|edge| edge.target)
    }

    /// All instructions in address order.
    pub fn instructions(&self) -> impl Iterator<Item = &ReilInstruction> {
        self.blocks.values().flat_map(|block| block.instructions.iter())
    }

    pub fn entry(&self) -> Option<ReilAddress> {
        self.blocks.keys().next().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn sub_address_target(instruction: &ReilInstruction) -> Option<ReilAddress> {
    if instruction.opcode != Opcode::Jcc {
        return None;
    }

    match instruction.third.as_ref().map(|operand| &operand.value) {
        Some(OperandValue::SubAddress(target)) => Some(*target),
        _ => None,
    }
}

/// Target of a jump if it is statically known. Jumps to native addresses target the first REIL
/// instruction of that native instruction.
fn jump_target(instruction: &ReilInstruction) -> Option<ReilAddress> {
    if instruction.opcode != Opcode::Jcc {
        return None;
    }

    match instruction.third.as_ref().map(|operand| &operand.value) {
        Some(OperandValue::SubAddress(target)) => Some(*target),
        Some(OperandValue::Immediate(native)) => {
            u64::try_from(*native).ok().map(|native| ReilAddress::new(native, 0))
        }
        _ => None,
    }
}

fn is_unconditional_jump(instruction: &ReilInstruction) -> bool {
    instruction.opcode == Opcode::Jcc
        && instruction
            .first
            .as_ref()
            .and_then(|condition| condition.immediate_value())
            .is_some_and(|condition| condition != 0)
}

/// REIL code grouped by the native instruction it was translated from. This is the form executed
/// by an interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReilProgram {
    instructions: BTreeMap<u64, Vec<ReilInstruction>>,
}

impl ReilProgram {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, instruction: ReilInstruction) {
        let list = self
            .instructions
            .entry(instruction.address.native)
            .or_default();

        // Keep each list ordered by address
        let position = list.partition_point(|existing| existing.address <= instruction.address);
        list.insert(position, instruction);
    }

    /// The REIL translation of the native instruction at the given address.
    pub fn get(&self, native: u64) -> Option<&[ReilInstruction]> {
        self.instructions.get(&native).map(Vec::as_slice)
    }

    pub fn contains(&self, native: u64) -> bool {
        self.instructions.contains_key(&native)
    }

    /// The first native address strictly after `native` and no further than `window` bytes away.
    pub fn next_native_address(&self, native: u64, window: u64) -> Option<u64> {
        let start = native.checked_add(1)?;
        let end = native.saturating_add(window);
        self.instructions
            .range(start..=end)
            .next()
            .map(|(&address, _)| address)
    }

    pub fn native_addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.instructions.keys().copied()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &ReilInstruction> {
        self.instructions.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.instructions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl FromIterator<ReilInstruction> for ReilProgram {
    fn from_iter<T: IntoIterator<Item = ReilInstruction>>(iter: T) -> Self {
        let mut program = Self::new();
        for instruction in iter {
            program.push(instruction);
        }
        program
    }
}

impl Extend<ReilInstruction> for ReilProgram {
    fn extend<T: IntoIterator<Item = ReilInstruction>>(&mut self, iter: T) {
        for instruction in iter {
            self.push(instruction);
        }
    }
}

impl From<&ReilFunction> for ReilProgram {
    fn from(function: &ReilFunction) -> Self {
        function.instructions().cloned().collect()
    }
}

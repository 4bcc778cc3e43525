use reil::{
    is_temporary, BitVector, Opcode, OperandSize, OperandValue, ReilAddress, ReilInstruction,
    ReilOperand, ReilProgram,
};

use crate::config::InterpreterConfig;
use crate::mem::{Endianness, Memory};
use crate::policy::{CpuPolicy, EmptyInterpreterPolicy, Handling, InterpreterPolicy};
use crate::registers::{RegisterFile, RegisterStatus};
use crate::{Error, Result};

/// Describes which instruction should be executed next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ControlFlow {
    /// The next REIL instruction of the same native instruction, or the next native instruction
    /// if this was the last one.
    NextInstruction,

    /// A native address. Execution continues with its first REIL instruction.
    Native(u64),

    /// A specific REIL instruction.
    Reil(ReilAddress),
}

/// Why execution stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Control reached the configured halt address.
    Halted,

    /// Control fell through the last native instruction of the program.
    EndOfProgram,

    /// Control transferred to a native address that has no REIL code.
    Exited(u64),
}

/// Executes REIL programs on concrete values.
pub struct Interpreter<C: CpuPolicy, P: InterpreterPolicy = EmptyInterpreterPolicy> {
    cpu: C,
    policy: P,
    config: InterpreterConfig,
    registers: RegisterFile,
    memory: Memory,
}

impl<C: CpuPolicy, P: InterpreterPolicy> Interpreter<C, P> {
    pub fn new(endianness: Endianness, cpu: C, policy: P) -> Self {
        Self::with_config(endianness, cpu, policy, Default::default())
    }

    pub fn with_config(endianness: Endianness, cpu: C, policy: P, config: InterpreterConfig) -> Self {
        let mut registers = RegisterFile::new();
        if config.zero_initialize {
            for &(name, size) in cpu.registers() {
                registers.set(name, 0, size);
            }

            for &flag in cpu.flags() {
                registers.set(flag, 0, OperandSize::Byte);
            }
        }

        Self {
            cpu,
            policy,
            config,
            registers,
            memory: Memory::new(endianness),
        }
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Set or clear a register. Native registers must match the size given by the CPU policy.
    pub fn set_register(
        &mut self,
        name: &str,
        value: u128,
        size: OperandSize,
        status: RegisterStatus,
    ) -> Result<()> {
        if let Some(expected) = self.cpu.register_size(name) {
            if expected != size {
                return Err(Error::InvalidRegisterSize {
                    register: name.to_owned(),
                    expected,
                    actual: size,
                });
            }
        }

        match status {
            RegisterStatus::Defined => self.registers.set(name, value, size),
            RegisterStatus::Undefined => self.registers.undefine(name),
        }

        Ok(())
    }

    /// Current value of a register or `None` if it is undefined.
    pub fn variable_value(&self, name: &str) -> Option<BitVector> {
        self.registers.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.registers.is_defined(name)
    }

    /// Names of every defined register including temporaries.
    pub fn defined_registers(&self) -> impl Iterator<Item = &str> {
        self.registers.defined()
    }

    /// Names of defined registers that are not temporaries.
    pub fn defined_native_registers(&self) -> impl Iterator<Item = &str> {
        self.registers.defined().filter(|name| !is_temporary(name))
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Store the low `bytes` bytes of `value` at `address`.
    pub fn set_memory(&mut self, address: u64, value: u128, bytes: usize) -> Result<()> {
        let size = OperandSize::from_bytes(bytes)?;
        self.memory.store(address, value, size);
        Ok(())
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Number of defined memory bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    /// Execute `program` starting with the native instruction at `entry`.
    ///
    /// Execution stops when control reaches the halt address, falls through the last native
    /// instruction, or transfers to a native address without REIL code. A fault stops execution
    /// at the faulting instruction.
    pub fn interpret(&mut self, program: &ReilProgram, entry: u64) -> Result<Termination> {
        if !program.contains(entry) {
            return Err(Error::InstructionNotFound(entry));
        }

        self.policy.start();
        let termination = self.run(program, entry)?;
        tracing::debug!(?termination, "interpretation finished");
        self.policy.end();

        Ok(termination)
    }

    fn set_program_counter(&mut self, native: u64) {
        let name = self.cpu.program_counter().to_owned();
        let size = self
            .cpu
            .register_size(&name)
            .unwrap_or(OperandSize::Address);
        self.registers.set(name, u128::from(native), size);
    }

    fn run(&mut self, program: &ReilProgram, entry: u64) -> Result<Termination> {
        let mut executed = 0u64;
        let mut native = entry;
        let mut position = 0;
        self.set_program_counter(entry);

        loop {
            if Some(native) == self.config.halt_address {
                return Ok(Termination::Halted);
            }

            let Some(instructions) = program.get(native) else {
                return Ok(Termination::Exited(native));
            };

            tracing::debug!(
                native = format_args!("{native:#x}"),
                "executing native instruction"
            );

            let flow = loop {
                let Some(instruction) = instructions.get(position) else {
                    break ControlFlow::NextInstruction;
                };

                if let Some(limit) = self.config.instruction_limit {
                    if executed >= limit {
                        return Err(Error::InstructionLimitExceeded(limit));
                    }
                }
                executed += 1;

                self.policy.next_instruction(instruction);
                tracing::trace!(%instruction, "executing");

                match self.execute(instruction)? {
                    ControlFlow::NextInstruction => position += 1,
                    ControlFlow::Reil(target) if target.native == native => {
                        position = find_position(instructions, instruction, target)?;
                    }
                    flow => break flow,
                }
            };

            match flow {
                ControlFlow::NextInstruction => {
                    match program.next_native_address(native, self.config.fallthrough_window) {
                        Some(next) => {
                            native = next;
                            position = 0;
                        }
                        None => return Ok(Termination::EndOfProgram),
                    }
                }
                ControlFlow::Native(target) => {
                    native = target;
                    position = 0;
                }
                ControlFlow::Reil(target) => {
                    let instructions = program
                        .get(target.native)
                        .ok_or(Error::InstructionNotFound(target.native))?;
                    native = target.native;
                    position = instructions
                        .iter()
                        .position(|instruction| instruction.address == target)
                        .ok_or(Error::InstructionNotFound(target.native))?;
                }
            }

            self.set_program_counter(native);
        }
    }

    /// Execute a single instruction.
    fn execute(&mut self, instruction: &ReilInstruction) -> Result<ControlFlow> {
        match instruction.opcode {
            Opcode::Add => self.binary(instruction, |a, b| Ok(a.wrapping_add(b)))?,
            Opcode::And => self.binary(instruction, |a, b| Ok(a & b))?,
            Opcode::Mul => self.binary(instruction, |a, b| Ok(a.wrapping_mul(b)))?,
            Opcode::Or => self.binary(instruction, |a, b| Ok(a | b))?,
            Opcode::Sub => self.binary(instruction, |a, b| Ok(a.wrapping_sub(b)))?,
            Opcode::Xor => self.binary(instruction, |a, b| Ok(a ^ b))?,
            Opcode::Div => self.binary(instruction, |a, b| {
                a.checked_div(b).ok_or(Error::DivisionByZero {
                    address: instruction.address,
                })
            })?,
            Opcode::Mod => self.binary(instruction, |a, b| {
                a.checked_rem(b).ok_or(Error::DivisionByZero {
                    address: instruction.address,
                })
            })?,
            Opcode::Bsh => self.bsh(instruction)?,
            Opcode::Bisz => self.unary(instruction, |a| u128::from(a == 0))?,
            Opcode::Not => self.unary(instruction, |a| !a)?,
            Opcode::Str => self.unary(instruction, |a| a)?,
            Opcode::Ldm => {
                let address = self.address(instruction, 0)?;
                let (_, size) = self.output(instruction)?;
                let value = self.memory.load(address, size)?;
                self.write(instruction, value)?;
            }
            Opcode::Stm => {
                let value = self.read(instruction, 0)?;
                let size = operand(instruction, 0)?.size;
                let address = self.address(instruction, 2)?;
                self.memory.store(address, value.value(), size);
            }
            Opcode::Jcc => return self.jcc(instruction),
            Opcode::Undef => {
                let (name, _) = self.output(instruction)?;
                self.registers.undefine(name);
            }
            Opcode::Nop => (),
            Opcode::Unknown => {
                let handling = self.policy.unknown_instruction(
                    instruction,
                    &mut self.registers,
                    &mut self.memory,
                )?;

                if handling == Handling::NotHandled {
                    return Err(Error::UnknownOpcode {
                        address: instruction.address,
                    });
                }
            }
        }

        Ok(ControlFlow::NextInstruction)
    }

    fn binary(
        &mut self,
        instruction: &ReilInstruction,
        op: impl FnOnce(u128, u128) -> Result<u128>,
    ) -> Result<()> {
        let lhs = self.read(instruction, 0)?;
        let rhs = self.read(instruction, 1)?;
        let result = op(lhs.value(), rhs.value())?;
        self.write(instruction, result)
    }

    fn unary(&mut self, instruction: &ReilInstruction, op: impl FnOnce(u128) -> u128) -> Result<()> {
        let input = self.read(instruction, 0)?;
        self.write(instruction, op(input.value()))
    }

    /// Shift by an amount that is signed at the size of the second operand. Positive amounts
    /// shift left and negative amounts shift right.
    fn bsh(&mut self, instruction: &ReilInstruction) -> Result<()> {
        let value = self.read(instruction, 0)?.value();
        let amount = self.read(instruction, 1)?.signed_value();

        let distance = amount.unsigned_abs();
        let result = if distance >= u128::from(u128::BITS) {
            0
        } else if amount >= 0 {
            value << distance
        } else {
            value >> distance
        };

        self.write(instruction, result)
    }

    fn jcc(&mut self, instruction: &ReilInstruction) -> Result<ControlFlow> {
        if self.read(instruction, 0)?.is_zero() {
            return Ok(ControlFlow::NextInstruction);
        }

        let target = operand(instruction, 2)?;
        if let OperandValue::SubAddress(address) = target.value {
            return Ok(ControlFlow::Reil(address));
        }

        let native = self.address(instruction, 2)?;
        Ok(ControlFlow::Native(native))
    }

    /// Value of the operand at `position` zero-extended or truncated to the operand size.
    fn read(&self, instruction: &ReilInstruction, position: usize) -> Result<BitVector> {
        let operand = operand(instruction, position)?;
        match &operand.value {
            OperandValue::Immediate(value) => Ok(BitVector::sized(*value, operand.size)),
            OperandValue::Register(name) => self
                .registers
                .get(name)
                .map(|value| value.resize(operand.size))
                .ok_or_else(|| Error::UseOfUndefined {
                    register: name.clone(),
                    address: instruction.address,
                }),
            OperandValue::SubAddress(_) => Err(Error::InvalidOperand {
                address: instruction.address,
                position,
            }),
        }
    }

    fn address(&self, instruction: &ReilInstruction, position: usize) -> Result<u64> {
        let value = self.read(instruction, position)?;
        u64::try_from(value.value()).map_err(|_| Error::InvalidOperand {
            address: instruction.address,
            position,
        })
    }

    /// The register written by the instruction.
    fn output<'a>(&self, instruction: &'a ReilInstruction) -> Result<(&'a str, OperandSize)> {
        let third = operand(instruction, 2)?;
        let name = third.register_name().ok_or(Error::InvalidOperand {
            address: instruction.address,
            position: 2,
        })?;

        Ok((name, third.size))
    }

    fn write(&mut self, instruction: &ReilInstruction, value: u128) -> Result<()> {
        let (name, size) = self.output(instruction)?;
        self.registers.set(name, value, size);
        Ok(())
    }
}

fn operand(instruction: &ReilInstruction, position: usize) -> Result<&ReilOperand> {
    instruction.operands()[position].ok_or(Error::MissingOperand {
        address: instruction.address,
        position,
    })
}

fn find_position(
    instructions: &[ReilInstruction],
    origin: &ReilInstruction,
    target: ReilAddress,
) -> Result<usize> {
    instructions
        .iter()
        .position(|instruction| instruction.address == target)
        .ok_or(Error::InvalidOperand {
            address: origin.address,
            position: 2,
        })
}

#![allow(dead_code)]

use reil::{OperandSize, ReilProgram};
use reil_interp::{
    CpuPolicy, Endianness, Interpreter, RegisterStatus, Termination, X64CpuPolicy, X86CpuPolicy,
};
use reil_x86::{translate, Architecture, Environment, Instruction, OperandNode, OperandTree};

/// Address of the instruction run by [Machine::execute].
pub const CODE_ADDRESS: u64 = 0x1000;

pub const FLAGS: [&str; 8] = ["CF", "PF", "AF", "ZF", "SF", "IF", "DF", "OF"];

/// The six status flags written by arithmetic instructions.
pub const STATUS_FLAGS: [&str; 6] = ["CF", "PF", "AF", "ZF", "SF", "OF"];

pub enum MachineCpu {
    X86(X86CpuPolicy),
    X64(X64CpuPolicy),
}

impl CpuPolicy for MachineCpu {
    fn program_counter(&self) -> &str {
        match self {
            Self::X86(cpu) => cpu.program_counter(),
            Self::X64(cpu) => cpu.program_counter(),
        }
    }

    fn registers(&self) -> &[(&'static str, OperandSize)] {
        match self {
            Self::X86(cpu) => cpu.registers(),
            Self::X64(cpu) => cpu.registers(),
        }
    }
}

/// Translates native instructions and runs them on a fresh interpreter.
pub struct Machine {
    environment: Environment,
    interpreter: Interpreter<MachineCpu>,
}

impl Machine {
    pub fn new(architecture: Architecture) -> Self {
        init_logging();

        let cpu = match architecture {
            Architecture::X86 => MachineCpu::X86(X86CpuPolicy),
            Architecture::X64 => MachineCpu::X64(X64CpuPolicy),
        };

        Self {
            environment: Environment::new(architecture),
            interpreter: Interpreter::new(Endianness::Little, cpu, Default::default()),
        }
    }

    pub fn x86() -> Self {
        Self::new(Architecture::X86)
    }

    pub fn x64() -> Self {
        Self::new(Architecture::X64)
    }

    pub fn address_size(&self) -> OperandSize {
        self.environment.architecture_size()
    }

    pub fn set_register(&mut self, name: &str, value: u128) {
        let size = self
            .interpreter
            .cpu()
            .register_size(name)
            .unwrap_or_else(|| panic!("unknown register {name}"));

        self.interpreter
            .set_register(name, value, size, RegisterStatus::Defined)
            .expect("failed to set register");
    }

    /// Set every flag to 0.
    pub fn clear_flags(&mut self) {
        for flag in FLAGS {
            self.set_register(flag, 0);
        }
    }

    pub fn register(&self, name: &str) -> u128 {
        self.interpreter
            .variable_value(name)
            .unwrap_or_else(|| panic!("{name} is undefined"))
            .value()
    }

    pub fn flag(&self, name: &str) -> bool {
        match self.register(name) {
            0 => false,
            1 => true,
            value => panic!("{name} holds {value}"),
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.interpreter.is_defined(name)
    }

    pub fn set_memory(&mut self, address: u64, value: u128, bytes: usize) {
        self.interpreter
            .set_memory(address, value, bytes)
            .expect("failed to set memory");
    }

    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) {
        for (offset, &byte) in (0..).zip(bytes) {
            self.set_memory(address + offset, byte.into(), 1);
        }
    }

    pub fn memory(&self, address: u64, bytes: usize) -> u128 {
        let size = OperandSize::from_bytes(bytes).expect("invalid memory size");
        self.interpreter
            .memory()
            .load(address, size)
            .expect("failed to read memory")
    }

    pub fn is_mapped(&self, address: u64) -> bool {
        self.interpreter.memory().is_defined(address)
    }

    pub fn interpreter(&self) -> &Interpreter<MachineCpu> {
        &self.interpreter
    }

    /// Translate a single instruction at [CODE_ADDRESS] and run it.
    pub fn execute(
        &mut self,
        mnemonic: &str,
        operands: impl IntoIterator<Item = OperandTree>,
    ) -> Termination {
        self.run(&[Instruction::new(CODE_ADDRESS, 4, mnemonic, operands)])
    }

    pub fn try_execute(
        &mut self,
        mnemonic: &str,
        operands: impl IntoIterator<Item = OperandTree>,
    ) -> reil_interp::Result<Termination> {
        self.try_run(&[Instruction::new(CODE_ADDRESS, 4, mnemonic, operands)])
    }

    /// Translate a sequence of instructions and run it from the first one.
    pub fn run(&mut self, instructions: &[Instruction]) -> Termination {
        self.try_run(instructions)
            .unwrap_or_else(|err| panic!("failed to interpret: {err}"))
    }

    pub fn try_run(&mut self, instructions: &[Instruction]) -> reil_interp::Result<Termination> {
        let program = self.translate(instructions);
        let entry = instructions.first().map(|instruction| instruction.address);
        self.interpreter
            .interpret(&program, entry.expect("no instructions"))
    }

    pub fn translate(&mut self, instructions: &[Instruction]) -> ReilProgram {
        let mut out = Vec::new();
        for instruction in instructions {
            translate(&mut self.environment, instruction, &mut out)
                .unwrap_or_else(|err| panic!("failed to translate {instruction}: {err}"));
        }

        ReilProgram::from_iter(out)
    }

    /// A memory operand whose address expression is sized for this machine.
    pub fn mem(&self, size: OperandSize, address: OperandNode) -> OperandTree {
        OperandTree::memory(size, self.address_size(), address)
    }
}

pub fn reg(size: OperandSize, name: &str) -> OperandTree {
    OperandTree::register(size, name)
}

pub fn imm(size: OperandSize, value: impl Into<i128>) -> OperandTree {
    OperandTree::immediate(size, value)
}

pub fn at(address: u64) -> OperandNode {
    OperandNode::Immediate(address.into())
}

pub fn base(name: &str) -> OperandNode {
    OperandNode::Register(name.to_owned())
}

/// Install a log subscriber when `RUST_LOG` is set.
pub fn init_logging() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Architecture and environment hooks for the interpreter.
use reil::{OperandSize, ReilInstruction};

use crate::mem::Memory;
use crate::registers::RegisterFile;
use crate::Result;

/// Register set of a target architecture.
pub trait CpuPolicy {
    /// Register holding the native address being executed.
    fn program_counter(&self) -> &str;

    /// Native registers and their sizes.
    fn registers(&self) -> &[(&'static str, OperandSize)];

    /// Flag registers. Flags are byte-sized.
    fn flags(&self) -> &[&'static str] {
        &FLAGS
    }

    fn register_size(&self, name: &str) -> Option<OperandSize> {
        if self.flags().contains(&name) {
            return Some(OperandSize::Byte);
        }

        self.registers()
            .iter()
            .find(|(register, _)| *register == name)
            .map(|&(_, size)| size)
    }
}

const FLAGS: [&str; 8] = ["CF", "PF", "AF", "ZF", "SF", "IF", "DF", "OF"];

const X86_REGISTERS: [(&str, OperandSize); 21] = [
    ("eax", OperandSize::Dword),
    ("ebx", OperandSize::Dword),
    ("ecx", OperandSize::Dword),
    ("edx", OperandSize::Dword),
    ("esi", OperandSize::Dword),
    ("edi", OperandSize::Dword),
    ("esp", OperandSize::Dword),
    ("ebp", OperandSize::Dword),
    ("eip", OperandSize::Dword),
    ("cs", OperandSize::Word),
    ("ds", OperandSize::Word),
    ("es", OperandSize::Word),
    ("fs", OperandSize::Word),
    ("gs", OperandSize::Word),
    ("ss", OperandSize::Word),
    ("csbase", OperandSize::Dword),
    ("dsbase", OperandSize::Dword),
    ("esbase", OperandSize::Dword),
    ("fsbase", OperandSize::Dword),
    ("gsbase", OperandSize::Dword),
    ("ssbase", OperandSize::Dword),
];

const X64_REGISTERS: [(&str, OperandSize); 29] = [
    ("rax", OperandSize::Qword),
    ("rbx", OperandSize::Qword),
    ("rcx", OperandSize::Qword),
    ("rdx", OperandSize::Qword),
    ("rsi", OperandSize::Qword),
    ("rdi", OperandSize::Qword),
    ("rsp", OperandSize::Qword),
    ("rbp", OperandSize::Qword),
    ("rip", OperandSize::Qword),
    ("r8", OperandSize::Qword),
    ("r9", OperandSize::Qword),
    ("r10", OperandSize::Qword),
    ("r11", OperandSize::Qword),
    ("r12", OperandSize::Qword),
    ("r13", OperandSize::Qword),
    ("r14", OperandSize::Qword),
    ("r15", OperandSize::Qword),
    ("cs", OperandSize::Word),
    ("ds", OperandSize::Word),
    ("es", OperandSize::Word),
    ("fs", OperandSize::Word),
    ("gs", OperandSize::Word),
    ("ss", OperandSize::Word),
    ("csbase", OperandSize::Qword),
    ("dsbase", OperandSize::Qword),
    ("esbase", OperandSize::Qword),
    ("fsbase", OperandSize::Qword),
    ("gsbase", OperandSize::Qword),
    ("ssbase", OperandSize::Qword),
];

/// 32-bit x86.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X86CpuPolicy;

impl CpuPolicy for X86CpuPolicy {
    fn program_counter(&self) -> &str {
        "eip"
    }

    fn registers(&self) -> &[(&'static str, OperandSize)] {
        &X86_REGISTERS
    }
}

/// x86-64.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X64CpuPolicy;

impl CpuPolicy for X64CpuPolicy {
    fn program_counter(&self) -> &str {
        "rip"
    }

    fn registers(&self) -> &[(&'static str, OperandSize)] {
        &X64_REGISTERS
    }
}

/// Whether a policy took care of an instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Handling {
    Handled,
    NotHandled,
}

/// Hooks into the execution of a program. Every hook defaults to doing nothing.
pub trait InterpreterPolicy {
    /// Called once before the first instruction.
    fn start(&mut self) {}

    /// Called before each REIL instruction is executed.
    fn next_instruction(&mut self, _instruction: &ReilInstruction) {}

    /// Called once after execution stops without a fault.
    fn end(&mut self) {}

    /// Give the policy a chance to emulate an `UNKN` instruction, for example a system call.
    fn unknown_instruction(
        &mut self,
        _instruction: &ReilInstruction,
        _registers: &mut RegisterFile,
        _memory: &mut Memory,
    ) -> Result<Handling> {
        Ok(Handling::NotHandled)
    }
}

/// Policy without any behavior. Unknown instructions are faults.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EmptyInterpreterPolicy;

impl InterpreterPolicy for EmptyInterpreterPolicy {}

use reil::OperandSize;

use crate::{Condition, Error, Result};

/// Instruction prefixes that change the translation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// `rep`. On `cmps` and `scas` this behaves as `repe`.
    Rep,
    Repe,
    Repne,

    /// `lock` has no effect on single-threaded semantics.
    Lock,
}

/// The string operation of a `movs`, `stos`, `lods`, `scas` or `cmps` instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StringOperation {
    Movs,
    Stos,
    Lods,
    Scas,
    Cmps,
}

/// Supported native mnemonics. Sized variants carry the element or register size implied by the
/// mnemonic suffix. `None` means the size is taken from the operands or the architecture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Add,
    Adc,
    Sub,
    Sbb,
    Cmp,
    Inc,
    Dec,
    Neg,
    Xadd,
    Cmpxchg,
    Mul,
    Imul,
    Div,
    Idiv,
    And,
    Or,
    Xor,
    Not,
    Test,
    Shl,
    Shr,
    Sar,
    Rol,
    Ror,
    Rcl,
    Rcr,
    Shld,
    Shrd,
    Bsf,
    Bsr,
    Bt,
    Btc,
    Btr,
    Bts,
    Bswap,
    Mov,
    Movsx,
    Movsxd,
    Movzx,
    Lea,
    Xchg,
    Cmov(Condition),
    Set(Condition),
    Cbw,
    Cwde,
    Cdqe,
    Cwd,
    Cdq,
    Cqo,
    Lahf,
    Sahf,
    Xlat,
    Nop,
    Clc,
    Stc,
    Cmc,
    Cld,
    Std,
    Cli,
    Sti,
    Pushf(Option<OperandSize>),
    Popf(Option<OperandSize>),
    Push,
    Pop,
    Pusha(Option<OperandSize>),
    Popa(Option<OperandSize>),
    Leave,
    Call,
    Ret,
    Jmp,
    Jcc(Condition),

    /// `jcxz`, `jecxz` and `jrcxz` with the size of the tested counter.
    Jcxz(OperandSize),
    Loop,
    Loope,
    Loopne,
    String(StringOperation, Option<OperandSize>),

    /// Instructions that interact with the environment. These become `UNKN` and are left to the
    /// interpreter policy.
    System,
}

/// A parsed mnemonic with its prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedMnemonic {
    pub prefixes: Vec<Prefix>,
    pub mnemonic: Mnemonic,
}

impl ParsedMnemonic {
    /// The repeat prefix, if any.
    pub fn repeat(&self) -> Option<Prefix> {
        self.prefixes
            .iter()
            .copied()
            .find(|prefix| *prefix != Prefix::Lock)
    }
}

fn string_operation(name: &str) -> Option<Mnemonic> {
    let operations = [
        ("movs", StringOperation::Movs),
        ("stos", StringOperation::Stos),
        ("lods", StringOperation::Lods),
        ("scas", StringOperation::Scas),
        ("cmps", StringOperation::Cmps),
    ];

    for (base, operation) in operations {
        let Some(suffix) = name.strip_prefix(base) else {
            continue;
        };

        let size = match suffix {
            "" => None,
            "b" => Some(OperandSize::Byte),
            "w" => Some(OperandSize::Word),
            "d" => Some(OperandSize::Dword),
            "q" => Some(OperandSize::Qword),
            _ => continue,
        };

        return Some(Mnemonic::String(operation, size));
    }

    None
}

fn conditional(name: &str) -> Option<Mnemonic> {
    if let Some(suffix) = name.strip_prefix("cmov") {
        return Condition::from_suffix(suffix).map(Mnemonic::Cmov);
    }

    if let Some(suffix) = name.strip_prefix("set") {
        return Condition::from_suffix(suffix).map(Mnemonic::Set);
    }

    // jmp and the jcxz family are matched before this
    name.strip_prefix('j')
        .and_then(Condition::from_suffix)
        .map(Mnemonic::Jcc)
}

impl std::str::FromStr for Mnemonic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.to_ascii_lowercase();
        let mnemonic = match name.as_str() {
            "add" => Self::Add,
            "adc" => Self::Adc,
            "sub" => Self::Sub,
            "sbb" => Self::Sbb,
            "cmp" => Self::Cmp,
            "inc" => Self::Inc,
            "dec" => Self::Dec,
            "neg" => Self::Neg,
            "xadd" => Self::Xadd,
            "cmpxchg" => Self::Cmpxchg,
            "mul" => Self::Mul,
            "imul" => Self::Imul,
            "div" => Self::Div,
            "idiv" => Self::Idiv,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "not" => Self::Not,
            "test" => Self::Test,
            "shl" | "sal" => Self::Shl,
            "shr" => Self::Shr,
            "sar" => Self::Sar,
            "rol" => Self::Rol,
            "ror" => Self::Ror,
            "rcl" => Self::Rcl,
            "rcr" => Self::Rcr,
            "shld" => Self::Shld,
            "shrd" => Self::Shrd,
            "bsf" => Self::Bsf,
            "bsr" => Self::Bsr,
            "bt" => Self::Bt,
            "btc" => Self::Btc,
            "btr" => Self::Btr,
            "bts" => Self::Bts,
            "bswap" => Self::Bswap,
            "mov" => Self::Mov,
            "movsx" => Self::Movsx,
            "movsxd" => Self::Movsxd,
            "movzx" => Self::Movzx,
            "lea" => Self::Lea,
            "xchg" => Self::Xchg,
            "cbw" => Self::Cbw,
            "cwde" => Self::Cwde,
            "cdqe" => Self::Cdqe,
            "cwd" => Self::Cwd,
            "cdq" => Self::Cdq,
            "cqo" => Self::Cqo,
            "lahf" => Self::Lahf,
            "sahf" => Self::Sahf,
            "xlat" | "xlatb" => Self::Xlat,
            "nop" => Self::Nop,
            "clc" => Self::Clc,
            "stc" => Self::Stc,
            "cmc" => Self::Cmc,
            "cld" => Self::Cld,
            "std" => Self::Std,
            "cli" => Self::Cli,
            "sti" => Self::Sti,
            "pushf" => Self::Pushf(None),
            "pushfw" => Self::Pushf(Some(OperandSize::Word)),
            "pushfd" => Self::Pushf(Some(OperandSize::Dword)),
            "pushfq" => Self::Pushf(Some(OperandSize::Qword)),
            "popf" => Self::Popf(None),
            "popfw" => Self::Popf(Some(OperandSize::Word)),
            "popfd" => Self::Popf(Some(OperandSize::Dword)),
            "popfq" => Self::Popf(Some(OperandSize::Qword)),
            "push" => Self::Push,
            "pop" => Self::Pop,
            "pusha" => Self::Pusha(None),
            "pushaw" => Self::Pusha(Some(OperandSize::Word)),
            "pushad" => Self::Pusha(Some(OperandSize::Dword)),
            "popa" => Self::Popa(None),
            "popaw" => Self::Popa(Some(OperandSize::Word)),
            "popad" => Self::Popa(Some(OperandSize::Dword)),
            "leave" => Self::Leave,
            "call" => Self::Call,
            "ret" | "retn" => Self::Ret,
            "jmp" => Self::Jmp,
            "jcxz" => Self::Jcxz(OperandSize::Word),
            "jecxz" => Self::Jcxz(OperandSize::Dword),
            "jrcxz" => Self::Jcxz(OperandSize::Qword),
            "loop" => Self::Loop,
            "loope" | "loopz" => Self::Loope,
            "loopne" | "loopnz" => Self::Loopne,
            "hlt" | "int" | "int3" | "into" | "syscall" | "sysenter" | "cpuid" | "rdtsc" => {
                Self::System
            }
            other => string_operation(other)
                .or_else(|| conditional(other))
                .ok_or_else(|| Error::UnsupportedMnemonic(s.to_owned()))?,
        };

        Ok(mnemonic)
    }
}

impl std::str::FromStr for ParsedMnemonic {
    type Err = Error;

    /// Parse a mnemonic preceded by any number of whitespace separated prefixes.
    fn from_str(s: &str) -> Result<Self> {
        let mut prefixes = Vec::new();
        let mut words = s.split_whitespace().peekable();
        while let Some(word) = words.next() {
            if words.peek().is_none() {
                return Ok(Self {
                    prefixes,
                    mnemonic: word.parse()?,
                });
            }

            let prefix = match word.to_ascii_lowercase().as_str() {
                "rep" => Prefix::Rep,
                "repe" | "repz" => Prefix::Repe,
                "repne" | "repnz" => Prefix::Repne,
                "lock" => Prefix::Lock,
                _ => return Err(Error::UnsupportedMnemonic(s.to_owned())),
            };
            prefixes.push(prefix);
        }

        Err(Error::UnsupportedMnemonic(s.to_owned()))
    }
}

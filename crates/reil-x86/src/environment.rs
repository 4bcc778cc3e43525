use std::collections::HashMap;

use reil::OperandSize;

use crate::{Error, Result};

/// Native architecture targeted by a translation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 32-bit x86
    X86,

    /// 64-bit x86-64
    X64,
}

impl Architecture {
    /// Size of addresses and general purpose registers.
    pub fn address_size(self) -> OperandSize {
        match self {
            Self::X86 => OperandSize::Dword,
            Self::X64 => OperandSize::Qword,
        }
    }

    pub fn stack_pointer(self) -> &'static str {
        match self {
            Self::X86 => "esp",
            Self::X64 => "rsp",
        }
    }

    pub fn program_counter(self) -> &'static str {
        match self {
            Self::X86 => "eip",
            Self::X64 => "rip",
        }
    }
}

/// Index of a register descriptor in an [Environment].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterId(usize);

/// Describes a native register. Registers that overlap a larger register name that register as
/// their parent, with `bit_offset` giving the position of the lowest bit within the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub size: OperandSize,
    pub parent: Option<RegisterId>,
    pub bit_offset: u32,
}

/// Location of a register within its outermost parent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterSlice<'a> {
    pub root: &'a RegisterDescriptor,
    pub size: OperandSize,
    pub bit_offset: u32,
}

impl RegisterSlice<'_> {
    /// Whether the register is the full root register.
    pub fn is_root(&self) -> bool {
        self.size == self.root.size && self.bit_offset == 0
    }
}

/// Architecture description and temporary register pool for one translation unit.
///
/// The temporary counter is never reset, so reusing an environment for every instruction of a
/// function keeps temporary names unique across the function.
#[derive(Debug, Clone)]
pub struct Environment {
    architecture: Architecture,
    registers: Vec<RegisterDescriptor>,
    by_name: HashMap<&'static str, RegisterId>,
    next_temporary: u64,
}

/// Each family is a root register followed by its nested sub-registers, innermost last. A
/// sub-register entry is `(name, size, offset in parent, parent index within the family)`.
type Family = (
    &'static str,
    OperandSize,
    &'static [(&'static str, OperandSize, u32, usize)],
);

const X86_FAMILIES: &[Family] = &[
    (
        "eax",
        OperandSize::Dword,
        &[
            ("ax", OperandSize::Word, 0, 0),
            ("al", OperandSize::Byte, 0, 1),
            ("ah", OperandSize::Byte, 8, 1),
        ],
    ),
    (
        "ebx",
        OperandSize::Dword,
        &[
            ("bx", OperandSize::Word, 0, 0),
            ("bl", OperandSize::Byte, 0, 1),
            ("bh", OperandSize::Byte, 8, 1),
        ],
    ),
    (
        "ecx",
        OperandSize::Dword,
        &[
            ("cx", OperandSize::Word, 0, 0),
            ("cl", OperandSize::Byte, 0, 1),
            ("ch", OperandSize::Byte, 8, 1),
        ],
    ),
    (
        "edx",
        OperandSize::Dword,
        &[
            ("dx", OperandSize::Word, 0, 0),
            ("dl", OperandSize::Byte, 0, 1),
            ("dh", OperandSize::Byte, 8, 1),
        ],
    ),
    ("esi", OperandSize::Dword, &[("si", OperandSize::Word, 0, 0)]),
    ("edi", OperandSize::Dword, &[("di", OperandSize::Word, 0, 0)]),
    ("esp", OperandSize::Dword, &[("sp", OperandSize::Word, 0, 0)]),
    ("ebp", OperandSize::Dword, &[("bp", OperandSize::Word, 0, 0)]),
    ("eip", OperandSize::Dword, &[("ip", OperandSize::Word, 0, 0)]),
];

const X64_FAMILIES: &[Family] = &[
    (
        "rax",
        OperandSize::Qword,
        &[
            ("eax", OperandSize::Dword, 0, 0),
            ("ax", OperandSize::Word, 0, 1),
            ("al", OperandSize::Byte, 0, 2),
            ("ah", OperandSize::Byte, 8, 2),
        ],
    ),
    (
        "rbx",
        OperandSize::Qword,
        &[
            ("ebx", OperandSize::Dword, 0, 0),
            ("bx", OperandSize::Word, 0, 1),
            ("bl", OperandSize::Byte, 0, 2),
            ("bh", OperandSize::Byte, 8, 2),
        ],
    ),
    (
        "rcx",
        OperandSize::Qword,
        &[
            ("ecx", OperandSize::Dword, 0, 0),
            ("cx", OperandSize::Word, 0, 1),
            ("cl", OperandSize::Byte, 0, 2),
            ("ch", OperandSize::Byte, 8, 2),
        ],
    ),
    (
        "rdx",
        OperandSize::Qword,
        &[
            ("edx", OperandSize::Dword, 0, 0),
            ("dx", OperandSize::Word, 0, 1),
            ("dl", OperandSize::Byte, 0, 2),
            ("dh", OperandSize::Byte, 8, 2),
        ],
    ),
    (
        "rsi",
        OperandSize::Qword,
        &[
            ("esi", OperandSize::Dword, 0, 0),
            ("si", OperandSize::Word, 0, 1),
            ("sil", OperandSize::Byte, 0, 2),
        ],
    ),
    (
        "rdi",
        OperandSize::Qword,
        &[
            ("edi", OperandSize::Dword, 0, 0),
            ("di", OperandSize::Word, 0, 1),
            ("dil", OperandSize::Byte, 0, 2),
        ],
    ),
    (
        "rsp",
        OperandSize::Qword,
        &[
            ("esp", OperandSize::Dword, 0, 0),
            ("sp", OperandSize::Word, 0, 1),
            ("spl", OperandSize::Byte, 0, 2),
        ],
    ),
    (
        "rbp",
        OperandSize::Qword,
        &[
            ("ebp", OperandSize::Dword, 0, 0),
            ("bp", OperandSize::Word, 0, 1),
            ("bpl", OperandSize::Byte, 0, 2),
        ],
    ),
    (
        "rip",
        OperandSize::Qword,
        &[
            ("eip", OperandSize::Dword, 0, 0),
            ("ip", OperandSize::Word, 0, 1),
        ],
    ),
];

const X64_NUMBERED: [(&str, &str, &str, &str); 8] = [
    ("r8", "r8d", "r8w", "r8b"),
    ("r9", "r9d", "r9w", "r9b"),
    ("r10", "r10d", "r10w", "r10b"),
    ("r11", "r11d", "r11w", "r11b"),
    ("r12", "r12d", "r12w", "r12b"),
    ("r13", "r13d", "r13w", "r13b"),
    ("r14", "r14d", "r14w", "r14b"),
    ("r15", "r15d", "r15w", "r15b"),
];

const SEGMENTS: [&str; 6] = ["cs", "ds", "es", "fs", "gs", "ss"];

const SEGMENT_BASES: [&str; 6] = ["csbase", "dsbase", "esbase", "fsbase", "gsbase", "ssbase"];

impl Environment {
    pub fn new(architecture: Architecture) -> Self {
        let mut environment = Self {
            architecture,
            registers: Vec::new(),
            by_name: HashMap::new(),
            next_temporary: 0,
        };

        let families = match architecture {
            Architecture::X86 => X86_FAMILIES,
            Architecture::X64 => X64_FAMILIES,
        };

        for (name, size, children) in families {
            environment.add_family(name, *size, children);
        }

        if architecture == Architecture::X64 {
            for (root, dword, word, byte) in X64_NUMBERED {
                let children: [(&'static str, OperandSize, u32, usize); 3] = [
                    (dword, OperandSize::Dword, 0, 0),
                    (word, OperandSize::Word, 0, 1),
                    (byte, OperandSize::Byte, 0, 2),
                ];
                environment.add_family(root, OperandSize::Qword, &children);
            }
        }

        for segment in SEGMENTS {
            environment.add_register(segment, OperandSize::Word, None, 0);
        }

        // Segment bases are pseudo registers added to addresses with a segment override
        for base in SEGMENT_BASES {
            environment.add_register(base, architecture.address_size(), None, 0);
        }

        environment
    }

    fn add_register(
        &mut self,
        name: &'static str,
        size: OperandSize,
        parent: Option<RegisterId>,
        bit_offset: u32,
    ) -> RegisterId {
        let id = RegisterId(self.registers.len());
        self.registers.push(RegisterDescriptor {
            name,
            size,
            parent,
            bit_offset,
        });
        self.by_name.insert(name, id);
        id
    }

    fn add_family(
        &mut self,
        name: &'static str,
        size: OperandSize,
        children: &[(&'static str, OperandSize, u32, usize)],
    ) {
        let mut family = vec![self.add_register(name, size, None, 0)];
        for &(child, child_size, offset, parent) in children {
            let parent = family[parent];
            family.push(self.add_register(child, child_size, Some(parent), offset));
        }
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn architecture_size(&self) -> OperandSize {
        self.architecture.address_size()
    }

    pub fn stack_pointer(&self) -> &'static str {
        self.architecture.stack_pointer()
    }

    pub fn program_counter(&self) -> &'static str {
        self.architecture.program_counter()
    }

    pub fn register_id(&self, name: &str) -> Option<RegisterId> {
        self.by_name.get(name.to_ascii_lowercase().as_str()).copied()
    }

    pub fn register(&self, id: RegisterId) -> &RegisterDescriptor {
        &self.registers[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<&RegisterDescriptor> {
        self.register_id(name).map(|id| self.register(id))
    }

    /// The outermost register containing `name` and the position of `name` within it.
    pub fn slice(&self, name: &str) -> Result<RegisterSlice<'_>> {
        let id = self
            .register_id(name)
            .ok_or_else(|| Error::UnknownRegister(name.to_owned()))?;

        let register = self.register(id);
        let mut root = register;
        let mut bit_offset = 0;
        while let Some(parent) = root.parent {
            bit_offset += root.bit_offset;
            root = self.register(parent);
        }

        Ok(RegisterSlice {
            root,
            size: register.size,
            bit_offset,
        })
    }

    /// Registers with no parent. These are the only native registers REIL code writes.
    pub fn root_registers(&self) -> impl Iterator<Item = &RegisterDescriptor> {
        self.registers
            .iter()
            .filter(|register| register.parent.is_none())
    }

    /// Allocate the name of a fresh temporary register.
    pub fn next_temporary(&mut self) -> String {
        let name = format!("t{index}", index = self.next_temporary);
        self.next_temporary += 1;
        name
    }

    /// Number of temporary registers allocated so far.
    pub fn temporaries_allocated(&self) -> u64 {
        self.next_temporary
    }
}

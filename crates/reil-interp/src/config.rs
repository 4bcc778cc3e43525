/// Native address that stops execution when control reaches it.
pub const DEFAULT_HALT_ADDRESS: u64 = 0xFFFF_FFFF;

/// Maximum length of an x86 instruction.
pub const DEFAULT_FALLTHROUGH_WINDOW: u64 = 15;

/// Options controlling how an [crate::Interpreter] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Execution stops when control transfers to this native address.
    pub halt_address: Option<u64>,

    /// Upper bound on the number of REIL instructions executed by one call to interpret.
    pub instruction_limit: Option<u64>,

    /// How many bytes past a native instruction to search for the next one when control falls
    /// through.
    pub fallthrough_window: u64,

    /// Start every register known to the CPU policy as defined with the value 0.
    pub zero_initialize: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            halt_address: Some(DEFAULT_HALT_ADDRESS),
            instruction_limit: None,
            fallthrough_window: DEFAULT_FALLTHROUGH_WINDOW,
            zero_initialize: false,
        }
    }
}

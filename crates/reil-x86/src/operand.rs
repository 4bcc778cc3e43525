//! Decoded operand expression trees. Every operand is rooted at a size prefix which gives the bit
//! width of the operand. Memory operands wrap an address expression in a dereference node.
use reil::OperandSize;

/// Segment register named by a segment override.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Cs,
    Ds,
    Es,
    Fs,
    Gs,
    Ss,
}

impl Segment {
    /// The pseudo register holding the base address of this segment.
    pub fn base_register(self) -> &'static str {
        match self {
            Self::Cs => "csbase",
            Self::Ds => "dsbase",
            Self::Es => "esbase",
            Self::Fs => "fsbase",
            Self::Gs => "gsbase",
            Self::Ss => "ssbase",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cs => "cs",
            Self::Ds => "ds",
            Self::Es => "es",
            Self::Fs => "fs",
            Self::Gs => "gs",
            Self::Ss => "ss",
        };

        f.write_str(name)
    }
}

impl std::str::FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cs" => Ok(Self::Cs),
            "ds" => Ok(Self::Ds),
            "es" => Ok(Self::Es),
            "fs" => Ok(Self::Fs),
            "gs" => Ok(Self::Gs),
            "ss" => Ok(Self::Ss),
            _ => Err(s.to_owned()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Mul,

    /// Segment override. The single child is the offset within the segment.
    Segment(Segment),
}

/// The kind of an operand tree node as reported by instruction decoders.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    Register,
    ImmediateInteger,
    MemDeref,
    Operator,
    SizePrefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperandNode {
    SizePrefix {
        size: OperandSize,
        child: Box<OperandNode>,
    },
    Register(String),
    Immediate(i128),
    MemDeref(Box<OperandNode>),
    Operator {
        operator: Operator,
        children: Vec<OperandNode>,
    },
}

impl OperandNode {
    pub fn expression_type(&self) -> ExpressionType {
        match self {
            Self::SizePrefix { .. } => ExpressionType::SizePrefix,
            Self::Register(_) => ExpressionType::Register,
            Self::Immediate(_) => ExpressionType::ImmediateInteger,
            Self::MemDeref(_) => ExpressionType::MemDeref,
            Self::Operator { .. } => ExpressionType::Operator,
        }
    }

    pub fn sized(size: OperandSize, child: OperandNode) -> Self {
        Self::SizePrefix {
            size,
            child: Box::new(child),
        }
    }

    pub fn add(children: impl IntoIterator<Item = OperandNode>) -> Self {
        Self::Operator {
            operator: Operator::Add,
            children: children.into_iter().collect(),
        }
    }

    pub fn mul(lhs: OperandNode, rhs: OperandNode) -> Self {
        Self::Operator {
            operator: Operator::Mul,
            children: vec![lhs, rhs],
        }
    }

    pub fn segment(segment: Segment, offset: OperandNode) -> Self {
        Self::Operator {
            operator: Operator::Segment(segment),
            children: vec![offset],
        }
    }
}

impl std::fmt::Display for OperandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SizePrefix { size, child } => write!(f, "{size} {child}"),
            Self::Register(name) => f.write_str(name),
            Self::Immediate(value) if *value < 0 => write!(f, "-{:#x}", value.unsigned_abs()),
            Self::Immediate(value) => write!(f, "{value:#x}"),
            Self::MemDeref(child) => write!(f, "[{child}]"),
            Self::Operator {
                operator: Operator::Segment(segment),
                children,
            } => {
                write!(f, "{segment}:")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Self::Operator { operator, children } => {
                let symbol = if *operator == Operator::Mul { "*" } else { "+" };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(symbol)?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

/// A complete decoded operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperandTree {
    pub root: OperandNode,
}

impl OperandTree {
    pub fn new(root: OperandNode) -> Self {
        Self { root }
    }

    /// A register operand of the given size.
    pub fn register(size: OperandSize, name: impl Into<String>) -> Self {
        Self::new(OperandNode::sized(size, OperandNode::Register(name.into())))
    }

    pub fn immediate(size: OperandSize, value: impl Into<i128>) -> Self {
        Self::new(OperandNode::sized(size, OperandNode::Immediate(value.into())))
    }

    /// A memory operand of `size` bytes at the address computed by `address`. Address expression
    /// nodes are sized at `address_size`.
    pub fn memory(size: OperandSize, address_size: OperandSize, address: OperandNode) -> Self {
        Self::new(OperandNode::sized(
            size,
            OperandNode::MemDeref(Box::new(OperandNode::sized(address_size, address))),
        ))
    }

    /// Operand size from the root size prefix.
    pub fn size(&self) -> Option<OperandSize> {
        match &self.root {
            OperandNode::SizePrefix { size, .. } => Some(*size),
            _ => None,
        }
    }

    /// The node below the root size prefix.
    pub fn value(&self) -> &OperandNode {
        match &self.root {
            OperandNode::SizePrefix { child, .. } => child,
            other => other,
        }
    }

    pub fn register_name(&self) -> Option<&str> {
        match self.value() {
            OperandNode::Register(name) => Some(name),
            _ => None,
        }
    }

    pub fn immediate_value(&self) -> Option<i128> {
        match self.value() {
            OperandNode::Immediate(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.value(), OperandNode::MemDeref(_))
    }
}

impl std::fmt::Display for OperandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)
    }
}

use core::fmt;

/// Highest trailing-operand count an `Execute` record can carry.
///
/// The execute tags occupy one wire value per arity, so the run
/// `0..=MAX_EXECUTE_ARITY` is reserved for them.
pub const MAX_EXECUTE_ARITY: u8 = 64;

/// Opcode tags.
///
/// One byte on the wire. `Execute` tags are a contiguous run of 65 values
/// (0..=64), one per possible trailing-operand count, so the tag itself
/// conveys the arity. The fixed tags follow, and [`Invalid`](Op::Invalid)
/// is a sentinel that is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Call a host function. Record: `function_index:u16`, followed by
    /// `arity` operands (the payload of the tag).
    Execute(u8),

    /// Zero the argument slot. Record: one operand.
    Zero,
    /// Write `false` into the argument slot. Record: one operand.
    BoolFalse,
    /// Write `true` into the argument slot. Record: one operand.
    BoolTrue,
    /// Copy one slot to another. Record: `source`, `target` operands.
    Copy,
    /// Increment the argument slot. Record: one operand.
    Increment,
    /// Decrement the argument slot. Record: one operand.
    Decrement,
    /// Compare two slots for equality. Record: `a`, `b`, `result` operands.
    Equals,
    /// Compare two slots for inequality. Record: `a`, `b`, `result` operands.
    NotEquals,
    /// Jump to an absolute instruction index. Record: `target:u16`.
    JumpAbsolute,
    /// Jump forward by an instruction count. Record: `target:u16`.
    JumpForward,
    /// Jump backward by an instruction count. Record: `target:u16`.
    JumpBackward,
    /// Conditional absolute jump. Record: `target:u16`, condition operand,
    /// `when:bool`.
    JumpAbsoluteIf,
    /// Conditional forward jump. Same record as [`JumpAbsoluteIf`](Op::JumpAbsoluteIf).
    JumpForwardIf,
    /// Conditional backward jump. Same record as [`JumpAbsoluteIf`](Op::JumpAbsoluteIf).
    JumpBackwardIf,
    /// Retype a register slot. Record: operand, `RegisterType` tag,
    /// `element_size:u16`, `element_count:u16`, `slice_count:u16`.
    ChangeType,
    /// Stop execution. Tag only.
    Exit,
    /// Open a slice block. Record: `count`, `index` operands.
    BeginBlock,
    /// Close the innermost slice block. Tag only.
    EndBlock,

    /// Sentinel for bytes that are not a known tag. Never persisted.
    Invalid,
}

impl Op {
    /// Decode a wire byte. Unknown bytes map to [`Invalid`](Op::Invalid).
    pub fn from_byte(byte: u8) -> Op {
        match byte {
            0..=MAX_EXECUTE_ARITY => Op::Execute(byte),
            65 => Op::Zero,
            66 => Op::BoolFalse,
            67 => Op::BoolTrue,
            68 => Op::Copy,
            69 => Op::Increment,
            70 => Op::Decrement,
            71 => Op::Equals,
            72 => Op::NotEquals,
            73 => Op::JumpAbsolute,
            74 => Op::JumpForward,
            75 => Op::JumpBackward,
            76 => Op::JumpAbsoluteIf,
            77 => Op::JumpForwardIf,
            78 => Op::JumpBackwardIf,
            79 => Op::ChangeType,
            80 => Op::Exit,
            81 => Op::BeginBlock,
            82 => Op::EndBlock,
            _ => Op::Invalid,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Op::Execute(arity) => {
                debug_assert!(arity <= MAX_EXECUTE_ARITY, "execute arity out of range: {arity}");
                arity
            }
            Op::Zero => 65,
            Op::BoolFalse => 66,
            Op::BoolTrue => 67,
            Op::Copy => 68,
            Op::Increment => 69,
            Op::Decrement => 70,
            Op::Equals => 71,
            Op::NotEquals => 72,
            Op::JumpAbsolute => 73,
            Op::JumpForward => 74,
            Op::JumpBackward => 75,
            Op::JumpAbsoluteIf => 76,
            Op::JumpForwardIf => 77,
            Op::JumpBackwardIf => 78,
            Op::ChangeType => 79,
            Op::Exit => 80,
            Op::BeginBlock => 81,
            Op::EndBlock => 82,
            Op::Invalid => 83,
        }
    }

    /// Record size in bytes, tag included, excluding any trailing operand
    /// array. Querying [`Invalid`](Op::Invalid) is a programming error.
    pub fn record_size(self) -> usize {
        match self {
            Op::Execute(_) => 3,
            Op::Zero
            | Op::BoolFalse
            | Op::BoolTrue
            | Op::Increment
            | Op::Decrement => 5,
            Op::Copy | Op::BeginBlock => 9,
            Op::Equals | Op::NotEquals => 13,
            Op::JumpAbsolute | Op::JumpForward | Op::JumpBackward => 3,
            Op::JumpAbsoluteIf | Op::JumpForwardIf | Op::JumpBackwardIf => 8,
            Op::ChangeType => 12,
            Op::Exit | Op::EndBlock => 1,
            Op::Invalid => panic!("record size queried for Op::Invalid"),
        }
    }

    /// Required start alignment of the record in the aligned buffer form.
    /// Querying [`Invalid`](Op::Invalid) is a programming error.
    pub fn alignment(self) -> usize {
        match self {
            Op::Exit | Op::EndBlock => 1,
            Op::Invalid => panic!("alignment queried for Op::Invalid"),
            _ => 2,
        }
    }

    /// Trailing-operand count for execute tags, `None` for everything else.
    pub fn execute_arity(self) -> Option<u8> {
        match self {
            Op::Execute(arity) => Some(arity),
            _ => None,
        }
    }

    pub fn is_execute(self) -> bool {
        matches!(self, Op::Execute(_))
    }

    /// Whether the record's first payload field is a `u16` jump target.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Op::JumpAbsolute
                | Op::JumpForward
                | Op::JumpBackward
                | Op::JumpAbsoluteIf
                | Op::JumpForwardIf
                | Op::JumpBackwardIf
        )
    }

    /// Look up a fixed tag by its display name. Execute tags are not
    /// reachable this way (their name carries the arity).
    pub fn from_name(name: &str) -> Option<Op> {
        Some(match name {
            "Zero" => Op::Zero,
            "BoolFalse" => Op::BoolFalse,
            "BoolTrue" => Op::BoolTrue,
            "Copy" => Op::Copy,
            "Increment" => Op::Increment,
            "Decrement" => Op::Decrement,
            "Equals" => Op::Equals,
            "NotEquals" => Op::NotEquals,
            "JumpAbsolute" => Op::JumpAbsolute,
            "JumpForward" => Op::JumpForward,
            "JumpBackward" => Op::JumpBackward,
            "JumpAbsoluteIf" => Op::JumpAbsoluteIf,
            "JumpForwardIf" => Op::JumpForwardIf,
            "JumpBackwardIf" => Op::JumpBackwardIf,
            "ChangeType" => Op::ChangeType,
            "Exit" => Op::Exit,
            "BeginBlock" => Op::BeginBlock,
            "EndBlock" => Op::EndBlock,
            _ => return None,
        })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Execute(arity) => write!(f, "Execute{arity}"),
            Op::Zero => write!(f, "Zero"),
            Op::BoolFalse => write!(f, "BoolFalse"),
            Op::BoolTrue => write!(f, "BoolTrue"),
            Op::Copy => write!(f, "Copy"),
            Op::Increment => write!(f, "Increment"),
            Op::Decrement => write!(f, "Decrement"),
            Op::Equals => write!(f, "Equals"),
            Op::NotEquals => write!(f, "NotEquals"),
            Op::JumpAbsolute => write!(f, "JumpAbsolute"),
            Op::JumpForward => write!(f, "JumpForward"),
            Op::JumpBackward => write!(f, "JumpBackward"),
            Op::JumpAbsoluteIf => write!(f, "JumpAbsoluteIf"),
            Op::JumpForwardIf => write!(f, "JumpForwardIf"),
            Op::JumpBackwardIf => write!(f, "JumpBackwardIf"),
            Op::ChangeType => write!(f, "ChangeType"),
            Op::Exit => write!(f, "Exit"),
            Op::BeginBlock => write!(f, "BeginBlock"),
            Op::EndBlock => write!(f, "EndBlock"),
            Op::Invalid => write!(f, "Invalid"),
        }
    }
}

/// Direction selector for the jump builder calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Absolute,
    Forward,
    Backward,
}

impl JumpKind {
    /// The unconditional jump tag for this direction.
    pub fn op(self) -> Op {
        match self {
            JumpKind::Absolute => Op::JumpAbsolute,
            JumpKind::Forward => Op::JumpForward,
            JumpKind::Backward => Op::JumpBackward,
        }
    }

    /// The conditional jump tag for this direction.
    pub fn conditional_op(self) -> Op {
        match self {
            JumpKind::Absolute => Op::JumpAbsoluteIf,
            JumpKind::Forward => Op::JumpForwardIf,
            JumpKind::Backward => Op::JumpBackwardIf,
        }
    }
}

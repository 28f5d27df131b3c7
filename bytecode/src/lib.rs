mod archive;
mod bytecode;
mod cursor;
mod op;
mod operand;
mod operation;

pub use archive::{Archive, ArchiveError, Result};
pub use bytecode::{
    ByteCode, Entry, Instruction, VERSION_DETERMINISTIC, VERSION_FIRST, VERSION_LATEST,
};
pub use op::{JumpKind, MAX_EXECUTE_ARITY, Op};
pub use operand::{Bank, Operand, RegisterType};
pub use operation::Operation;

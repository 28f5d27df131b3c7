use core::fmt;

use crate::archive::ArchiveError;
use crate::cursor::ByteCursor;
use crate::op::{MAX_EXECUTE_ARITY, Op};
use crate::operand::{Operand, RegisterType};

/// A fully decoded operation record.
///
/// One variant per record shape; shapes shared by several tags (`Unary`,
/// `Comparison`, `Jump`, `JumpIf`, `Bare`) embed the tag. This is the
/// transient view the interpreter and the legacy serializer work with —
/// the buffer itself stores the packed wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Host function call plus its trailing operand array.
    Execute {
        function: u16,
        operands: Vec<Operand>,
    },
    Copy {
        source: Operand,
        target: Operand,
    },
    /// `Zero`, `BoolFalse`, `BoolTrue`, `Increment` or `Decrement`.
    Unary {
        op: Op,
        arg: Operand,
    },
    /// `Equals` or `NotEquals`.
    Comparison {
        op: Op,
        a: Operand,
        b: Operand,
        result: Operand,
    },
    /// `JumpAbsolute`, `JumpForward` or `JumpBackward`; the target is an
    /// instruction index (absolute) or an instruction count (relative).
    Jump {
        op: Op,
        target: u16,
    },
    /// `JumpAbsoluteIf`, `JumpForwardIf` or `JumpBackwardIf`.
    JumpIf {
        op: Op,
        target: u16,
        condition: Operand,
        when: bool,
    },
    ChangeType {
        arg: Operand,
        register_type: RegisterType,
        element_size: u16,
        element_count: u16,
        slice_count: u16,
    },
    /// `Exit` or `EndBlock`: tag only, no payload.
    Bare {
        op: Op,
    },
    BeginBlock {
        count: Operand,
        index: Operand,
    },
}

impl Operation {
    pub fn opcode(&self) -> Op {
        match self {
            Operation::Execute { operands, .. } => Op::Execute(operands.len() as u8),
            Operation::Copy { .. } => Op::Copy,
            Operation::Unary { op, .. }
            | Operation::Comparison { op, .. }
            | Operation::Jump { op, .. }
            | Operation::JumpIf { op, .. }
            | Operation::Bare { op } => *op,
            Operation::ChangeType { .. } => Op::ChangeType,
            Operation::BeginBlock { .. } => Op::BeginBlock,
        }
    }

    /// Append the packed (unaligned) wire form, tag byte first, payload
    /// fields in declaration order, little-endian.
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode().as_byte());
        match self {
            Operation::Execute { function, operands } => {
                assert!(
                    operands.len() <= MAX_EXECUTE_ARITY as usize,
                    "execute record with {} operands exceeds the arity limit",
                    operands.len()
                );
                out.extend_from_slice(&function.to_le_bytes());
                for operand in operands {
                    operand.encode(out);
                }
            }
            Operation::Copy { source, target } => {
                source.encode(out);
                target.encode(out);
            }
            Operation::Unary { arg, .. } => {
                arg.encode(out);
            }
            Operation::Comparison { a, b, result, .. } => {
                a.encode(out);
                b.encode(out);
                result.encode(out);
            }
            Operation::Jump { target, .. } => {
                out.extend_from_slice(&target.to_le_bytes());
            }
            Operation::JumpIf {
                target,
                condition,
                when,
                ..
            } => {
                out.extend_from_slice(&target.to_le_bytes());
                condition.encode(out);
                out.push(*when as u8);
            }
            Operation::ChangeType {
                arg,
                register_type,
                element_size,
                element_count,
                slice_count,
            } => {
                arg.encode(out);
                out.push(*register_type as u8);
                out.extend_from_slice(&element_size.to_le_bytes());
                out.extend_from_slice(&element_count.to_le_bytes());
                out.extend_from_slice(&slice_count.to_le_bytes());
            }
            Operation::Bare { .. } => {}
            Operation::BeginBlock { count, index } => {
                count.encode(out);
                index.encode(out);
            }
        }
    }

    /// Decode one record at the cursor position. `aligned` selects whether
    /// the trailing operand array of an execute record sits behind
    /// alignment padding.
    pub(crate) fn decode(cur: &mut ByteCursor<'_>, aligned: bool) -> Operation {
        let at = cur.pos();
        let tag = cur.read_u8();
        let op = Op::from_byte(tag);
        match op {
            Op::Execute(arity) => {
                let function = cur.read_u16();
                if aligned {
                    cur.align_to(Operand::ALIGN);
                }
                let operands = (0..arity).map(|_| cur.read_operand()).collect();
                Operation::Execute { function, operands }
            }
            Op::Zero | Op::BoolFalse | Op::BoolTrue | Op::Increment | Op::Decrement => {
                Operation::Unary {
                    op,
                    arg: cur.read_operand(),
                }
            }
            Op::Copy => Operation::Copy {
                source: cur.read_operand(),
                target: cur.read_operand(),
            },
            Op::Equals | Op::NotEquals => Operation::Comparison {
                op,
                a: cur.read_operand(),
                b: cur.read_operand(),
                result: cur.read_operand(),
            },
            Op::JumpAbsolute | Op::JumpForward | Op::JumpBackward => Operation::Jump {
                op,
                target: cur.read_u16(),
            },
            Op::JumpAbsoluteIf | Op::JumpForwardIf | Op::JumpBackwardIf => Operation::JumpIf {
                op,
                target: cur.read_u16(),
                condition: cur.read_operand(),
                when: cur.read_bool(),
            },
            Op::ChangeType => {
                let arg = cur.read_operand();
                let ty_at = cur.pos();
                let ty_byte = cur.read_u8();
                let register_type = RegisterType::from_byte(ty_byte).unwrap_or_else(|| {
                    panic!("invalid register type 0x{ty_byte:02x} at byte offset {ty_at}")
                });
                Operation::ChangeType {
                    arg,
                    register_type,
                    element_size: cur.read_u16(),
                    element_count: cur.read_u16(),
                    slice_count: cur.read_u16(),
                }
            }
            Op::Exit | Op::EndBlock => Operation::Bare { op },
            Op::BeginBlock => Operation::BeginBlock {
                count: cur.read_operand(),
                index: cur.read_operand(),
            },
            Op::Invalid => {
                panic!("invalid opcode 0x{tag:02x} at byte offset {at}")
            }
        }
    }

    // ── legacy structured-text codec ───────────────────────────────

    /// Self-describing text form, one record per string. This is the
    /// pre-deterministic stream encoding and must stay parseable forever.
    pub(crate) fn to_text(&self) -> String {
        match self {
            Operation::Execute { function, operands } => {
                let list: Vec<String> = operands.iter().map(Operand::to_string).collect();
                format!("Execute(function={function}, operands=[{}])", list.join(", "))
            }
            Operation::Copy { source, target } => {
                format!("Copy(source={source}, target={target})")
            }
            Operation::Unary { op, arg } => format!("{op}(arg={arg})"),
            Operation::Comparison { op, a, b, result } => {
                format!("{op}(a={a}, b={b}, result={result})")
            }
            Operation::Jump { op, target } => format!("{op}(target={target})"),
            Operation::JumpIf {
                op,
                target,
                condition,
                when,
            } => {
                format!("{op}(target={target}, condition={condition}, when={when})")
            }
            Operation::ChangeType {
                arg,
                register_type,
                element_size,
                element_count,
                slice_count,
            } => format!(
                "ChangeType(arg={arg}, type={register_type}, element_size={element_size}, \
                 element_count={element_count}, slice_count={slice_count})"
            ),
            Operation::Bare { op } => format!("{op}()"),
            Operation::BeginBlock { count, index } => {
                format!("BeginBlock(count={count}, index={index})")
            }
        }
    }

    /// Parse the text form produced by [`to_text`](Self::to_text).
    pub(crate) fn parse(text: &str) -> Result<Operation, ArchiveError> {
        let malformed = || ArchiveError::MalformedRecord(text.to_string());
        let open = text.find('(').ok_or_else(malformed)?;
        let head = &text[..open];
        let body = text[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
        let fields = split_fields(body);
        let field = |key: &str| -> Result<&str, ArchiveError> {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(malformed)
        };
        let operand = |key: &str| -> Result<Operand, ArchiveError> {
            Operand::parse(field(key)?).ok_or_else(malformed)
        };
        let number = |key: &str| -> Result<u16, ArchiveError> {
            field(key)?.parse().map_err(|_| malformed())
        };

        if head == "Execute" {
            let function = number("function")?;
            let list = field("operands")?
                .strip_prefix('[')
                .and_then(|v| v.strip_suffix(']'))
                .ok_or_else(malformed)?;
            let mut operands = Vec::new();
            for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                operands.push(Operand::parse(item).ok_or_else(malformed)?);
            }
            if operands.len() > MAX_EXECUTE_ARITY as usize {
                return Err(malformed());
            }
            return Ok(Operation::Execute { function, operands });
        }

        let op = Op::from_name(head).ok_or_else(malformed)?;
        Ok(match op {
            Op::Copy => Operation::Copy {
                source: operand("source")?,
                target: operand("target")?,
            },
            Op::Zero | Op::BoolFalse | Op::BoolTrue | Op::Increment | Op::Decrement => {
                Operation::Unary {
                    op,
                    arg: operand("arg")?,
                }
            }
            Op::Equals | Op::NotEquals => Operation::Comparison {
                op,
                a: operand("a")?,
                b: operand("b")?,
                result: operand("result")?,
            },
            Op::JumpAbsolute | Op::JumpForward | Op::JumpBackward => Operation::Jump {
                op,
                target: number("target")?,
            },
            Op::JumpAbsoluteIf | Op::JumpForwardIf | Op::JumpBackwardIf => Operation::JumpIf {
                op,
                target: number("target")?,
                condition: operand("condition")?,
                when: match field("when")? {
                    "true" => true,
                    "false" => false,
                    _ => return Err(malformed()),
                },
            },
            Op::ChangeType => Operation::ChangeType {
                arg: operand("arg")?,
                register_type: RegisterType::parse(field("type")?).ok_or_else(malformed)?,
                element_size: number("element_size")?,
                element_count: number("element_count")?,
                slice_count: number("slice_count")?,
            },
            Op::Exit | Op::EndBlock => Operation::Bare { op },
            Op::BeginBlock => Operation::BeginBlock {
                count: operand("count")?,
                index: operand("index")?,
            },
            Op::Execute(_) | Op::Invalid => return Err(malformed()),
        })
    }
}

/// Split `key=value` pairs on top-level commas, leaving bracketed lists
/// intact.
fn split_fields(body: &str) -> Vec<(&str, &str)> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_field(&body[start..i], &mut fields);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_field(&body[start..], &mut fields);
    fields
}

fn push_field<'a>(raw: &'a str, fields: &mut Vec<(&'a str, &'a str)>) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    if let Some((key, value)) = raw.split_once('=') {
        fields.push((key.trim(), value.trim()));
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Execute { function, operands } => {
                write!(f, "Execute #{function} (")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{operand}")?;
                }
                write!(f, ")")
            }
            Operation::Copy { source, target } => write!(f, "Copy {source} -> {target}"),
            Operation::Unary { op, arg } => write!(f, "{op} {arg}"),
            Operation::Comparison { op, a, b, result } => {
                write!(f, "{op} {a}, {b} -> {result}")
            }
            Operation::Jump { op, target } => write!(f, "{op} {target}"),
            Operation::JumpIf {
                op,
                target,
                condition,
                when,
            } => write!(f, "{op} {target} if {condition} == {when}"),
            Operation::ChangeType {
                arg,
                register_type,
                element_size,
                element_count,
                slice_count,
            } => write!(
                f,
                "ChangeType {arg} as {register_type} size={element_size} \
                 count={element_count} slices={slice_count}"
            ),
            Operation::Bare { op } => write!(f, "{op}"),
            Operation::BeginBlock { count, index } => {
                write!(f, "BeginBlock {count}, {index}")
            }
        }
    }
}

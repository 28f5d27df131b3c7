use core::fmt;

/// Memory bank an operand addresses.
///
/// The banks themselves are owned by the register subsystem; this crate only
/// carries the tag through the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bank {
    /// Mutable working registers.
    Work = 0,
    /// Immutable literal pool.
    Literal = 1,
    /// Slots owned by the host, exposed to the graph.
    External = 2,
    /// Watch/debug slots, only present in editor builds.
    Debug = 3,
}

impl Bank {
    pub fn from_byte(byte: u8) -> Option<Bank> {
        Some(match byte {
            0 => Bank::Work,
            1 => Bank::Literal,
            2 => Bank::External,
            3 => Bank::Debug,
            _ => return None,
        })
    }

    /// Single-letter prefix used in disassembly and the text codec.
    fn prefix(self) -> char {
        match self {
            Bank::Work => 'w',
            Bank::Literal => 'l',
            Bank::External => 'x',
            Bank::Debug => 'd',
        }
    }

    fn from_prefix(c: char) -> Option<Bank> {
        Some(match c {
            'w' => Bank::Work,
            'l' => Bank::Literal,
            'x' => Bank::External,
            'd' => Bank::Debug,
            _ => return None,
        })
    }
}

/// A storage location an operation reads or writes: a bank tag plus an index
/// into that bank.
///
/// Wire form is 4 bytes: `[bank, reserved 0, index u16 le]`. The reserved
/// byte keeps the operand a power-of-two size so arrays of them pack evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub bank: Bank,
    pub index: u16,
}

impl Operand {
    /// Wire size in bytes.
    pub const SIZE: usize = 4;
    /// Required start alignment of a trailing operand array.
    pub const ALIGN: usize = 2;

    pub fn new(bank: Bank, index: u16) -> Operand {
        Operand { bank, index }
    }

    pub fn work(index: u16) -> Operand {
        Operand::new(Bank::Work, index)
    }

    pub fn literal(index: u16) -> Operand {
        Operand::new(Bank::Literal, index)
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.bank as u8);
        out.push(0);
        out.extend_from_slice(&self.index.to_le_bytes());
    }

    /// Parse the disassembly notation, e.g. `w3` or `l17`.
    pub fn parse(text: &str) -> Option<Operand> {
        let mut chars = text.chars();
        let bank = Bank::from_prefix(chars.next()?)?;
        let index = chars.as_str().parse().ok()?;
        Some(Operand { bank, index })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.bank.prefix(), self.index)
    }
}

/// Storage class tag carried by `ChangeType` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RegisterType {
    /// Plain-old-data elements.
    Plain = 0,
    String = 1,
    Name = 2,
    Struct = 3,
}

impl RegisterType {
    pub fn from_byte(byte: u8) -> Option<RegisterType> {
        Some(match byte {
            0 => RegisterType::Plain,
            1 => RegisterType::String,
            2 => RegisterType::Name,
            3 => RegisterType::Struct,
            _ => return None,
        })
    }

    pub fn parse(text: &str) -> Option<RegisterType> {
        Some(match text {
            "Plain" => RegisterType::Plain,
            "String" => RegisterType::String,
            "Name" => RegisterType::Name,
            "Struct" => RegisterType::Struct,
            _ => return None,
        })
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterType::Plain => write!(f, "Plain"),
            RegisterType::String => write!(f, "String"),
            RegisterType::Name => write!(f, "Name"),
            RegisterType::Struct => write!(f, "Struct"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form() {
        let mut out = Vec::new();
        Operand::work(0x1234).encode(&mut out);
        assert_eq!(out, [0x00, 0x00, 0x34, 0x12]);
        assert_eq!(out.len(), Operand::SIZE);

        out.clear();
        Operand::literal(7).encode(&mut out);
        assert_eq!(out, [0x01, 0x00, 0x07, 0x00]);
    }

    #[test]
    fn notation_round_trip() {
        for operand in [
            Operand::work(0),
            Operand::literal(65535),
            Operand::new(Bank::External, 12),
            Operand::new(Bank::Debug, 3),
        ] {
            assert_eq!(Operand::parse(&operand.to_string()), Some(operand));
        }
        assert_eq!(Operand::parse("q1"), None);
        assert_eq!(Operand::parse("w"), None);
        assert_eq!(Operand::parse(""), None);
    }

    #[test]
    fn register_type_names() {
        for ty in [
            RegisterType::Plain,
            RegisterType::String,
            RegisterType::Name,
            RegisterType::Struct,
        ] {
            assert_eq!(RegisterType::parse(&ty.to_string()), Some(ty));
            assert_eq!(RegisterType::from_byte(ty as u8), Some(ty));
        }
        assert_eq!(RegisterType::from_byte(9), None);
    }
}

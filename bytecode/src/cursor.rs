use crate::operand::{Bank, Operand};

/// Sequential little-endian reader over a bytecode buffer.
///
/// Every read is bounds-checked with the offending offset in the panic
/// message. Buffers handed to the cursor are builder-produced by contract,
/// so a failed check is a programming error, not input validation.
pub(crate) struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Advance to the next multiple of `align`, skipping padding bytes.
    pub fn align_to(&mut self, align: usize) {
        let rem = self.pos % align;
        if rem != 0 {
            self.pos += align - rem;
        }
    }

    pub fn read_u8(&mut self) -> u8 {
        assert!(
            self.pos < self.bytes.len(),
            "bytecode read past end at byte offset {}",
            self.pos
        );
        let v = self.bytes[self.pos];
        self.pos += 1;
        v
    }

    pub fn read_u16(&mut self) -> u16 {
        assert!(
            self.pos + 2 <= self.bytes.len(),
            "bytecode read past end at byte offset {}",
            self.pos
        );
        let v = u16::from_le_bytes([self.bytes[self.pos], self.bytes[self.pos + 1]]);
        self.pos += 2;
        v
    }

    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    pub fn read_operand(&mut self) -> Operand {
        let at = self.pos;
        let bank_byte = self.read_u8();
        let bank = Bank::from_byte(bank_byte).unwrap_or_else(|| {
            panic!("invalid operand bank 0x{bank_byte:02x} at byte offset {at}")
        });
        self.read_u8(); // reserved
        let index = self.read_u16();
        Operand { bank, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let bytes = [0x07, 0xCD, 0xAB, 0x01, 0x00, 0x00, 0x22, 0x00];
        let mut cur = ByteCursor::new(&bytes, 0);
        assert_eq!(cur.read_u8(), 0x07);
        assert_eq!(cur.read_u16(), 0xABCD);
        assert!(cur.read_bool());
        assert_eq!(cur.read_operand(), Operand::work(0x22));
        assert_eq!(cur.pos(), bytes.len());
    }

    #[test]
    fn align_to_skips_padding() {
        let bytes = [0xAA, 0xAA, 0x05];
        let mut cur = ByteCursor::new(&bytes, 1);
        cur.align_to(2);
        assert_eq!(cur.pos(), 2);
        cur.align_to(2); // already aligned
        assert_eq!(cur.pos(), 2);
        assert_eq!(cur.read_u8(), 0x05);
    }

    #[test]
    #[should_panic(expected = "read past end at byte offset 1")]
    fn out_of_bounds_read_is_fatal() {
        let bytes = [0x01];
        let mut cur = ByteCursor::new(&bytes, 1);
        cur.read_u8();
    }
}

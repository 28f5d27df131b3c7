use log::{debug, warn};

use crate::archive::{Archive, Result};
use crate::cursor::ByteCursor;
use crate::op::{JumpKind, MAX_EXECUTE_ARITY, Op};
use crate::operand::{Operand, RegisterType};
use crate::operation::Operation;

/// First schema version this crate can still read. Streams older than this
/// load as an empty buffer (treated as absent, not an error).
pub const VERSION_FIRST: u32 = 1;
/// From this version on the whole unaligned byte image is persisted as one
/// block instead of one structured-text record at a time.
pub const VERSION_DETERMINISTIC: u32 = 2;
pub const VERSION_LATEST: u32 = VERSION_DETERMINISTIC;

/// A decoded instruction boundary: the tag plus the byte offset of its
/// record. Transient — rebuilt by a linear scan whenever the buffer
/// changes shape, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub offset: usize,
}

/// A named execution start point: an instruction index, not a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub instruction_index: usize,
}

/// The instruction-stream container: one contiguous byte buffer holding
/// packed operation records, plus the derived instruction table and the
/// entry table.
///
/// The buffer has two physical layouts. The *unaligned* form packs records
/// back to back and is the only form the append API writes. The *aligned*
/// form inserts padding so every record (and every trailing operand array)
/// starts on its natural boundary; [`align_bytecode`](Self::align_bytecode)
/// converts between them losslessly. There is no per-record length field —
/// [`rebuild_instruction_table`](Self::rebuild_instruction_table) is the
/// only way to discover instruction boundaries.
#[derive(Debug, Default)]
pub struct ByteCode {
    bytes: Vec<u8>,
    aligned: bool,
    instructions: Vec<Instruction>,
    /// Set by appends; the instruction table must be rebuilt before use.
    stale: bool,
    entries: Vec<Entry>,
}

impl ByteCode {
    pub fn new() -> ByteCode {
        ByteCode::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Discard everything: bytes, table, entries, alignment state.
    pub fn reset(&mut self) {
        self.bytes.clear();
        self.aligned = false;
        self.instructions.clear();
        self.stale = false;
        self.entries.clear();
    }

    // ── append API ─────────────────────────────────────────────────
    //
    // Every add call appends to the unaligned form only, returns the byte
    // offset of the new record, and invalidates the instruction table.
    // Appends never move existing bytes, so returned offsets stay valid
    // until the buffer is aligned or reset.

    fn append(&mut self, operation: &Operation) -> usize {
        assert!(
            !self.aligned,
            "cannot append to an aligned bytecode buffer"
        );
        let offset = self.bytes.len();
        operation.encode(&mut self.bytes);
        self.instructions.clear();
        self.stale = true;
        offset
    }

    pub fn add_execute_op(&mut self, function: u16, operands: &[Operand]) -> usize {
        assert!(
            operands.len() <= MAX_EXECUTE_ARITY as usize,
            "execute record with {} operands exceeds the arity limit",
            operands.len()
        );
        self.append(&Operation::Execute {
            function,
            operands: operands.to_vec(),
        })
    }

    pub fn add_copy_op(&mut self, source: Operand, target: Operand) -> usize {
        self.append(&Operation::Copy { source, target })
    }

    fn add_unary_op(&mut self, op: Op, arg: Operand) -> usize {
        self.append(&Operation::Unary { op, arg })
    }

    pub fn add_zero_op(&mut self, arg: Operand) -> usize {
        self.add_unary_op(Op::Zero, arg)
    }

    pub fn add_false_op(&mut self, arg: Operand) -> usize {
        self.add_unary_op(Op::BoolFalse, arg)
    }

    pub fn add_true_op(&mut self, arg: Operand) -> usize {
        self.add_unary_op(Op::BoolTrue, arg)
    }

    pub fn add_increment_op(&mut self, arg: Operand) -> usize {
        self.add_unary_op(Op::Increment, arg)
    }

    pub fn add_decrement_op(&mut self, arg: Operand) -> usize {
        self.add_unary_op(Op::Decrement, arg)
    }

    pub fn add_equals_op(&mut self, a: Operand, b: Operand, result: Operand) -> usize {
        self.append(&Operation::Comparison {
            op: Op::Equals,
            a,
            b,
            result,
        })
    }

    pub fn add_not_equals_op(&mut self, a: Operand, b: Operand, result: Operand) -> usize {
        self.append(&Operation::Comparison {
            op: Op::NotEquals,
            a,
            b,
            result,
        })
    }

    pub fn add_jump_op(&mut self, kind: JumpKind, target: u16) -> usize {
        self.append(&Operation::Jump {
            op: kind.op(),
            target,
        })
    }

    pub fn add_jump_if_op(
        &mut self,
        kind: JumpKind,
        target: u16,
        condition: Operand,
        when: bool,
    ) -> usize {
        self.append(&Operation::JumpIf {
            op: kind.conditional_op(),
            target,
            condition,
            when,
        })
    }

    pub fn add_change_type_op(
        &mut self,
        arg: Operand,
        register_type: RegisterType,
        element_size: u16,
        element_count: u16,
        slice_count: u16,
    ) -> usize {
        self.append(&Operation::ChangeType {
            arg,
            register_type,
            element_size,
            element_count,
            slice_count,
        })
    }

    pub fn add_exit_op(&mut self) -> usize {
        self.append(&Operation::Bare { op: Op::Exit })
    }

    pub fn add_begin_block_op(&mut self, count: Operand, index: Operand) -> usize {
        self.append(&Operation::BeginBlock { count, index })
    }

    pub fn add_end_block_op(&mut self) -> usize {
        self.append(&Operation::Bare { op: Op::EndBlock })
    }

    /// Rewrite the `u16` target of a previously appended jump or
    /// conditional-jump record, identified by the byte offset its add call
    /// returned. This is how forward jumps get resolved once the
    /// destination instruction's index is known.
    pub fn patch_jump_target(&mut self, byte_offset: usize, target: u16) {
        assert!(
            !self.aligned,
            "cannot patch an aligned bytecode buffer"
        );
        assert!(
            byte_offset < self.bytes.len(),
            "no record at byte offset {byte_offset}"
        );
        let op = Op::from_byte(self.bytes[byte_offset]);
        assert!(
            op.is_jump(),
            "no jump record at byte offset {byte_offset} (found {op})"
        );
        self.bytes[byte_offset + 1..byte_offset + 3].copy_from_slice(&target.to_le_bytes());
    }

    // ── instruction table ──────────────────────────────────────────

    /// One linear scan from byte 0, decoding tags and advancing by each
    /// record's exact size. Hitting [`Op::Invalid`] means the scan has
    /// desynchronized from record boundaries, which is fatal.
    pub fn rebuild_instruction_table(&mut self) {
        self.instructions = scan(&self.bytes, self.aligned);
        self.stale = false;
        debug!(
            "instruction table rebuilt: {} instructions over {} bytes ({})",
            self.instructions.len(),
            self.bytes.len(),
            if self.aligned { "aligned" } else { "unaligned" },
        );
    }

    fn rebuild_if_stale(&mut self) {
        if self.stale {
            self.rebuild_instruction_table();
        }
    }

    /// The instruction table. Appending invalidates it; callers must
    /// rebuild before reading again.
    pub fn instructions(&self) -> &[Instruction] {
        assert!(
            !self.stale,
            "instruction table invalidated by append; rebuild it first"
        );
        &self.instructions
    }

    pub fn num_instructions(&self) -> usize {
        self.instructions().len()
    }

    pub fn instruction(&self, index: usize) -> Instruction {
        let table = self.instructions();
        assert!(
            index < table.len(),
            "instruction index {index} out of range ({} instructions)",
            table.len()
        );
        table[index]
    }

    /// Decode the full record behind an instruction-table row.
    pub fn operation_at(&self, instruction: &Instruction) -> Operation {
        let mut cur = ByteCursor::new(&self.bytes, instruction.offset);
        Operation::decode(&mut cur, self.aligned)
    }

    /// The trailing operand array of an execute instruction. Calling this
    /// for any other opcode is a programming error.
    pub fn operands_for_execute_op(&self, instruction: &Instruction) -> Vec<Operand> {
        assert!(
            instruction.op.is_execute(),
            "operands requested for non-execute instruction {} at byte offset {}",
            instruction.op,
            instruction.offset
        );
        match self.operation_at(instruction) {
            Operation::Execute { operands, .. } => operands,
            _ => unreachable!(),
        }
    }

    // ── alignment transform ────────────────────────────────────────

    /// Convert the buffer to the aligned form. Idempotent: calling this on
    /// an already-aligned buffer is a no-op.
    ///
    /// Padding bytes are filled with the padded record's own opcode byte,
    /// not zero. The scan relies on this: the byte at a pre-padding offset
    /// already names the opcode that follows.
    pub fn align_bytecode(&mut self) {
        if self.aligned {
            return;
        }
        self.rebuild_if_stale();

        let mut out = Vec::with_capacity(self.bytes.len() + self.instructions.len());
        for instruction in &self.instructions {
            let op = instruction.op;
            let tag = op.as_byte();
            while out.len() % op.alignment() != 0 {
                out.push(tag);
            }
            let start = instruction.offset;
            out.extend_from_slice(&self.bytes[start..start + op.record_size()]);
            if let Some(arity) = op.execute_arity() {
                while out.len() % Operand::ALIGN != 0 {
                    out.push(tag);
                }
                let operands_at = start + op.record_size();
                out.extend_from_slice(
                    &self.bytes[operands_at..operands_at + arity as usize * Operand::SIZE],
                );
            }
        }

        debug!(
            "aligned bytecode: {} -> {} bytes over {} instructions",
            self.bytes.len(),
            out.len(),
            self.instructions.len(),
        );
        self.bytes = out;
        self.aligned = true;
        // byte offsets shifted; opcode order and count are unchanged
        self.rebuild_instruction_table();
    }

    /// The packed byte image, regardless of the buffer's current form.
    /// This is what gets persisted.
    fn unaligned_image(&self) -> Vec<u8> {
        if !self.aligned {
            return self.bytes.clone();
        }
        let mut out = Vec::with_capacity(self.bytes.len());
        for instruction in self.instructions() {
            let op = instruction.op;
            let start = instruction.offset;
            out.extend_from_slice(&self.bytes[start..start + op.record_size()]);
            if let Some(arity) = op.execute_arity() {
                let operands_at = align_up(start + op.record_size(), Operand::ALIGN);
                out.extend_from_slice(
                    &self.bytes[operands_at..operands_at + arity as usize * Operand::SIZE],
                );
            }
        }
        out
    }

    // ── entry table ────────────────────────────────────────────────

    /// Register a named start point. Duplicate names are not validated;
    /// lookup returns the first match in registration order.
    pub fn add_entry(&mut self, name: impl Into<String>, instruction_index: usize) {
        self.entries.push(Entry {
            name: name.into(),
            instruction_index,
        });
    }

    /// Linear scan for the named entry. An absent name is a normal
    /// "not found", never an error.
    pub fn find_entry_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn entry(&self, index: usize) -> &Entry {
        assert!(
            index < self.entries.len(),
            "entry index {index} out of range ({} entries)",
            self.entries.len()
        );
        &self.entries[index]
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    // ── versioned (de)serialization ────────────────────────────────

    /// Read or write the container through `archive`.
    ///
    /// The stream starts with a schema version marker. From
    /// [`VERSION_DETERMINISTIC`] on, the whole unaligned byte image is one
    /// opaque block; older streams carry one structured-text record per
    /// instruction. A version older than [`VERSION_FIRST`] is treated as an
    /// absent section: the buffer loads empty and no error is raised.
    /// After loading, the instruction table is rebuilt and the buffer
    /// re-aligned for execution.
    pub fn serialize(&mut self, archive: &mut Archive<'_>) -> Result<()> {
        let mut version = archive.version();
        archive.u32(&mut version)?;
        if !archive.is_saving() {
            archive.set_version(version);
            if version < VERSION_FIRST {
                warn!(
                    "bytecode stream version {version} predates support; \
                     loading an empty buffer"
                );
                self.reset();
                return Ok(());
            }
        }

        if version >= VERSION_DETERMINISTIC {
            if archive.is_saving() {
                let mut image = self.unaligned_image();
                archive.byte_block(&mut image)?;
            } else {
                let mut image = Vec::new();
                archive.byte_block(&mut image)?;
                self.bytes = image;
                self.aligned = false;
                self.stale = true;
            }
        } else if archive.is_saving() {
            self.rebuild_if_stale();
            let mut count = self.instructions.len() as i32;
            archive.i32(&mut count)?;
            for index in 0..self.instructions.len() {
                let instruction = self.instructions[index];
                let mut text = self.operation_at(&instruction).to_text();
                archive.string(&mut text)?;
            }
        } else {
            let mut count = 0i32;
            archive.i32(&mut count)?;
            self.bytes.clear();
            self.aligned = false;
            self.stale = true;
            for _ in 0..count {
                let mut text = String::new();
                archive.string(&mut text)?;
                Operation::parse(&text)?.encode(&mut self.bytes);
            }
        }

        // entry table, one human-readable blob per entry
        if archive.is_saving() {
            let mut count = self.entries.len() as i32;
            archive.i32(&mut count)?;
            for entry in &self.entries {
                let mut text = format!("{}:{}", entry.name, entry.instruction_index);
                archive.string(&mut text)?;
            }
        } else {
            let mut count = 0i32;
            archive.i32(&mut count)?;
            self.entries.clear();
            for _ in 0..count {
                let mut text = String::new();
                archive.string(&mut text)?;
                let (name, index) = text
                    .rsplit_once(':')
                    .ok_or_else(|| crate::archive::ArchiveError::MalformedRecord(text.clone()))?;
                let instruction_index = index
                    .parse()
                    .map_err(|_| crate::archive::ArchiveError::MalformedRecord(text.clone()))?;
                self.entries.push(Entry {
                    name: name.to_string(),
                    instruction_index,
                });
            }
        }

        if !archive.is_saving() {
            self.rebuild_instruction_table();
            self.align_bytecode();
        }
        Ok(())
    }

    // ── disassembly ────────────────────────────────────────────────

    /// Human-readable listing of the whole instruction stream.
    pub fn dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for (index, instruction) in self.instructions().iter().enumerate() {
            let operation = self.operation_at(instruction);
            let _ = writeln!(
                out,
                "{index:4}  {:5}  {operation}",
                instruction.offset
            );
        }
        out
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    let rem = offset % align;
    if rem == 0 { offset } else { offset + align - rem }
}

/// Walk the buffer from offset 0, reading the tag at the current position
/// and advancing by that opcode's exact consumed length (alignment padding
/// included when `aligned`). The recorded offset is where the record
/// actually starts, after any padding.
fn scan(bytes: &[u8], aligned: bool) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let tag = bytes[offset];
        let op = Op::from_byte(tag);
        assert!(
            op != Op::Invalid,
            "instruction scan desynchronized: invalid opcode 0x{tag:02x} at byte offset {offset}"
        );
        let start = if aligned {
            align_up(offset, op.alignment())
        } else {
            offset
        };
        let mut end = start + op.record_size();
        if let Some(arity) = op.execute_arity() {
            if aligned {
                end = align_up(end, Operand::ALIGN);
            }
            end += arity as usize * Operand::SIZE;
        }
        assert!(
            end <= bytes.len(),
            "truncated record: {op} at byte offset {start} runs past the buffer end"
        );
        instructions.push(Instruction { op, offset: start });
        offset = end;
    }
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::Bank;

    fn decoded(code: &ByteCode) -> Vec<Operation> {
        code.instructions()
            .iter()
            .map(|i| code.operation_at(i))
            .collect()
    }

    #[test]
    fn table_matches_append_order() {
        let mut code = ByteCode::new();
        code.add_zero_op(Operand::work(0));
        code.add_copy_op(Operand::work(0), Operand::work(1));
        code.add_execute_op(3, &[Operand::work(1), Operand::literal(2)]);
        code.add_exit_op();
        code.rebuild_instruction_table();

        let ops: Vec<Op> = code.instructions().iter().map(|i| i.op).collect();
        assert_eq!(
            ops,
            [Op::Zero, Op::Copy, Op::Execute(2), Op::Exit]
        );
        assert_eq!(code.num_instructions(), 4);
    }

    #[test]
    fn unaligned_offsets_are_packed() {
        // Zero (5 bytes), Copy (9 bytes), Exit (1 byte)
        let mut code = ByteCode::new();
        code.add_zero_op(Operand::work(0));
        code.add_copy_op(Operand::work(0), Operand::work(1));
        code.add_exit_op();
        code.rebuild_instruction_table();

        let table: Vec<(Op, usize)> = code
            .instructions()
            .iter()
            .map(|i| (i.op, i.offset))
            .collect();
        assert_eq!(table, [(Op::Zero, 0), (Op::Copy, 5), (Op::Exit, 14)]);
        assert_eq!(code.bytes().len(), 15);
    }

    #[test]
    fn add_returns_record_offsets() {
        let mut code = ByteCode::new();
        let a = code.add_zero_op(Operand::work(0));
        let b = code.add_copy_op(Operand::work(0), Operand::work(1));
        let c = code.add_exit_op();
        assert_eq!((a, b, c), (0, 5, 14));
    }

    #[test]
    fn align_preserves_the_decoded_sequence() {
        let mut code = ByteCode::new();
        code.add_exit_op(); // odd-sized record forces padding before the next
        code.add_copy_op(Operand::work(3), Operand::new(Bank::External, 4));
        code.add_execute_op(9, &[Operand::work(5)]);
        code.add_jump_if_op(JumpKind::Backward, 1, Operand::work(6), true);
        code.add_end_block_op();
        code.rebuild_instruction_table();
        let before = decoded(&code);

        code.align_bytecode();
        assert!(code.is_aligned());
        assert_eq!(decoded(&code), before);
    }

    #[test]
    fn align_is_idempotent() {
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.add_zero_op(Operand::work(1));
        code.rebuild_instruction_table();
        code.align_bytecode();
        let bytes = code.bytes().to_vec();
        code.align_bytecode();
        assert_eq!(code.bytes(), bytes);
    }

    #[test]
    fn aligned_offsets_satisfy_alignment() {
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.add_execute_op(1, &[Operand::work(0), Operand::work(1)]);
        code.add_exit_op();
        code.add_equals_op(Operand::work(0), Operand::work(1), Operand::work(2));
        code.add_end_block_op();
        code.add_begin_block_op(Operand::literal(4), Operand::work(5));
        code.rebuild_instruction_table();
        code.align_bytecode();

        for instruction in code.instructions() {
            assert_eq!(
                instruction.offset % instruction.op.alignment(),
                0,
                "{} at {}",
                instruction.op,
                instruction.offset
            );
            if instruction.op.is_execute() {
                let operands_at =
                    align_up(instruction.offset + instruction.op.record_size(), Operand::ALIGN);
                assert_eq!(operands_at % Operand::ALIGN, 0);
            }
        }
    }

    #[test]
    fn align_pads_with_opcode_byte() {
        // Exit is 1 byte at offset 0; Copy needs a 2-byte boundary, so one
        // padding byte goes in at offset 1 and it must be Copy's own tag.
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.add_copy_op(Operand::work(0), Operand::work(1));
        code.rebuild_instruction_table();
        code.align_bytecode();

        assert_eq!(code.bytes()[0], Op::Exit.as_byte());
        assert_eq!(code.bytes()[1], Op::Copy.as_byte());
        assert_eq!(code.bytes()[2], Op::Copy.as_byte());
        let table: Vec<(Op, usize)> = code
            .instructions()
            .iter()
            .map(|i| (i.op, i.offset))
            .collect();
        assert_eq!(table, [(Op::Exit, 0), (Op::Copy, 2)]);
    }

    #[test]
    fn execute_operand_array_is_padded_and_recovered() {
        // Execute record is 3 bytes; its operand array starts at a 2-byte
        // boundary in the aligned form, with tag-byte fill in between.
        let operands = [Operand::work(7), Operand::literal(8), Operand::work(9)];
        let mut code = ByteCode::new();
        code.add_execute_op(2, &operands);
        code.rebuild_instruction_table();
        code.align_bytecode();

        assert_eq!(code.bytes()[3], Op::Execute(3).as_byte());
        let instruction = code.instruction(0);
        assert_eq!(code.operands_for_execute_op(&instruction), operands);
    }

    #[test]
    fn arity_matches_the_originating_call() {
        let mut code = ByteCode::new();
        code.add_execute_op(0, &[]);
        code.add_execute_op(1, &[Operand::work(0)]);
        code.add_execute_op(2, &[Operand::work(0); 5]);
        code.rebuild_instruction_table();

        for (instruction, expected) in code.instructions().iter().zip([0usize, 1, 5]) {
            assert_eq!(instruction.op.execute_arity(), Some(expected as u8));
            assert_eq!(code.operands_for_execute_op(instruction).len(), expected);
        }
    }

    #[test]
    fn patch_jump_target_rewrites_in_place() {
        let mut code = ByteCode::new();
        let jump_offset = code.add_jump_op(JumpKind::Forward, 0);
        code.add_zero_op(Operand::work(0));
        code.add_exit_op();
        code.patch_jump_target(jump_offset, 2);
        code.rebuild_instruction_table();

        assert_eq!(
            code.operation_at(&code.instruction(0)),
            Operation::Jump {
                op: Op::JumpForward,
                target: 2
            }
        );
    }

    #[test]
    #[should_panic(expected = "no jump record at byte offset 0")]
    fn patching_a_non_jump_is_fatal() {
        let mut code = ByteCode::new();
        code.add_zero_op(Operand::work(0));
        code.patch_jump_target(0, 1);
    }

    #[test]
    #[should_panic(expected = "cannot append to an aligned bytecode buffer")]
    fn append_after_align_is_fatal() {
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.rebuild_instruction_table();
        code.align_bytecode();
        code.add_exit_op();
    }

    #[test]
    #[should_panic(expected = "invalid opcode 0xff at byte offset 5")]
    fn scan_hitting_an_invalid_tag_is_fatal() {
        // a well-formed Zero record followed by garbage
        let mut code = ByteCode::new();
        code.add_zero_op(Operand::work(0));
        let mut bytes = code.bytes().to_vec();
        bytes.push(0xFF);
        scan(&bytes, false);
    }

    #[test]
    #[should_panic(expected = "truncated record: Copy at byte offset 5")]
    fn scan_hitting_a_truncated_record_is_fatal() {
        // a Zero record followed by a Copy record missing its last bytes
        let mut code = ByteCode::new();
        code.add_zero_op(Operand::work(0));
        code.add_copy_op(Operand::work(1), Operand::work(2));
        let mut bytes = code.bytes().to_vec();
        bytes.truncate(bytes.len() - 2);
        scan(&bytes, false);
    }

    #[test]
    #[should_panic(expected = "instruction table invalidated by append")]
    fn stale_table_access_is_fatal() {
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.instructions();
    }

    #[test]
    #[should_panic(expected = "instruction index 1 out of range")]
    fn instruction_index_out_of_range_is_fatal() {
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.rebuild_instruction_table();
        code.instruction(1);
    }

    #[test]
    fn entries_resolve_by_name() {
        let mut code = ByteCode::new();
        code.add_entry("Update", 0);
        code.add_entry("Setup", 3);

        assert_eq!(code.find_entry_index("Setup"), Some(1));
        assert_eq!(code.find_entry_index("Teardown"), None);
        assert_eq!(code.entry(0).name, "Update");
        assert_eq!(code.entry(1).instruction_index, 3);
        assert_eq!(code.num_entries(), 2);
    }

    #[test]
    fn duplicate_entry_names_first_match_wins() {
        let mut code = ByteCode::new();
        code.add_entry("Update", 0);
        code.add_entry("Update", 5);

        let index = code.find_entry_index("Update").unwrap();
        assert_eq!(index, 0);
        assert_eq!(code.entry(index).instruction_index, 0);
    }

    #[test]
    #[should_panic(expected = "entry index 0 out of range")]
    fn entry_index_out_of_range_is_fatal() {
        let code = ByteCode::new();
        code.entry(0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut code = ByteCode::new();
        code.add_exit_op();
        code.add_entry("Update", 0);
        code.rebuild_instruction_table();
        code.align_bytecode();

        code.reset();
        assert!(code.bytes().is_empty());
        assert!(!code.is_aligned());
        assert_eq!(code.num_instructions(), 0);
        assert_eq!(code.num_entries(), 0);
        // append works again after a reset
        code.add_exit_op();
    }

    #[test]
    fn dump_lists_every_instruction() {
        let mut code = ByteCode::new();
        code.add_zero_op(Operand::work(0));
        code.add_exit_op();
        code.rebuild_instruction_table();

        let dump = code.dump();
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("Zero w0"));
        assert!(dump.contains("Exit"));
    }
}

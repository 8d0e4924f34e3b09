//! Basic blocks of the LIR control flow graph.
//!
//! A [`Block`] owns an ordered instruction list plus the ordered predecessor and
//! successor lists that define the graph shape. Loop structure is consumed as
//! already-computed flags (`loop_header`, `loop_end`, `loop_index`) - computing it
//! is the job of an upstream phase.
//!
//! # Block Structure
//!
//! ```text
//! B2:                       (predecessors: B0, B1)
//!   entry [v5:i32]          entry marker; phi results at this merge
//!   v6:i32 = add v5, v5
//!   jump B3
//! ```
//!
//! The first instruction of a block is always its [`Instruction::Entry`] marker and
//! the last is a terminator. [`Block::insert_instructions`] splices a batch of
//! instructions at a computed offset in one pass, which is what SSA destruction
//! relies on when many phis resolve on one edge.

use std::fmt;

use crate::lir::Instruction;

/// Identifier of a basic block inside its control flow graph.
///
/// Displayed as `B{index}` in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    /// Creates a block id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index of this block id.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A basic block: ordered instructions plus graph shape and loop flags.
///
/// # Examples
///
/// ```rust
/// use lirscope::lir::{Block, BlockId, Instruction};
///
/// let mut block = Block::new(BlockId::new(0));
/// block.push(Instruction::Entry { incoming: vec![] });
/// block.push(Instruction::Return { value: None });
/// assert_eq!(block.instruction_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Block {
    /// Identifier of this block.
    id: BlockId,
    /// Ordered predecessor list.
    predecessors: Vec<BlockId>,
    /// Ordered successor list.
    successors: Vec<BlockId>,
    /// Ordered instruction list.
    instructions: Vec<Instruction>,
    /// `true` if this block is a loop header.
    loop_header: bool,
    /// `true` if this block is the source of a loop back edge.
    loop_end: bool,
    /// Index of the innermost enclosing loop, if any.
    loop_index: Option<usize>,
}

impl Block {
    /// Creates a new empty block.
    #[must_use]
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            predecessors: Vec::new(),
            successors: Vec::new(),
            instructions: Vec::new(),
            loop_header: false,
            loop_end: false,
            loop_index: None,
        }
    }

    /// Returns the identifier of this block.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the ordered predecessor list.
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    /// Returns the ordered successor list.
    #[must_use]
    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    /// Returns the number of predecessors.
    #[must_use]
    pub fn predecessor_count(&self) -> usize {
        self.predecessors.len()
    }

    /// Returns the number of successors.
    #[must_use]
    pub fn successor_count(&self) -> usize {
        self.successors.len()
    }

    /// Returns `true` if this block has more than one predecessor.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.predecessors.len() > 1
    }

    /// Returns the instructions of this block in program order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns a mutable reference to the instructions.
    pub fn instructions_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instructions
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns the last instruction, if any.
    #[must_use]
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    /// Appends an instruction at the end of the block.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Splices a batch of instructions into the block at the given index.
    ///
    /// All existing instructions from `index` on shift back by the batch length in a
    /// single pass, so inserting `m` moves into a block of `n` instructions is
    /// O(n + m) rather than O(n * m).
    ///
    /// # Panics
    ///
    /// Panics if `index > instruction_count()`.
    pub fn insert_instructions<I>(&mut self, index: usize, instructions: I)
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.instructions.splice(index..index, instructions);
    }

    /// Returns `true` if this block is a loop header.
    #[must_use]
    pub const fn is_loop_header(&self) -> bool {
        self.loop_header
    }

    /// Returns `true` if this block is the source of a loop back edge.
    #[must_use]
    pub const fn is_loop_end(&self) -> bool {
        self.loop_end
    }

    /// Returns the index of the innermost enclosing loop, if any.
    #[must_use]
    pub const fn loop_index(&self) -> Option<usize> {
        self.loop_index
    }

    /// Marks this block as the header of the given loop.
    pub fn set_loop_header(&mut self, loop_index: usize) {
        self.loop_header = true;
        self.loop_index = Some(loop_index);
    }

    /// Marks this block as a back-edge source of the given loop.
    pub fn set_loop_end(&mut self, loop_index: usize) {
        self.loop_end = true;
        self.loop_index = Some(loop_index);
    }

    /// Records `to` as a successor of this block.
    ///
    /// The matching predecessor entry is derived during
    /// [`ControlFlowGraph`](crate::lir::ControlFlowGraph) construction.
    pub fn add_successor(&mut self, to: BlockId) {
        self.successors.push(to);
    }

    /// Records `from` as a predecessor of this block.
    pub(crate) fn add_predecessor(&mut self, from: BlockId) {
        self.predecessors.push(from);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.id)?;
        for instruction in &self.instructions {
            writeln!(f, "  {instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::lir::{Value, ValueKind};

    use super::*;

    fn vreg(id: u32) -> Value {
        Value::virtual_register(id, ValueKind::int(32))
    }

    #[test]
    fn test_block_id_display() {
        assert_eq!(format!("{}", BlockId::new(7)), "B7");
        assert_eq!(BlockId::new(7).index(), 7);
    }

    #[test]
    fn test_block_creation() {
        let block = Block::new(BlockId::new(2));
        assert_eq!(block.id(), BlockId::new(2));
        assert_eq!(block.instruction_count(), 0);
        assert!(!block.is_merge());
        assert!(!block.is_loop_header());
        assert!(!block.is_loop_end());
        assert_eq!(block.loop_index(), None);
    }

    #[test]
    fn test_block_edges() {
        let mut block = Block::new(BlockId::new(0));
        block.add_predecessor(BlockId::new(1));
        block.add_predecessor(BlockId::new(2));
        block.add_successor(BlockId::new(3));

        assert_eq!(block.predecessor_count(), 2);
        assert_eq!(block.successor_count(), 1);
        assert!(block.is_merge());
        assert_eq!(block.predecessors(), &[BlockId::new(1), BlockId::new(2)]);
    }

    #[test]
    fn test_block_terminator() {
        let mut block = Block::new(BlockId::new(0));
        assert!(block.terminator().is_none());

        block.push(Instruction::Entry { incoming: vec![] });
        block.push(Instruction::Jump {
            target: BlockId::new(1),
            outgoing: vec![],
        });

        assert!(block.terminator().unwrap().is_jump());
    }

    #[test]
    fn test_insert_instructions_before_terminator() {
        let mut block = Block::new(BlockId::new(0));
        block.push(Instruction::Entry { incoming: vec![] });
        block.push(Instruction::Jump {
            target: BlockId::new(1),
            outgoing: vec![],
        });

        block.insert_instructions(
            1,
            vec![
                Instruction::mov(vreg(1), vreg(0)),
                Instruction::mov(vreg(2), vreg(1)),
            ],
        );

        assert_eq!(block.instruction_count(), 4);
        assert!(block.instructions()[0].is_entry());
        assert_eq!(block.instructions()[1], Instruction::mov(vreg(1), vreg(0)));
        assert_eq!(block.instructions()[2], Instruction::mov(vreg(2), vreg(1)));
        assert!(block.instructions()[3].is_jump());
    }

    #[test]
    fn test_loop_flags() {
        let mut header = Block::new(BlockId::new(1));
        header.set_loop_header(0);
        assert!(header.is_loop_header());
        assert_eq!(header.loop_index(), Some(0));

        let mut latch = Block::new(BlockId::new(2));
        latch.set_loop_end(0);
        assert!(latch.is_loop_end());
        assert_eq!(latch.loop_index(), Some(0));
    }

    #[test]
    fn test_block_display() {
        let mut block = Block::new(BlockId::new(1));
        block.push(Instruction::Entry { incoming: vec![] });
        block.push(Instruction::Return { value: None });

        let display = format!("{block}");
        assert!(display.contains("B1:"));
        assert!(display.contains("entry"));
        assert!(display.contains("return"));
    }
}

//! Control flow graph container for LIR blocks.
//!
//! [`ControlFlowGraph`] owns the block list and derives the predecessor lists from
//! the successor lists supplied on each block, the same way the surrounding backend
//! finalizes a function before the SSA passes run. The graph consumes loop structure
//! (header/end flags, loop indices) as already computed - classification of an edge
//! as a loop back edge is a lookup, not an analysis.
//!
//! # Construction
//!
//! ```rust
//! use lirscope::lir::{Block, BlockId, ControlFlowGraph, Instruction};
//!
//! let mut b0 = Block::new(BlockId::new(0));
//! b0.push(Instruction::Entry { incoming: vec![] });
//! b0.push(Instruction::Jump { target: BlockId::new(1), outgoing: vec![] });
//! b0.add_successor(BlockId::new(1));
//!
//! let mut b1 = Block::new(BlockId::new(1));
//! b1.push(Instruction::Entry { incoming: vec![] });
//! b1.push(Instruction::Return { value: None });
//!
//! let cfg = ControlFlowGraph::from_blocks(vec![b0, b1]).unwrap();
//! assert_eq!(cfg.block_count(), 2);
//! ```

use std::fmt;

use crate::{
    lir::{Block, BlockId},
    Result,
};

/// A finalized control flow graph of LIR blocks.
///
/// The entry block is always the block at index 0. Predecessor lists are derived
/// during construction and ordered by source block index, so traversals are
/// deterministic.
///
/// The `phis_destroyed` flag records whether SSA destruction already ran on this
/// graph; [`destroy_ssa`](crate::ssa::destroy_ssa) refuses to run twice rather than
/// relying on incidental empty-phi-list behavior.
#[derive(Debug)]
pub struct ControlFlowGraph {
    /// All blocks, indexed by their id.
    blocks: Vec<Block>,
    /// The entry block (always index 0).
    entry: BlockId,
    /// Set once SSA destruction has consumed the phi metadata.
    phis_destroyed: bool,
}

impl ControlFlowGraph {
    /// Creates a control flow graph from a list of blocks.
    ///
    /// Each block's position in the vector must match its id. Successor lists on the
    /// blocks define the edges; the matching predecessor lists are derived here in
    /// source-block order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if:
    /// - The block list is empty
    /// - A block's id does not match its position
    /// - A successor id is out of range
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(structural_error!("cannot create CFG from empty block list"));
        }

        let mut blocks = blocks;
        let block_count = blocks.len();

        for (index, block) in blocks.iter().enumerate() {
            if block.id().index() != index {
                return Err(structural_error!(
                    "block {} stored at position {}",
                    block.id(),
                    index
                ));
            }
            for &successor in block.successors() {
                if successor.index() >= block_count {
                    return Err(structural_error!(
                        "{} has successor {} but the graph only has {} blocks",
                        block.id(),
                        successor,
                        block_count
                    ));
                }
            }
        }

        // Derive predecessor lists in source-block order
        for index in 0..block_count {
            let successors: Vec<BlockId> = blocks[index].successors().to_vec();
            let from = blocks[index].id();
            for successor in successors {
                blocks[successor.index()].add_predecessor(from);
            }
        }

        Ok(Self {
            blocks,
            entry: BlockId::new(0),
            phis_destroyed: false,
        })
    }

    /// Returns the entry block id.
    #[must_use]
    pub const fn entry(&self) -> BlockId {
        self.entry
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the block with the given id, or `None` if out of range.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// Returns a mutable reference to the block with the given id.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.index())
    }

    /// Returns an iterator over all blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Returns an iterator over all block ids in order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::new)
    }

    /// Returns `true` if the edge `pred -> block` is a loop back edge.
    ///
    /// An edge is a back edge when `block` is the header of a loop and `pred` is a
    /// loop-end block of the same loop. Unknown ids are never back edges.
    #[must_use]
    pub fn is_back_edge(&self, pred: BlockId, block: BlockId) -> bool {
        match (self.block(pred), self.block(block)) {
            (Some(p), Some(b)) => {
                b.is_loop_header() && p.is_loop_end() && p.loop_index() == b.loop_index()
            }
            _ => false,
        }
    }

    /// Returns `true` if SSA destruction already ran on this graph.
    #[must_use]
    pub const fn phis_destroyed(&self) -> bool {
        self.phis_destroyed
    }

    /// Records that SSA destruction consumed the phi metadata.
    pub(crate) fn mark_phis_destroyed(&mut self) {
        self.phis_destroyed = true;
    }

    /// Returns the highest virtual register id in use, or `None` if there are none.
    ///
    /// Callers seeding a scratch allocator use this to hand out fresh ids that
    /// cannot collide with existing registers.
    #[must_use]
    pub fn max_virtual_id(&self) -> Option<u32> {
        let mut max = None;
        for block in &self.blocks {
            for instruction in block.instructions() {
                for (operand, _) in instruction.uses() {
                    if let crate::lir::Value::Virtual { id, .. } = operand.value() {
                        max = Some(max.map_or(id, |m: u32| m.max(id)));
                    }
                }
                for (value, _) in instruction.defs() {
                    if let crate::lir::Value::Virtual { id, .. } = value {
                        max = Some(max.map_or(id, |m: u32| m.max(id)));
                    }
                }
            }
        }
        max
    }
}

impl fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

//! SSA verification: single assignment and def-before-use over the whole graph.
//!
//! [`SsaVerifier`] is an independent, non-mutating consistency gate meant to run
//! before SSA destruction, typically behind a debug flag. It traverses the control
//! flow graph predecessors-first, with one exception: edges classified as loop back
//! edges into a loop header are not followed. That exemption is what makes the
//! traversal terminate on cyclic graphs and treats loop-header phis as defined
//! once, ahead of all iterations - loop-phi correctness itself is established
//! upstream. A cycle whose back edge is *not* classified in the consumed loop
//! metadata is a broken precondition and reported as a structural error instead of
//! being traversed forever.
//!
//! Definition tracking is path-sensitive: each block's set of available values is
//! the intersection of what every forward predecessor makes available, extended by
//! the block's own definitions. A value defined on only one arm of a diamond is
//! therefore not available at the merge - reaching it there requires a phi.
//! Single assignment itself is a whole-graph property and checked against one
//! global definition map.
//!
//! The traversal uses an explicit worklist stack rather than native recursion, so
//! pathological or deeply nested control flow cannot exhaust the call stack.
//!
//! Constants and physical registers are always considered available and excluded
//! from tracking; uses flagged
//! [`ALLOW_UNINITIALIZED`](crate::lir::OperandFlags::ALLOW_UNINITIALIZED) are
//! exempt from the def-before-use check.

use std::collections::{HashMap, HashSet};

use crate::{
    lir::{Block, BlockId, ControlFlowGraph, Value},
    Result,
};

/// Where a value was defined: block plus instruction index.
#[derive(Debug, Clone, Copy)]
struct DefSite {
    block: BlockId,
    instruction: usize,
}

/// Checks SSA invariants over a control flow graph.
///
/// The visited set, the global definition map and the per-block availability sets
/// are owned by the verifier instance and scoped to exactly one
/// [`verify`](Self::verify) call; nothing is shared or reused across
/// verifications.
///
/// # Examples
///
/// ```rust,ignore
/// use lirscope::ssa::SsaVerifier;
///
/// SsaVerifier::new(&cfg).verify()?;
/// ```
#[derive(Debug)]
pub struct SsaVerifier<'a> {
    cfg: &'a ControlFlowGraph,
    visited: Vec<bool>,
    defined: HashMap<Value, DefSite>,
    available: Vec<Option<HashSet<Value>>>,
}

impl<'a> SsaVerifier<'a> {
    /// Creates a verifier for the given graph.
    #[must_use]
    pub fn new(cfg: &'a ControlFlowGraph) -> Self {
        Self {
            cfg,
            visited: vec![false; cfg.block_count()],
            defined: HashMap::new(),
            available: vec![None; cfg.block_count()],
        }
    }

    /// Verifies single assignment and def-before-use over the whole graph.
    ///
    /// Returns `Ok(())` when every use of a tracked value is preceded by a
    /// definition reaching it on every forward path, and no tracked value is
    /// defined twice. The graph is never mutated.
    ///
    /// # Errors
    ///
    /// - [`Error::UseBeforeDef`](crate::Error::UseBeforeDef) naming the value,
    ///   block and instruction index of the offending use
    /// - [`Error::DoubleDefinition`](crate::Error::DoubleDefinition) naming both
    ///   definition sites
    /// - [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if the
    ///   graph references unknown blocks or contains a cycle that is not
    ///   classified as a loop back edge
    pub fn verify(mut self) -> Result<()> {
        for block in self.cfg.block_ids() {
            self.visit_from(block)?;
        }
        Ok(())
    }

    /// Visits `start` after all of its non-back-edge predecessors, iteratively.
    fn visit_from(&mut self, start: BlockId) -> Result<()> {
        let mut stack = vec![start];
        let mut on_stack = vec![false; self.cfg.block_count()];
        on_stack[start.index()] = true;

        while let Some(&current) = stack.last() {
            if self.visited[current.index()] {
                on_stack[current.index()] = false;
                stack.pop();
                continue;
            }

            let block = self
                .cfg
                .block(current)
                .ok_or_else(|| structural_error!("unknown block {}", current))?;

            let mut ready = true;
            for &pred in block.predecessors() {
                if self.cfg.is_back_edge(pred, current) {
                    continue;
                }
                if !self.visited[pred.index()] {
                    if on_stack[pred.index()] {
                        return Err(structural_error!(
                            "cycle through {} is not classified as a loop back edge",
                            pred
                        ));
                    }
                    stack.push(pred);
                    on_stack[pred.index()] = true;
                    ready = false;
                }
            }

            if ready {
                self.visit_block(block)?;
                self.visited[current.index()] = true;
                on_stack[current.index()] = false;
                stack.pop();
            }
        }
        Ok(())
    }

    /// Walks one block in program order, checking uses before recording defs.
    fn visit_block(&mut self, block: &Block) -> Result<()> {
        let mut live = self.entry_state(block);

        for (index, instruction) in block.instructions().iter().enumerate() {
            for (operand, _) in instruction.uses() {
                if operand.allows_uninitialized() {
                    continue;
                }
                let value = operand.value();
                if !Self::is_tracked(value) {
                    continue;
                }
                if !live.contains(&value) {
                    return Err(crate::Error::UseBeforeDef {
                        value,
                        block: block.id(),
                        instruction: index,
                    });
                }
            }

            for (value, _) in instruction.defs() {
                if !Self::is_tracked(value) {
                    continue;
                }
                if let Some(first) = self.defined.get(&value) {
                    return Err(crate::Error::DoubleDefinition {
                        value,
                        first_block: first.block,
                        first_instruction: first.instruction,
                        second_block: block.id(),
                        second_instruction: index,
                    });
                }
                self.defined.insert(
                    value,
                    DefSite {
                        block: block.id(),
                        instruction: index,
                    },
                );
                live.insert(value);
            }
        }

        self.available[block.id().index()] = Some(live);
        Ok(())
    }

    /// Values available on entry: the intersection over all forward predecessors.
    ///
    /// Blocks without a forward predecessor (the entry block, unreachable blocks)
    /// start with nothing available.
    fn entry_state(&self, block: &Block) -> HashSet<Value> {
        let mut forward = block
            .predecessors()
            .iter()
            .filter(|&&pred| !self.cfg.is_back_edge(pred, block.id()));

        let Some(&first) = forward.next() else {
            return HashSet::new();
        };
        let mut live = self.available[first.index()].clone().unwrap_or_default();
        for &pred in forward {
            match &self.available[pred.index()] {
                Some(set) => live.retain(|value| set.contains(value)),
                None => live.clear(),
            }
        }
        live
    }

    /// Only virtual registers participate in definition tracking.
    fn is_tracked(value: Value) -> bool {
        value.is_virtual()
    }
}

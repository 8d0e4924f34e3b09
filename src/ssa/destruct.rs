//! SSA destruction: replacing phi semantics with explicit moves.
//!
//! [`destroy_ssa`] walks every merge block of the control flow graph and, for each
//! predecessor edge, resolves the edge's phi pairs into an ordered move sequence
//! inserted immediately before the predecessor's jump. Afterwards the graph carries
//! no phi metadata: every control-flow edge is realized purely through explicit
//! moves plus jumps and branches, ready for physical register allocation.
//!
//! Because of the no-critical-edge invariant a merge predecessor feeds exactly one
//! successor, so no two merge blocks ever touch the same predecessor's instruction
//! list and the processing order of merge blocks is irrelevant.
//!
//! Destruction consumes the phi lists permanently and leaves virtual registers
//! reassignable by the inserted moves - the LIR no longer satisfies strict single
//! assignment once this pass has run. Run the
//! [`SsaVerifier`](crate::ssa::SsaVerifier) before, not after.

use crate::{
    lir::{BlockId, ControlFlowGraph},
    ssa::{phis, ParallelCopyResolver, ScratchAllocator},
    Result,
};

/// Destroys the SSA form of `cfg` by resolving all phis into explicit moves.
///
/// For every block with more than one predecessor: verify phi kind compatibility,
/// then per predecessor enumerate the `(incoming, outgoing)` pairs, resolve them as
/// a parallel copy with `dest = incoming, src = outgoing`, insert the moves before
/// the predecessor's jump and clear its outgoing list; finally clear the merge's
/// incoming list. Scratch temporaries are drawn from `allocator` and released
/// after each edge.
///
/// # Errors
///
/// - [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if the
///   no-critical-edge invariant is broken, phi lists are malformed, or destruction
///   was already run on this graph
/// - [`Error::TypeMismatch`](crate::Error::TypeMismatch) if phi kinds are
///   incompatible beyond the derived-reference relaxation
/// - [`Error::Resolution`](crate::Error::Resolution) if the allocator cannot
///   provide a scratch temporary
///
/// # Examples
///
/// ```rust,ignore
/// use lirscope::ssa::{destroy_ssa, VirtualScratchAllocator};
///
/// let mut alloc = VirtualScratchAllocator::new(cfg.max_virtual_id().map_or(0, |m| m + 1));
/// destroy_ssa(&mut cfg, &mut alloc)?;
/// ```
pub fn destroy_ssa<A>(cfg: &mut ControlFlowGraph, allocator: &mut A) -> Result<()>
where
    A: ScratchAllocator + ?Sized,
{
    if cfg.phis_destroyed() {
        return Err(structural_error!(
            "SSA destruction invoked twice on the same graph"
        ));
    }

    let merges: Vec<BlockId> = cfg
        .blocks()
        .filter(|block| block.is_merge())
        .map(|block| block.id())
        .collect();

    for merge in merges {
        phis::verify_type_compatibility(cfg, merge)?;

        let preds: Vec<BlockId> = cfg
            .block(merge)
            .ok_or_else(|| structural_error!("unknown merge block {}", merge))?
            .predecessors()
            .to_vec();

        for pred in preds {
            resolve_edge(cfg, merge, pred, allocator)?;
        }
        phis::clear_phi_in(cfg, merge)?;
    }

    cfg.mark_phis_destroyed();
    Ok(())
}

/// Resolves one predecessor edge: emit moves before the jump, clear the outgoing list.
fn resolve_edge<A>(
    cfg: &mut ControlFlowGraph,
    merge: BlockId,
    pred: BlockId,
    allocator: &mut A,
) -> Result<()>
where
    A: ScratchAllocator + ?Sized,
{
    let pairs = phis::phi_pairs(cfg, merge, pred)?;
    let at = phis::jump_insertion_index(cfg, pred)?;

    let mut resolver = ParallelCopyResolver::new(allocator);
    for (incoming, outgoing) in pairs {
        resolver.add(incoming, outgoing);
    }
    let moves = resolver.resolve()?;

    cfg.block_mut(pred)
        .ok_or_else(|| structural_error!("unknown predecessor block {}", pred))?
        .insert_instructions(at, moves);

    phis::clear_phi_out(cfg, pred)
}

#[cfg(test)]
mod tests {
    use crate::{
        lir::{Block, Instruction, Value, ValueKind},
        ssa::VirtualScratchAllocator,
    };

    use super::*;

    fn vreg(id: u32) -> Value {
        Value::virtual_register(id, ValueKind::int(32))
    }

    fn diamond(
        outgoing_left: Vec<Value>,
        outgoing_right: Vec<Value>,
        incoming: Vec<Value>,
    ) -> ControlFlowGraph {
        let mut b0 = Block::new(BlockId::new(0));
        b0.push(Instruction::Entry { incoming: vec![] });
        b0.push(Instruction::Branch {
            condition: vreg(0).into(),
            on_true: BlockId::new(1),
            on_false: BlockId::new(2),
        });
        b0.add_successor(BlockId::new(1));
        b0.add_successor(BlockId::new(2));

        let mut b1 = Block::new(BlockId::new(1));
        b1.push(Instruction::Entry { incoming: vec![] });
        b1.push(Instruction::Jump {
            target: BlockId::new(3),
            outgoing: outgoing_left,
        });
        b1.add_successor(BlockId::new(3));

        let mut b2 = Block::new(BlockId::new(2));
        b2.push(Instruction::Entry { incoming: vec![] });
        b2.push(Instruction::Jump {
            target: BlockId::new(3),
            outgoing: outgoing_right,
        });
        b2.add_successor(BlockId::new(3));

        let mut b3 = Block::new(BlockId::new(3));
        b3.push(Instruction::Entry { incoming });
        b3.push(Instruction::Return { value: None });

        ControlFlowGraph::from_blocks(vec![b0, b1, b2, b3]).unwrap()
    }

    #[test]
    fn test_destruction_inserts_moves_before_jump() {
        let mut cfg = diamond(vec![vreg(1)], vec![vreg(2)], vec![vreg(3)]);
        let mut alloc = VirtualScratchAllocator::new(100);
        destroy_ssa(&mut cfg, &mut alloc).unwrap();

        for pred in [BlockId::new(1), BlockId::new(2)] {
            let block = cfg.block(pred).unwrap();
            assert_eq!(block.instruction_count(), 3);
            assert!(matches!(
                block.instructions()[1],
                Instruction::Move { dest, .. } if dest == vreg(3)
            ));
            assert!(block.terminator().unwrap().is_jump());
        }
    }

    #[test]
    fn test_destruction_clears_phi_metadata() {
        let mut cfg = diamond(vec![vreg(1)], vec![vreg(2)], vec![vreg(3)]);
        let mut alloc = VirtualScratchAllocator::new(100);
        destroy_ssa(&mut cfg, &mut alloc).unwrap();

        for pred in [BlockId::new(1), BlockId::new(2)] {
            match cfg.block(pred).unwrap().terminator() {
                Some(Instruction::Jump { outgoing, .. }) => assert!(outgoing.is_empty()),
                other => panic!("unexpected terminator: {other:?}"),
            }
        }
        match cfg.block(BlockId::new(3)).unwrap().instructions().first() {
            Some(Instruction::Entry { incoming }) => assert!(incoming.is_empty()),
            other => panic!("unexpected entry: {other:?}"),
        }
        assert!(cfg.phis_destroyed());
    }

    #[test]
    fn test_destruction_refuses_second_run() {
        let mut cfg = diamond(vec![vreg(1)], vec![vreg(2)], vec![vreg(3)]);
        let mut alloc = VirtualScratchAllocator::new(100);
        destroy_ssa(&mut cfg, &mut alloc).unwrap();

        let result = destroy_ssa(&mut cfg, &mut alloc);
        assert!(matches!(
            result,
            Err(crate::Error::StructuralInvariant { .. })
        ));
    }

    #[test]
    fn test_destruction_rejects_type_mismatch() {
        let wide = Value::virtual_register(2, ValueKind::int(64));
        let mut cfg = diamond(vec![vreg(1)], vec![wide], vec![vreg(3)]);
        let mut alloc = VirtualScratchAllocator::new(100);

        assert!(matches!(
            destroy_ssa(&mut cfg, &mut alloc),
            Err(crate::Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_destruction_no_merges_is_noop() {
        let mut b0 = Block::new(BlockId::new(0));
        b0.push(Instruction::Entry { incoming: vec![] });
        b0.push(Instruction::Jump {
            target: BlockId::new(1),
            outgoing: vec![],
        });
        b0.add_successor(BlockId::new(1));

        let mut b1 = Block::new(BlockId::new(1));
        b1.push(Instruction::Entry { incoming: vec![] });
        b1.push(Instruction::Return { value: None });

        let mut cfg = ControlFlowGraph::from_blocks(vec![b0, b1]).unwrap();
        let mut alloc = VirtualScratchAllocator::new(100);
        destroy_ssa(&mut cfg, &mut alloc).unwrap();

        assert_eq!(cfg.block(BlockId::new(0)).unwrap().instruction_count(), 2);
        assert!(cfg.phis_destroyed());
    }

    #[test]
    fn test_destruction_critical_edge_rejected() {
        // B0 branches to B1 and B2, but also appears as a direct predecessor of
        // the merge B2 - a critical edge.
        let mut b0 = Block::new(BlockId::new(0));
        b0.push(Instruction::Entry { incoming: vec![] });
        b0.push(Instruction::Branch {
            condition: vreg(0).into(),
            on_true: BlockId::new(1),
            on_false: BlockId::new(2),
        });
        b0.add_successor(BlockId::new(1));
        b0.add_successor(BlockId::new(2));

        let mut b1 = Block::new(BlockId::new(1));
        b1.push(Instruction::Entry { incoming: vec![] });
        b1.push(Instruction::Jump {
            target: BlockId::new(2),
            outgoing: vec![vreg(1)],
        });
        b1.add_successor(BlockId::new(2));

        let mut b2 = Block::new(BlockId::new(2));
        b2.push(Instruction::Entry {
            incoming: vec![vreg(3)],
        });
        b2.push(Instruction::Return { value: None });

        let mut cfg = ControlFlowGraph::from_blocks(vec![b0, b1, b2]).unwrap();
        let mut alloc = VirtualScratchAllocator::new(100);

        assert!(matches!(
            destroy_ssa(&mut cfg, &mut alloc),
            Err(crate::Error::StructuralInvariant { .. })
        ));
    }
}

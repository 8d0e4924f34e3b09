//! Phi-edge model: enumeration, validation and cleanup of phi pairs per edge.
//!
//! Phi semantics live on control-flow edges: for every predecessor `P` of a merge
//! block `B`, the `outgoing` list on `P`'s terminating jump pairs by index with the
//! `incoming` list on `B`'s entry marker. The functions in this module are the only
//! code that interprets those two lists:
//!
//! - [`phi_pairs`] enumerates the `(incoming, outgoing)` pairs of one edge
//! - [`verify_type_compatibility`] checks kinds across every edge of a merge
//! - [`clear_phi_out`] / [`clear_phi_in`] permanently empty the lists after destruction
//! - [`jump_insertion_index`] locates where resolved moves belong in a predecessor
//!
//! All structural assumptions (membership, single successor, matching lengths, jump
//! terminator) are enforced here, so the resolver and driver can rely on well-formed
//! input.

use crate::{
    lir::{BlockId, ControlFlowGraph, Instruction, Value, ValueKind},
    Result,
};

/// Enumerates the phi pairs flowing across the edge `pred -> merge`.
///
/// Returns the ordered `(incoming, outgoing)` pairs, paired by index: `incoming` is
/// the phi result defined at the merge, `outgoing` the value feeding it on this
/// edge. Returns an empty vector when `merge` has at most one predecessor (such
/// blocks carry no phis). Read-only.
///
/// # Errors
///
/// Returns [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if:
/// - `pred` is not a predecessor of `merge`
/// - `pred` has more than one successor (critical edge)
/// - `pred` does not terminate in a jump, or `merge` does not start with an entry marker
/// - The incoming and outgoing lists differ in length
pub fn phi_pairs(
    cfg: &ControlFlowGraph,
    merge: BlockId,
    pred: BlockId,
) -> Result<Vec<(Value, Value)>> {
    let merge_block = cfg
        .block(merge)
        .ok_or_else(|| structural_error!("unknown merge block {}", merge))?;
    let pred_block = cfg
        .block(pred)
        .ok_or_else(|| structural_error!("unknown predecessor block {}", pred))?;

    if !merge_block.predecessors().contains(&pred) {
        return Err(structural_error!(
            "{} is not a predecessor of {}",
            pred,
            merge
        ));
    }
    if pred_block.successor_count() != 1 {
        return Err(structural_error!(
            "critical edge: {} feeds merge {} but has {} successors",
            pred,
            merge,
            pred_block.successor_count()
        ));
    }
    if merge_block.predecessor_count() <= 1 {
        return Ok(Vec::new());
    }

    let incoming = match merge_block.instructions().first() {
        Some(Instruction::Entry { incoming }) => incoming,
        _ => {
            return Err(structural_error!(
                "merge {} does not start with an entry marker",
                merge
            ))
        }
    };
    let outgoing = match pred_block.terminator() {
        Some(Instruction::Jump { outgoing, .. }) => outgoing,
        _ => {
            return Err(structural_error!(
                "merge predecessor {} does not terminate in a jump",
                pred
            ))
        }
    };

    if incoming.len() != outgoing.len() {
        return Err(structural_error!(
            "phi list length mismatch on edge {} -> {}: {} incoming vs {} outgoing",
            pred,
            merge,
            incoming.len(),
            outgoing.len()
        ));
    }

    Ok(incoming.iter().copied().zip(outgoing.iter().copied()).collect())
}

/// Checks whether an outgoing phi operand kind may feed an incoming phi result kind.
///
/// Kinds are compatible when they are equal, or when both are references of the
/// same width differing only in the derived-reference flag. The relaxation exists
/// because merge values are conservatively widened: a derived reference arriving on
/// one edge may meet a plain reference result of the same width. Every other
/// difference (class, bit width) is a mismatch.
#[must_use]
pub fn is_compatible_phi_kind(incoming: ValueKind, outgoing: ValueKind) -> bool {
    incoming == outgoing
        || (incoming.is_reference()
            && outgoing.is_reference()
            && incoming.bits() == outgoing.bits())
}

/// Verifies phi kind compatibility across every predecessor edge of `merge`.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`](crate::Error::TypeMismatch) for the first pair
/// whose kinds are incompatible beyond the derived-reference relaxation, or
/// [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) for malformed
/// edges or illegal values in a pair.
pub fn verify_type_compatibility(cfg: &ControlFlowGraph, merge: BlockId) -> Result<()> {
    let merge_block = cfg
        .block(merge)
        .ok_or_else(|| structural_error!("unknown merge block {}", merge))?;

    for &pred in merge_block.predecessors() {
        for (incoming, outgoing) in phi_pairs(cfg, merge, pred)? {
            let incoming_kind = incoming.kind().ok_or_else(|| {
                structural_error!("illegal incoming value in phi of {}", merge)
            })?;
            let outgoing_kind = outgoing.kind().ok_or_else(|| {
                structural_error!("illegal outgoing value on edge {} -> {}", pred, merge)
            })?;

            if !is_compatible_phi_kind(incoming_kind, outgoing_kind) {
                return Err(crate::Error::TypeMismatch {
                    pred,
                    merge,
                    incoming: incoming_kind,
                    outgoing: outgoing_kind,
                });
            }
        }
    }
    Ok(())
}

/// Empties the outgoing phi list on `pred`'s terminating jump.
///
/// Clearing an already-empty list is a no-op, so re-invocation after destruction is
/// harmless.
///
/// # Errors
///
/// Returns [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if
/// `pred` does not have exactly one successor or does not terminate in a jump.
pub fn clear_phi_out(cfg: &mut ControlFlowGraph, pred: BlockId) -> Result<()> {
    let block = cfg
        .block_mut(pred)
        .ok_or_else(|| structural_error!("unknown predecessor block {}", pred))?;
    if block.successor_count() != 1 {
        return Err(structural_error!(
            "{} has {} successors, expected exactly one",
            pred,
            block.successor_count()
        ));
    }
    match block.instructions_mut().last_mut() {
        Some(Instruction::Jump { outgoing, .. }) => {
            outgoing.clear();
            Ok(())
        }
        _ => Err(structural_error!(
            "{} does not terminate in a jump",
            pred
        )),
    }
}

/// Empties the incoming phi list on `merge`'s entry marker.
///
/// Clearing an already-empty list is a no-op.
///
/// # Errors
///
/// Returns [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if
/// `merge` has at most one predecessor or does not start with an entry marker.
pub fn clear_phi_in(cfg: &mut ControlFlowGraph, merge: BlockId) -> Result<()> {
    let block = cfg
        .block_mut(merge)
        .ok_or_else(|| structural_error!("unknown merge block {}", merge))?;
    if block.predecessor_count() <= 1 {
        return Err(structural_error!(
            "{} has {} predecessors, expected more than one",
            merge,
            block.predecessor_count()
        ));
    }
    match block.instructions_mut().first_mut() {
        Some(Instruction::Entry { incoming }) => {
            incoming.clear();
            Ok(())
        }
        _ => Err(structural_error!(
            "{} does not start with an entry marker",
            merge
        )),
    }
}

/// Returns the instruction index of `pred`'s terminating jump.
///
/// This is where SSA destruction inserts resolved moves - immediately before the
/// jump, which is normally the last index of the block.
///
/// # Errors
///
/// Returns [`Error::StructuralInvariant`](crate::Error::StructuralInvariant) if the
/// last instruction of `pred` is not a jump.
pub fn jump_insertion_index(cfg: &ControlFlowGraph, pred: BlockId) -> Result<usize> {
    let block = cfg
        .block(pred)
        .ok_or_else(|| structural_error!("unknown predecessor block {}", pred))?;
    match block.terminator() {
        Some(Instruction::Jump { .. }) => Ok(block.instruction_count() - 1),
        _ => Err(structural_error!(
            "{} does not terminate in a jump",
            pred
        )),
    }
}

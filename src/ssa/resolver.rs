//! Parallel copy resolution: sequentializing simultaneous assignments.
//!
//! The assignments a phi edge demands (`dest_i := src_i` for every pair) are
//! parallel: all sources are read from pre-assignment state and all destinations
//! written at once. Emitting them naively one at a time corrupts values that later
//! pairs still need - the classic lost-copy and swap problem. The
//! [`ParallelCopyResolver`] turns such a set into an equivalent ordered move
//! sequence:
//!
//! 1. While some pending pair's destination is not the source of any other pending
//!    pair, emitting its move is safe - do so and retire it.
//! 2. If pairs remain but none is safe, they form one or more cycles. Break one by
//!    saving the first pending destination into a scratch temporary and redirecting
//!    every pending reader of that destination to the scratch; the saved pair
//!    becomes safe and the chain unwinds through step 1.
//!
//! Pairs with `dest == src` are dropped outright. For `k` pairs forming `c`
//! disjoint cycles this emits at most `k + c` moves, holds at most one live scratch
//! per open cycle, and reuses the scratch across cycles when the kind matches.
//!
//! Scratch temporaries come from a [`ScratchAllocator`] supplied by the surrounding
//! code-generation context; the resolver releases its scratch before returning, so
//! pressure is bounded by one edge's resolution at a time.

use crate::{
    lir::{Instruction, Value, ValueKind},
    Result,
};

/// A source of scratch temporaries for cycle breaking.
///
/// Implementations hand out registers or stack slots reachable from the current
/// code-generation context. The contract is that at least one request per
/// concurrently open cycle can be satisfied; failure to do so is fatal
/// ([`Error::Resolution`](crate::Error::Resolution)).
pub trait ScratchAllocator {
    /// Allocates a scratch location of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`](crate::Error::Resolution) if no location of
    /// the needed class is obtainable.
    fn allocate(&mut self, kind: ValueKind) -> Result<Value>;

    /// Returns a previously allocated scratch location to the pool.
    fn release(&mut self, scratch: Value);
}

/// A scratch allocator handing out fresh virtual registers.
///
/// Suitable whenever destruction runs before register numbering is frozen - the
/// inserted temporaries are allocated like any other virtual register later.
/// Released ids are not recycled.
///
/// # Examples
///
/// ```rust
/// use lirscope::lir::ValueKind;
/// use lirscope::ssa::{ScratchAllocator, VirtualScratchAllocator};
///
/// let mut alloc = VirtualScratchAllocator::new(100);
/// let t = alloc.allocate(ValueKind::int(64)).unwrap();
/// assert_eq!(format!("{t}"), "v100:i64");
/// ```
#[derive(Debug)]
pub struct VirtualScratchAllocator {
    next_id: u32,
}

impl VirtualScratchAllocator {
    /// Creates an allocator whose first handed-out id is `first_id`.
    ///
    /// `first_id` must lie above every virtual register id already in use; see
    /// [`ControlFlowGraph::max_virtual_id`](crate::lir::ControlFlowGraph::max_virtual_id).
    #[must_use]
    pub const fn new(first_id: u32) -> Self {
        Self { next_id: first_id }
    }
}

impl ScratchAllocator for VirtualScratchAllocator {
    fn allocate(&mut self, kind: ValueKind) -> Result<Value> {
        let id = self.next_id;
        self.next_id = self.next_id.checked_add(1).ok_or_else(|| {
            crate::Error::Resolution("virtual register ids exhausted".to_string())
        })?;
        Ok(Value::virtual_register(id, kind))
    }

    fn release(&mut self, _scratch: Value) {}
}

/// One still-unresolved assignment of the parallel copy.
#[derive(Debug, Clone, Copy)]
struct PendingMove {
    dest: Value,
    src: Value,
}

/// Resolves one parallel copy into an ordered move sequence.
///
/// A resolver is scoped to a single predecessor edge: create it, [`add`](Self::add)
/// every phi pair, then [`resolve`](Self::resolve) to obtain the moves for
/// insertion before the predecessor's jump. The resolver owns its moves until the
/// caller inserts them and its scratch allocation until it returns.
///
/// # Examples
///
/// ```rust
/// use lirscope::lir::{Value, ValueKind};
/// use lirscope::ssa::{ParallelCopyResolver, VirtualScratchAllocator};
///
/// let k = ValueKind::int(32);
/// let a = Value::virtual_register(0, k);
/// let b = Value::virtual_register(1, k);
///
/// // Swap: a and b exchange values, requiring a scratch temporary.
/// let mut alloc = VirtualScratchAllocator::new(2);
/// let mut resolver = ParallelCopyResolver::new(&mut alloc);
/// resolver.add(a, b);
/// resolver.add(b, a);
/// let moves = resolver.resolve().unwrap();
/// assert_eq!(moves.len(), 3); // 2 pairs + 1 cycle
/// ```
#[derive(Debug)]
pub struct ParallelCopyResolver<'a, A: ScratchAllocator + ?Sized> {
    allocator: &'a mut A,
    pending: Vec<PendingMove>,
    moves: Vec<Instruction>,
    scratch: Option<Value>,
}

impl<'a, A: ScratchAllocator + ?Sized> ParallelCopyResolver<'a, A> {
    /// Creates a resolver drawing scratch temporaries from `allocator`.
    pub fn new(allocator: &'a mut A) -> Self {
        Self {
            allocator,
            pending: Vec::new(),
            moves: Vec::new(),
            scratch: None,
        }
    }

    /// Registers the assignment `dest := src` as part of the parallel copy.
    ///
    /// Pairs where `dest == src` are dropped without emitting a move.
    pub fn add(&mut self, dest: Value, src: Value) {
        debug_assert!(dest.is_location(), "move destination {dest} is not writable");
        if dest == src {
            return;
        }
        self.pending.push(PendingMove { dest, src });
    }

    /// Returns the number of still-unresolved pairs.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Sequentializes the registered pairs into an ordered move sequence.
    ///
    /// Executing the returned moves one at a time from any pre-state yields exactly
    /// the bindings that evaluating all pairs simultaneously from that pre-state
    /// would produce. The scratch temporary, if one was needed, is released before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`](crate::Error::Resolution) if the allocator
    /// cannot provide a scratch temporary of the needed kind, or if a cycle pivot
    /// carries no kind to allocate one for.
    pub fn resolve(mut self) -> Result<Vec<Instruction>> {
        while !self.pending.is_empty() {
            match self.find_safe_pair() {
                Some(index) => {
                    let pair = self.pending.remove(index);
                    self.moves.push(Instruction::mov(pair.dest, pair.src));
                }
                None => self.break_cycle()?,
            }
        }

        if let Some(scratch) = self.scratch.take() {
            self.allocator.release(scratch);
        }
        Ok(self.moves)
    }

    /// Finds a pair whose destination no other pending pair still reads.
    fn find_safe_pair(&self) -> Option<usize> {
        self.pending.iter().position(|candidate| {
            !self
                .pending
                .iter()
                .any(|other| other.src == candidate.dest)
        })
    }

    /// Breaks one cycle by saving the first pending destination into a scratch.
    fn break_cycle(&mut self) -> Result<()> {
        let pivot = self.pending[0].dest;
        let kind = pivot.kind().ok_or_else(|| {
            crate::Error::Resolution(format!("cycle pivot {pivot} has no kind"))
        })?;

        let scratch = self.acquire_scratch(kind)?;
        self.moves.push(Instruction::mov(scratch, pivot));
        for pair in &mut self.pending {
            if pair.src == pivot {
                pair.src = scratch;
            }
        }
        Ok(())
    }

    /// Returns a scratch of the given kind, reusing the held one when possible.
    fn acquire_scratch(&mut self, kind: ValueKind) -> Result<Value> {
        // A held scratch is free again by the time a new cycle gets stuck: the
        // emission loop drains every pair reading it before re-entering here.
        debug_assert!(self
            .scratch
            .map_or(true, |s| !self.pending.iter().any(|p| p.src == s)));

        match self.scratch {
            Some(scratch) if scratch.kind() == Some(kind) => Ok(scratch),
            Some(scratch) => {
                self.allocator.release(scratch);
                let fresh = self.allocator.allocate(kind)?;
                self.scratch = Some(fresh);
                Ok(fresh)
            }
            None => {
                let fresh = self.allocator.allocate(kind)?;
                self.scratch = Some(fresh);
                Ok(fresh)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vreg(id: u32) -> Value {
        Value::virtual_register(id, ValueKind::int(32))
    }

    /// Executes a move sequence over a binding map, reading missing sources as
    /// themselves (constants, untouched registers).
    fn execute(moves: &[Instruction], state: &mut HashMap<Value, Value>) {
        for instruction in moves {
            let Instruction::Move { dest, src } = instruction else {
                panic!("resolver emitted a non-move instruction: {instruction}");
            };
            let value = state.get(src).copied().unwrap_or(*src);
            state.insert(*dest, value);
        }
    }

    /// Evaluates the pairs as a simultaneous assignment from the same pre-state.
    fn execute_parallel(pairs: &[(Value, Value)], state: &mut HashMap<Value, Value>) {
        let reads: Vec<Value> = pairs
            .iter()
            .map(|(_, src)| state.get(src).copied().unwrap_or(*src))
            .collect();
        for ((dest, _), value) in pairs.iter().zip(reads) {
            state.insert(*dest, value);
        }
    }

    fn resolve(pairs: &[(Value, Value)]) -> Vec<Instruction> {
        let mut alloc = VirtualScratchAllocator::new(1000);
        let mut resolver = ParallelCopyResolver::new(&mut alloc);
        for &(dest, src) in pairs {
            resolver.add(dest, src);
        }
        resolver.resolve().unwrap()
    }

    fn assert_equivalent(pairs: &[(Value, Value)]) {
        let moves = resolve(pairs);

        let mut pre: HashMap<Value, Value> = HashMap::new();
        for (i, &(_, src)) in pairs.iter().enumerate() {
            // Give every source a distinguishable binding.
            pre.insert(src, vreg(9000 + u32::try_from(i).unwrap()));
        }

        let mut sequential = pre.clone();
        execute(&moves, &mut sequential);
        let mut parallel = pre.clone();
        execute_parallel(pairs, &mut parallel);

        for (dest, _) in pairs {
            assert_eq!(
                sequential.get(dest),
                parallel.get(dest),
                "divergence at {dest}"
            );
        }
    }

    #[test]
    fn test_noop_pair_dropped() {
        let moves = resolve(&[(vreg(0), vreg(0))]);
        assert!(moves.is_empty());
    }

    #[test]
    fn test_straight_chain() {
        // c := b, b := a resolves without a scratch.
        let moves = resolve(&[(vreg(2), vreg(1)), (vreg(1), vreg(0))]);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0], Instruction::mov(vreg(2), vreg(1)));
        assert_eq!(moves[1], Instruction::mov(vreg(1), vreg(0)));
    }

    #[test]
    fn test_swap_uses_scratch() {
        let pairs = [(vreg(0), vreg(1)), (vreg(1), vreg(0))];
        let moves = resolve(&pairs);
        assert_eq!(moves.len(), 3);
        assert_equivalent(&pairs);
    }

    #[test]
    fn test_swap_with_noop_matches_parallel_semantics() {
        // The P1 shape: a 2-cycle plus a dropped no-op.
        let pairs = [
            (vreg(0), vreg(1)),
            (vreg(1), vreg(0)),
            (vreg(2), vreg(2)),
        ];
        let moves = resolve(&pairs);
        assert_eq!(moves.len(), 3);
        assert_equivalent(&pairs);
    }

    #[test]
    fn test_three_cycle_rotation() {
        let pairs = [
            (vreg(0), vreg(1)),
            (vreg(1), vreg(2)),
            (vreg(2), vreg(0)),
        ];
        let moves = resolve(&pairs);
        assert_eq!(moves.len(), 4); // k=3 pairs, c=1 cycle
        assert_equivalent(&pairs);
    }

    #[test]
    fn test_move_bound_disjoint_cycles() {
        // Two disjoint swaps plus one chain pair: k=5, c=2, bound k+c=7.
        let pairs = [
            (vreg(0), vreg(1)),
            (vreg(1), vreg(0)),
            (vreg(2), vreg(3)),
            (vreg(3), vreg(2)),
            (vreg(4), vreg(0)),
        ];
        let moves = resolve(&pairs);
        assert!(moves.len() <= 7, "emitted {} moves", moves.len());
        assert_equivalent(&pairs);
    }

    #[test]
    fn test_scratch_reused_across_cycles() {
        let pairs = [
            (vreg(0), vreg(1)),
            (vreg(1), vreg(0)),
            (vreg(2), vreg(3)),
            (vreg(3), vreg(2)),
        ];
        let moves = resolve(&pairs);

        let mut scratches: Vec<Value> = Vec::new();
        for instruction in &moves {
            if let Instruction::Move { dest, .. } = instruction {
                if let Value::Virtual { id, .. } = dest {
                    if *id >= 1000 && !scratches.contains(dest) {
                        scratches.push(*dest);
                    }
                }
            }
        }
        assert_eq!(scratches.len(), 1, "expected one reused scratch");
        assert_equivalent(&pairs);
    }

    #[test]
    fn test_duplicated_source() {
        // One value feeding two destinations, one of them in a cycle with it.
        let pairs = [
            (vreg(1), vreg(0)),
            (vreg(2), vreg(0)),
            (vreg(0), vreg(1)),
        ];
        assert_equivalent(&pairs);
    }

    #[test]
    fn test_constant_source() {
        let c = Value::constant(42, ValueKind::int(32));
        let moves = resolve(&[(vreg(0), c)]);
        assert_eq!(moves, vec![Instruction::mov(vreg(0), c)]);
    }

    #[test]
    fn test_allocator_failure_is_fatal() {
        struct Exhausted;
        impl ScratchAllocator for Exhausted {
            fn allocate(&mut self, _kind: ValueKind) -> Result<Value> {
                Err(crate::Error::Resolution("pool exhausted".to_string()))
            }
            fn release(&mut self, _scratch: Value) {}
        }

        let mut alloc = Exhausted;
        let mut resolver = ParallelCopyResolver::new(&mut alloc);
        resolver.add(vreg(0), vreg(1));
        resolver.add(vreg(1), vreg(0));

        assert!(matches!(
            resolver.resolve(),
            Err(crate::Error::Resolution(_))
        ));
    }

    #[test]
    fn test_chain_does_not_touch_allocator() {
        struct Untouchable;
        impl ScratchAllocator for Untouchable {
            fn allocate(&mut self, _kind: ValueKind) -> Result<Value> {
                panic!("acyclic copies must not allocate");
            }
            fn release(&mut self, _scratch: Value) {}
        }

        let mut alloc = Untouchable;
        let mut resolver = ParallelCopyResolver::new(&mut alloc);
        resolver.add(vreg(2), vreg(1));
        resolver.add(vreg(1), vreg(0));
        assert_eq!(resolver.resolve().unwrap().len(), 2);
    }
}

//! LIR instructions with role-tagged operand slots.
//!
//! Every instruction exposes its operands through typed roles:
//!
//! - [`OperandRole::Use`] / [`OperandRole::Alive`] - read positions; the value must
//!   already be defined when the instruction is reached
//! - [`OperandRole::Temp`] / [`OperandRole::Output`] - write positions; the value is
//!   newly defined here (a `Temp` is dead immediately after, an `Output` survives)
//!
//! Two instructions carry phi metadata:
//!
//! - [`Instruction::Entry`] is the first instruction of every block; at a merge block
//!   (more than one predecessor) its `incoming` list holds the phi results defined there
//! - [`Instruction::Jump`] terminates a block whose single successor is a merge block;
//!   its `outgoing` list holds the per-edge operands feeding that merge's phis
//!
//! For every predecessor edge the `outgoing` list on the jump has the same length as
//! the `incoming` list on the merge's entry marker, paired by index. SSA destruction
//! consumes and permanently empties both lists.

use std::fmt;

use bitflags::bitflags;
use strum::Display;

use crate::lir::{BlockId, Value};

bitflags! {
    /// Flags refining how an operand position is interpreted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OperandFlags: u8 {
        /// The use is tolerated without a reaching definition.
        ///
        /// The SSA verifier skips the def-before-use check for operands carrying
        /// this flag, e.g. reads of uninitialized stack slots that upstream phases
        /// deliberately produce.
        const ALLOW_UNINITIALIZED = 0b0000_0001;
    }
}

/// The role an operand slot plays within its instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperandRole {
    /// A read consumed by the instruction itself.
    Use,
    /// A read that must stay live across the instruction (e.g. phi edge operands).
    Alive,
    /// A definition that is dead immediately after the instruction.
    Temp,
    /// A definition that survives the instruction.
    Output,
}

impl OperandRole {
    /// Returns `true` for the defining roles (`Temp`, `Output`).
    #[must_use]
    pub const fn is_def(&self) -> bool {
        matches!(self, OperandRole::Temp | OperandRole::Output)
    }

    /// Returns `true` for the reading roles (`Use`, `Alive`).
    #[must_use]
    pub const fn is_use(&self) -> bool {
        matches!(self, OperandRole::Use | OperandRole::Alive)
    }
}

/// A read operand position: a value plus interpretation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    /// The value occupying this position.
    value: Value,
    /// Flags refining the position's interpretation.
    flags: OperandFlags,
}

impl Operand {
    /// Creates an operand with no flags.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self {
            value,
            flags: OperandFlags::empty(),
        }
    }

    /// Creates an operand with the given flags.
    #[must_use]
    pub const fn with_flags(value: Value, flags: OperandFlags) -> Self {
        Self { value, flags }
    }

    /// Returns the value occupying this position.
    #[must_use]
    pub const fn value(&self) -> Value {
        self.value
    }

    /// Returns the flags of this position.
    #[must_use]
    pub const fn flags(&self) -> OperandFlags {
        self.flags
    }

    /// Returns `true` if the use is tolerated without a reaching definition.
    #[must_use]
    pub const fn allows_uninitialized(&self) -> bool {
        self.flags.contains(OperandFlags::ALLOW_UNINITIALIZED)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::new(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A single LIR instruction.
///
/// The variants cover what the SSA layer needs: block entry markers and jumps carry
/// phi metadata, moves are what destruction inserts, and [`Instruction::Op`] stands in
/// for every ordinary operation with explicit role-tagged operand lists.
///
/// # Examples
///
/// ```rust
/// use lirscope::lir::{BlockId, Instruction, Value, ValueKind};
///
/// let k = ValueKind::int(32);
/// let jump = Instruction::Jump {
///     target: BlockId::new(2),
///     outgoing: vec![Value::virtual_register(0, k)],
/// };
/// assert!(jump.is_jump());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// The entry marker, always the first instruction of a block.
    ///
    /// At merge blocks the `incoming` list holds the phi results defined here, in
    /// edge-pairing order. Blocks with at most one predecessor carry an empty list.
    Entry {
        /// Phi results defined at this merge, paired by index with each
        /// predecessor jump's outgoing list.
        incoming: Vec<Value>,
    },

    /// An unconditional jump terminating a block.
    ///
    /// When the single successor is a merge block, the `outgoing` list holds the
    /// values feeding that merge's phis on this edge.
    Jump {
        /// The successor block.
        target: BlockId,
        /// Per-edge phi operands, paired by index with the target's incoming list.
        outgoing: Vec<Value>,
    },

    /// A two-way conditional branch.
    ///
    /// Branches never carry phi operands: a branch source has two successors, so by
    /// the no-critical-edge invariant neither successor can be a merge block.
    Branch {
        /// The branch condition.
        condition: Operand,
        /// Successor taken when the condition holds.
        on_true: BlockId,
        /// Successor taken when the condition does not hold.
        on_false: BlockId,
    },

    /// A register-to-register (or constant-to-register) move.
    ///
    /// SSA destruction materializes phi semantics as sequences of these.
    Move {
        /// The written location.
        dest: Value,
        /// The read value.
        src: Value,
    },

    /// A generic operation with explicit role-tagged operand lists.
    Op {
        /// Mnemonic for diagnostics and display.
        mnemonic: &'static str,
        /// Values newly defined here that survive the instruction.
        outputs: Vec<Value>,
        /// Values newly defined here that die immediately after.
        temps: Vec<Value>,
        /// Read positions consumed by the operation.
        uses: Vec<Operand>,
        /// Read positions that must stay live across the operation.
        alive: Vec<Operand>,
    },

    /// Return from the function, optionally yielding a value.
    Return {
        /// The returned value, if any.
        value: Option<Operand>,
    },
}

impl Instruction {
    /// Creates a move instruction.
    #[must_use]
    pub const fn mov(dest: Value, src: Value) -> Self {
        Instruction::Move { dest, src }
    }

    /// Returns `true` if this instruction is an unconditional jump.
    #[must_use]
    pub const fn is_jump(&self) -> bool {
        matches!(self, Instruction::Jump { .. })
    }

    /// Returns `true` if this instruction is an entry marker.
    #[must_use]
    pub const fn is_entry(&self) -> bool {
        matches!(self, Instruction::Entry { .. })
    }

    /// Returns `true` if this instruction terminates a block.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. } | Instruction::Branch { .. } | Instruction::Return { .. }
        )
    }

    /// Returns all read positions of this instruction with their roles.
    ///
    /// Within one instruction all reads happen before any write, so callers walking
    /// instructions in program order can check uses first, then record defs.
    #[must_use]
    pub fn uses(&self) -> Vec<(Operand, OperandRole)> {
        match self {
            Instruction::Entry { .. } => Vec::new(),
            Instruction::Jump { outgoing, .. } => outgoing
                .iter()
                .map(|&v| (Operand::new(v), OperandRole::Alive))
                .collect(),
            Instruction::Branch { condition, .. } => vec![(*condition, OperandRole::Use)],
            Instruction::Move { src, .. } => vec![(Operand::new(*src), OperandRole::Use)],
            Instruction::Op { uses, alive, .. } => uses
                .iter()
                .map(|&op| (op, OperandRole::Use))
                .chain(alive.iter().map(|&op| (op, OperandRole::Alive)))
                .collect(),
            Instruction::Return { value } => {
                value.iter().map(|&op| (op, OperandRole::Use)).collect()
            }
        }
    }

    /// Returns all write positions of this instruction with their roles.
    #[must_use]
    pub fn defs(&self) -> Vec<(Value, OperandRole)> {
        match self {
            Instruction::Entry { incoming } => incoming
                .iter()
                .map(|&v| (v, OperandRole::Output))
                .collect(),
            Instruction::Move { dest, .. } => vec![(*dest, OperandRole::Output)],
            Instruction::Op { outputs, temps, .. } => outputs
                .iter()
                .map(|&v| (v, OperandRole::Output))
                .chain(temps.iter().map(|&v| (v, OperandRole::Temp)))
                .collect(),
            Instruction::Jump { .. } | Instruction::Branch { .. } | Instruction::Return { .. } => {
                Vec::new()
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(items: &[T]) -> String {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Instruction::Entry { incoming } => {
                if incoming.is_empty() {
                    write!(f, "entry")
                } else {
                    write!(f, "entry [{}]", join(incoming))
                }
            }
            Instruction::Jump { target, outgoing } => {
                if outgoing.is_empty() {
                    write!(f, "jump {target}")
                } else {
                    write!(f, "jump {target} [{}]", join(outgoing))
                }
            }
            Instruction::Branch {
                condition,
                on_true,
                on_false,
            } => write!(f, "branch {condition} ? {on_true} : {on_false}"),
            Instruction::Move { dest, src } => write!(f, "{dest} = {src}"),
            Instruction::Op {
                mnemonic,
                outputs,
                temps,
                uses,
                alive,
            } => {
                if outputs.is_empty() {
                    write!(f, "{mnemonic} {}", join(uses))?;
                } else {
                    write!(f, "{} = {mnemonic} {}", join(outputs), join(uses))?;
                }
                if !alive.is_empty() {
                    write!(f, " [alive {}]", join(alive))?;
                }
                if !temps.is_empty() {
                    write!(f, " [temp {}]", join(temps))?;
                }
                Ok(())
            }
            Instruction::Return { value } => match value {
                Some(v) => write!(f, "return {v}"),
                None => write!(f, "return"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lir::ValueKind;

    use super::*;

    fn vreg(id: u32) -> Value {
        Value::virtual_register(id, ValueKind::int(32))
    }

    #[test]
    fn test_operand_flags() {
        let plain = Operand::new(vreg(0));
        assert!(!plain.allows_uninitialized());

        let lax = Operand::with_flags(vreg(0), OperandFlags::ALLOW_UNINITIALIZED);
        assert!(lax.allows_uninitialized());
    }

    #[test]
    fn test_operand_role_predicates() {
        assert!(OperandRole::Use.is_use());
        assert!(OperandRole::Alive.is_use());
        assert!(OperandRole::Temp.is_def());
        assert!(OperandRole::Output.is_def());
        assert!(!OperandRole::Use.is_def());
        assert!(!OperandRole::Output.is_use());
    }

    #[test]
    fn test_entry_defs_are_outputs() {
        let entry = Instruction::Entry {
            incoming: vec![vreg(1), vreg(2)],
        };
        let defs = entry.defs();
        assert_eq!(defs.len(), 2);
        assert!(defs.iter().all(|(_, role)| *role == OperandRole::Output));
        assert!(entry.uses().is_empty());
    }

    #[test]
    fn test_jump_uses_are_alive() {
        let jump = Instruction::Jump {
            target: BlockId::new(1),
            outgoing: vec![vreg(3)],
        };
        let uses = jump.uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].1, OperandRole::Alive);
        assert!(jump.defs().is_empty());
    }

    #[test]
    fn test_op_roles() {
        let op = Instruction::Op {
            mnemonic: "add",
            outputs: vec![vreg(5)],
            temps: vec![vreg(6)],
            uses: vec![Operand::new(vreg(1)), Operand::new(vreg(2))],
            alive: vec![Operand::new(vreg(3))],
        };

        let uses = op.uses();
        assert_eq!(uses.len(), 3);
        assert_eq!(uses[0].1, OperandRole::Use);
        assert_eq!(uses[2].1, OperandRole::Alive);

        let defs = op.defs();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0], (vreg(5), OperandRole::Output));
        assert_eq!(defs[1], (vreg(6), OperandRole::Temp));
    }

    #[test]
    fn test_move_roles() {
        let mv = Instruction::mov(vreg(2), vreg(1));
        assert_eq!(mv.uses(), vec![(Operand::new(vreg(1)), OperandRole::Use)]);
        assert_eq!(mv.defs(), vec![(vreg(2), OperandRole::Output)]);
    }

    #[test]
    fn test_terminator_predicate() {
        assert!(Instruction::Jump {
            target: BlockId::new(0),
            outgoing: vec![]
        }
        .is_terminator());
        assert!(Instruction::Return { value: None }.is_terminator());
        assert!(!Instruction::Entry { incoming: vec![] }.is_terminator());
        assert!(!Instruction::mov(vreg(0), vreg(1)).is_terminator());
    }

    #[test]
    fn test_instruction_display() {
        assert_eq!(
            format!("{}", Instruction::Entry { incoming: vec![] }),
            "entry"
        );
        assert_eq!(
            format!(
                "{}",
                Instruction::Jump {
                    target: BlockId::new(3),
                    outgoing: vec![vreg(1)]
                }
            ),
            "jump B3 [v1:i32]"
        );
        assert_eq!(
            format!("{}", Instruction::mov(vreg(2), vreg(1))),
            "v2:i32 = v1:i32"
        );
    }

    #[test]
    fn test_op_display_includes_all_roles() {
        let op = Instruction::Op {
            mnemonic: "call",
            outputs: vec![vreg(5)],
            temps: vec![vreg(6)],
            uses: vec![Operand::new(vreg(1))],
            alive: vec![Operand::new(vreg(3))],
        };
        assert_eq!(
            format!("{op}"),
            "v5:i32 = call v1:i32 [alive v3:i32] [temp v6:i32]"
        );
    }
}

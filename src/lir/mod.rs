//! Low-level intermediate representation of a function under compilation.
//!
//! This module provides the data model the SSA passes operate on, mirroring the
//! state of a backend just before physical register allocation:
//!
//! - [`value`] - values (virtual/physical registers, constants) and platform kinds
//! - [`instruction`] - instructions with role-tagged operand slots and phi metadata
//! - [`block`] - basic blocks with ordered instruction, predecessor and successor lists
//! - [`graph`] - the finalized control flow graph container
//!
//! # Phi Representation
//!
//! Control-flow merges are represented without dedicated phi instructions: the
//! [`Instruction::Entry`] marker of a merge block carries the ordered `incoming`
//! list of phi results, and the terminating [`Instruction::Jump`] of each
//! predecessor carries the matching ordered `outgoing` list of per-edge operands.
//! The two lists pair by index on every edge.
//!
//! # Structural Invariant: No Critical Edges
//!
//! If a block has more than one predecessor, every one of those predecessors has
//! exactly one successor. A merge predecessor therefore always ends in a `Jump`,
//! never a multi-way branch, and SSA destruction can insert moves on the edge by
//! inserting them into the predecessor. Violations are upstream bugs and surface
//! as [`Error::StructuralInvariant`](crate::Error::StructuralInvariant).

pub mod block;
pub mod graph;
pub mod instruction;
pub mod value;

// Re-export primary types at module level
pub use block::{Block, BlockId};
pub use graph::ControlFlowGraph;
pub use instruction::{Instruction, Operand, OperandFlags, OperandRole};
pub use value::{PlatformClass, Value, ValueKind};

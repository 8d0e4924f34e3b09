//! # lirscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! from the lirscope library. Import this module to get quick access to the
//! essential types for building graphs and running the SSA passes.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all lirscope operations
pub use crate::Error;

/// The result type used throughout lirscope
pub use crate::Result;

// ================================================================================================
// LIR Data Model
// ================================================================================================

/// Values and their platform kinds
pub use crate::lir::{PlatformClass, Value, ValueKind};

/// Instructions and role-tagged operands
pub use crate::lir::{Instruction, Operand, OperandFlags, OperandRole};

/// Blocks and the control flow graph
pub use crate::lir::{Block, BlockId, ControlFlowGraph};

// ================================================================================================
// SSA Passes
// ================================================================================================

/// Parallel copy resolution and scratch allocation
pub use crate::ssa::{ParallelCopyResolver, ScratchAllocator, VirtualScratchAllocator};

/// Whole-graph SSA destruction
pub use crate::ssa::destroy_ssa;

/// SSA consistency verification
pub use crate::ssa::SsaVerifier;

/// Phi-edge enumeration and kind compatibility
pub use crate::ssa::{is_compatible_phi_kind, phi_pairs};

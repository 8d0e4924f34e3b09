//! SSA edge resolution, destruction and verification for the LIR.
//!
//! This module contains the passes that operate on the phi-carrying LIR produced
//! by the frontend, up to and including the point where SSA form is dismantled
//! for physical register allocation.
//!
//! # Architecture
//!
//! The module is organized into focused sub-modules:
//!
//! - [`phis`] - enumeration and maintenance of per-edge phi operand pairs
//! - [`resolver`] - the parallel copy resolver turning phi semantics into moves
//! - [`destruct`] - the whole-graph SSA destruction driver
//! - [`verifier`] - the non-mutating SSA consistency checker
//!
//! # Pipeline Position
//!
//! A typical backend runs these pieces in this order:
//!
//! 1. Optionally verify the incoming graph with [`SsaVerifier`]
//! 2. Destroy SSA form with [`destroy_ssa`], which internally drives
//!    [`ParallelCopyResolver`] once per merge edge
//! 3. Hand the phi-free graph to the register allocator
//!
//! ```rust,ignore
//! use lirscope::ssa::{destroy_ssa, SsaVerifier, VirtualScratchAllocator};
//!
//! SsaVerifier::new(&cfg).verify()?;
//!
//! let next = cfg.max_virtual_id().map_or(0, |m| m + 1);
//! let mut alloc = VirtualScratchAllocator::new(next);
//! destroy_ssa(&mut cfg, &mut alloc)?;
//! ```
//!
//! # References
//!
//! - Briggs et al., "Practical Improvements to the Construction and Destruction
//!   of Static Single Assignment Form", SPE 1998
//! - Boissinot et al., "Revisiting Out-of-SSA Translation for Correctness, Code
//!   Quality, and Efficiency", CGO 2009

pub mod destruct;
pub mod phis;
pub mod resolver;
pub mod verifier;

// Re-export primary types at module level
pub use destruct::destroy_ssa;
pub use phis::{
    clear_phi_in, clear_phi_out, is_compatible_phi_kind, phi_pairs, verify_type_compatibility,
};
pub use resolver::{ParallelCopyResolver, ScratchAllocator, VirtualScratchAllocator};
pub use verifier::SsaVerifier;

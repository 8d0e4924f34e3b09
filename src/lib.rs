// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # lirscope
//!
//! SSA control-flow and value-resolution infrastructure for a low-level
//! intermediate representation (LIR). `lirscope` models the phase of a compiler
//! backend where a function still in SSA form is prepared for physical register
//! allocation: phi semantics live on control-flow edges, and the crate resolves
//! them into explicit, ordered move sequences.
//!
//! ## Features
//!
//! - **Edge-based phi model** - no phi instructions; merge blocks carry ordered
//!   `incoming` lists and predecessor jumps carry matching `outgoing` lists
//! - **Parallel copy resolution** - correct sequential move emission for the
//!   lost-copy and swap problems, breaking cycles with a single reusable scratch
//! - **SSA destruction** - a whole-graph driver that rewrites every merge edge
//!   and strips all phi metadata
//! - **SSA verification** - an iterative, loop-aware checker for single
//!   assignment and def-before-use
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lirscope::prelude::*;
//!
//! let cfg = build_cfg()?;
//! SsaVerifier::new(&cfg).verify()?;
//!
//! let next = cfg.max_virtual_id().map_or(0, |m| m + 1);
//! let mut alloc = VirtualScratchAllocator::new(next);
//! destroy_ssa(&mut cfg, &mut alloc)?;
//! # Ok::<(), lirscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `lirscope` is organized into two modules:
//!
//! - [`lir`] - values, instructions, blocks and the control flow graph
//! - [`ssa`] - phi-edge maintenance, the parallel copy resolver, SSA
//!   destruction and verification
//! - [`Error`] and [`Result`] - error handling used throughout the crate

#[macro_use]
pub(crate) mod error;

pub mod lir;
pub mod prelude;
pub mod ssa;

pub use error::Error;

/// Convenience `Result` type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

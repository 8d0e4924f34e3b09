use thiserror::Error;

use crate::lir::{BlockId, Value, ValueKind};

macro_rules! structural_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::StructuralInvariant {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::StructuralInvariant {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every variant signals a non-recoverable internal-consistency failure in the compiler
/// pipeline that produced the LIR under analysis. None of these errors are retried; recovery
/// is "fail the compilation unit with enough context (offending instruction, block, value)
/// to diagnose", not graceful degradation.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::StructuralInvariant`] - CFG shape assumptions broken by an upstream phase
///
/// ## Phi Errors
/// - [`Error::TypeMismatch`] - Incompatible phi incoming/outgoing kinds on an edge
/// - [`Error::Resolution`] - Parallel copy resolution could not obtain a scratch temporary
///
/// ## Verification Errors
/// - [`Error::UseBeforeDef`] - A value is used on a path where it was never defined
/// - [`Error::DoubleDefinition`] - A value is defined more than once
///
/// # Examples
///
/// ```rust
/// use lirscope::{Error, lir::ControlFlowGraph};
///
/// match ControlFlowGraph::from_blocks(vec![]) {
///     Err(Error::StructuralInvariant { message, file, line }) => {
///         eprintln!("Broken CFG: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
///     Ok(_) => unreachable!("empty block list is rejected"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A structural invariant of the control flow graph was violated.
    ///
    /// This covers the no-critical-edge assumption being broken, incoming/outgoing
    /// phi list length mismatches, a merge predecessor whose last instruction is not
    /// a jump, and malformed predecessor/successor lists. It always indicates a bug
    /// in an upstream phase, never bad user input.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated invariant
    /// * `file` - Source file where the violation was detected
    /// * `line` - Source line where the violation was detected
    #[error("Structural invariant violated - {file}:{line}: {message}")]
    StructuralInvariant {
        /// The message to be printed for the violation
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Phi incoming/outgoing platform kinds are incompatible on a control-flow edge.
    ///
    /// The only tolerated difference is the derived-reference flag (see
    /// [`is_compatible_phi_kind`](crate::ssa::is_compatible_phi_kind)); every other
    /// mismatch is fatal.
    #[error("Incompatible phi kinds on edge {pred} -> {merge}: incoming {incoming} vs outgoing {outgoing}")]
    TypeMismatch {
        /// The predecessor block feeding the merge
        pred: BlockId,
        /// The merge block whose phi was checked
        merge: BlockId,
        /// The kind of the incoming (phi result) value
        incoming: ValueKind,
        /// The kind of the outgoing (edge operand) value
        outgoing: ValueKind,
    },

    /// The parallel copy resolver could not obtain a needed scratch temporary.
    ///
    /// Rare; indicates resource exhaustion in the scratch allocator supplied by the
    /// surrounding code-generation context.
    #[error("Parallel copy resolution failed: {0}")]
    Resolution(String),

    /// A value is used before any definition of it was recorded.
    ///
    /// Raised only by the SSA verifier. The instruction index and block identify the
    /// offending use site.
    #[error("Value {value} used in {block} at instruction {instruction} before definition")]
    UseBeforeDef {
        /// The value that was used without a reaching definition
        value: Value,
        /// The block containing the offending use
        block: BlockId,
        /// The instruction index of the offending use within its block
        instruction: usize,
    },

    /// A value is defined more than once, violating static single assignment.
    ///
    /// Raised only by the SSA verifier. Both definition sites are named.
    #[error("Value {value} defined twice: first in {first_block} at instruction {first_instruction}, again in {second_block} at instruction {second_instruction}")]
    DoubleDefinition {
        /// The value with two definitions
        value: Value,
        /// The block containing the first definition
        first_block: BlockId,
        /// The instruction index of the first definition
        first_instruction: usize,
        /// The block containing the second definition
        second_block: BlockId,
        /// The instruction index of the second definition
        second_instruction: usize,
    },
}

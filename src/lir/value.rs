//! Value and kind representation for LIR operands.
//!
//! Every operand position in the LIR holds a [`Value`]: a virtual register awaiting
//! allocation, a physical register, an inline constant, or the illegal placeholder.
//! Values carry a [`ValueKind`] describing their platform representation - the
//! register class, the bit width, and whether a reference is a derived (compressed)
//! reference rather than a plain one of the same width.
//!
//! # Derived References
//!
//! A derived reference is a narrower or compressed representation of a reference
//! that must be distinguished from a plain reference of the same width - a garbage
//! collector treats the two differently. Merge points may conservatively widen a
//! derived reference to a plain one, which is why phi type checking tolerates a
//! difference in exactly this flag (see [`crate::ssa::is_compatible_phi_kind`]).
//!
//! # Thread Safety
//!
//! All types in this module are `Copy`, `Send` and `Sync`.

use std::fmt;

use strum::{Display, EnumIter};

/// The platform register class of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum PlatformClass {
    /// Integer values of any width.
    Int,
    /// Floating point values of any width.
    Float,
    /// Managed references, plain or derived.
    Reference,
}

/// The platform kind of a value: register class, bit width and derived-reference flag.
///
/// Two kinds are equal only if all three components match. The derived-reference
/// flag can only be set for [`PlatformClass::Reference`] - the constructors enforce
/// this, so `ValueKind` never represents a "derived integer".
///
/// # Examples
///
/// ```rust
/// use lirscope::lir::ValueKind;
///
/// let k = ValueKind::int(32);
/// assert_eq!(k.bits(), 32);
/// assert!(!k.is_derived_reference());
///
/// let r = ValueKind::derived_reference(64);
/// assert!(r.is_derived_reference());
/// assert_ne!(r, ValueKind::reference(64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueKind {
    class: PlatformClass,
    bits: u16,
    derived_reference: bool,
}

impl ValueKind {
    /// Creates an integer kind of the given bit width.
    #[must_use]
    pub const fn int(bits: u16) -> Self {
        Self {
            class: PlatformClass::Int,
            bits,
            derived_reference: false,
        }
    }

    /// Creates a floating point kind of the given bit width.
    #[must_use]
    pub const fn float(bits: u16) -> Self {
        Self {
            class: PlatformClass::Float,
            bits,
            derived_reference: false,
        }
    }

    /// Creates a plain reference kind of the given bit width.
    #[must_use]
    pub const fn reference(bits: u16) -> Self {
        Self {
            class: PlatformClass::Reference,
            bits,
            derived_reference: false,
        }
    }

    /// Creates a derived (compressed) reference kind of the given bit width.
    #[must_use]
    pub const fn derived_reference(bits: u16) -> Self {
        Self {
            class: PlatformClass::Reference,
            bits,
            derived_reference: true,
        }
    }

    /// Returns the register class of this kind.
    #[must_use]
    pub const fn class(&self) -> PlatformClass {
        self.class
    }

    /// Returns the bit width of this kind.
    #[must_use]
    pub const fn bits(&self) -> u16 {
        self.bits
    }

    /// Returns `true` if this kind is a derived reference.
    #[must_use]
    pub const fn is_derived_reference(&self) -> bool {
        self.derived_reference
    }

    /// Returns `true` if this kind is a reference, plain or derived.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.class == PlatformClass::Reference
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            PlatformClass::Int => write!(f, "i{}", self.bits),
            PlatformClass::Float => write!(f, "f{}", self.bits),
            PlatformClass::Reference => {
                if self.derived_reference {
                    write!(f, "dref{}", self.bits)
                } else {
                    write!(f, "ref{}", self.bits)
                }
            }
        }
    }
}

/// A value occupying an operand slot in the LIR.
///
/// Before SSA destruction, virtual registers obey static single assignment: each is
/// defined exactly once in the whole program. After destruction, moves inserted on
/// control-flow edges may reassign them.
///
/// Constants and physical registers are always considered available - the SSA
/// verifier excludes them from definition tracking.
///
/// # Examples
///
/// ```rust
/// use lirscope::lir::{Value, ValueKind};
///
/// let v = Value::virtual_register(3, ValueKind::int(64));
/// assert!(v.is_virtual());
/// assert_eq!(format!("{v}"), "v3:i64");
///
/// let c = Value::constant(42, ValueKind::int(32));
/// assert!(c.is_constant());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A virtual register, subject to single assignment until SSA destruction.
    Virtual {
        /// The virtual register number.
        id: u32,
        /// The platform kind of the register.
        kind: ValueKind,
    },
    /// A physical register, excluded from SSA tracking.
    Register {
        /// The physical register number.
        id: u16,
        /// The platform kind of the register.
        kind: ValueKind,
    },
    /// An inline constant, excluded from SSA tracking.
    Constant {
        /// The raw constant bits.
        bits: i64,
        /// The platform kind of the constant.
        kind: ValueKind,
    },
    /// The illegal placeholder - a slot not carrying a value.
    Illegal,
}

impl Value {
    /// Creates a virtual register value.
    #[must_use]
    pub const fn virtual_register(id: u32, kind: ValueKind) -> Self {
        Value::Virtual { id, kind }
    }

    /// Creates a physical register value.
    #[must_use]
    pub const fn register(id: u16, kind: ValueKind) -> Self {
        Value::Register { id, kind }
    }

    /// Creates a constant value from raw bits.
    #[must_use]
    pub const fn constant(bits: i64, kind: ValueKind) -> Self {
        Value::Constant { bits, kind }
    }

    /// Returns the platform kind of this value, or `None` for [`Value::Illegal`].
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Virtual { kind, .. }
            | Value::Register { kind, .. }
            | Value::Constant { kind, .. } => Some(*kind),
            Value::Illegal => None,
        }
    }

    /// Returns `true` if this value is a virtual register.
    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        matches!(self, Value::Virtual { .. })
    }

    /// Returns `true` if this value is a physical register.
    #[must_use]
    pub const fn is_register(&self) -> bool {
        matches!(self, Value::Register { .. })
    }

    /// Returns `true` if this value is a constant.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Value::Constant { .. })
    }

    /// Returns `true` if this value is the illegal placeholder.
    #[must_use]
    pub const fn is_illegal(&self) -> bool {
        matches!(self, Value::Illegal)
    }

    /// Returns `true` if this value can be the destination of a move.
    ///
    /// Only virtual and physical registers are writable locations; constants and
    /// the illegal placeholder are not.
    #[must_use]
    pub const fn is_location(&self) -> bool {
        matches!(self, Value::Virtual { .. } | Value::Register { .. })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Virtual { id, kind } => write!(f, "v{id}:{kind}"),
            Value::Register { id, kind } => write!(f, "r{id}:{kind}"),
            Value::Constant { bits, kind } => write!(f, "#{bits}:{kind}"),
            Value::Illegal => write!(f, "-"),
        }
    }
}

//! The symbolic operand stack the function compiler maintains at compile
//! time, mirroring the runtime stack depth a correct bytecode program would
//! have.

use std::fmt::{self, Display};

use crate::reg::Reg;

/// Type tag carried by every symbolic value. Only `U64`/`U8`/`Bool` are
/// exercised by the operator set; `String` and `IntArray` are recognized
/// (so `STRING`/`LIST` can be disassembled) but nothing in the emitter
/// produces or consumes them as operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// 8-bit unsigned integer.
    U8,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// Boolean.
    Bool,
    /// String pool reference.
    String,
    /// Integer array.
    IntArray,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::U8 => "u8",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::IntArray => "int_array",
        };
        f.write_str(name)
    }
}

/// One entry of the compile-time operand stack: a value and where it
/// currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymValue {
    /// A literal, in decimal text form ready to drop into an operand
    /// position (`mov r, 42`).
    Constant {
        /// Decimal text of the literal.
        text: String,
        /// Type tag.
        ty: ValueType,
    },
    /// A value currently held in a register.
    Register {
        /// The register holding the value.
        reg: Reg,
        /// Type tag.
        ty: ValueType,
    },
    /// A value currently held at a stack memory operand, e.g.
    /// `qword [rbp-16]`.
    Memory {
        /// The assembly memory operand text.
        operand: String,
        /// Type tag.
        ty: ValueType,
    },
}

impl SymValue {
    /// The textual operand form used on the right-hand side of an
    /// instruction (`mov dst, <here>`).
    pub fn operand(&self) -> &str {
        match self {
            SymValue::Constant { text, .. } => text,
            SymValue::Register { reg, .. } => reg.name(),
            SymValue::Memory { operand, .. } => operand,
        }
    }

    /// The value's type tag.
    pub fn ty(&self) -> ValueType {
        match self {
            SymValue::Constant { ty, .. }
            | SymValue::Register { ty, .. }
            | SymValue::Memory { ty, .. } => *ty,
        }
    }

    /// Overwrites the type tag in place (used by `AND`/`OR`, which reuse
    /// `binop`'s arithmetic result but tag it `Bool`).
    pub fn set_ty(&mut self, new_ty: ValueType) {
        match self {
            SymValue::Constant { ty, .. }
            | SymValue::Register { ty, .. }
            | SymValue::Memory { ty, .. } => *ty = new_ty,
        }
    }

    /// Whether this entry currently occupies a register.
    pub fn held_register(&self) -> Option<Reg> {
        match self {
            SymValue::Register { reg, .. } => Some(*reg),
            _ => None,
        }
    }

    /// Whether this entry is a compile-time constant.
    pub fn is_constant(&self) -> bool {
        matches!(self, SymValue::Constant { .. })
    }
}

//! x86-64 general-purpose registers used by the code generator.
//!
//! The translator only ever touches the fourteen integer registers below;
//! `rdi`/`rsi` are carved out for argument passing and for the `PRINT`
//! runtime calls and are never handed out by [`Allocator`].

use std::fmt::{self, Display};

/// A general-purpose x86-64 register, by its 64-bit (`r*`/`e*`-prefixed)
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    /// `rax`
    Rax,
    /// `rbx`
    Rbx,
    /// `rcx`
    Rcx,
    /// `rdx`
    Rdx,
    /// `rdi`
    Rdi,
    /// `rsi`
    Rsi,
    /// `r8`
    R8,
    /// `r9`
    R9,
    /// `r10`
    R10,
    /// `r11`
    R11,
    /// `r12`
    R12,
    /// `r13`
    R13,
    /// `r14`
    R14,
    /// `r15`
    R15,
}

impl Reg {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rbx => "rbx",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::Rdi => "rdi",
            Reg::Rsi => "rsi",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::R11 => "r11",
            Reg::R12 => "r12",
            Reg::R13 => "r13",
            Reg::R14 => "r14",
            Reg::R15 => "r15",
        }
    }
}

impl Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Registers the allocator may hand out, in priority order. `rdi`/`rsi` are
/// deliberately excluded: they are reserved for argument passing and for
/// loading the operand of `PRINT`.
pub const ALLOCATABLE: [Reg; 12] = [
    Reg::Rax,
    Reg::Rbx,
    Reg::Rcx,
    Reg::Rdx,
    Reg::R8,
    Reg::R9,
    Reg::R10,
    Reg::R11,
    Reg::R12,
    Reg::R13,
    Reg::R14,
    Reg::R15,
];

/// System V AMD64 integer argument registers, in parameter order. Used both
/// to read incoming parameters in a function's prologue and to place
/// outgoing arguments at a `CALL` site.
pub const ARG_REGS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

/// Picks the first register in [`ALLOCATABLE`] not currently held by any
/// entry in `in_use`.
pub fn unused<'a>(in_use: impl Iterator<Item = &'a Reg>) -> Option<Reg> {
    let held: Vec<&Reg> = in_use.collect();
    ALLOCATABLE
        .into_iter()
        .find(|candidate| !held.contains(&candidate))
}

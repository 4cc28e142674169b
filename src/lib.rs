//! Ahead-of-time translator from a compact stack-bytecode format to x86-64
//! assembly text (Intel syntax, NASM-compatible), targeting the Linux x86-64
//! System V ABI.
//!
//! The pipeline is: [`bytes`] reads the little-endian integer primitives the
//! rest of the crate decodes with; [`program`] parses a whole bytecode file
//! into a [`program::Program`]; [`disasm`] walks each function once to
//! discover jump targets and callee arities (and prints a disassembly trace);
//! [`codegen`] drives [`compiler`] over every function to produce the final
//! assembly, which [`emitter`] accumulates and writes out.

pub mod bytes;
pub mod codegen;
pub mod compiler;
pub mod disasm;
pub mod emitter;
pub mod error;
pub mod opcode;
pub mod program;
pub mod reg;
pub mod value;

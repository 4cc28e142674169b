//! Typed errors for every fatal condition the translator can hit.
//!
//! All errors here are terminal: there is no recovery path, so every variant
//! exists only to give `main` a `Display` message and an exit code, the way
//! [`crate::opcode`]'s opcode table is consulted once and then discarded.

use std::fmt::{self, Display};
use std::path::PathBuf;

use crate::value::ValueType;

/// Failure while loading a bytecode file into a [`crate::program::Program`].
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read from disk.
    Io {
        /// Path that was passed on the command line.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "could not read bytecode file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
        }
    }
}

/// Failure while compiling a function's bytecode into assembly.
#[derive(Debug, PartialEq, Eq)]
pub enum CompileError {
    /// A `CALL` passed more arguments than fit in the argument registers.
    TooManyArguments {
        /// Index of the function containing the offending `CALL`.
        function: usize,
        /// Argument count read from the instruction stream.
        argc: u32,
    },
    /// `PRINT` was asked to print a type with no runtime printer.
    UnprintableType {
        /// The offending type tag.
        ty: ValueType,
    },
    /// An instruction byte outside the enumerated opcode table (or a
    /// recognized-but-unhandled opcode, see [`crate::opcode::Opcode`]).
    UnknownOpcode {
        /// Index of the function containing the offending byte.
        function: usize,
        /// Byte offset of the offending instruction.
        offset: usize,
        /// The raw opcode byte.
        byte: u8,
    },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::TooManyArguments { function, argc } => write!(
                f,
                "function {function}: too many arguments in call ({argc} > 6)"
            ),
            CompileError::UnprintableType { ty } => write!(f, "cannot print type {ty}"),
            CompileError::UnknownOpcode {
                function,
                offset,
                byte,
            } => write!(
                f,
                "function {function}: cannot compile opcode {byte} at offset {offset}"
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Failure while writing the assembled output file.
#[derive(Debug)]
pub struct WriteError {
    /// Destination path (`exe.asm`, per the fixed output name).
    pub path: PathBuf,
    /// Underlying I/O failure.
    pub source: std::io::Error,
}

impl Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not write assembly output {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Any of the translator's fatal error kinds, unified for `main`.
#[derive(Debug)]
pub enum TranslateError {
    /// See [`LoadError`].
    Load(LoadError),
    /// See [`CompileError`].
    Compile(CompileError),
    /// See [`WriteError`].
    Write(WriteError),
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::Load(e) => Display::fmt(e, f),
            TranslateError::Compile(e) => Display::fmt(e, f),
            TranslateError::Write(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<LoadError> for TranslateError {
    fn from(e: LoadError) -> Self {
        TranslateError::Load(e)
    }
}

impl From<CompileError> for TranslateError {
    fn from(e: CompileError) -> Self {
        TranslateError::Compile(e)
    }
}

impl From<WriteError> for TranslateError {
    fn from(e: WriteError) -> Self {
        TranslateError::Write(e)
    }
}

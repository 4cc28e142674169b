//! Parsing a whole bytecode file into an in-memory [`Program`].

use std::path::{Path, PathBuf};

use crate::bytes::read_u32_le;
use crate::error::LoadError;

/// A single function's raw instruction stream. Instruction offsets used for
/// jump targets and disassembly are byte offsets into `instructions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Raw bytecode instructions.
    pub instructions: Vec<u8>,
}

/// A fully-parsed bytecode program. Immutable after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Index into `functions` of the program's entry point.
    pub start: usize,
    /// String pool; index is the id used by `STRING` opcodes.
    pub strings: Vec<String>,
    /// Every function body, in declaration order.
    pub functions: Vec<Function>,
}

/// Parses the bytecode file at `path` into a [`Program`].
///
/// The wire format is documented in full in `SPEC_FULL.md` §4.2: a start
/// function index, a length-prefixed string pool, then a length-prefixed
/// function table, all little-endian.
pub fn load_program(path: &Path) -> Result<Program, LoadError> {
    let contents = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_program(&contents))
}

fn parse_program(contents: &[u8]) -> Program {
    let start = read_u32_le(contents, 0) as usize;
    let string_count = read_u32_le(contents, 4) as usize;

    let mut offset = 8;
    let mut strings = Vec::with_capacity(string_count);
    for _ in 0..string_count {
        let len = read_u32_le(contents, offset) as usize;
        offset += 4;
        strings.push(String::from_utf8_lossy(&contents[offset..offset + len]).into_owned());
        offset += len;
    }

    let function_count = read_u32_le(contents, offset) as usize;
    offset += 4;

    let mut functions = Vec::with_capacity(function_count);
    for _ in 0..function_count {
        let len = read_u32_le(contents, offset) as usize;
        offset += 4;
        functions.push(Function {
            instructions: contents[offset..offset + len].to_vec(),
        });
        offset += len;
    }

    Program {
        start,
        strings,
        functions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_bytes(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    #[test]
    fn parses_minimal_program() {
        let mut buf = Vec::new();
        buf.extend(u32_bytes(0)); // start
        buf.extend(u32_bytes(1)); // string_count
        buf.extend(u32_bytes(5)); // len("hello")
        buf.extend(b"hello");
        buf.extend(u32_bytes(1)); // function_count
        buf.extend(u32_bytes(1)); // body_length
        buf.push(32); // RETURN

        let program = parse_program(&buf);
        assert_eq!(program.start, 0);
        assert_eq!(program.strings, vec!["hello".to_string()]);
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].instructions, vec![32]);
    }

    #[test]
    fn parses_program_with_no_strings() {
        let mut buf = Vec::new();
        buf.extend(u32_bytes(0));
        buf.extend(u32_bytes(0));
        buf.extend(u32_bytes(0));

        let program = parse_program(&buf);
        assert!(program.strings.is_empty());
        assert!(program.functions.is_empty());
    }

    #[test]
    fn load_program_reports_missing_file() {
        let err = load_program(Path::new("/nonexistent/path/to/file.bc")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn round_trips_on_repeated_parse() {
        let mut buf = Vec::new();
        buf.extend(u32_bytes(1));
        buf.extend(u32_bytes(0));
        buf.extend(u32_bytes(2));
        buf.extend(u32_bytes(1));
        buf.push(32);
        buf.extend(u32_bytes(1));
        buf.push(32);

        assert_eq!(parse_program(&buf), parse_program(&buf));
    }
}

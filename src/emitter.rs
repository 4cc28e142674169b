//! Accumulates emitted assembly lines and writes them out; also hands out
//! fresh label names.
//!
//! Label generation is a monotonic per-function counter rather than the
//! random 12-character identifiers of the design this crate is distilled
//! from — see `SPEC_FULL.md` §10.2. The externally observable contract ("a
//! name not already used in this compilation") is unchanged.

use std::path::{Path, PathBuf};

use crate::error::WriteError;

/// Hands out label names guaranteed unique within one compilation.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    counter: usize,
}

impl LabelGenerator {
    /// Creates a generator with its counter at zero.
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Mints a fresh jump-target label scoped to `function_index`.
    pub fn fresh(&mut self, function_index: usize) -> String {
        let label = format!("_f{function_index}_l{}", self.counter);
        self.counter += 1;
        label
    }

    /// Mints a fresh label with no particular function association, used
    /// for the true/merge labels of a comparison sequence.
    pub fn fresh_anon(&mut self) -> String {
        let label = format!("_l{}", self.counter);
        self.counter += 1;
        label
    }
}

/// Assigns one unique symbol per function, in declaration order.
pub fn assign_function_labels(function_count: usize) -> Vec<String> {
    (0..function_count).map(|i| format!("_fn{i}")).collect()
}

/// An ordered buffer of assembly lines, with every appended line echoed to
/// standard output as it is added (the trace is the tool's primary
/// observable output channel, not incidental debug noise).
#[derive(Debug, Default)]
pub struct Emitter {
    lines: Vec<String>,
}

impl Emitter {
    /// Creates an empty emitter.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Appends an indented instruction line.
    pub fn instr(&mut self, line: impl Into<String>) {
        self.push(true, line.into());
    }

    /// Appends an unindented line (label, directive, or blank).
    pub fn raw(&mut self, line: impl Into<String>) {
        self.push(false, line.into());
    }

    fn push(&mut self, indent: bool, text: String) {
        let line = if indent {
            format!("\t{text}")
        } else {
            text
        };
        println!("{line}");
        self.lines.push(line);
    }

    /// Appends a blank placeholder line and returns its index, to be
    /// patched later once the value it depends on (the frame's stack
    /// watermark) is known.
    pub fn reserve(&mut self) -> usize {
        self.raw(String::new());
        self.lines.len() - 1
    }

    /// Overwrites a previously [`reserve`](Self::reserve)d line in place.
    pub fn patch(&mut self, index: usize, indent: bool, text: impl Into<String>) {
        let text = text.into();
        self.lines[index] = if indent { format!("\t{text}") } else { text };
    }

    /// Every accumulated line, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes the accumulated buffer to `path`, one line per record
    /// terminated by a single newline, overwriting any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), WriteError> {
        use std::io::Write;

        let mut file = std::fs::File::create(path).map_err(|source| WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        for line in &self.lines {
            writeln!(file, "{line}").map_err(|source| WriteError {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Default name of the emitted assembly file.
pub fn output_path() -> PathBuf {
    PathBuf::from("exe.asm")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_labels_are_unique_and_scoped() {
        let mut gen = LabelGenerator::new();
        let a = gen.fresh(0);
        let b = gen.fresh(0);
        let c = gen.fresh(1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("_f0_l"));
        assert!(c.starts_with("_f1_l"));
    }

    #[test]
    fn function_labels_are_assigned_in_order() {
        let labels = assign_function_labels(3);
        assert_eq!(labels, vec!["_fn0", "_fn1", "_fn2"]);
    }

    #[test]
    fn instr_lines_are_tab_indented() {
        let mut emitter = Emitter::new();
        emitter.instr("push rbp");
        assert_eq!(emitter.lines(), ["\tpush rbp"]);
    }

    #[test]
    fn reserve_then_patch_overwrites_in_place() {
        let mut emitter = Emitter::new();
        emitter.raw("fn:");
        let slot = emitter.reserve();
        emitter.instr("pop rbp");
        emitter.patch(slot, true, "sub rsp, 16");
        assert_eq!(emitter.lines(), ["fn:", "\tsub rsp, 16", "\tpop rbp"]);
    }

    #[test]
    fn write_to_appends_trailing_newline_per_line() {
        let mut emitter = Emitter::new();
        emitter.raw("section .text");
        emitter.instr("ret");

        let dir = std::env::temp_dir().join(format!("stackasm-emitter-test-{:p}", &emitter));
        emitter.write_to(&dir).unwrap();
        let contents = std::fs::read_to_string(&dir).unwrap();
        assert_eq!(contents, "section .text\n\tret\n");
        let _ = std::fs::remove_file(&dir);
    }
}

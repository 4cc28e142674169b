//! Top-level orchestration: data section, text section skeleton, one
//! compiled block per function, and the `main` trampoline.

use std::collections::HashMap;

use crate::compiler::FunctionCompiler;
use crate::disasm::{self, analyze_function};
use crate::emitter::{assign_function_labels, Emitter, LabelGenerator};
use crate::error::CompileError;
use crate::program::Program;

/// Translates a whole [`Program`] into an [`Emitter`] holding the complete
/// assembly listing, ready to be written out.
pub fn translate(program: &Program) -> Result<Emitter, CompileError> {
    let mut labels = LabelGenerator::new();
    let mut arity: HashMap<usize, usize> = HashMap::new();
    let mut jump_labels = Vec::with_capacity(program.functions.len());
    for (idx, function) in program.functions.iter().enumerate() {
        disasm::print_function_header(idx, program.start);
        jump_labels.push(analyze_function(&function.instructions, idx, &mut labels, &mut arity));
    }

    let mut emitter = Emitter::new();
    emit_data_section(&mut emitter, program);

    emitter.raw("section .text");
    emitter.raw("extern print_int");
    emitter.raw("extern print_char");
    emitter.raw("extern print_bool");
    emitter.raw("global main");
    emitter.raw(String::new());

    let fn_labels = assign_function_labels(program.functions.len());
    for (idx, function) in program.functions.iter().enumerate() {
        let argc = arity.get(&idx).copied().unwrap_or(0);
        let (mut compiler, sub_rsp_slot) = FunctionCompiler::prologue(
            &mut emitter,
            &mut labels,
            &fn_labels,
            jump_labels[idx].clone(),
            idx,
            argc,
        );
        compiler.compile_body(&function.instructions)?;
        compiler.epilogue(sub_rsp_slot);
    }

    emitter.raw("main:");
    emitter.instr(format!("call {}", fn_labels[program.start]));
    emitter.instr("mov rax, 60");
    emitter.instr("mov rdi, 0");
    emitter.instr("syscall");

    Ok(emitter)
}

fn emit_data_section(emitter: &mut Emitter, program: &Program) {
    emitter.raw("section .data");
    for (i, literal) in program.strings.iter().enumerate() {
        emitter.raw(format!("string{i}: db \"{literal}\", 0"));
    }
    emitter.raw(format!("string{}: db \"%d\", 10, 0", program.strings.len()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Function;

    fn program(functions: Vec<Vec<u8>>, strings: Vec<&str>) -> Program {
        Program {
            start: 0,
            strings: strings.into_iter().map(String::from).collect(),
            functions: functions
                .into_iter()
                .map(|instructions| Function { instructions })
                .collect(),
        }
    }

    #[test]
    fn empty_program_emits_trampoline_and_return_sequence() {
        let prog = program(vec![vec![32]], vec![]); // one function: RETURN
        let emitter = translate(&prog).unwrap();
        let lines = emitter.lines();
        assert!(lines.contains(&"_fn0:".to_string()));
        assert!(lines.contains(&"main:".to_string()));
        assert!(lines.contains(&"\tcall _fn0".to_string()));
        assert!(lines.contains(&"\tmov rax, 60".to_string()));
        assert!(lines.contains(&"\tsyscall".to_string()));
    }

    #[test]
    fn data_section_appends_integer_format_after_strings() {
        let prog = program(vec![vec![32]], vec!["hi"]);
        let emitter = translate(&prog).unwrap();
        let lines = emitter.lines();
        assert!(lines.contains(&"string0: db \"hi\", 0".to_string()));
        assert!(lines.contains(&"string1: db \"%d\", 10, 0".to_string()));
    }

    #[test]
    fn unknown_opcode_propagates_as_compile_error() {
        let prog = program(vec![vec![19]], vec![]); // STORE, recognized but fatal
        let err = translate(&prog).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownOpcode {
                function: 0,
                offset: 0,
                byte: 19
            }
        );
    }
}

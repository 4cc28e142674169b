//! Two-pass pre-analysis over a single function's bytecode: mints jump
//! labels, records callee arities, and prints a human-readable disassembly
//! trace. Exactly one linear scan per function.

use std::collections::HashMap;

use crate::bytes::{read_u32_le, read_u64_le};
use crate::emitter::LabelGenerator;
use crate::opcode::Opcode;

/// Prints the per-function header the trace starts each function with:
/// `Start function` for the program's entry point, `Function <index>`
/// otherwise.
pub fn print_function_header(func_idx: usize, program_start: usize) {
    if func_idx == program_start {
        println!("Start function");
    } else {
        println!("Function {func_idx}");
    }
}

/// Walks `code` once, printing the disassembly trace, recording every jump
/// target's freshly minted label, and contributing `(callee, argc)` pairs
/// observed in `CALL` instructions to the shared `arity` map.
///
/// Returns the jump-target → label map for this function alone.
pub fn analyze_function(
    code: &[u8],
    func_idx: usize,
    labels: &mut LabelGenerator,
    arity: &mut HashMap<usize, usize>,
) -> HashMap<usize, String> {
    let mut jump_labels = HashMap::new();
    let mut offset = 0;
    while offset < code.len() {
        let byte = code[offset];
        match Opcode::from_byte(byte) {
            Some(Opcode::Jump) | Some(Opcode::JumpIfFalse) => {
                let target = read_u32_le(code, offset + 1) as usize;
                jump_labels
                    .entry(target)
                    .or_insert_with(|| labels.fresh(func_idx));
            }
            Some(Opcode::Call) => {
                let callee = read_u32_le(code, offset + 1) as usize;
                let argc = read_u32_le(code, offset + 5) as usize;
                arity.insert(callee, argc);
            }
            _ => {}
        }

        let (text, last_immediate_offset) = trace_text(code, offset);
        print!("{offset:5}\t{text}");
        offset = last_immediate_offset + 1;
    }
    jump_labels
}

/// Renders one instruction's disassembly text (trailing newline included,
/// matching the reference trace format) and returns the offset of the last
/// byte it consumed (the opcode byte itself if there is no immediate).
fn trace_text(code: &[u8], offset: usize) -> (String, usize) {
    let byte = code[offset];
    let Some(op) = Opcode::from_byte(byte) else {
        return (format!("Unknown opcode {byte}\n"), offset);
    };
    match op {
        Opcode::Jump => (
            format!("Jump {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::JumpIfFalse => (
            format!("JumpIfFalse {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::ConstU32 => (
            format!("ConstU32 {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::ConstU64 => (
            format!("ConstU64 {}\n", read_u64_le(code, offset + 1)),
            offset + 8,
        ),
        Opcode::ConstU8 => (format!("ConstU8 {}\n", code[offset + 1]), offset + 1),
        Opcode::List => (
            format!("List {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::String => (
            format!("string at index {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::DefLocal => (
            format!("DefLocal {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::GetLocal => (
            format!("GetLocal {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::Assign => (
            format!("Assign {}\n", read_u32_le(code, offset + 1)),
            offset + 4,
        ),
        Opcode::Call => {
            let idx = read_u32_le(code, offset + 1);
            let argc = read_u32_le(code, offset + 5);
            (
                format!("Call \t fn: {idx} \t arg count: {argc} \n"),
                offset + 8,
            )
        }
        other => (format!("{}\n", other.mnemonic()), offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_bytes(v: u32) -> [u8; 4] {
        v.to_le_bytes()
    }

    #[test]
    fn records_jump_targets_once_each() {
        let mut code = vec![17]; // JUMP
        code.extend(u32_bytes(0));
        code.push(17); // JUMP to the same target again
        code.extend(u32_bytes(0));

        let mut labels = LabelGenerator::new();
        let mut arity = HashMap::new();
        let jumps = analyze_function(&code, 0, &mut labels, &mut arity);
        assert_eq!(jumps.len(), 1);
        assert!(jumps.contains_key(&0));
    }

    #[test]
    fn records_call_arity() {
        let mut code = vec![31]; // CALL
        code.extend(u32_bytes(3)); // callee
        code.extend(u32_bytes(2)); // argc

        let mut labels = LabelGenerator::new();
        let mut arity = HashMap::new();
        analyze_function(&code, 0, &mut labels, &mut arity);
        assert_eq!(arity.get(&3), Some(&2));
    }

    #[test]
    fn last_call_wins_on_conflicting_arity() {
        let mut code = vec![31];
        code.extend(u32_bytes(3));
        code.extend(u32_bytes(1));
        code.push(31);
        code.extend(u32_bytes(3));
        code.extend(u32_bytes(4));

        let mut labels = LabelGenerator::new();
        let mut arity = HashMap::new();
        analyze_function(&code, 0, &mut labels, &mut arity);
        assert_eq!(arity.get(&3), Some(&4));
    }

    #[test]
    fn repeated_analysis_is_idempotent_up_to_label_spelling() {
        let mut code = vec![17];
        code.extend(u32_bytes(0));

        let mut labels_a = LabelGenerator::new();
        let mut arity_a = HashMap::new();
        let jumps_a = analyze_function(&code, 0, &mut labels_a, &mut arity_a);

        let mut labels_b = LabelGenerator::new();
        let mut arity_b = HashMap::new();
        let jumps_b = analyze_function(&code, 0, &mut labels_b, &mut arity_b);

        assert_eq!(jumps_a.keys().collect::<Vec<_>>(), jumps_b.keys().collect::<Vec<_>>());
        assert_eq!(jumps_a, jumps_b); // deterministic counter: identical labels too
    }
}

//! Hand-assembles small bytecode buffers for the integration scenarios in
//! `tests/integration.rs`.

#![allow(dead_code)]

pub fn u32_bytes(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

pub fn u64_bytes(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

/// Builds a minimal program file buffer: no strings, the given function
/// bodies, entry point at function 0.
pub fn program_bytes(functions: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend(u32_bytes(0)); // start
    buf.extend(u32_bytes(0)); // string_count
    buf.extend(u32_bytes(functions.len() as u32));
    for body in functions {
        buf.extend(u32_bytes(body.len() as u32));
        buf.extend_from_slice(body);
    }
    buf
}

pub const ADD: u8 = 0;
pub const TRUE: u8 = 15;
pub const JUMP_IF_FALSE: u8 = 18;
pub const CONST_U64: u8 = 24;
pub const DEF_LOCAL: u8 = 28;
pub const GET_LOCAL: u8 = 29;
pub const CALL: u8 = 31;
pub const RETURN: u8 = 32;
pub const PRINT: u8 = 33;

pub fn const_u64(v: u64) -> Vec<u8> {
    let mut buf = vec![CONST_U64];
    buf.extend(u64_bytes(v));
    buf
}

pub fn jump_if_false(target: u32) -> Vec<u8> {
    let mut buf = vec![JUMP_IF_FALSE];
    buf.extend(u32_bytes(target));
    buf
}

pub fn def_local(idx: u32) -> Vec<u8> {
    let mut buf = vec![DEF_LOCAL];
    buf.extend(u32_bytes(idx));
    buf
}

pub fn get_local(idx: u32) -> Vec<u8> {
    let mut buf = vec![GET_LOCAL];
    buf.extend(u32_bytes(idx));
    buf
}

pub fn call(callee: u32, argc: u32) -> Vec<u8> {
    let mut buf = vec![CALL];
    buf.extend(u32_bytes(callee));
    buf.extend(u32_bytes(argc));
    buf
}

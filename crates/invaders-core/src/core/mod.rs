//! Core module.

pub mod alu;
pub mod cpu;

#[macro_use]
mod macros;

pub mod opcodes;
pub mod registers;
pub mod savestate;
pub mod types;

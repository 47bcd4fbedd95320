//! UVM assembler: a small textual mnemonic language translated into a
//! fixed-width binary instruction stream.
//!
//! The wire format is one 3-byte little-endian record per instruction;
//! there is no header and no count field, the program length is simply
//! the byte count divided by 3.

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod parser;
pub mod types;

pub use assembler::Assembler;
pub use encoder::{decode, encode, encode_program};
pub use error::{AsmError, DecodeError, EncodeError};
pub use parser::LineParser;
pub use types::{
    AssemblerOptions, Instruction, Opcode, Operand, ParsedLine, SymbolTable,
    DEFAULT_MEMORY_SIZE, INSTRUCTION_SIZE, MAX_ADDRESS, MAX_CONSTANT, STACK_CAPACITY,
};

/// Assemble with default options.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AsmError> {
    Assembler::default().assemble(source)
}

/// Assemble with default options straight to a binary image.
pub fn assemble_to_binary(source: &str) -> Result<Vec<u8>, AsmError> {
    Assembler::default().assemble_to_binary(source)
}

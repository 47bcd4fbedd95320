use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Size of one encoded instruction in bytes.
pub const INSTRUCTION_SIZE: u32 = 3;
/// Largest immediate a LOAD constant can carry (9-bit B field).
pub const MAX_CONSTANT: u32 = 511;
/// Largest address a STORE can carry (16-bit B field).
pub const MAX_ADDRESS: u32 = 0xFFFF;
/// Default data memory size in cells.
pub const DEFAULT_MEMORY_SIZE: usize = 65536;
/// Operand stack capacity.
pub const STACK_CAPACITY: usize = 1024;

/// UVM operation codes. The discriminant doubles as the 3-bit A field
/// on the wire; no other values are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    LoadConst = 1,
    Add = 3,
    Store = 4,
    LoadMem = 7,
}

impl Opcode {
    pub fn from_a_field(value: u8) -> Option<Self> {
        match value {
            1 => Some(Opcode::LoadConst),
            3 => Some(Opcode::Add),
            4 => Some(Opcode::Store),
            7 => Some(Opcode::LoadMem),
            _ => None,
        }
    }

    pub fn a_field(&self) -> u8 {
        *self as u8
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::LoadConst => "LOAD_CONST",
            Opcode::Add => "ADD",
            Opcode::Store => "STORE",
            Opcode::LoadMem => "LOAD_MEM",
        }
    }

    /// Mask for the B field. Opcodes without an operand mask to zero,
    /// which is also the decode path's way of forcing them to 0.
    pub fn operand_mask(&self) -> u32 {
        match self {
            Opcode::LoadConst => MAX_CONSTANT,
            Opcode::Store => MAX_ADDRESS,
            Opcode::Add | Opcode::LoadMem => 0,
        }
    }

    pub fn takes_operand(&self) -> bool {
        match self {
            Opcode::LoadConst | Opcode::Store => true,
            Opcode::Add | Opcode::LoadMem => false,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// One assembled operation. `address` is the byte offset of the
/// instruction in the code stream, always a multiple of 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Option<u32>,
    pub address: u32,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: Option<u32>, address: u32) -> Self {
        Self {
            opcode,
            operand,
            address,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(value) => write!(f, "{:04}: {} {}", self.address, self.opcode, value),
            None => write!(f, "{:04}: {}", self.address, self.opcode),
        }
    }
}

/// Draft operand produced by pass 2, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(i64),
    Label(String),
}

/// One normalized source line. Exactly one of `label` / `mnemonic`
/// is set; blank and comment-only lines never reach this type.
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub mnemonic: Option<String>,
    pub operands: Vec<String>,
    pub line_number: usize,
}

/// Label name to code-stream byte address. Populated in pass 1,
/// consumed during resolution, never present at runtime.
pub type SymbolTable = HashMap<String, u32>;

#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    pub case_insensitive: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}

//! Bidirectional mapping between an [`Instruction`] and its 3-byte
//! wire representation.
//!
//! Each instruction is a 24-bit little-endian word
//! `W = b0 | b1 << 8 | b2 << 16`. The low 3 bits (`A = W & 0x7`) select
//! the opcode; the B field (`W >> 3`) holds the operand, masked to the
//! width the opcode permits: 9 bits for LOAD_CONST, 16 bits for STORE,
//! zero for ADD and LOAD_MEM. The codec checks bit-width legality only;
//! whether a STORE address is reachable is the VM's problem.

use crate::error::{DecodeError, EncodeError};
use crate::types::{Instruction, Opcode, INSTRUCTION_SIZE};

const A_FIELD_MASK: u32 = 0x7;
const B_FIELD_SHIFT: u32 = 3;

/// Pack one instruction into its 3-byte record.
pub fn encode(instruction: &Instruction) -> Result<[u8; 3], EncodeError> {
    let opcode = instruction.opcode;
    let mask = opcode.operand_mask();

    let b_field = match instruction.operand {
        Some(value) => {
            if value > mask {
                return Err(EncodeError::OperandRange {
                    mnemonic: opcode.mnemonic(),
                    value,
                    width: mask.count_ones(),
                });
            }
            value
        }
        None => {
            if opcode.takes_operand() {
                return Err(EncodeError::MissingOperand {
                    mnemonic: opcode.mnemonic(),
                });
            }
            0
        }
    };

    let word = opcode.a_field() as u32 | (b_field << B_FIELD_SHIFT);
    Ok([
        (word & 0xFF) as u8,
        ((word >> 8) & 0xFF) as u8,
        ((word >> 16) & 0xFF) as u8,
    ])
}

/// Encode a program in address order into a flat binary image.
pub fn encode_program(instructions: &[Instruction]) -> Result<Vec<u8>, EncodeError> {
    let mut binary = Vec::with_capacity(instructions.len() * INSTRUCTION_SIZE as usize);
    for instruction in instructions {
        binary.extend_from_slice(&encode(instruction)?);
    }
    Ok(binary)
}

/// Unpack one 3-byte record into `(opcode, operand)`. The operand is
/// masked to the opcode's field width; opcodes without an operand
/// always decode it as 0.
pub fn decode(bytes: &[u8]) -> Result<(Opcode, u32), DecodeError> {
    if bytes.len() != INSTRUCTION_SIZE as usize {
        return Err(DecodeError::WrongLength { len: bytes.len() });
    }

    let word = bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16;
    let a_field = (word & A_FIELD_MASK) as u8;

    let opcode = Opcode::from_a_field(a_field)
        .ok_or(DecodeError::UnknownOpcode { bits: a_field })?;
    let operand = (word >> B_FIELD_SHIFT) & opcode.operand_mask();

    Ok((opcode, operand))
}

use thiserror::Error;

/// Assembly errors. Every variant carries the 1-based source line it
/// was detected on; assembly aborts on the first error with no partial
/// binary produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: {mnemonic} requires an operand")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("line {line}: too many operands for {mnemonic}")]
    TooManyOperands { line: usize, mnemonic: String },

    #[error("line {line}: malformed number `{literal}`")]
    MalformedNumber { line: usize, literal: String },

    #[error("line {line}: duplicate label `{name}`")]
    DuplicateLabel { line: usize, name: String },

    #[error("line {line}: undefined label `{name}`")]
    UndefinedLabel { line: usize, name: String },

    #[error("line {line}: operand {value} out of range for {mnemonic} (0..={max})")]
    OperandRange {
        line: usize,
        mnemonic: &'static str,
        value: i64,
        max: u32,
    },

    #[error("instruction at address {address}: {source}")]
    Encode {
        address: u32,
        #[source]
        source: EncodeError,
    },
}

/// Bit-width legality failures when packing an instruction word.
/// The codec validates nothing beyond field widths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("operand {value} exceeds the {width}-bit B field of {mnemonic}")]
    OperandRange {
        mnemonic: &'static str,
        value: u32,
        width: u32,
    },

    #[error("{mnemonic} requires an operand")]
    MissingOperand { mnemonic: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("instruction record must be 3 bytes, got {len}")]
    WrongLength { len: usize },

    #[error("unrecognized opcode bits {bits:#x}")]
    UnknownOpcode { bits: u8 },
}

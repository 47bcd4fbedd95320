use thiserror::Error;
use uvm_asm::DecodeError;

/// Binary image rejection at load time. The image must be a whole
/// number of 3-byte records; a short trailing fragment is refused
/// rather than zero-padded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("binary image length {len} is not a multiple of 3")]
    TruncatedImage { len: usize },
}

/// Execution faults. Every variant carries the program-counter value
/// (an instruction index, not a byte offset) it occurred at; any of
/// them halts the run immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("pc {pc}: {source}")]
    Decode {
        pc: usize,
        #[source]
        source: DecodeError,
    },

    #[error("pc {pc}: stack underflow in {mnemonic}")]
    StackUnderflow { pc: usize, mnemonic: &'static str },

    #[error("pc {pc}: stack overflow (capacity {capacity})")]
    StackOverflow { pc: usize, capacity: usize },

    #[error("pc {pc}: memory address {address} out of bounds (memory size {size})")]
    InvalidAddress {
        pc: usize,
        address: i64,
        size: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DumpError {
    #[error("empty dump range: start {start} must be below end {end}")]
    EmptyRange { start: usize, end: usize },

    #[error("dump range end {end} exceeds memory size {size}")]
    OutOfBounds { end: usize, size: usize },
}

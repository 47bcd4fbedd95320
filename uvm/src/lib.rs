//! UVM virtual machine: executes the fixed 3-byte instruction stream
//! produced by `uvm-asm` against a stack-and-memory machine model.

pub mod cli;
pub mod error;
pub mod vm;

// Re-export commonly used types
pub use error::{DumpError, ExecError, LoadError};
pub use vm::{Vm, VmState};

use crate::error::{DumpError, ExecError, LoadError};
use log::{debug, trace};
use uvm_asm::{decode, Opcode, DEFAULT_MEMORY_SIZE, INSTRUCTION_SIZE, STACK_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Ready,
    Running,
    Halted,
    Faulted,
}

/// The UVM machine: linear signed-integer memory, a bounded operand
/// stack and a pre-chunked code segment. One instance owns its state
/// exclusively; nothing here is shared.
pub struct Vm {
    pub memory: Vec<i64>,
    pub stack: Vec<i64>,
    pub state: VmState,
    code: Vec<[u8; 3]>,
    pc: usize,
}

impl Vm {
    pub fn new(memory_size: usize) -> Self {
        Vm {
            memory: vec![0; memory_size],
            stack: Vec::new(),
            state: VmState::Ready,
            code: Vec::new(),
            pc: 0,
        }
    }

    pub fn new_default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }

    /// Program counter: index of the next instruction to decode.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Split the binary image into consecutive 3-byte records without
    /// decoding them. The image must divide evenly; a short trailing
    /// fragment is rejected.
    pub fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() % INSTRUCTION_SIZE as usize != 0 {
            return Err(LoadError::TruncatedImage { len: image.len() });
        }

        self.code = image
            .chunks_exact(INSTRUCTION_SIZE as usize)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
            .collect();
        self.pc = 0;
        self.state = VmState::Ready;

        debug!("loaded {} instructions", self.code.len());
        Ok(())
    }

    /// Decode and execute the instruction at the current program
    /// counter, then advance by one instruction. Any fault leaves the
    /// machine in `Faulted`, terminal for this run.
    pub fn step(&mut self) -> Result<(), ExecError> {
        let pc = self.pc;
        let record = match self.code.get(pc) {
            Some(record) => *record,
            None => {
                self.state = VmState::Halted;
                return Ok(());
            }
        };

        let (opcode, b_field) = match decode(&record) {
            Ok(decoded) => decoded,
            Err(source) => return Err(self.fault(ExecError::Decode { pc, source })),
        };

        trace!("[pc={pc:04}] {opcode} b={b_field}");

        match opcode {
            Opcode::LoadConst => {
                if self.stack.len() >= STACK_CAPACITY {
                    return Err(self.fault(ExecError::StackOverflow {
                        pc,
                        capacity: STACK_CAPACITY,
                    }));
                }
                self.stack.push(b_field as i64);
            }

            Opcode::Store => {
                let value = match self.stack.pop() {
                    Some(value) => value,
                    None => {
                        return Err(self.fault(ExecError::StackUnderflow {
                            pc,
                            mnemonic: opcode.mnemonic(),
                        }))
                    }
                };
                // The assembler range-checks B already, but a
                // hand-crafted binary may still exceed a small memory
                let address = b_field as usize;
                if address >= self.memory.len() {
                    return Err(self.fault(ExecError::InvalidAddress {
                        pc,
                        address: b_field as i64,
                        size: self.memory.len(),
                    }));
                }
                self.memory[address] = value;
            }

            Opcode::LoadMem => {
                let address = match self.stack.pop() {
                    Some(address) => address,
                    None => {
                        return Err(self.fault(ExecError::StackUnderflow {
                            pc,
                            mnemonic: opcode.mnemonic(),
                        }))
                    }
                };
                let cell = match self.read_cell(address) {
                    Some(cell) => cell,
                    None => {
                        return Err(self.fault(ExecError::InvalidAddress {
                            pc,
                            address,
                            size: self.memory.len(),
                        }))
                    }
                };
                self.stack.push(cell);
            }

            Opcode::Add => {
                // Second operand is the literal stack top; the first
                // is dereferenced through memory via the next entry
                let depth = self.stack.len();
                if depth < 2 {
                    return Err(self.fault(ExecError::StackUnderflow {
                        pc,
                        mnemonic: opcode.mnemonic(),
                    }));
                }
                let op2 = self.stack[depth - 1];
                let address = self.stack[depth - 2];
                let op1 = match self.read_cell(address) {
                    Some(cell) => cell,
                    None => {
                        return Err(self.fault(ExecError::InvalidAddress {
                            pc,
                            address,
                            size: self.memory.len(),
                        }))
                    }
                };
                self.stack.truncate(depth - 2);
                self.stack.push(op1.wrapping_add(op2));
            }
        }

        self.pc = pc + 1;
        Ok(())
    }

    /// Execute the loaded program from the start. The program counter
    /// restarts at 0, but memory and the stack carry over from any
    /// previous run; callers wanting a clean machine construct a new
    /// instance.
    pub fn run(&mut self) -> Result<(), ExecError> {
        self.pc = 0;
        self.state = VmState::Running;
        debug!("running {} instructions", self.code.len());

        while self.pc < self.code.len() {
            self.step()?;
        }

        self.state = VmState::Halted;
        debug!("halted normally at pc={}", self.pc);
        Ok(())
    }

    /// `(address, value)` pairs over the half-open range `[start, end)`.
    /// Read-only; calling it twice without intervening execution
    /// returns identical results.
    pub fn dump(&self, start: usize, end: usize) -> Result<Vec<(usize, i64)>, DumpError> {
        if start >= end {
            return Err(DumpError::EmptyRange { start, end });
        }
        if end > self.memory.len() {
            return Err(DumpError::OutOfBounds {
                end,
                size: self.memory.len(),
            });
        }

        Ok((start..end).map(|addr| (addr, self.memory[addr])).collect())
    }

    fn read_cell(&self, address: i64) -> Option<i64> {
        if address < 0 {
            return None;
        }
        self.memory.get(address as usize).copied()
    }

    fn fault(&mut self, error: ExecError) -> ExecError {
        self.state = VmState::Faulted;
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uvm_asm::assemble_to_binary;

    fn run_program(vm: &mut Vm, source: &str) -> Result<(), ExecError> {
        let binary = assemble_to_binary(source).unwrap();
        vm.load(&binary).unwrap();
        vm.run()
    }

    #[test]
    fn test_load_const_and_store() {
        let mut vm = Vm::new_default();
        run_program(&mut vm, "LOAD #155\nSTORE 1000").unwrap();

        assert_eq!(vm.memory[1000], 155);
        assert!(vm.stack.is_empty());
        assert_eq!(vm.state, VmState::Halted);
    }

    #[test]
    fn test_add_dereferences_first_operand() {
        // memory[300] + memory[301] stored at 302. The first addend's
        // address stays on the stack undereferenced: ADD itself reads
        // memory[300], only the second addend is loaded as a value.
        let mut vm = Vm::new_default();
        vm.memory[300] = 42;
        vm.memory[301] = 58;

        run_program(&mut vm, "LOAD #300\nLOAD #301\nLOAD\nADD\nSTORE 302").unwrap();

        assert_eq!(vm.memory[302], 100);
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn test_add_asymmetry() {
        // op2 is a literal, op1 goes through memory: memory[10] + 3
        let mut vm = Vm::new_default();
        vm.memory[10] = 7;

        run_program(&mut vm, "LOAD #10\nLOAD #3\nADD").unwrap();

        assert_eq!(vm.stack, vec![10]);
    }

    #[test]
    fn test_lone_add_underflows() {
        let mut vm = Vm::new_default();
        let err = run_program(&mut vm, "ADD").unwrap_err();

        assert_eq!(
            err,
            ExecError::StackUnderflow {
                pc: 0,
                mnemonic: "ADD",
            }
        );
        assert_eq!(vm.state, VmState::Faulted);
        assert!(vm.memory.iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_add_with_one_entry_underflows() {
        let mut vm = Vm::new_default();
        let err = run_program(&mut vm, "LOAD #5\nADD").unwrap_err();

        assert!(matches!(err, ExecError::StackUnderflow { pc: 1, .. }));
        // The single entry must not have been consumed
        assert_eq!(vm.stack, vec![5]);
    }

    #[test]
    fn test_lone_store_underflows() {
        let mut vm = Vm::new_default();
        let err = run_program(&mut vm, "STORE 100").unwrap_err();

        assert_eq!(
            err,
            ExecError::StackUnderflow {
                pc: 0,
                mnemonic: "STORE",
            }
        );
        assert_eq!(vm.memory[100], 0);
    }

    #[test]
    fn test_stack_overflow() {
        let mut vm = Vm::new_default();
        let source = "LOAD #1\n".repeat(STACK_CAPACITY + 1);
        let err = run_program(&mut vm, &source).unwrap_err();

        assert_eq!(
            err,
            ExecError::StackOverflow {
                pc: STACK_CAPACITY,
                capacity: STACK_CAPACITY,
            }
        );
        assert_eq!(vm.stack.len(), STACK_CAPACITY);
    }

    #[test]
    fn test_store_address_beyond_small_memory() {
        // Range-legal on the wire, out of bounds for this machine
        let mut vm = Vm::new(100);
        let err = run_program(&mut vm, "LOAD #1\nSTORE 1000").unwrap_err();

        assert_eq!(
            err,
            ExecError::InvalidAddress {
                pc: 1,
                address: 1000,
                size: 100,
            }
        );
    }

    #[test]
    fn test_load_mem_negative_address() {
        let mut vm = Vm::new_default();
        vm.memory[0] = -5;

        // Bare LOAD pops -5 and tries to dereference it
        let err = run_program(&mut vm, "LOAD #0\nLOAD\nLOAD").unwrap_err();

        assert!(matches!(
            err,
            ExecError::InvalidAddress {
                pc: 2,
                address: -5,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_image_rejected() {
        let mut vm = Vm::new_default();
        assert_eq!(
            vm.load(&[0xD9, 0x04, 0x00, 0x44]),
            Err(LoadError::TruncatedImage { len: 4 })
        );
    }

    #[test]
    fn test_unknown_opcode_faults_run() {
        let mut vm = Vm::new_default();
        // A field 0 is unassigned
        vm.load(&[0x00, 0x00, 0x00]).unwrap();
        let err = vm.run().unwrap_err();

        assert!(matches!(err, ExecError::Decode { pc: 0, .. }));
        assert_eq!(vm.state, VmState::Faulted);
    }

    #[test]
    fn test_dump_is_idempotent() {
        let mut vm = Vm::new_default();
        run_program(&mut vm, "LOAD #42\nSTORE 10").unwrap();

        let first = vm.dump(8, 12).unwrap();
        let second = vm.dump(8, 12).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![(8, 0), (9, 0), (10, 42), (11, 0)]);
    }

    #[test]
    fn test_dump_range_errors() {
        let vm = Vm::new(100);
        assert_eq!(
            vm.dump(10, 10),
            Err(DumpError::EmptyRange { start: 10, end: 10 })
        );
        assert_eq!(
            vm.dump(20, 10),
            Err(DumpError::EmptyRange { start: 20, end: 10 })
        );
        assert_eq!(
            vm.dump(50, 200),
            Err(DumpError::OutOfBounds { end: 200, size: 100 })
        );
    }

    #[test]
    fn test_rerun_keeps_memory_and_stack() {
        let mut vm = Vm::new_default();
        run_program(&mut vm, "LOAD #7").unwrap();
        assert_eq!(vm.stack, vec![7]);

        // Second run restarts the counter but not the machine state
        vm.run().unwrap();
        assert_eq!(vm.stack, vec![7, 7]);
        assert_eq!(vm.pc(), 1);
        assert_eq!(vm.state, VmState::Halted);
    }

    #[test]
    fn test_empty_image_halts_immediately() {
        let mut vm = Vm::new_default();
        vm.load(&[]).unwrap();
        vm.run().unwrap();
        assert_eq!(vm.state, VmState::Halted);
        assert_eq!(vm.pc(), 0);
    }
}

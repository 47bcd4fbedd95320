use crate::encoder;
use crate::error::AsmError;
use crate::parser::LineParser;
use crate::types::{
    AssemblerOptions, Instruction, Opcode, Operand, ParsedLine, SymbolTable, INSTRUCTION_SIZE,
};
use log::{debug, trace};

/// Two-pass assembler: pass 1 collects labels at their byte addresses,
/// pass 2 parses mnemonics and operands, then label references are
/// resolved and every operand is range-checked before any encoding.
///
/// The symbol table is local to each `assemble` call, so a single
/// `Assembler` can be reused freely.
pub struct Assembler {
    parser: LineParser,
}

/// Instruction drafted in pass 2, operand not yet resolved.
#[derive(Debug)]
struct Draft {
    opcode: Opcode,
    operand: Option<Operand>,
    address: u32,
    line: usize,
}

impl Assembler {
    pub fn new(options: AssemblerOptions) -> Self {
        Self {
            parser: LineParser::new(options.case_insensitive),
        }
    }

    pub fn assemble(&self, source: &str) -> Result<Vec<Instruction>, AsmError> {
        let lines = self.parser.parse_source(source);

        let symbols = self.collect_labels(&lines)?;
        debug!(
            "pass 1: {} labels over {} significant lines",
            symbols.len(),
            lines.len()
        );

        let drafts = self.parse_instructions(&lines)?;
        debug!("pass 2: {} instructions drafted", drafts.len());

        self.resolve_and_validate(drafts, &symbols)
    }

    pub fn assemble_to_binary(&self, source: &str) -> Result<Vec<u8>, AsmError> {
        let instructions = self.assemble(source)?;

        let mut binary = Vec::with_capacity(instructions.len() * INSTRUCTION_SIZE as usize);
        for instruction in &instructions {
            let bytes = encoder::encode(instruction).map_err(|source| AsmError::Encode {
                address: instruction.address,
                source,
            })?;
            binary.extend_from_slice(&bytes);
        }
        Ok(binary)
    }

    /// Pass 1. Label lines bind the running address and advance
    /// nothing; every other line is counted as one 3-byte slot. No
    /// mnemonic validation happens here.
    fn collect_labels(&self, lines: &[ParsedLine]) -> Result<SymbolTable, AsmError> {
        let mut symbols = SymbolTable::new();
        let mut address = 0u32;

        for line in lines {
            if let Some(name) = &line.label {
                if symbols.insert(name.clone(), address).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line: line.line_number,
                        name: name.clone(),
                    });
                }
                trace!("label `{}` bound to address {}", name, address);
            } else {
                address += INSTRUCTION_SIZE;
            }
        }

        Ok(symbols)
    }

    /// Pass 2. Parse each instruction line into a draft stamped with
    /// its byte address.
    fn parse_instructions(&self, lines: &[ParsedLine]) -> Result<Vec<Draft>, AsmError> {
        let mut drafts = Vec::new();
        let mut address = 0u32;

        for line in lines {
            let mnemonic = match &line.mnemonic {
                Some(m) => m,
                None => continue,
            };

            let (opcode, operand) = match mnemonic.as_str() {
                "LOAD" => match line.operands.as_slice() {
                    // Bare LOAD reads its address from the stack at runtime
                    [] => (Opcode::LoadMem, None),
                    [token] => (
                        Opcode::LoadConst,
                        Some(self.parse_operand(token, line.line_number)?),
                    ),
                    _ => {
                        return Err(AsmError::TooManyOperands {
                            line: line.line_number,
                            mnemonic: mnemonic.clone(),
                        })
                    }
                },
                "STORE" => match line.operands.as_slice() {
                    [] => {
                        return Err(AsmError::MissingOperand {
                            line: line.line_number,
                            mnemonic: mnemonic.clone(),
                        })
                    }
                    [token] => (
                        Opcode::Store,
                        Some(self.parse_operand(token, line.line_number)?),
                    ),
                    _ => {
                        return Err(AsmError::TooManyOperands {
                            line: line.line_number,
                            mnemonic: mnemonic.clone(),
                        })
                    }
                },
                "ADD" => {
                    if !line.operands.is_empty() {
                        return Err(AsmError::TooManyOperands {
                            line: line.line_number,
                            mnemonic: mnemonic.clone(),
                        });
                    }
                    (Opcode::Add, None)
                }
                _ => {
                    return Err(AsmError::UnknownMnemonic {
                        line: line.line_number,
                        mnemonic: mnemonic.clone(),
                    })
                }
            };

            trace!("{:04}: {} <- line {}", address, opcode, line.line_number);
            drafts.push(Draft {
                opcode,
                operand,
                address,
                line: line.line_number,
            });
            address += INSTRUCTION_SIZE;
        }

        Ok(drafts)
    }

    /// Operand precedence: `0x` hex, then decimal (a leading `-` is
    /// accepted here and rejected by range validation), then a
    /// `#`-prefixed literal, then a bare identifier as label reference.
    fn parse_operand(&self, token: &str, line: usize) -> Result<Operand, AsmError> {
        let malformed = || AsmError::MalformedNumber {
            line,
            literal: token.to_string(),
        };

        if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
            let value = i64::from_str_radix(hex, 16).map_err(|_| malformed())?;
            return Ok(Operand::Literal(value));
        }

        if token
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '-')
        {
            let value = token.parse::<i64>().map_err(|_| malformed())?;
            return Ok(Operand::Literal(value));
        }

        if let Some(rest) = token.strip_prefix('#') {
            let value = parse_literal(rest).ok_or_else(malformed)?;
            return Ok(Operand::Literal(value));
        }

        Ok(Operand::Label(token.to_string()))
    }

    /// Label resolution and range validation. Fails on the first
    /// violation; no partial program survives.
    fn resolve_and_validate(
        &self,
        drafts: Vec<Draft>,
        symbols: &SymbolTable,
    ) -> Result<Vec<Instruction>, AsmError> {
        let mut instructions = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let operand = match draft.operand {
                None => None,
                Some(Operand::Literal(value)) => Some(value),
                Some(Operand::Label(name)) => match symbols.get(&name) {
                    Some(address) => Some(*address as i64),
                    None => {
                        return Err(AsmError::UndefinedLabel {
                            line: draft.line,
                            name,
                        })
                    }
                },
            };

            let operand = match operand {
                Some(value) => {
                    let max = draft.opcode.operand_mask();
                    if value < 0 || value > max as i64 {
                        return Err(AsmError::OperandRange {
                            line: draft.line,
                            mnemonic: draft.opcode.mnemonic(),
                            value,
                            max,
                        });
                    }
                    Some(value as u32)
                }
                None => None,
            };

            instructions.push(Instruction::new(draft.opcode, operand, draft.address));
        }

        Ok(instructions)
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(AssemblerOptions::default())
    }
}

/// Decimal-or-hex literal body, as found after a `#` prefix.
fn parse_literal(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        text.parse::<i64>().ok()
    }
}

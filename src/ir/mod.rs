pub mod cfg;
pub mod lower;

use std::fmt;

/// Little Man Computer mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Lda,
    Sta,
    Add,
    Sub,
    Inp,
    Out,
    // Unconditional branch
    Bra,
    // Branch if the accumulator is zero
    Brz,
    // Branch if the accumulator is zero or positive
    Brp,
    Dat,
    Hlt,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lda => "LDA",
            Opcode::Sta => "STA",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Inp => "INP",
            Opcode::Out => "OUT",
            Opcode::Bra => "BRA",
            Opcode::Brz => "BRZ",
            Opcode::Brp => "BRP",
            Opcode::Dat => "DAT",
            Opcode::Hlt => "HLT",
        }
    }

    /// True for instructions that end a block.
    pub fn is_transfer(self) -> bool {
        matches!(self, Opcode::Bra | Opcode::Brz | Opcode::Brp | Opcode::Hlt)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    // Block label, data label, literal for DAT, or empty
    pub operand: String,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: impl Into<String>) -> Self {
        Self {
            opcode,
            operand: operand.into(),
        }
    }
}

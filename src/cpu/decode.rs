//! Instruction decoder for the DCPU-16.
//!
//! Basic instructions are laid out as `bbbbbbaaaaaaoooo`: a 4-bit opcode
//! and two 6-bit operand codes. When the opcode is zero the word holds an
//! extended instruction laid out as `aaaaaaoooooo0000`.

use crate::cpu::registers::Reg;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Addressing mode selected by a 6-bit operand code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// 0x00-0x07: register
    Register(Reg),
    /// 0x08-0x0f: [register]
    Indirect(Reg),
    /// 0x10-0x17: [next word + register]
    Indexed(Reg),
    /// 0x18: [SP++]
    Pop,
    /// 0x19: [SP]
    Peek,
    /// 0x1a: [--SP]
    Push,
    /// 0x1b: SP
    StackPointer,
    /// 0x1c: PC
    ProgramCounter,
    /// 0x1d: O
    Overflow,
    /// 0x1e: [next word]
    IndirectNextWord,
    /// 0x1f: next word (literal stored in the instruction stream)
    NextWord,
    /// 0x20-0x3f: literal 0x00-0x1f
    Literal(u16),
}

impl Operand {
    /// Decode an operand code. Only the low 6 bits are used.
    pub fn from_code(code: u8) -> Self {
        let code = code & 0x3F;
        match code {
            0x00..=0x07 => Operand::Register(Reg::from_index(code)),
            0x08..=0x0F => Operand::Indirect(Reg::from_index(code - 0x08)),
            0x10..=0x17 => Operand::Indexed(Reg::from_index(code - 0x10)),
            0x18 => Operand::Pop,
            0x19 => Operand::Peek,
            0x1A => Operand::Push,
            0x1B => Operand::StackPointer,
            0x1C => Operand::ProgramCounter,
            0x1D => Operand::Overflow,
            0x1E => Operand::IndirectNextWord,
            0x1F => Operand::NextWord,
            _ => Operand::Literal((code - 0x20) as u16),
        }
    }

    /// The 6-bit operand code.
    pub fn code(self) -> u8 {
        match self {
            Operand::Register(r) => r.index() as u8,
            Operand::Indirect(r) => 0x08 + r.index() as u8,
            Operand::Indexed(r) => 0x10 + r.index() as u8,
            Operand::Pop => 0x18,
            Operand::Peek => 0x19,
            Operand::Push => 0x1A,
            Operand::StackPointer => 0x1B,
            Operand::ProgramCounter => 0x1C,
            Operand::Overflow => 0x1D,
            Operand::IndirectNextWord => 0x1E,
            Operand::NextWord => 0x1F,
            Operand::Literal(v) => 0x20 + (v & 0x1F) as u8,
        }
    }

    /// Number of extra instruction words this operand consumes.
    pub fn extra_words(self) -> u16 {
        match self {
            Operand::Indexed(_) | Operand::IndirectNextWord | Operand::NextWord => 1,
            _ => 0,
        }
    }
}

/// Basic (two-operand) opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    And,
    Bor,
    Xor,
    Ife,
    Ifn,
    Ifg,
    Ifb,
}

impl BasicOp {
    pub const SET: u8 = 0x1;
    pub const ADD: u8 = 0x2;
    pub const SUB: u8 = 0x3;
    pub const MUL: u8 = 0x4;
    pub const DIV: u8 = 0x5;
    pub const MOD: u8 = 0x6;
    pub const SHL: u8 = 0x7;
    pub const SHR: u8 = 0x8;
    pub const AND: u8 = 0x9;
    pub const BOR: u8 = 0xA;
    pub const XOR: u8 = 0xB;
    pub const IFE: u8 = 0xC;
    pub const IFN: u8 = 0xD;
    pub const IFG: u8 = 0xE;
    pub const IFB: u8 = 0xF;

    pub fn from_code(code: u8) -> Option<Self> {
        let op = match code {
            Self::SET => BasicOp::Set,
            Self::ADD => BasicOp::Add,
            Self::SUB => BasicOp::Sub,
            Self::MUL => BasicOp::Mul,
            Self::DIV => BasicOp::Div,
            Self::MOD => BasicOp::Mod,
            Self::SHL => BasicOp::Shl,
            Self::SHR => BasicOp::Shr,
            Self::AND => BasicOp::And,
            Self::BOR => BasicOp::Bor,
            Self::XOR => BasicOp::Xor,
            Self::IFE => BasicOp::Ife,
            Self::IFN => BasicOp::Ifn,
            Self::IFG => BasicOp::Ifg,
            Self::IFB => BasicOp::Ifb,
            _ => return None,
        };
        Some(op)
    }

    pub fn code(self) -> u8 {
        match self {
            BasicOp::Set => Self::SET,
            BasicOp::Add => Self::ADD,
            BasicOp::Sub => Self::SUB,
            BasicOp::Mul => Self::MUL,
            BasicOp::Div => Self::DIV,
            BasicOp::Mod => Self::MOD,
            BasicOp::Shl => Self::SHL,
            BasicOp::Shr => Self::SHR,
            BasicOp::And => Self::AND,
            BasicOp::Bor => Self::BOR,
            BasicOp::Xor => Self::XOR,
            BasicOp::Ife => Self::IFE,
            BasicOp::Ifn => Self::IFN,
            BasicOp::Ifg => Self::IFG,
            BasicOp::Ifb => Self::IFB,
        }
    }
}

/// Extended opcode for JSR.
pub const EXT_JSR: u8 = 0x01;

/// Decoded DCPU-16 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Two-operand instruction: `a <- a op b`, or a test for the IFx family.
    Basic { op: BasicOp, a: Operand, b: Operand },

    /// Jump to subroutine: push PC, then PC := a
    Jsr { a: Operand },
}

impl Instruction {
    /// Total length in words, including extra operand words.
    pub fn word_count(&self) -> u16 {
        match self {
            Instruction::Basic { a, b, .. } => 1 + a.extra_words() + b.extra_words(),
            Instruction::Jsr { a } => 1 + a.extra_words(),
        }
    }
}

/// Decode a single instruction word.
///
/// Extra operand words are not part of the decoded value; they are
/// consumed from the instruction stream when the operand is resolved.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let opcode = (word & 0xF) as u8;

    if opcode == 0 {
        let ext = ((word >> 4) & 0x3F) as u8;
        let a = Operand::from_code(((word >> 10) & 0x3F) as u8);
        return match ext {
            EXT_JSR => Ok(Instruction::Jsr { a }),
            _ => Err(DecodeError::InvalidExtendedOpcode(ext)),
        };
    }

    let a = Operand::from_code(((word >> 4) & 0x3F) as u8);
    let b = Operand::from_code(((word >> 10) & 0x3F) as u8);
    let op = BasicOp::from_code(opcode).ok_or(DecodeError::InvalidOpcode(opcode))?;

    Ok(Instruction::Basic { op, a, b })
}

/// Number of words an instruction word occupies, for skipping.
///
/// Invalid instructions count as a single word.
pub fn instruction_len(word: u16) -> u16 {
    decode(word).map(|i| i.word_count()).unwrap_or(1)
}

/// Encode an instruction back to its instruction word.
pub fn encode(instr: &Instruction) -> u16 {
    match instr {
        Instruction::Basic { op, a, b } => {
            op.code() as u16 | (a.code() as u16) << 4 | (b.code() as u16) << 10
        }
        Instruction::Jsr { a } => (EXT_JSR as u16) << 4 | (a.code() as u16) << 10,
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    #[error("invalid extended opcode: {0:#04x}")]
    InvalidExtendedOpcode(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_set_a_next_word() {
        // SET A, 0x30 from the DCPU-16 reference program
        let instr = decode(0x7C01).unwrap();
        assert_eq!(
            instr,
            Instruction::Basic {
                op: BasicOp::Set,
                a: Operand::Register(Reg::A),
                b: Operand::NextWord,
            }
        );
        assert_eq!(instr.word_count(), 2);
    }

    #[test]
    fn test_decode_jsr() {
        // JSR 0x18 (next word)
        assert_eq!(decode(0x7C10).unwrap(), Instruction::Jsr { a: Operand::NextWord });
    }

    #[test]
    fn test_decode_invalid_extended() {
        assert_eq!(decode(0x0000), Err(DecodeError::InvalidExtendedOpcode(0)));
        assert_eq!(decode(0x0020), Err(DecodeError::InvalidExtendedOpcode(2)));
        assert_eq!(instruction_len(0x0000), 1);
    }

    #[test]
    fn test_operand_codes() {
        for code in 0u8..0x40 {
            assert_eq!(Operand::from_code(code).code(), code);
        }
        assert_eq!(Operand::from_code(0x10), Operand::Indexed(Reg::A));
        assert_eq!(Operand::from_code(0x3F), Operand::Literal(0x1F));
        // Out-of-range codes are masked.
        assert_eq!(Operand::from_code(0x41), Operand::Register(Reg::B));
    }

    #[test]
    fn test_every_basic_opcode_decodes() {
        for code in 1u8..=0xF {
            let op = BasicOp::from_code(code).unwrap();
            assert_eq!(op.code(), code);
        }
        assert_eq!(BasicOp::from_code(0), None);
    }

    #[test]
    fn test_instruction_len_with_two_extra_words() {
        // SET [0x1000+I], [0x2000]
        let word = encode(&Instruction::Basic {
            op: BasicOp::Set,
            a: Operand::Indexed(Reg::I),
            b: Operand::IndirectNextWord,
        });
        assert_eq!(instruction_len(word), 3);
    }
}

//! CPU emulation for the DCPU-16.
//!
//! This module implements the complete DCPU-16 core:
//! - 0x10000 sixteen-bit memory words
//! - 8 general-purpose registers plus SP, PC and O (overflow)
//! - 15 basic opcodes and the JSR extended opcode
//! - operand resolution for all 64 addressing codes

pub mod memory;
pub mod registers;
pub mod decode;
pub mod operand;
pub mod execute;

pub use memory::Memory;
pub use registers::{Reg, Registers};
pub use decode::{Instruction, BasicOp, Operand, DecodeError};
pub use operand::Slot;
pub use execute::{Cpu, CpuError, CpuState, Step};

//! # DCPU-16 Emulator
//!
//! An emulator of the DCPU-16, a 16-bit word-addressed virtual CPU.
//!
//! The core is a single synchronous state machine: [`Cpu::step`] fetches
//! one instruction, resolves its operands and applies it. Program loading
//! and pacing are left to the driving loop; the [`image`] module and the
//! `dcpu16-emu` binary provide one.

pub mod config;
pub mod cpu;
pub mod image;

// Re-export commonly used types
pub use config::{CpuConfig, SkipPolicy, ConfigError};
pub use cpu::{Cpu, CpuState, CpuError, Step, Memory, Registers, Reg, Instruction, Operand, Slot};
pub use image::{load_image, save_hex, parse_hex, parse_bin, ImageError, SAMPLE_PROGRAM};

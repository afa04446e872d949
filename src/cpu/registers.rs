//! DCPU-16 register file.
//!
//! The DCPU-16 has 8 general-purpose registers (A, B, C, X, Y, Z, I, J)
//! and three special registers:
//! - SP: stack pointer, grows toward lower addresses
//! - PC: program counter
//! - O: overflow, holds the high bits of the last arithmetic result

use serde::{Serialize, Deserialize};
use std::ops::{Index, IndexMut};

/// A general-purpose register name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reg {
    A,
    B,
    C,
    X,
    Y,
    Z,
    I,
    J,
}

impl Reg {
    /// All registers in encoding order.
    pub const ALL: [Reg; 8] = [Reg::A, Reg::B, Reg::C, Reg::X, Reg::Y, Reg::Z, Reg::I, Reg::J];

    /// Register for a 3-bit index. Only the low 3 bits are used.
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0x7) as usize]
    }

    /// Encoding index (0-7).
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Reg::A => "A",
            Reg::B => "B",
            Reg::C => "C",
            Reg::X => "X",
            Reg::Y => "Y",
            Reg::Z => "Z",
            Reg::I => "I",
            Reg::J => "J",
        }
    }
}

/// The DCPU-16 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// General-purpose registers, indexed by [`Reg`].
    pub gp: [u16; 8],

    /// SP: stack pointer
    pub sp: u16,

    /// PC: program counter
    pub pc: u16,

    /// O: overflow
    pub o: u16,
}

impl Registers {
    /// Stack pointer value after initialization.
    pub const INITIAL_SP: u16 = 0xFFFF;

    /// Create a register file in its power-on state.
    pub fn new() -> Self {
        Self {
            gp: [0; 8],
            sp: Self::INITIAL_SP,
            pc: 0,
            o: 0,
        }
    }

    /// Reset all registers to their power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Increment the program counter by 1, wrapping at 0x10000.
    /// Returns the old value.
    #[inline]
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }

    /// Decrement SP and return the new value (push target).
    #[inline]
    pub fn push_sp(&mut self) -> u16 {
        self.sp = self.sp.wrapping_sub(1);
        self.sp
    }

    /// Return SP and increment it (pop source).
    #[inline]
    pub fn pop_sp(&mut self) -> u16 {
        let old = self.sp;
        self.sp = self.sp.wrapping_add(1);
        old
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Reg> for Registers {
    type Output = u16;

    fn index(&self, reg: Reg) -> &u16 {
        &self.gp[reg.index()]
    }
}

impl IndexMut<Reg> for Registers {
    fn index_mut(&mut self, reg: Reg) -> &mut u16 {
        &mut self.gp[reg.index()]
    }
}

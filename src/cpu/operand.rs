//! Operand resolution.
//!
//! Turns a decoded [`Operand`] into a [`Slot`]: a location that can be read
//! and written. Resolving may consume an instruction word (advancing PC) or
//! move the stack pointer, so operands must be resolved exactly once, in
//! decode order (a first, then b).

use crate::cpu::decode::Operand;
use crate::cpu::registers::Reg;
use crate::cpu::Cpu;

/// A resolved storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Register(Reg),
    StackPointer,
    ProgramCounter,
    Overflow,
    Memory(u16),
    /// Immediate constant. Writes are silently discarded.
    Literal(u16),
}

impl Slot {
    /// Resolve an operand against the current machine state.
    ///
    /// Side effects happen here, not on read/write: `[next word]` forms
    /// advance PC, POP post-increments SP and PUSH pre-decrements it.
    pub fn resolve(cpu: &mut Cpu, operand: Operand) -> Slot {
        match operand {
            Operand::Register(r) => Slot::Register(r),
            Operand::Indirect(r) => Slot::Memory(cpu.regs[r]),
            Operand::Indexed(r) => {
                let offset = cpu.next_word();
                Slot::Memory(offset.wrapping_add(cpu.regs[r]))
            }
            Operand::Pop => Slot::Memory(cpu.regs.pop_sp()),
            Operand::Peek => Slot::Memory(cpu.regs.sp),
            Operand::Push => Slot::Memory(cpu.regs.push_sp()),
            Operand::StackPointer => Slot::StackPointer,
            Operand::ProgramCounter => Slot::ProgramCounter,
            Operand::Overflow => Slot::Overflow,
            Operand::IndirectNextWord => {
                let addr = cpu.next_word();
                Slot::Memory(addr)
            }
            // The literal lives in the instruction stream, so the slot is
            // that memory word itself.
            Operand::NextWord => Slot::Memory(cpu.regs.advance_pc()),
            Operand::Literal(v) => Slot::Literal(v),
        }
    }

    /// Resolve a raw 6-bit operand code.
    pub fn resolve_code(cpu: &mut Cpu, code: u8) -> Slot {
        Self::resolve(cpu, Operand::from_code(code))
    }

    pub fn read(self, cpu: &Cpu) -> u16 {
        match self {
            Slot::Register(r) => cpu.regs[r],
            Slot::StackPointer => cpu.regs.sp,
            Slot::ProgramCounter => cpu.regs.pc,
            Slot::Overflow => cpu.regs.o,
            Slot::Memory(addr) => cpu.mem.read(addr),
            Slot::Literal(v) => v,
        }
    }

    pub fn write(self, cpu: &mut Cpu, value: u16) {
        match self {
            Slot::Register(r) => cpu.regs[r] = value,
            Slot::StackPointer => cpu.regs.sp = value,
            Slot::ProgramCounter => cpu.regs.pc = value,
            Slot::Overflow => cpu.regs.o = value,
            Slot::Memory(addr) => cpu.mem.write(addr, value),
            Slot::Literal(_) => {}
        }
    }
}

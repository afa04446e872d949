//! CPU execution engine for the DCPU-16.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::config::{CpuConfig, SkipPolicy};
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, BasicOp, Instruction, DecodeError};
use crate::cpu::memory::MemoryError;
use crate::cpu::operand::Slot;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (hit an undefined extended opcode).
    Halted,
}

/// What a single call to [`Cpu::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction was executed.
    Executed(Instruction),
    /// The skip flag was consumed; `words` is how far PC moved.
    Skipped { words: u16 },
    /// Unrecognized basic opcode. Nothing happened beyond the fetch.
    Ignored { word: u16 },
    /// Undefined extended opcode. The CPU is now halted.
    Halted { word: u16 },
}

/// Result of a basic op: a value for operand a, or an IFx outcome.
enum Effect {
    Store(u16),
    Test(bool),
}

/// The DCPU-16 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// When set, the next step skips an instruction instead of running it.
    pub skip: bool,
    /// Step count (for profiling).
    pub cycles: u64,
    /// Compatibility settings.
    pub config: CpuConfig,
    /// Last executed instruction (for inspection).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU in its power-on state.
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    /// Create a new CPU with the given configuration.
    pub fn with_config(config: CpuConfig) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            skip: false,
            cycles: 0,
            config,
            last_instr: None,
        }
    }

    /// Reset the CPU to its power-on state. Configuration is kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.skip = false;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[u16]) -> Result<(), CpuError> {
        self.mem.load_program(0, program)?;
        Ok(())
    }

    /// Fetch the word at PC and advance PC.
    #[inline]
    pub(crate) fn next_word(&mut self) -> u16 {
        let pc = self.regs.advance_pc();
        self.mem.read(pc)
    }

    /// Execute a single instruction slot.
    ///
    /// Undefined extended opcodes halt the CPU and return `Step::Halted`;
    /// they are not reported as errors. Stepping a halted CPU is an error.
    pub fn step(&mut self) -> Result<Step, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        self.cycles += 1;

        if self.skip {
            self.skip = false;
            let words = match self.config.skip_policy {
                SkipPolicy::WholeInstruction => decode::instruction_len(self.mem.read(self.regs.pc)),
                SkipPolicy::InstructionWord => 1,
                SkipPolicy::NoFetch => 0,
            };
            self.regs.pc = self.regs.pc.wrapping_add(words);
            return Ok(Step::Skipped { words });
        }

        // Fetch
        let pc = self.regs.pc;
        let word = self.next_word();

        // Decode
        let instr = match decode::decode(word) {
            Ok(instr) => instr,
            Err(DecodeError::InvalidExtendedOpcode(op)) => {
                log::warn!("halt: undefined extended opcode {:#04x} at {:#06x}", op, pc);
                self.state = CpuState::Halted;
                return Ok(Step::Halted { word });
            }
            Err(DecodeError::InvalidOpcode(op)) => {
                log::warn!("ignoring unexpected opcode {:#x} at {:#06x}", op, pc);
                return Ok(Step::Ignored { word });
            }
        };

        log::trace!("{:#06x}: {:?}", pc, instr);

        // Execute
        self.execute(instr);
        self.last_instr = Some(instr);

        Ok(Step::Executed(instr))
    }

    /// Run until halt.
    ///
    /// Returns the number of steps executed. Never returns if the program
    /// does not halt; see [`Cpu::run_limited`].
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        log::debug!("halted after {} steps", self.cycles - start_cycles);
        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` steps.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) {
        match instr {
            Instruction::Jsr { a } => {
                let target = Slot::resolve(self, a).read(self);
                let sp = self.regs.push_sp();
                self.mem.write(sp, self.regs.pc);
                self.regs.pc = target;
            }
            Instruction::Basic { op, a, b } => {
                let slot_a = Slot::resolve(self, a);
                let slot_b = Slot::resolve(self, b);
                let va = slot_a.read(self);
                let vb = slot_b.read(self);

                match self.alu(op, va, vb) {
                    Effect::Store(result) => slot_a.write(self, result),
                    Effect::Test(holds) => self.skip = !holds,
                }
            }
        }
    }

    /// Compute a basic op, updating O where the op defines it.
    fn alu(&mut self, op: BasicOp, a: u16, b: u16) -> Effect {
        let result = match op {
            BasicOp::Set => b,

            BasicOp::Add => {
                let sum = a as u32 + b as u32;
                self.regs.o = (sum >> 16) as u16;
                sum as u16
            }

            BasicOp::Sub => {
                // 0xFFFF on borrow, 0 otherwise.
                let diff = (a as u32).wrapping_sub(b as u32);
                self.regs.o = (diff >> 16) as u16;
                diff as u16
            }

            BasicOp::Mul => {
                let product = a as u32 * b as u32;
                self.regs.o = (product >> 16) as u16;
                product as u16
            }

            BasicOp::Div => {
                if b == 0 {
                    self.regs.o = 0;
                    0
                } else {
                    self.regs.o = (((a as u32) << 16) / b as u32) as u16;
                    if self.config.legacy_div {
                        (a / b).wrapping_mul(0xFFFF)
                    } else {
                        a / b
                    }
                }
            }

            BasicOp::Mod => {
                if b == 0 { 0 } else { a % b }
            }

            BasicOp::Shl => {
                let wide = (a as u64).checked_shl(b as u32).unwrap_or(0);
                self.regs.o = (wide >> 16) as u16;
                wide as u16
            }

            BasicOp::Shr => {
                let wide = ((a as u64) << 16).checked_shr(b as u32).unwrap_or(0);
                self.regs.o = wide as u16;
                (wide >> 16) as u16
            }

            BasicOp::And => a & b,
            BasicOp::Bor => a | b,
            BasicOp::Xor => a ^ b,

            // The next instruction runs only when the test holds.
            BasicOp::Ife => return Effect::Test(a == b),
            BasicOp::Ifn => return Effect::Test(a != b),
            BasicOp::Ifg => return Effect::Test(a > b),
            BasicOp::Ifb => return Effect::Test((a & b) != 0),
        };
        Effect::Store(result)
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Serialize the full machine state as JSON.
    pub fn to_json(&self) -> Result<String, CpuError> {
        serde_json::to_string(self).map_err(|e| CpuError::Snapshot(e.to_string()))
    }

    /// Restore a machine from a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, CpuError> {
        serde_json::from_str(json).map_err(|e| CpuError::Snapshot(e.to_string()))
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("skip", &self.skip)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

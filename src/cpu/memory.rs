//! DCPU-16 memory subsystem.
//!
//! A flat array of 0x10000 sixteen-bit words. Addresses are `u16`, so
//! every access wraps at the addressable boundary.

use serde::{Serialize, Deserialize};

/// The number of addressable words.
pub const MEMORY_SIZE: usize = 0x10000;

/// DCPU-16 memory: 65536 words.
///
/// Serializes as a plain word array; deserializing rejects any other length.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>", into = "Vec<u16>")]
pub struct Memory {
    cells: Vec<u16>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        self.cells[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        self.cells[addr as usize] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a program into memory starting at the given address.
    ///
    /// Programs do not wrap past the end of memory.
    pub fn load_program(&mut self, start_addr: u16, program: &[u16]) -> Result<(), MemoryError> {
        let start = start_addr as usize;
        if start + program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE - start,
            });
        }

        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for inspection).
    pub fn dump(&self, start: u16, count: usize) -> Vec<(u16, u16)> {
        let start = start as usize;
        let end = (start + count).min(MEMORY_SIZE);
        (start..end)
            .map(|i| (i as u16, self.cells[i]))
            .collect()
    }

    /// Raw view of every cell.
    pub fn as_slice(&self) -> &[u16] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 64K words is too much to print; summarize instead.
        let non_zero = self.cells.iter().filter(|&&w| w != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

impl TryFrom<Vec<u16>> for Memory {
    type Error = MemoryError;

    fn try_from(cells: Vec<u16>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryError::WrongSize(cells.len()));
        }
        Ok(Self { cells })
    }
}

impl From<Memory> for Vec<u16> {
    fn from(mem: Memory) -> Self {
        mem.cells
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Program is too large to fit in memory.
    ProgramTooLarge { size: usize, available: usize },
    /// Memory image does not have exactly `MEMORY_SIZE` words.
    WrongSize(usize),
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::ProgramTooLarge { size, available } => {
                write!(f, "program size {} exceeds available space {}", size, available)
            }
            MemoryError::WrongSize(len) => {
                write!(f, "memory image has {} words, expected {}", len, MEMORY_SIZE)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write(0x8000, 0xBEEF);
        assert_eq!(mem.read(0x8000), 0xBEEF);
        assert_eq!(mem.read(0x8001), 0);
    }

    #[test]
    fn test_memory_top_address() {
        let mut mem = Memory::new();
        mem.write(0xFFFF, 7);
        assert_eq!(mem.read(0xFFFF), 7);
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.load_program(0x10, &[1, 2, 3]).unwrap();

        assert_eq!(mem.dump(0x10, 3), vec![(0x10, 1), (0x11, 2), (0x12, 3)]);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let err = mem.load_program(0xFFFE, &[1, 2, 3]).unwrap_err();
        assert_eq!(err, MemoryError::ProgramTooLarge { size: 3, available: 2 });
    }

    #[test]
    fn test_deserialize_checks_size() {
        let short = serde_json::from_str::<Memory>("[1, 2, 3]");
        assert!(short.is_err());

        let mut mem = Memory::new();
        mem.write(0xFFFF, 9);
        let json = serde_json::to_string(&mem).unwrap();
        let restored: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.read(0xFFFF), 9);
    }

    #[test]
    fn test_try_from_vec() {
        assert_eq!(Memory::try_from(vec![0; 10]).unwrap_err(), MemoryError::WrongSize(10));
        assert!(Memory::try_from(vec![0; MEMORY_SIZE]).is_ok());
    }

    #[test]
    fn test_clear() {
        let mut mem = Memory::new();
        mem.write(42, 42);
        mem.clear();
        assert!(mem.as_slice().iter().all(|&w| w == 0));
    }
}

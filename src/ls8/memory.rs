// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::MachineError;

// The LS-8 has a single flat 256 byte address space. Program code, data and
// the stack all share it.
pub const MEMORY_SIZE: usize = 0x100;

// Highest addressable byte.
pub const MAX_ADDR: usize = MEMORY_SIZE - 1;

/// Flat byte addressable RAM. Every access is bounds checked and an address
/// outside of 0x00..=0xFF is reported as a fault rather than wrapped.
pub struct Memory {
    ram: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            ram: [0; MEMORY_SIZE],
        }
    }

    /// Reads the byte located at the given address.
    #[inline(always)]
    pub fn read_u8(&self, addr: usize) -> Result<u8, MachineError> {
        match self.ram.get(addr) {
            Some(value) => Ok(*value),
            None => Err(MachineError::OutOfBoundsAccess { address: addr as isize }),
        }
    }

    /// Writes a byte to the given address.
    #[inline(always)]
    pub fn write_u8(&mut self, addr: usize, val: u8) -> Result<(), MachineError> {
        match self.ram.get_mut(addr) {
            Some(cell) => {
                *cell = val;
                Ok(())
            }
            None => Err(MachineError::OutOfBoundsAccess { address: addr as isize }),
        }
    }

    /// Copies a program image into memory starting at the given address. The
    /// whole image must fit, nothing is written otherwise.
    pub fn load(&mut self, bytes: &[u8], start: usize) -> Result<(), MachineError> {
        let end = start + bytes.len();
        if end > MEMORY_SIZE {
            return Err(MachineError::OutOfBoundsAccess { address: MEMORY_SIZE as isize });
        }
        self.ram[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Returns a view of `len` bytes starting at `start`, used by the debugger
    /// to print memory.
    pub fn dump(&self, start: usize, len: usize) -> Result<&[u8], MachineError> {
        if start > MAX_ADDR {
            return Err(MachineError::OutOfBoundsAccess { address: start as isize });
        }
        match start.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(&self.ram[start..end]),
            _ => Err(MachineError::OutOfBoundsAccess { address: MEMORY_SIZE as isize }),
        }
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back_written_byte() {
        let mut memory = Memory::new();
        memory.write_u8(0xF3, 0x2A).unwrap();
        assert_eq!(memory.read_u8(0xF3).unwrap(), 0x2A);
        assert_eq!(memory.read_u8(0xF4).unwrap(), 0);
    }

    #[test]
    fn access_past_top_of_memory_faults() {
        let mut memory = Memory::new();
        assert!(memory.read_u8(MAX_ADDR).is_ok());
        match memory.read_u8(MEMORY_SIZE) {
            Err(MachineError::OutOfBoundsAccess { address }) => assert_eq!(address, 0x100),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(memory.write_u8(0x1FF, 1).is_err());
    }

    #[test]
    fn load_places_image_at_start_address() {
        let mut memory = Memory::new();
        memory.load(&[1, 2, 3], 0x10).unwrap();
        assert_eq!(memory.dump(0x0F, 5).unwrap(), &[0, 1, 2, 3, 0]);
    }

    #[test]
    fn load_rejects_oversized_image() {
        let mut memory = Memory::new();
        let image = vec![0xFF; MEMORY_SIZE + 1];
        assert!(memory.load(&image, 0).is_err());
        assert!(memory.load(&[1, 2], 0xFF).is_err());
        // Nothing from the rejected image was written.
        assert_eq!(memory.read_u8(0xFF).unwrap(), 0);
        assert!(memory.load(&vec![7; MEMORY_SIZE], 0).is_ok());
    }

    #[test]
    fn dump_is_bounds_checked() {
        let memory = Memory::new();
        assert_eq!(memory.dump(0xF0, 0x10).unwrap().len(), 0x10);
        assert!(memory.dump(0xF0, 0x11).is_err());
        assert!(memory.dump(0x100, 0).is_err());
        assert!(memory.dump(1, usize::max_value()).is_err());
    }
}

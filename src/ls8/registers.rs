// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::MachineError;
use std::cmp::Ordering;

pub const REGISTER_COUNT: usize = 8;

// R7 is reserved as the stack pointer.
pub const SP: usize = 7;

// Where the stack pointer starts. The stack grows down from here and the
// bytes above it are left free for the program.
pub const STACK_START: u8 = 0xF4;

// Flag constants that allow easy bitwise getting and setting of flag values.
pub const EQUAL_FLAG  : u8 = 0b001;
pub const GREATER_FLAG: u8 = 0b010;
pub const LESS_FLAG   : u8 = 0b100;

/// The eight general purpose registers plus the flags register.
///
/// Registers are a byte wide. The flags register only ever has one of its
/// three low bits set, recording the outcome of the last CMP.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFile {
    r: [u8; REGISTER_COUNT],
    pub fl: u8,
}

impl RegisterFile {
    pub fn new() -> RegisterFile {
        let mut r = [0; REGISTER_COUNT];
        r[SP] = STACK_START;
        RegisterFile { r: r, fl: 0 }
    }

    /// Reads a register by its operand encoding.
    #[inline(always)]
    pub fn get(&self, register: u8) -> Result<u8, MachineError> {
        match self.r.get(register as usize) {
            Some(value) => Ok(*value),
            None => Err(MachineError::InvalidRegister { register: register }),
        }
    }

    /// Writes a register by its operand encoding.
    #[inline(always)]
    pub fn set(&mut self, register: u8, value: u8) -> Result<(), MachineError> {
        match self.r.get_mut(register as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MachineError::InvalidRegister { register: register }),
        }
    }

    #[inline(always)]
    pub fn sp(&self) -> u8 {
        self.r[SP]
    }

    #[inline(always)]
    pub fn set_sp(&mut self, value: u8) {
        self.r[SP] = value;
    }

    /// Copy of all eight registers, used for trace snapshots.
    pub fn snapshot(&self) -> [u8; REGISTER_COUNT] {
        self.r
    }

    /// Records the outcome of a comparison. The previous flags are cleared so
    /// exactly one bit is set afterwards.
    pub fn compare(&mut self, a: u8, b: u8) {
        self.fl = match a.cmp(&b) {
            Ordering::Equal => EQUAL_FLAG,
            Ordering::Greater => GREATER_FLAG,
            Ordering::Less => LESS_FLAG,
        };
    }

    #[inline(always)]
    pub fn equal_flag_set(&self) -> bool {
        self.fl & EQUAL_FLAG == EQUAL_FLAG
    }

    #[inline(always)]
    pub fn greater_flag_set(&self) -> bool {
        self.fl & GREATER_FLAG == GREATER_FLAG
    }

    #[inline(always)]
    pub fn less_flag_set(&self) -> bool {
        self.fl & LESS_FLAG == LESS_FLAG
    }
}

impl Default for RegisterFile {
    fn default() -> RegisterFile {
        RegisterFile::new()
    }
}

// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error;
use std::fmt;
use std::io::Error as IoError;

// Exit codes used throughout the application. These exit codes have specific
// meanings and are used when no OS error codes are available.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // Generic error, bad usage.
pub const EXIT_HALTED: i32 = 1; // The program executed HLT.
pub const EXIT_PROGRAM_NOT_FOUND: i32 = 2;
pub const EXIT_INVALID_PROGRAM: i32 = 3;
pub const EXIT_RUNTIME_FAILURE: i32 = 101;

/// Faults raised while the machine is executing. Any of these stops the
/// dispatcher for good.
#[derive(Debug)]
pub enum MachineError {
    // The byte under the program counter is not in the instruction table.
    InvalidInstruction { opcode: u8, pc: usize },

    // A read or write outside of 0x00..=0xFF, including stack pointer
    // under/overflow. Signed so a push below address 0 can be reported.
    OutOfBoundsAccess { address: isize },

    // A register operand that doesn't name one of R0-R7.
    InvalidRegister { register: u8 },

    // The PRN output sink failed.
    Output(IoError),
}

impl MachineError {
    /// Process exit code the command-line wrapper reports for this fault.
    pub fn exit_code(&self) -> i32 {
        EXIT_RUNTIME_FAILURE
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MachineError::InvalidInstruction { opcode, pc } => {
                write!(f, "invalid instruction {:#04X} at address {:#04X}", opcode, pc)
            }
            MachineError::OutOfBoundsAccess { address } => {
                write!(f, "memory access out of bounds at address {}", address)
            }
            MachineError::InvalidRegister { register } => {
                write!(f, "invalid register R{}", register)
            }
            MachineError::Output(ref e) => write!(f, "unable to write output: {}", e),
        }
    }
}

impl Error for MachineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            MachineError::Output(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for MachineError {
    fn from(e: IoError) -> MachineError {
        MachineError::Output(e)
    }
}

/// Errors raised while reading a program file, before anything executes.
#[derive(Debug)]
pub enum LoadError {
    NotFound { path: String },
    Io(IoError),

    // A line that isn't an 8 digit binary literal once comments and
    // whitespace are stripped. Lines are numbered from 1.
    MalformedProgramLine { line: usize, text: String },

    // The program has more bytes than the machine has memory.
    ProgramTooLarge { size: usize },
}

impl LoadError {
    pub fn exit_code(&self) -> i32 {
        match *self {
            LoadError::NotFound { .. } => EXIT_PROGRAM_NOT_FOUND,
            LoadError::Io(_) => EXIT_FAILURE,
            LoadError::MalformedProgramLine { .. } | LoadError::ProgramTooLarge { .. } => {
                EXIT_INVALID_PROGRAM
            }
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LoadError::NotFound { ref path } => write!(f, "{} not found", path),
            LoadError::Io(ref e) => write!(f, "unable to read program: {}", e),
            LoadError::MalformedProgramLine { line, ref text } => {
                write!(f, "line {}: '{}' is not an 8-bit binary literal", line, text)
            }
            LoadError::ProgramTooLarge { size } => {
                write!(f, "program is {} bytes and does not fit in memory", size)
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            LoadError::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

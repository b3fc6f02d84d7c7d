// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::MachineError;
use ls8::instruction::{self, Context, Instruction, PcUpdate};
use ls8::memory::Memory;
use ls8::opcode;
use ls8::output::OutputSink;
use ls8::registers::{RegisterFile, REGISTER_COUNT};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted,
    Faulted,
}

/// The LS-8 processor: the register file, the program counter and the
/// dispatcher that drives the fetch, decode and execute cycle.
pub struct CPU {
    // The program counter points to the next instruction to be executed. It
    // is advanced by the size of each instruction unless the instruction
    // transfers control itself (CALL, RET, JMP and taken JEQ/JNE).
    //
    // It is wider than a byte so running off the end of memory is caught as
    // a fault on the next fetch instead of wrapping to 0x00.
    pub pc: usize,

    // R0-R7 plus the flags register. R7 doubles as the stack pointer.
    pub registers: RegisterFile,

    pub state: RunState,

    // Number of instructions executed so far.
    pub steps: u64,
}

impl CPU {
    pub fn new() -> CPU {
        CPU {
            pc: 0,
            registers: RegisterFile::new(),
            state: RunState::Running,
            steps: 0,
        }
    }

    /// Fetches the instruction under the program counter and executes it.
    /// Returns the state the CPU is in afterwards. Once halted or faulted the
    /// CPU stays that way and further steps do nothing.
    ///
    /// Any error moves the CPU to `Faulted` before it's returned.
    pub fn step(&mut self, memory: &mut Memory, output: &mut dyn OutputSink) -> Result<RunState, MachineError> {
        if self.state != RunState::Running {
            return Ok(self.state);
        }

        match self.execute(memory, output) {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(e) => {
                self.state = RunState::Faulted;
                Err(e)
            }
        }
    }

    /// Steps until the program halts or faults.
    pub fn run(&mut self, memory: &mut Memory, output: &mut dyn OutputSink) -> Result<(), MachineError> {
        while self.step(memory, output)? == RunState::Running {}
        Ok(())
    }

    fn execute(&mut self, memory: &mut Memory, output: &mut dyn OutputSink) -> Result<RunState, MachineError> {
        let byte = memory.read_u8(self.pc)?;
        let def = match instruction::lookup(byte) {
            Some(def) => def,
            None => return Err(MachineError::InvalidInstruction { opcode: byte, pc: self.pc }),
        };
        let Instruction(_, a, b) = Instruction::fetch(self.pc, memory)?;

        let update = {
            let mut ctx = Context {
                registers: &mut self.registers,
                memory: memory,
                output: output,
                pc: self.pc,
            };
            (def.handler)(&mut ctx, a, b)?
        };
        self.steps += 1;

        match update {
            PcUpdate::Halt => return Ok(RunState::Halted),
            PcUpdate::Jump(addr) => {
                debug_assert!(opcode::sets_pc(byte));
                self.pc = addr as usize;
            }
            PcUpdate::Advance(_) => {}
        }
        self.pc += update.increment() as usize;
        Ok(RunState::Running)
    }

    /// Snapshot of the PC, the bytes under it and the registers. Has no effect
    /// on the machine; bytes past the end of memory show up as zero.
    pub fn trace(&self, memory: &Memory) -> Trace {
        let mut next_bytes = [0; 3];
        for (i, byte) in next_bytes.iter_mut().enumerate() {
            *byte = memory.read_u8(self.pc + i).unwrap_or(0);
        }
        Trace {
            pc: self.pc,
            next_bytes: next_bytes,
            registers: self.registers.snapshot(),
        }
    }

    /// Returns "SET" if the passed boolean is true, otherwise "UNSET". This
    /// function is used to display flags when the CPU crashes.
    fn fmt_flag(flag: bool) -> &'static str {
        if flag { "SET" } else { "UNSET" }
    }
}

impl Default for CPU {
    fn default() -> CPU {
        CPU::new()
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\nCPU State ({:?}):", self.state)?;
        writeln!(f, "    Program Counter: {:#04X}", self.pc)?;
        writeln!(f, "    Steps:           {}", self.steps)?;
        for (i, value) in self.registers.snapshot().iter().enumerate() {
            writeln!(f, "    R{}:              {:#04X}", i, value)?;
        }
        writeln!(f)?;
        writeln!(f, "Flags Register: {:#05b}", self.registers.fl)?;
        writeln!(f, "    Equal:        {}", CPU::fmt_flag(self.registers.equal_flag_set()))?;
        writeln!(f, "    Greater Than: {}", CPU::fmt_flag(self.registers.greater_flag_set()))?;
        write!(f, "    Less Than:    {}", CPU::fmt_flag(self.registers.less_flag_set()))
    }
}

/// Machine state captured for debugging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trace {
    pub pc: usize,
    pub next_bytes: [u8; 3],
    pub registers: [u8; REGISTER_COUNT],
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
               self.pc, self.next_bytes[0], self.next_bytes[1], self.next_bytes[2])?;
        for value in self.registers.iter() {
            write!(f, " {:02X}", value)?;
        }
        Ok(())
    }
}

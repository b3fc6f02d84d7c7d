// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::{LoadError, MachineError, EXIT_HALTED, EXIT_SUCCESS};
use io::log;
use ls8::cpu::{CPU, RunState, Trace};
use ls8::instruction::Instruction;
use ls8::memory::{Memory, MEMORY_SIZE};
use ls8::output::OutputSink;

// Programs are always loaded at the bottom of memory, execution starts there.
const PROGRAM_START: usize = 0x0;

/// Options passed from the command-line that influence how the machine
/// behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    // Log machine events to stderr.
    pub verbose: bool,

    // Log a trace line before every instruction (needs verbose).
    pub trace: bool,

    // Start the interactive debugger instead of running freely.
    pub debug: bool,
}

/// A complete LS-8: CPU, memory and the sink PRN writes to.
pub struct Machine<O: OutputSink> {
    pub runtime_options: RuntimeOptions,
    cpu: CPU,
    memory: Memory,
    output: O,
}

impl<O: OutputSink> Machine<O> {
    pub fn new(runtime_options: RuntimeOptions, output: O) -> Machine<O> {
        Machine {
            runtime_options: runtime_options,
            cpu: CPU::new(),
            memory: Memory::new(),
            output: output,
        }
    }

    /// Copies a program into memory at address 0x00.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if self.memory.load(program, PROGRAM_START).is_err() {
            return Err(LoadError::ProgramTooLarge { size: program.len() });
        }
        log::log("machine", format!("Loaded {} of {} bytes", program.len(), MEMORY_SIZE),
                 &self.runtime_options);
        Ok(())
    }

    /// Executes a single instruction.
    pub fn step(&mut self) -> Result<RunState, MachineError> {
        if self.runtime_options.trace && self.cpu.state == RunState::Running {
            log::log("cpu", self.trace_line(), &self.runtime_options);
        }

        let result = self.cpu.step(&mut self.memory, &mut self.output);
        match result {
            Ok(RunState::Halted) => {
                log::log("machine", format!("Halted after {} instructions", self.cpu.steps),
                         &self.runtime_options);
            }
            Err(ref e) => {
                log::log("error", format!("FATAL ERROR: {}", e), &self.runtime_options);
            }
            _ => {}
        }
        result
    }

    /// Runs until the program halts. A fault stops execution and is returned.
    pub fn run(&mut self) -> Result<(), MachineError> {
        while self.step()? == RunState::Running {}
        Ok(())
    }

    pub fn trace(&self) -> Trace {
        self.cpu.trace(&self.memory)
    }

    /// The line logged before each step with `--trace`: the trace snapshot
    /// followed by the disassembly of the instruction about to run.
    pub fn trace_line(&self) -> String {
        let trace = self.trace();
        let instr = Instruction(trace.next_bytes[0], trace.next_bytes[1], trace.next_bytes[2]);
        format!("{} | {}", trace, instr.disassemble())
    }

    /// Exit code for a run that ended without a fault. Only a program that
    /// reached HLT exits with EXIT_HALTED.
    pub fn exit_code(&self) -> i32 {
        match self.cpu.state {
            RunState::Halted => EXIT_HALTED,
            _ => EXIT_SUCCESS,
        }
    }

    pub fn state(&self) -> RunState {
        self.cpu.state
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }
}

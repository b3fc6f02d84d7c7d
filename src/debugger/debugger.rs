// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use debugger::parser;
use io::errors::MachineError;
use io::log;
use ls8::cpu::RunState;
use ls8::instruction::Instruction;
use ls8::machine::Machine;
use ls8::output::OutputSink;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{stdout, Write};

const PROMPT: &'static str = "(ls8) ";

// Bytes shown by `dump` when no length is given, and per output row.
const DEFAULT_DUMP_LEN: usize = 16;
const DUMP_ROW_LEN: usize = 8;

#[derive(Debug, PartialEq)]
enum Command {
    Step,
    Continue,
    Registers,
    Dump,
    Help,
    Quit,
}

struct CommandWithArguments {
    command: Command,
    args: Vec<String>,
}

/// Whether the debugger prompt keeps going after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Prompt,
    Exit,
}

/// Interactive debugger wrapped around a machine. Nothing runs until a
/// command asks for it.
pub struct Debugger;

impl Debugger {
    pub fn new() -> Self {
        Debugger
    }

    /// Reads commands from the terminal until `quit` or end of input. Returns
    /// the fault that stopped the machine, if any.
    pub fn run<O: OutputSink>(&mut self, machine: &mut Machine<O>) -> Result<(), MachineError> {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("ls8: unable to start debugger: {}", e);
                return machine.run();
            }
        };
        let mut stdout = stdout();
        let mut fault = None;

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    editor.add_history_entry(line.as_str()).ok();
                    match self.execute_line(&line, machine, &mut stdout) {
                        Ok(Flow::Prompt) => {}
                        Ok(Flow::Exit) => break,
                        Err(e) => {
                            writeln!(stdout, "ls8: {}", e).ok();
                            fault = Some(e);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("ls8: {}", e);
                    break;
                }
            }
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Interprets and executes one line of debugger input, writing anything
    /// the command prints to `out`. Machine faults are passed back.
    pub fn execute_line<O: OutputSink, W: Write>(&mut self, line: &str, machine: &mut Machine<O>,
                                                  out: &mut W) -> Result<Flow, MachineError> {
        match self.interpret(line) {
            Ok(Some(command)) => self.execute_command(command, machine, out),
            Ok(None) => Ok(Flow::Prompt),
            Err(e) => {
                writeln!(out, "ls8: {}", e).ok();
                Ok(Flow::Prompt)
            }
        }
    }

    /// Parse a raw input string into a list of arguments and a command. This
    /// function also maps command names to their respective enums. Empty
    /// input yields no command.
    fn interpret(&self, input: &str) -> Result<Option<CommandWithArguments>, String> {
        let args = parser::input_to_arguments(input)?;

        let command = {
            let raw_command = match args.first() {
                Some(raw_command) => raw_command,
                None => return Ok(None),
            };

            // Map command strings to the command enum type.
            match raw_command.to_lowercase().as_str() {
                // Full commands.
                "step"      => Command::Step,
                "continue"  => Command::Continue,
                "registers" => Command::Registers,
                "regs"      => Command::Registers,
                "dump"      => Command::Dump,
                "help"      => Command::Help,
                "quit"      => Command::Quit,
                // Aliases.
                "s" => Command::Step,
                "c" => Command::Continue,
                "r" => Command::Registers,
                "d" => Command::Dump,
                "h" => Command::Help,
                "q" => Command::Quit,
                // Unknown command.
                other => return Err(format!("unknown command '{}'", other)),
            }
        };

        Ok(Some(CommandWithArguments {
            command: command,
            args: args,
        }))
    }

    /// Executes the correct debugger command based on the enum passed.
    fn execute_command<O: OutputSink, W: Write>(&mut self, command: CommandWithArguments,
                                                 machine: &mut Machine<O>, out: &mut W) -> Result<Flow, MachineError> {
        match command.command {
            Command::Step => self.execute_step(machine, &command.args, out),
            Command::Continue => self.execute_continue(machine, out),
            Command::Registers => self.execute_registers(machine, out),
            Command::Dump => self.execute_dump(machine, &command.args, out),
            Command::Help => self.execute_help(out),
            Command::Quit => Ok(Flow::Exit),
        }
    }

    /// Executes one instruction, or as many as the first argument asks for,
    /// printing each one before it runs.
    fn execute_step<O: OutputSink, W: Write>(&mut self, machine: &mut Machine<O>, args: &[String],
                                              out: &mut W) -> Result<Flow, MachineError> {
        let count = match args.get(1) {
            Some(arg) => match parser::parse_number(arg) {
                Ok(count) => count,
                Err(e) => {
                    writeln!(out, "ls8: {}", e).ok();
                    return Ok(Flow::Prompt);
                }
            },
            None => 1,
        };

        for _ in 0..count {
            if !self.check_running(machine, out) {
                break;
            }
            let trace = machine.trace();
            let instr = Instruction(trace.next_bytes[0], trace.next_bytes[1], trace.next_bytes[2]);
            writeln!(out, "{:02X}: {}", trace.pc, instr.disassemble()).ok();
            machine.step()?;
        }
        Ok(Flow::Prompt)
    }

    /// Runs until the program halts or faults.
    fn execute_continue<O: OutputSink, W: Write>(&mut self, machine: &mut Machine<O>,
                                                  out: &mut W) -> Result<Flow, MachineError> {
        if self.check_running(machine, out) {
            log::log("debugger", "Starting execution now...", &machine.runtime_options);
            machine.run()?;
            writeln!(out, "halted").ok();
        }
        Ok(Flow::Prompt)
    }

    fn execute_registers<O: OutputSink, W: Write>(&mut self, machine: &mut Machine<O>,
                                                   out: &mut W) -> Result<Flow, MachineError> {
        writeln!(out, "{}", machine.trace()).ok();
        writeln!(out, "FL: {:08b}", machine.cpu().registers.fl).ok();
        Ok(Flow::Prompt)
    }

    /// Dumps memory starting at the address given, 16 bytes unless a length
    /// follows the address.
    fn execute_dump<O: OutputSink, W: Write>(&mut self, machine: &mut Machine<O>, args: &[String],
                                              out: &mut W) -> Result<Flow, MachineError> {
        let parsed = match (args.get(1), args.get(2)) {
            (Some(addr), Some(len)) => parser::parse_number(addr)
                .and_then(|addr| parser::parse_number(len).map(|len| (addr, len))),
            (Some(addr), None) => parser::parse_number(addr).map(|addr| (addr, DEFAULT_DUMP_LEN)),
            (None, _) => Err("usage: dump <addr> [len]"),
        };
        let (addr, len) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                writeln!(out, "ls8: {}", e).ok();
                return Ok(Flow::Prompt);
            }
        };

        match machine.memory().dump(addr, len) {
            Ok(bytes) => {
                for (row, chunk) in bytes.chunks(DUMP_ROW_LEN).enumerate() {
                    write!(out, "{:02X}:", addr + row * DUMP_ROW_LEN).ok();
                    for byte in chunk {
                        write!(out, " {:02X}", byte).ok();
                    }
                    writeln!(out).ok();
                }
            }
            // A bad dump range is a typo at the prompt, not a machine fault.
            Err(e) => {
                writeln!(out, "ls8: {}", e).ok();
            }
        }
        Ok(Flow::Prompt)
    }

    fn execute_help<W: Write>(&mut self, out: &mut W) -> Result<Flow, MachineError> {
        writeln!(out, "step [n]         (s) execute n instructions, default 1").ok();
        writeln!(out, "continue         (c) run until HLT or a fault").ok();
        writeln!(out, "registers   (regs, r) show PC, next bytes, R0-R7 and FL").ok();
        writeln!(out, "dump <addr> [n]  (d) show n bytes of memory, default 16").ok();
        writeln!(out, "quit             (q) leave the debugger").ok();
        Ok(Flow::Prompt)
    }

    /// Prints why the machine can't run any more. Returns true if it can.
    fn check_running<O: OutputSink, W: Write>(&self, machine: &Machine<O>, out: &mut W) -> bool {
        match machine.state() {
            RunState::Running => true,
            state => {
                writeln!(out, "machine is {:?}", state).ok();
                false
            }
        }
    }
}

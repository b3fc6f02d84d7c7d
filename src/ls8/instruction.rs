// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::MachineError;
use ls8::alu;
use ls8::memory::Memory;
use ls8::opcode::{self, Opcode};
use ls8::output::OutputSink;
use ls8::registers::RegisterFile;

/// All LS-8 instructions are a maximum size of 3 bytes. The first byte is the
/// opcode which is determines the action of the instruction. The following 2
/// bytes are the arguments and are present depending on the opcode; missing
/// ones are stored as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction(pub u8, pub u8, pub u8);

impl Instruction {
    /// Reads the instruction under `pc`. Only the operand bytes the opcode
    /// declares are fetched, so an instruction ending exactly at the top of
    /// memory is fine while one that runs past it faults.
    pub fn fetch(pc: usize, memory: &Memory) -> Result<Instruction, MachineError> {
        let op = memory.read_u8(pc)?;
        let count = opcode::operand_count(op);
        let a = if count >= 1 { memory.read_u8(pc + 1)? } else { 0 };
        let b = if count >= 2 { memory.read_u8(pc + 2)? } else { 0 };
        Ok(Instruction(op, a, b))
    }

    #[inline(always)]
    pub fn opcode(&self) -> Option<Opcode> {
        opcode::decode_opcode(self.0)
    }

    /// Disassembles the instruction for traces and the debugger, e.g.
    /// `LDI R0,8`. Unknown opcodes show up as a raw data byte.
    pub fn disassemble(&self) -> String {
        let op = match self.opcode() {
            Some(op) => op,
            None => return format!(".byte {:#04X}", self.0),
        };
        match op.operand_count() {
            0 => format!("{:?}", op),
            1 => format!("{:?} R{}", op, self.1),
            _ => match op {
                Opcode::LDI => format!("{:?} R{},{}", op, self.1, self.2),
                _ => format!("{:?} R{},R{}", op, self.1, self.2),
            },
        }
    }
}

/// What the dispatcher does with the program counter once a handler returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PcUpdate {
    // Move forward by the given number of bytes.
    Advance(u8),

    // The handler transferred control, the PC becomes this address.
    Jump(u8),

    // Stop the machine.
    Halt,
}

impl PcUpdate {
    /// Bytes the dispatcher adds to the PC after the handler runs. Zero when
    /// the instruction set the PC itself.
    pub fn increment(&self) -> u8 {
        match *self {
            PcUpdate::Advance(n) => n,
            PcUpdate::Jump(_) | PcUpdate::Halt => 0,
        }
    }
}

/// Everything a handler may touch. The PC is read only here, handlers change
/// it by returning a `PcUpdate`.
pub struct Context<'a> {
    pub registers: &'a mut RegisterFile,
    pub memory: &'a mut Memory,
    pub output: &'a mut dyn OutputSink,
    pub pc: usize,
}

pub type Handler = fn(&mut Context, u8, u8) -> Result<PcUpdate, MachineError>;

/// An entry in the instruction table.
pub struct InstructionDef {
    pub opcode: Opcode,
    pub handler: Handler,
}

/// The instruction set. Built once and shared by every machine.
pub static INSTRUCTION_TABLE: [InstructionDef; 13] = [
    InstructionDef { opcode: Opcode::LDI,  handler: handle_ldi },
    InstructionDef { opcode: Opcode::PRN,  handler: handle_prn },
    InstructionDef { opcode: Opcode::HLT,  handler: handle_hlt },
    InstructionDef { opcode: Opcode::MUL,  handler: handle_alu_mul },
    InstructionDef { opcode: Opcode::ADD,  handler: handle_alu_add },
    InstructionDef { opcode: Opcode::CMP,  handler: handle_cmp },
    InstructionDef { opcode: Opcode::PUSH, handler: handle_push },
    InstructionDef { opcode: Opcode::POP,  handler: handle_pop },
    InstructionDef { opcode: Opcode::CALL, handler: handle_call },
    InstructionDef { opcode: Opcode::RET,  handler: handle_ret },
    InstructionDef { opcode: Opcode::JMP,  handler: handle_jmp },
    InstructionDef { opcode: Opcode::JEQ,  handler: handle_jeq },
    InstructionDef { opcode: Opcode::JNE,  handler: handle_jne },
];

/// Finds the handler for an opcode byte, `None` if the byte isn't an
/// instruction.
pub fn lookup(byte: u8) -> Option<&'static InstructionDef> {
    let op = opcode::decode_opcode(byte)?;
    INSTRUCTION_TABLE.iter().find(|def| def.opcode == op)
}

// Stack helpers. The stack grows downwards, SP always points at the last
// pushed byte.

/// Pushes a byte onto the stack. Pushing with SP at 0x00 faults.
pub fn stack_push_u8(registers: &mut RegisterFile, memory: &mut Memory, value: u8) -> Result<(), MachineError> {
    let sp = match registers.sp().checked_sub(1) {
        Some(sp) => sp,
        None => return Err(MachineError::OutOfBoundsAccess { address: -1 }),
    };
    memory.write_u8(sp as usize, value)?;
    registers.set_sp(sp);
    Ok(())
}

/// Pops a byte off the stack. Popping with SP at 0xFF faults since SP would
/// leave the address space.
pub fn stack_pop_u8(registers: &mut RegisterFile, memory: &Memory) -> Result<u8, MachineError> {
    let sp = registers.sp();
    let next = match sp.checked_add(1) {
        Some(next) => next,
        None => return Err(MachineError::OutOfBoundsAccess { address: sp as isize + 1 }),
    };
    let value = memory.read_u8(sp as usize)?;
    registers.set_sp(next);
    Ok(value)
}

// Instruction handlers. Each one receives both raw operand bytes whether or
// not it uses them.

fn handle_ldi(ctx: &mut Context, a: u8, b: u8) -> Result<PcUpdate, MachineError> {
    ctx.registers.set(a, b)?;
    Ok(PcUpdate::Advance(Opcode::LDI.size()))
}

fn handle_prn(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    let value = ctx.registers.get(a)?;
    ctx.output.emit(value)?;
    Ok(PcUpdate::Advance(Opcode::PRN.size()))
}

fn handle_hlt(_: &mut Context, _: u8, _: u8) -> Result<PcUpdate, MachineError> {
    Ok(PcUpdate::Halt)
}

fn alu_op(ctx: &mut Context, op: Opcode, a: u8, b: u8) -> Result<PcUpdate, MachineError> {
    debug_assert!(opcode::is_alu(op.byte()));
    let result = alu::execute(op, ctx.registers.get(a)?, ctx.registers.get(b)?);
    ctx.registers.set(a, result)?;
    Ok(PcUpdate::Advance(op.size()))
}

fn handle_alu_add(ctx: &mut Context, a: u8, b: u8) -> Result<PcUpdate, MachineError> {
    alu_op(ctx, Opcode::ADD, a, b)
}

fn handle_alu_mul(ctx: &mut Context, a: u8, b: u8) -> Result<PcUpdate, MachineError> {
    alu_op(ctx, Opcode::MUL, a, b)
}

fn handle_cmp(ctx: &mut Context, a: u8, b: u8) -> Result<PcUpdate, MachineError> {
    let (lhs, rhs) = (ctx.registers.get(a)?, ctx.registers.get(b)?);
    ctx.registers.compare(lhs, rhs);
    Ok(PcUpdate::Advance(Opcode::CMP.size()))
}

fn handle_push(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    let value = ctx.registers.get(a)?;
    stack_push_u8(ctx.registers, ctx.memory, value)?;
    Ok(PcUpdate::Advance(Opcode::PUSH.size()))
}

fn handle_pop(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    // Validate the destination first so a bad register leaves SP alone.
    ctx.registers.get(a)?;
    let value = stack_pop_u8(ctx.registers, ctx.memory)?;
    ctx.registers.set(a, value)?;
    Ok(PcUpdate::Advance(Opcode::POP.size()))
}

fn handle_call(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    let target = ctx.registers.get(a)?;

    // The return address is the instruction right after CALL and has to fit
    // in a single stack byte.
    let ret = ctx.pc + Opcode::CALL.size() as usize;
    if ret > 0xFF {
        return Err(MachineError::OutOfBoundsAccess { address: ret as isize });
    }
    stack_push_u8(ctx.registers, ctx.memory, ret as u8)?;
    Ok(PcUpdate::Jump(target))
}

fn handle_ret(ctx: &mut Context, _: u8, _: u8) -> Result<PcUpdate, MachineError> {
    let ret = stack_pop_u8(ctx.registers, ctx.memory)?;
    Ok(PcUpdate::Jump(ret))
}

fn handle_jmp(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    Ok(PcUpdate::Jump(ctx.registers.get(a)?))
}

fn handle_jeq(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    let target = ctx.registers.get(a)?;
    if ctx.registers.equal_flag_set() {
        Ok(PcUpdate::Jump(target))
    } else {
        Ok(PcUpdate::Advance(Opcode::JEQ.size()))
    }
}

fn handle_jne(ctx: &mut Context, a: u8, _: u8) -> Result<PcUpdate, MachineError> {
    let target = ctx.registers.get(a)?;
    if !ctx.registers.equal_flag_set() {
        Ok(PcUpdate::Jump(target))
    } else {
        Ok(PcUpdate::Advance(Opcode::JNE.size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ls8::registers::{SP, STACK_START};

    struct Rig {
        registers: RegisterFile,
        memory: Memory,
        output: Vec<u8>,
    }

    impl Rig {
        fn new() -> Rig {
            Rig { registers: RegisterFile::new(), memory: Memory::new(), output: Vec::new() }
        }

        fn exec(&mut self, op: Opcode, pc: usize, a: u8, b: u8) -> Result<PcUpdate, MachineError> {
            let def = lookup(op.byte()).unwrap();
            let mut ctx = Context {
                registers: &mut self.registers,
                memory: &mut self.memory,
                output: &mut self.output,
                pc: pc,
            };
            (def.handler)(&mut ctx, a, b)
        }
    }

    #[test]
    fn every_opcode_has_a_table_entry() {
        for def in INSTRUCTION_TABLE.iter() {
            assert_eq!(lookup(def.opcode.byte()).unwrap().opcode, def.opcode);
        }
        assert!(lookup(0x00).is_none());
        assert!(lookup(0xFF).is_none());
    }

    #[test]
    fn ldi_then_read_for_every_register_and_value() {
        let mut rig = Rig::new();
        for r in 0..8u8 {
            for v in 0..=255u8 {
                assert_eq!(rig.exec(Opcode::LDI, 0, r, v).unwrap(), PcUpdate::Advance(3));
                assert_eq!(rig.registers.get(r).unwrap(), v);
            }
        }
    }

    #[test]
    fn prn_writes_decimal_value() {
        let mut rig = Rig::new();
        rig.registers.set(3, 200).unwrap();
        assert_eq!(rig.exec(Opcode::PRN, 0, 3, 0xAA).unwrap(), PcUpdate::Advance(2));
        assert_eq!(rig.output, b"200\n");
    }

    #[test]
    fn hlt_only_reports_halt() {
        let mut rig = Rig::new();
        assert_eq!(rig.exec(Opcode::HLT, 0, 0, 0).unwrap(), PcUpdate::Halt);
        assert_eq!(rig.registers, RegisterFile::new());
    }

    #[test]
    fn alu_handlers_write_first_register() {
        let mut rig = Rig::new();
        rig.registers.set(0, 8).unwrap();
        rig.registers.set(1, 9).unwrap();
        rig.exec(Opcode::MUL, 0, 0, 1).unwrap();
        assert_eq!(rig.registers.get(0).unwrap(), 72);
        rig.exec(Opcode::ADD, 0, 0, 1).unwrap();
        assert_eq!(rig.registers.get(0).unwrap(), 81);
        assert_eq!(rig.registers.get(1).unwrap(), 9);

        // Overflow wraps.
        rig.registers.set(2, 200).unwrap();
        rig.registers.set(3, 100).unwrap();
        rig.exec(Opcode::ADD, 0, 2, 3).unwrap();
        assert_eq!(rig.registers.get(2).unwrap(), 44);
    }

    #[test]
    fn push_then_pop_restores_value_and_sp() {
        let mut rig = Rig::new();
        rig.registers.set(0, 42).unwrap();
        rig.exec(Opcode::PUSH, 0, 0, 0).unwrap();
        assert_eq!(rig.registers.sp(), STACK_START - 1);
        assert_eq!(rig.memory.read_u8((STACK_START - 1) as usize).unwrap(), 42);
        assert!(rig.output.is_empty());

        rig.exec(Opcode::POP, 0, 4, 0).unwrap();
        assert_eq!(rig.registers.get(4).unwrap(), 42);
        assert_eq!(rig.registers.sp(), STACK_START);
    }

    #[test]
    fn push_with_sp_at_zero_faults() {
        let mut rig = Rig::new();
        rig.registers.set_sp(0);
        match rig.exec(Opcode::PUSH, 0, 0, 0) {
            Err(MachineError::OutOfBoundsAccess { address }) => assert_eq!(address, -1),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(rig.registers.sp(), 0);
    }

    #[test]
    fn pop_with_sp_at_top_faults() {
        let mut rig = Rig::new();
        rig.registers.set_sp(0xFF);
        match rig.exec(Opcode::POP, 0, 0, 0) {
            Err(MachineError::OutOfBoundsAccess { address }) => assert_eq!(address, 0x100),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(rig.registers.sp(), 0xFF);
    }

    #[test]
    fn call_pushes_address_after_itself() {
        let mut rig = Rig::new();
        rig.registers.set(1, 0x20).unwrap();
        assert_eq!(rig.exec(Opcode::CALL, 0x0A, 1, 0).unwrap(), PcUpdate::Jump(0x20));
        assert_eq!(rig.registers.sp(), STACK_START - 1);
        assert_eq!(rig.memory.read_u8((STACK_START - 1) as usize).unwrap(), 0x0C);

        assert_eq!(rig.exec(Opcode::RET, 0x20, 0, 0).unwrap(), PcUpdate::Jump(0x0C));
        assert_eq!(rig.registers.get(SP as u8).unwrap(), STACK_START);
    }

    #[test]
    fn call_at_top_of_memory_faults() {
        let mut rig = Rig::new();
        assert!(rig.exec(Opcode::CALL, 0xFE, 0, 0).is_err());
        assert_eq!(rig.registers.sp(), STACK_START);
    }

    #[test]
    fn conditional_jumps_follow_equal_flag() {
        let mut rig = Rig::new();
        rig.registers.set(0, 5).unwrap();
        rig.registers.set(1, 5).unwrap();
        rig.registers.set(2, 7).unwrap();
        rig.registers.set(3, 0x40).unwrap();

        rig.exec(Opcode::CMP, 0, 0, 1).unwrap();
        assert!(rig.registers.equal_flag_set());
        assert_eq!(rig.exec(Opcode::JEQ, 0, 3, 0).unwrap(), PcUpdate::Jump(0x40));
        assert_eq!(rig.exec(Opcode::JNE, 0, 3, 0).unwrap(), PcUpdate::Advance(2));

        rig.exec(Opcode::CMP, 0, 0, 2).unwrap();
        assert!(!rig.registers.equal_flag_set());
        assert_eq!(rig.exec(Opcode::JEQ, 0, 3, 0).unwrap(), PcUpdate::Advance(2));
        assert_eq!(rig.exec(Opcode::JNE, 0, 3, 0).unwrap(), PcUpdate::Jump(0x40));
    }

    #[test]
    fn jmp_is_unconditional() {
        let mut rig = Rig::new();
        rig.registers.set(6, 0x99).unwrap();
        let update = rig.exec(Opcode::JMP, 0, 6, 0).unwrap();
        assert_eq!(update, PcUpdate::Jump(0x99));
        assert_eq!(update.increment(), 0);
    }

    #[test]
    fn bad_register_operand_faults() {
        let mut rig = Rig::new();
        assert!(rig.exec(Opcode::LDI, 0, 8, 1).is_err());
        assert!(rig.exec(Opcode::PRN, 0, 0xFF, 0).is_err());
        assert!(rig.output.is_empty());
    }

    #[test]
    fn fetch_only_reads_declared_operands() {
        let mut memory = Memory::new();
        memory.write_u8(0xFF, Opcode::HLT.byte()).unwrap();
        assert_eq!(Instruction::fetch(0xFF, &memory).unwrap(), Instruction(0x01, 0, 0));

        memory.write_u8(0xFE, Opcode::LDI.byte()).unwrap();
        assert!(Instruction::fetch(0xFE, &memory).is_err());
    }

    #[test]
    fn disassembly() {
        assert_eq!(Instruction(0b1000_0010, 0, 8).disassemble(), "LDI R0,8");
        assert_eq!(Instruction(0b1010_0010, 0, 1).disassemble(), "MUL R0,R1");
        assert_eq!(Instruction(0b0100_0111, 0, 0).disassemble(), "PRN R0");
        assert_eq!(Instruction(0b0000_0001, 0, 0).disassemble(), "HLT");
        assert_eq!(Instruction(0xFF, 0, 0).disassemble(), ".byte 0xFF");
    }
}

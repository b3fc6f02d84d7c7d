// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use num::FromPrimitive;

// Opcode layout: AABCDDDD
//
//   AA   number of operand bytes that follow the opcode (0-2)
//   B    1 if the instruction is an ALU operation
//   C    1 if the instruction sets the PC itself
//   DDDD instruction identifier
const OPERAND_COUNT_SHIFT: u8 = 6;
const OPERAND_COUNT_MASK : u8 = 0b11;
const ALU_BIT            : u8 = 0b0010_0000;
const SETS_PC_BIT        : u8 = 0b0001_0000;

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Opcode {
        HLT  = 0b0000_0001,
        RET  = 0b0001_0001,

        PRN  = 0b0100_0111,
        PUSH = 0b0100_0101,
        POP  = 0b0100_0110,
        CALL = 0b0101_0000,
        JMP  = 0b0101_0100,
        JEQ  = 0b0101_0101,
        JNE  = 0b0101_0110,

        LDI  = 0b1000_0010,
        ADD  = 0b1010_0000,
        MUL  = 0b1010_0010,
        CMP  = 0b1010_0111,
    }
}

/// Decodes an opcode by converting an opcode byte to an enum value. Returns
/// `None` for bytes that aren't in the instruction set.
pub fn decode_opcode(opcode: u8) -> Option<Opcode> {
    Opcode::from_u8(opcode)
}

/// Number of operand bytes following an opcode, taken from its top two bits.
/// Works on raw bytes so the size of unknown opcodes can be shown too.
#[inline(always)]
pub fn operand_count(opcode: u8) -> u8 {
    (opcode >> OPERAND_COUNT_SHIFT) & OPERAND_COUNT_MASK
}

/// Total size of the instruction in bytes, the opcode included. This is how
/// far the PC advances after an instruction that doesn't set it.
#[inline(always)]
pub fn instruction_size(opcode: u8) -> u8 {
    operand_count(opcode) + 1
}

#[inline(always)]
pub fn is_alu(opcode: u8) -> bool {
    opcode & ALU_BIT == ALU_BIT
}

#[inline(always)]
pub fn sets_pc(opcode: u8) -> bool {
    opcode & SETS_PC_BIT == SETS_PC_BIT
}

impl Opcode {
    #[inline(always)]
    pub fn byte(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub fn operand_count(self) -> u8 {
        operand_count(self.byte())
    }

    #[inline(always)]
    pub fn size(self) -> u8 {
        instruction_size(self.byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Opcode; 13] = [
        Opcode::HLT, Opcode::RET, Opcode::PRN, Opcode::PUSH, Opcode::POP,
        Opcode::CALL, Opcode::JMP, Opcode::JEQ, Opcode::JNE, Opcode::LDI,
        Opcode::ADD, Opcode::MUL, Opcode::CMP,
    ];

    #[test]
    fn decodes_every_known_opcode() {
        for op in ALL.iter() {
            assert_eq!(decode_opcode(op.byte()), Some(*op));
        }
        assert_eq!(decode_opcode(0b1000_0010), Some(Opcode::LDI));
        assert_eq!(decode_opcode(0x00), None);
        assert_eq!(decode_opcode(0xFF), None);
    }

    #[test]
    fn operand_count_comes_from_top_bits() {
        assert_eq!(Opcode::HLT.operand_count(), 0);
        assert_eq!(Opcode::RET.operand_count(), 0);
        assert_eq!(Opcode::PRN.operand_count(), 1);
        assert_eq!(Opcode::CALL.operand_count(), 1);
        assert_eq!(Opcode::LDI.operand_count(), 2);
        assert_eq!(Opcode::CMP.operand_count(), 2);
        assert_eq!(Opcode::LDI.size(), 3);
        assert_eq!(Opcode::PUSH.size(), 2);
        assert_eq!(instruction_size(0xFF), 4);
    }

    #[test]
    fn control_flow_opcodes_set_pc() {
        let jumps = [Opcode::CALL, Opcode::RET, Opcode::JMP, Opcode::JEQ, Opcode::JNE];
        for op in ALL.iter() {
            assert_eq!(sets_pc(op.byte()), jumps.contains(op), "{:?}", op);
        }
    }

    #[test]
    fn arithmetic_opcodes_carry_alu_bit() {
        assert!(is_alu(Opcode::ADD.byte()));
        assert!(is_alu(Opcode::MUL.byte()));
        assert!(is_alu(Opcode::CMP.byte()));
        assert!(!is_alu(Opcode::LDI.byte()));
        assert!(!is_alu(Opcode::PUSH.byte()));
    }
}

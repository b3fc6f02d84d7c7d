// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ls8::opcode::Opcode;

/// Performs an arithmetic operation on two register values and returns the
/// result destined for the first register.
///
/// Registers are a byte wide so results wrap modulo 256, e.g. 200 + 100
/// yields 44.
///
/// The instruction table only routes ADD and MUL here. Anything else is a bug
/// in the emulator, not in the program being run, so it panics.
#[inline(always)]
pub fn execute(op: Opcode, a: u8, b: u8) -> u8 {
    match op {
        Opcode::ADD => a.wrapping_add(b),
        Opcode::MUL => a.wrapping_mul(b),
        _ => panic!("Unsupported ALU operation: {:?}", op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_mul_in_range() {
        assert_eq!(execute(Opcode::ADD, 2, 3), 5);
        assert_eq!(execute(Opcode::MUL, 8, 9), 72);
        assert_eq!(execute(Opcode::MUL, 0, 255), 0);
    }

    #[test]
    fn results_wrap_modulo_256() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                let sum = (a as u32 + b as u32) % 256;
                let product = (a as u32 * b as u32) % 256;
                assert_eq!(execute(Opcode::ADD, a, b) as u32, sum);
                assert_eq!(execute(Opcode::MUL, a, b) as u32, product);
            }
        }
        assert_eq!(execute(Opcode::ADD, 200, 100), 44);
        assert_eq!(execute(Opcode::MUL, 16, 16), 0);
    }

    #[test]
    #[should_panic(expected = "Unsupported ALU operation")]
    fn non_alu_opcode_is_a_bug() {
        execute(Opcode::CMP, 1, 1);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MIPS instruction disassembler
//!
//! Produces conventional assembler syntax with ABI register names. Branch and
//! jump targets are resolved to absolute addresses using the instruction's PC.

use super::Instruction;

/// ABI names of the general purpose registers
pub const REGISTER_NAMES: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Instruction disassembler
pub struct Disassembler;

impl Disassembler {
    /// Disassemble `word` located at `pc`
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::cpu::Disassembler;
    ///
    /// assert_eq!(Disassembler::disassemble(0x00000000, 0), "nop");
    /// assert_eq!(Disassembler::disassemble(0x3C011234, 0), "lui $at, 0x1234");
    /// assert_eq!(
    ///     Disassembler::disassemble(0x1000FFFF, 0x80010000),
    ///     "beq $zero, $zero, 0x80010000"
    /// );
    /// ```
    pub fn disassemble(word: u32, pc: u32) -> String {
        let i = Instruction(word);
        let rs = REGISTER_NAMES[i.rs()];
        let rt = REGISTER_NAMES[i.rt()];
        let simm = i.imm_se() as i32;
        let branch_target = pc
            .wrapping_add(4)
            .wrapping_add(i.imm_se() << 2);
        let jump_target = (pc.wrapping_add(4) & 0xF000_0000) | (i.target() << 2);

        match i.opcode() {
            0x00 => Self::special(i),
            0x01 => {
                let name = match (i.rt() & 0x1E == 0x10, i.rt() & 1 != 0) {
                    (false, false) => "bltz",
                    (false, true) => "bgez",
                    (true, false) => "bltzal",
                    (true, true) => "bgezal",
                };
                format!("{} {}, 0x{:08X}", name, rs, branch_target)
            }
            0x02 => format!("j 0x{:08X}", jump_target),
            0x03 => format!("jal 0x{:08X}", jump_target),
            0x04 => format!("beq {}, {}, 0x{:08X}", rs, rt, branch_target),
            0x05 => format!("bne {}, {}, 0x{:08X}", rs, rt, branch_target),
            0x06 => format!("blez {}, 0x{:08X}", rs, branch_target),
            0x07 => format!("bgtz {}, 0x{:08X}", rs, branch_target),
            0x08 => format!("addi {}, {}, {}", rt, rs, simm),
            0x09 => format!("addiu {}, {}, {}", rt, rs, simm),
            0x0A => format!("slti {}, {}, {}", rt, rs, simm),
            0x0B => format!("sltiu {}, {}, {}", rt, rs, simm),
            0x0C => format!("andi {}, {}, 0x{:04X}", rt, rs, i.imm()),
            0x0D => format!("ori {}, {}, 0x{:04X}", rt, rs, i.imm()),
            0x0E => format!("xori {}, {}, 0x{:04X}", rt, rs, i.imm()),
            0x0F => format!("lui {}, 0x{:04X}", rt, i.imm()),
            op @ 0x10..=0x13 => Self::coprocessor(i, op & 3),
            op @ (0x20..=0x26 | 0x28..=0x2B | 0x2E) => {
                let name = match op {
                    0x20 => "lb",
                    0x21 => "lh",
                    0x22 => "lwl",
                    0x23 => "lw",
                    0x24 => "lbu",
                    0x25 => "lhu",
                    0x26 => "lwr",
                    0x28 => "sb",
                    0x29 => "sh",
                    0x2A => "swl",
                    0x2B => "sw",
                    _ => "swr",
                };
                format!("{} {}, {}({})", name, rt, simm, rs)
            }
            op @ (0x30..=0x33 | 0x38..=0x3B) => {
                let dir = if op < 0x38 { "lwc" } else { "swc" };
                format!("{}{} ${}, {}({})", dir, op & 3, i.rt(), simm, rs)
            }
            _ => format!("??? 0x{:08X}", word),
        }
    }

    fn special(i: Instruction) -> String {
        let rs = REGISTER_NAMES[i.rs()];
        let rt = REGISTER_NAMES[i.rt()];
        let rd = REGISTER_NAMES[i.rd()];

        let three = |name: &str| format!("{} {}, {}, {}", name, rd, rs, rt);
        let shift_v = |name: &str| format!("{} {}, {}, {}", name, rd, rt, rs);
        let shift = |name: &str| format!("{} {}, {}, {}", name, rd, rt, i.shamt());

        match i.funct() {
            0x00 if i.is_nop() => "nop".to_string(),
            0x00 => shift("sll"),
            0x02 => shift("srl"),
            0x03 => shift("sra"),
            0x04 => shift_v("sllv"),
            0x06 => shift_v("srlv"),
            0x07 => shift_v("srav"),
            0x08 => format!("jr {}", rs),
            0x09 if i.rd() == 31 => format!("jalr {}", rs),
            0x09 => format!("jalr {}, {}", rd, rs),
            0x0C => "syscall".to_string(),
            0x0D => "break".to_string(),
            0x10 => format!("mfhi {}", rd),
            0x11 => format!("mthi {}", rs),
            0x12 => format!("mflo {}", rd),
            0x13 => format!("mtlo {}", rs),
            0x18 => format!("mult {}, {}", rs, rt),
            0x19 => format!("multu {}, {}", rs, rt),
            0x1A => format!("div {}, {}", rs, rt),
            0x1B => format!("divu {}, {}", rs, rt),
            0x20 => three("add"),
            0x21 => three("addu"),
            0x22 => three("sub"),
            0x23 => three("subu"),
            0x24 => three("and"),
            0x25 => three("or"),
            0x26 => three("xor"),
            0x27 => three("nor"),
            0x2A => three("slt"),
            0x2B => three("sltu"),
            _ => format!("??? 0x{:08X}", i.0),
        }
    }

    fn coprocessor(i: Instruction, cop: u32) -> String {
        let rt = REGISTER_NAMES[i.rt()];
        let rd = i.rd();

        if i.0 & (1 << 25) != 0 {
            return match (cop, i.funct()) {
                (0, 0x10) => "rfe".to_string(),
                (2, _) => format!("cop2 0x{:07X}", i.imm25()),
                _ => format!("cop{} 0x{:07X}", cop, i.imm25()),
            };
        }

        match i.cop_op() {
            0x00 => format!("mfc{} {}, ${}", cop, rt, rd),
            0x02 => format!("cfc{} {}, ${}", cop, rt, rd),
            0x04 => format!("mtc{} {}, ${}", cop, rt, rd),
            0x06 => format!("ctc{} {}, ${}", cop, rt, rd),
            0x08 => format!("bc{} 0x{:04X}", cop, i.imm()),
            _ => format!("??? 0x{:08X}", i.0),
        }
    }
}

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

//! Instruction word view
//!
//! MIPS I encodes three formats in one 32-bit word:
//!
//! ```text
//! R-type: | op(6) | rs(5) | rt(5) | rd(5) | shamt(5) | funct(6) |
//! I-type: | op(6) | rs(5) | rt(5) |          imm(16)           |
//! J-type: | op(6) |               target(26)                   |
//! ```
//!
//! [`Instruction`] exposes every field regardless of format; callers pick the
//! ones that apply to the opcode they are handling.

use std::fmt;

/// A raw 32-bit MIPS instruction
///
/// # Example
///
/// ```
/// use psrx_cpu::core::cpu::Instruction;
///
/// // addiu $t0, $zero, -1
/// let instr = Instruction(0x2408FFFF);
/// assert_eq!(instr.opcode(), 0x09);
/// assert_eq!(instr.rt(), 8);
/// assert_eq!(instr.imm(), 0xFFFF);
/// assert_eq!(instr.imm_se(), 0xFFFFFFFF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Primary opcode, bits 31..26
    #[inline(always)]
    pub fn opcode(self) -> u32 {
        self.0 >> 26
    }

    #[inline(always)]
    pub fn rs(self) -> usize {
        ((self.0 >> 21) & 0x1F) as usize
    }

    #[inline(always)]
    pub fn rt(self) -> usize {
        ((self.0 >> 16) & 0x1F) as usize
    }

    #[inline(always)]
    pub fn rd(self) -> usize {
        ((self.0 >> 11) & 0x1F) as usize
    }

    #[inline(always)]
    pub fn shamt(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// SPECIAL function code, bits 5..0
    #[inline(always)]
    pub fn funct(self) -> u32 {
        self.0 & 0x3F
    }

    /// Zero-extended 16-bit immediate
    #[inline(always)]
    pub fn imm(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Sign-extended 16-bit immediate
    #[inline(always)]
    pub fn imm_se(self) -> u32 {
        (self.0 as u16) as i16 as i32 as u32
    }

    /// 26-bit jump target
    #[inline(always)]
    pub fn target(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }

    /// Coprocessor sub-operation (the rs field)
    #[inline(always)]
    pub fn cop_op(self) -> u32 {
        (self.0 >> 21) & 0x1F
    }

    /// 25-bit coprocessor command
    #[inline(always)]
    pub fn imm25(self) -> u32 {
        self.0 & 0x01FF_FFFF
    }

    /// True for every instruction that owns a delay slot
    pub fn is_branch(self) -> bool {
        match self.opcode() {
            0x01..=0x07 => true,
            0x00 => matches!(self.funct(), 0x08 | 0x09),
            _ => false,
        }
    }

    pub fn is_syscall_or_break(self) -> bool {
        self.opcode() == 0x00 && matches!(self.funct(), 0x0C | 0x0D)
    }

    /// COP2 command word (opcode 0x12 with bit 25 set)
    pub fn is_gte_command(self) -> bool {
        self.opcode() == 0x12 && self.0 & (1 << 25) != 0
    }

    #[inline(always)]
    pub fn is_nop(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Instruction {
    fn from(word: u32) -> Self {
        Instruction(word)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

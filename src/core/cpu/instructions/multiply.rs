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

use super::super::{Instruction, CPU};
use crate::core::error::Result;

impl CPU {
    // === Multiply/Divide Instructions ===

    /// MULT: Multiply (signed)
    ///
    /// Format: mult rs, rt
    /// Operation: (HI, LO) = rs * rt (signed 64-bit result)
    pub(in crate::core::cpu) fn op_mult(&mut self, i: Instruction) -> Result<()> {
        let a = self.regs[i.rs()] as i32 as i64;
        let b = self.regs[i.rt()] as i32 as i64;
        let result = (a * b) as u64;

        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
        Ok(())
    }

    /// MULTU: Multiply Unsigned
    ///
    /// Format: multu rs, rt
    /// Operation: (HI, LO) = rs * rt (unsigned 64-bit result)
    pub(in crate::core::cpu) fn op_multu(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] as u64 * self.regs[i.rt()] as u64;

        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
        Ok(())
    }

    /// DIV: Divide (signed)
    ///
    /// Format: div rs, rt
    /// Operation: LO = rs / rt, HI = rs % rt
    ///
    /// The R3000A never traps on division. Special cases:
    /// - rt == 0: HI = rs, LO = -1 if rs >= 0, else 1
    /// - 0x80000000 / -1: LO = 0x80000000, HI = 0
    pub(in crate::core::cpu) fn op_div(&mut self, i: Instruction) -> Result<()> {
        let n = self.regs[i.rs()] as i32;
        let d = self.regs[i.rt()] as i32;

        if d == 0 {
            self.hi = n as u32;
            self.lo = if n >= 0 { 0xFFFF_FFFF } else { 1 };
        } else if n == i32::MIN && d == -1 {
            self.hi = 0;
            self.lo = 0x8000_0000;
        } else {
            self.hi = (n % d) as u32;
            self.lo = (n / d) as u32;
        }
        Ok(())
    }

    /// DIVU: Divide Unsigned
    ///
    /// Division by zero gives LO = 0xFFFFFFFF, HI = rs.
    pub(in crate::core::cpu) fn op_divu(&mut self, i: Instruction) -> Result<()> {
        let n = self.regs[i.rs()];
        let d = self.regs[i.rt()];

        if d == 0 {
            self.hi = n;
            self.lo = 0xFFFF_FFFF;
        } else {
            self.hi = n % d;
            self.lo = n / d;
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mfhi(&mut self, i: Instruction) -> Result<()> {
        self.pipeline.write_direct(i.rd(), self.hi);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mflo(&mut self, i: Instruction) -> Result<()> {
        self.pipeline.write_direct(i.rd(), self.lo);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mthi(&mut self, i: Instruction) -> Result<()> {
        self.hi = self.regs[i.rs()];
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mtlo(&mut self, i: Instruction) -> Result<()> {
        self.lo = self.regs[i.rs()];
        Ok(())
    }
}

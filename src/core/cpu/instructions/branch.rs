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

//! Conditional branches
//!
//! During execute, `pc` already holds the delay slot address (B + 4), so the
//! target of a branch at B is `pc + (sign_extend(imm) << 2)`. A branch marks
//! the next instruction as its delay slot whether or not it is taken.

use super::super::{Instruction, CPU};
use crate::core::error::Result;

impl CPU {
    /// BLTZ / BGEZ / BLTZAL / BGEZAL (REGIMM, opcode 0x01)
    ///
    /// Bit 0 of rt selects BGEZ over BLTZ; rt values 0x10/0x11 link. The link
    /// register is written whether or not the branch is taken.
    pub(in crate::core::cpu) fn op_bcondz(&mut self, i: Instruction) -> Result<()> {
        let is_bgez = i.rt() & 0x01 != 0;
        let is_link = i.rt() & 0x1E == 0x10;

        let negative = (self.regs[i.rs()] as i32) < 0;
        let taken = negative != is_bgez;

        if is_link {
            self.pipeline.write_direct(31, self.pc.wrapping_add(4));
        }

        self.branch_if(taken, i);
        Ok(())
    }

    /// BEQ: Branch on Equal
    ///
    /// Format: beq rs, rt, offset
    pub(in crate::core::cpu) fn op_beq(&mut self, i: Instruction) -> Result<()> {
        let taken = self.regs[i.rs()] == self.regs[i.rt()];
        self.branch_if(taken, i);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bne(&mut self, i: Instruction) -> Result<()> {
        let taken = self.regs[i.rs()] != self.regs[i.rt()];
        self.branch_if(taken, i);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_blez(&mut self, i: Instruction) -> Result<()> {
        let taken = (self.regs[i.rs()] as i32) <= 0;
        self.branch_if(taken, i);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgtz(&mut self, i: Instruction) -> Result<()> {
        let taken = (self.regs[i.rs()] as i32) > 0;
        self.branch_if(taken, i);
        Ok(())
    }

    #[inline(always)]
    fn branch_if(&mut self, taken: bool, i: Instruction) {
        self.branch = true;
        if taken {
            self.next_pc = self.pc.wrapping_add(i.imm_se() << 2);
        }
    }
}

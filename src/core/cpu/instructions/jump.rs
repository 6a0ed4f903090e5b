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
    // === Jump Instructions ===

    /// J: Jump
    ///
    /// Format: j target
    /// Operation: PC = (PC & 0xF0000000) | (target << 2), where PC is the
    /// delay slot address
    pub(in crate::core::cpu) fn op_j(&mut self, i: Instruction) -> Result<()> {
        self.next_pc = (self.pc & 0xF000_0000) | (i.target() << 2);
        self.branch = true;
        Ok(())
    }

    /// JAL: Jump and Link
    ///
    /// Format: jal target
    /// Operation: r31 = address after the delay slot; then as J
    pub(in crate::core::cpu) fn op_jal(&mut self, i: Instruction) -> Result<()> {
        self.pipeline.write_direct(31, self.pc.wrapping_add(4));
        self.op_j(i)
    }

    pub(in crate::core::cpu) fn op_jr(&mut self, i: Instruction) -> Result<()> {
        self.next_pc = self.regs[i.rs()];
        self.branch = true;
        Ok(())
    }

    /// JALR: Jump and Link Register
    ///
    /// Format: jalr rd, rs
    ///
    /// The target is read before the link is staged, so `jalr $ra, $ra`
    /// jumps to the old value.
    pub(in crate::core::cpu) fn op_jalr(&mut self, i: Instruction) -> Result<()> {
        self.next_pc = self.regs[i.rs()];
        self.pipeline.write_direct(i.rd(), self.pc.wrapping_add(4));
        self.branch = true;
        Ok(())
    }
}

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

use super::super::{ExceptionCause, Instruction, CPU};
use crate::core::error::Result;

impl CPU {
    // === Arithmetic Instructions ===

    /// ADD: Add (trap on signed overflow)
    ///
    /// Format: add rd, rs, rt
    /// Operation: rd = rs + rt; Overflow exception leaves rd unchanged
    pub(in crate::core::cpu) fn op_add(&mut self, i: Instruction) -> Result<()> {
        let a = self.regs[i.rs()] as i32;
        let b = self.regs[i.rt()] as i32;

        match a.checked_add(b) {
            Some(result) => self.pipeline.write_direct(i.rd(), result as u32),
            None => self.exception(ExceptionCause::Overflow),
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_addu(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()].wrapping_add(self.regs[i.rt()]);
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    /// ADDI: Add Immediate (trap on signed overflow)
    ///
    /// Format: addi rt, rs, imm
    /// Operation: rt = rs + sign_extend(imm)
    pub(in crate::core::cpu) fn op_addi(&mut self, i: Instruction) -> Result<()> {
        let a = self.regs[i.rs()] as i32;

        match a.checked_add(i.imm_se() as i32) {
            Some(result) => self.pipeline.write_direct(i.rt(), result as u32),
            None => self.exception(ExceptionCause::Overflow),
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_addiu(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()].wrapping_add(i.imm_se());
        self.pipeline.write_direct(i.rt(), result);
        Ok(())
    }

    /// SUB: Subtract (trap on signed overflow)
    pub(in crate::core::cpu) fn op_sub(&mut self, i: Instruction) -> Result<()> {
        let a = self.regs[i.rs()] as i32;
        let b = self.regs[i.rt()] as i32;

        match a.checked_sub(b) {
            Some(result) => self.pipeline.write_direct(i.rd(), result as u32),
            None => self.exception(ExceptionCause::Overflow),
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_subu(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()].wrapping_sub(self.regs[i.rt()]);
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_slt(&mut self, i: Instruction) -> Result<()> {
        let result = (self.regs[i.rs()] as i32) < (self.regs[i.rt()] as i32);
        self.pipeline.write_direct(i.rd(), result as u32);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_sltu(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] < self.regs[i.rt()];
        self.pipeline.write_direct(i.rd(), result as u32);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_slti(&mut self, i: Instruction) -> Result<()> {
        let result = (self.regs[i.rs()] as i32) < (i.imm_se() as i32);
        self.pipeline.write_direct(i.rt(), result as u32);
        Ok(())
    }

    /// SLTIU: the immediate is sign-extended, then compared unsigned
    pub(in crate::core::cpu) fn op_sltiu(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] < i.imm_se();
        self.pipeline.write_direct(i.rt(), result as u32);
        Ok(())
    }
}

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

//! Shift instructions
//!
//! Variable shifts use only the low 5 bits of rs.

use super::super::{Instruction, CPU};
use crate::core::error::Result;

impl CPU {
    /// SLL: Shift Left Logical (`sll $zero, $zero, 0` is the canonical NOP)
    pub(in crate::core::cpu) fn op_sll(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rt()] << i.shamt();
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srl(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rt()] >> i.shamt();
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_sra(&mut self, i: Instruction) -> Result<()> {
        let result = ((self.regs[i.rt()] as i32) >> i.shamt()) as u32;
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_sllv(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rt()] << (self.regs[i.rs()] & 0x1F);
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srlv(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rt()] >> (self.regs[i.rs()] & 0x1F);
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srav(&mut self, i: Instruction) -> Result<()> {
        let result = ((self.regs[i.rt()] as i32) >> (self.regs[i.rs()] & 0x1F)) as u32;
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }
}

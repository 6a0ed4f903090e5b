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
    // === Logical Instructions ===

    pub(in crate::core::cpu) fn op_and(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] & self.regs[i.rt()];
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_or(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] | self.regs[i.rt()];
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_xor(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] ^ self.regs[i.rt()];
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_nor(&mut self, i: Instruction) -> Result<()> {
        let result = !(self.regs[i.rs()] | self.regs[i.rt()]);
        self.pipeline.write_direct(i.rd(), result);
        Ok(())
    }

    /// ANDI: the immediate is zero-extended
    pub(in crate::core::cpu) fn op_andi(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] & i.imm();
        self.pipeline.write_direct(i.rt(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_ori(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] | i.imm();
        self.pipeline.write_direct(i.rt(), result);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_xori(&mut self, i: Instruction) -> Result<()> {
        let result = self.regs[i.rs()] ^ i.imm();
        self.pipeline.write_direct(i.rt(), result);
        Ok(())
    }

    /// LUI: Load Upper Immediate
    ///
    /// Format: lui rt, imm
    /// Operation: rt = imm << 16
    pub(in crate::core::cpu) fn op_lui(&mut self, i: Instruction) -> Result<()> {
        self.pipeline.write_direct(i.rt(), i.imm() << 16);
        Ok(())
    }
}

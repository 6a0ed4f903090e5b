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

//! COP0 (System Control Coprocessor) instructions

use super::super::{Instruction, CPU};
use crate::core::error::Result;

impl CPU {
    /// Dispatch a COP0 instruction on its rs field
    ///
    /// # Errors
    ///
    /// Sub-operations other than MFC0, MTC0 and RFE halt the CPU with
    /// `UnimplementedInstruction`.
    pub(in crate::core::cpu) fn execute_cop0(&mut self, i: Instruction) -> Result<()> {
        match i.cop_op() {
            0x00 => self.op_mfc0(i),
            0x04 => self.op_mtc0(i),
            0x10 if i.funct() == 0x10 => self.op_rfe(),
            _ => Err(self.unimplemented(i)),
        }
    }

    /// MFC0: Move From COP0
    ///
    /// Format: mfc0 rt, rd
    /// Operation: rt = cop0[rd], with load delay
    pub(in crate::core::cpu) fn op_mfc0(&mut self, i: Instruction) -> Result<()> {
        let value = self.cop0.read(i.rd());
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    /// MTC0: Move To COP0
    ///
    /// Format: mtc0 rt, rd
    ///
    /// Writes to read-only or unmodelled registers are dropped.
    pub(in crate::core::cpu) fn op_mtc0(&mut self, i: Instruction) -> Result<()> {
        self.write_cop0(i.rd(), self.regs[i.rt()]);
        Ok(())
    }

    /// RFE: pop the interrupt-enable/kernel-mode stack
    pub(in crate::core::cpu) fn op_rfe(&mut self) -> Result<()> {
        self.cop0.return_from_exception();
        Ok(())
    }
}

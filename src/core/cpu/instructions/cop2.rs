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

//! COP2 (GTE) instructions
//!
//! The GTE itself is behind the [`Gte`] trait. Data registers are indices
//! 0-31 and control registers 32-63. All COP2 operations require SR.CU2.

use super::super::{ExceptionCause, Instruction, StatusRegister, CPU};
use crate::core::error::Result;
use crate::core::gte::Gte;
use crate::core::memory::Bus;

impl CPU {
    #[inline(always)]
    fn cop2_usable(&self) -> bool {
        self.cop0.status().contains(StatusRegister::CU2)
    }

    pub(in crate::core::cpu) fn execute_cop2<G: Gte>(&mut self, i: Instruction, gte: &mut G) -> Result<()> {
        if !self.cop2_usable() {
            self.coprocessor_error(2);
            return Ok(());
        }

        if i.is_gte_command() {
            gte.execute(i.imm25());
            return Ok(());
        }

        match i.cop_op() {
            // MFC2
            0x00 => {
                let value = gte.read(i.rd() as u32);
                self.pipeline.write_delayed(i.rt(), value);
            }
            // CFC2
            0x02 => {
                let value = gte.read(i.rd() as u32 + 32);
                self.pipeline.write_delayed(i.rt(), value);
            }
            // MTC2
            0x04 => gte.write(i.rd() as u32, self.regs[i.rt()]),
            // CTC2
            0x06 => gte.write(i.rd() as u32 + 32, self.regs[i.rt()]),
            _ => return Err(self.unimplemented(i)),
        }
        Ok(())
    }

    /// LWC2: Load Word to GTE data register rt
    pub(in crate::core::cpu) fn op_lwc2<B: Bus, G: Gte>(
        &mut self,
        i: Instruction,
        bus: &mut B,
        gte: &mut G,
    ) -> Result<()> {
        if !self.cop2_usable() {
            self.coprocessor_error(2);
            return Ok(());
        }
        if self.cop0.status().contains(StatusRegister::ISC) {
            return Ok(());
        }

        let addr = self.effective_address(i);
        if addr & 3 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }
        let value = bus.read32(addr)?;
        gte.write(i.rt() as u32, value);
        Ok(())
    }

    /// SWC2: Store Word from GTE data register rt
    pub(in crate::core::cpu) fn op_swc2<B: Bus, G: Gte>(
        &mut self,
        i: Instruction,
        bus: &mut B,
        gte: &mut G,
    ) -> Result<()> {
        if !self.cop2_usable() {
            self.coprocessor_error(2);
            return Ok(());
        }
        if self.cop0.status().contains(StatusRegister::ISC) {
            return Ok(());
        }

        let addr = self.effective_address(i);
        if addr & 3 != 0 {
            self.address_error(ExceptionCause::AddressErrorStore, addr);
            return Ok(());
        }
        bus.write32(addr, gte.read(i.rt() as u32))
    }
}

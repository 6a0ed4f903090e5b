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

//! Load instructions
//!
//! Every load stages its result in the pipeline's delayed slot, so the
//! instruction right after the load still sees the old register value. With
//! SR.IsC set the data cache is isolated and loads do nothing.

use super::super::{ExceptionCause, Instruction, StatusRegister, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    #[inline(always)]
    fn cache_isolated(&self) -> bool {
        self.cop0.status().contains(StatusRegister::ISC)
    }

    /// LB: Load Byte (sign-extended)
    ///
    /// Format: lb rt, offset(rs)
    /// Operation: rt = sign_extend(mem8[rs + offset])
    pub(in crate::core::cpu) fn op_lb<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let value = bus.read8(addr)? as i8 as u32;
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_lbu<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let value = bus.read8(addr)? as u32;
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    /// LH: Load Halfword (sign-extended)
    ///
    /// Format: lh rt, offset(rs)
    ///
    /// An odd address raises AddressErrorLoad with BadVaddr set.
    pub(in crate::core::cpu) fn op_lh<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if addr & 1 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }
        let value = bus.read16(addr)? as i16 as u32;
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_lhu<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if addr & 1 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }
        let value = bus.read16(addr)? as u32;
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    /// LW: Load Word
    ///
    /// Format: lw rt, offset(rs)
    /// Operation: rt = mem32[rs + offset], visible one instruction later
    pub(in crate::core::cpu) fn op_lw<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if addr & 3 != 0 {
            self.address_error(ExceptionCause::AddressErrorLoad, addr);
            return Ok(());
        }
        let value = bus.read32(addr)?;
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    /// LWL: Load Word Left
    ///
    /// Merges the high-order bytes of the aligned word into rt. The merge
    /// base is the register value including a load still in flight, which
    /// lets `lwl`/`lwr` pairs run back to back.
    pub(in crate::core::cpu) fn op_lwl<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let word = bus.read32(addr & !3)?;
        let current = self.pipeline.bypass(&self.regs, i.rt());

        let value = match addr & 3 {
            0 => (current & 0x00FF_FFFF) | (word << 24),
            1 => (current & 0x0000_FFFF) | (word << 16),
            2 => (current & 0x0000_00FF) | (word << 8),
            _ => word,
        };
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }

    /// LWR: Load Word Right
    pub(in crate::core::cpu) fn op_lwr<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.cache_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let word = bus.read32(addr & !3)?;
        let current = self.pipeline.bypass(&self.regs, i.rt());

        let value = match addr & 3 {
            0 => word,
            1 => (current & 0xFF00_0000) | (word >> 8),
            2 => (current & 0xFFFF_0000) | (word >> 16),
            _ => (current & 0xFFFF_FF00) | (word >> 24),
        };
        self.pipeline.write_delayed(i.rt(), value);
        Ok(())
    }
}

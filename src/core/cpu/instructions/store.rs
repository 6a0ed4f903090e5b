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

use super::super::{ExceptionCause, Instruction, StatusRegister, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    // === Store Instructions ===
    //
    // Stores are dropped while SR.IsC isolates the cache.

    #[inline(always)]
    fn store_isolated(&self) -> bool {
        self.cop0.status().contains(StatusRegister::ISC)
    }

    /// SB: Store Byte
    ///
    /// Format: sb rt, offset(rs)
    /// Operation: mem8[rs + offset] = rt & 0xFF
    pub(in crate::core::cpu) fn op_sb<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.store_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        bus.write8(addr, self.regs[i.rt()] as u8)
    }

    /// SH: Store Halfword
    ///
    /// Format: sh rt, offset(rs)
    /// Operation: mem16[rs + offset] = rt & 0xFFFF
    pub(in crate::core::cpu) fn op_sh<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.store_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if addr & 1 != 0 {
            self.address_error(ExceptionCause::AddressErrorStore, addr);
            return Ok(());
        }
        bus.write16(addr, self.regs[i.rt()] as u16)
    }

    pub(in crate::core::cpu) fn op_sw<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.store_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        if addr & 3 != 0 {
            self.address_error(ExceptionCause::AddressErrorStore, addr);
            return Ok(());
        }
        bus.write32(addr, self.regs[i.rt()])
    }

    /// SWL: Store Word Left
    ///
    /// Writes the high-order bytes of rt into the aligned word containing
    /// the address. Never raises an address error.
    pub(in crate::core::cpu) fn op_swl<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.store_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let aligned = addr & !3;
        let mem = bus.read32(aligned)?;
        let v = self.regs[i.rt()];

        let value = match addr & 3 {
            0 => (mem & 0xFFFF_FF00) | (v >> 24),
            1 => (mem & 0xFFFF_0000) | (v >> 16),
            2 => (mem & 0xFF00_0000) | (v >> 8),
            _ => v,
        };
        bus.write32(aligned, value)
    }

    /// SWR: Store Word Right
    pub(in crate::core::cpu) fn op_swr<B: Bus>(&mut self, i: Instruction, bus: &mut B) -> Result<()> {
        if self.store_isolated() {
            return Ok(());
        }
        let addr = self.effective_address(i);
        let aligned = addr & !3;
        let mem = bus.read32(aligned)?;
        let v = self.regs[i.rt()];

        let value = match addr & 3 {
            0 => v,
            1 => (mem & 0x0000_00FF) | (v << 8),
            2 => (mem & 0x0000_FFFF) | (v << 16),
            _ => (mem & 0x00FF_FFFF) | (v << 24),
        };
        bus.write32(aligned, value)
    }
}

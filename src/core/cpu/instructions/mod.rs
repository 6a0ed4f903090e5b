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

//! CPU instruction implementations
//!
//! Instructions are dispatched with a `match` on the primary opcode, then on
//! the SPECIAL function code or coprocessor sub-operation. Handlers stage
//! register results in the pipeline; the caller retires them.

use super::{ExceptionCause, Instruction, CPU};
use crate::core::error::Result;
use crate::core::gte::Gte;
use crate::core::memory::Bus;

mod arithmetic;
mod branch;
mod cop0;
mod cop2;
mod exception;
mod jump;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;

impl CPU {
    /// Decode and execute one instruction
    ///
    /// # Errors
    ///
    /// Bus errors, and `UnimplementedInstruction` for coprocessor sub-ops the
    /// core does not model (which also halts the CPU).
    pub(super) fn execute_instruction<B: Bus, G: Gte>(
        &mut self,
        i: Instruction,
        bus: &mut B,
        gte: &mut G,
    ) -> Result<()> {
        match i.opcode() {
            0x00 => self.execute_special(i),
            0x01 => self.op_bcondz(i),
            0x02 => self.op_j(i),
            0x03 => self.op_jal(i),
            0x04 => self.op_beq(i),
            0x05 => self.op_bne(i),
            0x06 => self.op_blez(i),
            0x07 => self.op_bgtz(i),
            0x08 => self.op_addi(i),
            0x09 => self.op_addiu(i),
            0x0A => self.op_slti(i),
            0x0B => self.op_sltiu(i),
            0x0C => self.op_andi(i),
            0x0D => self.op_ori(i),
            0x0E => self.op_xori(i),
            0x0F => self.op_lui(i),
            0x10 => self.execute_cop0(i),
            0x12 => self.execute_cop2(i, gte),
            0x20 => self.op_lb(i, bus),
            0x21 => self.op_lh(i, bus),
            0x22 => self.op_lwl(i, bus),
            0x23 => self.op_lw(i, bus),
            0x24 => self.op_lbu(i, bus),
            0x25 => self.op_lhu(i, bus),
            0x26 => self.op_lwr(i, bus),
            0x28 => self.op_sb(i, bus),
            0x29 => self.op_sh(i, bus),
            0x2A => self.op_swl(i, bus),
            0x2B => self.op_sw(i, bus),
            0x2E => self.op_swr(i, bus),
            0x32 => self.op_lwc2(i, bus, gte),
            0x3A => self.op_swc2(i, bus, gte),
            // COPn, LWCn, SWCn for coprocessors 0, 1 and 3
            0x11 | 0x13 | 0x30 | 0x31 | 0x33 | 0x38 | 0x39 | 0x3B => {
                self.coprocessor_error(i.opcode() & 3);
                Ok(())
            }
            _ => {
                self.op_reserved(i);
                Ok(())
            }
        }
    }

    /// SPECIAL (opcode 0x00), dispatched on the function field
    fn execute_special(&mut self, i: Instruction) -> Result<()> {
        match i.funct() {
            0x00 => self.op_sll(i),
            0x02 => self.op_srl(i),
            0x03 => self.op_sra(i),
            0x04 => self.op_sllv(i),
            0x06 => self.op_srlv(i),
            0x07 => self.op_srav(i),
            0x08 => self.op_jr(i),
            0x09 => self.op_jalr(i),
            0x0C => self.op_syscall(),
            0x0D => self.op_break(),
            0x10 => self.op_mfhi(i),
            0x11 => self.op_mthi(i),
            0x12 => self.op_mflo(i),
            0x13 => self.op_mtlo(i),
            0x18 => self.op_mult(i),
            0x19 => self.op_multu(i),
            0x1A => self.op_div(i),
            0x1B => self.op_divu(i),
            0x20 => self.op_add(i),
            0x21 => self.op_addu(i),
            0x22 => self.op_sub(i),
            0x23 => self.op_subu(i),
            0x24 => self.op_and(i),
            0x25 => self.op_or(i),
            0x26 => self.op_xor(i),
            0x27 => self.op_nor(i),
            0x2A => self.op_slt(i),
            0x2B => self.op_sltu(i),
            _ => {
                self.op_reserved(i);
                Ok(())
            }
        }
    }

    fn op_reserved(&mut self, i: Instruction) {
        log::debug!(
            "Reserved instruction 0x{:08X} at PC=0x{:08X}",
            i.0,
            self.current_pc
        );
        self.exception(ExceptionCause::ReservedInstruction);
    }

    /// `rs + sign_extend(imm)`, the effective address of loads and stores
    #[inline(always)]
    fn effective_address(&self, i: Instruction) -> u32 {
        self.regs[i.rs()].wrapping_add(i.imm_se())
    }
}

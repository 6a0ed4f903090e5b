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

//! Coprocessor 0 (System Control) state

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// COP0 register file
///
/// Only the first 16 registers exist on the R3000A; reads of 16-31 return 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct COP0 {
    pub(crate) regs: [u32; 16],
}

impl COP0 {
    /// Breakpoint on execute
    pub const BPC: usize = 3;
    /// Breakpoint on data access
    pub const BDA: usize = 5;
    /// Breakpoint control
    pub const DCIC: usize = 7;
    /// Bad virtual address
    pub const BADA: usize = 8;
    /// Data access breakpoint mask
    pub const BDAM: usize = 9;
    /// Execute breakpoint mask
    pub const BPCM: usize = 11;
    /// Status register
    pub const SR: usize = 12;
    /// Exception cause
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;

    /// Cause bits software may write (the two software interrupt lines)
    pub const CAUSE_WRITABLE: u32 = 0x0000_0300;

    /// Cause.IP2, the hardware interrupt line from the interrupt controller
    pub const CAUSE_IP2: u32 = 1 << 10;

    /// Cause.BD, exception taken in a branch delay slot
    pub const CAUSE_BD: u32 = 1 << 31;

    pub(crate) fn new() -> Self {
        let mut regs = [0u32; 16];
        regs[Self::SR] = 0x1090_0000;
        regs[Self::PRID] = 0x0000_0002;
        Self { regs }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline(always)]
    pub(crate) fn status(&self) -> StatusRegister {
        StatusRegister::from_bits_retain(self.regs[Self::SR])
    }

    /// Whether an interrupt should be taken now: IEc set and a pending line
    /// unmasked by SR.IM
    #[inline(always)]
    pub(crate) fn interrupt_enabled_and_pending(&self) -> bool {
        let sr = self.regs[Self::SR];
        let cause = self.regs[Self::CAUSE];
        sr & StatusRegister::IEC.bits() != 0 && (sr & cause & 0xFF00) != 0
    }

    /// Mirror the external IRQ line into Cause.IP2
    #[inline(always)]
    pub(crate) fn set_irq_line(&mut self, asserted: bool) {
        if asserted {
            self.regs[Self::CAUSE] |= Self::CAUSE_IP2;
        } else {
            self.regs[Self::CAUSE] &= !Self::CAUSE_IP2;
        }
    }

    /// MFC0 view of a register
    #[inline]
    pub(crate) fn read(&self, index: usize) -> u32 {
        self.regs.get(index).copied().unwrap_or(0)
    }

    /// MTC0 semantics; returns false for registers that ignore writes
    pub(crate) fn write(&mut self, index: usize, value: u32) -> bool {
        match index {
            Self::SR => self.regs[Self::SR] = value,
            Self::CAUSE => {
                let cause = self.regs[Self::CAUSE];
                self.regs[Self::CAUSE] =
                    (cause & !Self::CAUSE_WRITABLE) | (value & Self::CAUSE_WRITABLE);
            }
            Self::BPC | Self::BDA | Self::DCIC | Self::BDAM | Self::BPCM => {
                self.regs[index] = value
            }
            _ => return false,
        }
        true
    }

    /// Push the KU/IE stack and enter kernel mode with interrupts off
    #[inline(always)]
    pub(crate) fn enter_exception(&mut self) {
        let sr = self.regs[Self::SR];
        self.regs[Self::SR] = (sr & !0x3F) | ((sr << 2) & 0x3F);
    }

    /// RFE: pop the KU/IE stack
    #[inline(always)]
    pub(crate) fn return_from_exception(&mut self) {
        let sr = self.regs[Self::SR];
        self.regs[Self::SR] = (sr & !0xF) | ((sr >> 2) & 0xF);
    }
}

bitflags! {
    /// Status register (COP0 r12) bits the CPU core acts on
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusRegister: u32 {
        /// Interrupt enable (current)
        const IEC = 1 << 0;
        /// Kernel/user mode (current)
        const KUC = 1 << 1;
        /// Isolate cache: loads and stores do not reach memory
        const ISC = 1 << 16;
        /// Boot exception vectors in ROM
        const BEV = 1 << 22;
        /// COP0 usable in user mode
        const CU0 = 1 << 28;
        /// COP2 (GTE) usable
        const CU2 = 1 << 30;

        const _ = !0;
    }
}

/// Exception causes raised by the CPU
///
/// The discriminant is the ExcCode written to Cause bits 6..2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ExceptionCause {
    /// External interrupt
    Interrupt = 0,
    /// Address error on load or instruction fetch
    AddressErrorLoad = 4,
    /// Address error on store
    AddressErrorStore = 5,
    /// Bus error on data access
    BusErrorData = 7,
    Syscall = 8,
    Breakpoint = 9,
    /// Reserved or illegal instruction
    ReservedInstruction = 10,
    /// Coprocessor unusable
    CoprocessorUnusable = 11,
    /// Arithmetic overflow
    Overflow = 12,
}

impl ExceptionCause {
    /// Decode an ExcCode value, used by the recompiler's exception trampoline
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Interrupt,
            4 => Self::AddressErrorLoad,
            5 => Self::AddressErrorStore,
            7 => Self::BusErrorData,
            8 => Self::Syscall,
            9 => Self::Breakpoint,
            10 => Self::ReservedInstruction,
            11 => Self::CoprocessorUnusable,
            12 => Self::Overflow,
            _ => return None,
        })
    }
}

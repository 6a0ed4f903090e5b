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

//! Register write-back pipeline
//!
//! Instructions never write general purpose registers directly. They stage
//! their results in one of three slots and the pipeline commits them when the
//! instruction retires:
//!
//! - `direct`: ALU results, visible to the next instruction
//! - `delayed`: loads and coprocessor moves, visible one instruction later
//! - `ready`: the load staged by the previous instruction, committed now
//!
//! A slot whose `reg` is 0 is empty. The recompiler emits the exact same
//! retire sequence inline, so the layout is `#[repr(C)]`.

use serde::{Deserialize, Serialize};

/// A pending register write
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterWrite {
    pub reg: u32,
    pub value: u32,
}

impl RegisterWrite {
    pub const EMPTY: RegisterWrite = RegisterWrite { reg: 0, value: 0 };

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.reg == 0
    }
}

/// The three write-back slots
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadPipeline {
    pub ready: RegisterWrite,
    pub delayed: RegisterWrite,
    pub direct: RegisterWrite,
}

impl LoadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a result visible to the next instruction
    #[inline(always)]
    pub fn write_direct(&mut self, reg: usize, value: u32) {
        self.direct = RegisterWrite {
            reg: reg as u32,
            value,
        };
    }

    /// Stage a load result, visible one instruction later
    #[inline(always)]
    pub fn write_delayed(&mut self, reg: usize, value: u32) {
        self.delayed = RegisterWrite {
            reg: reg as u32,
            value,
        };
    }

    /// Current value of `reg` as seen by LWL/LWR: a load still in flight
    /// from the previous instruction wins over the register file
    #[inline(always)]
    pub fn bypass(&self, regs: &[u32; 32], reg: usize) -> u32 {
        if self.ready.reg as usize == reg && reg != 0 {
            self.ready.value
        } else {
            regs[reg]
        }
    }

    /// Commit staged writes at the end of an instruction
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::cpu::LoadPipeline;
    ///
    /// let mut regs = [0u32; 32];
    /// let mut pipeline = LoadPipeline::new();
    ///
    /// pipeline.write_delayed(8, 0x1234);
    /// pipeline.retire(&mut regs);
    /// assert_eq!(regs[8], 0, "load is not visible yet");
    ///
    /// pipeline.retire(&mut regs);
    /// assert_eq!(regs[8], 0x1234);
    /// ```
    #[inline(always)]
    pub fn retire(&mut self, regs: &mut [u32; 32]) {
        // A newer load to the same register cancels the older one
        if self.ready.reg != self.delayed.reg {
            regs[self.ready.reg as usize & 31] = self.ready.value;
        }

        self.ready = self.delayed;
        self.delayed = RegisterWrite::EMPTY;

        regs[self.direct.reg as usize & 31] = self.direct.value;
        self.direct = RegisterWrite::EMPTY;

        regs[0] = 0;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

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

//! Coprocessor 2 (GTE) contract
//!
//! The CPU only moves words in and out of the GTE and forwards command words;
//! the geometry maths live behind the [`Gte`] trait. Registers are addressed
//! with a single index: 0-31 are data registers, 32-63 control registers.

/// Interface to the Geometry Transformation Engine
pub trait Gte {
    /// Read register `index` (0-31 data, 32-63 control)
    fn read(&self, index: u32) -> u32;

    /// Write register `index` (0-31 data, 32-63 control)
    fn write(&mut self, index: u32, value: u32);

    /// Execute a 25-bit command word
    fn execute(&mut self, command: u32);
}

/// Register-only GTE
///
/// Stores data and control registers and records executed commands without
/// performing any geometry. The LZCS/LZCR pair is modelled since it is a
/// pure register-side effect that BIOS code relies on.
///
/// # Example
///
/// ```
/// use psrx_cpu::core::gte::{Gte, RegisterBank};
///
/// let mut gte = RegisterBank::new();
/// gte.write(RegisterBank::LZCS, 0x0000_FFFF);
/// assert_eq!(gte.read(RegisterBank::LZCR), 16);
///
/// gte.execute(0x0180001);
/// assert_eq!(gte.commands(), &[0x0180001]);
/// ```
#[derive(Debug, Clone)]
pub struct RegisterBank {
    regs: Vec<u32>,
    commands: Vec<u32>,
}

impl RegisterBank {
    /// Leading zero/one count source (data register 30)
    pub const LZCS: u32 = 30;

    /// Leading zero/one count result (data register 31)
    pub const LZCR: u32 = 31;

    pub fn new() -> Self {
        Self {
            regs: vec![0; 64],
            commands: Vec::new(),
        }
    }

    /// Command words executed so far, oldest first
    pub fn commands(&self) -> &[u32] {
        &self.commands
    }

    pub fn reset(&mut self) {
        self.regs.fill(0);
        self.commands.clear();
    }
}

impl Gte for RegisterBank {
    fn read(&self, index: u32) -> u32 {
        self.regs[(index & 63) as usize]
    }

    fn write(&mut self, index: u32, value: u32) {
        let index = index & 63;
        match index {
            Self::LZCR => {} // read-only
            Self::LZCS => {
                self.regs[Self::LZCS as usize] = value;
                let count = if (value as i32) < 0 {
                    value.leading_ones()
                } else {
                    value.leading_zeros()
                };
                self.regs[Self::LZCR as usize] = count;
            }
            _ => self.regs[index as usize] = value,
        }
    }

    fn execute(&mut self, command: u32) {
        log::trace!("GTE command 0x{:07X} (register-only backend)", command);
        self.commands.push(command & 0x01FF_FFFF);
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

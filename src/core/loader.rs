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

//! PS-X EXE loading
//!
//! Executables are side-loaded the way homebrew loaders do it: the BIOS is
//! allowed to boot until it reaches the shell entry point at
//! [`EXE_TRAP_ADDRESS`], then the image is copied into RAM and the CPU is
//! pointed at its entry.
//!
//! # PS-X EXE Format
//!
//! ```text
//! 0x00-0x07: "PS-X EXE" magic
//! 0x10-0x13: Initial PC (entry point)
//! 0x14-0x17: Initial GP (global pointer)
//! 0x18-0x1B: Load address
//! 0x1C-0x1F: Load size
//! 0x30-0x33: Stack base
//! 0x34-0x37: Stack offset
//! 0x800+:    Executable data
//! ```

use super::error::{EmulatorError, Result};
use std::path::Path;

/// PC at which the BIOS jumps into the shell; a pending EXE is installed here
pub const EXE_TRAP_ADDRESS: u32 = 0x8003_0000;

/// Parsed PS-X EXE image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PSXExecutable {
    /// Entry point
    pub pc: u32,

    /// Initial global pointer (r28)
    pub gp: u32,

    /// Destination address of `data`
    pub load_address: u32,

    /// Size of the text+data image in bytes
    pub load_size: u32,

    /// Initial stack pointer base; 0 leaves SP/FP untouched
    pub stack_base: u32,

    pub stack_offset: u32,

    /// Image copied to `load_address`
    pub data: Vec<u8>,
}

impl PSXExecutable {
    const HEADER_SIZE: usize = 0x800;
    const MAGIC: &'static [u8; 8] = b"PS-X EXE";

    /// Parse an executable from its raw bytes
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::LoaderError` if the header is truncated, the
    /// magic does not match, or `load_size` runs past the end of the file.
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::loader::PSXExecutable;
    ///
    /// let bytes = PSXExecutable::build(0x80010000, 0x80010000, &[0; 8]);
    /// let exe = PSXExecutable::load(&bytes).unwrap();
    ///
    /// assert_eq!(exe.pc, 0x80010000);
    /// assert_eq!(exe.data.len(), 8);
    /// ```
    pub fn load(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(EmulatorError::LoaderError(format!(
                "PS-X EXE header truncated: {} bytes (need {})",
                data.len(),
                Self::HEADER_SIZE
            )));
        }

        if &data[0..8] != Self::MAGIC {
            return Err(EmulatorError::LoaderError(
                "not a PS-X EXE: bad magic".to_string(),
            ));
        }

        let field = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        let pc = field(0x10);
        let gp = field(0x14);
        let load_address = field(0x18);
        let load_size = field(0x1C);
        let stack_base = field(0x30);
        let stack_offset = field(0x34);

        let image = data
            .get(Self::HEADER_SIZE..Self::HEADER_SIZE + load_size as usize)
            .ok_or_else(|| {
                EmulatorError::LoaderError(format!(
                    "load size 0x{:X} exceeds file size 0x{:X}",
                    load_size,
                    data.len()
                ))
            })?;

        log::info!(
            "PS-X EXE: PC=0x{:08X}, GP=0x{:08X}, Load=0x{:08X}, Size=0x{:X}",
            pc,
            gp,
            load_address,
            load_size
        );

        Ok(Self {
            pc,
            gp,
            load_address,
            load_size,
            stack_base,
            stack_offset,
            data: image.to_vec(),
        })
    }

    /// Read and parse an executable from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::load(&bytes)
    }

    /// Initial SP/FP value, if the header asks for one
    pub fn initial_sp(&self) -> Option<u32> {
        (self.stack_base != 0).then(|| self.stack_base.wrapping_add(self.stack_offset))
    }

    /// Assemble a minimal executable image around `code`
    ///
    /// GP and the stack fields are left zero. Handy for tests and tooling.
    pub fn build(pc: u32, load_address: u32, code: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; Self::HEADER_SIZE];
        bytes[0..8].copy_from_slice(Self::MAGIC);
        bytes[0x10..0x14].copy_from_slice(&pc.to_le_bytes());
        bytes[0x18..0x1C].copy_from_slice(&load_address.to_le_bytes());
        bytes[0x1C..0x20].copy_from_slice(&(code.len() as u32).to_le_bytes());
        bytes.extend_from_slice(code);
        bytes
    }
}

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

/// RAM size (2MB)
pub const RAM_SIZE: usize = 2 * 1024 * 1024;

/// BIOS size (512KB)
pub const BIOS_SIZE: usize = 512 * 1024;

/// Scratchpad size (1KB)
pub const SCRATCHPAD_SIZE: usize = 1024;

/// Physical address mask for the 2MB RAM and its mirrors
pub(crate) const RAM_MASK: u32 = 0x001F_FFFF;

/// RAM physical range including the three mirrors of the 2MB chip
pub(crate) const RAM_START: u32 = 0x0000_0000;
pub(crate) const RAM_END: u32 = 0x007F_FFFF;

pub(crate) const EXP1_START: u32 = 0x1F00_0000;
pub(crate) const EXP1_END: u32 = 0x1F7F_FFFF;

pub(crate) const SCRATCHPAD_START: u32 = 0x1F80_0000;
pub(crate) const SCRATCHPAD_END: u32 = 0x1F80_03FF;

pub(crate) const IO_START: u32 = 0x1F80_1000;
pub(crate) const IO_END: u32 = 0x1F80_2FFF;

pub(crate) const EXP3_START: u32 = 0x1FA0_0000;
pub(crate) const EXP3_END: u32 = 0x1FBF_FFFF;

pub(crate) const BIOS_START: u32 = 0x1FC0_0000;
pub(crate) const BIOS_END: u32 = 0x1FC7_FFFF;

pub(crate) const CACHE_CONTROL: u32 = 0x1FFE_0130;

/// Memory region identification
///
/// Used to identify which memory region an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM (2MB, mirrored up to 8MB)
    RAM,
    /// Scratchpad (1KB)
    Scratchpad,
    /// I/O ports
    IO,
    /// BIOS ROM
    BIOS,
    /// Cache Control registers
    CacheControl,
    /// Expansion regions (1, 3) - typically unused in retail PSX
    Expansion,
    /// Unmapped region
    Unmapped,
}

/// Translate virtual address to physical address
///
/// The PlayStation 1 uses MIPS memory segments:
/// - KUSEG (0x00000000-0x7FFFFFFF): User space, cached
/// - KSEG0 (0x80000000-0x9FFFFFFF): Kernel space, cached (mirrors physical memory)
/// - KSEG1 (0xA0000000-0xBFFFFFFF): Kernel space, uncached (mirrors physical memory)
///
/// KSEG2 (0xC0000000 and above) only holds the cache control register, which
/// also lands on its physical address after masking.
///
/// # Example
///
/// ```
/// use psrx_cpu::core::memory::translate_address;
///
/// assert_eq!(translate_address(0x80001234), 0x00001234);
/// assert_eq!(translate_address(0xBFC00000), 0x1FC00000);
/// ```
#[inline(always)]
pub fn translate_address(vaddr: u32) -> u32 {
    vaddr & 0x1FFF_FFFF
}

/// Identify the memory region of a virtual address
///
/// # Example
///
/// ```
/// use psrx_cpu::core::memory::{identify_region, MemoryRegion};
///
/// assert_eq!(identify_region(0x00000000), MemoryRegion::RAM);
/// assert_eq!(identify_region(0x1F800000), MemoryRegion::Scratchpad);
/// assert_eq!(identify_region(0x1F801000), MemoryRegion::IO);
/// assert_eq!(identify_region(0xBFC00000), MemoryRegion::BIOS);
/// assert_eq!(identify_region(0x1FFFFFFF), MemoryRegion::Unmapped);
/// ```
pub fn identify_region(vaddr: u32) -> MemoryRegion {
    let paddr = translate_address(vaddr);

    if (RAM_START..=RAM_END).contains(&paddr) {
        MemoryRegion::RAM
    } else if (EXP1_START..=EXP1_END).contains(&paddr) {
        MemoryRegion::Expansion
    } else if (SCRATCHPAD_START..=SCRATCHPAD_END).contains(&paddr) {
        MemoryRegion::Scratchpad
    } else if (IO_START..=IO_END).contains(&paddr) {
        MemoryRegion::IO
    } else if (EXP3_START..=EXP3_END).contains(&paddr) {
        MemoryRegion::Expansion
    } else if (BIOS_START..=BIOS_END).contains(&paddr) {
        MemoryRegion::BIOS
    } else if paddr == CACHE_CONTROL {
        MemoryRegion::CacheControl
    } else {
        MemoryRegion::Unmapped
    }
}

/// Regions the CPU can execute code from
///
/// Only BIOS ROM and main RAM hold code on the PlayStation; these are the two
/// windows the recompiler keeps block caches for, and the two instruction-fetch
/// cost classes of the cycle model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeRegion {
    /// BIOS ROM, immutable
    Bios,
    /// Main RAM, may be rewritten by the guest
    Ram,
}

impl CodeRegion {
    /// Classify a virtual address, returning the region and the 4-byte slot index
    /// within it (mirrors of RAM fold onto the same slot)
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::memory::CodeRegion;
    ///
    /// assert_eq!(CodeRegion::classify(0x80000010), Some((CodeRegion::Ram, 4)));
    /// assert_eq!(CodeRegion::classify(0xA0200010), Some((CodeRegion::Ram, 4)));
    /// assert_eq!(CodeRegion::classify(0xBFC00008), Some((CodeRegion::Bios, 2)));
    /// assert_eq!(CodeRegion::classify(0x1F800000), None);
    /// ```
    pub fn classify(vaddr: u32) -> Option<(CodeRegion, usize)> {
        let paddr = translate_address(vaddr);

        if (RAM_START..=RAM_END).contains(&paddr) {
            Some((CodeRegion::Ram, ((paddr & RAM_MASK) >> 2) as usize))
        } else if (BIOS_START..=BIOS_END).contains(&paddr) {
            Some((CodeRegion::Bios, ((paddr - BIOS_START) >> 2) as usize))
        } else {
            None
        }
    }

    /// Number of 4-byte slots in the region
    pub fn slot_count(self) -> usize {
        match self {
            CodeRegion::Bios => BIOS_SIZE / 4,
            CodeRegion::Ram => RAM_SIZE / 4,
        }
    }
}

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

//! Memory bus contract and reference implementation
//!
//! The CPU never touches guest memory directly. Every guest access goes
//! through the [`Bus`] trait exactly once; the recompiler additionally uses
//! [`Bus::peek32`] to read code for compilation and checksumming without
//! triggering device side effects.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region       | Size   | Access |
//! |------------------------|--------------|--------|--------|
//! | 0x00000000-0x007FFFFF  | RAM (+3 mirrors) | 2MB | R/W    |
//! | 0x1F800000-0x1F8003FF  | Scratchpad   | 1KB    | R/W    |
//! | 0x1F801000-0x1F802FFF  | I/O Ports    | 8KB    | R/W    |
//! | 0x1FC00000-0x1FC7FFFF  | BIOS ROM     | 512KB  | R only |
//!
//! # Example
//!
//! ```
//! use psrx_cpu::core::memory::{Bus, MemoryBus};
//!
//! let mut bus = MemoryBus::new();
//!
//! // Write to RAM via KSEG0
//! bus.write32(0x80000000, 0x12345678).unwrap();
//!
//! // Read from same location via different segment (should mirror)
//! assert_eq!(bus.read32(0x00000000).unwrap(), 0x12345678);
//! assert_eq!(bus.read32(0xA0000000).unwrap(), 0x12345678);
//! ```

mod region;

pub use region::{
    identify_region, translate_address, CodeRegion, MemoryRegion, BIOS_SIZE, RAM_SIZE,
    SCRATCHPAD_SIZE,
};

use crate::core::error::{EmulatorError, Result};
use region::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Interrupt status register (I_STAT)
const I_STAT: u32 = 0x1F80_1070;

/// Interrupt mask register (I_MASK)
const I_MASK: u32 = 0x1F80_1074;

/// Memory interface consumed by the CPU
///
/// Addresses are guest virtual addresses. Implementations translate them,
/// route them to the right device and report host-side failures (unmapped
/// regions, unaligned device access) as errors. Guest-visible alignment
/// faults are detected by the CPU before the bus is called.
pub trait Bus {
    fn read8(&mut self, vaddr: u32) -> Result<u8>;
    fn read16(&mut self, vaddr: u32) -> Result<u16>;
    fn read32(&mut self, vaddr: u32) -> Result<u32>;

    fn write8(&mut self, vaddr: u32, value: u8) -> Result<()>;
    fn write16(&mut self, vaddr: u32, value: u16) -> Result<()>;
    fn write32(&mut self, vaddr: u32, value: u32) -> Result<()>;

    /// Read a word without side effects
    ///
    /// Returns `None` when the address cannot be read passively (devices,
    /// unmapped space). Used for block compilation and checksums.
    fn peek32(&self, vaddr: u32) -> Option<u32>;

    /// Advance devices by the given number of CPU cycles
    fn tick(&mut self, cycles: u32) -> Result<()>;

    /// Whether the interrupt controller is asserting the CPU's IRQ line
    fn irq_pending(&self) -> bool;

    /// Copy a byte image into memory starting at `vaddr`
    fn copy_to_ram(&mut self, vaddr: u32, data: &[u8]) -> Result<()> {
        for (i, &byte) in data.iter().enumerate() {
            self.write8(vaddr.wrapping_add(i as u32), byte)?;
        }
        Ok(())
    }
}

/// Reference memory bus
///
/// Holds RAM, scratchpad, BIOS ROM and the cache control register, plus the
/// two interrupt controller registers so guest code can mask and acknowledge
/// the IRQ line. Other I/O ports read as zero and ignore writes.
pub struct MemoryBus {
    /// Main RAM (2MB)
    ///
    /// Physical address: 0x00000000-0x001FFFFF, mirrored up to 0x007FFFFF
    ram: Vec<u8>,

    /// Scratchpad (1KB fast RAM)
    ///
    /// Physical address: 0x1F800000-0x1F8003FF
    scratchpad: [u8; SCRATCHPAD_SIZE],

    /// BIOS ROM (512KB)
    ///
    /// Physical address: 0x1FC00000-0x1FC7FFFF
    bios: Vec<u8>,

    /// Cache Control register (0xFFFE0130)
    cache_control: u32,

    /// I_STAT: latched interrupt requests
    irq_status: u16,

    /// I_MASK: enabled interrupt sources
    irq_mask: u16,

    /// Total cycles reported through `tick`
    ticks: u64,
}

impl MemoryBus {
    /// Create a new bus with all memory zeroed
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::memory::{Bus, MemoryBus};
    ///
    /// let mut bus = MemoryBus::new();
    /// assert_eq!(bus.read32(0xBFC00000).unwrap(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; RAM_SIZE],
            scratchpad: [0u8; SCRATCHPAD_SIZE],
            bios: vec![0u8; BIOS_SIZE],
            cache_control: 0,
            irq_status: 0,
            irq_mask: 0,
            ticks: 0,
        }
    }

    /// Reset the bus to initial state
    ///
    /// Clears RAM, scratchpad and interrupt state. BIOS contents are preserved.
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::memory::{Bus, MemoryBus};
    ///
    /// let mut bus = MemoryBus::new();
    /// bus.write32(0x80000000, 0x12345678).unwrap();
    /// bus.reset();
    /// assert_eq!(bus.read32(0x80000000).unwrap(), 0x00000000);
    /// ```
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.scratchpad.fill(0);
        self.cache_control = 0;
        self.irq_status = 0;
        self.irq_mask = 0;
        self.ticks = 0;
    }

    /// Load BIOS from file
    ///
    /// The file must be exactly 512KB in size.
    ///
    /// # Errors
    ///
    /// - `EmulatorError::BiosNotFound` if the file cannot be opened
    /// - `EmulatorError::InvalidBiosSize` if the file is not 512KB
    /// - `EmulatorError::Io` if reading fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// use psrx_cpu::core::memory::MemoryBus;
    ///
    /// let mut bus = MemoryBus::new();
    /// bus.load_bios("SCPH1001.BIN").unwrap();
    /// ```
    pub fn load_bios<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|_| EmulatorError::BiosNotFound(path.display().to_string()))?;

        let metadata = file.metadata()?;

        if metadata.len() != BIOS_SIZE as u64 {
            return Err(EmulatorError::InvalidBiosSize {
                expected: BIOS_SIZE,
                got: metadata.len() as usize,
            });
        }

        file.read_exact(&mut self.bios)?;
        log::info!("BIOS loaded from {}", path.display());

        Ok(())
    }

    /// Write raw bytes into the BIOS image
    ///
    /// Guest writes to the BIOS are ignored; this is the host-side way to
    /// place code there (tests, benchmarks, homebrew boot stubs).
    ///
    /// # Errors
    ///
    /// Returns `InvalidMemoryAccess` if the data does not fit in the ROM.
    pub fn write_bios(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= BIOS_SIZE)
            .ok_or(EmulatorError::InvalidMemoryAccess {
                address: BIOS_START.wrapping_add(offset as u32),
            })?;
        self.bios[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Latch interrupt request bits into I_STAT
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::memory::{Bus, MemoryBus};
    ///
    /// let mut bus = MemoryBus::new();
    /// bus.write32(0x1F801074, 0x1).unwrap(); // unmask VBLANK
    /// bus.request_irq(0x1);
    /// assert!(bus.irq_pending());
    /// ```
    pub fn request_irq(&mut self, bits: u16) {
        self.irq_status |= bits;
    }

    /// Total cycles the CPU has reported through [`Bus::tick`]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Return the backing slice and offset of a passive memory region
    fn memory_at(&self, paddr: u32) -> Option<(&[u8], usize)> {
        if (RAM_START..=RAM_END).contains(&paddr) {
            Some((&self.ram, (paddr & RAM_MASK) as usize))
        } else if (SCRATCHPAD_START..=SCRATCHPAD_END).contains(&paddr) {
            Some((&self.scratchpad, (paddr - SCRATCHPAD_START) as usize))
        } else if (BIOS_START..=BIOS_END).contains(&paddr) {
            Some((&self.bios, (paddr - BIOS_START) as usize))
        } else {
            None
        }
    }

    /// Mutable backing slice for guest-writable memory (RAM and scratchpad)
    fn memory_at_mut(&mut self, paddr: u32) -> Option<(&mut [u8], usize)> {
        if (RAM_START..=RAM_END).contains(&paddr) {
            Some((&mut self.ram, (paddr & RAM_MASK) as usize))
        } else if (SCRATCHPAD_START..=SCRATCHPAD_END).contains(&paddr) {
            Some((&mut self.scratchpad, (paddr - SCRATCHPAD_START) as usize))
        } else {
            None
        }
    }

    /// Little-endian read of `size` bytes; `size` is 1, 2 or 4
    fn read_sized(&self, vaddr: u32, size: usize) -> Result<u32> {
        if vaddr as usize & (size - 1) != 0 {
            return Err(EmulatorError::UnalignedAccess {
                address: vaddr,
                size: size as u8,
            });
        }

        let paddr = translate_address(vaddr);

        match identify_region(vaddr) {
            MemoryRegion::RAM | MemoryRegion::Scratchpad | MemoryRegion::BIOS => {
                let (mem, offset) = self
                    .memory_at(paddr)
                    .ok_or(EmulatorError::InvalidMemoryAccess { address: vaddr })?;
                let mut bytes = [0u8; 4];
                bytes[..size].copy_from_slice(&mem[offset..offset + size]);
                Ok(u32::from_le_bytes(bytes))
            }
            MemoryRegion::IO => Ok(self.read_io_port(paddr)),
            MemoryRegion::CacheControl => {
                log::debug!(
                    "Cache control read at 0x{:08X}, returning 0x{:08X}",
                    vaddr,
                    self.cache_control
                );
                Ok(self.cache_control)
            }
            MemoryRegion::Expansion => {
                // Expansion ROM header reads as 0 (no ROM); BIOS probes it as a
                // function pointer table
                if (0x1F00_0000..=0x1F00_00FF).contains(&paddr) {
                    Ok(0)
                } else {
                    log::trace!("Expansion region read at 0x{:08X}", vaddr);
                    Ok(u32::MAX >> (32 - size * 8))
                }
            }
            MemoryRegion::Unmapped => Err(EmulatorError::InvalidMemoryAccess { address: vaddr }),
        }
    }

    fn write_sized(&mut self, vaddr: u32, value: u32, size: usize) -> Result<()> {
        if vaddr as usize & (size - 1) != 0 {
            return Err(EmulatorError::UnalignedAccess {
                address: vaddr,
                size: size as u8,
            });
        }

        let paddr = translate_address(vaddr);

        match identify_region(vaddr) {
            MemoryRegion::RAM | MemoryRegion::Scratchpad => {
                let (mem, offset) = self
                    .memory_at_mut(paddr)
                    .ok_or(EmulatorError::InvalidMemoryAccess { address: vaddr })?;
                mem[offset..offset + size].copy_from_slice(&value.to_le_bytes()[..size]);
                Ok(())
            }
            MemoryRegion::BIOS => {
                log::warn!("Attempted write to BIOS region at 0x{:08X} (ignored)", vaddr);
                Ok(())
            }
            MemoryRegion::IO => {
                self.write_io_port(paddr, value);
                Ok(())
            }
            MemoryRegion::CacheControl => {
                log::debug!("Cache control write: 0x{:08X}", value);
                self.cache_control = value;
                Ok(())
            }
            MemoryRegion::Expansion => {
                log::trace!("Expansion region write at 0x{:08X} (ignored)", vaddr);
                Ok(())
            }
            MemoryRegion::Unmapped => Err(EmulatorError::InvalidMemoryAccess { address: vaddr }),
        }
    }

    fn read_io_port(&self, paddr: u32) -> u32 {
        match paddr & !3 {
            I_STAT => self.irq_status as u32,
            I_MASK => self.irq_mask as u32,
            _ => {
                log::trace!("I/O port read at 0x{:08X} (unmapped device)", paddr);
                0
            }
        }
    }

    fn write_io_port(&mut self, paddr: u32, value: u32) {
        match paddr & !3 {
            // Writing 0 to a status bit acknowledges it
            I_STAT => self.irq_status &= value as u16,
            I_MASK => self.irq_mask = value as u16,
            _ => log::trace!(
                "I/O port write at 0x{:08X} = 0x{:08X} (unmapped device)",
                paddr,
                value
            ),
        }
    }
}

impl Bus for MemoryBus {
    fn read8(&mut self, vaddr: u32) -> Result<u8> {
        self.read_sized(vaddr, 1).map(|v| v as u8)
    }

    fn read16(&mut self, vaddr: u32) -> Result<u16> {
        self.read_sized(vaddr, 2).map(|v| v as u16)
    }

    fn read32(&mut self, vaddr: u32) -> Result<u32> {
        self.read_sized(vaddr, 4)
    }

    fn write8(&mut self, vaddr: u32, value: u8) -> Result<()> {
        self.write_sized(vaddr, value as u32, 1)
    }

    fn write16(&mut self, vaddr: u32, value: u16) -> Result<()> {
        self.write_sized(vaddr, value as u32, 2)
    }

    fn write32(&mut self, vaddr: u32, value: u32) -> Result<()> {
        self.write_sized(vaddr, value, 4)
    }

    fn peek32(&self, vaddr: u32) -> Option<u32> {
        if vaddr & 3 != 0 {
            return None;
        }
        let (mem, offset) = self.memory_at(translate_address(vaddr))?;
        let bytes = mem.get(offset..offset + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn tick(&mut self, cycles: u32) -> Result<()> {
        self.ticks += cycles as u64;
        Ok(())
    }

    fn irq_pending(&self) -> bool {
        self.irq_status & self.irq_mask != 0
    }

    fn copy_to_ram(&mut self, vaddr: u32, data: &[u8]) -> Result<()> {
        let paddr = translate_address(vaddr);
        let offset = (paddr & RAM_MASK) as usize;
        let end = offset + data.len();

        if !(RAM_START..=RAM_END).contains(&paddr) || end > RAM_SIZE {
            return Err(EmulatorError::LoaderError(format!(
                "image of {} bytes at 0x{:08X} does not fit in RAM",
                data.len(),
                vaddr
            )));
        }

        self.ram[offset..end].copy_from_slice(data);
        Ok(())
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

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

//! Dynamic recompiler (x86-64 hosts)
//!
//! Guest code is translated one block at a time into native code that
//! operates directly on the `CPU` struct. Compiled blocks live in a
//! [`CodePool`] and are indexed by a [`BlockCache`]; RAM blocks are
//! re-validated against a checksum of live memory before every run so that
//! self-modifying code is picked up.
//!
//! # Example
//!
//! ```
//! use psrx_cpu::core::cpu::CPU;
//! use psrx_cpu::core::gte::RegisterBank;
//! use psrx_cpu::core::jit::Recompiler;
//! use psrx_cpu::core::memory::{Bus, MemoryBus};
//!
//! let mut cpu = CPU::new();
//! let mut bus = MemoryBus::new();
//! let mut gte = RegisterBank::new();
//! let mut jit = Recompiler::<MemoryBus, RegisterBank>::new(1024 * 1024).unwrap();
//!
//! // ori $t0, $zero, 0x42 ; jr $ra ; nop
//! for (n, word) in [0x34080042u32, 0x03E00008, 0].iter().enumerate() {
//!     bus.write32(0x8001_0000 + 4 * n as u32, *word).unwrap();
//! }
//! cpu.set_pc(0x8001_0000);
//!
//! jit.step_block(&mut cpu, &mut bus, &mut gte).unwrap();
//! assert_eq!(cpu.reg(8), 0x42);
//! assert_eq!(jit.cached_blocks(), 1);
//! ```

pub mod abi;
pub mod block;
mod dispatcher;
pub mod emitter;
pub mod pool;
pub mod trampolines;

#[cfg(test)]
mod tests;

pub use abi::{BlockFn, NativeContext};
pub use block::{BlockCache, CacheBlock, GuestBlock, MAX_BLOCK_INSTRUCTIONS};
pub use pool::{CodePool, CodeSpan, CODE_ALIGN};
pub use trampolines::TrampolineTable;

use crate::core::cpu::CPU;
use crate::core::error::{JitError, Result};
use crate::core::gte::Gte;
use crate::core::memory::{Bus, CodeRegion};
use serde::Serialize;
use std::marker::PhantomData;

/// Counters exposed for diagnostics and benchmarks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecompilerStats {
    /// Blocks compiled, including recompilations
    pub compiled: u64,
    /// Blocks dropped because live memory no longer matched
    pub invalidated: u64,
    /// Blocks executed natively
    pub blocks_run: u64,
    /// Instructions run by the interpreter: outside BIOS/RAM or in a
    /// pending delay slot
    pub fallback_steps: u64,
    pub pool_resets: u64,
}

/// Block cache, code pool and trampolines for one bus/GTE pair
pub struct Recompiler<B, G> {
    cache: BlockCache,
    pool: CodePool,
    calls: TrampolineTable,
    stats: RecompilerStats,
    _engine: PhantomData<fn(&mut B, &mut G)>,
}

impl<B: Bus, G: Gte> Recompiler<B, G> {
    /// Create a recompiler with a `pool_size`-byte code pool
    ///
    /// # Errors
    ///
    /// `ExecutableMemory` if the pool cannot be mapped.
    pub fn new(pool_size: usize) -> Result<Self> {
        let pool = CodePool::new(pool_size)?;
        log::info!(
            "Recompiler ready: {} KiB code pool",
            pool.capacity() / 1024
        );
        Ok(Self {
            cache: BlockCache::new(),
            pool,
            calls: TrampolineTable::for_bus::<B, G>(),
            stats: RecompilerStats::default(),
            _engine: PhantomData,
        })
    }

    pub fn cached_blocks(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> RecompilerStats {
        self.stats
    }

    pub fn pool(&self) -> &CodePool {
        &self.pool
    }

    /// Compiled block for `address`, if any
    pub fn block(&self, address: u32) -> Option<&CacheBlock> {
        let (region, slot) = CodeRegion::classify(address)?;
        self.cache.get(region, slot)
    }

    /// Drop every compiled block and recycle the whole pool
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
        self.pool.reset();
        self.stats.pool_resets += 1;
    }

    /// Replace a pool whose mapping was lost, dropping every cached block
    fn remap_pool(&mut self) -> Result<()> {
        log::warn!(
            "Code pool lost its mapping, dropping {} blocks",
            self.cache.len()
        );
        self.cache.clear();
        self.pool = CodePool::new(self.pool.capacity())?;
        self.stats.pool_resets += 1;
        Ok(())
    }

    /// Find a runnable block for `pc`, compiling it if needed
    ///
    /// Returns `None` when `pc` lies outside BIOS and RAM; the caller
    /// interprets a single instruction instead.
    pub(crate) fn resolve(&mut self, cpu: &CPU, bus: &B, pc: u32) -> Result<Option<(BlockFn, u32)>> {
        let Some((region, slot)) = CodeRegion::classify(pc) else {
            return Ok(None);
        };

        if !self.pool.is_mapped() {
            self.remap_pool()?;
        }

        if let Some(block) = self.cache.get(region, slot) {
            let valid = block.address == pc
                && match region {
                    CodeRegion::Bios => true,
                    CodeRegion::Ram => {
                        block::live_checksum(bus, block.address, block.instruction_count)
                            == Some(block.checksum)
                    }
                };
            if valid {
                return Ok(Some((block.entry, block.total_cycles)));
            }

            log::debug!(
                "Block at 0x{:08X} is stale (compiled for 0x{:08X}), recompiling",
                pc,
                block.address
            );
            self.stats.invalidated += 1;
        }

        let block = self.compile(cpu, bus, region, slot, pc)?;
        Ok(Some((block.entry, block.total_cycles)))
    }

    fn compile(
        &mut self,
        cpu: &CPU,
        bus: &B,
        region: CodeRegion,
        slot: usize,
        pc: u32,
    ) -> Result<&CacheBlock> {
        let guest = GuestBlock::scan(bus, pc)?;
        let code = emitter::compile_block(&guest, &self.calls)?;

        if code.len().next_multiple_of(CODE_ALIGN) > self.pool.capacity() {
            return Err(JitError::PoolExhausted {
                requested: code.len(),
                capacity: self.pool.capacity(),
            }
            .into());
        }

        if let Some(old) = self.cache.remove(region, slot) {
            self.pool.release(old.span);
        }

        let span = match self.pool.allocate(code.len()) {
            Some(span) => span,
            None => {
                log::debug!(
                    "Code pool full at 0x{:08X}, flushing {} blocks",
                    pc,
                    self.cache.len()
                );
                self.invalidate_all();
                self.pool
                    .allocate(code.len())
                    .ok_or(JitError::PoolExhausted {
                        requested: code.len(),
                        capacity: self.pool.capacity(),
                    })?
            }
        };

        if let Err(error) = self.pool.write(span, &code) {
            // The mapping is gone and every cached entry with it
            self.cache.clear();
            return Err(error.into());
        }
        let entry = self
            .pool
            .entry(span)
            .ok_or_else(|| JitError::Unsupported("code span outside the pool".to_string()))?;
        // SAFETY: `entry` points at a finished, executable `BlockFn` body
        let entry = unsafe { std::mem::transmute::<*const u8, BlockFn>(entry) };

        let instruction_count = guest.words.len() as u32;
        let block = CacheBlock {
            address: pc,
            instruction_count,
            total_cycles: instruction_count * cpu.cycles_at(pc),
            checksum: guest.checksum(),
            span,
            entry,
        };

        log::trace!(
            "Compiled block 0x{:08X}: {} instructions, {} bytes at +0x{:X}",
            pc,
            instruction_count,
            code.len(),
            span.offset
        );

        self.stats.compiled += 1;
        self.cache.insert(region, slot, block);
        self.cache
            .get(region, slot)
            .ok_or_else(|| JitError::Unsupported(format!("no cache slot for 0x{:08X}", pc)).into())
    }
}

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

//! Guest block discovery and the block cache
//!
//! Blocks are keyed by the 4-byte slot of their first instruction. BIOS and
//! RAM each get one flat slot array; RAM mirrors fold onto the same slot.

use super::abi::BlockFn;
use super::pool::CodeSpan;
use crate::core::cpu::Instruction;
use crate::core::error::{JitError, Result};
use crate::core::memory::{Bus, CodeRegion};

/// Longest block before a forced split
pub const MAX_BLOCK_INSTRUCTIONS: usize = 127;

/// A compiled block
#[derive(Debug, Clone)]
pub struct CacheBlock {
    /// Guest address the block was compiled from
    pub address: u32,
    pub instruction_count: u32,
    /// `instruction_count` times the region's per-instruction cost
    pub total_cycles: u32,
    /// Wrapping sum of the raw instruction words
    pub checksum: u32,
    pub span: CodeSpan,
    pub entry: BlockFn,
}

/// Raw words of a block, as found in guest memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestBlock {
    pub address: u32,
    pub words: Vec<u32>,
}

impl GuestBlock {
    /// Walk guest code from `address` until the block ends
    ///
    /// A block ends after a branch and its delay slot, after SYSCALL or
    /// BREAK, at the instruction cap, or where the code region ends.
    ///
    /// # Errors
    ///
    /// `ChecksumUnavailable` if the first word cannot be read without side
    /// effects.
    pub fn scan<B: Bus>(bus: &B, address: u32) -> Result<Self> {
        let (region, first_slot) = CodeRegion::classify(address)
            .ok_or(JitError::ChecksumUnavailable { address })?;

        let mut words = Vec::with_capacity(16);
        let mut pc = address;
        let mut delay_slot_due = false;

        loop {
            let word = match bus.peek32(pc) {
                Some(word) => word,
                None if words.is_empty() => {
                    return Err(JitError::ChecksumUnavailable { address: pc }.into())
                }
                None => break,
            };
            words.push(word);

            if delay_slot_due {
                break;
            }

            let instruction = Instruction(word);
            if instruction.is_syscall_or_break() {
                break;
            }
            if instruction.is_branch() {
                delay_slot_due = true;
            } else if words.len() >= MAX_BLOCK_INSTRUCTIONS {
                break;
            }

            let next = pc.wrapping_add(4);
            match CodeRegion::classify(next) {
                Some((next_region, slot))
                    if next_region == region && slot == first_slot + words.len() => {}
                _ => break,
            }
            pc = next;
        }

        Ok(Self { address, words })
    }

    pub fn checksum(&self) -> u32 {
        checksum(&self.words)
    }
}

pub fn checksum(words: &[u32]) -> u32 {
    words.iter().fold(0u32, |sum, &word| sum.wrapping_add(word))
}

/// Checksum of `count` words of live guest memory from `address`
pub fn live_checksum<B: Bus>(bus: &B, address: u32, count: u32) -> Option<u32> {
    let mut sum = 0u32;
    for n in 0..count {
        sum = sum.wrapping_add(bus.peek32(address.wrapping_add(n * 4))?);
    }
    Some(sum)
}

/// Slot arrays for both code regions
pub struct BlockCache {
    bios: Vec<Option<Box<CacheBlock>>>,
    ram: Vec<Option<Box<CacheBlock>>>,
    live: usize,
}

impl BlockCache {
    pub fn new() -> Self {
        Self {
            bios: std::iter::repeat_with(|| None)
                .take(CodeRegion::Bios.slot_count())
                .collect(),
            ram: std::iter::repeat_with(|| None)
                .take(CodeRegion::Ram.slot_count())
                .collect(),
            live: 0,
        }
    }

    fn slots(&self, region: CodeRegion) -> &[Option<Box<CacheBlock>>] {
        match region {
            CodeRegion::Bios => &self.bios,
            CodeRegion::Ram => &self.ram,
        }
    }

    fn slots_mut(&mut self, region: CodeRegion) -> &mut [Option<Box<CacheBlock>>] {
        match region {
            CodeRegion::Bios => &mut self.bios,
            CodeRegion::Ram => &mut self.ram,
        }
    }

    pub fn get(&self, region: CodeRegion, slot: usize) -> Option<&CacheBlock> {
        self.slots(region).get(slot)?.as_deref()
    }

    /// Install a block, returning the one it replaces
    pub fn insert(
        &mut self,
        region: CodeRegion,
        slot: usize,
        block: CacheBlock,
    ) -> Option<CacheBlock> {
        let entry = self.slots_mut(region).get_mut(slot)?;
        let old = entry.replace(Box::new(block)).map(|old| *old);
        if old.is_none() {
            self.live += 1;
        }
        old
    }

    pub fn remove(&mut self, region: CodeRegion, slot: usize) -> Option<CacheBlock> {
        let old = self.slots_mut(region).get_mut(slot)?.take().map(|old| *old);
        if old.is_some() {
            self.live -= 1;
        }
        old
    }

    /// Drop every block
    pub fn clear(&mut self) {
        if self.live == 0 {
            return;
        }
        self.bios.iter_mut().for_each(|slot| *slot = None);
        self.ram.iter_mut().for_each(|slot| *slot = None);
        self.live = 0;
    }

    /// Number of compiled blocks
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new()
    }
}

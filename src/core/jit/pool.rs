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

//! Executable memory pool
//!
//! One fixed mapping holds every compiled block. Allocation tries the free
//! list of superseded blocks first (best fit), then bumps the top pointer.
//! The mapping stays executable except while a block is being copied in.

use crate::core::error::JitError;
use dynasmrt::mmap::{ExecutableBuffer, MutableBuffer};

/// Allocation granularity and alignment of block entry points
pub const CODE_ALIGN: usize = 16;

/// A range of the pool owned by one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSpan {
    pub offset: usize,
    pub size: usize,
}

pub struct CodePool {
    memory: Option<ExecutableBuffer>,
    capacity: usize,
    top: usize,
    free: Vec<CodeSpan>,
    resets: u64,
}

impl CodePool {
    /// Map `capacity` bytes of executable memory
    ///
    /// # Errors
    ///
    /// `ExecutableMemory` if the mapping or protection change fails.
    pub fn new(capacity: usize) -> Result<Self, JitError> {
        let mut buffer = MutableBuffer::new(capacity)?;
        buffer.set_len(capacity);
        let memory = buffer.make_exec()?;

        log::debug!("Code pool mapped: {} KiB", capacity / 1024);

        Ok(Self {
            memory: Some(memory),
            capacity,
            top: 0,
            free: Vec::new(),
            resets: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes below the bump pointer, including freed spans
    pub fn used(&self) -> usize {
        self.top
    }

    pub fn free_spans(&self) -> usize {
        self.free.len()
    }

    /// False once a failed protection flip has dropped the mapping
    pub fn is_mapped(&self) -> bool {
        self.memory.is_some()
    }

    #[cfg(test)]
    pub(crate) fn unmap(&mut self) {
        self.memory = None;
    }

    /// Number of full resets so far
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Reserve room for `len` bytes of code
    ///
    /// Returns `None` when neither the free list nor the bump region can
    /// satisfy the request; the caller resets the pool and retries.
    pub fn allocate(&mut self, len: usize) -> Option<CodeSpan> {
        let size = len.max(1).next_multiple_of(CODE_ALIGN);

        let best = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, span)| span.size >= size)
            .min_by_key(|(_, span)| span.size)
            .map(|(index, _)| index);

        if let Some(index) = best {
            return Some(self.free.swap_remove(index));
        }

        if self.top + size <= self.capacity {
            let span = CodeSpan {
                offset: self.top,
                size,
            };
            self.top += size;
            return Some(span);
        }

        None
    }

    /// Return a superseded block's span to the free list
    pub fn release(&mut self, span: CodeSpan) {
        self.free.push(span);
    }

    /// Forget every allocation
    ///
    /// Every entry pointer handed out before is dangling afterwards; the
    /// block cache must be invalidated together with the pool.
    pub fn reset(&mut self) {
        self.top = 0;
        self.free.clear();
        self.resets += 1;
        log::debug!("Code pool reset (#{})", self.resets);
    }

    /// Copy finished machine code into `span`
    ///
    /// # Errors
    ///
    /// `ExecutableMemory` if the protection flip fails. The mapping is
    /// dropped and [`CodePool::is_mapped`] turns false; every entry pointer
    /// handed out before is dangling.
    pub fn write(&mut self, span: CodeSpan, code: &[u8]) -> Result<(), JitError> {
        debug_assert!(code.len() <= span.size);

        let memory = self.memory.take().ok_or_else(|| {
            JitError::ExecutableMemory(std::io::Error::other("code pool is not mapped"))
        })?;

        let mut writable = memory.make_mut()?;
        writable[span.offset..span.offset + code.len()].copy_from_slice(code);
        self.memory = Some(writable.make_exec()?);
        Ok(())
    }

    /// Address of the first byte of `span`
    pub fn entry(&self, span: CodeSpan) -> Option<*const u8> {
        let memory = self.memory.as_ref()?;
        if span.offset + span.size > memory.len() {
            return None;
        }
        Some(memory[span.offset..].as_ptr())
    }
}

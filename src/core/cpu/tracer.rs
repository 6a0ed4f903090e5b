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

//! CPU execution tracer
//!
//! Writes one line per traced instruction (interpreter) or per block entry
//! (recompiler) to a file, with a budget after which tracing turns itself off.

use super::{Disassembler, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct CpuTracer {
    enabled: bool,
    output: BufWriter<File>,
    remaining: u64,
}

impl CpuTracer {
    /// Create a tracer writing to `path`, stopping after `limit` lines
    pub fn new<P: AsRef<Path>>(path: P, limit: u64) -> Result<Self> {
        let output = BufWriter::new(File::create(path)?);
        Ok(Self {
            enabled: true,
            output,
            remaining: limit,
        })
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Trace the instruction at the CPU's PC
    pub fn trace<B: Bus>(&mut self, cpu: &CPU, bus: &B) -> Result<()> {
        self.write_line(cpu, bus, "")
    }

    /// Trace entry into a compiled block of `count` instructions
    pub fn trace_block<B: Bus>(&mut self, cpu: &CPU, bus: &B, count: u32) -> Result<()> {
        self.write_line(cpu, bus, &format!(" [block x{}]", count))
    }

    fn write_line<B: Bus>(&mut self, cpu: &CPU, bus: &B, suffix: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let pc = cpu.pc();
        let line = match bus.peek32(pc) {
            Some(word) => format!(
                "PC=0x{:08X} [0x{:08X}] {:32} | v0={:08X} a0={:08X} sp={:08X} ra={:08X}{}",
                pc,
                word,
                Disassembler::disassemble(word, pc),
                cpu.reg(2),
                cpu.reg(4),
                cpu.reg(29),
                cpu.reg(31),
                suffix
            ),
            None => format!("PC=0x{:08X} [unreadable]{}", pc, suffix),
        };
        writeln!(self.output, "{}", line)?;

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            log::info!("Trace limit reached, disabling tracer");
            self.enabled = false;
            self.output.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

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

//! CPU test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: CPU initialization, reset, register access, PC handling
//! - `load_delay`: Load delay slot behavior through the pipeline
//! - `exceptions`: Exception entry, delay slot EPC, interrupts
//! - `cop0`: COP0 coprocessor operations (MFC0, MTC0, RFE)
//! - `cop2`: GTE transfers and coprocessor-unusable faults
//! - `decode`: Instruction field decoding
//! - `instructions`: Instruction execution tests

mod load_delay;

use super::CPU;
use crate::core::gte::RegisterBank;
use crate::core::memory::{Bus, MemoryBus};

/// Address test programs are placed at (KSEG0 RAM)
pub(crate) const PROGRAM_BASE: u32 = 0x8001_0000;

/// A CPU with a RAM-resident program and reference collaborators
pub(crate) struct Harness {
    pub cpu: CPU,
    pub bus: MemoryBus,
    pub gte: RegisterBank,
}

impl Harness {
    pub fn new(program: &[u32]) -> Self {
        let mut bus = MemoryBus::new();
        for (n, word) in program.iter().enumerate() {
            bus.write32(PROGRAM_BASE + (n as u32) * 4, *word).unwrap();
        }

        let mut cpu = CPU::new();
        cpu.set_pc(PROGRAM_BASE);

        Self {
            cpu,
            bus,
            gte: RegisterBank::new(),
        }
    }

    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus, &mut self.gte).unwrap()
    }

    pub fn run(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }
}

// Minimal encoders for hand-written test programs

pub(crate) fn special(funct: u32, rs: u32, rt: u32, rd: u32, shamt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6) | funct
}

pub(crate) fn itype(op: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | imm as u32
}

pub(crate) fn addu(rd: u32, rs: u32, rt: u32) -> u32 {
    special(0x21, rs, rt, rd, 0)
}

pub(crate) fn ori(rt: u32, rs: u32, imm: u16) -> u32 {
    itype(0x0D, rs, rt, imm)
}

pub(crate) fn lui(rt: u32, imm: u16) -> u32 {
    itype(0x0F, 0, rt, imm)
}

pub(crate) fn lw(rt: u32, offset: i16, base: u32) -> u32 {
    itype(0x23, base, rt, offset as u16)
}

pub(crate) fn sw(rt: u32, offset: i16, base: u32) -> u32 {
    itype(0x2B, base, rt, offset as u16)
}

pub(crate) fn beq(rs: u32, rt: u32, offset: i16) -> u32 {
    itype(0x04, rs, rt, offset as u16)
}

pub(crate) fn mtc0(rt: u32, rd: u32) -> u32 {
    (0x10 << 26) | (0x04 << 21) | (rt << 16) | (rd << 11)
}

pub(crate) fn mfc0(rt: u32, rd: u32) -> u32 {
    (0x10 << 26) | (rt << 16) | (rd << 11)
}

pub(crate) const NOP: u32 = 0;
pub(crate) const SYSCALL: u32 = 0x0000_000C;
pub(crate) const RFE: u32 = 0x4200_0010;

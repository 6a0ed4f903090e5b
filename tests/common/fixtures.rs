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

//! Test fixtures: a bare CPU with reference collaborators and a small
//! instruction encoder

use psrx_cpu::core::cpu::CPU;
use psrx_cpu::core::gte::RegisterBank;
use psrx_cpu::core::loader::PSXExecutable;
use psrx_cpu::core::memory::{Bus, MemoryBus};

/// Where test programs are placed (KSEG0 RAM)
pub const PROGRAM_BASE: u32 = 0x8001_0000;

/// Scratch data area used by load/store programs
pub const DATA_BASE: u32 = 0x8002_0000;

/// A CPU, a reference bus and a GTE register bank
pub struct Machine {
    pub cpu: CPU,
    pub bus: MemoryBus,
    pub gte: RegisterBank,
}

impl Machine {
    /// Place `program` at `PROGRAM_BASE` and point the CPU at it
    pub fn with_program(program: &[u32]) -> Self {
        let mut bus = MemoryBus::new();
        for (n, word) in program.iter().enumerate() {
            bus.write32(PROGRAM_BASE + 4 * n as u32, *word)
                .expect("program fits in RAM");
        }

        let mut cpu = CPU::new();
        cpu.set_pc(PROGRAM_BASE);

        Self {
            cpu,
            bus,
            gte: RegisterBank::new(),
        }
    }

    /// Interpret `count` instructions
    pub fn interpret(&mut self, count: usize) {
        for _ in 0..count {
            let cycles = self.cpu.step(&mut self.bus, &mut self.gte).expect("step");
            self.bus.tick(cycles).expect("tick");
        }
    }

    /// Words of the scratch data area
    pub fn data(&self, words: usize) -> Vec<Option<u32>> {
        (0..words)
            .map(|n| self.bus.peek32(DATA_BASE + 4 * n as u32))
            .collect()
    }
}

/// Wrap a program into a loadable PS-X EXE at `PROGRAM_BASE`
pub fn exe(program: &[u32], gp: u32) -> PSXExecutable {
    let code: Vec<u8> = program.iter().flat_map(|w| w.to_le_bytes()).collect();
    let mut bytes = PSXExecutable::build(PROGRAM_BASE, PROGRAM_BASE, &code);
    bytes[0x14..0x18].copy_from_slice(&gp.to_le_bytes());
    PSXExecutable::load(&bytes).expect("valid EXE image")
}

// Encoders

pub fn special(funct: u32, rs: u32, rt: u32, rd: u32, shamt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6) | funct
}

pub fn itype(op: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | u32::from(imm)
}

pub fn addiu(rt: u32, rs: u32, imm: i16) -> u32 {
    itype(0x09, rs, rt, imm as u16)
}

pub fn addu(rd: u32, rs: u32, rt: u32) -> u32 {
    special(0x21, rs, rt, rd, 0)
}

pub fn lui(rt: u32, imm: u16) -> u32 {
    itype(0x0F, 0, rt, imm)
}

pub fn ori(rt: u32, rs: u32, imm: u16) -> u32 {
    itype(0x0D, rs, rt, imm)
}

pub fn lw(rt: u32, offset: i16, base: u32) -> u32 {
    itype(0x23, base, rt, offset as u16)
}

pub fn sw(rt: u32, offset: i16, base: u32) -> u32 {
    itype(0x2B, base, rt, offset as u16)
}

pub fn bne(rs: u32, rt: u32, offset: i16) -> u32 {
    itype(0x05, rs, rt, offset as u16)
}

pub fn beq(rs: u32, rt: u32, offset: i16) -> u32 {
    itype(0x04, rs, rt, offset as u16)
}

pub fn jal(target: u32) -> u32 {
    (0x03 << 26) | ((target >> 2) & 0x03FF_FFFF)
}

pub fn jr(rs: u32) -> u32 {
    special(0x08, rs, 0, 0, 0)
}

/// `beq zero, zero, -1`: spin on the current instruction
pub const SPIN: u32 = 0x1000_FFFF;

pub const NOP: u32 = 0;

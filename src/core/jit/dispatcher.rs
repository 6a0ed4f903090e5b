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

//! Block dispatch loop

use super::abi::{BlockFn, NativeContext};
use super::Recompiler;
use crate::core::cpu::{Instruction, CPU};
use crate::core::error::{EmulatorError, Result};
use crate::core::gte::Gte;
use crate::core::memory::Bus;

impl<B: Bus, G: Gte> Recompiler<B, G> {
    /// Run one block, or one interpreted instruction outside BIOS/RAM
    ///
    /// A pending branch means PC is a delay slot whose successor is the
    /// branch target, which a straight-line block cannot express; that slot
    /// is interpreted on its own.
    ///
    /// Ticks the bus by the cycles spent and, after a native block, polls the
    /// interrupt line the way the interpreter does before its next fetch.
    ///
    /// # Errors
    ///
    /// `CpuHalted` once the CPU has halted, bus errors raised by the block,
    /// `UnimplementedInstruction`, and recompiler errors.
    pub fn step_block(&mut self, cpu: &mut CPU, bus: &mut B, gte: &mut G) -> Result<u32> {
        if cpu.is_halted() {
            return Err(EmulatorError::CpuHalted {
                pc: cpu.current_pc(),
            });
        }

        if cpu.branch_pending() {
            self.stats.fallback_steps += 1;
            let cycles = cpu.step(bus, gte)?;
            bus.tick(cycles)?;
            return Ok(cycles);
        }

        let pc = cpu.pc();
        if pc & 3 != 0 {
            let cycles = cpu.cycles_at(pc);
            cpu.fetch_address_error();
            bus.tick(cycles)?;
            return Ok(cycles);
        }

        let Some((entry, cycles)) = self.resolve(cpu, bus, pc)? else {
            self.stats.fallback_steps += 1;
            let cycles = cpu.step(bus, gte)?;
            bus.tick(cycles)?;
            return Ok(cycles);
        };

        execute(entry, cpu, bus, gte)?;
        self.stats.blocks_run += 1;
        bus.tick(cycles)?;

        let next = cpu.pc();
        if next & 3 == 0 {
            let word = Instruction(bus.peek32(next).unwrap_or(0));
            if cpu.interrupt_ready(bus.irq_pending(), word) {
                cpu.interrupt_between_instructions();
            }
        }

        Ok(cycles)
    }

    /// Run blocks until at least `budget` cycles have elapsed
    ///
    /// Returns the cycles actually consumed, which overshoots the budget by
    /// at most one block.
    pub fn run_frame(&mut self, cpu: &mut CPU, bus: &mut B, gte: &mut G, budget: u32) -> Result<u64> {
        let mut cycles = 0u64;
        while cycles < u64::from(budget) {
            cycles += u64::from(self.step_block(cpu, bus, gte)?);
        }
        Ok(cycles)
    }
}

fn execute<B, G>(entry: BlockFn, cpu: &mut CPU, bus: &mut B, gte: &mut G) -> Result<()> {
    let mut ctx = NativeContext::new(cpu, bus, gte);
    // SAFETY: the context outlives the call and its pointers are the live
    // CPU, bus and GTE this block's trampolines were instantiated for
    unsafe { entry(&mut ctx) };
    match ctx.take_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

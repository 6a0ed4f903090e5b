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

//! MIPS R3000A CPU
//!
//! The CPU state lives in a single `#[repr(C)]` struct shared by the
//! interpreter and the recompiler's native code. Native code addresses fields
//! through the byte offsets exported by [`abi`].
//!
//! # Execution model
//!
//! Each instruction goes through fetch, decode, execute and retire. Execute
//! never writes general purpose registers; results are staged in the
//! [`LoadPipeline`] and committed at retire. This gives the R3000A's load
//! delay for free: a load lands in the `delayed` slot and only reaches the
//! register file at the end of the following instruction.
//!
//! Branches set the `branch` flag and, if taken, `next_pc`. The instruction
//! after a branch then runs with the delay slot flag set, so an exception
//! there reports the branch address in EPC.

use crate::core::config::CycleCosts;
use crate::core::error::{EmulatorError, Result};
use crate::core::gte::Gte;
use crate::core::memory::Bus;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod abi;
mod cop0;
mod disassembler;
mod instruction;
mod instructions;
mod pipeline;
#[cfg(test)]
pub(crate) mod tests;
mod tracer;

pub(crate) use cop0::COP0;
pub use cop0::{ExceptionCause, StatusRegister};
pub use disassembler::Disassembler;
pub use instruction::Instruction;
pub use pipeline::{LoadPipeline, RegisterWrite};
pub use tracer::CpuTracer;

/// Reset vector in BIOS ROM
pub const RESET_VECTOR: u32 = 0xBFC0_0000;

/// General exception vector with SR.BEV set
pub const BOOT_EXCEPTION_VECTOR: u32 = 0xBFC0_0180;

/// General exception vector with SR.BEV clear
pub const EXCEPTION_VECTOR: u32 = 0x8000_0080;

/// CPU state
///
/// Field order is part of the native ABI; see [`abi`].
#[repr(C)]
pub struct CPU {
    /// General purpose registers; r0 is forced to 0 at every retire
    regs: [u32; 32],

    /// Multiply/divide result, high word
    hi: u32,

    /// Multiply/divide result, low word
    lo: u32,

    /// Address of the next instruction to fetch
    pc: u32,

    /// Address of the instruction after that (branch target once a branch is taken)
    next_pc: u32,

    /// Address of the instruction currently executing
    current_pc: u32,

    cop0: COP0,

    pipeline: LoadPipeline,

    /// Set by any branch or jump; the next instruction is its delay slot
    branch: bool,

    /// The current instruction is in a branch delay slot
    in_branch_delay: bool,

    /// Set after a host-fatal error; no further instructions execute
    halted: bool,

    /// Raw word of the current instruction
    current_instruction: u32,

    cycle_costs: CycleCosts,
}

impl CPU {
    /// Create a CPU in its power-on state
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::cpu::CPU;
    ///
    /// let cpu = CPU::new();
    /// assert_eq!(cpu.pc(), 0xBFC00000);
    /// assert_eq!(cpu.hi(), 0xDEADBEEF);
    /// ```
    pub fn new() -> Self {
        Self {
            regs: [0u32; 32],
            hi: 0xDEAD_BEEF,
            lo: 0xDEAD_BEEF,
            pc: RESET_VECTOR,
            next_pc: RESET_VECTOR.wrapping_add(4),
            current_pc: RESET_VECTOR,
            cop0: COP0::new(),
            pipeline: LoadPipeline::new(),
            branch: false,
            in_branch_delay: false,
            halted: false,
            current_instruction: 0,
            cycle_costs: CycleCosts::default(),
        }
    }

    /// Return to the power-on state, keeping the configured cycle costs
    pub fn reset(&mut self) {
        let costs = self.cycle_costs;
        *self = Self::new();
        self.cycle_costs = costs;
    }

    /// Read a general purpose register
    #[inline(always)]
    pub fn reg(&self, index: usize) -> u32 {
        self.regs[index & 31]
    }

    /// Write a general purpose register immediately, bypassing the pipeline
    ///
    /// Host-side accessor (loaders, tests). Guest instructions stage through
    /// the pipeline instead.
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::cpu::CPU;
    ///
    /// let mut cpu = CPU::new();
    /// cpu.set_reg(8, 0x1234);
    /// cpu.set_reg(0, 0xDEADBEEF);
    /// assert_eq!(cpu.reg(8), 0x1234);
    /// assert_eq!(cpu.reg(0), 0);
    /// ```
    #[inline(always)]
    pub fn set_reg(&mut self, index: usize, value: u32) {
        if index & 31 != 0 {
            self.regs[index & 31] = value;
        }
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn next_pc(&self) -> u32 {
        self.next_pc
    }

    /// Address of the most recently started instruction
    pub fn current_pc(&self) -> u32 {
        self.current_pc
    }

    pub fn current_instruction(&self) -> Instruction {
        Instruction(self.current_instruction)
    }

    /// Redirect execution to `pc`, dropping any pending branch
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
        self.branch = false;
        self.in_branch_delay = false;
    }

    /// Check if currently in branch delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.in_branch_delay
    }

    /// A branch executed and its delay slot has not run yet
    pub fn branch_pending(&self) -> bool {
        self.branch
    }

    pub fn pipeline(&self) -> &LoadPipeline {
        &self.pipeline
    }

    /// Read a COP0 register (0 for registers that do not exist)
    pub fn cop0_reg(&self, index: usize) -> u32 {
        self.cop0.read(index)
    }

    /// Raw host-side write of a COP0 register, without MTC0 masking
    pub fn set_cop0_reg(&mut self, index: usize, value: u32) {
        if let Some(reg) = self.cop0.regs.get_mut(index) {
            *reg = value;
        }
    }

    /// MTC0 semantics: writable bits only, unsupported registers ignored
    pub(crate) fn write_cop0(&mut self, index: usize, value: u32) {
        if !self.cop0.write(index, value) {
            log::debug!(
                "MTC0 to unsupported COP0 register {} (value 0x{:08X}) ignored",
                index,
                value
            );
        }
    }

    pub fn status(&self) -> StatusRegister {
        self.cop0.status()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn set_cycle_costs(&mut self, costs: CycleCosts) {
        self.cycle_costs = costs;
    }

    /// Cycles charged for one instruction fetched from `pc`
    #[inline(always)]
    pub fn cycles_at(&self, pc: u32) -> u32 {
        self.cycle_costs.at(pc)
    }

    /// Execute one instruction
    ///
    /// Returns the number of cycles consumed, which depends on the region the
    /// instruction was fetched from.
    ///
    /// # Errors
    ///
    /// Bus errors are returned as-is. An unimplemented instruction halts the
    /// CPU and returns `UnimplementedInstruction`; every later call returns
    /// `CpuHalted`. Guest exceptions are not errors.
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::cpu::CPU;
    /// use psrx_cpu::core::gte::RegisterBank;
    /// use psrx_cpu::core::memory::MemoryBus;
    ///
    /// let mut cpu = CPU::new();
    /// let mut bus = MemoryBus::new();
    /// let mut gte = RegisterBank::new();
    ///
    /// // ori $t0, $zero, 0x42
    /// bus.write_bios(0, &0x34080042u32.to_le_bytes()).unwrap();
    /// cpu.step(&mut bus, &mut gte).unwrap();
    /// assert_eq!(cpu.reg(8), 0x42);
    /// assert_eq!(cpu.pc(), 0xBFC00004);
    /// ```
    pub fn step<B: Bus, G: Gte>(&mut self, bus: &mut B, gte: &mut G) -> Result<u32> {
        if self.halted {
            return Err(EmulatorError::CpuHalted {
                pc: self.current_pc,
            });
        }

        self.current_pc = self.pc;
        let cycles = self.cycles_at(self.current_pc);

        if self.pc & 3 != 0 {
            self.fetch_address_error();
            return Ok(cycles);
        }

        let instruction = Instruction(bus.read32(self.pc)?);
        self.current_instruction = instruction.0;

        self.in_branch_delay = self.branch;
        self.branch = false;
        self.pc = self.next_pc;
        self.next_pc = self.next_pc.wrapping_add(4);

        self.cop0.set_irq_line(bus.irq_pending());
        if self.cop0.interrupt_enabled_and_pending() && !instruction.is_gte_command() {
            self.exception(ExceptionCause::Interrupt);
            return Ok(cycles);
        }

        self.execute_instruction(instruction, bus, gte)?;
        self.pipeline.retire(&mut self.regs);

        Ok(cycles)
    }

    /// Misaligned PC: raise an address error without fetching
    pub(crate) fn fetch_address_error(&mut self) {
        self.current_pc = self.pc;
        self.in_branch_delay = self.branch;
        self.branch = false;
        self.cop0.regs[COP0::BADA] = self.pc;
        self.exception(ExceptionCause::AddressErrorLoad);
    }

    /// Take an interrupt between instructions
    ///
    /// Used by the block dispatcher, which polls the IRQ line at block
    /// boundaries. The instruction at PC has not started, so it becomes the
    /// exception PC.
    pub(crate) fn interrupt_between_instructions(&mut self) {
        self.current_pc = self.pc;
        self.in_branch_delay = self.branch;
        self.branch = false;
        self.exception(ExceptionCause::Interrupt);
    }

    /// Mirror the bus IRQ line into Cause.IP2
    pub(crate) fn set_irq_line(&mut self, asserted: bool) {
        self.cop0.set_irq_line(asserted);
    }

    /// Whether an interrupt would be taken before the instruction `next`
    pub(crate) fn interrupt_ready(&mut self, irq_line: bool, next: Instruction) -> bool {
        self.cop0.set_irq_line(irq_line);
        self.cop0.interrupt_enabled_and_pending() && !next.is_gte_command()
    }

    /// Enter the exception handler
    ///
    /// Saves the faulting PC in EPC (the branch address if the fault is in a
    /// delay slot), records the cause, pushes the mode stack and jumps to the
    /// vector selected by SR.BEV. Pending pipeline writes are left untouched.
    pub fn exception(&mut self, cause: ExceptionCause) {
        let mut cause_reg = self.cop0.regs[COP0::CAUSE] & !(0x7C | COP0::CAUSE_BD);
        cause_reg |= (cause as u32) << 2;

        let epc = if self.in_branch_delay {
            cause_reg |= COP0::CAUSE_BD;
            self.current_pc.wrapping_sub(4)
        } else {
            self.current_pc
        };

        self.cop0.regs[COP0::CAUSE] = cause_reg;
        self.cop0.regs[COP0::EPC] = epc;
        self.cop0.enter_exception();

        let handler = if self.cop0.status().contains(StatusRegister::BEV) {
            BOOT_EXCEPTION_VECTOR
        } else {
            EXCEPTION_VECTOR
        };

        match cause {
            ExceptionCause::Syscall | ExceptionCause::Interrupt => log::trace!(
                "{:?}: EPC=0x{:08X}, handler=0x{:08X}",
                cause,
                epc,
                handler
            ),
            _ => log::warn!(
                "EXCEPTION: cause={:?}, EPC=0x{:08X}, handler=0x{:08X}, in_delay={}, instruction=0x{:08X}",
                cause,
                epc,
                handler,
                self.in_branch_delay,
                self.current_instruction
            ),
        }

        self.pc = handler;
        self.next_pc = handler.wrapping_add(4);
        self.branch = false;
        self.in_branch_delay = false;
    }

    /// Address error on a data access; `badvaddr` is the faulting address
    pub(crate) fn address_error(&mut self, cause: ExceptionCause, badvaddr: u32) {
        self.cop0.regs[COP0::BADA] = badvaddr;
        self.exception(cause);
    }

    /// Coprocessor unusable, with Cause.CE set to `cop`
    pub(crate) fn coprocessor_error(&mut self, cop: u32) {
        self.exception(ExceptionCause::CoprocessorUnusable);
        let cause = self.cop0.regs[COP0::CAUSE];
        self.cop0.regs[COP0::CAUSE] = (cause & !(3 << 28)) | ((cop & 3) << 28);
    }

    /// Halt on an instruction the core cannot execute
    pub(crate) fn unimplemented(&mut self, instruction: Instruction) -> EmulatorError {
        self.halted = true;
        let disassembly = Disassembler::disassemble(instruction.0, self.current_pc);
        log::error!(
            "Unimplemented instruction 0x{:08X} ({}) at PC=0x{:08X}",
            instruction.0,
            disassembly,
            self.current_pc
        );
        EmulatorError::UnimplementedInstruction {
            pc: self.current_pc,
            instruction: instruction.0,
            disassembly,
        }
    }

    /// Capture the architectural state
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::cpu::CPU;
    ///
    /// let cpu = CPU::new();
    /// let snapshot = cpu.snapshot();
    /// assert_eq!(snapshot.pc, 0xBFC00000);
    /// assert_eq!(snapshot.sr, 0x10900000);
    /// ```
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            regs: self.regs,
            hi: self.hi,
            lo: self.lo,
            pc: self.pc,
            next_pc: self.next_pc,
            sr: self.cop0.regs[COP0::SR],
            cause: self.cop0.regs[COP0::CAUSE],
            epc: self.cop0.regs[COP0::EPC],
            bad_vaddr: self.cop0.regs[COP0::BADA],
            pipeline: self.pipeline,
            branch: self.branch,
            in_delay_slot: self.in_branch_delay,
        }
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

/// Architectural state visible to software and to engine comparisons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSnapshot {
    pub regs: [u32; 32],
    pub hi: u32,
    pub lo: u32,
    pub pc: u32,
    pub next_pc: u32,
    pub sr: u32,
    pub cause: u32,
    pub epc: u32,
    pub bad_vaddr: u32,
    pub pipeline: LoadPipeline,
    pub branch: bool,
    pub in_delay_slot: bool,
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PC: 0x{:08X}  Next PC: 0x{:08X}", self.pc, self.next_pc)?;
        writeln!(f, "HI: 0x{:08X}  LO: 0x{:08X}", self.hi, self.lo)?;
        for (i, chunk) in self.regs.chunks(4).enumerate() {
            for (j, value) in chunk.iter().enumerate() {
                write!(f, "r{:<2}: 0x{:08X}  ", i * 4 + j, value)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "SR:    0x{:08X}", self.sr)?;
        writeln!(f, "CAUSE: 0x{:08X}", self.cause)?;
        writeln!(f, "EPC:   0x{:08X}", self.epc)?;
        write!(f, "BADA:  0x{:08X}", self.bad_vaddr)
    }
}

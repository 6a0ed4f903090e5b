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

//! System integration module
//!
//! Ties the CPU to its bus and GTE, picks the execution engine, and runs the
//! frame loop. The frame loop is also where a pending PS-X EXE is installed
//! once the BIOS reaches the shell entry point.

#[cfg(test)]
mod tests;

use super::config::{CpuConfig, EmulatorConfig, ExecutionMode};
use super::cpu::{CpuTracer, RegisterSnapshot, CPU};
use super::error::Result;
use super::gte::{Gte, RegisterBank};
#[cfg(target_arch = "x86_64")]
use super::jit::{Recompiler, RecompilerStats};
use super::loader::{PSXExecutable, EXE_TRAP_ADDRESS};
use super::memory::{Bus, MemoryBus};
use std::path::Path;

/// PlayStation CPU system
///
/// Owns the CPU, a [`Bus`] and a [`Gte`], plus the recompiler when the
/// recompiler engine is selected.
///
/// # Example
///
/// ```
/// use psrx_cpu::core::system::System;
///
/// let mut system = System::new();
/// assert_eq!(system.pc(), 0xBFC00000);
///
/// // Zero-filled BIOS: every instruction is a NOP
/// system.step().unwrap();
/// assert_eq!(system.pc(), 0xBFC00004);
/// ```
pub struct System<B = MemoryBus, G = RegisterBank> {
    cpu: CPU,
    bus: B,
    gte: G,
    mode: ExecutionMode,
    #[cfg(target_arch = "x86_64")]
    recompiler: Option<Box<Recompiler<B, G>>>,
    cycles_per_frame: u32,
    /// EXE waiting for the BIOS to reach [`EXE_TRAP_ADDRESS`]
    pending_exe: Option<PSXExecutable>,
    /// Total cycles executed
    cycles: u64,
    frames: u64,
    /// CPU tracer for debugging (optional)
    tracer: Option<CpuTracer>,
}

impl System {
    /// Create an interpreter-driven system with the reference bus and GTE
    pub fn new() -> Self {
        Self {
            cpu: CPU::new(),
            bus: MemoryBus::new(),
            gte: RegisterBank::new(),
            mode: ExecutionMode::Interpreter,
            #[cfg(target_arch = "x86_64")]
            recompiler: None,
            cycles_per_frame: CpuConfig::default().cycles_per_frame,
            pending_exe: None,
            cycles: 0,
            frames: 0,
            tracer: None,
        }
    }

    /// Build a system from a full configuration
    ///
    /// Loads the configured BIOS and arms the configured EXE.
    ///
    /// # Errors
    ///
    /// Invalid configuration, unreadable BIOS or EXE files, and recompiler
    /// setup failures.
    pub fn from_config(config: &EmulatorConfig) -> Result<Self> {
        config.validate()?;
        let mut system = Self::with_parts(MemoryBus::new(), RegisterBank::new(), &config.cpu)?;

        if let Some(bios) = &config.bios {
            system.load_bios(bios)?;
        }
        if let Some(exe) = &config.exe {
            system.load_exe(PSXExecutable::from_file(exe)?);
        }
        Ok(system)
    }

    /// Load a BIOS image into the reference bus
    ///
    /// # Example
    ///
    /// ```no_run
    /// use psrx_cpu::core::system::System;
    ///
    /// let mut system = System::new();
    /// system.load_bios("SCPH1001.BIN").unwrap();
    /// ```
    pub fn load_bios<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.bus.load_bios(path)?;
        self.invalidate_code();
        Ok(())
    }

    /// Power cycle: clears RAM and scratchpad (the BIOS survives) and resets
    /// the CPU
    pub fn power_cycle(&mut self) {
        self.bus.reset();
        self.gte.reset();
        self.reset();
    }
}

impl<B: Bus, G: Gte> System<B, G> {
    /// Assemble a system around caller-provided collaborators
    ///
    /// # Errors
    ///
    /// `Jit(Unsupported)` when the recompiler is requested on a host without a
    /// native backend, and `Jit(ExecutableMemory)` if the code pool cannot be
    /// mapped.
    pub fn with_parts(bus: B, gte: G, config: &CpuConfig) -> Result<Self> {
        let mut cpu = CPU::new();
        cpu.set_cycle_costs(config.cycle_costs());

        #[cfg(target_arch = "x86_64")]
        let recompiler = match config.engine {
            ExecutionMode::Interpreter => None,
            ExecutionMode::Recompiler => Some(Box::new(Recompiler::new(config.code_pool_size)?)),
        };

        #[cfg(not(target_arch = "x86_64"))]
        if config.engine == ExecutionMode::Recompiler {
            return Err(super::error::JitError::Unsupported(format!(
                "no native backend for {}",
                std::env::consts::ARCH
            ))
            .into());
        }

        log::info!(
            "System ready: {} engine, {} cycles per frame",
            config.engine,
            config.cycles_per_frame
        );

        Ok(Self {
            cpu,
            bus,
            gte,
            mode: config.engine,
            #[cfg(target_arch = "x86_64")]
            recompiler,
            cycles_per_frame: config.cycles_per_frame,
            pending_exe: None,
            cycles: 0,
            frames: 0,
            tracer: None,
        })
    }

    /// Reset the CPU and drop all compiled code
    ///
    /// The bus and GTE are left alone; a pending EXE stays armed.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.invalidate_code();
        self.cycles = 0;
        self.frames = 0;
        log::info!("System reset");
    }

    /// Arm `exe` to be installed when execution reaches the shell entry point
    pub fn load_exe(&mut self, exe: PSXExecutable) {
        log::info!(
            "EXE armed: entry 0x{:08X}, installed at PC=0x{:08X}",
            exe.pc,
            EXE_TRAP_ADDRESS
        );
        self.pending_exe = Some(exe);
    }

    pub fn has_pending_exe(&self) -> bool {
        self.pending_exe.is_some()
    }

    /// Copy `exe` into RAM and jump to its entry point right away
    ///
    /// GP is set from the header; SP and FP are set only when the header
    /// carries a stack base.
    ///
    /// # Errors
    ///
    /// `LoaderError` if the image does not fit in RAM.
    pub fn sideload_exe(&mut self, exe: &PSXExecutable) -> Result<()> {
        self.bus.copy_to_ram(exe.load_address, &exe.data)?;

        self.cpu.set_pc(exe.pc);
        self.cpu.set_reg(28, exe.gp);
        if let Some(sp) = exe.initial_sp() {
            self.cpu.set_reg(29, sp);
            self.cpu.set_reg(30, sp);
        }

        log::info!(
            "EXE installed: {} bytes at 0x{:08X}, PC=0x{:08X}",
            exe.data.len(),
            exe.load_address,
            exe.pc
        );
        Ok(())
    }

    fn check_exe_trap(&mut self) -> Result<()> {
        if self.cpu.pc() != EXE_TRAP_ADDRESS {
            return Ok(());
        }
        match self.pending_exe.take() {
            Some(exe) => self.sideload_exe(&exe),
            None => Ok(()),
        }
    }

    /// Execute one instruction with the interpreter, whatever the engine
    ///
    /// # Errors
    ///
    /// Bus errors, `UnimplementedInstruction` and `CpuHalted`.
    pub fn step(&mut self) -> Result<u32> {
        self.check_exe_trap()?;
        self.interpret()
    }

    /// Execute `n` interpreter steps
    pub fn step_n(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    fn interpret(&mut self) -> Result<u32> {
        if let Some(tracer) = self.tracer.as_mut() {
            if let Err(e) = tracer.trace(&self.cpu, &self.bus) {
                log::warn!("Failed to write trace: {}", e);
            }
        }

        let cycles = self.cpu.step(&mut self.bus, &mut self.gte)?;
        self.bus.tick(cycles)?;
        self.cycles += u64::from(cycles);
        Ok(cycles)
    }

    /// One unit of work for the selected engine: an instruction or a block
    fn advance(&mut self) -> Result<u32> {
        self.check_exe_trap()?;

        #[cfg(target_arch = "x86_64")]
        if let Some(jit) = self.recompiler.as_deref_mut() {
            if let Some(tracer) = self.tracer.as_mut() {
                let count = jit
                    .block(self.cpu.pc())
                    .map_or(0, |block| block.instruction_count);
                if let Err(e) = tracer.trace_block(&self.cpu, &self.bus, count) {
                    log::warn!("Failed to write trace: {}", e);
                }
            }

            let cycles = jit.step_block(&mut self.cpu, &mut self.bus, &mut self.gte)?;
            self.cycles += u64::from(cycles);
            return Ok(cycles);
        }

        self.interpret()
    }

    /// Execute one frame worth of cycles
    ///
    /// Returns the cycles consumed, which may exceed the frame budget by the
    /// length of the last block.
    ///
    /// # Example
    ///
    /// ```
    /// use psrx_cpu::core::system::System;
    ///
    /// let mut system = System::new();
    /// let cycles = system.run_frame().unwrap();
    /// assert!(cycles >= 564_480);
    /// ```
    pub fn run_frame(&mut self) -> Result<u64> {
        let budget = u64::from(self.cycles_per_frame);
        let mut elapsed = 0u64;
        while elapsed < budget {
            elapsed += u64::from(self.advance()?);
        }

        self.frames += 1;
        log::trace!("Frame {} complete ({} cycles)", self.frames, elapsed);
        Ok(elapsed)
    }

    /// Drop compiled code after the host changed guest memory behind the
    /// recompiler's back (BIOS reload, reset)
    pub fn invalidate_code(&mut self) {
        #[cfg(target_arch = "x86_64")]
        if let Some(jit) = self.recompiler.as_deref_mut() {
            jit.invalidate_all();
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    /// Get total cycles executed since reset
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Frames completed since reset
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn gte(&self) -> &G {
        &self.gte
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        self.cpu.snapshot()
    }

    /// Recompiler counters, when the recompiler engine is active
    #[cfg(target_arch = "x86_64")]
    pub fn recompiler_stats(&self) -> Option<RecompilerStats> {
        self.recompiler.as_ref().map(|jit| jit.stats())
    }

    /// Enable CPU execution tracing
    ///
    /// Writes one line per interpreted instruction, or per block entry under
    /// the recompiler, until `limit` lines have been written.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use psrx_cpu::core::system::System;
    ///
    /// let mut system = System::new();
    /// system.enable_tracing("trace.log", 5000).unwrap();
    /// ```
    pub fn enable_tracing<P: AsRef<Path>>(&mut self, path: P, limit: u64) -> Result<()> {
        let path = path.as_ref();
        self.tracer = Some(CpuTracer::new(path, limit)?);
        log::info!("CPU tracing enabled: {} (limit: {})", path.display(), limit);
        Ok(())
    }

    /// Flush and close the trace file
    pub fn disable_tracing(&mut self) {
        if let Some(mut tracer) = self.tracer.take() {
            if let Err(e) = tracer.flush() {
                log::warn!("Failed to flush trace: {}", e);
            }
            log::info!("CPU tracing disabled");
        }
    }

    /// Check if tracing is currently enabled
    pub fn is_tracing(&self) -> bool {
        self.tracer.as_ref().is_some_and(|tracer| tracer.is_enabled())
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

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

//! Emulator configuration
//!
//! Settings come from three layers, lowest priority first: built-in defaults,
//! a TOML file, and `PSRX_*` environment variables (which may themselves be
//! loaded from a `.env` file by the binaries). Command-line flags are applied
//! on top by the caller.
//!
//! # Example
//!
//! ```
//! use psrx_cpu::core::config::{EmulatorConfig, ExecutionMode};
//!
//! let config: EmulatorConfig = toml::from_str(r#"
//!     [cpu]
//!     engine = "recompiler"
//!     bios_cycles = 24
//! "#).unwrap();
//!
//! assert_eq!(config.cpu.engine, ExecutionMode::Recompiler);
//! assert_eq!(config.cpu.bios_cycles, 24);
//! assert_eq!(config.cpu.cycles_per_frame, 564_480);
//! ```

use crate::core::error::{EmulatorError, Result};
use crate::core::memory::CodeRegion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// CPU cycles per NTSC frame (33.8688 MHz / 60 Hz)
pub const CYCLES_PER_FRAME: u32 = 564_480;

/// Default size of the recompiler's executable code pool (16 MiB)
pub const DEFAULT_CODE_POOL_SIZE: usize = 16 * 1024 * 1024;

/// Which engine executes guest code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One instruction at a time
    #[default]
    Interpreter,
    /// Translate blocks to native code
    Recompiler,
}

impl FromStr for ExecutionMode {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interpreter" | "interp" => Ok(ExecutionMode::Interpreter),
            "recompiler" | "jit" | "dynarec" => Ok(ExecutionMode::Recompiler),
            other => Err(EmulatorError::Config(format!(
                "unknown engine '{}' (expected 'interpreter' or 'recompiler')",
                other
            ))),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Interpreter => write!(f, "interpreter"),
            ExecutionMode::Recompiler => write!(f, "recompiler"),
        }
    }
}

/// CPU and recompiler settings (`[cpu]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub engine: ExecutionMode,

    /// Cycle budget of one `run_frame` call
    pub cycles_per_frame: u32,

    /// Cycles charged per instruction fetched from RAM
    pub ram_cycles: u32,

    /// Cycles charged per instruction fetched from BIOS ROM
    pub bios_cycles: u32,

    /// Bytes of executable memory reserved for compiled blocks
    pub code_pool_size: usize,
}

impl CpuConfig {
    /// Per-region instruction costs handed to the CPU
    pub fn cycle_costs(&self) -> CycleCosts {
        CycleCosts {
            ram: self.ram_cycles,
            bios: self.bios_cycles,
        }
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            engine: ExecutionMode::Interpreter,
            cycles_per_frame: CYCLES_PER_FRAME,
            ram_cycles: 1,
            bios_cycles: 20,
            code_pool_size: DEFAULT_CODE_POOL_SIZE,
        }
    }
}

/// Instruction fetch cost by code region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleCosts {
    pub ram: u32,
    pub bios: u32,
}

impl CycleCosts {
    /// Cost of one instruction fetched from `pc`
    ///
    /// Anything outside BIOS ROM is charged at the RAM rate.
    #[inline]
    pub fn at(&self, pc: u32) -> u32 {
        match CodeRegion::classify(pc) {
            Some((CodeRegion::Bios, _)) => self.bios,
            _ => self.ram,
        }
    }
}

impl Default for CycleCosts {
    fn default() -> Self {
        CpuConfig::default().cycle_costs()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub cpu: CpuConfig,

    /// BIOS image to load at startup
    pub bios: Option<PathBuf>,

    /// PS-X EXE to side-load once the BIOS reaches the shell entry point
    pub exe: Option<PathBuf>,
}

impl EmulatorConfig {
    /// Parse a TOML configuration file
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::Io` if the file cannot be read and
    /// `EmulatorError::Toml` if it is not valid TOML for this schema.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: EmulatorConfig = toml::from_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Override settings from `PSRX_*` environment variables
    ///
    /// Recognised variables: `PSRX_ENGINE`, `PSRX_CYCLES_PER_FRAME`,
    /// `PSRX_CODE_POOL_SIZE`, `PSRX_BIOS`, `PSRX_EXE`.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_vars<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = get("PSRX_ENGINE") {
            self.cpu.engine = engine.parse()?;
        }
        if let Some(cycles) = get("PSRX_CYCLES_PER_FRAME") {
            self.cpu.cycles_per_frame = parse_number("PSRX_CYCLES_PER_FRAME", &cycles)?;
        }
        if let Some(size) = get("PSRX_CODE_POOL_SIZE") {
            self.cpu.code_pool_size = parse_number("PSRX_CODE_POOL_SIZE", &size)?;
        }
        if let Some(bios) = get("PSRX_BIOS") {
            self.bios = Some(PathBuf::from(bios));
        }
        if let Some(exe) = get("PSRX_EXE") {
            self.exe = Some(PathBuf::from(exe));
        }
        self.validate()
    }

    /// Reject settings the engines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cpu.cycles_per_frame == 0 {
            return Err(EmulatorError::Config(
                "cycles_per_frame must be greater than zero".into(),
            ));
        }
        if self.cpu.ram_cycles == 0 || self.cpu.bios_cycles == 0 {
            return Err(EmulatorError::Config(
                "instruction cycle costs must be greater than zero".into(),
            ));
        }
        if self.cpu.code_pool_size < 4096 {
            return Err(EmulatorError::Config(format!(
                "code_pool_size of {} bytes is too small (minimum 4096)",
                self.cpu.code_pool_size
            )));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EmulatorError::Config(format!("{} is not a valid number: '{}'", key, value)))
}

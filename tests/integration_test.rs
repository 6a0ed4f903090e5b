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

mod common;

use common::assertions::assert_cpu_reg;
use common::fixtures::*;
use common::test_roms;
use psrx_cpu::core::config::{EmulatorConfig, ExecutionMode};
use psrx_cpu::core::error::{EmulatorError, Result};
use psrx_cpu::core::loader::EXE_TRAP_ADDRESS;
use psrx_cpu::core::system::System;
use std::io::Write;

const BIOS_SIZE: usize = 512 * 1024;

/// A BIOS image that jumps straight to the shell entry point
fn shell_bios() -> Vec<u8> {
    let mut image = vec![0u8; BIOS_SIZE];
    // lui t0, 0x8003 ; jr t0 ; nop
    let stub = [lui(8, 0x8003), jr(8), NOP];
    for (n, word) in stub.iter().enumerate() {
        image[4 * n..4 * n + 4].copy_from_slice(&word.to_le_bytes());
    }
    image
}

fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn exe_bytes(program: &[u32]) -> Vec<u8> {
    let code: Vec<u8> = program.iter().flat_map(|w| w.to_le_bytes()).collect();
    psrx_cpu::core::loader::PSXExecutable::build(PROGRAM_BASE, PROGRAM_BASE, &code)
}

#[test]
fn test_basic_initialization() -> Result<()> {
    let system = System::new();
    assert_eq!(system.cycles(), 0);
    assert_eq!(system.cpu().pc(), 0xBFC00000);
    assert_eq!(system.mode(), ExecutionMode::Interpreter);
    Ok(())
}

#[test]
fn test_config_file_round_trip() -> Result<()> {
    let toml = r#"
        exe = "game.exe"

        [cpu]
        engine = "recompiler"
        cycles_per_frame = 1000
        code_pool_size = 65536
    "#;
    let file = write_temp(toml.as_bytes());

    let config = EmulatorConfig::load(file.path())?;

    assert_eq!(config.cpu.engine, ExecutionMode::Recompiler);
    assert_eq!(config.cpu.cycles_per_frame, 1000);
    assert_eq!(config.cpu.code_pool_size, 65536);
    assert_eq!(config.cpu.bios_cycles, 20, "unset keys keep defaults");
    assert_eq!(config.exe.as_deref(), Some(std::path::Path::new("game.exe")));
    assert!(config.bios.is_none());
    Ok(())
}

#[test]
fn test_config_file_rejects_bad_values() {
    let file = write_temp(b"[cpu]\ncycles_per_frame = 0\n");
    assert!(matches!(
        EmulatorConfig::load(file.path()),
        Err(EmulatorError::Config(_))
    ));

    let file = write_temp(b"[cpu]\nengine = \"turbo\"\n");
    assert!(matches!(
        EmulatorConfig::load(file.path()),
        Err(EmulatorError::Toml(_))
    ));
}

#[test]
fn test_variables_override_file() -> Result<()> {
    let mut config = EmulatorConfig::default();
    config.apply_vars(|key| match key {
        "PSRX_ENGINE" => Some("jit".to_string()),
        "PSRX_CYCLES_PER_FRAME" => Some("2048".to_string()),
        _ => None,
    })?;

    assert_eq!(config.cpu.engine, ExecutionMode::Recompiler);
    assert_eq!(config.cpu.cycles_per_frame, 2048);
    Ok(())
}

#[test]
fn test_boot_into_sideloaded_exe() -> Result<()> {
    let program = test_roms::fibonacci();
    let bios = write_temp(&shell_bios());
    let exe = write_temp(&exe_bytes(&program.words));

    let mut engines = vec![ExecutionMode::Interpreter];
    if cfg!(target_arch = "x86_64") {
        engines.push(ExecutionMode::Recompiler);
    }

    for engine in engines {
        let mut config = EmulatorConfig::default();
        config.cpu.engine = engine;
        config.cpu.cycles_per_frame = 5_000;
        config.cpu.code_pool_size = 1024 * 1024;
        config.bios = Some(bios.path().to_path_buf());
        config.exe = Some(exe.path().to_path_buf());

        let mut system = System::from_config(&config)?;
        assert!(system.has_pending_exe());

        system.run_frame()?;

        assert!(!system.has_pending_exe(), "{engine}: trap at 0x{EXE_TRAP_ADDRESS:08X}");
        assert_eq!(system.bus().ticks(), system.cycles());
        assert_cpu_reg(system.cpu(), 8, 6765);
        let spin = program.spin_address();
        assert!(
            system.pc() == spin || system.pc() == spin + 4,
            "{engine}: PC=0x{:08X}",
            system.pc()
        );
    }
    Ok(())
}

#[test]
fn test_missing_bios_is_reported() {
    let mut config = EmulatorConfig::default();
    config.bios = Some("/nonexistent/SCPH1001.BIN".into());

    assert!(matches!(
        System::from_config(&config),
        Err(EmulatorError::BiosNotFound(_))
    ));
}

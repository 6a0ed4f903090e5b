// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::super::*;
use super::{engines, system_with};
use crate::core::config::ExecutionMode;
use crate::core::error::EmulatorError;
use crate::core::loader::PSXExecutable;

#[test]
fn test_system_initialization() {
    let system = System::new();
    assert_eq!(system.cycles(), 0);
    assert_eq!(system.frames(), 0);
    assert_eq!(system.pc(), 0xBFC00000);
    assert_eq!(system.mode(), ExecutionMode::Interpreter);
    assert!(!system.has_pending_exe());
    assert!(!system.is_tracing());
}

#[test]
fn test_engine_selection() {
    for engine in engines() {
        let system = system_with(engine, 1000);
        assert_eq!(system.mode(), engine);

        #[cfg(target_arch = "x86_64")]
        assert_eq!(
            system.recompiler_stats().is_some(),
            engine == ExecutionMode::Recompiler
        );
    }
}

#[test]
fn test_from_config_rejects_invalid_settings() {
    let mut config = EmulatorConfig::default();
    config.cpu.cycles_per_frame = 0;

    assert!(matches!(
        System::from_config(&config),
        Err(EmulatorError::Config(_))
    ));
}

#[test]
fn test_from_config_missing_bios() {
    let mut config = EmulatorConfig::default();
    config.bios = Some("/nonexistent/bios.bin".into());

    assert!(System::from_config(&config).is_err());
}

#[test]
fn test_reset_keeps_pending_exe() {
    let mut system = System::new();
    system.step_n(3).unwrap();
    system.load_exe(PSXExecutable::load(&PSXExecutable::build(0x80010000, 0x80010000, &[0; 4])).unwrap());

    system.reset();

    assert_eq!(system.cycles(), 0);
    assert_eq!(system.pc(), 0xBFC00000);
    assert!(system.has_pending_exe());
}

#[test]
fn test_power_cycle_clears_ram() {
    let mut system = System::new();
    system.bus_mut().write32(0x8000_1000, 0x1234).unwrap();
    system.cpu_mut().set_reg(8, 5);

    system.power_cycle();

    assert_eq!(system.bus().peek32(0x8000_1000), Some(0));
    assert_eq!(system.cpu().reg(8), 0);
}

#[test]
fn test_tracing_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.log");

    let mut system = System::new();
    system.enable_tracing(&path, 10).unwrap();
    assert!(system.is_tracing());
    system.step_n(3).unwrap();
    system.disable_tracing();

    let trace = std::fs::read_to_string(&path).unwrap();
    assert_eq!(trace.lines().count(), 3);
    assert!(trace.starts_with("PC=0xBFC00000"));
}

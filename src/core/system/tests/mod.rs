// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! System module tests
//!
//! - `basic`: construction, configuration and reset
//! - `execution`: stepping and the frame loop under both engines
//! - `exe`: PS-X EXE side-loading and the shell-entry trap

mod basic;
mod exe;

use super::System;
use crate::core::config::{CpuConfig, ExecutionMode};
use crate::core::gte::RegisterBank;
use crate::core::memory::MemoryBus;

/// Engines available on this host
fn engines() -> Vec<ExecutionMode> {
    if cfg!(target_arch = "x86_64") {
        vec![ExecutionMode::Interpreter, ExecutionMode::Recompiler]
    } else {
        vec![ExecutionMode::Interpreter]
    }
}

fn system_with(engine: ExecutionMode, cycles_per_frame: u32) -> System {
    let config = CpuConfig {
        engine,
        cycles_per_frame,
        code_pool_size: 1024 * 1024,
        ..CpuConfig::default()
    };
    System::with_parts(MemoryBus::new(), RegisterBank::new(), &config).unwrap()
}

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

//! BIOS Boot Integration Tests
//!
//! These tests run a real PSX BIOS on the CPU core under each engine.
//!
//! # Requirements
//!
//! These tests require an actual PSX BIOS file. Set the `PSX_BIOS_PATH` environment
//! variable or place a BIOS file named `SCPH1001.BIN` in the project root.
//!
//! # Running
//!
//! ```bash
//! cargo test --test bios_boot -- --ignored --nocapture
//! ```
//!
//! # Legal Notice
//!
//! You must legally own a PlayStation console to use its BIOS for testing.

mod common;

use common::test_roms::get_bios_path;
use psrx_cpu::core::config::{CpuConfig, ExecutionMode};
use psrx_cpu::core::gte::RegisterBank;
use psrx_cpu::core::memory::MemoryBus;
use psrx_cpu::core::system::System;

const TEST_FRAMES: usize = 10;

fn boot(engine: ExecutionMode) -> System {
    let bios_path = get_bios_path().expect("BIOS not found: set PSX_BIOS_PATH");
    let config = CpuConfig {
        engine,
        ..CpuConfig::default()
    };
    let mut system = System::with_parts(MemoryBus::new(), RegisterBank::new(), &config)
        .expect("system");
    system.bus_mut().load_bios(&bios_path).expect("BIOS load");

    println!("[{}] Initial PC: 0x{:08X}", engine, system.pc());
    for frame in 0..TEST_FRAMES {
        if let Err(e) = system.run_frame() {
            eprintln!("{}", system.snapshot());
            panic!("[{}] frame {}: {}", engine, frame, e);
        }
    }
    println!(
        "[{}] {} frames, {} cycles, final PC: 0x{:08X}",
        engine,
        TEST_FRAMES,
        system.cycles(),
        system.pc()
    );
    system
}

/// The BIOS runs for several frames without a host-side fault
#[test]
#[ignore] // Requires BIOS file - run with: cargo test -- --ignored
fn test_bios_boot_interpreter() {
    let system = boot(ExecutionMode::Interpreter);

    assert_ne!(system.pc(), 0xBFC00000, "CPU should have moved past reset vector");
    assert!(system.cycles() >= (TEST_FRAMES as u64) * 564_480);
}

/// Same boot through the recompiler
#[test]
#[ignore] // Requires BIOS file - run with: cargo test -- --ignored
#[cfg(target_arch = "x86_64")]
fn test_bios_boot_recompiler() {
    let system = boot(ExecutionMode::Recompiler);

    let stats = system.recompiler_stats().expect("recompiler active");
    println!("{:?}", stats);
    assert!(stats.compiled > 0);
    assert!(stats.blocks_run > stats.compiled, "blocks are reused");
    assert!(system.cycles() >= (TEST_FRAMES as u64) * 564_480);
}

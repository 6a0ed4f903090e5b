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

//! Core emulation components
//!
//! This module contains the CPU execution engine and its collaborators:
//! - CPU (MIPS R3000A) interpreter
//! - Dynamic recompiler (x86-64 hosts)
//! - Memory bus contract and reference implementation
//! - GTE (coprocessor 2) contract
//! - System integration and frame loop

pub mod config;
pub mod cpu;
pub mod error;
pub mod gte;
#[cfg(target_arch = "x86_64")]
pub mod jit;
pub mod loader;
pub mod memory;
pub mod system;

// Re-export commonly used types
pub use config::EmulatorConfig;
pub use cpu::CPU;
pub use error::{EmulatorError, JitError, Result};
pub use gte::{Gte, RegisterBank};
pub use memory::{Bus, MemoryBus};
pub use system::System;

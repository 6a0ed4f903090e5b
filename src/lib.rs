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

//! PlayStation 1 CPU core library
//!
//! This library provides the R3000A (MIPS I) execution engine of a PlayStation 1
//! emulator: an interpreter, an x86-64 dynamic recompiler and the frame dispatcher
//! that drives them. Memory and the GTE are consumed through the [`core::memory::Bus`]
//! and [`core::gte::Gte`] traits.
//!
//! # Example
//!
//! ```
//! use psrx_cpu::core::cpu::CPU;
//! use psrx_cpu::core::gte::RegisterBank;
//! use psrx_cpu::core::memory::MemoryBus;
//!
//! let mut cpu = CPU::new();
//! let mut bus = MemoryBus::new();
//! let mut gte = RegisterBank::new();
//!
//! // Execute one instruction (a NOP from the zero-filled BIOS)
//! let cycles = cpu.step(&mut bus, &mut gte).unwrap();
//! assert!(cycles > 0);
//! ```

pub mod core;

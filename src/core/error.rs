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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
///
/// Guest-visible faults (alignment, overflow, syscalls, ...) are never reported
/// through this type; they redirect guest execution to the exception vector.
/// Everything here is a host-side condition.
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("BIOS file not found: {0}")]
    BiosNotFound(String),

    #[error("Invalid BIOS size: {got} bytes (expected {expected})")]
    InvalidBiosSize { expected: usize, got: usize },

    #[error("Invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess { address: u32 },

    #[error("Unaligned memory access: {size}-byte access at 0x{address:08X}")]
    UnalignedAccess { address: u32, size: u8 },

    #[error("Unimplemented instruction 0x{instruction:08X} ({disassembly}) at PC=0x{pc:08X}")]
    UnimplementedInstruction {
        pc: u32,
        instruction: u32,
        disassembly: String,
    },

    #[error("CPU halted at PC=0x{pc:08X} after a fatal error")]
    CpuHalted { pc: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid register index: {index} (valid range: 0-31)")]
    InvalidRegister { index: u8 },

    #[error("Recompiler error: {0}")]
    Jit(#[from] JitError),

    #[error("Loader error: {0}")]
    LoaderError(String),
}

/// Recompiler-specific error types
///
/// All of these are host-fatal: the dispatcher stops and returns them.
#[derive(Error, Debug)]
pub enum JitError {
    #[error("Code pool exhausted: block needs {requested} bytes, pool holds {capacity}")]
    PoolExhausted { requested: usize, capacity: usize },

    #[error("Executable memory error: {0}")]
    ExecutableMemory(#[from] std::io::Error),

    #[error("Assembly failed: {0}")]
    Assembly(String),

    #[error("Cannot checksum block at 0x{address:08X}: memory not readable")]
    ChecksumUnavailable { address: u32 },

    #[error("Recompiler not supported: {0}")]
    Unsupported(String),
}

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

//! Byte offsets of [`CPU`] fields for generated code
//!
//! These are the only raw offsets in the crate. Native code receives a
//! pointer to the CPU and addresses fields as `[cpu + OFFSET]`; every offset
//! is derived from the real struct layout and checked at compile time.

use super::pipeline::{LoadPipeline, RegisterWrite};
use super::{COP0, CPU};
use std::mem::{offset_of, size_of};

const fn disp(offset: usize) -> i32 {
    assert!(offset < i32::MAX as usize);
    offset as i32
}

/// `regs[0]`; register `n` lives at `REGS + 4 * n`
pub const REGS: i32 = disp(offset_of!(CPU, regs));
pub const HI: i32 = disp(offset_of!(CPU, hi));
pub const LO: i32 = disp(offset_of!(CPU, lo));
pub const PC: i32 = disp(offset_of!(CPU, pc));
pub const NEXT_PC: i32 = disp(offset_of!(CPU, next_pc));
pub const CURRENT_PC: i32 = disp(offset_of!(CPU, current_pc));
pub const CURRENT_INSTRUCTION: i32 = disp(offset_of!(CPU, current_instruction));

/// One-byte flags
pub const BRANCH: i32 = disp(offset_of!(CPU, branch));
pub const DELAY_SLOT: i32 = disp(offset_of!(CPU, in_branch_delay));

const COP0_REGS: usize = offset_of!(CPU, cop0) + offset_of!(COP0, regs);
pub const SR: i32 = disp(COP0_REGS + 4 * COP0::SR);
pub const CAUSE: i32 = disp(COP0_REGS + 4 * COP0::CAUSE);
pub const EPC: i32 = disp(COP0_REGS + 4 * COP0::EPC);
pub const BAD_VADDR: i32 = disp(COP0_REGS + 4 * COP0::BADA);

const PIPELINE: usize = offset_of!(CPU, pipeline);
const WRITE_REG: usize = offset_of!(RegisterWrite, reg);
const WRITE_VALUE: usize = offset_of!(RegisterWrite, value);

pub const READY_REG: i32 = disp(PIPELINE + offset_of!(LoadPipeline, ready) + WRITE_REG);
pub const READY_VALUE: i32 = disp(PIPELINE + offset_of!(LoadPipeline, ready) + WRITE_VALUE);
pub const DELAYED_REG: i32 = disp(PIPELINE + offset_of!(LoadPipeline, delayed) + WRITE_REG);
pub const DELAYED_VALUE: i32 = disp(PIPELINE + offset_of!(LoadPipeline, delayed) + WRITE_VALUE);
pub const DIRECT_REG: i32 = disp(PIPELINE + offset_of!(LoadPipeline, direct) + WRITE_REG);
pub const DIRECT_VALUE: i32 = disp(PIPELINE + offset_of!(LoadPipeline, direct) + WRITE_VALUE);

/// Offset of general purpose register `index`
#[inline(always)]
pub const fn reg(index: usize) -> i32 {
    REGS + 4 * (index as i32 & 31)
}

// Generated code reads the flags as bytes and the slots as dwords
const _: () = assert!(size_of::<bool>() == 1);
const _: () = assert!(size_of::<RegisterWrite>() == 8);
const _: () = assert!(size_of::<[u32; 32]>() == 128);
const _: () = assert!(REGS % 4 == 0 && HI % 4 == 0 && LO % 4 == 0);
const _: () = assert!(PC % 4 == 0 && NEXT_PC % 4 == 0 && CURRENT_PC % 4 == 0);
const _: () = assert!(CURRENT_INSTRUCTION % 4 == 0);
const _: () = assert!(SR % 4 == 0 && CAUSE % 4 == 0 && EPC % 4 == 0);
const _: () = assert!(READY_REG % 4 == 0 && DELAYED_REG % 4 == 0 && DIRECT_REG % 4 == 0);
const _: () = assert!(READY_VALUE == READY_REG + 4);
const _: () = assert!(DIRECT_VALUE == DIRECT_REG + 4);
const _: () = assert!(DELAYED_VALUE == DELAYED_REG + 4);

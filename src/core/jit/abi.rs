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

//! Context handed to compiled blocks
//!
//! A block is called as `block(ctx)` with the System V calling convention.
//! The CPU pointer sits at offset 0 so the prologue can load it with a single
//! `mov rbx, [rdi]`. Bus and GTE pointers are type-erased; only the
//! trampolines instantiated for the matching types ever cast them back.

use crate::core::cpu::CPU;
use crate::core::error::EmulatorError;
use std::mem::offset_of;

/// Entry point of a compiled block
pub type BlockFn = unsafe extern "sysv64" fn(*mut NativeContext);

#[repr(C)]
pub struct NativeContext {
    pub cpu: *mut CPU,
    pub bus: *mut (),
    pub gte: *mut (),
    /// Non-zero once a trampoline hit a host error; the block exits at once
    pub fault: u8,
    pub error: Option<EmulatorError>,
}

pub const CPU_PTR: i32 = offset_of!(NativeContext, cpu) as i32;
pub const FAULT: i32 = offset_of!(NativeContext, fault) as i32;

const _: () = assert!(CPU_PTR == 0);

impl NativeContext {
    pub fn new<B, G>(cpu: &mut CPU, bus: &mut B, gte: &mut G) -> Self {
        Self {
            cpu: cpu as *mut CPU,
            bus: bus as *mut B as *mut (),
            gte: gte as *mut G as *mut (),
            fault: 0,
            error: None,
        }
    }

    /// Record a host error and make the running block bail out
    pub fn fail(&mut self, error: EmulatorError) {
        self.fault = 1;
        self.error = Some(error);
    }

    pub fn take_error(&mut self) -> Option<EmulatorError> {
        self.fault = 0;
        self.error.take()
    }
}

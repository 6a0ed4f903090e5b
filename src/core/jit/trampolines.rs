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

//! Host functions called from compiled blocks
//!
//! These are the only call targets native code uses. Each one takes the
//! [`NativeContext`] as its first argument. Bus errors are stored in the
//! context and flagged through `fault`; the caller checks the flag and leaves
//! the block.
//!
//! # Safety
//!
//! All functions require `ctx` to point at a live context whose bus and GTE
//! pointers were created from a `B` and a `G` respectively.

use super::abi::NativeContext;
use crate::core::cpu::{ExceptionCause, Instruction, COP0, CPU};
use crate::core::error::Result;
use crate::core::gte::Gte;
use crate::core::memory::Bus;

/// Absolute addresses of the trampolines instantiated for one bus/GTE pair
#[derive(Debug, Clone, Copy)]
pub struct TrampolineTable {
    pub load8: i64,
    pub load16: i64,
    pub load32: i64,
    pub store8: i64,
    pub store16: i64,
    pub store32: i64,
    pub cop0_read: i64,
    pub cop0_write: i64,
    pub gte_read: i64,
    pub gte_write: i64,
    pub gte_execute: i64,
    pub raise_exception: i64,
    pub raise_address_error: i64,
    pub raise_coprocessor_error: i64,
    pub unimplemented: i64,
}

impl TrampolineTable {
    pub fn for_bus<B: Bus, G: Gte>() -> Self {
        Self {
            load8: load8::<B> as usize as i64,
            load16: load16::<B> as usize as i64,
            load32: load32::<B> as usize as i64,
            store8: store8::<B> as usize as i64,
            store16: store16::<B> as usize as i64,
            store32: store32::<B> as usize as i64,
            cop0_read: cop0_read::<B> as usize as i64,
            cop0_write: cop0_write as usize as i64,
            gte_read: gte_read::<G> as usize as i64,
            gte_write: gte_write::<G> as usize as i64,
            gte_execute: gte_execute::<G> as usize as i64,
            raise_exception: raise_exception as usize as i64,
            raise_address_error: raise_address_error as usize as i64,
            raise_coprocessor_error: raise_coprocessor_error as usize as i64,
            unimplemented: unimplemented as usize as i64,
        }
    }
}

#[inline(always)]
unsafe fn cpu<'a>(ctx: *mut NativeContext) -> &'a mut CPU {
    &mut *(*ctx).cpu
}

#[inline(always)]
unsafe fn bus<'a, B>(ctx: *mut NativeContext) -> &'a mut B {
    &mut *((*ctx).bus as *mut B)
}

#[inline(always)]
unsafe fn gte<'a, G>(ctx: *mut NativeContext) -> &'a mut G {
    &mut *((*ctx).gte as *mut G)
}

#[inline(always)]
unsafe fn settle<T: Default>(ctx: *mut NativeContext, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            (*ctx).fail(error);
            T::default()
        }
    }
}

unsafe extern "sysv64" fn load8<B: Bus>(ctx: *mut NativeContext, addr: u32) -> u32 {
    let result = bus::<B>(ctx).read8(addr).map(u32::from);
    settle(ctx, result)
}

unsafe extern "sysv64" fn load16<B: Bus>(ctx: *mut NativeContext, addr: u32) -> u32 {
    let result = bus::<B>(ctx).read16(addr).map(u32::from);
    settle(ctx, result)
}

unsafe extern "sysv64" fn load32<B: Bus>(ctx: *mut NativeContext, addr: u32) -> u32 {
    let result = bus::<B>(ctx).read32(addr);
    settle(ctx, result)
}

unsafe extern "sysv64" fn store8<B: Bus>(ctx: *mut NativeContext, addr: u32, value: u32) {
    let result = bus::<B>(ctx).write8(addr, value as u8);
    settle(ctx, result)
}

unsafe extern "sysv64" fn store16<B: Bus>(ctx: *mut NativeContext, addr: u32, value: u32) {
    let result = bus::<B>(ctx).write16(addr, value as u16);
    settle(ctx, result)
}

unsafe extern "sysv64" fn store32<B: Bus>(ctx: *mut NativeContext, addr: u32, value: u32) {
    let result = bus::<B>(ctx).write32(addr, value);
    settle(ctx, result)
}

/// Cause.IP2 is refreshed from the bus first, as the interpreter does
/// before every instruction
unsafe extern "sysv64" fn cop0_read<B: Bus>(ctx: *mut NativeContext, index: u32) -> u32 {
    if index as usize == COP0::CAUSE {
        let line = bus::<B>(ctx).irq_pending();
        cpu(ctx).set_irq_line(line);
    }
    cpu(ctx).cop0_reg(index as usize)
}

unsafe extern "sysv64" fn cop0_write(ctx: *mut NativeContext, index: u32, value: u32) {
    cpu(ctx).write_cop0(index as usize, value)
}

unsafe extern "sysv64" fn gte_read<G: Gte>(ctx: *mut NativeContext, index: u32) -> u32 {
    gte::<G>(ctx).read(index)
}

unsafe extern "sysv64" fn gte_write<G: Gte>(ctx: *mut NativeContext, index: u32, value: u32) {
    gte::<G>(ctx).write(index, value)
}

unsafe extern "sysv64" fn gte_execute<G: Gte>(ctx: *mut NativeContext, command: u32) {
    gte::<G>(ctx).execute(command)
}

unsafe extern "sysv64" fn raise_exception(ctx: *mut NativeContext, code: u32) {
    match ExceptionCause::from_code(code) {
        Some(cause) => cpu(ctx).exception(cause),
        None => {
            // Only the emitter chooses codes, so this is a compiler bug
            log::error!("Native code raised unknown exception code {}", code);
            cpu(ctx).exception(ExceptionCause::ReservedInstruction);
        }
    }
}

unsafe extern "sysv64" fn raise_address_error(ctx: *mut NativeContext, code: u32, badvaddr: u32) {
    let cause = if code == ExceptionCause::AddressErrorStore as u32 {
        ExceptionCause::AddressErrorStore
    } else {
        ExceptionCause::AddressErrorLoad
    };
    cpu(ctx).address_error(cause, badvaddr);
}

unsafe extern "sysv64" fn raise_coprocessor_error(ctx: *mut NativeContext, cop: u32) {
    cpu(ctx).coprocessor_error(cop);
}

unsafe extern "sysv64" fn unimplemented(ctx: *mut NativeContext, word: u32) {
    let error = cpu(ctx).unimplemented(Instruction(word));
    (*ctx).fail(error);
}

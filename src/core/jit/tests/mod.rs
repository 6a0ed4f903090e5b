// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Recompiler test modules
//!
//! - `pool`: executable pool allocation, reuse and reset
//! - `cache`: block discovery and the slot cache
//! - `emitter`: native blocks against the interpreter, instruction by instruction
//! - `dispatch`: frame loop, invalidation, interrupts and host faults

mod dispatch;

use super::Recompiler;
use crate::core::cpu::tests::{Harness, PROGRAM_BASE};
use crate::core::gte::RegisterBank;
use crate::core::memory::MemoryBus;

pub(super) type Jit = Recompiler<MemoryBus, RegisterBank>;

pub(super) fn jit() -> Jit {
    Recompiler::new(1024 * 1024).unwrap()
}

/// `jr $ra ; nop`, closing a test block (ra is 0 unless the test sets it)
pub(super) const RETURN: [u32; 2] = [0x03E0_0008, 0];

/// Program followed by [`RETURN`]
pub(super) fn with_return(program: &[u32]) -> Vec<u32> {
    let mut words = program.to_vec();
    words.extend_from_slice(&RETURN);
    words
}

/// Run one native block and `steps` interpreter steps from the same start
/// state and require identical architectural state
///
/// Returns `(interpreter, native)` for further checks.
pub(super) fn compare<F>(program: &[u32], steps: usize, setup: F) -> (Harness, Harness)
where
    F: Fn(&mut Harness),
{
    let mut interpreted = Harness::new(program);
    setup(&mut interpreted);
    interpreted.run(steps);

    let mut native = Harness::new(program);
    setup(&mut native);
    let mut jit = jit();
    jit.step_block(&mut native.cpu, &mut native.bus, &mut native.gte)
        .unwrap();

    assert_eq!(
        native.cpu.snapshot(),
        interpreted.cpu.snapshot(),
        "native block diverged from the interpreter"
    );
    (interpreted, native)
}

/// [`compare`] for a straight-line program closed by [`RETURN`]
pub(super) fn compare_block<F>(program: &[u32], setup: F) -> (Harness, Harness)
where
    F: Fn(&mut Harness),
{
    let words = with_return(program);
    compare(&words, words.len(), setup)
}

pub(super) fn no_setup(_: &mut Harness) {}

pub(super) const ENTRY: u32 = PROGRAM_BASE;

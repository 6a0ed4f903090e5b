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

//! Custom assertions for engine comparisons

use psrx_cpu::core::cpu::CPU;

/// Assert that two CPUs hold the same architectural state
pub fn assert_same_state(interpreted: &CPU, native: &CPU) {
    let (a, b) = (interpreted.snapshot(), native.snapshot());
    for n in 0..32 {
        assert_eq!(
            a.regs[n], b.regs[n],
            "Register ${} mismatch: interpreter 0x{:08X}, recompiler 0x{:08X}",
            n, a.regs[n], b.regs[n]
        );
    }
    assert_eq!(a, b, "interpreter:\n{}\nrecompiler:\n{}", a, b);
}

/// Assert CPU register has expected value
pub fn assert_cpu_reg(cpu: &CPU, reg: usize, expected: u32) {
    let actual = cpu.reg(reg);
    assert_eq!(
        actual, expected,
        "Register ${} mismatch: expected 0x{:08X}, got 0x{:08X}",
        reg, expected, actual
    );
}

/// Assert that the general-purpose registers and HI/LO agree
///
/// Used where the two engines may stop at different points of an idle loop,
/// so the branch bookkeeping legitimately differs.
pub fn assert_same_registers(interpreted: &CPU, native: &CPU) {
    let (a, b) = (interpreted.snapshot(), native.snapshot());
    assert_eq!(a.regs, b.regs, "interpreter:\n{}\nrecompiler:\n{}", a, b);
    assert_eq!((a.hi, a.lo), (b.hi, b.lo), "HI/LO mismatch");
}

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

//! Small hand-assembled programs shared by the integration tests
//!
//! Every program ends on `SPIN`; `spin_address` gives its address.

use super::fixtures::*;

/// A named test program
pub struct TestProgram {
    pub name: &'static str,
    pub words: Vec<u32>,
}

impl TestProgram {
    /// Address of the final idle loop
    pub fn spin_address(&self) -> u32 {
        let index = self
            .words
            .iter()
            .rposition(|&word| word == SPIN)
            .expect("program ends on SPIN");
        PROGRAM_BASE + 4 * index as u32
    }
}

/// fib(20) into DATA_BASE
pub fn fibonacci() -> TestProgram {
    TestProgram {
        name: "fibonacci",
        words: vec![
            lui(11, 0x8002),
            ori(10, 0, 20),
            ori(9, 0, 1),
            addu(12, 8, 9), // loop:
            addu(8, 9, 0),
            addu(9, 12, 0),
            addiu(10, 10, -1),
            bne(10, 0, -5),
            NOP,
            sw(8, 0, 11),
            SPIN,
            NOP,
        ],
    }
}

/// Fill 16 words, then copy them 0x100 bytes further
pub fn memcpy() -> TestProgram {
    TestProgram {
        name: "memcpy",
        words: vec![
            lui(11, 0x8002),
            addiu(12, 11, 0x100),
            ori(10, 0, 16),
            addu(13, 11, 0),
            sw(10, 0, 13), // fill:
            addiu(10, 10, -1),
            bne(10, 0, -3),
            addiu(13, 13, 4),
            ori(10, 0, 16),
            lw(14, 0, 11), // copy:
            addiu(11, 11, 4),
            sw(14, 0, 12),
            addiu(10, 10, -1),
            bne(10, 0, -5),
            addiu(12, 12, 4),
            SPIN,
            NOP,
        ],
    }
}

/// Load delay slot hazards
pub fn load_delay() -> TestProgram {
    TestProgram {
        name: "load_delay",
        words: vec![
            lui(11, 0x8002),
            ori(8, 0, 0x55),
            sw(8, 0, 11),
            ori(9, 0, 1),
            lw(9, 0, 11),
            addu(10, 9, 0), // still the old value
            addu(12, 9, 0),
            lw(13, 0, 11),
            ori(13, 0, 7), // overrides the pending load
            SPIN,
            NOP,
        ],
    }
}

/// A call into a multiply/divide subroutine
pub fn subroutine() -> TestProgram {
    TestProgram {
        name: "subroutine",
        words: vec![
            ori(4, 0, 1234),
            jal(PROGRAM_BASE + 7 * 4),
            ori(5, 0, 56),
            lui(11, 0x8002),
            sw(2, 0, 11),
            SPIN,
            NOP,
            special(0x18, 4, 5, 0, 0), // sub: mult a0, a1
            special(0x12, 0, 0, 2, 0), // mflo v0
            special(0x1B, 2, 5, 0, 0), // divu v0, a1
            special(0x10, 0, 0, 3, 0), // mfhi v1
            special(0x12, 0, 0, 6, 0), // mflo a2
            addu(2, 2, 6),
            jr(31),
            NOP,
        ],
    }
}

/// Unaligned word transfers
pub fn unaligned() -> TestProgram {
    TestProgram {
        name: "unaligned",
        words: vec![
            lui(11, 0x8002),
            lui(8, 0x1122),
            ori(8, 8, 0x3344),
            sw(8, 0, 11),
            lui(8, 0x5566),
            ori(8, 8, 0x7788),
            sw(8, 4, 11),
            itype(0x26, 11, 9, 1), // lwr t1, 1(t3)
            itype(0x22, 11, 9, 4), // lwl t1, 4(t3)
            itype(0x2A, 11, 9, 9), // swl t1, 9(t3)
            itype(0x2E, 11, 9, 13), // swr t1, 13(t3)
            SPIN,
            NOP,
        ],
    }
}

/// Every program above
pub fn corpus() -> Vec<TestProgram> {
    vec![fibonacci(), memcpy(), load_delay(), subroutine(), unaligned()]
}

/// Get BIOS path from environment or default location
pub fn get_bios_path() -> Option<String> {
    std::env::var("PSX_BIOS_PATH").ok().or_else(|| {
        let default_path = "SCPH1001.BIN";
        if std::path::Path::new(default_path).exists() {
            Some(default_path.to_string())
        } else {
            None
        }
    })
}

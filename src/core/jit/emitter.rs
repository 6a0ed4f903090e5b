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

//! x86-64 code generation for guest blocks
//!
//! Every guest instruction becomes the same three parts the interpreter runs:
//! a step prologue (CurrentPC, DelaySlot, PC advance), the instruction
//! itself, and the pipeline retire. Guest registers stay in the `CPU` struct;
//! generated code addresses them through [`crate::core::cpu::abi`].
//!
//! Register use inside a block:
//!
//! | host  | role                               |
//! |-------|------------------------------------|
//! | `rbx` | `*mut CPU`                         |
//! | `r12` | `*mut NativeContext`               |
//! | `r13` | guest address kept across a call   |
//! | rest  | scratch, clobbered by trampolines  |
//!
//! Two exits exist: `retire_exit` retires the pipeline first (guest
//! exceptions), `exit` leaves immediately (host faults).

use super::abi::FAULT;
use super::block::GuestBlock;
use super::trampolines::TrampolineTable;
use crate::core::cpu::abi::{
    self as layout, BRANCH, CURRENT_INSTRUCTION, CURRENT_PC, DELAYED_REG, DELAYED_VALUE,
    DELAY_SLOT, DIRECT_REG, DIRECT_VALUE, HI, LO, NEXT_PC, PC, READY_REG, READY_VALUE, REGS, SR,
};
use crate::core::cpu::{ExceptionCause, Instruction, StatusRegister};
use crate::core::error::JitError;
use dynasmrt::x64::X64Relocation;
use dynasmrt::{dynasm, DynamicLabel, DynasmApi, DynasmLabelApi, VecAssembler};

macro_rules! emit {
    ($ops:expr; $($t:tt)*) => {
        dynasm!($ops ; .arch x64 ; $($t)*)
    };
}

const EAX: u8 = 0;
const ECX: u8 = 1;
const EDX: u8 = 2;
const ESI: u8 = 6;

/// Compile a scanned block into position-independent machine code
///
/// The result is a `BlockFn` body ready to be copied anywhere in the pool.
///
/// # Errors
///
/// `Assembly` if dynasm fails to resolve a label.
pub fn compile_block(block: &GuestBlock, calls: &TrampolineTable) -> Result<Vec<u8>, JitError> {
    let mut compiler = BlockCompiler::new(calls);
    compiler.prologue();

    let mut previous_was_branch = true;
    for (n, &word) in block.words.iter().enumerate() {
        let pc = block.address.wrapping_add(4 * n as u32);
        let instruction = Instruction(word);

        compiler.step_prologue(pc, word, previous_was_branch);
        if !instruction.is_nop() {
            compiler.instruction(instruction);
        }
        compiler.retire();

        previous_was_branch = instruction.is_branch();
    }

    compiler.epilogue();
    compiler.finish()
}

struct BlockCompiler<'a> {
    ops: VecAssembler<X64Relocation>,
    calls: &'a TrampolineTable,
    exit: DynamicLabel,
    retire_exit: DynamicLabel,
}

impl<'a> BlockCompiler<'a> {
    fn new(calls: &'a TrampolineTable) -> Self {
        let mut ops = VecAssembler::<X64Relocation>::new(0);
        let exit = ops.new_dynamic_label();
        let retire_exit = ops.new_dynamic_label();
        Self {
            ops,
            calls,
            exit,
            retire_exit,
        }
    }

    fn finish(self) -> Result<Vec<u8>, JitError> {
        self.ops
            .finalize()
            .map_err(|e| JitError::Assembly(e.to_string()))
    }

    // === Frame ===

    fn prologue(&mut self) {
        // Three pushes keep rsp 16-byte aligned at every call site
        emit!(self.ops;
            push rbx
            ; push r12
            ; push r13
            ; mov r12, rdi
            ; mov rbx, QWORD [rdi]
        );
    }

    fn epilogue(&mut self) {
        let exit = self.exit;
        let retire_exit = self.retire_exit;

        emit!(self.ops;
            jmp =>exit
            ; =>retire_exit
        );
        self.retire();
        emit!(self.ops;
            =>exit
            ; pop r13
            ; pop r12
            ; pop rbx
            ; ret
        );
    }

    /// Steps 1 and 4 of the interpreter's step, specialised when the
    /// previous instruction of the block is known not to be a branch
    fn step_prologue(&mut self, pc: u32, word: u32, dynamic: bool) {
        let current_pc = pc as i32;
        let word = word as i32;

        emit!(self.ops;
            mov DWORD [rbx + CURRENT_PC], current_pc
            ; mov DWORD [rbx + CURRENT_INSTRUCTION], word
        );

        if dynamic {
            emit!(self.ops;
                mov al, BYTE [rbx + BRANCH]
                ; mov BYTE [rbx + DELAY_SLOT], al
                ; mov BYTE [rbx + BRANCH], 0
                ; mov eax, DWORD [rbx + NEXT_PC]
                ; mov DWORD [rbx + PC], eax
                ; add eax, 4
                ; mov DWORD [rbx + NEXT_PC], eax
            );
        } else {
            let next = pc.wrapping_add(4) as i32;
            let after = pc.wrapping_add(8) as i32;
            emit!(self.ops;
                mov BYTE [rbx + DELAY_SLOT], 0
                ; mov DWORD [rbx + PC], next
                ; mov DWORD [rbx + NEXT_PC], after
            );
        }
    }

    /// Inline copy of `LoadPipeline::retire`
    fn retire(&mut self) {
        emit!(self.ops;
            mov eax, DWORD [rbx + READY_REG]
            ; cmp eax, DWORD [rbx + DELAYED_REG]
            ; je >cancelled
            ; mov ecx, DWORD [rbx + READY_VALUE]
            ; and eax, 31
            ; mov DWORD [rbx + rax * 4 + REGS], ecx
            ; cancelled:
            ; mov rax, QWORD [rbx + DELAYED_REG]
            ; mov QWORD [rbx + READY_REG], rax
            ; mov QWORD [rbx + DELAYED_REG], 0
            ; mov eax, DWORD [rbx + DIRECT_REG]
            ; and eax, 31
            ; mov ecx, DWORD [rbx + DIRECT_VALUE]
            ; mov DWORD [rbx + rax * 4 + REGS], ecx
            ; mov QWORD [rbx + DIRECT_REG], 0
            ; mov DWORD [rbx + REGS], 0
        );
    }

    // === Helpers ===

    /// Load guest register `guest` into host register `host`
    fn gpr(&mut self, host: u8, guest: usize) {
        if guest == 0 {
            emit!(self.ops; xor Rd(host), Rd(host));
        } else {
            let offset = layout::reg(guest);
            emit!(self.ops; mov Rd(host), DWORD [rbx + offset]);
        }
    }

    fn stage_direct(&mut self, guest: usize, host: u8) {
        let reg = guest as i32;
        emit!(self.ops;
            mov DWORD [rbx + DIRECT_REG], reg
            ; mov DWORD [rbx + DIRECT_VALUE], Rd(host)
        );
    }

    fn stage_delayed(&mut self, guest: usize, host: u8) {
        let reg = guest as i32;
        emit!(self.ops;
            mov DWORD [rbx + DELAYED_REG], reg
            ; mov DWORD [rbx + DELAYED_VALUE], Rd(host)
        );
    }

    fn call(&mut self, target: i64) {
        emit!(self.ops;
            mov rdi, r12
            ; mov rax, QWORD target
            ; call rax
        );
    }

    /// Leave the block if the last trampoline reported a host error
    fn fault_check(&mut self) {
        let exit = self.exit;
        emit!(self.ops;
            cmp BYTE [r12 + FAULT], 0
            ; jne =>exit
        );
    }

    fn raise(&mut self, cause: ExceptionCause) {
        let code = cause as i32;
        let target = self.calls.raise_exception;
        let retire_exit = self.retire_exit;
        emit!(self.ops; mov esi, code);
        self.call(target);
        emit!(self.ops; jmp =>retire_exit);
    }

    fn raise_coprocessor_error(&mut self, cop: u32) {
        let cop = cop as i32;
        let target = self.calls.raise_coprocessor_error;
        let retire_exit = self.retire_exit;
        emit!(self.ops; mov esi, cop);
        self.call(target);
        emit!(self.ops; jmp =>retire_exit);
    }

    fn unimplemented(&mut self, i: Instruction) {
        let word = i.0 as i32;
        let target = self.calls.unimplemented;
        let exit = self.exit;
        emit!(self.ops; mov esi, word);
        self.call(target);
        emit!(self.ops; jmp =>exit);
    }

    /// `esi = rs + sign_extend(imm)`
    fn effective_address(&mut self, i: Instruction) {
        self.gpr(ESI, i.rs());
        let offset = i.imm_se() as i32;
        if offset != 0 {
            emit!(self.ops; add esi, offset);
        }
    }

    /// Raise an address error if `esi & mask != 0`
    fn alignment_check(&mut self, mask: i32, cause: ExceptionCause) {
        let code = cause as i32;
        let target = self.calls.raise_address_error;
        let retire_exit = self.retire_exit;
        emit!(self.ops;
            test esi, mask
            ; jz >aligned
            ; mov edx, esi
            ; mov esi, code
        );
        self.call(target);
        emit!(self.ops;
            jmp =>retire_exit
            ; aligned:
        );
    }

    /// Skip to the next `mem_done` label while SR.IsC is set
    fn isolation_check(&mut self) {
        let isc = StatusRegister::ISC.bits() as i32;
        emit!(self.ops;
            test DWORD [rbx + SR], isc
            ; jnz >mem_done
        );
    }

    fn cop2_check(&mut self) {
        let cu2 = StatusRegister::CU2.bits() as i32;
        emit!(self.ops;
            test DWORD [rbx + SR], cu2
            ; jnz >cu_ok
        );
        self.raise_coprocessor_error(2);
        emit!(self.ops; cu_ok:);
    }

    /// `NextPC = PC + offset` when the preceding condition falls through
    fn branch_target(&mut self, i: Instruction) {
        let offset = (i.imm_se() << 2) as i32;
        emit!(self.ops;
            mov ecx, DWORD [rbx + PC]
            ; add ecx, offset
            ; mov DWORD [rbx + NEXT_PC], ecx
        );
    }

    /// Stage `PC + 4` (the address after the delay slot) into `guest`
    fn link(&mut self, guest: usize) {
        emit!(self.ops;
            mov ecx, DWORD [rbx + PC]
            ; add ecx, 4
        );
        self.stage_direct(guest, ECX);
    }

    // === Dispatch ===

    fn instruction(&mut self, i: Instruction) {
        match i.opcode() {
            0x00 => self.special(i),
            0x01 => self.bcondz(i),
            0x02 | 0x03 => self.jump(i),
            0x04..=0x07 => self.branch(i),
            0x08..=0x0F => self.alu_immediate(i),
            0x10 => self.cop0(i),
            0x12 => self.cop2(i),
            0x20..=0x26 => self.load(i),
            0x28 | 0x29 | 0x2A | 0x2B | 0x2E => self.store(i),
            0x32 => self.lwc2(i),
            0x3A => self.swc2(i),
            0x11 | 0x13 | 0x30 | 0x31 | 0x33 | 0x38 | 0x39 | 0x3B => {
                self.raise_coprocessor_error(i.opcode() & 3)
            }
            _ => self.raise(ExceptionCause::ReservedInstruction),
        }
    }

    fn special(&mut self, i: Instruction) {
        match i.funct() {
            0x00 | 0x02 | 0x03 => {
                self.gpr(EAX, i.rt());
                let shamt = i.shamt() as i8;
                match i.funct() {
                    0x00 => emit!(self.ops; shl eax, shamt),
                    0x02 => emit!(self.ops; shr eax, shamt),
                    _ => emit!(self.ops; sar eax, shamt),
                }
                self.stage_direct(i.rd(), EAX);
            }
            0x04 | 0x06 | 0x07 => {
                self.gpr(ECX, i.rs());
                self.gpr(EAX, i.rt());
                match i.funct() {
                    0x04 => emit!(self.ops; shl eax, cl),
                    0x06 => emit!(self.ops; shr eax, cl),
                    _ => emit!(self.ops; sar eax, cl),
                }
                self.stage_direct(i.rd(), EAX);
            }
            0x08 | 0x09 => {
                // Target is read before the link is staged
                self.gpr(EAX, i.rs());
                emit!(self.ops;
                    mov DWORD [rbx + NEXT_PC], eax
                    ; mov BYTE [rbx + BRANCH], 1
                );
                if i.funct() == 0x09 {
                    self.link(i.rd());
                }
            }
            0x0C => self.raise(ExceptionCause::Syscall),
            0x0D => self.raise(ExceptionCause::Breakpoint),
            0x10 => {
                emit!(self.ops; mov eax, DWORD [rbx + HI]);
                self.stage_direct(i.rd(), EAX);
            }
            0x12 => {
                emit!(self.ops; mov eax, DWORD [rbx + LO]);
                self.stage_direct(i.rd(), EAX);
            }
            0x11 => {
                self.gpr(EAX, i.rs());
                emit!(self.ops; mov DWORD [rbx + HI], eax);
            }
            0x13 => {
                self.gpr(EAX, i.rs());
                emit!(self.ops; mov DWORD [rbx + LO], eax);
            }
            0x18 | 0x19 => {
                self.gpr(EAX, i.rs());
                self.gpr(ECX, i.rt());
                if i.funct() == 0x18 {
                    emit!(self.ops; imul ecx);
                } else {
                    emit!(self.ops; mul ecx);
                }
                emit!(self.ops;
                    mov DWORD [rbx + LO], eax
                    ; mov DWORD [rbx + HI], edx
                );
            }
            0x1A => self.div(i),
            0x1B => self.divu(i),
            0x20 | 0x22 => {
                self.gpr(EAX, i.rs());
                self.gpr(ECX, i.rt());
                if i.funct() == 0x20 {
                    emit!(self.ops; add eax, ecx);
                } else {
                    emit!(self.ops; sub eax, ecx);
                }
                self.overflow_trap();
                self.stage_direct(i.rd(), EAX);
            }
            0x21 | 0x23 | 0x24..=0x27 | 0x2A | 0x2B => {
                self.gpr(EAX, i.rs());
                self.gpr(ECX, i.rt());
                match i.funct() {
                    0x21 => emit!(self.ops; add eax, ecx),
                    0x23 => emit!(self.ops; sub eax, ecx),
                    0x24 => emit!(self.ops; and eax, ecx),
                    0x25 => emit!(self.ops; or eax, ecx),
                    0x26 => emit!(self.ops; xor eax, ecx),
                    0x27 => emit!(self.ops; or eax, ecx ; not eax),
                    0x2A => emit!(self.ops; cmp eax, ecx ; setl al ; movzx eax, al),
                    _ => emit!(self.ops; cmp eax, ecx ; setb al ; movzx eax, al),
                }
                self.stage_direct(i.rd(), EAX);
            }
            _ => self.raise(ExceptionCause::ReservedInstruction),
        }
    }

    /// After a flag-setting add/sub: trap on signed overflow without writing
    fn overflow_trap(&mut self) {
        emit!(self.ops; jno >no_overflow);
        self.raise(ExceptionCause::Overflow);
        emit!(self.ops; no_overflow:);
    }

    fn div(&mut self, i: Instruction) {
        self.gpr(EAX, i.rs());
        self.gpr(ECX, i.rt());
        let min = i32::MIN;
        emit!(self.ops;
            test ecx, ecx
            ; jz >by_zero
            ; cmp ecx, -1
            ; jne >divide
            ; cmp eax, min
            ; jne >divide
            // 0x80000000 / -1
            ; mov DWORD [rbx + LO], eax
            ; mov DWORD [rbx + HI], 0
            ; jmp >div_done
            ; divide:
            ; cdq
            ; idiv ecx
            ; mov DWORD [rbx + LO], eax
            ; mov DWORD [rbx + HI], edx
            ; jmp >div_done
            ; by_zero:
            ; mov DWORD [rbx + HI], eax
            // LO = n < 0 ? 1 : -1
            ; sar eax, 31
            ; add eax, eax
            ; not eax
            ; mov DWORD [rbx + LO], eax
            ; div_done:
        );
    }

    fn divu(&mut self, i: Instruction) {
        self.gpr(EAX, i.rs());
        self.gpr(ECX, i.rt());
        emit!(self.ops;
            test ecx, ecx
            ; jz >by_zero
            ; xor edx, edx
            ; div ecx
            ; mov DWORD [rbx + LO], eax
            ; mov DWORD [rbx + HI], edx
            ; jmp >div_done
            ; by_zero:
            ; mov DWORD [rbx + HI], eax
            ; mov DWORD [rbx + LO], -1
            ; div_done:
        );
    }

    // === Control flow ===

    fn bcondz(&mut self, i: Instruction) {
        let is_bgez = i.rt() & 0x01 != 0;
        let is_link = i.rt() & 0x1E == 0x10;

        self.gpr(EAX, i.rs());
        if is_link {
            self.link(31);
        }
        emit!(self.ops;
            mov BYTE [rbx + BRANCH], 1
            ; test eax, eax
        );
        if is_bgez {
            emit!(self.ops; js >not_taken);
        } else {
            emit!(self.ops; jns >not_taken);
        }
        self.branch_target(i);
        emit!(self.ops; not_taken:);
    }

    fn branch(&mut self, i: Instruction) {
        self.gpr(EAX, i.rs());
        match i.opcode() {
            0x04 | 0x05 => {
                self.gpr(ECX, i.rt());
                emit!(self.ops; cmp eax, ecx);
            }
            _ => emit!(self.ops; cmp eax, 0),
        }
        emit!(self.ops; mov BYTE [rbx + BRANCH], 1);
        match i.opcode() {
            0x04 => emit!(self.ops; jne >not_taken),
            0x05 => emit!(self.ops; je >not_taken),
            0x06 => emit!(self.ops; jg >not_taken),
            _ => emit!(self.ops; jle >not_taken),
        }
        self.branch_target(i);
        emit!(self.ops; not_taken:);
    }

    fn jump(&mut self, i: Instruction) {
        if i.opcode() == 0x03 {
            self.link(31);
        }
        let segment = 0xF000_0000u32 as i32;
        let target = (i.target() << 2) as i32;
        emit!(self.ops;
            mov eax, DWORD [rbx + PC]
            ; and eax, segment
            ; or eax, target
            ; mov DWORD [rbx + NEXT_PC], eax
            ; mov BYTE [rbx + BRANCH], 1
        );
    }

    // === Immediate ALU ===

    fn alu_immediate(&mut self, i: Instruction) {
        let se = i.imm_se() as i32;
        let ze = i.imm() as i32;

        if i.opcode() == 0x0F {
            let upper = (i.imm() << 16) as i32;
            emit!(self.ops; mov eax, upper);
            self.stage_direct(i.rt(), EAX);
            return;
        }

        self.gpr(EAX, i.rs());
        match i.opcode() {
            0x08 => {
                emit!(self.ops; add eax, se);
                self.overflow_trap();
            }
            0x09 => emit!(self.ops; add eax, se),
            0x0A => emit!(self.ops; cmp eax, se ; setl al ; movzx eax, al),
            0x0B => emit!(self.ops; cmp eax, se ; setb al ; movzx eax, al),
            0x0C => emit!(self.ops; and eax, ze),
            0x0D => emit!(self.ops; or eax, ze),
            _ => emit!(self.ops; xor eax, ze),
        }
        self.stage_direct(i.rt(), EAX);
    }

    // === Memory ===

    fn load(&mut self, i: Instruction) {
        match i.opcode() {
            0x22 | 0x26 => return self.load_unaligned(i),
            _ => {}
        }

        self.isolation_check();
        self.effective_address(i);

        let (target, mask) = match i.opcode() {
            0x20 | 0x24 => (self.calls.load8, 0),
            0x21 | 0x25 => (self.calls.load16, 1),
            _ => (self.calls.load32, 3),
        };
        if mask != 0 {
            self.alignment_check(mask, ExceptionCause::AddressErrorLoad);
        }

        self.call(target);
        self.fault_check();
        match i.opcode() {
            0x20 => emit!(self.ops; movsx eax, al),
            0x21 => emit!(self.ops; movsx eax, ax),
            _ => {}
        }
        self.stage_delayed(i.rt(), EAX);
        emit!(self.ops; mem_done:);
    }

    /// LWL / LWR: merge the aligned word into the bypassed value of rt
    fn load_unaligned(&mut self, i: Instruction) {
        self.isolation_check();
        self.effective_address(i);
        emit!(self.ops;
            mov r13d, esi
            ; and esi, -4
        );
        let load32 = self.calls.load32;
        self.call(load32);
        self.fault_check();

        // edx = current rt, preferring a load still in flight
        self.gpr(EDX, i.rt());
        if i.rt() != 0 {
            let rt = i.rt() as i32;
            emit!(self.ops;
                cmp DWORD [rbx + READY_REG], rt
                ; jne >bypassed
                ; mov edx, DWORD [rbx + READY_VALUE]
                ; bypassed:
            );
        }

        // ecx = 8 * (addr & 3)
        emit!(self.ops;
            mov ecx, r13d
            ; and ecx, 3
            ; shl ecx, 3
        );

        if i.opcode() == 0x22 {
            let keep = 0x00FF_FFFF;
            emit!(self.ops;
                mov r8d, keep
                ; shr r8d, cl
                ; and edx, r8d
                ; neg ecx
                ; add ecx, 24
                ; shl eax, cl
                ; or eax, edx
            );
        } else {
            let keep = 0xFFFF_FF00u32 as i32;
            emit!(self.ops;
                shr eax, cl
                ; neg ecx
                ; add ecx, 24
                ; mov r8d, keep
                ; shl r8d, cl
                ; and edx, r8d
                ; or eax, edx
            );
        }

        self.stage_delayed(i.rt(), EAX);
        emit!(self.ops; mem_done:);
    }

    fn store(&mut self, i: Instruction) {
        if matches!(i.opcode(), 0x2A | 0x2E) {
            return self.store_unaligned(i);
        }

        self.isolation_check();
        self.effective_address(i);

        let (target, mask) = match i.opcode() {
            0x28 => (self.calls.store8, 0),
            0x29 => (self.calls.store16, 1),
            _ => (self.calls.store32, 3),
        };
        if mask != 0 {
            self.alignment_check(mask, ExceptionCause::AddressErrorStore);
        }

        self.gpr(EDX, i.rt());
        self.call(target);
        self.fault_check();
        emit!(self.ops; mem_done:);
    }

    /// SWL / SWR: read-modify-write of the aligned word
    fn store_unaligned(&mut self, i: Instruction) {
        self.isolation_check();
        self.effective_address(i);
        emit!(self.ops;
            mov r13d, esi
            ; and esi, -4
        );
        let load32 = self.calls.load32;
        self.call(load32);
        self.fault_check();

        self.gpr(EDX, i.rt());
        emit!(self.ops;
            mov ecx, r13d
            ; and ecx, 3
            ; shl ecx, 3
        );

        if i.opcode() == 0x2A {
            let keep = 0xFFFF_FF00u32 as i32;
            emit!(self.ops;
                mov r8d, keep
                ; shl r8d, cl
                ; and eax, r8d
                ; neg ecx
                ; add ecx, 24
                ; shr edx, cl
                ; or eax, edx
            );
        } else {
            let keep = 0x00FF_FFFF;
            emit!(self.ops;
                shl edx, cl
                ; neg ecx
                ; add ecx, 24
                ; mov r8d, keep
                ; shr r8d, cl
                ; and eax, r8d
                ; or eax, edx
            );
        }

        emit!(self.ops;
            mov edx, eax
            ; mov esi, r13d
            ; and esi, -4
        );
        let store32 = self.calls.store32;
        self.call(store32);
        self.fault_check();
        emit!(self.ops; mem_done:);
    }

    // === Coprocessors ===

    fn cop0(&mut self, i: Instruction) {
        match i.cop_op() {
            0x00 => {
                let rd = i.rd() as i32;
                let target = self.calls.cop0_read;
                emit!(self.ops; mov esi, rd);
                self.call(target);
                self.stage_delayed(i.rt(), EAX);
            }
            0x04 => {
                let rd = i.rd() as i32;
                let target = self.calls.cop0_write;
                self.gpr(EDX, i.rt());
                emit!(self.ops; mov esi, rd);
                self.call(target);
            }
            0x10 if i.funct() == 0x10 => {
                // RFE: SR = (SR & !0xF) | ((SR >> 2) & 0xF)
                emit!(self.ops;
                    mov eax, DWORD [rbx + SR]
                    ; mov ecx, eax
                    ; and eax, -16
                    ; shr ecx, 2
                    ; and ecx, 0xF
                    ; or eax, ecx
                    ; mov DWORD [rbx + SR], eax
                );
            }
            _ => self.unimplemented(i),
        }
    }

    fn cop2(&mut self, i: Instruction) {
        self.cop2_check();

        if i.is_gte_command() {
            let command = i.imm25() as i32;
            let target = self.calls.gte_execute;
            emit!(self.ops; mov esi, command);
            self.call(target);
            return;
        }

        let rd = i.rd() as i32;
        match i.cop_op() {
            0x00 | 0x02 => {
                let index = if i.cop_op() == 0x02 { rd + 32 } else { rd };
                let target = self.calls.gte_read;
                emit!(self.ops; mov esi, index);
                self.call(target);
                self.stage_delayed(i.rt(), EAX);
            }
            0x04 | 0x06 => {
                let index = if i.cop_op() == 0x06 { rd + 32 } else { rd };
                let target = self.calls.gte_write;
                self.gpr(EDX, i.rt());
                emit!(self.ops; mov esi, index);
                self.call(target);
            }
            _ => self.unimplemented(i),
        }
    }

    fn lwc2(&mut self, i: Instruction) {
        self.cop2_check();
        self.isolation_check();
        self.effective_address(i);
        self.alignment_check(3, ExceptionCause::AddressErrorLoad);

        let load32 = self.calls.load32;
        self.call(load32);
        self.fault_check();

        let rt = i.rt() as i32;
        let gte_write = self.calls.gte_write;
        emit!(self.ops;
            mov edx, eax
            ; mov esi, rt
        );
        self.call(gte_write);
        emit!(self.ops; mem_done:);
    }

    fn swc2(&mut self, i: Instruction) {
        self.cop2_check();
        self.isolation_check();
        self.effective_address(i);
        self.alignment_check(3, ExceptionCause::AddressErrorStore);

        let rt = i.rt() as i32;
        let gte_read = self.calls.gte_read;
        emit!(self.ops;
            mov r13d, esi
            ; mov esi, rt
        );
        self.call(gte_read);

        let store32 = self.calls.store32;
        emit!(self.ops;
            mov edx, eax
            ; mov esi, r13d
        );
        self.call(store32);
        self.fault_check();
        emit!(self.ops; mem_done:);
    }
}

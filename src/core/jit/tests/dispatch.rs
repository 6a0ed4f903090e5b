// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::super::Recompiler;
use super::{jit, with_return, ENTRY};
use crate::core::cpu::tests::{beq, itype, lui, lw, mfc0, ori, sw, Harness, NOP};
use crate::core::cpu::EXCEPTION_VECTOR;
use crate::core::error::{EmulatorError, JitError};
use crate::core::memory::Bus;

fn j(target: u32) -> u32 {
    (0x02 << 26) | ((target >> 2) & 0x03FF_FFFF)
}

fn exc_code(h: &Harness) -> u32 {
    (h.cpu.cop0_reg(13) >> 2) & 0x1F
}

#[test]
fn test_run_frame_loops_cached_block() {
    // loop: addiu t0, t0, 1 ; beq zero, zero, loop ; nop
    let mut h = Harness::new(&[itype(0x09, 8, 8, 1), beq(0, 0, -2), NOP]);
    let mut jit = jit();

    let cycles = jit.run_frame(&mut h.cpu, &mut h.bus, &mut h.gte, 300).unwrap();

    assert_eq!(cycles, 300);
    assert_eq!(h.bus.ticks(), 300);
    assert_eq!(h.cpu.reg(8), 100);
    assert_eq!(jit.stats().compiled, 1);
    assert_eq!(jit.stats().blocks_run, 100);
}

#[test]
fn test_frame_matches_interpreter() {
    let program = [itype(0x09, 8, 8, 3), sw(8, 0, 11), lw(9, 0, 11), beq(0, 0, -4), NOP];
    let setup = |h: &mut Harness| h.cpu.set_reg(11, 0x8002_0000);

    let mut native = Harness::new(&program);
    setup(&mut native);
    let mut jit = jit();
    jit.run_frame(&mut native.cpu, &mut native.bus, &mut native.gte, 50)
        .unwrap();

    let mut interpreted = Harness::new(&program);
    setup(&mut interpreted);
    interpreted.run(50);

    assert_eq!(native.cpu.snapshot(), interpreted.cpu.snapshot());
}

#[test]
fn test_guest_rewrites_its_own_code() {
    // ori t0, 1 ; sw t2, 0(t3) ; j ENTRY ; nop
    // The store replaces the first instruction with `ori t0, 2`
    let mut h = Harness::new(&[ori(8, 0, 1), sw(10, 0, 11), j(ENTRY), NOP]);
    h.cpu.set_reg(10, ori(8, 0, 2));
    h.cpu.set_reg(11, ENTRY);
    let mut jit = jit();

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    assert_eq!(h.cpu.reg(8), 1);

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    assert_eq!(h.cpu.reg(8), 2);

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    let stats = jit.stats();
    assert_eq!(stats.compiled, 2);
    assert_eq!(stats.invalidated, 1);
    assert_eq!(jit.cached_blocks(), 1);
}

#[test]
fn test_host_rewrite_is_detected() {
    let mut h = Harness::new(&with_return(&[ori(8, 0, 1)]));
    let mut jit = jit();

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    h.bus.write32(ENTRY, ori(8, 0, 2)).unwrap();
    h.cpu.set_pc(ENTRY);
    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    assert_eq!(h.cpu.reg(8), 2);
    assert_eq!(jit.stats().compiled, 2);
}

#[test]
fn test_bios_blocks_trusted_until_invalidated() {
    let mut h = Harness::new(&[]);
    for (n, word) in with_return(&[ori(8, 0, 1)]).iter().enumerate() {
        h.bus.write_bios(n * 4, &word.to_le_bytes()).unwrap();
    }
    h.cpu.set_pc(0xBFC0_0000);
    let mut jit = jit();

    assert_eq!(jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap(), 60);

    h.bus.write_bios(0, &ori(8, 0, 2).to_le_bytes()).unwrap();
    h.cpu.set_pc(0xBFC0_0000);
    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    assert_eq!(h.cpu.reg(8), 1, "BIOS blocks are not re-validated");

    jit.invalidate_all();
    assert_eq!(jit.cached_blocks(), 0);
    h.cpu.set_pc(0xBFC0_0000);
    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    assert_eq!(h.cpu.reg(8), 2);
}

#[test]
fn test_mirror_entry_recompiles() {
    let mut h = Harness::new(&with_return(&[ori(8, 0, 1)]));
    let mut jit = jit();

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
    h.cpu.set_pc(ENTRY & 0x1FFF_FFFF);
    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    assert_eq!(jit.stats().compiled, 2);
    assert_eq!(jit.block(ENTRY).unwrap().address, ENTRY & 0x1FFF_FFFF);
}

#[test]
fn test_fallback_outside_code_regions() {
    let mut h = Harness::new(&[]);
    h.bus.write32(0x1F80_0000, ori(8, 0, 7)).unwrap();
    h.cpu.set_pc(0x1F80_0000);
    let mut jit = jit();

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    assert_eq!(h.cpu.reg(8), 7);
    assert_eq!(h.cpu.pc(), 0x1F80_0004);
    assert_eq!(jit.stats().fallback_steps, 1);
    assert_eq!(jit.cached_blocks(), 0);
}

#[test]
fn test_misaligned_pc() {
    let mut h = Harness::new(&[]);
    h.cpu.set_pc(ENTRY + 2);
    let mut jit = jit();

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    assert_eq!(h.cpu.pc(), EXCEPTION_VECTOR);
    assert_eq!(exc_code(&h), 4);
    assert_eq!(h.cpu.cop0_reg(8), ENTRY + 2);
    assert_eq!(h.cpu.cop0_reg(14), ENTRY + 2);
}

#[test]
fn test_interrupt_polled_after_block() {
    let mut h = Harness::new(&with_return(&[ori(8, 0, 1)]));
    h.cpu.set_cop0_reg(12, 0x0000_0401);
    h.bus.write32(0x1F80_1074, 1).unwrap();
    h.bus.request_irq(1);
    let mut jit = jit();

    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    assert_eq!(h.cpu.reg(8), 1, "the block runs to completion");
    assert_eq!(h.cpu.pc(), EXCEPTION_VECTOR);
    assert_eq!(exc_code(&h), 0);
    // Return address of `jr $ra` with ra = 0
    assert_eq!(h.cpu.cop0_reg(14), 0);
}

#[test]
fn test_bus_error_stops_block() {
    let mut h = Harness::new(&[lui(11, 0x1F90), lw(8, 0, 11), ori(9, 0, 1), NOP]);
    let mut jit = jit();

    let err = jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap_err();

    assert!(matches!(
        err,
        EmulatorError::InvalidMemoryAccess { address: 0x1F90_0000 }
    ));
    assert_eq!(h.cpu.reg(9), 0);
}

#[test]
fn test_unimplemented_halts() {
    let mut h = Harness::new(&[NOP, 0x4200_0001, NOP]);
    let mut jit = jit();

    let err = jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap_err();
    assert!(matches!(
        err,
        EmulatorError::UnimplementedInstruction { instruction: 0x4200_0001, .. }
    ));
    assert!(h.cpu.is_halted());

    let err = jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap_err();
    assert!(matches!(err, EmulatorError::CpuHalted { pc } if pc == ENTRY + 4));
}

#[test]
fn test_oversized_block_is_fatal() {
    let mut h = Harness::new(&[]);
    let mut jit = Recompiler::new(4096).unwrap();

    let err = jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap_err();
    assert!(matches!(
        err,
        EmulatorError::Jit(JitError::PoolExhausted { capacity: 4096, .. })
    ));
}

#[test]
fn test_full_pool_is_reset() {
    let mut h = Harness::new(&[]);
    for n in 0..200u32 {
        let base = ENTRY + n * 0x100;
        for (k, word) in with_return(&[ori(8, 0, n as u16)]).iter().enumerate() {
            h.bus.write32(base + 4 * k as u32, *word).unwrap();
        }
    }
    let mut jit = Recompiler::new(8 * 1024).unwrap();

    for n in 0..200u32 {
        h.cpu.set_pc(ENTRY + n * 0x100);
        jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();
        assert_eq!(h.cpu.reg(8), n);
    }

    assert!(jit.stats().pool_resets >= 1);
    assert!(jit.cached_blocks() < 200);
}

#[test]
fn test_pending_delay_slot_is_interpreted() {
    // beq zero, zero, +3 ; ori t1 (slot) ; ori t2 (skipped) ; nop ; ori t3 ; jr ra ; nop
    let program = [
        beq(0, 0, 3),
        ori(9, 0, 1),
        ori(10, 0, 1),
        NOP,
        ori(11, 0, 1),
        0x03E0_0008,
        NOP,
    ];

    let mut native = Harness::new(&program);
    native.step();
    assert!(native.cpu.branch_pending());
    let mut jit = jit();

    jit.step_block(&mut native.cpu, &mut native.bus, &mut native.gte)
        .unwrap();
    assert_eq!(native.cpu.pc(), ENTRY + 16);
    assert!(jit.block(ENTRY + 4).is_none());
    jit.step_block(&mut native.cpu, &mut native.bus, &mut native.gte)
        .unwrap();

    let mut interpreted = Harness::new(&program);
    interpreted.run(5);

    assert_eq!(native.cpu.reg(9), 1);
    assert_eq!(native.cpu.reg(10), 0);
    assert_eq!(native.cpu.reg(11), 1);
    assert_eq!(native.cpu.snapshot(), interpreted.cpu.snapshot());
    assert_eq!(jit.stats().fallback_steps, 1);
    assert_eq!(jit.stats().blocks_run, 1);
}

#[test]
fn test_lost_pool_mapping_drops_cached_blocks() {
    let mut h = Harness::new(&[]);
    for (n, word) in with_return(&[ori(8, 0, 1)]).iter().enumerate() {
        h.bus.write_bios(n * 4, &word.to_le_bytes()).unwrap();
    }
    h.cpu.set_pc(0xBFC0_0000);
    let mut jit = jit();
    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    jit.pool.unmap();
    h.cpu.set_reg(8, 0);
    h.cpu.set_pc(0xBFC0_0000);
    jit.step_block(&mut h.cpu, &mut h.bus, &mut h.gte).unwrap();

    assert_eq!(h.cpu.reg(8), 1);
    assert!(jit.pool().is_mapped());
    assert_eq!(jit.stats().compiled, 2);
    assert_eq!(jit.stats().pool_resets, 1);
    assert_eq!(jit.cached_blocks(), 1);
}

#[test]
fn test_mfc0_cause_sees_irq_raised_in_block() {
    // Unmask IRQ0 through I_MASK, then read Cause; SR.IEc stays clear
    let program = [
        lui(9, 0x1F80),
        ori(9, 9, 0x1074),
        ori(8, 0, 1),
        sw(8, 0, 9),
        mfc0(10, 13),
        NOP,
    ];
    let (interpreted, native) =
        super::compare_block(&program, |h: &mut Harness| h.bus.request_irq(1));

    assert_ne!(native.cpu.reg(10) & 0x400, 0);
    assert_eq!(native.cpu.reg(10), interpreted.cpu.reg(10));
}

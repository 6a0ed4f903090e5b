// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::{addu, itype, lui, lw, ori, sw, Harness, NOP};
use crate::core::memory::Bus;

const DATA: u32 = 0x8002_0000;

/// `lui $t2, 0x8002` so that 0($t2) addresses DATA
fn base() -> u32 {
    lui(10, 0x8002)
}

#[test]
fn test_load_value_not_visible_to_next_instruction() {
    // lw $t0, 0($t2) ; addu $t1, $t0, $zero ; addu $t3, $t0, $zero
    let mut h = Harness::new(&[base(), lw(8, 0, 10), addu(9, 8, 0), addu(11, 8, 0)]);
    h.bus.write32(DATA, 0xCAFEBABE).unwrap();
    h.cpu.set_reg(8, 0x1111);

    h.run(2);
    assert_eq!(h.cpu.reg(8), 0x1111, "load still in flight");

    h.step();
    assert_eq!(h.cpu.reg(9), 0x1111, "delay slot sees the old value");
    assert_eq!(h.cpu.reg(8), 0xCAFEBABE);

    h.step();
    assert_eq!(h.cpu.reg(11), 0xCAFEBABE);
}

#[test]
fn test_back_to_back_loads_same_register() {
    // The second load cancels the first one's commit
    let mut h = Harness::new(&[base(), lw(8, 0, 10), lw(8, 4, 10), NOP, NOP]);
    h.bus.write32(DATA, 1).unwrap();
    h.bus.write32(DATA + 4, 2).unwrap();
    h.cpu.set_reg(8, 0x99);

    h.run(3);
    assert_eq!(h.cpu.reg(8), 0x99);
    h.step();
    assert_eq!(h.cpu.reg(8), 2);
}

#[test]
fn test_alu_write_in_delay_slot_wins_over_load() {
    // lw $t0 ; ori $t0, $zero, 5 -> the load commits first at the end of the
    // delay slot, then the direct write overrides it
    let mut h = Harness::new(&[base(), lw(8, 0, 10), ori(8, 0, 5), NOP]);
    h.bus.write32(DATA, 0x77).unwrap();

    h.run(3);
    assert_eq!(h.cpu.reg(8), 5);
    h.step();
    assert_eq!(h.cpu.reg(8), 5);
}

#[test]
fn test_load_to_r0_is_discarded() {
    let mut h = Harness::new(&[base(), lw(0, 0, 10), NOP, NOP]);
    h.bus.write32(DATA, 0xFFFF_FFFF).unwrap();
    h.run(4);
    assert_eq!(h.cpu.reg(0), 0);
}

#[test]
fn test_store_sees_old_value_in_delay_slot() {
    // lw $t0, 0($t2) ; sw $t0, 8($t2)
    let mut h = Harness::new(&[base(), lw(8, 0, 10), sw(8, 8, 10), NOP]);
    h.bus.write32(DATA, 0xAAAA).unwrap();
    h.cpu.set_reg(8, 0xBBBB);
    h.run(3);
    assert_eq!(h.bus.read32(DATA + 8).unwrap(), 0xBBBB);
}

#[test]
fn test_lwl_lwr_pair_uses_in_flight_value() {
    // lwr $t0, 1($t2) ; lwl $t0, 4($t2) loads the unaligned word at DATA+1
    let lwr = itype(0x26, 10, 8, 1);
    let lwl = itype(0x22, 10, 8, 4);
    let mut h = Harness::new(&[base(), lwr, lwl, NOP, NOP]);
    h.bus.write32(DATA, 0x4433_2211).unwrap();
    h.bus.write32(DATA + 4, 0x8877_6655).unwrap();

    h.run(5);
    assert_eq!(h.cpu.reg(8), 0x5544_3322);
}

#[test]
fn test_mfc0_is_delayed() {
    let mfc0 = super::mfc0(8, 12);
    let mut h = Harness::new(&[mfc0, addu(9, 8, 0), NOP]);
    h.run(2);
    assert_eq!(h.cpu.reg(9), 0);
    assert_eq!(h.cpu.reg(8), 0x10900000);
}

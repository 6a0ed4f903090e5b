// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

use super::super::*;
use super::{engines, system_with};
use crate::core::loader::{PSXExecutable, EXE_TRAP_ADDRESS};

/// ori t0, zero, 0x42 ; j 0x80010004 ; nop
fn exe_with_stack(stack_base: u32) -> PSXExecutable {
    let code: Vec<u8> = [0x3408_0042u32, 0x0800_4001, 0]
        .iter()
        .flat_map(|w| w.to_le_bytes())
        .collect();
    let mut bytes = PSXExecutable::build(0x8001_0000, 0x8001_0000, &code);
    bytes[0x14..0x18].copy_from_slice(&0x8001_8000u32.to_le_bytes());
    bytes[0x30..0x34].copy_from_slice(&stack_base.to_le_bytes());
    bytes[0x34..0x38].copy_from_slice(&0x100u32.to_le_bytes());
    PSXExecutable::load(&bytes).unwrap()
}

#[test]
fn test_sideload_sets_registers() {
    let mut system = System::new();
    system.sideload_exe(&exe_with_stack(0x801F_F000)).unwrap();

    assert_eq!(system.pc(), 0x8001_0000);
    assert_eq!(system.cpu().reg(28), 0x8001_8000);
    assert_eq!(system.cpu().reg(29), 0x801F_F100);
    assert_eq!(system.cpu().reg(30), 0x801F_F100);
    assert_eq!(system.bus().peek32(0x8001_0000), Some(0x3408_0042));
}

#[test]
fn test_sideload_without_stack_keeps_sp() {
    let mut system = System::new();
    system.cpu_mut().set_reg(29, 0x1234);
    system.sideload_exe(&exe_with_stack(0)).unwrap();

    assert_eq!(system.cpu().reg(29), 0x1234);
}

#[test]
fn test_pending_exe_installed_at_shell_entry() {
    for engine in engines() {
        let mut system = system_with(engine, 100);
        system.load_exe(exe_with_stack(0));

        system.run_frame().unwrap();
        assert!(system.has_pending_exe(), "BIOS has not reached the shell yet");

        system.cpu_mut().set_pc(EXE_TRAP_ADDRESS);
        system.run_frame().unwrap();

        assert!(!system.has_pending_exe());
        assert_eq!(system.cpu().reg(8), 0x42);
        assert_eq!(system.cpu().reg(28), 0x8001_8000);
    }
}

#[test]
fn test_oversized_exe_rejected() {
    let mut system = System::new();
    let mut exe = exe_with_stack(0);
    exe.load_address = 0x801F_FFF0;

    assert!(system.sideload_exe(&exe).is_err());
}

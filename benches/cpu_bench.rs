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

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use psrx_cpu::core::config::{CpuConfig, ExecutionMode};
use psrx_cpu::core::cpu::CPU;
use psrx_cpu::core::gte::RegisterBank;
use psrx_cpu::core::loader::PSXExecutable;
use psrx_cpu::core::memory::{Bus, MemoryBus};
use psrx_cpu::core::system::System;
use std::hint::black_box;

const PROGRAM_BASE: u32 = 0x8001_0000;

/// addiu t0, t0, 1 ; addu t1, t1, t0 ; sw t1, 0(gp) ; lw t2, 0(gp) ;
/// beq zero, zero, -5 ; nop
const HOT_LOOP: [u32; 6] = [
    0x2508_0001,
    0x0128_4821,
    0xAF89_0000,
    0x8F8A_0000,
    0x1000_FFFB,
    0x0000_0000,
];

fn hot_loop_exe() -> PSXExecutable {
    let code: Vec<u8> = HOT_LOOP.iter().flat_map(|w| w.to_le_bytes()).collect();
    let mut bytes = PSXExecutable::build(PROGRAM_BASE, PROGRAM_BASE, &code);
    bytes[0x14..0x18].copy_from_slice(&0x8002_0000u32.to_le_bytes());
    PSXExecutable::load(&bytes).unwrap()
}

fn cpu_step_benchmark(c: &mut Criterion) {
    c.bench_function("cpu_step", |b| {
        let mut cpu = CPU::new();
        let mut bus = MemoryBus::new();
        let mut gte = RegisterBank::new();

        // NOP in RAM
        bus.write32(PROGRAM_BASE, 0x00000000).unwrap();

        b.iter(|| {
            cpu.set_pc(PROGRAM_BASE);
            black_box(cpu.step(&mut bus, &mut gte).unwrap());
        });
    });
}

fn cpu_register_access_benchmark(c: &mut Criterion) {
    c.bench_function("cpu_register_read", |b| {
        let cpu = CPU::new();
        b.iter(|| {
            for i in 0..32 {
                black_box(cpu.reg(i));
            }
        });
    });

    c.bench_function("cpu_register_write", |b| {
        let mut cpu = CPU::new();
        b.iter(|| {
            for i in 0..32 {
                cpu.set_reg(i, black_box(i as u32 * 100));
            }
        });
    });
}

fn frame_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hot_loop_frame");
    group.sample_size(20);

    let mut engines = vec![ExecutionMode::Interpreter];
    if cfg!(target_arch = "x86_64") {
        engines.push(ExecutionMode::Recompiler);
    }

    for engine in engines {
        group.bench_with_input(BenchmarkId::from_parameter(engine), &engine, |b, &engine| {
            let config = CpuConfig {
                engine,
                ..CpuConfig::default()
            };
            let mut system =
                System::with_parts(MemoryBus::new(), RegisterBank::new(), &config).unwrap();
            system.sideload_exe(&hot_loop_exe()).unwrap();

            b.iter(|| black_box(system.run_frame().unwrap()));
        });
    }

    group.finish();
}

#[cfg(target_arch = "x86_64")]
fn compile_benchmark(c: &mut Criterion) {
    use psrx_cpu::core::jit::{Recompiler, MAX_BLOCK_INSTRUCTIONS};

    let mut group = c.benchmark_group("recompiler");

    // A maximal straight-line block of ALU work
    group.bench_function("compile_full_block", |b| {
        let mut bus = MemoryBus::new();
        for n in 0..MAX_BLOCK_INSTRUCTIONS as u32 {
            bus.write32(PROGRAM_BASE + 4 * n, 0x0128_4821).unwrap();
        }
        let mut cpu = CPU::new();
        let mut gte = RegisterBank::new();
        let mut jit = Recompiler::<MemoryBus, RegisterBank>::new(16 * 1024 * 1024).unwrap();

        b.iter(|| {
            jit.invalidate_all();
            cpu.set_pc(PROGRAM_BASE);
            black_box(jit.step_block(&mut cpu, &mut bus, &mut gte).unwrap());
        });
    });

    group.bench_function("cached_block", |b| {
        let mut bus = MemoryBus::new();
        for (n, word) in HOT_LOOP.iter().enumerate() {
            bus.write32(PROGRAM_BASE + 4 * n as u32, *word).unwrap();
        }
        let mut cpu = CPU::new();
        cpu.set_reg(28, 0x8002_0000);
        let mut gte = RegisterBank::new();
        let mut jit = Recompiler::<MemoryBus, RegisterBank>::new(1024 * 1024).unwrap();

        b.iter(|| {
            cpu.set_pc(PROGRAM_BASE);
            black_box(jit.step_block(&mut cpu, &mut bus, &mut gte).unwrap());
        });
    });

    group.finish();
}

#[cfg(not(target_arch = "x86_64"))]
fn compile_benchmark(_c: &mut Criterion) {}

criterion_group!(
    benches,
    cpu_step_benchmark,
    cpu_register_access_benchmark,
    frame_benchmark,
    compile_benchmark
);
criterion_main!(benches);

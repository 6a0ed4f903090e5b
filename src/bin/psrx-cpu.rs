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

use clap::Parser;
use log::{error, info};
use psrx_cpu::core::config::{EmulatorConfig, ExecutionMode};
use psrx_cpu::core::error::{EmulatorError, Result};
use psrx_cpu::core::loader::PSXExecutable;
use psrx_cpu::core::system::System;
use std::path::PathBuf;

/// PlayStation R3000A CPU runner
#[derive(Parser)]
#[command(name = "psrx-cpu")]
#[command(about = "Run a PlayStation BIOS or EXE on the CPU core", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Path to PlayStation BIOS file (e.g., SCPH1001.BIN)
    #[arg(short = 'b', long)]
    bios: Option<PathBuf>,

    /// PS-X EXE to side-load when the BIOS reaches the shell
    #[arg(short = 'e', long)]
    exe: Option<PathBuf>,

    /// Execution engine: interpreter or recompiler
    #[arg(long)]
    engine: Option<ExecutionMode>,

    /// Number of frames to run
    #[arg(short = 'n', long, default_value = "60")]
    frames: u64,

    /// Write an execution trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Maximum trace lines
    #[arg(long, default_value = "100000")]
    trace_limit: u64,

    /// Print the final register state as JSON
    #[arg(long)]
    dump_json: bool,
}

fn load_config(args: &Args) -> Result<EmulatorConfig> {
    let mut config = match &args.config {
        Some(path) => EmulatorConfig::load(path)?,
        None => EmulatorConfig::default(),
    };
    config.apply_env()?;

    if let Some(bios) = &args.bios {
        config.bios = Some(bios.clone());
    }
    if let Some(exe) = &args.exe {
        config.exe = Some(exe.clone());
    }
    if let Some(engine) = args.engine {
        config.cpu.engine = engine;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize logger with default level INFO
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("psrx-cpu v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = load_config(&args)?;

    if config.bios.is_none() && config.exe.is_none() {
        error!("Nothing to run: pass --bios and/or --exe");
        return Err(EmulatorError::Config("no BIOS or EXE given".into()));
    }

    // Without a BIOS there is no shell to trap, so the EXE starts directly
    let direct_exe = match config.bios {
        Some(_) => None,
        None => config.exe.take(),
    };

    let mut system = System::from_config(&config)?;
    if let Some(path) = direct_exe {
        system.sideload_exe(&PSXExecutable::from_file(path)?)?;
    }

    if let Some(path) = &args.trace {
        system.enable_tracing(path, args.trace_limit)?;
    }

    info!(
        "Running {} frames with the {} engine",
        args.frames,
        system.mode()
    );

    let log_interval = (args.frames / 10).max(1);
    for frame in 0..args.frames {
        if let Err(e) = system.run_frame() {
            error!("Error at PC=0x{:08X} in frame {}: {}", system.pc(), frame, e);
            eprintln!("{}", system.snapshot());
            system.disable_tracing();
            return Err(e);
        }

        if frame > 0 && frame % log_interval == 0 {
            info!(
                "Progress: {}/{} frames | PC: 0x{:08X} | Cycles: {}",
                frame,
                args.frames,
                system.pc(),
                system.cycles()
            );
        }
    }
    system.disable_tracing();

    info!("Emulation completed successfully!");
    info!("Total cycles: {}", system.cycles());
    #[cfg(target_arch = "x86_64")]
    if let Some(stats) = system.recompiler_stats() {
        info!(
            "Recompiler: {} blocks compiled, {} invalidated, {} run, {} pool resets",
            stats.compiled, stats.invalidated, stats.blocks_run, stats.pool_resets
        );
    }

    let snapshot = system.snapshot();
    if args.dump_json {
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| EmulatorError::Config(format!("cannot serialize registers: {}", e)))?;
        println!("{}", json);
    } else {
        println!("{}", snapshot);
    }

    Ok(())
}

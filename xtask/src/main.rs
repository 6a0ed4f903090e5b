use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for psrx-cpu")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Library module to test (cpu, jit, memory, system)
        #[arg(long)]
        module: Option<String>,
    },
    /// Interpreter/recompiler equivalence suite with more proptest cases
    Equivalence {
        #[arg(long, default_value = "2048")]
        cases: u32,
    },
    /// Run benchmarks
    Bench,
    /// Run a BIOS (and optionally an EXE) through the CLI runner
    Run {
        /// Path to BIOS file
        #[arg(default_value = "SCPH1001.BIN")]
        bios_path: String,
        /// PS-X EXE to side-load at the shell entry point
        #[arg(long)]
        exe: Option<String>,
        /// interpreter or recompiler
        #[arg(long, default_value = "recompiler")]
        engine: String,
        /// Number of frames to run
        #[arg(short = 'n', long, default_value = "60")]
        frames: u64,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Test {
            doc,
            ignored,
            module,
        } => run_test(doc, ignored, module.as_deref()),
        Commands::Equivalence { cases } => run_equivalence(cases),
        Commands::Bench => execute_command(Command::new("cargo").arg("bench")),
        Commands::Run {
            bios_path,
            exe,
            engine,
            frames,
            release,
        } => run_emulator(&bios_path, exe.as_deref(), &engine, frames, release),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task(
        "Build",
        || execute_command(Command::new("cargo").arg("build").arg("--all-targets")),
        verbose,
    )?;
    run_task("Test", || run_test(false, false, None), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, ignored: bool, module: Option<&str>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("test");

    if doc {
        cmd.arg("--doc");
    } else if let Some(module) = module {
        const MODULES: [&str; 4] = ["cpu", "jit", "memory", "system"];
        if !MODULES.contains(&module) {
            anyhow::bail!("unknown module '{}' (expected one of {:?})", module, MODULES);
        }
        println!("{} Running {} tests...", "→".blue(), module.bold());
        cmd.arg("--lib").arg(format!("core::{}", module));
    }

    if ignored {
        cmd.arg("--").arg("--ignored");
    }

    execute_command(&mut cmd)
}

fn run_equivalence(cases: u32) -> Result<()> {
    println!(
        "{} Equivalence suite with {} cases per property",
        "→".blue(),
        cases.to_string().bold()
    );

    let mut cmd = Command::new("cargo");
    cmd.env("PROPTEST_CASES", cases.to_string())
        .arg("test")
        .arg("--release")
        .arg("--test")
        .arg("equivalence");

    execute_command(&mut cmd)
}

fn run_emulator(
    bios_path: &str,
    exe: Option<&str>,
    engine: &str,
    frames: u64,
    release: bool,
) -> Result<()> {
    println!("{}", "=== BIOS Run ===".bold().blue());

    let bios = Path::new(bios_path);
    if !bios.exists() {
        println!(
            "{} BIOS file not found: {}",
            "✗".red().bold(),
            bios_path.yellow()
        );
        anyhow::bail!("BIOS file not found");
    }

    let size = std::fs::metadata(bios)?.len();
    if size != 512 * 1024 {
        println!(
            "{} Invalid BIOS size: {} bytes (expected 524288 bytes)",
            "✗".red().bold(),
            size
        );
        anyhow::bail!("Invalid BIOS file size");
    }

    println!("{} BIOS file: {}", "✓".green(), bios_path.cyan());
    println!("{} Engine: {}", "→".blue(), engine.bold());
    println!("{} Frames: {}", "→".blue(), frames.to_string().bold());
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run");
    if release {
        cmd.arg("--release");
    }
    cmd.arg("--bin")
        .arg("psrx-cpu")
        .arg("--")
        .arg("--bios")
        .arg(bios_path)
        .arg("--engine")
        .arg(engine)
        .arg("-n")
        .arg(frames.to_string());
    if let Some(exe) = exe {
        cmd.arg("--exe").arg(exe);
    }

    execute_command(&mut cmd)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} Run completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}

//! DCPU-16 Emulator - CLI Entry Point
//!
//! Commands:
//! - `dcpu16-emu run <program>` - Run a hex or binary image
//! - `dcpu16-emu convert <image> <output>` - Rewrite an image as hex text
//! - `dcpu16-emu test` - Built-in self-test

use clap::{Parser, Subcommand};
use dcpu16::{Cpu, CpuConfig, Reg, SkipPolicy};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "dcpu16-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the DCPU-16 16-bit virtual CPU")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the program image (.hex text or .bin big-endian words)
        program: String,
        /// Maximum number of steps to run, 0 for no limit
        #[arg(short, long, default_value = "100000")]
        max_cycles: u64,
        /// Wait for Enter before starting
        #[arg(short, long)]
        pause: bool,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// Skip policy: whole_instruction, instruction_word or no_fetch
        #[arg(long)]
        skip_policy: Option<SkipPolicy>,
        /// DIV stores the quotient multiplied by 0xFFFF
        #[arg(long)]
        legacy_div: bool,
        /// Write the final machine state as JSON
        #[arg(long)]
        dump_state: Option<String>,
    },
    /// Rewrite a program image in the hex text format
    Convert {
        /// Input image
        image: String,
        /// Output hex file
        output: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logging: {}", e);
    }

    match cli.command {
        Some(Commands::Run { program, max_cycles, pause, config, skip_policy, legacy_div, dump_state }) => {
            let mut cfg = match config {
                Some(path) => match CpuConfig::from_json_file(&path) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        eprintln!("❌ Failed to load config: {}", e);
                        std::process::exit(1);
                    }
                },
                None => CpuConfig::default(),
            };
            if let Some(policy) = skip_policy {
                cfg.skip_policy = policy;
            }
            cfg.legacy_div |= legacy_div;

            run_program(&program, cfg, max_cycles, pause, dump_state.as_deref());
        }
        Some(Commands::Convert { image, output }) => {
            convert_image(&image, &output);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("DCPU-16 Emulator v0.1.0");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_sample_program();
        }
    }
}

fn run_program(path: &str, config: CpuConfig, max_cycles: u64, pause: bool, dump_state: Option<&str>) {
    use dcpu16::load_image;

    println!("🔧 Running: {}", path);

    let program = match load_image(path) {
        Ok(words) => {
            println!("📂 Loaded {} words", words.len());
            words
        }
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    let mut cpu = Cpu::with_config(config);
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }
    log::info!("config: {:?}", cpu.config);

    if pause {
        wait_for_enter();
    }

    let result = if max_cycles == 0 {
        cpu.run()
    } else {
        cpu.run_limited(max_cycles)
    };
    let cycles = match result {
        Ok(n) => n,
        Err(e) => {
            eprintln!("❌ CPU error at PC={:#06x}: {}", cpu.regs.pc, e);
            std::process::exit(1);
        }
    };

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cycles);
    println!("State: {:?}", cpu.state);
    print_registers(&cpu);

    if cpu.is_running() {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if let Some(out) = dump_state {
        let written = cpu
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(out, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("✓ State written to {}", out),
            Err(e) => {
                eprintln!("❌ Failed to write state: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn wait_for_enter() {
    use std::io::{BufRead, Write};

    print!("Press Enter to continue...");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        log::warn!("could not read from stdin: {}", e);
    }
}

fn print_registers(cpu: &Cpu) {
    for reg in Reg::ALL {
        print!("{}={:04x} ", reg.name(), cpu.regs[reg]);
    }
    println!();
    println!("SP={:04x} PC={:04x} O={:04x}", cpu.regs.sp, cpu.regs.pc, cpu.regs.o);
}

fn convert_image(input: &str, output: &str) {
    use dcpu16::{load_image, save_hex};

    println!("📝 Converting: {} → {}", input, output);

    let words = match load_image(input) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = save_hex(output, &words) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Wrote {} words", words.len());
}

fn demo_sample_program() {
    use dcpu16::SAMPLE_PROGRAM;

    println!("━━━ Reference Program Demo ━━━");

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&SAMPLE_PROGRAM) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    // The program ends in an endless `SET PC, crash`.
    match cpu.run_limited(200) {
        Ok(cycles) => println!("Ran {} steps", cycles),
        Err(e) => {
            eprintln!("❌ CPU error: {}", e);
            std::process::exit(1);
        }
    }
    print_registers(&cpu);
}

fn run_self_test() {
    use dcpu16::SAMPLE_PROGRAM;

    println!("━━━ DCPU-16 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    // Test 1: power-on state
    let cpu = Cpu::new();
    check("Power-on state", cpu.regs.sp == 0xFFFF && cpu.regs.pc == 0 && !cpu.is_halted());

    // Test 2: SET A, next word
    let mut cpu = Cpu::new();
    let ok = cpu.load_program(&[0x7C01, 0x0005]).is_ok()
        && cpu.step().is_ok()
        && cpu.regs[Reg::A] == 5
        && cpu.regs.pc == 2;
    check("SET A, next word", ok);

    // Test 3: ADD overflow (SET A, 0xffff; ADD A, 1)
    let mut cpu = Cpu::new();
    let ok = cpu.load_program(&[0x7C01, 0xFFFF, 0x8402]).is_ok()
        && cpu.run_limited(2).is_ok()
        && cpu.regs[Reg::A] == 0
        && cpu.regs.o == 1;
    check("ADD overflow", ok);

    // Test 4: undefined extended opcode halts
    let mut cpu = Cpu::new();
    let ok = cpu.load_program(&[0x0000]).is_ok() && cpu.run().is_ok() && cpu.is_halted();
    check("Halt on undefined extended opcode", ok);

    // Test 5: reference program
    let mut cpu = Cpu::new();
    let ok = cpu.load_program(&SAMPLE_PROGRAM).is_ok()
        && cpu.run_limited(200).is_ok()
        && cpu.regs[Reg::X] == 0x40
        && cpu.regs.pc == 0x1A;
    check("Reference program", ok);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}

//! Game Boy emulator binary.
//!
//! Runs headless: loads a ROM, runs a number of frames, and optionally
//! saves a screenshot, records frames, echoes serial output or traces
//! every instruction fetch.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use emu_gb::{GameBoy, GbConfig, StartState, capture};

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    rom_path: Option<PathBuf>,
    frames: u32,
    screenshot_path: Option<PathBuf>,
    record_dir: Option<PathBuf>,
    serial: bool,
    trace: bool,
    reset: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        frames: 200,
        screenshot_path: None,
        record_dir: None,
        serial: false,
        trace: false,
        reset: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--record" => {
                i += 1;
                cli.record_dir = args.get(i).map(PathBuf::from);
            }
            "--serial" => cli.serial = true,
            "--trace" => cli.trace = true,
            "--reset" => cli.reset = true,
            "--help" | "-h" => {
                eprintln!("Usage: emu-gb --rom <file> [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --rom <file>         Cartridge image (.gb, at most 32 KiB)");
                eprintln!("  --frames <n>         Number of frames to run [default: 200]");
                eprintln!("  --screenshot <file>  Save a PNG screenshot after the last frame");
                eprintln!("  --record <dir>       Record every frame as PNG to <dir>/frames");
                eprintln!("  --serial             Echo serial port bytes to stdout");
                eprintln!("  --trace              Print each instruction fetch to stderr");
                eprintln!("  --reset              Start at $0000 with cleared registers");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Machine setup
// ---------------------------------------------------------------------------

fn make_gb(cli: &CliArgs) -> GameBoy {
    let Some(ref rom_path) = cli.rom_path else {
        eprintln!("No ROM specified. Use --rom <file>");
        process::exit(1);
    };

    let rom_data = match std::fs::read(rom_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read ROM {}: {e}", rom_path.display());
            process::exit(1);
        }
    };

    let config = GbConfig {
        rom_data,
        start: if cli.reset {
            StartState::Reset
        } else {
            StartState::PostBoot
        },
    };

    let mut gb = match GameBoy::new(&config) {
        Ok(gb) => gb,
        Err(e) => {
            eprintln!("Failed to load ROM: {e}");
            process::exit(1);
        }
    };

    if cli.serial {
        gb.set_serial_sink(|byte| {
            let mut out = std::io::stdout();
            let _ = out.write_all(&[byte]);
            let _ = out.flush();
        });
    }

    if cli.trace {
        gb.set_tracer(|t| {
            let r = &t.registers;
            eprintln!(
                "{:04X}  {:<14} A={:02X} F={:02X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
                t.pc,
                t.mnemonic,
                r.a,
                r.f,
                r.bc(),
                r.de(),
                r.hl(),
                r.sp
            );
        });
    }

    gb
}

// ---------------------------------------------------------------------------
// Headless run
// ---------------------------------------------------------------------------

fn run_headless(cli: &CliArgs) {
    let mut gb = make_gb(cli);

    if let Some(ref dir) = cli.record_dir {
        if let Err(e) = capture::record(&mut gb, dir, cli.frames) {
            eprintln!("Record error: {e}");
            process::exit(1);
        }
        return;
    }

    for _ in 0..cli.frames {
        if let Err(e) = gb.run_frame() {
            eprintln!("Emulation stopped after {} cycles: {e}", gb.master_clock());
            process::exit(1);
        }
    }

    if let Some(ref path) = cli.screenshot_path {
        if let Err(e) = capture::save_screenshot(&gb, path) {
            eprintln!("Screenshot error: {e}");
            process::exit(1);
        }
        eprintln!("Screenshot saved to {}", path.display());
    }
}

fn main() {
    let cli = parse_args();
    run_headless(&cli);
}

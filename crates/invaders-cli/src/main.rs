//! Space Invaders shell.

use std::{io, path::PathBuf, process};

use argh::FromArgs;
use invaders_core::{
    drivers::WindowInterface,
    emulator::{Emulator, EmulatorContext},
    errors::CResult,
    peripherals::rom::Rom,
};
use invaders_drivers::WinitWindowDriver;

/// Space Invaders (Intel 8080) emulator
#[derive(FromArgs)]
pub struct Args {
    /// subcommand
    #[argh(subcommand)]
    pub nested: SubCommands,
}

/// Subcommands
#[derive(FromArgs)]
#[argh(subcommand)]
pub enum SubCommands {
    /// Play command
    Play(PlayCommand),
    /// Diagnostic command
    Diag(DiagCommand),
    /// Disassemble command
    Disassemble(DisassembleCommand),
    /// Version command
    Version(VersionCommand),
}

/// play a ROM image (a binary, or a directory with the split arcade set)
#[derive(FromArgs)]
#[argh(subcommand, name = "play")]
pub struct PlayCommand {
    /// ROM path
    #[argh(positional)]
    pub file: PathBuf,

    /// debug level (1: disassembly, 2: adds registers, 3: adds counter)
    #[argh(option, short = 'd', default = "0")]
    pub debug: u8,

    /// run without a graphics surface
    #[argh(switch)]
    pub headless: bool,

    /// trace output file ('-' for stdout)
    #[argh(option, short = 't')]
    pub trace: Option<PathBuf>,
}

/// run a CP/M diagnostic image loaded at 0x0100
#[derive(FromArgs)]
#[argh(subcommand, name = "diag")]
pub struct DiagCommand {
    /// diagnostic image path
    #[argh(positional)]
    pub file: PathBuf,

    /// debug level (1: disassembly, 2: adds registers, 3: adds counter)
    #[argh(option, short = 'd', default = "0")]
    pub debug: u8,
}

/// disassemble a ROM image
#[derive(FromArgs)]
#[argh(subcommand, name = "disassemble")]
pub struct DisassembleCommand {
    /// ROM path
    #[argh(positional)]
    pub file: PathBuf,

    /// output file (omit argument for stdout)
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,
}

/// show version
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
pub struct VersionCommand {}

/// Start shell.
fn main() -> CResult {
    let args: Args = argh::from_env();
    parse_args(args)
}

/// Parse arguments.
fn parse_args(args: Args) -> CResult {
    let s = tracing_subscriber::fmt();
    s.compact().init();

    match args.nested {
        SubCommands::Version(_) => {
            let cmd_name = std::env::current_exe()
                .unwrap()
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .to_string();
            println!("{} {}", cmd_name, env!("CARGO_PKG_VERSION"));
        }
        SubCommands::Disassemble(cmd) => {
            let rom = load_rom_or_exit(&cmd.file);
            let output = cmd
                .output
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| "-".to_string());
            rom.write_disassembly_to_file(&output)?;
        }
        SubCommands::Diag(cmd) => {
            let rom = load_rom_or_exit(&cmd.file);

            let mut emulator = Emulator::new();
            let mut emulator_ctx = EmulatorContext::new();
            emulator_ctx.debug_level = cmd.debug;

            println!("> Test suite: {}", rom.get_title());
            let stdout = io::stdout();
            match emulator.run_diagnostic(&rom, &mut emulator_ctx, &mut stdout.lock()) {
                Ok(printed) => {
                    println!();
                    if !printed {
                        eprintln!("diagnostic produced no BIOS output");
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        SubCommands::Play(cmd) => {
            let rom = load_rom_or_exit(&cmd.file);

            let mut emulator = Emulator::new();
            let mut emulator_ctx = EmulatorContext::new();
            emulator_ctx.debug_level = cmd.debug;
            emulator.load_rom(&rom);

            if let Some(trace) = cmd.trace {
                emulator.set_tracefile(&trace.to_string_lossy().to_string());
            }

            if cmd.headless {
                emulator_ctx.prepare_tracefile(&emulator.cpu.tracefile);
                if let Err(e) = emulator.run_headless(&mut emulator_ctx) {
                    eprintln!("execution error: {}", e);
                    process::exit(1);
                }
            } else {
                let mut driver = WinitWindowDriver::new();
                if let Err(e) = driver.run_emulator(emulator, emulator_ctx, rom) {
                    eprintln!("execution error: {}", e);
                    process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Load a ROM or exit with an error message.
fn load_rom_or_exit(path: &PathBuf) -> Rom {
    match Rom::load_from_path(path) {
        Ok(rom) => rom,
        Err(error) => {
            eprintln!("{}", error);
            process::exit(1);
        }
    }
}

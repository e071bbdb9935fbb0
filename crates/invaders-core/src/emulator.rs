//! Space Invaders emulator.

use std::{
    error::Error,
    fmt,
    fs::{File, OpenOptions},
    io::Write,
};

use tracing::info;

use super::core::{
    cpu::Cpu,
    opcodes::get_opcode_str,
    registers::RegPair,
    savestate::{MissingSaveState, SaveState},
    types::I8Addr,
};
use super::errors::CResult;
use super::peripherals::{
    memory::DIAG_ENTRY_POINT,
    rom::Rom,
    screen::VblankTimer,
};
use crate::trace_exec;

/// CP/M BIOS entry point intercepted in diagnostic mode.
const BIOS_CALL_ADDR: I8Addr = 0x0005;

/// Space Invaders emulator.
#[derive(Default)]
pub struct Emulator {
    /// CPU handle.
    pub cpu: Cpu,
    timer: VblankTimer,
}

/// Emulation state.
#[derive(Debug)]
pub enum EmulationState {
    /// Quit.
    Quit,
    /// Normal.
    Normal,
    /// A half-frame interrupt fired; the framebuffer is fresh.
    Frame,
}

/// Tracefile handle.
#[derive(Debug)]
pub enum TracefileHandle {
    /// File.
    File(File),
    /// Stdout.
    Stdout,
}

/// Diagnostic failure.
#[derive(Debug)]
pub struct DiagnosticFailure(pub String);

impl Error for DiagnosticFailure {
    fn description(&self) -> &str {
        "diagnostic failure"
    }
}

impl fmt::Display for DiagnosticFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagnostic failure: {}", self.0)
    }
}

/// Emulator context.
pub struct EmulatorContext {
    tracefile_handle: Option<TracefileHandle>,

    /// Debug level: 1 traces disassembly, 2 adds registers and flags,
    /// 3 adds the instruction counter.
    pub debug_level: u8,
}

impl Default for EmulatorContext {
    fn default() -> Self {
        Self {
            tracefile_handle: None,
            debug_level: 0,
        }
    }
}

impl EmulatorContext {
    /// Create new emulator context.
    ///
    /// # Returns
    ///
    /// * Emulator context.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Prepare tracefile.
    ///
    /// # Arguments
    ///
    /// * `tracefile` - Tracefile.
    ///
    pub fn prepare_tracefile(&mut self, tracefile: &Option<String>) {
        self.tracefile_handle = match tracefile {
            Some(ref path) => {
                if path == "-" {
                    Some(TracefileHandle::Stdout)
                } else {
                    Some(TracefileHandle::File(
                        OpenOptions::new()
                            .write(true)
                            .create(true)
                            .truncate(true)
                            .open(path)
                            .unwrap(),
                    ))
                }
            }
            None => None,
        };
    }
}

impl Emulator {
    /// Create new emulator.
    ///
    /// # Returns
    ///
    /// * Emulator instance.
    ///
    pub fn new() -> Self {
        Default::default()
    }

    /// Set CPU tracefile.
    ///
    /// # Arguments
    ///
    /// * `tracefile` - Tracefile.
    ///
    pub fn set_tracefile(&mut self, tracefile: &str) {
        self.cpu.tracefile(tracefile);
    }

    /// Load an arcade ROM at address 0.
    ///
    /// # Arguments
    ///
    /// * `rom` - ROM image.
    ///
    pub fn load_rom(&mut self, rom: &Rom) {
        self.cpu.peripherals.memory.load_at(0x0000, rom.get_data());
    }

    /// Save state.
    ///
    /// # Arguments
    ///
    /// * `name` - ROM name.
    ///
    pub fn save_state(&self, name: &str) {
        let savestate = SaveState::save_from_cpu(&self.cpu);
        savestate.write_to_file(&format!("{}.sav", name));
    }

    /// Load state.
    ///
    /// # Arguments
    ///
    /// * `name` - ROM name.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn load_state(&mut self, name: &str) -> CResult {
        let filename = format!("{}.sav", name);
        let savestate = SaveState::read_from_file(&filename);
        match savestate {
            None => Err(Box::new(MissingSaveState(filename))),
            Some(ss) => {
                self.cpu.load_savestate(ss);
                Ok(())
            }
        }
    }

    /// Reset.
    ///
    /// # Arguments
    ///
    /// * `rom` - ROM image.
    ///
    pub fn reset(&mut self, rom: &Rom) {
        self.cpu.reset();
        self.load_rom(rom);
    }

    /// Step emulation.
    ///
    /// Interrupts are sampled only here, at instruction boundaries, and
    /// only while the interrupt-enable latch is set.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Emulator context.
    ///
    /// # Returns
    ///
    /// * Emulation state.
    ///
    pub fn step(&mut self, ctx: &mut EmulatorContext) -> EmulationState {
        let mut frame = false;

        if self.cpu.int_enable {
            if let Some(interrupts) = self.timer.tick(self.cpu.cycles) {
                self.cpu.peripherals.bus.request_interrupts(&interrupts);
                self.cpu.cycles = 0;
                self.cpu.peripherals.refresh_screen();
                frame = true;
            }

            if let Some(opcode) = self.cpu.peripherals.bus.pop_interrupt() {
                self.cpu.interrupt(opcode);
                return if frame {
                    EmulationState::Frame
                } else {
                    EmulationState::Normal
                };
            }
        }

        self.trace_step(ctx);

        if self.cpu.step() {
            info!("HLT at {:04X}", self.cpu.registers.pc);
            return EmulationState::Quit;
        }

        if frame {
            EmulationState::Frame
        } else {
            EmulationState::Normal
        }
    }

    /// Run without a graphics surface until the CPU halts.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Emulator context.
    ///
    /// # Returns
    ///
    /// * Result.
    ///
    pub fn run_headless(&mut self, ctx: &mut EmulatorContext) -> CResult {
        loop {
            if let EmulationState::Quit = self.step(ctx) {
                return Ok(());
            }
        }
    }

    /// Run a CP/M diagnostic image.
    ///
    /// The image is loaded at 0x0100 and the BIOS entry at 0x0005 is
    /// patched to RET; a CALL 0x0005 with C == 9 prints the `$`-terminated
    /// string at DE, with C == 2 the character in E. The run ends on a jump
    /// to 0x0000; reaching HLT is a failure.
    ///
    /// # Arguments
    ///
    /// * `rom` - Diagnostic image.
    /// * `ctx` - Emulator context.
    /// * `output` - BIOS output sink.
    ///
    /// # Returns
    ///
    /// * `true` if a BIOS print ran before the final jump.
    ///
    pub fn run_diagnostic<W: Write>(
        &mut self,
        rom: &Rom,
        ctx: &mut EmulatorContext,
        output: &mut W,
    ) -> CResult<bool> {
        let memory = &mut self.cpu.peripherals.memory;
        memory.load_at(DIAG_ENTRY_POINT, rom.get_data());
        memory.write(BIOS_CALL_ADDR, 0xC9);
        self.cpu.registers.pc = DIAG_ENTRY_POINT;

        let mut printed = false;

        loop {
            let pc = self.cpu.registers.pc;

            if self.cpu.peripherals.memory.read(pc) == 0x76 {
                return Err(Box::new(DiagnosticFailure(format!("HLT at {:04X}", pc))));
            }

            if pc == BIOS_CALL_ADDR {
                match self.cpu.registers.c {
                    9 => {
                        let mut addr = self.cpu.registers.pair(RegPair::DE);
                        loop {
                            let byte = self.cpu.peripherals.memory.read(addr);
                            if byte == b'$' {
                                break;
                            }
                            output.write_all(&[byte])?;
                            addr = addr.wrapping_add(1);
                        }
                        printed = true;
                    }
                    2 => {
                        output.write_all(&[self.cpu.registers.e])?;
                    }
                    _ => (),
                }
            }

            self.trace_step(ctx);
            self.cpu.step();

            if self.cpu.registers.pc == 0 {
                info!("jump to 0000 from {:04X}", pc);
                return Ok(printed);
            }
        }
    }

    /// Trace the instruction at PC according to the debug level and
    /// tracefile.
    fn trace_step(&mut self, ctx: &mut EmulatorContext) {
        if ctx.debug_level == 0 && ctx.tracefile_handle.is_none() {
            return;
        }

        let pc = self.cpu.registers.pc;
        let opcode = self.cpu.fetch();
        let (assembly, verbose) = get_opcode_str(&opcode);

        trace_exec!(
            ctx.tracefile_handle,
            "[{:08X}] {:04X} - {:20} ; {}",
            self.cpu.instruction_count,
            pc,
            assembly,
            verbose
        );

        if ctx.debug_level >= 1 {
            println!("{:04X}| {:20} ; {}", pc, assembly, verbose);
        }
        if ctx.debug_level >= 2 {
            println!("      {:?}", self.cpu.registers);
        }
        if ctx.debug_level >= 3 {
            println!("      Instruction count: {}", self.cpu.instruction_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::screen::CYCLES_PER_HALF_FRAME;

    #[test]
    fn test_interrupt_delivery_order() {
        let mut emulator = Emulator::new();
        let mut ctx = EmulatorContext::new();

        emulator.cpu.registers.sp = 0x2400;
        emulator.cpu.registers.pc = 0x1A00;
        emulator.cpu.int_enable = true;
        emulator.cpu.cycles = CYCLES_PER_HALF_FRAME;

        // First step delivers RST 1 without advancing PC beforehand.
        emulator.step(&mut ctx);
        assert_eq!(emulator.cpu.registers.pc, 0x0008);
        assert_eq!(
            emulator.cpu.peripherals.memory.read_word(emulator.cpu.registers.sp),
            0x1A00
        );
        assert_eq!(emulator.cpu.cycles, 11);
        assert!(!emulator.cpu.int_enable);

        // The handler re-enables interrupts; the queued RST 2 follows.
        emulator.cpu.peripherals.memory.write(0x0008, 0xFB);
        emulator.step(&mut ctx);
        assert!(emulator.cpu.int_enable);

        emulator.step(&mut ctx);
        assert_eq!(emulator.cpu.registers.pc, 0x0010);
        assert!(!emulator.cpu.int_enable);
    }

    #[test]
    fn test_interrupts_wait_for_enable() {
        let mut emulator = Emulator::new();
        let mut ctx = EmulatorContext::new();

        emulator.cpu.cycles = CYCLES_PER_HALF_FRAME * 2;

        // NOP at 0: with interrupts disabled the timer never fires.
        emulator.step(&mut ctx);
        assert_eq!(emulator.cpu.registers.pc, 0x0001);
        assert_eq!(emulator.cpu.peripherals.bus.pop_interrupt(), None);
    }

    #[test]
    fn test_diagnostic_bios_print() {
        // MVI C, 9; LXI D, 0x0130; CALL 5; JMP 0
        let mut program = vec![0x0E, 0x09, 0x11, 0x30, 0x01, 0xCD, 0x05, 0x00, 0xC3, 0x00, 0x00];
        program.resize(0x30, 0x00);
        program.extend_from_slice(b"HELLO$");

        let rom = Rom::from_bytes("BIOSTEST", &program);
        let mut emulator = Emulator::new();
        emulator.cpu.registers.sp = 0x2400;

        let mut ctx = EmulatorContext::new();
        let mut output = Vec::new();
        let printed = emulator
            .run_diagnostic(&rom, &mut ctx, &mut output)
            .unwrap();

        assert!(printed);
        assert_eq!(output, b"HELLO");
    }

    #[test]
    fn test_diagnostic_char_output() {
        // MVI C, 2; MVI E, 'A'; CALL 5; JMP 0
        let program = vec![
            0x0E, 0x02, 0x1E, 0x41, 0xCD, 0x05, 0x00, 0xC3, 0x00, 0x00,
        ];

        let rom = Rom::from_bytes("BIOSTEST", &program);
        let mut emulator = Emulator::new();
        emulator.cpu.registers.sp = 0x2400;

        let mut ctx = EmulatorContext::new();
        let mut output = Vec::new();
        let printed = emulator
            .run_diagnostic(&rom, &mut ctx, &mut output)
            .unwrap();

        // Character output alone does not flag success.
        assert!(!printed);
        assert_eq!(output, b"A");
    }

    #[test]
    fn test_diagnostic_halt_is_failure() {
        let rom = Rom::from_bytes("BIOSTEST", &[0x76]);
        let mut emulator = Emulator::new();
        emulator.cpu.registers.sp = 0x2400;

        let mut ctx = EmulatorContext::new();
        let mut output = Vec::new();
        let result = emulator.run_diagnostic(&rom, &mut ctx, &mut output);

        assert!(result.is_err());
    }
}

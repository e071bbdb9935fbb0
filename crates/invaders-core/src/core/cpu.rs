//! CPU.

use std::fmt;

use super::alu;
use super::opcodes::{get_opcode_enum, get_opcode_length, Cond, OpCode};
use super::registers::{Reg, RegPair, Registers, StackPair};
use super::savestate::SaveState;
use super::types::{I8Addr, I8Byte};
use crate::peripherals::Peripherals;

/// Intel 8080 CPU.
pub struct Cpu {
    /// Peripherals.
    pub peripherals: Peripherals,
    /// Registers.
    pub registers: Registers,
    /// Interrupt-enable latch.
    pub int_enable: bool,
    /// Cycle counter, reset by the loop on interrupt delivery.
    pub cycles: u64,
    /// Instruction count.
    pub instruction_count: usize,
    /// Tracefile.
    pub tracefile: Option<String>,
}

impl Cpu {
    /// Create a CPU with default peripherals.
    ///
    /// # Returns
    ///
    /// * CPU instance.
    ///
    pub fn new() -> Self {
        Cpu {
            peripherals: Peripherals::new(),
            registers: Registers::new(),
            int_enable: false,
            cycles: 0,
            instruction_count: 0,
            tracefile: None,
        }
    }

    /// Set tracefile.
    ///
    /// Enable tracefile during execution.
    ///
    /// # Arguments
    ///
    /// * `tracefile` - Tracefile output.
    ///
    pub fn tracefile(&mut self, tracefile: &str) {
        self.tracefile = Some(tracefile.to_string());
    }

    /// Reset CPU and peripherals.
    pub fn reset(&mut self) {
        self.peripherals.reset();
        self.registers.reset();
        self.int_enable = false;
        self.cycles = 0;
        self.instruction_count = 0;
    }

    /// Load savestate.
    ///
    /// # Arguments
    ///
    /// * `state` - Save state.
    ///
    pub fn load_savestate(&mut self, state: SaveState) {
        self.registers = state.registers;
        self.peripherals.memory.load_from_save(state.memory);
        self.peripherals.bus.shift = state.shift;
        self.peripherals.bus.controller = state.controller;
        self.peripherals
            .bus
            .set_pending_interrupts(state.pending_interrupts);
        self.int_enable = state.int_enable;
        self.cycles = state.cycles;
        self.instruction_count = state.instruction_count as usize;
        self.peripherals.refresh_screen();
    }

    /// Read a register, resolving `M` through HL.
    ///
    /// # Arguments
    ///
    /// * `reg` - Register selector.
    ///
    /// # Returns
    ///
    /// * Register value.
    ///
    pub fn reg(&self, reg: Reg) -> I8Byte {
        match reg {
            Reg::B => self.registers.b,
            Reg::C => self.registers.c,
            Reg::D => self.registers.d,
            Reg::E => self.registers.e,
            Reg::H => self.registers.h,
            Reg::L => self.registers.l,
            Reg::A => self.registers.a,
            Reg::M => self.peripherals.memory.read(self.registers.pair(RegPair::HL)),
        }
    }

    /// Write a register, resolving `M` through HL.
    ///
    /// # Arguments
    ///
    /// * `reg` - Register selector.
    /// * `value` - Value.
    ///
    pub fn set_reg(&mut self, reg: Reg, value: I8Byte) {
        match reg {
            Reg::B => self.registers.b = value,
            Reg::C => self.registers.c = value,
            Reg::D => self.registers.d = value,
            Reg::E => self.registers.e = value,
            Reg::H => self.registers.h = value,
            Reg::L => self.registers.l = value,
            Reg::A => self.registers.a = value,
            Reg::M => {
                let addr = self.registers.pair(RegPair::HL);
                self.peripherals.memory.write(addr, value);
            }
        }
    }

    /// Decode the instruction at PC.
    ///
    /// # Returns
    ///
    /// * Opcode enum.
    ///
    pub fn fetch(&self) -> OpCode {
        let pc = self.registers.pc;
        let memory = &self.peripherals.memory;

        get_opcode_enum(
            memory.read(pc),
            memory.read(pc.wrapping_add(1)),
            memory.read(pc.wrapping_add(2)),
        )
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// # Returns
    ///
    /// * `true` if the CPU halted.
    /// * `false` if not.
    ///
    pub fn step(&mut self) -> bool {
        let opcode = self.fetch();

        // PC moves past the instruction before execution; jumps, calls and
        // returns then assign it directly, and CALL/RST push the address of
        // the following instruction.
        self.registers.pc = self.registers.pc.wrapping_add(get_opcode_length(&opcode));
        self.instruction_count += 1;

        self.execute_instruction(&opcode)
    }

    /// Accept an interrupt opcode.
    ///
    /// The opcode executes as if it were the next instruction: PC is not
    /// advanced first, so the RST pushes the current PC. Acceptance clears
    /// the interrupt-enable latch.
    ///
    /// # Arguments
    ///
    /// * `opcode` - Interrupt opcode (an RST instruction).
    ///
    pub fn interrupt(&mut self, opcode: I8Byte) {
        self.int_enable = false;
        self.instruction_count += 1;

        let opcode = get_opcode_enum(opcode, 0, 0);
        self.execute_instruction(&opcode);
    }

    /// Push a word: SP decrements by 2 before the write.
    fn push_word(&mut self, value: I8Addr) {
        self.registers.sp = self.registers.sp.wrapping_sub(2);
        self.peripherals.memory.write_word(self.registers.sp, value);
    }

    /// Pop a word: read at SP, then SP increments by 2.
    fn pop_word(&mut self) -> I8Addr {
        let value = self.peripherals.memory.read_word(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(2);
        value
    }

    /// Evaluate a branch condition against the flags.
    fn test_cond(&self, cond: Cond) -> bool {
        let flags = &self.registers.flags;
        match cond {
            Cond::NZ => !flags.z,
            Cond::Z => flags.z,
            Cond::NC => !flags.cy,
            Cond::C => flags.cy,
            Cond::PO => !flags.p,
            Cond::PE => flags.p,
            Cond::P => !flags.s,
            Cond::M => flags.s,
        }
    }

    /// Cycle cost of a register-or-memory access family.
    fn reg_cycles(reg: Reg, with_m: u64, without_m: u64) -> u64 {
        if reg == Reg::M {
            with_m
        } else {
            without_m
        }
    }

    /// Execute instruction.
    ///
    /// # Arguments
    ///
    /// * `opcode` - Instruction to execute.
    ///
    /// # Returns
    ///
    /// * `true` if the CPU halted.
    /// * `false` if not.
    ///
    pub fn execute_instruction(&mut self, opcode: &OpCode) -> bool {
        match *opcode {
            OpCode::NOP => {
                self.cycles += 4;
            }
            OpCode::LXI(rp, d16) => {
                self.registers.set_pair(rp, d16);
                self.cycles += 10;
            }
            OpCode::STAX(rp) => {
                let addr = self.registers.pair(rp);
                self.peripherals.memory.write(addr, self.registers.a);
                self.cycles += 7;
            }
            OpCode::LDAX(rp) => {
                let addr = self.registers.pair(rp);
                self.registers.a = self.peripherals.memory.read(addr);
                self.cycles += 7;
            }
            OpCode::INX(rp) => {
                let value = self.registers.pair(rp).wrapping_add(1);
                self.registers.set_pair(rp, value);
                self.cycles += 5;
            }
            OpCode::DCX(rp) => {
                let value = self.registers.pair(rp).wrapping_sub(1);
                self.registers.set_pair(rp, value);
                self.cycles += 5;
            }
            OpCode::INR(r) => {
                let value = self.reg(r);
                let result = alu::inr(&mut self.registers.flags, value);
                self.set_reg(r, result);
                self.cycles += Self::reg_cycles(r, 10, 5);
            }
            OpCode::DCR(r) => {
                let value = self.reg(r);
                let result = alu::dcr(&mut self.registers.flags, value);
                self.set_reg(r, result);
                self.cycles += Self::reg_cycles(r, 10, 5);
            }
            OpCode::MVI(r, d8) => {
                self.set_reg(r, d8);
                self.cycles += Self::reg_cycles(r, 10, 7);
            }
            OpCode::RLC => {
                self.registers.a = alu::rlc(&mut self.registers.flags, self.registers.a);
                self.cycles += 4;
            }
            OpCode::RRC => {
                self.registers.a = alu::rrc(&mut self.registers.flags, self.registers.a);
                self.cycles += 4;
            }
            OpCode::RAL => {
                self.registers.a = alu::ral(&mut self.registers.flags, self.registers.a);
                self.cycles += 4;
            }
            OpCode::RAR => {
                self.registers.a = alu::rar(&mut self.registers.flags, self.registers.a);
                self.cycles += 4;
            }
            OpCode::DAD(rp) => {
                let hl = self.registers.pair(RegPair::HL);
                let value = self.registers.pair(rp);
                let result = alu::dad(&mut self.registers.flags, hl, value);
                self.registers.set_pair(RegPair::HL, result);
                self.cycles += 10;
            }
            OpCode::SHLD(addr) => {
                let hl = self.registers.pair(RegPair::HL);
                self.peripherals.memory.write_word(addr, hl);
                self.cycles += 16;
            }
            OpCode::LHLD(addr) => {
                let value = self.peripherals.memory.read_word(addr);
                self.registers.set_pair(RegPair::HL, value);
                self.cycles += 16;
            }
            OpCode::STA(addr) => {
                self.peripherals.memory.write(addr, self.registers.a);
                self.cycles += 13;
            }
            OpCode::LDA(addr) => {
                self.registers.a = self.peripherals.memory.read(addr);
                self.cycles += 13;
            }
            OpCode::DAA => {
                self.registers.a = alu::daa(&mut self.registers.flags, self.registers.a);
                self.cycles += 4;
            }
            OpCode::CMA => {
                self.registers.a = !self.registers.a;
                self.cycles += 4;
            }
            OpCode::STC => {
                self.registers.flags.cy = true;
                self.cycles += 4;
            }
            OpCode::CMC => {
                self.registers.flags.cy = !self.registers.flags.cy;
                self.cycles += 4;
            }
            OpCode::MOV(dst, src) => {
                let value = self.reg(src);
                self.set_reg(dst, value);
                self.cycles += if dst == Reg::M || src == Reg::M { 7 } else { 5 };
            }
            OpCode::HLT => {
                self.cycles += 7;
                return true;
            }
            OpCode::ADD(r) => {
                let value = self.reg(r);
                self.registers.a =
                    alu::add(&mut self.registers.flags, self.registers.a, value, false);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::ADC(r) => {
                let value = self.reg(r);
                let carry = self.registers.flags.cy;
                self.registers.a =
                    alu::add(&mut self.registers.flags, self.registers.a, value, carry);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::SUB(r) => {
                let value = self.reg(r);
                self.registers.a =
                    alu::sub(&mut self.registers.flags, self.registers.a, value, false);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::SBB(r) => {
                let value = self.reg(r);
                let borrow = self.registers.flags.cy;
                self.registers.a =
                    alu::sub(&mut self.registers.flags, self.registers.a, value, borrow);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::ANA(r) => {
                let value = self.reg(r);
                self.registers.a = alu::and(&mut self.registers.flags, self.registers.a, value);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::XRA(r) => {
                let value = self.reg(r);
                self.registers.a = alu::xor(&mut self.registers.flags, self.registers.a, value);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::ORA(r) => {
                let value = self.reg(r);
                self.registers.a = alu::or(&mut self.registers.flags, self.registers.a, value);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::CMP(r) => {
                let value = self.reg(r);
                alu::cmp(&mut self.registers.flags, self.registers.a, value);
                self.cycles += Self::reg_cycles(r, 7, 4);
            }
            OpCode::ADI(d8) => {
                self.registers.a = alu::add(&mut self.registers.flags, self.registers.a, d8, false);
                self.cycles += 7;
            }
            OpCode::ACI(d8) => {
                let carry = self.registers.flags.cy;
                self.registers.a = alu::add(&mut self.registers.flags, self.registers.a, d8, carry);
                self.cycles += 7;
            }
            OpCode::SUI(d8) => {
                self.registers.a = alu::sub(&mut self.registers.flags, self.registers.a, d8, false);
                self.cycles += 7;
            }
            OpCode::SBI(d8) => {
                let borrow = self.registers.flags.cy;
                self.registers.a =
                    alu::sub(&mut self.registers.flags, self.registers.a, d8, borrow);
                self.cycles += 7;
            }
            OpCode::ANI(d8) => {
                self.registers.a = alu::and(&mut self.registers.flags, self.registers.a, d8);
                self.cycles += 7;
            }
            OpCode::XRI(d8) => {
                self.registers.a = alu::xor(&mut self.registers.flags, self.registers.a, d8);
                self.cycles += 7;
            }
            OpCode::ORI(d8) => {
                self.registers.a = alu::or(&mut self.registers.flags, self.registers.a, d8);
                self.cycles += 7;
            }
            OpCode::CPI(d8) => {
                alu::cmp(&mut self.registers.flags, self.registers.a, d8);
                self.cycles += 7;
            }
            OpCode::RET => {
                self.registers.pc = self.pop_word();
                self.cycles += 10;
            }
            OpCode::Rcc(cond) => {
                if self.test_cond(cond) {
                    self.registers.pc = self.pop_word();
                    self.cycles += 11;
                } else {
                    self.cycles += 5;
                }
            }
            OpCode::JMP(addr) => {
                self.registers.pc = addr;
                self.cycles += 10;
            }
            OpCode::Jcc(cond, addr) => {
                if self.test_cond(cond) {
                    self.registers.pc = addr;
                }
                self.cycles += 10;
            }
            OpCode::CALL(addr) => {
                let ret = self.registers.pc;
                self.push_word(ret);
                self.registers.pc = addr;
                self.cycles += 17;
            }
            OpCode::Ccc(cond, addr) => {
                if self.test_cond(cond) {
                    let ret = self.registers.pc;
                    self.push_word(ret);
                    self.registers.pc = addr;
                    self.cycles += 17;
                } else {
                    self.cycles += 11;
                }
            }
            OpCode::RST(n) => {
                let ret = self.registers.pc;
                self.push_word(ret);
                self.registers.pc = I8Addr::from(n) * 8;
                self.cycles += 11;
            }
            OpCode::PUSH(sp) => {
                let value = match sp {
                    StackPair::BC => self.registers.pair(RegPair::BC),
                    StackPair::DE => self.registers.pair(RegPair::DE),
                    StackPair::HL => self.registers.pair(RegPair::HL),
                    StackPair::PSW => self.registers.psw(),
                };
                self.push_word(value);
                self.cycles += 11;
            }
            OpCode::POP(sp) => {
                let value = self.pop_word();
                match sp {
                    StackPair::BC => self.registers.set_pair(RegPair::BC, value),
                    StackPair::DE => self.registers.set_pair(RegPair::DE, value),
                    StackPair::HL => self.registers.set_pair(RegPair::HL, value),
                    StackPair::PSW => self.registers.set_psw(value),
                }
                self.cycles += 10;
            }
            OpCode::XTHL => {
                let hl = self.registers.pair(RegPair::HL);
                let top = self.peripherals.memory.read_word(self.registers.sp);
                self.peripherals.memory.write_word(self.registers.sp, hl);
                self.registers.set_pair(RegPair::HL, top);
                self.cycles += 18;
            }
            OpCode::PCHL => {
                self.registers.pc = self.registers.pair(RegPair::HL);
                self.cycles += 5;
            }
            OpCode::SPHL => {
                self.registers.sp = self.registers.pair(RegPair::HL);
                self.cycles += 5;
            }
            OpCode::XCHG => {
                self.registers.exchange();
                self.cycles += 4;
            }
            OpCode::IN(port) => {
                self.registers.a = self.peripherals.bus.read(port);
                self.cycles += 10;
            }
            OpCode::OUT(port) => {
                self.peripherals.bus.write(port, self.registers.a);
                self.cycles += 10;
            }
            OpCode::EI => {
                // The real chip enables after the next instruction; the
                // diagnostic ROMs do not depend on the delay.
                self.int_enable = true;
                self.cycles += 4;
            }
            OpCode::DI => {
                self.int_enable = false;
                self.cycles += 4;
            }
        }

        false
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU {{")?;
        writeln!(f, "  registers: {{")?;
        writeln!(f, "    {:?}", self.registers)?;
        writeln!(f, "  }},")?;
        writeln!(f, "  int_enable: {},", self.int_enable)?;
        writeln!(f, "  cycles: {},", self.cycles)?;
        writeln!(f, "  instruction_count: {}", self.instruction_count)?;
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with_program(program: &[I8Byte]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.peripherals.memory.load_at(0, program);
        cpu.registers.sp = 0x2400;
        cpu
    }

    #[test]
    fn test_add_flags() {
        // ADD B with A=0x3A, B=0xC6.
        let mut cpu = cpu_with_program(&[0x80]);
        cpu.registers.a = 0x3A;
        cpu.registers.b = 0xC6;

        cpu.step();

        assert_eq!(cpu.registers.a, 0x00);
        assert!(cpu.registers.flags.z);
        assert!(!cpu.registers.flags.s);
        assert!(cpu.registers.flags.p);
        assert!(cpu.registers.flags.cy);
        assert!(cpu.registers.flags.ac);
        assert_eq!(cpu.registers.pc, 0x0001);
        assert_eq!(cpu.cycles, 4);
    }

    #[test]
    fn test_sub_flags() {
        // SUB E with A=0x3E, E=0x3E.
        let mut cpu = cpu_with_program(&[0x93]);
        cpu.registers.a = 0x3E;
        cpu.registers.e = 0x3E;

        cpu.step();

        assert_eq!(cpu.registers.a, 0x00);
        assert!(cpu.registers.flags.z);
        assert!(!cpu.registers.flags.s);
        assert!(cpu.registers.flags.p);
        assert!(!cpu.registers.flags.cy);
        assert!(cpu.registers.flags.ac);
    }

    #[test]
    fn test_cpi_leaves_accumulator() {
        let mut cpu = cpu_with_program(&[0xFE, 0x40, 0xFE, 0x50]);
        cpu.registers.a = 0x4A;

        cpu.step();
        assert_eq!(cpu.registers.a, 0x4A);
        assert!(!cpu.registers.flags.z);
        assert!(!cpu.registers.flags.cy);

        cpu.step();
        assert_eq!(cpu.registers.a, 0x4A);
        assert!(!cpu.registers.flags.z);
        assert!(cpu.registers.flags.cy);
    }

    #[test]
    fn test_mov_through_memory() {
        // LXI H, 0x2000; MVI M, 0x42; MOV A, M
        let mut cpu = cpu_with_program(&[0x21, 0x00, 0x20, 0x36, 0x42, 0x7E]);

        cpu.step();
        assert_eq!(cpu.registers.pair(RegPair::HL), 0x2000);

        cpu.step();
        // MVI M advances PC past both bytes.
        assert_eq!(cpu.registers.pc, 0x0005);
        assert_eq!(cpu.peripherals.memory.read(0x2000), 0x42);

        cpu.step();
        assert_eq!(cpu.registers.a, 0x42);
    }

    #[test]
    fn test_push_pop_identity() {
        let mut cpu = cpu_with_program(&[0xC5, 0xC1]);
        cpu.registers.set_pair(RegPair::BC, 0x1234);
        cpu.registers.flags.cy = true;
        let sp = cpu.registers.sp;

        cpu.step();
        assert_eq!(cpu.registers.sp, sp - 2);
        // memory[SP] holds the low byte of the top-of-stack word.
        assert_eq!(cpu.peripherals.memory.read(cpu.registers.sp), 0x34);
        assert_eq!(cpu.peripherals.memory.read(cpu.registers.sp + 1), 0x12);

        cpu.step();
        assert_eq!(cpu.registers.pair(RegPair::BC), 0x1234);
        assert_eq!(cpu.registers.sp, sp);
        assert!(cpu.registers.flags.cy);
    }

    #[test]
    fn test_push_pop_psw_round_trip() {
        let mut cpu = cpu_with_program(&[0xF5, 0xAF, 0xF1]);
        cpu.registers.a = 0x77;
        cpu.registers.flags.cy = true;
        cpu.registers.flags.ac = true;
        cpu.registers.flags.s = true;

        // PUSH PSW; XRA A (clobbers everything); POP PSW
        cpu.step();
        cpu.step();
        assert_eq!(cpu.registers.a, 0x00);
        assert!(!cpu.registers.flags.cy);

        cpu.step();
        assert_eq!(cpu.registers.a, 0x77);
        assert!(cpu.registers.flags.cy);
        assert!(cpu.registers.flags.ac);
        assert!(cpu.registers.flags.s);
        assert!(!cpu.registers.flags.z);
    }

    #[test]
    fn test_call_ret_discipline() {
        // CALL 0x0010; NOP...; at 0x0010: RET
        let mut program = vec![0xCD, 0x10, 0x00, 0x00];
        program.resize(0x10, 0x00);
        program.push(0xC9);

        let mut cpu = cpu_with_program(&program);
        let sp = cpu.registers.sp;

        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0010);
        // Top of stack holds the address of the instruction after the CALL.
        assert_eq!(cpu.peripherals.memory.read_word(cpu.registers.sp), 0x0003);

        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0003);
        assert_eq!(cpu.registers.sp, sp);
    }

    #[test]
    fn test_conditional_branches() {
        // JNZ 0x0010 not taken, then JZ 0x0010 taken.
        let mut cpu = cpu_with_program(&[0xC2, 0x10, 0x00, 0xCA, 0x10, 0x00]);
        cpu.registers.flags.z = true;

        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0003);
        assert_eq!(cpu.cycles, 10);

        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0010);
        assert_eq!(cpu.cycles, 20);
    }

    #[test]
    fn test_conditional_call_and_return_cycles() {
        // CNZ taken costs 17, RNZ not taken costs 5.
        let mut cpu = cpu_with_program(&[0xC4, 0x10, 0x00]);
        cpu.peripherals.memory.write(0x0010, 0xC0);
        cpu.registers.flags.z = true;

        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0003);
        assert_eq!(cpu.cycles, 11);

        cpu.registers.pc = 0x0010;
        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0011);
        assert_eq!(cpu.cycles, 11 + 5);
    }

    #[test]
    fn test_inline_rst_pushes_next_instruction() {
        // RST 2 at 0x0040 returns past itself.
        let mut cpu = cpu_with_program(&[]);
        cpu.peripherals.memory.write(0x0040, 0xD7);
        cpu.registers.pc = 0x0040;

        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0010);
        assert_eq!(cpu.peripherals.memory.read_word(cpu.registers.sp), 0x0041);
    }

    #[test]
    fn test_interrupt_pushes_current_pc() {
        let mut cpu = cpu_with_program(&[]);
        cpu.registers.pc = 0x1234;
        cpu.int_enable = true;

        cpu.interrupt(0xCF);
        assert_eq!(cpu.registers.pc, 0x0008);
        assert_eq!(cpu.peripherals.memory.read_word(cpu.registers.sp), 0x1234);
        assert!(!cpu.int_enable);
    }

    #[test]
    fn test_xthl() {
        let mut cpu = cpu_with_program(&[0xE3]);
        cpu.registers.set_pair(RegPair::HL, 0x0B3C);
        cpu.registers.sp = 0x20F0;
        cpu.peripherals.memory.write_word(0x20F0, 0x0DF0);

        cpu.step();
        assert_eq!(cpu.registers.pair(RegPair::HL), 0x0DF0);
        assert_eq!(cpu.peripherals.memory.read_word(0x20F0), 0x0B3C);
        assert_eq!(cpu.registers.sp, 0x20F0);
    }

    #[test]
    fn test_shld_lhld() {
        let mut cpu = cpu_with_program(&[0x22, 0x00, 0x21, 0x2A, 0x00, 0x21]);
        cpu.registers.set_pair(RegPair::HL, 0xAE29);

        cpu.step();
        assert_eq!(cpu.peripherals.memory.read(0x2100), 0x29);
        assert_eq!(cpu.peripherals.memory.read(0x2101), 0xAE);

        cpu.registers.set_pair(RegPair::HL, 0x0000);
        cpu.step();
        assert_eq!(cpu.registers.pair(RegPair::HL), 0xAE29);
    }

    #[test]
    fn test_dad_and_rotate() {
        // DAD B; RRC
        let mut cpu = cpu_with_program(&[0x09, 0x0F]);
        cpu.registers.set_pair(RegPair::HL, 0xA17B);
        cpu.registers.set_pair(RegPair::BC, 0x339F);
        cpu.registers.a = 0xF2;

        cpu.step();
        assert_eq!(cpu.registers.pair(RegPair::HL), 0xD51A);
        assert!(!cpu.registers.flags.cy);

        cpu.step();
        assert_eq!(cpu.registers.a, 0x79);
        assert!(!cpu.registers.flags.cy);
    }

    #[test]
    fn test_in_out_through_bus() {
        // OUT 4 (shift in); OUT 2 (offset); IN 3
        let mut cpu = cpu_with_program(&[0xD3, 0x04, 0x3E, 0x00, 0xD3, 0x02, 0xDB, 0x03]);
        cpu.registers.a = 0xFF;

        cpu.step();
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.registers.a, 0xFF);
    }

    #[test]
    fn test_hlt() {
        let mut cpu = cpu_with_program(&[0x76]);
        assert!(cpu.step());
    }

    #[test]
    fn test_ei_di() {
        let mut cpu = cpu_with_program(&[0xFB, 0xF3]);

        cpu.step();
        assert!(cpu.int_enable);

        cpu.step();
        assert!(!cpu.int_enable);
    }
}

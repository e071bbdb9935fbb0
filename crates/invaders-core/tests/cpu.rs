//! CPU integration tests over small in-memory programs.

use invaders_core::core::cpu::Cpu;
use invaders_core::core::registers::RegPair;
use invaders_core::emulator::{EmulationState, Emulator, EmulatorContext};
use invaders_core::peripherals::screen::CYCLES_PER_HALF_FRAME;

fn cpu_with_program(program: &[u8]) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.peripherals.memory.load_at(0, program);
    cpu.registers.sp = 0x2400;
    cpu
}

#[test]
fn test_counting_loop() {
    // MVI B, 5; loop: DCR B; JNZ loop; HLT
    let mut cpu = cpu_with_program(&[0x06, 0x05, 0x05, 0xC2, 0x02, 0x00, 0x76]);

    let mut halted = false;
    for _ in 0..64 {
        if cpu.step() {
            halted = true;
            break;
        }
    }

    assert!(halted);
    assert_eq!(cpu.registers.b, 0);
    assert!(cpu.registers.flags.z);
}

#[test]
fn test_sixteen_bit_counting() {
    // LXI B, 0x0003; loop: DCX B; MOV A, B; ORA C; JNZ loop; HLT
    let mut cpu = cpu_with_program(&[
        0x01, 0x03, 0x00, 0x0B, 0x78, 0xB1, 0xC2, 0x03, 0x00, 0x76,
    ]);

    let mut steps = 0;
    while !cpu.step() {
        steps += 1;
        assert!(steps < 100, "program did not halt");
    }

    assert_eq!(cpu.registers.pair(RegPair::BC), 0x0000);
}

#[test]
fn test_subroutine_stack_discipline() {
    // CALL 0x0020 twice, nested through a helper that returns.
    //
    // 0000: LXI SP, 0x2400
    // 0003: CALL 0x0020
    // 0006: HLT
    // 0020: MVI A, 0x11; RET
    let mut program = vec![0x31, 0x00, 0x24, 0xCD, 0x20, 0x00, 0x76];
    program.resize(0x20, 0x00);
    program.extend_from_slice(&[0x3E, 0x11, 0xC9]);

    let mut cpu = cpu_with_program(&program);

    while !cpu.step() {}

    assert_eq!(cpu.registers.a, 0x11);
    assert_eq!(cpu.registers.sp, 0x2400);
    assert_eq!(cpu.registers.pc, 0x0007);
}

#[test]
fn test_undocumented_aliases_execute() {
    // NOP* (0x08, 0x10); CALL* 0x0010 (0xDD); at 0x0010 RET* (0xD9); HLT
    let mut program = vec![0x08, 0x10, 0xDD, 0x10, 0x00, 0x76];
    program.resize(0x10, 0x00);
    program.push(0xD9);

    let mut cpu = cpu_with_program(&program);

    cpu.step();
    cpu.step();
    assert_eq!(cpu.registers.pc, 0x0002);

    cpu.step();
    assert_eq!(cpu.registers.pc, 0x0010);

    cpu.step();
    assert_eq!(cpu.registers.pc, 0x0005);

    assert!(cpu.step());
}

#[test]
fn test_memory_operand_arithmetic() {
    // LXI H, 0x2100; MVI M, 0x0F; INR M; MOV A, M; ADI 0x01; HLT
    let mut cpu = cpu_with_program(&[
        0x21, 0x00, 0x21, 0x36, 0x0F, 0x34, 0x7E, 0xC6, 0x01, 0x76,
    ]);

    while !cpu.step() {}

    assert_eq!(cpu.peripherals.memory.read(0x2100), 0x10);
    assert_eq!(cpu.registers.a, 0x11);
    assert!(!cpu.registers.flags.cy);
}

#[test]
fn test_full_frame_interrupt_sequence() {
    // A busy loop with interrupts enabled; RST 1 and RST 2 handlers leave
    // markers and re-enable interrupts.
    //
    // 0000: EI
    // 0001: JMP 0x0001
    // 0008: MVI A, 0x11; EI; RET
    // 0010: MVI A, 0x22; EI; RET
    let mut program = vec![0xFB, 0xC3, 0x01, 0x00];
    program.resize(0x08, 0x00);
    program.extend_from_slice(&[0x3E, 0x11, 0xFB, 0xC9]);
    program.resize(0x10, 0x00);
    program.extend_from_slice(&[0x3E, 0x22, 0xFB, 0xC9]);

    let mut emulator = Emulator::new();
    emulator.cpu.peripherals.memory.load_at(0, &program);
    emulator.cpu.registers.sp = 0x2400;

    let mut ctx = EmulatorContext::new();
    let mut frames = 0;
    let mut seen_first = false;
    let mut seen_second = false;

    // Two half-frames worth of emulation.
    for _ in 0..50_000 {
        match emulator.step(&mut ctx) {
            EmulationState::Frame => frames += 1,
            EmulationState::Quit => panic!("unexpected halt"),
            EmulationState::Normal => (),
        }

        if emulator.cpu.registers.a == 0x11 {
            seen_first = true;
        }
        if seen_first && emulator.cpu.registers.a == 0x22 {
            seen_second = true;
        }

        if frames == 2 && seen_second {
            break;
        }
    }

    assert!(seen_first, "RST 1 handler never ran");
    assert!(seen_second, "RST 2 handler never ran");
    assert!(frames >= 1);
}

#[test]
fn test_cycle_counter_resets_on_frame() {
    let mut emulator = Emulator::new();
    // EI; JMP loop
    emulator
        .cpu
        .peripherals
        .memory
        .load_at(0, &[0xFB, 0xC3, 0x01, 0x00]);
    emulator.cpu.registers.sp = 0x2400;

    let mut ctx = EmulatorContext::new();
    emulator.step(&mut ctx);

    emulator.cpu.cycles = CYCLES_PER_HALF_FRAME + 5;
    emulator.step(&mut ctx);

    // Delivery zeroed the counter before charging the RST.
    assert_eq!(emulator.cpu.cycles, 11);
}

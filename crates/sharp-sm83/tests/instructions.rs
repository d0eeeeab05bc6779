//! Unit tests for individual SM83 instructions.
//!
//! Each program ends in HALT; with IE and IF clear the CPU halts cleanly
//! and the test inspects the resulting state.

use emu_core::{Bus, Cpu, SimpleBus};
use sharp_sm83::{CF, HF, NF, Registers, Sm83, ZF};

/// Run CPU until it HALTs, return the T-cycles consumed.
fn run_until_halt(cpu: &mut Sm83, bus: &mut SimpleBus) -> u64 {
    let mut cycles = 0;
    while !cpu.is_halted() && cycles < 100_000 {
        cpu.tick(bus).expect("legal opcode");
        cycles += 1;
    }
    cycles
}

fn run(program: &[u8]) -> (Sm83, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, program);
    let mut cpu = Sm83::new();
    cpu.registers_mut().sp = 0xFFFE;
    run_until_halt(&mut cpu, &mut bus);
    (cpu, bus)
}

fn regs(cpu: &Sm83) -> Registers {
    cpu.registers()
}

#[test]
fn test_nop_then_halt() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x00, 0x76]);
    let mut cpu = Sm83::new();

    let cycles = run_until_halt(&mut cpu, &mut bus);

    assert_eq!(cycles, 8);
    assert_eq!(cpu.pc(), 0x0002);
}

#[test]
fn test_ld_a_n() {
    let (cpu, _) = run(&[0x3E, 0x42, 0x76]);
    assert_eq!(regs(&cpu).a, 0x42);
}

#[test]
fn test_ld_pairs_little_endian() {
    // LD BC,$1234; LD DE,$5678; LD HL,$9ABC; LD SP,$C000
    let (cpu, _) = run(&[
        0x01, 0x34, 0x12, //
        0x11, 0x78, 0x56, //
        0x21, 0xBC, 0x9A, //
        0x31, 0x00, 0xC0, //
        0x76,
    ]);
    let r = regs(&cpu);
    assert_eq!(r.bc(), 0x1234);
    assert_eq!(r.de(), 0x5678);
    assert_eq!(r.hl(), 0x9ABC);
    assert_eq!(r.sp, 0xC000);
}

#[test]
fn test_register_to_register_loads() {
    // LD B,$11; LD C,B; LD A,C
    let (cpu, _) = run(&[0x06, 0x11, 0x48, 0x79, 0x76]);
    let r = regs(&cpu);
    assert_eq!((r.b, r.c, r.a), (0x11, 0x11, 0x11));
}

#[test]
fn test_push_pop_each_pair() {
    // LD BC,$1234; PUSH BC; POP DE; PUSH DE; POP HL
    let (cpu, _) = run(&[0x01, 0x34, 0x12, 0xC5, 0xD1, 0xD5, 0xE1, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.de(), 0x1234);
    assert_eq!(r.hl(), 0x1234);
    assert_eq!(r.sp, 0xFFFE);
}

#[test]
fn test_pop_af_masks_low_nibble() {
    // LD BC,$12FF; PUSH BC; POP AF
    let (cpu, _) = run(&[0x01, 0xFF, 0x12, 0xC5, 0xF1, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.a, 0x12);
    assert_eq!(r.f, 0xF0);
}

#[test]
fn test_hl_increment_and_decrement_loads() {
    // LD HL,$C000; LD A,$AA; LD (HL+),A; LD A,$BB; LD (HL-),A
    let (cpu, bus) = run(&[
        0x21, 0x00, 0xC0, 0x3E, 0xAA, 0x22, 0x3E, 0xBB, 0x32, 0x76,
    ]);
    assert_eq!(bus.peek(0xC000), 0xAA);
    assert_eq!(bus.peek(0xC001), 0xBB);
    assert_eq!(regs(&cpu).hl(), 0xC000);
}

#[test]
fn test_high_page_loads() {
    // LD A,$5A; LDH ($80),A; LD C,$81; LD (C),A; LD A,$00; LDH A,($80)
    let (cpu, bus) = run(&[
        0x3E, 0x5A, 0xE0, 0x80, 0x0E, 0x81, 0xE2, 0x3E, 0x00, 0xF0, 0x80, 0x76,
    ]);
    assert_eq!(bus.peek(0xFF80), 0x5A);
    assert_eq!(bus.peek(0xFF81), 0x5A);
    assert_eq!(regs(&cpu).a, 0x5A);
}

#[test]
fn test_absolute_loads() {
    // LD A,$77; LD ($C123),A; LD A,$00; LD A,($C123)
    let (cpu, bus) = run(&[
        0x3E, 0x77, 0xEA, 0x23, 0xC1, 0x3E, 0x00, 0xFA, 0x23, 0xC1, 0x76,
    ]);
    assert_eq!(bus.peek(0xC123), 0x77);
    assert_eq!(regs(&cpu).a, 0x77);
}

#[test]
fn test_ld_nn_sp() {
    // LD SP,$BEEF; LD ($C000),SP
    let (_, bus) = run(&[0x31, 0xEF, 0xBE, 0x08, 0x00, 0xC0, 0x76]);
    assert_eq!(bus.peek(0xC000), 0xEF);
    assert_eq!(bus.peek(0xC001), 0xBE);
}

#[test]
fn test_ld_hl_sp_offset_negative() {
    // LD SP,$FFF8; LD HL,SP-1
    let (cpu, _) = run(&[0x31, 0xF8, 0xFF, 0xF8, 0xFF, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.hl(), 0xFFF7);
    // Low byte $F8 + $FF carries out of bits 3 and 7.
    assert_eq!(r.f, HF | CF);
}

#[test]
fn test_add_sp_clears_zero() {
    // XOR A (sets Z); LD SP,$0000; ADD SP,+0
    let (cpu, _) = run(&[0xAF, 0x31, 0x00, 0x00, 0xE8, 0x00, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.sp, 0x0000);
    assert_eq!(r.f, 0);
}

#[test]
fn test_add_hl_preserves_zero() {
    // XOR A; LD HL,$0FFF; LD BC,$0001; ADD HL,BC
    let (cpu, _) = run(&[0xAF, 0x21, 0xFF, 0x0F, 0x01, 0x01, 0x00, 0x09, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.hl(), 0x1000);
    assert_eq!(r.f, ZF | HF);
}

#[test]
fn test_inc_dec_preserve_carry() {
    // SCF; LD B,$FF; INC B; LD C,$01; DEC C
    let (cpu, _) = run(&[0x37, 0x06, 0xFF, 0x04, 0x0E, 0x01, 0x0D, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.b, 0x00);
    assert_eq!(r.c, 0x00);
    assert_eq!(r.f, ZF | NF | CF);
}

#[test]
fn test_inc_hl_indirect() {
    // LD HL,$C000; LD (HL),$0F; INC (HL)
    let (cpu, bus) = run(&[0x21, 0x00, 0xC0, 0x36, 0x0F, 0x34, 0x76]);
    assert_eq!(bus.peek(0xC000), 0x10);
    assert_eq!(regs(&cpu).f, HF);
}

#[test]
fn test_inc16_wraps_without_flags() {
    // LD BC,$FFFF; INC BC
    let (cpu, _) = run(&[0x01, 0xFF, 0xFF, 0x03, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.bc(), 0x0000);
    assert_eq!(r.f, 0);
}

#[test]
fn test_alu_immediate_and_register() {
    // LD A,$10; LD B,$05; SUB B; ADD A,$0B; CP $16
    let (cpu, _) = run(&[0x3E, 0x10, 0x06, 0x05, 0x90, 0xC6, 0x0B, 0xFE, 0x16, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.a, 0x16);
    assert_eq!(r.f, ZF | NF);
}

#[test]
fn test_accumulator_rotates_clear_zero() {
    // LD A,$80; RLCA  -> A=$01, C set, Z clear
    let (cpu, _) = run(&[0x3E, 0x80, 0x07, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.a, 0x01);
    assert_eq!(r.f, CF);

    // XOR A; RLA -> A=0 but Z stays clear
    let (cpu, _) = run(&[0xAF, 0x17, 0x76]);
    assert_eq!(regs(&cpu).f, 0);
}

#[test]
fn test_rra_through_carry() {
    // SCF; LD A,$00; RRA
    let (cpu, _) = run(&[0x37, 0x3E, 0x00, 0x1F, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.a, 0x80);
    assert_eq!(r.f, 0);
}

#[test]
fn test_daa_after_add() {
    // LD A,$45; ADD A,$38; DAA
    let (cpu, _) = run(&[0x3E, 0x45, 0xC6, 0x38, 0x27, 0x76]);
    assert_eq!(regs(&cpu).a, 0x83);
}

#[test]
fn test_cpl_scf_ccf() {
    // LD A,$0F; CPL; SCF; CCF
    let (cpu, _) = run(&[0x3E, 0x0F, 0x2F, 0x37, 0x3F, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.a, 0xF0);
    assert_eq!(r.f, 0);
}

#[test]
fn test_cb_swap_and_bit() {
    // LD A,$F0; SWAP A; BIT 7,A
    let (cpu, _) = run(&[0x3E, 0xF0, 0xCB, 0x37, 0xCB, 0x7F, 0x76]);
    let r = regs(&cpu);
    assert_eq!(r.a, 0x0F);
    assert_eq!(r.f, ZF | HF);
}

#[test]
fn test_cb_set_res_on_memory() {
    // LD HL,$C000; SET 3,(HL); SET 0,(HL); RES 3,(HL)
    let (_, bus) = run(&[0x21, 0x00, 0xC0, 0xCB, 0xDE, 0xCB, 0xC6, 0xCB, 0x9E, 0x76]);
    assert_eq!(bus.peek(0xC000), 0x01);
}

#[test]
fn test_jp_and_jp_hl() {
    let mut program = vec![0u8; 0x20];
    program[0x00..0x03].copy_from_slice(&[0xC3, 0x10, 0x00]); // JP $0010
    program[0x10..0x14].copy_from_slice(&[0x21, 0x18, 0x00, 0xE9]); // LD HL,$0018; JP HL
    program[0x18] = 0x76;
    let (cpu, _) = run(&program);
    assert_eq!(cpu.pc(), 0x0019);
}

#[test]
fn test_conditional_call_and_ret() {
    let mut program = vec![0u8; 0x30];
    // XOR A; CALL NZ,$0020 (not taken); CALL Z,$0020 (taken); HALT
    program[0x00..0x08].copy_from_slice(&[0xAF, 0xC4, 0x20, 0x00, 0xCC, 0x20, 0x00, 0x76]);
    // $0020: LD B,$99; RET Z
    program[0x20..0x23].copy_from_slice(&[0x06, 0x99, 0xC8]);
    let (cpu, _) = run(&program);
    assert_eq!(regs(&cpu).b, 0x99);
    assert_eq!(cpu.pc(), 0x0008);
    assert_eq!(regs(&cpu).sp, 0xFFFE);
}

#[test]
fn test_rst_pushes_return_address() {
    let mut program = vec![0u8; 0x40];
    program[0x00] = 0x00;
    program[0x01] = 0xEF; // RST $28
    program[0x28] = 0x76;
    let (cpu, bus) = run(&program);
    assert_eq!(cpu.pc(), 0x0029);
    assert_eq!(bus.peek(0xFFFC), 0x02);
    assert_eq!(bus.peek(0xFFFD), 0x00);
}

#[test]
fn test_stop_consumes_padding_byte() {
    let (cpu, _) = run(&[0x10, 0x00, 0x00]);
    assert!(cpu.is_halted());
    assert_eq!(cpu.pc(), 0x0002);
}

#[test]
fn test_branch_timings() {
    let cases: &[(&[u8], u32)] = &[
        (&[0xC3, 0x00, 0x10], 16),       // JP nn
        (&[0xC2, 0x00, 0x10], 16),       // JP NZ,nn taken (Z clear)
        (&[0xCA, 0x00, 0x10], 12),       // JP Z,nn not taken
        (&[0x18, 0x00], 12),             // JR
        (&[0x28, 0x00], 8),              // JR Z not taken
        (&[0xCD, 0x00, 0x10], 24),       // CALL
        (&[0xCC, 0x00, 0x10], 12),       // CALL Z not taken
        (&[0xC9], 16),                   // RET
        (&[0xC0], 20),                   // RET NZ taken
        (&[0xC8], 8),                    // RET Z not taken
        (&[0xD9], 16),                   // RETI
        (&[0xFF], 16),                   // RST $38
        (&[0xE9], 4),                    // JP HL
    ];

    for &(program, expected) in cases {
        let mut bus = SimpleBus::new();
        bus.load(0x0000, program);
        let mut cpu = Sm83::new();
        cpu.registers_mut().sp = 0xFFFE;
        assert_eq!(cpu.step(&mut bus), Ok(expected), "{program:02X?}");
    }
}

#[test]
fn test_memory_operand_timings() {
    let cases: &[(&[u8], u32)] = &[
        (&[0x7E], 8),        // LD A,(HL)
        (&[0x36, 0x00], 12), // LD (HL),n
        (&[0x34], 12),       // INC (HL)
        (&[0x86], 8),        // ADD A,(HL)
        (&[0xCB, 0x46], 12), // BIT 0,(HL)
        (&[0xCB, 0x06], 16), // RLC (HL)
        (&[0xCB, 0x00], 8),  // RLC B
        (&[0xF5], 16),       // PUSH AF
        (&[0xF1], 12),       // POP AF
        (&[0x08, 0x00, 0xC0], 20),
    ];

    for &(program, expected) in cases {
        let mut bus = SimpleBus::new();
        bus.load(0x0000, program);
        bus.write(0xFFFF, 0);
        let mut cpu = Sm83::new();
        cpu.registers_mut().set_hl(0xC000);
        cpu.registers_mut().sp = 0xFFFE;
        assert_eq!(cpu.step(&mut bus), Ok(expected), "{program:02X?}");
    }
}

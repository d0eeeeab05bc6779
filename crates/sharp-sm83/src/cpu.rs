//! SM83 execution engine with per-T-cycle stepping.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::cast_possible_wrap)] // Intentional i8 casts for relative jumps.

use emu_core::{Bus, Cpu, Observable, Ticks, Value};

use crate::alu::{self, AluResult};
use crate::error::ExecError;
use crate::flags::{CF, HF, NF, ZF};
use crate::operand::{Cond, Pointer, Reg8};
use crate::registers::Registers;
use crate::table::{AluOp, Instruction, Loc8, Op, ShiftOp, tables};
use crate::{IE_ADDR, IF_ADDR, INTERRUPT_VECTORS};

/// T-cycles spent dispatching an interrupt.
const INTERRUPT_CYCLES: u8 = 20;

/// T-cycles per idle period while halted.
const HALT_CYCLES: u8 = 4;

/// Snapshot handed to the trace observer on every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    /// Address the opcode was fetched from.
    pub pc: u16,
    pub opcode: u8,
    /// True when `opcode` is the byte after a `0xCB` prefix.
    pub prefixed: bool,
    pub mnemonic: &'static str,
    /// Registers as they were when the fetch began.
    pub registers: Registers,
}

/// The second half of a taken branch, run after its extra cycles elapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Jump {
    To(u16),
    Call(u16),
    Return,
    /// RETI: return and set IME.
    ReturnEnable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeferredJump {
    cycles: u8,
    jump: Jump,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Instruction(&'static Instruction),
    Deferred(Jump),
    /// Interrupt dispatch or HALT wake-up; nothing runs at the end.
    Idle,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Fetching,
    Executing { remaining: u8, stage: Stage },
    Halted { remaining: u8 },
}

/// Sharp SM83 CPU.
///
/// Like the other cores in this workspace the CPU does not own the bus;
/// the bus is lent to `tick()` once per T-cycle. Each instruction's effect
/// is applied on its last cycle, and interrupts are polled only when an
/// instruction retires.
pub struct Sm83 {
    regs: Registers,
    state: State,

    /// Waiting for an interrupt after HALT or STOP.
    halted: bool,
    /// The next fetch must not advance PC.
    halt_bug: bool,
    /// Instruction retirements left until a pending EI sets IME.
    ei_delay: u8,
    /// Set on the tick where an instruction boundary was reached.
    retired: bool,

    total_ticks: Ticks,
    tracer: Option<Box<dyn FnMut(&Trace)>>,
}

impl Sm83 {
    /// Create a CPU with all registers cleared and PC at $0000.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registers(Registers::default())
    }

    /// Create a CPU starting from the given register values.
    #[must_use]
    pub fn with_registers(regs: Registers) -> Self {
        Self {
            regs,
            state: State::Fetching,
            halted: false,
            halt_bug: false,
            ei_delay: 0,
            retired: false,
            total_ticks: Ticks::ZERO,
            tracer: None,
        }
    }

    /// Mutable access to the register file, for loaders and tests.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Total T-cycles elapsed since creation.
    #[must_use]
    pub const fn total_ticks(&self) -> Ticks {
        self.total_ticks
    }

    /// Install a callback invoked once per instruction fetch.
    pub fn set_tracer(&mut self, tracer: impl FnMut(&Trace) + 'static) {
        self.tracer = Some(Box::new(tracer));
    }

    /// Remove the trace callback.
    pub fn clear_tracer(&mut self) {
        self.tracer = None;
    }

    /// Run until the next instruction boundary.
    ///
    /// Returns the number of T-cycles consumed. Interrupt dispatch and each
    /// 4-cycle halted period count as their own step.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::IllegalOpcode`] when an undefined opcode is
    /// fetched.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32, ExecError> {
        let mut cycles = 0;
        loop {
            self.tick(bus)?;
            cycles += 1;
            if self.retired {
                return Ok(cycles);
            }
        }
    }

    // === Bus helpers ===

    fn imm8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.regs.advance(Pointer::Pc);
        bus.read(pc)
    }

    fn imm16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.imm8(bus);
        let hi = self.imm8(bus);
        u16::from(hi) << 8 | u16::from(lo)
    }

    fn push16<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.retreat(Pointer::Sp);
        bus.write(self.regs.sp, (value >> 8) as u8);
        self.regs.retreat(Pointer::Sp);
        bus.write(self.regs.sp, value as u8);
    }

    fn pop16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read(self.regs.advance(Pointer::Sp));
        let hi = bus.read(self.regs.advance(Pointer::Sp));
        u16::from(hi) << 8 | u16::from(lo)
    }

    fn read_reg<B: Bus>(&self, bus: &mut B, reg: Reg8) -> u8 {
        match self.regs.get8(reg) {
            Some(value) => value,
            None => bus.read(self.regs.hl()),
        }
    }

    fn write_reg<B: Bus>(&mut self, bus: &mut B, reg: Reg8, value: u8) {
        if !self.regs.set8(reg, value) {
            bus.write(self.regs.hl(), value);
        }
    }

    /// Resolve a memory operand to its address. Registers and immediates
    /// have none.
    fn address<B: Bus>(&mut self, bus: &mut B, loc: Loc8) -> Option<u16> {
        match loc {
            Loc8::Reg(Reg8::HlInd) => Some(self.regs.hl()),
            Loc8::Reg(_) | Loc8::Imm => None,
            Loc8::IndBc => Some(self.regs.bc()),
            Loc8::IndDe => Some(self.regs.de()),
            Loc8::IndHlInc => Some(self.regs.advance(Pointer::Hl)),
            Loc8::IndHlDec => Some(self.regs.retreat(Pointer::Hl)),
            Loc8::IndImm16 => Some(self.imm16(bus)),
            Loc8::HighImm => Some(0xFF00 | u16::from(self.imm8(bus))),
            Loc8::HighC => Some(0xFF00 | u16::from(self.regs.c)),
        }
    }

    fn load<B: Bus>(&mut self, bus: &mut B, loc: Loc8) -> u8 {
        match loc {
            Loc8::Imm => self.imm8(bus),
            Loc8::Reg(reg) => self.read_reg(bus, reg),
            _ => match self.address(bus, loc) {
                Some(addr) => bus.read(addr),
                None => 0xFF,
            },
        }
    }

    fn store<B: Bus>(&mut self, bus: &mut B, loc: Loc8, value: u8) {
        match loc {
            Loc8::Reg(reg) => self.write_reg(bus, reg, value),
            _ => {
                if let Some(addr) = self.address(bus, loc) {
                    bus.write(addr, value);
                }
            }
        }
    }

    fn pending_interrupts<B: Bus>(bus: &mut B) -> u8 {
        bus.read(IE_ADDR) & bus.read(IF_ADDR) & 0x1F
    }

    fn condition(&self, cond: Option<Cond>) -> bool {
        match cond {
            None => true,
            Some(Cond::Nz) => !self.regs.zero(),
            Some(Cond::Z) => self.regs.zero(),
            Some(Cond::Nc) => !self.regs.carry(),
            Some(Cond::C) => self.regs.carry(),
        }
    }

    // === Engine ===

    fn fetch<B: Bus>(&mut self, bus: &mut B) -> Result<(), ExecError> {
        let address = self.regs.pc;
        let opcode = bus.read(address);
        let table = tables();

        let instruction = if opcode == 0xCB {
            None
        } else {
            Some(table.base(opcode).ok_or(ExecError::IllegalOpcode { opcode, address })?)
        };

        let snapshot = self.regs;
        if self.halt_bug {
            self.halt_bug = false;
        } else {
            self.regs.advance(Pointer::Pc);
        }
        let instruction = match instruction {
            Some(instruction) => instruction,
            None => {
                let sub = self.imm8(bus);
                table.extended(sub)
            }
        };

        if let Some(tracer) = self.tracer.as_mut() {
            tracer(&Trace {
                pc: address,
                opcode: instruction.opcode,
                prefixed: instruction.prefixed,
                mnemonic: instruction.mnemonic.as_str(),
                registers: snapshot,
            });
        }

        self.state = State::Executing {
            remaining: instruction.cycles - 1,
            stage: Stage::Instruction(instruction),
        };
        Ok(())
    }

    fn complete<B: Bus>(&mut self, bus: &mut B, stage: Stage) {
        match stage {
            Stage::Instruction(instruction) => {
                if let Some(deferred) = self.execute(bus, instruction.op) {
                    self.state = State::Executing {
                        remaining: deferred.cycles,
                        stage: Stage::Deferred(deferred.jump),
                    };
                    return;
                }
            }
            Stage::Deferred(jump) => self.jump(bus, jump),
            Stage::Idle => {
                self.retire(bus);
                return;
            }
        }

        if self.ei_delay > 0 {
            self.ei_delay -= 1;
            if self.ei_delay == 0 {
                self.regs.ime = true;
            }
        }
        self.retire(bus);
    }

    /// Instruction boundary: service, wake, stay halted or fetch.
    fn retire<B: Bus>(&mut self, bus: &mut B) {
        self.retired = true;
        let pending = Self::pending_interrupts(bus);

        if pending != 0 && self.regs.ime {
            self.service_interrupt(bus, pending);
        } else if self.halted {
            if pending == 0 {
                self.state = State::Halted {
                    remaining: HALT_CYCLES,
                };
            } else {
                self.halted = false;
                self.halt_bug = true;
                self.state = State::Executing {
                    remaining: HALT_CYCLES,
                    stage: Stage::Idle,
                };
            }
        } else {
            self.state = State::Fetching;
        }
    }

    fn service_interrupt<B: Bus>(&mut self, bus: &mut B, pending: u8) {
        let bit = pending.trailing_zeros() as usize;
        self.halted = false;
        self.regs.ime = false;
        self.ei_delay = 0;

        // A HALT that hit the bug is resumed by re-executing it.
        let mut pc = self.regs.pc;
        if self.halt_bug {
            self.halt_bug = false;
            pc = pc.wrapping_sub(1);
        }
        self.push16(bus, pc);
        self.regs.pc = INTERRUPT_VECTORS[bit];

        let flags = bus.read(IF_ADDR);
        bus.write(IF_ADDR, flags & !(1 << bit));

        self.state = State::Executing {
            remaining: INTERRUPT_CYCLES,
            stage: Stage::Idle,
        };
    }

    fn enter_halt<B: Bus>(&mut self, bus: &mut B) {
        if !self.regs.ime && Self::pending_interrupts(bus) != 0 {
            self.halt_bug = true;
        } else {
            self.halted = true;
        }
    }

    fn jump<B: Bus>(&mut self, bus: &mut B, jump: Jump) {
        match jump {
            Jump::To(target) => self.regs.pc = target,
            Jump::Call(target) => {
                let pc = self.regs.pc;
                self.push16(bus, pc);
                self.regs.pc = target;
            }
            Jump::Return => self.regs.pc = self.pop16(bus),
            Jump::ReturnEnable => {
                self.regs.pc = self.pop16(bus);
                self.regs.ime = true;
            }
        }
    }

    fn set_flags(&mut self, flags: u8) {
        self.regs.set_f(flags);
    }

    fn alu(&mut self, op: AluOp, value: u8) {
        let a = self.regs.a;
        let carry = self.regs.carry();
        let result = match op {
            AluOp::Add => alu::add8(a, value),
            AluOp::Adc => alu::adc8(a, value, carry),
            AluOp::Sub => alu::sub8(a, value),
            AluOp::Sbc => alu::sbc8(a, value, carry),
            AluOp::And => alu::and8(a, value),
            AluOp::Xor => alu::xor8(a, value),
            AluOp::Or => alu::or8(a, value),
            AluOp::Cp => alu::cp8(a, value),
        };
        self.regs.a = result.value;
        self.set_flags(result.flags);
    }

    fn shift(&self, op: ShiftOp, value: u8) -> AluResult {
        let carry = self.regs.carry();
        match op {
            ShiftOp::Rlc => alu::rlc(value),
            ShiftOp::Rrc => alu::rrc(value),
            ShiftOp::Rl => alu::rl(value, carry),
            ShiftOp::Rr => alu::rr(value, carry),
            ShiftOp::Sla => alu::sla(value),
            ShiftOp::Sra => alu::sra(value),
            ShiftOp::Swap => alu::swap(value),
            ShiftOp::Srl => alu::srl(value),
        }
    }

    /// Rotates through A clear Z regardless of the result.
    fn rotate_a(&mut self, op: ShiftOp) {
        let result = self.shift(op, self.regs.a);
        self.regs.a = result.value;
        self.set_flags(result.flags & CF);
    }

    /// Apply an instruction's effect. Taken branches return the jump to
    /// run once their extra cycles have elapsed.
    #[allow(clippy::too_many_lines)]
    fn execute<B: Bus>(&mut self, bus: &mut B, op: Op) -> Option<DeferredJump> {
        let f = self.regs.f;
        match op {
            Op::Nop => {}
            Op::Halt => self.enter_halt(bus),
            Op::Stop => {
                self.regs.advance(Pointer::Pc);
                self.enter_halt(bus);
            }
            Op::Di => {
                self.regs.ime = false;
                self.ei_delay = 0;
            }
            Op::Ei => {
                if !self.regs.ime {
                    self.ei_delay = 2;
                }
            }

            Op::Ld8 { dst, src } => {
                let value = self.load(bus, src);
                self.store(bus, dst, value);
            }
            Op::Ld16Imm(pair) => {
                let value = self.imm16(bus);
                self.regs.set16(pair, value);
            }
            Op::LdImm16Sp => {
                let addr = self.imm16(bus);
                let sp = self.regs.sp;
                bus.write(addr, sp as u8);
                bus.write(addr.wrapping_add(1), (sp >> 8) as u8);
            }
            Op::LdSpHl => self.regs.sp = self.regs.hl(),
            Op::LdHlSpOffset => {
                let offset = self.imm8(bus);
                let (value, flags) = alu::add_sp(self.regs.sp, offset);
                self.regs.set_hl(value);
                self.set_flags(flags);
            }
            Op::Push(pair) => {
                let value = self.regs.get_stack(pair);
                self.push16(bus, value);
            }
            Op::Pop(pair) => {
                let value = self.pop16(bus);
                self.regs.set_stack(pair, value);
            }

            Op::Alu(op, src) => {
                let value = self.load(bus, src);
                self.alu(op, value);
            }
            Op::Inc8(reg) => {
                let result = alu::inc8(self.read_reg(bus, reg));
                self.write_reg(bus, reg, result.value);
                self.set_flags(result.flags | (f & CF));
            }
            Op::Dec8(reg) => {
                let result = alu::dec8(self.read_reg(bus, reg));
                self.write_reg(bus, reg, result.value);
                self.set_flags(result.flags | (f & CF));
            }
            Op::Inc16(pair) => {
                let value = self.regs.get16(pair).wrapping_add(1);
                self.regs.set16(pair, value);
            }
            Op::Dec16(pair) => {
                let value = self.regs.get16(pair).wrapping_sub(1);
                self.regs.set16(pair, value);
            }
            Op::AddHl(pair) => {
                let (value, flags) = alu::add16(self.regs.hl(), self.regs.get16(pair));
                self.regs.set_hl(value);
                self.set_flags((f & ZF) | flags);
            }
            Op::AddSp => {
                let offset = self.imm8(bus);
                let (value, flags) = alu::add_sp(self.regs.sp, offset);
                self.regs.sp = value;
                self.set_flags(flags);
            }

            Op::Rlca => self.rotate_a(ShiftOp::Rlc),
            Op::Rrca => self.rotate_a(ShiftOp::Rrc),
            Op::Rla => self.rotate_a(ShiftOp::Rl),
            Op::Rra => self.rotate_a(ShiftOp::Rr),
            Op::Daa => {
                let result = alu::daa(self.regs.a, f);
                self.regs.a = result.value;
                self.set_flags(result.flags);
            }
            Op::Cpl => {
                self.regs.a = !self.regs.a;
                self.set_flags(f | NF | HF);
            }
            Op::Scf => self.set_flags((f & ZF) | CF),
            Op::Ccf => self.set_flags((f & ZF) | ((f & CF) ^ CF)),

            Op::Jp(cond) => {
                let target = self.imm16(bus);
                if self.condition(cond) {
                    return Some(DeferredJump {
                        cycles: 4,
                        jump: Jump::To(target),
                    });
                }
            }
            Op::JpHl => self.regs.pc = self.regs.hl(),
            Op::Jr(cond) => {
                let offset = self.imm8(bus) as i8;
                if self.condition(cond) {
                    let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
                    return Some(DeferredJump {
                        cycles: 4,
                        jump: Jump::To(target),
                    });
                }
            }
            Op::Call(cond) => {
                let target = self.imm16(bus);
                if self.condition(cond) {
                    return Some(DeferredJump {
                        cycles: 12,
                        jump: Jump::Call(target),
                    });
                }
            }
            Op::Ret(cond) => {
                if self.condition(cond) {
                    return Some(DeferredJump {
                        cycles: 12,
                        jump: Jump::Return,
                    });
                }
            }
            Op::Reti => {
                return Some(DeferredJump {
                    cycles: 12,
                    jump: Jump::ReturnEnable,
                });
            }
            Op::Rst(vector) => {
                return Some(DeferredJump {
                    cycles: 12,
                    jump: Jump::Call(u16::from(vector)),
                });
            }

            Op::Shift(op, reg) => {
                let result = self.shift(op, self.read_reg(bus, reg));
                self.write_reg(bus, reg, result.value);
                self.set_flags(result.flags);
            }
            Op::Bit(index, reg) => {
                let flags = alu::bit(index, self.read_reg(bus, reg));
                self.set_flags(flags | (f & CF));
            }
            Op::Res(index, reg) => {
                let value = self.read_reg(bus, reg) & !(1 << index);
                self.write_reg(bus, reg, value);
            }
            Op::Set(index, reg) => {
                let value = self.read_reg(bus, reg) | (1 << index);
                self.write_reg(bus, reg, value);
            }
        }
        None
    }
}

impl Default for Sm83 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Sm83 {
    type Registers = Registers;
    type Error = ExecError;

    fn tick<B: Bus>(&mut self, bus: &mut B) -> Result<(), ExecError> {
        self.retired = false;
        match self.state {
            State::Fetching => self.fetch(bus)?,
            State::Executing { remaining, stage } => {
                if remaining > 1 {
                    self.state = State::Executing {
                        remaining: remaining - 1,
                        stage,
                    };
                } else {
                    self.complete(bus, stage);
                }
            }
            State::Halted { remaining } => {
                if remaining > 1 {
                    self.state = State::Halted {
                        remaining: remaining - 1,
                    };
                } else {
                    self.retire(bus);
                }
            }
        }
        self.total_ticks.advance();
        Ok(())
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn reset(&mut self) {
        self.regs = Registers::default();
        self.state = State::Fetching;
        self.halted = false;
        self.halt_bug = false;
        self.ei_delay = 0;
        self.retired = false;
        self.total_ticks = Ticks::ZERO;
    }
}

const SM83_QUERY_PATHS: &[&str] = &[
    // Registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "af", "bc", "de", "hl", "sp", "pc",
    // Flags
    "flags.z", "flags.n", "flags.h", "flags.c",
    // Interrupt and run state
    "ime", "halted", "ticks",
];

impl Observable for Sm83 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "b" => Some(self.regs.b.into()),
            "c" => Some(self.regs.c.into()),
            "d" => Some(self.regs.d.into()),
            "e" => Some(self.regs.e.into()),
            "h" => Some(self.regs.h.into()),
            "l" => Some(self.regs.l.into()),

            "af" => Some(self.regs.af().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),
            "sp" => Some(self.regs.sp.into()),
            "pc" => Some(self.regs.pc.into()),

            "flags.z" => Some(self.regs.zero().into()),
            "flags.n" => Some(self.regs.subtract().into()),
            "flags.h" => Some(self.regs.half_carry().into()),
            "flags.c" => Some(self.regs.carry().into()),

            "ime" => Some(self.regs.ime.into()),
            "halted" => Some(self.halted.into()),
            "ticks" => Some(self.total_ticks.get().into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        SM83_QUERY_PATHS
    }
}

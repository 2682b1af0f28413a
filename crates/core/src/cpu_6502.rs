//! MOS 6502 CPU core, clocked one cycle at a time.
//!
//! The core is generic over the [`Memory6502`] trait so any system (NES,
//! Atari 2600, Apple II, ...) can supply its own memory map. Unlike a
//! step-per-instruction interpreter, this core models the multi-cycle nature
//! of the 6502: `clock()` advances exactly one CPU cycle, and an internal
//! countdown tracks how many cycles the in-flight instruction still owes.
//! Instruction side effects are applied on the fetch cycle; the remaining
//! cycles only burn time, which is what memory-mapped peripherals observe.
//!
//! Interrupt lines are latched and serviced on the edge of instruction
//! completion, NMI before IRQ, IRQ only while the I flag is clear.

/// Memory interface for the 6502.
///
/// Reads take `&mut self` because real 6502 buses have read side effects
/// (status registers that clear on read, shift registers that advance).
pub trait Memory6502 {
    /// Read a byte from memory at the given address.
    fn read(&mut self, addr: u16) -> u8;

    /// Write a byte to memory at the given address.
    fn write(&mut self, addr: u16, val: u8);
}

/// Addressing modes of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Am {
    /// Implied (operand is A or none)
    Imp,
    /// Immediate
    Imm,
    /// Zero page
    Zp0,
    /// Zero page, X-indexed
    Zpx,
    /// Zero page, Y-indexed
    Zpy,
    /// Relative (branches)
    Rel,
    /// Absolute
    Abs,
    /// Absolute, X-indexed
    Abx,
    /// Absolute, Y-indexed
    Aby,
    /// Indirect (JMP only, with the page-wrap quirk)
    Ind,
    /// (Indirect, X)
    Izx,
    /// (Indirect), Y
    Izy,
}

/// Operations, documented and illegal. Every one of the 256 opcodes decodes
/// to one of these with fully deterministic behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Illegal opcodes
    Slo, Rla, Sre, Rra, Sax, Lax, Dcp, Isc, Anc, Alr, Arr, Xaa, Axs, Ahx,
    Shy, Shx, Tas, Las, Jam,
}

/// One decode-table entry: what to do, how to address it, and the base
/// cycle count before page-cross and branch penalties.
#[derive(Debug, Clone, Copy)]
struct Instruction {
    op: Op,
    mode: Am,
    cycles: u8,
}

const fn i(op: Op, mode: Am, cycles: u8) -> Instruction {
    Instruction { op, mode, cycles }
}

/// MOS 6502 CPU state and execution engine.
#[derive(Debug)]
pub struct Cpu6502 {
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (addresses $0100 + SP, decrements on push)
    pub sp: u8,
    /// Status register (N V U B D I Z C from bit 7 down)
    pub p: u8,
    /// Program counter
    pub pc: u16,
    /// Total cycles since reset
    pub cycles: u64,

    // Per-instruction scratch
    opcode: u8,
    mode: Am,
    fetched: u8,
    addr_abs: u16,
    addr_rel: u16,
    cycles_remaining: u8,

    // Interrupt lines, sampled at instruction boundaries
    nmi_pending: bool,
    irq_pending: bool,
}

impl Cpu6502 {
    pub const C: u8 = 0x01;
    pub const Z: u8 = 0x02;
    pub const I: u8 = 0x04;
    pub const D: u8 = 0x08;
    pub const B: u8 = 0x10;
    pub const U: u8 = 0x20;
    pub const V: u8 = 0x40;
    pub const N: u8 = 0x80;

    const NMI_VECTOR: u16 = 0xFFFA;
    const RESET_VECTOR: u16 = 0xFFFC;
    const IRQ_VECTOR: u16 = 0xFFFE;

    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            p: Self::U | Self::I,
            pc: 0,
            cycles: 0,
            opcode: 0,
            mode: Am::Imp,
            fetched: 0,
            addr_abs: 0,
            addr_rel: 0,
            cycles_remaining: 0,
            nmi_pending: false,
            irq_pending: false,
        }
    }

    /// Reset to power-on state. Loads PC from the reset vector, sets SP to
    /// $FD and P to I|U. The sequence occupies 8 cycles.
    pub fn reset(&mut self, bus: &mut impl Memory6502) {
        let lo = bus.read(Self::RESET_VECTOR) as u16;
        let hi = bus.read(Self::RESET_VECTOR + 1) as u16;
        self.pc = (hi << 8) | lo;

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.p = Self::U | Self::I;

        self.opcode = 0;
        self.mode = Am::Imp;
        self.fetched = 0;
        self.addr_abs = 0;
        self.addr_rel = 0;
        self.nmi_pending = false;
        self.irq_pending = false;

        self.cycles = 0;
        self.cycles_remaining = 8;
    }

    /// Latch the NMI line. The edge is serviced at the next instruction
    /// boundary, ahead of any pending IRQ.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Latch the IRQ line. Serviced at the next instruction boundary if the
    /// I flag is clear; a request arriving while I is set stays latched.
    pub fn irq(&mut self) {
        self.irq_pending = true;
    }

    /// True when no instruction is in flight (the next `clock` fetches).
    pub fn instruction_complete(&self) -> bool {
        self.cycles_remaining == 0
    }

    /// Advance one CPU cycle.
    ///
    /// On the boundary cycle this services a latched interrupt or fetches,
    /// decodes and executes the next instruction, charging its full cycle
    /// cost to the countdown. All other cycles only burn the countdown.
    pub fn clock(&mut self, bus: &mut impl Memory6502) {
        if self.cycles_remaining == 0 {
            if self.nmi_pending {
                self.nmi_pending = false;
                self.interrupt(bus, Self::NMI_VECTOR);
            } else if self.irq_pending && (self.p & Self::I) == 0 {
                self.irq_pending = false;
                self.interrupt(bus, Self::IRQ_VECTOR);
            } else {
                self.opcode = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);

                // Bit 5 of the status register is tied high in hardware.
                self.p |= Self::U;

                let instr = DECODE_TABLE[self.opcode as usize];
                self.mode = instr.mode;
                self.cycles_remaining = instr.cycles;

                let page_crossed = self.run_mode(bus, instr.mode);
                let wants_extra = self.run_op(bus, instr.op);

                // Only read-class operations pay the page-cross penalty.
                if page_crossed && wants_extra {
                    self.cycles_remaining += 1;
                }

                self.p |= Self::U;
            }
        }

        self.cycles_remaining -= 1;
        self.cycles = self.cycles.wrapping_add(1);
    }

    /// Run cycles until the in-flight instruction (or interrupt sequence)
    /// finishes, then execute one more full instruction.
    pub fn step_instruction(&mut self, bus: &mut impl Memory6502) {
        while self.cycles_remaining > 0 {
            self.clock(bus);
        }
        self.clock(bus);
        while self.cycles_remaining > 0 {
            self.clock(bus);
        }
    }

    fn interrupt(&mut self, bus: &mut impl Memory6502, vector: u16) {
        self.push16(bus, self.pc);
        // B clear distinguishes a hardware interrupt from BRK on the stack.
        self.push(bus, (self.p & !Self::B) | Self::U);
        self.p |= Self::I;

        let lo = bus.read(vector) as u16;
        let hi = bus.read(vector.wrapping_add(1)) as u16;
        self.pc = (hi << 8) | lo;

        self.cycles_remaining = 7;
    }

    fn get_flag(&self, mask: u8) -> bool {
        (self.p & mask) != 0
    }

    fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.p |= mask;
        } else {
            self.p &= !mask;
        }
    }

    fn set_zn(&mut self, v: u8) {
        self.set_flag(Self::Z, v == 0);
        self.set_flag(Self::N, (v & 0x80) != 0);
    }

    fn push(&mut self, bus: &mut impl Memory6502, v: u8) {
        bus.write(0x0100 | self.sp as u16, v);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self, bus: &mut impl Memory6502) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | self.sp as u16)
    }

    fn push16(&mut self, bus: &mut impl Memory6502, v: u16) {
        self.push(bus, (v >> 8) as u8);
        self.push(bus, (v & 0xFF) as u8);
    }

    fn pop16(&mut self, bus: &mut impl Memory6502) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }

    /// Resolve the effective address for the current addressing mode.
    /// Returns whether indexing crossed a page boundary.
    fn run_mode(&mut self, bus: &mut impl Memory6502, mode: Am) -> bool {
        match mode {
            Am::Imp => {
                self.fetched = self.a;
                false
            }
            Am::Imm => {
                self.addr_abs = self.pc;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            Am::Zp0 => {
                self.addr_abs = bus.read(self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            Am::Zpx => {
                self.addr_abs = bus.read(self.pc).wrapping_add(self.x) as u16;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            Am::Zpy => {
                self.addr_abs = bus.read(self.pc).wrapping_add(self.y) as u16;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            Am::Rel => {
                self.addr_rel = bus.read(self.pc) as u16;
                self.pc = self.pc.wrapping_add(1);
                if self.addr_rel & 0x80 != 0 {
                    self.addr_rel |= 0xFF00;
                }
                false
            }
            Am::Abs => {
                let lo = bus.read(self.pc) as u16;
                let hi = bus.read(self.pc.wrapping_add(1)) as u16;
                self.pc = self.pc.wrapping_add(2);
                self.addr_abs = (hi << 8) | lo;
                false
            }
            Am::Abx => {
                let lo = bus.read(self.pc) as u16;
                let hi = bus.read(self.pc.wrapping_add(1)) as u16;
                self.pc = self.pc.wrapping_add(2);
                self.addr_abs = ((hi << 8) | lo).wrapping_add(self.x as u16);
                (self.addr_abs & 0xFF00) != (hi << 8)
            }
            Am::Aby => {
                let lo = bus.read(self.pc) as u16;
                let hi = bus.read(self.pc.wrapping_add(1)) as u16;
                self.pc = self.pc.wrapping_add(2);
                self.addr_abs = ((hi << 8) | lo).wrapping_add(self.y as u16);
                (self.addr_abs & 0xFF00) != (hi << 8)
            }
            Am::Ind => {
                let ptr_lo = bus.read(self.pc) as u16;
                let ptr_hi = bus.read(self.pc.wrapping_add(1)) as u16;
                self.pc = self.pc.wrapping_add(2);
                let ptr = (ptr_hi << 8) | ptr_lo;
                // Hardware quirk: the pointer's high byte is read from the
                // same page when the low byte is $FF.
                let hi_addr = if ptr_lo == 0x00FF { ptr & 0xFF00 } else { ptr + 1 };
                self.addr_abs = ((bus.read(hi_addr) as u16) << 8) | bus.read(ptr) as u16;
                false
            }
            Am::Izx => {
                let t = bus.read(self.pc).wrapping_add(self.x);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(t as u16) as u16;
                let hi = bus.read(t.wrapping_add(1) as u16) as u16;
                self.addr_abs = (hi << 8) | lo;
                false
            }
            Am::Izy => {
                let t = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = bus.read(t as u16) as u16;
                let hi = bus.read(t.wrapping_add(1) as u16) as u16;
                self.addr_abs = ((hi << 8) | lo).wrapping_add(self.y as u16);
                (self.addr_abs & 0xFF00) != (hi << 8)
            }
        }
    }

    /// Read the operand for the current instruction. Implied mode already
    /// staged the accumulator during addressing.
    fn fetch(&mut self, bus: &mut impl Memory6502) -> u8 {
        if self.mode != Am::Imp {
            self.fetched = bus.read(self.addr_abs);
        }
        self.fetched
    }

    fn branch_if(&mut self, condition: bool) {
        if condition {
            self.cycles_remaining += 1;
            self.addr_abs = self.pc.wrapping_add(self.addr_rel);
            if (self.addr_abs & 0xFF00) != (self.pc & 0xFF00) {
                self.cycles_remaining += 1;
            }
            self.pc = self.addr_abs;
        }
    }

    fn adc_with(&mut self, operand: u8) {
        let sum = self.a as u16 + operand as u16 + self.get_flag(Self::C) as u16;
        self.set_flag(Self::C, sum > 0xFF);
        self.set_flag(Self::Z, (sum & 0xFF) == 0);
        self.set_flag(
            Self::V,
            (!(self.a as u16 ^ operand as u16) & (self.a as u16 ^ sum)) & 0x80 != 0,
        );
        self.set_flag(Self::N, sum & 0x80 != 0);
        self.a = (sum & 0xFF) as u8;
    }

    fn compare(&mut self, reg: u8, operand: u8) {
        let t = (reg as u16).wrapping_sub(operand as u16);
        self.set_flag(Self::C, reg >= operand);
        self.set_flag(Self::Z, (t & 0xFF) == 0);
        self.set_flag(Self::N, t & 0x80 != 0);
    }

    /// Execute the operation. Returns whether a page-cross during addressing
    /// should add a cycle (read-class operations only).
    fn run_op(&mut self, bus: &mut impl Memory6502, op: Op) -> bool {
        match op {
            Op::Adc => {
                let f = self.fetch(bus);
                self.adc_with(f);
                true
            }
            Op::Sbc => {
                // SBC is ADC of the operand's ones-complement. The D flag
                // has no effect on this CPU.
                let f = self.fetch(bus) ^ 0xFF;
                self.adc_with(f);
                true
            }
            Op::And => {
                let f = self.fetch(bus);
                self.a &= f;
                self.set_zn(self.a);
                true
            }
            Op::Ora => {
                let f = self.fetch(bus);
                self.a |= f;
                self.set_zn(self.a);
                true
            }
            Op::Eor => {
                let f = self.fetch(bus);
                self.a ^= f;
                self.set_zn(self.a);
                true
            }
            Op::Asl => {
                let f = self.fetch(bus);
                let t = (f as u16) << 1;
                self.set_flag(Self::C, t & 0xFF00 != 0);
                self.set_flag(Self::Z, (t & 0xFF) == 0);
                self.set_flag(Self::N, t & 0x80 != 0);
                let r = (t & 0xFF) as u8;
                if self.mode == Am::Imp {
                    self.a = r;
                } else {
                    bus.write(self.addr_abs, r);
                }
                false
            }
            Op::Lsr => {
                let f = self.fetch(bus);
                self.set_flag(Self::C, f & 0x01 != 0);
                let r = f >> 1;
                self.set_zn(r);
                if self.mode == Am::Imp {
                    self.a = r;
                } else {
                    bus.write(self.addr_abs, r);
                }
                false
            }
            Op::Rol => {
                let f = self.fetch(bus);
                let t = ((f as u16) << 1) | self.get_flag(Self::C) as u16;
                self.set_flag(Self::C, t & 0xFF00 != 0);
                let r = (t & 0xFF) as u8;
                self.set_zn(r);
                if self.mode == Am::Imp {
                    self.a = r;
                } else {
                    bus.write(self.addr_abs, r);
                }
                false
            }
            Op::Ror => {
                let f = self.fetch(bus);
                let r = ((self.get_flag(Self::C) as u8) << 7) | (f >> 1);
                self.set_flag(Self::C, f & 0x01 != 0);
                self.set_zn(r);
                if self.mode == Am::Imp {
                    self.a = r;
                } else {
                    bus.write(self.addr_abs, r);
                }
                false
            }
            Op::Bcc => {
                self.branch_if(!self.get_flag(Self::C));
                false
            }
            Op::Bcs => {
                self.branch_if(self.get_flag(Self::C));
                false
            }
            Op::Beq => {
                self.branch_if(self.get_flag(Self::Z));
                false
            }
            Op::Bne => {
                self.branch_if(!self.get_flag(Self::Z));
                false
            }
            Op::Bmi => {
                self.branch_if(self.get_flag(Self::N));
                false
            }
            Op::Bpl => {
                self.branch_if(!self.get_flag(Self::N));
                false
            }
            Op::Bvc => {
                self.branch_if(!self.get_flag(Self::V));
                false
            }
            Op::Bvs => {
                self.branch_if(self.get_flag(Self::V));
                false
            }
            Op::Bit => {
                let f = self.fetch(bus);
                self.set_flag(Self::Z, (self.a & f) == 0);
                self.set_flag(Self::N, f & 0x80 != 0);
                self.set_flag(Self::V, f & 0x40 != 0);
                false
            }
            Op::Brk => {
                self.pc = self.pc.wrapping_add(1);
                self.p |= Self::I;
                self.push16(bus, self.pc);
                self.push(bus, self.p | Self::B | Self::U);
                let lo = bus.read(Self::IRQ_VECTOR) as u16;
                let hi = bus.read(Self::IRQ_VECTOR + 1) as u16;
                self.pc = (hi << 8) | lo;
                false
            }
            Op::Clc => {
                self.set_flag(Self::C, false);
                false
            }
            Op::Cld => {
                self.set_flag(Self::D, false);
                false
            }
            Op::Cli => {
                self.set_flag(Self::I, false);
                false
            }
            Op::Clv => {
                self.set_flag(Self::V, false);
                false
            }
            Op::Sec => {
                self.set_flag(Self::C, true);
                false
            }
            Op::Sed => {
                self.set_flag(Self::D, true);
                false
            }
            Op::Sei => {
                self.set_flag(Self::I, true);
                false
            }
            Op::Cmp => {
                let f = self.fetch(bus);
                self.compare(self.a, f);
                true
            }
            Op::Cpx => {
                let f = self.fetch(bus);
                self.compare(self.x, f);
                false
            }
            Op::Cpy => {
                let f = self.fetch(bus);
                self.compare(self.y, f);
                false
            }
            Op::Dec => {
                let f = self.fetch(bus);
                let r = f.wrapping_sub(1);
                bus.write(self.addr_abs, r);
                self.set_zn(r);
                false
            }
            Op::Inc => {
                let f = self.fetch(bus);
                let r = f.wrapping_add(1);
                bus.write(self.addr_abs, r);
                self.set_zn(r);
                false
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
                false
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
                false
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
                false
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
                false
            }
            Op::Jmp => {
                self.pc = self.addr_abs;
                false
            }
            Op::Jsr => {
                self.pc = self.pc.wrapping_sub(1);
                self.push16(bus, self.pc);
                self.pc = self.addr_abs;
                false
            }
            Op::Rts => {
                self.pc = self.pop16(bus).wrapping_add(1);
                false
            }
            Op::Rti => {
                self.p = (self.pop(bus) | Self::U) & !Self::B;
                self.pc = self.pop16(bus);
                false
            }
            Op::Lda => {
                self.a = self.fetch(bus);
                self.set_zn(self.a);
                true
            }
            Op::Ldx => {
                self.x = self.fetch(bus);
                self.set_zn(self.x);
                true
            }
            Op::Ldy => {
                self.y = self.fetch(bus);
                self.set_zn(self.y);
                true
            }
            Op::Sta => {
                bus.write(self.addr_abs, self.a);
                false
            }
            Op::Stx => {
                bus.write(self.addr_abs, self.x);
                false
            }
            Op::Sty => {
                bus.write(self.addr_abs, self.y);
                false
            }
            Op::Pha => {
                self.push(bus, self.a);
                false
            }
            Op::Php => {
                // Pushed copy carries B set; the live register does not.
                self.push(bus, self.p | Self::B | Self::U);
                false
            }
            Op::Pla => {
                self.a = self.pop(bus);
                self.set_zn(self.a);
                false
            }
            Op::Plp => {
                self.p = (self.pop(bus) | Self::U) & !Self::B;
                false
            }
            Op::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
                false
            }
            Op::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
                false
            }
            Op::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
                false
            }
            Op::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
                false
            }
            Op::Txs => {
                self.sp = self.x;
                false
            }
            Op::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
                false
            }
            Op::Nop => {
                // Page-cross penalty only materializes for the absolute,X
                // forms; the AND with the addressing result handles that.
                true
            }
            Op::Slo => {
                // ASL memory, then ORA
                let f = self.fetch(bus);
                let t = (f as u16) << 1;
                bus.write(self.addr_abs, (t & 0xFF) as u8);
                self.set_flag(Self::C, t & 0xFF00 != 0);
                self.a |= (t & 0xFF) as u8;
                self.set_zn(self.a);
                false
            }
            Op::Rla => {
                // ROL memory, then AND
                let f = self.fetch(bus);
                let t = ((f as u16) << 1) | self.get_flag(Self::C) as u16;
                bus.write(self.addr_abs, (t & 0xFF) as u8);
                self.set_flag(Self::C, t & 0xFF00 != 0);
                self.a &= (t & 0xFF) as u8;
                self.set_zn(self.a);
                false
            }
            Op::Sre => {
                // LSR memory, then EOR
                let f = self.fetch(bus);
                self.set_flag(Self::C, f & 0x01 != 0);
                let t = f >> 1;
                bus.write(self.addr_abs, t);
                self.a ^= t;
                self.set_zn(self.a);
                false
            }
            Op::Rra => {
                // ROR memory, then ADC
                let f = self.fetch(bus);
                let t = ((self.get_flag(Self::C) as u8) << 7) | (f >> 1);
                self.set_flag(Self::C, f & 0x01 != 0);
                bus.write(self.addr_abs, t);
                self.adc_with(t);
                false
            }
            Op::Sax => {
                bus.write(self.addr_abs, self.a & self.x);
                false
            }
            Op::Lax => {
                let f = self.fetch(bus);
                self.a = f;
                self.x = f;
                self.set_zn(f);
                true
            }
            Op::Dcp => {
                // DEC memory, then CMP
                let f = self.fetch(bus);
                let t = f.wrapping_sub(1);
                bus.write(self.addr_abs, t);
                self.compare(self.a, t);
                false
            }
            Op::Isc => {
                // INC memory, then SBC
                let f = self.fetch(bus);
                let t = f.wrapping_add(1);
                bus.write(self.addr_abs, t);
                self.adc_with(t ^ 0xFF);
                false
            }
            Op::Anc => {
                let f = self.fetch(bus);
                self.a &= f;
                self.set_zn(self.a);
                self.set_flag(Self::C, self.a & 0x80 != 0);
                false
            }
            Op::Alr => {
                let f = self.fetch(bus);
                self.a &= f;
                self.set_flag(Self::C, self.a & 0x01 != 0);
                self.a >>= 1;
                self.set_flag(Self::Z, self.a == 0);
                self.set_flag(Self::N, false);
                false
            }
            Op::Arr => {
                let f = self.fetch(bus);
                self.a &= f;
                self.a = ((self.get_flag(Self::C) as u8) << 7) | (self.a >> 1);
                self.set_zn(self.a);
                self.set_flag(Self::C, self.a & 0x40 != 0);
                self.set_flag(
                    Self::V,
                    ((self.a & 0x40) ^ ((self.a & 0x20) << 1)) != 0,
                );
                false
            }
            Op::Xaa => {
                // Unstable on hardware; pinned here as A = X & imm.
                let f = self.fetch(bus);
                self.a = self.x & f;
                self.set_zn(self.a);
                false
            }
            Op::Axs => {
                let f = self.fetch(bus);
                let t = self.a & self.x;
                let r = (t as u16).wrapping_sub(f as u16);
                self.x = (r & 0xFF) as u8;
                self.set_flag(Self::C, t >= f);
                self.set_zn(self.x);
                false
            }
            Op::Ahx => {
                let t = self.a & self.x & ((self.addr_abs >> 8) as u8).wrapping_add(1);
                bus.write(self.addr_abs, t);
                false
            }
            Op::Shy => {
                let t = self.y & ((self.addr_abs >> 8) as u8).wrapping_add(1);
                bus.write(self.addr_abs, t);
                false
            }
            Op::Shx => {
                let t = self.x & ((self.addr_abs >> 8) as u8).wrapping_add(1);
                bus.write(self.addr_abs, t);
                false
            }
            Op::Tas => {
                self.sp = self.a & self.x;
                let t = self.a & self.x & ((self.addr_abs >> 8) as u8).wrapping_add(1);
                bus.write(self.addr_abs, t);
                false
            }
            Op::Las => {
                let f = self.fetch(bus);
                let t = f & self.sp;
                self.a = t;
                self.x = t;
                self.sp = t;
                self.set_zn(t);
                true
            }
            Op::Jam => {
                // Freeze: hold PC on this instruction. The rest of the
                // system keeps running.
                self.pc = self.pc.wrapping_sub(1);
                false
            }
        }
    }
}

impl Default for Cpu6502 {
    fn default() -> Self {
        Self::new()
    }
}

#[rustfmt::skip]
static DECODE_TABLE: [Instruction; 256] = [
    // 0x00
    i(Op::Brk, Am::Imm, 7), i(Op::Ora, Am::Izx, 6), i(Op::Jam, Am::Imp, 2), i(Op::Slo, Am::Izx, 8),
    i(Op::Nop, Am::Zp0, 3), i(Op::Ora, Am::Zp0, 3), i(Op::Asl, Am::Zp0, 5), i(Op::Slo, Am::Zp0, 5),
    i(Op::Php, Am::Imp, 3), i(Op::Ora, Am::Imm, 2), i(Op::Asl, Am::Imp, 2), i(Op::Anc, Am::Imm, 2),
    i(Op::Nop, Am::Abs, 4), i(Op::Ora, Am::Abs, 4), i(Op::Asl, Am::Abs, 6), i(Op::Slo, Am::Abs, 6),
    // 0x10
    i(Op::Bpl, Am::Rel, 2), i(Op::Ora, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Slo, Am::Izy, 8),
    i(Op::Nop, Am::Zpx, 4), i(Op::Ora, Am::Zpx, 4), i(Op::Asl, Am::Zpx, 6), i(Op::Slo, Am::Zpx, 6),
    i(Op::Clc, Am::Imp, 2), i(Op::Ora, Am::Aby, 4), i(Op::Nop, Am::Imp, 2), i(Op::Slo, Am::Aby, 7),
    i(Op::Nop, Am::Abx, 4), i(Op::Ora, Am::Abx, 4), i(Op::Asl, Am::Abx, 7), i(Op::Slo, Am::Abx, 7),
    // 0x20
    i(Op::Jsr, Am::Abs, 6), i(Op::And, Am::Izx, 6), i(Op::Jam, Am::Imp, 2), i(Op::Rla, Am::Izx, 8),
    i(Op::Bit, Am::Zp0, 3), i(Op::And, Am::Zp0, 3), i(Op::Rol, Am::Zp0, 5), i(Op::Rla, Am::Zp0, 5),
    i(Op::Plp, Am::Imp, 4), i(Op::And, Am::Imm, 2), i(Op::Rol, Am::Imp, 2), i(Op::Anc, Am::Imm, 2),
    i(Op::Bit, Am::Abs, 4), i(Op::And, Am::Abs, 4), i(Op::Rol, Am::Abs, 6), i(Op::Rla, Am::Abs, 6),
    // 0x30
    i(Op::Bmi, Am::Rel, 2), i(Op::And, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Rla, Am::Izy, 8),
    i(Op::Nop, Am::Zpx, 4), i(Op::And, Am::Zpx, 4), i(Op::Rol, Am::Zpx, 6), i(Op::Rla, Am::Zpx, 6),
    i(Op::Sec, Am::Imp, 2), i(Op::And, Am::Aby, 4), i(Op::Nop, Am::Imp, 2), i(Op::Rla, Am::Aby, 7),
    i(Op::Nop, Am::Abx, 4), i(Op::And, Am::Abx, 4), i(Op::Rol, Am::Abx, 7), i(Op::Rla, Am::Abx, 7),
    // 0x40
    i(Op::Rti, Am::Imp, 6), i(Op::Eor, Am::Izx, 6), i(Op::Jam, Am::Imp, 2), i(Op::Sre, Am::Izx, 8),
    i(Op::Nop, Am::Zp0, 3), i(Op::Eor, Am::Zp0, 3), i(Op::Lsr, Am::Zp0, 5), i(Op::Sre, Am::Zp0, 5),
    i(Op::Pha, Am::Imp, 3), i(Op::Eor, Am::Imm, 2), i(Op::Lsr, Am::Imp, 2), i(Op::Alr, Am::Imm, 2),
    i(Op::Jmp, Am::Abs, 3), i(Op::Eor, Am::Abs, 4), i(Op::Lsr, Am::Abs, 6), i(Op::Sre, Am::Abs, 6),
    // 0x50
    i(Op::Bvc, Am::Rel, 2), i(Op::Eor, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Sre, Am::Izy, 8),
    i(Op::Nop, Am::Zpx, 4), i(Op::Eor, Am::Zpx, 4), i(Op::Lsr, Am::Zpx, 6), i(Op::Sre, Am::Zpx, 6),
    i(Op::Cli, Am::Imp, 2), i(Op::Eor, Am::Aby, 4), i(Op::Nop, Am::Imp, 2), i(Op::Sre, Am::Aby, 7),
    i(Op::Nop, Am::Abx, 4), i(Op::Eor, Am::Abx, 4), i(Op::Lsr, Am::Abx, 7), i(Op::Sre, Am::Abx, 7),
    // 0x60
    i(Op::Rts, Am::Imp, 6), i(Op::Adc, Am::Izx, 6), i(Op::Jam, Am::Imp, 2), i(Op::Rra, Am::Izx, 8),
    i(Op::Nop, Am::Zp0, 3), i(Op::Adc, Am::Zp0, 3), i(Op::Ror, Am::Zp0, 5), i(Op::Rra, Am::Zp0, 5),
    i(Op::Pla, Am::Imp, 4), i(Op::Adc, Am::Imm, 2), i(Op::Ror, Am::Imp, 2), i(Op::Arr, Am::Imm, 2),
    i(Op::Jmp, Am::Ind, 5), i(Op::Adc, Am::Abs, 4), i(Op::Ror, Am::Abs, 6), i(Op::Rra, Am::Abs, 6),
    // 0x70
    i(Op::Bvs, Am::Rel, 2), i(Op::Adc, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Rra, Am::Izy, 8),
    i(Op::Nop, Am::Zpx, 4), i(Op::Adc, Am::Zpx, 4), i(Op::Ror, Am::Zpx, 6), i(Op::Rra, Am::Zpx, 6),
    i(Op::Sei, Am::Imp, 2), i(Op::Adc, Am::Aby, 4), i(Op::Nop, Am::Imp, 2), i(Op::Rra, Am::Aby, 7),
    i(Op::Nop, Am::Abx, 4), i(Op::Adc, Am::Abx, 4), i(Op::Ror, Am::Abx, 7), i(Op::Rra, Am::Abx, 7),
    // 0x80
    i(Op::Nop, Am::Imm, 2), i(Op::Sta, Am::Izx, 6), i(Op::Nop, Am::Imm, 2), i(Op::Sax, Am::Izx, 6),
    i(Op::Sty, Am::Zp0, 3), i(Op::Sta, Am::Zp0, 3), i(Op::Stx, Am::Zp0, 3), i(Op::Sax, Am::Zp0, 3),
    i(Op::Dey, Am::Imp, 2), i(Op::Nop, Am::Imm, 2), i(Op::Txa, Am::Imp, 2), i(Op::Xaa, Am::Imm, 2),
    i(Op::Sty, Am::Abs, 4), i(Op::Sta, Am::Abs, 4), i(Op::Stx, Am::Abs, 4), i(Op::Sax, Am::Abs, 4),
    // 0x90
    i(Op::Bcc, Am::Rel, 2), i(Op::Sta, Am::Izy, 6), i(Op::Jam, Am::Imp, 2), i(Op::Ahx, Am::Izy, 6),
    i(Op::Sty, Am::Zpx, 4), i(Op::Sta, Am::Zpx, 4), i(Op::Stx, Am::Zpy, 4), i(Op::Sax, Am::Zpy, 4),
    i(Op::Tya, Am::Imp, 2), i(Op::Sta, Am::Aby, 5), i(Op::Txs, Am::Imp, 2), i(Op::Tas, Am::Aby, 5),
    i(Op::Shy, Am::Abx, 5), i(Op::Sta, Am::Abx, 5), i(Op::Shx, Am::Aby, 5), i(Op::Ahx, Am::Aby, 5),
    // 0xA0
    i(Op::Ldy, Am::Imm, 2), i(Op::Lda, Am::Izx, 6), i(Op::Ldx, Am::Imm, 2), i(Op::Lax, Am::Izx, 6),
    i(Op::Ldy, Am::Zp0, 3), i(Op::Lda, Am::Zp0, 3), i(Op::Ldx, Am::Zp0, 3), i(Op::Lax, Am::Zp0, 3),
    i(Op::Tay, Am::Imp, 2), i(Op::Lda, Am::Imm, 2), i(Op::Tax, Am::Imp, 2), i(Op::Lax, Am::Imm, 2),
    i(Op::Ldy, Am::Abs, 4), i(Op::Lda, Am::Abs, 4), i(Op::Ldx, Am::Abs, 4), i(Op::Lax, Am::Abs, 4),
    // 0xB0
    i(Op::Bcs, Am::Rel, 2), i(Op::Lda, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Lax, Am::Izy, 5),
    i(Op::Ldy, Am::Zpx, 4), i(Op::Lda, Am::Zpx, 4), i(Op::Ldx, Am::Zpy, 4), i(Op::Lax, Am::Zpy, 4),
    i(Op::Clv, Am::Imp, 2), i(Op::Lda, Am::Aby, 4), i(Op::Tsx, Am::Imp, 2), i(Op::Las, Am::Aby, 4),
    i(Op::Ldy, Am::Abx, 4), i(Op::Lda, Am::Abx, 4), i(Op::Ldx, Am::Aby, 4), i(Op::Lax, Am::Aby, 4),
    // 0xC0
    i(Op::Cpy, Am::Imm, 2), i(Op::Cmp, Am::Izx, 6), i(Op::Nop, Am::Imm, 2), i(Op::Dcp, Am::Izx, 8),
    i(Op::Cpy, Am::Zp0, 3), i(Op::Cmp, Am::Zp0, 3), i(Op::Dec, Am::Zp0, 5), i(Op::Dcp, Am::Zp0, 5),
    i(Op::Iny, Am::Imp, 2), i(Op::Cmp, Am::Imm, 2), i(Op::Dex, Am::Imp, 2), i(Op::Axs, Am::Imm, 2),
    i(Op::Cpy, Am::Abs, 4), i(Op::Cmp, Am::Abs, 4), i(Op::Dec, Am::Abs, 6), i(Op::Dcp, Am::Abs, 6),
    // 0xD0
    i(Op::Bne, Am::Rel, 2), i(Op::Cmp, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Dcp, Am::Izy, 8),
    i(Op::Nop, Am::Zpx, 4), i(Op::Cmp, Am::Zpx, 4), i(Op::Dec, Am::Zpx, 6), i(Op::Dcp, Am::Zpx, 6),
    i(Op::Cld, Am::Imp, 2), i(Op::Cmp, Am::Aby, 4), i(Op::Nop, Am::Imp, 2), i(Op::Dcp, Am::Aby, 7),
    i(Op::Nop, Am::Abx, 4), i(Op::Cmp, Am::Abx, 4), i(Op::Dec, Am::Abx, 7), i(Op::Dcp, Am::Abx, 7),
    // 0xE0
    i(Op::Cpx, Am::Imm, 2), i(Op::Sbc, Am::Izx, 6), i(Op::Nop, Am::Imm, 2), i(Op::Isc, Am::Izx, 8),
    i(Op::Cpx, Am::Zp0, 3), i(Op::Sbc, Am::Zp0, 3), i(Op::Inc, Am::Zp0, 5), i(Op::Isc, Am::Zp0, 5),
    i(Op::Inx, Am::Imp, 2), i(Op::Sbc, Am::Imm, 2), i(Op::Nop, Am::Imp, 2), i(Op::Sbc, Am::Imm, 2),
    i(Op::Cpx, Am::Abs, 4), i(Op::Sbc, Am::Abs, 4), i(Op::Inc, Am::Abs, 6), i(Op::Isc, Am::Abs, 6),
    // 0xF0
    i(Op::Beq, Am::Rel, 2), i(Op::Sbc, Am::Izy, 5), i(Op::Jam, Am::Imp, 2), i(Op::Isc, Am::Izy, 8),
    i(Op::Nop, Am::Zpx, 4), i(Op::Sbc, Am::Zpx, 4), i(Op::Inc, Am::Zpx, 6), i(Op::Isc, Am::Zpx, 6),
    i(Op::Sed, Am::Imp, 2), i(Op::Sbc, Am::Aby, 4), i(Op::Nop, Am::Imp, 2), i(Op::Isc, Am::Aby, 7),
    i(Op::Nop, Am::Abx, 4), i(Op::Sbc, Am::Abx, 4), i(Op::Inc, Am::Abx, 7), i(Op::Isc, Am::Abx, 7),
];

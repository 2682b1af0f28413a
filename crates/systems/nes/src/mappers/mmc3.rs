//! Mapper 4 (MMC3/TxROM): 8 KiB PRG banking, fine-grained CHR banking and
//! the scanline IRQ counter.
//!
//! Register pairs sit at even/odd addresses in four $2000-wide windows:
//!
//! - $8000 even: bank select (target register, PRG mode bit 6, CHR
//!   inversion bit 7); $8000 odd: bank data
//! - $A000 even: mirroring; $A000 odd: PRG RAM protect (not modeled)
//! - $C000 even: IRQ latch; $C000 odd: IRQ reload request
//! - $E000 even: IRQ disable + acknowledge; $E000 odd: IRQ enable
//!
//! The IRQ counter is clocked once per rendered scanline (the PPU calls
//! `scanline()` at dot 260 while rendering is enabled, standing in for the
//! A12 rising-edge chain). On each clock: a pending reload or an expired
//! counter reloads from the latch, otherwise the counter decrements; if the
//! counter is zero after the operation and IRQs are enabled, the line is
//! asserted.

use crate::cartridge::Mirroring;

#[derive(Debug)]
pub struct Mmc3 {
    prg_banks: u16,
    chr_banks: u16,

    target_register: u8,
    bank_registers: [u8; 8],
    prg_mode: bool,
    chr_inversion: bool,
    /// Resolved 8 KiB PRG banks for $8000/$A000/$C000/$E000.
    prg_bank: [usize; 4],
    /// Resolved 1 KiB CHR banks for $0000-$1FFF.
    chr_bank: [usize; 8],

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_active: bool,

    mirroring: Mirroring,
}

impl Mmc3 {
    pub fn new(prg_banks: u16, chr_banks: u16) -> Self {
        let mut m = Self {
            prg_banks,
            chr_banks,
            target_register: 0,
            bank_registers: [0; 8],
            prg_mode: false,
            chr_inversion: false,
            prg_bank: [0; 4],
            chr_bank: [0; 8],
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_active: false,
            mirroring: Mirroring::Horizontal,
        };
        m.update_banks();
        m
    }

    pub fn reset(&mut self) {
        self.target_register = 0;
        self.bank_registers = [0; 8];
        self.prg_mode = false;
        self.chr_inversion = false;
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_active = false;
        self.mirroring = Mirroring::Horizontal;
        self.update_banks();
    }

    fn update_banks(&mut self) {
        let r = &self.bank_registers;

        if !self.chr_inversion {
            // R0/R1 cover $0000-$0FFF in 2 KiB pairs, R2-R5 cover
            // $1000-$1FFF in 1 KiB steps.
            self.chr_bank = [
                (r[0] & 0xFE) as usize,
                (r[0] | 0x01) as usize,
                (r[1] & 0xFE) as usize,
                (r[1] | 0x01) as usize,
                r[2] as usize,
                r[3] as usize,
                r[4] as usize,
                r[5] as usize,
            ];
        } else {
            self.chr_bank = [
                r[2] as usize,
                r[3] as usize,
                r[4] as usize,
                r[5] as usize,
                (r[0] & 0xFE) as usize,
                (r[0] | 0x01) as usize,
                (r[1] & 0xFE) as usize,
                (r[1] | 0x01) as usize,
            ];
        }

        let total = (self.prg_banks as usize * 2).max(1);
        let last = total - 1;
        let second_last = total.saturating_sub(2);
        let r6 = r[6] as usize;
        let r7 = r[7] as usize;

        self.prg_bank = if !self.prg_mode {
            // R6 at $8000, second-last fixed at $C000.
            [r6, r7, second_last, last]
        } else {
            // Swapped: second-last fixed at $8000, R6 at $C000.
            [second_last, r7, r6, last]
        };
    }

    pub fn cpu_read(&self, addr: u16, prg: &[u8], prg_ram: &[u8]) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(
                prg_ram
                    .get((addr & 0x1FFF) as usize)
                    .copied()
                    .unwrap_or(0),
            ),
            0x8000..=0xFFFF => {
                let slot = ((addr - 0x8000) / 0x2000) as usize;
                let total = (self.prg_banks as usize * 2).max(1);
                let bank = self.prg_bank[slot] % total;
                let mapped = bank * 0x2000 + (addr & 0x1FFF) as usize;
                Some(prg.get(mapped).copied().unwrap_or(0))
            }
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, val: u8, prg_ram: &mut [u8]) -> bool {
        match addr {
            0x6000..=0x7FFF => {
                if let Some(slot) = prg_ram.get_mut((addr & 0x1FFF) as usize) {
                    *slot = val;
                }
                true
            }
            0x8000..=0x9FFF => {
                if addr & 1 == 0 {
                    self.target_register = val & 0x07;
                    self.prg_mode = val & 0x40 != 0;
                    self.chr_inversion = val & 0x80 != 0;
                } else {
                    self.bank_registers[self.target_register as usize] = val;
                }
                self.update_banks();
                true
            }
            0xA000..=0xBFFF => {
                if addr & 1 == 0 {
                    self.mirroring = if val & 0x01 != 0 {
                        Mirroring::Horizontal
                    } else {
                        Mirroring::Vertical
                    };
                }
                // Odd: PRG RAM protect, not modeled.
                true
            }
            0xC000..=0xDFFF => {
                if addr & 1 == 0 {
                    self.irq_latch = val;
                } else {
                    // Reload request: counter clears now, reloads on the
                    // next scanline clock.
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
                true
            }
            0xE000..=0xFFFF => {
                if addr & 1 == 0 {
                    self.irq_enabled = false;
                    self.irq_active = false;
                } else {
                    self.irq_enabled = true;
                }
                true
            }
            _ => false,
        }
    }

    pub fn ppu_read(&self, addr: u16, chr: &[u8]) -> Option<u8> {
        if addr >= 0x2000 {
            return None;
        }
        let mapped = self.chr_mapped_addr(addr);
        Some(chr.get(mapped).copied().unwrap_or(0))
    }

    pub fn ppu_write(&mut self, addr: u16, val: u8, chr: &mut [u8], chr_writable: bool) -> bool {
        if addr < 0x2000 && chr_writable {
            let mapped = self.chr_mapped_addr(addr);
            if let Some(slot) = chr.get_mut(mapped) {
                *slot = val;
            }
            true
        } else {
            false
        }
    }

    fn chr_mapped_addr(&self, addr: u16) -> usize {
        let slot = (addr / 0x0400) as usize;
        let mut bank = self.chr_bank[slot];
        if self.chr_banks > 0 {
            bank %= self.chr_banks as usize * 8;
        }
        bank * 0x0400 + (addr & 0x03FF) as usize
    }

    /// Scanline clock for the IRQ counter.
    pub fn scanline(&mut self) {
        if self.irq_reload || self.irq_counter == 0 {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_active = true;
        }
    }

    pub fn irq_line(&self) -> bool {
        self.irq_active
    }

    pub fn irq_ack(&mut self) {
        self.irq_active = false;
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

//! Mapper 10 (MMC4, Fire Emblem): MMC2-style CHR latches with 16 KiB PRG
//! banking.
//!
//! Identical register file to the MMC2 ($A000 PRG, $B000-$E000 the four
//! CHR bank candidates, $F000 mirroring), but the PRG window at $8000 is
//! 16 KiB with the last bank fixed at $C000, and both CHR latches trigger
//! on address ranges.

use crate::cartridge::Mirroring;

#[derive(Debug)]
pub struct Mmc4 {
    prg_banks: u16,
    prg_bank: u8,
    chr_bank_0_fd: u8,
    chr_bank_0_fe: u8,
    chr_bank_1_fd: u8,
    chr_bank_1_fe: u8,
    latch_0: u8,
    latch_1: u8,
    mirroring: Mirroring,
}

impl Mmc4 {
    pub fn new(prg_banks: u16, _chr_banks: u16) -> Self {
        Self {
            prg_banks,
            prg_bank: 0,
            chr_bank_0_fd: 0,
            chr_bank_0_fe: 0,
            chr_bank_1_fd: 0,
            chr_bank_1_fe: 0,
            latch_0: 0xFE,
            latch_1: 0xFE,
            mirroring: Mirroring::Vertical,
        }
    }

    pub fn reset(&mut self) {
        self.prg_bank = 0;
        self.chr_bank_0_fd = 0;
        self.chr_bank_0_fe = 0;
        self.chr_bank_1_fd = 0;
        self.chr_bank_1_fe = 0;
        self.latch_0 = 0xFE;
        self.latch_1 = 0xFE;
        self.mirroring = Mirroring::Vertical;
    }

    pub fn cpu_read(&self, addr: u16, prg: &[u8]) -> Option<u8> {
        match addr {
            0x8000..=0xBFFF => {
                let mapped = self.prg_bank as usize * 0x4000 + (addr & 0x3FFF) as usize;
                Some(prg.get(mapped).copied().unwrap_or(0))
            }
            0xC000..=0xFFFF => {
                let last = self.prg_banks.saturating_sub(1) as usize;
                let mapped = last * 0x4000 + (addr & 0x3FFF) as usize;
                Some(prg.get(mapped).copied().unwrap_or(0))
            }
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, val: u8) -> bool {
        match addr {
            0xA000..=0xAFFF => {
                self.prg_bank = val & 0x0F;
                true
            }
            0xB000..=0xBFFF => {
                self.chr_bank_0_fd = val & 0x1F;
                true
            }
            0xC000..=0xCFFF => {
                self.chr_bank_0_fe = val & 0x1F;
                true
            }
            0xD000..=0xDFFF => {
                self.chr_bank_1_fd = val & 0x1F;
                true
            }
            0xE000..=0xEFFF => {
                self.chr_bank_1_fe = val & 0x1F;
                true
            }
            0xF000..=0xFFFF => {
                self.mirroring = if val & 0x01 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
                true
            }
            _ => false,
        }
    }

    pub fn ppu_read(&mut self, addr: u16, chr: &[u8]) -> Option<u8> {
        match addr {
            0x0000..=0x0FFF => {
                let bank = if self.latch_0 == 0xFD {
                    self.chr_bank_0_fd
                } else {
                    self.chr_bank_0_fe
                };
                let mapped = bank as usize * 0x1000 + (addr & 0x0FFF) as usize;
                let data = chr.get(mapped).copied().unwrap_or(0);
                match addr {
                    0x0FD8..=0x0FDF => self.latch_0 = 0xFD,
                    0x0FE8..=0x0FEF => self.latch_0 = 0xFE,
                    _ => {}
                }
                Some(data)
            }
            0x1000..=0x1FFF => {
                let bank = if self.latch_1 == 0xFD {
                    self.chr_bank_1_fd
                } else {
                    self.chr_bank_1_fe
                };
                let mapped = bank as usize * 0x1000 + (addr & 0x0FFF) as usize;
                let data = chr.get(mapped).copied().unwrap_or(0);
                match addr {
                    0x1FD8..=0x1FDF => self.latch_1 = 0xFD,
                    0x1FE8..=0x1FEF => self.latch_1 = 0xFE,
                    _ => {}
                }
                Some(data)
            }
            _ => None,
        }
    }

    pub fn ppu_write(&mut self, _addr: u16, _val: u8, _chr: &mut [u8], _writable: bool) -> bool {
        false
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prg_switchable_low_fixed_high() {
        let mut prg = vec![0u8; 4 * 0x4000];
        prg[0x4000] = 0x22;
        prg[0xC000] = 0x44;
        let mut m = Mmc4::new(4, 2);

        m.cpu_write(0xA000, 1);
        assert_eq!(m.cpu_read(0x8000, &prg), Some(0x22));
        assert_eq!(m.cpu_read(0xC000, &prg), Some(0x44));
    }

    #[test]
    fn low_half_latch_uses_range() {
        let mut chr = vec![0u8; 4 * 0x1000];
        chr[0x0000] = 0xFE;
        chr[0x1000] = 0xFD;
        let mut m = Mmc4::new(4, 2);
        m.cpu_write(0xB000, 1);
        m.cpu_write(0xC000, 0);

        assert_eq!(m.ppu_read(0x0000, &chr), Some(0xFE));
        // Unlike the MMC2, any fetch in $0FD8-$0FDF flips the latch.
        m.ppu_read(0x0FDB, &chr);
        assert_eq!(m.ppu_read(0x0000, &chr), Some(0xFD));
    }

    #[test]
    fn mirroring_register() {
        let mut m = Mmc4::new(2, 1);
        m.cpu_write(0xF000, 1);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
        m.cpu_write(0xF000, 0);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }
}

//! Mapper 9 (MMC2, Punch-Out!!): latch-based CHR switching.
//!
//! Each 4 KiB pattern-table half has two candidate banks ($FD and $FE) and
//! a latch that flips when the PPU fetches particular tiles: the low-half
//! latch on reads of exactly $0FD8/$0FE8, the high-half latch on reads in
//! $1FD8-$1FDF / $1FE8-$1FEF. PRG is a single switchable 8 KiB bank at
//! $8000 with the last three 8 KiB banks fixed above it.

use crate::cartridge::Mirroring;

#[derive(Debug)]
pub struct Mmc2 {
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

impl Mmc2 {
    pub fn new(prg_banks: u16, _chr_banks: u16) -> Self {
        let mut m = Self {
            prg_banks,
            prg_bank: 0,
            chr_bank_0_fd: 0,
            chr_bank_0_fe: 0,
            chr_bank_1_fd: 0,
            chr_bank_1_fe: 0,
            latch_0: 0xFE,
            latch_1: 0xFE,
            mirroring: Mirroring::Vertical,
        };
        m.reset();
        m
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
        if addr < 0x8000 {
            return None;
        }
        let total = (self.prg_banks as usize * 2).max(1);
        let mapped = if addr < 0xA000 {
            // Switchable 8 KiB bank.
            (self.prg_bank as usize % total) * 0x2000 + (addr & 0x1FFF) as usize
        } else {
            // Last three 8 KiB banks fixed at $A000/$C000/$E000.
            let slot = ((addr - 0xA000) / 0x2000) as usize;
            let bank = total.saturating_sub(3) + slot;
            bank * 0x2000 + (addr & 0x1FFF) as usize
        };
        Some(prg.get(mapped).copied().unwrap_or(0))
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
                // Latch flips after the fetch completes.
                match addr {
                    0x0FD8 => self.latch_0 = 0xFD,
                    0x0FE8 => self.latch_0 = 0xFE,
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
    fn prg_window_fixes_last_three_banks() {
        // 8 x 8 KiB banks (4 x 16 KiB).
        let mut prg = vec![0u8; 0x10000];
        prg[0x0000] = 0x10;
        prg[0x2000] = 0x11;
        prg[0xA000] = 0x15; // bank 5
        prg[0xC000] = 0x16; // bank 6
        prg[0xE000] = 0x17; // bank 7
        let mut m = Mmc2::new(4, 2);

        assert_eq!(m.cpu_read(0x8000, &prg), Some(0x10));
        assert_eq!(m.cpu_read(0xA000, &prg), Some(0x15));
        assert_eq!(m.cpu_read(0xC000, &prg), Some(0x16));
        assert_eq!(m.cpu_read(0xE000, &prg), Some(0x17));

        m.cpu_write(0xA000, 1);
        assert_eq!(m.cpu_read(0x8000, &prg), Some(0x11));
    }

    #[test]
    fn latch_0_flips_on_exact_tile_fetches() {
        let mut chr = vec![0u8; 4 * 0x1000];
        chr[0x0000] = 0xFE; // bank 0 (the $FE selection)
        chr[0x1000] = 0xFD; // bank 1 (the $FD selection)
        let mut m = Mmc2::new(4, 2);
        m.cpu_write(0xB000, 1); // $FD bank
        m.cpu_write(0xC000, 0); // $FE bank

        // Power-on latch is $FE.
        assert_eq!(m.ppu_read(0x0000, &chr), Some(0xFE));
        // Fetching $0FD8 flips the latch to $FD...
        m.ppu_read(0x0FD8, &chr);
        assert_eq!(m.ppu_read(0x0000, &chr), Some(0xFD));
        // ...and $0FE8 flips it back.
        m.ppu_read(0x0FE8, &chr);
        assert_eq!(m.ppu_read(0x0000, &chr), Some(0xFE));
    }

    #[test]
    fn latch_1_flips_on_address_ranges() {
        let mut chr = vec![0u8; 4 * 0x1000];
        chr[0x2000] = 0xEE; // bank 2
        chr[0x3000] = 0xDD; // bank 3
        let mut m = Mmc2::new(4, 2);
        m.cpu_write(0xD000, 3); // $FD bank
        m.cpu_write(0xE000, 2); // $FE bank

        assert_eq!(m.ppu_read(0x1000, &chr), Some(0xEE));
        m.ppu_read(0x1FDC, &chr); // anywhere in $1FD8-$1FDF
        assert_eq!(m.ppu_read(0x1000, &chr), Some(0xDD));
        m.ppu_read(0x1FEB, &chr);
        assert_eq!(m.ppu_read(0x1000, &chr), Some(0xEE));
    }
}

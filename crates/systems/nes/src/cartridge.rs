//! Cartridge: iNES parsing, PRG/CHR storage ownership, mapper front-end.

use crate::mappers::Mapper;
use ricoh_core::logging::{log, LogCategory, LogLevel};
use std::path::Path;
use thiserror::Error;

/// How the four logical nametables collapse into the 2 KiB internal VRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
    FourScreen,
}

/// Errors from the ROM loader. Everything past loading is total: unmapped
/// reads return zero and writes to read-only regions are dropped.
#[derive(Debug, Error)]
pub enum RomError {
    #[error("not an iNES image (missing NES\\x1A magic)")]
    BadMagic,
    #[error("buffer too small for a 16-byte iNES header ({len} bytes)")]
    TooSmall { len: usize },
    #[error("PRG ROM truncated: header declares {declared} bytes, {available} available")]
    TruncatedPrg { declared: usize, available: usize },
    #[error("CHR ROM truncated: header declares {declared} bytes, {available} available")]
    TruncatedChr { declared: usize, available: usize },
    #[error("unsupported mapper {0}, falling back to NROM")]
    UnsupportedMapper(u16),
    #[error("failed to read ROM file: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed cartridge. Owns the PRG/CHR storage and PRG RAM for its
/// lifetime; the mapper owns all bank-switching state and translates every
/// access.
#[derive(Debug)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    /// CHR ROM, or 8 KiB of CHR RAM when the header declares zero banks.
    chr: Vec<u8>,
    chr_writable: bool,
    prg_ram: Vec<u8>,
    battery: bool,
    mapper_id: u16,
    header_mirroring: Mirroring,
    mapper: Mapper,
}

impl Cartridge {
    /// Parse an iNES (or NES 2.0) image from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < 16 {
            return Err(RomError::TooSmall { len: data.len() });
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(RomError::BadMagic);
        }

        let is_nes2 = (data[7] & 0x0C) == 0x08;

        // Classic iNES headers are often tagged by old tools in bytes
        // 12..15 ("DiskDude!" and friends); the flags7 mapper nibble is
        // garbage in that case.
        let dirty_header = !is_nes2 && data[12..16].iter().any(|&b| b != 0);
        if dirty_header {
            log(LogCategory::Cartridge, LogLevel::Warn, || {
                "dirty iNES header (bytes 12..15 non-zero), ignoring flags7 mapper bits"
                    .to_string()
            });
        }

        let (prg_banks, chr_banks, mapper_id) = if is_nes2 {
            Self::parse_nes2_sizes(data)
        } else {
            let lo = (data[6] >> 4) as u16;
            let hi = if dirty_header {
                0
            } else {
                (data[7] >> 4) as u16
            };
            (data[4] as u16, data[5] as u16, lo | (hi << 4))
        };

        let header_mirroring = if data[6] & 0x08 != 0 {
            Mirroring::FourScreen
        } else if data[6] & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let battery = data[6] & 0x02 != 0;

        let mut offset = 16;
        if data[6] & 0x04 != 0 {
            // 512-byte trainer, skipped.
            offset += 512;
        }

        let prg_size = prg_banks as usize * 16 * 1024;
        if offset + prg_size > data.len() {
            return Err(RomError::TruncatedPrg {
                declared: prg_size,
                available: data.len().saturating_sub(offset),
            });
        }
        let prg_rom = data[offset..offset + prg_size].to_vec();
        offset += prg_size;

        let (chr, chr_writable) = if chr_banks == 0 {
            (vec![0u8; 8 * 1024], true)
        } else {
            let declared = chr_banks as usize * 8 * 1024;
            let available = data.len() - offset;
            let chr_size = if declared > available {
                // Truncated CHR is recoverable: load what is present.
                log(LogCategory::Cartridge, LogLevel::Warn, || {
                    RomError::TruncatedChr {
                        declared,
                        available,
                    }
                    .to_string()
                });
                available
            } else {
                declared
            };
            (data[offset..offset + chr_size].to_vec(), false)
        };

        let mapper = Mapper::from_id(mapper_id, prg_banks, chr_banks).unwrap_or_else(|| {
            log(LogCategory::Cartridge, LogLevel::Warn, || {
                RomError::UnsupportedMapper(mapper_id).to_string()
            });
            Mapper::Nrom(crate::mappers::Nrom::new(prg_banks, chr_banks))
        });

        log(LogCategory::Cartridge, LogLevel::Info, || {
            format!(
                "loaded cartridge: mapper {} ({} KiB PRG, {} KiB CHR {}, {:?})",
                mapper_id,
                prg_rom.len() / 1024,
                chr.len() / 1024,
                if chr_writable { "RAM" } else { "ROM" },
                header_mirroring,
            )
        });

        Ok(Self {
            prg_rom,
            chr,
            chr_writable,
            prg_ram: vec![0u8; 8 * 1024],
            battery,
            mapper_id,
            header_mirroring,
            mapper,
        })
    }

    /// Convenience wrapper around [`Cartridge::from_bytes`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// NES 2.0 size fields: 12-bit mapper, bank counts with the optional
    /// exponent-multiplier notation.
    fn parse_nes2_sizes(data: &[u8]) -> (u16, u16, u16) {
        let prg_msb = (data[9] & 0x0F) as u16;
        let prg_banks = if prg_msb == 0x0F {
            let exponent = (data[4] >> 2) & 0x3F;
            let multiplier = (data[4] & 0x03) as u64;
            ((1u64 << exponent) * (multiplier * 2 + 1) / 16384) as u16
        } else {
            data[4] as u16 | (prg_msb << 8)
        };

        let chr_msb = ((data[9] >> 4) & 0x0F) as u16;
        let chr_banks = if chr_msb == 0x0F {
            let exponent = (data[5] >> 2) & 0x3F;
            let multiplier = (data[5] & 0x03) as u64;
            ((1u64 << exponent) * (multiplier * 2 + 1) / 8192) as u16
        } else {
            data[5] as u16 | (chr_msb << 8)
        };

        let mapper_id =
            (data[6] >> 4) as u16 | (((data[7] >> 4) as u16) << 4) | (((data[8] & 0x0F) as u16) << 8);

        (prg_banks, chr_banks, mapper_id)
    }

    /// CPU-space access ($4020-$FFFF is delegated here by the bus).
    /// `None` means the access fell through to open bus.
    pub fn cpu_read(&mut self, addr: u16) -> Option<u8> {
        self.mapper.cpu_read(addr, &self.prg_rom, &self.prg_ram)
    }

    /// Returns whether the mapper consumed the write.
    pub fn cpu_write(&mut self, addr: u16, val: u8) -> bool {
        self.mapper.cpu_write(addr, val, &mut self.prg_ram)
    }

    /// PPU-space access ($0000-$1FFF pattern tables).
    pub fn ppu_read(&mut self, addr: u16) -> Option<u8> {
        self.mapper.ppu_read(addr, &self.chr)
    }

    pub fn ppu_write(&mut self, addr: u16, val: u8) -> bool {
        self.mapper
            .ppu_write(addr, val, &mut self.chr, self.chr_writable)
    }

    /// Effective mirroring: the mapper's override when it has one, the
    /// header's nominal mode otherwise.
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring().unwrap_or(self.header_mirroring)
    }

    /// Mapper IRQ line state.
    pub fn irq_line(&self) -> bool {
        self.mapper.irq_line()
    }

    /// Acknowledge (clear) the mapper IRQ line.
    pub fn irq_ack(&mut self) {
        self.mapper.irq_ack();
    }

    /// Scanline notification from the PPU (dot 260 of each visible
    /// scanline while rendering is enabled).
    pub fn scanline(&mut self) {
        self.mapper.scanline();
    }

    /// Reset mapper state; storage contents are preserved.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }

    pub fn mapper_id(&self) -> u16 {
        self.mapper_id
    }

    pub fn has_battery(&self) -> bool {
        self.battery
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_rom(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"NES\x1A");
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = flags6;
        data[7] = flags7;
        data.resize(
            16 + prg_banks as usize * 16384 + chr_banks as usize * 8192,
            0,
        );
        data
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = build_rom(1, 1, 0, 0);
        data[0] = b'X';
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(RomError::BadMagic)
        ));
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            Cartridge::from_bytes(&[0x4E, 0x45, 0x53]),
            Err(RomError::TooSmall { len: 3 })
        ));
    }

    #[test]
    fn rejects_truncated_prg() {
        let mut data = build_rom(2, 0, 0, 0);
        data.truncate(16 + 16384); // half the declared PRG
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(RomError::TruncatedPrg { .. })
        ));
    }

    #[test]
    fn accepts_truncated_chr_with_what_is_present() {
        let mut data = build_rom(1, 2, 0, 0);
        data.truncate(16 + 16384 + 8192);
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.chr.len(), 8192);
    }

    #[test]
    fn zero_chr_banks_allocates_chr_ram() {
        let data = build_rom(1, 0, 0, 0);
        let mut cart = Cartridge::from_bytes(&data).unwrap();
        assert!(cart.ppu_write(0x0123, 0xAB));
        assert_eq!(cart.ppu_read(0x0123), Some(0xAB));
    }

    #[test]
    fn mirroring_flags() {
        let cart = Cartridge::from_bytes(&build_rom(1, 1, 0x00, 0)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        let cart = Cartridge::from_bytes(&build_rom(1, 1, 0x01, 0)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        // Four-screen overrides bit 0.
        let cart = Cartridge::from_bytes(&build_rom(1, 1, 0x09, 0)).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn dirty_header_ignores_flags7_mapper_bits() {
        let mut data = build_rom(1, 1, 0x10, 0x40); // mapper low 1, high 4
        data[12..16].copy_from_slice(b"Dude");
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.mapper_id(), 1);
    }

    #[test]
    fn trainer_is_skipped() {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"NES\x1A");
        data[4] = 1;
        data[5] = 0;
        data[6] = 0x04; // trainer present
        data.resize(16 + 512 + 16384, 0);
        data[16 + 512] = 0x77; // first PRG byte, after the trainer
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.prg_rom()[0], 0x77);
    }

    #[test]
    fn unsupported_mapper_falls_back_to_nrom() {
        let data = build_rom(1, 1, 0xF0, 0xF0); // mapper 255
        let mut cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.mapper_id(), 255);
        // NROM semantics: 16 KiB PRG mirrored across $8000-$FFFF.
        assert_eq!(cart.cpu_read(0x8000), cart.cpu_read(0xC000));
    }

    #[test]
    fn nes2_header_parses_extended_mapper() {
        let mut data = build_rom(1, 1, 0x00, 0x08);
        data[8] = 0x01; // mapper bits 8..11 = 1 -> mapper 256 (unsupported)
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.mapper_id(), 256);
    }
}

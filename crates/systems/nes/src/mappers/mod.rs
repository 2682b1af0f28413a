//! NES mapper implementations.
//!
//! Mappers multiplex a cartridge's ROM (and optional peripherals) into the
//! console's fixed address windows. Every variant exposes the same
//! capability set; `Some`/`true` from an access means the mapper consumed
//! it and the bus must not fall through to its own decoding.

mod axrom;
mod camerica;
mod cnrom;
mod colordreams;
mod gxrom;
mod mmc1;
mod mmc2;
mod mmc3;
mod mmc4;
mod namco108;
mod nrom;
mod uxrom;

pub use axrom::Axrom;
pub use camerica::Camerica;
pub use cnrom::Cnrom;
pub use colordreams::ColorDreams;
pub use gxrom::Gxrom;
pub use mmc1::Mmc1;
pub use mmc2::Mmc2;
pub use mmc3::Mmc3;
pub use mmc4::Mmc4;
pub use namco108::Namco108;
pub use nrom::Nrom;
pub use uxrom::Uxrom;

use crate::cartridge::Mirroring;

/// Unified mapper enum dispatching to the specific implementations.
#[derive(Debug)]
pub enum Mapper {
    Nrom(Nrom),
    Mmc1(Mmc1),
    Uxrom(Uxrom),
    Cnrom(Cnrom),
    Mmc3(Mmc3),
    Axrom(Axrom),
    Mmc2(Mmc2),
    Mmc4(Mmc4),
    ColorDreams(ColorDreams),
    Gxrom(Gxrom),
    Camerica(Camerica),
    Namco108(Namco108),
}

impl Mapper {
    /// Construct the mapper for an iNES mapper ID. `None` when the ID is
    /// outside the supported set.
    pub fn from_id(id: u16, prg_banks: u16, chr_banks: u16) -> Option<Self> {
        match id {
            0 => Some(Mapper::Nrom(Nrom::new(prg_banks, chr_banks))),
            1 => Some(Mapper::Mmc1(Mmc1::new(prg_banks, chr_banks))),
            2 => Some(Mapper::Uxrom(Uxrom::new(prg_banks, chr_banks))),
            3 => Some(Mapper::Cnrom(Cnrom::new(prg_banks, chr_banks))),
            4 => Some(Mapper::Mmc3(Mmc3::new(prg_banks, chr_banks))),
            7 => Some(Mapper::Axrom(Axrom::new(prg_banks, chr_banks))),
            9 => Some(Mapper::Mmc2(Mmc2::new(prg_banks, chr_banks))),
            10 => Some(Mapper::Mmc4(Mmc4::new(prg_banks, chr_banks))),
            11 => Some(Mapper::ColorDreams(ColorDreams::new(prg_banks, chr_banks))),
            66 => Some(Mapper::Gxrom(Gxrom::new(prg_banks, chr_banks))),
            71 => Some(Mapper::Camerica(Camerica::new(prg_banks, chr_banks))),
            206 => Some(Mapper::Namco108(Namco108::new(prg_banks, chr_banks))),
            _ => None,
        }
    }

    /// Read from CPU address space. `None` means the access is not for the
    /// cartridge.
    pub fn cpu_read(&self, addr: u16, prg: &[u8], prg_ram: &[u8]) -> Option<u8> {
        match self {
            Mapper::Nrom(m) => m.cpu_read(addr, prg),
            Mapper::Mmc1(m) => m.cpu_read(addr, prg, prg_ram),
            Mapper::Uxrom(m) => m.cpu_read(addr, prg),
            Mapper::Cnrom(m) => m.cpu_read(addr, prg),
            Mapper::Mmc3(m) => m.cpu_read(addr, prg, prg_ram),
            Mapper::Axrom(m) => m.cpu_read(addr, prg),
            Mapper::Mmc2(m) => m.cpu_read(addr, prg),
            Mapper::Mmc4(m) => m.cpu_read(addr, prg),
            Mapper::ColorDreams(m) => m.cpu_read(addr, prg),
            Mapper::Gxrom(m) => m.cpu_read(addr, prg),
            Mapper::Camerica(m) => m.cpu_read(addr, prg),
            Mapper::Namco108(m) => m.cpu_read(addr, prg),
        }
    }

    /// Write to CPU address space (bank-switch registers, PRG RAM).
    /// Returns whether the mapper consumed the write.
    pub fn cpu_write(&mut self, addr: u16, val: u8, prg_ram: &mut [u8]) -> bool {
        match self {
            Mapper::Nrom(m) => m.cpu_write(addr, val),
            Mapper::Mmc1(m) => m.cpu_write(addr, val, prg_ram),
            Mapper::Uxrom(m) => m.cpu_write(addr, val),
            Mapper::Cnrom(m) => m.cpu_write(addr, val),
            Mapper::Mmc3(m) => m.cpu_write(addr, val, prg_ram),
            Mapper::Axrom(m) => m.cpu_write(addr, val),
            Mapper::Mmc2(m) => m.cpu_write(addr, val),
            Mapper::Mmc4(m) => m.cpu_write(addr, val),
            Mapper::ColorDreams(m) => m.cpu_write(addr, val),
            Mapper::Gxrom(m) => m.cpu_write(addr, val),
            Mapper::Camerica(m) => m.cpu_write(addr, val),
            Mapper::Namco108(m) => m.cpu_write(addr, val),
        }
    }

    /// Read from PPU address space (pattern tables). Takes `&mut self`
    /// because the MMC2/MMC4 CHR latches switch on specific fetches.
    pub fn ppu_read(&mut self, addr: u16, chr: &[u8]) -> Option<u8> {
        match self {
            Mapper::Nrom(m) => m.ppu_read(addr, chr),
            Mapper::Mmc1(m) => m.ppu_read(addr, chr),
            Mapper::Uxrom(m) => m.ppu_read(addr, chr),
            Mapper::Cnrom(m) => m.ppu_read(addr, chr),
            Mapper::Mmc3(m) => m.ppu_read(addr, chr),
            Mapper::Axrom(m) => m.ppu_read(addr, chr),
            Mapper::Mmc2(m) => m.ppu_read(addr, chr),
            Mapper::Mmc4(m) => m.ppu_read(addr, chr),
            Mapper::ColorDreams(m) => m.ppu_read(addr, chr),
            Mapper::Gxrom(m) => m.ppu_read(addr, chr),
            Mapper::Camerica(m) => m.ppu_read(addr, chr),
            Mapper::Namco108(m) => m.ppu_read(addr, chr),
        }
    }

    /// Write to PPU address space. Only meaningful for CHR RAM carts.
    pub fn ppu_write(&mut self, addr: u16, val: u8, chr: &mut [u8], chr_writable: bool) -> bool {
        match self {
            Mapper::Nrom(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Mmc1(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Uxrom(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Cnrom(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Mmc3(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Axrom(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Mmc2(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Mmc4(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::ColorDreams(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Gxrom(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Camerica(m) => m.ppu_write(addr, val, chr, chr_writable),
            Mapper::Namco108(m) => m.ppu_write(addr, val, chr, chr_writable),
        }
    }

    /// Reset mapper registers to power-on state.
    pub fn reset(&mut self) {
        match self {
            Mapper::Nrom(_) => {}
            Mapper::Mmc1(m) => m.reset(),
            Mapper::Uxrom(m) => m.reset(),
            Mapper::Cnrom(m) => m.reset(),
            Mapper::Mmc3(m) => m.reset(),
            Mapper::Axrom(m) => m.reset(),
            Mapper::Mmc2(m) => m.reset(),
            Mapper::Mmc4(m) => m.reset(),
            Mapper::ColorDreams(m) => m.reset(),
            Mapper::Gxrom(m) => m.reset(),
            Mapper::Camerica(m) => m.reset(),
            Mapper::Namco108(m) => m.reset(),
        }
    }

    /// Mirroring override; `None` defers to the header's nominal mode.
    pub fn mirroring(&self) -> Option<Mirroring> {
        match self {
            Mapper::Mmc1(m) => Some(m.mirroring()),
            Mapper::Mmc3(m) => Some(m.mirroring()),
            Mapper::Axrom(m) => Some(m.mirroring()),
            Mapper::Mmc2(m) => Some(m.mirroring()),
            Mapper::Mmc4(m) => Some(m.mirroring()),
            Mapper::Camerica(m) => Some(m.mirroring()),
            _ => None,
        }
    }

    /// IRQ line state; only the MMC3 drives it.
    pub fn irq_line(&self) -> bool {
        match self {
            Mapper::Mmc3(m) => m.irq_line(),
            _ => false,
        }
    }

    /// Acknowledge the IRQ line.
    pub fn irq_ack(&mut self) {
        if let Mapper::Mmc3(m) = self {
            m.irq_ack();
        }
    }

    /// End-of-scanline notification, the accepted abstraction of the MMC3
    /// A12 rising-edge counter.
    pub fn scanline(&mut self) {
        if let Mapper::Mmc3(m) = self {
            m.scanline();
        }
    }
}

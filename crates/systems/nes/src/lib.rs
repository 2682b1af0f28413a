//! Cycle-accurate NES (Ricoh 2A03/2C02) system.
//!
//! The system owns the CPU and the bus; the bus owns the PPU, APU and
//! cartridge. One [`NesSystem::clock`] call advances the machine by one
//! PPU dot (the CPU and APU step on every third dot). Hosts typically run
//! [`NesSystem::step_frame`] per display frame, feed controller state per
//! frame, and pull audio samples at their own rate.

mod apu;
mod bus;
mod cartridge;
mod mappers;
mod ppu;

pub use apu::Apu;
pub use bus::Bus;
pub use cartridge::{Cartridge, Mirroring, RomError};
pub use mappers::Mapper;
pub use ppu::{Ppu, NES_PALETTE, SCREEN_HEIGHT, SCREEN_WIDTH};

use ricoh_core::cpu_6502::Cpu6502;
use ricoh_core::types::Frame;
use ricoh_core::System;

#[derive(Debug)]
pub struct NesSystem {
    cpu: Cpu6502,
    bus: Bus,
}

impl NesSystem {
    pub fn new() -> Self {
        Self {
            cpu: Cpu6502::new(),
            bus: Bus::new(),
        }
    }

    /// Parse a ROM image and insert it, then reset to power-on state.
    pub fn load_rom_bytes(&mut self, data: &[u8]) -> Result<(), RomError> {
        let cart = Cartridge::from_bytes(data)?;
        self.insert_cartridge(cart);
        Ok(())
    }

    /// Insert an already-parsed cartridge and reset.
    pub fn insert_cartridge(&mut self, cart: Cartridge) {
        self.bus.insert_cartridge(cart);
        self.bus.reset(&mut self.cpu);
    }

    /// Advance the machine one master clock (one PPU dot).
    pub fn clock(&mut self) {
        self.bus.clock(&mut self.cpu);
    }

    /// True exactly once per completed frame.
    pub fn frame_complete(&mut self) -> bool {
        self.bus.ppu.frame_complete()
    }

    /// The current framebuffer: 256x240 packed RGB triples, row-major.
    /// Valid after `frame_complete()` has reported true.
    pub fn screen(&self) -> &[u8] {
        self.bus.ppu.screen()
    }

    /// Set controller button state (bit 7 = A ... bit 0 = Right).
    pub fn set_controller(&mut self, idx: usize, state: u8) {
        self.bus.set_controller(idx, state);
    }

    /// Current mixed audio sample. Stateful across calls; pull at the
    /// host's output rate.
    pub fn audio_sample(&mut self) -> f32 {
        self.bus.apu.output_sample()
    }

    /// Direct CPU bus access, mainly for tests and tooling.
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        self.bus.cpu_read(addr)
    }

    pub fn cpu_write(&mut self, addr: u16, val: u8) {
        self.bus.cpu_write(addr, val)
    }

    pub fn cpu(&self) -> &Cpu6502 {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Execution snapshot for host-side debugging tools.
    pub fn debug_state(&self) -> serde_json::Value {
        let (nmi_vec, reset_vec, irq_vec) = self
            .bus
            .cartridge()
            .map(|cart| {
                let cart = cart.borrow();
                let prg = cart.prg_rom();
                let base = if prg.len() == 0x4000 { 0x0000 } else { prg.len().saturating_sub(0x4000) };
                let vec_at = |off: usize| -> u16 {
                    if prg.len() >= base + off + 2 {
                        prg[base + off] as u16 | ((prg[base + off + 1] as u16) << 8)
                    } else {
                        0
                    }
                };
                (vec_at(0x3FFA), vec_at(0x3FFC), vec_at(0x3FFE))
            })
            .unwrap_or((0, 0, 0));

        serde_json::json!({
            "cpu": {
                "pc": self.cpu.pc,
                "a": self.cpu.a,
                "x": self.cpu.x,
                "y": self.cpu.y,
                "sp": self.cpu.sp,
                "p": self.cpu.p,
                "cycles": self.cpu.cycles,
            },
            "ppu": {
                "ctrl": self.bus.ppu.control_bits(),
                "mask": self.bus.ppu.mask_bits(),
                "vram_addr": self.bus.ppu.vram_addr_raw(),
                "nmi_enabled": (self.bus.ppu.control_bits() & 0x80) != 0,
                "rendering_enabled": (self.bus.ppu.mask_bits() & 0x18) != 0,
            },
            "vectors": {
                "nmi": nmi_vec,
                "reset": reset_vec,
                "irq": irq_vec,
            },
        })
    }

    fn run_frame(&mut self) {
        loop {
            self.clock();
            if self.bus.ppu.frame_complete() {
                break;
            }
        }
    }
}

impl Default for NesSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for NesSystem {
    fn reset(&mut self) {
        self.bus.reset(&mut self.cpu);
    }

    fn step_frame(&mut self) -> Frame {
        self.run_frame();
        Frame::from_rgb(
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
            self.bus.ppu.screen(),
        )
    }
}

//! System bus: work RAM, controller ports, OAM DMA, and the master clock
//! interleave.
//!
//! The bus owns the PPU, APU and cartridge; the CPU is passed into
//! `clock()` by the system so components never hold back-pointers. One
//! `clock()` call is one PPU dot; every third call steps the CPU (or the
//! DMA engine while a transfer is in flight) and the APU, then interrupt
//! lines are sampled: the PPU's NMI edge, the mapper IRQ line, and the
//! APU's frame/DMC IRQs.

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::ppu::Ppu;
use ricoh_core::cpu_6502::{Cpu6502, Memory6502};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub struct Bus {
    ram: [u8; 0x0800],
    pub ppu: Ppu,
    pub apu: Apu,
    cart: Option<Rc<RefCell<Cartridge>>>,

    controller_state: [u8; 2],
    controller_shift: [u8; 2],

    dma_active: bool,
    dma_page: u8,
    dma_index: u8,
    dma_data: u8,
    dma_wait: bool,

    clock_counter: u64,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(),
            apu: Apu::new(),
            cart: None,
            controller_state: [0; 2],
            controller_shift: [0; 2],
            dma_active: false,
            dma_page: 0,
            dma_index: 0,
            dma_data: 0,
            dma_wait: true,
            clock_counter: 0,
        }
    }

    /// Install a cartridge, sharing it with the PPU's address space.
    pub fn insert_cartridge(&mut self, cart: Cartridge) {
        let cart = Rc::new(RefCell::new(cart));
        self.ppu.attach_cartridge(cart.clone());
        self.cart = Some(cart);
    }

    pub fn cartridge(&self) -> Option<&Rc<RefCell<Cartridge>>> {
        self.cart.as_ref()
    }

    /// Latch the host-side button state for a controller. Bit 7 is A, down
    /// to bit 0 = Right.
    pub fn set_controller(&mut self, idx: usize, state: u8) {
        if idx < 2 {
            self.controller_state[idx] = state;
        }
    }

    /// Reset every subsystem to power-on state, keeping the cartridge.
    pub fn reset(&mut self, cpu: &mut Cpu6502) {
        if let Some(cart) = &self.cart {
            cart.borrow_mut().reset();
        }
        cpu.reset(self);
        self.ppu.reset();
        self.apu.reset();
        self.clock_counter = 0;
        self.dma_active = false;
        self.dma_wait = true;
        self.controller_shift = [0; 2];
    }

    /// Advance one master clock: one PPU dot, with the CPU and APU stepped
    /// on every third call.
    pub fn clock(&mut self, cpu: &mut Cpu6502) {
        self.ppu.clock();

        if self.clock_counter % 3 == 0 {
            if self.dma_active {
                self.clock_dma();
            } else {
                cpu.clock(self);
            }

            self.apu.clock();
            if let Some(addr) = self.apu.dmc_fetch_request() {
                // Read-through: the DMC fetch does not stall the CPU.
                let data = self.cpu_read(addr);
                self.apu.dmc_provide_sample(data);
            }
        }

        if self.ppu.take_nmi() {
            cpu.nmi();
        }

        let mapper_irq = self
            .cart
            .as_ref()
            .map(|c| c.borrow().irq_line())
            .unwrap_or(false);
        if mapper_irq {
            if let Some(cart) = &self.cart {
                cart.borrow_mut().irq_ack();
            }
            cpu.irq();
        }

        if self.apu.irq_pending() {
            cpu.irq();
        }

        self.clock_counter += 1;
    }

    /// One CPU-rate step of the OAM DMA engine. The transfer needs an
    /// alignment cycle, then alternates read and write cycles: 513 cycles
    /// total, 514 from an odd start.
    fn clock_dma(&mut self) {
        if self.dma_wait {
            if self.clock_counter % 2 == 1 {
                self.dma_wait = false;
            }
        } else if self.clock_counter % 2 == 0 {
            let addr = ((self.dma_page as u16) << 8) | self.dma_index as u16;
            self.dma_data = self.cpu_read(addr);
        } else {
            self.ppu.dma_oam_write(self.dma_data);
            self.dma_index = self.dma_index.wrapping_add(1);
            if self.dma_index == 0 {
                self.dma_active = false;
                self.dma_wait = true;
            }
        }
    }

    /// True while an OAM DMA transfer is stalling the CPU.
    pub fn dma_in_progress(&self) -> bool {
        self.dma_active
    }

    /// CPU address-space read.
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        let from_cart = self
            .cart
            .as_ref()
            .and_then(|c| c.borrow_mut().cpu_read(addr));
        if let Some(data) = from_cart {
            return data;
        }

        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr),
            0x4015 => self.apu.read_status(),
            0x4016 => {
                let data = (self.controller_shift[0] & 0x80 != 0) as u8;
                self.controller_shift[0] <<= 1;
                data
            }
            0x4017 => {
                let data = (self.controller_shift[1] & 0x80 != 0) as u8;
                self.controller_shift[1] <<= 1;
                data
            }
            _ => 0,
        }
    }

    /// CPU address-space write.
    pub fn cpu_write(&mut self, addr: u16, val: u8) {
        let consumed = self
            .cart
            .as_ref()
            .map(|c| c.borrow_mut().cpu_write(addr, val))
            .unwrap_or(false);
        if consumed {
            return;
        }

        match addr {
            0x0000..=0x1FFF => {
                self.ram[(addr & 0x07FF) as usize] = val;
            }
            0x2000..=0x3FFF => {
                self.ppu.write_register(addr, val);
            }
            0x4014 => {
                self.dma_page = val;
                self.dma_index = 0;
                self.dma_active = true;
            }
            0x4016 => {
                if val & 0x01 != 0 {
                    self.controller_shift[0] = self.controller_state[0];
                    self.controller_shift[1] = self.controller_state[1];
                }
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => {
                self.apu.write_register(addr, val);
            }
            _ => {}
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory6502 for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.cpu_write(addr, val)
    }
}

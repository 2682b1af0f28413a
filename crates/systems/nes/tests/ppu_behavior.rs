//! PPU behaviors observed through the CPU-visible register interface.

mod common;

use common::RomBuilder;
use ricoh_nes::NesSystem;

fn idle_rom(vertical: bool) -> Vec<u8> {
    let builder = RomBuilder::new(1, 0)
        .prg(0x0000, &[0x4C, 0x00, 0x80]) // JMP $8000
        .vectors(0x0000, 0x8000, 0x0000);
    let builder = if vertical {
        builder.vertical_mirroring()
    } else {
        builder
    };
    builder.build()
}

fn system(vertical: bool) -> NesSystem {
    let mut sys = NesSystem::new();
    sys.load_rom_bytes(&idle_rom(vertical)).unwrap();
    sys
}

fn vram_write(sys: &mut NesSystem, addr: u16, val: u8) {
    sys.cpu_write(0x2006, (addr >> 8) as u8);
    sys.cpu_write(0x2006, (addr & 0xFF) as u8);
    sys.cpu_write(0x2007, val);
}

fn vram_read(sys: &mut NesSystem, addr: u16) -> u8 {
    sys.cpu_write(0x2006, (addr >> 8) as u8);
    sys.cpu_write(0x2006, (addr & 0xFF) as u8);
    sys.cpu_read(0x2007); // prime the read buffer
    sys.cpu_read(0x2007)
}

#[test]
fn horizontal_mirroring_pairs_left_right() {
    let mut sys = system(false);
    for i in [0x0000u16, 0x0155, 0x03FF] {
        vram_write(&mut sys, 0x2000 + i, 0x30 ^ i as u8);
        assert_eq!(vram_read(&mut sys, 0x2400 + i), 0x30 ^ i as u8);
    }
    // The other pair shares separately.
    vram_write(&mut sys, 0x2800, 0x77);
    assert_eq!(vram_read(&mut sys, 0x2C00), 0x77);
    assert_ne!(vram_read(&mut sys, 0x2000), 0x77);
}

#[test]
fn vertical_mirroring_pairs_top_bottom() {
    let mut sys = system(true);
    vram_write(&mut sys, 0x2000, 0x11);
    assert_eq!(vram_read(&mut sys, 0x2800), 0x11);
    vram_write(&mut sys, 0x2400, 0x22);
    assert_eq!(vram_read(&mut sys, 0x2C00), 0x22);
    assert_ne!(vram_read(&mut sys, 0x2000), 0x22);
}

#[test]
fn nametable_region_3000_mirrors_2000() {
    let mut sys = system(false);
    vram_write(&mut sys, 0x2005, 0x5C);
    assert_eq!(vram_read(&mut sys, 0x3005), 0x5C);
}

#[test]
fn palette_aliases_observable_via_registers() {
    let mut sys = system(false);
    vram_write(&mut sys, 0x3F10, 0x1A);
    assert_eq!(vram_read(&mut sys, 0x3F00), 0x1A);
    vram_write(&mut sys, 0x3F14, 0x2B);
    assert_eq!(vram_read(&mut sys, 0x3F04), 0x2B);
    vram_write(&mut sys, 0x3F18, 0x3C);
    assert_eq!(vram_read(&mut sys, 0x3F08), 0x3C);
    vram_write(&mut sys, 0x3F1C, 0x0D);
    assert_eq!(vram_read(&mut sys, 0x3F0C), 0x0D);
}

#[test]
fn status_read_resets_address_toggle() {
    let mut sys = system(false);
    // A lone high-byte write would corrupt the next address without the
    // $2002 toggle reset.
    sys.cpu_write(0x2006, 0x21);
    sys.cpu_read(0x2002);
    vram_write(&mut sys, 0x2300, 0x66);
    assert_eq!(vram_read(&mut sys, 0x2300), 0x66);
}

/// Paint tile 0 of the pattern table solid (plane 0 all ones) through the
/// PPU data port. Requires a CHR RAM cartridge.
fn paint_solid_tile(sys: &mut NesSystem) {
    for row in 0..8u16 {
        vram_write(sys, row, 0xFF);
    }
}

#[test]
fn sprite_zero_hit_on_overlap() {
    let mut sys = system(false);
    paint_solid_tile(&mut sys);

    // Sprite 0 at (10, 40), tile 0, front priority.
    sys.cpu_write(0x2003, 0x00);
    for b in [40u8, 0, 0, 10] {
        sys.cpu_write(0x2004, b);
    }
    // Background and sprites on, left columns included.
    sys.cpu_write(0x2001, 0x1E);

    // Stop mid-frame: the pre-render line would clear the flag again.
    for _ in 0..341 * 100 {
        sys.clock();
    }
    let status = sys.cpu_read(0x2002);
    assert_ne!(status & 0x40, 0, "sprite zero hit should be set");
}

#[test]
fn sprite_zero_hit_skips_final_pixel_column() {
    let mut sys = system(false);
    paint_solid_tile(&mut sys);

    // Sprite 0 at x=255: its only on-screen pixel is the one column where
    // the hit can never register.
    sys.cpu_write(0x2003, 0x00);
    for b in [40u8, 0, 0, 255] {
        sys.cpu_write(0x2004, b);
    }
    sys.cpu_write(0x2001, 0x1E);

    for _ in 0..341 * 100 {
        sys.clock();
    }
    let status = sys.cpu_read(0x2002);
    assert_eq!(status & 0x40, 0, "no hit may fire at the last column");
}

#[test]
fn sprite_zero_hit_respects_left_clip() {
    let mut sys = system(false);
    paint_solid_tile(&mut sys);

    // Sprite 0 entirely inside the clipped left 8 pixels.
    sys.cpu_write(0x2003, 0x00);
    for b in [40u8, 0, 0, 0] {
        sys.cpu_write(0x2004, b);
    }
    // Rendering on but both left-column windows clipped.
    sys.cpu_write(0x2001, 0x18);

    for _ in 0..341 * 100 {
        sys.clock();
    }
    let status = sys.cpu_read(0x2002);
    assert_eq!(status & 0x40, 0, "clipped columns cannot produce a hit");
}

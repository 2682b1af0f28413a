//! 2A03 APU: the five channels behind their register file, the frame
//! sequencer, and the non-linear output mixer.
//!
//! Clocked once per CPU cycle. Triangle, noise and DMC timers run every
//! cycle; the pulse timers run every other cycle. The frame sequencer's
//! quarter/half-frame events pace envelopes, linear/length counters and
//! sweeps.

use ricoh_core::apu::{DmcChannel, FrameCounter, NoiseChannel, PulseChannel, TriangleChannel};

pub struct Apu {
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,
    frame: FrameCounter,
    cycle: u64,

    // Non-linear mixer lookup tables.
    pulse_table: [f32; 31],
    tnd_table: [f32; 203],

    // Output filter state: two-stage low-pass then DC-removal high-pass.
    lp_stage1: f32,
    lp_stage2: f32,
    hp_prev_in: f32,
    hp_prev_out: f32,
}

impl std::fmt::Debug for Apu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Apu").field("cycle", &self.cycle).finish_non_exhaustive()
    }
}

impl Apu {
    pub fn new() -> Self {
        let mut pulse_table = [0.0f32; 31];
        for (n, entry) in pulse_table.iter_mut().enumerate().skip(1) {
            *entry = 95.52 / (8128.0 / n as f32 + 100.0);
        }
        let mut tnd_table = [0.0f32; 203];
        for (n, entry) in tnd_table.iter_mut().enumerate().skip(1) {
            *entry = 163.67 / (24329.0 / n as f32 + 100.0);
        }

        Self {
            pulse1: PulseChannel::new(true),
            pulse2: PulseChannel::new(false),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            dmc: DmcChannel::new(),
            frame: FrameCounter::new(),
            cycle: 0,
            pulse_table,
            tnd_table,
            lp_stage1: 0.0,
            lp_stage2: 0.0,
            hp_prev_in: 0.0,
            hp_prev_out: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.pulse1 = PulseChannel::new(true);
        self.pulse2 = PulseChannel::new(false);
        self.triangle = TriangleChannel::new();
        self.noise = NoiseChannel::new();
        self.dmc = DmcChannel::new();
        self.frame = FrameCounter::new();
        self.cycle = 0;
        self.lp_stage1 = 0.0;
        self.lp_stage2 = 0.0;
        self.hp_prev_in = 0.0;
        self.hp_prev_out = 0.0;
    }

    /// Advance one CPU cycle.
    pub fn clock(&mut self) {
        let (quarter, half) = self.frame.clock();
        if quarter {
            self.clock_quarter_frame();
        }
        if half {
            self.clock_half_frame();
        }

        if self.cycle % 2 == 0 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
        }
        self.triangle.clock_timer();
        self.noise.clock_timer();
        self.dmc.clock_timer();

        self.cycle += 1;
    }

    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_quarter_frame();
        self.pulse2.clock_quarter_frame();
        self.triangle.clock_quarter_frame();
        self.noise.clock_quarter_frame();
    }

    fn clock_half_frame(&mut self) {
        self.pulse1.clock_half_frame();
        self.pulse2.clock_half_frame();
        self.triangle.clock_half_frame();
        self.noise.clock_half_frame();
    }

    /// $4015 status read: channel length states, DMC bytes outstanding and
    /// the IRQ flags. Clears the frame IRQ flag.
    pub fn read_status(&mut self) -> u8 {
        let mut data = 0u8;
        if self.pulse1.length.is_active() {
            data |= 0x01;
        }
        if self.pulse2.length.is_active() {
            data |= 0x02;
        }
        if self.triangle.length.is_active() {
            data |= 0x04;
        }
        if self.noise.length.is_active() {
            data |= 0x08;
        }
        if self.dmc.bytes_remaining() > 0 {
            data |= 0x10;
        }
        if self.frame.irq_pending() {
            data |= 0x40;
        }
        if self.dmc.irq_pending() {
            data |= 0x80;
        }
        self.frame.clear_irq();
        data
    }

    /// Register write ($4000-$4013, $4015, $4017).
    pub fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(val),
            0x4001 => self.pulse1.write_sweep(val),
            0x4002 => self.pulse1.write_timer_lo(val),
            0x4003 => self.pulse1.write_timer_hi(val),

            0x4004 => self.pulse2.write_control(val),
            0x4005 => self.pulse2.write_sweep(val),
            0x4006 => self.pulse2.write_timer_lo(val),
            0x4007 => self.pulse2.write_timer_hi(val),

            0x4008 => self.triangle.write_control(val),
            0x400A => self.triangle.write_timer_lo(val),
            0x400B => self.triangle.write_timer_hi(val),

            0x400C => self.noise.write_control(val),
            0x400E => self.noise.write_mode(val),
            0x400F => self.noise.write_length(val),

            0x4010 => self.dmc.write_control(val),
            0x4011 => self.dmc.write_output_level(val),
            0x4012 => self.dmc.write_sample_address(val),
            0x4013 => self.dmc.write_sample_length(val),

            0x4015 => {
                self.pulse1.length.set_enabled(val & 0x01 != 0);
                self.pulse2.length.set_enabled(val & 0x02 != 0);
                self.triangle.length.set_enabled(val & 0x04 != 0);
                self.noise.length.set_enabled(val & 0x08 != 0);
                self.dmc.set_enabled(val & 0x10 != 0);
                self.dmc.clear_irq();
            }

            0x4017 => {
                if self.frame.write_control(val) {
                    // 5-step mode clocks everything immediately.
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }

            _ => {}
        }
    }

    /// Pending DMC sample fetch, honored by the bus with a read-through of
    /// cartridge space.
    pub fn dmc_fetch_request(&self) -> Option<u16> {
        self.dmc.fetch_request()
    }

    /// Deliver the byte for an outstanding DMC fetch.
    pub fn dmc_provide_sample(&mut self, val: u8) {
        self.dmc.provide_sample(val);
    }

    /// Whether the APU is holding an IRQ line (frame sequencer or DMC).
    pub fn irq_pending(&self) -> bool {
        self.frame.irq_pending() || self.dmc.irq_pending()
    }

    /// Mixed output sample in [-0.95, 0.95]. Stateful: the IIR filter
    /// chain advances on every call, so the host should pull at its own
    /// fixed rate.
    pub fn output_sample(&mut self) -> f32 {
        let pulse_out = (self.pulse1.output() + self.pulse2.output()).min(30) as usize;
        let tnd_out = (3 * self.triangle.output() as u16
            + 2 * self.noise.output() as u16
            + self.dmc.output() as u16)
            .min(202) as usize;

        let mixed = self.pulse_table[pulse_out] + self.tnd_table[tnd_out];

        // Two single-pole low-pass stages, then a gentle high-pass for DC
        // removal.
        const LP_ALPHA1: f32 = 0.815;
        const LP_ALPHA2: f32 = 0.6;
        const HP_ALPHA: f32 = 0.995;

        self.lp_stage1 = self.lp_stage1 * LP_ALPHA1 + mixed * (1.0 - LP_ALPHA1);
        self.lp_stage2 = self.lp_stage2 * LP_ALPHA2 + self.lp_stage1 * (1.0 - LP_ALPHA2);

        let hp = HP_ALPHA * (self.hp_prev_out + self.lp_stage2 - self.hp_prev_in);
        self.hp_prev_in = self.lp_stage2;
        self.hp_prev_out = hp;

        (hp * 0.85).clamp(-0.95, 0.95)
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixer_tables_match_reference_formulas() {
        let apu = Apu::new();
        assert_eq!(apu.pulse_table[0], 0.0);
        let expected = 95.52 / (8128.0 / 15.0 + 100.0);
        assert!((apu.pulse_table[15] - expected).abs() < 1e-6);
        let expected = 163.67 / (24329.0 / 100.0 + 100.0);
        assert!((apu.tnd_table[100] - expected).abs() < 1e-6);
    }

    #[test]
    fn status_reflects_length_counters() {
        let mut apu = Apu::new();
        assert_eq!(apu.read_status() & 0x0F, 0);

        apu.write_register(0x4015, 0x01); // enable pulse 1
        apu.write_register(0x4003, 0x08); // load its length counter
        assert_eq!(apu.read_status() & 0x01, 0x01);

        apu.write_register(0x4015, 0x00); // disable clears the counter
        assert_eq!(apu.read_status() & 0x01, 0);
    }

    #[test]
    fn frame_irq_sets_and_clears_on_status_read() {
        let mut apu = Apu::new();
        apu.write_register(0x4017, 0x00); // 4-step, IRQ enabled
        for _ in 0..15000 {
            apu.clock();
        }
        assert!(apu.irq_pending());
        let status = apu.read_status();
        assert_ne!(status & 0x40, 0);
        assert!(!apu.irq_pending());
    }

    #[test]
    fn five_step_mode_never_raises_frame_irq() {
        let mut apu = Apu::new();
        apu.write_register(0x4017, 0x80);
        for _ in 0..40000 {
            apu.clock();
        }
        assert!(!apu.irq_pending());
    }

    #[test]
    fn dmc_enable_requests_fetch() {
        let mut apu = Apu::new();
        apu.write_register(0x4012, 0x04); // sample at $C100
        apu.write_register(0x4013, 0x00); // 1 byte
        apu.write_register(0x4015, 0x10);
        apu.clock();
        assert_eq!(apu.dmc_fetch_request(), Some(0xC100));
        apu.dmc_provide_sample(0x55);
        assert_eq!(apu.dmc_fetch_request(), None);
    }

    #[test]
    fn output_sample_stays_in_range() {
        let mut apu = Apu::new();
        apu.write_register(0x4015, 0x0F);
        apu.write_register(0x4000, 0xBF); // pulse 1 max constant volume
        apu.write_register(0x4002, 0xF0);
        apu.write_register(0x4003, 0x08);
        for _ in 0..10000 {
            apu.clock();
            let s = apu.output_sample();
            assert!((-0.95..=0.95).contains(&s));
        }
    }

    #[test]
    fn silence_decays_to_zero_output() {
        let mut apu = Apu::new();
        let mut last = 0.0;
        for _ in 0..5000 {
            apu.clock();
            last = apu.output_sample();
        }
        assert!(last.abs() < 1e-3);
    }
}

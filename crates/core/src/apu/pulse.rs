//! Pulse (square wave) channel.

use super::envelope::Envelope;
use super::length_counter::LengthCounter;
use super::sweep::SweepUnit;

/// Duty sequences indexed by `(duty, step)`: 12.5%, 25%, 50% and 25%
/// negated.
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// Pulse channel: 11-bit timer driving an 8-step duty sequencer, with
/// envelope, sweep and length counter.
///
/// The timer is clocked every other CPU cycle; the owning APU is
/// responsible for that division.
#[derive(Debug)]
pub struct PulseChannel {
    duty: u8,
    seq_step: u8,
    timer_period: u16,
    timer: u16,
    pub envelope: Envelope,
    pub sweep: SweepUnit,
    pub length: LengthCounter,
    output: u8,
}

impl PulseChannel {
    /// `ones_complement` selects the pulse-1 sweep negate variant.
    pub fn new(ones_complement: bool) -> Self {
        Self {
            duty: 0,
            seq_step: 0,
            timer_period: 0,
            timer: 0,
            envelope: Envelope::new(),
            sweep: SweepUnit::new(ones_complement),
            length: LengthCounter::new(),
            output: 0,
        }
    }

    /// $4000/$4004: duty, length halt, envelope control.
    pub fn write_control(&mut self, val: u8) {
        self.duty = (val >> 6) & 0x03;
        self.length.set_halt(val & 0x20 != 0);
        self.envelope.write_control(val);
    }

    /// $4001/$4005: sweep register.
    pub fn write_sweep(&mut self, val: u8) {
        self.sweep.write_control(val);
    }

    /// $4002/$4006: timer low byte.
    pub fn write_timer_lo(&mut self, val: u8) {
        self.timer_period = (self.timer_period & 0xFF00) | val as u16;
    }

    /// $4003/$4007: timer high bits, length load, sequence restart.
    pub fn write_timer_hi(&mut self, val: u8) {
        self.timer_period = (self.timer_period & 0x00FF) | (((val & 0x07) as u16) << 8);
        self.length.load(val >> 3);
        self.seq_step = 0;
        self.envelope.restart();
    }

    /// Timer clock (every other CPU cycle). Recomputes the current output.
    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_period;
            self.seq_step = (self.seq_step + 1) & 0x07;
        } else {
            self.timer -= 1;
        }

        let muted = !self.length.is_active()
            || self.timer_period < 8
            || self.sweep.mutes(self.timer_period);

        self.output = if muted {
            0
        } else {
            DUTY_TABLE[self.duty as usize][self.seq_step as usize] * self.envelope.volume()
        };
    }

    /// Quarter-frame clock.
    pub fn clock_quarter_frame(&mut self) {
        self.envelope.clock();
    }

    /// Half-frame clock.
    pub fn clock_half_frame(&mut self) {
        self.length.clock();
        self.sweep.clock(&mut self.timer_period);
    }

    /// Current 4-bit output level.
    pub fn output(&self) -> u8 {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audible_pulse() -> PulseChannel {
        let mut p = PulseChannel::new(true);
        p.length.set_enabled(true);
        p.write_control(0x9F); // duty 2, constant volume 15
        p.write_timer_lo(0x40);
        p.write_timer_hi(0x00); // period 0x40, loads length
        p
    }

    #[test]
    fn duty_patterns() {
        for (duty, pattern) in DUTY_TABLE.iter().enumerate() {
            let ones: u8 = pattern.iter().sum();
            match duty {
                0 => assert_eq!(ones, 1),
                1 => assert_eq!(ones, 2),
                2 => assert_eq!(ones, 4),
                3 => assert_eq!(ones, 6),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn timer_advances_sequencer() {
        let mut p = audible_pulse();
        // Timer starts at 0: first clock reloads and steps the sequencer.
        p.clock_timer();
        // 0x40 more clocks to count down, then the next step.
        for _ in 0..0x41 {
            p.clock_timer();
        }
        // Two steps into duty 2 -> output high.
        assert_eq!(p.output(), 15);
    }

    #[test]
    fn zero_length_mutes() {
        let mut p = audible_pulse();
        p.length.set_enabled(false);
        p.clock_timer();
        assert_eq!(p.output(), 0);
    }

    #[test]
    fn short_period_mutes() {
        let mut p = audible_pulse();
        p.write_timer_lo(0x07);
        p.write_timer_hi(0x00);
        for _ in 0..16 {
            p.clock_timer();
        }
        assert_eq!(p.output(), 0);
    }
}

//! Frame counter: the sequencer that paces envelopes, length counters and
//! sweep units.

/// Quarter/half-frame sequencer.
///
/// Runs at CPU rate and fires quarter-frame and half-frame events at fixed
/// cycle counts within its sequence. Two modes:
///
/// - 4-step: events at 3728 / 7456 / 11185 / 14914 cycles, with an IRQ at
///   the end of the sequence unless inhibited
/// - 5-step: same first three events, nothing at 14914, and the sequence
///   ends with a quarter+half frame at 18640; never raises an IRQ
///
/// The real divider fires on half-CPU-cycle boundaries; this implementation
/// clocks on the lower integer edge of each documented pair.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    five_step: bool,
    irq_inhibit: bool,
    irq_flag: bool,
    cycle: u32,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock one CPU cycle. Returns `(quarter_frame, half_frame)` for this
    /// cycle.
    pub fn clock(&mut self) -> (bool, bool) {
        let mut quarter = false;
        let mut half = false;

        match self.cycle {
            3728 | 11185 => quarter = true,
            7456 => {
                quarter = true;
                half = true;
            }
            14914 if !self.five_step => {
                quarter = true;
                half = true;
                if !self.irq_inhibit {
                    self.irq_flag = true;
                }
                self.cycle = 0;
            }
            18640 if self.five_step => {
                quarter = true;
                half = true;
                self.cycle = 0;
            }
            _ => {}
        }

        self.cycle += 1;
        (quarter, half)
    }

    /// Apply a $4017 write: `MI-- ----`. Resets the sequence. Returns true
    /// when the write must immediately clock a quarter+half frame (5-step
    /// mode).
    pub fn write_control(&mut self, val: u8) -> bool {
        self.five_step = (val & 0x80) != 0;
        self.irq_inhibit = (val & 0x40) != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
        }
        self.cycle = 0;
        self.five_step
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_flag
    }

    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fc: &mut FrameCounter, cycles: u32) -> (u32, u32) {
        let mut quarters = 0;
        let mut halves = 0;
        for _ in 0..cycles {
            let (q, h) = fc.clock();
            quarters += q as u32;
            halves += h as u32;
        }
        (quarters, halves)
    }

    #[test]
    fn four_step_sequence_events() {
        let mut fc = FrameCounter::new();
        fc.write_control(0x40); // 4-step, IRQ inhibited
        let (quarters, halves) = run(&mut fc, 14916);
        assert_eq!(quarters, 4);
        assert_eq!(halves, 2);
    }

    #[test]
    fn four_step_raises_irq_at_sequence_end() {
        let mut fc = FrameCounter::new();
        fc.write_control(0x00);
        run(&mut fc, 14916);
        assert!(fc.irq_pending());
        fc.clear_irq();
        assert!(!fc.irq_pending());
    }

    #[test]
    fn five_step_skips_14914_and_never_irqs() {
        let mut fc = FrameCounter::new();
        fc.write_control(0x80);
        let mut quarters = 0;
        let mut at_14914 = false;
        for c in 0..18642u32 {
            let (q, _) = fc.clock();
            quarters += q as u32;
            if c == 14914 && q {
                at_14914 = true;
            }
        }
        assert_eq!(quarters, 4);
        assert!(!at_14914);
        assert!(!fc.irq_pending());
    }

    #[test]
    fn inhibit_clears_pending_irq() {
        let mut fc = FrameCounter::new();
        fc.write_control(0x00);
        run(&mut fc, 14916);
        assert!(fc.irq_pending());
        fc.write_control(0x40);
        assert!(!fc.irq_pending());
    }

    #[test]
    fn five_step_write_requests_immediate_clock() {
        let mut fc = FrameCounter::new();
        assert!(fc.write_control(0x80));
        assert!(!fc.write_control(0x00));
    }
}

//! Length counter used by the pulse, triangle and noise channels.

/// Length counter lookup table, indexed by the 5-bit load value written to
/// a channel's high-timer register.
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14,
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// Note-duration down-counter. Clocked on half frames; the owning channel
/// is silent while the counter reads zero.
#[derive(Debug, Clone, Default)]
pub struct LengthCounter {
    value: u8,
    halt: bool,
    enabled: bool,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Half-frame clock.
    pub fn clock(&mut self) {
        if !self.halt && self.value > 0 {
            self.value -= 1;
        }
    }

    /// Load from the table. Ignored while the channel is disabled via the
    /// status register.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.value = LENGTH_TABLE[(index & 0x1F) as usize];
        }
    }

    pub fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    /// Status-register enable. Disabling clears the counter immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.value = 0;
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.value > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_silences() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(3); // table entry 3 = 2
        assert_eq!(lc.value(), 2);
        lc.clock();
        lc.clock();
        assert!(!lc.is_active());
        lc.clock();
        assert_eq!(lc.value(), 0);
    }

    #[test]
    fn halt_freezes_counter() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(0);
        lc.set_halt(true);
        let v = lc.value();
        lc.clock();
        assert_eq!(lc.value(), v);
    }

    #[test]
    fn disable_clears_and_blocks_loads() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(1); // 254
        lc.set_enabled(false);
        assert_eq!(lc.value(), 0);
        lc.load(1);
        assert_eq!(lc.value(), 0);
    }
}

//! Elapsed-time counter.

/// A count of master clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Count one more cycle.
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_cycles() {
        let mut ticks = Ticks::ZERO;
        for _ in 0..3 {
            ticks.advance();
        }
        assert_eq!(ticks.get(), 3);
        assert!(ticks > Ticks::ZERO);
    }
}

/// Counts director instructions against the configured turn limit.
///
/// A limit of 0 is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    limit: u32,
    used: u32,
}

impl TurnBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit != 0 && self.used >= self.limit
    }

    /// Records one issued instruction.
    pub fn record(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_reached_after_n_turns() {
        for limit in 1..=5 {
            let mut budget = TurnBudget::new(limit);
            let mut issued = 0;
            while !budget.is_exhausted() {
                budget.record();
                issued += 1;
            }
            assert_eq!(issued, limit);
            assert_eq!(budget.used(), limit);
        }
    }

    #[test]
    fn test_zero_is_unbounded() {
        let mut budget = TurnBudget::new(0);
        for _ in 0..10_000 {
            assert!(!budget.is_exhausted());
            budget.record();
        }
    }
}

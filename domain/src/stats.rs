//! Cumulative session statistics

use crate::event::TurnSuccess;

/// Usage and cost counters accumulated over the life of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub turns: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub total_duration_ms: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one successful turn into the counters.
    pub fn record_turn(&mut self, turn: &TurnSuccess) {
        self.turns += 1;
        self.input_tokens += turn.usage.input_tokens;
        self.output_tokens += turn.usage.output_tokens;
        self.cost_usd += turn.cost_usd;
        self.total_duration_ms += turn.duration_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Usage;

    #[test]
    fn record_turn_accumulates() {
        let mut stats = SessionStats::new();
        stats.record_turn(&TurnSuccess {
            duration_ms: 1200,
            cost_usd: 0.01,
            usage: Usage {
                input_tokens: 100,
                output_tokens: 50,
            },
        });
        stats.record_turn(&TurnSuccess {
            duration_ms: 800,
            cost_usd: 0.02,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        });

        assert_eq!(stats.turns, 2);
        assert_eq!(stats.input_tokens, 110);
        assert_eq!(stats.output_tokens, 55);
        assert_eq!(stats.total_duration_ms, 2000);
        assert!((stats.cost_usd - 0.03).abs() < 1e-9);
    }
}

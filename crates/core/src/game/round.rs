//! Round lifecycle: countdown, resolution, stake accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player-chosen prediction for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The last sample will end above the round's start value.
    Up,
    /// The last sample will end at or below the round's start value.
    Down,
}

/// Result of a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The prediction held.
    Win,
    /// The prediction failed.
    Lose,
}

impl Outcome {
    /// Signed balance delta for this outcome at the given stake.
    pub fn signed_stake(self, stake: i64) -> i64 {
        match self {
            Outcome::Win => stake,
            Outcome::Lose => -stake,
        }
    }
}

/// Resolution rule. Equality resolves as a win only for [`Direction::Down`].
pub fn resolve(direction: Direction, start: f64, end: f64) -> Outcome {
    match direction {
        Direction::Up if end > start => Outcome::Win,
        Direction::Up => Outcome::Lose,
        Direction::Down if end <= start => Outcome::Win,
        Direction::Down => Outcome::Lose,
    }
}

/// One up/down prediction cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// Monotonically increasing identifier keying settlement requests.
    pub id: u64,
    /// The player's prediction.
    pub direction: Direction,
    /// Sample value when the round started.
    pub start_value: f64,
    /// Wall-clock start of the round.
    pub started_at: DateTime<Utc>,
}

/// A finished round together with its boundary values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRound {
    /// The round as it was started.
    pub round: Round,
    /// Sample value at expiry.
    pub end_value: f64,
    /// Win or lose per [`resolve`].
    pub outcome: Outcome,
}

/// Countdown state machine driving one round at a time.
///
/// Idle until a direction press, then Running for the configured number of
/// one-second ticks, then resolution and an immediate reset to Idle.
#[derive(Debug, Clone)]
pub struct RoundEngine {
    seconds: u32,
    remaining: i64,
    current: Option<Round>,
    last: Option<ResolvedRound>,
    next_id: u64,
}

impl RoundEngine {
    /// Engine with a countdown of `seconds` per round.
    pub fn new(seconds: u32) -> Self {
        Self {
            seconds,
            remaining: i64::from(seconds),
            current: None,
            last: None,
            next_id: 1,
        }
    }

    /// Whether a round is counting down; direction presses are ignored then.
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Seconds left on the countdown display.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Round currently in flight.
    pub fn current(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    /// Most recently resolved round; cleared when the next round starts.
    pub fn last_resolved(&self) -> Option<&ResolvedRound> {
        self.last.as_ref()
    }

    /// Id of the round whose settlement may still update state: the running
    /// round, or the last resolved one.
    pub fn latest_round_id(&self) -> Option<u64> {
        self.current
            .as_ref()
            .map(|round| round.id)
            .or_else(|| self.last.as_ref().map(|resolved| resolved.round.id))
    }

    /// Start value shown as the reference line: the running round's, or the
    /// last resolved round's until a new press replaces it.
    pub fn start_value(&self) -> Option<f64> {
        self.current
            .as_ref()
            .map(|round| round.start_value)
            .or_else(|| self.last.as_ref().map(|resolved| resolved.round.start_value))
    }

    /// Begin a round at `start_value`. Returns the new round, or `None`
    /// while another round is still running.
    pub fn press(&mut self, direction: Direction, start_value: f64) -> Option<Round> {
        if self.current.is_some() {
            return None;
        }
        let round = Round {
            id: self.next_id,
            direction,
            start_value,
            started_at: Utc::now(),
        };
        self.next_id += 1;
        self.remaining = i64::from(self.seconds);
        self.last = None;
        self.current = Some(round.clone());
        Some(round)
    }

    /// Advance the countdown by one second. The counter runs down through
    /// zero; the tick after that resolves the round against `latest` and
    /// resets the engine.
    pub fn tick(&mut self, latest: f64) -> Option<ResolvedRound> {
        self.current.as_ref()?;
        if self.remaining > 0 {
            self.remaining -= 1;
            return None;
        }
        let round = self.current.take()?;
        let outcome = resolve(round.direction, round.start_value, latest);
        let resolved = ResolvedRound {
            round,
            end_value: latest,
            outcome,
        };
        self.remaining = i64::from(self.seconds);
        self.last = Some(resolved.clone());
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_table() {
        assert_eq!(resolve(Direction::Up, 65_000.0, 65_010.0), Outcome::Win);
        assert_eq!(resolve(Direction::Up, 65_000.0, 64_990.0), Outcome::Lose);
        assert_eq!(resolve(Direction::Up, 65_000.0, 65_000.0), Outcome::Lose);
        assert_eq!(resolve(Direction::Down, 65_000.0, 65_000.0), Outcome::Win);
        assert_eq!(resolve(Direction::Down, 65_000.0, 64_990.0), Outcome::Win);
        assert_eq!(resolve(Direction::Down, 65_000.0, 65_010.0), Outcome::Lose);
    }

    #[test]
    fn signed_stake_matches_outcome() {
        assert_eq!(Outcome::Win.signed_stake(10), 10);
        assert_eq!(Outcome::Lose.signed_stake(10), -10);
    }

    #[test]
    fn consecutive_wins_accumulate() {
        let initial = 100_i64;
        let stake = 10_i64;
        let balance = (0..5).fold(initial, |acc, _| acc + Outcome::Win.signed_stake(stake));
        assert_eq!(balance, initial + 5 * stake);
    }

    #[test]
    fn presses_are_ignored_while_running() {
        let mut engine = RoundEngine::new(5);
        let first = engine.press(Direction::Up, 65_000.0).expect("first press");
        assert!(engine.press(Direction::Down, 65_001.0).is_none());
        assert_eq!(engine.current().map(|round| round.id), Some(first.id));
        assert_eq!(
            engine.current().map(|round| round.direction),
            Some(Direction::Up)
        );
    }

    #[test]
    fn expires_exactly_once_and_resets() {
        let mut engine = RoundEngine::new(2);
        engine.press(Direction::Up, 65_000.0).expect("press");
        assert!(engine.is_running());

        // counts 2 -> 1 -> 0, then resolves on the following tick
        assert!(engine.tick(65_005.0).is_none());
        assert_eq!(engine.remaining(), 1);
        assert!(engine.tick(65_005.0).is_none());
        assert_eq!(engine.remaining(), 0);
        let resolved = engine.tick(65_005.0).expect("expiry resolves");
        assert_eq!(resolved.outcome, Outcome::Win);
        assert_eq!(resolved.end_value, 65_005.0);

        // reset: idle, counter restored, presses accepted again
        assert!(!engine.is_running());
        assert_eq!(engine.remaining(), 2);
        assert!(engine.tick(65_005.0).is_none());
        assert!(engine.press(Direction::Down, 65_005.0).is_some());
    }

    #[test]
    fn down_wins_on_unchanged_value() {
        let mut engine = RoundEngine::new(1);
        engine.press(Direction::Down, 65_000.0).expect("press");
        assert!(engine.tick(65_000.0).is_none());
        let resolved = engine.tick(65_000.0).expect("resolution");
        assert_eq!(resolved.outcome, Outcome::Win);
    }

    #[test]
    fn round_ids_increase_and_key_staleness() {
        let mut engine = RoundEngine::new(1);
        let first = engine.press(Direction::Up, 65_000.0).expect("press");
        assert_eq!(engine.latest_round_id(), Some(first.id));
        engine.tick(65_001.0);
        engine.tick(65_001.0).expect("resolution");
        assert_eq!(engine.latest_round_id(), Some(first.id));

        let second = engine.press(Direction::Down, 65_001.0).expect("press");
        assert!(second.id > first.id);
        // a settlement response for the first round is now stale
        assert_ne!(engine.latest_round_id(), Some(first.id));
    }

    #[test]
    fn start_reference_survives_resolution_until_next_press() {
        let mut engine = RoundEngine::new(1);
        engine.press(Direction::Up, 65_000.0).expect("press");
        assert_eq!(engine.start_value(), Some(65_000.0));
        engine.tick(65_002.0);
        engine.tick(65_002.0).expect("resolution");
        assert_eq!(engine.start_value(), Some(65_000.0));
        assert!(engine.last_resolved().is_some());

        engine.press(Direction::Down, 65_002.0).expect("press");
        assert_eq!(engine.start_value(), Some(65_002.0));
        assert!(engine.last_resolved().is_none());
    }
}

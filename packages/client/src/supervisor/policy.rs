//! Reconnect policy.

use std::time::Duration;

/// Delay before re-opening after a transport failure, unless configured otherwise.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// When, and how often, to re-open a connection after a transport failure.
///
/// Attempts are counted per run of consecutive failures; a successful open
/// resets the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay before every attempt.
    Fixed {
        delay: Duration,
        max_attempts: Option<u32>,
    },
    /// Delay doubles from `initial` on every consecutive failure, capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        max_attempts: Option<u32>,
    },
    /// Never reconnect.
    Never,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        ReconnectPolicy::Fixed {
            delay,
            max_attempts: None,
        }
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        ReconnectPolicy::Exponential {
            initial,
            max: max.max(initial),
            max_attempts: None,
        }
    }

    /// Stop after `limit` reconnect attempts in a row. No effect on `Never`.
    pub fn with_max_attempts(self, limit: u32) -> Self {
        match self {
            ReconnectPolicy::Fixed { delay, .. } => ReconnectPolicy::Fixed {
                delay,
                max_attempts: Some(limit),
            },
            ReconnectPolicy::Exponential { initial, max, .. } => ReconnectPolicy::Exponential {
                initial,
                max,
                max_attempts: Some(limit),
            },
            ReconnectPolicy::Never => ReconnectPolicy::Never,
        }
    }

    /// Delay before reconnect attempt number `attempt` (1-based), or `None`
    /// when the policy gives up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match *self {
            ReconnectPolicy::Fixed {
                delay,
                max_attempts,
            } => within(attempt, max_attempts).then_some(delay),
            ReconnectPolicy::Exponential {
                initial,
                max,
                max_attempts,
            } => {
                if !within(attempt, max_attempts) {
                    return None;
                }
                let delay = 2u32
                    .checked_pow(attempt.saturating_sub(1))
                    .and_then(|factor| initial.checked_mul(factor))
                    .map_or(max, |d| d.min(max));
                Some(delay)
            }
            ReconnectPolicy::Never => None,
        }
    }
}

fn within(attempt: u32, max_attempts: Option<u32>) -> bool {
    max_attempts.is_none_or(|limit| attempt <= limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_flat_five_seconds_unbounded() {
        // テスト項目: デフォルトは 5 秒固定・回数無制限
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // when (操作):
        let delays: Vec<_> = [1, 2, 100, 10_000]
            .iter()
            .map(|n| policy.delay_for(*n))
            .collect();

        // then (期待する結果):
        assert!(delays.iter().all(|d| *d == Some(Duration::from_secs(5))));
    }

    #[test]
    fn test_fixed_policy_stops_after_max_attempts() {
        // テスト項目: max_attempts を超えると再接続しない
        // given (前提条件):
        let policy = ReconnectPolicy::fixed(Duration::from_secs(1)).with_max_attempts(2);

        // when (操作):
        let third = policy.delay_for(3);

        // then (期待する結果):
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(1)));
        assert_eq!(third, None);
    }

    #[test]
    fn test_exponential_policy_doubles_and_caps() {
        // テスト項目: 指数バックオフは倍々に増え、上限で頭打ちになる
        // given (前提条件):
        let policy = ReconnectPolicy::exponential(Duration::from_secs(1), Duration::from_secs(10));

        // when (操作):
        let delays: Vec<_> = (1..=6).map(|n| policy.delay_for(n)).collect();

        // then (期待する結果):
        let secs: Vec<_> = delays.into_iter().map(|d| d.unwrap().as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 10, 10]);
        assert_eq!(policy.delay_for(u32::MAX), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_never_policy() {
        // テスト項目: Never は常に再接続しない
        // given (前提条件):
        let policy = ReconnectPolicy::Never.with_max_attempts(3);

        // when (操作):
        let delay = policy.delay_for(1);

        // then (期待する結果):
        assert_eq!(policy, ReconnectPolicy::Never);
        assert_eq!(delay, None);
    }
}

//! Run state shared by every worker in a load run

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Why a load run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// No bound fired (unbounded run, or no rounds at all)
    None,
    /// The request counter reached `max_requests`
    MaxRequests,
    /// The run exceeded `max_duration`
    TimeLimit,
}

impl TerminationReason {
    const NONE: u8 = 0;
    const MAX_REQUESTS: u8 = 1;
    const TIME_LIMIT: u8 = 2;

    fn as_u8(self) -> u8 {
        match self {
            TerminationReason::None => Self::NONE,
            TerminationReason::MaxRequests => Self::MAX_REQUESTS,
            TerminationReason::TimeLimit => Self::TIME_LIMIT,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            Self::MAX_REQUESTS => TerminationReason::MaxRequests,
            Self::TIME_LIMIT => TerminationReason::TimeLimit,
            _ => TerminationReason::None,
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::None => write!(f, "none"),
            TerminationReason::MaxRequests => write!(f, "max requests reached"),
            TerminationReason::TimeLimit => write!(f, "time limit reached"),
        }
    }
}

/// Counter, stop flag and terminal reason for one load run
///
/// The counter only grows and never passes `max_requests`; `should_stop`
/// never reverts; at most one terminal reason is ever recorded.
#[derive(Debug)]
pub struct SharedRunState {
    counter: AtomicU64,
    should_stop: AtomicBool,
    reason: AtomicU8,
    max_requests: Option<u64>,
    max_duration: Option<Duration>,
    started_at: Instant,
}

impl SharedRunState {
    /// Create state for a run starting now
    pub fn new(max_requests: Option<u64>, max_duration: Option<Duration>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            should_stop: AtomicBool::new(false),
            reason: AtomicU8::new(TerminationReason::NONE),
            max_requests,
            max_duration,
            started_at: Instant::now(),
        }
    }

    /// Whether the run has been told to stop
    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }

    /// Rounds claimed so far
    pub fn requests_issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Terminal reason recorded so far
    pub fn termination_reason(&self) -> TerminationReason {
        TerminationReason::from_u8(self.reason.load(Ordering::SeqCst))
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether neither bound is configured
    pub fn is_unbounded(&self) -> bool {
        self.max_requests.is_none() && self.max_duration.is_none()
    }

    /// Record `reason` (if none is recorded yet) and raise the stop flag
    ///
    /// Returns `true` when this call recorded the reason.
    pub fn commit_stop(&self, reason: TerminationReason) -> bool {
        let won = self
            .reason
            .compare_exchange(
                TerminationReason::NONE,
                reason.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        self.should_stop.store(true, Ordering::SeqCst);
        won
    }

    /// Check the duration and request bounds, committing a stop if one fired
    ///
    /// The duration bound is checked first.
    pub fn check_bounds(&self) -> Option<TerminationReason> {
        if let Some(max) = self.max_duration {
            if self.elapsed() >= max {
                self.commit_stop(TerminationReason::TimeLimit);
                return Some(self.termination_reason());
            }
        }

        if let Some(max) = self.max_requests {
            if self.requests_issued() >= max {
                self.commit_stop(TerminationReason::MaxRequests);
                return Some(self.termination_reason());
            }
        }

        None
    }

    /// Claim the next round sequence number (1-based)
    ///
    /// A single compare-and-swap: no two callers observe the same value and
    /// the counter never passes `max_requests`. Returns `None` once the run
    /// is stopping or the bound is exhausted, in which case a max-requests
    /// stop is committed.
    pub fn try_claim(&self) -> Option<u64> {
        let max = self.max_requests;
        let claimed = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if self.should_stop.load(Ordering::SeqCst) {
                    return None;
                }
                match max {
                    Some(max) if current >= max => None,
                    _ => current.checked_add(1),
                }
            });

        match claimed {
            Ok(previous) => Some(previous + 1),
            Err(current) => {
                if max.is_some_and(|max| current >= max) {
                    self.commit_stop(TerminationReason::MaxRequests);
                }
                None
            }
        }
    }
}

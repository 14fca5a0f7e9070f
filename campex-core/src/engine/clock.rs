use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` instant range in UTC during which trading is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TradingWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Abstracts "now" so the engine and its tests don't depend on the system clock directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Decides whether trading-mutating operations are currently permitted.
///
/// Administrative operations bypass this gate entirely; only intake and
/// user-initiated cancellation consult it.
pub fn is_open(windows: &[TradingWindow], now: DateTime<Utc>) -> bool {
    windows.iter().any(|w| w.contains(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn open_inside_a_single_window() {
        let windows = vec![TradingWindow {
            start: at(9),
            end: at(17),
        }];
        assert!(is_open(&windows, at(12)));
        assert!(!is_open(&windows, at(8)));
        assert!(!is_open(&windows, at(17)), "end is exclusive");
    }

    #[test]
    fn open_if_any_of_several_windows_matches() {
        let windows = vec![
            TradingWindow {
                start: at(9),
                end: at(11),
            },
            TradingWindow {
                start: at(13),
                end: at(15),
            },
        ];
        assert!(is_open(&windows, at(14)));
        assert!(!is_open(&windows, at(12)));
    }

    #[test]
    fn closed_with_no_windows_configured() {
        assert!(!is_open(&[], at(12)));
    }
}

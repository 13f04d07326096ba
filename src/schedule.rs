// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, TimeDelta, TimeZone};

/// Start of the next session.
///
/// Sessions end on the `interval` grid: a session is started `lead` before
/// each boundary so its final reading lands just before it. If that moment
/// has already passed the start moves to the following boundary.
pub fn next_start<Tz: TimeZone>(
    now: &DateTime<Tz>,
    interval: TimeDelta,
    lead: TimeDelta,
) -> DateTime<Tz> {
    let step = interval.num_seconds().max(1);
    let elapsed = TimeDelta::seconds(now.timestamp().rem_euclid(step))
        + TimeDelta::nanoseconds(now.timestamp_subsec_nanos() as i64);
    let floor = now.clone() - elapsed;

    let mut start = floor + TimeDelta::seconds(step) - lead;
    if start < *now {
        start += TimeDelta::seconds(step);
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 4, h, m, s).unwrap()
    }

    #[test]
    fn starts_lead_before_boundary() {
        let next = next_start(&at(7, 0, 10), TimeDelta::minutes(5), TimeDelta::seconds(130));
        assert_eq!(next, at(7, 2, 50));
    }

    #[test]
    fn skips_to_following_boundary_when_late() {
        let next = next_start(&at(7, 3, 0), TimeDelta::minutes(5), TimeDelta::seconds(130));
        assert_eq!(next, at(7, 7, 50));
    }

    #[test]
    fn exact_start_is_kept() {
        let next = next_start(&at(7, 2, 50), TimeDelta::minutes(5), TimeDelta::seconds(130));
        assert_eq!(next, at(7, 2, 50));
    }

    #[test]
    fn subsecond_now_is_floored() {
        let now = at(7, 0, 10) + TimeDelta::milliseconds(400);
        let next = next_start(&now, TimeDelta::minutes(5), TimeDelta::seconds(130));
        assert_eq!(next, at(7, 2, 50));
    }
}

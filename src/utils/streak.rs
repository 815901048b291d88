use crate::database::models::AttendanceRecord;
use anyhow::Result;
use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, Timelike, Utc};

/// Every this many days in a row earns a milestone notice.
pub const MILESTONE_INTERVAL: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    pub consecutive_days: i64,
    pub before_seven_count: i64,
}

impl Streak {
    pub fn is_milestone(&self) -> bool {
        let hit = |count: i64| count > 0 && count % MILESTONE_INTERVAL == 0;
        hit(self.consecutive_days) || hit(self.before_seven_count)
    }
}

/// The previous check-in, expressed in local time.
#[derive(Debug, Clone, Copy)]
pub struct PriorCheckIn {
    pub at: NaiveDateTime,
    pub streak: Streak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInRejection {
    OutsideWindow,
    AlreadyCheckedIn,
}

/// Hours of the day during which attendance is accepted, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceWindow {
    start_hour: u32,
    end_hour: u32,
}

impl AttendanceWindow {
    pub fn from_hours(start_hour: u32, end_hour: u32) -> Result<Self> {
        if start_hour >= end_hour || end_hour > 24 {
            return Err(anyhow::anyhow!(
                "Attendance window must satisfy start < end <= 24, got {}..{}",
                start_hour,
                end_hour
            ));
        }
        Ok(Self { start_hour, end_hour })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time.hour() >= self.start_hour && time.hour() < self.end_hour
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }
}

impl Default for AttendanceWindow {
    fn default() -> Self {
        Self {
            start_hour: 5,
            end_hour: 9,
        }
    }
}

/// At or before 07:00 sharp.
pub fn is_early(time: NaiveTime) -> bool {
    time.hour() < 7 || (time.hour() == 7 && time.minute() == 0)
}

pub fn evaluate(now: NaiveDateTime, prior: Option<&PriorCheckIn>) -> Streak {
    let early_now = is_early(now.time());
    let fresh = Streak {
        consecutive_days: 1,
        before_seven_count: if early_now { 1 } else { 0 },
    };

    let Some(prior) = prior else {
        return fresh;
    };

    let yesterday = now.date().checked_sub_days(Days::new(1));
    if yesterday != Some(prior.at.date()) {
        return fresh;
    }

    let before_seven_count = if early_now && is_early(prior.at.time()) {
        prior.streak.before_seven_count + 1
    } else {
        fresh.before_seven_count
    };

    Streak {
        consecutive_days: prior.streak.consecutive_days + 1,
        before_seven_count,
    }
}

pub fn check_in(
    now: NaiveDateTime,
    window: &AttendanceWindow,
    prior: Option<&PriorCheckIn>,
) -> std::result::Result<Streak, CheckInRejection> {
    if !window.contains(now.time()) {
        return Err(CheckInRejection::OutsideWindow);
    }

    if prior.is_some_and(|p| p.at.date() == now.date()) {
        return Err(CheckInRejection::AlreadyCheckedIn);
    }

    Ok(evaluate(now, prior))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total_records: usize,
    pub current_streak: i64,
    pub highest_streak: i64,
    pub highest_before_seven: i64,
    pub latest: DateTime<Utc>,
}

impl AttendanceSummary {
    pub fn from_records(records: &[AttendanceRecord]) -> Option<Self> {
        let latest = records.iter().max_by_key(|r| r.timestamp)?;

        Some(Self {
            total_records: records.len(),
            current_streak: latest.consecutive_days,
            highest_streak: records.iter().map(|r| r.consecutive_days).max().unwrap_or(0),
            highest_before_seven: records
                .iter()
                .map(|r| r.before_seven_count)
                .max()
                .unwrap_or(0),
            latest: latest.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn prior(at: NaiveDateTime, consecutive_days: i64, before_seven_count: i64) -> PriorCheckIn {
        PriorCheckIn {
            at,
            streak: Streak {
                consecutive_days,
                before_seven_count,
            },
        }
    }

    #[test]
    fn early_boundary_is_seven_sharp() {
        assert!(is_early(NaiveTime::from_hms_opt(5, 30, 0).unwrap()));
        assert!(is_early(NaiveTime::from_hms_opt(6, 59, 59).unwrap()));
        assert!(is_early(NaiveTime::from_hms_opt(7, 0, 0).unwrap()));
        assert!(!is_early(NaiveTime::from_hms_opt(7, 1, 0).unwrap()));
        assert!(!is_early(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
    }

    #[test]
    fn first_check_in_starts_both_streaks() {
        assert_eq!(
            evaluate(at(10, 6, 30), None),
            Streak { consecutive_days: 1, before_seven_count: 1 }
        );
        assert_eq!(
            evaluate(at(10, 8, 15), None),
            Streak { consecutive_days: 1, before_seven_count: 0 }
        );
    }

    #[test]
    fn consecutive_early_days_extend_both() {
        let last = prior(at(9, 6, 0), 4, 3);
        assert_eq!(
            evaluate(at(10, 6, 45), Some(&last)),
            Streak { consecutive_days: 5, before_seven_count: 4 }
        );
    }

    #[test]
    fn late_today_resets_only_the_early_streak() {
        let last = prior(at(9, 6, 0), 4, 3);
        assert_eq!(
            evaluate(at(10, 7, 30), Some(&last)),
            Streak { consecutive_days: 5, before_seven_count: 0 }
        );
    }

    #[test]
    fn late_yesterday_restarts_early_streak_at_one() {
        let last = prior(at(9, 8, 0), 4, 0);
        assert_eq!(
            evaluate(at(10, 6, 0), Some(&last)),
            Streak { consecutive_days: 5, before_seven_count: 1 }
        );
    }

    #[test]
    fn gap_resets_both() {
        let last = prior(at(7, 6, 0), 10, 10);
        assert_eq!(
            evaluate(at(10, 6, 0), Some(&last)),
            Streak { consecutive_days: 1, before_seven_count: 1 }
        );
        assert_eq!(
            evaluate(at(10, 8, 0), Some(&last)),
            Streak { consecutive_days: 1, before_seven_count: 0 }
        );
    }

    #[test]
    fn calendar_days_not_elapsed_hours_decide_continuity() {
        // 08:59 -> 05:00 next day is under 24h but still one calendar day apart.
        let last = prior(at(9, 8, 59), 2, 0);
        assert_eq!(evaluate(at(10, 5, 0), Some(&last)).consecutive_days, 3);
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let last_of_feb = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let last = prior(last_of_feb, 6, 6);
        assert_eq!(
            evaluate(at(1, 6, 0), Some(&last)),
            Streak { consecutive_days: 7, before_seven_count: 7 }
        );
    }

    #[test]
    fn window_is_half_open() {
        let window = AttendanceWindow::default();
        assert!(!window.contains(NaiveTime::from_hms_opt(4, 59, 59).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(5, 0, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(8, 59, 59).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    }

    #[test]
    fn window_rejects_bad_bounds() {
        assert!(AttendanceWindow::from_hours(9, 5).is_err());
        assert!(AttendanceWindow::from_hours(5, 5).is_err());
        assert!(AttendanceWindow::from_hours(5, 25).is_err());
        assert!(AttendanceWindow::from_hours(0, 24).is_ok());
    }

    #[test]
    fn check_in_outside_window_is_rejected() {
        let window = AttendanceWindow::default();
        assert_eq!(
            check_in(at(10, 10, 0), &window, None),
            Err(CheckInRejection::OutsideWindow)
        );
    }

    #[test]
    fn second_check_in_same_day_is_rejected() {
        let window = AttendanceWindow::default();
        let last = prior(at(10, 5, 10), 1, 1);
        assert_eq!(
            check_in(at(10, 6, 0), &window, Some(&last)),
            Err(CheckInRejection::AlreadyCheckedIn)
        );
    }

    #[test]
    fn check_in_accepts_and_evaluates() {
        let window = AttendanceWindow::default();
        let last = prior(at(9, 5, 10), 1, 1);
        assert_eq!(
            check_in(at(10, 6, 0), &window, Some(&last)),
            Ok(Streak { consecutive_days: 2, before_seven_count: 2 })
        );
    }

    #[test]
    fn milestone_ignores_zero_early_count() {
        assert!(!Streak { consecutive_days: 3, before_seven_count: 0 }.is_milestone());
        assert!(Streak { consecutive_days: 7, before_seven_count: 0 }.is_milestone());
        assert!(Streak { consecutive_days: 15, before_seven_count: 14 }.is_milestone());
        assert!(!Streak { consecutive_days: 8, before_seven_count: 1 }.is_milestone());
    }

    fn record(id: i64, day: u32, consecutive_days: i64, before_seven_count: i64) -> AttendanceRecord {
        let local = at(day, 6, 0);
        AttendanceRecord {
            id,
            user_id: 1,
            timestamp: local.and_utc(),
            attend_date: local.date(),
            consecutive_days,
            before_seven_count,
            created_at: local.and_utc(),
        }
    }

    #[test]
    fn summary_of_no_records_is_none() {
        assert!(AttendanceSummary::from_records(&[]).is_none());
    }

    #[test]
    fn summary_reports_latest_and_highest() {
        let records = vec![
            record(4, 12, 1, 0),
            record(3, 10, 5, 5),
            record(2, 9, 4, 4),
        ];
        let summary = AttendanceSummary::from_records(&records).unwrap();

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.current_streak, 1);
        assert_eq!(summary.highest_streak, 5);
        assert_eq!(summary.highest_before_seven, 5);
        assert_eq!(summary.latest, at(12, 6, 0).and_utc());
    }
}

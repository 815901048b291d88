use crate::database::models::{AttendanceRecord, TransactionKind};
use crate::database::queries;
use crate::utils::streak::{self, AttendanceWindow, CheckInRejection, PriorCheckIn, Streak};
use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    Recorded(AttendanceRecord),
    OutsideWindow,
    AlreadyCheckedIn,
}

/// Multi-statement balance and attendance operations.
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Adds `amount` to the recipient's balance and appends one `earn`
    /// entry, atomically. Returns the new balance.
    pub async fn credit(
        &self,
        sender_id: i64,
        recipient_id: i64,
        amount: i64,
        reason: &str,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(anyhow::anyhow!("Credit amount must be positive, got {}", amount));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO currencies (user_id, balance) VALUES (?, 0) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(recipient_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query("SELECT balance FROM currencies WHERE user_id = ?")
            .bind(recipient_id)
            .fetch_one(&mut *tx)
            .await?;
        let current: i64 = row.get("balance");
        // SQLite turns an overflowing integer sum into REAL.
        let balance = current.checked_add(amount).ok_or_else(|| {
            anyhow::anyhow!("Crediting {} Jam to user_id={} would overflow the balance", amount, recipient_id)
        })?;

        sqlx::query(
            "UPDATE currencies SET balance = ?, updated_at = CURRENT_TIMESTAMP WHERE user_id = ?",
        )
        .bind(balance)
        .bind(recipient_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO transactions (user_id, sender_id, recipient_id, kind, amount, reason)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(sender_id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(TransactionKind::Earn.as_str())
        .bind(amount)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Credited {} Jam to user_id={} from user_id={} (balance {})",
            amount,
            recipient_id,
            sender_id,
            balance
        );
        Ok(balance)
    }

    /// Evaluates the streak for a check-in at `now` and stores it when accepted.
    pub async fn record_attendance(
        &self,
        user_id: i64,
        now: DateTime<FixedOffset>,
        window: &AttendanceWindow,
    ) -> Result<CheckInOutcome> {
        let local_now = now.naive_local();

        let prior = queries::get_latest_attendance(&self.pool, user_id)
            .await?
            .map(|record| PriorCheckIn {
                at: record.timestamp.with_timezone(now.offset()).naive_local(),
                streak: Streak {
                    consecutive_days: record.consecutive_days,
                    before_seven_count: record.before_seven_count,
                },
            });

        let streak = match streak::check_in(local_now, window, prior.as_ref()) {
            Ok(streak) => streak,
            Err(CheckInRejection::OutsideWindow) => return Ok(CheckInOutcome::OutsideWindow),
            Err(CheckInRejection::AlreadyCheckedIn) => return Ok(CheckInOutcome::AlreadyCheckedIn),
        };

        match queries::create_attendance_record(
            &self.pool,
            user_id,
            now.to_utc(),
            local_now.date(),
            streak,
        )
        .await
        {
            Ok(record) => Ok(CheckInOutcome::Recorded(record)),
            // A concurrent check-in for the same day won the insert.
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!("Duplicate check-in for user_id={} on {}", user_id, local_now.date());
                Ok(CheckInOutcome::AlreadyCheckedIn)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use chrono::TimeZone;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn local(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        jst().with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    fn recorded(outcome: CheckInOutcome) -> AttendanceRecord {
        match outcome {
            CheckInOutcome::Recorded(record) => record,
            other => panic!("expected a recorded check-in, got {:?}", other),
        }
    }

    async fn setup() -> (SqlitePool, Ledger, i64) {
        let pool = test_pool().await;
        let (user, _) = queries::find_or_create_user(&pool, "100", "alice").await.unwrap();
        let ledger = Ledger::new(pool.clone());
        (pool, ledger, user.id)
    }

    #[tokio::test]
    async fn first_check_in_is_recorded() {
        let (pool, ledger, user_id) = setup().await;
        let window = AttendanceWindow::default();

        let outcome = ledger
            .record_attendance(user_id, local(10, 6, 30), &window)
            .await
            .unwrap();

        let record = recorded(outcome);
        assert_eq!(record.consecutive_days, 1);
        assert_eq!(record.before_seven_count, 1);
        assert_eq!(record.attend_date, local(10, 6, 30).date_naive());
        assert_eq!(queries::get_attendance_records(&pool, user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn outside_window_persists_nothing() {
        let (pool, ledger, user_id) = setup().await;
        let window = AttendanceWindow::default();

        let outcome = ledger
            .record_attendance(user_id, local(10, 9, 30), &window)
            .await
            .unwrap();

        assert!(matches!(outcome, CheckInOutcome::OutsideWindow));
        assert!(queries::get_attendance_records(&pool, user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_check_in_same_day_is_rejected() {
        let (pool, ledger, user_id) = setup().await;
        let window = AttendanceWindow::default();

        ledger.record_attendance(user_id, local(10, 5, 0), &window).await.unwrap();
        let outcome = ledger
            .record_attendance(user_id, local(10, 8, 0), &window)
            .await
            .unwrap();

        assert!(matches!(outcome, CheckInOutcome::AlreadyCheckedIn));
        assert_eq!(queries::get_attendance_records(&pool, user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn local_offset_decides_the_calendar_day() {
        let (_pool, ledger, user_id) = setup().await;
        let window = AttendanceWindow::default();

        // 06:00 JST on the 10th is 21:00 UTC on the 9th.
        let outcome = ledger
            .record_attendance(user_id, local(10, 6, 0), &window)
            .await
            .unwrap();

        let record = recorded(outcome);
        assert_eq!(record.attend_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(
            record.timestamp.date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
    }

    #[tokio::test]
    async fn insert_conflict_on_the_same_day_reports_already_checked_in() {
        let (pool, ledger, user_id) = setup().await;
        let window = AttendanceWindow::default();

        // Dated the 10th but stamped on the 9th locally: only the per-day
        // constraint can reject the next check-in.
        queries::create_attendance_record(
            &pool,
            user_id,
            local(9, 6, 0).to_utc(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            Streak { consecutive_days: 1, before_seven_count: 1 },
        )
        .await
        .unwrap();

        let outcome = ledger
            .record_attendance(user_id, local(10, 6, 0), &window)
            .await
            .unwrap();

        assert!(matches!(outcome, CheckInOutcome::AlreadyCheckedIn));
        assert_eq!(queries::get_attendance_records(&pool, user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn consecutive_days_extend_and_gaps_reset() {
        let (_pool, ledger, user_id) = setup().await;
        let window = AttendanceWindow::default();

        ledger.record_attendance(user_id, local(10, 6, 0), &window).await.unwrap();
        ledger.record_attendance(user_id, local(11, 7, 30), &window).await.unwrap();
        let outcome = ledger
            .record_attendance(user_id, local(13, 6, 0), &window)
            .await
            .unwrap();

        let record = recorded(outcome);
        assert_eq!(record.consecutive_days, 1);
        assert_eq!(record.before_seven_count, 1);
    }

    #[tokio::test]
    async fn credit_adds_to_balance_and_logs_one_transaction() {
        let (pool, ledger, user_id) = setup().await;
        let (system, _) = queries::find_or_create_user(&pool, "999", "jam-bot").await.unwrap();

        let first = ledger.credit(system.id, user_id, 5, "Admin granted Jam.").await.unwrap();
        assert_eq!(first, 5);

        let before = queries::get_balance(&pool, user_id).await.unwrap();
        let entries_before = queries::get_transactions_for_user(&pool, user_id, 100)
            .await
            .unwrap()
            .len();

        let after = ledger.credit(system.id, user_id, 7, "Admin granted Jam.").await.unwrap();
        assert_eq!(after, before + 7);
        assert_eq!(queries::get_balance(&pool, user_id).await.unwrap(), before + 7);

        let entries = queries::get_transactions_for_user(&pool, user_id, 100).await.unwrap();
        assert_eq!(entries.len(), entries_before + 1);

        let newest = &entries[0];
        assert_eq!(newest.transaction.amount, 7);
        assert_eq!(newest.transaction.kind, TransactionKind::Earn);
        assert_eq!(newest.transaction.sender_id, Some(system.id));
        assert_eq!(newest.transaction.recipient_id, Some(user_id));
        assert_eq!(newest.sender_discord_id.as_deref(), Some("999"));
        assert_eq!(newest.recipient_discord_id.as_deref(), Some("100"));
        assert_eq!(newest.transaction.reason.as_deref(), Some("Admin granted Jam."));
    }

    #[tokio::test]
    async fn non_positive_credit_is_rejected_without_side_effects() {
        let (pool, ledger, user_id) = setup().await;
        let (system, _) = queries::find_or_create_user(&pool, "999", "jam-bot").await.unwrap();

        assert!(ledger.credit(system.id, user_id, 0, "nothing").await.is_err());
        assert!(ledger.credit(system.id, user_id, -3, "theft").await.is_err());
        assert_eq!(queries::get_balance(&pool, user_id).await.unwrap(), 0);
        assert!(queries::get_transactions_for_user(&pool, user_id, 100)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn credit_to_unknown_user_fails_and_rolls_back() {
        let (pool, ledger, user_id) = setup().await;

        assert!(ledger.credit(user_id, 4242, 10, "ghost").await.is_err());
        assert!(queries::get_transactions_for_user(&pool, user_id, 100)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn overflowing_credit_is_rejected_and_rolled_back() {
        let (pool, ledger, user_id) = setup().await;
        let (system, _) = queries::find_or_create_user(&pool, "999", "jam-bot").await.unwrap();

        ledger.credit(system.id, user_id, i64::MAX - 1, "Admin granted Jam.").await.unwrap();
        assert!(ledger.credit(system.id, user_id, 5, "Admin granted Jam.").await.is_err());

        assert_eq!(queries::get_balance(&pool, user_id).await.unwrap(), i64::MAX - 1);
        assert_eq!(
            queries::get_transactions_for_user(&pool, user_id, 100).await.unwrap().len(),
            1
        );
    }
}

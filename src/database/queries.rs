use crate::database::models::{
    AttendanceRecord, CurrencyBalance, Transaction, TransactionEntry, User,
};
use crate::utils::streak::Streak;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str = "id, discord_id, username, created_at";
const ATTENDANCE_COLUMNS: &str =
    "id, user_id, timestamp, attend_date, consecutive_days, before_seven_count, created_at";

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        discord_id: row.get("discord_id"),
        username: row.get("username"),
        created_at: row.get("created_at"),
    }
}

fn transaction_entry_from_row(row: &SqliteRow) -> Result<TransactionEntry> {
    let kind: String = row.get("kind");
    Ok(TransactionEntry {
        transaction: Transaction {
            id: row.get("id"),
            user_id: row.get("user_id"),
            sender_id: row.get("sender_id"),
            recipient_id: row.get("recipient_id"),
            kind: kind.parse()?,
            amount: row.get("amount"),
            reason: row.get("reason"),
            created_at: row.get("created_at"),
        },
        sender_discord_id: row.get("sender_discord_id"),
        recipient_discord_id: row.get("recipient_discord_id"),
    })
}

fn attendance_from_row(row: &SqliteRow) -> AttendanceRecord {
    AttendanceRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        timestamp: row.get("timestamp"),
        attend_date: row.get("attend_date"),
        consecutive_days: row.get("consecutive_days"),
        before_seven_count: row.get("before_seven_count"),
        created_at: row.get("created_at"),
    }
}

// User queries

/// Returns the user and whether this call created it.
pub async fn find_or_create_user(
    pool: &SqlitePool,
    discord_id: &str,
    username: &str,
) -> Result<(User, bool)> {
    let result = sqlx::query(
        "INSERT INTO users (discord_id, username) VALUES (?, ?) ON CONFLICT (discord_id) DO NOTHING",
    )
    .bind(discord_id)
    .bind(username)
    .execute(pool)
    .await?;

    let created = result.rows_affected() == 1;

    let user = get_user_by_discord_id(pool, discord_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", discord_id))?;

    Ok((user, created))
}

pub async fn get_user_by_discord_id(pool: &SqlitePool, discord_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE discord_id = ?"))
        .bind(discord_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

// Attendance queries

pub async fn create_attendance_record(
    pool: &SqlitePool,
    user_id: i64,
    timestamp: DateTime<Utc>,
    attend_date: NaiveDate,
    streak: Streak,
) -> Result<AttendanceRecord> {
    let result = sqlx::query(
        "INSERT INTO attendance (user_id, timestamp, attend_date, consecutive_days, before_seven_count)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(timestamp)
    .bind(attend_date)
    .bind(streak.consecutive_days)
    .bind(streak.before_seven_count)
    .execute(pool)
    .await?;

    let record_id = result.last_insert_rowid();
    get_attendance_record_by_id(pool, record_id).await
}

pub async fn get_attendance_record_by_id(
    pool: &SqlitePool,
    record_id: i64,
) -> Result<AttendanceRecord> {
    let row = sqlx::query(&format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?"))
        .bind(record_id)
        .fetch_one(pool)
        .await?;

    Ok(attendance_from_row(&row))
}

pub async fn get_latest_attendance(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<AttendanceRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance
         WHERE user_id = ?
         ORDER BY timestamp DESC
         LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(attendance_from_row))
}

/// Newest first.
pub async fn get_attendance_records(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance
         WHERE user_id = ?
         ORDER BY timestamp DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(attendance_from_row).collect())
}

// Currency queries

pub async fn get_currency(pool: &SqlitePool, user_id: i64) -> Result<Option<CurrencyBalance>> {
    let row = sqlx::query(
        "SELECT id, user_id, balance, created_at, updated_at FROM currencies WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| CurrencyBalance {
        id: row.get("id"),
        user_id: row.get("user_id"),
        balance: row.get("balance"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

/// Users without a balance row hold zero.
pub async fn get_balance(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    Ok(get_currency(pool, user_id)
        .await?
        .map_or(0, |currency| currency.balance))
}

/// Entries the user took part in as owner, sender or recipient, newest first.
pub async fn get_transactions_for_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<TransactionEntry>> {
    let rows = sqlx::query(
        "SELECT t.id, t.user_id, t.sender_id, t.recipient_id, t.kind, t.amount, t.reason, t.created_at,
                s.discord_id AS sender_discord_id, r.discord_id AS recipient_discord_id
         FROM transactions t
         LEFT JOIN users s ON s.id = t.sender_id
         LEFT JOIN users r ON r.id = t.recipient_id
         WHERE t.user_id = ? OR t.sender_id = ? OR t.recipient_id = ?
         ORDER BY t.created_at DESC, t.id DESC
         LIMIT ?",
    )
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(transaction_entry_from_row).collect()
}

use anyhow::Result;
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::streak::AttendanceWindow;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub guild_id: Option<u64>,
    pub admin_role_id: Option<u64>,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: Option<String>,
    pub gemini_timeout: Duration,
    pub utc_offset: FixedOffset,
    pub attend_window: AttendanceWindow,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY environment variable is required"))?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:jam.db".to_string());

        let gemini_model =
            lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string());

        let gemini_base_url = lookup("GEMINI_BASE_URL").filter(|url| !url.trim().is_empty());

        let timeout_secs = parse_optional::<u64>(&lookup, "GEMINI_TIMEOUT_SECS")?.unwrap_or(15);
        if timeout_secs == 0 {
            return Err(anyhow::anyhow!("GEMINI_TIMEOUT_SECS must be at least 1"));
        }
        let gemini_timeout = Duration::from_secs(timeout_secs);

        let guild_id = parse_optional::<u64>(&lookup, "GUILD_ID")?;
        let admin_role_id = parse_optional::<u64>(&lookup, "ADMIN_ROLE_ID")?;

        let offset_hours = parse_optional::<i32>(&lookup, "UTC_OFFSET_HOURS")?.unwrap_or(9);
        if !(-12..=14).contains(&offset_hours) {
            return Err(anyhow::anyhow!(
                "UTC_OFFSET_HOURS must be between -12 and 14, got {}",
                offset_hours
            ));
        }
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| anyhow::anyhow!("Invalid UTC offset: {}", offset_hours))?;

        let window_start = parse_optional::<u32>(&lookup, "ATTEND_WINDOW_START")?.unwrap_or(5);
        let window_end = parse_optional::<u32>(&lookup, "ATTEND_WINDOW_END")?.unwrap_or(9);
        let attend_window = AttendanceWindow::from_hours(window_start, window_end)?;

        Ok(Config {
            discord_token,
            database_url,
            guild_id,
            admin_role_id,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            gemini_timeout,
            utc_offset,
            attend_window,
        })
    }
}

fn parse_optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        _ => Ok(None),
    }
}

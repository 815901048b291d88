use crate::database::models::TransactionEntry;
use crate::utils::streak::{AttendanceSummary, AttendanceWindow, Streak};
use crate::utils::time::{format_datetime_local, format_hour};
use chrono::FixedOffset;
use poise::serenity_prelude as serenity;

const GREEN: u32 = 0x00ff00;
const RED: u32 = 0xff0000;
const BLUE: u32 = 0x0099ff;
const YELLOW: u32 = 0xffcc00;

pub const GENERIC_FAILURE: &str = "There was an error while executing this command!";

pub fn format_error_message(error: &str) -> String {
    format!("❌ {}", error)
}

pub fn format_balance_message(balance: i64) -> String {
    format!("💰 Your current balance is **{} Jams**.", balance)
}

// Embed utility functions
pub fn create_success_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(GREEN)
        .timestamp(chrono::Utc::now())
}

pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(RED)
        .timestamp(chrono::Utc::now())
}

pub fn create_info_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(BLUE)
        .timestamp(chrono::Utc::now())
}

pub fn create_warning_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(YELLOW)
        .timestamp(chrono::Utc::now())
}

pub fn not_registered_embed() -> serenity::CreateEmbed {
    create_error_embed(
        "Not Registered ❌",
        "You are not registered.\nPlease use `/register` to sign up first.",
    )
}

pub fn attendance_closed_embed(window: &AttendanceWindow) -> serenity::CreateEmbed {
    create_warning_embed(
        "Attendance Closed ⏰",
        &format!(
            "Attendance can only be marked between {} and {}.\nPlease try again during this time period.",
            format_hour(window.start_hour()),
            format_hour(window.end_hour())
        ),
    )
}

pub fn already_checked_in_embed() -> serenity::CreateEmbed {
    create_info_embed(
        "Already Checked In",
        "You have already marked your attendance for today.\nSee you tomorrow!",
    )
}

pub fn attendance_recorded_embed(
    display_name: &str,
    time: &str,
    streak: &Streak,
) -> serenity::CreateEmbed {
    let mut embed = create_success_embed(
        "Attendance Recorded ✅",
        &format!(
            "Hello, **{}**! Your attendance has been recorded at **{}**.",
            display_name, time
        ),
    )
    .field("Current Streak 🎯", format!("{} day(s)", streak.consecutive_days), true)
    .field("Before 7:00 AM 🌞", format!("{} day(s)", streak.before_seven_count), true);

    if streak.is_milestone() {
        embed = embed.field(
            "Milestone 🎉",
            "Amazing! You've reached a milestone with your attendance streak!",
            false,
        );
    }

    embed
}

pub fn registration_embed(
    display_name: &str,
    username: &str,
    created: bool,
    avatar_url: &str,
) -> serenity::CreateEmbed {
    let (title, description, footer) = if created {
        (
            "Registration Successful 🎉",
            format!(
                "Welcome, **{}**!\nYou have successfully signed up as **{}**.",
                display_name, username
            ),
            "Thank you for joining the attendance system!",
        )
    } else {
        (
            "Already Registered",
            format!(
                "Hello again, **{}**!\nYou are already registered in the system.",
                display_name
            ),
            "Feel free to continue using the system!",
        )
    };

    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(if created { GREEN } else { BLUE })
        .thumbnail(avatar_url)
        .footer(serenity::CreateEmbedFooter::new(footer))
        .timestamp(chrono::Utc::now())
}

pub fn no_records_embed() -> serenity::CreateEmbed {
    create_warning_embed(
        "No Attendance Records 📅",
        "You have no attendance records yet. Use **/attend** to mark your first attendance!",
    )
}

pub fn record_summary_embed(
    display_name: &str,
    summary: &AttendanceSummary,
    offset: FixedOffset,
    analysis: &str,
    model: &str,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(format!("Attendance Summary for {} 🎉", display_name))
        .color(GREEN)
        .field(
            "📌 Latest Attendance",
            format_datetime_local(summary.latest, offset),
            false,
        )
        .field("🔥 Current Streak", format!("{} day(s)", summary.current_streak), true)
        .field("🏆 Highest Streak", format!("{} day(s)", summary.highest_streak), true)
        .field(
            "⏰ Streak Before 7:00",
            format!("{} day(s)", summary.highest_before_seven),
            true,
        )
        .field("📊 Total Records", summary.total_records.to_string(), true)
        .field("💡 AI Analysis", analysis, false)
        .footer(serenity::CreateEmbedFooter::new(model))
        .timestamp(chrono::Utc::now())
}

pub fn jam_added_embed(
    amount: i64,
    recipient_name: &str,
    recipient_discord_id: &str,
    new_balance: i64,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Jam Added Successfully")
        .description(format!(
            "🎉 **{} Jam** has been added to {}'s balance by the system.",
            amount, recipient_name
        ))
        .color(GREEN)
        .field("Recipient", format!("<@{}>", recipient_discord_id), true)
        .field("Sender", "System (Bot)", true)
        .field("New Balance", format!("{} Jam", new_balance), true)
        .footer(serenity::CreateEmbedFooter::new("Jam System"))
        .timestamp(chrono::Utc::now())
}

fn mention(discord_id: Option<&str>) -> String {
    match discord_id {
        Some(id) => format!("<@{}>", id),
        None => "System".to_string(),
    }
}

/// Lists entries from the point of view of `user_id`.
pub fn transactions_embed(
    user_id: i64,
    entries: &[TransactionEntry],
    offset: FixedOffset,
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("💰 Your Transaction History")
        .description("Here are your recent transactions:")
        .color(BLUE)
        .footer(serenity::CreateEmbedFooter::new("Jam System"))
        .timestamp(chrono::Utc::now());

    for entry in entries {
        let transaction = &entry.transaction;
        let is_sender = transaction.sender_id == Some(user_id);
        let (direction, counterpart) = if is_sender {
            ("Sent", mention(entry.recipient_discord_id.as_deref()))
        } else {
            ("Received", mention(entry.sender_discord_id.as_deref()))
        };
        let reason = transaction.reason.as_deref().unwrap_or("No reason provided.");

        embed = embed.field(
            format!("{} {} Jam", direction, transaction.amount),
            format!(
                "**With:** {}\n**Reason:** {}\n**Date:** {}",
                counterpart,
                reason,
                format_datetime_local(transaction.created_at, offset)
            ),
            false,
        );
    }

    embed
}

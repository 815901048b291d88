use crate::bot::{Context, Error};
use crate::database::queries;
use crate::utils::analysis::build_prompt;
use crate::utils::format::{
    already_checked_in_embed, attendance_closed_embed, attendance_recorded_embed,
    no_records_embed, not_registered_embed, record_summary_embed, registration_embed,
};
use crate::utils::ledger::{CheckInOutcome, Ledger};
use crate::utils::streak::{AttendanceSummary, Streak};
use crate::utils::time::{format_time_local, now_in};
use poise::serenity_prelude as serenity;

fn display_name(user: &serenity::User) -> &str {
    user.global_name.as_deref().unwrap_or(&user.name)
}

async fn reply_ephemeral(ctx: Context<'_>, embed: serenity::CreateEmbed) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// ✅ Sign up to participate in the attendance system.
#[poise::command(slash_command)]
pub async fn register(ctx: Context<'_>) -> Result<(), Error> {
    let author = ctx.author();
    let discord_id = author.id.to_string();
    let pool = &ctx.data().pool;

    let (user, created) = queries::find_or_create_user(pool, &discord_id, &author.name).await?;
    if created {
        tracing::info!("Registered {} as user_id={}", author.name, user.id);
    }

    let embed = registration_embed(display_name(author), &user.username, created, &author.face());
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// ➡️ Mark your attendance during the morning window.
#[poise::command(slash_command)]
pub async fn attend(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let offset = data.config.utc_offset;
    let window = data.config.attend_window;
    let now = now_in(offset);

    if !window.contains(now.time()) {
        return reply_ephemeral(ctx, attendance_closed_embed(&window)).await;
    }

    let discord_id = ctx.author().id.to_string();
    let Some(user) = queries::get_user_by_discord_id(&data.pool, &discord_id).await? else {
        return reply_ephemeral(ctx, not_registered_embed()).await;
    };

    let ledger = Ledger::new(data.pool.clone());
    match ledger.record_attendance(user.id, now, &window).await? {
        CheckInOutcome::Recorded(record) => {
            let streak = Streak {
                consecutive_days: record.consecutive_days,
                before_seven_count: record.before_seven_count,
            };
            tracing::info!(
                "Attendance for user_id={} on {}: streak {} / early {}",
                user.id,
                record.attend_date,
                streak.consecutive_days,
                streak.before_seven_count
            );

            let embed = attendance_recorded_embed(
                display_name(ctx.author()),
                &format_time_local(record.timestamp, offset),
                &streak,
            );
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        CheckInOutcome::AlreadyCheckedIn => {
            reply_ephemeral(ctx, already_checked_in_embed()).await?;
        }
        CheckInOutcome::OutsideWindow => {
            reply_ephemeral(ctx, attendance_closed_embed(&window)).await?;
        }
    }

    Ok(())
}

/// 📊 View your attendance records, milestones, and analysis.
#[poise::command(slash_command)]
pub async fn record(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let discord_id = ctx.author().id.to_string();

    let Some(user) = queries::get_user_by_discord_id(&data.pool, &discord_id).await? else {
        return reply_ephemeral(ctx, not_registered_embed()).await;
    };

    let records = queries::get_attendance_records(&data.pool, user.id).await?;
    let Some(summary) = AttendanceSummary::from_records(&records) else {
        return reply_ephemeral(ctx, no_records_embed()).await;
    };

    // Generation can outlast Discord's three second reply deadline.
    ctx.defer().await?;

    let name = display_name(ctx.author());
    let prompt = build_prompt(name, &summary, data.config.utc_offset);
    let analysis = data.gemini.generate(&prompt).await;

    let embed = record_summary_embed(
        name,
        &summary,
        data.config.utc_offset,
        &analysis,
        data.gemini.model(),
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

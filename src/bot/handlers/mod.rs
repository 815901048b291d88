use crate::bot::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            ctx.set_activity(Some(serenity::ActivityData::custom("Just Do It ☑️")));
            tracing::info!(
                "Bot logged in as {} (system user id {})",
                data_about_bot.user.name,
                data.system_user_id
            );
        }
        _ => {}
    }
    Ok(())
}

pub mod commands;
pub mod handlers;

use crate::config::Config;
use crate::database::{self, queries};
use crate::utils::analysis::{self, GeminiClient};
use crate::utils::format::GENERIC_FAILURE;
use sqlx::SqlitePool;
use anyhow::Result;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Clone)]
pub struct Data {
    pub pool: SqlitePool,
    pub config: Config,
    pub gemini: GeminiClient,
    /// Database id of the bot's own account; sender of admin grants.
    pub system_user_id: i64,
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;

    let mut gemini = GeminiClient::new(
        analysis::http_client(config.gemini_timeout)?,
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    );
    if let Some(base_url) = &config.gemini_base_url {
        gemini = gemini.with_base_url(base_url.clone());
    }

    let intents = serenity::GatewayIntents::non_privileged();
    let token = config.discord_token.clone();

    let options = poise::FrameworkOptions {
        commands: commands::all(),
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                tracing::debug!(
                    "Executing /{} for {}",
                    ctx.command().qualified_name,
                    ctx.author().name
                );
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(handlers::event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    // Startup work that can fail runs before the gateway connects.
    let http = Arc::new(serenity::Http::new(&token));
    let application = http.get_current_application_info().await?;
    http.set_application_id(application.id);

    match config.guild_id {
        Some(guild_id) => {
            poise::builtins::register_in_guild(&http, &options.commands, serenity::GuildId::new(guild_id))
                .await?;
            tracing::info!("Registered {} commands in guild {}", options.commands.len(), guild_id);
        }
        None => {
            poise::builtins::register_globally(&http, &options.commands).await?;
            tracing::info!("Registered {} commands globally", options.commands.len());
        }
    }

    let bot_user = http.get_current_user().await?;
    let (system_user, _) =
        queries::find_or_create_user(&pool, &bot_user.id.to_string(), &bot_user.name).await?;

    let data = Data {
        pool,
        config,
        gemini,
        system_user_id: system_user.id,
    };

    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |_ctx, _ready, _framework| Box::pin(async move { Ok(data) }))
        .build();

    let client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                "Error in command `{}` for {} ({}): {:?}",
                ctx.command().name,
                ctx.author().name,
                ctx.author().id,
                error
            );
            let reply = poise::CreateReply::default()
                .content(GENERIC_FAILURE)
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::error!("Failed to send failure notice: {:?}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                tracing::error!("Check for `{}` failed: {:?}", ctx.command().name, error);
            }
            let reply = poise::CreateReply::default()
                .content("❌ You do not have permission to use this command.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::error!("Failed to send permission notice: {:?}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn startup_failure_is_returned_to_the_caller() {
        let config = Config::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("token".to_string()),
            "GEMINI_API_KEY" => Some("key".to_string()),
            "DATABASE_URL" => Some("sqlite:/nonexistent-jam-dir/jam.db".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(create_bot(config).await.is_err());
    }
}

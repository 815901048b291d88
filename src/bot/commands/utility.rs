use crate::bot::{Context, Error};

/// Provides information about the user.
#[poise::command(slash_command)]
pub async fn user(ctx: Context<'_>) -> Result<(), Error> {
    let name = ctx.author().name.clone();
    let joined_at = ctx
        .author_member()
        .await
        .and_then(|member| member.joined_at);

    let message = match joined_at {
        Some(joined_at) => format!(
            "This command was run by {}, who joined on {}.",
            name,
            joined_at.format("%Y-%m-%d")
        ),
        None => format!(
            "This command was run by {}, but we couldn't retrieve the join date.",
            name
        ),
    };
    ctx.say(message).await?;

    Ok(())
}

/// Provides information about the server.
#[poise::command(slash_command)]
pub async fn server(ctx: Context<'_>) -> Result<(), Error> {
    if ctx.guild_id().is_none() {
        ctx.say("This command was run outside of a server.").await?;
        return Ok(());
    }

    let cached = ctx.guild().map(|guild| (guild.name.clone(), guild.member_count));
    let details = match cached {
        Some(details) => Some(details),
        None => ctx.partial_guild().await.map(|guild| {
            (guild.name, guild.approximate_member_count.unwrap_or_default())
        }),
    };

    let message = match details {
        Some((name, member_count)) => {
            format!("This server is {}, and has {} members.", name, member_count)
        }
        None => "This command was run outside of a server.".to_string(),
    };
    ctx.say(message).await?;

    Ok(())
}

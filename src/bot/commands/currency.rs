use crate::bot::{Context, Error};
use crate::database::queries;
use crate::utils::format::{
    format_balance_message, format_error_message, jam_added_embed, transactions_embed,
};
use crate::utils::ledger::Ledger;
use poise::serenity_prelude as serenity;

const ADMIN_GRANT_REASON: &str = "Admin granted Jam.";
const TRANSACTION_HISTORY_LIMIT: i64 = 10;

async fn say_ephemeral(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content.into())
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// 💰 Check your current balance.
#[poise::command(slash_command)]
pub async fn balance(ctx: Context<'_>) -> Result<(), Error> {
    let pool = &ctx.data().pool;
    let discord_id = ctx.author().id.to_string();

    let Some(user) = queries::get_user_by_discord_id(pool, &discord_id).await? else {
        return say_ephemeral(
            ctx,
            format_error_message("You are not registered. Use `/register` to sign up!"),
        )
        .await;
    };

    let balance = queries::get_balance(pool, user.id).await?;
    say_ephemeral(ctx, format_balance_message(balance)).await
}

/// 📜 View your transaction history.
#[poise::command(slash_command)]
pub async fn transactions(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let discord_id = ctx.author().id.to_string();

    let Some(user) = queries::get_user_by_discord_id(&data.pool, &discord_id).await? else {
        return say_ephemeral(
            ctx,
            format_error_message(
                "You are not registered in the system. Please use `/register` to sign up first.",
            ),
        )
        .await;
    };

    let entries =
        queries::get_transactions_for_user(&data.pool, user.id, TRANSACTION_HISTORY_LIMIT).await?;
    if entries.is_empty() {
        return say_ephemeral(ctx, "📭 You have no transactions yet.").await;
    }

    let embed = transactions_embed(user.id, &entries, data.config.utc_offset);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Add Jam to a user's balance.
#[poise::command(slash_command, guild_only, check = "is_admin")]
pub async fn addjam(
    ctx: Context<'_>,
    #[description = "The user to whom Jam will be added."] user: serenity::User,
    #[description = "The amount of Jam to add."]
    #[min = 1]
    #[max = 1000000]
    amount: i64,
) -> Result<(), Error> {
    let data = ctx.data();

    let Some(recipient) = queries::get_user_by_discord_id(&data.pool, &user.id.to_string()).await?
    else {
        return say_ephemeral(
            ctx,
            format_error_message(&format!(
                "The user {} is not registered in the system.",
                user.name
            )),
        )
        .await;
    };

    let ledger = Ledger::new(data.pool.clone());
    let new_balance = ledger
        .credit(data.system_user_id, recipient.id, amount, ADMIN_GRANT_REASON)
        .await?;

    let embed = jam_added_embed(amount, &user.name, &user.id.to_string(), new_balance);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn grants_admin(
    permissions: Option<serenity::Permissions>,
    roles: &[serenity::RoleId],
    admin_role_id: Option<u64>,
) -> bool {
    let is_administrator = permissions.is_some_and(|p| p.administrator());
    let has_admin_role =
        admin_role_id.is_some_and(|admin| roles.iter().any(|role| role.get() == admin));
    is_administrator || has_admin_role
}

/// Administrator permission, or the configured admin role.
async fn is_admin(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };
    Ok(grants_admin(
        member.permissions,
        &member.roles,
        ctx.data().config.admin_role_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_permission_grants_access() {
        assert!(grants_admin(Some(serenity::Permissions::ADMINISTRATOR), &[], None));
        assert!(!grants_admin(Some(serenity::Permissions::SEND_MESSAGES), &[], None));
        assert!(!grants_admin(None, &[], None));
    }

    #[test]
    fn configured_role_grants_access() {
        let roles = [serenity::RoleId::new(10), serenity::RoleId::new(42)];
        assert!(grants_admin(None, &roles, Some(42)));
        assert!(!grants_admin(None, &roles, Some(7)));
        assert!(!grants_admin(None, &[], Some(42)));
    }
}

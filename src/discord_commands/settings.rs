use std::{fmt::Write, sync::Arc, time::Duration};

use poise::serenity_prelude::{ButtonStyle, CreateComponents, MessageComponentInteraction, User};

use crate::{
    db::queries::config::ConfigKey,
    discord_commands::forms::{collect_form, FormField},
    parse_color, AccessCheck, BotData, Context, Embed, Error,
};

const MENU_TIMEOUT: Duration = Duration::from_secs(180);

const ADD_USER: &str = "settings.add_user";
const REMOVE_USER: &str = "settings.remove_user";
const SET_PREFIX: &str = "settings.prefix";
const SET_STATUS: &str = "settings.status";
const SET_COLOR: &str = "settings.color";
const SET_HENRIK: &str = "settings.henrik";
const SET_IMGFLIP: &str = "settings.imgflip";

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// Manage bot settings (Owner Only)
pub async fn settings(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_owner().await?;

    let data = ctx.data().clone();

    let embed = menu_embed(&data).await?;
    let reply = ctx
        .send(|b| {
            b.embed(|e| embed.create_embed(e))
                .components(menu_components)
                .ephemeral(true)
        })
        .await?;

    let message = reply.message().await?.into_owned();

    while let Some(interaction) = message
        .await_component_interaction(ctx)
        .author_id(ctx.author().id)
        .timeout(MENU_TIMEOUT)
        .await
    {
        match interaction.data.custom_id.as_str() {
            ADD_USER => add_user(&ctx, &data, interaction.clone()).await?,
            REMOVE_USER => remove_user(&ctx, &data, interaction.clone()).await?,
            SET_PREFIX => {
                set_value(&ctx, &data, interaction.clone(), "Set Prefix", ConfigKey::BotPrefix)
                    .await?
            }
            SET_STATUS => {
                set_value(
                    &ctx,
                    &data,
                    interaction.clone(),
                    "Set Status Message",
                    ConfigKey::BotStatusMessage,
                )
                .await?
            }
            SET_COLOR => set_color(&ctx, &data, interaction.clone()).await?,
            SET_HENRIK => set_api_key(&ctx, &data, interaction.clone()).await?,
            SET_IMGFLIP => set_imgflip(&ctx, &data, interaction.clone()).await?,
            _ => continue,
        }

        refresh_menu(&ctx, &reply, &data).await?;
    }

    reply.edit(ctx, |b| b.components(|c| c)).await.ok();

    Ok(())
}

fn menu_components(c: &mut CreateComponents) -> &mut CreateComponents {
    c.create_action_row(|r| {
        r.create_button(|b| b.custom_id(ADD_USER).label("Add User").style(ButtonStyle::Success));
        r.create_button(|b| {
            b.custom_id(REMOVE_USER).label("Remove User").style(ButtonStyle::Danger)
        })
    })
    .create_action_row(|r| {
        r.create_button(|b| b.custom_id(SET_PREFIX).label("Prefix").style(ButtonStyle::Secondary));
        r.create_button(|b| b.custom_id(SET_STATUS).label("Status").style(ButtonStyle::Secondary));
        r.create_button(|b| {
            b.custom_id(SET_COLOR).label("Embed Color").style(ButtonStyle::Secondary)
        })
    })
    .create_action_row(|r| {
        r.create_button(|b| {
            b.custom_id(SET_HENRIK).label("Henrik API Key").style(ButtonStyle::Secondary)
        });
        r.create_button(|b| {
            b.custom_id(SET_IMGFLIP).label("imgflip Login").style(ButtonStyle::Secondary)
        })
    })
}

async fn menu_embed(data: &BotData) -> Result<Embed, Error> {
    let prefix = data.prefix().await?;
    let status = data.status_message().await?;
    let color = data.embed_color().await?;
    let color_value = data
        .get_config_string(ConfigKey::UiEmbedColor)
        .await?
        .unwrap_or_else(|| "default".to_string());

    let mut allowed = format!("<@{}> (owner)", data.owner_id.0);
    for user_id in data.allowed_users().await? {
        write!(&mut allowed, ", <@{}>", (*user_id).0)?;
    }

    let mut value = String::new();
    write!(&mut value, "**Prefix:** {}\n", prefix)?;
    write!(&mut value, "**Status:** {}\n", status)?;
    write!(&mut value, "**Allowed Users:** {}\n", allowed)?;
    write!(&mut value, "**Embed Color:** {}", color_value)?;

    Ok(Embed::default()
        .color(color)
        .title("Bot Settings")
        .description("Choose a setting to modify:")
        .field("Current Settings", value, false))
}

async fn refresh_menu<'a>(
    ctx: &Context<'a>,
    reply: &poise::ReplyHandle<'a>,
    data: &BotData,
) -> Result<(), Error> {
    let embed = menu_embed(data).await?;
    reply
        .edit(*ctx, |b| {
            b.embed(|e| embed.create_embed(e)).components(menu_components)
        })
        .await?;

    Ok(())
}

async fn add_user(
    ctx: &Context<'_>,
    data: &BotData,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let fields = [FormField::short("User ID").placeholder("Enter user ID to add")];
    let values = match collect_form(ctx, interaction, "Add User", &fields, MENU_TIMEOUT).await? {
        Some(values) => values,
        None => return Ok(()),
    };

    let (msg, err) = match values[0].trim().parse::<u64>() {
        Ok(user_id) => match data.add_allowed_user(user_id.into(), ctx.created_at()).await {
            Ok(true) => (format!("Added user <@{}> to allowed users.", user_id), false),
            Ok(false) => ("User already in allowed list.".to_string(), true),
            Err(e) => (format!("Error adding allowed user: {:?}", e), true),
        },
        Err(_) => ("Invalid user ID.".to_string(), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

async fn remove_user(
    ctx: &Context<'_>,
    data: &BotData,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let fields = [FormField::short("User ID").placeholder("Enter user ID to remove")];
    let values = match collect_form(ctx, interaction, "Remove User", &fields, MENU_TIMEOUT).await? {
        Some(values) => values,
        None => return Ok(()),
    };

    let (msg, err) = match values[0].trim().parse::<u64>() {
        // The owner isn't stored in the allow-list so removal falls out as
        // "not in allowed list" without a special case
        Ok(user_id) => match data.remove_allowed_user(user_id.into()).await {
            Ok(true) => (format!("Removed user <@{}> from allowed users.", user_id), false),
            Ok(false) => ("Cannot remove owner or user not in allowed list.".to_string(), true),
            Err(e) => (format!("Error removing allowed user: {:?}", e), true),
        },
        Err(_) => ("Invalid user ID.".to_string(), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

async fn set_value(
    ctx: &Context<'_>,
    data: &BotData,
    interaction: Arc<MessageComponentInteraction>,
    title: &str,
    key: ConfigKey,
) -> Result<(), Error> {
    let current = data.get_config_string(key).await?;
    let mut field = FormField::short("Value");
    if let Some(current) = current {
        field = field.prefill(current);
    }

    let values = match collect_form(ctx, interaction, title, &[field], MENU_TIMEOUT).await? {
        Some(values) => values,
        None => return Ok(()),
    };

    let (msg, err) = match data
        .set_config(key, values[0].trim().to_string(), ctx.created_at())
        .await
    {
        Ok(()) => (format!("{} updated.", key), false),
        Err(e) => (format!("Error updating {}: {:?}", key, e), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

async fn set_color(
    ctx: &Context<'_>,
    data: &BotData,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let fields = [FormField::short("Embed Color").placeholder("Hex colour, e.g. 0x3498db")];
    let values = match collect_form(ctx, interaction, "Set Embed Color", &fields, MENU_TIMEOUT)
        .await?
    {
        Some(values) => values,
        None => return Ok(()),
    };

    let value = values[0].trim().to_string();
    if parse_color(&value).is_none() {
        Embed::error()
            .description("That doesn't look like a hex colour. Try something like 0x3498db.")
            .send(ctx)
            .await?;
        return Ok(());
    }

    let (msg, err) = match data
        .set_config(ConfigKey::UiEmbedColor, value, ctx.created_at())
        .await
    {
        Ok(()) => ("Embed colour updated.".to_string(), false),
        Err(e) => (format!("Error updating embed colour: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

async fn set_api_key(
    ctx: &Context<'_>,
    data: &BotData,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let current = data.get_config_string(ConfigKey::ApiHenrikKey).await?;

    let mut current_field = FormField::short("Current API Key (Read Only)");
    current_field = match current {
        Some(current) => current_field.prefill(current),
        None => current_field.placeholder("No key set"),
    };
    let fields = [
        current_field,
        FormField::short("New API Key").placeholder("Enter your new HenrikDev API key"),
    ];

    let values =
        match collect_form(ctx, interaction, "Set Henrik API Key", &fields, MENU_TIMEOUT).await? {
            Some(values) => values,
            None => return Ok(()),
        };

    if values[1] == values[0] {
        Embed::default().description("No changes made to API key.").send(ctx).await?;
        return Ok(());
    }

    let (msg, err) = match data
        .set_config(ConfigKey::ApiHenrikKey, values[1].trim().to_string(), ctx.created_at())
        .await
    {
        Ok(()) => ("Henrik API key updated successfully!".to_string(), false),
        Err(e) => (format!("Error saving API key: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

async fn set_imgflip(
    ctx: &Context<'_>,
    data: &BotData,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let fields = [
        FormField::short("imgflip Username").placeholder("Account used for meme captioning"),
        FormField::short("imgflip Password"),
    ];

    let values =
        match collect_form(ctx, interaction, "Set imgflip Login", &fields, MENU_TIMEOUT).await? {
            Some(values) => values,
            None => return Ok(()),
        };

    let timestamp = ctx.created_at();
    let result = async {
        data.set_config(ConfigKey::ApiImgflipUser, values[0].trim().to_string(), timestamp)
            .await?;
        data.set_config(ConfigKey::ApiImgflipPass, values[1].clone(), timestamp).await
    }
    .await;

    let (msg, err) = match result {
        Ok(()) => ("imgflip login updated successfully!".to_string(), false),
        Err(e) => (format!("Error saving imgflip login: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// Get a config value, or all of them
pub async fn get_config(
    ctx: Context<'_>,

    #[description = "The config key to get. All keys are shown if not provided"]
    key: Option<ConfigKey>,
) -> Result<(), Error> {
    ctx.require_owner().await?;

    let keys = match key {
        Some(key) => vec![key],
        None => vec![
            ConfigKey::BotPrefix,
            ConfigKey::BotStatusMessage,
            ConfigKey::UiEmbedColor,
            ConfigKey::ApiHenrikKey,
            ConfigKey::ApiImgflipUser,
            ConfigKey::ApiImgflipPass,
        ],
    };

    let mut msg = String::new();
    for key in keys {
        let value = ctx.data().get_config_string(key).await?;
        let display = match (value, key.secret()) {
            (None, _) => "*(not set)*".to_string(),
            (Some(_), true) => "*(set, hidden)*".to_string(),
            (Some(value), false) => value,
        };
        write!(&mut msg, "**{}**: {}\n> {}\n", key, display, key.description())?;
    }

    Embed::default().description(msg).send(&ctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// Set a config value
pub async fn set_config(
    ctx: Context<'_>,

    #[description = "The config key to set"] key: ConfigKey,
    #[description = "The value to set it to"] value: String,
) -> Result<(), Error> {
    ctx.require_owner().await?;

    let (msg, err) = match ctx.data().set_config(key, value, ctx.created_at()).await {
        Ok(()) => (format!("{} updated.", key), false),
        Err(e) => (format!("Error updating {}: {:?}", key, e), true),
    };

    Embed::default().description(msg).set_error(err).send(&ctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// Delete a config value, reverting it to its default
pub async fn delete_config(
    ctx: Context<'_>,

    #[description = "The config key to delete"] key: ConfigKey,
) -> Result<(), Error> {
    ctx.require_owner().await?;

    let (msg, err) = match ctx.data().delete_config(key, ctx.created_at()).await {
        Ok(()) => (format!("{} deleted.", key), false),
        Err(e) => (format!("Error deleting {}: {:?}", key, e), true),
    };

    Embed::default().description(msg).set_error(err).send(&ctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// Blacklist a user from the bot entirely (Owner Only)
pub async fn blacklist(
    ctx: Context<'_>,

    #[description = "The user to blacklist"] user: User,
    #[description = "Why they are being blacklisted"] reason: Option<String>,
) -> Result<(), Error> {
    ctx.require_owner().await?;

    if user.id == ctx.data().owner_id {
        Embed::error().description("You can't blacklist yourself.").send(&ctx).await?;
        return Ok(());
    }

    let reason = reason.unwrap_or_else(|| "Unauthorized action".to_string());
    let (msg, err) = match ctx
        .data()
        .blacklist_user(user.id.into(), reason, ctx.created_at())
        .await
    {
        Ok(true) => (format!("Blacklisted {}.", user.tag()), false),
        Ok(false) => (format!("{} is already blacklisted.", user.tag()), true),
        Err(e) => (format!("Error blacklisting user: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(&ctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// Remove a user from the blacklist (Owner Only)
pub async fn unblacklist(
    ctx: Context<'_>,

    #[description = "The user to remove from the blacklist"] user: User,
) -> Result<(), Error> {
    ctx.require_owner().await?;

    let (msg, err) = match ctx.data().unblacklist_user(user.id.into()).await {
        Ok(true) => (format!("Removed {} from the blacklist.", user.tag()), false),
        Ok(false) => (format!("{} wasn't blacklisted.", user.tag()), true),
        Err(e) => (format!("Error removing user from blacklist: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(&ctx).await?;

    Ok(())
}

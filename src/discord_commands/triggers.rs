use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use poise::serenity_prelude::{ButtonStyle, Color, MessageComponentInteraction};

use crate::{
    discord_commands::forms::{
        browser_buttons, collect_form, parse_position, update_browser_message, FormField,
        BROWSER_NEXT, BROWSER_PREVIOUS,
    },
    pager::{PageSource, Pager, PositionError, DEFAULT_PAGE_SIZE},
    trigger::{Trigger, DM_SCOPE},
    AccessCheck, ApplicationContext, BotData, Context, Embed, Error, GuildId,
};

const VIEW_TIMEOUT: Duration = Duration::from_secs(300);
const EDIT_TIMEOUT: Duration = Duration::from_secs(180);

const EDIT_TRIGGER: &str = "trigger.edit";
const DELETE_TRIGGER: &str = "trigger.delete";
const OPEN_EDIT: &str = "trigger.open_edit";

const ACTIONS: &[(&str, &str, ButtonStyle)] = &[
    (EDIT_TRIGGER, "Edit Trigger", ButtonStyle::Success),
    (DELETE_TRIGGER, "Delete Trigger", ButtonStyle::Danger),
];

struct TriggerSource {
    data: BotData,
    guild_id: GuildId,
}

#[async_trait]
impl PageSource for TriggerSource {
    type Item = Trigger;

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Trigger>, usize), Error> {
        self.data
            .trigger_page(self.guild_id, offset, limit)
            .await
            .map_err(Into::into)
    }
}

fn scope_of(ctx: &Context<'_>) -> GuildId {
    ctx.guild_id().map(|id| id.into()).unwrap_or(DM_SCOPE.into())
}

#[derive(Debug, poise::Modal)]
#[name = "Create Trigger"]
struct TriggerModal {
    #[name = "Trigger Name"]
    #[placeholder = "Enter word/phrase or @username for mentions"]
    name: String,
    #[name = "Trigger Response"]
    #[placeholder = "Enter response (Use {user} for mention, {channel} for channel)"]
    #[paragraph]
    response: String,
}

#[poise::command(slash_command, category = "Triggers")]
/// Create a new auto-responder trigger
pub async fn triggercreate(ctx: ApplicationContext<'_>) -> Result<(), Error> {
    use poise::Modal as _;

    let pctx = poise::Context::Application(ctx);
    pctx.require_authorized().await?;

    let modal = match TriggerModal::execute(ctx).await? {
        Some(modal) => modal,
        None => return Ok(()),
    };

    let name = modal.name.trim().to_string();
    let (msg, err) = match ctx
        .data
        .add_trigger(scope_of(&pctx), name.clone(), modal.response, pctx.created_at())
        .await
    {
        Ok(()) => (format!("Trigger '{}' created successfully!", name), false),
        Err(e) => (format!("Error creating trigger: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(&pctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Triggers")]
/// Show list of auto-responder triggers
pub async fn triggerlist(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let data = ctx.data().clone();
    let mut pager = Pager::new(
        TriggerSource { data: data.clone(), guild_id: scope_of(&ctx) },
        DEFAULT_PAGE_SIZE,
    );
    pager.load_page(0).await?;

    if pager.is_empty() {
        Embed::default().description("No triggers found.").send(&ctx).await?;
        return Ok(());
    }

    let color = data.embed_color().await?;

    let reply = ctx
        .send(|b| {
            b.embed(|e| list_embed(&pager, color).create_embed(e))
                .components(|c| {
                    browser_buttons(c, pager.has_previous(), pager.has_next(), ACTIONS)
                })
                .ephemeral(true)
        })
        .await?;

    let message = reply.message().await?.into_owned();

    while let Some(interaction) = message
        .await_component_interaction(ctx)
        .author_id(ctx.author().id)
        .timeout(VIEW_TIMEOUT)
        .await
    {
        match interaction.data.custom_id.as_str() {
            BROWSER_PREVIOUS => {
                pager.previous().await?;
                update_browser_message(
                    &ctx,
                    &interaction,
                    list_embed(&pager, color),
                    pager.has_previous(),
                    pager.has_next(),
                    ACTIONS,
                )
                .await?;
            }
            BROWSER_NEXT => {
                pager.next().await?;
                update_browser_message(
                    &ctx,
                    &interaction,
                    list_embed(&pager, color),
                    pager.has_previous(),
                    pager.has_next(),
                    ACTIONS,
                )
                .await?;
            }
            EDIT_TRIGGER => {
                edit_trigger(&ctx, &data, &pager, interaction.clone(), color).await?;

                pager.load_page(pager.page_index()).await?;
                refresh(&ctx, &reply, &pager, color).await?;
            }
            DELETE_TRIGGER => {
                delete_trigger(&ctx, &data, &pager, interaction.clone()).await?;

                pager.load_page(pager.page_index()).await?;
                refresh(&ctx, &reply, &pager, color).await?;
            }
            _ => {}
        }
    }

    reply
        .edit(ctx, |b| {
            b.embed(|e| list_embed(&pager, color).create_embed(e))
                .components(|c| c)
        })
        .await
        .ok();

    Ok(())
}

fn list_embed(pager: &Pager<TriggerSource>, color: Color) -> Embed {
    let render = pager.render(|position, trigger| {
        (format!("{}. {}", position, trigger.name), trigger.response.clone())
    });

    let mut embed = Embed::default()
        .color(color)
        .title("Trigger List")
        .description("Current auto-responder triggers:")
        .footer(render.footer);
    for (name, value) in render.fields {
        embed = embed.field(name, value, false);
    }
    embed
}

async fn refresh<'a>(
    ctx: &Context<'a>,
    reply: &poise::ReplyHandle<'a>,
    pager: &Pager<TriggerSource>,
    color: Color,
) -> Result<(), Error> {
    reply
        .edit(*ctx, |b| {
            b.embed(|e| list_embed(pager, color).create_embed(e))
                .components(|c| browser_buttons(c, pager.has_previous(), pager.has_next(), ACTIONS))
        })
        .await?;

    Ok(())
}

/// Position prompt shared by the edit and delete buttons. Returns the
/// resolved trigger or None after reporting the problem to the user
async fn prompt_for_trigger(
    ctx: &Context<'_>,
    pager: &Pager<TriggerSource>,
    interaction: Arc<MessageComponentInteraction>,
    title: &str,
) -> Result<Option<Trigger>, Error> {
    let fields = [FormField::short("Trigger Number")
        .placeholder(format!("Enter a number between 1 and {}", pager.total_count()))];

    let values = match collect_form(ctx, interaction, title, &fields, EDIT_TIMEOUT).await? {
        Some(values) => values,
        None => return Ok(None),
    };

    let position = match parse_position(&values[0], pager.total_count()) {
        Ok(position) => position,
        Err(PositionError::Invalid) => {
            Embed::error().description("Please enter a valid number.").send(ctx).await?;
            return Ok(None);
        }
        Err(PositionError::NotFound(_)) => {
            Embed::error()
                .description("Invalid trigger number. Please try again.")
                .send(ctx)
                .await?;
            return Ok(None);
        }
    };

    let trigger = match pager.item_at(position).cloned() {
        Some(trigger) => Some(trigger),
        None => pager.fetch_item(position).await?,
    };

    if trigger.is_none() {
        Embed::error()
            .description("Invalid trigger number. Please try again.")
            .send(ctx)
            .await?;
    }

    Ok(trigger)
}

async fn edit_trigger(
    ctx: &Context<'_>,
    data: &BotData,
    pager: &Pager<TriggerSource>,
    interaction: Arc<MessageComponentInteraction>,
    color: Color,
) -> Result<(), Error> {
    let trigger = match prompt_for_trigger(ctx, pager, interaction, "Select Trigger to Edit").await?
    {
        Some(trigger) => trigger,
        None => return Ok(()),
    };

    // A modal can't be opened from a modal submission, so bounce through a
    // button like the edit flow always has
    let reply = ctx
        .send(|b| {
            b.embed(|e| {
                Embed::default()
                    .color(color)
                    .description(format!("Editing trigger: {}", trigger.name))
                    .create_embed(e)
            })
            .components(|c| {
                c.create_action_row(|r| {
                    r.create_button(|b| {
                        b.custom_id(OPEN_EDIT).label("Edit Trigger").style(ButtonStyle::Success)
                    })
                })
            })
            .ephemeral(true)
        })
        .await?;

    let edit_message = reply.message().await?.into_owned();
    if let Some(edit_interaction) = edit_message
        .await_component_interaction(ctx)
        .author_id(ctx.author().id)
        .timeout(EDIT_TIMEOUT)
        .await
    {
        let fields = [
            FormField::short("Trigger Name").prefill(&trigger.name),
            FormField::paragraph("Trigger Response").prefill(&trigger.response),
        ];
        if let Some(values) =
            collect_form(ctx, edit_interaction, "Edit Trigger", &fields, EDIT_TIMEOUT).await?
        {
            let (msg, err) = match data
                .update_trigger(trigger.id, values[0].trim().to_string(), values[1].clone())
                .await
            {
                Ok(true) => ("Trigger updated successfully!".to_string(), false),
                Ok(false) => ("Trigger no longer exists.".to_string(), true),
                Err(e) => (format!("Error updating trigger: {:?}", e), true),
            };

            Embed::default().description(msg).set_error(err).send(ctx).await?;
        }
    }

    reply.edit(*ctx, |b| b.components(|c| c)).await.ok();

    Ok(())
}

async fn delete_trigger(
    ctx: &Context<'_>,
    data: &BotData,
    pager: &Pager<TriggerSource>,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let trigger = match prompt_for_trigger(ctx, pager, interaction, "Delete Trigger").await? {
        Some(trigger) => trigger,
        None => return Ok(()),
    };

    let (msg, err) = match data.delete_trigger(trigger.id).await {
        Ok(true) => (format!("Trigger '{}' deleted successfully!", trigger.name), false),
        Ok(false) => ("Trigger no longer exists.".to_string(), true),
        Err(e) => (format!("Error deleting trigger: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(ctx).await?;

    Ok(())
}

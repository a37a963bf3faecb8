use std::time::Duration;

use async_trait::async_trait;
use poise::serenity_prelude::Color;

use crate::{
    db::queries::access::AccessRecord,
    discord_commands::forms::{
        browser_buttons, update_browser_message, BROWSER_NEXT, BROWSER_PREVIOUS,
    },
    pager::{PageSource, Pager, DEFAULT_PAGE_SIZE},
    AccessCheck, BotData, Context, Embed, Error,
};

const VIEW_TIMEOUT: Duration = Duration::from_secs(180);

struct AccessLogSource {
    data: BotData,
}

#[async_trait]
impl PageSource for AccessLogSource {
    type Item = AccessRecord;

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AccessRecord>, usize), Error> {
        self.data.unauthorized_page(offset, limit).await.map_err(Into::into)
    }
}

#[poise::command(slash_command, prefix_command, category = "Settings")]
/// View list of unauthorized users who tried to use the bot
pub async fn unauthusers(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_owner().await?;

    let data = ctx.data().clone();
    let mut pager = Pager::new(AccessLogSource { data: data.clone() }, DEFAULT_PAGE_SIZE);
    pager.load_page(0).await?;

    if pager.is_empty() {
        Embed::default()
            .description("No unauthorized access attempts recorded.")
            .send(&ctx)
            .await?;
        return Ok(());
    }

    let color = data.embed_color().await?;

    let reply = ctx
        .send(|b| {
            b.embed(|e| list_embed(&pager, color).create_embed(e))
                .components(|c| browser_buttons(c, pager.has_previous(), pager.has_next(), &[]))
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
            BROWSER_PREVIOUS => pager.previous().await?,
            BROWSER_NEXT => pager.next().await?,
            _ => continue,
        }

        update_browser_message(
            &ctx,
            &interaction,
            list_embed(&pager, color),
            pager.has_previous(),
            pager.has_next(),
            &[],
        )
        .await?;
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

fn list_embed(pager: &Pager<AccessLogSource>, color: Color) -> Embed {
    let render = pager.render(|position, record| {
        (
            format!("#{}. {}", position, record.username),
            format!(
                "ID: {}\nServer: {}\nTime: {}",
                *record.user_id,
                record.server,
                record.time_display()
            ),
        )
    });

    let mut embed = Embed::default()
        .color(color)
        .title("Unauthorized Access Attempts")
        .footer(render.footer);
    for (name, value) in render.fields {
        embed = embed.field(name, value, false);
    }
    embed
}

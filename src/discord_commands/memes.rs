use std::time::Duration;

use poise::serenity_prelude::{ButtonStyle, Color, CreateComponents};
use tracing::warn;

use crate::{
    api::imgflip::{
        caption_image, random_templates, template_by_id, MemeTemplate, MEME_CHOICE_COUNT,
    },
    db::queries::config::ConfigKey,
    discord_commands::forms::{collect_form, FormField},
    AccessCheck, Context, Embed, Error,
};

const MENU_TIMEOUT: Duration = Duration::from_secs(180);

const SHUFFLE: &str = "meme.shuffle";

#[poise::command(slash_command, prefix_command, category = "Fun")]
/// Caption a meme template
pub async fn meme(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let data = ctx.data().clone();

    let (username, password) = match (
        data.get_config_string(ConfigKey::ApiImgflipUser).await?,
        data.get_config_string(ConfigKey::ApiImgflipPass).await?,
    ) {
        (Some(username), Some(password)) => (username, password),
        _ => {
            Embed::error()
                .description("imgflip login not set. Ask the owner to set it in /settings first.")
                .send(&ctx)
                .await?;
            return Ok(());
        }
    };

    let color = data.embed_color().await?;
    let mut templates = random_templates(MEME_CHOICE_COUNT);

    let reply = ctx
        .send(|b| {
            b.embed(|e| choices_embed(&templates, color).create_embed(e))
                .components(|c| choice_components(c, &templates))
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
        if interaction.data.custom_id == SHUFFLE {
            templates = random_templates(MEME_CHOICE_COUNT);
            let embed = choices_embed(&templates, color);
            interaction
                .create_interaction_response(ctx.serenity_context(), |b| {
                    b.kind(poise::serenity_prelude::InteractionResponseType::UpdateMessage)
                        .interaction_response_data(|d| {
                            d.embed(|e| embed.create_embed(e))
                                .components(|c| choice_components(c, &templates))
                        })
                })
                .await?;
            continue;
        }

        let template = match template_by_id(&interaction.data.custom_id) {
            Some(template) => template,
            None => continue,
        };

        // One input per caption box, labelled with the template's own labels
        let fields = template
            .labels
            .iter()
            .map(|label| FormField::short(label))
            .collect::<Vec<_>>();

        let captions = match collect_form(
            &ctx,
            interaction.clone(),
            &format!("Caption: {}", template.name),
            &fields,
            MENU_TIMEOUT,
        )
        .await?
        {
            Some(captions) => captions,
            None => continue,
        };

        match caption_image(&data.http_client, &username, &password, template, &captions).await {
            Ok(url) => {
                Embed::default()
                    .color(color)
                    .title(template.name)
                    .image_url(url)
                    .ephemeral(false)
                    .send(&ctx)
                    .await?;
            }
            Err(e) => {
                warn!("Error captioning {}: {:?}", template.name, e);
                Embed::error()
                    .description("Failed to generate the meme. Check the imgflip login and try again.")
                    .send(&ctx)
                    .await?;
            }
        }
    }

    reply.edit(ctx, |b| b.components(|c| c)).await.ok();

    Ok(())
}

fn choices_embed(templates: &[&'static MemeTemplate], color: Color) -> Embed {
    let mut embed = Embed::default()
        .color(color)
        .title("Meme Generator")
        .description("Pick a template to caption, or shuffle for new options")
        .thumbnail_url(templates[0].preview);

    for template in templates {
        embed = embed.field(
            template.name,
            format!(
                "{} ({} caption{})\n[preview]({})",
                template.description,
                template.parts(),
                if template.parts() != 1 { "s" } else { "" },
                template.preview
            ),
            false,
        );
    }
    embed
}

fn choice_components<'a>(
    c: &'a mut CreateComponents,
    templates: &[&'static MemeTemplate],
) -> &'a mut CreateComponents {
    c.create_action_row(|r| {
        for template in templates {
            r.create_button(|b| {
                b.custom_id(template.id).label(template.name).style(ButtonStyle::Primary)
            });
        }
        r.create_button(|b| b.custom_id(SHUFFLE).label("Shuffle").style(ButtonStyle::Secondary))
    })
}

use tracing::warn;

use crate::{
    api::valorant::{fetch_profile, format_profile},
    db::queries::config::ConfigKey,
    AccessCheck, Context, Embed, Error,
};

#[poise::command(slash_command, prefix_command, category = "Lookups")]
/// Get Valorant player information
pub async fn valoinfo(
    ctx: Context<'_>,

    #[description = "Valorant name (e.g. Shiraboi)"] name: String,
    #[description = "Valorant tag without # (e.g. cute)"] tag: String,
) -> Result<(), Error> {
    ctx.require_authorized().await?;

    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let api_key = data.get_config_string(ConfigKey::ApiHenrikKey).await?;
    let name = name.trim();
    let tag = tag.trim().trim_start_matches('#');

    let profile = match fetch_profile(&data.http_client, api_key.as_deref(), name, tag).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            Embed::error()
                .description(format!("Could not find player {}#{}", name, tag))
                .send(&ctx)
                .await?;
            return Ok(());
        }
        Err(e) => {
            warn!("Error fetching Valorant info for {}#{}: {:?}", name, tag, e);
            Embed::error()
                .description(
                    "An error occurred while fetching Valorant information. Please try again later.",
                )
                .send(&ctx)
                .await?;
            return Ok(());
        }
    };

    let mut embed = Embed::default()
        .color(data.embed_color().await?)
        .title(format!("Valorant Profile: {}#{}", name, tag))
        .description(format_profile(&profile)?);

    if let Some(card) = profile.account.card.as_ref().and_then(|card| card.small.as_deref()) {
        embed = embed.thumbnail_url(card);
    }

    embed.send(&ctx).await?;

    Ok(())
}

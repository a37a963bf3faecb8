use tracing::warn;

use crate::{
    api::minecraft::{fetch_status, format_edition, icon_url},
    AccessCheck, Context, Embed, Error,
};

#[poise::command(slash_command, prefix_command, category = "Lookups")]
/// Check Minecraft server status (Java & Bedrock)
pub async fn mcstatus(
    ctx: Context<'_>,

    #[description = "Server IP/Address (e.g. play.example.com)"] address: String,
    #[description = "Server port. Auto-detected if not provided"] port: Option<u16>,
) -> Result<(), Error> {
    ctx.require_authorized().await?;

    // The lookup can take a few seconds
    ctx.defer_ephemeral().await?;

    let address = address.trim();
    let lookup_address = match port {
        Some(port) => format!("{}:{}", address, port),
        None => address.to_string(),
    };

    let (java, bedrock) = match fetch_status(&ctx.data().http_client, &lookup_address).await {
        Ok(status) => status,
        Err(e) => {
            warn!("Error checking server status for {}: {:?}", lookup_address, e);
            Embed::error()
                .description(
                    "Failed to check server status. Please verify the server address is correct.",
                )
                .send(&ctx)
                .await?;
            return Ok(());
        }
    };

    let mut embed = Embed::default()
        .color(ctx.data().embed_color().await?)
        .title("Minecraft Server Status")
        .description(format!(
            "**Server Address**\n```{}```\n**Port:** `{}`\n**SRV Record:** `{}`",
            address,
            port.map(|p| p.to_string()).unwrap_or_else(|| "Auto-detected".to_string()),
            if java.srv.unwrap_or(false) { "yes" } else { "no" },
        ))
        .field("Java Edition", format_edition(&java)?, false)
        .field("Bedrock Edition", format_edition(&bedrock)?, false);

    if let Some(icon) = icon_url(&java) {
        embed = embed.thumbnail_url(icon);
    }

    embed.send(&ctx).await?;

    Ok(())
}

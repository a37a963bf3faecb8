use std::fmt::Write;

use humansize::{make_format, BINARY};
use rand::Rng;

use crate::{AccessCheck, Context, Embed, Error, DISK_SPACE_WARNING_LEVEL};

#[poise::command(prefix_command, slash_command, category = "Utils")]
pub async fn help(
    ctx: Context<'_>,

    #[description = "Command to display specific information about"] command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(ctx, command.as_deref(), Default::default()).await?;
    Ok(())
}

#[poise::command(prefix_command, slash_command, category = "Utils")]
/// Get a greeting from the bot
pub async fn hello(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_authorized().await?;

    Embed::default()
        .description(format!(
            "Hello {}! How can I help you today?",
            ctx.author().name
        ))
        .send(&ctx)
        .await?;

    Ok(())
}

#[poise::command(prefix_command, slash_command, category = "Utils")]
/// Check bot status and database health
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let data = ctx.data();
    let formatter = make_format(BINARY);

    let mut msg = "Bot is running normally\n".to_string();
    let mut err = false;

    match data.db_table_sizes().await {
        Ok(tables) => {
            let total = tables.iter().fold(0, |a, t| a + t.1);
            let rows = tables.iter().fold(0, |a, t| a + t.2);
            write!(
                &mut msg,
                ":white_check_mark: Database: {} across {} rows\n",
                formatter(total),
                rows
            )?;
        }
        Err(e) => {
            err = true;
            write!(&mut msg, ":x: Database size error: {:?}\n", e)?;
        }
    }

    match data.db_available_space() {
        Ok(bytes) if bytes > DISK_SPACE_WARNING_LEVEL => {
            write!(&mut msg, ":white_check_mark: Disk space ok: {}", formatter(bytes))?;
        }
        Ok(bytes) => {
            write!(&mut msg, ":x: Disk space low: {}", formatter(bytes))?;
        }
        Err(e) => {
            err = true;
            write!(&mut msg, ":x: Disk space error: {:?}", e)?;
        }
    }

    Embed::default()
        .title("Bot Status")
        .description(msg)
        .set_error(err)
        .send(&ctx)
        .await?;

    Ok(())
}

#[poise::command(prefix_command, slash_command, category = "Fun")]
/// Roll a die
pub async fn roll(
    ctx: Context<'_>,

    #[description = "Number of sides (defaults to 6)"]
    #[min = 2]
    #[max = 1000]
    sides: Option<u32>,
) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let sides = sides.unwrap_or(6);
    let rolled = rand::thread_rng().gen_range(1..=sides);

    Embed::default()
        .description(format!(":game_die: You rolled a **{}** (d{})", rolled, sides))
        .ephemeral(false)
        .send(&ctx)
        .await?;

    Ok(())
}

#[poise::command(prefix_command, slash_command, category = "Fun")]
/// Flip a coin
pub async fn coinflip(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let side = if rand::thread_rng().gen_bool(0.5) { "Heads" } else { "Tails" };

    Embed::default()
        .description(format!(":coin: **{}**!", side))
        .ephemeral(false)
        .send(&ctx)
        .await?;

    Ok(())
}

const EIGHTBALL_ANSWERS: &[&str] = &[
    "It is certain.",
    "Without a doubt.",
    "You may rely on it.",
    "Most likely.",
    "Outlook good.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Don't count on it.",
    "My reply is no.",
    "Outlook not so good.",
    "Very doubtful.",
];

#[poise::command(prefix_command, slash_command, category = "Fun")]
/// Ask the magic 8 ball a question
pub async fn eightball(
    ctx: Context<'_>,

    #[description = "Your question"] question: String,
) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let answer = EIGHTBALL_ANSWERS[rand::thread_rng().gen_range(0..EIGHTBALL_ANSWERS.len())];

    Embed::default()
        .title(":8ball: Magic 8 Ball")
        .description(format!("> {}\n{}", question, answer))
        .ephemeral(false)
        .send(&ctx)
        .await?;

    Ok(())
}

use std::{num::ParseIntError, time::Duration};

use clap::Parser;
use futures::future::join;
use poise::{
    self,
    serenity_prelude::{
        self as serenity, content_safe, Activity, ContentSafeOptions, GatewayIntents, Guild,
        Mentionable, Message,
    },
    FrameworkError,
};
use privatebot_rs::{
    api::build_http_client,
    db::{spawn_db_task, DbCommand},
    trigger::{find_match, render_response, ResponseContext, DM_SCOPE},
    *,
};
use tokio::time;
use tracing::*;

fn frequency_seconds_valid_range(s: &str) -> Result<u64, String> {
    let v = s.parse().map_err(|e: ParseIntError| e.to_string())?;

    if v < 60 {
        Err(format!(
            "Running more often than once per minute ({} seconds) is not recommended",
            v
        ))?;
    }
    Ok(v)
}

#[derive(Debug, Parser)]
#[clap(name = "privatebot.rs")]
struct Cli {
    #[clap(long, env)]
    discord_token: String,
    #[clap(long, env)]
    owner_id: u64,
    #[clap(long, env, default_value = "privatebot.sqlite")]
    sqlite_connection_string: String,
    #[clap(long, env, default_value = "64")]
    database_command_channel_bound: usize,
    #[clap(long, env, default_value = "3600", value_parser = frequency_seconds_valid_range)]
    background_task_frequency_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    load_dotenv()?;
    configure_tracing();

    let args = Cli::parse();
    let background_task_frequency = Duration::from_secs(args.background_task_frequency_seconds);
    let discord_token = &args.discord_token;
    debug!("Parsed args: {:#?}", args);

    // Open the DB before launching the task so we can fail before trying to
    // connect to discord
    let sqlite_con = db::open_database(&args.sqlite_connection_string, true, true)?;
    let db_file_path = sqlite_con.path().map(std::path::PathBuf::from);
    let (sender, receiver) = flume::bounded::<DbCommand>(args.database_command_channel_bound);

    let db_task_handle = spawn_db_task(sqlite_con, receiver);

    let bot_data = BotData::new(
        sender,
        db_file_path,
        build_http_client()?,
        args.owner_id.into(),
        background_task_frequency,
    );

    let options = poise::FrameworkOptions {
        commands: discord_commands::commands(),
        on_error: |err| Box::pin(on_error(err)),
        event_handler: |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        },
        prefix_options: poise::PrefixFrameworkOptions {
            dynamic_prefix: Some(|ctx| {
                Box::pin(async move { Ok(Some(ctx.data.prefix().await?)) })
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(options)
        .token(discord_token)
        .intents(
            GatewayIntents::GUILDS
                | GatewayIntents::GUILD_MEMBERS
                | GatewayIntents::GUILD_MESSAGES
                | GatewayIntents::DIRECT_MESSAGES
                | GatewayIntents::MESSAGE_CONTENT,
        )
        .setup(move |ctx, _ready, framework| {
            debug!("Discord connected");
            Box::pin(async move {
                // Global registration so the commands work in DMs too
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                ctx.set_activity(Activity::playing(bot_data.status_message().await?)).await;

                tokio::spawn(background_tasks(bot_data.clone()));

                Ok(bot_data)
            })
        })
        .build()
        .await?;

    let shard_manager_handle = framework.client().shard_manager.clone();
    let (framework_r, db_r) = join(
        // Don't need to do anything special in this case as the dropped sender will cause the db
        // task to stop
        framework.start(),
        // In this case however, if the db exits first the framework needs to be shut down
        async move {
            let r = db_task_handle.await;
            shard_manager_handle.lock().await.shutdown_all().await;
            r
        },
    )
    .await;

    // First ? is for join result, 2nd is for the actual task result
    db_r??;
    framework_r?;

    Ok(())
}

/// Periodic database maintenance, runs for the lifetime of the process
async fn background_tasks(data: BotData) {
    let mut tick_interval = time::interval(data.background_task_frequency);
    loop {
        tick_interval.tick().await;

        debug!("Running background tasks");
        match data.optimize_db().await {
            Ok(duration) => debug!("Optimized database in {:?}", duration),
            Err(e) => error!("Error optimizing database: {:?}", e),
        }
    }
}

async fn on_error(error: FrameworkError<'_, BotData, Error>) {
    if error.ctx().is_none() {
        error!("Error with no ctx in poise.on_error: {:?}", error);
        return;
    }

    let (err, ctx) = match error {
        FrameworkError::ArgumentParse { error, ctx, .. } => (error.into(), ctx),
        FrameworkError::Command { error, ctx } => (error, ctx),
        e => {
            let ctx = e.ctx().unwrap();
            send_err(
                &ctx,
                LogBehaviour::default(),
                format!("Unhandled poise error: {:?}", e),
            )
            .await;
            return;
        }
    };

    // Denials get the access denied embed rather than a generic error. The
    // attempt was already recorded by the access check
    if let Error::Unauthorized(_) = err {
        send_access_denied(&ctx).await;
        return;
    }

    send_err(&ctx, err.log_behaviour(), err).await;
}

async fn send_err<T: ToString + std::fmt::Display>(
    ctx: &Context<'_>,
    log_behaviour: LogBehaviour,
    msg: T,
) {
    if log_behaviour.log {
        error!("poise.on_error: {}", msg);
    }

    let user_msg = match log_behaviour.obfuscate && ctx.author().id != ctx.data().owner_id {
        true => OBFUSCATED_ERROR_MSG.into(),
        false => msg.to_string(),
    };

    if let Err(e) = Embed::error().description(user_msg).send(ctx).await {
        error!("Error from ctx.send in poise.on_error: {:?}", e);
    }
}

async fn send_access_denied(ctx: &Context<'_>) {
    let user = ctx.author();

    let result = Embed::error()
        .title("Access Denied")
        .description("This is a private bot for authorized users only.")
        .field(
            "Your Info",
            format!("User: {}\nID: {}", user.mention(), user.id),
            false,
        )
        .footer("Private Bot")
        .send(ctx)
        .await;

    if let Err(e) = result {
        error!("Error sending access denied embed: {:?}", e);
    }
}

async fn event_handler<'a>(
    ctx: &serenity::Context,
    event: &'a poise::Event<'a>,
    _framework: poise::FrameworkContext<'a, BotData, Error>,
    data: &'a BotData,
) -> Result<(), Error> {
    use poise::Event::*;

    debug!("got event: {}", event.name());
    match event {
        GuildCreate { guild, .. } => handle_guild_create(ctx, data, guild).await?,
        Message { new_message } => handle_message_create(ctx, data, new_message).await?,
        _ => {}
    }

    Ok(())
}

async fn handle_guild_create(
    ctx: &serenity::Context,
    data: &BotData,
    guild: &Guild,
) -> Result<(), Error> {
    let allowed = data.allowed_users().await?;
    let is_authorized = |id: serenity::UserId| {
        id == data.owner_id || allowed.iter().any(|allowed_id| **allowed_id == id)
    };

    let auth_users = guild
        .members
        .values()
        .filter(|member| is_authorized(member.user.id))
        .map(|member| member.user.mention().to_string())
        .collect::<Vec<_>>();

    let mut embed = Embed::default().random_color().title("Hello! I'm Private Info Bot!");
    embed = if auth_users.is_empty() {
        embed
            .description(
                "Thanks for the invitation! However, I couldn't find any authorized users \
                 in this server.\n\n**Security Notice:**\nFor security reasons I can only \
                 be used by authorized users. I'll stay for 5 minutes in case one joins, \
                 then I'll need to leave the server.",
            )
            .footer("I'll leave in 5 minutes if no authorized users join")
    } else {
        embed.description(format!(
            "Thanks for inviting me! I'm ready to help.\n\n**Authorized Users Found:**\n{}\n\n\
             Feel free to use my commands anytime!",
            auth_users.join(", ")
        ))
    };

    let channel_id = guild
        .system_channel_id
        .or(guild.default_channel_guaranteed().map(|c| c.id));
    if let Some(channel_id) = channel_id {
        embed.send_in_channel(channel_id.into(), &ctx.http).await?;
    } else {
        warn!("Failed to get system or default channel to welcome guild {}", guild.id);
    }

    // Give an authorized user a chance to join before leaving
    if auth_users.is_empty() {
        let ctx = ctx.clone();
        let data = data.clone();
        let guild_id = guild.id;
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(300)).await;

            let allowed = match data.allowed_users().await {
                Ok(allowed) => allowed,
                Err(e) => {
                    error!("Error re-checking allowed users for {}: {:?}", guild_id, e);
                    return;
                }
            };
            let any_authorized = ctx
                .cache
                .guild(guild_id)
                .map(|guild| {
                    guild.members.values().any(|member| {
                        member.user.id == data.owner_id
                            || allowed.iter().any(|allowed_id| **allowed_id == member.user.id)
                    })
                })
                .unwrap_or(false);

            if !any_authorized {
                info!("Leaving guild {} with no authorized users", guild_id);
                if let Err(e) = guild_id.leave(&ctx.http).await {
                    error!("Error leaving guild {}: {:?}", guild_id, e);
                }
            }
        });
    }

    Ok(())
}

/// Runs every incoming message past the trigger engine and dispatches the
/// response for the first match, if any
async fn handle_message_create(
    ctx: &serenity::Context,
    data: &BotData,
    message: &Message,
) -> Result<(), Error> {
    if message.author.bot {
        return Ok(());
    }

    let scope = message.guild_id.map(|id| id.0).unwrap_or(DM_SCOPE);

    // A failed fetch means no triggers, normal message handling continues
    let triggers = match data.guild_triggers(scope.into()).await {
        Ok(triggers) => triggers,
        Err(e) => {
            error!("Error fetching triggers for scope {}: {:?}", scope, e);
            return Ok(());
        }
    };
    if triggers.is_empty() {
        return Ok(());
    }

    let normalized = content_safe(
        &ctx.cache,
        &message.content,
        &ContentSafeOptions::default(),
        &message.mentions,
    )
    .to_lowercase();
    let mentioned_names = message
        .mentions
        .iter()
        .map(|user| user.name.clone())
        .collect::<Vec<_>>();

    let trigger = match find_match(&triggers, &normalized, &mentioned_names) {
        Some(trigger) => trigger,
        None => return Ok(()),
    };

    let user_mention = message.author.mention().to_string();
    let channel_mention = message.channel_id.mention().to_string();
    let server_name = message.guild_id.and_then(|id| id.name(&ctx.cache));

    let response = render_response(
        &trigger.response,
        &ResponseContext {
            user_mention: &user_mention,
            channel_mention: &channel_mention,
            server_name: server_name.as_deref(),
        },
    );

    // A small delay and a typing indicator so the reply doesn't look instant
    time::sleep(Duration::from_millis(500)).await;
    if let Err(e) = message.channel_id.broadcast_typing(&ctx.http).await {
        debug!("Error broadcasting typing: {:?}", e);
    }
    time::sleep(Duration::from_millis(500)).await;

    message.channel_id.say(&ctx.http, response).await?;

    Ok(())
}

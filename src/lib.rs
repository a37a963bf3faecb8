use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use db::{queries::{access::AccessRecord, config::ConfigKey, notes::Note}, DbCommand};
use poise::serenity_prelude::{Color, Timestamp};
use tokio::sync::oneshot;

mod ids;
pub use ids::*;

pub mod db;

pub mod pager;
pub mod trigger;

mod access;
pub use access::AccessCheck;

mod embed;
pub use embed::*;

mod error;
pub use error::*;

pub mod api;
pub mod discord_commands;

use trigger::Trigger;

pub const BOT_COLOR_NORMAL: i32 = 0x3498db;
pub const BOT_COLOR_ERROR: i32 = 0xFF3333;
pub const BOT_COLOR_SUCCESS: i32 = 0x00FF00;

pub const DEFAULT_PREFIX: &str = "/";
pub const DEFAULT_STATUS_MESSAGE: &str = "Serving authorized users";

pub const DISK_SPACE_WARNING_LEVEL: u64 = 5 * 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct BotData {
    pub db_command_sender: flume::Sender<DbCommand>,
    pub db_file_path: Option<PathBuf>,
    pub http_client: reqwest::Client,
    pub owner_id: poise::serenity_prelude::UserId,
    pub background_task_frequency: Duration,
}

impl BotData {
    pub fn new(
        db_command_sender: flume::Sender<DbCommand>,
        db_file_path: Option<PathBuf>,
        http_client: reqwest::Client,
        owner_id: poise::serenity_prelude::UserId,
        background_task_frequency: Duration,
    ) -> Self {
        Self {
            db_command_sender,
            db_file_path,
            http_client,
            owner_id,
            background_task_frequency,
        }
    }

    pub fn db_available_space(&self) -> Result<u64> {
        let path = self
            .db_file_path
            .as_ref()
            .ok_or(anyhow::anyhow!("DB appears to not be disk backed? Can't check the available space"))?;

        Ok(fs2::available_space(path)?)
    }

    pub async fn get_config_string(&self, key: ConfigKey) -> Result<Option<String>> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetConfigString {
                key,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn set_config(
        &self,
        key: ConfigKey,
        value: String,
        timestamp: Timestamp,
    ) -> Result<()> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::SetConfigString {
                key,
                value,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn delete_config(&self, key: ConfigKey, timestamp: Timestamp) -> Result<()> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::DeleteConfig {
                key,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn prefix(&self) -> Result<String> {
        Ok(self
            .get_config_string(ConfigKey::BotPrefix)
            .await?
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string()))
    }

    pub async fn status_message(&self) -> Result<String> {
        Ok(self
            .get_config_string(ConfigKey::BotStatusMessage)
            .await?
            .unwrap_or_else(|| DEFAULT_STATUS_MESSAGE.to_string()))
    }

    /// The configured embed colour, falling back to the default when unset or
    /// unparseable
    pub async fn embed_color(&self) -> Result<Color> {
        let color = self
            .get_config_string(ConfigKey::UiEmbedColor)
            .await?
            .and_then(|v| parse_color(&v))
            .unwrap_or(Color::new(BOT_COLOR_NORMAL as u32));
        Ok(color)
    }

    pub async fn add_note(
        &self,
        title: String,
        content: String,
        timestamp: Timestamp,
    ) -> Result<()> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::AddNote {
                title,
                content,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn note_page(&self, offset: usize, limit: usize) -> Result<(Vec<Note>, usize)> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetNotePage {
                offset,
                limit,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn update_note(&self, note_id: i64, content: String) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::UpdateNote {
                note_id,
                content,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn delete_note(&self, note_id: i64) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::DeleteNote {
                note_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn add_trigger(
        &self,
        guild_id: GuildId,
        name: String,
        response: String,
        timestamp: Timestamp,
    ) -> Result<()> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::AddTrigger {
                guild_id,
                name,
                response,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    /// The engine's per-message fetch of the candidate set for a scope
    pub async fn guild_triggers(&self, guild_id: GuildId) -> Result<Vec<Trigger>> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetTriggers {
                guild_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn trigger_page(
        &self,
        guild_id: GuildId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Trigger>, usize)> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetTriggerPage {
                guild_id,
                offset,
                limit,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn update_trigger(
        &self,
        trigger_id: i64,
        name: String,
        response: String,
    ) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::UpdateTrigger {
                trigger_id,
                name,
                response,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn delete_trigger(&self, trigger_id: i64) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::DeleteTrigger {
                trigger_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn add_allowed_user(&self, user_id: UserId, timestamp: Timestamp) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::AddAllowedUser {
                user_id,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn remove_allowed_user(&self, user_id: UserId) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::RemoveAllowedUser {
                user_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn allowed_users(&self) -> Result<Vec<UserId>> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetAllowedUsers { respond_to: s })
            .await?;
        Ok(r.await??)
    }

    pub async fn is_user_allowed(&self, user_id: UserId) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::IsUserAllowed {
                user_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn blacklist_user(
        &self,
        user_id: UserId,
        reason: String,
        timestamp: Timestamp,
    ) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::AddToBlacklist {
                user_id,
                reason,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn unblacklist_user(&self, user_id: UserId) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::RemoveFromBlacklist {
                user_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn is_blacklisted(&self, user_id: UserId) -> Result<bool> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::IsBlacklisted {
                user_id,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn log_unauthorized_access(
        &self,
        user_id: UserId,
        username: String,
        server: String,
        timestamp: Timestamp,
    ) -> Result<()> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::LogUnauthorizedAccess {
                user_id,
                username,
                server,
                timestamp,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn unauthorized_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<AccessRecord>, usize)> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetUnauthorizedPage {
                offset,
                limit,
                respond_to: s,
            })
            .await?;
        Ok(r.await??)
    }

    pub async fn db_table_sizes(&self) -> Result<Vec<(String, u64, u64)>> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::GetTableBytesAndCount { respond_to: s })
            .await?;
        Ok(r.await??)
    }

    pub async fn optimize_db(&self) -> Result<Duration> {
        let (s, r) = oneshot::channel();
        self.db_command_sender
            .send_async(DbCommand::Optimize { respond_to: s })
            .await?;
        Ok(r.await??)
    }
}

/// Parses "0x3498db" (or "#3498db"/"3498db") into a colour
pub fn parse_color(value: &str) -> Option<Color> {
    let hex = value
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches('#');
    u32::from_str_radix(hex, 16).ok().map(Color::new)
}

pub type Context<'a> = poise::Context<'a, BotData, Error>;
pub type ApplicationContext<'a> = poise::ApplicationContext<'a, BotData, Error>;

pub fn configure_tracing() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::TRACE)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_line_number(true)
            .with_file(true)
            .finish(),
    )
    .expect("Failed to set default tracing subscriber");
}

pub fn load_dotenv() -> Result<(), Error> {
    match dotenv::dotenv() {
        // Running without a .env file is fine, everything can come from the
        // real environment
        Err(dotenv::Error::Io(_)) => Ok(()),
        Err(e) => Err(e)?,
        Ok(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_parse_in_the_formats_the_settings_menu_accepts() {
        assert_eq!(parse_color("0x3498db"), Some(Color::new(0x3498db)));
        assert_eq!(parse_color("#ff3333"), Some(Color::new(0xff3333)));
        assert_eq!(parse_color("00ff00"), Some(Color::new(0x00ff00)));
        assert_eq!(parse_color("not a color"), None);
    }
}

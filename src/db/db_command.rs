use std::time::Duration;

use poise::serenity_prelude::Timestamp;
use tokio::sync::oneshot::Sender;

use crate::{
    db::queries::{access::AccessRecord, config::ConfigKey, notes::Note},
    trigger::Trigger,
    Error, GuildId, UserId,
};

pub type CommandSender = flume::Sender<DbCommand>;
pub type CommandReceiver = flume::Receiver<DbCommand>;

#[derive(Debug, strum::Display)]
pub enum DbCommand {
    Optimize {
        respond_to: Sender<Result<Duration, Error>>,
    },
    GetTableBytesAndCount {
        respond_to: Sender<Result<Vec<(String, u64, u64)>, Error>>,
    },
    GetConfigString {
        key: ConfigKey,
        respond_to: Sender<Result<Option<String>, Error>>,
    },
    SetConfigString {
        key: ConfigKey,
        value: String,
        timestamp: Timestamp,
        respond_to: Sender<Result<(), Error>>,
    },
    DeleteConfig {
        key: ConfigKey,
        timestamp: Timestamp,
        respond_to: Sender<Result<(), Error>>,
    },
    AddNote {
        title: String,
        content: String,
        timestamp: Timestamp,
        respond_to: Sender<Result<(), Error>>,
    },
    GetNotePage {
        offset: usize,
        limit: usize,
        respond_to: Sender<Result<(Vec<Note>, usize), Error>>,
    },
    UpdateNote {
        note_id: i64,
        content: String,
        respond_to: Sender<Result<bool, Error>>,
    },
    DeleteNote {
        note_id: i64,
        respond_to: Sender<Result<bool, Error>>,
    },
    AddTrigger {
        guild_id: GuildId,
        name: String,
        response: String,
        timestamp: Timestamp,
        respond_to: Sender<Result<(), Error>>,
    },
    GetTriggers {
        guild_id: GuildId,
        respond_to: Sender<Result<Vec<Trigger>, Error>>,
    },
    GetTriggerPage {
        guild_id: GuildId,
        offset: usize,
        limit: usize,
        respond_to: Sender<Result<(Vec<Trigger>, usize), Error>>,
    },
    UpdateTrigger {
        trigger_id: i64,
        name: String,
        response: String,
        respond_to: Sender<Result<bool, Error>>,
    },
    DeleteTrigger {
        trigger_id: i64,
        respond_to: Sender<Result<bool, Error>>,
    },
    AddAllowedUser {
        user_id: UserId,
        timestamp: Timestamp,
        respond_to: Sender<Result<bool, Error>>,
    },
    RemoveAllowedUser {
        user_id: UserId,
        respond_to: Sender<Result<bool, Error>>,
    },
    GetAllowedUsers {
        respond_to: Sender<Result<Vec<UserId>, Error>>,
    },
    IsUserAllowed {
        user_id: UserId,
        respond_to: Sender<Result<bool, Error>>,
    },
    AddToBlacklist {
        user_id: UserId,
        reason: String,
        timestamp: Timestamp,
        respond_to: Sender<Result<bool, Error>>,
    },
    RemoveFromBlacklist {
        user_id: UserId,
        respond_to: Sender<Result<bool, Error>>,
    },
    IsBlacklisted {
        user_id: UserId,
        respond_to: Sender<Result<bool, Error>>,
    },
    LogUnauthorizedAccess {
        user_id: UserId,
        username: String,
        server: String,
        timestamp: Timestamp,
        respond_to: Sender<Result<(), Error>>,
    },
    GetUnauthorizedPage {
        offset: usize,
        limit: usize,
        respond_to: Sender<Result<(Vec<AccessRecord>, usize), Error>>,
    },
}

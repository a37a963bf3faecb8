pub mod queries;
mod db_command;
use std::{ffi::c_int, sync::Once, time::Duration};

pub use db_command::*;
use include_dir::{include_dir, Dir};
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use rusqlite_migration::Migrations;
use tokio::{sync::oneshot, task::JoinHandle, time::Instant};
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

use crate::{db::queries::*, Error};

static MIGRATIONS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/migrations");

pub fn get_migrations() -> Result<Migrations<'static>, Error> {
    Ok(Migrations::from_directory(&MIGRATIONS_DIR)?)
}

fn sqlite_tracing_callback(sqlite_code: c_int, msg: &str) {
    use rusqlite::ffi;
    let err_code = ffi::Error::new(sqlite_code);

    // See https://www.sqlite.org/rescode.html for description of result codes.
    match sqlite_code & 0xff {
        ffi::SQLITE_NOTICE => info!(target: "sqlite", msg, %err_code, "SQLITE NOTICE"),
        ffi::SQLITE_WARNING => warn!(target: "sqlite", msg, %err_code, "SQLITE WARNING"),
        _ => error!(target: "sqlite", msg, %err_code, "SQLITE ERROR"),
    };
}

fn sqlite_connection_profiling_callback(query: &str, duration: Duration) {
    trace!(target: "sqlite_profiling", ?duration, query);
}

#[instrument]
pub fn open_database(connection_string: &str, create: bool, run_migrations: bool) -> Result<Connection, Error> {
    // Configure the tracing callback before opening the database
    static CONFIG_LOG: Once = Once::new();
    let mut config_result = Ok(());
    CONFIG_LOG.call_once(|| {
        unsafe {
            config_result = rusqlite::trace::config_log(Some(sqlite_tracing_callback));
        }
    });
    config_result?;

    let mut open_flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    if create {
        open_flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let mut con = Connection::open_with_flags(connection_string, open_flags)?;
    con.profile(Some(sqlite_connection_profiling_callback));

    if run_migrations {
        let migrations = get_migrations()?;
        {
            let _span = span!(Level::INFO, "Running migrations").entered();
            migrations.to_latest(&mut con)?;
        }
    }

    con.pragma_update(None, "journal_mode", "WAL")?;
    con.pragma_update(None, "synchronous", "NORMAL")?;
    con.pragma_update(None, "foreign_keys", "ON")?;

    debug!("Checking DB is writable");
    con.transaction_with_behavior(TransactionBehavior::Exclusive)?;

    Ok(con)
}

/// Runs an optimize on the database. Should be run periodically to keep the
/// database running optimally. It should be very fast if run regularly
#[instrument(skip(con))]
pub fn optimize_database(con: &Connection) -> Result<Duration, Error> {
    let start = Instant::now();
    con.pragma_update(None, "analysis_limit", "400")?;
    con.pragma_update(None, "optimize", "")?;

    Ok(start.elapsed())
}

#[instrument(skip(con))]
pub fn close_database(con: Connection) -> Result<(), Error> {
    optimize_database(&con)?;

    if let Err((_con, e)) = con.close() {
        Err(e)?;
    }

    Ok(())
}

pub fn spawn_db_task(db_con: Connection, receiver: CommandReceiver) -> JoinHandle<Result<(), Error>> {
    fn respond<T, E>(respond_to: oneshot::Sender<Result<T, E>>, response: Result<T, E>, cmd_name: &str) -> Result<(), Error> {
        respond_to.send(response)
            .map_err(|_| anyhow::anyhow!("{cmd_name} respond_to oneshot closed"))?;
        Ok(())
    }

    tokio::task::spawn_blocking(move || {
        debug!("DB TASK: started");
        loop {
            match receiver.recv() {
                // The only error it returns is Disconnected (which we use to shut down)
                Err(_) => break,
                Ok(cmd) => {
                    let cmd_name = cmd.to_string();
                    let _span = span!(Level::INFO, "DB TASK", cmd = cmd_name).entered();
                    match cmd {
                        DbCommand::Optimize { respond_to } => {
                            respond(respond_to, optimize_database(&db_con), &cmd_name)?;
                        },
                        DbCommand::GetTableBytesAndCount { respond_to } => {
                            respond(respond_to, queries::get_table_size_in_bytes(&db_con), &cmd_name)?;
                        },
                        DbCommand::GetConfigString { key, respond_to } => {
                            respond(respond_to, config::get(&db_con, key), &cmd_name)?;
                        },
                        DbCommand::SetConfigString { key, value, timestamp, respond_to } => {
                            respond(respond_to, config::update(&db_con, key, &value, timestamp), &cmd_name)?;
                        },
                        DbCommand::DeleteConfig { key, timestamp, respond_to } => {
                            respond(respond_to, config::delete(&db_con, key, timestamp), &cmd_name)?;
                        },
                        DbCommand::AddNote { title, content, timestamp, respond_to } => {
                            respond(respond_to, notes::add(&db_con, &title, &content, timestamp), &cmd_name)?;
                        },
                        DbCommand::GetNotePage { offset, limit, respond_to } => {
                            respond(respond_to, notes::page(&db_con, offset, limit), &cmd_name)?;
                        },
                        DbCommand::UpdateNote { note_id, content, respond_to } => {
                            respond(respond_to, notes::update_content(&db_con, note_id, &content), &cmd_name)?;
                        },
                        DbCommand::DeleteNote { note_id, respond_to } => {
                            respond(respond_to, notes::delete(&db_con, note_id), &cmd_name)?;
                        },
                        DbCommand::AddTrigger { guild_id, name, response, timestamp, respond_to } => {
                            respond(respond_to, triggers::add(&db_con, guild_id, &name, &response, timestamp), &cmd_name)?;
                        },
                        DbCommand::GetTriggers { guild_id, respond_to } => {
                            respond(respond_to, triggers::for_guild(&db_con, guild_id), &cmd_name)?;
                        },
                        DbCommand::GetTriggerPage { guild_id, offset, limit, respond_to } => {
                            respond(respond_to, triggers::page(&db_con, guild_id, offset, limit), &cmd_name)?;
                        },
                        DbCommand::UpdateTrigger { trigger_id, name, response, respond_to } => {
                            respond(respond_to, triggers::update(&db_con, trigger_id, &name, &response), &cmd_name)?;
                        },
                        DbCommand::DeleteTrigger { trigger_id, respond_to } => {
                            respond(respond_to, triggers::delete(&db_con, trigger_id), &cmd_name)?;
                        },
                        DbCommand::AddAllowedUser { user_id, timestamp, respond_to } => {
                            respond(respond_to, access::allow(&db_con, user_id, timestamp), &cmd_name)?;
                        },
                        DbCommand::RemoveAllowedUser { user_id, respond_to } => {
                            respond(respond_to, access::disallow(&db_con, user_id), &cmd_name)?;
                        },
                        DbCommand::GetAllowedUsers { respond_to } => {
                            respond(respond_to, access::allowed_users(&db_con), &cmd_name)?;
                        },
                        DbCommand::IsUserAllowed { user_id, respond_to } => {
                            respond(respond_to, access::is_allowed(&db_con, user_id), &cmd_name)?;
                        },
                        DbCommand::AddToBlacklist { user_id, reason, timestamp, respond_to } => {
                            respond(respond_to, access::blacklist_add(&db_con, user_id, &reason, timestamp), &cmd_name)?;
                        },
                        DbCommand::RemoveFromBlacklist { user_id, respond_to } => {
                            respond(respond_to, access::blacklist_remove(&db_con, user_id), &cmd_name)?;
                        },
                        DbCommand::IsBlacklisted { user_id, respond_to } => {
                            respond(respond_to, access::is_blacklisted(&db_con, user_id), &cmd_name)?;
                        },
                        DbCommand::LogUnauthorizedAccess { user_id, username, server, timestamp, respond_to } => {
                            respond(respond_to, access::log_access(&db_con, user_id, &username, &server, timestamp), &cmd_name)?;
                        },
                        DbCommand::GetUnauthorizedPage { offset, limit, respond_to } => {
                            respond(respond_to, access::page(&db_con, offset, limit), &cmd_name)?;
                        },
                    }
                },
            }
        }
        debug!("DB TASK: exiting");

        close_database(db_con)?;

        Ok::<_, Error>(())
    })
}

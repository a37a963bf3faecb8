use async_trait::async_trait;
use tracing::error;

use crate::{trigger::DM_SERVER_NAME, Context, Error};

/// Allow-list gate run at the top of every command
///
/// The owner is always authorized. Everyone else must be allow-listed and
/// not blacklisted. Denied attempts are recorded in the unauthorized_access
/// table before the command is rejected
#[async_trait]
pub trait AccessCheck {
    async fn require_authorized(self) -> Result<(), Error>;
    async fn require_owner(self) -> Result<(), Error>;
}

#[async_trait]
impl<'a> AccessCheck for &'a Context<'a> {
    async fn require_authorized(self) -> Result<(), Error> {
        let user = self.author();
        let data = self.data();

        if user.id == data.owner_id {
            return Ok(());
        }

        if !data.is_blacklisted(user.id.into()).await?
            && data.is_user_allowed(user.id.into()).await?
        {
            return Ok(());
        }

        deny(self).await
    }

    async fn require_owner(self) -> Result<(), Error> {
        if self.author().id == self.data().owner_id {
            return Ok(());
        }

        deny(self).await
    }
}

async fn deny(ctx: &Context<'_>) -> Result<(), Error> {
    let user = ctx.author();
    let server = ctx
        .guild()
        .map(|guild| guild.name)
        .unwrap_or_else(|| DM_SERVER_NAME.to_string());

    if let Err(e) = ctx
        .data()
        .log_unauthorized_access(user.id.into(), user.tag(), server, ctx.created_at())
        .await
    {
        // The denial must stand even when the log write fails
        error!("Failed to record unauthorized access by {}: {:?}", user.tag(), e);
    }

    Err(Error::Unauthorized(user.id.0))
}

use std::fmt::Write;

use serde::Deserialize;

use crate::Error;

pub const MCSRVSTAT_API_BASE: &str = "https://api.mcsrvstat.us";

/// The parts of a mcsrvstat.us v3 response the status embed uses
#[derive(Debug, Default, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub online: bool,
    pub version: Option<String>,
    pub players: Option<Players>,
    pub motd: Option<Motd>,
    pub icon: Option<String>,
    pub srv: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Players {
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub list: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Motd {
    #[serde(default)]
    pub clean: Vec<String>,
}

pub async fn fetch_status(
    client: &reqwest::Client,
    address: &str,
) -> Result<(ServerStatus, ServerStatus), Error> {
    let java = client
        .get(format!("{}/3/{}", MCSRVSTAT_API_BASE, address))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let bedrock = client
        .get(format!("{}/bedrock/3/{}", MCSRVSTAT_API_BASE, address))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok((java, bedrock))
}

/// Renders one edition section of the status embed
pub fn format_edition(status: &ServerStatus) -> Result<String, Error> {
    let mut msg = String::new();

    if !status.online {
        write!(&mut msg, "**Status:** :red_circle: Offline")?;
        return Ok(msg);
    }

    write!(&mut msg, "**Status:** :green_circle: Online\n")?;
    write!(
        &mut msg,
        "**Version:** `{}`\n",
        status.version.as_deref().unwrap_or("Unknown")
    )?;

    if let Some(players) = status.players.as_ref() {
        write!(&mut msg, "**Players:** `{}/{}` online\n", players.online, players.max)?;

        if !players.list.is_empty() {
            let names = players
                .list
                .iter()
                .take(10)
                .map(|player| player.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            write!(&mut msg, "```{}```\n", names)?;
            if players.list.len() > 10 {
                write!(&mut msg, "*and {} more...*\n", players.list.len() - 10)?;
            }
        }
    }

    if let Some(motd) = status
        .motd
        .as_ref()
        .and_then(|motd| motd.clean.first())
        .filter(|motd| !motd.is_empty())
    {
        write!(&mut msg, "**MOTD**\n```{}```", motd)?;
    }

    Ok(msg)
}

/// Thumbnail for the embed, only when the icon is a plain URL rather than
/// inline base64 data
pub fn icon_url(status: &ServerStatus) -> Option<&str> {
    status
        .icon
        .as_deref()
        .filter(|icon| icon.starts_with("http://") || icon.starts_with("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online_server() -> ServerStatus {
        serde_json::from_str(
            r#"{
                "online": true,
                "version": "1.20.4",
                "players": {
                    "online": 2,
                    "max": 20,
                    "list": [{"name": "alice", "uuid": "a"}, {"name": "bob", "uuid": "b"}]
                },
                "motd": {"clean": ["A Minecraft Server"]},
                "icon": "data:image/png;base64,AAAA",
                "srv": false
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn online_servers_render_version_players_and_motd() {
        let section = format_edition(&online_server()).unwrap();

        assert!(section.contains(":green_circle: Online"));
        assert!(section.contains("`1.20.4`"));
        assert!(section.contains("`2/20` online"));
        assert!(section.contains("alice, bob"));
        assert!(section.contains("A Minecraft Server"));
    }

    #[test]
    fn offline_servers_render_just_the_status_line() {
        let status: ServerStatus = serde_json::from_str(r#"{"online": false}"#).unwrap();
        assert_eq!(format_edition(&status).unwrap(), "**Status:** :red_circle: Offline");
    }

    #[test]
    fn base64_icons_are_not_used_as_thumbnails() {
        assert_eq!(icon_url(&online_server()), None);

        let status: ServerStatus = serde_json::from_str(
            r#"{"online": true, "icon": "https://example.com/icon.png"}"#,
        )
        .unwrap();
        assert_eq!(icon_url(&status), Some("https://example.com/icon.png"));
    }
}

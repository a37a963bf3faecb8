use std::fmt::Write;

use serde::Deserialize;

use crate::Error;

pub const HENRIK_API_BASE: &str = "https://api.henrikdev.xyz/valorant";

#[derive(Debug, Deserialize)]
struct AccountResponse {
    data: Option<AccountData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    pub name: Option<String>,
    pub tag: Option<String>,
    pub region: Option<String>,
    pub account_level: Option<u32>,
    pub title: Option<String>,
    pub card: Option<AccountCard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountCard {
    pub small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MmrResponse {
    data: Option<MmrData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MmrData {
    pub current_data: Option<CurrentRank>,
    pub highest_rank: Option<HighestRank>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentRank {
    pub currenttier_patched: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HighestRank {
    pub patched_tier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub account: AccountData,
    pub mmr: Option<MmrData>,
}

/// Account + MMR lookup. Returns None when the player doesn't exist. The MMR
/// call failing is not fatal, the profile just renders with unknown ranks
pub async fn fetch_profile(
    client: &reqwest::Client,
    api_key: Option<&str>,
    name: &str,
    tag: &str,
) -> Result<Option<Profile>, Error> {
    let mut request = client.get(format!("{}/v1/account/{}/{}", HENRIK_API_BASE, name, tag));
    if let Some(api_key) = api_key {
        request = request.header("Authorization", api_key);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }

    let account = match response.json::<AccountResponse>().await?.data {
        Some(account) => account,
        None => return Ok(None),
    };

    let region = account.region.clone().unwrap_or_else(|| "eu".to_string());
    let mut request = client.get(format!(
        "{}/v2/mmr/{}/{}/{}",
        HENRIK_API_BASE,
        region.to_lowercase(),
        name,
        tag
    ));
    if let Some(api_key) = api_key {
        request = request.header("Authorization", api_key);
    }

    let mmr = match request.send().await {
        Ok(response) if response.status().is_success() => {
            response.json::<MmrResponse>().await.ok().and_then(|r| r.data)
        }
        _ => None,
    };

    Ok(Some(Profile { account, mmr }))
}

pub fn format_profile(profile: &Profile) -> Result<String, Error> {
    let account = &profile.account;
    let current_rank = profile
        .mmr
        .as_ref()
        .and_then(|mmr| mmr.current_data.as_ref())
        .and_then(|current| current.currenttier_patched.as_deref())
        .unwrap_or("Unknown");
    let peak_rank = profile
        .mmr
        .as_ref()
        .and_then(|mmr| mmr.highest_rank.as_ref())
        .and_then(|highest| highest.patched_tier.as_deref())
        .unwrap_or("Unknown");

    let mut msg = String::new();
    write!(
        &mut msg,
        "**Level:** {}\n",
        account
            .account_level
            .map(|level| level.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    )?;
    write!(
        &mut msg,
        "**Region:** {}\n",
        account
            .region
            .as_deref()
            .map(|region| region.to_uppercase())
            .unwrap_or_else(|| "Unknown".to_string())
    )?;
    write!(&mut msg, "**Title:** {}\n", account.title.as_deref().unwrap_or("No Title"))?;
    write!(&mut msg, "**Current Rank:** {}\n", current_rank)?;
    write!(&mut msg, "**Peak Rank:** {}", peak_rank)?;

    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_render_rank_info_when_present() {
        let account: AccountData = serde_json::from_str(
            r#"{
                "name": "Shiraboi",
                "tag": "cute",
                "region": "eu",
                "account_level": 120,
                "card": {"small": "https://example.com/card.png"}
            }"#,
        )
        .unwrap();
        let mmr: MmrData = serde_json::from_str(
            r#"{
                "current_data": {"currenttier_patched": "Diamond 2"},
                "highest_rank": {"patched_tier": "Ascendant 1"}
            }"#,
        )
        .unwrap();

        let msg = format_profile(&Profile { account, mmr: Some(mmr) }).unwrap();
        assert!(msg.contains("**Level:** 120"));
        assert!(msg.contains("**Region:** EU"));
        assert!(msg.contains("**Title:** No Title"));
        assert!(msg.contains("**Current Rank:** Diamond 2"));
        assert!(msg.contains("**Peak Rank:** Ascendant 1"));
    }

    #[test]
    fn missing_mmr_renders_unknown_ranks() {
        let account: AccountData = serde_json::from_str(r#"{"name": "a", "tag": "b"}"#).unwrap();

        let msg = format_profile(&Profile { account, mmr: None }).unwrap();
        assert!(msg.contains("**Current Rank:** Unknown"));
        assert!(msg.contains("**Peak Rank:** Unknown"));
    }
}

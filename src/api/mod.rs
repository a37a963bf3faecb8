use std::time::Duration;

use crate::Error;

pub mod imgflip;
pub mod minecraft;
pub mod valorant;

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// One pooled client shared by every integration
pub fn build_http_client() -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()?)
}

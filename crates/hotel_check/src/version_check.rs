use std::time::Duration;

use reqwest::StatusCode;

/// Where the latest published version is announced
pub const PUBLISHED_VERSION_URL: &str =
    "https://raw.githubusercontent.com/mrozekma/gencon-hotel-check/master/version";

/// Printed when a newer version has been published
pub const OUT_OF_DATE_WARNING: &str = "Warning: This program is out-of-date. Visit https://github.com/mrozekma/gencon-hotel-check for the latest version";

/// Version shipped with this build, compared against the published file
pub const SHIPPED_VERSION: &str = include_str!("../version");

/// Whether the published version differs from ours
pub fn is_out_of_date(local: &str, published: &str) -> bool {
    local.trim() != published.trim()
}

/// Fetch the published version. Any failure yields `None`.
pub async fn published_version(url: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .ok()?;

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            log::debug!("Version check failed: {}", e);
            return None;
        }
    };
    if response.status() != StatusCode::OK {
        log::debug!("Version check answered {}", response.status());
        return None;
    }
    response.text().await.ok()
}

/// Warn on stdout when a newer version is available
pub async fn warn_if_outdated(url: &str) {
    if let Some(published) = published_version(url).await {
        if is_out_of_date(SHIPPED_VERSION, &published) {
            println!("{}", OUT_OF_DATE_WARNING);
            println!();
        }
    }
}

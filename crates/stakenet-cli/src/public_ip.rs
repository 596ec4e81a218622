//! External IPv4 lookup for enode URLs and manifests.

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::debug;

pub const DEFAULT_ECHO_URL: &str = "https://api.ipify.org";

/// Ask a plain-text IP echo service for this host's public IPv4 address.
pub async fn lookup(echo_url: &str, timeout: Duration) -> anyhow::Result<Ipv4Addr> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("building HTTP client")?;
    let resp = client
        .get(echo_url)
        .send()
        .await
        .with_context(|| format!("querying {echo_url}"))?;
    if !resp.status().is_success() {
        bail!("{echo_url} answered {}", resp.status());
    }
    let body = resp.text().await.context("reading IP echo response")?;
    debug!(echo_url, body = body.trim(), "public IP lookup");
    parse(&body).with_context(|| format!("{echo_url} returned {:?}", body.trim()))
}

fn parse(body: &str) -> anyhow::Result<Ipv4Addr> {
    Ok(body.trim().parse::<Ipv4Addr>()?)
}

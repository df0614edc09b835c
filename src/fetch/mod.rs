// src/fetch/mod.rs

pub mod urls;
pub mod zips;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::{
    io::{self, Write},
    time::Duration,
};
use tracing::debug;
use url::Url;

use crate::config::Config;

pub use urls::{parse_date, resolve_many, resolve_one, ResolvedFile};

/// Result of a full retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    /// The body was written out; `bytes` is its length.
    Complete { bytes: u64 },
    /// The server answered but has nothing for us (usually 404 for a month
    /// that is not published yet).
    Missing { status: u16 },
}

/// The HTTP operations the pipeline needs.
pub trait Transport {
    /// HEAD `url` within `timeout`; `Ok(true)` for a 2xx answer.
    fn probe(&self, url: &Url, timeout: Duration) -> Result<bool>;

    /// GET `url`, streaming a successful body into `out`.
    fn fetch(&self, url: &Url, out: &mut dyn Write) -> Result<Fetched>;
}

/// Blocking reqwest transport. The main transfer has no timeout.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(None::<Duration>)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn probe(&self, url: &Url, timeout: Duration) -> Result<bool> {
        let resp = self
            .client
            .head(url.clone())
            .timeout(timeout)
            .send()
            .with_context(|| format!("HEAD {}", url))?;
        debug!(url = %url, status = %resp.status(), "probed");
        Ok(resp.status().is_success())
    }

    fn fetch(&self, url: &Url, out: &mut dyn Write) -> Result<Fetched> {
        let mut resp = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("GET {}", url))?;
        let status = resp.status();
        if !status.is_success() {
            return Ok(Fetched::Missing {
                status: status.as_u16(),
            });
        }
        let bytes = io::copy(&mut resp, out)
            .with_context(|| format!("reading body from {}", url))?;
        Ok(Fetched::Complete { bytes })
    }
}

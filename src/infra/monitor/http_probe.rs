// HTTP implementation of the monitor probe: one GET with a bounded timeout.

use crate::core::monitor::{ProbeError, Prober};
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Result<u16, ProbeError> {
        self.client
            .get(url)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| ProbeError(e.to_string()))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::loader::{LoaderConfig, PageLoader};

/// Plain HTTP loader. Sees only the server-rendered markup, so the settle
/// delay has nothing to wait for and is ignored.
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true);

        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua.clone());
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl PageLoader for HttpLoader {
    async fn load(&self, url: &str, _settle: Duration) -> Result<String> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        Ok(response.text().await?)
    }
}

use crate::app::ports::{HttpClientPort, HttpPage};
use crate::constants::looks_blocked;
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::debug;

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let agent = user_agent
            .parse()
            .map_err(|_| ScraperError::Config(format!("invalid user agent '{}'", user_agent)))?;
        headers.insert(USER_AGENT, agent);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpPage> {
        debug!(%url, ?query, "pinging");
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await?;
        if looks_blocked(status, &body) {
            return Err(ScraperError::Blocked { url: final_url, status });
        }
        Ok(HttpPage { status, final_url, body })
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        debug!(%url, "posting");
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if looks_blocked(status, &text) {
            return Err(ScraperError::Blocked { url: url.to_string(), status });
        }
        if !(200..300).contains(&status) {
            return Err(ScraperError::Api {
                message: format!("{} answered with status {}", url, status),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

use crate::message::FeedMessage;
use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchRequest {
    from_timestamp: i64,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    nickname: &'a str,
    message: &'a str,
}

#[derive(Deserialize, Default)]
struct FeedResponse {
    #[serde(default)]
    messages: Vec<FeedMessage>,
}

pub struct FeedClient {
    client: Client,
    get_url: String,
    send_url: String,
}

impl FeedClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| anyhow!("build feed client: {err}"))?;

        Ok(Self {
            client,
            get_url: format!("{}/messages/get", base_url.trim_end_matches('/')),
            send_url: format!("{}/messages/send", base_url.trim_end_matches('/')),
        })
    }

    /// Fetch every message newer than `from_timestamp`, in feed order.
    pub fn fetch_since(&self, from_timestamp: i64) -> Result<Vec<FeedMessage>> {
        let request = FetchRequest { from_timestamp };

        let response = self.client.post(&self.get_url).json(&request).send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "feed read failed with status: {}",
                response.status()
            ));
        }

        let feed_response: FeedResponse = response.json()?;
        Ok(feed_response.messages)
    }

    /// Post one outbound message. The response may itself carry new
    /// messages, which the caller processes exactly like a poll result.
    pub fn send(&self, nickname: &str, message: &str) -> Result<Vec<FeedMessage>> {
        let request = SendRequest { nickname, message };

        let response = self.client.post(&self.send_url).json(&request).send()?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "feed write failed with status: {}",
                response.status()
            ));
        }

        let feed_response: FeedResponse = response.json()?;
        Ok(feed_response.messages)
    }
}

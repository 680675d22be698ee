//! Fetchers for the public joke/quote/fact/advice endpoints.
//!
//! Each endpoint has its own JSON shape; each fetcher relays one item
//! verbatim, pre-formatted for the chat. Failures are returned to the
//! dispatcher, which replies with that handler's apology line.

use std::time::Duration;

use serde::Deserialize;

const JOKE_URL: &str = "https://official-joke-api.appspot.com/random_joke";
const QUOTE_URL: &str = "https://api.quotable.io/random";
const FACT_URL: &str = "https://uselessfacts.jsph.pl/random.json?language=en";
const ADVICE_URL: &str = "https://api.adviceslip.com/advice";

#[derive(Deserialize)]
struct Joke {
    setup: String,
    punchline: String,
}

#[derive(Deserialize)]
struct Quote {
    content: String,
    author: String,
}

#[derive(Deserialize)]
struct Fact {
    text: String,
}

#[derive(Deserialize)]
struct AdviceSlip {
    slip: Advice,
}

#[derive(Deserialize)]
struct Advice {
    advice: String,
}

pub struct FunClient {
    client: reqwest::Client,
}

impl FunClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    async fn fetch<R: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<R, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request error: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {status}"));
        }

        response.json().await.map_err(|e| format!("bad JSON body: {e}"))
    }

    pub async fn joke(&self) -> Result<String, String> {
        let joke: Joke = self.fetch(JOKE_URL).await?;
        Ok(format!("😂 {}\n\n{} 🤣", joke.setup, joke.punchline))
    }

    pub async fn quote(&self) -> Result<String, String> {
        let quote: Quote = self.fetch(QUOTE_URL).await?;
        Ok(format!("💭 \"{}\"\n\n— {}", quote.content, quote.author))
    }

    pub async fn fact(&self) -> Result<String, String> {
        let fact: Fact = self.fetch(FACT_URL).await?;
        Ok(format!("🎲 {}", fact.text))
    }

    pub async fn advice(&self) -> Result<String, String> {
        let slip: AdviceSlip = self.fetch(ADVICE_URL).await?;
        Ok(format!("🌟 {}", slip.slip.advice))
    }
}

impl Default for FunClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes_deserialize() {
        let joke: Joke =
            serde_json::from_str(r#"{"setup": "s", "punchline": "p", "id": 1, "type": "general"}"#)
                .unwrap();
        assert_eq!(joke.setup, "s");
        assert_eq!(joke.punchline, "p");

        let quote: Quote =
            serde_json::from_str(r#"{"content": "c", "author": "a", "length": 1}"#).unwrap();
        assert_eq!(quote.author, "a");

        let fact: Fact = serde_json::from_str(r#"{"text": "t", "source": "x"}"#).unwrap();
        assert_eq!(fact.text, "t");

        let advice: AdviceSlip =
            serde_json::from_str(r#"{"slip": {"id": 2, "advice": "nap"}}"#).unwrap();
        assert_eq!(advice.slip.advice, "nap");
    }
}

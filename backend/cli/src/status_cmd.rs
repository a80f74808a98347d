//! CLI Status Command
//!
//! Reports the health of a running OrderIQ service.

use std::time::Duration;

use anyhow::Result;

use orderiq_config::OrderIqConfig;

use crate::terminal_output::note_warn;

/// Health URL for the configured listener. A wildcard bind is probed on localhost.
pub fn health_url(config: &OrderIqConfig, base: Option<String>) -> String {
    let base = base.unwrap_or_else(|| {
        let host = match config.bind_address().as_str() {
            "0.0.0.0" | "::" | "[::]" => "localhost".to_string(),
            other => other.to_string(),
        };
        format!("http://{host}:{}", config.port())
    });
    format!("{}/api/health", base.trim_end_matches('/'))
}

pub async fn run(config: &OrderIqConfig, base: Option<String>) -> Result<()> {
    let url = health_url(config, base);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Ok(resp) => {
            note_warn(&format!("OrderIQ answered {} at {url}", resp.status()));
        }
        Err(_) => {
            note_warn(&format!("OrderIQ is not running at {url}"));
        }
    }
    Ok(())
}

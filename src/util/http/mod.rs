use std::{collections::HashMap, time::Duration};

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use reqwest::{Client, Method, RequestBuilder, Response};

use crate::util::text;

pub mod user_agent;

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

/// HTTP 請求失敗時的最大重試次數。
const MAX_RETRIES: usize = 3;

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(60))
            // ===== Cookie 和重定向 =====
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

/// Performs an HTTP GET request and returns the body decoded as UTF-8 or Big5.
pub async fn get(url: &str) -> Result<String> {
    let response = send(Method::GET, url, None::<fn(_) -> _>).await?;
    decode_body(response).await
}

/// Performs an HTTP POST request with form data and returns the decoded body.
pub async fn post_form(url: &str, params: &HashMap<&str, String>) -> Result<String> {
    let response = send(Method::POST, url, Some(|rb: RequestBuilder| rb.form(params))).await?;
    decode_body(response).await
}

async fn decode_body(response: Response) -> Result<String> {
    let bytes = response
        .bytes()
        .await
        .map_err(|why| anyhow!("Error reading response body: {:?}", why))?;

    Ok(text::decode_text(bytes.as_ref()))
}

/// Sends an HTTP request with retries on failure.
///
/// A non-success status code counts as a failed attempt. The delay between
/// attempts grows with each attempt.
async fn send(
    method: Method,
    url: &str,
    body: Option<impl FnOnce(RequestBuilder) -> RequestBuilder>,
) -> Result<Response> {
    let visit_log = format!("{method}:{url}");
    let client = get_client()?;
    let mut rb = client.request(method, url);
    let mut last_error = String::new();

    if let Some(body_fn) = body {
        rb = body_fn(rb);
    }

    for attempt in 1..=MAX_RETRIES {
        let rb_clone = rb
            .try_clone()
            .ok_or_else(|| anyhow!("Failed to clone RequestBuilder"))?;

        match rb_clone.send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                last_error = format!("status_code = {}", response.status());
            }
            Err(why) => {
                last_error = format!("{:?}", why);
            }
        }

        tracing::warn!(
            attempt,
            "Failed to send {} because {}",
            visit_log,
            last_error
        );

        if attempt < MAX_RETRIES {
            tokio::time::sleep(Duration::from_secs(2 * attempt as u64)).await;
        }
    }

    Err(anyhow!(
        "Failed to download data from {} after {} attempts, last error: {}",
        visit_log,
        MAX_RETRIES,
        last_error
    ))
}

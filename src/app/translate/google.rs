//! Online translation through the public mobile translate page
//!
//! Requests are rate limited and retried with exponential backoff on 429,
//! 503 and transport failures. Results are memoized per translator so a
//! document parsed twice yields identical records.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use url::Url;

use super::{Language, TranslationConfig, Translator};
use crate::constants::{env as env_constants, translate};
use crate::errors::{TranslationError, TranslationResult};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;
type CacheKey = (Language, Language, String);

/// Scrapes translations from the mobile translate page
pub struct GoogleTranslator {
    endpoint: Url,
    request_timeout: Duration,
    max_retries: u32,
    rate_limiter: DirectLimiter,
    // Built on first use so the translator can be created inside an async
    // runtime and used from blocking tasks
    client: OnceCell<Client>,
    cache: Mutex<HashMap<CacheKey, String>>,
}

impl std::fmt::Debug for GoogleTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslator")
            .field("endpoint", &self.endpoint.as_str())
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GoogleTranslator {
    /// Create a translator from runtime settings
    ///
    /// The endpoint can be overridden with `FREIGHT_MANIFEST_TRANSLATE_ENDPOINT`.
    ///
    /// # Errors
    ///
    /// Returns `TranslationError` if the endpoint is not a valid URL or the
    /// rate limit is zero
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let endpoint_text = std::env::var(env_constants::TRANSLATE_ENDPOINT)
            .unwrap_or_else(|_| config.endpoint.clone());
        let endpoint = Url::parse(&endpoint_text).map_err(|e| TranslationError::InvalidUrl {
            url: endpoint_text.clone(),
            error: e.to_string(),
        })?;

        Ok(Self {
            endpoint,
            request_timeout: config.request_timeout,
            max_retries: config.max_retries,
            rate_limiter: Self::build_rate_limiter(config.rate_limit_rps)?,
            client: OnceCell::new(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> TranslationResult<DirectLimiter> {
        let rate = NonZeroU32::new(rate_limit_rps).ok_or_else(|| TranslationError::RateLimit {
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rate)))
    }

    fn client(&self) -> TranslationResult<&Client> {
        self.client.get_or_try_init(|| {
            Client::builder()
                .timeout(self.request_timeout)
                .user_agent(translate::USER_AGENT)
                .build()
                .map_err(TranslationError::Http)
        })
    }

    /// Query URL for one text
    pub fn request_url(&self, text: &str, source: Language, target: Language) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("sl", source.code())
            .append_pair("tl", target.code())
            .append_pair("q", text);
        url
    }

    fn wait_for_permit(&self) {
        while self.rate_limiter.check().is_err() {
            thread::sleep(Duration::from_millis(translate::RATE_LIMIT_POLL_MS));
        }
    }

    fn backoff(retries: u32) -> Duration {
        let factor = 2_u64.checked_pow(retries).unwrap_or(u64::MAX);
        Duration::from_millis(translate::RETRY_BASE_DELAY_MS.saturating_mul(factor))
    }

    fn fetch_page(&self, url: &Url) -> TranslationResult<String> {
        let client = self.client()?;
        let mut retries = 0;

        loop {
            self.wait_for_permit();

            match client.get(url.as_str()).send() {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        if retries < self.max_retries {
                            retries += 1;
                            let delay = Self::backoff(retries);
                            tracing::warn!(
                                "Translate service answered {}. Backing off for {}ms",
                                status.as_u16(),
                                delay.as_millis()
                            );
                            thread::sleep(delay);
                            continue;
                        }
                        return Err(TranslationError::MaxRetriesExceeded {
                            max_retries: self.max_retries,
                        });
                    }

                    if !status.is_success() {
                        return Err(TranslationError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    return response.text().map_err(TranslationError::Http);
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = Self::backoff(retries);
                    tracing::warn!(
                        "Translate request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    thread::sleep(delay);
                }
                Err(e) => {
                    tracing::error!("Translate request failed after {} retries: {}", retries, e);
                    return Err(TranslationError::MaxRetriesExceeded {
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<String> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: CacheKey, translated: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, translated.to_string());
        }
    }
}

/// Pull the translated text out of the result page
pub fn extract_translation(html: &str) -> TranslationResult<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(translate::RESULT_SELECTOR).map_err(|e| TranslationError::InvalidResponse {
            reason: format!("Bad result selector: {:?}", e),
        })?;

    let text = document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(TranslationError::InvalidResponse {
            reason: "No result container in response".to_string(),
        });
    }
    Ok(text)
}

impl Translator for GoogleTranslator {
    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> TranslationResult<String> {
        let text = text.trim();
        if text.is_empty() || source == target {
            return Ok(text.to_string());
        }

        let key = (source, target, text.to_string());
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let url = self.request_url(text, source, target);
        let page = self.fetch_page(&url)?;
        let translated = extract_translation(&page)?;
        tracing::debug!("Translated '{}' -> '{}'", text, translated);

        self.remember(key, &translated);
        Ok(translated)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

//! Market metrics lookup for listed companies.
//!
//! A company name is resolved to its listing code through a search page,
//! then the quote page for that code is flattened to text and run through
//! the metric rule cascades in [`parser`].

pub mod parser;

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use filingcast_shared::{FilingcastError, QuoteConfig, Result, StockMetrics};

pub use parser::{NOT_AVAILABLE, find_listing_code, parse_metrics};

// ---------------------------------------------------------------------------
// QuoteClient
// ---------------------------------------------------------------------------

/// HTTP client for the search and quote pages.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    client: Client,
    config: QuoteConfig,
    quote_base: Url,
}

impl QuoteClient {
    pub fn new(config: &QuoteConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FilingcastError::Network(format!("failed to build HTTP client: {e}")))?;
        let quote_base = Url::parse(&config.quote_base_url).map_err(|e| {
            FilingcastError::config(format!("invalid quote_base_url '{}': {e}", config.quote_base_url))
        })?;

        Ok(Self {
            client,
            config: config.clone(),
            quote_base,
        })
    }

    /// Resolve a company name to its listing code.
    #[instrument(skip(self))]
    pub async fn lookup_code(&self, company: &str) -> Result<Option<String>> {
        let query = format!("{company} 株価");
        let url = Url::parse_with_params(&self.config.search_url, &[("p", query.as_str())])
            .map_err(|e| {
                FilingcastError::config(format!("invalid search_url '{}': {e}", self.config.search_url))
            })?;

        let html = self.get_text(url.as_str()).await?;
        let code = {
            let doc = Html::parse_document(&html);
            let anchors = Selector::parse("a[href]")
                .map_err(|e| FilingcastError::parse(format!("anchor selector: {e}")))?;
            find_listing_code(
                doc.select(&anchors).filter_map(|a| a.value().attr("href")),
                &self.quote_base,
            )
        };

        match &code {
            Some(code) => debug!(%code, "listing code found"),
            None => warn!(company, "no listing code in search results"),
        }
        Ok(code)
    }

    /// Fetch and parse the quote page for a listing code.
    #[instrument(skip(self))]
    pub async fn fetch_quote(&self, code: &str) -> Result<Option<StockMetrics>> {
        let base = self.config.quote_base_url.trim_end_matches('/');
        let html = self.get_text(&format!("{base}/quote/{code}.T")).await?;

        let doc = Html::parse_document(&html);
        let text: String = doc.root_element().text().collect();

        let Some(mut metrics) = parse_metrics(&text, code) else {
            warn!(code, "PER/PBR not available");
            return Ok(None);
        };
        metrics.sector = find_sector(&doc);
        Ok(Some(metrics))
    }

    /// Name → code → metrics, pausing between the two requests.
    #[instrument(skip(self))]
    pub async fn fetch(&self, company: &str) -> Result<Option<StockMetrics>> {
        let Some(code) = self.lookup_code(company).await? else {
            return Ok(None);
        };

        tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;

        let metrics = self.fetch_quote(&code).await?;
        if let Some(m) = &metrics {
            info!(
                company,
                code = %code,
                per = %m.per,
                pbr = %m.pbr,
                roe = m.roe.as_deref().unwrap_or("N/A"),
                market_cap = m.market_cap.as_deref().unwrap_or("N/A"),
                "metrics fetched"
            );
        }
        Ok(metrics)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FilingcastError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FilingcastError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| FilingcastError::Network(format!("{url}: failed to read body: {e}")))
    }
}

/// First `span`/`div` whose class mentions "sector".
fn find_sector(doc: &Html) -> Option<String> {
    let selector = Selector::parse("span[class], div[class]").ok()?;
    doc.select(&selector)
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|c| c.to_ascii_lowercase().contains("sector"))
        })
        .map(|el| el.text().map(str::trim).collect::<String>())
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> QuoteConfig {
        QuoteConfig {
            search_url: format!("{}/search", server.uri()),
            quote_base_url: server.uri(),
            request_delay_ms: 0,
            ..Default::default()
        }
    }

    /// Search results linking to the mock server's quote page.
    fn search_html(server: &MockServer) -> String {
        format!(
            r#"<html><body>
<a href="https://example.com/about">about</a>
<a href="https://finance.yahoo.co.jp/quote/7203.T">elsewhere</a>
<a href="{}/quote/6920.T">レーザーテック(株)</a>
</body></html>"#,
            server.uri()
        )
    }

    const QUOTE_HTML: &str = r#"<html><body>
<span class="PriceBoard__sector">電気機器</span>
<dl><dt>PER（会社予想）</dt><dd>54.66倍</dd></dl>
<dl><dt>PBR（実績）</dt><dd>15.90倍</dd></dl>
<dl><dt>時価総額</dt><dd>1.2兆円</dd></dl>
</body></html>"#;

    #[tokio::test]
    async fn fetch_resolves_code_then_metrics() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("p", "レーザーテック 株価"))
            .respond_with(ResponseTemplate::new(200).set_body_string(search_html(&server)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/quote/6920.T"))
            .respond_with(ResponseTemplate::new(200).set_body_string(QUOTE_HTML))
            .mount(&server)
            .await;

        let client = QuoteClient::new(&config_for(&server)).unwrap();
        let metrics = client.fetch("レーザーテック").await.unwrap().expect("metrics");

        assert_eq!(metrics.code.as_deref(), Some("6920"));
        assert_eq!(metrics.per, "54.66");
        assert_eq!(metrics.pbr, "15.90");
        assert_eq!(metrics.market_cap.as_deref(), Some("1.2兆円"));
        assert_eq!(metrics.sector.as_deref(), Some("電気機器"));
    }

    #[tokio::test]
    async fn no_quote_link_means_no_metrics() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .mount(&server)
            .await;

        let client = QuoteClient::new(&config_for(&server)).unwrap();
        assert!(client.fetch("Unknown Corp").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn http_error_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(search_html(&server)))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/quote/6920.T"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = QuoteClient::new(&config_for(&server)).unwrap();
        let err = client.fetch("レーザーテック").await.unwrap_err();
        assert!(matches!(err, FilingcastError::Network(_)));
    }

    #[test]
    fn invalid_quote_base_is_config_error() {
        let config = QuoteConfig {
            quote_base_url: "not a url".into(),
            ..Default::default()
        };
        let err = QuoteClient::new(&config).unwrap_err();
        assert!(matches!(err, FilingcastError::Config { .. }));
    }
}

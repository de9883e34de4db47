//! Metric extraction from a quote page's flattened text.
//!
//! Each metric has an ordered cascade of patterns; the first pattern that
//! matches wins. Values are returned exactly as displayed on the page.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use filingcast_shared::StockMetrics;

/// Placeholder the quote page shows for a metric it cannot compute.
pub const NOT_AVAILABLE: &str = "---";

/// Path of a quote page on the quote host.
pub(crate) static QUOTE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/quote/(\d+)\.T(?:/|$)").expect("quote path regex"));

// ---------------------------------------------------------------------------
// Rule cascades (compiled once)
// ---------------------------------------------------------------------------

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid metric regex"))
        .collect()
}

/// `PER（会社予想）---` style "not available" markers.
static PER_NA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PER[（(][^）)]*[）)][^P]*?---").expect("valid regex"));
static PBR_NA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PBR[（(][^）)]*[）)][^E]*?---").expect("valid regex"));

static PER_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"PER[（(][^）)]*[）)][^0-9]*([\d.]+)倍",
        r"PER[（(][^）)]*[）)]\s*([\d.]+)",
        r"PER\s*[：:]\s*([\d.]+)",
        r"([\d.]+)\s*PER",
    ])
});

static PBR_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"PBR[（(][^）)]*[）)][^0-9]*([\d.]+)倍",
        r"PBR[（(][^）)]*[）)]\s*([\d.]+)",
        r"PBR\s*[：:]\s*([\d.]+)",
        r"([\d.]+)\s*PBR",
    ])
});

static ROE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"ROE[（(][^）)]*[）)][^0-9]*([\d.]+)%",
        r"ROE[（(][^）)]*[）)]\s*([\d.]+)",
        r"ROE\s*[：:]\s*([\d.]+)",
    ])
});

static DIVIDEND_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"配当利回り[（(][^）)]*[）)][^0-9]*([\d.]+)%",
        r"配当利回り\s*[：:]\s*([\d.]+)",
        r"利回り[^0-9]*([\d.]+)%",
    ])
});

static PEG_RULES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[r"PEG[^0-9]*([\d.]+)", r"PEG\s*[：:]\s*([\d.]+)"]));

static EQUITY_RATIO_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"自己資本比率[^0-9]*([\d.]+)%",
        r"自己資本比率\s*[：:]\s*([\d.]+)",
    ])
});

static OPERATING_MARGIN_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"営業利益率[^0-9]*([\d.]+)%",
        r"営業利益率\s*[：:]\s*([\d.]+)",
    ])
});

/// Market capitalisation patterns paired with the unit appended to the value.
static MARKET_CAP_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"時価総額[^0-9]*([\d,]+\.?\d*)\s*兆円", "兆円"),
        (r"時価総額[^0-9]*([\d,]+)\s*億円", "億円"),
        (r"時価総額\s*[：:]\s*([\d,]+\.?\d*)\s*兆円", "兆円"),
        (r"時価総額\s*[：:]\s*([\d,]+)\s*億円", "億円"),
    ]
    .into_iter()
    .map(|(p, unit)| (Regex::new(p).expect("valid market cap regex"), unit))
    .collect()
});

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn first_capture(metric: &str, rules: &[Regex], text: &str) -> Option<String> {
    rules.iter().find_map(|re| {
        let value = re.captures(text)?.get(1)?.as_str().to_string();
        debug!(metric, pattern = %re, %value, "metric matched");
        Some(value)
    })
}

fn ratio(metric: &str, na: &Regex, rules: &[Regex], text: &str) -> Option<String> {
    if na.is_match(text) {
        debug!(metric, "metric not available");
        return Some(NOT_AVAILABLE.to_string());
    }
    first_capture(metric, rules, text)
}

fn market_cap(text: &str) -> Option<String> {
    MARKET_CAP_RULES.iter().find_map(|(re, unit)| {
        let value = re.captures(text)?.get(1)?.as_str().replace(',', "");
        Some(format!("{value}{unit}"))
    })
}

/// Extract metrics from a quote page's text.
///
/// Returns `None` unless both PER and PBR are present (a `---` placeholder
/// counts as present).
pub fn parse_metrics(text: &str, code: &str) -> Option<StockMetrics> {
    let per = ratio("per", &PER_NA_RE, &PER_RULES, text);
    let pbr = ratio("pbr", &PBR_NA_RE, &PBR_RULES, text);

    let (Some(per), Some(pbr)) = (per, pbr) else {
        debug!(code, "PER/PBR not found on quote page");
        return None;
    };

    Some(StockMetrics {
        code: Some(code.to_string()),
        per,
        pbr,
        roe: first_capture("roe", &ROE_RULES, text),
        peg: first_capture("peg", &PEG_RULES, text),
        dividend_yield: first_capture("dividend_yield", &DIVIDEND_RULES, text),
        equity_ratio: first_capture("equity_ratio", &EQUITY_RATIO_RULES, text),
        operating_margin: first_capture("operating_margin", &OPERATING_MARGIN_RULES, text),
        market_cap: market_cap(text),
        sector: None,
    })
}

/// Listing code from the first link to a quote page on `quote_base`'s host.
///
/// Links to other hosts and relative links are ignored.
pub fn find_listing_code<'a>(
    hrefs: impl IntoIterator<Item = &'a str>,
    quote_base: &Url,
) -> Option<String> {
    hrefs.into_iter().find_map(|href| {
        let link = Url::parse(href).ok()?;
        if link.host_str() != quote_base.host_str()
            || link.port_or_known_default() != quote_base.port_or_known_default()
        {
            return None;
        }
        Some(QUOTE_PATH_RE.captures(link.path())?.get(1)?.as_str().to_string())
    })
}

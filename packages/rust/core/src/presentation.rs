//! Viewer-facing text: narration intro, upload title, description and tags.

use chrono::{Datelike, NaiveDate};

use filingcast_shared::StockMetrics;

const NA: &str = "N/A";

/// `2026年1月30日`
pub fn format_date_ja(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Spoken preamble summarising the key metrics, followed by a blank line.
pub fn intro_text(entity_name: &str, metrics: &StockMetrics) -> String {
    let mut parts = vec![
        format!("【{entity_name}】"),
        format!("PER: {}", metrics.per),
        format!("PBR: {}", metrics.pbr),
    ];
    if let Some(roe) = &metrics.roe {
        parts.push(format!("ROE: {roe}%"));
    }
    if let Some(dividend) = &metrics.dividend_yield {
        parts.push(format!("配当: {dividend}%"));
    }
    if let Some(cap) = &metrics.market_cap {
        parts.push(format!("時価総額: {cap}"));
    }
    format!("{}\n\n", parts.join(" / "))
}

/// `【6920】レーザーテック 2026年1月30日 決算サマリー`; code and date are optional.
pub fn video_title(entity_name: &str, date: Option<NaiveDate>, code: Option<&str>) -> String {
    let prefix = code.map(|c| format!("【{c}】")).unwrap_or_default();
    match date {
        Some(date) => format!("{prefix}{entity_name} {} 決算サマリー", format_date_ja(date)),
        None => format!("{prefix}{entity_name} 決算サマリー"),
    }
}

pub fn description(entity_name: &str, metrics: Option<&StockMetrics>) -> String {
    let mut lines = vec![format!(
        "{entity_name}の決算短信の内容を音声で解説した動画です。"
    )];

    if let Some(m) = metrics {
        if let Some(code) = &m.code {
            lines.push(format!("株価コード: {code}"));
        }
        lines.push(format!("PER: {}", if m.per.is_empty() { NA } else { m.per.as_str() }));
        lines.push(format!("PBR: {}", if m.pbr.is_empty() { NA } else { m.pbr.as_str() }));

        let optional = [
            ("ROE", &m.roe, "%"),
            ("PEG", &m.peg, ""),
            ("配当利回り", &m.dividend_yield, "%"),
            ("自己資本比率", &m.equity_ratio, "%"),
            ("営業利益率", &m.operating_margin, "%"),
            ("時価総額", &m.market_cap, ""),
        ];
        for (label, value, unit) in optional {
            if let Some(value) = value {
                lines.push(format!("{label}: {value}{unit}"));
            }
        }
    }

    lines.join("\n")
}

/// Configured base tags plus the entity name and `{entity}決算`.
pub fn tags(base: &[String], entity_name: &str) -> Vec<String> {
    let mut tags = base.to_vec();
    for tag in [entity_name.to_string(), format!("{entity_name}決算")] {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

//! Case conventions shared by every join key.
//!
//! Exit-survey labels (lookup `Exit Survey`, purchase-series names) are
//! lower-cased; airings tickers (lookup `Airings`, airings `Network`) are
//! upper-cased. Both functions trim surrounding whitespace, are idempotent and
//! pass `None` through untouched.

use crate::types::{AiringRecord, LookupEntry};

pub fn survey_label(label: Option<&str>) -> Option<String> {
    label.map(|s| s.trim().to_lowercase())
}

pub fn ticker(symbol: Option<&str>) -> Option<String> {
    symbol.map(|s| s.trim().to_uppercase())
}

pub fn lookup_entry(entry: &LookupEntry) -> LookupEntry {
    LookupEntry {
        exit_survey: entry.exit_survey.trim().to_lowercase(),
        airings: ticker(entry.airings.as_deref()),
    }
}

pub fn airing(record: &AiringRecord) -> AiringRecord {
    AiringRecord {
        network: ticker(record.network.as_deref()),
        ..record.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conventions() {
        assert_eq!(survey_label(Some(" Fox_News ")), Some("fox_news".to_string()));
        assert_eq!(ticker(Some("cnbc ")), Some("CNBC".to_string()));
    }

    #[test]
    fn test_none_passes_through() {
        assert_eq!(survey_label(None), None);
        assert_eq!(ticker(None), None);
        let entry = LookupEntry {
            exit_survey: "Other".to_string(),
            airings: None,
        };
        assert_eq!(lookup_entry(&entry).airings, None);
    }

    #[test]
    fn test_idempotent() {
        for raw in ["HGTV", "Food Network", "  mixed_Case  ", ""] {
            let once = survey_label(Some(raw));
            assert_eq!(survey_label(once.as_deref()), once);
            let once = ticker(Some(raw));
            assert_eq!(ticker(once.as_deref()), once);
        }
    }

    #[test]
    fn test_lookup_entry_folds_both_sides() {
        let entry = LookupEntry {
            exit_survey: "Fox News".to_string(),
            airings: Some("foxnews".to_string()),
        };
        let normalized = lookup_entry(&entry);
        assert_eq!(normalized.exit_survey, "fox news");
        assert_eq!(normalized.airings.as_deref(), Some("FOXNEWS"));
        assert_eq!(lookup_entry(&normalized), normalized);
    }
}

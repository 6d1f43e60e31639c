//! Boundary to a third-party grammar engine.
//!
//! Engines normalize their output into [`EngineMatch`] once; the rest of the
//! crate never sees engine-specific shapes. Engine handles are assumed not to
//! be safe for concurrent use, so every call goes through [`GrammarGate`].

use crate::config::Config;
use crate::error::GrammarError;
use crate::{IssueKind, Severity};
use serde::Deserialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// Replacement candidates kept per match.
pub const MAX_REPLACEMENTS: usize = 5;

const SUGGESTION_CATEGORIES: &[&str] = &[
    "STYLE",
    "TYPOGRAPHY",
    "REDUNDANCY",
    "COLLOCATIONS",
    "PLAIN_ENGLISH",
];

/// One finding from an external engine. `offset` and `error_length` are
/// byte offsets into the text that was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMatch {
    pub offset: usize,
    pub error_length: usize,
    pub rule_id: String,
    pub category_id: String,
    pub message: String,
    pub replacements: Vec<String>,
}

impl EngineMatch {
    pub fn kind(&self) -> IssueKind {
        if self.rule_id.contains("MORFOLOGIK")
            || self.rule_id.contains("SPELL")
            || self.category_id == "TYPOS"
        {
            IssueKind::Spelling
        } else {
            IssueKind::Grammar
        }
    }

    pub fn severity(&self) -> Severity {
        if SUGGESTION_CATEGORIES.contains(&self.category_id.as_str()) {
            Severity::Suggestion
        } else {
            Severity::Error
        }
    }
}

pub trait GrammarEngine: Send {
    fn check(&mut self, text: &str) -> Result<Vec<EngineMatch>, GrammarError>;
}

/// Owned engine handle that admits one `check` at a time. Waiting callers
/// block on the lock rather than failing. A panic inside the engine does not
/// lock out later callers.
pub struct GrammarGate {
    engine: Mutex<Box<dyn GrammarEngine>>,
}

impl GrammarGate {
    pub fn new(engine: Box<dyn GrammarEngine>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }

    pub fn check(&self, text: &str) -> Result<Vec<EngineMatch>, GrammarError> {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        engine.check(text)
    }
}

/// Whether external grammar checking takes part in an analysis.
pub enum GrammarBackend {
    Enabled(GrammarGate),
    Disabled(String),
}

impl GrammarBackend {
    /// Connect to the engine named by the configuration. Any failure turns
    /// into `Disabled` with the reason; it never aborts startup.
    pub fn from_config(config: &Config) -> Self {
        if !config.grammar_enabled {
            return GrammarBackend::Disabled("grammar checking disabled by configuration".into());
        }
        let Some(url) = config.language_tool_url.as_deref() else {
            return GrammarBackend::Disabled("no grammar engine configured".into());
        };

        match LanguageToolClient::connect(url, &config.language) {
            Ok(client) => {
                info!(url, language = %config.language, "Grammar engine enabled");
                GrammarBackend::Enabled(GrammarGate::new(Box::new(client)))
            }
            Err(e) => {
                warn!(url, error = %e, "Grammar engine unavailable, using rule-based checks only");
                GrammarBackend::Disabled(e.to_string())
            }
        }
    }

    pub fn gate(&self) -> Option<&GrammarGate> {
        match self {
            GrammarBackend::Enabled(gate) => Some(gate),
            GrammarBackend::Disabled(_) => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, GrammarBackend::Enabled(_))
    }
}

impl fmt::Debug for GrammarBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarBackend::Enabled(_) => write!(f, "GrammarBackend::Enabled"),
            GrammarBackend::Disabled(reason) => write!(f, "GrammarBackend::Disabled({})", reason),
        }
    }
}

/// Client for a LanguageTool HTTP server (`/v2/check`).
pub struct LanguageToolClient {
    client: reqwest::blocking::Client,
    base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct LtLanguage {
    code: String,
    #[serde(rename = "longCode")]
    long_code: String,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    matches: Vec<LtMatch>,
}

#[derive(Debug, Deserialize)]
struct LtMatch {
    message: String,
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<LtReplacement>,
    rule: LtRule,
}

#[derive(Debug, Deserialize)]
struct LtReplacement {
    value: String,
}

#[derive(Debug, Deserialize)]
struct LtRule {
    id: String,
    #[serde(default)]
    category: Option<LtCategory>,
}

#[derive(Debug, Deserialize)]
struct LtCategory {
    id: String,
}

impl LanguageToolClient {
    /// Build a client and query the server's language list so an unreachable engine is
    /// reported up front as [`GrammarError::Unavailable`].
    pub fn connect(base_url: &str, language: &str) -> Result<Self, GrammarError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GrammarError::Unavailable(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let languages = client
            .get(format!("{}/v2/languages", base_url))
            .send()
            .map_err(|e| GrammarError::Unavailable(e.to_string()))?;
        if !languages.status().is_success() {
            return Err(GrammarError::Unavailable(format!(
                "{} answered HTTP {}",
                base_url,
                languages.status()
            )));
        }

        let body = languages
            .text()
            .map_err(|e| GrammarError::Unavailable(e.to_string()))?;
        if !supports_language(&body, language) {
            return Err(GrammarError::Unavailable(format!(
                "{} does not support language '{}'",
                base_url, language
            )));
        }

        Ok(Self {
            client,
            base_url,
            language: language.to_string(),
        })
    }
}

impl GrammarEngine for LanguageToolClient {
    fn check(&mut self, text: &str) -> Result<Vec<EngineMatch>, GrammarError> {
        let response = self
            .client
            .post(format!("{}/v2/check", self.base_url))
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        parse_check_response(text, &body)
    }
}

/// Whether a `/v2/languages` body lists `language`. A body that cannot be
/// read as a language list does not rule the language out.
fn supports_language(body: &str, language: &str) -> bool {
    if language == "auto" {
        return true;
    }
    match serde_json::from_str::<Vec<LtLanguage>>(body) {
        Ok(languages) => languages
            .iter()
            .any(|l| l.long_code.eq_ignore_ascii_case(language) || l.code.eq_ignore_ascii_case(language)),
        Err(_) => true,
    }
}

/// Normalize a `/v2/check` response body into engine matches.
fn parse_check_response(text: &str, body: &str) -> Result<Vec<EngineMatch>, GrammarError> {
    let parsed: CheckResponse =
        serde_json::from_str(body).map_err(|e| GrammarError::Protocol(e.to_string()))?;

    Ok(parsed
        .matches
        .into_iter()
        .map(|m| {
            // LanguageTool counts offsets in UTF-16 code units.
            let start = utf16_to_byte(text, m.offset);
            let end = utf16_to_byte(text, m.offset + m.length);
            EngineMatch {
                offset: start,
                error_length: end - start,
                rule_id: m.rule.id,
                category_id: m.rule.category.map(|c| c.id).unwrap_or_default(),
                message: m.message,
                replacements: m
                    .replacements
                    .into_iter()
                    .take(MAX_REPLACEMENTS)
                    .map(|r| r.value)
                    .collect(),
            }
        })
        .collect())
}

fn utf16_to_byte(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (byte_idx, ch) in text.char_indices() {
        if seen >= units {
            return byte_idx;
        }
        seen += ch.len_utf16();
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_match(rule_id: &str, category_id: &str) -> EngineMatch {
        EngineMatch {
            offset: 0,
            error_length: 1,
            rule_id: rule_id.into(),
            category_id: category_id.into(),
            message: "msg".into(),
            replacements: vec![],
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(engine_match("MORFOLOGIK_RULE_EN_US", "TYPOS").kind(), IssueKind::Spelling);
        assert_eq!(engine_match("HUNSPELL_RULE", "MISC").kind(), IssueKind::Spelling);
        assert_eq!(engine_match("SOME_RULE", "TYPOS").kind(), IssueKind::Spelling);
        assert_eq!(engine_match("HE_VERB_AGR", "GRAMMAR").kind(), IssueKind::Grammar);
    }

    #[test]
    fn test_severity_by_category() {
        assert_eq!(engine_match("X", "STYLE").severity(), Severity::Suggestion);
        assert_eq!(engine_match("X", "GRAMMAR").severity(), Severity::Error);
    }

    #[test]
    fn test_parse_check_response() {
        let text = "He go home";
        let body = r#"{"matches":[{"message":"Agreement","offset":3,"length":2,
            "replacements":[{"value":"goes"},{"value":"went"},{"value":"a"},{"value":"b"},
            {"value":"c"},{"value":"d"}],
            "rule":{"id":"HE_VERB_AGR","category":{"id":"GRAMMAR"}}}]}"#;

        let matches = parse_check_response(text, body).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].offset, 3);
        assert_eq!(matches[0].error_length, 2);
        assert_eq!(matches[0].replacements.len(), MAX_REPLACEMENTS);
        assert_eq!(matches[0].replacements[0], "goes");
        assert_eq!(matches[0].category_id, "GRAMMAR");
    }

    #[test]
    fn test_language_checked_against_server_list() {
        let body = r#"[{"name":"English (US)","code":"en","longCode":"en-US"},
            {"name":"German","code":"de","longCode":"de-DE"}]"#;
        assert!(supports_language(body, "en-US"));
        assert!(supports_language(body, "de"));
        assert!(supports_language(body, "auto"));
        assert!(!supports_language(body, "en_US:en"));
        assert!(!supports_language(body, "fr-FR"));
        assert!(supports_language("not a list", "fr-FR"));
    }

    #[test]
    fn test_malformed_response_is_protocol_error() {
        let err = parse_check_response("x", "<html>").unwrap_err();
        assert!(matches!(err, GrammarError::Protocol(_)));
    }

    #[test]
    fn test_utf16_offsets_mapped_to_bytes() {
        let text = "café 😀 ok";
        // "café " is 5 UTF-16 units, the emoji is 2.
        assert_eq!(utf16_to_byte(text, 5), 6);
        assert_eq!(utf16_to_byte(text, 8), 11);
        assert_eq!(utf16_to_byte(text, 100), text.len());
    }

    #[test]
    fn test_disabled_by_configuration() {
        let config = Config {
            grammar_enabled: false,
            ..Config::default()
        };
        let backend = GrammarBackend::from_config(&config);
        assert!(!backend.is_enabled());
        assert!(backend.gate().is_none());
    }

    #[test]
    fn test_no_url_means_disabled() {
        let backend = GrammarBackend::from_config(&Config::default());
        assert!(matches!(backend, GrammarBackend::Disabled(_)));
    }

    #[test]
    fn test_unreachable_server_reported_unavailable() {
        let err = LanguageToolClient::connect("http://127.0.0.1:9", "en-US").err().unwrap();
        assert!(matches!(err, GrammarError::Unavailable(_)));
    }

    struct Counting {
        calls: usize,
    }

    impl GrammarEngine for Counting {
        fn check(&mut self, _text: &str) -> Result<Vec<EngineMatch>, GrammarError> {
            self.calls += 1;
            Ok(vec![engine_match("R", &self.calls.to_string())])
        }
    }

    #[test]
    fn test_gate_serializes_calls() {
        let gate = GrammarGate::new(Box::new(Counting { calls: 0 }));
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| gate.check("text").unwrap());
            }
        });
        let last = gate.check("text").unwrap();
        assert_eq!(last[0].category_id, "9");
    }
}

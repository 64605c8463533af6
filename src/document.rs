//! Config document - the contents of the bot's `config.json`.
//!
//! The document holds:
//! - Keywords to search news for (with highlight color)
//! - Extra e-mail receivers of the digest
//! - Dedup / volume settings
//!
//! The revision token of the remote file is deliberately not part of this
//! type; it is tracked by the sync layer so it can never be serialized into
//! the file itself.

use crate::palette::{color_for_index, DEFAULT_COLOR};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback similarity threshold applied at save time when the edited value is unusable.
pub const FALLBACK_SIMILARITY_THRESHOLD: f64 = 0.4;

/// Fallback article cap applied at save time when the edited value is zero.
pub const FALLBACK_MAX_ARTICLES: u32 = 100;

/// A news search keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    /// Search term (blank entries are dropped on save)
    #[serde(default)]
    pub name: String,
    /// Highlight color, one of the palette entries
    #[serde(default = "default_color")]
    pub color: String,
    /// Whether the bot should search for this keyword
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-entry fields this tool does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyword {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            enabled: true,
            extra: Map::new(),
        }
    }
}

/// An additional digest receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    /// E-mail address (blank entries are dropped on save)
    #[serde(default)]
    pub email: String,
    /// Whether the digest is sent to this address
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Receiver {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            enabled: true,
            extra: Map::new(),
        }
    }
}

/// Bot tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Title similarity above which two articles count as duplicates (0..=1)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Upper bound of articles collected per keyword
    #[serde(default = "default_max_articles")]
    pub max_articles_per_keyword: u32,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    0.5
}

fn default_max_articles() -> u32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_articles_per_keyword: default_max_articles(),
        }
    }
}

impl Settings {
    /// Settings as they will be written: unusable values replaced by fallbacks.
    ///
    /// A threshold of exactly zero also falls back, matching the dashboard
    /// form which treats an empty or zero field as "not set".
    pub fn normalized(&self) -> Self {
        let t = self.similarity_threshold;
        let similarity_threshold = if t.is_finite() && t > 0.0 && t <= 1.0 {
            t
        } else {
            FALLBACK_SIMILARITY_THRESHOLD
        };

        let max_articles_per_keyword = match self.max_articles_per_keyword {
            0 => FALLBACK_MAX_ARTICLES,
            n => n,
        };

        Self {
            similarity_threshold,
            max_articles_per_keyword,
        }
    }
}

/// The synchronized configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub keywords: Vec<Keyword>,

    #[serde(default)]
    pub receivers: Vec<Receiver>,

    #[serde(default)]
    pub settings: Settings,

    /// Top-level fields this tool does not know about, written back as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigDocument {
    /// Document used when the repository has no config file yet.
    pub fn starter() -> Self {
        Self {
            keywords: vec![
                Keyword::new("일학습병행", "#3498db"),
                Keyword::new("직업훈련", "#e67e22"),
                Keyword::new("고용노동부", "#7f8c8d"),
                Keyword::new("한국산업인력공단", "#2c3e50"),
            ],
            receivers: Vec::new(),
            settings: Settings::default(),
            extra: Map::new(),
        }
    }

    /// Parse the JSON text of a config file.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialize with 2-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Append a keyword, picking the next palette color.
    pub fn add_keyword(&mut self, name: impl Into<String>) -> &mut Keyword {
        let color = color_for_index(self.keywords.len());
        self.keywords.push(Keyword::new(name, color));
        let last = self.keywords.len() - 1;
        &mut self.keywords[last]
    }

    pub fn remove_keyword(&mut self, index: usize) -> Option<Keyword> {
        (index < self.keywords.len()).then(|| self.keywords.remove(index))
    }

    /// Append an enabled receiver.
    pub fn add_receiver(&mut self, email: impl Into<String>) -> &mut Receiver {
        self.receivers.push(Receiver::new(email));
        let last = self.receivers.len() - 1;
        &mut self.receivers[last]
    }

    pub fn remove_receiver(&mut self, index: usize) -> Option<Receiver> {
        (index < self.receivers.len()).then(|| self.receivers.remove(index))
    }

    /// Keywords the bot will actually search for.
    pub fn enabled_keywords(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords
            .iter()
            .filter(|k| k.enabled && !k.name.trim().is_empty())
    }

    /// Receivers the digest will actually be sent to.
    pub fn enabled_receivers(&self) -> impl Iterator<Item = &Receiver> {
        self.receivers
            .iter()
            .filter(|r| r.enabled && !r.email.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_document() {
        let doc = ConfigDocument::starter();
        assert_eq!(doc.keywords.len(), 4);
        assert!(doc.keywords.iter().all(|k| k.enabled));
        assert_eq!(doc.keywords[0].name, "일학습병행");
        assert_eq!(doc.keywords[3].color, "#2c3e50");
        assert!(doc.receivers.is_empty());
        assert_eq!(doc.settings, Settings::default());
    }

    #[test]
    fn test_missing_fields_are_defaulted() {
        let doc = ConfigDocument::from_json(
            r#"{"keywords": [{"name": "AI"}], "settings": {"similarity_threshold": 0.7}}"#,
        )
        .unwrap();

        assert_eq!(doc.keywords[0].color, DEFAULT_COLOR);
        assert!(doc.keywords[0].enabled);
        assert!(doc.receivers.is_empty());
        assert_eq!(doc.settings.similarity_threshold, 0.7);
        assert_eq!(doc.settings.max_articles_per_keyword, 100);
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let text = r#"{"keywords": [], "receivers": [], "schedule": "0 7 * * *"}"#;
        let doc = ConfigDocument::from_json(text).unwrap();
        assert_eq!(doc.extra.get("schedule"), Some(&Value::from("0 7 * * *")));

        let written = doc.to_json_pretty().unwrap();
        assert!(written.contains("\"schedule\": \"0 7 * * *\""));
        assert_eq!(ConfigDocument::from_json(&written).unwrap(), doc);
    }

    #[test]
    fn test_unknown_entry_fields_round_trip() {
        let text = r##"{
  "keywords": [{"name": "AI", "color": "#9b59b6", "enabled": true, "source": "naver"}],
  "receivers": [{"email": "ops@example.com", "enabled": true, "label": "ops"}]
}"##;
        let doc = ConfigDocument::from_json(text).unwrap();
        assert_eq!(doc.keywords[0].extra.get("source"), Some(&Value::from("naver")));
        assert_eq!(doc.receivers[0].extra.get("label"), Some(&Value::from("ops")));

        let written = doc.to_json_pretty().unwrap();
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["keywords"][0]["source"], "naver");
        assert_eq!(value["receivers"][0]["label"], "ops");
        assert_eq!(ConfigDocument::from_json(&written).unwrap(), doc);
    }

    #[test]
    fn test_threshold_survives_round_trip() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut doc = ConfigDocument::starter();
        for _ in 0..20_000 {
            let threshold: f64 = rng.gen_range(f64::EPSILON..=1.0);
            doc.settings.similarity_threshold = threshold;

            let written = doc.to_json_pretty().unwrap();
            let parsed = ConfigDocument::from_json(&written).unwrap();
            assert_eq!(
                parsed.settings.similarity_threshold.to_bits(),
                threshold.to_bits(),
                "{} did not survive {}",
                threshold,
                written
            );
        }
    }

    #[test]
    fn test_pretty_output_uses_two_spaces() {
        let written = ConfigDocument::starter().to_json_pretty().unwrap();
        assert!(written.starts_with("{\n  \"keywords\": ["));
        assert!(!written.contains("_sha"));
    }

    #[test]
    fn test_add_keyword_cycles_palette() {
        let mut doc = ConfigDocument::starter();
        let added = doc.add_keyword("로봇");
        // 4 starter keywords -> palette[4]
        assert_eq!(added.color, "#e74c3c");
        assert!(added.enabled);
        assert_eq!(doc.keywords.len(), 5);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut doc = ConfigDocument::default();
        assert!(doc.remove_keyword(0).is_none());
        doc.add_receiver("a@example.com");
        assert_eq!(doc.remove_receiver(0).map(|r| r.email), Some("a@example.com".into()));
        assert!(doc.receivers.is_empty());
    }

    #[test]
    fn test_normalized_settings() {
        let unusable = Settings {
            similarity_threshold: f64::NAN,
            max_articles_per_keyword: 0,
        };
        assert_eq!(
            unusable.normalized(),
            Settings {
                similarity_threshold: FALLBACK_SIMILARITY_THRESHOLD,
                max_articles_per_keyword: FALLBACK_MAX_ARTICLES,
            }
        );

        let zero = Settings {
            similarity_threshold: 0.0,
            max_articles_per_keyword: 20,
        };
        assert_eq!(zero.normalized().similarity_threshold, 0.4);
        assert_eq!(zero.normalized().max_articles_per_keyword, 20);

        let above = Settings {
            similarity_threshold: 1.5,
            max_articles_per_keyword: 20,
        };
        assert_eq!(above.normalized().similarity_threshold, 0.4);

        let ok = Settings {
            similarity_threshold: 1.0,
            max_articles_per_keyword: 5,
        };
        assert_eq!(ok.normalized(), ok);
    }

    #[test]
    fn test_enabled_filters() {
        let mut doc = ConfigDocument::starter();
        doc.keywords[1].enabled = false;
        doc.add_keyword("  ");
        doc.add_receiver("a@example.com").enabled = false;
        doc.add_receiver("b@example.com");

        let names: Vec<_> = doc.enabled_keywords().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["일학습병행", "고용노동부", "한국산업인력공단"]);

        let emails: Vec<_> = doc.enabled_receivers().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["b@example.com"]);
    }
}

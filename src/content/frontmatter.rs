//! Front-matter parsing

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter of a local markdown/MDX document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    /// Kept as text; YAML would otherwise reject unquoted dates with times
    pub date: Option<String>,
    #[serde(alias = "summary")]
    pub excerpt: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "coverImage", alias = "image")]
    pub cover_image: Option<String>,
    /// Overrides the file-name slug
    pub slug: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub tags: Vec<String>,
    #[serde(default = "default_published")]
    pub published: bool,
    pub draft: bool,
}

fn default_published() -> bool {
    true
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            date: None,
            excerpt: None,
            description: None,
            cover_image: None,
            slug: None,
            category: None,
            tags: Vec::new(),
            published: true,
            draft: false,
        }
    }
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start();

        if !content.starts_with("---") {
            return Ok((FrontMatter::default(), content));
        }

        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            // No closing ---, treat as no front-matter
            return Ok((FrontMatter::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A leading thematic break followed by prose is not front-matter
        if !looks_like_yaml(yaml_content) {
            return Ok((FrontMatter::default(), content));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;
        Ok((fm, remaining))
    }

    /// Whether this document should be listed
    pub fn is_published(&self) -> bool {
        self.published && !self.draft
    }

    /// Parse the date string into a UTC timestamp
    pub fn parse_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// At least one `key: value` line with a plain identifier key
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");
        let after_colon = &trimmed[colon_pos + 1..];
        is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
    })
}

/// Parse a date string in the formats front-matter and the content API use
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

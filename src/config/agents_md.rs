//! `AGENTS.md` loading
//!
//! The document body becomes the system message of every session. An
//! optional YAML front matter block may declare extra functions:
//!
//! ```yaml
//! ---
//! functions:
//!   - trigger: timer
//!     schedule: "*/5 * * * *"
//!     prompt: Summarize the overnight alerts
//!     name: overnight_summary
//!     logger: true
//! ---
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value as YamlValue;

/// One entry of the front matter `functions` list
///
/// Every field is optional here; the scheduler decides which entries are
/// usable and warns about the rest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FunctionDefinition {
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logger: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    functions: Vec<YamlValue>,
}

/// Parsed `AGENTS.md`
#[derive(Debug, Clone, Default)]
pub struct AgentsDocument {
    /// Markdown body without the front matter, trimmed
    pub body: String,
    pub functions: Vec<FunctionDefinition>,
}

impl AgentsDocument {
    /// Load from disk; a missing or unreadable file yields an empty document
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No AGENTS.md found");
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| Self::parse(&raw).map(|doc| (raw.len(), doc)));

        match parsed {
            Ok((raw_len, doc)) => {
                tracing::info!(
                    path = %path.display(),
                    chars = raw_len,
                    body_chars = doc.body.len(),
                    functions = doc.functions.len(),
                    "Loaded AGENTS.md"
                );
                doc
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read AGENTS.md");
                Self::default()
            }
        }
    }

    /// Split front matter from body and decode the `functions` list
    pub fn parse(raw: &str) -> Result<Self, anyhow::Error> {
        let (yaml, body) = match split_front_matter(raw) {
            Some(parts) => parts,
            None => {
                return Ok(Self {
                    body: raw.trim().to_string(),
                    functions: Vec::new(),
                })
            }
        };

        let front: FrontMatter = if yaml.trim().is_empty() {
            FrontMatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        let functions = front
            .functions
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_yaml::from_value(entry) {
                Ok(def) => Some(def),
                Err(e) => {
                    tracing::warn!(index = i + 1, error = %e, "Skipping malformed function entry");
                    None
                }
            })
            .collect();

        Ok(Self {
            body: body.trim().to_string(),
            functions,
        })
    }
}

/// Return `(yaml, body)` when `raw` opens with a `---` delimited block
fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = raw.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    if let Some(body) = rest.strip_prefix("---") {
        return Some(("", body));
    }

    let end = rest.find("\n---")?;
    let yaml = &rest[..end];
    let after = &rest[end + 4..];
    let body = match after.find('\n') {
        Some(newline) => &after[newline + 1..],
        None => "",
    };
    Some((yaml, body))
}

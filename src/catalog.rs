use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Metadata the catalog holds about a torrent, most fields are optional on
/// the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameMetadata {
    #[serde(default)]
    pub group: GameGroup,
    #[serde(default)]
    pub torrent: GameRelease,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameGroup {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    // the API sends the year as a number on some groups and a string on others
    #[serde(default, deserialize_with = "year_as_string")]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameRelease {
    #[serde(default, rename = "gameDOXType")]
    pub game_dox_type: Option<String>,
}

fn year_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[async_trait]
pub trait CatalogHandler {
    async fn torrent_by_hash(&self, hash: &str) -> Result<GameMetadata>;
}

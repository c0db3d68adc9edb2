use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Source-assigned record identifier.
///
/// The source table may use integer or text ids; both are carried as text so keys,
/// staging names and checkpoints treat them uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(id) => Ok(RecordId(id.to_string())),
            RawId::Text(id) if !id.trim().is_empty() => Ok(RecordId(id)),
            RawId::Text(_) => Err(serde::de::Error::custom("record id must not be empty")),
        }
    }
}

/// One image reference on a source record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Object path inside the source bucket. Missing or blank means malformed.
    #[serde(default)]
    pub path: Option<String>,
}

impl AssetRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The locator, if present and non-blank.
    pub fn locator(&self) -> Option<&str> {
        self.path.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Extension of the source object, defaulting to `jpg` like the source uploader.
    pub fn extension(&self) -> &str {
        self.locator()
            .and_then(|p| p.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && !ext.contains('/'))
            .unwrap_or("jpg")
    }
}

/// Descriptive attributes copied verbatim to the destination.
///
/// Every field is kept as raw JSON whatever shape the source stores it in. The only
/// transformation is the defaulting of null `is_available`, `show_price` and `orden`
/// when the destination document is assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordAttributes {
    pub titulo: JsonValue,
    pub descripcion: JsonValue,
    pub anio: JsonValue,
    pub categoria: JsonValue,
    pub serie: JsonValue,
    pub tecnica: JsonValue,
    pub medidas: JsonValue,
    pub price: JsonValue,
    pub is_available: JsonValue,
    pub show_price: JsonValue,
    pub orden: JsonValue,
}

/// One artwork as listed by the source catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub attributes: RecordAttributes,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub imagenes: Vec<AssetRef>,
}

impl CatalogRecord {
    pub fn new(id: impl Into<RecordId>, imagenes: Vec<AssetRef>) -> Self {
        Self {
            id: id.into(),
            attributes: RecordAttributes::default(),
            imagenes,
        }
    }

    pub fn with_title(mut self, titulo: impl Into<String>) -> Self {
        self.attributes.titulo = JsonValue::String(titulo.into());
        self
    }

    /// Title for progress output.
    pub fn display_title(&self) -> Cow<'_, str> {
        match &self.attributes.titulo {
            JsonValue::String(titulo) => Cow::Borrowed(titulo.as_str()),
            JsonValue::Null => Cow::Borrowed("Sin título"),
            other => Cow::Owned(other.to_string()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<AssetRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AssetRef>>::deserialize(deserializer)?.unwrap_or_default())
}

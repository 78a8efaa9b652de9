use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Audience claim, which identity providers publish either as one string or as a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Read the `aud` claim; any shape other than a string or an array of strings yields `None`
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(aud) => Some(Audience::Single(aud.clone())),
            Value::Array(values) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Audience::Multiple),
            _ => None,
        }
    }

    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Decoded token payload
///
/// Holds every claim of the token verbatim. Only [`crate::validation::verify`] hands
/// a `Claims` to callers, after the signature and the standard claims have been checked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Issuer (`iss`), when present as a string
    pub fn iss(&self) -> Option<&str> {
        self.get_str("iss")
    }

    /// Subject (`sub`), when present as a string
    pub fn sub(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Audience (`aud`)
    pub fn aud(&self) -> Option<Audience> {
        self.get("aud").and_then(Audience::from_value)
    }

    /// Expiration time (`exp`) as a Unix timestamp; fractional seconds round up
    pub fn exp(&self) -> Option<i64> {
        match self.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.ceil() as i64)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Deserialize the claims into a caller-defined structure
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

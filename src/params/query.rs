use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Value of one query parameter.
///
/// Serialized as JSON `null`, a string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Absent,
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// Absent, `""` and `[]` carry nothing and are never kept in state
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Absent => true,
            ParamValue::Single(value) => value.is_empty(),
            ParamValue::Multi(values) => values.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Absent => Vec::new(),
            ParamValue::Single(value) => vec![value.as_str()],
            ParamValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// The value if this is a single one
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            _ => None,
        }
    }

    fn push(&mut self, value: String) {
        *self = match std::mem::replace(self, ParamValue::Absent) {
            ParamValue::Absent => ParamValue::Single(value),
            ParamValue::Single(first) => ParamValue::Multi(vec![first, value]),
            ParamValue::Multi(mut values) => {
                values.push(value);
                ParamValue::Multi(values)
            }
        };
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

impl From<Option<&str>> for ParamValue {
    fn from(value: Option<&str>) -> Self {
        value.map(ParamValue::from).unwrap_or(ParamValue::Absent)
    }
}

/// Query parameter state: names mapped to non-empty values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ParamValue>",
    into = "BTreeMap<String, ParamValue>"
)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string; a repeated key collects its values in order
    pub fn from_query(query: &str) -> Self {
        let mut params = BTreeMap::<String, ParamValue>::new();
        for (key, value) in query_pairs(query) {
            params.entry(key).or_insert(ParamValue::Absent).push(value);
        }
        params.into()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set `key`, or delete it when `value` is empty
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `self` laid over `base`: keys present here win
    pub fn overlay(&self, base: &QueryParams) -> QueryParams {
        let mut merged = base.clone();
        for (key, value) in &self.0 {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Encode as a query string, one pair per value, without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            for v in value.values() {
                serializer.append_pair(key, v);
            }
        }
        serializer.finish()
    }
}

impl From<BTreeMap<String, ParamValue>> for QueryParams {
    fn from(map: BTreeMap<String, ParamValue>) -> Self {
        Self(map.into_iter().filter(|(_, v)| !v.is_empty()).collect())
    }
}

impl From<QueryParams> for BTreeMap<String, ParamValue> {
    fn from(params: QueryParams) -> Self {
        params.0
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Decoded `(key, value)` pairs of a query string, in order
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Split `path?query#fragment` into path and query
pub fn split_location(location: &str) -> (&str, &str) {
    let location = location.split('#').next().unwrap_or(location);
    match location.split_once('?') {
        Some((path, query)) => (path, query),
        None => (location, ""),
    }
}

/// `path?query`, or just `path` when the query is empty
pub fn join_location(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

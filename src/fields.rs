//! Plaintext record content: an ordered list of named string fields.
//!
//! Only fields marked searchable feed the Bloom index; every field is
//! encrypted. The canonical byte encoding is the JSON array of fields, in
//! insertion order.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub searchable: bool,
}

impl Field {
    pub fn searchable(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            searchable: true,
        }
    }

    pub fn private(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            searchable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field that is encrypted and indexed.
    pub fn with_searchable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push(Field::searchable(name, value));
        self
    }

    /// Append a field that is encrypted but never indexed.
    pub fn with_private(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push(Field::private(name, value));
        self
    }

    pub fn push(&mut self, field: Field) {
        self.0.push(field);
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }

    /// Values that feed the Bloom index, in field order.
    pub fn searchable_values(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical plaintext bytes; zeroized when dropped.
    pub fn to_canonical_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(serde_json::to_vec(&self.0)?))
    }

    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }
}

impl From<Vec<Field>> for Fields {
    fn from(fields: Vec<Field>) -> Self {
        Self(fields)
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> Fields {
        Fields::new()
            .with_searchable("name", "John Doe")
            .with_private("dob", "1990-01-01")
            .with_searchable("diagnosis", "Hypertension")
    }

    #[test]
    fn canonical_round_trip_preserves_order() {
        let fields = patient();
        let bytes = fields.to_canonical_bytes().unwrap();
        let decoded = Fields::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(decoded, fields);
        let names: Vec<&str> = decoded.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "dob", "diagnosis"]);
    }

    #[test]
    fn canonical_encoding_is_stable() {
        let fields = Fields::new().with_searchable("name", "Jane");
        assert_eq!(
            fields.to_canonical_bytes().unwrap().as_slice(),
            br#"[{"name":"name","value":"Jane","searchable":true}]"#
        );
    }

    #[test]
    fn only_searchable_values_are_indexed() {
        let p = patient();
        let values: Vec<&str> = p.searchable_values().collect();
        assert_eq!(values, ["John Doe", "Hypertension"]);
    }

    #[test]
    fn get_returns_first_match() {
        let fields = patient();
        assert_eq!(fields.get("dob"), Some("1990-01-01"));
        assert_eq!(fields.get("missing"), None);
    }

    #[test]
    fn searchable_defaults_to_false_when_absent() {
        let decoded = Fields::from_canonical_bytes(br#"[{"name":"a","value":"b"}]"#).unwrap();
        assert_eq!(decoded, Fields::new().with_private("a", "b"));
    }

    #[test]
    fn rejects_malformed_bytes() {
        assert!(Fields::from_canonical_bytes(b"not json").is_err());
    }
}

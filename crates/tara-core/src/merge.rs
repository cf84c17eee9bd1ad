//! Profile merge: layered attributes with explicit precedence
//!
//! The working profile is built from three layers, later layers winning
//! field-for-field:
//!
//! ```text
//! request (name, email, citizenship, purpose)
//!     < stored profile (every present column)
//!         < wizard context (supplemental answers)
//! ```
//!
//! Null values never overwrite an earlier layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::data_model::{Citizenship, Profile, TravelRequest};

/// Fields that identify a person by name. Never sent to the advisory service.
pub const NAME_FIELDS: &[&str] = &["name", "display_name", "displayName"];

/// Direct identifiers stripped alongside the name fields.
pub const IDENTIFIER_FIELDS: &[&str] = &["user_id", "email", "passport_number"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileAttributes(BTreeMap<String, Value>);

impl ProfileAttributes {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlays `layer` on top of `self`; non-null values in `layer` win.
    pub fn overlay<'a, I>(&mut self, layer: I)
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        for (key, value) in layer {
            if !value.is_null() {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Copy safe to hand to the advisory service: no names, no identifiers.
    pub fn anonymized(&self) -> ProfileAttributes {
        let filtered = self
            .0
            .iter()
            .filter(|(key, _)| {
                !NAME_FIELDS.contains(&key.as_str()) && !IDENTIFIER_FIELDS.contains(&key.as_str())
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        ProfileAttributes(filtered)
    }
}

impl<'a> IntoIterator for &'a ProfileAttributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Base layer built from the inbound request and the resolved citizenship.
pub fn request_layer(request: &TravelRequest, citizenship: &Citizenship) -> ProfileAttributes {
    let mut attrs = ProfileAttributes::new();
    if let Some(name) = &request.profile.display_name {
        attrs.insert("name", name.clone());
    }
    if let Some(email) = &request.profile.email {
        attrs.insert("email", email.clone());
    }
    attrs.insert("citizenship", citizenship.name.clone());
    attrs.insert("nationality_code", citizenship.code.clone());
    attrs.insert("purpose", request.purpose.clone());
    attrs
}

/// Merges request < stored < context. Each layer is optional except the base.
pub fn merge_profile_layers(
    base: ProfileAttributes,
    stored: Option<&Profile>,
    context: Option<&BTreeMap<String, Value>>,
) -> ProfileAttributes {
    let mut merged = base;
    if let Some(profile) = stored {
        merged.overlay(&profile.attributes());
    }
    if let Some(context) = context {
        merged.overlay(context);
    }
    merged
}

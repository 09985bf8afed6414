//! Domain model types for relays.
//!
//! - [`FileDescriptor`] - Name and metadata of the file to create remotely
//! - [`RelayResult`] - What the storage provider reports back

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description of the file a relay creates at the destination.
///
/// `metadata` holds provider-specific optional fields (for Google Drive:
/// `mimeType`, `parents`, `description`, ...). The `name` is always sent and
/// takes precedence over a `name` key in `metadata`.
///
/// # Examples
///
/// ```
/// use gdrelay_core::FileDescriptor;
///
/// let dest = FileDescriptor::new("test.pdf")
///     .with_mime_type("application/pdf")
///     .with_parents(vec!["folder-id".to_string()]);
///
/// assert_eq!(dest.name(), "test.pdf");
/// assert_eq!(dest.resource()["mimeType"], "application/pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    name: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl FileDescriptor {
    /// Create a descriptor with just a file name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Map::new(),
        }
    }

    /// Set the MIME type of the created file.
    pub fn with_mime_type(self, mime_type: impl Into<String>) -> Self {
        self.with_field("mimeType", Value::String(mime_type.into()))
    }

    /// Set the parent folders of the created file.
    pub fn with_parents(self, parents: Vec<String>) -> Self {
        self.with_field("parents", Value::from(parents))
    }

    /// Set a human-readable description.
    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with_field("description", Value::String(description.into()))
    }

    /// Set an arbitrary provider-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider-specific metadata, excluding the name.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// The resource description sent to the provider: metadata plus name.
    pub fn resource(&self) -> Map<String, Value> {
        let mut resource = self.metadata.clone();
        resource.insert("name".to_string(), Value::String(self.name.clone()));
        resource
    }
}

/// Outcome of a successful relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResult {
    /// Identifier the provider assigned to the created file.
    pub remote_id: String,

    /// Everything the provider returned about the created file.
    pub provider_metadata: Map<String, Value>,
}

impl RelayResult {
    /// Build a result from a provider response object.
    ///
    /// Returns `None` if the response has no string `id` field.
    pub fn from_response(response: Map<String, Value>) -> Option<Self> {
        let remote_id = response.get("id")?.as_str()?.to_string();
        Some(Self {
            remote_id,
            provider_metadata: response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_name_wins_over_metadata() {
        let dest = FileDescriptor::new("real.pdf").with_field("name", json!("shadow.pdf"));
        assert_eq!(dest.resource()["name"], "real.pdf");
    }

    #[test]
    fn test_builder_fields() {
        let dest = FileDescriptor::new("a.txt")
            .with_mime_type("text/plain")
            .with_parents(vec!["p1".to_string(), "p2".to_string()])
            .with_description("notes");

        let resource = dest.resource();
        assert_eq!(resource["mimeType"], "text/plain");
        assert_eq!(resource["parents"], json!(["p1", "p2"]));
        assert_eq!(resource["description"], "notes");
        assert!(!dest.metadata().contains_key("name"));
    }

    #[test]
    fn test_relay_result_from_response() {
        let response = json!({"id": "abc", "name": "a.txt"})
            .as_object()
            .cloned()
            .unwrap();
        let result = RelayResult::from_response(response).unwrap();
        assert_eq!(result.remote_id, "abc");
        assert_eq!(result.provider_metadata["name"], "a.txt");
    }

    #[test]
    fn test_relay_result_requires_id() {
        let response = json!({"name": "a.txt"}).as_object().cloned().unwrap();
        assert!(RelayResult::from_response(response).is_none());

        let numeric = json!({"id": 7}).as_object().cloned().unwrap();
        assert!(RelayResult::from_response(numeric).is_none());
    }
}

//! Image extraction configuration.

use serde::Deserialize;

/// Image extraction configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Restrict data-URI image extraction to this exact topic.
    /// Empty (the default) means every PUBLISH payload is inspected.
    pub topic: String,
}

impl ImageConfig {
    /// Whether image extraction applies to a publish on `topic`.
    pub fn applies_to(&self, topic: &str) -> bool {
        self.topic.is_empty() || self.topic == topic
    }
}

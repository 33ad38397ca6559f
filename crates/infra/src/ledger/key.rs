use super::r#trait::StoreError;

const DELIMITER: char = '\u{0}';
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Store key built from an object type and ordered attributes.
///
/// Encoded as `\0<type>\0<attr1>\0<attr2>\0...`. A key built from a prefix of
/// another key's attributes is a byte prefix of it, and keys of one type sort
/// by their attributes, so a partial key drives an ordered prefix scan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn new(object_type: &str, attributes: &[&str]) -> Result<Self, StoreError> {
        if object_type.is_empty() {
            return Err(StoreError::InvalidKey("object type must not be empty".into()));
        }
        validate_component(object_type)?;

        let mut key = String::with_capacity(
            2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
        );
        key.push(DELIMITER);
        key.push_str(object_type);
        key.push(DELIMITER);
        for attr in attributes {
            validate_component(attr)?;
            key.push_str(attr);
            key.push(DELIMITER);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.replace(DELIMITER, "/"))
    }
}

fn validate_component(component: &str) -> Result<(), StoreError> {
    if component.contains(DELIMITER) || component.contains(MAX_UNICODE_RUNE) {
        return Err(StoreError::InvalidKey(format!(
            "key component {component:?} contains a reserved character"
        )));
    }
    Ok(())
}

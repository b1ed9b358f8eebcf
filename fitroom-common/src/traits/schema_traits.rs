use serde::de::DeserializeOwned;

/// A typed model response. Deserialization checks the shape; `validate` checks
/// whatever serde cannot express (ranges, list lengths, allowed labels).
pub trait ResponseSchema: DeserializeOwned + Send + 'static {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl ResponseSchema for serde_json::Value {}

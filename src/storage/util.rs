use serde::{Serialize, de::DeserializeOwned};

pub fn to_pretty_json_text<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|error| error.to_string())
}

pub fn from_json_text<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_str::<T>(value).map_err(|error| error.to_string())
}

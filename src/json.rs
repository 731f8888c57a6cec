//! JSON helpers over `serde_json`.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Any JSON value.
pub type Value = serde_json::Value;

/// A JSON object.
pub type Object = serde_json::Map<String, Value>;

/// A JSON array.
pub type Array = Vec<Value>;

#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("unexpected end of JSON input")]
    Empty,
    #[error("decode json: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("encode json: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode the first JSON value in `r`, then drop `r`.
///
/// A missing reader decodes to `T::default()`. Whatever follows the first
/// value is left unread.
pub fn decode_and_close<T, R>(r: Option<R>) -> Result<T, JsonError>
where
    T: DeserializeOwned + Default,
    R: Read,
{
    let Some(r) = r else {
        return Ok(T::default());
    };
    let mut values = serde_json::Deserializer::from_reader(r).into_iter::<T>();
    match values.next() {
        Some(value) => value.map_err(JsonError::Decode),
        None => Err(JsonError::Empty),
    }
}

/// `v` as compact JSON followed by a line feed.
pub fn encode<T: Serialize + ?Sized>(v: &T) -> Result<Vec<u8>, JsonError> {
    let mut b = serde_json::to_vec(v).map_err(JsonError::Encode)?;
    b.push(b'\n');
    Ok(b)
}

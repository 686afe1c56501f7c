//! Overlaying server responses onto local records.
//!
//! GNS3 answers most calls with a full or partial JSON object. Local state is
//! updated key by key so fields the server did not echo keep their value.

use crate::Result;
use gns3_core::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Overlay the keys of `response` onto `current` and decode the result.
///
/// # Errors
///
/// Returns [`Error::ParseError`] if `response` is not a JSON object or if a
/// value cannot be decoded into the record's field type.
pub fn merge_into<T>(current: &T, response: Value) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(changes) = response else {
        return Err(Error::ParseError(format!(
            "Expected a JSON object from the server, got `{response}`"
        )));
    };

    let mut merged = serde_json::to_value(current)?;
    let Value::Object(fields) = &mut merged else {
        return Err(Error::ParseError(
            "Local record did not serialize to a JSON object".to_string(),
        ));
    };

    debug!(keys = changes.len(), "Merging server response into local record");
    fields.extend(changes);

    Ok(serde_json::from_value(merged)?)
}

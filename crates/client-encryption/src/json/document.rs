//! Lookup and in-place rewriting of a JSON document along a [`JsonPath`].

use serde_json::{Map, Value};

use common::{EncryptionError, Result};

use super::path::JsonPath;

/// Return the element at `path`, or `None` as soon as a segment is missing
/// or the current container is not an object.
pub fn find<'a>(document: &'a Value, path: &JsonPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(document, |current, key| current.as_object()?.get(key))
}

/// Mutable counterpart of [`find`].
pub fn find_mut<'a>(document: &'a mut Value, path: &JsonPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(document, |current, key| current.as_object_mut()?.get_mut(key))
}

/// Remove the element at `path`, returning it. A missing parent is a no-op.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] when asked to delete the root;
/// callers replace the whole document instead.
pub fn delete(document: &mut Value, path: &JsonPath) -> Result<Option<Value>> {
    let key = path.element_key()?;
    let parent = path.parent()?;
    Ok(find_mut(document, &parent)
        .and_then(Value::as_object_mut)
        .and_then(|object| object.shift_remove(key)))
}

/// Return the object at `path`, `None` if nothing is there.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] if the element is not an object.
pub fn read_json_object_mut<'a>(
    document: &'a mut Value,
    path: &JsonPath,
) -> Result<Option<&'a mut Map<String, Value>>> {
    match find_mut(document, path) {
        None => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(_) => Err(object_expected(path)),
    }
}

/// Return the object at `path`, creating an empty one under an existing
/// parent if needed. Only one level is ever created.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] if a non-object already sits
/// at `path`, or if the parent of `path` does not exist or is not an object.
pub fn check_or_create_out_object<'a>(
    document: &'a mut Value,
    path: &JsonPath,
) -> Result<&'a mut Map<String, Value>> {
    let exists = match find(document, path) {
        Some(Value::Object(_)) => true,
        Some(_) => return Err(object_expected(path)),
        None => false,
    };
    if exists {
        return find_mut(document, path)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| object_expected(path));
    }

    let parent_path = path.parent()?;
    let key = path.element_key()?.to_owned();
    let parent = read_json_object_mut(document, &parent_path)?.ok_or_else(|| {
        EncryptionError::invalid_argument(format!(
            "Parent path not found in payload: '{}'!",
            parent_path.normalized()
        ))
    })?;
    let created = parent
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    created.as_object_mut().ok_or_else(|| object_expected(path))
}

/// Remove `key` from `object` and return its value. An absent or empty key
/// name reads nothing.
pub fn read_and_delete_key(object: &mut Map<String, Value>, key: Option<&str>) -> Option<Value> {
    match key {
        Some(key) if !key.is_empty() => object.shift_remove(key),
        _ => None,
    }
}

/// Place a decrypted value at `path`.
///
/// The text is parsed as JSON, falling back to a plain string; a bare `null`
/// is kept as the string `"null"`. Objects are
/// merged into the destination object, overwriting same-named keys; arrays and
/// primitives overwrite the destination key. An array decrypted to the root
/// replaces the whole document.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] if the destination cannot be
/// created, or if a non-array primitive is targeted at the root.
pub fn add_decrypted_data_to_payload(
    document: &mut Value,
    path: &JsonPath,
    decrypted: &str,
) -> Result<()> {
    check_or_create_out_object(document, path)?;

    let value = match serde_json::from_str::<Value>(decrypted) {
        Ok(Value::Null) | Err(_) => Value::String(decrypted.to_owned()),
        Ok(value) => value,
    };

    match value {
        Value::Array(_) if path.is_root() => {
            *document = value;
        }
        Value::Object(decrypted_object) => {
            let out = check_or_create_out_object(document, path)?;
            out.extend(decrypted_object);
        }
        other => {
            let parent_path = path.parent()?;
            let key = path.element_key()?.to_owned();
            let parent = read_json_object_mut(document, &parent_path)?.ok_or_else(|| {
                EncryptionError::invalid_argument(format!(
                    "Parent path not found in payload: '{}'!",
                    parent_path.normalized()
                ))
            })?;
            parent.insert(key, other);
        }
    }
    Ok(())
}

/// `true` when the element at `path` is an object with no keys left.
pub fn is_empty_object(document: &Value, path: &JsonPath) -> bool {
    matches!(find(document, path), Some(Value::Object(object)) if object.is_empty())
}

/// Serialise an element to the text that gets encrypted. Strings are taken
/// verbatim, everything else as compact JSON.
pub fn to_json_string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string(other).map_err(|e| {
            EncryptionError::invalid_argument(format!("Can't get a JSON string from the element: {e}"))
        }),
    }
}

/// Strip line breaks and tabs.
pub fn sanitize(json: &str) -> String {
    json.chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Parse a JSON payload.
///
/// # Errors
///
/// Returns [`EncryptionError::InvalidArgument`] if `payload` is not valid JSON.
pub fn parse_payload(payload: &str) -> Result<Value> {
    serde_json::from_str(payload)
        .map_err(|e| EncryptionError::invalid_argument(format!("Payload is not valid JSON: {e}")))
}

/// Compact serialisation of a document.
pub fn serialize_payload(document: &Value) -> Result<String> {
    serde_json::to_string(document)
        .map_err(|e| EncryptionError::failure_with("Failed to serialize the payload!", e))
}

fn object_expected(path: &JsonPath) -> EncryptionError {
    EncryptionError::invalid_argument(format!("JSON object expected at path: '{}'!", path.raw()))
}

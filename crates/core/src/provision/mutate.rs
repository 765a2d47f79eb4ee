//! In-place edits of JSON representations fetched from GeoServer.
//!
//! GeoServer replaces the whole resource on PUT, so these functions touch
//! only their target field and leave everything else as fetched.

use serde_json::{Map, Value};

use super::step::Mutation;

/// Apply `mutation` to `doc`.
pub fn apply(mutation: Mutation, doc: &mut Value) -> Result<(), String> {
    match mutation {
        Mutation::EnableFeatureType => enable_feature_type(doc),
        Mutation::SetNumDecimals(n) => set_num_decimals(doc, n),
    }
}

/// Set `featureType.enabled` to true.
pub fn enable_feature_type(doc: &mut Value) -> Result<(), String> {
    let feature_type = doc
        .get_mut("featureType")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| "missing 'featureType' object".to_string())?;
    feature_type.insert("enabled".to_string(), Value::Bool(true));
    Ok(())
}

/// Set `global.numDecimals`, creating `global` when absent.
pub fn set_num_decimals(doc: &mut Value, num_decimals: u32) -> Result<(), String> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| "settings representation is not a JSON object".to_string())?;

    let global = root
        .entry("global")
        .or_insert_with(|| Value::Object(Map::new()));
    if global.is_null() {
        *global = Value::Object(Map::new());
    }
    let global = global
        .as_object_mut()
        .ok_or_else(|| "'global' is not a JSON object".to_string())?;

    global.insert("numDecimals".to_string(), Value::from(num_decimals));
    Ok(())
}

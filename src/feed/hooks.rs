use serde_json::Value;

use crate::feed::extract::Error;
use crate::feed::mapper::text_of;
use crate::feed::options::FieldHook;
use crate::feed::types::CanonicalFields;

/// Runs a caller hook against a dialect-native node and merges its result.
///
/// Keys naming a canonical attribute overwrite it (the value is reduced to
/// text); reserved keys are dropped with a warning; every other key lands
/// in `extra`. A hook error aborts the extraction and reaches the caller
/// unmodified.
pub(crate) fn apply<T: CanonicalFields>(
    target: &mut T,
    hook: Option<&FieldHook>,
    node: &Value,
) -> Result<(), Error> {
    let Some(hook) = hook else {
        return Ok(());
    };

    let fields = hook(node).map_err(Error::Hook)?;
    for (key, value) in fields {
        if T::RESERVED.contains(&key.as_str()) {
            tracing::warn!(key = %key, "Hook returned a reserved key, ignoring it");
            continue;
        }
        match target.field_mut(&key) {
            Some(slot) => *slot = text_of(&value),
            None => {
                target.extra_mut().insert(key, value);
            }
        }
    }
    Ok(())
}

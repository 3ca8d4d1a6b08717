//! `${VAR}` expansion for configuration strings.
//!
//! `${VAR}` fails when VAR is unset, `${VAR:-default}` falls back to the
//! default. Only braced references are expanded: a bare `$VAR` is copied
//! as is, even next to a braced one.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// `field` is the dotted config path reported in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let end = start + len + 1;
        expanded.push_str(&rest[..start]);
        expanded.push_str(&expand_reference(&rest[start..end], field)?);
        rest = &rest[end..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Expand one `${...}` reference.
fn expand_reference(reference: &str, field: &str) -> Result<String, ConfigError> {
    let expanded = shellexpand::env_with_context(reference, |var| match std::env::var(var) {
        Ok(val) => Ok(Some(val)),
        Err(_) => Err(UnsetVar(var.to_owned())),
    })
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })?;

    Ok(expanded.into_owned())
}

/// Lookup failure carrying the variable name.
struct UnsetVar(String);

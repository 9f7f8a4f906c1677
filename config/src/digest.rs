//! Expansion of environment variables used as path components,
//! e.g. "$CMSSW_BASE/src/files.txt" or "${HOME}/lists/run.txt".

use serde_json::Value;

use crate::Error;

const SEP: char = '/';

/// Replace every path component of the form `$NAME` or `${NAME}` by the
/// value of the named environment variable, looked up with `env`.
///
/// All other components, empty ones included, are kept as written, so
/// e.g. "root://host//store/$USER/f.root" only has `$USER` replaced.
pub fn digest_path<F>(path: &str, env: &F) -> Result<String, Error>
where
    F: Fn(&str) -> Option<String>,
{
    if !path.split(SEP).any(|part| env_var_name(part).is_some()) {
        return Ok(path.to_owned());
    }

    let mut digested = String::with_capacity(path.len() * 2);
    for (i, part) in path.split(SEP).enumerate() {
        if i > 0 {
            digested.push(SEP);
        }
        match env_var_name(part) {
            Some(var) => {
                let val =
                    env(var).ok_or_else(|| Error::MissingEnvVar(var.to_owned(), path.to_owned()))?;
                digested.push_str(&val);
            }
            None => digested.push_str(part),
        }
    }
    Ok(digested)
}

/// The variable name in `$NAME` or `${NAME}`, if `part` is exactly that
/// and NAME is a shell identifier.
fn env_var_name(part: &str) -> Option<&str> {
    let name = part.strip_prefix('$')?;
    let name = match name.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => name,
    };
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}

/// Digest every string leaf of `value` in place.
pub fn digest_value<F>(value: &mut Value, env: &F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => *s = digest_path(s, env)?,
        Value::Array(items) => {
            for item in items {
                digest_value(item, env)?;
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                digest_value(item, env)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

//! Environment variable resolution across bundler naming conventions.
//!
//! Deployments of the web front end expose the same settings under different
//! prefixes (`VITE_`, `REACT_APP_`, `NEXT_PUBLIC_`). The resolver accepts any of
//! them so one `.env` file works for every target.

/// Prefixes tried after the bare key, in order.
pub const ENV_PREFIXES: [&str; 3] = ["VITE_", "REACT_APP_", "NEXT_PUBLIC_"];

/// Looks up `key` in the process environment.
///
/// Returns an empty string when neither the bare key nor any prefixed variant
/// is set to a non-empty value.
#[must_use]
pub fn get_env_var(key: &str) -> String {
    resolve_with(key, |name| std::env::var(name).ok())
}

/// Resolves `key` against an arbitrary lookup function.
///
/// The bare key wins over prefixed ones; empty values are treated as unset.
pub fn resolve_with<F>(key: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    std::iter::once(key.to_string())
        .chain(ENV_PREFIXES.iter().map(|prefix| format!("{prefix}{key}")))
        .find_map(|name| lookup(&name).filter(|value| !value.is_empty()))
        .unwrap_or_default()
}

//! Shared helpers used by validation, kubelet flag derivation and the script compiler

pub mod version;

pub use version::SemanticVersion;

/// Render `k=v` pairs in key order joined by `delimiter`
pub fn sorted_key_value_pairs<K, V, I>(pairs: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: std::fmt::Display,
{
    let mut rendered: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.to_string()))
        .collect();
    rendered.sort_by(|a, b| a.0.cmp(&b.0));

    rendered
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Strip CR and LF so a value fits in one environment variable line
pub fn remove_newlines(value: &str) -> String {
    value.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

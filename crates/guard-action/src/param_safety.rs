//! Parameter-key-aware safety checks: shell metacharacters in
//! command-shaped parameters, SQL injection signatures in query-shaped
//! parameters.

const SHELL_KEYS: &[&str] = &["command", "cmd", "shell"];
const SQL_KEYS: &[&str] = &["query", "sql"];
const SHELL_METACHARS: &[char] = &[';', '|', '&', '`', '$', '(', '<', '>'];

fn contains_shell_metachar(value: &str) -> bool {
    value.contains(SHELL_METACHARS)
}

fn contains_sql_injection(value: &str) -> bool {
    let upper = value.to_uppercase();
    upper.contains("UNION") && upper.contains("SELECT")
        || upper.contains(";DROP")
        || upper.contains("; DROP")
        || value.contains("--") && (upper.contains("OR ") || upper.contains("OR'") || upper.contains("OR\""))
}

/// Walk `params` looking for a key/value pair unsafe for its key's shape.
/// Returns the offending key and a human-readable reason.
pub fn find_unsafe_param(params: &serde_json::Value) -> Option<(String, &'static str)> {
    walk(params, None)
}

fn walk(value: &serde_json::Value, key: Option<&str>) -> Option<(String, &'static str)> {
    match value {
        serde_json::Value::String(s) => {
            if let Some(k) = key {
                let lower = k.to_lowercase();
                if SHELL_KEYS.contains(&lower.as_str()) && contains_shell_metachar(s) {
                    return Some((k.to_string(), "shell metacharacter in command-shaped parameter"));
                }
                if SQL_KEYS.contains(&lower.as_str()) && contains_sql_injection(s) {
                    return Some((k.to_string(), "SQL injection signature in query-shaped parameter"));
                }
            }
            None
        }
        serde_json::Value::Array(items) => items.iter().find_map(|v| walk(v, key)),
        serde_json::Value::Object(map) => {
            map.iter().find_map(|(k, v)| walk(v, Some(k)))
        }
        _ => None,
    }
}

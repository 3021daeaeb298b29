//! Shared helper functions for CLI commands.

use std::collections::BTreeMap;

/// Truncate a string to at most `max_chars` characters, adding "..." when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Parse repeated `key=value` arguments.
pub fn parse_params(params: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    params
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| anyhow::anyhow!("Expected key=value, got '{}'", raw))
        })
        .collect()
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030"
pub fn parse_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }
    if let Some((host, port)) = bind.rsplit_once(':') {
        if port.parse::<u16>().is_ok() {
            return format!("{}:{}", host, port);
        }
    }
    format!("{}:3030", bind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name", 10), "a much ...");
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["q=rust async".into(), "lang = en".into()]).unwrap();
        assert_eq!(params.get("q").map(String::as_str), Some("rust async"));
        assert_eq!(params.get("lang").map(String::as_str), Some("en"));
        assert!(parse_params(&["novalue".into()]).is_err());
        assert!(parse_params(&["=x".into()]).is_err());
    }

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(parse_bind_address("8080"), "127.0.0.1:8080");
        assert_eq!(parse_bind_address("0.0.0.0"), "0.0.0.0:3030");
        assert_eq!(parse_bind_address("0.0.0.0:9000"), "0.0.0.0:9000");
    }
}

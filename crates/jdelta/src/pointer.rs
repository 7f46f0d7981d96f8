//! RFC 6901 JSON pointer building, used for error locations and the JSON
//! Patch formatter.

/// Escape one reference token (`~` as `~0`, `/` as `~1`).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Append a token to a pointer.
pub fn child(path: &str, token: &str) -> String {
    format!("{path}/{}", escape_token(token))
}

/// Append an array index to a pointer.
pub fn index(path: &str, index: usize) -> String {
    format!("{path}/{index}")
}

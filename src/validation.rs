//! Shared constants and custom `garde` validators reused across every
//! request-body schema in `routes::*`. Declaring them once here, instead
//! of per-route, is what keeps validators and the served OpenAPI document
//! from drifting.

/// Default max length for URL/path-bearing string fields.
pub const MAX_URL_LEN: usize = 500;

/// Max length for chapter HTML bodies.
pub const MAX_CHAPTER_HTML_LEN: usize = 2 * 1024 * 1024;

/// Custom `garde` validator for URL-bearing fields: rejects
/// `javascript:`, `vbscript:`, and `data:` URLs except `data:font/*`.
pub fn safe_url(value: &str, _ctx: &()) -> garde::Result {
    let lower = value.trim().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("vbscript:") {
        return Err(garde::Error::new("javascript:/vbscript: URLs are not allowed"));
    }
    if lower.starts_with("data:") && !lower.starts_with("data:font/") {
        return Err(garde::Error::new("only data:font/* URLs are allowed"));
    }
    Ok(())
}

/// Same check for `Option<String>` fields, a shape `garde`'s
/// `#[garde(custom(...))]` doesn't auto-unwrap.
pub fn safe_url_opt(value: &Option<String>, ctx: &()) -> garde::Result {
    match value {
        Some(url) => safe_url(url, ctx),
        None => Ok(()),
    }
}

/// Length + scheme check for the common "absent vs explicit null vs
/// explicit value" PATCH field shape (`Option<Option<String>>`), where
/// garde's built-in `length`/`custom` validators can't be combined
/// because the inner type (`Option<String>`) isn't itself length-bearing.
pub fn safe_url_double_opt(value: &Option<String>, ctx: &()) -> garde::Result {
    if let Some(url) = value
        && url.len() > MAX_URL_LEN
    {
        return Err(garde::Error::new("longer than the maximum allowed length"));
    }
    safe_url_opt(value, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_javascript_scheme() {
        assert!(safe_url("javascript:alert(1)", &()).is_err());
    }

    #[test]
    fn rejects_data_non_font() {
        assert!(safe_url("data:text/html,<script>", &()).is_err());
    }

    #[test]
    fn allows_data_font() {
        assert!(safe_url("data:font/woff2;base64,AAAA", &()).is_ok());
    }

    #[test]
    fn allows_plain_https() {
        assert!(safe_url("https://example.com/font.woff2", &()).is_ok());
    }
}

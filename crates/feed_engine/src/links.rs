use url::Url;

/// Turns a raw `href` into an absolute http(s) URL.
///
/// Protocol-relative values gain `https:`, absolute ones are kept, and
/// relative paths are joined onto `base`. Anchors, scripts and values that
/// cannot be resolved yield `None`.
pub fn normalize_link(raw: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Url::parse(&format!("https://{rest}")).ok().map(String::from);
    }
    if let Ok(url) = Url::parse(trimmed) {
        return matches!(url.scheme(), "http" | "https").then(|| url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(String::from)
}

//! User identity resolution for public records.

/// Label used when no identity was supplied at all.
pub const GUEST_USER: &str = "guest";

/// Prefix for identities derived from an external user id.
pub const EXTERNAL_USER_PREFIX: &str = "ext:";

/// Resolve the display user for a record.
///
/// Precedence: an explicit name wins, then an external id (prefixed so it
/// can never collide with a chosen name), then the guest label.
pub fn effective_user(name: Option<&str>, external_id: Option<&str>) -> String {
    if let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) {
        return name.to_string();
    }
    if let Some(id) = external_id.map(str::trim).filter(|s| !s.is_empty()) {
        return format!("{EXTERNAL_USER_PREFIX}{id}");
    }
    GUEST_USER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_name_wins() {
        assert_eq!(effective_user(Some("Anna"), Some("tg-42")), "Anna");
        assert_eq!(effective_user(Some("  Anna  "), None), "Anna");
    }

    #[test]
    fn test_external_id_prefixed() {
        assert_eq!(effective_user(None, Some("tg-42")), "ext:tg-42");
        assert_eq!(effective_user(Some("   "), Some("tg-42")), "ext:tg-42");
    }

    #[test]
    fn test_guest_fallback() {
        assert_eq!(effective_user(None, None), "guest");
        assert_eq!(effective_user(Some(""), Some("  ")), "guest");
    }
}

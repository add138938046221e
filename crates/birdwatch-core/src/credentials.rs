use std::fmt;

/// API keys supplied by the user for the current session.
///
/// Neither key is validated; the remote services reject bad keys on use.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub model_api_key: Option<String>,
    pub search_api_key: Option<String>,
}

/// Which keys a call to [`Credentials::apply`] actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub model_key: bool,
    pub search_key: bool,
}

impl CredentialUpdate {
    pub fn any(&self) -> bool {
        self.model_key || self.search_key
    }
}

impl Credentials {
    pub fn new(model_api_key: impl Into<String>, search_api_key: impl Into<String>) -> Self {
        let mut creds = Self::default();
        creds.apply(Some(&model_api_key.into()), Some(&search_api_key.into()));
        creds
    }

    /// Store each key that is present and non-blank. Blank fields leave the
    /// previously stored key untouched.
    pub fn apply(&mut self, model_key: Option<&str>, search_key: Option<&str>) -> CredentialUpdate {
        let mut update = CredentialUpdate::default();
        if let Some(key) = non_blank(model_key) {
            self.model_api_key = Some(key);
            update.model_key = true;
        }
        if let Some(key) = non_blank(search_key) {
            self.search_api_key = Some(key);
            update.search_key = true;
        }
        update
    }

    pub fn model_key(&self) -> Option<&str> {
        self.model_api_key.as_deref()
    }

    pub fn search_key(&self) -> Option<&str> {
        self.search_api_key.as_deref()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// Keys must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &self.model_api_key.as_ref().map(|_| "<redacted>"))
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_stores_non_empty_keys() {
        let mut creds = Credentials::default();
        let update = creds.apply(Some("sk-model"), Some("serp-key"));
        assert!(update.model_key);
        assert!(update.search_key);
        assert_eq!(creds.model_key(), Some("sk-model"));
        assert_eq!(creds.search_key(), Some("serp-key"));
    }

    #[test]
    fn blank_values_keep_previous_keys() {
        let mut creds = Credentials::new("sk-model", "serp-key");
        let update = creds.apply(Some("   "), None);
        assert!(!update.any());
        assert_eq!(creds.model_key(), Some("sk-model"));
        assert_eq!(creds.search_key(), Some("serp-key"));
    }

    #[test]
    fn apply_trims_whitespace() {
        let mut creds = Credentials::default();
        creds.apply(Some("  sk-model \n"), None);
        assert_eq!(creds.model_key(), Some("sk-model"));
        assert_eq!(creds.search_key(), None);
    }

    #[test]
    fn only_updated_key_is_reported() {
        let mut creds = Credentials::default();
        let update = creds.apply(None, Some("serp-key"));
        assert!(!update.model_key);
        assert!(update.search_key);
    }

    #[test]
    fn debug_redacts_keys() {
        let creds = Credentials::new("sk-secret", "serp-secret");
        let out = format!("{creds:?}");
        assert!(!out.contains("sk-secret"));
        assert!(!out.contains("serp-secret"));
        assert!(out.contains("<redacted>"));
    }
}

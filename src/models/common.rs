use std::fmt;

/// Bearer API key for the provider.
///
/// Owned by the caller and passed on every call; the client never stores it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Credential(key.into())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0.trim())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(***)")
        }
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Credential::new(key)
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Credential(key)
    }
}

/// Returns the trimmed value when it carries any non-whitespace text.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

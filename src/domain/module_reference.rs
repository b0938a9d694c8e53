//! Validated root URL of a training module

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::infrastructure::config::learn_site;
use crate::infrastructure::reader_error::{ReaderError, ReaderResult};

/// Which URLs are accepted as module roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleUrlPolicy {
    /// Hosts serving training content
    pub allowed_hosts: Vec<String>,
    /// At least one of these must appear in the URL path
    pub path_markers: Vec<String>,
}

impl Default for ModuleUrlPolicy {
    fn default() -> Self {
        Self {
            allowed_hosts: learn_site::HOSTS.iter().map(|s| (*s).to_string()).collect(),
            path_markers: learn_site::MODULE_PATH_MARKERS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Root URL of a module, normalized to end with `/` so that unit links such
/// as `2-explore` resolve inside the module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleReference {
    root: Url,
}

impl ModuleReference {
    /// Validate against the default policy
    pub fn parse(raw: &str) -> ReaderResult<Self> {
        Self::parse_with_policy(raw, &ModuleUrlPolicy::default())
    }

    pub fn parse_with_policy(raw: &str, policy: &ModuleUrlPolicy) -> ReaderResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReaderError::invalid_module_url(raw, "URL is empty"));
        }

        let mut root = Url::parse(trimmed).map_err(|e| ReaderError::invalid_module_url(trimmed, e.to_string()))?;

        if !matches!(root.scheme(), "http" | "https") {
            return Err(ReaderError::invalid_module_url(
                trimmed,
                format!("unsupported scheme '{}'", root.scheme()),
            ));
        }

        let host = root.host_str().unwrap_or_default().to_ascii_lowercase();
        if !policy.allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)) {
            return Err(ReaderError::invalid_module_url(
                trimmed,
                format!("host '{host}' is not a training content host"),
            ));
        }

        let path = root.path().to_ascii_lowercase();
        if !policy
            .path_markers
            .iter()
            .any(|marker| path.contains(&marker.to_ascii_lowercase()))
        {
            return Err(ReaderError::invalid_module_url(trimmed, "path does not look like a module index"));
        }

        root.set_fragment(None);
        if !root.path().ends_with('/') {
            let with_slash = format!("{}/", root.path());
            root.set_path(&with_slash);
        }

        Ok(Self { root })
    }

    pub const fn url(&self) -> &Url {
        &self.root
    }

    pub fn as_str(&self) -> &str {
        self.root.as_str()
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root.as_str())
    }
}

impl AsRef<str> for ModuleReference {
    fn as_ref(&self) -> &str {
        self.root.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_module_url_is_accepted() {
        let reference = ModuleReference::parse(learn_site::DEFAULT_MODULE_URL).unwrap();
        assert_eq!(reference.as_str(), learn_site::DEFAULT_MODULE_URL);
    }

    #[test]
    fn test_root_is_normalized_with_trailing_slash() {
        let reference =
            ModuleReference::parse("https://learn.microsoft.com/en-us/training/modules/intro-to-rust#units").unwrap();
        assert_eq!(
            reference.as_str(),
            "https://learn.microsoft.com/en-us/training/modules/intro-to-rust/"
        );
        assert_eq!(
            reference.url().join("2-explore").unwrap().as_str(),
            "https://learn.microsoft.com/en-us/training/modules/intro-to-rust/2-explore"
        );
    }

    #[rstest]
    #[case("")]
    #[case("not a url")]
    #[case("ftp://learn.microsoft.com/en-us/training/modules/x/")]
    #[case("https://example.com/en-us/training/modules/x/")]
    #[case("https://learn.microsoft.com/en-us/dotnet/api/")]
    fn test_rejected_urls(#[case] raw: &str) {
        assert!(matches!(
            ModuleReference::parse(raw),
            Err(ReaderError::InvalidModuleUrl { .. })
        ));
    }

    #[test]
    fn test_custom_policy() {
        let policy = ModuleUrlPolicy {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            path_markers: vec!["/mod/".to_string()],
        };
        let reference = ModuleReference::parse_with_policy("http://127.0.0.1:8080/mod/", &policy).unwrap();
        assert_eq!(reference.url().port(), Some(8080));
    }
}

//! Repository reference parsed from a user-supplied URL.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// An `(owner, name)` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `https://<host>/<owner>/<repo>`, rejecting anything else.
    pub fn parse(url: &str) -> Result<Self> {
        parse_repo_url(url)
            .map(|(owner, name)| Self { owner, name })
            .ok_or_else(|| AppError::InvalidRepoUrl(url.to_string()))
    }

    /// Contents API URL for the repository root.
    pub fn contents_url(&self, api_base: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/",
            api_base.trim_end_matches('/'),
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.name)
        )
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Split a repository URL into `(owner, repo)`.
///
/// The URL must be absolute with a host. Only the path is considered; it must
/// hold exactly two non-empty segments (a trailing slash is tolerated).
pub fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str()?;

    let mut segments: Vec<&str> = parsed.path_segments()?.collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    match segments.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Some(((*owner).to_string(), (*repo).to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repo() {
        let repo = RepoRef::parse("https://github.com/acme/widgets").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn tolerates_trailing_slash_query_and_fragment() {
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets/"),
            Some(("acme".to_string(), "widgets".to_string()))
        );
        assert_eq!(
            parse_repo_url("https://github.com/acme/widgets?tab=readme#top"),
            Some(("acme".to_string(), "widgets".to_string()))
        );
    }

    #[test]
    fn rejects_wrong_segment_counts() {
        assert_eq!(parse_repo_url("https://github.com/acme"), None);
        assert_eq!(parse_repo_url("https://github.com/"), None);
        assert_eq!(parse_repo_url("https://github.com"), None);
        assert_eq!(parse_repo_url("https://github.com/acme/widgets/tree/main"), None);
        assert_eq!(parse_repo_url("https://github.com/acme//widgets"), None);
    }

    #[test]
    fn path_inside_query_or_fragment_is_ignored() {
        assert_eq!(parse_repo_url("https://github.com?tab=/acme/widgets"), None);
        assert_eq!(parse_repo_url("https://github.com#/acme/widgets"), None);
    }

    #[test]
    fn requires_absolute_url_with_host() {
        assert_eq!(parse_repo_url("github.com/acme/widgets"), None);
        assert_eq!(parse_repo_url("/acme/widgets"), None);
        assert_eq!(parse_repo_url("file:///acme/widgets"), None);
    }

    #[test]
    fn invalid_url_is_a_typed_error() {
        let err = RepoRef::parse("https://github.com/acme").unwrap_err();
        assert!(matches!(err, AppError::InvalidRepoUrl(_)));
    }

    #[test]
    fn contents_url_uses_api_base() {
        let repo = RepoRef::new("acme", "widgets");
        assert_eq!(
            repo.contents_url("https://api.github.com/"),
            "https://api.github.com/repos/acme/widgets/contents/"
        );
    }
}

use std::fmt;

use common::error::AppError;
use url::Url;

/// Owner/name pair on the configured source host. Its canonical URL is the unique storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoIdentity {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl RepoIdentity {
    /// Accepts `[scheme://][www.]<host>/<owner>/<repo>[.git][/anything][?query][#fragment]`.
    pub fn parse(input: &str, expected_host: &str) -> Result<Self, AppError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty repository URL"));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&with_scheme).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("unsupported scheme"));
        }

        let expected_host = expected_host.trim().to_ascii_lowercase();
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
            .ok_or_else(|| invalid("missing host"))?;
        if host != expected_host {
            return Err(invalid(&format!("expected a {expected_host} repository")));
        }

        let mut segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty());
        let owner = segments.next().ok_or_else(|| invalid("missing owner"))?;
        let name = segments.next().ok_or_else(|| invalid("missing repository name"))?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        if !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(invalid("owner and repository may only contain letters, digits, '.', '-' and '_'"));
        }

        Ok(Self {
            host: expected_host,
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn canonical_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.name)
    }

    /// `owner/name`, as used in activity details and API paths.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_url())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn invalid(reason: &str) -> AppError {
    AppError::Validation(format!("Invalid repository URL: {reason}"))
}

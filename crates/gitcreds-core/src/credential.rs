//! The credential value provisioned into git

use gitcreds_config::DeclaredCredential;

/// A username/password credential for one git remote
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Credential {
    /// Scheme, e.g. "https"
    pub protocol: String,
    /// Authority, e.g. "github.com"
    pub host: String,
    /// Repository path segment; empty means "/"
    pub path: String,
    pub username: String,
    pub password: String,
    /// Fully formed URL overriding protocol, host and path
    pub url: String,
}

impl Credential {
    /// True when both username and password are set
    pub fn is_eligible(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Base URL used as the git configuration key for this credential.
    ///
    /// The explicit `url` is used verbatim. Otherwise `protocol://host` plus
    /// `path`, or `/` when no path is set.
    pub fn effective_url(&self) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }

        let path = if self.path.is_empty() {
            "/".to_string()
        } else if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}://{}{}", self.protocol, self.host, path)
    }

    /// SSH shorthand prefix rewritten to the effective URL
    pub fn ssh_shorthand(&self) -> String {
        format!("git@{}:", self.host)
    }

    /// Name of the first field git's credential protocol cannot carry.
    ///
    /// Values are sent as `key=value` lines, so a newline or NUL inside a
    /// value would split it into extra attributes.
    pub fn unsafe_field(&self) -> Option<&'static str> {
        [
            ("protocol", &self.protocol),
            ("host", &self.host),
            ("path", &self.path),
            ("username", &self.username),
            ("password", &self.password),
            ("url", &self.url),
        ]
        .into_iter()
        .find(|(_, value)| value.contains(['\n', '\0']))
        .map(|(field, _)| field)
    }

    /// Input for `git credential approve`: newline-terminated `key=value` lines
    pub fn approve_input(&self) -> String {
        let mut input = format!(
            "protocol={}\nhost={}\npath={}\nusername={}\npassword={}\n",
            self.protocol, self.host, self.path, self.username, self.password
        );
        if !self.url.is_empty() {
            input.push_str(&format!("url={}\n", self.url));
        }
        input
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

impl From<DeclaredCredential> for Credential {
    fn from(declared: DeclaredCredential) -> Self {
        Self {
            protocol: declared.protocol,
            host: declared.host,
            path: declared.path,
            username: declared.username,
            password: declared.password,
            url: declared.url,
        }
    }
}

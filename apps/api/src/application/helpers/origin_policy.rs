use url::Url;

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// CORS allow-list for the session endpoints.
///
/// Allows the root domain and its direct subdomains over https, plus loopback
/// origins on any port when `allow_localhost` is set (development only).
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    root_domain: String,
    allow_localhost: bool,
}

impl OriginPolicy {
    pub fn new(root_domain: &str, allow_localhost: bool) -> Self {
        Self {
            root_domain: normalize_root_domain(root_domain),
            allow_localhost,
        }
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin) else {
            return false;
        };

        // An Origin header is exactly scheme://host[:port]; anything else is not an origin.
        if url.origin().ascii_serialization() != origin {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };

        if self.allow_localhost
            && matches!(url.scheme(), "http" | "https")
            && LOOPBACK_HOSTS.contains(&host)
        {
            return true;
        }

        if url.scheme() != "https" || url.port().is_some() {
            return false;
        }

        if host == self.root_domain {
            return true;
        }

        host.strip_suffix(self.root_domain.as_str())
            .and_then(|prefix| prefix.strip_suffix('.'))
            .is_some_and(is_dns_label)
    }
}

/// Lowercase and strip any leading dot or trailing dot from a configured domain.
pub fn normalize_root_domain(domain: &str) -> String {
    domain
        .trim()
        .trim_start_matches('.')
        .trim_end_matches('.')
        .to_lowercase()
}

/// Cookie domain shared by every subdomain: the root with a leading dot.
pub fn cookie_domain_for(root_domain: &str) -> String {
    format!(".{}", normalize_root_domain(root_domain))
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

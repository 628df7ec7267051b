//! Parsed browser location: hostname, path and query.

use url::Url;

use crate::error::VitrineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self, VitrineError> {
        let url = Url::parse(href).map_err(|e| VitrineError::Validation {
            message: format!("invalid location {href}: {e}"),
        })?;
        if url.host_str().is_none() {
            return Err(VitrineError::Validation {
                message: format!("location has no host: {href}"),
            });
        }
        Ok(Self { url })
    }

    /// Lowercased hostname without port.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Raw pathname, always starting with `/`.
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Pathname with leading and trailing slashes removed.
    pub fn trimmed_path(&self) -> &str {
        self.url.path().trim_matches('/')
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// First value of the query parameter `name`, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Path plus query, as written to history entries.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{q}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// Resolve `target` (e.g. `/all-products?brand=x`) against this location.
    pub fn join(&self, target: &str) -> Result<Self, VitrineError> {
        let url = self.url.join(target).map_err(|e| VitrineError::Validation {
            message: format!("invalid navigation target {target}: {e}"),
        })?;
        Ok(Self { url })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_path_and_query() {
        let loc = Location::parse("https://Shoe-Store.Example.com:8443/p/summer-sale/?tenant=Acme&x=1")
            .unwrap();
        assert_eq!(loc.hostname(), "shoe-store.example.com");
        assert_eq!(loc.trimmed_path(), "p/summer-sale");
        assert_eq!(loc.query_param("tenant").as_deref(), Some("Acme"));
        assert_eq!(loc.query_param("missing"), None);
    }

    #[test]
    fn join_replaces_path_and_query() {
        let loc = Location::parse("https://a.example.com/checkout?x=1").unwrap();
        let next = loc.join("/all-products?brand=nike").unwrap();
        assert_eq!(next.hostname(), "a.example.com");
        assert_eq!(next.path_and_query(), "/all-products?brand=nike");
        assert_eq!(loc.join("/").unwrap().trimmed_path(), "");
    }
}

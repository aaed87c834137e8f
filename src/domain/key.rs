//! Deterministic cache keys for outbound requests.

use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded::{byte_serialize, Serializer};

/// Identity of an outbound request, used as its cache key.
///
/// Keys are built from a scope (for example the pricing currency), the HTTP
/// method, the path and the query parameters. Parameters are kept sorted so
/// insertion order never changes the key.
///
/// Every component is percent-encoded before it is joined, so separators
/// (`:`, `?`, `&`, `=`) appearing inside a scope, path segment, parameter name
/// or value can never make two different requests render the same key.
///
/// # Example
/// ```
/// use catalog_dispatch::RequestKey;
///
/// let a = RequestKey::new("GET", "/detail")
///     .with_scope("USD")
///     .with_param("sku", "C12345")
///     .with_param("lang", "en");
/// let b = RequestKey::new("GET", "/detail")
///     .with_scope("USD")
///     .with_param("lang", "en")
///     .with_param("sku", "C12345");
///
/// assert_eq!(a.to_string(), b.to_string());
/// assert_eq!(a.to_string(), "USD:GET:/detail?lang=en&sku=C12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    scope: String,
    method: String,
    path: String,
    params: BTreeMap<String, Vec<String>>,
}

impl RequestKey {
    /// Start a key for `method` on `path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scope: String::new(),
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    /// Set the scope prefix.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Append a value to a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Append several values at once, in order.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in params {
            self = self.with_param(name, value);
        }
        self
    }
}

/// Write `component` percent-encoded.
fn write_encoded(f: &mut fmt::Formatter<'_>, component: &str) -> fmt::Result {
    byte_serialize(component.as_bytes()).try_for_each(|chunk| f.write_str(chunk))
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_encoded(f, &self.scope)?;
        f.write_str(":")?;
        write_encoded(f, &self.method)?;
        f.write_str(":")?;

        // Segments are encoded one by one so `/` stays readable
        for (i, segment) in self.path.split('/').enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write_encoded(f, segment)?;
        }

        if !self.params.is_empty() {
            let mut query = Serializer::new(String::new());
            for (name, values) in &self.params {
                for value in values {
                    query.append_pair(name, value);
                }
            }
            write!(f, "?{}", query.finish())?;
        }
        Ok(())
    }
}

impl From<RequestKey> for String {
    fn from(key: RequestKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_contains_components() {
        let key = RequestKey::new("GET", "/detail")
            .with_scope("USD")
            .with_param("sku", "C12345")
            .to_string();

        assert!(key.contains("GET"));
        assert!(key.contains("USD"));
        assert!(key.contains("/detail"));
        assert!(key.contains("sku=C12345"));
    }

    #[test]
    fn test_different_methods() {
        let get = RequestKey::new("GET", "/path").to_string();
        let post = RequestKey::new("POST", "/path").to_string();
        assert_ne!(get, post);
    }

    #[test]
    fn test_method_is_normalized() {
        assert_eq!(
            RequestKey::new("get", "/path").to_string(),
            RequestKey::new("GET", "/path").to_string()
        );
    }

    #[test]
    fn test_different_param_values() {
        let a = RequestKey::new("GET", "/detail").with_param("sku", "C12345");
        let b = RequestKey::new("GET", "/detail").with_param("sku", "C5555");
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_different_scopes() {
        let usd = RequestKey::new("GET", "/detail").with_scope("USD");
        let eur = RequestKey::new("GET", "/detail").with_scope("EUR");
        assert_ne!(usd.to_string(), eur.to_string());
    }

    #[test]
    fn test_no_params() {
        assert_eq!(RequestKey::new("GET", "/path").to_string(), ":GET:/path");
    }

    #[test]
    fn test_separators_in_values_do_not_collide() {
        let embedded = RequestKey::new("GET", "/search").with_param("keyword", "R&page=2");
        let separate = RequestKey::new("GET", "/search")
            .with_param("keyword", "R")
            .with_param("page", "2");

        assert_ne!(embedded.to_string(), separate.to_string());
        assert_eq!(embedded.to_string(), ":GET:/search?keyword=R%26page%3D2");
    }

    #[test]
    fn test_separators_in_scope_and_path_do_not_collide() {
        let a = RequestKey::new("GET", "/detail").with_scope("USD:GET");
        let b = RequestKey::new("GET:GET", "/detail").with_scope("USD");
        assert_ne!(a.to_string(), b.to_string());

        let c = RequestKey::new("GET", "/search?keyword=R");
        let d = RequestKey::new("GET", "/search").with_param("keyword", "R");
        assert_ne!(c.to_string(), d.to_string());
        assert_eq!(c.to_string(), ":GET:/search%3Fkeyword%3DR");
    }

    #[test]
    fn test_percent_in_value_is_escaped() {
        let literal = RequestKey::new("GET", "/search").with_param("q", "%26");
        let ampersand = RequestKey::new("GET", "/search").with_param("q", "&");
        assert_ne!(literal.to_string(), ampersand.to_string());
    }

    #[test]
    fn test_repeated_param_values_keep_order() {
        let key = RequestKey::new("GET", "/search")
            .with_params([("brand", "TI"), ("brand", "ADI"), ("page", "1")])
            .to_string();
        assert_eq!(key, ":GET:/search?brand=TI&brand=ADI&page=1");
    }
}

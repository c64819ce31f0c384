//! Request path classification.
//!
//! ```text
//! /                         → Root                     (route "main")
//! /sys/login                → System { login }         (route "sys/login")
//! /sys/x/count/42/flag/true → System { x }, params {count: 42, flag: true}
//! /sys/fonts/Sans.woff      → System { fonts }         (route "sys/fonts/Sans.woff")
//! /some-article/anything    → Page { some-article }
//! ```

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::http::params::Params;

/// Reserved head segment for platform routes.
pub const SYSTEM_PREFIX: &str = "sys";

/// Classification of a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    /// Empty path; served by the main page.
    Root,
    /// `/sys/{sub_route}/...`; `rest` are the segments after the sub-route.
    System { sub_route: String, rest: Vec<String> },
    /// Anything else; the head segment is the page slug.
    Page { slug: String },
}

impl RoutePath {
    /// Classify a raw path (or an RPC method name).
    pub fn parse(path: &str) -> Self {
        let path = path.strip_prefix('/').unwrap_or(path);
        let mut segments = path.split('/').map(decode_segment);

        let head = match segments.next() {
            Some(head) if !head.is_empty() => head,
            _ => return RoutePath::Root,
        };

        if head != SYSTEM_PREFIX {
            return RoutePath::Page { slug: head };
        }

        let sub_route = segments.next().unwrap_or_default();
        // Pairing is positional, so empty segments stay; a trailing slash
        // does not count as one.
        let mut rest: Vec<String> = segments.collect();
        if rest.last().is_some_and(String::is_empty) {
            rest.pop();
        }
        RoutePath::System { sub_route, rest }
    }

    /// Route-table key for the whole path, e.g. `sys/fonts/Sans.woff`.
    pub fn full_name(&self) -> String {
        match self {
            RoutePath::Root => crate::routing::names::MAIN.to_string(),
            RoutePath::System { sub_route, rest } if rest.is_empty() => {
                format!("{}/{}", SYSTEM_PREFIX, sub_route)
            }
            RoutePath::System { sub_route, rest } => {
                format!("{}/{}/{}", SYSTEM_PREFIX, sub_route, rest.join("/"))
            }
            RoutePath::Page { slug } => slug.clone(),
        }
    }

    /// Key matched verbatim against the route table. A page slug that
    /// decoded into several segments (`/sys%2Flogin`) has none and can only
    /// reach the page fallback.
    pub fn exact_name(&self) -> Option<String> {
        match self {
            RoutePath::Page { slug } if slug.contains('/') => None,
            route => Some(route.full_name()),
        }
    }

    /// Route-table key of the system sub-route, e.g. `sys/login`.
    pub fn system_name(&self) -> Option<String> {
        match self {
            RoutePath::System { sub_route, .. } => Some(format!("{}/{}", SYSTEM_PREFIX, sub_route)),
            _ => None,
        }
    }

    /// Alternating `key/value` segments after a system sub-route.
    ///
    /// A trailing key without a value is dropped. Page paths carry no
    /// parameters.
    pub fn path_params(&self) -> Params {
        let mut params = Params::new();
        if let RoutePath::System { rest, .. } = self {
            for pair in rest.chunks_exact(2) {
                params.insert_raw(pair[0].clone(), pair[1].clone());
            }
        }
        params
    }

    pub fn is_system(&self) -> bool {
        matches!(self, RoutePath::System { .. })
    }

    pub fn is_page(&self) -> bool {
        matches!(self, RoutePath::Page { .. })
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::params::Value;

    #[test]
    fn test_system_route() {
        let route = RoutePath::parse("/sys/login");
        assert_eq!(
            route,
            RoutePath::System { sub_route: "login".into(), rest: vec![] }
        );
        assert_eq!(route.full_name(), "sys/login");
        assert_eq!(route.system_name().as_deref(), Some("sys/login"));
    }

    #[test]
    fn test_page_route_ignores_tail() {
        let route = RoutePath::parse("/some-article/edit/3");
        assert_eq!(route, RoutePath::Page { slug: "some-article".into() });
        assert!(route.path_params().is_empty());
    }

    #[test]
    fn test_root() {
        assert_eq!(RoutePath::parse("/"), RoutePath::Root);
        assert_eq!(RoutePath::parse(""), RoutePath::Root);
        assert_eq!(RoutePath::Root.full_name(), "main");
    }

    #[test]
    fn test_path_param_coercion() {
        let count = RoutePath::parse("/sys/x/count/42").path_params();
        assert_eq!(count.get("count"), Some(&Value::Int(42)));

        let flag = RoutePath::parse("/sys/x/flag/true").path_params();
        assert_eq!(flag.get("flag"), Some(&Value::Bool(true)));

        let name = RoutePath::parse("/sys/x/name/bob").path_params();
        assert_eq!(name.get("name"), Some(&Value::Str("bob".into())));
    }

    #[test]
    fn test_dangling_key_dropped() {
        let params = RoutePath::parse("/sys/x/a/1/b").path_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_i64("a"), Some(1));
    }

    #[test]
    fn test_asset_route_full_name() {
        let route = RoutePath::parse("/sys/fonts/Open%20Sans.woff");
        assert_eq!(route.full_name(), "sys/fonts/Open Sans.woff");
        assert_eq!(route.system_name().as_deref(), Some("sys/fonts"));
    }

    #[test]
    fn test_method_names_without_slash() {
        assert_eq!(RoutePath::parse("favicon.ico").full_name(), "favicon.ico");
        assert!(RoutePath::parse("sys/pagereq").is_system());
    }

    #[test]
    fn test_empty_segments_keep_pairing() {
        let params = RoutePath::parse("/sys/x/name//flag/true").path_params();
        assert_eq!(params.get("name"), Some(&Value::Str(String::new())));
        assert_eq!(params.get("flag"), Some(&Value::Bool(true)));

        let trailing = RoutePath::parse("/sys/x/count/42/");
        assert_eq!(trailing.path_params().get_i64("count"), Some(42));
        assert_eq!(trailing.full_name(), "sys/x/count/42");
        assert_eq!(RoutePath::parse("/sys/login/").full_name(), "sys/login");
    }

    #[test]
    fn test_encoded_slash_stays_a_page() {
        let route = RoutePath::parse("/sys%2Flogin");
        assert_eq!(route, RoutePath::Page { slug: "sys/login".into() });
        assert_eq!(route.exact_name(), None);
        assert_eq!(RoutePath::parse("/favicon.ico").exact_name().as_deref(), Some("favicon.ico"));
        assert_eq!(RoutePath::Root.exact_name().as_deref(), Some("main"));
    }
}

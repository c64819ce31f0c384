//! Route lookup.
//!
//! # Responsibilities
//! - Store registered handlers per method
//! - Resolve a classified route to a handler or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - Ordered maps keep listings and logs deterministic
//! - A name may live in only one of the two method tables

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::http::path::RoutePath;
use crate::http::request::Method;
use crate::routing::handler::Handler;
use crate::routing::names;

/// Errors raised while building a route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route registered with an empty name")]
    EmptyName,

    #[error("route {name} registered twice for {method}")]
    Duplicate { name: String, method: Method },

    #[error("route {name} registered for both read and write")]
    Conflict { name: String },

    #[error("page fallback registered twice")]
    DuplicateFallback,
}

/// Result of looking a route up.
pub enum Resolution {
    /// A registered route matched.
    Route { name: String, handler: Arc<dyn Handler> },
    /// A page route, served by the fallback handler.
    Page { slug: String, handler: Arc<dyn Handler> },
    NotFound,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Route { name, .. } => f.debug_struct("Route").field("name", name).finish(),
            Resolution::Page { slug, .. } => f.debug_struct("Page").field("slug", slug).finish(),
            Resolution::NotFound => f.write_str("NotFound"),
        }
    }
}

type HandlerMap = BTreeMap<String, Arc<dyn Handler>>;

/// Write-once mapping from route names to handlers.
pub struct RouteTable {
    read: HandlerMap,
    write: HandlerMap,
    page: Option<Arc<dyn Handler>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Resolve a route, first match wins:
    /// 1. exact name of the whole path
    /// 2. system sub-route (`sys/{name}`, remaining segments are params)
    /// 3. page fallback, for read-style page paths
    pub fn resolve(&self, method: Method, route: &RoutePath) -> Resolution {
        let table = self.table(method);

        if let Some(name) = route.exact_name() {
            if let Some(handler) = table.get(&name) {
                return Resolution::Route {
                    name,
                    handler: handler.clone(),
                };
            }
        }

        if let Some(system_name) = route.system_name() {
            if let Some(handler) = table.get(&system_name) {
                return Resolution::Route {
                    name: system_name,
                    handler: handler.clone(),
                };
            }
        }

        if let (RoutePath::Page { slug }, Method::Read, Some(handler)) = (route, method, &self.page) {
            return Resolution::Page {
                slug: slug.clone(),
                handler: handler.clone(),
            };
        }

        Resolution::NotFound
    }

    /// Which table a name is registered in, if any.
    pub fn method_of(&self, name: &str) -> Option<Method> {
        let name = names::normalize(name);
        if self.read.contains_key(name) {
            Some(Method::Read)
        } else if self.write.contains_key(name) {
            Some(Method::Write)
        } else {
            None
        }
    }

    /// Registered names for a method, in order.
    pub fn names(&self, method: Method) -> impl Iterator<Item = &str> {
        self.table(method).keys().map(String::as_str)
    }

    pub fn has_page_fallback(&self) -> bool {
        self.page.is_some()
    }

    pub fn len(&self) -> usize {
        self.read.len() + self.write.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, method: Method) -> &HandlerMap {
        match method {
            Method::Read => &self.read,
            Method::Write => &self.write,
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("read", &self.read.keys().collect::<Vec<_>>())
            .field("write", &self.write.keys().collect::<Vec<_>>())
            .field("page_fallback", &self.page.is_some())
            .finish()
    }
}

/// Collects registrations, validated on `build`.
#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<(Method, String, Arc<dyn Handler>)>,
    pages: Vec<Arc<dyn Handler>>,
}

impl RouteTableBuilder {
    /// Register a read-style route.
    pub fn read(mut self, name: impl AsRef<str>, handler: Arc<dyn Handler>) -> Self {
        let name = names::normalize(name.as_ref()).to_string();
        self.routes.push((Method::Read, name, handler));
        self
    }

    /// Register a write-style route.
    pub fn write(mut self, name: impl AsRef<str>, handler: Arc<dyn Handler>) -> Self {
        let name = names::normalize(name.as_ref()).to_string();
        self.routes.push((Method::Write, name, handler));
        self
    }

    /// Register a font served at `sys/fonts/{name}`.
    pub fn font(self, name: &str, handler: Arc<dyn Handler>) -> Self {
        self.read(names::font(name), handler)
    }

    /// Register an image served at `sys/images/{name}`.
    pub fn image(self, name: &str, handler: Arc<dyn Handler>) -> Self {
        self.read(names::image(name), handler)
    }

    /// Register the handler for dynamic page slugs.
    pub fn page_fallback(mut self, handler: Arc<dyn Handler>) -> Self {
        self.pages.push(handler);
        self
    }

    pub fn build(self) -> Result<RouteTable, RouteError> {
        let mut read = HandlerMap::new();
        let mut write = HandlerMap::new();

        for (method, name, handler) in self.routes {
            if name.is_empty() {
                return Err(RouteError::EmptyName);
            }
            let (own, other) = match method {
                Method::Read => (&mut read, &write),
                Method::Write => (&mut write, &read),
            };
            if other.contains_key(&name) {
                return Err(RouteError::Conflict { name });
            }
            if own.contains_key(&name) {
                return Err(RouteError::Duplicate { name, method });
            }
            own.insert(name, handler);
        }

        let mut pages = self.pages.into_iter();
        let page = pages.next();
        if pages.next().is_some() {
            return Err(RouteError::DuplicateFallback);
        }

        let table = RouteTable { read, write, page };
        tracing::debug!(routes = ?table, "Route table built");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseBuilder;
    use crate::routing::handler::sync_handler;

    fn ok() -> Arc<dyn Handler> {
        sync_handler(|_, _| Ok(ResponseBuilder::new().send("ok").build()))
    }

    fn table() -> RouteTable {
        RouteTable::builder()
            .read(names::FAVICON, ok())
            .read(names::MAIN, ok())
            .read(names::LOGIN, ok())
            .font("Sans.woff", ok())
            .write(names::PAGEREQ, ok())
            .page_fallback(ok())
            .build()
            .unwrap()
    }

    fn resolved_name(resolution: Resolution) -> Option<String> {
        match resolution {
            Resolution::Route { name, .. } => Some(name),
            Resolution::Page { slug, .. } => Some(format!("page:{}", slug)),
            Resolution::NotFound => None,
        }
    }

    #[test]
    fn test_exact_and_system_matches() {
        let table = table();
        let login = table.resolve(Method::Read, &RoutePath::parse("/sys/login/next/main"));
        assert_eq!(resolved_name(login).as_deref(), Some("sys/login"));

        let font = table.resolve(Method::Read, &RoutePath::parse("/sys/fonts/Sans.woff"));
        assert_eq!(resolved_name(font).as_deref(), Some("sys/fonts/Sans.woff"));

        let favicon = table.resolve(Method::Read, &RoutePath::parse("/favicon.ico"));
        assert_eq!(resolved_name(favicon).as_deref(), Some("favicon.ico"));
    }

    #[test]
    fn test_root_and_main_use_main_handler() {
        let table = table();
        let root = table.resolve(Method::Read, &RoutePath::parse("/"));
        assert_eq!(resolved_name(root).as_deref(), Some("main"));
        let main = table.resolve(Method::Read, &RoutePath::parse("/main"));
        assert_eq!(resolved_name(main).as_deref(), Some("main"));
    }

    #[test]
    fn test_page_fallback_only_for_read_pages() {
        let table = table();
        let page = table.resolve(Method::Read, &RoutePath::parse("/some-article"));
        assert_eq!(resolved_name(page).as_deref(), Some("page:some-article"));

        let post_page = table.resolve(Method::Write, &RoutePath::parse("/some-article"));
        assert!(matches!(post_page, Resolution::NotFound));

        let unknown_sys = table.resolve(Method::Read, &RoutePath::parse("/sys/nope"));
        assert!(matches!(unknown_sys, Resolution::NotFound));
    }

    #[test]
    fn test_encoded_slash_does_not_reach_system_routes() {
        let table = table();
        let page = table.resolve(Method::Read, &RoutePath::parse("/sys%2Flogin"));
        assert_eq!(resolved_name(page).as_deref(), Some("page:sys/login"));

        let write = table.resolve(Method::Write, &RoutePath::parse("/sys%2Fpagereq"));
        assert!(matches!(write, Resolution::NotFound));
    }

    #[test]
    fn test_method_tables_are_disjoint() {
        let table = table();
        assert!(matches!(
            table.resolve(Method::Read, &RoutePath::parse("/sys/pagereq")),
            Resolution::NotFound
        ));
        assert!(matches!(
            table.resolve(Method::Write, &RoutePath::parse("/sys/login")),
            Resolution::NotFound
        ));
        assert_eq!(table.method_of("sys/pagereq"), Some(Method::Write));
        assert_eq!(table.method_of("/sys/login"), Some(Method::Read));
        assert_eq!(table.method_of("sys/unknown"), None);
    }

    #[test]
    fn test_build_rejects_bad_registrations() {
        let conflict = RouteTable::builder().read("sys/x", ok()).write("/sys/x", ok()).build();
        assert_eq!(conflict.unwrap_err(), RouteError::Conflict { name: "sys/x".into() });

        let duplicate = RouteTable::builder().write("sys/x", ok()).write("sys/x", ok()).build();
        assert!(matches!(duplicate, Err(RouteError::Duplicate { .. })));

        let empty = RouteTable::builder().read("/", ok()).build();
        assert!(matches!(empty, Err(RouteError::EmptyName)));

        let fallbacks = RouteTable::builder().page_fallback(ok()).page_fallback(ok()).build();
        assert!(matches!(fallbacks, Err(RouteError::DuplicateFallback)));
    }
}

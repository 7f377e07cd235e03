//! Ordered routing table of the gateway.
//!
//! Entries are tried top to bottom and the first match wins. A wildcard
//! entry `prefix/*` matches `prefix/<rest>` only; the bare `prefix` needs an
//! exact entry of its own. That is why `/products/*` sits before
//! `/products`: both `/products/7` and `/products` resolve.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    User,
    Product,
}

/// Outcome of resolving an inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Health,
    Directory,
    Forward { upstream: Upstream, path: String },
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Exact(&'static str),
    Wildcard(&'static str),
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Health,
    Directory,
    /// Forward the inbound path as-is.
    Forward(Upstream),
    /// Forward only what follows the prefix, leading `/` included; `/` when
    /// nothing follows.
    StripPrefix(Upstream),
}

#[derive(Debug, Clone, Copy)]
struct Route {
    pattern: Pattern,
    action: Action,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn standard() -> Self {
        use Action::*;
        use Pattern::*;

        let routes = vec![
            Route { pattern: Exact("/health"), action: Health },
            Route { pattern: Wildcard("/user"), action: StripPrefix(Upstream::User) },
            Route { pattern: Exact("/user"), action: StripPrefix(Upstream::User) },
            Route { pattern: Wildcard("/products"), action: Forward(Upstream::Product) },
            Route { pattern: Exact("/products"), action: Forward(Upstream::Product) },
            Route { pattern: Exact("/my-products"), action: Forward(Upstream::Product) },
            Route { pattern: Wildcard("/uploads"), action: Forward(Upstream::Product) },
            Route { pattern: Exact("/"), action: Directory },
        ];
        Self { routes }
    }

    /// First matching entry, or `None` when no entry matches.
    pub fn resolve(&self, path: &str) -> Option<Target> {
        self.routes.iter().find_map(|route| {
            let rest = route.pattern.matches(path)?;
            Some(match route.action {
                Action::Health => Target::Health,
                Action::Directory => Target::Directory,
                Action::Forward(upstream) => Target::Forward {
                    upstream,
                    path: path.to_string(),
                },
                Action::StripPrefix(upstream) => Target::Forward {
                    upstream,
                    path: if rest.is_empty() { "/".into() } else { rest.to_string() },
                },
            })
        })
    }
}

impl Pattern {
    /// On a match, returns the part of `path` after the prefix (with its
    /// leading `/`); empty for exact matches.
    fn matches<'p>(&self, path: &'p str) -> Option<&'p str> {
        match *self {
            Pattern::Exact(exact) => (path == exact).then_some(""),
            Pattern::Wildcard(prefix) => {
                let rest = path.strip_prefix(prefix)?;
                rest.starts_with('/').then_some(rest)
            }
        }
    }
}

/// Joins a backend base URL with the rewritten path and the inbound query.
pub fn target_url(base: &str, path: &str, query: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    match query {
        Some(q) if !q.is_empty() => format!("{base}{path}?{q}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(upstream: Upstream, path: &str) -> Option<Target> {
        Some(Target::Forward {
            upstream,
            path: path.into(),
        })
    }

    #[test]
    fn product_wildcard_and_exact_both_resolve() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/products/7"), forward(Upstream::Product, "/products/7"));
        assert_eq!(table.resolve("/products"), forward(Upstream::Product, "/products"));
        assert_eq!(table.resolve("/products/"), forward(Upstream::Product, "/products/"));
        assert_eq!(
            table.resolve("/products/7/image"),
            forward(Upstream::Product, "/products/7/image")
        );
    }

    #[test]
    fn user_prefix_is_stripped() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/user/login"), forward(Upstream::User, "/login"));
        assert_eq!(table.resolve("/user/"), forward(Upstream::User, "/"));
        assert_eq!(table.resolve("/user/a/b"), forward(Upstream::User, "/a/b"));
        assert_eq!(table.resolve("/user"), forward(Upstream::User, "/"));
        assert_eq!(table.resolve("/userx"), None);
    }

    #[test]
    fn other_product_routes_pass_through() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/my-products"), forward(Upstream::Product, "/my-products"));
        assert_eq!(
            table.resolve("/uploads/7_abc.png"),
            forward(Upstream::Product, "/uploads/7_abc.png")
        );
    }

    #[test]
    fn local_and_unknown_paths() {
        let table = RouteTable::standard();
        assert_eq!(table.resolve("/health"), Some(Target::Health));
        assert_eq!(table.resolve("/"), Some(Target::Directory));
        assert_eq!(table.resolve("/users/login"), None);
        assert_eq!(table.resolve("/productsx"), None);
        assert_eq!(table.resolve("/my-products/1"), None);
        assert_eq!(table.resolve("/health/x"), None);
    }

    #[test]
    fn first_match_wins() {
        let table = RouteTable {
            routes: vec![
                Route {
                    pattern: Pattern::Wildcard("/products"),
                    action: Action::StripPrefix(Upstream::User),
                },
                Route {
                    pattern: Pattern::Wildcard("/products"),
                    action: Action::Forward(Upstream::Product),
                },
            ],
        };
        assert_eq!(table.resolve("/products/1"), forward(Upstream::User, "/1"));
    }

    #[test]
    fn target_url_keeps_query() {
        assert_eq!(
            target_url("http://localhost:8081/", "/products", Some("page=2&limit=5")),
            "http://localhost:8081/products?page=2&limit=5"
        );
        assert_eq!(
            target_url("http://localhost:8080", "/login", None),
            "http://localhost:8080/login"
        );
        assert_eq!(target_url("http://h", "/x", Some("")), "http://h/x");
    }
}

//! Path-segment trie mapping route patterns to values.
//!
//! # Responsibilities
//! - Insert `/`-delimited patterns, with `*` segments matching any single segment
//! - Resolve a request path to the value of its deepest registered ancestor
//! - Let wildcard nodes absorb trailing segments that match nothing below them
//!
//! # Design Decisions
//! - Two phases: `RouteTreeBuilder` is mutated at startup, `RouteTree` is frozen
//!   and read concurrently without locks
//! - Exact children are preferred over the wildcard child
//! - Re-inserting a pattern overwrites its value (last insert wins)

use std::fmt;

use thiserror::Error;

const WILDCARD: &str = "*";

/// Error returned for a pattern the tree cannot hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("invalid route pattern {0:?}: expected a '/'-delimited path")]
    Invalid(String),
}

#[derive(Debug, Clone)]
struct Node<V> {
    key: String,
    children: Vec<Node<V>>,
    value: Option<V>,
    wildcard: bool,
}

impl<V> Node<V> {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            children: Vec::new(),
            value: None,
            wildcard: key == WILDCARD,
        }
    }

    /// Exact-key child, created if missing. Never falls back to the wildcard,
    /// so `/api/..` and `/*/..` stay separate branches.
    fn child_or_insert(&mut self, key: &str) -> &mut Node<V> {
        let index = match self.children.iter().position(|c| c.key == key) {
            Some(index) => index,
            None => {
                self.children.push(Node::new(key));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Exact-key child if present, otherwise the wildcard child.
    fn find_child(&self, key: &str) -> Option<&Node<V>> {
        let mut wildcard = None;
        for child in &self.children {
            if child.key == key {
                return Some(child);
            }
            if child.wildcard {
                wildcard = Some(child);
            }
        }
        wildcard
    }
}

/// Segments below the root. The piece before the leading `/` addresses the
/// root itself and is skipped.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').skip(1)
}

/// Mutable build phase of a [`RouteTree`].
#[derive(Debug)]
pub struct RouteTreeBuilder<V> {
    root: Node<V>,
}

impl<V> RouteTreeBuilder<V> {
    pub fn new() -> Self {
        Self { root: Node::new("") }
    }

    /// Bind `value` to `pattern`, creating one node per segment.
    ///
    /// Patterns must contain a `/` unless they are empty or whitespace-only,
    /// in which case they address the root. One trailing `/` is ignored.
    pub fn insert(&mut self, pattern: &str, value: V) -> Result<(), PatternError> {
        if !pattern.contains('/') && !pattern.trim().is_empty() {
            return Err(PatternError::Invalid(pattern.to_string()));
        }

        let pattern = pattern.strip_suffix('/').unwrap_or(pattern);
        let mut node = &mut self.root;
        for segment in segments(pattern) {
            node = node.child_or_insert(segment);
        }
        node.value = Some(value);
        Ok(())
    }

    /// Freeze the tree for lookups.
    pub fn build(self) -> RouteTree<V> {
        RouteTree { root: self.root }
    }
}

impl<V> Default for RouteTreeBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable routing trie.
#[derive(Debug, Clone)]
pub struct RouteTree<V> {
    root: Node<V>,
}

impl<V> RouteTree<V> {
    /// Build a tree from ordered `(pattern, value)` pairs. Later duplicates win.
    pub fn from_patterns<I, P>(routes: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
    {
        let mut builder = RouteTreeBuilder::new();
        for (pattern, value) in routes {
            builder.insert(pattern.as_ref(), value)?;
        }
        Ok(builder.build())
    }

    /// Value of the deepest node with a bound value along `path`.
    ///
    /// When no child matches a segment and the current node is a wildcard,
    /// the segment is skipped and the next one is tried against the same node.
    pub fn search(&self, path: &str) -> Option<&V> {
        let mut current = &self.root;
        let mut best = current.value.as_ref();

        for segment in segments(path) {
            match current.find_child(segment) {
                Some(child) => {
                    if child.value.is_some() {
                        best = child.value.as_ref();
                    }
                    current = child;
                }
                None if current.wildcard => continue,
                None => break,
            }
        }

        best
    }
}

impl<V: fmt::Display> fmt::Display for RouteTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root.value {
            Some(value) => writeln!(f, "(root) [{}]", value)?,
            None => writeln!(f, "(root)")?,
        }
        write_children(f, &self.root, "")
    }
}

fn write_children<V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    node: &Node<V>,
    prefix: &str,
) -> fmt::Result {
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i == last;
        let connector = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}{}", prefix, connector, child.key)?;
        if let Some(value) = &child.value {
            write!(f, " [{}]", value)?;
        }
        writeln!(f)?;

        let indent = if is_last { "    " } else { "│   " };
        write_children(f, child, &format!("{}{}", prefix, indent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[(&str, &str)]) -> RouteTree<String> {
        RouteTree::from_patterns(routes.iter().map(|(p, v)| (*p, v.to_string()))).unwrap()
    }

    fn assert_search(tree: &RouteTree<String>, cases: &[(&str, Option<&str>)]) {
        for (path, expected) in cases {
            assert_eq!(
                tree.search(path).map(String::as_str),
                *expected,
                "search({:?})",
                path
            );
        }
    }

    #[test]
    fn test_single_route() {
        let t = tree(&[("/api", "api")]);
        assert_search(&t, &[("/api", Some("api")), ("/", None), ("/other", None)]);
    }

    #[test]
    fn test_root_catch_all() {
        let t = tree(&[("/", "root")]);
        assert_search(
            &t,
            &[
                ("/", Some("root")),
                ("/anything", Some("root")),
                ("/anything/nested", Some("root")),
            ],
        );
    }

    #[test]
    fn test_nested_route_without_ancestors() {
        let t = tree(&[("/api/web/test", "test")]);
        assert_search(
            &t,
            &[
                ("/api/web/test", Some("test")),
                ("/api/web/test/extra", Some("test")),
                ("/api/web", None),
                ("/api", None),
            ],
        );
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = tree(&[("/api", "api"), ("/api/web", "web"), ("/api/web/test", "test")]);
        assert_search(
            &t,
            &[
                ("/api", Some("api")),
                ("/api/web", Some("web")),
                ("/api/web/test", Some("test")),
                ("/api/web/test/extra", Some("test")),
                ("/api/web/other", Some("web")),
                ("/api/web/extra", Some("web")),
                ("/api/other", Some("api")),
                ("/other", None),
            ],
        );
    }

    #[test]
    fn test_root_with_specific_routes() {
        let t = tree(&[("/", "root"), ("/admin", "admin")]);
        assert_search(
            &t,
            &[
                ("/", Some("root")),
                ("/anything", Some("root")),
                ("/other/extra", Some("root")),
                ("/admin", Some("admin")),
                ("/admin/", Some("admin")),
                ("/admin/foo", Some("admin")),
            ],
        );
    }

    #[test]
    fn test_last_insert_wins() {
        let t = tree(&[("/api", "api_v1"), ("/api/", "api_v2")]);
        assert_search(&t, &[("/api", Some("api_v2"))]);

        let t = tree(&[("/", "first"), ("", "second")]);
        assert_search(&t, &[("/", Some("second")), ("/x", Some("second"))]);
    }

    #[test]
    fn test_siblings_and_intermediate_nodes() {
        let t = tree(&[("/api", "api"), ("/web/dashboard", "dashboard"), ("/health", "health")]);
        assert_search(
            &t,
            &[
                ("/api", Some("api")),
                ("/health", Some("health")),
                ("/web", None),
                ("/web/dashboard", Some("dashboard")),
                ("/web/other", None),
                ("/unknown", None),
            ],
        );
    }

    #[test]
    fn test_no_match_without_root() {
        let t = tree(&[("/api/web", "web")]);
        assert_search(&t, &[("/other", None), ("/api/other", None), ("/", None)]);
    }

    #[test]
    fn test_wildcard_absorbs_trailing_segments() {
        let t = tree(&[("/api/*/v1", "v1")]);
        assert_search(
            &t,
            &[
                ("/api/tenant1/v1", Some("v1")),
                ("/api/tenant1/v1/user1/other", Some("v1")),
                ("/api/tenant1", None),
            ],
        );
    }

    #[test]
    fn test_multi_wildcard() {
        let t = tree(&[
            ("/", "root"),
            ("/api", "api"),
            ("/api/*/v1", "v1"),
            ("/api/*/v1/*/settings", "settings"),
            ("/api/*/v1/*/settings/advanced", "advanced"),
            ("/api/*/v2/*/dashboard", "dashboard"),
        ]);
        assert_search(
            &t,
            &[
                ("/api/tenant1/v1/user1/settings", Some("settings")),
                ("/api/org-abc/v1/profile/settings", Some("settings")),
                ("/api/123/v1/456/settings", Some("settings")),
                ("/api/tenant1/v1/user1/settings/advanced", Some("advanced")),
                ("/api/tenant1/v2/user1/dashboard", Some("dashboard")),
                ("/api/tenant1/v1/user1/other", Some("v1")),
                ("/api/tenant1/v1/user1/settings/unknown", Some("settings")),
                ("/api/tenant1/v2/user1/other", Some("api")),
                ("/api/tenant1/v1", Some("v1")),
                ("/api/tenant1/v3", Some("api")),
                ("/api/tenant1/v2/user1/settings", Some("api")),
                ("/completely/unknown/path", Some("root")),
                ("/api/only", Some("api")),
            ],
        );
    }

    #[test]
    fn test_exact_child_preferred_over_wildcard() {
        let t = tree(&[("/api/*", "any"), ("/api/admin", "admin")]);
        assert_search(
            &t,
            &[("/api/admin", Some("admin")), ("/api/users", Some("any"))],
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut builder = RouteTreeBuilder::new();
        assert_eq!(
            builder.insert("api", "api".to_string()),
            Err(PatternError::Invalid("api".to_string()))
        );
        assert!(builder.insert("", "root".to_string()).is_ok());
        assert!(builder.insert("   ", "root".to_string()).is_ok());

        let t = builder.build();
        assert_search(&t, &[("/", Some("root")), ("/api", Some("root"))]);

        let err = RouteTree::from_patterns([("/ok", 1), ("bare", 2)]).unwrap_err();
        assert!(err.to_string().contains("bare"));
    }

    #[test]
    fn test_render() {
        let t = tree(&[("/", "root"), ("/api", "api"), ("/api/*/v1", "v1"), ("/web", "web")]);
        let rendered = t.to_string();
        assert_eq!(
            rendered,
            "(root) [root]\n├── api [api]\n│   └── *\n│       └── v1 [v1]\n└── web [web]\n"
        );
    }
}

//! Route table and path matching.
//!
//! Patterns use `{name}` segments for path variables. When several routes
//! match a path, the one whose leftmost differing segment is static wins, so
//! `/posts/latest` takes precedence over `/posts/{id}`.
//!
//! Request paths are split on `/` first and each segment is percent-decoded
//! afterwards, so an encoded `%2F` stays inside its segment.

use hermes_core::{ExtractionError, RegistrationError, SourceKind};
use hermes_extract::Params;
use http::Method;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

#[derive(Debug)]
struct Route<E> {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    endpoint: E,
}

impl<E> Route<E> {
    /// `None` if the route does not match; an error if it matches but a
    /// captured segment is not UTF-8 once decoded.
    fn match_path(&self, path: &[Decoded<'_>]) -> Option<Result<Params, ExtractionError>> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::new();
        for (segment, actual) in self.segments.iter().zip(path) {
            match (segment, actual) {
                (Segment::Literal(expected), Ok(actual)) if expected == actual => {}
                (Segment::Literal(_), _) => return None,
                (Segment::Param(name), Ok(actual)) => params.push(name.as_str(), &**actual),
                (Segment::Param(name), Err(raw)) => {
                    return Some(Err(ExtractionError::invalid_type(
                        SourceKind::Path,
                        name.as_str(),
                        format!("'{raw}' is not valid UTF-8 once percent-decoded"),
                    )));
                }
            }
        }
        Some(Ok(params))
    }

    /// `/a/{x}` and `/a/{y}` have the same shape and would be ambiguous.
    fn same_shape(&self, other: &[Segment]) -> bool {
        self.segments.len() == other.len()
            && self.segments.iter().zip(other).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Param(_), Segment::Param(_)) => true,
                _ => false,
            })
    }

    fn specificity(&self) -> impl Iterator<Item = bool> + '_ {
        self.segments.iter().map(Segment::is_literal)
    }
}

/// Result of looking up a request.
#[derive(Debug)]
pub(crate) enum RouteLookup<'a, E> {
    /// A route matched; path variables are captured.
    Found(&'a E, Params),
    /// The path exists under other methods.
    MethodNotAllowed(Vec<Method>),
    /// A route matched but a path variable could not be decoded.
    InvalidPath(ExtractionError),
    /// Nothing matches the path.
    NotFound,
}

/// Method and path pattern table.
#[derive(Debug)]
pub(crate) struct RouteTable<E> {
    routes: Vec<Route<E>>,
}

impl<E> Default for RouteTable<E> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<E> RouteTable<E> {
    pub(crate) fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        endpoint: E,
    ) -> Result<(), RegistrationError> {
        let segments = parse_pattern(pattern)?;
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.same_shape(&segments))
        {
            return Err(RegistrationError::DuplicateRoute {
                method: method.to_string(),
                path: pattern.to_string(),
            });
        }
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments,
            endpoint,
        });
        Ok(())
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, E> {
        let parts = decode_segments(path);
        let mut best: Option<(&Route<E>, Result<Params, ExtractionError>)> = None;
        let mut allowed = Vec::new();

        for route in &self.routes {
            let Some(params) = route.match_path(&parts) else {
                continue;
            };
            if route.method != *method {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
                continue;
            }
            let better = best
                .as_ref()
                .map_or(true, |(current, _)| route.specificity().gt(current.specificity()));
            if better {
                best = Some((route, params));
            }
        }

        match best {
            Some((route, Ok(params))) => RouteLookup::Found(&route.endpoint, params),
            Some((_, Err(error))) => RouteLookup::InvalidPath(error),
            None if allowed.is_empty() => RouteLookup::NotFound,
            None => RouteLookup::MethodNotAllowed(allowed),
        }
    }

    pub(crate) fn for_each_endpoint(&mut self, mut f: impl FnMut(&Method, &str, &mut E)) {
        for route in &mut self.routes {
            f(&route.method, &route.pattern, &mut route.endpoint);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }
}

/// A decoded request path segment, or the raw segment if it does not decode.
type Decoded<'a> = Result<Cow<'a, str>, &'a str>;

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn decode_segments(path: &str) -> Vec<Decoded<'_>> {
    split_path(path)
        .into_iter()
        .map(|raw| percent_decode_str(raw).decode_utf8().map_err(|_| raw))
        .collect()
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RegistrationError> {
    let invalid = |reason: &str| RegistrationError::InvalidRoute {
        path: pattern.to_string(),
        reason: reason.to_string(),
    };
    if !pattern.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let mut segments = Vec::new();
    for part in split_path(pattern) {
        let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            Some("") => return Err(invalid("empty parameter name")),
            Some(name) if name.contains(['{', '}']) => return Err(invalid("unbalanced braces")),
            Some(name) => {
                if segments.contains(&Segment::Param(name.to_string())) {
                    return Err(invalid("repeated parameter name"));
                }
                Segment::Param(name.to_string())
            }
            None if part.contains(['{', '}']) => return Err(invalid("unbalanced braces")),
            None => Segment::Literal(part.to_string()),
        };
        segments.push(segment);
    }
    Ok(segments)
}

/// Joins a group prefix and a route path.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    match path.trim_start_matches('/') {
        "" if prefix.is_empty() => "/".to_string(),
        "" => prefix.to_string(),
        rest => format!("{prefix}/{rest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(routes: &[(Method, &str)]) -> RouteTable<&'static str> {
        let mut table = RouteTable::default();
        for (method, pattern) in routes {
            let name: &'static str = Box::leak(format!("{method} {pattern}").into_boxed_str());
            table.insert(method.clone(), pattern, name).unwrap();
        }
        table
    }

    fn found(lookup: RouteLookup<'_, &'static str>) -> (&'static str, Params) {
        match lookup {
            RouteLookup::Found(endpoint, params) => (*endpoint, params),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_match_with_params() {
        let table = table(&[(Method::GET, "/users/{user}/posts/{post}")]);
        let (name, params) = found(table.lookup(&Method::GET, "/users/7/posts/42"));

        assert_eq!(name, "GET /users/{user}/posts/{post}");
        assert_eq!(params.get("user"), Some("7"));
        assert_eq!(params.get("post"), Some("42"));
    }

    #[test]
    fn test_static_segment_wins() {
        let table = table(&[
            (Method::GET, "/posts/{id}"),
            (Method::GET, "/posts/latest"),
        ]);

        let (name, params) = found(table.lookup(&Method::GET, "/posts/latest"));
        assert_eq!(name, "GET /posts/latest");
        assert!(params.is_empty());

        let (name, _) = found(table.lookup(&Method::GET, "/posts/3"));
        assert_eq!(name, "GET /posts/{id}");
    }

    #[test]
    fn test_leftmost_static_segment_decides() {
        let table = table(&[
            (Method::GET, "/{kind}/new"),
            (Method::GET, "/posts/{id}"),
        ]);
        let (name, _) = found(table.lookup(&Method::GET, "/posts/new"));
        assert_eq!(name, "GET /posts/{id}");
    }

    #[test]
    fn test_method_not_allowed() {
        let table = table(&[(Method::GET, "/posts"), (Method::POST, "/posts")]);
        match table.lookup(&Method::DELETE, "/posts") {
            RouteLookup::MethodNotAllowed(allowed) => {
                assert_eq!(allowed, [Method::GET, Method::POST]);
            }
            other => panic!("expected 405, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        let table = table(&[(Method::GET, "/posts")]);
        assert!(matches!(
            table.lookup(&Method::GET, "/users"),
            RouteLookup::NotFound
        ));
        assert!(matches!(
            table.lookup(&Method::GET, "/posts/1"),
            RouteLookup::NotFound
        ));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let table = table(&[(Method::GET, "/posts")]);
        found(table.lookup(&Method::GET, "/posts/"));
    }

    #[test]
    fn test_duplicate_routes_rejected() {
        let mut table = table(&[(Method::GET, "/posts/{id}")]);
        let err = table.insert(Method::GET, "/posts/{slug}", "dup").unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));

        assert!(table.insert(Method::PUT, "/posts/{id}", "put").is_ok());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_invalid_patterns() {
        let mut table = RouteTable::default();
        for pattern in ["posts", "/posts/{}", "/posts/{id", "/a/{x}/b/{x}", "/a/x}"] {
            let err = table.insert(Method::GET, pattern, ()).unwrap_err();
            assert!(
                matches!(err, RegistrationError::InvalidRoute { .. }),
                "{pattern}: {err}"
            );
        }
    }

    #[test]
    fn test_path_variables_are_decoded() {
        let table = table(&[(Method::GET, "/users/{name}/files/{file}")]);
        let (_, params) = found(table.lookup(&Method::GET, "/users/john%20doe/files/a%2Fb"));

        assert_eq!(params.get("name"), Some("john doe"));
        // Decoded after splitting, so the slash stays in its segment.
        assert_eq!(params.get("file"), Some("a/b"));
    }

    #[test]
    fn test_literal_segments_compare_decoded() {
        let table = table(&[(Method::GET, "/hello world")]);
        found(table.lookup(&Method::GET, "/hello%20world"));
    }

    #[test]
    fn test_undecodable_path_variable() {
        let table = table(&[(Method::GET, "/users/{name}")]);
        match table.lookup(&Method::GET, "/users/%FF") {
            RouteLookup::InvalidPath(err) => {
                assert_eq!(err.field(), Some("name"));
                assert_eq!(err.error_code(), "INVALID_PARAMETER");
            }
            other => panic!("expected an invalid path, got {other:?}"),
        }
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api", "/posts"), "/api/posts");
        assert_eq!(join_path("/api/", "posts"), "/api/posts");
        assert_eq!(join_path("/api", "/"), "/api");
        assert_eq!(join_path("", "/"), "/");
    }
}

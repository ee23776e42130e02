//! Request path to probe category mapping.

use percent_encoding::percent_decode_str;

use crate::config::EndpointAssignment;
use crate::health::ProbeCategory;

/// Configured endpoints, normalized for suffix matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMap {
    entries: Vec<(ProbeCategory, String)>,
}

impl EndpointMap {
    pub fn new(endpoints: &EndpointAssignment) -> Self {
        let mut entries = vec![(ProbeCategory::Status, normalize(&endpoints.status))];
        for (category, path) in [
            (ProbeCategory::Startup, &endpoints.startup),
            (ProbeCategory::Readiness, &endpoints.readiness),
            (ProbeCategory::Liveness, &endpoints.liveness),
        ] {
            if let Some(path) = path {
                entries.push((category, normalize(path)));
            }
        }
        Self { entries }
    }

    /// Category for a raw request target, `Unknown` if nothing matches.
    ///
    /// The query string is dropped, the path percent-decoded, and both sides
    /// compared case-insensitively with a trailing `/`. The first endpoint in
    /// Status, Startup, Readiness, Liveness order whose path is a suffix of
    /// the request path wins.
    pub fn resolve(&self, target: &str) -> ProbeCategory {
        let path = target.split(&['?', '#'][..]).next().unwrap_or_default();
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let path = normalize(&decoded);

        self.entries
            .iter()
            .find(|(_, endpoint)| path.ends_with(endpoint.as_str()))
            .map_or(ProbeCategory::Unknown, |(category, _)| *category)
    }

    /// Normalized path for `category`, if mapped.
    pub fn path(&self, category: ProbeCategory) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, path)| path.as_str())
    }
}

/// Lowercase, with exactly one leading and one trailing `/`.
fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    format!("/{}/", trimmed.to_lowercase())
}

// Route classification over a static, declaration-ordered pattern table.
use serde::{Deserialize, Serialize};

/// Access class assigned to a matched route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessClass {
    Public,
    Authenticated,
    TenantScoped,
}

/// Where the tenant name is taken from for a tenant-scoped route.
/// This is deployment configuration, not a fixed algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantRule {
    /// Zero-based segment index into the request path
    PathSegment(usize),
    /// First DNS label of the Host header
    Subdomain,
}

/// One route declaration as it appears in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub pattern: String,
    pub class: AccessClass,
    #[serde(default)]
    pub tenant_from: Option<TenantRule>,
}

impl RouteEntry {
    pub fn new(pattern: impl Into<String>, class: AccessClass) -> Self {
        Self {
            pattern: pattern.into(),
            class,
            tenant_from: None,
        }
    }

    pub fn with_tenant_from(mut self, rule: TenantRule) -> Self {
        self.tenant_from = Some(rule);
        self
    }
}

/// Result of classifying a concrete request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub class: AccessClass,
    pub tenant: Option<String>,
}

impl Classification {
    pub fn public() -> Self {
        Self {
            class: AccessClass::Public,
            tenant: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteTableError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A single compiled route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    class: AccessClass,
    tenant_rule: Option<TenantRule>,
}

impl RoutePattern {
    /// Compile a pattern string like `/w/:tenant/*`. Segments are literals,
    /// `:name` parameters, or a single trailing `*` wildcard.
    pub fn parse(
        pattern: &str,
        class: AccessClass,
        tenant_rule: Option<TenantRule>,
    ) -> Result<Self, RouteTableError> {
        let parts: Vec<&str> = split_path(pattern);
        let mut segments = Vec::with_capacity(parts.len());

        for (idx, part) in parts.iter().enumerate() {
            let segment = if *part == "*" {
                if idx != parts.len() - 1 {
                    return Err(RouteTableError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: "wildcard is only allowed as the final segment".to_string(),
                    });
                }
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteTableError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: "parameter segment is missing a name".to_string(),
                    });
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
            class,
            tenant_rule,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn class(&self) -> AccessClass {
        self.class
    }

    /// Structural match against already-split path segments.
    /// The trailing wildcard matches zero or more remaining segments.
    fn matches(&self, path: &[&str]) -> bool {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => return true,
                Segment::Literal(lit) => {
                    if path.get(idx).map(|s| *s) != Some(lit.as_str()) {
                        return false;
                    }
                }
                Segment::Param(_) => {
                    if idx >= path.len() {
                        return false;
                    }
                }
            }
        }
        self.segments.len() == path.len()
    }

    fn extract_tenant(&self, path: &[&str], host: Option<&str>) -> Option<String> {
        match self.tenant_rule? {
            TenantRule::PathSegment(idx) => path.get(idx).map(|s| (*s).to_string()),
            TenantRule::Subdomain => {
                let host = host?.split(':').next()?;
                let mut labels = host.split('.');
                let first = labels.next()?;
                // A bare host like "localhost" carries no subdomain
                labels.next()?;
                Some(first.to_string())
            }
        }
    }
}

/// Immutable, declaration-ordered route table built once at startup.
/// First structural match wins regardless of specificity.
#[derive(Debug, Clone)]
pub struct RouteTable {
    patterns: Vec<RoutePattern>,
}

impl RouteTable {
    pub fn new(patterns: Vec<RoutePattern>) -> Self {
        Self { patterns }
    }

    pub fn from_entries(entries: &[RouteEntry]) -> Result<Self, RouteTableError> {
        let patterns = entries
            .iter()
            .map(|entry| RoutePattern::parse(&entry.pattern, entry.class, entry.tenant_from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    /// Classify a concrete request path. Pure function over the static table;
    /// unmatched paths default to public.
    pub fn classify(&self, path: &str, host: Option<&str>) -> Classification {
        let segments = split_path(path);
        for pattern in &self.patterns {
            if pattern.matches(&segments) {
                return Classification {
                    class: pattern.class,
                    tenant: pattern.extract_tenant(&segments, host),
                };
            }
        }
        Classification::public()
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

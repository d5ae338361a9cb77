//! Resource Classifier
//!
//! Maps a request URL to the policy of the first resource class whose
//! patterns match it.

use std::fmt;
use std::time::Duration;

use regex::Regex;
use url::Url;

use crate::cache::PartitionKind;
use crate::error::{Result, WorkerError};
use crate::policy::Strategy;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

// == Resource Class ==
/// Named bucket that determines caching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    Static,
    Data,
    Images,
    Api,
    Default,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Static => "static",
            ResourceClass::Data => "data",
            ResourceClass::Images => "images",
            ResourceClass::Api => "api",
            ResourceClass::Default => "default",
        }
    }

    /// Partition that responses of this class are stored in.
    pub fn partition(&self) -> PartitionKind {
        match self {
            ResourceClass::Static => PartitionKind::Static,
            ResourceClass::Data => PartitionKind::Data,
            ResourceClass::Images => PartitionKind::Images,
            ResourceClass::Api | ResourceClass::Default => PartitionKind::Dynamic,
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == URL Pattern ==
/// A regular expression tested against one part of the URL.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Matches the URL path
    Path(Regex),
    /// Matches the URL hostname
    Host(Regex),
}

impl UrlPattern {
    pub fn path(pattern: &str) -> Result<Self> {
        Ok(UrlPattern::Path(compile(pattern)?))
    }

    pub fn host(pattern: &str) -> Result<Self> {
        Ok(UrlPattern::Host(compile(pattern)?))
    }

    pub fn matches(&self, url: &Url) -> bool {
        match self {
            UrlPattern::Path(re) => re.is_match(url.path()),
            UrlPattern::Host(re) => url.host_str().map(|h| re.is_match(h)).unwrap_or(false),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| WorkerError::InvalidRequest(format!("bad pattern {}: {}", pattern, e)))
}

// == Resource Policy ==
/// Immutable caching configuration of one resource class.
#[derive(Debug, Clone)]
pub struct ResourcePolicy {
    pub class: ResourceClass,
    pub strategy: Strategy,
    pub max_age: Duration,
    pub patterns: Vec<UrlPattern>,
}

impl ResourcePolicy {
    pub fn new(class: ResourceClass, strategy: Strategy, max_age: Duration) -> Self {
        Self {
            class,
            strategy,
            max_age,
            patterns: Vec::new(),
        }
    }

    /// Adds a pattern tested against the URL path.
    pub fn match_path(mut self, pattern: &str) -> Result<Self> {
        self.patterns.push(UrlPattern::path(pattern)?);
        Ok(self)
    }

    /// Adds a pattern tested against the URL hostname.
    pub fn match_host(mut self, pattern: &str) -> Result<Self> {
        self.patterns.push(UrlPattern::host(pattern)?);
        Ok(self)
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.patterns.iter().any(|p| p.matches(url))
    }

    /// Policy applied when no class matches.
    pub fn fallback() -> Self {
        Self::new(ResourceClass::Default, Strategy::StaleWhileRevalidate, HOUR)
    }
}

// == Classifier ==
/// Ordered policy table, evaluated top to bottom.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ResourcePolicy>,
    default: ResourcePolicy,
}

impl Classifier {
    /// Builds a classifier from an ordered rule list.
    pub fn new(rules: Vec<ResourcePolicy>, default: ResourcePolicy) -> Self {
        Self { rules, default }
    }

    /// The built-in table: static, data, images, api.
    pub fn standard() -> Result<Self> {
        let rules = vec![
            ResourcePolicy::new(ResourceClass::Static, Strategy::CacheFirst, 7 * DAY)
                .match_path(r"\.(css|js|mjs|woff2?|ttf|eot)$")?
                .match_host(r"^fonts\.(googleapis|gstatic)\.com$")?,
            ResourcePolicy::new(ResourceClass::Data, Strategy::NetworkFirst, 5 * MINUTE)
                .match_path(r"\.json$")?
                .match_path(r"^/data/")?,
            ResourcePolicy::new(ResourceClass::Images, Strategy::CacheFirst, 30 * DAY)
                .match_path(r"\.(png|jpe?g|gif|svg|webp|ico|avif)$")?,
            ResourcePolicy::new(ResourceClass::Api, Strategy::NetworkOnly, Duration::ZERO)
                .match_path(r"^/api/")?
                .match_host(r"^api\.")?,
        ];
        Ok(Self::new(rules, ResourcePolicy::fallback()))
    }

    /// Returns the policy of the first matching class, or the default.
    pub fn classify(&self, url: &Url) -> &ResourcePolicy {
        self.rules
            .iter()
            .find(|rule| rule.matches(url))
            .unwrap_or(&self.default)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard().expect("built-in patterns compile")
    }
}

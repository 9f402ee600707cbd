//! Per-endpoint fetch policies.

use std::time::Duration;

/// Semantic classes of API endpoints, each carrying default timeout
/// and retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Text search (`/search/...`): user is actively waiting.
    Search,
    /// Catalog browsing (`/discover/...`).
    Discover,
    /// Related-content lists (`.../recommendations`, `.../similar`).
    Recommendations,
    /// API configuration (`/configuration`): needed before images render.
    Configuration,
    /// Anything else.
    Other,
}

impl EndpointClass {
    /// Classify an endpoint path.
    pub fn classify(endpoint: &str) -> Self {
        if endpoint.starts_with("/search/") {
            Self::Search
        } else if endpoint.starts_with("/discover") {
            Self::Discover
        } else if endpoint.ends_with("/recommendations") || endpoint.ends_with("/similar") {
            Self::Recommendations
        } else if endpoint.starts_with("/configuration") {
            Self::Configuration
        } else {
            Self::Other
        }
    }

    /// Default total timeout for this class.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Search => Duration::from_secs(3),
            Self::Discover => Duration::from_secs(4),
            Self::Recommendations => Duration::from_secs(4),
            Self::Configuration => Duration::from_secs(5),
            Self::Other => Duration::from_secs(5),
        }
    }

    /// Default retry count for this class.
    pub fn default_max_retries(&self) -> u32 {
        match self {
            // Everything downstream needs the configuration, retry harder.
            Self::Configuration => 2,
            _ => 1,
        }
    }

    /// Name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Discover => "discover",
            Self::Recommendations => "recommendations",
            Self::Configuration => "configuration",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Delay between retry attempts.
#[derive(Debug, Clone)]
pub enum Backoff {
    /// No delay.
    None,
    /// Fixed delay.
    Fixed(Duration),
    /// Exponential with base and cap.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => *delay,
            Self::Exponential { base, max } => {
                let multiplier = 2u64.saturating_pow(attempt);
                let delay = Duration::from_millis(base.as_millis() as u64 * multiplier);
                std::cmp::min(delay, *max)
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
        }
    }
}

/// Timeout and retry configuration for one fetch.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Total per-attempt timeout.
    pub timeout: Duration,
    /// Maximum retry attempts after the first try.
    pub max_retries: u32,
    /// Backoff between attempts.
    pub backoff: Backoff,
}

impl FetchPolicy {
    /// Create a policy from an endpoint class's defaults.
    pub fn from_class(class: EndpointClass) -> Self {
        Self {
            timeout: class.default_timeout(),
            max_retries: class.default_max_retries(),
            backoff: Backoff::default(),
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_class(EndpointClass::Other)
    }
}

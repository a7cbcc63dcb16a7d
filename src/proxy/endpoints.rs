//! Descriptor table for the proxied query endpoints.
//!
//! Every protected read query goes through the same dispatcher; this table is
//! the only per-endpoint variation: upstream path, required parameters,
//! defaults, whether the costs-style end-of-day normalization applies, and
//! the upstream timeout.

use std::time::Duration;

pub struct QueryEndpoint {
    /// Route segment and cache-key scope.
    pub name: &'static str,
    pub upstream_path: &'static str,
    /// Parameters that must be present (and non-empty) in the request.
    pub required: &'static [&'static str],
    /// Defaults applied when the caller omits a parameter.
    pub defaults: &'static [(&'static str, &'static str)],
    /// Round `end_time` up to the end of its calendar day before caching and
    /// forwarding. Only the costs query wants this.
    pub round_end_time: bool,
    pub timeout: Duration,
}

pub const ENDPOINTS: &[QueryEndpoint] = &[
    QueryEndpoint {
        name: "costs",
        upstream_path: "/v1/organization/costs",
        required: &["start_time"],
        defaults: &[("bucket_width", "1d"), ("limit", "7")],
        round_end_time: true,
        // The heaviest query upstream; give it more room.
        timeout: Duration::from_secs(60),
    },
    QueryEndpoint {
        name: "projects",
        upstream_path: "/v1/organization/projects",
        required: &[],
        defaults: &[("include_archived", "false"), ("limit", "20")],
        round_end_time: false,
        timeout: Duration::from_secs(30),
    },
    QueryEndpoint {
        name: "usage",
        upstream_path: "/v1/organization/usage/completions",
        required: &["start_time"],
        defaults: &[("bucket_width", "1d"), ("limit", "7")],
        round_end_time: false,
        timeout: Duration::from_secs(30),
    },
    QueryEndpoint {
        name: "billing",
        upstream_path: "/v1/dashboard/billing/usage",
        required: &[],
        defaults: &[],
        round_end_time: false,
        timeout: Duration::from_secs(30),
    },
    QueryEndpoint {
        name: "subscription",
        upstream_path: "/v1/dashboard/billing/subscription",
        required: &[],
        defaults: &[],
        round_end_time: false,
        timeout: Duration::from_secs(30),
    },
];

pub fn find(name: &str) -> Option<&'static QueryEndpoint> {
    ENDPOINTS.iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, a) in ENDPOINTS.iter().enumerate() {
            for b in &ENDPOINTS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn only_costs_rounds_end_time() {
        for ep in ENDPOINTS {
            assert_eq!(ep.round_end_time, ep.name == "costs");
        }
    }

    #[test]
    fn find_known_and_unknown() {
        assert!(find("costs").is_some());
        assert!(find("projects").is_some());
        assert!(find("refunds").is_none());
    }
}

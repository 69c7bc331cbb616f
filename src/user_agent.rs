//! Shared User-Agent string for transport HTTP clients.
//!
//! Single source for project URL and UA format so all API traffic stays
//! consistent and easy to update.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/drivewire";

/// Default User-Agent for transport requests (identifies the library).
#[must_use]
pub(crate) fn default_transport_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("drivewire/{version} (+{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_crate_version_and_url() {
        let ua = default_transport_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL");
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("drivewire/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
            "UA must contain crate version"
        );
    }
}

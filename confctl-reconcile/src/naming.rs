//! Destination object naming (§4.8 "Name derivation").

use sha1::{Digest, Sha1};

/// `truncate_to_63(requestName) + "-" + shortHex10(sha1(appSpec))`, exactly
/// as the reconciliation contract names materialized objects, so the same
/// `(requestName, appSpec)` pair always yields the same destination name
/// and a changed `appSpec` always yields a different one.
pub fn destination_name(request_name: &str, app_spec: &str) -> String {
    format!("{}-{}", truncate_to_63(request_name), short_hex10_sha1(app_spec))
}

fn truncate_to_63(s: &str) -> String {
    s.chars().take(63).collect()
}

fn short_hex10_sha1(s: &str) -> String {
    let digest = Sha1::digest(s.as_bytes());
    let hex = digest.iter().map(|b| format!("{:02x}", b)).collect::<String>();
    hex.chars().take(10).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_name() {
        assert_eq!(destination_name("web", "app-a@v1"), destination_name("web", "app-a@v1"));
    }

    #[test]
    fn changed_app_spec_changes_the_name() {
        assert_ne!(destination_name("web", "app-a@v1"), destination_name("web", "app-a@v2"));
    }

    #[test]
    fn long_request_names_are_truncated() {
        let long = "w".repeat(200);
        let name = destination_name(&long, "app-a@v1");
        // 63 chars of request name + '-' + 10 hex chars.
        assert_eq!(name.len(), 63 + 1 + 10);
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic naming of additional DNS providers.

/// Build the resource name of an additional DNS provider from its secret name and
/// provider type.
///
/// | `secret_name` | `provider_type` | result                        |
/// |---------------|-----------------|-------------------------------|
/// | non-empty     | non-empty       | `{provider_type}-{secret_name}` |
/// | non-empty     | empty           | `{secret_name}`               |
/// | empty         | non-empty       | `{provider_type}`             |
/// | empty         | empty           | empty                         |
///
/// No normalization or collision detection is done. Two declared providers with the
/// same secret and type map to the same name; that configuration is unsupported.
///
/// # Example
///
/// ```rust
/// use clusterdns::naming::generate_dns_provider_name;
///
/// assert_eq!(generate_dns_provider_name("creds", "aws-route53"), "aws-route53-creds");
/// assert_eq!(generate_dns_provider_name("creds", ""), "creds");
/// ```
#[must_use]
pub fn generate_dns_provider_name(secret_name: &str, provider_type: &str) -> String {
    match (secret_name.is_empty(), provider_type.is_empty()) {
        (false, false) => format!("{provider_type}-{secret_name}"),
        (false, true) => secret_name.to_string(),
        (true, false) => provider_type.to_string(),
        (true, true) => String::new(),
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod naming_tests;

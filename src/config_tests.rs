// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL_CONFIG: &str = r"
projectNamespace: garden-dev
externalClusterDomain: shoot.example.com
internalClusterDomain: shoot.internal.example.net
apiServerAddress: 10.0.0.1
dns:
  domain: shoot.example.com
  providers:
    - type: aws-route53
      secretName: route53-creds
      primary: true
    - type: google-clouddns
      secretName: gcp-creds
      domains:
        include: [apps.example.com]
        exclude: [internal.apps.example.com]
      zones:
        include: [Z123]
externalDomain:
  provider: aws-route53
  secretData:
    accessKeyID: QUtJQQ==
  includeDomains: [extra.example.com]
  excludeZones: [Z999]
internalDomain:
  provider: aws-route53
  secretData:
    accessKeyID: QUtJQQ==
";

    #[test]
    fn test_parse_full_config() {
        let config: ClusterDnsConfig = serde_yaml::from_str(FULL_CONFIG).unwrap();

        assert_eq!(config.project_namespace, "garden-dev");
        assert_eq!(config.api_server_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(config.dns_providers().len(), 2);
        assert!(config.dns_providers()[0].is_primary());
        assert!(!config.dns_providers()[1].is_primary());

        let second = &config.dns_providers()[1];
        assert_eq!(second.provider_type.as_deref(), Some("google-clouddns"));
        assert_eq!(
            second.domains.as_ref().unwrap().exclude,
            vec!["internal.apps.example.com".to_string()]
        );
        assert!(second.zones.as_ref().unwrap().exclude.is_empty());

        let external = config.external_domain.as_ref().unwrap();
        assert_eq!(external.secret_data["accessKeyID"].0, b"AKIA".to_vec());
        assert_eq!(external.include_domains, vec!["extra.example.com".to_string()]);
        assert_eq!(external.exclude_zones, vec!["Z999".to_string()]);
    }

    #[test]
    fn test_disable_dns_flag() {
        let config: ClusterDnsConfig = serde_yaml::from_str("disableDns: true").unwrap();
        assert!(config.disable_dns);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: ClusterDnsConfig = serde_yaml::from_str("{}").unwrap();
        assert!(!config.disable_dns);
        assert!(config.dns.is_none());
        assert!(config.dns_providers().is_empty());
        assert!(config.project_namespace.is_empty());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = ClusterDnsConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(
            config.external_cluster_domain.as_deref(),
            Some("shoot.example.com")
        );
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClusterDnsConfig::from_yaml_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ReconcilerSettings::default();
        assert_eq!(settings.teardown_poll_interval, Duration::from_secs(5));
        assert_eq!(settings.teardown_timeout, Duration::from_secs(300));
        assert_eq!(settings.field_manager, "clusterdns");
    }

    #[test]
    fn test_settings_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CLUSTERDNS_TEARDOWN_TIMEOUT", "60"),
            ("CLUSTERDNS_FIELD_MANAGER", "seed-controller"),
        ]);
        let settings =
            ReconcilerSettings::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();

        assert_eq!(settings.teardown_timeout, Duration::from_secs(60));
        assert_eq!(settings.teardown_poll_interval, Duration::from_secs(5));
        assert_eq!(settings.field_manager, "seed-controller");
    }

    #[test]
    fn test_settings_reject_invalid_values() {
        let zero = ReconcilerSettings::from_lookup(|key| {
            (key == "CLUSTERDNS_TEARDOWN_POLL_INTERVAL").then(|| "0".to_string())
        });
        assert!(zero.is_err());

        let garbage = ReconcilerSettings::from_lookup(|key| {
            (key == "CLUSTERDNS_TEARDOWN_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(garbage.is_err());
    }
}

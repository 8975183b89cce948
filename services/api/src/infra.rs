use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tax_lookup::config::{AppConfig, ReferenceConfig};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// A `--data-dir` flag takes precedence over `TAX_DATA_DIR`.
pub(crate) fn reference_config(config: &AppConfig, data_dir: Option<PathBuf>) -> ReferenceConfig {
    match data_dir {
        Some(dir) => ReferenceConfig {
            data_dir: Some(dir),
        },
        None => config.reference.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tax_lookup::config::{AppEnvironment, ServerConfig, TelemetryConfig};

    fn config(data_dir: Option<&str>) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            reference: ReferenceConfig {
                data_dir: data_dir.map(PathBuf::from),
            },
        }
    }

    #[test]
    fn flag_overrides_environment_directory() {
        let resolved = reference_config(&config(Some("/env/rates")), Some("/flag/rates".into()));
        assert_eq!(resolved.data_dir, Some(PathBuf::from("/flag/rates")));
    }

    #[test]
    fn environment_directory_used_without_flag() {
        let resolved = reference_config(&config(Some("/env/rates")), None);
        assert_eq!(resolved.data_dir, Some(PathBuf::from("/env/rates")));
        assert!(reference_config(&config(None), None).data_dir.is_none());
    }
}

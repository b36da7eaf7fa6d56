use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryProtocol {
    Grpc,
    HttpProtobuf,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub endpoint: String,
    pub protocol: TelemetryProtocol,
    pub json_logs: bool,
    pub enabled: bool,
}

impl TelemetryConfig {
    /// Reads the standard `OTEL_*` variables plus `LOG_FORMAT`, `DEPLOYMENT_ENV` and
    /// `ENABLE_OTEL`.
    pub fn from_env(default_service_name: &str, default_service_version: &str) -> Self {
        Self::from_lookup(
            |key| env::var(key).ok(),
            default_service_name,
            default_service_version,
        )
    }

    fn from_lookup(
        get: impl Fn(&str) -> Option<String>,
        default_service_name: &str,
        default_service_version: &str,
    ) -> Self {
        let endpoint = get("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_default();
        let protocol = match get("OTEL_EXPORTER_OTLP_PROTOCOL")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Some("http" | "http/protobuf") => TelemetryProtocol::HttpProtobuf,
            _ => TelemetryProtocol::Grpc,
        };
        let environment = get("OTEL_RESOURCE_ATTRIBUTES")
            .and_then(|attrs| parse_environment_from_resource(&attrs))
            .or_else(|| get("DEPLOYMENT_ENV"))
            .unwrap_or_else(|| "dev".into());
        let json_logs = get("LOG_FORMAT")
            .map(|v| !matches!(v.to_lowercase().as_str(), "text" | "pretty" | "plain"))
            .unwrap_or(true);
        let enabled = get("ENABLE_OTEL")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            service_name: get("OTEL_SERVICE_NAME").unwrap_or_else(|| default_service_name.into()),
            service_version: get("OTEL_SERVICE_VERSION")
                .unwrap_or_else(|| default_service_version.into()),
            environment,
            endpoint,
            protocol,
            json_logs,
            enabled,
        }
    }

    pub fn exporter_enabled(&self) -> bool {
        self.enabled && !self.endpoint.trim().is_empty()
    }
}

fn parse_environment_from_resource(value: &str) -> Option<String> {
    value.split(',').find_map(|kv| {
        let (key, val) = kv.split_once('=')?;
        (key.trim() == "deployment.environment").then(|| val.trim().to_string())
    })
}

/// Defaults and environment variable names shared by gateway and dashboard

use std::time::Duration;

// Gateway
pub const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus:9090";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_JOB: &str = "node";
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

// Dashboard
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000/api";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_HISTORY: usize = 120;
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

// Environment overrides
pub const ENV_PROMETHEUS_URL: &str = "PROMETHEUS_BASE_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "NODEWATCH_HOST";
pub const ENV_JOB: &str = "NODEWATCH_JOB";
pub const ENV_REQUIRE_INSTANCE: &str = "NODEWATCH_REQUIRE_INSTANCE";
pub const ENV_QUERY_TIMEOUT: &str = "NODEWATCH_QUERY_TIMEOUT";
pub const ENV_API_URL: &str = "NODEWATCH_API_URL";
pub const ENV_POLL_INTERVAL: &str = "NODEWATCH_POLL_INTERVAL";
pub const ENV_HISTORY: &str = "NODEWATCH_HISTORY";

// Log filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "nodewatch=info,tower_http=info";

// Color thresholds for utilization (percent)
pub const WARN_THRESHOLD: f64 = 60.0;
pub const CRITICAL_THRESHOLD: f64 = 80.0;

pub mod prometheus;
pub mod promql;
pub mod snapshot;
pub mod gateway;
pub mod self_metrics;
pub mod window;
pub mod state;
pub mod api_client;

pub use prometheus::{InstantQuery, PrometheusClient, QueryError, Series};
pub use snapshot::{MetricSample, SystemSnapshot};
pub use gateway::Gateway;
pub use window::RollingWindow;
pub use state::{Action, DashboardState, MetricKind, PollOutcome};
pub use api_client::GatewayClient;

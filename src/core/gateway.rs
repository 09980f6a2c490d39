/// Query gateway: turns Prometheus instant queries into dashboard snapshots

use crate::core::prometheus::{InstantQuery, QueryError};
use crate::core::promql;
use crate::core::snapshot::{self, SystemSnapshot};
use crate::utils::now_label;

pub struct Gateway<Q> {
    query: Q,
    job: String,
}

impl<Q: InstantQuery> Gateway<Q> {
    pub fn new(query: Q, job: impl Into<String>) -> Self {
        Self {
            query,
            job: job.into(),
        }
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Instances of the configured job that Prometheus currently scrapes
    pub async fn list_instances(&self) -> Result<Vec<String>, QueryError> {
        let series = self.query.instant_query(&promql::instances_up(&self.job)).await?;
        let instances = snapshot::instance_labels(&series);

        tracing::debug!(job = %self.job, count = instances.len(), "resolved instances");
        Ok(instances)
    }

    /// Current CPU/memory/disk utilization, scoped to `instance` when given
    pub async fn current_metrics(&self, instance: Option<&str>) -> Result<SystemSnapshot, QueryError> {
        self.current_metrics_stamped(instance, &now_label()).await
    }

    pub async fn current_metrics_stamped(
        &self,
        instance: Option<&str>,
        stamp: &str,
    ) -> Result<SystemSnapshot, QueryError> {
        let cpu_query = promql::cpu_per_core(instance);
        let memory_query = promql::memory_used(instance);
        let disk_query = promql::disk_used(instance);

        // All three or nothing
        let (cpu, memory, disk) = tokio::try_join!(
            self.query.instant_query(&cpu_query),
            self.query.instant_query(&memory_query),
            self.query.instant_query(&disk_query),
        )?;

        let cpu = snapshot::normalize_cpu(&cpu);
        let memory = snapshot::normalize_scalar(&memory);
        let disk = snapshot::normalize_scalar(&disk);

        tracing::info!(
            instance = instance.unwrap_or("*"),
            ?cpu,
            memory,
            disk,
            "prometheus query resolved"
        );

        Ok(SystemSnapshot::single(stamp, cpu, memory, disk))
    }
}

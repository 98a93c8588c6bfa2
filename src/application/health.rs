//! Combined health reporting.
//!
//! Folds the database probe, the pool monitor verdict and the cleanup
//! scheduler state into one report with an overall verdict.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::cleanup::CleanupMetrics;
use crate::application::manager::{HealthProbe, ManagerStatistics};
use crate::application::performance::PerformanceSnapshot;
use crate::application::pool_monitor::PoolMetrics;
use crate::domain::HealthVerdict;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    verdict: HealthVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl HealthCheck {
    pub fn new(
        name: &'static str,
        critical: bool,
        verdict: HealthVerdict,
        detail: Option<String>,
    ) -> Self {
        Self {
            name,
            critical,
            verdict,
            detail,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn verdict(&self) -> HealthVerdict {
        self.verdict
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Contribution to the overall verdict: non-critical checks can degrade
    /// the service but never make it unhealthy.
    fn effective_verdict(&self) -> HealthVerdict {
        if self.critical {
            self.verdict
        } else {
            self.verdict.min(HealthVerdict::Degraded)
        }
    }
}

/// Everything the health endpoint and `shiftlog health` print.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub verdict: HealthVerdict,
    pub checks: Vec<HealthCheck>,
    pub database: HealthProbe,
    pub pool: PoolMetrics,
    pub manager: ManagerStatistics,
    pub performance: PerformanceSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupMetrics>,
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    /// Assemble a report from component snapshots.
    pub fn assemble(
        database: HealthProbe,
        pool_verdict: HealthVerdict,
        pool: PoolMetrics,
        manager: ManagerStatistics,
        performance: PerformanceSnapshot,
        cleanup: Option<CleanupMetrics>,
    ) -> Self {
        let mut checks = vec![
            HealthCheck::new("database", true, database.verdict, database.error.clone()),
            HealthCheck::new(
                "connection_pool",
                true,
                pool_verdict,
                (!pool_verdict.is_healthy()).then(|| {
                    format!(
                        "failure rate {:.2}, avg acquire {:.1}ms, {} exhaustion(s)",
                        pool.failure_rate, pool.average_acquire_latency_ms, pool.exhaustions
                    )
                }),
            ),
        ];

        if let Some(cleanup) = &cleanup {
            let failing: Vec<&str> = cleanup
                .tasks
                .iter()
                .filter(|t| t.last_error.is_some())
                .map(|t| t.name.as_str())
                .collect();
            let verdict = if failing.is_empty() {
                HealthVerdict::Healthy
            } else {
                HealthVerdict::Degraded
            };
            checks.push(HealthCheck::new(
                "cleanup",
                false,
                verdict,
                (!failing.is_empty()).then(|| format!("failing tasks: {}", failing.join(", "))),
            ));
        }

        let verdict = checks
            .iter()
            .map(HealthCheck::effective_verdict)
            .fold(HealthVerdict::Healthy, HealthVerdict::worst);

        Self {
            verdict,
            checks,
            database,
            pool,
            manager,
            performance,
            cleanup,
            generated_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.verdict.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cleanup::TaskInfo;

    fn probe(verdict: HealthVerdict) -> HealthProbe {
        HealthProbe {
            verdict,
            latency_ms: 1.0,
            error: None,
        }
    }

    fn report(db: HealthVerdict, pool: HealthVerdict) -> HealthReport {
        HealthReport::assemble(
            probe(db),
            pool,
            PoolMetrics::default(),
            ManagerStatistics::default(),
            PerformanceSnapshot::default(),
            None,
        )
    }

    #[test]
    fn overall_verdict_is_worst_critical() {
        assert_eq!(
            report(HealthVerdict::Healthy, HealthVerdict::Healthy).verdict,
            HealthVerdict::Healthy
        );
        assert_eq!(
            report(HealthVerdict::Degraded, HealthVerdict::Healthy).verdict,
            HealthVerdict::Degraded
        );
        assert_eq!(
            report(HealthVerdict::Healthy, HealthVerdict::Unhealthy).verdict,
            HealthVerdict::Unhealthy
        );
    }

    #[test]
    fn failing_cleanup_only_degrades() {
        let cleanup = CleanupMetrics {
            total_runs: 1,
            failures: 1,
            last_error: Some("boom".into()),
            tasks: vec![TaskInfo {
                name: "memory_reclaim".into(),
                interval_ms: 1_000,
                enabled: true,
                runs: 1,
                failures: 1,
                last_error: Some("boom".into()),
                since_last_run_ms: 0,
            }],
        };
        let report = HealthReport::assemble(
            probe(HealthVerdict::Healthy),
            HealthVerdict::Healthy,
            PoolMetrics::default(),
            ManagerStatistics::default(),
            PerformanceSnapshot::default(),
            Some(cleanup),
        );

        assert_eq!(report.verdict, HealthVerdict::Degraded);
        let check = report.checks.iter().find(|c| c.name() == "cleanup").unwrap();
        assert!(!check.critical());
        assert_eq!(check.detail(), Some("failing tasks: memory_reclaim"));
    }

    #[test]
    fn serializes_verdict_lowercase() {
        let json = serde_json::to_value(report(HealthVerdict::Healthy, HealthVerdict::Healthy))
            .unwrap();
        assert_eq!(json["verdict"], "healthy");
        assert_eq!(json["checks"][0]["name"], "database");
        assert!(json.get("cleanup").is_none());
    }
}

//! Process-wide metrics recorder.
//!
//! A thin layer over a `prometheus` [`Registry`]. Families are declared by
//! name; the first sample fixes a family's label names and registers a
//! counter, gauge or histogram vector for them. Output is produced by the
//! [`TextEncoder`], sorted by family name.
//!
//! Recording never fails: a sample whose kind or label names do not match its
//! family, or a non-finite observation, is logged and dropped.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use parking_lot::Mutex;
use prometheus::core::{Collector, Metric};
use prometheus::proto::MetricFamily;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

/// Point-in-time copy of one histogram series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    /// `(upper bound, cumulative count)` per finite bucket.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

/// Sorted `(name, value)` label pairs identifying one series.
type Labels = Vec<(String, String)>;

#[derive(Clone)]
enum Vector {
    Counter(IntCounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
}

impl Vector {
    fn build(
        kind: MetricKind,
        name: &str,
        help: &str,
        bounds: &[f64],
        label_names: &[&str],
    ) -> prometheus::Result<Self> {
        Ok(match kind {
            MetricKind::Counter => {
                Self::Counter(IntCounterVec::new(Opts::new(name, help), label_names)?)
            }
            MetricKind::Gauge => Self::Gauge(GaugeVec::new(Opts::new(name, help), label_names)?),
            MetricKind::Histogram => Self::Histogram(HistogramVec::new(
                HistogramOpts::new(name, help).buckets(bounds.to_vec()),
                label_names,
            )?),
        })
    }

    fn boxed(&self) -> Box<dyn Collector> {
        match self {
            Self::Counter(v) => Box::new(v.clone()),
            Self::Gauge(v) => Box::new(v.clone()),
            Self::Histogram(v) => Box::new(v.clone()),
        }
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self {
            Self::Counter(v) => v.collect(),
            Self::Gauge(v) => v.collect(),
            Self::Histogram(v) => v.collect(),
        }
    }

    fn reset(&self) {
        match self {
            Self::Counter(v) => v.reset(),
            Self::Gauge(v) => v.reset(),
            Self::Histogram(v) => v.reset(),
        }
    }

    /// Create the series for `labels` at zero if it does not exist yet.
    fn touch(&self, labels: &HashMap<&str, &str>) -> prometheus::Result<()> {
        match self {
            Self::Counter(v) => v.get_metric_with(labels).map(drop),
            Self::Gauge(v) => v.get_metric_with(labels).map(drop),
            Self::Histogram(v) => v.get_metric_with(labels).map(drop),
        }
    }
}

struct Family {
    kind: MetricKind,
    help: String,
    bounds: Vec<f64>,
    /// Registered once the first sample fixes the label names.
    vector: Option<Vector>,
    /// Every label set recorded since creation; reset re-creates them at zero.
    series: BTreeSet<Labels>,
}

impl Family {
    fn new(kind: MetricKind, help: &str, bounds: &[f64]) -> Self {
        let mut bounds: Vec<f64> = bounds.iter().copied().filter(|b| b.is_finite()).collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();
        Self {
            kind,
            help: help.to_string(),
            bounds,
            vector: None,
            series: BTreeSet::new(),
        }
    }

    /// The registry rejects empty help strings.
    fn help<'a>(&'a self, name: &'a str) -> &'a str {
        if self.help.is_empty() {
            name
        } else {
            &self.help
        }
    }
}

/// Counters, gauges and histograms for arbitrary named operations.
pub struct MetricsRecorder {
    default_bounds: Vec<f64>,
    registry: Registry,
    families: Mutex<BTreeMap<String, Family>>,
}

impl fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("default_bounds", &self.default_bounds)
            .field("families", &self.families.lock().len())
            .finish_non_exhaustive()
    }
}

fn label_key(labels: &[(&str, &str)]) -> Labels {
    let mut key: Labels = labels
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    key.sort();
    key
}

fn label_map(key: &Labels) -> HashMap<&str, &str> {
    key.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

impl MetricsRecorder {
    /// Create a recorder whose undeclared histograms use `default_bounds`.
    #[must_use]
    pub fn new(default_bounds: &[f64]) -> Self {
        Self {
            default_bounds: default_bounds.to_vec(),
            registry: Registry::new(),
            families: Mutex::new(BTreeMap::new()),
        }
    }

    fn declare(&self, name: &str, kind: MetricKind, help: &str, bounds: &[f64]) {
        let mut families = self.families.lock();
        match families.get_mut(name) {
            Some(family) if family.kind == kind && family.vector.is_none() => {
                family.help = help.to_string();
            }
            Some(family) if family.kind == kind => {}
            Some(family) => {
                warn!(
                    metric = name,
                    existing = family.kind.as_str(),
                    requested = kind.as_str(),
                    "Metric already declared with a different kind"
                );
            }
            None => {
                families.insert(name.to_string(), Family::new(kind, help, bounds));
            }
        }
    }

    /// Declare a counter so it is exported even before its first increment.
    pub fn describe_counter(&self, name: &str, help: &str) {
        self.declare(name, MetricKind::Counter, help, &[]);
    }

    pub fn describe_gauge(&self, name: &str, help: &str) {
        self.declare(name, MetricKind::Gauge, help, &[]);
    }

    pub fn describe_histogram(&self, name: &str, help: &str, bounds: &[f64]) {
        self.declare(name, MetricKind::Histogram, help, bounds);
    }

    /// Run `update` against the vector for `name` with `labels`, creating and
    /// registering the family (undescribed) on first use.
    fn with_series(
        &self,
        name: &str,
        kind: MetricKind,
        labels: &[(&str, &str)],
        update: impl FnOnce(&Vector, &HashMap<&str, &str>) -> prometheus::Result<()>,
    ) {
        let key = label_key(labels);
        let mut families = self.families.lock();
        let family = families
            .entry(name.to_string())
            .or_insert_with(|| Family::new(kind, "", &self.default_bounds));
        if family.kind != kind {
            warn!(
                metric = name,
                existing = family.kind.as_str(),
                requested = kind.as_str(),
                "Dropping sample recorded against a metric of another kind"
            );
            return;
        }

        if family.vector.is_none() {
            let names: Vec<&str> = key.iter().map(|(k, _)| k.as_str()).collect();
            let registered = Vector::build(kind, name, family.help(name), &family.bounds, &names)
                .and_then(|vector| {
                    self.registry.register(vector.boxed())?;
                    Ok(vector)
                });
            match registered {
                Ok(vector) => family.vector = Some(vector),
                Err(e) => {
                    warn!(metric = name, error = %e, "Failed to register metric");
                    return;
                }
            }
        }
        let Some(vector) = family.vector.as_ref() else {
            return;
        };

        let result = {
            let map = label_map(&key);
            update(vector, &map)
        };
        match result {
            Ok(()) => {
                family.series.insert(key);
            }
            Err(e) => warn!(metric = name, error = %e, "Dropping sample with mismatched labels"),
        }
    }

    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)], by: u64) {
        self.with_series(name, MetricKind::Counter, labels, |vector, map| {
            if let Vector::Counter(v) = vector {
                v.get_metric_with(map)?.inc_by(by);
            }
            Ok(())
        });
    }

    pub fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        self.with_series(name, MetricKind::Gauge, labels, |vector, map| {
            if let Vector::Gauge(v) = vector {
                v.get_metric_with(map)?.set(value);
            }
            Ok(())
        });
    }

    /// Record one histogram observation. NaN and infinities are dropped.
    pub fn observe(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        if !value.is_finite() {
            warn!(metric = name, value, "Dropping non-finite observation");
            return;
        }
        self.with_series(name, MetricKind::Histogram, labels, |vector, map| {
            if let Vector::Histogram(v) = vector {
                v.get_metric_with(map)?.observe(value);
            }
            Ok(())
        });
    }

    /// Zero every series. Families and label sets stay exported.
    pub fn reset(&self) {
        let families = self.families.lock();
        for (name, family) in families.iter() {
            let Some(vector) = family.vector.as_ref() else {
                continue;
            };
            vector.reset();
            for key in &family.series {
                if let Err(e) = vector.touch(&label_map(key)) {
                    warn!(metric = %name, error = %e, "Failed to restore series after reset");
                }
            }
        }
    }

    /// Look up a series that has been recorded at least once.
    fn recorded<R>(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        read: impl FnOnce(&Vector, &HashMap<&str, &str>) -> Option<R>,
    ) -> Option<R> {
        let key = label_key(labels);
        let families = self.families.lock();
        let family = families.get(name)?;
        if !family.series.contains(&key) {
            return None;
        }
        read(family.vector.as_ref()?, &label_map(&key))
    }

    #[must_use]
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        self.recorded(name, labels, |vector, map| match vector {
            Vector::Counter(v) => v.get_metric_with(map).ok().map(|c| c.get()),
            _ => None,
        })
    }

    /// Sum of a counter across all of its label sets.
    #[must_use]
    pub fn counter_total(&self, name: &str) -> u64 {
        let families = self.families.lock();
        let Some(family) = families.get(name) else {
            return 0;
        };
        let Some(Vector::Counter(v)) = family.vector.as_ref() else {
            return 0;
        };
        family
            .series
            .iter()
            .filter_map(|key| v.get_metric_with(&label_map(key)).ok())
            .map(|c| c.get())
            .sum()
    }

    #[must_use]
    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.recorded(name, labels, |vector, map| match vector {
            Vector::Gauge(v) => v.get_metric_with(map).ok().map(|g| g.get()),
            _ => None,
        })
    }

    #[must_use]
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        self.recorded(name, labels, |vector, map| {
            let Vector::Histogram(v) = vector else {
                return None;
            };
            let proto = v.get_metric_with(map).ok()?.metric();
            let data = proto.get_histogram();
            Some(HistogramSnapshot {
                buckets: data
                    .get_bucket()
                    .iter()
                    .map(|b| (b.get_upper_bound(), b.get_cumulative_count()))
                    .collect(),
                sum: data.get_sample_sum(),
                count: data.get_sample_count(),
            })
        })
    }

    /// Names of every known family, sorted.
    #[must_use]
    pub fn metric_names(&self) -> Vec<String> {
        self.families.lock().keys().cloned().collect()
    }

    /// Render every family in the Prometheus text exposition format.
    ///
    /// Declared families without any series are rendered with a single
    /// unlabeled zero sample, so an idle metric is distinguishable from a
    /// missing one.
    #[must_use]
    pub fn render(&self) -> String {
        let families = self.families.lock();
        let mut gathered = self.registry.gather();

        for (name, family) in families.iter().filter(|(_, f)| f.vector.is_none()) {
            let idle = Vector::build(family.kind, name, family.help(name), &family.bounds, &[])
                .and_then(|vector| {
                    vector.touch(&HashMap::new())?;
                    Ok(vector)
                });
            match idle {
                Ok(vector) => gathered.extend(vector.collect()),
                Err(e) => warn!(metric = %name, error = %e, "Failed to render idle metric"),
            }
        }
        drop(families);

        gathered.retain(|mf| !mf.get_metric().is_empty());
        gathered.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&gathered, &mut buf) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buf).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> MetricsRecorder {
        MetricsRecorder::new(&[10.0, 100.0])
    }

    #[test]
    fn counters_accumulate_per_label_set() {
        let r = recorder();
        r.increment_counter("requests_total", &[("route", "/a")], 1);
        r.increment_counter("requests_total", &[("route", "/a")], 2);
        r.increment_counter("requests_total", &[("route", "/b")], 1);

        assert_eq!(r.counter_value("requests_total", &[("route", "/a")]), Some(3));
        assert_eq!(r.counter_total("requests_total"), 4);
    }

    #[test]
    fn unrecorded_series_reads_as_none() {
        let r = recorder();
        r.increment_counter("requests_total", &[("route", "/a")], 1);

        assert_eq!(r.counter_value("requests_total", &[("route", "/b")]), None);
        assert_eq!(r.counter_value("missing_total", &[]), None);
        assert_eq!(r.counter_total("missing_total"), 0);
    }

    #[test]
    fn label_order_does_not_matter() {
        let r = recorder();
        r.increment_counter("x_total", &[("a", "1"), ("b", "2")], 1);
        r.increment_counter("x_total", &[("b", "2"), ("a", "1")], 1);

        assert_eq!(r.counter_value("x_total", &[("a", "1"), ("b", "2")]), Some(2));
    }

    #[test]
    fn mismatched_label_names_are_dropped() {
        let r = recorder();
        r.increment_counter("y_total", &[("a", "1")], 1);
        r.increment_counter("y_total", &[("b", "1")], 1);

        assert_eq!(r.counter_total("y_total"), 1);
        assert_eq!(r.counter_value("y_total", &[("b", "1")]), None);
    }

    #[test]
    fn declared_metric_renders_zero_before_first_sample() {
        let r = recorder();
        r.describe_counter("jobs_total", "Jobs run");
        r.describe_histogram("job_ms", "Job duration", &[1.0]);

        let text = r.render();
        assert!(text.contains("# HELP jobs_total Jobs run\n"));
        assert!(text.contains("# TYPE jobs_total counter\n"));
        assert!(text.contains("jobs_total 0\n"));
        assert!(text.contains("job_ms_bucket{le=\"1\"} 0\n"));
        assert!(text.contains("job_ms_bucket{le=\"+Inf\"} 0\n"));
        assert!(text.contains("job_ms_count 0\n"));
    }

    #[test]
    fn histogram_renders_cumulative_buckets() {
        let r = recorder();
        r.observe("latency_ms", &[("op", "q")], 5.0);
        r.observe("latency_ms", &[("op", "q")], 50.0);
        r.observe("latency_ms", &[("op", "q")], 500.0);

        let text = r.render();
        assert!(text.contains("latency_ms_bucket{op=\"q\",le=\"10\"} 1\n"));
        assert!(text.contains("latency_ms_bucket{op=\"q\",le=\"100\"} 2\n"));
        assert!(text.contains("latency_ms_bucket{op=\"q\",le=\"+Inf\"} 3\n"));
        assert!(text.contains("latency_ms_sum{op=\"q\"} 555\n"));
        assert!(text.contains("latency_ms_count{op=\"q\"} 3\n"));

        let snapshot = r.histogram("latency_ms", &[("op", "q")]).unwrap();
        assert_eq!(snapshot.buckets, vec![(10.0, 1), (100.0, 2)]);
        assert_eq!(snapshot.count, 3);
        assert!((snapshot.sum - 555.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_observations_are_dropped() {
        let r = recorder();
        r.observe("latency_ms", &[("op", "q")], 5.0);
        r.observe("latency_ms", &[("op", "q")], f64::NAN);
        r.observe("latency_ms", &[("op", "q")], f64::INFINITY);
        r.observe("latency_ms", &[("op", "q")], f64::NEG_INFINITY);

        let snapshot = r.histogram("latency_ms", &[("op", "q")]).unwrap();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.buckets, vec![(10.0, 1), (100.0, 1)]);
        assert!((snapshot.sum - 5.0).abs() < f64::EPSILON);
        assert!(r.render().contains("latency_ms_sum{op=\"q\"} 5\n"));
    }

    #[test]
    fn reset_keeps_names_and_series() {
        let r = recorder();
        r.increment_counter("a_total", &[("k", "v")], 7);
        r.set_gauge("g", &[], 3.5);
        r.observe("h_ms", &[("k", "v")], 1.0);
        r.reset();

        assert_eq!(r.counter_value("a_total", &[("k", "v")]), Some(0));
        assert_eq!(r.gauge_value("g", &[]), Some(0.0));
        assert_eq!(r.histogram("h_ms", &[("k", "v")]).map(|h| h.count), Some(0));
        assert_eq!(
            r.metric_names(),
            vec!["a_total".to_string(), "g".to_string(), "h_ms".to_string()]
        );

        let text = r.render();
        assert!(text.contains("a_total{k=\"v\"} 0\n"));
        assert!(text.contains("g 0\n"));
        assert!(text.contains("h_ms_count{k=\"v\"} 0\n"));
    }

    #[test]
    fn kind_mismatch_is_dropped() {
        let r = recorder();
        r.increment_counter("m", &[], 1);
        r.observe("m", &[], 1.0);

        assert_eq!(r.counter_value("m", &[]), Some(1));
        assert!(r.histogram("m", &[]).is_none());
    }

    #[test]
    fn label_values_are_escaped() {
        let r = recorder();
        r.increment_counter("e_total", &[("q", "say \"hi\"")], 1);
        assert!(r.render().contains("e_total{q=\"say \\\"hi\\\"\"} 1\n"));
    }

    #[test]
    fn render_is_sorted_by_name() {
        let r = recorder();
        r.increment_counter("zeta_total", &[], 1);
        r.describe_gauge("mid", "Declared only");
        r.increment_counter("alpha_total", &[], 1);

        let text = r.render();
        let alpha = text.find("alpha_total").unwrap();
        let mid = text.find("# HELP mid").unwrap();
        let zeta = text.find("zeta_total").unwrap();
        assert!(alpha < mid && mid < zeta);
    }
}

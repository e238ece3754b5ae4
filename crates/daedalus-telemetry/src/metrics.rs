//! Metrics emitted by the metadata pipeline.
//!
//! Metrics go through the `metrics` facade; nothing is recorded until the
//! application installs a recorder (Prometheus exporter or similar).
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `daedalus_metadata_cache_hits_total` | Counter | `factory`, `layer` | Cache hits (`local` or `store`) |
//! | `daedalus_metadata_cache_misses_total` | Counter | `factory` | Cache misses (delegate invoked) |
//! | `daedalus_metadata_cache_store_failures_total` | Counter | `factory`, `op` | Swallowed cache store failures |
//! | `daedalus_metadata_deprecations_total` | Counter | `key` | Deprecated keys remapped |
//! | `daedalus_metadata_resolution_duration_seconds` | Histogram | `factory` | Delegate computation time |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Cache hits counter.
pub const CACHE_HITS: &str = "daedalus_metadata_cache_hits_total";
/// Cache misses counter.
pub const CACHE_MISSES: &str = "daedalus_metadata_cache_misses_total";
/// Cache store failures counter.
pub const CACHE_STORE_FAILURES: &str = "daedalus_metadata_cache_store_failures_total";
/// Deprecated key remaps counter.
pub const DEPRECATIONS: &str = "daedalus_metadata_deprecations_total";
/// Delegate computation duration histogram.
pub const RESOLUTION_DURATION: &str = "daedalus_metadata_resolution_duration_seconds";

/// Registers descriptions for all pipeline metrics.
pub fn describe_metrics() {
    describe_counter!(CACHE_HITS, "Metadata cache hits by layer");
    describe_counter!(CACHE_MISSES, "Metadata cache misses that invoked the decorated factory");
    describe_counter!(CACHE_STORE_FAILURES, "Cache store failures recovered by recomputation");
    describe_counter!(DEPRECATIONS, "Deprecated declaration keys remapped");
    describe_histogram!(RESOLUTION_DURATION, "Time spent computing metadata on a cache miss, in seconds");
}

/// Records a cache hit in the `local` or `store` layer.
pub fn record_cache_hit(factory: &'static str, layer: &'static str) {
    counter!(CACHE_HITS, "factory" => factory, "layer" => layer).increment(1);
}

/// Records a cache miss and the time the delegate took.
pub fn record_cache_miss(factory: &'static str, duration: Duration) {
    counter!(CACHE_MISSES, "factory" => factory).increment(1);
    histogram!(RESOLUTION_DURATION, "factory" => factory).record(duration.as_secs_f64());
}

/// Records a swallowed cache store failure (`op` is `get` or `set`).
pub fn record_store_failure(factory: &'static str, op: &'static str) {
    counter!(CACHE_STORE_FAILURES, "factory" => factory, "op" => op).increment(1);
}

/// Records a deprecated key remap.
pub fn record_deprecation(key: &'static str) {
    counter!(DEPRECATIONS, "key" => key).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_share_prefix() {
        for name in [CACHE_HITS, CACHE_MISSES, CACHE_STORE_FAILURES, DEPRECATIONS, RESOLUTION_DURATION] {
            assert!(name.starts_with("daedalus_metadata_"));
        }
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the facade discards everything.
        describe_metrics();
        record_cache_hit("resource_metadata_collection", "local");
        record_cache_miss("resource_metadata_collection", Duration::from_millis(3));
        record_store_failure("property_metadata", "get");
        record_deprecation("access_control");
    }
}

/// PromQL expressions issued by the gateway
///
/// Scoped queries add an `instance="..."` matcher to every selector. Unscoped
/// queries aggregate across all instances so memory and disk still resolve to
/// a single series and CPU to one series per core label.

/// Filesystems that never count towards disk utilization
const EXCLUDED_FSTYPES: &str = "tmpfs|overlay";

/// Escape a value for use inside a double-quoted PromQL label matcher
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn selector(metric: &str, matchers: &[String]) -> String {
    if matchers.is_empty() {
        metric.to_string()
    } else {
        format!("{}{{{}}}", metric, matchers.join(","))
    }
}

fn with_instance(mut matchers: Vec<String>, instance: Option<&str>) -> Vec<String> {
    if let Some(instance) = instance {
        matchers.push(format!("instance=\"{}\"", escape_label_value(instance)));
    }
    matchers
}

/// Targets of `job` that are currently scraped
pub fn instances_up(job: &str) -> String {
    selector("up", &[format!("job=\"{}\"", escape_label_value(job))])
}

/// Busy percentage per CPU core over the last minute
pub fn cpu_per_core(instance: Option<&str>) -> String {
    let idle = selector(
        "node_cpu_seconds_total",
        &with_instance(vec!["mode=\"idle\"".to_string()], instance),
    );
    let busy = format!("100 - (rate({}[1m]) * 100)", idle);

    match instance {
        Some(_) => busy,
        None => format!("avg by (cpu) ({})", busy),
    }
}

/// Used memory percentage
pub fn memory_used(instance: Option<&str>) -> String {
    let available = selector("node_memory_MemAvailable_bytes", &with_instance(Vec::new(), instance));
    let total = selector("node_memory_MemTotal_bytes", &with_instance(Vec::new(), instance));

    match instance {
        Some(_) => format!("100 * (1 - ({} / {}))", available, total),
        None => format!("100 * (1 - (sum({}) / sum({})))", available, total),
    }
}

/// Used disk percentage over real filesystems
pub fn disk_used(instance: Option<&str>) -> String {
    let fstype = || vec![format!("fstype!~\"{}\"", EXCLUDED_FSTYPES)];
    let available = selector("node_filesystem_avail_bytes", &with_instance(fstype(), instance));
    let size = selector("node_filesystem_size_bytes", &with_instance(fstype(), instance));

    match instance {
        Some(_) => format!("100 * (1 - ({} / {}))", available, size),
        None => format!("100 * (1 - (sum({}) / sum({})))", available, size),
    }
}

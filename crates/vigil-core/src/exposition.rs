//! Prometheus text exposition format (version 0.0.4).
//!
//! The encoder only reads a [`Snapshot`], which is already sorted, so the
//! output for a given snapshot is byte-stable across calls.

use std::fmt::Write;

use crate::metric::Labels;
use crate::snapshot::{FamilySnapshot, SeriesValue, Snapshot};

/// `Content-Type` header value for the encoded body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render every family in the snapshot.
pub fn encode(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for family in &snapshot.families {
        encode_family(family, &mut out);
    }
    out
}

fn encode_family(family: &FamilySnapshot, out: &mut String) {
    let name = &family.name;
    if let Some(help) = &family.help {
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(help));
    }
    let _ = writeln!(out, "# TYPE {} {}", name, family.kind);

    for series in &family.series {
        let labels = label_block(&series.labels, None);
        match &series.value {
            SeriesValue::Counter(v) => {
                let _ = writeln!(out, "{}{} {}", name, labels, v);
            }
            SeriesValue::Gauge(v) => {
                let _ = writeln!(out, "{}{} {}", name, labels, format_float(*v));
            }
            SeriesValue::Histogram(h) => {
                for (bound, count) in &h.buckets {
                    let le = format_float(*bound);
                    let bucket = label_block(&series.labels, Some(le.as_str()));
                    let _ = writeln!(out, "{}_bucket{} {}", name, bucket, count);
                }
                let inf = label_block(&series.labels, Some("+Inf"));
                let _ = writeln!(out, "{}_bucket{} {}", name, inf, h.count);
                let _ = writeln!(out, "{}_sum{} {}", name, labels, format_float(h.sum));
                let _ = writeln!(out, "{}_count{} {}", name, labels, h.count);
            }
        }
    }
}

/// `{k="v",...}` with an optional trailing `le`; empty string when there are no labels.
fn label_block(labels: &Labels, le: Option<&str>) -> String {
    let mut parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{le}\""));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats() {
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(f64::INFINITY), "+Inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_label("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
        assert_eq!(escape_help("line\nnext \"q\""), "line\\nnext \"q\"");
    }

    #[test]
    fn empty_label_block() {
        assert_eq!(label_block(&Labels::new(), None), "");
        assert_eq!(label_block(&Labels::new(), Some("+Inf")), "{le=\"+Inf\"}");
    }
}

//! Parsing of the runtime's delimited text output
//!
//! Listing rows look like `ID|Image|Status|Ports`, usage rows like
//! `Name|CPUPerc|MemUsage` where `MemUsage` is `<used> / <limit>`.
//! Numeric fields never fail a row: anything unparsable becomes `0`.

use crate::model::{Entity, Sample};

pub const FIELD_SEPARATOR: char = '|';

const KIB: f64 = 1.0 / 1024.0;
const BYTE: f64 = KIB / 1024.0;

/// Parse one listing row. Blank rows and rows without an id yield `None`.
pub fn parse_entity_line(line: &str) -> Option<Entity> {
    if line.trim().is_empty() {
        return None;
    }
    let mut fields = line.split(FIELD_SEPARATOR).map(str::trim);
    let id = fields.next().unwrap_or_default();
    if id.is_empty() {
        return None;
    }
    let image = fields.next().unwrap_or_default();
    let status = fields.next().unwrap_or_default();
    let ports = fields.next().unwrap_or_default();
    Some(Entity::new(id, image, status, ports))
}

pub fn parse_entities(output: &str) -> Vec<Entity> {
    output.lines().filter_map(parse_entity_line).collect()
}

/// Parse one usage row. Rows without a name yield `None`.
pub fn parse_usage_line(line: &str) -> Option<Sample> {
    if line.trim().is_empty() {
        return None;
    }
    let mut fields = line.split(FIELD_SEPARATOR).map(str::trim);
    let name = fields.next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    let cpu = fields.next().map(parse_percent).unwrap_or(0.0);
    let mem = fields.next().map(parse_memory_mb).unwrap_or(0.0);
    Some(Sample::new(name, cpu, mem))
}

pub fn parse_samples(output: &str) -> Vec<Sample> {
    output.lines().filter_map(parse_usage_line).collect()
}

/// `"12.5%"` -> `12.5`
pub fn parse_percent(text: &str) -> f64 {
    let trimmed = text.trim().trim_end_matches('%').trim();
    sanitize(trimmed.parse::<f64>().unwrap_or(0.0))
}

/// Used portion of `"<used> / <limit>"` converted to MiB.
///
/// A bare number is read as MiB. An unknown unit suffix is stripped and the
/// number kept as is.
pub fn parse_memory_mb(text: &str) -> f64 {
    let used = text.split('/').next().unwrap_or_default().trim();
    let split_at = used
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(used.len());
    let (number, unit) = used.split_at(split_at);

    let Ok(value) = number.trim().parse::<f64>() else {
        return 0.0;
    };
    let factor = unit_factor(unit.trim()).unwrap_or(1.0);
    sanitize(value * factor)
}

/// Multiplier converting a value in `unit` to MiB
fn unit_factor(unit: &str) -> Option<f64> {
    let factor = match unit {
        "" | "MiB" => 1.0,
        "B" => BYTE,
        "KiB" => KIB,
        "GiB" => 1024.0,
        "TiB" => 1024.0 * 1024.0,
        "kB" | "KB" => 1e3 * BYTE,
        "MB" => 1e6 * BYTE,
        "GB" => 1e9 * BYTE,
        "TB" => 1e12 * BYTE,
        _ => return None,
    };
    Some(factor)
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use csv::Writer;
use log::{debug, info, warn};
use roadcap::aggregate::{analyze_window, window_days, WindowAnalysis};
use roadcap::config::Registry;
use roadcap::constants::{DEFAULT_REGISTRY_PATH, DEFAULT_SINK_DIR};
use roadcap::{Category, Method, NormalizedReading, PipelineOutput};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

struct ReportArgs {
    readings: PathBuf,
    registry: PathBuf,
    segment: String,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
}

fn arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .find_map(|arg| arg.strip_prefix(key))
        .map(str::to_string)
}

fn parse_time(raw: &str, flag: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).with_context(|| format!("{flag} expects an RFC 3339 timestamp, got '{raw}'"))
}

fn parse_args(args: &[String]) -> Result<ReportArgs> {
    let Some(segment) = arg_value(args, "--segment=") else {
        bail!("usage: controller --segment=<id> [--readings=<dir|file>] [--registry=<path>] [--from=<rfc3339>] [--to=<rfc3339>]");
    };
    let from = arg_value(args, "--from=").map(|raw| parse_time(&raw, "--from")).transpose()?;
    let to = arg_value(args, "--to=").map(|raw| parse_time(&raw, "--to")).transpose()?;
    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            bail!("--to ({to}) is before --from ({from})");
        }
    }

    Ok(ReportArgs {
        readings: arg_value(args, "--readings=")
            .map_or_else(|| PathBuf::from(DEFAULT_SINK_DIR), PathBuf::from),
        registry: arg_value(args, "--registry=")
            .map_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH), PathBuf::from),
        segment,
        from,
        to,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Window report controller starting...");

    let args: Vec<String> = env::args().collect();
    let args = parse_args(&args)?;

    let registry = Registry::load(&args.registry)
        .with_context(|| format!("failed to load registry {}", args.registry.display()))?;
    let Some(profile) = registry.segment(&args.segment) else {
        bail!("segment '{}' is not in the registry", args.segment);
    };

    let readings = load_readings(&args.readings)?;
    let readings = select_readings(readings, &args.segment, args.from, args.to);
    if readings.is_empty() {
        warn!("No readings for {} in the requested window", args.segment);
    }

    let Some((start, end)) = window_bounds(&readings, args.from, args.to) else {
        info!("Nothing to report");
        return Ok(());
    };
    let days = window_days(&start, &end);
    info!(
        "Analysing {} readings for {} from {} to {} ({} days)",
        readings.len(),
        profile.segment_id,
        start.to_rfc3339(),
        end.to_rfc3339(),
        days
    );

    let analyses: Vec<WindowAnalysis> = Method::ALL
        .iter()
        .map(|&method| analyze_window(&readings, profile, days, method))
        .collect();

    for analysis in &analyses {
        let summary = &analysis.summary;
        let unit = summary.method.flow_unit();
        let peak = summary
            .peak_hour
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| format!("{} ({:.1} {unit})", p.label, p.flow));
        info!(
            "{}: {:.1} veh/day, {:.1} {unit}/day, peak {}, capacity {:.0} {unit}/h, DS {:.3}, LoS {} - {}",
            summary.method,
            summary.daily_volume,
            summary.daily_flow,
            peak,
            analysis.capacity,
            analysis.degree_of_saturation,
            analysis.los,
            analysis.los_description
        );
        if !summary.unmapped_classes.is_empty() {
            warn!(
                "{}: unmapped classes {:?} counted as light vehicles",
                summary.method, summary.unmapped_classes
            );
        }
    }

    generate_window_csv(&analyses, &start, &end)?;

    info!("Window report complete");
    Ok(())
}

/// Persisted readings from one `.jsonl` file or every `readings_*.jsonl`
/// file in a directory. Lines that do not parse are skipped.
fn load_readings(source: &Path) -> Result<Vec<NormalizedReading>> {
    let files = if source.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(source)
            .with_context(|| format!("failed to read {}", source.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("readings_") && name.ends_with(".jsonl"))
            })
            .collect();
        files.sort();
        files
    } else {
        vec![source.to_path_buf()]
    };

    let mut readings = Vec::new();
    for file in &files {
        let contents = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let before = readings.len();
        readings.extend(parse_lines(&contents, file));
        debug!("Loaded {} readings from {}", readings.len() - before, file.display());
    }
    Ok(readings)
}

fn parse_lines(contents: &str, file: &Path) -> Vec<NormalizedReading> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<PipelineOutput>(line) {
            Ok(output) => Some(output.reading),
            Err(e) => {
                warn!("{}:{}: skipping malformed reading: {}", file.display(), n + 1, e);
                None
            }
        })
        .collect()
}

fn select_readings(
    readings: Vec<NormalizedReading>,
    segment: &str,
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
) -> Vec<NormalizedReading> {
    let mut selected: Vec<NormalizedReading> = readings
        .into_iter()
        .filter(|r| r.segment_id == segment)
        .filter(|r| from.map_or(true, |from| r.timestamp >= from))
        .filter(|r| to.map_or(true, |to| r.timestamp <= to))
        .collect();
    selected.sort_by_key(|r| r.timestamp);
    selected
}

/// Requested bounds, or the span of the selected readings.
fn window_bounds(
    readings: &[NormalizedReading],
    from: Option<DateTime<FixedOffset>>,
    to: Option<DateTime<FixedOffset>>,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let start = from.or_else(|| readings.first().map(|r| r.timestamp))?;
    let end = to.or_else(|| readings.last().map(|r| r.timestamp))?;
    Some((start, end))
}

fn generate_window_csv(
    analyses: &[WindowAnalysis],
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
) -> Result<()> {
    let Some(first) = analyses.first() else {
        return Ok(());
    };

    fs::create_dir_all("logs")?;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("logs/window_{}_{}.csv", first.segment_id, timestamp);

    let mut writer = Writer::from_path(&filename)
        .with_context(|| format!("failed to create CSV file {filename}"))?;
    write_rows(&mut writer, analyses, start, end)?;
    writer.flush()?;

    info!("Window report saved to {}", filename);
    Ok(())
}

fn write_rows<W: std::io::Write>(
    writer: &mut Writer<W>,
    analyses: &[WindowAnalysis],
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
) -> Result<()> {
    writer.write_record([
        "segment_id",
        "method",
        "flow_unit",
        "from",
        "to",
        "days",
        "readings",
        "total_vehicles",
        "two_wheeler",
        "light",
        "heavy",
        "non_motorized",
        "standardized_flow",
        "daily_volume",
        "daily_flow",
        "peak_hour",
        "peak_flow",
        "base_capacity",
        "lane_width_factor",
        "directional_split_factor",
        "side_friction_factor",
        "city_size_factor",
        "capacity",
        "degree_of_saturation",
        "los",
        "los_description",
    ])?;

    for analysis in analyses {
        let summary = &analysis.summary;
        let factors = &analysis.factors;
        let tables = summary.method.tables();
        let count = |category: Category| {
            format!(
                "{} {}",
                summary.counts.get(category),
                tables.category_code(category)
            )
        };

        writer.write_record([
            analysis.segment_id.clone(),
            summary.method.to_string(),
            summary.method.flow_unit().to_string(),
            start.to_rfc3339(),
            end.to_rfc3339(),
            summary.days.to_string(),
            summary.readings.to_string(),
            summary.total_vehicles.to_string(),
            count(Category::TwoWheeler),
            count(Category::Light),
            count(Category::Heavy),
            count(Category::NonMotorized),
            format!("{:.2}", summary.standardized_flow),
            format!("{:.2}", summary.daily_volume),
            format!("{:.2}", summary.daily_flow),
            summary
                .peak_hour
                .as_ref()
                .map(|p| p.label.clone())
                .unwrap_or_default(),
            summary
                .peak_hour
                .as_ref()
                .map(|p| format!("{:.2}", p.flow))
                .unwrap_or_default(),
            format!("{:.0}", factors.base_capacity),
            factors.lane_width.to_string(),
            factors.directional_split.to_string(),
            factors.side_friction.to_string(),
            factors.city_size.to_string(),
            format!("{:.2}", analysis.capacity),
            format!("{:.4}", analysis.degree_of_saturation),
            analysis.los.to_string(),
            analysis.los_description.clone(),
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use roadcap::telemetry::parse_payload;

    const REGISTRY: &str = r#"{
        "segments": [{
            "segment_id": "SEG-A",
            "road_type": "urban",
            "lane_config": "4/2UD",
            "lane_width_m": 8,
            "directional_split": "55-45",
            "friction_type": "shoulder",
            "friction_class": "M",
            "city_size_millions": 0.8,
            "utc_offset_hours": 7
        }],
        "sensors": [{
            "api_key": "ka",
            "segment_id": "SEG-A",
            "sensor_id": "CAM-A",
            "zones": [{ "zone_id": "Z1", "direction": "west" }]
        }]
    }"#;

    fn output(hour: u32) -> PipelineOutput {
        let registry = Registry::from_json(REGISTRY).unwrap();
        let payload = parse_payload(
            r#"<Root><API>ka</API><Message><Body IntervalTime="300"><Zone ZoneId="1"><Class ClassNr="1" NumVeh="20" Speed="30" GapTime="2"/><Class ClassNr="2" NumVeh="10" Speed="30" GapTime="2"/></Zone></Body></Message></Root>"#,
        )
        .unwrap();
        let (profile, zones) = registry.resolve("ka").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 5, 1, hour, 0, 0).unwrap();
        roadcap::process_payload(&payload, zones, profile, at).unwrap()
    }

    fn jsonl(outputs: &[PipelineOutput]) -> String {
        outputs
            .iter()
            .map(|o| serde_json::to_string(o).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let contents = format!("{}\nnot json\n\n{}", jsonl(&[output(1)]), jsonl(&[output(2)]));
        let readings = parse_lines(&contents, Path::new("readings_test.jsonl"));
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn selection_filters_segment_and_range() {
        let mut other = output(3).reading;
        other.segment_id = "SEG-B".to_string();
        let readings = vec![output(5).reading, output(1).reading, other, output(9).reading];

        let from = DateTime::parse_from_rfc3339("2025-05-01T09:00:00+07:00").unwrap();
        let selected = select_readings(readings.clone(), "SEG-A", Some(from), None);
        assert_eq!(selected.len(), 2);
        assert!(selected[0].timestamp < selected[1].timestamp);

        let all = select_readings(readings, "SEG-A", None, None);
        assert_eq!(all.len(), 3);
        let (start, end) = window_bounds(&all, None, None).unwrap();
        assert_eq!(start, all[0].timestamp);
        assert_eq!(end, all[2].timestamp);
        assert!(window_bounds(&[], None, None).is_none());
    }

    #[test]
    fn csv_has_one_row_per_method() {
        let registry = Registry::from_json(REGISTRY).unwrap();
        let profile = registry.segment("SEG-A").unwrap();
        let readings = vec![output(1).reading, output(2).reading];
        let analyses: Vec<_> = Method::ALL
            .iter()
            .map(|&m| analyze_window(&readings, profile, 1, m))
            .collect();

        let mut writer = Writer::from_writer(Vec::new());
        let start = readings[0].timestamp;
        let end = readings[1].timestamp;
        write_rows(&mut writer, &analyses, &start, &end).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("SEG-A,MKJI 1997,smp,"));
        assert!(lines[2].starts_with("SEG-A,PKJI 2023,skr,"));
        assert!(lines[1].contains("40 MC"));
        assert!(lines[2].contains("40 SM"));
    }

    #[test]
    fn args_require_segment_and_ordered_range() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(parse_args(&args(&["controller"])).is_err());
        assert!(parse_args(&args(&[
            "controller",
            "--segment=SEG-A",
            "--from=2025-05-02T00:00:00+07:00",
            "--to=2025-05-01T00:00:00+07:00",
        ]))
        .is_err());

        let parsed = parse_args(&args(&["controller", "--segment=SEG-A", "--readings=data"])).unwrap();
        assert_eq!(parsed.segment, "SEG-A");
        assert_eq!(parsed.readings, PathBuf::from("data"));
        assert_eq!(parsed.registry, PathBuf::from(DEFAULT_REGISTRY_PATH));
        assert!(parsed.from.is_none());
    }
}

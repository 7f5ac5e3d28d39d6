//! Command implementations shared by the subcommands and the interactive
//! menu. Rendering is kept separate from I/O so output can be tested.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use campus_fares_analytics::config::{load_config, load_config_from_env};
use campus_fares_analytics_models::{AnalyticsConfig, FareAssessment, PlaceFareSummary};
use campus_fares_cli_utils::{IndicatifProgress, MultiProgress};
use campus_fares_fare_models::{FareRecord, FareVerdict, HistogramBucket, NewFareRecord, PlaceActivity};
use campus_fares_ingest::{ImportStats, import_csv_file};
use campus_fares_server::ServerOptions;
use campus_fares_store::FareStore;
use campus_fares_store::partitions::{FarePartitions, StoreBackend, partition_name};

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const HISTOGRAM_WIDTH: u64 = 40;

/// The identity, store and configuration a command runs against.
pub struct Session {
    /// Partition name the session reads and writes.
    pub identity: String,
    /// Backend the store was opened with.
    pub backend: StoreBackend,
    /// Store for [`Self::identity`].
    pub store: Arc<dyn FareStore>,
    /// Analytics knobs.
    pub config: AnalyticsConfig,
}

impl Session {
    /// Opens the partition for `identity`.
    ///
    /// `config_path` takes precedence over `CAMPUS_FARES_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the store cannot be
    /// opened.
    pub fn open(
        identity: Option<&str>,
        config_path: Option<&Path>,
        memory: bool,
    ) -> CliResult<Self> {
        let config = match config_path {
            Some(path) => load_config(Some(path))?,
            None => load_config_from_env()?,
        };
        let backend = if memory {
            StoreBackend::Memory
        } else {
            StoreBackend::default_duckdb()
        };

        let identity = partition_name(identity);
        let partitions = FarePartitions::new(backend.clone());
        let store = partitions.store_for(Some(&identity))?;

        Ok(Self {
            identity,
            backend,
            store,
            config,
        })
    }
}

/// Stores one fare in the session's partition.
///
/// # Errors
///
/// Returns an error if the fare is invalid or the store fails.
pub fn submit(
    session: &Session,
    place_key: &str,
    amount: f64,
    submitter: Option<&str>,
) -> CliResult<FareRecord> {
    let mut input = NewFareRecord::new(place_key, amount);
    if let Some(submitter) = submitter {
        input = input.with_submitter(submitter);
    }
    let record = session.store.append(input)?;
    log::info!(
        "Recorded {} for '{}' in partition '{}'",
        record.amount,
        record.place_key,
        session.identity
    );
    Ok(record)
}

/// Imports a CSV file into the session's partition with a progress bar.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the store fails.
pub fn import(session: &Session, multi: &MultiProgress, path: &Path) -> CliResult<ImportStats> {
    let progress = IndicatifProgress::rows_bar(multi, "Importing fares");
    Ok(import_csv_file(path, session.store.as_ref(), &progress)?)
}

/// Starts the API server with the session's backend and config.
///
/// # Errors
///
/// Returns an error if the server cannot bind or fails while running.
pub async fn serve(session: Session, bind: Option<String>, port: Option<u16>) -> CliResult<()> {
    let Session {
        backend,
        config,
        store,
        ..
    } = session;
    // The server opens its own partitions; release this one's file first.
    drop(store);

    let mut options = ServerOptions::from_env()?;
    options.backend = backend;
    options.config = config;
    if let Some(bind) = bind {
        options.bind_addr = bind;
    }
    if let Some(port) = port {
        options.port = port;
    }

    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(campus_fares_server::run_server_with(options))
    })
    .await??;

    Ok(())
}

/// One-line description of a stored record.
#[must_use]
pub fn render_record(record: &FareRecord) -> String {
    format!(
        "{}  {:>10.2}  {}  {}",
        record.submitted_at.format("%Y-%m-%d %H:%M"),
        record.amount,
        record.submitter_id,
        record.id
    )
}

/// Lists the raw records for a place.
#[must_use]
pub fn render_fares(place_key: &str, records: &[FareRecord]) -> String {
    if records.is_empty() {
        return format!("No fares recorded for '{place_key}' yet.");
    }

    let mut out = format!("{} fare(s) for '{place_key}':\n", records.len());
    for record in records {
        let _ = writeln!(out, "  {}", render_record(record));
    }
    out
}

/// Human-readable place summary with a text histogram.
#[must_use]
pub fn render_summary(summary: &PlaceFareSummary) -> String {
    let stats = &summary.statistics;
    if stats.is_empty() {
        return format!("No fares recorded for '{}' yet.", summary.place_key);
    }

    let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));

    let mut out = String::new();
    let _ = writeln!(out, "Place:     {}", summary.place_key);
    let _ = writeln!(out, "Fares:     {}", stats.total_fares);
    let _ = writeln!(
        out,
        "Average:   {}   Median: {}   Mode: {}",
        show(stats.average_fare),
        show(stats.median_fare),
        show(stats.mode_fare)
    );
    let _ = writeln!(
        out,
        "Range:     {} - {}   Std dev: {}",
        show(stats.min_fare),
        show(stats.max_fare),
        show(stats.standard_deviation)
    );
    if let Some(insight) = &summary.insight {
        let _ = writeln!(
            out,
            "Consensus: {}   Reliability: {}",
            insight.consensus, insight.reliability
        );
    }
    if let Some(peak) = summary.curve.peak() {
        let _ = writeln!(out, "Curve peak near {:.2}", peak.amount);
    }
    out.push('\n');
    out.push_str(&render_histogram(&stats.distribution));
    out
}

/// Horizontal bar chart of a histogram, scaled to the busiest bucket.
#[must_use]
pub fn render_histogram(distribution: &[HistogramBucket]) -> String {
    let Some(max) = distribution.iter().map(|b| b.count).max() else {
        return String::new();
    };

    let mut out = String::new();
    for bucket in distribution {
        let len = (bucket.count * HISTOGRAM_WIDTH).div_ceil(max.max(1));
        let bar = "#".repeat(usize::try_from(len).unwrap_or(0));
        let _ = writeln!(out, "{:>10.2} | {bar} {}", bucket.amount, bucket.count);
    }
    out
}

/// Sentence describing a fare verdict.
#[must_use]
pub fn render_assessment(assessment: &FareAssessment) -> String {
    let Some(verdict) = assessment.verdict else {
        return format!(
            "No fares recorded for '{}' yet, nothing to compare {:.2} against.",
            assessment.place_key, assessment.amount
        );
    };

    let phrase = match verdict {
        FareVerdict::BelowTypical => "cheaper than usual",
        FareVerdict::Typical => "about usual",
        FareVerdict::AboveTypical => "more than usual",
    };

    let mut out = format!(
        "{:.2} to '{}' is {phrase} ({verdict})",
        assessment.amount, assessment.place_key
    );
    if let Some(average) = assessment.average_fare {
        let _ = write!(
            out,
            ": average {average:.2} over {} fare(s)",
            assessment.total_fares
        );
    }
    if let Some(z) = assessment.z_score {
        let _ = write!(out, ", z = {z:.2}");
    }
    out
}

/// Table of places with data.
#[must_use]
pub fn render_places(places: &[PlaceActivity]) -> String {
    if places.is_empty() {
        return "No fares recorded yet.".to_string();
    }

    let mut out = format!("{:<24} {:>6}  LAST SUBMITTED\n", "PLACE", "FARES");
    let _ = writeln!(out, "{}", "-".repeat(50));
    for place in places {
        let _ = writeln!(
            out,
            "{:<24} {:>6}  {}",
            place.place_key,
            place.fare_count,
            place.last_submitted_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use campus_fares_analytics::summary::{assess, places_with_data, summarize};
    use campus_fares_store::memory::MemoryFareStore;

    use super::*;

    fn memory_session() -> Session {
        Session {
            identity: "anonymous".to_string(),
            backend: StoreBackend::Memory,
            store: Arc::new(MemoryFareStore::new()),
            config: AnalyticsConfig::default(),
        }
    }

    fn seeded_session() -> Session {
        let session = memory_session();
        for amount in [45.0, 50.0, 42.0, 48.0, 55.0, 38.0] {
            submit(&session, "sangam", amount, None).unwrap();
        }
        session
    }

    #[test]
    fn submit_rejects_invalid_fare() {
        let session = memory_session();
        assert!(submit(&session, "sangam", -5.0, None).is_err());
        assert!(submit(&session, "", 5.0, None).is_err());
        assert!(session.store.list_all().unwrap().is_empty());
    }

    #[test]
    fn submit_keeps_submitter() {
        let session = memory_session();
        let record = submit(&session, "sangam", 40.0, Some("u1")).unwrap();
        assert_eq!(record.submitter_id, "u1");
        assert!(render_record(&record).contains("40.00"));
    }

    #[test]
    fn summary_lists_statistics_and_histogram() {
        let session = seeded_session();
        let summary = summarize(session.store.as_ref(), "sangam", &session.config).unwrap();
        let text = render_summary(&summary);

        assert!(text.contains("Fares:     6"));
        assert!(text.contains("Range:     38.00 - 55.00"));
        assert!(text.contains("Reliability: High"));
        assert_eq!(text.lines().filter(|l| l.contains(" | #")).count(), 6);
    }

    #[test]
    fn summary_of_unknown_place() {
        let session = memory_session();
        let summary = summarize(session.store.as_ref(), "nowhere", &session.config).unwrap();
        assert_eq!(
            render_summary(&summary),
            "No fares recorded for 'nowhere' yet."
        );
    }

    #[test]
    fn histogram_scales_to_busiest_bucket() {
        let text = render_histogram(&[
            HistogramBucket {
                amount: 10.0,
                count: 1,
            },
            HistogramBucket {
                amount: 20.0,
                count: 4,
            },
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(&format!("{} 1", "#".repeat(10))));
        assert!(lines[1].ends_with(&format!("{} 4", "#".repeat(40))));
        assert!(render_histogram(&[]).is_empty());
    }

    #[test]
    fn assessment_sentence() {
        let session = seeded_session();
        let assessment = assess(session.store.as_ref(), "sangam", 90.0, &session.config).unwrap();
        let text = render_assessment(&assessment);
        assert!(text.contains("more than usual"));
        assert!(text.contains("ABOVE_TYPICAL"));

        let none = assess(session.store.as_ref(), "nowhere", 90.0, &session.config).unwrap();
        assert!(render_assessment(&none).starts_with("No fares recorded"));
    }

    #[test]
    fn places_table() {
        let session = seeded_session();
        submit(&session, "library", 10.0, None).unwrap();
        let text = render_places(&places_with_data(session.store.as_ref()).unwrap());

        let rows: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("sangam"));
        assert!(rows[1].starts_with("library"));
        assert_eq!(render_places(&[]), "No fares recorded yet.");
    }

    #[test]
    fn fares_listing() {
        let session = seeded_session();
        let records = session.store.list_by_place("sangam").unwrap();
        let text = render_fares("sangam", &records);
        assert!(text.starts_with("6 fare(s) for 'sangam'"));
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn imports_csv_into_session() {
        let dir = std::env::temp_dir().join("campus_fares_cli_import");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fares.csv");
        std::fs::write(&path, "place_key,amount\nsangam,40\nsangam,oops\nlibrary,12\n").unwrap();

        let session = memory_session();
        let stats = import(&session, &MultiProgress::new(), &path).unwrap();

        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(session.store.list_all().unwrap().len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

use anyhow::{Context, Result};
use log::{error, info, warn};
use roadcap::constants::{receiver_address, DEFAULT_PAYLOAD_DIR, DEFAULT_SEND_INTERVAL_MS};
use roadcap::{receive_message, send_message, Message, TelemetryMessage};
use std::env;
use std::path::{Path, PathBuf};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

fn arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .find_map(|arg| arg.strip_prefix(key))
        .map(str::to_string)
}

/// Telemetry documents in `dir`, sorted by file name.
fn payload_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read payload directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
        .collect();
    files.sort();
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Sensor sender starting...");

    let args: Vec<String> = env::args().collect();
    let payload_dir = arg_value(&args, "--dir=").unwrap_or_else(|| DEFAULT_PAYLOAD_DIR.to_string());
    let address = arg_value(&args, "--address=").unwrap_or_else(receiver_address);
    let interval_ms = match arg_value(&args, "--interval-ms=") {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid --interval-ms value '{raw}'"))?,
        None => DEFAULT_SEND_INTERVAL_MS,
    };
    let rounds = match arg_value(&args, "--rounds=") {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("invalid --rounds value '{raw}'"))?,
        None => 1,
    };

    let files = payload_files(Path::new(&payload_dir))?;
    if files.is_empty() {
        warn!("No .xml payloads found in {}", payload_dir);
        return Ok(());
    }
    info!("Replaying {} payloads x{} every {}ms", files.len(), rounds, interval_ms);

    let mut stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("failed to connect to receiver at {address}"))?;
    info!("Connected to receiver at {}", address);

    let client = env::var("HOSTNAME").unwrap_or_else(|_| "sensor-sender".to_string());
    send_message(&mut stream, &Message::Hello { client }).await?;

    let mut sequence_id = 0u64;
    let mut rejected = 0u64;

    for _ in 0..rounds {
        for path in &files {
            let payload = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;

            send_message(&mut stream, &Message::Telemetry(TelemetryMessage { sequence_id, payload }))
                .await?;

            match receive_message::<Message, _>(&mut stream).await? {
                Message::Analysis(analysis) => {
                    let output = &analysis.output;
                    info!(
                        "#{} {} -> {}: MKJI LoS {} ({}), PKJI LoS {} ({})",
                        analysis.sequence_id,
                        path.display(),
                        output.reading.segment_id,
                        output.mkji.los,
                        output.mkji.los_description,
                        output.pkji.los,
                        output.pkji.los_description,
                    );
                    if !output.anomalies.is_empty() {
                        warn!("#{} zone anomalies: {:?}", analysis.sequence_id, output.anomalies);
                    }
                }
                Message::Rejected { sequence_id, reason } => {
                    rejected += 1;
                    error!("#{} {} rejected: {}", sequence_id, path.display(), reason);
                }
                other => warn!("Unexpected reply: {:?}", other),
            }

            sequence_id += 1;
            sleep(Duration::from_millis(interval_ms)).await;
        }
    }

    send_message(&mut stream, &Message::Shutdown).await?;
    info!("Sensor sender finished: {} sent, {} rejected", sequence_id, rejected);
    Ok(())
}

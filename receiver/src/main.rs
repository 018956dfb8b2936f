mod sink;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use roadcap::config::Registry;
use roadcap::constants::{receiver_bind_address, DEFAULT_REGISTRY_PATH, DEFAULT_SINK_DIR};
use roadcap::telemetry::parse_payload;
use roadcap::{
    process_payload, receive_message, send_message, AnalysisMessage, Message, PipelineOutput,
    TelemetryMessage,
};
use sink::JsonLinesSink;
use std::collections::HashMap;
use std::env;
use std::error;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

#[derive(Clone)]
struct SharedState {
    registry: Arc<Registry>,
    sink: Arc<JsonLinesSink>,
    last_seen: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl SharedState {
    fn new(registry: Registry, sink: JsonLinesSink) -> Self {
        Self {
            registry: Arc::new(registry),
            sink: Arc::new(sink),
            last_seen: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

fn arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .find_map(|arg| arg.strip_prefix(key))
        .map(str::to_string)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Telemetry receiver starting...");

    let args: Vec<String> = env::args().collect();
    let registry_path =
        arg_value(&args, "--registry=").unwrap_or_else(|| DEFAULT_REGISTRY_PATH.to_string());
    let sink_dir = arg_value(&args, "--sink=").unwrap_or_else(|| DEFAULT_SINK_DIR.to_string());
    let bind_address = arg_value(&args, "--bind=").unwrap_or_else(receiver_bind_address);

    let registry = Registry::load(&registry_path)
        .with_context(|| format!("failed to load registry {registry_path}"))?;
    let sink = JsonLinesSink::new(&sink_dir)?;
    info!("Persisting readings under {}", sink.dir().display());

    let state = SharedState::new(registry, sink);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!("Listening for sensor gateways on {}", bind_address);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("New connection from {}", addr);
                    let state = state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, state).await {
                            error!("Connection {} failed: {}", addr, e);
                        }
                    });
                }
                Err(e) => error!("Failed to accept connection: {}", e),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    let seen = state.last_seen.lock().await;
    for (sensor, at) in seen.iter() {
        info!("Sensor {} last reported at {}", sensor, at.to_rfc3339());
    }

    info!("Telemetry receiver stopped");
    Ok(())
}

async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    state: SharedState,
) -> Result<(), Box<dyn error::Error + Send + Sync>> {
    let mut processed = 0u64;

    loop {
        let message = match receive_message::<Message, _>(&mut stream).await {
            Ok(message) => message,
            Err(roadcap::Error::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                info!("{} disconnected after {} readings", addr, processed);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        match message {
            Message::Hello { client } => {
                info!("Gateway {} connected from {}", client, addr);
            }
            Message::Telemetry(telemetry) => {
                let reply = handle_telemetry(&telemetry, &state);
                if matches!(reply, Message::Analysis(_)) {
                    processed += 1;
                }
                send_message(&mut stream, &reply).await?;
            }
            Message::Shutdown => {
                info!("{} closed the session after {} readings", addr, processed);
                return Ok(());
            }
            other => {
                warn!("Unexpected message from {}: {:?}", addr, other);
            }
        }
    }
}

fn handle_telemetry(telemetry: &TelemetryMessage, state: &SharedState) -> Message {
    let received_at = Utc::now();

    let result = parse_payload(&telemetry.payload).and_then(|payload| {
        let (profile, zones) = state.registry.resolve(&payload.api_key)?;
        process_payload(&payload, zones, profile, received_at)
    });

    match result {
        Ok(output) => {
            info!(
                "#{} {}: {} vehicles, MKJI {:.0} smp/h DS {:.2} LoS {}, PKJI {:.0} skr/h DS {:.2} LoS {}",
                telemetry.sequence_id,
                output.reading.segment_id,
                output.reading.total_vehicles,
                output.mkji.hourly_flow,
                output.mkji.degree_of_saturation,
                output.mkji.los,
                output.pkji.hourly_flow,
                output.pkji.degree_of_saturation,
                output.pkji.los,
            );
            record(state, &output, received_at);
            Message::Analysis(AnalysisMessage {
                sequence_id: telemetry.sequence_id,
                output: Box::new(output),
            })
        }
        Err(e) => {
            warn!("Rejected telemetry #{}: {}", telemetry.sequence_id, e);
            Message::Rejected {
                sequence_id: telemetry.sequence_id,
                reason: e.to_string(),
            }
        }
    }
}

/// Persistence and last-seen bookkeeping run detached; failures are logged
/// and never reach the sensor.
fn record(state: &SharedState, output: &PipelineOutput, received_at: DateTime<Utc>) {
    let sink = Arc::clone(&state.sink);
    let persisted = output.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = sink.append(&persisted) {
            error!(
                "Failed to persist reading for {}: {:#}",
                persisted.reading.segment_id, e
            );
        }
    });

    let last_seen = Arc::clone(&state.last_seen);
    let sensor_id = output.reading.sensor_id.clone();
    tokio::spawn(async move {
        let mut guard = last_seen.lock().await;
        if let Some(previous) = guard.insert(sensor_id.clone(), received_at) {
            debug!(
                "Sensor {} previous report {}s ago",
                sensor_id,
                (received_at - previous).num_seconds()
            );
        }
    });
}

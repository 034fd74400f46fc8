//! Replay command implementation.
//!
//! A script is a JSON array of requests in their serde form, e.g.
//!
//! ```json
//! [
//!   { "contents": { "authenticate": { "auth_token": "x" } } },
//!   { "contents": { "get_updates": { "from_timestamp": 0, "requested_types": { "bookmark": [] } } } }
//! ]
//! ```
//!
//! Each request is encoded and pushed through the same byte-level entry
//! point a transport would use.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use trellis_protocol::{
    ClientToServerMessage, ClientToServerResponse, ProtocolError, ResponseContents,
};
use trellis_server::{ServerConfig, SyncServer, STATUS_OK};

/// Errors that abort a replay.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// The script could not be read.
    #[error("cannot read script {path}: {source}")]
    Io {
        /// Script path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The script is not a JSON array of requests.
    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),

    /// A request or response failed to round-trip through CBOR.
    #[error("request {index}: {source}")]
    Codec {
        /// Position in the script.
        index: usize,
        /// Underlying error.
        source: ProtocolError,
    },
}

/// Outcome of one scripted request.
#[derive(Debug, Serialize)]
pub struct ReplayStep {
    /// Position in the script.
    pub index: usize,
    /// Envelope kind.
    pub kind: &'static str,
    /// Transport status.
    pub status: u16,
    /// Decoded response, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ClientToServerResponse>,
}

/// Everything a replay produced.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Per-request outcomes, in script order.
    pub steps: Vec<ReplayStep>,
    /// Store birthday of the server.
    pub store_birthday: String,
    /// Last assigned version.
    pub version: u64,
    /// Stored entities, tombstones included.
    pub entity_count: usize,
}

/// Parses a script.
pub fn parse_script(json: &str) -> Result<Vec<ClientToServerMessage>, ReplayError> {
    Ok(serde_json::from_str(json)?)
}

/// Sends every request to `server` in order.
pub fn replay(
    server: &SyncServer,
    requests: &[ClientToServerMessage],
) -> Result<ReplayReport, ReplayError> {
    let mut steps = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let bytes = request
            .encode()
            .map_err(|source| ReplayError::Codec { index, source })?;
        let (status, body) = server.handle_command(&bytes);
        let response = if status == STATUS_OK {
            Some(
                ClientToServerResponse::decode(&body)
                    .map_err(|source| ReplayError::Codec { index, source })?,
            )
        } else {
            None
        };
        steps.push(ReplayStep {
            index,
            kind: request.contents.kind(),
            status,
            response,
        });
    }

    Ok(ReplayReport {
        steps,
        store_birthday: server.store_birthday(),
        version: server.version(),
        entity_count: server.entity_count(),
    })
}

/// Runs the replay command.
pub fn run(script: &Path, config: ServerConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(script).map_err(|source| ReplayError::Io {
        path: script.display().to_string(),
        source,
    })?;
    let requests = parse_script(&json)?;
    info!(requests = requests.len(), "replaying script");

    let server = SyncServer::new(config);
    let report = replay(&server, &requests)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(&report);
        }
    }

    Ok(())
}

fn print_text_output(report: &ReplayReport) {
    println!("Trellis Replay");
    println!("==============");
    println!();
    for step in &report.steps {
        println!("[{}] {} -> {}", step.index, step.kind, step.status);
        let Some(response) = &step.response else {
            continue;
        };
        match &response.contents {
            ResponseContents::Authenticate(auth) => {
                println!("  user: {} <{}>", auth.user.display_name, auth.user.email);
            }
            ResponseContents::Commit(commit) => {
                for entry in &commit.entry_responses {
                    match (&entry.id_string, &entry.error_message) {
                        (_, Some(message)) => println!("  CONFLICT {message}"),
                        (Some(id), None) => match entry.version {
                            Some(version) => println!("  SUCCESS {id} v{version}"),
                            None => println!("  SUCCESS {id} (deleted)"),
                        },
                        (None, None) => println!("  {:?}", entry.response_type),
                    }
                }
            }
            ResponseContents::GetUpdates(updates) => {
                match updates.new_timestamp {
                    Some(timestamp) => println!("  new timestamp: {timestamp}"),
                    None => println!("  up to date"),
                }
                for entity in &updates.entries {
                    let marker = if entity.deleted { " (deleted)" } else { "" };
                    println!("  {} v{} {:?}{}", entity.id_string, entity.version, entity.name, marker);
                }
            }
        }
    }
    println!();
    println!("Store:");
    println!("  Birthday: {}", report.store_birthday);
    println!("  Version:  {}", report.version);
    println!("  Entities: {}", report.entity_count);
}

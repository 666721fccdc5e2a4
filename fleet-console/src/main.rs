//! fleet-console: live message console and log browser for device fleets
//!
//! Two backend surfaces: a WebSocket message stream (watched and written
//! via `watch`/`send`) and an HTTP log API (`devices`, `dates`, `tail`,
//! `view`, `list`, `download`).

mod api;
mod cli;
mod commands;
mod config;
mod history;
mod mux;
mod render;
mod transport;
mod viewer;

use std::path::PathBuf;

use clap::Parser;

use fleet_protocol::{ServerFrame, SYSTEM_TAG};
use fleet_utils::{init_logging_with_config, ConsoleError, LogConfig, Result};

use api::ApiClient;
use cli::{Cli, Command};
use commands::Outbound;
use config::ConsoleConfig;
use history::SendHistory;
use mux::Multiplexer;
use transport::{ConnectionState, Transport};
use viewer::LogViewer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `watch` owns the terminal, so its logs go to a file instead
    let log_config = match cli.command {
        Command::Watch { .. } => LogConfig::watch(),
        _ => LogConfig::cli(),
    };
    if let Err(e) = init_logging_with_config(log_config) {
        eprintln!("warning: logging disabled: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<()> {
    fleet_utils::paths::ensure_all_dirs()?;

    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::load_from(path)?,
        None => ConsoleConfig::load()?,
    };
    if let Some(host) = cli.host {
        config.host = host;
    }

    match cli.command {
        Command::Watch { clients } => watch(&config, clients).await,
        Command::Send { target, message } => send(&config, &target, &message).await,
        Command::Devices => devices(&config).await,
        Command::Dates { sn } => dates(&config, &sn).await,
        Command::Tail { sn, date } => tail(&config, &sn, &date).await,
        Command::View { name } => view(&config, &name).await,
        Command::List => list(&config).await,
        Command::Download { name, dest } => download(&config, &name, dest).await,
    }
}

/// Follow the live stream, printing visible messages as they arrive.
/// Payloads pass through untouched so device escape sequences render
/// natively in the terminal.
async fn watch(config: &ConsoleConfig, only_clients: Vec<String>) -> Result<()> {
    let (transport, mut handle) = Transport::new(config.ws_url(), config.reconnect_policy());
    let transport_task = tokio::spawn(transport.run());

    let mut mux = Multiplexer::new(config.system_phrases.clone());
    let mut pinned_filter = !only_clients.is_empty();
    let mut last_state = *handle.status.borrow();
    println!("* {}", last_state);

    loop {
        tokio::select! {
            event = handle.events.recv() => {
                let Some(frame) = event else { break };
                match frame {
                    ServerFrame::ClientUpdate { clients } => {
                        if mux.apply_client_update(clients) {
                            if pinned_filter {
                                mux.select_all(false);
                                for id in &only_clients {
                                    mux.set_visibility(id, true);
                                }
                                pinned_filter = false;
                            }
                            println!("* clients: {}", mux.clients().join(", "));
                        }
                    }
                    ServerFrame::Message { addr, data } => {
                        if mux.record_message(addr.clone(), data.clone()) {
                            if addr == SYSTEM_TAG {
                                println!("* {}", data);
                            } else {
                                println!("[{}] {}", addr, data);
                            }
                        }
                    }
                }
            }
            changed = handle.status.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *handle.status.borrow();
                if state != last_state {
                    println!("* {}", state);
                    last_state = state;
                }
                if state == ConnectionState::ReconnectExhausted {
                    break;
                }
            }
        }
    }

    match transport_task.await {
        Ok(result) => result,
        Err(e) => Err(ConsoleError::internal(format!("transport task: {}", e))),
    }
}

/// Connect, send one command, and disconnect
async fn send(config: &ConsoleConfig, target: &str, message: &str) -> Result<()> {
    let (transport, mut handle) = Transport::new(config.ws_url(), config.reconnect_policy());
    let transport_task = tokio::spawn(transport.run());

    // Wait for the connection to open before sending
    loop {
        let state = *handle.status.borrow();
        match state {
            ConnectionState::Open => break,
            ConnectionState::ReconnectExhausted => {
                return Err(ConsoleError::ReconnectExhausted {
                    attempts: config.reconnect.max_attempts,
                });
            }
            _ => {
                if handle.status.changed().await.is_err() {
                    return Err(ConsoleError::ConnectionClosed);
                }
            }
        }
    }

    let mut outbound = Outbound::new(handle.sender.clone(), SendHistory::load());
    outbound.send_message(target, message).await?;

    // Close the outbound channel and wait for the pump to flush the queued
    // frame before claiming success
    drop(outbound);
    drop(handle);
    match transport_task.await {
        Ok(result) => result?,
        Err(e) => return Err(ConsoleError::internal(format!("transport task: {}", e))),
    }

    println!("sent to {}", target.trim());
    Ok(())
}

async fn devices(config: &ConsoleConfig) -> Result<()> {
    let api = ApiClient::new(config.http_base()?);
    for sn in api.sn_list().await? {
        println!("{}", sn);
    }
    Ok(())
}

async fn dates(config: &ConsoleConfig, sn: &str) -> Result<()> {
    let api = ApiClient::new(config.http_base()?);
    for date in api.date_list(sn).await? {
        println!("{}", date);
    }
    Ok(())
}

/// Stream a device log to stdout chunk by chunk, stopping at the end.
/// A retryable fetch failure is retried once for the same chunk before
/// giving up.
async fn tail(config: &ConsoleConfig, sn: &str, date: &str) -> Result<()> {
    let api = ApiClient::new(config.http_base()?);
    let mut viewer = LogViewer::new(config.chunk_size_lines, config.scroll_threshold_px);

    let mut request = viewer.open_source(fleet_protocol::SourceId::new(sn, date));
    let mut failures = 0u32;
    loop {
        match api.chunk(&request).await {
            Ok(chunk) => {
                print!("{}", chunk.content);
                if !chunk.content.ends_with('\n') {
                    println!();
                }
                viewer.apply_chunk(&request, &chunk);
                // Chunks are printed as they arrive; the accumulated render
                // is not needed on this path
                viewer.discard_rendered();
                failures = 0;
            }
            Err(e) => {
                viewer.fetch_failed(&request, &e);
                failures += 1;
                if !e.is_retryable() || failures > 1 {
                    return Err(e);
                }
                tracing::warn!(error = %e, chunk = request.chunk_index, "Retrying chunk fetch");
            }
        }
        // After a failure the cursor is unchanged, so this re-issues the
        // same chunk
        match viewer.fetch_next_chunk() {
            Some(next) => request = next,
            None => break,
        }
    }
    Ok(())
}

async fn view(config: &ConsoleConfig, name: &str) -> Result<()> {
    let api = ApiClient::new(config.http_base()?);
    print!("{}", api.view(name).await?);
    Ok(())
}

async fn list(config: &ConsoleConfig) -> Result<()> {
    let api = ApiClient::new(config.http_base()?);
    for info in api.list_logs().await? {
        println!("{}\t{}\t{}", info.name, info.size, info.modified_time);
    }
    Ok(())
}

async fn download(config: &ConsoleConfig, name: &str, dest: Option<PathBuf>) -> Result<()> {
    let api = ApiClient::new(config.http_base()?);
    let dest = match dest {
        Some(path) => path,
        None => {
            let dir = fleet_utils::paths::download_dir();
            fleet_utils::paths::ensure_dir(&dir)?;
            dir.join(name)
        }
    };
    let bytes = api.download(name, &dest).await?;
    println!("{} ({} bytes)", dest.display(), bytes);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use memedit::cli::{Args, Command, SetTarget, HELP};
use memedit::config::{validate_config, ConfigLoader};
use memedit::core::types::parse_address;
use memedit::core::{DataType, ProcessInfo, ResultRow};
use memedit::memory::{RoundKind, ScanCommand, ScanEvent, ScanOptions, ScanSession, ScanWorker};
use memedit::process::{ProcessMemoryPort, SystemProcesses};

#[cfg(not(any(target_os = "linux", windows)))]
compile_error!("memedit can only attach to processes on Linux and Windows");

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(&args.config)
        .load_or_default()
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    validate_config(&config)?;

    // Initialize logging; RUST_LOG wins over --log-level, which wins over the file
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.logging.ansi)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting memedit v{}", memedit::VERSION);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.scanner.max_threads)
        .build_global()
        .context("failed to start scan threads")?;

    let port = SystemProcesses::default();
    let name = args
        .name
        .clone()
        .or_else(|| port.process_name(args.pid))
        .unwrap_or_else(|| "unknown".to_string());
    let process = ProcessInfo::new(args.pid, name);
    let data_type = args
        .data_type
        .map(DataType::from)
        .unwrap_or(config.scanner.default_data_type);

    let session = ScanSession::attach(
        &port,
        process.clone(),
        data_type,
        ScanOptions::from(&config.scanner),
    )
    .with_context(|| format!("cannot attach to {}", process))?;
    println!("Selected: {}", process);
    println!("Type 'help' for commands. Scanning as {}.", data_type);

    let (worker, mut events) = ScanWorker::spawn(session, config.display.max_rows);
    let mut console = Console::new(data_type);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !console.handle_line(&line, &worker)? {
                    break;
                }
            }
            Some(event) = events.recv() => console.handle_event(event),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if !worker.is_busy() {
                    break;
                }
                worker.cancel();
            }
        }
    }

    worker.close().await?;
    while let Some(event) = events.recv().await {
        console.handle_event(event);
    }

    info!("Shutting down memedit");
    Ok(())
}

/// Interactive front end state: the active type and the last shown rows
struct Console {
    data_type: DataType,
    rows: Vec<ResultRow>,
}

impl Console {
    fn new(data_type: DataType) -> Self {
        Console {
            data_type,
            rows: Vec::new(),
        }
    }

    /// Returns `false` once the user asked to quit
    fn handle_line(&mut self, line: &str, worker: &ScanWorker) -> Result<bool> {
        let command = match Command::parse(line, self.data_type) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(true),
            Err(e) => {
                println!("{}", e);
                return Ok(true);
            }
        };

        match command {
            Command::First(value) => worker.send(ScanCommand::FirstScan(value))?,
            Command::Next(value) => worker.send(ScanCommand::NextScan(value))?,
            Command::SetType(data_type) => {
                self.data_type = data_type;
                self.rows.clear();
                worker.send(ScanCommand::SetDataType(data_type))?;
            }
            Command::Set { target, value } => match self.resolve(target) {
                Ok(address) => worker.send(ScanCommand::Modify { address, value })?,
                Err(message) => println!("{}", message),
            },
            Command::List => self.print_rows(),
            Command::Reset => {
                self.rows.clear();
                worker.send(ScanCommand::Reset)?;
            }
            Command::Cancel => {
                if worker.is_busy() {
                    worker.cancel();
                } else {
                    println!("Nothing to cancel");
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn resolve(&self, target: SetTarget) -> std::result::Result<memedit::Address, String> {
        match target {
            SetTarget::Address(address) => Ok(address),
            SetTarget::Index(index) => {
                let row = self
                    .rows
                    .get(index)
                    .ok_or_else(|| format!("No result #{} in the current list", index))?;
                parse_address(&row.address).map_err(|e| e.to_string())
            }
        }
    }

    fn handle_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Scanned { round, count, rows } => {
                self.rows = rows;
                self.print_rows();
                match round {
                    RoundKind::First => println!("Found {} addresses", count),
                    RoundKind::Next => println!("Narrowed down to {} addresses", count),
                }
                if count > self.rows.len() {
                    println!("(showing the first {})", self.rows.len());
                }
            }
            ScanEvent::Modified(verified) => println!("{}", verified),
            ScanEvent::Reset { data_type } => {
                self.data_type = data_type;
                self.rows.clear();
                println!("Session reset, scanning as {}", data_type);
            }
            ScanEvent::Cancelled => println!("Scan cancelled"),
            ScanEvent::Failed(e) => {
                warn!(error = %e, "command failed");
                println!("Error: {}", e);
            }
            ScanEvent::Closed => info!("process handle closed"),
        }
    }

    fn print_rows(&self) {
        for (index, row) in self.rows.iter().enumerate() {
            println!("#{:<4} {}", index, row);
        }
    }
}

// Workflow service entry point
// Loads a workflow definition, optionally submits transfer directories as
// units, and serves the approval RPC surface

use workflow_service::grpc::proto::approval_service_server::ApprovalServiceServer;
use workflow_service::{
    ApprovalServiceImpl, ChainEngine, CommandRunner, EngineConfig, PendingRegistry,
    ReplacementDictStore, Unit, UnitFile, UnitKind, WorkflowStore,
};

use std::path::Path;
use std::sync::Arc;
use tonic::transport::Server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} <workflow.json> [--listen <addr>] [--start <link-id>] [--transfer <dir>]...",
        program
    );
    std::process::exit(1);
}

/// Build a transfer unit from the files of a directory
fn unit_from_dir(dir: &Path) -> std::io::Result<Unit> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(UnitFile::new(entry.path()));
        }
    }
    Ok(Unit::new(UnitKind::Transfer).with_files(files))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let workflow_path = &args[1];
    let mut listen = "[::1]:50051".to_string();
    let mut start_link: Option<String> = None;
    let mut transfer_dirs: Vec<String> = Vec::new();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--listen" if i + 1 < args.len() => {
                listen = args[i + 1].clone();
                i += 2;
            }
            "--start" if i + 1 < args.len() => {
                start_link = Some(args[i + 1].clone());
                i += 2;
            }
            "--transfer" if i + 1 < args.len() => {
                transfer_dirs.push(args[i + 1].clone());
                i += 2;
            }
            _ => usage(&args[0]),
        }
    }

    let store = Arc::new(WorkflowStore::from_file(workflow_path)?);
    info!(
        workflow = %workflow_path,
        links = store.link_count(),
        "workflow definition loaded"
    );

    let registry = Arc::new(PendingRegistry::new());
    let replacements = Arc::new(ReplacementDictStore::default());
    let engine = Arc::new(
        ChainEngine::new(
            store.clone(),
            Arc::new(CommandRunner::new()),
            registry.clone(),
            replacements.clone(),
        )
        .with_config(EngineConfig::default()),
    );

    if !transfer_dirs.is_empty() {
        let start = match &start_link {
            Some(link) => link.clone(),
            None => {
                eprintln!("--transfer requires --start <link-id>");
                std::process::exit(1);
            }
        };
        for dir in &transfer_dirs {
            match unit_from_dir(Path::new(dir)) {
                Ok(unit) => {
                    info!(unit_id = %unit.id, dir = %dir, "transfer submitted");
                    // Drivers run to completion on their own; nothing joins them
                    let _ = engine.spawn_unit(unit, start.clone());
                }
                Err(e) => warn!(dir = %dir, error = %e, "skipping unreadable transfer"),
            }
        }
    }

    let service = ApprovalServiceImpl::new(registry, replacements, store);
    let addr = listen.parse()?;
    info!(%addr, "approval service listening");

    Server::builder()
        .add_service(ApprovalServiceServer::new(service))
        .serve(addr)
        .await?;

    Ok(())
}

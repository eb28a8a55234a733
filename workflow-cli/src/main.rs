// Operator client for the workflow approval service
// Covers the same surface a dashboard would: list pending jobs, approve
// them, and manage replacement dictionaries

use std::collections::HashMap;
use std::env;

pub mod proto {
    tonic::include_proto!("workflow");
}

use proto::approval_service_client::ApprovalServiceClient;
use proto::list_jobs_awaiting_approval_response::job::UnitType;

const USAGE: &str = "\
Usage: workflow <command> [args]

Commands:
  list
  approve-job <job-id> <choice-value>
  approve-transfer <unit-id>
  replacements [description]
  set-replacement <description> <key=value>...
  duplicates <link-name> <choice-name>

The service address comes from WORKFLOW_SERVICE_ADDR
(default http://[::1]:50051).";

fn usage() -> ! {
    eprintln!("{}", USAGE);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let addr = env::var("WORKFLOW_SERVICE_ADDR")
        .unwrap_or_else(|_| "http://[::1]:50051".to_string());
    let mut client = ApprovalServiceClient::connect(addr).await?;

    match args[1].as_str() {
        "list" => {
            let response = client
                .list_jobs_awaiting_approval(proto::Empty {})
                .await?
                .into_inner();
            for job in &response.jobs {
                let unit_type = match UnitType::try_from(job.unit_type) {
                    Ok(UnitType::Transfer) => "transfer",
                    Ok(UnitType::Ingest) => "ingest",
                    Err(_) => "unknown",
                };
                println!("Job {} ({} unit)", job.job_id, unit_type);
                for choice in &job.choices {
                    println!("  {} (value={})", choice.description, choice.value);
                }
            }
            println!("Transfers pending: {}", response.transfer_count);
            println!("Ingests pending:   {}", response.ingest_count);
        }
        "approve-job" => {
            if args.len() < 4 {
                usage();
            }
            let response = client
                .approve_job(proto::ApproveJobRequest {
                    job_id: args[2].clone(),
                    choice_value: args[3].clone(),
                })
                .await?
                .into_inner();
            println!("approved: {}", response.approved);
        }
        "approve-transfer" => {
            if args.len() < 3 {
                usage();
            }
            let response = client
                .approve_transfer(proto::ApproveTransferRequest {
                    unit_id: args[2].clone(),
                })
                .await?
                .into_inner();
            println!("approved: {}", response.approved);
        }
        "replacements" => {
            let description = args.get(2).cloned().unwrap_or_default();
            let response = client
                .list_microservice_choice_replacements(
                    proto::ListMicroserviceChoiceReplacementsRequest {
                        link_id: String::new(),
                        description,
                    },
                )
                .await?
                .into_inner();
            for replacement in &response.replacements {
                println!("{} ({})", replacement.description, replacement.link_id);
                for (key, value) in &replacement.arguments {
                    println!("  {}={}", key, value);
                }
            }
        }
        "set-replacement" => {
            if args.len() < 4 {
                usage();
            }
            let mut arguments = HashMap::new();
            for pair in &args[3..] {
                match pair.split_once('=') {
                    Some((key, value)) => {
                        arguments.insert(key.to_string(), value.to_string());
                    }
                    None => {
                        eprintln!("ignoring malformed argument '{}'", pair);
                    }
                }
            }
            client
                .set_microservice_choice_replacement(
                    proto::SetMicroserviceChoiceReplacementRequest {
                        link_id: String::new(),
                        description: args[2].clone(),
                        arguments,
                    },
                )
                .await?;
            println!("updated");
        }
        "duplicates" => {
            if args.len() < 4 {
                usage();
            }
            let response = client
                .list_microservice_choice_duplicates(
                    proto::ListMicroserviceChoiceDuplicatesRequest {
                        link_name: args[2].clone(),
                        choice_name: args[3].clone(),
                    },
                )
                .await?
                .into_inner();
            if response.duplicates.is_empty() {
                println!("no duplicates");
            }
            for duplicate in &response.duplicates {
                println!("{} -> {}", duplicate.src_id, duplicate.dst_id);
            }
        }
        unknown => {
            eprintln!("Unknown command: {}", unknown);
            usage();
        }
    }

    Ok(())
}

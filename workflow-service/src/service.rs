// Approval service
// RPC-facing operations over the pending registry, replacement store, and
// workflow graph

use crate::grpc::proto;
use crate::grpc::proto::approval_service_server::ApprovalService;
use crate::registry::PendingRegistry;
use crate::replacements::{ReplacementDictStore, ReplacementError, ReplacementFilter};
use crate::workflow::models::{UnitKind, APPROVE_TRANSFER_LABEL};
use crate::workflow::store::WorkflowStore;

use std::collections::HashMap;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::debug;
use uuid::Uuid;

/// Serves the operator-facing RPC surface.
///
/// Owns nothing itself: the registry and stores are shared with the
/// engine, injected at construction.
#[derive(Clone)]
pub struct ApprovalServiceImpl {
    registry: Arc<PendingRegistry>,
    replacements: Arc<ReplacementDictStore>,
    store: Arc<WorkflowStore>,
}

impl ApprovalServiceImpl {
    pub fn new(
        registry: Arc<PendingRegistry>,
        replacements: Arc<ReplacementDictStore>,
        store: Arc<WorkflowStore>,
    ) -> Self {
        Self {
            registry,
            replacements,
            store,
        }
    }
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(value)
        .map_err(|_| Status::invalid_argument(format!("{} is not a valid id", field)))
}

/// Map empty proto strings to "no filter"
fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[tonic::async_trait]
impl ApprovalService for ApprovalServiceImpl {
    async fn approve_transfer(
        &self,
        request: Request<proto::ApproveTransferRequest>,
    ) -> Result<Response<proto::ApproveTransferResponse>, Status> {
        let req = request.into_inner();
        debug!(unit_id = %req.unit_id, "rpc ApproveTransfer");
        let unit_id = parse_uuid(&req.unit_id, "unit_id")?;

        let (handle, value) = self
            .registry
            .resolve_unit_choice(unit_id, APPROVE_TRANSFER_LABEL)
            .map_err(|_| {
                Status::not_found("no pending approve-transfer choice for that unit")
            })?;
        // False only when the unit's driver is already gone
        let approved = handle.resume(value);

        Ok(Response::new(proto::ApproveTransferResponse { approved }))
    }

    async fn approve_job(
        &self,
        request: Request<proto::ApproveJobRequest>,
    ) -> Result<Response<proto::ApproveJobResponse>, Status> {
        let req = request.into_inner();
        debug!(job_id = %req.job_id, choice = %req.choice_value, "rpc ApproveJob");
        let job_id = parse_uuid(&req.job_id, "job_id")?;

        let handle = self
            .registry
            .resolve(job_id)
            .map_err(|_| Status::not_found("job is not awaiting approval"))?;
        let approved = handle.resume(req.choice_value);

        Ok(Response::new(proto::ApproveJobResponse { approved }))
    }

    async fn list_jobs_awaiting_approval(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::ListJobsAwaitingApprovalResponse>, Status> {
        debug!("rpc ListJobsAwaitingApproval");
        let pending = self.registry.list();

        let mut transfer_count = 0;
        let mut ingest_count = 0;
        for entry in &pending {
            match entry.unit_kind {
                UnitKind::Transfer => transfer_count += 1,
                UnitKind::Sip => ingest_count += 1,
            }
        }

        Ok(Response::new(proto::ListJobsAwaitingApprovalResponse {
            transfer_count,
            ingest_count,
            jobs: pending.into_iter().map(Into::into).collect(),
        }))
    }

    async fn list_microservice_choice_replacements(
        &self,
        request: Request<proto::ListMicroserviceChoiceReplacementsRequest>,
    ) -> Result<Response<proto::ListMicroserviceChoiceReplacementsResponse>, Status> {
        let req = request.into_inner();
        debug!(link_id = %req.link_id, description = %req.description, "rpc ListMicroserviceChoiceReplacements");

        let filter = ReplacementFilter {
            link_id: optional(req.link_id),
            description: optional(req.description),
        };

        Ok(Response::new(
            proto::ListMicroserviceChoiceReplacementsResponse {
                replacements: self
                    .replacements
                    .list(&filter)
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            },
        ))
    }

    async fn set_microservice_choice_replacement(
        &self,
        request: Request<proto::SetMicroserviceChoiceReplacementRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        let req = request.into_inner();
        debug!(link_id = %req.link_id, description = %req.description, "rpc SetMicroserviceChoiceReplacement");

        let filter = ReplacementFilter {
            link_id: optional(req.link_id),
            description: optional(req.description),
        };
        let arguments: HashMap<String, String> = req.arguments.into_iter().collect();

        self.replacements
            .set(&filter, arguments)
            .map_err(|e| match e {
                ReplacementError::EmptyArguments => {
                    Status::invalid_argument("arguments map must not be empty")
                }
                ReplacementError::NotFound => {
                    Status::not_found("no replacement dictionary matches the filter")
                }
            })?;

        Ok(Response::new(proto::Empty {}))
    }

    async fn list_microservice_choice_duplicates(
        &self,
        request: Request<proto::ListMicroserviceChoiceDuplicatesRequest>,
    ) -> Result<Response<proto::ListMicroserviceChoiceDuplicatesResponse>, Status> {
        let req = request.into_inner();
        debug!(link_name = %req.link_name, choice_name = %req.choice_name, "rpc ListMicroserviceChoiceDuplicates");

        if req.link_name.is_empty() || req.choice_name.is_empty() {
            return Err(Status::invalid_argument(
                "link_name and choice_name are both required",
            ));
        }

        Ok(Response::new(
            proto::ListMicroserviceChoiceDuplicatesResponse {
                duplicates: self
                    .store
                    .find_choice_duplicates(&req.link_name, &req.choice_name)
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            },
        ))
    }
}

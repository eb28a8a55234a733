// Proto <-> domain conversions for the approval surface

use crate::registry::PendingEntry;
use crate::replacements::ReplacementDict;
use crate::workflow::models::{Choice, UnitKind};
use crate::workflow::store::ChoiceDuplicate;

pub mod proto {
    tonic::include_proto!("workflow");
}

use proto::list_jobs_awaiting_approval_response as listing;

impl From<UnitKind> for listing::job::UnitType {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Transfer => listing::job::UnitType::Transfer,
            UnitKind::Sip => listing::job::UnitType::Ingest,
        }
    }
}

impl From<Choice> for listing::Choice {
    fn from(choice: Choice) -> Self {
        listing::Choice {
            value: choice.value,
            description: choice.description,
        }
    }
}

impl From<PendingEntry> for listing::Job {
    fn from(entry: PendingEntry) -> Self {
        let unit_type = listing::job::UnitType::from(entry.unit_kind);
        listing::Job {
            job_id: entry.job_id.to_string(),
            unit_type: unit_type as i32,
            choices: entry.choices.into_iter().map(listing::Choice::from).collect(),
        }
    }
}

impl From<ReplacementDict> for proto::list_microservice_choice_replacements_response::Replacement {
    fn from(dict: ReplacementDict) -> Self {
        proto::list_microservice_choice_replacements_response::Replacement {
            link_id: dict.link_id,
            description: dict.description,
            arguments: dict.arguments.into_iter().collect(),
        }
    }
}

impl From<ChoiceDuplicate> for proto::list_microservice_choice_duplicates_response::Duplicate {
    fn from(duplicate: ChoiceDuplicate) -> Self {
        proto::list_microservice_choice_duplicates_response::Duplicate {
            src_id: duplicate.link_id,
            dst_id: duplicate.chain_id,
        }
    }
}

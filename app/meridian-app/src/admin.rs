//! Admin surface (§6 "Admin HTTP API", §9 "Admin surface vs state
//! machine"). The operator-facing side never touches storage: it only
//! synthesizes the same signed message that would flow through consensus
//! like any other transaction, so every node still applies it through
//! the identical `DeliverTx` path and stays byte-identical. `apply_admin`
//! is the consensus-side half: it is what actually runs inside
//! `DeliverTx` once such a message has been delivered.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Event, Storage};

use meridian_types::collaborators::MultiSigVerifier;
use meridian_types::Height;

use crate::error::{AppError, AppResult};

#[cw_serde]
pub enum AdminMsg {
    PauseModule {
        module: String,
        sub_id: String,
        reason: String,
        auto_resume_blocks: Option<u64>,
    },
    ResumeModule {
        module: String,
        sub_id: String,
        reason: String,
    },
    /// Auto-resume is expressed in minutes on the operator surface and
    /// translated to a block-height target before it ever reaches this
    /// message (§6 "Admin HTTP API").
    EmergencyHalt {
        module: String,
        reason: String,
        payload: Vec<u8>,
        signatures: Vec<Vec<u8>>,
    },
}

/// Synthesizes a `PauseModule` admin message. Called from the operator
/// HTTP surface (out of scope here); never writes to the store itself.
pub fn synthesize_pause(module: &str, sub_id: &str, reason: &str, auto_resume_minutes: Option<u64>, seconds_per_block: u64) -> AdminMsg {
    let auto_resume_blocks = auto_resume_minutes.map(|minutes| (minutes * 60).div_ceil(seconds_per_block.max(1)));
    AdminMsg::PauseModule {
        module: module.to_string(),
        sub_id: sub_id.to_string(),
        reason: reason.to_string(),
        auto_resume_blocks,
    }
}

pub fn synthesize_resume(module: &str, sub_id: &str, reason: &str) -> AdminMsg {
    AdminMsg::ResumeModule {
        module: module.to_string(),
        sub_id: sub_id.to_string(),
        reason: reason.to_string(),
    }
}

/// Applies an already-delivered admin message (§4.6 "Admin surface").
/// `EmergencyHalt` is rejected unless `verifier` confirms the threshold
/// signature set over the canonical payload.
pub fn apply_admin(
    store: &mut dyn Storage,
    verifier: &dyn MultiSigVerifier,
    actor: &str,
    msg: AdminMsg,
    height: Height,
) -> AppResult<Event> {
    match msg {
        AdminMsg::PauseModule {
            module,
            sub_id,
            reason,
            auto_resume_blocks,
        } => {
            let state = meridian_breaker::open(store, &module, &sub_id, actor, &reason, auto_resume_blocks, height, None)?;
            Ok(meridian_types::event::module_event(
                "breaker",
                "module_paused",
                vec![("module", module), ("sub_id", sub_id), ("status", format!("{:?}", state.status))],
            ))
        }
        AdminMsg::ResumeModule { module, sub_id, reason } => {
            let state = meridian_breaker::close(store, &module, &sub_id, actor, &reason, height)?;
            Ok(meridian_types::event::module_event(
                "breaker",
                "module_resumed",
                vec![("module", module), ("sub_id", sub_id), ("status", format!("{:?}", state.status))],
            ))
        }
        AdminMsg::EmergencyHalt {
            module,
            reason,
            payload,
            signatures,
        } => {
            if !verifier.verify(&payload, &signatures) {
                return Err(AppError::UnauthorizedAdmin("multi-sig threshold not met".into()));
            }
            let state = meridian_breaker::open(store, &module, "", actor, &reason, None, height, None)?;
            Ok(meridian_types::event::module_event(
                "breaker",
                "emergency_halt",
                vec![("module", module), ("status", format!("{:?}", state.status))],
            ))
        }
    }
}

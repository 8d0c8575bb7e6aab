//! Public operations of the circuit-breaker coordinator (§4.6):
//! `Open`, `Close`, `SetHalfOpen`, `IsOpen`, `GetState`, `GetAllStates`,
//! plus the EndBlock auto-resume sweep.

use cosmwasm_std::{Order, Storage};

use meridian_types::Height;

use crate::error::{BreakerError, BreakerResult};
use crate::state::{BreakerState, BreakerStatus, Transition, BREAKERS};

pub fn open(
    store: &mut dyn Storage,
    module: &str,
    sub_id: &str,
    actor: &str,
    reason: &str,
    auto_resume_blocks: Option<u64>,
    height: Height,
    triggered_by: Option<String>,
) -> BreakerResult<BreakerState> {
    let mut state = BREAKERS
        .may_load(store, (module, sub_id))?
        .unwrap_or_else(|| BreakerState::closed(module, sub_id));

    if state.is_open() {
        return Err(BreakerError::AlreadyOpen {
            module: module.to_string(),
            sub_id: sub_id.to_string(),
        });
    }

    let auto_resume_at = auto_resume_blocks.map(|blocks| height + blocks);
    if let Some(at) = auto_resume_at {
        if at <= height {
            return Err(BreakerError::InvalidAutoResume {});
        }
    }

    state.history.push(Transition {
        from: state.status,
        to: BreakerStatus::Open,
        actor: actor.to_string(),
        reason: reason.to_string(),
        height,
    });
    state.status = BreakerStatus::Open;
    state.opened_at = Some(height);
    state.opened_by = Some(actor.to_string());
    state.reason = Some(reason.to_string());
    state.auto_resume_at = auto_resume_at;
    state.triggered_by = triggered_by;

    BREAKERS.save(store, (module, sub_id), &state)?;
    Ok(state)
}

pub fn close(
    store: &mut dyn Storage,
    module: &str,
    sub_id: &str,
    actor: &str,
    reason: &str,
    height: Height,
) -> BreakerResult<BreakerState> {
    let mut state = BREAKERS
        .may_load(store, (module, sub_id))?
        .unwrap_or_else(|| BreakerState::closed(module, sub_id));

    if matches!(state.status, BreakerStatus::Closed) {
        return Err(BreakerError::AlreadyClosed {
            module: module.to_string(),
            sub_id: sub_id.to_string(),
        });
    }

    state.history.push(Transition {
        from: state.status,
        to: BreakerStatus::Closed,
        actor: actor.to_string(),
        reason: reason.to_string(),
        height,
    });
    state.status = BreakerStatus::Closed;
    state.opened_at = None;
    state.opened_by = None;
    state.reason = None;
    state.auto_resume_at = None;
    state.triggered_by = None;

    BREAKERS.save(store, (module, sub_id), &state)?;
    Ok(state)
}

pub fn set_half_open(
    store: &mut dyn Storage,
    module: &str,
    sub_id: &str,
    actor: &str,
    height: Height,
) -> BreakerResult<BreakerState> {
    let mut state = BREAKERS
        .may_load(store, (module, sub_id))?
        .unwrap_or_else(|| BreakerState::closed(module, sub_id));

    state.history.push(Transition {
        from: state.status,
        to: BreakerStatus::HalfOpen,
        actor: actor.to_string(),
        reason: "half_open_probe".to_string(),
        height,
    });
    state.status = BreakerStatus::HalfOpen;

    BREAKERS.save(store, (module, sub_id), &state)?;
    Ok(state)
}

/// Top of every state-modifying handler in every engine consults this
/// (§4.6 "Every engine must consult IsOpen at the top of every
/// state-modifying handler belonging to that module").
pub fn is_open(store: &dyn Storage, module: &str, sub_id: &str) -> bool {
    BREAKERS
        .may_load(store, (module, sub_id))
        .ok()
        .flatten()
        .map(|s| s.is_open())
        .unwrap_or(false)
}

pub fn get_state(
    store: &dyn Storage,
    module: &str,
    sub_id: &str,
) -> BreakerResult<Option<BreakerState>> {
    Ok(BREAKERS.may_load(store, (module, sub_id))?)
}

/// Byte-lexicographic over `(module, sub_id)`, matching every other
/// module's deterministic iteration order (§5, §9).
pub fn get_all_states(store: &dyn Storage) -> BreakerResult<Vec<BreakerState>> {
    BREAKERS
        .range(store, None, None, Order::Ascending)
        .map(|item| Ok(item?.1))
        .collect()
}

/// EndBlock sweep: any breaker whose `auto_resume_at` is in the past is
/// closed automatically with `actor = "system"` (§4.6).
pub fn auto_resume_sweep(store: &mut dyn Storage, height: Height) -> BreakerResult<Vec<BreakerState>> {
    let due: Vec<(String, String)> = BREAKERS
        .range(store, None, None, Order::Ascending)
        .filter_map(|item| {
            let (key, state) = item.ok()?;
            let due = state.is_open() && state.auto_resume_at.map(|at| at <= height).unwrap_or(false);
            due.then_some(key)
        })
        .collect();

    let mut resumed = Vec::with_capacity(due.len());
    for (module, sub_id) in due {
        resumed.push(close(
            store,
            &module,
            &sub_id,
            "system",
            "auto_resume",
            height,
        )?);
    }
    Ok(resumed)
}

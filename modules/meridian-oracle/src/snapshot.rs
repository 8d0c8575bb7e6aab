//! Per-asset TWAP ring (§4.4 "append PriceSnapshot; trim snapshots older
//! than TWAP window"), backed directly by `meridian-circular-buffer`'s
//! `BufferManager`. That package exposes one buffer per fixed storage
//! key; since one oracle instance tracks many assets, each asset gets
//! its own `CircularBuffer` built from a key namespaced with the asset
//! string rather than a single shared ring.

use cosmwasm_std::Storage;
use meridian_circular_buffer::error::BufferError;
use meridian_circular_buffer::{BufferManager, CircularBuffer};

use crate::error::OracleResult;
use crate::state::PriceSnapshot;

fn keys_for(asset: &str) -> (String, String) {
    (format!("oracle__ring_state/{asset}"), format!("oracle__ring_data/{asset}"))
}

/// Appends `snapshot` to `asset`'s ring, initializing it with `capacity`
/// on first use. Once full, the oldest entry is overwritten.
pub fn push(store: &mut dyn Storage, asset: &str, capacity: u32, snapshot: PriceSnapshot) -> OracleResult<()> {
    let (state_key, array_key) = keys_for(asset);
    let iface = CircularBuffer::<PriceSnapshot>::new(&state_key, &array_key);

    let mut buffer = match BufferManager::new(store, iface) {
        Ok(buffer) => buffer,
        Err(BufferError::BufferNotInitialized {}) => {
            BufferManager::init(store, CircularBuffer::new(&state_key, &array_key), capacity.max(1))?;
            BufferManager::new(store, CircularBuffer::new(&state_key, &array_key))?
        }
        Err(err) => return Err(err.into()),
    };
    buffer.push(&snapshot);
    buffer.commit(store)?;
    Ok(())
}

/// Returns every stored snapshot for `asset`, oldest first. `head` always
/// points at the next slot to be overwritten; if that slot is already
/// occupied the ring has wrapped at least once and is full, otherwise the
/// ring holds exactly `head` entries starting at index 0.
pub fn read_all(store: &dyn Storage, asset: &str) -> OracleResult<Vec<PriceSnapshot>> {
    let (state_key, array_key) = keys_for(asset);
    let iface = CircularBuffer::<PriceSnapshot>::new(&state_key, &array_key);

    let buffer = match BufferManager::new(store, iface) {
        Ok(buffer) => buffer,
        Err(BufferError::BufferNotInitialized {}) => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let head = buffer.head();
    let full = buffer.exists(store, head);
    let len = if full { buffer.capacity() } else { head };
    let oldest = if full { head } else { 0 };

    let mut out = Vec::with_capacity(len as usize);
    for offset in 0..len {
        if let Some(snapshot) = buffer.read_single(store, oldest + offset)? {
            out.push(snapshot);
        }
    }
    Ok(out)
}

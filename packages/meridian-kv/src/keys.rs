//! Composite-key encoding for the persisted state layout of §6:
//! `<moduleByte><typeByte><compositeKey>`, big-endian for numerics, raw
//! bytes for addresses, byte-joined for tuples.

use cosmwasm_std::Addr;
use meridian_types::module::ModuleTag;

/// Builds the fully-qualified key for a piece of state owned by `module`
/// under the given `type_byte`, followed by the joined composite key
/// parts. Keys built this way are stable across releases (§6).
pub fn compose(module: ModuleTag, type_byte: u8, parts: &[&[u8]]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + parts.iter().map(|p| p.len()).sum::<usize>());
    key.push(module.byte());
    key.push(type_byte);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

pub fn u64_be(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

pub fn addr_bytes(addr: &Addr) -> Vec<u8> {
    addr.as_bytes().to_vec()
}

//! Well-known program and sysvar addresses

use once_cell::sync::Lazy;
use solana_pubkey::Pubkey;
use std::str::FromStr;

/// SPL program IDs that are not part of `solana-sdk-ids`
const SPL_PROGRAMS: &[(&str, &str)] = &[
    ("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "SPL Token program"),
    ("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb", "SPL Token-2022 program"),
    ("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL", "SPL Associated Token program"),
    ("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr", "SPL Memo program"),
    ("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s", "Metaplex Token Metadata program"),
];

static KNOWN_ADDRESSES: Lazy<Vec<(Pubkey, &'static str)>> = Lazy::new(|| {
    let mut known = vec![
        (solana_sdk_ids::system_program::ID, "System program"),
        (solana_sdk_ids::bpf_loader_upgradeable::ID, "BPF Upgradeable Loader"),
        (solana_sdk_ids::compute_budget::ID, "Compute Budget program"),
        (solana_sdk_ids::sysvar::rent::ID, "Rent sysvar"),
        (solana_sdk_ids::sysvar::clock::ID, "Clock sysvar"),
        (solana_sdk_ids::sysvar::instructions::ID, "Instructions sysvar"),
        (solana_sdk_ids::sysvar::slot_hashes::ID, "SlotHashes sysvar"),
    ];
    for (address, name) in SPL_PROGRAMS {
        if let Ok(pubkey) = Pubkey::from_str(address) {
            known.push((pubkey, *name));
        }
    }
    known
});

/// Look up the name of a well-known program or sysvar
pub fn known_program_name(pubkey: &Pubkey) -> Option<&'static str> {
    KNOWN_ADDRESSES
        .iter()
        .find(|(address, _)| address == pubkey)
        .map(|(_, name)| *name)
}

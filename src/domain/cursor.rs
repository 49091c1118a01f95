//! Opaque pagination cursors.
//!
//! A cursor is a row id run through a keyed Feistel permutation and tagged
//! with a short keyed checksum, then hex encoded. The mapping is
//! deterministic and bijective over `u64`, adjacent ids produce unrelated
//! tokens, and edited tokens fail the tag check.

use super::RowId;
use crate::error::{MatchError, Result};
use sha2::{Digest, Sha256};

const ROUNDS: u8 = 4;
const ID_BYTES: usize = 8;
const TAG_BYTES: usize = 2;

/// Length of every encoded cursor.
pub const TOKEN_LEN: usize = (ID_BYTES + TAG_BYTES) * 2;

#[derive(Clone)]
pub struct CursorCodec {
    key: [u8; 32],
}

impl std::fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCodec").finish_non_exhaustive()
    }
}

impl CursorCodec {
    pub fn new(salt: &str) -> Self {
        let digest = Sha256::digest(salt.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    pub fn encode(&self, id: RowId) -> String {
        let permuted = self.permute(id.value());
        let mut bytes = [0u8; ID_BYTES + TAG_BYTES];
        bytes[..ID_BYTES].copy_from_slice(&permuted.to_be_bytes());
        bytes[ID_BYTES..].copy_from_slice(&self.tag(permuted));
        hex::encode(bytes)
    }

    pub fn decode(&self, token: &str) -> Result<RowId> {
        // one spelling per id: lowercase hex only
        if token.len() != TOKEN_LEN
            || !token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(MatchError::MalformedCursor);
        }
        let bytes = hex::decode(token).map_err(|_| MatchError::MalformedCursor)?;
        let (id_bytes, tag) = bytes.split_at(ID_BYTES);

        let mut permuted = [0u8; ID_BYTES];
        permuted.copy_from_slice(id_bytes);
        let permuted = u64::from_be_bytes(permuted);
        if tag != self.tag(permuted) {
            return Err(MatchError::MalformedCursor);
        }

        match self.unpermute(permuted) {
            0 => Err(MatchError::MalformedCursor),
            id => Ok(RowId(id)),
        }
    }

    fn round(&self, round: u8, half: u32) -> u32 {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update([round]);
        hasher.update(half.to_be_bytes());
        let digest = hasher.finalize();
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    fn permute(&self, id: u64) -> u64 {
        let (mut left, mut right) = ((id >> 32) as u32, id as u32);
        for round in 0..ROUNDS {
            let next = left ^ self.round(round, right);
            left = right;
            right = next;
        }
        (u64::from(left) << 32) | u64::from(right)
    }

    fn unpermute(&self, value: u64) -> u64 {
        let (mut left, mut right) = ((value >> 32) as u32, value as u32);
        for round in (0..ROUNDS).rev() {
            let previous_right = left;
            left = right ^ self.round(round, previous_right);
            right = previous_right;
        }
        (u64::from(left) << 32) | u64::from(right)
    }

    fn tag(&self, permuted: u64) -> [u8; TAG_BYTES] {
        let mut hasher = Sha256::new();
        hasher.update(b"tag");
        hasher.update(self.key);
        hasher.update(permuted.to_be_bytes());
        let digest = hasher.finalize();
        [digest[0], digest[1]]
    }
}

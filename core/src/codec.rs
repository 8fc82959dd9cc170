use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::state::{GameState, StateError};

pub fn encode<T>(value: &T) -> Option<Vec<u8>>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value).ok().map(|bytes| bytes.into_vec())
}

/// Frames arrive in plain `Vec<u8>`s; copy into an aligned buffer before
/// validating so decoding never depends on allocator alignment.
pub fn decode<T>(bytes: &[u8]) -> Option<T>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<T, Error>(aligned.as_slice()).ok()
}

pub fn encode_state(state: &GameState) -> Option<Vec<u8>> {
    encode(state)
}

pub fn decode_state(bytes: &[u8]) -> Result<GameState, StateError> {
    decode::<GameState>(bytes).ok_or(StateError::Undecodable { len: bytes.len() })
}

use fedpeg_db_types::DbError;
use fedpeg_primitives::ClaimState;

pub(crate) fn to_db_error(e: sled::Error) -> DbError {
    match e {
        sled::Error::Io(io) => DbError::IoError(io.to_string()),
        other => DbError::Other(format!("sled error: {other:?}")),
    }
}

/// Stored form of a state; `None` means delete.
pub(crate) fn encode_state(state: &ClaimState) -> Option<Vec<u8>> {
    if state.is_unclaimed() {
        None
    } else {
        Some(state.to_bytes())
    }
}

pub(crate) fn decode_state(raw: Option<&[u8]>) -> Result<ClaimState, DbError> {
    match raw {
        None => Ok(ClaimState::Unclaimed),
        Some(buf) => ClaimState::from_bytes(buf).map_err(|e| DbError::CodecError(e.to_string())),
    }
}

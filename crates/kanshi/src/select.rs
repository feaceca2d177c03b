use crate::{
    error::{KanshiError, KanshiResult},
    model::{Stream, StreamingProtocol},
};

/// Pick the stream matching `(protocol, resolution)` exactly, or the first
/// stream when none does.
///
/// Only an empty input is an error.
pub fn select_stream<'s>(
    streams: &'s [Stream],
    protocol: StreamingProtocol,
    resolution: &str,
) -> KanshiResult<&'s Stream> {
    let first = streams.first().ok_or(KanshiError::NoStreamsAvailable)?;
    Ok(streams
        .iter()
        .find(|stream| stream.protocol == protocol && stream.resolution == resolution)
        .unwrap_or(first))
}

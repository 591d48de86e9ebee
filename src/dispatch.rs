//! The Request Dispatcher: builds a request payload for one chunk, POSTs it
//! to the annotation service, and drives the Response Parser over the
//! streamed response body.
//!
//! One attempt per chunk, no retry.

use crate::client::Client;
use crate::demux::DemuxContext;
use crate::error::DispatchError;
use crate::response_parser::ResponseParser;
use crate::vcf::VcfRecord;

const INITIAL_PAYLOAD_CAPACITY: usize = 512;

/// Encode one chunk of passed records as the `chrom:position:reference:alternate`
/// comma-joined payload the service expects.
///
/// The buffer starts at [`INITIAL_PAYLOAD_CAPACITY`] and grows geometrically
/// via `String`'s own amortized growth.
fn encode_payload(chunk: &[VcfRecord]) -> String {
    let mut payload = String::with_capacity(INITIAL_PAYLOAD_CAPACITY);
    for record in chunk {
        payload.push_str(&record.chromosome);
        payload.push(':');
        payload.push_str(&record.position.to_string());
        payload.push(':');
        payload.push_str(&record.reference);
        payload.push(':');
        payload.push_str(&record.alternate);
        payload.push(',');
    }
    payload
}

/// Dispatch one chunk: POST the encoded payload and stream the response
/// through a fresh [`ResponseParser`], recording every emission into
/// `demux`.
///
/// One attempt only, no retry on failure.
pub async fn dispatch_chunk(
    client: &Client,
    service_url: &str,
    chunk: &[VcfRecord],
    demux: &DemuxContext,
    worker: usize,
) -> Result<(), DispatchError> {
    let payload = encode_payload(chunk);
    let mut response = client
        .inner
        .post(service_url)
        .form(&[("of", "txt"), ("variants", payload.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DispatchError::HttpStatus {
            status: status.as_u16(),
        });
    }

    let mut parser = ResponseParser::new();
    while let Some(bytes) = response.chunk().await? {
        let (emissions, consumed) = parser.feed(&bytes);
        for emission in emissions {
            demux.record(&emission.line, emission.consequence_type.as_deref());
        }
        if consumed < bytes.len() {
            return Err(DispatchError::BufferResize { worker });
        }
    }

    Ok(())
}

//! Bounded decode retries with an escalating sample factor.

use tracing::debug;

use super::{AbsentReason, DecodeOutcome, Decoder, ImageHandle};

/// Total decode attempts for one logical decode (first try plus three retries).
pub const MAX_DECODE_ATTEMPTS: u32 = 4;

/// Wraps a [`Decoder`] and retries out-of-memory failures.
///
/// Attempt `n` (1-based) decodes at `first_factor + (n - 1)`. Only
/// [`DecodeOutcome::OutOfMemory`] is retried; any other failure ends the loop
/// immediately. Each attempt runs to completion; there is no cancellation.
#[derive(Debug, Clone, Default)]
pub struct RetryingDecoder<D> {
    inner: D,
}

impl<D: Decoder> RetryingDecoder<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Decode `handle`, starting at `sample_factor` (0 is treated as 1).
    ///
    /// Never returns [`DecodeOutcome::OutOfMemory`]: exhausting every attempt
    /// yields [`DecodeOutcome::Absent`].
    pub fn decode(&self, handle: &ImageHandle, sample_factor: u32) -> DecodeOutcome {
        let mut factor = sample_factor.max(1);
        let mut attempt = 1;

        loop {
            match DecodeOutcome::from_attempt(self.inner.decode_at(handle, factor)) {
                DecodeOutcome::OutOfMemory if attempt < MAX_DECODE_ATTEMPTS => {
                    debug!(
                        %handle,
                        attempt,
                        sample_factor = factor,
                        next_sample_factor = factor.saturating_add(1),
                        "Out of memory while decoding, retrying with a larger sample factor"
                    );
                    factor = factor.saturating_add(1);
                    attempt += 1;
                }
                DecodeOutcome::OutOfMemory => {
                    debug!(
                        %handle,
                        attempts = attempt,
                        sample_factor = factor,
                        "Could not decode after exhausting retries"
                    );
                    return DecodeOutcome::Absent(AbsentReason::RetriesExhausted {
                        attempts: attempt,
                        last_sample_factor: factor,
                    });
                }
                DecodeOutcome::Decoded(buffer) => {
                    debug!(
                        %handle,
                        attempt,
                        sample_factor = factor,
                        width = buffer.width(),
                        height = buffer.height(),
                        "Decoded image"
                    );
                    return DecodeOutcome::Decoded(buffer);
                }
                DecodeOutcome::Failed(e) => {
                    debug!(%handle, attempt, sample_factor = factor, error = %e, "Decode failed");
                    return DecodeOutcome::Failed(e);
                }
                absent @ DecodeOutcome::Absent(_) => return absent,
            }
        }
    }
}

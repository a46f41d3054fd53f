//! Recipient partitioning for batch fan-out.
//!
//! The partition is order-preserving and exhaustive: every recipient appears
//! in exactly one batch, batches preserve the input order, and the batch
//! count is `ceil(N / batch_size)`.

/// A bounded partition of recipients dispatched as one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position within the fan-out.
    pub index: usize,
    /// Recipient emails, in input order.
    pub recipients: Vec<String>,
}

/// Splits recipients into fixed-size batches.
///
/// The final batch holds the remainder and may be smaller. A `batch_size`
/// of zero is clamped to one rather than panicking; the config layer
/// rejects zero before it gets here.
#[must_use]
pub fn partition(recipients: Vec<String>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    recipients
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            recipients: chunk.to_vec(),
        })
        .collect()
}

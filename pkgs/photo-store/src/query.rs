//! Prefix queries over the file-name index
//!
//! File names encode a hierarchy (`site/part/damage.jpg`), so "everything
//! under this path" is a prefix match. The eager form is a bounded range scan;
//! the lazy form walks a cursor over the whole index and hands out matches in
//! fixed-size batches.

use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::debug;

use crate::backend::PhotoBackend;
use crate::codec;
use crate::error::{Result, StoreError};
use crate::photo_store::PhotoStore;
use crate::types::{PhotoRecord, StoredPhoto};
use crate::LAZY_BATCH_SIZE;

/// Lazy stream of prefix-match batches
pub type PrefixBatches<'a> = Pin<Box<dyn Stream<Item = Result<Vec<PhotoRecord>>> + Send + 'a>>;

/// Exclusive upper bound covering every string that starts with `prefix`
///
/// The last character is replaced by its code-point successor, skipping the
/// surrogate gap. `Ok(None)` means no finite bound exists (the last character
/// is `char::MAX`), so the range stays open above. An empty prefix has no
/// last character and is rejected.
pub fn prefix_upper_bound(prefix: &str) -> Result<Option<String>> {
    let mut chars = prefix.chars();
    let last = chars.next_back().ok_or(StoreError::InvalidPrefix)?;

    let next = match last {
        '\u{D7FF}' => Some('\u{E000}'),
        c => char::from_u32(c as u32 + 1),
    };

    Ok(next.map(|next| {
        let mut bound = chars.as_str().to_string();
        bound.push(next);
        bound
    }))
}

impl<B: PhotoBackend> PhotoStore<B> {
    /// All records whose file name starts with `prefix`, in file-name order
    ///
    /// An empty prefix matches every record. No match is an empty list.
    pub async fn query_prefix(&self, prefix: &str) -> Result<Vec<PhotoRecord>> {
        let rows = if prefix.is_empty() {
            self.backend.range_by_file_name("", None).await?
        } else {
            let upper = prefix_upper_bound(prefix)?;
            self.backend
                .range_by_file_name(prefix, upper.as_deref())
                .await?
        };

        // Only an unbounded range can overshoot the prefix
        let records: Vec<PhotoRecord> = rows
            .into_iter()
            .filter(|row| row.file_name.starts_with(prefix))
            .map(codec::decode)
            .collect();

        debug!("Prefix {:?} matched {} photos", prefix, records.len());
        Ok(records)
    }

    /// Prefix matches as a lazy stream of batches
    ///
    /// Every batch but the last holds exactly [`LAZY_BATCH_SIZE`] records. The
    /// last batch is always yielded, even when partial or empty, and the stream
    /// ends after it. Each call starts a fresh cursor.
    pub fn query_prefix_lazy<'a>(&'a self, prefix: &str) -> PrefixBatches<'a> {
        let cursor = LazyCursor {
            backend: &self.backend,
            prefix: prefix.to_string(),
            page_size: self.config.cursor_page_size.max(1),
            after: None,
            page: VecDeque::new(),
            exhausted: false,
            finished: false,
        };

        Box::pin(stream::try_unfold(cursor, |mut cursor| async move {
            if cursor.finished {
                return Ok(None);
            }
            let batch = cursor.next_batch().await?;
            Ok::<_, StoreError>(Some((batch, cursor)))
        }))
    }
}

struct LazyCursor<'a, B> {
    backend: &'a B,
    prefix: String,
    page_size: u64,
    after: Option<String>,
    page: VecDeque<StoredPhoto>,
    exhausted: bool,
    finished: bool,
}

impl<B: PhotoBackend> LazyCursor<'_, B> {
    async fn next_row(&mut self) -> Result<Option<StoredPhoto>> {
        if self.page.is_empty() && !self.exhausted {
            let rows = self
                .backend
                .cursor_by_file_name(self.after.as_deref(), self.page_size)
                .await?;

            self.exhausted = (rows.len() as u64) < self.page_size;
            if let Some(last) = rows.last() {
                self.after = Some(last.file_name.clone());
            }
            self.page.extend(rows);
        }

        Ok(self.page.pop_front())
    }

    /// Accumulate matches until the batch is full or the cursor runs out
    async fn next_batch(&mut self) -> Result<Vec<PhotoRecord>> {
        let mut batch = Vec::with_capacity(LAZY_BATCH_SIZE);

        while let Some(row) = self.next_row().await? {
            if !row.file_name.starts_with(&self.prefix) {
                continue;
            }
            batch.push(codec::decode(row));
            if batch.len() == LAZY_BATCH_SIZE {
                return Ok(batch);
            }
        }

        self.finished = true;
        debug!(
            "Lazy query for {:?} finished with a final batch of {}",
            self.prefix,
            batch.len()
        );
        Ok(batch)
    }
}

//! Adapter from a stream of text deltas to a stream of updates.
//!
//! Hosts that receive generated text as chunks can wrap the chunk stream
//! with [`stream_updates`] instead of threading previous/current text by
//! hand. The buffer lives inside the adapter; the extractor itself stays
//! stateless.

use futures::stream::{self, Stream, StreamExt};

use crate::error::Result;
use crate::extractor::Extractor;
use crate::types::{IncrementalUpdate, StreamingInput};

/// Turn text deltas into the updates they confirm.
///
/// Steps that confirm nothing are skipped. When the input ends, the stream
/// settles through [`Extractor::finish_streaming`], so held-back text is
/// released and the last update is never pending. Dropping the stream early
/// is always safe.
///
/// # Example
///
/// ```
/// use futures::{executor::block_on, stream, StreamExt};
/// use llm_toolcall::{delta_stream::stream_updates, Extractor};
///
/// let chunks = stream::iter(vec![
///     "Checking. Act".to_string(),
///     "ion: ```json [{\"tool_name\": \"s\"}".to_string(),
///     "] ```".to_string(),
/// ]);
/// let updates: Vec<_> = block_on(stream_updates(Extractor::new(), chunks).collect());
/// assert_eq!(updates.len(), 2);
/// ```
pub fn stream_updates<S>(
    extractor: Extractor,
    deltas: S,
) -> impl Stream<Item = Result<IncrementalUpdate>>
where
    S: Stream<Item = String>,
{
    let source = Some(Box::pin(deltas));
    stream::unfold(
        (source, String::new(), extractor),
        |(mut source, mut buffer, extractor)| async move {
            loop {
                let deltas = source.as_mut()?;
                let next = deltas.next().await;
                match next {
                    Some(delta) => {
                        let previous_len = buffer.len();
                        buffer.push_str(&delta);
                        let step = extractor.extract_streaming(&StreamingInput::from_texts(
                            &buffer[..previous_len],
                            &buffer,
                            &delta,
                        ));
                        if let Some(item) = step.transpose() {
                            return Some((item, (source, buffer, extractor)));
                        }
                    }
                    None => {
                        source = None;
                        let update = extractor.finish_streaming(&buffer)?;
                        return Some((Ok(update), (source, buffer, extractor)));
                    }
                }
            }
        },
    )
}

/// Run [`stream_updates`] over an in-memory sequence of deltas.
pub fn collect_updates<I>(extractor: Extractor, deltas: I) -> Result<Vec<IncrementalUpdate>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let deltas = stream::iter(deltas.into_iter().map(Into::into));
    futures::executor::block_on(stream_updates(extractor, deltas).collect::<Vec<_>>())
        .into_iter()
        .collect()
}

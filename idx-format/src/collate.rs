use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use idx_error::IdxResult;

/// Advances several streams in lock-step, yielding one slot per source at every step.
///
/// Slot `i` holds the next item of source `i`, or `None` once that source has completed. A step
/// is only yielded once every unfinished source has resolved, and the collated stream ends when
/// all sources have completed. The first error from any source is yielded on its own and ends the
/// collated stream.
pub struct Collate<S: Stream> {
    sources: Vec<Option<S>>,
    step: Vec<Option<Option<S::Item>>>,
    done: bool,
}

/// Collate `sources` into a stream of aligned steps.
pub fn collate<S, T>(sources: impl IntoIterator<Item = S>) -> Collate<S>
where
    S: Stream<Item = IdxResult<T>> + Unpin,
{
    let sources: Vec<Option<S>> = sources.into_iter().map(Some).collect();
    let step = sources.iter().map(|_| None).collect();
    Collate {
        sources,
        step,
        done: false,
    }
}

impl<S: Stream> Collate<S> {
    /// The number of slots in every step.
    pub fn width(&self) -> usize {
        self.sources.len()
    }
}

// Sources are only ever polled through `poll_next_unpin`.
impl<S: Stream> Unpin for Collate<S> {}

impl<S, T> Stream for Collate<S>
where
    S: Stream<Item = IdxResult<T>> + Unpin,
{
    type Item = IdxResult<Vec<Option<T>>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let mut pending = false;
        let mut failed = None;
        for (source, slot) in this.sources.iter_mut().zip(this.step.iter_mut()) {
            if slot.is_some() {
                continue;
            }
            let Some(stream) = source.as_mut() else {
                *slot = Some(None);
                continue;
            };
            match stream.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => *slot = Some(Some(Ok(item))),
                Poll::Ready(Some(Err(e))) => {
                    failed = Some(e);
                    break;
                }
                Poll::Ready(None) => {
                    *source = None;
                    *slot = Some(None);
                }
                Poll::Pending => pending = true,
            }
        }
        if let Some(e) = failed {
            this.done = true;
            this.sources.clear();
            this.step.clear();
            log::debug!("collation ended by a source error");
            return Poll::Ready(Some(Err(e)));
        }
        if pending {
            return Poll::Pending;
        }

        let step: Vec<Option<T>> = this
            .step
            .iter_mut()
            .map(|slot| slot.take().flatten().and_then(Result::ok))
            .collect();
        if step.iter().all(Option::is_none) {
            this.done = true;
            log::trace!("collation of {} sources complete", this.sources.len());
            return Poll::Ready(None);
        }
        Poll::Ready(Some(Ok(step)))
    }
}

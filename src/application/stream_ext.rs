//! Stream combinators used to compose listener streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};

/// Stream for [`SwitchStreamExt::switch_map`].
///
/// Each outer item is mapped to an inner stream that replaces the previous
/// one. The previous inner stream is dropped before the mapping function
/// runs, so its listener is gone before the next one is registered.
#[must_use = "streams do nothing unless polled"]
pub struct SwitchMap<S, F, U> {
    outer: Option<S>,
    map: F,
    inner: Option<U>,
}

impl<S, F, U> Stream for SwitchMap<S, F, U>
where
    S: Stream + Unpin,
    F: FnMut(S::Item) -> U + Unpin,
    U: Stream + Unpin,
{
    type Item = U::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<U::Item>> {
        let this = self.get_mut();

        // Always consume the outer stream first so the latest item wins.
        if let Some(outer) = this.outer.as_mut() {
            loop {
                match outer.poll_next_unpin(cx) {
                    Poll::Ready(Some(item)) => {
                        this.inner = None;
                        this.inner = Some((this.map)(item));
                    }
                    Poll::Ready(None) => {
                        this.outer = None;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }

        if let Some(inner) = this.inner.as_mut() {
            match inner.poll_next_unpin(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.inner = None,
                Poll::Pending => return Poll::Pending,
            }
        }

        if this.outer.is_none() && this.inner.is_none() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

/// Stream for [`SwitchStreamExt::distinct_until_changed`].
#[must_use = "streams do nothing unless polled"]
pub struct DistinctUntilChanged<S: Stream> {
    stream: S,
    last: Option<S::Item>,
}

impl<S> Stream for DistinctUntilChanged<S>
where
    S: Stream + Unpin,
    S::Item: Clone + PartialEq + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        let this = self.get_mut();
        loop {
            match this.stream.poll_next_unpin(cx) {
                Poll::Ready(Some(item)) => {
                    if this.last.as_ref() == Some(&item) {
                        continue;
                    }
                    this.last = Some(item.clone());
                    return Poll::Ready(Some(item));
                }
                other => return other,
            }
        }
    }
}

pub trait SwitchStreamExt: Stream + Sized {
    /// Maps each item to a stream and follows only the most recent one.
    fn switch_map<F, U>(self, map: F) -> SwitchMap<Self, F, U>
    where
        F: FnMut(Self::Item) -> U,
        U: Stream,
    {
        SwitchMap {
            outer: Some(self),
            map,
            inner: None,
        }
    }

    /// Suppresses consecutive duplicate items.
    fn distinct_until_changed(self) -> DistinctUntilChanged<Self>
    where
        Self::Item: Clone + PartialEq,
    {
        DistinctUntilChanged {
            stream: self,
            last: None,
        }
    }
}

impl<S: Stream> SwitchStreamExt for S {}

//! Character-by-character SSE emitter for chat answers.
//!
//! The emitter is a lazily polled stream owned by the response body. When a
//! client disconnects axum drops the body, which drops the pending sleep and
//! ends the stream without any further work.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::Event;
use futures::stream;
use tokio_stream::Stream;
use tracing::debug;

/// Progress through one answer.
struct Emitter {
    chars: std::vec::IntoIter<char>,
    delay: Duration,
    sent: usize,
    total: usize,
}

impl Drop for Emitter {
    fn drop(&mut self) {
        if self.sent < self.total {
            debug!(
                sent = self.sent,
                total = self.total,
                "Chat stream dropped before completion"
            );
        }
    }
}

/// Stream `answer` as one SSE event per character, pausing `delay` between
/// characters. Carriage returns are skipped since SSE data cannot carry them.
pub fn char_events(
    answer: &str,
    delay: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let chars: Vec<char> = answer.chars().filter(|c| *c != '\r').collect();
    let emitter = Emitter {
        total: chars.len(),
        chars: chars.into_iter(),
        delay,
        sent: 0,
    };

    stream::unfold(emitter, |mut emitter| async move {
        let c = emitter.chars.next()?;
        if emitter.sent > 0 && !emitter.delay.is_zero() {
            tokio::time::sleep(emitter.delay).await;
        }
        emitter.sent += 1;
        Some((Ok(Event::default().data(c.to_string())), emitter))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::sse::Sse;
    use axum::response::IntoResponse;
    use std::time::Instant;
    use tokio_stream::StreamExt;

    async fn render(answer: &str, delay: Duration) -> String {
        let resp = Sse::new(char_events(answer, delay)).into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_one_frame_per_char() {
        assert_eq!(render("hi", Duration::ZERO).await, "data: h\n\ndata: i\n\n");
    }

    #[tokio::test]
    async fn test_multibyte_chars_are_single_frames() {
        assert_eq!(render("é✓", Duration::ZERO).await, "data: é\n\ndata: ✓\n\n");
    }

    #[tokio::test]
    async fn test_carriage_return_is_skipped() {
        let mut events = Box::pin(char_events("a\r\nb", Duration::ZERO));
        let mut count = 0;
        while events.next().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_empty_answer_yields_nothing() {
        assert_eq!(render("", Duration::ZERO).await, "");
    }

    #[tokio::test]
    async fn test_delay_between_chars() {
        let start = Instant::now();
        render("abc", Duration::from_millis(30)).await;
        // Two gaps for three characters, none before the first.
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_drop_mid_stream_stops_emitting() {
        let mut events = Box::pin(char_events("hello", Duration::from_secs(60)));
        assert!(events.next().await.is_some());
        // The next item would sleep for a minute; dropping must not block.
        let next = tokio::time::timeout(Duration::from_millis(50), events.next()).await;
        assert!(next.is_err());
        drop(events);
    }
}

use crossterm::event::{Event as TermEvent, KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal size changed; the next draw picks up the new area
    Resize,
    /// Flash message housekeeping
    Tick,
    /// The terminal stopped delivering input
    InputClosed,
}

/// Map a raw terminal event to a quiz event. Key releases and repeats are
/// dropped (Windows reports them), as are mouse and focus events.
fn translate(event: TermEvent) -> Option<Event> {
    match event {
        TermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        TermEvent::Resize(_, _) => Some(Event::Resize),
        _ => None,
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut ticks = tokio::time::interval(tick_rate);

            loop {
                let event = tokio::select! {
                    maybe_event = reader.next() => match maybe_event {
                        Some(Ok(raw)) => match translate(raw) {
                            Some(event) => event,
                            None => continue,
                        },
                        Some(Err(e)) => {
                            tracing::debug!(error = %e, "terminal input error");
                            Event::InputClosed
                        }
                        None => Event::InputClosed,
                    },
                    _ = ticks.tick() => Event::Tick,
                };

                let closed = event == Event::InputClosed;
                if tx.send(event).is_err() || closed {
                    break;
                }
            }
        });

        EventHandler { rx }
    }

    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.unwrap_or(Event::InputClosed)
    }
}

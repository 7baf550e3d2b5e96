//! Single-threaded event dispatch
//!
//! Producers (tick timer, companion transport, window stack) post [`Event`]s
//! into an [`EventQueue`]. The [`EventLoop`] takes them out one at a time and
//! runs the matching [`EventHandler`] method to completion before looking at
//! the next one.

use chrono::NaiveDateTime;
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};

use crate::{
    error::Result,
    system::message::{DeliveryError, InboxPayload},
};

/// Default queue depth
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Queue shared between event producers and the event loop
pub type EventQueue<M, const N: usize = EVENT_QUEUE_DEPTH> = Channel<M, Event, N>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    WindowLoad,
    WindowUnload,
    /// Minute tick with the current local time
    Tick(NaiveDateTime),
    InboxReceived(InboxPayload),
    InboxDropped(DeliveryError),
    OutboxSent,
    OutboxFailed(DeliveryError),
}

/// Handlers for everything the event loop delivers
pub trait EventHandler {
    /// Build the window contents; an error here is a startup fault
    fn on_window_load(&mut self) -> Result<()>;

    /// Release everything created by [`EventHandler::on_window_load`]
    fn on_window_unload(&mut self);

    fn on_tick(&mut self, now: NaiveDateTime);

    fn on_inbox_received(&mut self, payload: &[u8]);

    fn on_inbox_dropped(&mut self, reason: DeliveryError) {
        crate::error!("Message dropped: {}", reason);
    }

    fn on_outbox_sent(&mut self) {
        crate::info!("Outbox send success");
    }

    fn on_outbox_failed(&mut self, reason: DeliveryError) {
        crate::error!("Outbox send failed: {}", reason);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// The window was unloaded, no further events are handled
    Exited,
}

pub struct EventLoop<'q, M, H, const N: usize>
where
    M: RawMutex,
    H: EventHandler,
{
    queue: &'q EventQueue<M, N>,
    handler: H,
    state: LoopState,
}

impl<'q, M, H, const N: usize> EventLoop<'q, M, H, N>
where
    M: RawMutex,
    H: EventHandler,
{
    /// Register `handler` for all events posted to `queue`
    pub fn new(queue: &'q EventQueue<M, N>, handler: H) -> Self {
        Self {
            queue,
            handler,
            state: LoopState::Running,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Give the handler back, e.g. to inspect it after the loop exited
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Run the handler for a single event
    pub fn dispatch(&mut self, event: Event) -> Result<LoopState> {
        if self.state == LoopState::Exited {
            crate::warn!("Event after window unload ignored");
            return Ok(LoopState::Exited);
        }

        match event {
            Event::WindowLoad => self.handler.on_window_load()?,
            Event::WindowUnload => {
                self.handler.on_window_unload();
                self.state = LoopState::Exited;
            }
            Event::Tick(now) => self.handler.on_tick(now),
            Event::InboxReceived(payload) => self.handler.on_inbox_received(&payload),
            Event::InboxDropped(reason) => self.handler.on_inbox_dropped(reason),
            Event::OutboxSent => self.handler.on_outbox_sent(),
            Event::OutboxFailed(reason) => self.handler.on_outbox_failed(reason),
        }

        Ok(self.state)
    }

    /// Wait for and handle the next event
    pub async fn next(&mut self) -> Result<LoopState> {
        let event = self.queue.receive().await;
        self.dispatch(event)
    }

    /// Handle events until the window unloads
    pub async fn run(&mut self) -> Result<()> {
        while self.next().await? == LoopState::Running {}
        Ok(())
    }

    /// Handle everything already queued without waiting
    pub fn run_until_idle(&mut self) -> Result<LoopState> {
        while self.state == LoopState::Running {
            match self.queue.try_receive() {
                Ok(event) => {
                    self.dispatch(event)?;
                }
                Err(_) => break,
            }
        }
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ui::resources::FontId;
    use chrono::NaiveDate;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[derive(Default)]
    struct Recorder {
        fail_load: bool,
        seen: Vec<&'static str>,
    }

    impl EventHandler for Recorder {
        fn on_window_load(&mut self) -> Result<()> {
            self.seen.push("load");
            if self.fail_load {
                return Err(Error::FontUnavailable(FontId::ProFont14));
            }
            Ok(())
        }

        fn on_window_unload(&mut self) {
            self.seen.push("unload");
        }

        fn on_tick(&mut self, _now: NaiveDateTime) {
            self.seen.push("tick");
        }

        fn on_inbox_received(&mut self, _payload: &[u8]) {
            self.seen.push("inbox");
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn events_are_handled_in_order_until_unload() {
        let queue: EventQueue<NoopRawMutex> = Channel::new();
        queue.try_send(Event::WindowLoad).unwrap();
        queue.try_send(Event::Tick(noon())).unwrap();
        queue.try_send(Event::InboxReceived(InboxPayload::new())).unwrap();
        queue.try_send(Event::OutboxSent).unwrap();
        queue.try_send(Event::WindowUnload).unwrap();
        queue.try_send(Event::Tick(noon())).unwrap();

        let mut event_loop = EventLoop::new(&queue, Recorder::default());
        assert_eq!(event_loop.run_until_idle(), Ok(LoopState::Exited));
        assert_eq!(
            event_loop.handler().seen,
            vec!["load", "tick", "inbox", "unload"]
        );

        // The tick queued after unload stays in the queue
        assert!(queue.try_receive().is_ok());
    }

    #[test]
    fn load_failure_is_reported() {
        let queue: EventQueue<NoopRawMutex> = Channel::new();
        let mut event_loop = EventLoop::new(
            &queue,
            Recorder {
                fail_load: true,
                ..Recorder::default()
            },
        );
        assert_eq!(
            event_loop.dispatch(Event::WindowLoad),
            Err(Error::FontUnavailable(FontId::ProFont14))
        );
        assert_eq!(event_loop.state(), LoopState::Running);
    }

    #[test]
    fn dispatch_after_exit_is_ignored() {
        let queue: EventQueue<NoopRawMutex> = Channel::new();
        let mut event_loop = EventLoop::new(&queue, Recorder::default());
        event_loop.dispatch(Event::WindowUnload).unwrap();
        assert_eq!(event_loop.dispatch(Event::WindowLoad), Ok(LoopState::Exited));
        assert_eq!(event_loop.into_handler().seen, vec!["unload"]);
    }
}

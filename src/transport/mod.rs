//! MIDI transport boundary
//!
//! The engine talks to a device through a [`MidiChannel`]: a bidirectional
//! message pipe with a bounded blocking receive. Channels carry fully framed
//! messages; a SysEx message is sent and received with its `F0`/`F7` bytes.

#[cfg(feature = "midir")]
pub mod midir;
pub mod simulated;

use std::time::{Duration, Instant};

use log::trace;

use crate::error::Result;
use crate::sysex::MidiMessage;

#[cfg(feature = "midir")]
pub use self::midir::{list_ports, MidirChannel, PortList};
pub use simulated::SimulatedReface;

/// Bidirectional MIDI message channel
pub trait MidiChannel {
    /// Send one complete message
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Wait up to `timeout` for the next incoming message
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Option<MidiMessage>>;
}

impl<C: MidiChannel + ?Sized> MidiChannel for Box<C> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<MidiMessage>> {
        (**self).receive(timeout)
    }
}

/// Wait for the next SysEx message, skipping anything else
///
/// `timeout` bounds the whole wait, not each received message.
pub fn await_sysex<C: MidiChannel + ?Sized>(
    channel: &mut C,
    timeout: Duration,
) -> Result<Option<MidiMessage>> {
    await_matching(channel, timeout, MidiMessage::is_sysex)
}

/// Wait for any message at all
pub fn await_any<C: MidiChannel + ?Sized>(
    channel: &mut C,
    timeout: Duration,
) -> Result<Option<MidiMessage>> {
    await_matching(channel, timeout, |_| true)
}

fn await_matching<C, F>(channel: &mut C, timeout: Duration, accept: F) -> Result<Option<MidiMessage>>
where
    C: MidiChannel + ?Sized,
    F: Fn(&MidiMessage) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match channel.receive(remaining)? {
            Some(msg) if accept(&msg) => return Ok(Some(msg)),
            Some(msg) => trace!("Skipping {:?}", msg),
            None => return Ok(None),
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed script of incoming messages
    struct Scripted {
        incoming: VecDeque<MidiMessage>,
    }

    impl Scripted {
        fn new(messages: Vec<Vec<u8>>) -> Self {
            Self {
                incoming: messages.into_iter().map(MidiMessage::new).collect(),
            }
        }
    }

    impl MidiChannel for Scripted {
        fn send(&mut self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        fn receive(&mut self, _timeout: Duration) -> Result<Option<MidiMessage>> {
            Ok(self.incoming.pop_front())
        }
    }

    #[test]
    fn test_await_sysex_skips_channel_messages() {
        let mut channel = Scripted::new(vec![
            vec![0xFE],
            vec![0x90, 0x3C, 0x40],
            vec![0xF0, 0x01, 0xF7],
        ]);
        let msg = await_sysex(&mut channel, Duration::from_millis(100)).unwrap();
        assert_eq!(msg.unwrap().as_bytes(), &[0xF0, 0x01, 0xF7]);
    }

    #[test]
    fn test_await_sysex_none_when_only_noise() {
        let mut channel = Scripted::new(vec![vec![0xFE], vec![0xF8]]);
        let msg = await_sysex(&mut channel, Duration::from_millis(100)).unwrap();
        assert!(msg.is_none());
    }

    #[test]
    fn test_await_any_takes_first_message() {
        let mut channel = Scripted::new(vec![vec![0xFE], vec![0xF0, 0x01, 0xF7]]);
        let msg = await_any(&mut channel, Duration::from_millis(100)).unwrap();
        assert_eq!(msg.unwrap().as_bytes(), &[0xFE]);
    }

    /// Sends active sensing every millisecond, forever
    struct Chatter;

    impl MidiChannel for Chatter {
        fn send(&mut self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        fn receive(&mut self, timeout: Duration) -> Result<Option<MidiMessage>> {
            std::thread::sleep(timeout.min(Duration::from_millis(1)));
            Ok(Some(MidiMessage::new(vec![0xFE])))
        }
    }

    /// Blocks for the full timeout and never delivers anything
    struct Mute;

    impl MidiChannel for Mute {
        fn send(&mut self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        fn receive(&mut self, timeout: Duration) -> Result<Option<MidiMessage>> {
            std::thread::sleep(timeout);
            Ok(None)
        }
    }

    #[test]
    fn test_await_sysex_deadline_covers_whole_wait() {
        let timeout = Duration::from_millis(30);
        let started = Instant::now();
        let msg = await_sysex(&mut Chatter, timeout).unwrap();
        let elapsed = started.elapsed();

        assert!(msg.is_none());
        assert!(elapsed >= timeout, "returned early after {:?}", elapsed);
        assert!(elapsed < timeout * 5, "waited {:?}", elapsed);
    }

    #[test]
    fn test_await_any_bounded_when_silent() {
        let timeout = Duration::from_millis(30);
        let started = Instant::now();
        let msg = await_any(&mut Mute, timeout).unwrap();
        let elapsed = started.elapsed();

        assert!(msg.is_none());
        assert!(elapsed < timeout * 5, "waited {:?}", elapsed);
    }

    #[test]
    fn test_boxed_channel() {
        let mut channel: Box<dyn MidiChannel> = Box::new(Scripted::new(vec![vec![0xF0, 0xF7]]));
        assert!(await_sysex(&mut channel, Duration::from_millis(10))
            .unwrap()
            .is_some());
    }
}

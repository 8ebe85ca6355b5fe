//! MIDI Input Manager
//!
//! Handles MIDI device enumeration, connection, and message forwarding.
//! Hardware connections live on a dedicated thread for platform
//! thread-safety; the midir callback only copies bytes into a channel.

use crate::event::RawMidiMessage;
use crate::status::MidiStatus;
use arc_swap::ArcSwap;
use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};
use std::sync::Arc;

#[cfg(feature = "midi-io")]
use crate::error::{Error, Result};
#[cfg(feature = "midi-io")]
use crate::status::ACCESS_DENIED;
#[cfg(feature = "midi-io")]
use crossbeam_channel::bounded;
#[cfg(feature = "midi-io")]
use midir::{MidiInput, MidiInputConnection};
#[cfg(feature = "midi-io")]
use std::time::Duration;

#[cfg(feature = "midi-io")]
const CLIENT_NAME: &str = "sightread-midi-input";

/// How long `connect` waits for the MIDI thread to answer.
#[cfg(feature = "midi-io")]
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Information about an available MIDI input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiInputDevice {
    /// Device index (for connection)
    pub index: usize,
    /// Device name
    pub name: String,
}

/// Commands sent to the MIDI thread
#[cfg(feature = "midi-io")]
enum MidiCommand {
    Connect(Sender<MidiStatus>),
    Disconnect,
    Shutdown,
}

pub struct MidiInputManager {
    message_sender: Sender<RawMidiMessage>,
    message_receiver: Receiver<RawMidiMessage>,
    status: Arc<ArcSwap<MidiStatus>>,
    #[cfg(feature = "midi-io")]
    command_sender: Sender<MidiCommand>,
}

impl MidiInputManager {
    pub fn new() -> Self {
        let (message_sender, message_receiver) = unbounded();
        let status = Arc::new(ArcSwap::from_pointee(MidiStatus::default()));

        #[cfg(feature = "midi-io")]
        let command_sender = {
            let (command_sender, command_receiver) = bounded(16);
            let messages = message_sender.clone();
            let thread_status = Arc::clone(&status);
            let spawned = std::thread::Builder::new()
                .name("sightread-midi".to_string())
                .spawn(move || Self::midi_thread(command_receiver, messages, thread_status));
            if let Err(e) = spawned {
                tracing::warn!("Failed to start MIDI thread: {}", e);
            }
            command_sender
        };

        Self {
            message_sender,
            message_receiver,
            status,
            #[cfg(feature = "midi-io")]
            command_sender,
        }
    }

    /// Request MIDI access and subscribe to every input device.
    ///
    /// Never fails: problems are reported through the returned status, and
    /// programmatic input via [`inject`](Self::inject) keeps working.
    #[cfg(feature = "midi-io")]
    pub fn connect(&self) -> MidiStatus {
        let (reply_sender, reply_receiver) = bounded(1);
        if self
            .command_sender
            .send(MidiCommand::Connect(reply_sender))
            .is_err()
        {
            return self.set_status(MidiStatus::unsupported(Error::ThreadStopped.to_string()));
        }

        match reply_receiver.recv_timeout(CONNECT_TIMEOUT) {
            Ok(status) => status,
            Err(_) => {
                tracing::warn!("MIDI connection request timed out");
                self.status()
            }
        }
    }

    #[cfg(not(feature = "midi-io"))]
    pub fn connect(&self) -> MidiStatus {
        tracing::warn!("{}", crate::error::Error::Unsupported);
        self.set_status(MidiStatus::unsupported(crate::status::ACCESS_DENIED))
    }

    /// Close every device connection. Injected input is unaffected.
    pub fn disconnect(&self) {
        #[cfg(feature = "midi-io")]
        let _ = self.command_sender.send(MidiCommand::Disconnect);

        #[cfg(not(feature = "midi-io"))]
        {
            let current = self.status();
            self.set_status(MidiStatus {
                connected: false,
                devices: Vec::new(),
                ..current
            });
        }
    }

    pub fn status(&self) -> MidiStatus {
        (**self.status.load()).clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.load().connected
    }

    fn set_status(&self, status: MidiStatus) -> MidiStatus {
        self.status.store(Arc::new(status.clone()));
        status
    }

    /// Queue raw bytes as if a device had sent them.
    pub fn inject(&self, bytes: &[u8]) -> bool {
        self.message_sender
            .send(RawMidiMessage::new(0, bytes))
            .is_ok()
    }

    /// Drain pending messages without blocking.
    pub fn poll(&self) -> TryIter<'_, RawMidiMessage> {
        self.message_receiver.try_iter()
    }

    /// Additional receiver for the raw message stream.
    pub fn receiver(&self) -> Receiver<RawMidiMessage> {
        self.message_receiver.clone()
    }

    #[cfg(feature = "midi-io")]
    pub fn list_devices() -> Vec<MidiInputDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new("sightread-device-list") {
            let ports = midi_input.ports();
            for (index, port) in ports.iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiInputDevice { index, name });
            }
        }
        devices
    }

    #[cfg(not(feature = "midi-io"))]
    pub fn list_devices() -> Vec<MidiInputDevice> {
        Vec::new()
    }

    #[cfg(feature = "midi-io")]
    fn midi_thread(
        command_receiver: Receiver<MidiCommand>,
        messages: Sender<RawMidiMessage>,
        status: Arc<ArcSwap<MidiStatus>>,
    ) {
        let mut connections: Vec<MidiInputConnection<()>> = Vec::new();

        for command in command_receiver.iter() {
            match command {
                MidiCommand::Connect(reply) => {
                    // Drop existing connections before reconnecting
                    connections.clear();

                    let next = match Self::connect_all(&messages) {
                        Ok((opened, names)) => {
                            tracing::debug!("Connected MIDI inputs: {:?}", names);
                            connections = opened;
                            MidiStatus::connected_to(names)
                        }
                        Err(e) => {
                            tracing::warn!("MIDI access failed: {}", e);
                            MidiStatus::unsupported(format!("{} ({})", ACCESS_DENIED, e))
                        }
                    };
                    status.store(Arc::new(next.clone()));
                    let _ = reply.send(next);
                }
                MidiCommand::Disconnect => {
                    connections.clear();
                    let current = (**status.load()).clone();
                    status.store(Arc::new(MidiStatus {
                        connected: false,
                        devices: Vec::new(),
                        ..current
                    }));
                }
                MidiCommand::Shutdown => break,
            }
        }
    }

    #[cfg(feature = "midi-io")]
    fn connect_all(
        messages: &Sender<RawMidiMessage>,
    ) -> Result<(Vec<MidiInputConnection<()>>, Vec<String>)> {
        let port_count = MidiInput::new(CLIENT_NAME)?.port_count();
        let mut connections = Vec::with_capacity(port_count);
        let mut names = Vec::with_capacity(port_count);

        for index in 0..port_count {
            // Each connection consumes its MidiInput client.
            let midi_input = MidiInput::new(CLIENT_NAME)?;
            let ports = midi_input.ports();
            let Some(port) = ports.get(index) else {
                continue;
            };
            let name = midi_input
                .port_name(port)
                .unwrap_or_else(|_| format!("MIDI Device {}", index));

            let sender = messages.clone();
            let connection = midi_input.connect(
                port,
                "sightread-input",
                move |timestamp, bytes, _| {
                    if sender.send(RawMidiMessage::new(timestamp, bytes)).is_err() {
                        tracing::debug!("MIDI message receiver gone, dropping message");
                    }
                },
                (),
            );

            match connection.map_err(Error::from) {
                Ok(connection) => {
                    connections.push(connection);
                    names.push(name);
                }
                Err(e) => tracing::warn!("Skipping MIDI device {}: {}", name, e),
            }
        }

        Ok((connections, names))
    }
}

impl Default for MidiInputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "midi-io")]
impl Drop for MidiInputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiCommand::Shutdown);
    }
}

impl std::fmt::Debug for MidiInputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiInputManager")
            .field("status", &**self.status.load())
            .field("pending", &self.message_receiver.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_creation() {
        let manager = MidiInputManager::new();
        assert!(!manager.is_connected());
        assert_eq!(manager.status(), MidiStatus::default());
    }

    #[test]
    fn test_inject_and_poll() {
        let manager = MidiInputManager::new();
        assert!(manager.inject(&[0x90, 60, 100]));
        assert!(manager.inject(&[0x80, 60, 0]));

        let messages: Vec<RawMidiMessage> = manager.poll().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].bytes.as_slice(), &[0x90, 60, 100]);
        assert_eq!(manager.poll().count(), 0);
    }

    #[test]
    fn test_extra_receiver_shares_stream() {
        let manager = MidiInputManager::new();
        let receiver = manager.receiver();
        manager.inject(&[0x90, 64, 90]);
        assert_eq!(receiver.try_recv().unwrap().bytes[1], 64);
        assert_eq!(manager.poll().count(), 0);
    }

    #[test]
    fn test_connect_never_panics() {
        // Device availability depends on the system; only the status shape
        // is checked.
        let manager = MidiInputManager::new();
        let status = manager.connect();
        if !status.supported {
            assert!(status.error.is_some());
            assert!(!status.connected);
        }
        assert_eq!(manager.status(), status);

        // Injected input keeps working whatever the outcome.
        assert!(manager.inject(&[0x90, 60, 1]));
    }

    #[test]
    fn test_disconnect_clears_connection_flag() {
        let manager = MidiInputManager::new();
        manager.connect();
        manager.disconnect();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!manager.is_connected());
    }

    #[test]
    fn test_list_devices() {
        // devices might be empty on CI or systems without MIDI
        let devices = MidiInputManager::list_devices();
        for (i, device) in devices.iter().enumerate() {
            assert_eq!(device.index, i);
        }
    }
}

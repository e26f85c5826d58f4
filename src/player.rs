//! Playback of rendered buffers on a dedicated worker thread.
//!
//! Callers hand buffers to a [`PlaybackWorker`] through an unbounded queue and
//! get a [`PlayerEvent`] back once each one has been fully consumed. The
//! worker owns its [`SampleSink`]; [`DeviceSink`] is the sound card.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

/// How long `close` waits so the device can drain its last hardware buffer
const DRAIN_TAIL: Duration = Duration::from_millis(100);

/// Slack on top of a buffer's own length before giving up on the device
const PLAY_TIMEOUT_SLACK: Duration = Duration::from_secs(2);

/// Something that can play mono 16-bit samples, blocking until they are consumed.
pub trait SampleSink {
    fn play(&mut self, samples: &[i16]) -> Result<()>;

    /// Release the underlying resource. Calling it twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// A message to the playback worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerMessage {
    Samples(Vec<i16>),
    /// Marks the end of a piece; answered with `PlayerEvent::MusicEnded`
    EndOfStream,
    Shutdown,
}

/// Notifications from the playback worker, in message order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    BufferConsumed,
    MusicEnded,
    Failed(String),
}

pub struct PlaybackWorker {
    message_tx: Option<Sender<PlayerMessage>>,
    event_rx: Receiver<PlayerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackWorker {
    /// Start the worker. `open_sink` runs on the worker thread, so the sink
    /// itself never crosses threads.
    pub fn spawn<S, F>(open_sink: F) -> Result<Self>
    where
        S: SampleSink,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (message_tx, message_rx) = channel::unbounded();
        let (event_tx, event_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded::<Result<()>>(1);

        let thread = thread::Builder::new()
            .name("playback".into())
            .spawn(move || {
                let mut sink = match open_sink() {
                    Ok(sink) => {
                        let _ = ready_tx.send(Ok(()));
                        sink
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run_worker(&mut sink, &message_rx, &event_tx);
                if let Err(e) = sink.close() {
                    warn!("closing sample sink: {}", e);
                }
                debug!("playback worker stopped");
            })
            .map_err(|e| Error::Audio(format!("failed to spawn playback thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                message_tx: Some(message_tx),
                event_rx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Audio("playback thread exited during startup".into()))
            }
        }
    }

    /// Queue a buffer for playback. Returns immediately.
    pub fn play(&self, samples: Vec<i16>) -> Result<()> {
        self.send(PlayerMessage::Samples(samples))
    }

    /// Queue an end-of-piece marker
    pub fn end_of_stream(&self) -> Result<()> {
        self.send(PlayerMessage::EndOfStream)
    }

    pub fn events(&self) -> &Receiver<PlayerEvent> {
        &self.event_rx
    }

    /// Block until the next `MusicEnded`, skipping buffer notifications.
    pub fn wait_for_end(&self) -> Result<()> {
        loop {
            match self.event_rx.recv() {
                Ok(PlayerEvent::MusicEnded) => return Ok(()),
                Ok(PlayerEvent::BufferConsumed) => {}
                Ok(PlayerEvent::Failed(message)) => return Err(Error::Audio(message)),
                Err(_) => return Err(Error::PlayerClosed),
            }
        }
    }

    /// Stop the worker after everything already queued, then release the sink.
    pub fn close(&mut self) {
        if let Some(tx) = self.message_tx.take() {
            let _ = tx.send(PlayerMessage::Shutdown);
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("playback thread panicked");
            }
        }
    }

    fn send(&self, message: PlayerMessage) -> Result<()> {
        let tx = self.message_tx.as_ref().ok_or(Error::PlayerClosed)?;
        tx.send(message).map_err(|_| Error::PlayerClosed)
    }
}

impl Drop for PlaybackWorker {
    fn drop(&mut self) {
        self.close();
    }
}

/// Play queued messages until `Shutdown` or the queue disconnects.
///
/// After a failed buffer the rest of that piece is dropped unplayed, up to
/// the next `EndOfStream`.
fn run_worker<S: SampleSink>(
    sink: &mut S,
    message_rx: &Receiver<PlayerMessage>,
    event_tx: &Sender<PlayerEvent>,
) {
    let mut failed = false;
    for message in message_rx.iter() {
        let event = match message {
            PlayerMessage::Samples(samples) if failed => {
                debug!("dropping {} samples after playback failure", samples.len());
                continue;
            }
            PlayerMessage::Samples(samples) => match sink.play(&samples) {
                Ok(()) => PlayerEvent::BufferConsumed,
                Err(e) => {
                    error!("playback failed: {}", e);
                    failed = true;
                    PlayerEvent::Failed(e.to_string())
                }
            },
            PlayerMessage::EndOfStream => {
                failed = false;
                PlayerEvent::MusicEnded
            }
            PlayerMessage::Shutdown => break,
        };
        // Nobody listening is fine
        let _ = event_tx.send(event);
    }
}

/// The default output device, opened at a fixed sampling rate
pub struct DeviceSink {
    stream: Option<cpal::Stream>,
    buffer_tx: Sender<Vec<i16>>,
    done_rx: Receiver<()>,
    sampling_rate: u32,
}

impl DeviceSink {
    pub fn open(sampling_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output audio device available".into()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| Error::Audio(format!("failed to get default output config: {}", e)))?;
        let sample_format = supported.sample_format();
        let mut config: cpal::StreamConfig = supported.into();
        config.sample_rate = sampling_rate;

        let (buffer_tx, buffer_rx) = channel::unbounded();
        let (done_tx, done_rx) = channel::unbounded();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer_rx, done_tx),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer_rx, done_tx),
            other => Err(Error::Audio(format!("unsupported sample format {:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| Error::Audio(format!("failed to play stream: {}", e)))?;
        info!(
            "audio stream open: {} Hz, {} channel(s), {:?}",
            sampling_rate, config.channels, sample_format
        );

        Ok(Self {
            stream: Some(stream),
            buffer_tx,
            done_rx,
            sampling_rate,
        })
    }
}

impl SampleSink for DeviceSink {
    fn play(&mut self, samples: &[i16]) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::Audio("output device is closed".into()));
        }
        if samples.is_empty() {
            return Ok(());
        }

        // A buffer that timed out earlier may have finished since
        while self.done_rx.try_recv().is_ok() {}

        let length = Duration::from_secs_f64(samples.len() as f64 / self.sampling_rate as f64);
        self.buffer_tx
            .send(samples.to_vec())
            .map_err(|_| Error::Audio("audio callback disconnected".into()))?;
        self.done_rx
            .recv_timeout(length + PLAY_TIMEOUT_SLACK)
            .map_err(|_| Error::Audio("audio device stopped consuming samples".into()))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            thread::sleep(DRAIN_TAIL);
            stream
                .pause()
                .map_err(|e| Error::Audio(format!("failed to pause stream: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer_rx: Receiver<Vec<i16>>,
    done_tx: Sender<()>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let channels = config.channels as usize;
    let mut current: Vec<i16> = Vec::new();
    let mut position = 0usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    if position >= current.len() {
                        match buffer_rx.try_recv() {
                            Ok(next) => {
                                current = next;
                                position = 0;
                            }
                            Err(_) => current.clear(),
                        }
                    }

                    let value = match current.get(position) {
                        Some(&value) => {
                            position += 1;
                            if position == current.len() {
                                let _ = done_tx.send(());
                            }
                            value
                        }
                        // Underrun: silence
                        None => 0,
                    };

                    // Mono to every channel
                    let sample = T::from_sample(value);
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            move |err| error!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| Error::Audio(format!("failed to build output stream: {}", e)))
}

//! PCM decoding and single-stream playback for the spoken podcast.

use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{info, warn};

use crate::error::{AgentError, Result};

/// The TTS endpoint answers with mono 16-bit PCM at 24 kHz
pub const PODCAST_SAMPLE_RATE: u32 = 24_000;
pub const PODCAST_CHANNELS: u16 = 1;

/// Decoded audio, one `Vec<f32>` per channel, samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Frame-interleaved samples, the layout audio devices consume
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

/// Decode the base64 text the provider puts in `inlineData.data`
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(AgentError::Audio("empty audio payload".to_string()));
    }
    Ok(STANDARD.decode(payload)?)
}

/// Convert little-endian signed 16-bit interleaved PCM into per-channel floats.
///
/// Each sample maps to `value / 32768.0`. A trailing partial frame is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    if channels == 0 {
        return Err(AgentError::Audio("channel count must be at least 1".to_string()));
    }
    if bytes.len() % 2 != 0 {
        return Err(AgentError::Audio(format!(
            "PCM payload has odd length {} (expected 16-bit samples)",
            bytes.len()
        )));
    }

    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let channel_count = channels as usize;
    let frame_count = samples.len() / channel_count;
    if samples.len() % channel_count != 0 {
        warn!(
            samples = samples.len(),
            channels, "dropping trailing partial PCM frame"
        );
    }

    let channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|channel| {
            (0..frame_count)
                .map(|i| samples[i * channel_count + channel] as f32 / 32768.0)
                .collect::<Vec<f32>>()
        })
        .collect();

    Ok(AudioBuffer {
        sample_rate,
        channels,
    })
}

/// base64 payload from the TTS call straight to a playable buffer
pub fn decode_podcast(payload: &str) -> Result<AudioBuffer> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, PODCAST_SAMPLE_RATE, PODCAST_CHANNELS)
}

/// A stream that has been handed to an output and may still be sounding
pub trait PlaybackStream: Send {
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

/// Something that can start playing a buffer
pub trait AudioOutput {
    fn start(&self, buffer: &AudioBuffer) -> Result<Box<dyn PlaybackStream>>;
}

/// Holds at most one playing stream. Starting a new one stops the old one
/// before the reference is replaced.
pub struct AudioPlayer {
    output: Box<dyn AudioOutput>,
    current: Option<Box<dyn PlaybackStream>>,
}

impl AudioPlayer {
    pub fn new(output: impl AudioOutput + 'static) -> Self {
        Self {
            output: Box::new(output),
            current: None,
        }
    }

    pub fn play(&mut self, buffer: &AudioBuffer) -> Result<()> {
        self.stop();
        let stream = self.output.start(buffer)?;
        info!(
            frames = buffer.frame_count(),
            sample_rate = buffer.sample_rate(),
            "playback started"
        );
        self.current = Some(stream);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.current.take() {
            stream.stop();
            info!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.current.as_ref().is_some_and(|s| s.is_active())
    }
}

/// Output used when no sound device is compiled in. Keeps time so the UI
/// still sees a stream that starts and finishes.
#[derive(Debug, Default)]
pub struct SilentOutput;

struct SilentStream {
    ends_at: Instant,
    stopped: bool,
}

impl PlaybackStream for SilentStream {
    fn stop(&mut self) {
        self.stopped = true;
    }

    fn is_active(&self) -> bool {
        !self.stopped && Instant::now() < self.ends_at
    }
}

impl AudioOutput for SilentOutput {
    fn start(&self, buffer: &AudioBuffer) -> Result<Box<dyn PlaybackStream>> {
        warn!("no audio device available, playback is silent");
        Ok(Box::new(SilentStream {
            ends_at: Instant::now() + buffer.duration(),
            stopped: false,
        }))
    }
}

#[cfg(feature = "audio")]
pub use device::DeviceOutput;

#[cfg(feature = "audio")]
mod device {
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{AudioBuffer, AudioOutput, PlaybackStream};
    use crate::error::{AgentError, Result};

    /// The default system output device, through rodio
    pub struct DeviceOutput {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl DeviceOutput {
        pub fn new() -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().map_err(|e| AgentError::Audio(e.to_string()))?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }
    }

    struct SinkStream {
        sink: Sink,
    }

    impl PlaybackStream for SinkStream {
        fn stop(&mut self) {
            self.sink.stop();
        }

        fn is_active(&self) -> bool {
            !self.sink.empty()
        }
    }

    impl AudioOutput for DeviceOutput {
        fn start(&self, buffer: &AudioBuffer) -> Result<Box<dyn PlaybackStream>> {
            let sink = Sink::try_new(&self.handle).map_err(|e| AgentError::Audio(e.to_string()))?;
            sink.append(SamplesBuffer::new(
                buffer.channel_count(),
                buffer.sample_rate(),
                buffer.interleaved(),
            ));
            Ok(Box::new(SinkStream { sink }))
        }
    }
}

/// The device output when built with the `audio` feature and a device is
/// present, otherwise the silent one.
pub fn default_output() -> Box<dyn AudioOutput> {
    #[cfg(feature = "audio")]
    {
        match DeviceOutput::new() {
            Ok(output) => return Box::new(output),
            Err(e) => warn!(error = %e, "could not open audio device"),
        }
    }
    Box::new(SilentOutput)
}

impl AudioOutput for Box<dyn AudioOutput> {
    fn start(&self, buffer: &AudioBuffer) -> Result<Box<dyn PlaybackStream>> {
        (**self).start(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_mono() {
        let buffer = decode_pcm16(&pcm(&[0, 16384, -32768, 32767]), 24_000, 1).unwrap();
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.frame_count(), 4);
        let ch = buffer.channel(0).unwrap();
        assert_eq!(ch[0], 0.0);
        assert_eq!(ch[1], 0.5);
        assert_eq!(ch[2], -1.0);
        assert!((ch[3] - 32767.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_stereo_deinterleaves() {
        let source: [i16; 6] = [100, -100, 200, -200, 300, -300];
        let buffer = decode_pcm16(&pcm(&source), 48_000, 2).unwrap();
        assert_eq!(buffer.frame_count(), 3);
        for frame in 0..3 {
            for channel in 0..2 {
                let expected = source[frame * 2 + channel] as f32 / 32768.0;
                let got = buffer.channel(channel).unwrap()[frame];
                assert!((got - expected).abs() < 1e-7);
            }
        }
        assert_eq!(
            buffer.interleaved(),
            source.iter().map(|s| *s as f32 / 32768.0).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_trailing_partial_frame_dropped() {
        let buffer = decode_pcm16(&pcm(&[1, 2, 3]), 24_000, 2).unwrap();
        assert_eq!(buffer.frame_count(), 1);
        assert_eq!(buffer.channel(1).unwrap().len(), 1);
    }

    #[test]
    fn test_odd_byte_count_is_an_error() {
        assert!(matches!(
            decode_pcm16(&[0, 1, 2], 24_000, 1),
            Err(AgentError::Audio(_))
        ));
    }

    #[test]
    fn test_zero_channels_is_an_error() {
        assert!(decode_pcm16(&pcm(&[1, 2]), 24_000, 0).is_err());
    }

    #[test]
    fn test_decode_base64_errors() {
        assert!(matches!(decode_base64("   "), Err(AgentError::Audio(_))));
        assert!(matches!(decode_base64("not base64!!"), Err(AgentError::Audio(_))));
    }

    #[test]
    fn test_decode_podcast_payload() {
        let payload = STANDARD.encode(pcm(&[0; 24_000]));
        let buffer = decode_podcast(&payload).unwrap();
        assert_eq!(buffer.sample_rate(), PODCAST_SAMPLE_RATE);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }

    /// Counts streams that were started and not yet stopped
    struct CountingOutput {
        active: Arc<AtomicUsize>,
    }

    struct CountingStream {
        active: Arc<AtomicUsize>,
        stopped: bool,
    }

    impl PlaybackStream for CountingStream {
        fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.active.fetch_sub(1, Ordering::SeqCst);
            }
        }

        fn is_active(&self) -> bool {
            !self.stopped
        }
    }

    impl AudioOutput for CountingOutput {
        fn start(&self, _buffer: &AudioBuffer) -> Result<Box<dyn PlaybackStream>> {
            self.active.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingStream {
                active: self.active.clone(),
                stopped: false,
            }))
        }
    }

    #[test]
    fn test_new_playback_replaces_active_stream() {
        let active = Arc::new(AtomicUsize::new(0));
        let mut player = AudioPlayer::new(CountingOutput {
            active: active.clone(),
        });
        let buffer = decode_pcm16(&pcm(&[1, 2, 3, 4]), 24_000, 1).unwrap();

        player.play(&buffer).unwrap();
        assert_eq!(active.load(Ordering::SeqCst), 1);

        player.play(&buffer).unwrap();
        assert_eq!(active.load(Ordering::SeqCst), 1);
        assert!(player.is_playing());

        player.stop();
        player.stop();
        assert_eq!(active.load(Ordering::SeqCst), 0);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_silent_output_stops() {
        let mut player = AudioPlayer::new(SilentOutput);
        let buffer = decode_pcm16(&pcm(&[0; 48_000]), 24_000, 1).unwrap();
        player.play(&buffer).unwrap();
        assert!(player.is_playing());
        player.stop();
        assert!(!player.is_playing());
    }
}

use crate::error::Error;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedBufferSize};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::fs::File;
use std::io;
use std::path::Path;
use std::thread::{self, JoinHandle};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as DecodeError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, info};

pub const BUFFER_SIZE: u32 = 2048;
const MIN_SAMPLE_RATE: u32 = 44100;

/// music output: one track at a time, played once
///
/// The cpal stream lives on its own thread; decoded tracks reach it over a
/// channel and replace whatever is playing.
pub struct Player {
    track_send: Sender<Vec<f32>>,
    shutdown_send: Sender<()>,
    sample_rate: u32,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// open the default output device
    pub fn start() -> Result<Player, Error> {
        let (track_send, track_recv) = unbounded();
        let (shutdown_send, shutdown_recv) = bounded::<()>(1);
        let (sample_rate_send, sample_rate_recv) = bounded(1);

        let handle = thread::spawn(move || {
            let stream = match open_stream(track_recv) {
                Ok((stream, sample_rate)) => {
                    sample_rate_send.send(Ok(sample_rate)).unwrap_or(());
                    stream
                }
                Err(err) => {
                    sample_rate_send.send(Err(err)).unwrap_or(());
                    return;
                }
            };

            // the stream stops when dropped
            shutdown_recv.recv().unwrap_or(());
            drop(stream);
            debug!("audio thread finished");
        });

        let sample_rate = sample_rate_recv
            .recv()
            .map_err(|_| Error::Audio(String::from("audio thread exited")))?
            .map_err(Error::Audio)?;

        Ok(Player {
            track_send,
            shutdown_send,
            sample_rate,
            handle: Some(handle),
        })
    }

    /// decode `path` and play it from the start, replacing the current track
    pub fn play(&self, path: &Path) -> Result<(), Error> {
        let (samples, source_rate) = decode(path)?;
        let samples = resample(&samples, source_rate, self.sample_rate);
        info!(
            path = %path.display(),
            seconds = samples.len() as f64 / self.sample_rate as f64,
            "playing"
        );
        self.track_send
            .send(samples)
            .map_err(|_| Error::Audio(String::from("audio thread stopped")))
    }

    /// close the output stream
    pub fn stop(mut self) {
        self.shutdown_send.send(()).unwrap_or(());
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or(());
        }
    }
}

fn open_stream(track_recv: Receiver<Vec<f32>>) -> Result<(cpal::Stream, u32), String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| String::from("no audio output device available"))?;

    let supported_config = device
        .supported_output_configs()
        .map_err(|err| format!("error while querying configs: {err}"))?
        .filter(|supported_config| supported_config.sample_format() == SampleFormat::F32)
        .find(|supported_config| match supported_config.buffer_size() {
            SupportedBufferSize::Range { min, max } => min <= &BUFFER_SIZE && &BUFFER_SIZE <= max,
            SupportedBufferSize::Unknown => true,
        })
        .ok_or_else(|| String::from("no supported output config"))?;
    let set_buffer_size = match supported_config.buffer_size() {
        SupportedBufferSize::Range { min: _, max: _ } => cpal::BufferSize::Fixed(BUFFER_SIZE),
        SupportedBufferSize::Unknown => cpal::BufferSize::Default,
    };
    let selected_sample_rate = SampleRate(MIN_SAMPLE_RATE.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    ));

    let supported_config = supported_config.with_sample_rate(selected_sample_rate);
    let num_channels = supported_config.channels() as usize;
    let mut config: StreamConfig = supported_config.into();
    config.buffer_size = set_buffer_size;

    info!(
        sample_rate = selected_sample_rate.0,
        channels = num_channels,
        "audio output"
    );

    let mut track: Vec<f32> = Vec::new();
    let mut position = 0;
    let sample_callback = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        // a new track replaces the current one
        while let Ok(next) = track_recv.try_recv() {
            track = next;
            position = 0;
        }
        for frame in data.chunks_mut(num_channels.max(1)) {
            let sample = track.get(position).copied().unwrap_or(0.0);
            position = (position + 1).min(track.len());
            frame.fill(sample);
        }
    };

    let err_fn = |err: cpal::StreamError| error!(%err, "audio output stream");

    let stream = device
        .build_output_stream(&config, sample_callback, err_fn, None)
        .map_err(|err| err.to_string())?;
    stream.play().map_err(|err| err.to_string())?;

    Ok((stream, selected_sample_rate.0))
}

/// decode an audio file into mono samples, returning them with their sample rate
pub fn decode(path: &Path) -> Result<(Vec<f32>, u32), Error> {
    let file = File::open(path)?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Audio(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(MIN_SAMPLE_RATE);
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(DecodeError::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(DecodeError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count().max(1);
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                // mix down to mono
                for frame in buffer.samples().chunks(channels) {
                    samples.push(frame.iter().sum::<f32>() / channels as f32);
                }
            }
            // skip corrupt packets
            Err(DecodeError::DecodeError(err)) => debug!(err, "skipping packet"),
            Err(err) => return Err(err.into()),
        }
    }

    Ok((samples, sample_rate))
}

/// linear resampling from `from` Hz to `to` Hz
pub fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || from == 0 || to == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from as f64 / to as f64;
    let len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples.len() - 1;
    (0..len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos.floor() as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16-bit mono PCM WAV with every sample set to `value`
    fn wav(sample_rate: u32, count: usize, value: i16) -> Vec<u8> {
        let data_len = (count * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for _ in 0..count {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, wav(8000, 800, 16384)).unwrap();

        let (samples, sample_rate) = decode(&path).unwrap();
        assert_eq!(sample_rate, 8000);
        assert_eq!(samples.len(), 800);
        assert!((samples[10] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_decode_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(decode(&path).is_err());
    }

    #[test]
    fn test_resample() {
        let up = resample(&[0.0, 1.0], 1, 2);
        assert_eq!(up.len(), 4);
        assert_eq!(up[0], 0.0);
        assert_eq!(up[1], 0.5);
        assert_eq!(up[2], 1.0);

        let down = resample(&[0.0; 100], 44100, 22050);
        assert_eq!(down.len(), 50);
        assert_eq!(resample(&[0.25, 0.5], 8000, 8000), vec![0.25, 0.5]);
    }
}

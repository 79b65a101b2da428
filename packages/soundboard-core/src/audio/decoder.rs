//! Symphonia-backed decoder for WAV and MP3 sounds.

use std::io::{Cursor, ErrorKind};

use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{DecodeError, DecodedSound, SoundDecoder};
use crate::protocol_constants::SUPPORTED_EXTENSIONS;

/// Decodes whole in-memory files with symphonia's default registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl SoundDecoder for SymphoniaDecoder {
    fn supports(&self, extension: &str) -> bool {
        SUPPORTED_EXTENSIONS.contains(&extension)
    }

    fn decode(&self, bytes: Vec<u8>, extension: &str) -> Result<DecodedSound, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension);

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let mut format = probed.format;
        let track = format.default_track().ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut spec: Option<SignalSpec> = None;
        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let packet_spec = *decoded.spec();
                    spec.get_or_insert(packet_spec);
                    let mut sample_buf =
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, packet_spec);
                    sample_buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(sample_buf.samples());
                }
                // Corrupt packets are skipped, the rest of the file may still play.
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("[Decoder] Skipping undecodable packet: {}", e);
                }
                Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let spec = spec.ok_or(DecodeError::Empty)?;
        Ok(DecodedSound {
            samples,
            sample_rate: spec.rate,
            channels: spec.channels.count() as u16,
        })
    }
}

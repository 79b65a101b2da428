//! Shared audio fixtures for unit tests.

use bytes::{BufMut, BytesMut};

/// Builds a complete 16-bit PCM WAV file holding a 440 Hz tone.
pub fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    let bytes_per_sample: u16 = 2;
    let block_align = channels * bytes_per_sample;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = (frames * block_align as usize) as u32;

    let mut buf = BytesMut::with_capacity(44 + data_len as usize);

    // RIFF header
    buf.put_slice(b"RIFF");
    buf.put_u32_le(36 + data_len);
    buf.put_slice(b"WAVE");

    // fmt chunk
    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1);
    buf.put_u16_le(channels);
    buf.put_u32_le(sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(block_align);
    buf.put_u16_le(bytes_per_sample * 8);

    // data chunk
    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let value = ((t * 440.0 * std::f32::consts::TAU).sin() * 0.5 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            buf.put_i16_le(value);
        }
    }

    buf.to_vec()
}

//! WAV export of an offline sink's pending cues.

use super::engine::OfflineSink;

const BITS_PER_SAMPLE: u16 = 16;

/// Render the sink's pending voices to a mono 16-bit PCM WAV file.
pub fn render_wav(sink: &OfflineSink) -> Vec<u8> {
    let pcm = sink.render_pcm_i16();
    encode_wav(&pcm, sink.sample_rate as u32, 1)
}

/// Encode interleaved i16 PCM samples as a RIFF/WAVE byte buffer.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    buf.extend(samples.iter().flat_map(|s| s.to_le_bytes()));

    buf
}

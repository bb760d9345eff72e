//! Audio frame codec for the narrowband telephony format.
//!
//! Every audio payload that crosses either WebSocket is G.711 µ-law
//! (8 kHz, 8-bit, mono) carried as standard base64 text. The relay never
//! transcodes, so this module only has to:
//!
//! - move between the wire text and raw µ-law bytes,
//! - build the 44-byte WAV header used when a call is captured to disk,
//! - strip that header again when a pre-recorded clip is loaded.

use base64::prelude::*;
use thiserror::Error;

/// Sample rate of the telephony encoding in Hz.
pub const SAMPLE_RATE: u32 = 8000;

/// Channel count of the telephony encoding.
pub const CHANNELS: u16 = 1;

/// Bits per µ-law sample.
pub const BITS_PER_SAMPLE: u16 = 8;

/// WAV format tag for G.711 µ-law.
pub const WAVE_FORMAT_MULAW: u16 = 7;

/// Size of the canonical WAV header produced by [`build_container_header`].
pub const CONTAINER_HEADER_LEN: usize = 44;

/// Errors produced by the audio codec.
///
/// All of them are non-fatal for a call: the offending frame is dropped.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload was not valid base64
    #[error("Invalid audio payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Container bytes are too short or malformed
    #[error("Invalid audio container: {0}")]
    Container(String),
}

/// Decode a wire payload into raw µ-law bytes.
pub fn decode(payload: &str) -> Result<Vec<u8>, CodecError> {
    Ok(BASE64_STANDARD.decode(payload)?)
}

/// Encode raw µ-law bytes into the wire representation.
pub fn encode(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Build the WAV header for `data_len` bytes of µ-law audio.
///
/// Only the two size fields depend on `data_len`; format tag, channel count,
/// sample rate and sample width are fixed for the telephony encoding.
pub fn build_container_header(data_len: u32) -> [u8; CONTAINER_HEADER_LEN] {
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    let byte_rate = SAMPLE_RATE * block_align as u32;

    let mut header = [0u8; CONTAINER_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36u32.wrapping_add(data_len)).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&WAVE_FORMAT_MULAW.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&SAMPLE_RATE.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    header
}

/// Return the audio bytes that follow a canonical 44-byte WAV header.
///
/// The header itself is not interpreted; clips are expected to already be
/// µ-law at 8 kHz.
pub fn strip_container_header(bytes: &[u8]) -> Result<&[u8], CodecError> {
    if bytes.len() < CONTAINER_HEADER_LEN {
        return Err(CodecError::Container(format!(
            "expected at least {CONTAINER_HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(CodecError::Container("missing RIFF/WAVE magic".to_string()));
    }
    Ok(&bytes[CONTAINER_HEADER_LEN..])
}

/// Append-only µ-law buffer for one captured call.
///
/// Flushed once, at the end of the call, into a complete WAV file image.
#[derive(Debug, Default)]
pub struct AudioCaptureBuffer {
    data: Vec<u8>,
}

impl AudioCaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the buffer and produce `header ++ data`.
    pub fn into_container(self) -> Vec<u8> {
        let header = build_container_header(self.data.len() as u32);
        let mut file = Vec::with_capacity(CONTAINER_HEADER_LEN + self.data.len());
        file.extend_from_slice(&header);
        file.extend_from_slice(&self.data);
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn test_decode_known_payload() {
        assert_eq!(decode("AQ==").unwrap(), vec![0x01]);
        assert_eq!(decode("Zg==").unwrap(), b"f".to_vec());
    }

    #[test]
    fn test_encode_matches_decode() {
        let bytes = vec![0xffu8, 0x7f, 0x00, 0x80];
        assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        let result = decode("not base64 !!");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_header_fields() {
        let header = build_container_header(160);

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32_at(&header, 4), 196);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u32_at(&header, 16), 16);
        assert_eq!(u16_at(&header, 20), WAVE_FORMAT_MULAW);
        assert_eq!(u16_at(&header, 22), 1);
        assert_eq!(u32_at(&header, 24), 8000);
        assert_eq!(u32_at(&header, 28), 8000);
        assert_eq!(u16_at(&header, 32), 1);
        assert_eq!(u16_at(&header, 34), 8);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32_at(&header, 40), 160);
    }

    #[test]
    fn test_container_round_trip() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut buffer = AudioCaptureBuffer::new();
        buffer.append(&data[..400]);
        buffer.append(&data[400..]);
        assert_eq!(buffer.len(), 1000);

        let file = buffer.into_container();
        assert_eq!(file.len(), CONTAINER_HEADER_LEN + 1000);

        // Walk the chunks the way a WAV reader would
        assert_eq!(u32_at(&file, 4) as usize, file.len() - 8);
        let fmt_len = u32_at(&file, 16) as usize;
        let data_chunk = 20 + fmt_len;
        assert_eq!(&file[data_chunk..data_chunk + 4], b"data");
        let declared = u32_at(&file, data_chunk + 4) as usize;
        assert_eq!(declared, 1000);
        assert_eq!(&file[data_chunk + 8..data_chunk + 8 + declared], &data[..]);
        assert_eq!(u32_at(&file, 24), SAMPLE_RATE);
        assert_eq!(u16_at(&file, 22), CHANNELS);

        assert_eq!(strip_container_header(&file).unwrap(), &data[..]);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AudioCaptureBuffer::new();
        assert!(buffer.is_empty());
        let file = buffer.into_container();
        assert_eq!(file.len(), CONTAINER_HEADER_LEN);
        assert_eq!(u32_at(&file, 40), 0);
    }

    #[test]
    fn test_strip_rejects_short_input() {
        assert!(matches!(
            strip_container_header(&[0u8; 10]),
            Err(CodecError::Container(_))
        ));
        assert!(matches!(
            strip_container_header(&[0u8; 60]),
            Err(CodecError::Container(_))
        ));
    }
}

use sha2::{Digest, Sha256};

/// A stored recording: its derived id and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tone {
    pub tone_id: u32,
    pub name: String,
}

/// Derive a tone id from the raw WAV sample bytes, taken *before* any
/// preprocessing. The id is the big-endian `u32` formed from the first
/// four bytes of the SHA-256 digest of the buffer.
pub fn tone_id_for_bytes(raw_sample_bytes: &[u8]) -> u32 {
    let digest = Sha256::digest(raw_sample_bytes);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_id_is_deterministic() {
        let data = b"some raw pcm bytes";
        assert_eq!(tone_id_for_bytes(data), tone_id_for_bytes(data));
    }

    #[test]
    fn tone_id_differs_for_different_input() {
        assert_ne!(tone_id_for_bytes(b"abc"), tone_id_for_bytes(b"abd"));
    }
}

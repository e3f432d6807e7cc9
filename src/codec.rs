/// Pack an anchor bin, target bin and time delta into a 32-bit address.
/// Callers must ensure `anchor, freq` are in `[0, 511]` and `delta` in
/// `[0, 16383]`; out-of-range bits are silently truncated by the masks.
pub fn encode_address(anchor: u16, freq: u16, delta: u16) -> u32 {
    ((anchor as u32) << 23) | ((freq as u32) << 14) | (delta as u32 & 0x3FFF)
}

/// Inverse of [`encode_address`].
pub fn decode_address(address: u32) -> (u16, u16, u16) {
    let anchor = (address >> 23) as u16 & 0x1FF;
    let freq = (address >> 14) as u16 & 0x1FF;
    let delta = address as u16 & 0x3FFF;
    (anchor, freq, delta)
}

/// Pack an anchor time and song id into a 64-bit couple.
pub fn encode_couple(anchor_time: u32, song_id: u32) -> u64 {
    ((anchor_time as u64) << 32) | (song_id as u64)
}

/// Inverse of [`encode_couple`].
pub fn decode_couple(couple: u64) -> (u32, u32) {
    let anchor_time = (couple >> 32) as u32;
    let song_id = couple as u32;
    (anchor_time, song_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_at_bounds() {
        for &(a, f, d) in &[(0u16, 0u16, 0u16), (511, 511, 16383), (273, 42, 8191)] {
            let encoded = encode_address(a, f, d);
            assert_eq!(decode_address(encoded), (a, f, d));
        }
    }

    #[test]
    fn couple_round_trips_at_bounds() {
        for &(t, s) in &[(0u32, 0u32), (u32::MAX, u32::MAX), (12345, 67890)] {
            let encoded = encode_couple(t, s);
            assert_eq!(decode_couple(encoded), (t, s));
        }
    }

    #[test]
    fn address_round_trip_sweep() {
        for a in (0..512).step_by(37) {
            for f in (0..512).step_by(53) {
                let d = (a * f) as u16 & 0x3FFF;
                let encoded = encode_address(a as u16, f as u16, d);
                assert_eq!(decode_address(encoded), (a as u16, f as u16, d));
            }
        }
    }
}

use crate::codec::{encode_address, encode_couple};
use crate::peaks::Peak;

/// Re-orders peaks so that, within a run of entries sharing the same
/// timestamp, the smaller frequency bin is emitted first. Entries that
/// don't share a timestamp with their neighbor keep their original
/// position. This is the observable behavior of the tie-break rule, not a
/// full sort: runs are resolved locally and concatenated in time order.
pub fn order_time_freq(peaks: &[Peak]) -> Vec<Peak> {
    let mut ordered = Vec::with_capacity(peaks.len());
    let mut run_start = 0;

    while run_start < peaks.len() {
        let mut run_end = run_start + 1;
        while run_end < peaks.len() && peaks[run_end].time_ms == peaks[run_start].time_ms {
            run_end += 1;
        }
        let mut run: Vec<Peak> = peaks[run_start..run_end].to_vec();
        run.sort_by_key(|p| p.freq_q);
        ordered.extend(run);
        run_start = run_end;
    }

    ordered
}

/// Build `(address, couple)` records for one file's peak list. `raw_peaks`
/// is the pre-ordering list straight from the peak extractor; the anchor
/// of each target zone is deliberately read from this raw list rather than
/// the time/frequency-ordered one (see module docs on the ordering quirk).
pub fn build_fingerprints(raw_peaks: &[Peak], tone_id: u32) -> Vec<(u32, u64)> {
    let ordered = order_time_freq(raw_peaks);
    let n = ordered.len();
    if n < 5 || raw_peaks.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity((n - 4) * 5);
    for i in 0..(n - 4) {
        let anchor_pos = i.saturating_sub(3).min(raw_peaks.len() - 1);
        let anchor = raw_peaks[anchor_pos];

        for point in &ordered[i..i + 5] {
            let delta = (anchor.time_ms as i64 - point.time_ms as i64).unsigned_abs() as u16;
            let address = encode_address(anchor.freq_q, point.freq_q, delta);
            let couple = encode_couple(anchor.time_ms, tone_id);
            out.push((address, couple));
        }
    }

    out
}

/// Number of target zones a peak list of the given pre-ordering length
/// would produce.
pub fn num_target_zones(len: usize) -> usize {
    len.saturating_sub(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(freq_q: u16, time_ms: u32) -> Peak {
        Peak { freq_q, time_ms }
    }

    #[test]
    fn ties_are_resolved_by_ascending_frequency() {
        let peaks = vec![peak(30, 100), peak(10, 100), peak(20, 100), peak(5, 200)];
        let ordered = order_time_freq(&peaks);
        assert_eq!(
            ordered,
            vec![peak(10, 100), peak(20, 100), peak(30, 100), peak(5, 200)]
        );
    }

    #[test]
    fn non_tied_entries_keep_position() {
        let peaks = vec![peak(1, 0), peak(2, 10), peak(3, 20)];
        assert_eq!(order_time_freq(&peaks), peaks);
    }

    #[test]
    fn short_peak_lists_yield_no_zones() {
        let peaks = vec![peak(1, 0), peak(2, 10), peak(3, 20), peak(4, 30)];
        assert_eq!(num_target_zones(peaks.len()), 0);
        assert!(build_fingerprints(&peaks, 7).is_empty());
    }

    #[test]
    fn five_peaks_yield_one_zone_with_five_records() {
        let peaks: Vec<Peak> = (0..5).map(|i| peak(i as u16, (i * 10) as u32)).collect();
        let records = build_fingerprints(&peaks, 42);
        assert_eq!(records.len(), 5);
        for (_, couple) in &records {
            let (_, song_id) = crate::codec::decode_couple(*couple);
            assert_eq!(song_id, 42);
        }
    }

    #[test]
    fn self_match_has_zero_anchor_delta_at_zone_start() {
        let peaks: Vec<Peak> = (0..6).map(|i| peak(i as u16, (i * 10) as u32)).collect();
        let records = build_fingerprints(&peaks, 1);
        let (anchor, freq, delta) = crate::codec::decode_address(records[0].0);
        assert_eq!(anchor, 0);
        assert_eq!(freq, 0);
        assert_eq!(delta, 0);
    }
}

use std::collections::HashMap;

use crate::codec::{decode_address, decode_couple};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::store::IndexStore;
use crate::tone::Tone;

/// Outcome of running the matcher against an index.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Stage A won: a single song whose anchor-time deltas were
    /// overwhelmingly consistent.
    Coherent { tone: Tone, score: usize },
    /// Stage A found no winner; these are the songs clearing (or, failing
    /// that, closest to) the match-ratio cutoff, most likely first.
    Ratio(Vec<(Tone, f64)>),
    NotFound,
}

fn zone_match(query_anchor_time: u32, stored_anchor_time: u32, query_freq: u16, stored_freq: u16, tol: (f64, f64)) -> bool {
    let time_diff = (query_anchor_time as f64 - stored_anchor_time as f64).abs();
    let freq_diff = (query_freq as f64 - stored_freq as f64).abs();
    time_diff <= tol.0 && freq_diff <= tol.1
}

fn mode(deltas: &[i64]) -> (i64, usize) {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &d in deltas {
        *counts.entry(d).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(_, count)| count)
        .unwrap_or((0, 0))
}

/// Run the matcher against `store` for a query whose fingerprint produced
/// `query_records` (address, couple) pairs spanning `num_target_zones`
/// target zones.
pub fn search(
    store: &dyn IndexStore,
    query_records: &[(u32, u64)],
    num_target_zones: usize,
    config: &PipelineConfig,
) -> Result<MatchOutcome> {
    if num_target_zones == 0 {
        return Ok(MatchOutcome::NotFound);
    }

    // Pass 1: every query anchor time, independent of whether it hit anything.
    let query_anchor_times: Vec<u32> = query_records
        .iter()
        .map(|&(_, couple)| decode_couple(couple).0)
        .collect();

    // Pass 2: every stored anchor time matched to each candidate song, across
    // *all* query addresses, not just the query record that triggered the
    // lookup. This is the full matched-record set a song accumulates.
    let mut candidates: HashMap<u32, Vec<u32>> = HashMap::new();

    for &(address, couple) in query_records {
        let (_, query_freq, _) = decode_address(address);
        let (query_anchor_time, _) = decode_couple(couple);

        for (stored_address, stored_couple) in store.lookup_couples_by_address(address)? {
            let (_, stored_freq, _) = decode_address(stored_address);
            let (stored_anchor_time, song_id) = decode_couple(stored_couple);

            if zone_match(query_anchor_time, stored_anchor_time, query_freq, stored_freq, config.zone_match_tol) {
                candidates.entry(song_id).or_default().push(stored_anchor_time);
            }
        }
    }

    if candidates.is_empty() {
        return Ok(MatchOutcome::NotFound);
    }

    // Stage A: for each song, cross every query anchor time against every
    // stored anchor time it matched anywhere, then take the mode of that
    // full delta multiset.
    let mut best: Option<(u32, usize)> = None;
    for (&song_id, stored_times) in &candidates {
        let deltas: Vec<i64> = query_anchor_times
            .iter()
            .flat_map(|&q_time| stored_times.iter().map(move |&s_time| (q_time as i64 - s_time as i64).abs()))
            .collect();
        let (_, count) = mode(&deltas);
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((song_id, count));
        }
    }

    if let Some((song_id, score)) = best {
        if score as f64 >= config.coherency_coeff * num_target_zones as f64 {
            if let Some((tone_id, name)) = store.get_tone(song_id)? {
                return Ok(MatchOutcome::Coherent {
                    tone: Tone { tone_id, name },
                    score,
                });
            }
        }
    }

    let mut ratios: Vec<(u32, f64)> = candidates
        .iter()
        .map(|(&song_id, stored_times)| (song_id, stored_times.len() as f64 / num_target_zones as f64))
        .collect();
    ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let mut passing: Vec<(u32, f64)> = ratios.iter().cloned().filter(|&(_, r)| r >= config.match_ratio_cutoff).collect();
    if passing.is_empty() {
        passing = ratios.into_iter().take(5).collect();
    }

    let mut tones = Vec::new();
    for (song_id, ratio) in passing {
        if let Some((tone_id, name)) = store.get_tone(song_id)? {
            tones.push((Tone { tone_id, name }, ratio));
        }
    }

    if tones.is_empty() {
        Ok(MatchOutcome::NotFound)
    } else {
        Ok(MatchOutcome::Ratio(tones))
    }
}

//! Stake modifier computation.
//!
//! The stake modifier prevents a txout owner from computing future
//! proofs of stake at the time the coin confirms: the kernel must hash
//! with a modifier chosen well after the coin's confirmation. The v1
//! modifier is 64 bits, each contributed by a pseudo-randomly selected
//! block of a past block group, and is recomputed at a fixed time
//! interval rather than every block so an attacker cannot gain control
//! of additional bits by generating a burst of blocks. The v2 modifier
//! chains the kernel hash of every proof-of-stake block.

use crate::chain_params::{ChainParams, MODIFIER_INTERVAL_RATIO};
use crate::error::{ConsensusError, ConsensusResult};
use cypher_chain::{BlockRecord, ChainIndex, DoubleSha256, Hash256, NetworkClock};
use std::cmp;
use std::collections::HashMap;
use tracing::debug;

/// Length in seconds of selection-interval section `section`.
///
/// Sections grow toward the end of the interval; the last group's window
/// is `MODIFIER_INTERVAL_RATIO` times the first's.
pub fn selection_interval_section(params: &ChainParams, section: u32) -> i64 {
    assert!(section < 64);
    params.modifier_interval * 63
        / (63 + (63 - section as i64) * (MODIFIER_INTERVAL_RATIO - 1))
}

/// Total length in seconds of the stake-modifier selection interval.
pub fn selection_interval(params: &ChainParams) -> i64 {
    (0..64)
        .map(|section| selection_interval_section(params, section))
        .sum()
}

/// The most recent modifier at or below `record`, with its generation time.
///
/// Falls back to modifier 1 at the terminal record when no ancestor ever
/// generated one.
fn last_stake_modifier<I: ChainIndex>(
    index: &I,
    record: &BlockRecord,
) -> ConsensusResult<(u64, i64)> {
    let mut current = record;
    while current.prev.is_some() && !current.generated_stake_modifier {
        current = index
            .ancestor(current)
            .ok_or(ConsensusError::BrokenAncestry(current.hash))?;
    }
    if !current.generated_stake_modifier {
        return Ok((1, current.time()));
    }
    Ok((current.stake_modifier, current.time()))
}

/// Select one block from the candidates, excluding already-selected
/// blocks, with timestamp up to `stop`.
///
/// The selection hash is SHA256d of the candidate's proof-hash and the
/// previous modifier; proof-of-stake candidates have their hash shifted
/// down 32 bits so they always beat proof-of-work candidates on the high
/// words, preserving the energy-efficiency property.
fn select_block_from_candidates<'a, I: ChainIndex>(
    index: &'a I,
    sorted_by_timestamp: &[(i64, Hash256)],
    selected: &HashMap<Hash256, (u32, bool)>,
    stop: i64,
    prev_modifier: u64,
) -> ConsensusResult<Option<&'a BlockRecord>> {
    let mut best: Option<(Hash256, &BlockRecord)> = None;

    for (_, hash) in sorted_by_timestamp {
        let record = index
            .block(hash)
            .ok_or(ConsensusError::MissingBlockIndex(*hash))?;
        if best.is_some() && record.time() > stop {
            break;
        }
        if selected.contains_key(&record.hash) {
            continue;
        }

        let mut ss = DoubleSha256::new();
        ss.write_hash(&record.proof_hash);
        ss.write_u64_le(prev_modifier);
        let mut selection_hash = ss.finalize();
        if record.proof_of_stake {
            selection_hash = selection_hash >> 32;
        }

        match best {
            Some((best_hash, _)) if selection_hash >= best_hash => {}
            _ => best = Some((selection_hash, record)),
        }
    }

    Ok(best.map(|(_, record)| record))
}

/// Compute the stake modifier for the block following `prev`.
///
/// Returns the modifier and whether it was regenerated at this block.
/// The modifier is carried forward unchanged until the tip crosses a
/// `modifier_interval` epoch boundary; at a boundary, 64 weighted
/// selection rounds each contribute one entropy bit.
pub fn compute_next_stake_modifier<I: ChainIndex>(
    params: &ChainParams,
    index: &I,
    prev: Option<&BlockRecord>,
) -> ConsensusResult<(u64, bool)> {
    let Some(prev) = prev else {
        // Genesis block's modifier is 0.
        return Ok((0, true));
    };

    // First find the current modifier and its generation time; if it is
    // not old enough, keep it.
    let (prev_modifier, modifier_time) = last_stake_modifier(index, prev)?;
    debug!(
        modifier = format_args!("{prev_modifier:#018x}"),
        time = modifier_time,
        "previous stake modifier"
    );
    if modifier_time / params.modifier_interval >= prev.time() / params.modifier_interval {
        return Ok((prev_modifier, false));
    }

    // Collect candidate blocks covering the selection interval before
    // the epoch boundary, oldest first, ties broken by hash.
    let interval = selection_interval(params);
    let start = prev.time() / params.modifier_interval * params.modifier_interval - interval;
    let mut candidates: Vec<(i64, Hash256)> =
        Vec::with_capacity((64 * params.modifier_interval / params.target_spacing) as usize);
    let mut walk = Some(prev);
    while let Some(record) = walk {
        if record.time() < start {
            break;
        }
        candidates.push((record.time(), record.hash));
        walk = match record.prev {
            Some(_) => Some(
                index
                    .ancestor(record)
                    .ok_or(ConsensusError::BrokenAncestry(record.hash))?,
            ),
            None => None,
        };
    }
    let height_first_candidate = walk.map(|r| r.height + 1).unwrap_or(0);
    candidates.reverse();
    candidates.sort();

    // Select 64 blocks from the candidates to assemble the new modifier.
    let mut new_modifier = 0u64;
    let mut stop = start;
    let mut selected: HashMap<Hash256, (u32, bool)> = HashMap::new();
    for round in 0..cmp::min(64, candidates.len()) {
        stop += selection_interval_section(params, round as u32);
        let winner =
            select_block_from_candidates(index, &candidates, &selected, stop, prev_modifier)?
                .ok_or(ConsensusError::SelectionFailed(round as u32))?;
        new_modifier |= winner.entropy_bit() << round;
        selected.insert(winner.hash, (winner.height, winner.proof_of_stake));
        debug!(
            round,
            stop,
            height = winner.height,
            bit = winner.entropy_bit(),
            "selected stake modifier block"
        );
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            first = height_first_candidate,
            last = prev.height,
            map = %selection_map(index, prev, height_first_candidate, &selected),
            "stake modifier selection"
        );
    }
    debug!(
        modifier = format_args!("{new_modifier:#018x}"),
        time = prev.time(),
        "new stake modifier"
    );

    Ok((new_modifier, true))
}

/// Render the candidate window for debug logs: `-`/`=` for unselected
/// PoW/PoS blocks, `W`/`S` for selected ones.
fn selection_map<I: ChainIndex>(
    index: &I,
    prev: &BlockRecord,
    height_first: u32,
    selected: &HashMap<Hash256, (u32, bool)>,
) -> String {
    let len = (prev.height - height_first + 1) as usize;
    let mut map = vec![b'-'; len];
    let mut walk = Some(prev);
    while let Some(record) = walk {
        if record.height < height_first {
            break;
        }
        if record.proof_of_stake {
            map[(record.height - height_first) as usize] = b'=';
        }
        walk = index.ancestor(record);
    }
    for (height, proof_of_stake) in selected.values() {
        map[(height - height_first) as usize] = if *proof_of_stake { b'S' } else { b'W' };
    }
    String::from_utf8(map).expect("ascii selection map")
}

/// The v1 modifier that applies to kernels rooted in `block_from`.
///
/// The kernel must hash with a modifier generated about a selection
/// interval after the staked output's block: ancestors of `tip` are
/// walked oldest-to-newest from `block_from`, and the first
/// modifier-generating block whose time reaches
/// `block_from.time + selection_interval` supplies it.
pub fn kernel_stake_modifier<I, C>(
    params: &ChainParams,
    index: &I,
    clock: &C,
    tip: &BlockRecord,
    hash_block_from: &Hash256,
) -> ConsensusResult<u64>
where
    I: ChainIndex,
    C: NetworkClock,
{
    let block_from = index
        .block(hash_block_from)
        .ok_or(ConsensusError::MissingBlockIndex(*hash_block_from))?;
    let threshold = block_from.time() + selection_interval(params);

    // Materialize the tip's ancestry down to the staked output's block
    // so it can be replayed forward.
    let mut path: Vec<&BlockRecord> = Vec::new();
    let mut walk = tip;
    while walk.hash != block_from.hash {
        if walk.height <= block_from.height {
            return Err(ConsensusError::BrokenAncestry(*hash_block_from));
        }
        path.push(walk);
        walk = index
            .ancestor(walk)
            .ok_or(ConsensusError::BrokenAncestry(walk.hash))?;
    }

    let mut current = block_from;
    let mut modifier_time = block_from.time();
    let mut successors = path.iter().rev().copied();
    loop {
        if modifier_time >= threshold {
            return Ok(current.stake_modifier);
        }
        match successors.next() {
            Some(next) => {
                current = next;
                if current.generated_stake_modifier {
                    modifier_time = current.time();
                }
            }
            None => {
                // Reached the best block; happens when the node is
                // behind on the block chain.
                if current.time() + params.stake_min_age - selection_interval(params)
                    > clock.adjusted_time()
                {
                    return Err(ConsensusError::BlockChainBehind {
                        best_height: current.height,
                        from_height: block_from.height,
                    });
                }
                return Err(ConsensusError::StakeModifierPending);
            }
        }
    }
}

/// The v2 modifier for the block whose kernel is `kernel`, built on
/// `prev`'s v2 modifier. Genesis yields the zero hash.
pub fn compute_stake_modifier_v2(prev: Option<&BlockRecord>, kernel: &Hash256) -> Hash256 {
    let Some(prev) = prev else {
        return Hash256::ZERO;
    };

    let mut ss = DoubleSha256::new();
    ss.write_hash(kernel);
    ss.write_hash(&prev.stake_modifier_v2);
    ss.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChainParams {
        ChainParams {
            modifier_interval: 2048,
            target_spacing: 64,
            ..ChainParams::mainnet()
        }
    }

    #[test]
    fn sections_grow_and_sum_to_interval() {
        let p = params();
        let mut total = 0;
        let mut last = 0;
        for section in 0..64 {
            let len = selection_interval_section(&p, section);
            assert!(len > 0);
            assert!(len >= last, "sections must not shrink");
            last = len;
            total += len;
        }
        assert_eq!(total, selection_interval(&p));
    }

    #[test]
    fn first_and_last_section_follow_ratio() {
        let p = params();
        // First section: interval * 63 / (63 + 63 * 2) = interval / 3.
        assert_eq!(
            selection_interval_section(&p, 0),
            p.modifier_interval * 63 / 189
        );
        // Last section: the full per-group share.
        assert_eq!(selection_interval_section(&p, 63), p.modifier_interval);
    }

    #[test]
    fn genesis_modifier_is_zero_and_generated() {
        let p = params();
        let index = cypher_chain::ChainView::new();
        let (modifier, generated) = compute_next_stake_modifier(&p, &index, None).unwrap();
        assert_eq!(modifier, 0);
        assert!(generated);
    }

    #[test]
    fn v2_transition_is_chained_double_sha() {
        let kernel = Hash256::from_low_u64(0xabcd);
        assert_eq!(compute_stake_modifier_v2(None, &kernel), Hash256::ZERO);

        let prev = BlockRecord {
            hash: Hash256::from_low_u64(1),
            height: 1,
            time: 1000,
            prev: None,
            proof_of_stake: false,
            proof_hash: Hash256::from_low_u64(1),
            stake_modifier: 0,
            generated_stake_modifier: true,
            stake_modifier_v2: Hash256::from_low_u64(0x1234),
        };
        let mut ss = DoubleSha256::new();
        ss.write_hash(&kernel);
        ss.write_hash(&prev.stake_modifier_v2);
        assert_eq!(compute_stake_modifier_v2(Some(&prev), &kernel), ss.finalize());
    }
}

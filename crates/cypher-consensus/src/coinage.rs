//! Coin-age weight curve and the per-transaction coin-age accumulator.

use crate::chain_params::{ChainParams, CENT, COIN};
use crate::error::{ConsensusError, ConsensusResult};
use cypher_chain::{ChainIndex, Transaction, TransactionStore};
use num_bigint::BigUint;
use num_traits::Zero;
use std::cmp;
use tracing::{debug, warn};

/* Coin-aging function
 * =================================================
 * The polynomial and logarithmic coefficients below are solutions to a
 * set of equations tied to the expected block confirmation time and the
 * minting incentive schedule. They are consensus constants: changing any
 * of them (or the evaluation precision) forks the network.
 */
/// Weight, in seconds, earned by a coin over `[interval_begin, interval_end]`.
///
/// The first `stake_min_age` seconds earn nothing. After that the weight
/// grows along a cubic for the first seven days and logarithmically
/// beyond, evaluated in IEEE-754 double precision, truncated to whole
/// seconds and capped at `stake_max_age`.
pub fn coin_age_weight(params: &ChainParams, interval_begin: i64, interval_end: i64) -> i64 {
    if interval_begin <= 0 {
        warn!(interval_begin, "coin_age_weight: interval beginning not positive");
        return 0;
    }

    let seconds = cmp::max(0, interval_end - interval_begin - params.stake_min_age);
    let days = seconds as f64 / (24.0 * 60.0 * 60.0);

    let weight = if days <= 7.0 {
        -0.00408163 * days.powi(3) + 0.05714286 * days.powi(2) + days
    } else {
        8.4 * days.ln() - 7.94564525
    };

    cmp::min((weight * 24.0 * 60.0 * 60.0) as i64, params.stake_max_age)
}

/// Total coin age destroyed by `tx`, in coin-days.
///
/// Informational only, never a consensus input: inputs whose previous
/// transaction has not been indexed yet are silently skipped, so the
/// result under-reports during initial sync.
///
/// Coinbase transactions have age zero. Inputs younger than
/// `stake_min_age` contribute nothing. The cent-second accumulator is
/// arbitrary precision; the final coin-day figure is truncated to the
/// low 64 bits.
pub fn transaction_get_coin_age<I, S>(
    params: &ChainParams,
    index: &I,
    store: &S,
    tx: &Transaction,
) -> ConsensusResult<u64>
where
    I: ChainIndex,
    S: TransactionStore,
{
    if tx.is_coin_base() {
        return Ok(0);
    }

    let mut cent_seconds = BigUint::zero();
    for txin in &tx.inputs {
        let Some(stored) = store.transaction(&txin.prevout.txid) else {
            // Previous transaction not in main chain yet.
            continue;
        };

        if tx.time < stored.tx.time {
            return Err(ConsensusError::TimestampViolation {
                tx_time: tx.time,
                prev_time: stored.tx.time,
            });
        }

        let Some(block_from) = index.block(&stored.block_hash) else {
            return Err(ConsensusError::BlockNotFound(stored.block_hash));
        };

        if block_from.time() + params.stake_min_age > tx.time as i64 {
            // Only count coins meeting the minimum age requirement.
            continue;
        }

        let value_in = stored
            .tx
            .outputs
            .get(txin.prevout.n as usize)
            .ok_or(ConsensusError::BadPrevoutIndex {
                n: txin.prevout.n,
                outputs: stored.tx.outputs.len(),
            })?
            .value;
        let time_weight = coin_age_weight(params, stored.tx.time as i64, tx.time as i64);
        cent_seconds +=
            BigUint::from(value_in as u64) * BigUint::from(time_weight as u64) / BigUint::from(CENT as u64);

        debug!(
            value_in,
            time_diff = tx.time - stored.tx.time,
            cent_seconds = %cent_seconds,
            "coin age input"
        );
    }

    let coin_days = cent_seconds * BigUint::from(CENT as u64)
        / BigUint::from(COIN as u64)
        / BigUint::from(24u64 * 60 * 60);
    debug!(coin_days = %coin_days, "coin age total");
    Ok(coin_days.iter_u64_digits().next().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChainParams {
        ChainParams {
            stake_min_age: 8 * 60 * 60,
            ..ChainParams::mainnet()
        }
    }

    #[test]
    fn zero_before_min_age() {
        let p = params();
        let begin = 1_500_000_000;
        assert_eq!(coin_age_weight(&p, begin, begin), 0);
        assert_eq!(coin_age_weight(&p, begin, begin + p.stake_min_age), 0);
        assert_eq!(coin_age_weight(&p, begin, begin + p.stake_min_age - 1), 0);
    }

    #[test]
    fn zero_for_non_positive_beginning() {
        let p = params();
        assert_eq!(coin_age_weight(&p, 0, 1_500_000_000), 0);
        assert_eq!(coin_age_weight(&p, -1, 1_500_000_000), 0);
    }

    #[test]
    fn cubic_region_one_day() {
        let p = params();
        let begin = 1_500_000_000;
        let end = begin + p.stake_min_age + 86_400;
        // -0.00408163 + 0.05714286 + 1 days, in seconds, truncated.
        let expected = ((-0.00408163f64 + 0.05714286 + 1.0) * 86_400.0) as i64;
        assert_eq!(coin_age_weight(&p, begin, end), expected);
    }

    #[test]
    fn logarithmic_region_thirty_days() {
        let p = params();
        let begin = 1_500_000_000;
        let end = begin + p.stake_min_age + 30 * 86_400;
        let expected = ((8.4 * 30.0f64.ln() - 7.94564525) * 86_400.0) as i64;
        assert_eq!(coin_age_weight(&p, begin, end), expected);
    }

    #[test]
    fn weight_is_monotonic_and_capped() {
        let p = params();
        let begin = 1_000_000_000;
        let mut last = 0;
        for days in 0..400 {
            let w = coin_age_weight(&p, begin, begin + days * 86_400);
            assert!(w >= last, "weight decreased at day {days}");
            assert!(w <= p.stake_max_age);
            last = w;
        }
    }
}

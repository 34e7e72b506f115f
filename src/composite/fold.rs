//! Coverage-aware AND/OR folding
//!
//! Every leaf is asked only about the part of the request it covers. Bits no
//! leaf covers are never granted, regardless of the composition type.
//!
//! - `And`: every covering leaf must grant its covered part, and the leaves
//!   together must cover the whole request.
//! - `Or`: each requested bit must be granted by at least one covering leaf.
//!
//! Both folds are independent of leaf order. A request for no bits at all is
//! never granted.

use std::convert::Infallible;

use bitflags::Flags;
use serde::{Deserialize, Serialize};

/// How the verdicts of several leaves are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionType {
    /// Granted only if no covering leaf denies
    #[default]
    And,
    /// Granted if some covering leaf grants each bit
    Or,
}

impl CompositionType {
    /// Fold infallible leaf verdicts
    ///
    /// `supported` returns the part of the request a leaf covers and
    /// `granted` whether the leaf grants the given covered bits.
    pub fn grants<B, I, S, G>(self, requested: B, leaves: I, supported: S, mut granted: G) -> bool
    where
        B: Flags<Bits = u64> + Copy,
        I: IntoIterator,
        S: Fn(&I::Item, B) -> B,
        G: FnMut(&I::Item, B) -> bool,
    {
        let folded = self.try_grants::<B, I, S, _, Infallible>(requested, leaves, supported, |leaf, bits| {
            Ok(granted(leaf, bits))
        });
        match folded {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Fold fallible leaf verdicts; the first leaf error aborts the fold
    pub fn try_grants<B, I, S, G, E>(
        self,
        requested: B,
        leaves: I,
        supported: S,
        mut granted: G,
    ) -> Result<bool, E>
    where
        B: Flags<Bits = u64> + Copy,
        I: IntoIterator,
        S: Fn(&I::Item, B) -> B,
        G: FnMut(&I::Item, B) -> Result<bool, E>,
    {
        let request = requested.bits();
        if request == 0 {
            return Ok(false);
        }

        let mut covered = 0u64;
        for leaf in leaves {
            let supported_bits = supported(&leaf, requested).bits() & request;
            if supported_bits == 0 {
                continue;
            }

            match self {
                CompositionType::And => {
                    if !granted(&leaf, B::from_bits_retain(supported_bits))? {
                        return Ok(false);
                    }
                    covered |= supported_bits;
                }
                CompositionType::Or => {
                    let missing = supported_bits & !covered;
                    if missing == 0 {
                        continue;
                    }
                    if granted(&leaf, B::from_bits_retain(missing))? {
                        covered |= missing;
                    } else if missing.count_ones() > 1 {
                        for bit in single_bits(missing) {
                            if granted(&leaf, B::from_bits_retain(bit))? {
                                covered |= bit;
                            }
                        }
                    }
                    if covered == request {
                        return Ok(true);
                    }
                }
            }
        }

        Ok(covered == request)
    }
}

fn single_bits(bits: u64) -> impl Iterator<Item = u64> {
    (0..u64::BITS)
        .map(|shift| 1u64 << shift)
        .filter(move |bit| bits & bit != 0)
}

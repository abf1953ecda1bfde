//! ARX diffusion shared by both engines.
//!
//! A single [`DiffusionCore`] carries the round count, the rotation
//! [`Schedule`] and the lane multipliers. The secure engine uses the
//! four-lane schedule with fixed rotations, the fast engine the two-lane
//! schedule driven by a table of rotation primes.

use log::debug;
use serde::{Serialize, Serializer};

use crate::constants::{
    LANE_CONSTANTS, MAX_ROTATION, MIN_ROTATION, MIXING_STAGES, ROTATION_PRIMES,
    SECURE_MIXING_ROUNDS, WORD_BITS,
};
use crate::primality::next_prime_trial;

/// A rotation amount in `1..=63`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rotation(u32);

impl Rotation {
    pub const fn new(amount: u32) -> Option<Self> {
        if amount >= 1 && amount < WORD_BITS {
            Some(Self(amount))
        } else {
            None
        }
    }

    const fn fixed(amount: u32) -> Self {
        match Self::new(amount) {
            Some(rotation) => rotation,
            None => panic!("rotation amount out of range"),
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn apply(self, x: u64) -> u64 {
        x.rotate_left(self.0)
    }
}

impl Serialize for Rotation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

/// Eight rotation primes, indexed cyclically by the two-lane schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RotationTable([Rotation; ROTATION_PRIMES]);

impl RotationTable {
    /// Scans upward from [`MIN_ROTATION`] with trial division, restarting
    /// from the floor whenever a prime lands above [`MAX_ROTATION`].
    pub fn search() -> Self {
        let mut table = [Rotation::fixed(MIN_ROTATION); ROTATION_PRIMES];
        let mut candidate = u64::from(MIN_ROTATION);
        for slot in table.iter_mut() {
            let mut prime = next_prime_trial(candidate);
            while prime > u64::from(MAX_ROTATION) {
                candidate = u64::from(MIN_ROTATION);
                prime = next_prime_trial(candidate);
            }
            *slot = Rotation::fixed(prime as u32);
            candidate = prime + 1;
        }
        debug!(
            "rotation table built: {:?}",
            table.iter().map(|r| r.get()).collect::<Vec<_>>()
        );
        Self(table)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Rotation {
        self.0[index % ROTATION_PRIMES]
    }

    pub fn amounts(&self) -> [u32; ROTATION_PRIMES] {
        self.0.map(Rotation::get)
    }

    pub fn iter(&self) -> impl Iterator<Item = Rotation> + '_ {
        self.0.iter().copied()
    }
}

/// Rotation source of a [`DiffusionCore`].
pub trait Schedule {
    /// Every rotation amount the schedule can apply.
    fn rotations(&self) -> Vec<Rotation>;
}

/// Fixed rotations for lane pairs (0, 1) and (2, 3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadSchedule {
    pair_a: [Rotation; 2],
    pair_b: [Rotation; 2],
}

impl Schedule for QuadSchedule {
    fn rotations(&self) -> Vec<Rotation> {
        self.pair_a.iter().chain(&self.pair_b).copied().collect()
    }
}

/// Two lanes rotated by consecutive entries of a [`RotationTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairSchedule(RotationTable);

impl Schedule for PairSchedule {
    fn rotations(&self) -> Vec<Rotation> {
        self.0.iter().collect()
    }
}

/// Round count, rotation schedule and lane multipliers. The schedule type
/// fixes the lane count: four lanes for [`QuadSchedule`], two for
/// [`PairSchedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffusionCore<S> {
    rounds: usize,
    schedule: S,
    multipliers: [u64; 4],
}

const SECURE_SCHEDULE: QuadSchedule = QuadSchedule {
    pair_a: [
        Rotation::fixed(MIN_ROTATION),
        Rotation::fixed(MIXING_STAGES as u32 + MIN_ROTATION),
    ],
    pair_b: [
        Rotation::fixed(ROTATION_PRIMES as u32 + MIN_ROTATION),
        Rotation::fixed(MIXING_STAGES as u32 * 2),
    ],
};

impl<S: Schedule> DiffusionCore<S> {
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn rotations(&self) -> Vec<Rotation> {
        self.schedule.rotations()
    }
}

impl DiffusionCore<QuadSchedule> {
    /// Twenty rounds over four lanes.
    pub const fn secure() -> Self {
        Self {
            rounds: SECURE_MIXING_ROUNDS,
            schedule: SECURE_SCHEDULE,
            multipliers: LANE_CONSTANTS,
        }
    }

    /// Mixes four lanes down to one.
    pub fn mix_quad(&self, lanes: [u64; 4]) -> u64 {
        let QuadSchedule { pair_a, pair_b } = self.schedule;
        let [mut v0, mut v1, mut v2, mut v3] = lanes;
        let [m0, m1, m2, m3] = self.multipliers;
        for _ in 0..self.rounds {
            v0 = pair_a[0].apply(v0);
            v1 ^= v0;
            v1 = pair_a[1].apply(v1);
            v0 = v0.wrapping_add(v1);

            v2 = pair_b[0].apply(v2);
            v3 ^= v2;
            v3 = pair_b[1].apply(v3);
            v2 = v2.wrapping_add(v3);

            v0 ^= v3;
            v1 ^= v2;

            v0 = v0.wrapping_mul(m0);
            v1 = v1.wrapping_mul(m1);
            v2 = v2.wrapping_mul(m2);
            v3 = v3.wrapping_mul(m3);
        }
        v0 ^ v1 ^ v2 ^ v3
    }
}

impl DiffusionCore<PairSchedule> {
    /// Four stages over two lanes, rotating by `table`.
    pub const fn fast(table: RotationTable) -> Self {
        Self {
            rounds: MIXING_STAGES,
            schedule: PairSchedule(table),
            multipliers: LANE_CONSTANTS,
        }
    }

    /// Mixes two lanes down to one.
    pub fn mix_pair(&self, x: u64, y: u64) -> u64 {
        let PairSchedule(table) = &self.schedule;
        let [m0, m1, m2, m3] = self.multipliers;
        let (mut x, mut y) = (x, y);
        for stage in 0..self.rounds {
            x = table.get(stage * 2).apply(x);
            y = table.get(stage * 2 + 1).apply(y);

            let odd = stage % 2 == 1;
            x = x.wrapping_mul(if odd { m0 } else { m1 });
            y = y.wrapping_mul(if odd { m2 } else { m3 });

            let swapped = x;
            x = y ^ table.get(stage * 2 + 2).apply(x);
            y = swapped ^ table.get(stage * 2 + 3).apply(y);
        }
        x ^ y
    }
}

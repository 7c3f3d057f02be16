//! Body growth - the largest body a budget allows.
//!
//! A `BodyProfile` describes a repeating growth unit (`profile`), a mandatory
//! prefix (`seed`) and a part-count ceiling. Growth starts from the seed (or a
//! single copy of the profile when there is no seed) and keeps appending whole
//! profile copies while the candidate still satisfies the stopping predicate.
//! The last candidate that satisfied it is the result.
//!
//! Two budget models are supported:
//! - **Budgeted** (`grow_budgeted`): a precomputed energy total. Pure arithmetic.
//! - **Live** (`grow_live`): an arithmetic phase under one facility's base
//!   reserve, followed by a probe-driven phase that asks the facility whether
//!   the current candidate could be produced right now.

use serde::{Deserialize, Serialize};

use crate::constants::{BodyPart, CARRY_CAPACITY, MAX_BODY_PARTS};

/// Growth recipe for one kind of agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyProfile {
    /// Repeating growth unit.
    pub profile: Vec<BodyPart>,
    /// Parts prepended once before any profile repetitions.
    #[serde(default)]
    pub seed: Vec<BodyPart>,
    /// Part-count ceiling (further capped by `MAX_BODY_PARTS`).
    pub max_body_parts: u32,
    /// Optional ceiling on `Work` parts.
    #[serde(default)]
    pub max_work_parts: Option<u32>,
}

impl BodyProfile {
    pub fn new(profile: Vec<BodyPart>) -> Self {
        Self {
            profile,
            seed: Vec::new(),
            max_body_parts: MAX_BODY_PARTS,
            max_work_parts: None,
        }
    }

    pub fn with_seed(mut self, seed: Vec<BodyPart>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_parts(mut self, max_body_parts: u32) -> Self {
        self.max_body_parts = max_body_parts;
        self
    }

    pub fn with_max_work(mut self, max_work_parts: u32) -> Self {
        self.max_work_parts = Some(max_work_parts);
        self
    }

    /// The effective part ceiling.
    pub fn ceiling(&self) -> u32 {
        self.max_body_parts.min(MAX_BODY_PARTS)
    }

    /// Structural limits shared by both growth models (length, work parts).
    fn within_limits(&self, body: &[BodyPart]) -> bool {
        if body.len() as u32 > self.ceiling() {
            return false;
        }
        match self.max_work_parts {
            Some(max) => count_parts(body, BodyPart::Work) <= max,
            None => true,
        }
    }

    /// First candidate: the seed, or one copy of the profile.
    fn initial_body(&self) -> Vec<BodyPart> {
        if self.seed.is_empty() {
            self.profile.clone()
        } else {
            self.seed.clone()
        }
    }
}

/// Total energy cost of a body.
pub fn body_cost(body: &[BodyPart]) -> u32 {
    body.iter().map(|p| p.cost()).sum()
}

/// Number of parts of one kind.
pub fn count_parts(body: &[BodyPart], part: BodyPart) -> u32 {
    body.iter().filter(|p| **p == part).count() as u32
}

/// Resource capacity of a body.
pub fn carry_capacity(body: &[BodyPart]) -> u32 {
    count_parts(body, BodyPart::Carry) * CARRY_CAPACITY
}

/// Dry-run production check against a facility.
pub trait SpawnProbe {
    /// Whether `body` could be produced right now.
    fn can_spawn(&self, body: &[BodyPart]) -> bool;
}

impl<F> SpawnProbe for F
where
    F: Fn(&[BodyPart]) -> bool,
{
    fn can_spawn(&self, body: &[BodyPart]) -> bool {
        self(body)
    }
}

/// In-progress growth: the next candidate and the last accepted one.
struct Growth<'a> {
    unit: &'a [BodyPart],
    body: Vec<BodyPart>,
    final_body: Vec<BodyPart>,
}

impl<'a> Growth<'a> {
    fn start(profile: &'a BodyProfile) -> Self {
        let initial = profile.initial_body();
        let mut body = initial.clone();
        body.extend_from_slice(&profile.profile);
        Self {
            unit: &profile.profile,
            body,
            final_body: initial,
        }
    }

    /// Accept candidates while `accept` holds; leaves `body` at the first
    /// rejected candidate so a later phase can continue from it.
    fn grow_while(&mut self, mut accept: impl FnMut(&[BodyPart]) -> bool) {
        if self.unit.is_empty() {
            return;
        }
        while accept(&self.body) {
            self.final_body.clone_from(&self.body);
            self.body.extend_from_slice(self.unit);
        }
    }
}

/// Grow the largest body whose cost fits `budget`.
///
/// `budget` is the zone's total energy capacity, not what is on hand. When
/// not even one growth step fits, the seed (or one profile copy) is returned.
pub fn grow_budgeted(profile: &BodyProfile, budget: u32) -> Vec<BodyPart> {
    let mut growth = Growth::start(profile);
    growth.grow_while(|body| body_cost(body) <= budget && profile.within_limits(body));
    growth.final_body
}

/// Grow the largest body producible right now.
///
/// Arithmetic growth under `base_reserve` first, then continue with `probe`
/// deciding, since capacity can rise as supporting storage fills.
pub fn grow_live(profile: &BodyProfile, base_reserve: u32, probe: &impl SpawnProbe) -> Vec<BodyPart> {
    let mut growth = Growth::start(profile);
    growth.grow_while(|body| body_cost(body) <= base_reserve && profile.within_limits(body));
    growth.grow_while(|body| profile.within_limits(body) && probe.can_spawn(body));
    growth.final_body
}

/// Derive a ceiling that yields roughly `target_count` parts of `part`.
///
/// Proportional estimate: exact only when `target_count - seed_count` is a
/// multiple of the per-repetition count. A profile that contains no `part`
/// is returned unchanged.
pub fn build_body_profile(template: &BodyProfile, part: BodyPart, target_count: u32) -> BodyProfile {
    let per_rep = count_parts(&template.profile, part);
    if per_rep == 0 {
        log::warn!(
            "profile {:?} has no {} parts; ceiling left at {}",
            template.profile,
            part.short_name(),
            template.max_body_parts
        );
        return template.clone();
    }
    let seed_count = count_parts(&template.seed, part);
    let wanted = target_count.saturating_sub(seed_count);
    // Widened so large targets clamp instead of overflowing.
    let profile_len = template.profile.len() as u64;
    let seed_len = template.seed.len() as u64;
    let ceiling = u64::from(wanted) * profile_len / u64::from(per_rep) + seed_len;
    BodyProfile {
        max_body_parts: ceiling.min(u64::from(MAX_BODY_PARTS)) as u32,
        ..template.clone()
    }
}

/// Roughly halve a body while keeping every part kind present.
pub fn split_body(body: &[BodyPart]) -> Vec<BodyPart> {
    let mut half: Vec<BodyPart> = body.iter().step_by(2).copied().collect();
    for part in body {
        if !half.contains(part) {
            half.push(*part);
        }
    }
    half
}

/// Reorder into canonical production order (stable within a kind).
pub fn sort_body(body: &mut [BodyPart]) {
    body.sort_by_key(|p| p.sort_rank());
}

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::core::filters::{intentions_compatible, mood_suits_goals, shared_interests};
use crate::models::{Profile, ScoringPolicy, ScoringRules};

/// Per-request inputs that are not part of either profile
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    /// Mood the requester is searching for, if any
    pub requested_mood: Option<&'a str>,
    /// Day used to key the promotional jitter
    pub day: NaiveDate,
}

/// Calculate a compatibility score for a candidate
///
/// Baseline formula:
/// score = base (50)
///     + min(shared_interests * 5, 10)
///     + mood/goal bonus (15 on a table hit, otherwise 5)
///     + intention bonus (10 when stated intentions overlap)
///     + requested mood bonus (10 when the searched mood equals the candidate's)
/// clamped to [10, 99].
///
/// Returns the score together with the shared interests that drove it.
pub fn calculate_compatibility(
    candidate: &Profile,
    requester: &Profile,
    rules: &ScoringRules,
    ctx: &ScoringContext<'_>,
) -> (u8, Vec<String>) {
    let shared = shared_interests(candidate, requester);

    let raw = match rules.policy {
        ScoringPolicy::Baseline => baseline_score(candidate, requester, rules, ctx, shared.len()),
        ScoringPolicy::Promotional => promotional_score(candidate, rules, ctx.day, shared.len()),
    };

    (clamp_score(raw, rules), shared)
}

fn baseline_score(
    candidate: &Profile,
    requester: &Profile,
    rules: &ScoringRules,
    ctx: &ScoringContext<'_>,
    shared_count: usize,
) -> u32 {
    let mut score = rules.base;

    score += interest_bonus(shared_count, rules.interest_increment, rules.interest_cap);

    score += if mood_suits_goals(&candidate.mood, &requester.connection_goals) {
        rules.mood_match_bonus
    } else {
        rules.mood_default_bonus
    };

    if !requester.current_intentions.is_empty()
        && intentions_compatible(&requester.current_intentions, &candidate.current_intentions)
    {
        score += rules.intention_bonus;
    }

    if let Some(wanted) = ctx.requested_mood {
        let wanted = wanted.trim();
        if !wanted.is_empty() && wanted.to_lowercase() == candidate.mood.trim().to_lowercase() {
            score += rules.requested_mood_bonus;
        }
    }

    score
}

/// Always-high scoring: base 85 plus a stable per-day jitter and a small
/// overlap bonus of at most 10.
fn promotional_score(candidate: &Profile, rules: &ScoringRules, day: NaiveDate, shared_count: usize) -> u32 {
    let mut score = rules.promotional_base + daily_jitter(&candidate.id, day, rules.promotional_jitter);

    if shared_count > 0 {
        score += 5;
    }
    score += interest_bonus(shared_count, 2, 5);

    score
}

/// Fixed increment per shared interest, capped
#[inline]
fn interest_bonus(shared_count: usize, increment: u32, cap: u32) -> u32 {
    let count = u32::try_from(shared_count).unwrap_or(u32::MAX);
    count.saturating_mul(increment).min(cap)
}

/// Deterministic jitter in `[0, span)` keyed by candidate id and day
pub fn daily_jitter(candidate_id: &str, day: NaiveDate, span: u32) -> u32 {
    if span == 0 {
        return 0;
    }

    let mut hasher = Sha256::new();
    hasher.update(candidate_id.as_bytes());
    hasher.update(b":");
    hasher.update(day.format("%Y-%m-%d").to_string().as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % u64::from(span)) as u32
}

#[inline]
fn clamp_score(raw: u32, rules: &ScoringRules) -> u8 {
    raw.clamp(u32::from(rules.min_score), u32::from(rules.max_score)) as u8
}

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::core::{
    activity::last_active_label,
    filters::filter_by_topic,
    reasoning::generate_reasoning,
    scoring::{calculate_compatibility, ScoringContext},
};
use crate::models::{MatchCandidate, MatchRequest, Profile, ScoringRules};

/// Number of recently active users offered when a topic filter leaves nothing
pub const FALLBACK_SIZE: usize = 3;

/// Result of the matching process
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matches: Vec<MatchCandidate>,
    pub total_candidates: usize,
    /// Topic filter matched nobody; `matches` holds recently active users instead
    pub fallback_mode: bool,
    /// Seed profiles were mixed into the pool
    pub seeded: bool,
}

/// Minimum candidate pool policy
///
/// When fewer than `minimum` real candidates exist the pool is topped up
/// with `seed_profiles`. A `minimum` of zero disables seeding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePoolPolicy {
    pub minimum: usize,
    pub seed_profiles: Vec<Profile>,
}

impl CandidatePoolPolicy {
    pub fn new(minimum: usize, seed_profiles: Vec<Profile>) -> Self {
        Self {
            minimum,
            seed_profiles: seed_profiles.into_iter().map(Profile::normalized).collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Top up `candidates` with seeds until the minimum is met
    ///
    /// Seeds never duplicate an id already in the pool or the requester's id.
    /// Returns the pool and whether any seed was added.
    pub fn apply(&self, requester_id: &str, candidates: Vec<Profile>) -> (Vec<Profile>, bool) {
        if candidates.len() >= self.minimum {
            return (candidates, false);
        }

        let mut pool = candidates;
        let mut present: HashSet<String> = pool.iter().map(|p| p.id.clone()).collect();
        present.insert(requester_id.to_string());

        let mut seeded = false;
        for seed in &self.seed_profiles {
            if pool.len() >= self.minimum {
                break;
            }
            if present.insert(seed.id.clone()) {
                pool.push(seed.clone());
                seeded = true;
            }
        }

        (pool, seeded)
    }
}

/// Compatibility matching engine
///
/// # Pipeline
/// 1. Score every candidate against the requester
/// 2. Generate reasoning text and last-active label
/// 3. Rank by score, then recency, then input order
///
/// Pure and synchronous; safe to share across request handlers.
#[derive(Debug, Clone)]
pub struct Matcher {
    rules: ScoringRules,
    pool_policy: CandidatePoolPolicy,
}

impl Matcher {
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            rules,
            pool_policy: CandidatePoolPolicy::disabled(),
        }
    }

    pub fn with_default_rules() -> Self {
        Self::new(ScoringRules::default())
    }

    pub fn with_pool_policy(mut self, policy: CandidatePoolPolicy) -> Self {
        self.pool_policy = policy;
        self
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Rank every candidate for the requester
    ///
    /// Output has the same length as `candidates`, sorted by score
    /// descending, ties broken by most recent `updated_at` and then by input
    /// order.
    pub fn rank(
        &self,
        requester: &Profile,
        candidates: Vec<Profile>,
        now: DateTime<Utc>,
    ) -> Vec<MatchCandidate> {
        self.rank_with_mood(requester, candidates, None, now)
    }

    fn rank_with_mood(
        &self,
        requester: &Profile,
        candidates: Vec<Profile>,
        requested_mood: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<MatchCandidate> {
        let ctx = ScoringContext {
            requested_mood,
            day: now.date_naive(),
        };

        let mut ranked: Vec<MatchCandidate> = candidates
            .into_iter()
            .map(|profile| {
                let (score, shared) =
                    calculate_compatibility(&profile, requester, &self.rules, &ctx);
                let reasoning = generate_reasoning(&profile, &shared);
                let last_active_label = last_active_label(profile.updated_at, now);

                MatchCandidate {
                    profile,
                    compatibility_score: score,
                    reasoning,
                    last_active_label,
                    shared_interests: shared,
                }
            })
            .collect();

        // Stable sort keeps input order as the last tie-break
        ranked.sort_by(|a, b| {
            b.compatibility_score
                .cmp(&a.compatibility_score)
                .then_with(|| b.profile.updated_at.cmp(&a.profile.updated_at))
        });

        ranked
    }

    /// Full request flow used by the HTTP layer
    ///
    /// Excludes the requester from its own pool, applies the pool policy,
    /// ranks, filters by topic (falling back to recently active users when
    /// the filter matches nobody) and applies the limit.
    pub fn find_matches(&self, request: &MatchRequest, now: DateTime<Utc>) -> MatchResult {
        let requester = &request.requester;

        let real: Vec<Profile> = request
            .candidates
            .iter()
            .filter(|p| requester.id.is_empty() || p.id != requester.id)
            .cloned()
            .collect();

        let (pool, seeded) = self.pool_policy.apply(&requester.id, real);
        let total_candidates = pool.len();

        let ranked = self.rank_with_mood(requester, pool, request.mood.as_deref(), now);

        let topic = request.topic.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let (mut matches, fallback_mode) = match topic {
            Some(topic) => {
                let filtered = filter_by_topic(ranked.clone(), topic);
                if filtered.is_empty() && !ranked.is_empty() {
                    (most_recently_active(ranked, FALLBACK_SIZE), true)
                } else {
                    (filtered, false)
                }
            }
            None => (ranked, false),
        };

        if let Some(limit) = request.limit {
            matches.truncate(limit);
        }

        tracing::debug!(
            "Ranked {} candidates for {} (returned: {}, fallback: {}, seeded: {})",
            total_candidates,
            requester.id,
            matches.len(),
            fallback_mode,
            seeded
        );

        MatchResult {
            matches,
            total_candidates,
            fallback_mode,
            seeded,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

fn most_recently_active(mut ranked: Vec<MatchCandidate>, count: usize) -> Vec<MatchCandidate> {
    ranked.sort_by(|a, b| b.profile.updated_at.cmp(&a.profile.updated_at));
    ranked.truncate(count);
    ranked
}

use crate::models::{MatchCandidate, Profile};

/// Mood/goal compatibility table: (goal keyword, mood keyword)
pub const MOOD_GOAL_TABLE: &[(&str, &str)] = &[
    ("support", "calm"),
    ("energy", "energetic"),
    ("creative", "creative"),
    ("learn", "focused"),
];

/// Case-insensitive containment in either direction
#[inline]
pub fn interest_matches(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Candidate interests that overlap the requester's topics or interests
///
/// Returned in the candidate's own order and spelling.
pub fn shared_interests(candidate: &Profile, requester: &Profile) -> Vec<String> {
    candidate
        .interests
        .iter()
        .filter(|interest| {
            requester
                .last_conversation_topics
                .iter()
                .chain(requester.interests.iter())
                .any(|theirs| interest_matches(interest, theirs))
        })
        .cloned()
        .collect()
}

/// Whether a candidate's mood suits the requester's connection goals
#[inline]
pub fn mood_suits_goals(mood: &str, connection_goals: &str) -> bool {
    let mood = mood.to_lowercase();
    let goals = connection_goals.to_lowercase();
    if mood.is_empty() || goals.is_empty() {
        return false;
    }

    MOOD_GOAL_TABLE
        .iter()
        .any(|(goal, wanted_mood)| goals.contains(goal) && mood.contains(wanted_mood))
}

/// Whether two stated intentions overlap
#[inline]
pub fn intentions_compatible(requester: &str, candidate: &str) -> bool {
    interest_matches(requester, candidate)
}

/// Check if a ranked candidate is about the given topic
///
/// Looks at the profile-derived parts of the match: interests, the shared
/// interests named in the reasoning, mood and recent conversation topics.
/// Fixed template wording in the reasoning sentence never matches.
pub fn matches_topic(candidate: &MatchCandidate, topic: &str) -> bool {
    let topic = topic.trim().to_lowercase();
    if topic.is_empty() {
        return true;
    }

    let profile = &candidate.profile;
    profile
        .interests
        .iter()
        .chain(candidate.shared_interests.iter())
        .chain(profile.last_conversation_topics.iter())
        .chain(std::iter::once(&profile.mood))
        .any(|field| field.to_lowercase().contains(&topic))
}

/// Keep only candidates about `topic`, preserving rank order
pub fn filter_by_topic(ranked: Vec<MatchCandidate>, topic: &str) -> Vec<MatchCandidate> {
    if topic.trim().is_empty() {
        return ranked;
    }
    ranked
        .into_iter()
        .filter(|candidate| matches_topic(candidate, topic))
        .collect()
}

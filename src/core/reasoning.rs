use crate::models::Profile;

const DEFAULT_MOOD: &str = "open";
const DEFAULT_INTEREST: &str = "good conversation";

/// Explain why a candidate was suggested
///
/// Pure template selection: shared interests are named explicitly when
/// there are any, otherwise the sentence falls back to the candidate's mood
/// and first listed interest. Never returns an empty string.
pub fn generate_reasoning(candidate: &Profile, shared: &[String]) -> String {
    let name = candidate.name_or_anonymous();

    if !shared.is_empty() {
        return format!(
            "You both seem interested in {}! That's a great starting point for a conversation, and {} can share their experience with it.",
            join_readable(shared),
            name
        );
    }

    let mood = if candidate.mood.is_empty() {
        DEFAULT_MOOD.to_string()
    } else {
        candidate.mood.to_lowercase()
    };
    let first_interest = candidate
        .interests
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_INTEREST);

    format!(
        "{} brings {} outlook and loves {}. You could explore these topics together and discover new perspectives!",
        name,
        with_article(&mood),
        first_interest
    )
}

fn with_article(word: &str) -> String {
    let article = match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{} {}", article, word)
}

/// Opening message posted when a conversation is created
pub fn introduction_message(target_name: &str, reasoning: Option<&str>) -> String {
    match reasoning.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!(
            "Hi! I'm connecting you two because I see common ground. {} Hope you have a great conversation!",
            reason
        ),
        None => format!(
            "Hi! Your assistant connected you with {} based on your conversation interests. Hope you have a great chat!",
            target_name
        ),
    }
}

/// "a", "a and b", "a, b and c"
fn join_readable(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

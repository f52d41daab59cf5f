use cinematch_core::ScoredMatch;

pub const NO_MATCHES: &str = "Sorry, no similar movies were found.";
pub const FAILURE: &str = "Something went wrong. Please try again later.";

const SEPARATOR: &str = "---------------";

/// Render matches as the chat reply text sent back to the user.
pub fn format_reply(matches: &[ScoredMatch<'_>]) -> String {
    if matches.is_empty() {
        return NO_MATCHES.to_string();
    }
    let body = matches
        .iter()
        .map(|m| format!("🎬 {} ({})\n{}\n{SEPARATOR}", m.item.title, m.item.year, m.item.description))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Similar movies:\n{body}")
}

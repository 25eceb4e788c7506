// src/utils/html.rs

/// Sanitizes question statements before they are stored.
///
/// Statements may carry a constrained HTML subset (formatting, lists,
/// images). Ammonia's whitelist keeps the safe tags and strips script
/// content and event-handler attributes, so whatever a dashboard later
/// renders cannot carry stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

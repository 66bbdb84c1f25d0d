//! Keyword intent classifier used by the scripted triage agent.
//!
//! Categories are tried in order (billing, technical, general) and the
//! first one with a matching keyword wins. Keywords match whole words.

use concierge_contracts::context::IssueType;
use concierge_guardrail::rule::{contains_words, normalize};

pub struct IntentClassifier {
    rules: Vec<(IssueType, Vec<Vec<String>>)>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new([
            (IssueType::Billing, &["refund", "charge", "charged", "billing", "invoice", "payment", "subscription"][..]),
            (
                IssueType::Technical,
                &["error", "bug", "not working", "crash", "crashes", "restart", "slow", "timeout", "down"][..],
            ),
            (IssueType::General, &["question", "account", "information", "ticket", "help with my account"][..]),
        ])
    }
}

impl IntentClassifier {
    pub fn new<'a>(rules: impl IntoIterator<Item = (IssueType, &'a [&'a str])>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(issue, keywords)| (issue, keywords.iter().map(|k| normalize(k)).collect()))
                .collect(),
        }
    }

    /// Classify `message`, or `None` when no keyword matches.
    pub fn classify(&self, message: &str) -> Option<IssueType> {
        let words = normalize(message);
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| contains_words(&words, k)))
            .map(|(issue, _)| *issue)
    }
}

#[cfg(test)]
mod tests {
    use concierge_contracts::context::IssueType;

    use super::IntentClassifier;

    #[test]
    fn classifies_each_category() {
        let classifier = IntentClassifier::default();
        assert_eq!(classifier.classify("I need help with my billing"), Some(IssueType::Billing));
        assert_eq!(classifier.classify("The app is NOT working!"), Some(IssueType::Technical));
        assert_eq!(classifier.classify("a question about my account"), Some(IssueType::General));
    }

    #[test]
    fn billing_wins_ties() {
        let classifier = IntentClassifier::default();
        assert_eq!(
            classifier.classify("refund the charge, the app had an error"),
            Some(IssueType::Billing)
        );
    }

    #[test]
    fn no_keyword_is_unclassified() {
        let classifier = IntentClassifier::default();
        assert_eq!(classifier.classify("hmm"), None);
        // Whole words only.
        assert_eq!(classifier.classify("errorless"), None);
    }
}

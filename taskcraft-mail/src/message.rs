//! Email message record

use serde::{Deserialize, Serialize};

/// One captured email message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    #[serde(rename = "from")]
    pub from_addr: String,
    pub to: Vec<String>,
    pub subject: String,
    /// Plaintext body
    pub text: String,
    /// Capture time, unix milliseconds
    pub date: u64,
}

impl EmailMessage {
    /// Case-insensitive substring match over subject, from, recipients
    /// (joined as one string), and the plaintext body.
    ///
    /// The literal query is matched as-is: no regex or wildcards, spaces are
    /// literal, case-insensitive but not accent-insensitive. An empty query
    /// matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();

        self.subject.to_lowercase().contains(&needle)
            || self.from_addr.to_lowercase().contains(&needle)
            || self.to.join(", ").to_lowercase().contains(&needle)
            || self.text.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EmailMessage {
        EmailMessage {
            id: "msg_1".into(),
            from_addr: "Ops Bot <ops@example.local>".into(),
            to: vec!["lead@customer.example".into(), "cc@customer.example".into()],
            subject: "Weekly Report".into(),
            text: "All systems nominal.".into(),
            date: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_match_subject_case_insensitive() {
        assert!(sample().matches_query("weekly"));
        assert!(sample().matches_query("WEEKLY REPORT"));
        assert!(!sample().matches_query("monthly"));
    }

    #[test]
    fn test_match_from_and_recipients() {
        assert!(sample().matches_query("ops@"));
        assert!(sample().matches_query("lead@customer"));
    }

    #[test]
    fn test_match_body_and_empty_query() {
        assert!(sample().matches_query("nominal"));
        assert!(sample().matches_query(""));
    }

    #[test]
    fn test_literal_match_only() {
        // Spaces are literal: the exact sequence must appear
        assert!(sample().matches_query("weekly report"));
        assert!(!sample().matches_query("report weekly"));
    }

    #[test]
    fn test_serde_uses_from_field() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["from"], "Ops Bot <ops@example.local>");

        let back: EmailMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}

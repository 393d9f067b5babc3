//! Client-side filter criteria for connection listings.

use serde::{Deserialize, Serialize};

use super::ConnectionEntry;

/// Free-text filter applied by consumers to an already fetched entry list.
///
/// Each criterion is optional; set criteria are combined with logical AND.
/// An empty string counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Port number or substring of it.
    #[serde(default)]
    pub port: Option<String>,
    /// Case-insensitive substring of the process name.
    #[serde(default)]
    pub process_name: Option<String>,
    /// PID or substring of it.
    #[serde(default)]
    pub pid: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a criterion from a single search box query.
    ///
    /// A valid port number (0-65535) filters by port, anything else by
    /// process name. An empty query yields empty criteria.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            Self::default()
        } else if is_valid_port(query) {
            Self::default().with_port(query)
        } else {
            Self::default().with_process_name(query)
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn with_pid(mut self, pid: impl Into<String>) -> Self {
        self.pid = Some(pid.into());
        self
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        set(&self.port).is_none() && set(&self.process_name).is_none() && set(&self.pid).is_none()
    }

    /// Check whether an entry satisfies every set criterion.
    pub fn matches(&self, entry: &ConnectionEntry) -> bool {
        if let Some(port) = set(&self.port) {
            if !matches_number(port, entry.port.into()) {
                return false;
            }
        }
        if let Some(name) = set(&self.process_name) {
            if !entry
                .process_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        if let Some(pid) = set(&self.pid) {
            if !matches_number(pid, entry.pid.into()) {
                return false;
            }
        }
        true
    }
}

fn set(criterion: &Option<String>) -> Option<&str> {
    criterion.as_deref().filter(|s| !s.is_empty())
}

fn matches_number(needle: &str, value: u64) -> bool {
    let formatted = value.to_string();
    formatted == needle || formatted.contains(needle)
}

/// Whether `text` is a decimal port number in 0-65535.
pub fn is_valid_port(text: &str) -> bool {
    text.parse::<u16>().is_ok()
}

/// Apply criteria to a list of entries.
pub fn filter_entries(entries: &[ConnectionEntry], criteria: &FilterCriteria) -> Vec<ConnectionEntry> {
    entries
        .iter()
        .filter(|e| criteria.matches(e))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionState, ProcessInfo, Protocol};
    use chrono::Utc;

    fn entry(port: u16, pid: u32, name: &str) -> ConnectionEntry {
        let process = ProcessInfo::new(pid, name, "", 1, None, Utc::now());
        ConnectionEntry::new(
            Protocol::Tcp,
            "127.0.0.1",
            port,
            ConnectionState::Listening,
            &process,
            false,
        )
    }

    #[test]
    fn test_empty_matches_everything() {
        let criteria = FilterCriteria::new();
        assert!(criteria.is_empty());
        assert!(criteria.matches(&entry(8080, 4321, "node.exe")));
        assert!(criteria.matches(&entry(1, 2, "x")));
    }

    #[test]
    fn test_empty_strings_count_as_unset() {
        let criteria = FilterCriteria::new().with_port("").with_pid("");
        assert!(criteria.is_empty());
        assert!(criteria.matches(&entry(8080, 4321, "node.exe")));
    }

    #[test]
    fn test_process_name_case_insensitive() {
        let criteria = FilterCriteria::new().with_process_name("CHROME");
        assert!(criteria.matches(&entry(443, 10, "chrome.exe")));
        assert!(!criteria.matches(&entry(443, 10, "firefox.exe")));
    }

    #[test]
    fn test_port_substring() {
        let criteria = FilterCriteria::new().with_port("80");
        assert!(criteria.matches(&entry(80, 1, "nginx")));
        assert!(criteria.matches(&entry(8080, 1, "node")));
        assert!(!criteria.matches(&entry(3000, 1, "node")));
    }

    #[test]
    fn test_criteria_are_anded() {
        let criteria = FilterCriteria::new().with_port("8080").with_pid("43");
        assert!(criteria.matches(&entry(8080, 4321, "node")));
        assert!(!criteria.matches(&entry(8080, 1000, "node")));
        assert!(!criteria.matches(&entry(3000, 4321, "node")));
    }

    #[test]
    fn test_from_query() {
        assert_eq!(FilterCriteria::from_query("3000").port.as_deref(), Some("3000"));
        assert_eq!(
            FilterCriteria::from_query("node").process_name.as_deref(),
            Some("node")
        );
        assert_eq!(
            FilterCriteria::from_query("70000").process_name.as_deref(),
            Some("70000")
        );
        assert!(FilterCriteria::from_query("  ").is_empty());
    }

    #[test]
    fn test_filter_entries() {
        let entries = vec![entry(3000, 1, "node"), entry(5432, 2, "postgres")];
        let result = filter_entries(&entries, &FilterCriteria::from_query("post"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].port, 5432);
    }
}

//! Message/client multiplexing
//!
//! Owns the authoritative in-memory message log, the known-client set, and
//! the operator's visibility filter. The log is append-only: messages are
//! never removed or reordered, and per-client counts are always re-derived
//! from it rather than maintained as separate counters.

use std::collections::HashSet;

use fleet_protocol::SYSTEM_TAG;

/// Opaque identifier of a remote client
pub type ClientId = String;

/// One received message. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// A client id, or [`SYSTEM_TAG`] for server notices
    pub origin: String,
    /// Raw payload text, escape sequences and all
    pub payload: String,
    /// Arrival order, assigned on append
    pub seq: u64,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.origin == SYSTEM_TAG
    }
}

/// Multiplexer state: message log, client set, visibility filter
#[derive(Debug)]
pub struct Multiplexer {
    log: Vec<Message>,
    clients: Vec<ClientId>,
    filter: HashSet<ClientId>,
    /// Set once the filter has been auto-populated from the first client
    /// list; an operator clearing the filter afterwards is respected
    bootstrapped: bool,
    /// System notices containing any of these phrases are always shown
    /// regardless of the filter
    system_phrases: Vec<String>,
    next_seq: u64,
}

impl Multiplexer {
    pub fn new(system_phrases: Vec<String>) -> Self {
        Self {
            log: Vec::new(),
            clients: Vec::new(),
            filter: HashSet::new(),
            bootstrapped: false,
            system_phrases: system_phrases
                .into_iter()
                .map(|p| p.to_lowercase())
                .collect(),
            next_seq: 0,
        }
    }

    /// Append a message to the log. Returns whether it is visible under
    /// the current filter (the render decision); the append itself is
    /// unconditional.
    pub fn record_message(&mut self, origin: impl Into<String>, payload: impl Into<String>) -> bool {
        let msg = Message {
            origin: origin.into(),
            payload: payload.into(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let visible = self.is_visible(&msg);
        self.log.push(msg);
        visible
    }

    /// Replace the known-client set with the authoritative snapshot from a
    /// `client_update` frame. On the first arrival an empty filter is
    /// auto-populated to "all clients". Returns true when the snapshot
    /// differs from the previous client set or the filter changed (caller
    /// should rebuild the client display).
    pub fn apply_client_update(&mut self, clients: Vec<ClientId>) -> bool {
        let set_changed = self.clients != clients;
        self.clients = clients;
        if !self.bootstrapped && self.filter.is_empty() && !self.clients.is_empty() {
            self.filter = self.clients.iter().cloned().collect();
            self.bootstrapped = true;
            return true;
        }
        set_changed
    }

    /// Set one client's membership in the visibility filter
    pub fn set_visibility(&mut self, client: &str, visible: bool) {
        if visible {
            self.filter.insert(client.to_string());
        } else {
            self.filter.remove(client);
        }
    }

    /// Set every known client's filter membership in one batch
    pub fn select_all(&mut self, visible: bool) {
        if visible {
            self.filter = self.clients.iter().cloned().collect();
        } else {
            self.filter.clear();
        }
    }

    /// Visibility rule for one message under the current filter
    pub fn is_visible(&self, msg: &Message) -> bool {
        if msg.is_system() {
            let text = msg.payload.to_lowercase();
            self.filter
                .iter()
                .any(|client| text.contains(&client.to_lowercase()))
                || self
                    .system_phrases
                    .iter()
                    .any(|phrase| text.contains(phrase))
        } else {
            self.filter.contains(&msg.origin)
        }
    }

    /// Re-derive the visible message list from the complete log
    pub fn visible_messages(&self) -> Vec<&Message> {
        self.log.iter().filter(|m| self.is_visible(m)).collect()
    }

    /// Count of messages attributed to one client: entries it originated
    /// plus system entries mentioning it. Pure derivation over the log.
    pub fn client_message_count(&self, client: &str) -> usize {
        let needle = client.to_lowercase();
        self.log
            .iter()
            .filter(|m| {
                m.origin == client
                    || (m.is_system() && m.payload.to_lowercase().contains(&needle))
            })
            .count()
    }

    pub fn log(&self) -> &[Message] {
        &self.log
    }

    pub fn clients(&self) -> &[ClientId] {
        &self.clients
    }

    pub fn is_filtered_in(&self, client: &str) -> bool {
        self.filter.contains(client)
    }

    pub fn filter_len(&self) -> usize {
        self.filter.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_phrases() -> Vec<String> {
        vec!["新客户端连接".into(), "客户端断开连接".into()]
    }

    fn mux_with_clients(clients: &[&str]) -> Multiplexer {
        let mut mux = Multiplexer::new(default_phrases());
        mux.apply_client_update(clients.iter().map(|c| c.to_string()).collect());
        mux
    }

    // ==================== Append-Only Log Tests ====================

    #[test]
    fn test_messages_append_in_arrival_order() {
        let mut mux = mux_with_clients(&["dev-1"]);
        mux.record_message("dev-1", "first");
        mux.record_message("dev-1", "second");
        mux.record_message(SYSTEM_TAG, "notice");

        let log = mux.log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].payload, "first");
        assert_eq!(log[1].payload, "second");
        assert_eq!(log[2].payload, "notice");
        assert!(log.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[test]
    fn test_filtered_out_message_is_still_recorded() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.set_visibility("dev-1", false);

        let visible = mux.record_message("dev-1", "\u{1b}[31mERROR\u{1b}[0m started");
        assert!(!visible);
        assert_eq!(mux.log().len(), 1);
        assert_eq!(mux.client_message_count("dev-1"), 1);
        assert!(mux.visible_messages().is_empty());
    }

    #[test]
    fn test_message_becomes_visible_after_filter_change() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.select_all(false);
        mux.set_visibility("dev-2", true);

        assert!(!mux.record_message("dev-1", "hidden for now"));

        mux.set_visibility("dev-1", true);
        let visible = mux.visible_messages();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].payload, "hidden for now");
    }

    // ==================== Count Derivation Tests ====================

    #[test]
    fn test_count_is_pure_function_of_log() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.record_message("dev-1", "a");
        mux.record_message("dev-2", "b");
        mux.record_message("dev-1", "c");
        mux.record_message(SYSTEM_TAG, "新客户端连接: DEV-1");
        mux.record_message(SYSTEM_TAG, "unrelated notice");

        // dev-1 originated 2, and one system entry mentions it
        // case-insensitively
        assert_eq!(mux.client_message_count("dev-1"), 3);
        assert_eq!(mux.client_message_count("dev-2"), 1);
        assert_eq!(mux.client_message_count("dev-3"), 0);
    }

    #[test]
    fn test_count_unaffected_by_filter() {
        let mut mux = mux_with_clients(&["dev-1"]);
        mux.record_message("dev-1", "a");
        mux.select_all(false);
        assert_eq!(mux.client_message_count("dev-1"), 1);
    }

    // ==================== Filter Bootstrap Tests ====================

    #[test]
    fn test_first_client_update_selects_all() {
        let mut mux = Multiplexer::new(default_phrases());
        let changed = mux.apply_client_update(vec!["dev-1".into(), "dev-2".into()]);
        assert!(changed);
        assert!(mux.is_filtered_in("dev-1"));
        assert!(mux.is_filtered_in("dev-2"));
    }

    #[test]
    fn test_later_updates_respect_operator_deselection() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.select_all(false);

        let changed = mux.apply_client_update(vec!["dev-1".into(), "dev-2".into(), "dev-3".into()]);
        // The set change is reported, but the cleared filter stays cleared
        assert!(changed);
        assert_eq!(mux.filter_len(), 0);
        assert!(!mux.is_filtered_in("dev-3"));
    }

    #[test]
    fn test_post_bootstrap_join_and_leave_are_reported() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);

        // dev-3 joins
        assert!(mux.apply_client_update(vec![
            "dev-1".into(),
            "dev-2".into(),
            "dev-3".into()
        ]));
        assert_eq!(mux.clients(), &["dev-1", "dev-2", "dev-3"]);

        // dev-1 leaves
        assert!(mux.apply_client_update(vec!["dev-2".into(), "dev-3".into()]));
        assert_eq!(mux.clients(), &["dev-2", "dev-3"]);
    }

    #[test]
    fn test_identical_snapshot_is_not_reported() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        assert!(!mux.apply_client_update(vec!["dev-1".into(), "dev-2".into()]));
    }

    #[test]
    fn test_empty_filter_before_bootstrap_shows_nothing() {
        let mut mux = Multiplexer::new(default_phrases());
        assert!(!mux.record_message("dev-1", "early"));
        assert!(mux.visible_messages().is_empty());
    }

    // ==================== select_all Tests ====================

    #[test]
    fn test_select_all_is_one_batch() {
        let mut mux = mux_with_clients(&["a", "b", "c"]);
        mux.select_all(false);
        assert_eq!(mux.filter_len(), 0);
        mux.select_all(true);
        assert_eq!(mux.filter_len(), 3);
    }

    // ==================== System Visibility Tests ====================

    #[test]
    fn test_generic_notices_always_visible() {
        let mut mux = mux_with_clients(&["dev-1"]);
        mux.select_all(false);

        assert!(mux.record_message(SYSTEM_TAG, "新客户端连接: dev-9"));
        assert!(mux.record_message(SYSTEM_TAG, "客户端断开连接: dev-9"));
    }

    #[test]
    fn test_system_notice_mentioning_filtered_client_visible() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.select_all(false);
        mux.set_visibility("dev-1", true);

        assert!(mux.record_message(SYSTEM_TAG, "发送失败: [DEV-1] 不可达"));
        assert!(!mux.record_message(SYSTEM_TAG, "发送失败: [dev-2] 不可达"));
    }

    #[test]
    fn test_system_phrase_allowlist_is_configurable() {
        let mut mux = Multiplexer::new(vec!["client connected".into()]);
        mux.apply_client_update(vec!["dev-1".into()]);
        mux.select_all(false);

        assert!(mux.record_message(SYSTEM_TAG, "Client Connected: dev-5"));
        assert!(!mux.record_message(SYSTEM_TAG, "新客户端连接: dev-5"));
    }

    #[test]
    fn test_client_message_requires_filter_membership() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.set_visibility("dev-1", false);

        assert!(!mux.record_message("dev-1", "x"));
        assert!(mux.record_message("dev-2", "y"));
    }

    // ==================== Derived List Tests ====================

    #[test]
    fn test_visible_messages_rederived_exactly() {
        let mut mux = mux_with_clients(&["dev-1", "dev-2"]);
        mux.record_message("dev-1", "one");
        mux.record_message("dev-2", "two");
        mux.record_message("dev-1", "three");

        mux.set_visibility("dev-2", false);
        let visible: Vec<_> = mux
            .visible_messages()
            .iter()
            .map(|m| m.payload.clone())
            .collect();
        assert_eq!(visible, vec!["one", "three"]);

        // No stale entries after toggling back
        mux.set_visibility("dev-2", true);
        assert_eq!(mux.visible_messages().len(), 3);
    }
}

//! Webhook event classification.
//!
//! Every provider names the kind of delivery in a header. Only pushes are
//! parsed and dispatched; liveness pings are acknowledged without touching the
//! body; everything else is refused.

/// What a delivery's event header says it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventClassification {
    /// New commits were pushed; parse and dispatch.
    Push,

    /// The provider is checking that the endpoint is reachable.
    Ping,

    /// Any other event. Carries the header value, which is empty when the
    /// header was missing.
    Ignored(String),
}

impl EventClassification {
    /// Classifies an event key against a provider's push and ping keys.
    ///
    /// Providers without a ping event pass `None` for `ping_key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use material_hooks::webhooks::EventClassification;
    ///
    /// let classify =
    ///     |key| EventClassification::from_event_key(key, "repo:refs_changed", Some("diagnostics:ping"));
    ///
    /// assert_eq!(classify(Some("repo:refs_changed")), EventClassification::Push);
    /// assert_eq!(classify(Some("diagnostics:ping")), EventClassification::Ping);
    /// assert_eq!(
    ///     classify(Some("pr:opened")),
    ///     EventClassification::Ignored("pr:opened".to_string())
    /// );
    /// ```
    pub fn from_event_key(event_key: Option<&str>, push_key: &str, ping_key: Option<&str>) -> Self {
        match event_key {
            Some(key) if key == push_key => EventClassification::Push,
            Some(key) if Some(key) == ping_key => EventClassification::Ping,
            Some(key) => EventClassification::Ignored(key.to_string()),
            None => EventClassification::Ignored(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_ignored_with_empty_key() {
        let classification = EventClassification::from_event_key(None, "push", Some("ping"));
        assert_eq!(classification, EventClassification::Ignored(String::new()));
    }

    #[test]
    fn provider_without_ping_ignores_ping_like_keys() {
        let classification =
            EventClassification::from_event_key(Some("ping"), "Push Hook", None);
        assert_eq!(classification, EventClassification::Ignored("ping".to_string()));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let classification = EventClassification::from_event_key(Some("PUSH"), "push", None);
        assert_eq!(classification, EventClassification::Ignored("PUSH".to_string()));
    }
}

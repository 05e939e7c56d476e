use std::collections::HashMap;

/// Resource an async flow reads or writes; one in-flight generation each
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Logs,
    ChatMessages(String),
    /// Keyed by the pending message's local id, so sends never supersede each other
    SendMessage(String),
    MarkRead(String),
    UnreadCount,
    SupportTickets,
}

/// Identity of one request: the resource and its issue sequence number
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub resource: Resource,
    pub seq: u64,
}

/// Latest issued sequence per resource
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    latest: HashMap<Resource, u64>,
}

impl RequestTracker {
    /// Record `ticket` as the newest request for its resource
    pub fn begin(&mut self, ticket: &Ticket) {
        let latest = self.latest.entry(ticket.resource.clone()).or_insert(0);
        *latest = (*latest).max(ticket.seq);
    }

    /// A resolution applies only if no newer request for the resource was issued
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.get(&ticket.resource) == Some(&ticket.seq)
    }

    /// Drop the resource once its request has resolved
    pub fn finish(&mut self, ticket: &Ticket) {
        if self.is_current(ticket) {
            self.latest.remove(&ticket.resource);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.latest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(resource: Resource, seq: u64) -> Ticket {
        Ticket { resource, seq }
    }

    #[test]
    fn test_newer_request_supersedes_older() {
        let mut tracker = RequestTracker::default();
        let old = ticket(Resource::Logs, 1);
        let new = ticket(Resource::Logs, 2);
        tracker.begin(&old);
        tracker.begin(&new);

        assert!(!tracker.is_current(&old));
        assert!(tracker.is_current(&new));
    }

    #[test]
    fn test_resources_are_independent() {
        let mut tracker = RequestTracker::default();
        let a = ticket(Resource::ChatMessages("c1".into()), 1);
        let b = ticket(Resource::ChatMessages("c2".into()), 2);
        tracker.begin(&a);
        tracker.begin(&b);
        assert!(tracker.is_current(&a));
        assert!(tracker.is_current(&b));
    }

    #[test]
    fn test_finish_clears_only_current() {
        let mut tracker = RequestTracker::default();
        let old = ticket(Resource::UnreadCount, 1);
        let new = ticket(Resource::UnreadCount, 2);
        tracker.begin(&old);
        tracker.begin(&new);

        tracker.finish(&old);
        assert_eq!(tracker.in_flight(), 1);
        tracker.finish(&new);
        assert_eq!(tracker.in_flight(), 0);
        assert!(!tracker.is_current(&new));
    }
}

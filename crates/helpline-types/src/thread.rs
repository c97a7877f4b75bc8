//! Admin-side grouping of the flat message listing into conversations.
//!
//! Nothing here is cached: the admin view calls [`project_threads`] on every
//! fetch and throws the previous projection away.

use std::collections::HashMap;

use crate::api::AdminMessage;
use crate::models::{Message, ThreadKey, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub key: ThreadKey,
    pub display_name: Option<String>,
    /// Oldest first.
    pub messages: Vec<Message>,
    /// User-authored messages the admin has not read yet.
    pub unread_count: usize,
}

impl Thread {
    fn new(key: ThreadKey) -> Self {
        Self {
            key,
            display_name: None,
            messages: Vec::new(),
            unread_count: 0,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Only real users' threads accept replies.
    pub fn reply_target(&self) -> Option<UserId> {
        match self.key {
            ThreadKey::User(id) => Some(id),
            ThreadKey::Anonymous => None,
        }
    }
}

/// Group a flat listing into threads. Threads come back most recently active
/// first; messages inside each thread are ordered by `(created_at, id)`.
pub fn project_threads(flat: &[AdminMessage]) -> Vec<Thread> {
    let mut by_key: HashMap<ThreadKey, Thread> = HashMap::new();

    for row in flat {
        let key = row.message.thread_key();
        let thread = by_key.entry(key).or_insert_with(|| Thread::new(key));

        if thread.display_name.is_none() {
            thread.display_name = row.user_name.clone();
        }
        if row.message.awaits_admin() {
            thread.unread_count += 1;
        }
        thread.messages.push(row.message.clone());
    }

    let mut threads: Vec<Thread> = by_key.into_values().collect();
    for thread in &mut threads {
        thread.messages.sort_by_key(Message::order_key);
    }
    threads.sort_by(|a, b| {
        let a_last = a.last_message().map(Message::order_key);
        let b_last = b.last_message().map(Message::order_key);
        b_last.cmp(&a_last)
    });

    threads
}

/// Unread counter for one user's thread; zero when the thread does not exist.
pub fn unread_count_for(threads: &[Thread], user_id: UserId) -> usize {
    threads
        .iter()
        .find(|t| t.key == ThreadKey::User(user_id))
        .map_or(0, |t| t.unread_count)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::models::MessageId;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn row(id: i64, user: Option<i64>, from_admin: bool, read: bool, secs: i64) -> AdminMessage {
        AdminMessage {
            message: Message {
                id: MessageId(id),
                user_id: user.map(UserId),
                body: format!("m{}", id),
                is_from_admin: from_admin,
                read,
                created_at: at(secs),
            },
            user_name: user.map(|u| format!("user{}", u)),
        }
    }

    #[test]
    fn groups_and_orders_within_thread() {
        // Newest first, as the store returns it.
        let flat = vec![
            row(4, Some(1), false, false, 30),
            row(3, Some(2), false, false, 20),
            row(2, Some(1), true, false, 10),
            row(1, Some(1), false, true, 0),
        ];

        let threads = project_threads(&flat);
        assert_eq!(threads.len(), 2);

        let first = &threads[0];
        assert_eq!(first.key, ThreadKey::User(UserId(1)));
        assert_eq!(first.display_name.as_deref(), Some("user1"));
        let ids: Vec<i64> = first.messages.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        // Admin-authored unread messages do not count for the admin.
        assert_eq!(first.unread_count, 1);

        assert_eq!(threads[1].key, ThreadKey::User(UserId(2)));
    }

    #[test]
    fn timestamp_ties_break_on_id() {
        let flat = vec![row(6, Some(1), false, false, 5), row(5, Some(1), true, false, 5)];
        let threads = project_threads(&flat);
        let ids: Vec<i64> = threads[0].messages.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn anonymous_messages_stay_separate() {
        let flat = vec![
            row(3, None, false, false, 20),
            row(2, Some(1), false, false, 10),
            row(1, None, false, false, 0),
        ];

        let threads = project_threads(&flat);
        assert_eq!(threads.len(), 2);

        let anon = threads.iter().find(|t| t.key == ThreadKey::Anonymous).unwrap();
        assert_eq!(anon.messages.len(), 2);
        assert_eq!(anon.unread_count, 2);
        assert_eq!(anon.reply_target(), None);
        assert_eq!(anon.display_name, None);
    }

    #[test]
    fn missing_thread_has_zero_unread() {
        let flat = vec![row(1, Some(1), false, false, 0)];
        let threads = project_threads(&flat);
        assert_eq!(unread_count_for(&threads, UserId(1)), 1);
        assert_eq!(unread_count_for(&threads, UserId(99)), 0);
    }

    #[test]
    fn empty_listing_projects_nothing() {
        assert!(project_threads(&[]).is_empty());
    }
}

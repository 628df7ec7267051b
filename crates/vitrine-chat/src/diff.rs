//! Comparison between the local chat log and a remote snapshot.

use std::collections::HashSet;

use vitrine_core::models::chat::{ChatMessage, ChatSender};

/// Oldest first. Messages with equal timestamps keep their relative order.
pub fn sort_by_timestamp(messages: &mut [ChatMessage]) {
    messages.sort_by_key(|m| m.timestamp);
}

/// Positional comparison on id, text, timestamp, sender and edit time.
pub fn has_difference(local: &[ChatMessage], remote: &[ChatMessage]) -> bool {
    local.len() != remote.len() || local.iter().zip(remote).any(|(a, b)| !a.sync_eq(b))
}

/// Whether `remote` holds a customer message whose id `local` has not seen.
pub fn has_unseen_customer_message(local: &[ChatMessage], remote: &[ChatMessage]) -> bool {
    let seen: HashSet<&str> = local.iter().map(|m| m.id.as_str()).collect();
    remote
        .iter()
        .any(|m| m.sender == ChatSender::Customer && !seen.contains(m.id.as_str()))
}

/// Fold `remote` into a `local` log holding changes the remote has not
/// acknowledged. Local versions win for shared ids, remote-only messages are
/// added unless deleted locally, and the result is sorted oldest first.
pub fn merge_unsaved(
    local: &[ChatMessage],
    remote: Vec<ChatMessage>,
    deleted: &HashSet<String>,
) -> Vec<ChatMessage> {
    let known: HashSet<&str> = local.iter().map(|m| m.id.as_str()).collect();
    let mut merged = local.to_vec();
    merged.extend(
        remote
            .into_iter()
            .filter(|m| !known.contains(m.id.as_str()) && !deleted.contains(&m.id)),
    );
    sort_by_timestamp(&mut merged);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, sender: ChatSender, text: &str, timestamp: i64) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            sender,
            text: text.into(),
            timestamp,
            edited_at: None,
            customer_name: None,
            customer_email: None,
            author_name: None,
            author_email: None,
            author_role: None,
        }
    }

    #[test]
    fn identical_logs_do_not_differ() {
        let a = vec![msg("1", ChatSender::Customer, "hi", 10)];
        let mut b = a.clone();
        b[0].author_name = Some("Dana".into());
        b[0].edited_at = Some(0);
        assert!(!has_difference(&a, &b));
    }

    #[test]
    fn edits_and_reorders_differ() {
        let a = vec![
            msg("1", ChatSender::Customer, "hi", 10),
            msg("2", ChatSender::Admin, "hello", 20),
        ];
        let mut edited = a.clone();
        edited[1].edited_at = Some(30);
        assert!(has_difference(&a, &edited));

        let reversed: Vec<_> = a.iter().rev().cloned().collect();
        assert!(has_difference(&a, &reversed));
        assert!(has_difference(&a, &a[..1]));
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut log = vec![
            msg("b", ChatSender::Admin, "x", 20),
            msg("a1", ChatSender::Customer, "x", 10),
            msg("a2", ChatSender::Customer, "x", 10),
        ];
        sort_by_timestamp(&mut log);
        let ids: Vec<_> = log.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "b"]);
    }

    #[test]
    fn only_new_customer_ids_count() {
        let local = vec![msg("1", ChatSender::Customer, "hi", 10)];
        let admin_reply = vec![local[0].clone(), msg("2", ChatSender::Admin, "yo", 20)];
        assert!(!has_unseen_customer_message(&local, &admin_reply));

        let customer_follow_up = vec![local[0].clone(), msg("3", ChatSender::Customer, "?", 30)];
        assert!(has_unseen_customer_message(&local, &customer_follow_up));
    }

    #[test]
    fn merge_keeps_local_edits_and_adds_remote_arrivals() {
        let mut edited = msg("a-1", ChatSender::Admin, "edited", 10);
        edited.edited_at = Some(30);
        let local = vec![edited.clone(), msg("a-2", ChatSender::Admin, "unsent", 40)];
        let remote = vec![
            msg("a-1", ChatSender::Admin, "original", 10),
            msg("c-1", ChatSender::Customer, "hello?", 20),
            msg("a-0", ChatSender::Admin, "removed here", 5),
        ];
        let deleted = HashSet::from(["a-0".to_string()]);

        let merged = merge_unsaved(&local, remote, &deleted);
        let ids: Vec<&str> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a-1", "c-1", "a-2"]);
        assert_eq!(merged[0].text, "edited");
    }
}

//! Console rendering of chat events.

use chatwire_shared::time::{format_clock, format_date_time, now_local};

use crate::domain::{
    ChatMessage, FriendRequestRecord, GroupRecord, MessageKind, PresenceRecord, Recipient,
};

/// Render a chat message as one console line.
pub fn format_message(message: &ChatMessage) -> String {
    let at = message
        .timestamp
        .map(|timestamp| timestamp.value())
        .unwrap_or_else(now_local);

    if message.is_divider() {
        return format!("----- {} -----", format_date_time(&at));
    }

    let sender = match &message.sender_name {
        Some(name) => name.clone(),
        None => format!("user {}", message.sender_id),
    };
    let target = match &message.recipient {
        Recipient::Group(group_id) => format!(" [group {group_id}]"),
        Recipient::User { .. } | Recipient::Unaddressed => String::new(),
    };
    let body = match (message.kind, &message.file_url) {
        (MessageKind::Text, _) => message.content.clone(),
        (kind, Some(url)) => format!("[{kind}] {url}"),
        (kind, None) => format!("[{kind}] {}", message.content),
    };

    format!("[{}] {}{}: {}", format_clock(&at), sender, target, body)
}

pub fn format_presence(users: &[PresenceRecord]) -> String {
    let entries: Vec<String> = users
        .iter()
        .map(|user| format!("{} ({})", user.display_name(), user.status))
        .collect();
    format!("Users ({}): {}", users.len(), entries.join(", "))
}

pub fn format_error(error: &str) -> String {
    format!("! {error}")
}

/// `label` tells received, sent and answered requests apart.
pub fn format_friend_request(label: &str, request: &FriendRequestRecord) -> String {
    format!(
        "{}: {} -> {} ({})",
        label,
        request.sender.display_name(),
        request.receiver.display_name(),
        request.status
    )
}

pub fn format_group(group: &GroupRecord) -> String {
    format!(
        "Group created: {} (id {}, {} member(s))",
        group.name,
        group.id,
        group.member_ids.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupId, OnlineStatus, Timestamp, UserId};

    fn at(text: &str) -> Option<Timestamp> {
        Some(Timestamp::parse(text).unwrap())
    }

    fn user(id: i64, username: &str, nickname: Option<&str>) -> PresenceRecord {
        PresenceRecord {
            id: UserId::new(id),
            username: username.to_string(),
            nickname: nickname.map(str::to_string),
            avatar_url: None,
            status: OnlineStatus::Online,
        }
    }

    #[test]
    fn test_format_private_text_message() {
        // テスト項目: 個人宛テキストは時刻・送信者名・本文で表示される
        // given (前提条件):
        let mut message =
            ChatMessage::private(UserId::new(1), UserId::new(2), MessageKind::Text, "hi")
                .with_sender_name("alice");
        message.timestamp = at("2024-01-02T03:04:05");

        // when (操作):
        let line = format_message(&message);

        // then (期待する結果):
        assert_eq!(line, "[03:04:05] alice: hi");
    }

    #[test]
    fn test_format_group_media_message_without_name() {
        // テスト項目: 送信者名がないグループ宛メディアは ID・グループ・URL で表示される
        // given (前提条件):
        let mut message =
            ChatMessage::group(UserId::new(4), GroupId::new(9), MessageKind::Image, "cat")
                .with_file_url("http://files/cat.png");
        message.timestamp = at("2024-01-02T10:00:00");

        // when (操作):
        let line = format_message(&message);

        // then (期待する結果):
        assert_eq!(line, "[10:00:00] user 4 [group 9]: [IMAGE] http://files/cat.png");
    }

    #[test]
    fn test_format_divider() {
        // テスト項目: TIME 種別は日時の区切り線になる
        // given (前提条件):
        let mut message =
            ChatMessage::group(UserId::new(0), GroupId::new(1), MessageKind::Time, "");
        message.timestamp = at("2024-01-02T00:00:00");

        // when (操作):
        let line = format_message(&message);

        // then (期待する結果):
        assert_eq!(line, "----- 2024-01-02 00:00:00 -----");
    }

    #[test]
    fn test_format_presence_friend_request_and_group() {
        // テスト項目: プレゼンス・友達申請・グループ作成の表示
        // given (前提条件):
        let users = vec![user(1, "alice", None), user(2, "bob", Some("Bobby"))];
        let request = FriendRequestRecord {
            id: 1,
            sender: user(1, "alice", None),
            receiver: user(2, "bob", Some("Bobby")),
            status: "PENDING".to_string(),
            timestamp: None,
        };
        let group = GroupRecord {
            id: GroupId::new(8),
            name: "team".to_string(),
            owner_id: None,
            avatar_url: None,
            member_ids: vec![UserId::new(1), UserId::new(2)],
        };

        // when (操作):
        let presence = format_presence(&users);
        let request = format_friend_request("Friend request", &request);
        let group = format_group(&group);

        // then (期待する結果):
        assert_eq!(presence, "Users (2): alice (online), Bobby (online)");
        assert_eq!(request, "Friend request: alice -> Bobby (PENDING)");
        assert_eq!(group, "Group created: team (id 8, 2 member(s))");
        assert_eq!(format_error("boom"), "! boom");
    }
}

//! Client configuration.
//!
//! [`CliArgs`] is what the `chatwire` binary parses; [`ClientConfig`] is the
//! validated form the rest of the client works with.

use std::time::Duration;

use clap::Parser;

use crate::{
    domain::{ChatMessage, GroupId, MessageKind, ServerUrl, UserId},
    error::ConfigError,
    supervisor::ReconnectPolicy,
};

/// Command-line arguments of the `chatwire` client.
#[derive(Debug, Clone, Parser)]
#[command(name = "chatwire", version, about = "Real-time chat client")]
pub struct CliArgs {
    /// Chat server URL (http, https, ws or wss)
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080/ws")]
    pub server_url: String,

    /// Your user ID
    #[arg(short = 'u', long)]
    pub user_id: i64,

    /// Display name attached to outgoing messages
    #[arg(short = 'n', long)]
    pub user_name: Option<String>,

    /// Send typed lines privately to this user
    #[arg(long, conflicts_with = "to_group")]
    pub to_user: Option<i64>,

    /// Send typed lines to this group
    #[arg(long)]
    pub to_group: Option<i64>,

    /// Seconds to wait before reconnecting after a connection failure
    #[arg(long, default_value_t = 5)]
    pub reconnect_delay_secs: u64,

    /// Give up after this many consecutive reconnect attempts
    #[arg(long)]
    pub max_reconnect_attempts: Option<u32>,

    /// Do not reconnect after a connection failure
    #[arg(long)]
    pub no_reconnect: bool,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Default addressee of typed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRecipient {
    User(UserId),
    Group(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: ServerUrl,
    pub user_id: UserId,
    pub user_name: Option<String>,
    pub recipient: Option<DefaultRecipient>,
    pub policy: ReconnectPolicy,
    pub log_level: String,
}

impl TryFrom<CliArgs> for ClientConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_url = ServerUrl::new(args.server_url)?;

        let recipient = match (args.to_user, args.to_group) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingRecipient),
            (Some(user), None) => Some(DefaultRecipient::User(UserId::new(user))),
            (None, Some(group)) => Some(DefaultRecipient::Group(GroupId::new(group))),
            (None, None) => None,
        };

        let policy = if args.no_reconnect {
            ReconnectPolicy::Never
        } else if args.reconnect_delay_secs == 0 {
            return Err(ConfigError::ZeroReconnectDelay);
        } else {
            let policy = ReconnectPolicy::fixed(Duration::from_secs(args.reconnect_delay_secs));
            match args.max_reconnect_attempts {
                Some(limit) => policy.with_max_attempts(limit),
                None => policy,
            }
        };

        Ok(Self {
            server_url,
            user_id: UserId::new(args.user_id),
            user_name: args.user_name.filter(|name| !name.trim().is_empty()),
            recipient,
            policy,
            log_level: args.log_level,
        })
    }
}

impl ClientConfig {
    /// Build a TEXT message from a typed line, addressed to the default recipient.
    ///
    /// Returns `None` when no default recipient is configured.
    pub fn compose(&self, text: &str) -> Option<ChatMessage> {
        let message = match self.recipient? {
            DefaultRecipient::User(receiver) => {
                ChatMessage::private(self.user_id, receiver, MessageKind::Text, text)
            }
            DefaultRecipient::Group(group) => {
                ChatMessage::group(self.user_id, group, MessageKind::Text, text)
            }
        };
        Some(match &self.user_name {
            Some(name) => message.with_sender_name(name.clone()),
            None => message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValueObjectError;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["chatwire", "--user-id", "7"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_map_to_baseline_policy() {
        // テスト項目: 引数を省略すると既定の URL と 5 秒固定の再接続ポリシーになる
        // given (前提条件):
        let args = parse(&[]);

        // when (操作):
        let config = ClientConfig::try_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.server_url.as_str(), "ws://127.0.0.1:8080/ws");
        assert_eq!(config.user_id, UserId::new(7));
        assert_eq!(config.policy, ReconnectPolicy::default());
        assert_eq!(config.recipient, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_http_url_and_group_recipient() {
        // テスト項目: http の URL が ws に正規化され、グループ宛の既定宛先が設定される
        // given (前提条件):
        let args = parse(&["-s", "https://chat.example.com/ws", "--to-group", "3", "-n", "alice"]);

        // when (操作):
        let config = ClientConfig::try_from(args).unwrap();
        let message = config.compose("hello").unwrap();

        // then (期待する結果):
        assert_eq!(config.server_url.as_str(), "wss://chat.example.com/ws");
        assert_eq!(message.group_id(), Some(GroupId::new(3)));
        assert_eq!(message.sender_name.as_deref(), Some("alice"));
        assert_eq!(message.kind, MessageKind::Text);
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        // テスト項目: ws/wss/http/https 以外のスキームはエラーになる
        // given (前提条件):
        let args = parse(&["-s", "ftp://chat.example.com"]);

        // when (操作):
        let result = ClientConfig::try_from(args);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ConfigError::ServerUrl(ValueObjectError::ServerUrlUnsupportedScheme(
                "ftp".to_string()
            ))
        );
    }

    #[test]
    fn test_clap_rejects_both_recipients() {
        // テスト項目: --to-user と --to-group の同時指定は引数解析で拒否される
        // when (操作):
        let result = CliArgs::try_parse_from([
            "chatwire", "-u", "1", "--to-user", "2", "--to-group", "3",
        ]);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_reconnect_options() {
        // テスト項目: 再接続オプションがポリシーに反映される
        // given (前提条件):
        let limited = parse(&["--reconnect-delay-secs", "2", "--max-reconnect-attempts", "4"]);
        let disabled = parse(&["--no-reconnect"]);
        let zero = parse(&["--reconnect-delay-secs", "0"]);

        // when (操作):
        let limited = ClientConfig::try_from(limited).unwrap();
        let disabled = ClientConfig::try_from(disabled).unwrap();
        let zero = ClientConfig::try_from(zero);

        // then (期待する結果):
        assert_eq!(
            limited.policy,
            ReconnectPolicy::fixed(Duration::from_secs(2)).with_max_attempts(4)
        );
        assert_eq!(disabled.policy, ReconnectPolicy::Never);
        assert_eq!(zero.unwrap_err(), ConfigError::ZeroReconnectDelay);
    }

    #[test]
    fn test_compose_without_recipient() {
        // テスト項目: 既定の宛先がなければメッセージを組み立てない
        // given (前提条件):
        let config = ClientConfig::try_from(parse(&[])).unwrap();

        // when (操作):
        let message = config.compose("hello");

        // then (期待する結果):
        assert!(message.is_none());
    }
}

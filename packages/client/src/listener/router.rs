//! Event router: decoded events to listener callbacks.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::{
    domain::ChatEvent,
    infrastructure::codec::{self, Envelope, InboundFrame},
};

use super::{
    executor::CallbackExecutor,
    registry::{ListenerRegistry, Listeners},
};

/// Routes each event to the registry of its kind, on the callback thread.
#[derive(Debug)]
pub struct EventRouter {
    listeners: Arc<Listeners>,
    executor: CallbackExecutor,
}

impl EventRouter {
    pub fn new(listeners: Arc<Listeners>, executor: CallbackExecutor) -> Self {
        Self {
            listeners,
            executor,
        }
    }

    pub fn listeners(&self) -> &Arc<Listeners> {
        &self.listeners
    }

    pub fn executor(&self) -> &CallbackExecutor {
        &self.executor
    }

    /// Decode a text frame and dispatch its events.
    ///
    /// Decode failures are logged and the frame is dropped; nothing else
    /// changes.
    pub fn route_text(&self, frame: &str) {
        match codec::decode(frame) {
            Ok(inbound) => self.dispatch_frame(inbound),
            Err(e) => tracing::warn!("Dropping undecodable frame: {} (frame: {})", e, frame),
        }
    }

    /// Dispatch every event of a decoded frame, in order.
    pub fn dispatch_frame(&self, frame: InboundFrame) {
        if let InboundFrame::Envelope(Envelope::Unknown { tag }) = &frame {
            tracing::debug!("Ignoring envelope with unknown tag '{}'", tag);
            return;
        }
        for event in frame.into_events() {
            self.dispatch(event);
        }
    }

    /// Queue `event` for delivery to the listeners of its kind.
    ///
    /// The listener list is snapshotted on the callback thread right before
    /// iterating, so registrations made by a callback apply from the next
    /// event on.
    pub fn dispatch(&self, event: ChatEvent) {
        let listeners = Arc::clone(&self.listeners);
        tracing::trace!("Dispatching {} event", event.kind());
        self.executor.execute(move || match event {
            ChatEvent::Message(message) => notify(listeners.messages(), &message),
            ChatEvent::PresenceList(users) => notify(listeners.presence(), &users),
            ChatEvent::Error(error) => notify(listeners.errors(), &error),
            ChatEvent::FriendRequestReceived(request) => {
                notify(listeners.friend_requests_received(), &request)
            }
            ChatEvent::FriendRequestSent(request) => {
                notify(listeners.friend_requests_sent(), &request)
            }
            ChatEvent::FriendRequestResult(request) => {
                notify(listeners.friend_request_results(), &request)
            }
            ChatEvent::GroupCreated(group) => notify(listeners.groups_created(), &group),
        });
    }

    /// Wait until all events dispatched so far have been delivered.
    pub async fn flush(&self) {
        self.executor.flush().await;
    }
}

fn notify<T>(registry: &ListenerRegistry<T>, value: &T) {
    let snapshot = registry.snapshot();
    for listener in snapshot.iter() {
        if panic::catch_unwind(AssertUnwindSafe(|| listener.call(value))).is_err() {
            tracing::error!("A {} listener panicked", registry.kind());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListenerKind;
    use std::sync::Mutex;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - デコード済みイベントが対応する 1 種類のリスナーにのみ届くこと
    // - コールバックが専用スレッドで登録順に呼ばれること
    // - 不正フレームがリスナー登録状態を変えないこと
    // - コールバック内での登録・削除が配信中のイベントに影響しないこと
    // ========================================

    fn create_router() -> EventRouter {
        EventRouter::new(
            Arc::new(Listeners::new()),
            CallbackExecutor::spawn_named("router-test").unwrap(),
        )
    }

    /// Counts invocations per listener kind.
    fn count_all(router: &EventRouter) -> Arc<Mutex<Vec<ListenerKind>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listeners = router.listeners();
        macro_rules! track {
            ($registry:expr, $kind:expr) => {{
                let seen = Arc::clone(&seen);
                $registry.subscribe(move |_| seen.lock().unwrap().push($kind));
            }};
        }
        track!(listeners.messages(), ListenerKind::Message);
        track!(listeners.presence(), ListenerKind::PresenceList);
        track!(listeners.errors(), ListenerKind::Error);
        track!(listeners.friend_requests_received(), ListenerKind::FriendRequestReceived);
        track!(listeners.friend_requests_sent(), ListenerKind::FriendRequestSent);
        track!(listeners.friend_request_results(), ListenerKind::FriendRequestResult);
        track!(listeners.groups_created(), ListenerKind::GroupCreated);
        seen
    }

    fn bulk_frame(count: usize) -> String {
        let items: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"type":"TEXT","content":"m{i}","senderId":1,"receiverId":2}}"#))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[tokio::test]
    async fn test_bulk_frame_invokes_every_listener_once_per_element() {
        // テスト項目: N 件の配列は登録済みの各メッセージリスナーを N 回ずつ、配列順に呼ぶ
        // given (前提条件):
        let router = create_router();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let log = Arc::clone(&log);
            router
                .listeners()
                .messages()
                .subscribe(move |m| log.lock().unwrap().push(format!("{name}:{}", m.content)));
        }

        // when (操作):
        router.route_text(&bulk_frame(3));
        router.flush().await;

        // then (期待する結果):
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:m0", "second:m0", "first:m1", "second:m1", "first:m2", "second:m2"
            ]
        );
    }

    #[tokio::test]
    async fn test_bulk_frame_without_listeners() {
        // テスト項目: リスナーが 0 件でも配列フレームの処理は問題なく完了する
        // given (前提条件):
        let router = create_router();

        // when (操作):
        router.route_text(&bulk_frame(5));
        router.flush().await;

        // then (期待する結果):
        assert!(router.listeners().messages().is_empty());
    }

    #[tokio::test]
    async fn test_error_envelope_touches_only_error_listeners() {
        // テスト項目: error エンベロープはエラーリスナーにのみ "X" を届ける
        // given (前提条件):
        let router = create_router();
        let seen = count_all(&router);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        router
            .listeners()
            .errors()
            .subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        // when (操作):
        router.route_text(r#"{"type":"error","error":"X"}"#);
        router.flush().await;

        // then (期待する結果):
        assert_eq!(*seen.lock().unwrap(), vec![ListenerKind::Error]);
        assert_eq!(*errors.lock().unwrap(), vec!["X".to_string()]);
    }

    #[tokio::test]
    async fn test_garbage_frame_changes_nothing() {
        // テスト項目: JSON でないテキストはパニックせず、リスナー登録も変化させない
        // given (前提条件):
        let router = create_router();
        let seen = count_all(&router);
        let before: Vec<_> = ListenerKind::ALL
            .iter()
            .map(|k| router.listeners().count(*k))
            .collect();

        // when (操作):
        router.route_text("this is not json");
        router.route_text(r#"{"type":"typing"}"#);
        router.flush().await;

        // then (期待する結果):
        let after: Vec<_> = ListenerKind::ALL
            .iter()
            .map(|k| router.listeners().count(*k))
            .collect();
        assert_eq!(before, after);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callbacks_run_on_executor_thread() {
        // テスト項目: コールバックはネットワーク側ではなく専用スレッドで実行される
        // given (前提条件):
        let router = Arc::new(create_router());
        let threads = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&threads);
        router
            .listeners()
            .errors()
            .subscribe(move |_| sink.lock().unwrap().push(std::thread::current().id()));

        // when (操作):
        router.dispatch(ChatEvent::Error("boom".to_string()));
        router.flush().await;

        // then (期待する結果):
        assert_eq!(
            *threads.lock().unwrap(),
            vec![router.executor().thread_id()]
        );
    }

    #[tokio::test]
    async fn test_mutation_inside_callback_does_not_affect_inflight_dispatch() {
        // テスト項目: コールバック内での追加・削除は配信中のイベントには影響せず、次のイベントから反映される
        // given (前提条件):
        let router = Arc::new(create_router());
        let log = Arc::new(Mutex::new(Vec::new()));

        let late = {
            let log = Arc::clone(&log);
            crate::listener::Listener::new(move |e: &String| {
                log.lock().unwrap().push(format!("late:{e}"))
            })
        };
        let second = {
            let log = Arc::clone(&log);
            crate::listener::Listener::new(move |e: &String| {
                log.lock().unwrap().push(format!("second:{e}"))
            })
        };
        {
            let listeners = Arc::clone(router.listeners());
            let log = Arc::clone(&log);
            let late = late.clone();
            let second = second.clone();
            router.listeners().errors().subscribe(move |e| {
                log.lock().unwrap().push(format!("first:{e}"));
                if e == "one" {
                    listeners.errors().add(late.clone());
                    listeners.errors().remove(&second);
                }
            });
        }
        router.listeners().errors().add(second);

        // when (操作):
        router.dispatch(ChatEvent::Error("one".to_string()));
        router.dispatch(ChatEvent::Error("two".to_string()));
        router.flush().await;

        // then (期待する結果):
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:one", "second:one", "first:two", "late:two"]
        );
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_block_others() {
        // テスト項目: パニックするリスナーがあっても後続のリスナーは呼ばれる
        // given (前提条件):
        let router = create_router();
        let reached = Arc::new(Mutex::new(false));
        router.listeners().errors().subscribe(|_| panic!("broken listener"));
        let flag = Arc::clone(&reached);
        router
            .listeners()
            .errors()
            .subscribe(move |_| *flag.lock().unwrap() = true);

        // when (操作):
        router.dispatch(ChatEvent::Error("x".to_string()));
        router.flush().await;

        // then (期待する結果):
        assert!(*reached.lock().unwrap());
    }
}

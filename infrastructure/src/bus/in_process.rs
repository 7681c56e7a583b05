//! In-process message bus.
//!
//! Every subscription owns an unbounded channel registered in a routing
//! table keyed by correlation id. Publishing looks up the run's
//! subscriptions and pushes a clone into each matching channel; it never
//! awaits, so a busy subscriber cannot stall a publisher or another run.
//!
//! ```text
//! publish(msg) ──► routes[msg.correlation_id] ──► [sub₁ tx] ──► stream₁
//!                                             └─► [sub₂ tx] ──► stream₂
//! ```
//!
//! The routing table lock is held only while senders are cloned into the
//! channels, which also keeps messages of one run in publish order.
//!
//! Closed runs are remembered (up to [`CLOSED_RUN_MEMORY`] of them) so a
//! subscription made after `close_run` ends at once instead of waiting for
//! messages that will never come.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use tribunal_application::ports::message_bus::{BusError, MessageBus, MessageStream};
use tribunal_domain::{CorrelationId, Message, TopicFilter};

/// How many closed runs are remembered for late subscribers
pub const CLOSED_RUN_MEMORY: usize = 1024;

struct Subscription {
    filter: TopicFilter,
    sender: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
struct RouteTable {
    runs: HashMap<CorrelationId, Vec<Subscription>>,
    closed: HashSet<CorrelationId>,
    closed_order: VecDeque<CorrelationId>,
}

impl RouteTable {
    fn mark_closed(&mut self, correlation_id: CorrelationId) {
        if !self.closed.insert(correlation_id) {
            return;
        }
        self.closed_order.push_back(correlation_id);
        while self.closed_order.len() > CLOSED_RUN_MEMORY {
            if let Some(oldest) = self.closed_order.pop_front() {
                self.closed.remove(&oldest);
            }
        }
    }
}

/// In-process implementation of the message bus port
#[derive(Default)]
pub struct InProcessMessageBus {
    routes: RwLock<RouteTable>,
    shut_down: AtomicBool,
}

impl InProcessMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions for a run
    pub fn subscriber_count(&self, correlation_id: &CorrelationId) -> usize {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes
            .runs
            .get(correlation_id)
            .map(|subs| subs.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Number of runs with at least one registered subscription
    pub fn active_runs(&self) -> usize {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.runs.len()
    }

    /// Whether `close_run` was called for this run (and is still remembered)
    pub fn is_closed(&self, correlation_id: &CorrelationId) -> bool {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.closed.contains(correlation_id)
    }

    fn prune(&self, correlation_id: &CorrelationId) {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        if let Some(subs) = routes.runs.get_mut(correlation_id) {
            subs.retain(|s| !s.sender.is_closed());
            if subs.is_empty() {
                routes.runs.remove(correlation_id);
                debug!("Bus: pruned run {}", correlation_id.short());
            }
        }
    }
}

impl MessageBus for InProcessMessageBus {
    fn publish(&self, message: Message) -> Result<(), BusError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(BusError::Shutdown);
        }

        let correlation_id = message.correlation_id;
        let topic = message.topic();
        let mut stale = false;
        {
            let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
            let Some(subs) = routes.runs.get(&correlation_id) else {
                debug!(
                    "Bus: no subscription for run {}, dropping {} message",
                    correlation_id.short(),
                    topic
                );
                return Ok(());
            };

            for sub in subs.iter().filter(|s| s.filter.matches(topic)) {
                if sub.sender.send(message.clone()).is_err() {
                    stale = true;
                }
            }
        }

        if stale {
            self.prune(&correlation_id);
        }
        Ok(())
    }

    fn subscribe(&self, filter: TopicFilter, correlation_id: &CorrelationId) -> MessageStream {
        let (sender, receiver) = mpsc::unbounded_channel();

        // Dropping the sender without registering it ends the stream at once
        if self.shut_down.load(Ordering::Acquire) {
            debug!("Bus: subscription after shutdown for run {}", correlation_id.short());
        } else {
            let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
            if routes.closed.contains(correlation_id) {
                debug!("Bus: subscription to closed run {}", correlation_id.short());
            } else {
                routes
                    .runs
                    .entry(*correlation_id)
                    .or_default()
                    .push(Subscription { filter, sender });
            }
        }

        Box::pin(futures::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|message| (message, receiver))
        }))
    }

    fn close_run(&self, correlation_id: &CorrelationId) {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        routes.mark_closed(*correlation_id);
        if let Some(subs) = routes.runs.remove(correlation_id) {
            debug!(
                "Bus: closed run {} ({} subscription(s))",
                correlation_id.short(),
                subs.len()
            );
        }
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        routes.runs.clear();
        debug!("Bus: shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::SwissCitationParser;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tribunal_application::{
        AgentContext, AgentError, AgentSet, LegalAgent, SubmitQueryUseCase, WorkflowOptions,
    };
    use tribunal_domain::{
        AgentReport, AgentRole, Payload, ProgressNote, Topic, UserQueryPackage, WorkflowState,
    };

    fn progress(id: CorrelationId, to: WorkflowState) -> Message {
        Message::progress(
            id,
            ProgressNote {
                from: WorkflowState::Idle,
                to,
                reason: None,
            },
        )
    }

    #[tokio::test]
    async fn test_delivers_only_to_matching_run() {
        let bus = InProcessMessageBus::new();
        let (a, b) = (CorrelationId::new(), CorrelationId::new());
        let mut stream_a = bus.subscribe(TopicFilter::All, &a);
        let mut stream_b = bus.subscribe(TopicFilter::All, &b);

        bus.publish(progress(a, WorkflowState::Initializing)).unwrap();
        bus.publish(progress(b, WorkflowState::Initializing)).unwrap();
        bus.publish(progress(a, WorkflowState::ParallelResearch)).unwrap();
        bus.close_run(&a);
        bus.close_run(&b);

        let received_a: Vec<_> = stream_a.by_ref().collect().await;
        let received_b: Vec<_> = stream_b.by_ref().collect().await;
        assert_eq!(received_a.len(), 2);
        assert!(received_a.iter().all(|m| m.correlation_id == a));
        assert_eq!(received_b.len(), 1);
        assert_eq!(received_b[0].correlation_id, b);
    }

    #[tokio::test]
    async fn test_preserves_publish_order() {
        let bus = InProcessMessageBus::new();
        let id = CorrelationId::new();
        let stream = bus.subscribe(TopicFilter::All, &id);

        let states = [
            WorkflowState::Initializing,
            WorkflowState::ParallelResearch,
            WorkflowState::ValidatingReports,
            WorkflowState::JudicialSynthesis,
        ];
        for state in states {
            bus.publish(progress(id, state)).unwrap();
        }
        bus.close_run(&id);

        let received: Vec<_> = stream
            .filter_map(|m| async move {
                match m.payload {
                    Payload::Progress(note) => Some(note.to),
                    _ => None,
                }
            })
            .collect()
            .await;
        assert_eq!(received, states.to_vec());
    }

    #[tokio::test]
    async fn test_topic_filter() {
        let bus = InProcessMessageBus::new();
        let id = CorrelationId::new();
        let verdicts = bus.subscribe(TopicFilter::only([Topic::Verdict]), &id);

        bus.publish(progress(id, WorkflowState::Initializing)).unwrap();
        bus.publish(Message::verdict(
            id,
            tribunal_domain::ValidationVerdict::pass(tribunal_domain::GateKind::Input),
        ))
        .unwrap();
        bus.close_run(&id);

        let received: Vec<_> = verdicts.collect().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].topic(), Topic::Verdict);
    }

    #[tokio::test]
    async fn test_late_messages_are_dropped() {
        let bus = InProcessMessageBus::new();
        let id = CorrelationId::new();
        let stream = bus.subscribe(TopicFilter::All, &id);

        bus.close_run(&id);
        assert!(bus.publish(progress(id, WorkflowState::Initializing)).is_ok());

        let received: Vec<_> = stream.collect().await;
        assert!(received.is_empty());
        assert_eq!(bus.active_runs(), 0);
    }

    #[tokio::test]
    async fn test_subscription_after_close_run_ends() {
        let bus = InProcessMessageBus::new();
        let id = CorrelationId::new();
        let early = bus.subscribe(TopicFilter::All, &id);
        bus.publish(progress(id, WorkflowState::Completed)).unwrap();
        bus.close_run(&id);

        let late = bus.subscribe(TopicFilter::All, &id);
        let received = tokio::time::timeout(Duration::from_secs(5), late.collect::<Vec<_>>())
            .await
            .expect("late subscription should end");

        assert!(received.is_empty());
        assert_eq!(early.collect::<Vec<_>>().await.len(), 1);
        assert!(bus.is_closed(&id));
        assert_eq!(bus.subscriber_count(&id), 0);
        assert_eq!(bus.active_runs(), 0);
    }

    #[test]
    fn test_closed_run_memory_is_bounded() {
        let bus = InProcessMessageBus::new();
        let first = CorrelationId::new();
        bus.close_run(&first);
        for _ in 0..CLOSED_RUN_MEMORY {
            bus.close_run(&CorrelationId::new());
        }

        assert!(!bus.is_closed(&first));
        let routes = bus.routes.read().unwrap();
        assert_eq!(routes.closed.len(), CLOSED_RUN_MEMORY);
        assert_eq!(routes.closed_order.len(), CLOSED_RUN_MEMORY);
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let bus = InProcessMessageBus::new();
        let id = CorrelationId::new();
        let stream = bus.subscribe(TopicFilter::All, &id);
        assert_eq!(bus.subscriber_count(&id), 1);

        drop(stream);
        bus.publish(progress(id, WorkflowState::Initializing)).unwrap();

        assert_eq!(bus.subscriber_count(&id), 0);
        assert_eq!(bus.active_runs(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_publish() {
        let bus = InProcessMessageBus::new();
        let id = CorrelationId::new();
        let stream = bus.subscribe(TopicFilter::All, &id);

        bus.shutdown();

        assert_eq!(
            bus.publish(progress(id, WorkflowState::Initializing)),
            Err(BusError::Shutdown)
        );
        assert!(stream.collect::<Vec<_>>().await.is_empty());
        let late = bus.subscribe(TopicFilter::All, &id);
        assert!(late.collect::<Vec<_>>().await.is_empty());
    }

    // ==================== Concurrent runs ====================

    /// Cites a fixed set of references for every role
    struct CitingAgent;

    #[async_trait]
    impl LegalAgent for CitingAgent {
        async fn invoke(
            &self,
            role: AgentRole,
            context: AgentContext,
            _cancel: CancellationToken,
        ) -> Result<AgentReport, AgentError> {
            let citations = match role {
                AgentRole::Advocate => vec!["Art. 20 OR".to_string()],
                AgentRole::Adversary => vec!["Art. 21 OR".to_string()],
                AgentRole::Judicial => vec!["Art. 20 OR".to_string(), "Art. 21 OR".to_string()],
            };
            tokio::task::yield_now().await;
            AgentReport::new(
                role,
                context.query().correlation_id(),
                format!("{role} analysis"),
                citations,
            )
            .map_err(|e| AgentError::MalformedOutput(e.to_string()))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_are_isolated() {
        let bus = Arc::new(InProcessMessageBus::new());
        let use_case = Arc::new(SubmitQueryUseCase::new(
            AgentSet::uniform(Arc::new(CitingAgent)),
            bus.clone(),
            Arc::new(SwissCitationParser::new()),
            WorkflowOptions::default(),
        ));

        let a = UserQueryPackage::new("Ist der Vertrag nach Art. 20 OR nichtig?", "DE");
        let b = UserQueryPackage::new("Le contrat est-il nul?", "FR");
        let stream_a = bus.subscribe(TopicFilter::All, &a.correlation_id());
        let stream_b = bus.subscribe(TopicFilter::All, &b.correlation_id());

        let (ra, rb) = tokio::join!(
            tokio::spawn({
                let use_case = use_case.clone();
                let a = a.clone();
                async move { use_case.execute(a).await }
            }),
            tokio::spawn({
                let use_case = use_case.clone();
                let b = b.clone();
                async move { use_case.execute(b).await }
            }),
        );
        assert!(ra.unwrap().unwrap().is_completed());
        assert!(rb.unwrap().unwrap().is_completed());

        // Both streams end because each run closes its subscriptions
        let received_a: Vec<_> = stream_a.collect().await;
        let received_b: Vec<_> = stream_b.collect().await;
        assert!(received_a.iter().all(|m| m.correlation_id == a.correlation_id()));
        assert!(received_b.iter().all(|m| m.correlation_id == b.correlation_id()));

        for received in [&received_a, &received_b] {
            let last = received.last().unwrap();
            assert!(matches!(
                &last.payload,
                Payload::Progress(note) if note.to == WorkflowState::Completed
            ));
        }
        assert_eq!(bus.active_runs(), 0);
    }
}

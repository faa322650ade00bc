use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;
use uuid::Uuid;

/// The kind of an inter-agent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A step summary passed to the next agent. Never dropped.
    Handoff,
    /// A question to another agent.
    Request,
    /// An answer to a request.
    Reply,
    /// An error notification.
    Error,
}

/// One inter-agent message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Sender agent id.
    pub from_agent: String,
    /// Recipient agent id.
    pub to_agent: String,
    /// Message kind.
    pub kind: MessageKind,
    /// Opaque payload.
    pub payload: String,
    /// Correlates requests with replies (and steps with runs).
    pub correlation_id: Uuid,
}

/// Bounded FIFO queues per ordered (from, to) pair. Reads are
/// destructive. Overflow drops the oldest non-handoff message; a
/// handoff is never dropped, so a queue holding only handoffs may
/// exceed the bound.
pub struct MessageQueue {
    cap: usize,
    queues: BTreeMap<(String, String), VecDeque<AgentMessage>>,
}

impl MessageQueue {
    /// Creates a queue set with the given per-pair capacity.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            queues: BTreeMap::new(),
        }
    }

    /// Enqueues a message, applying the overflow policy.
    pub fn send(&mut self, message: AgentMessage) {
        let key = (message.from_agent.clone(), message.to_agent.clone());
        let queue = self.queues.entry(key).or_default();

        if queue.len() >= self.cap {
            let dropped = queue
                .iter()
                .position(|m| m.kind != MessageKind::Handoff)
                .and_then(|idx| queue.remove(idx));
            match dropped {
                Some(dropped) => warn!(
                    from = %dropped.from_agent,
                    to = %dropped.to_agent,
                    kind = ?dropped.kind,
                    "Queue overflow, dropped oldest non-handoff message"
                ),
                None => warn!(
                    from = %message.from_agent,
                    to = %message.to_agent,
                    "Queue over capacity but holds only handoffs; growing"
                ),
            }
        }

        queue.push_back(message);
    }

    /// Destructively reads the oldest message for (from, to).
    pub fn receive(&mut self, from: &str, to: &str) -> Option<AgentMessage> {
        self.queues
            .get_mut(&(from.to_string(), to.to_string()))
            .and_then(VecDeque::pop_front)
    }

    /// Messages currently queued for (from, to).
    pub fn len(&self, from: &str, to: &str) -> usize {
        self.queues
            .get(&(from.to_string(), to.to_string()))
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Whether every queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }
}

//! # Node
//!
//! Per-node protocol state, constructed once and owned for the node's
//! lifetime. Routes each event to the component responsible for it:
//!
//! | role   | wake-up          | data arrival         | ack arrival           |
//! |--------|------------------|----------------------|-----------------------|
//! | talker | StreamGenerator  | fatal                | AcknowledgmentHandler |
//! | switch | fatal            | ReceptionAggregator  | fatal                 |

use tracing::{error, info};

use crate::ack::{AckOutcome, AcknowledgmentHandler};
use crate::aggregator::{ArrivalOutcome, ReceptionAggregator};
use crate::completion::CompletedSet;
use crate::config::{NodeConfig, Role};
use crate::context::NodeContext;
use crate::encoder::RedundancyEncoder;
use crate::error::TransportError;
use crate::generator::{GeneratorState, StreamGenerator, WakeOutcome};
use crate::pool::BlockPool;
use crate::stats::{NodeStats, RunSummary};
use crate::wire::{Message, MessageKind, StreamId};

/// Input to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    /// Self-timer armed through [`NodeContext::schedule_at`].
    Wake,
    /// A message arrived from the network. `corrupted` is the channel's
    /// bit-error flag.
    Arrival { message: Message, corrupted: bool },
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    Wake(WakeOutcome),
    Arrival(ArrivalOutcome),
    Ack(AckOutcome),
}

enum RoleState {
    Talker {
        generator: StreamGenerator,
        acks: AcknowledgmentHandler,
        send_pool: BlockPool,
    },
    Switch {
        aggregator: ReceptionAggregator,
    },
}

pub struct Node {
    name: String,
    config: NodeConfig,
    state: RoleState,
    completed: CompletedSet,
    stats: NodeStats,
}

impl Node {
    pub fn new(name: impl Into<String>, config: NodeConfig) -> Self {
        let state = match config.role {
            Role::Talker => RoleState::Talker {
                generator: StreamGenerator::new(
                    RedundancyEncoder::new(&config),
                    config.stream_cap,
                ),
                acks: AcknowledgmentHandler::new(),
                send_pool: BlockPool::new(),
            },
            Role::Switch => RoleState::Switch {
                aggregator: ReceptionAggregator::new(&config),
            },
        };
        Node {
            name: name.into(),
            config,
            state,
            completed: CompletedSet::new(),
            stats: NodeStats::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn completed(&self) -> &CompletedSet {
        &self.completed
    }

    /// Generator state, talker only.
    pub fn generator_state(&self) -> Option<GeneratorState> {
        match &self.state {
            RoleState::Talker { generator, .. } => Some(generator.state()),
            RoleState::Switch { .. } => None,
        }
    }

    /// Blocks held for unacknowledged streams (talker) or incomplete
    /// streams (switch).
    pub fn held_blocks(&self) -> usize {
        match &self.state {
            RoleState::Talker { send_pool, .. } => send_pool.total_blocks(),
            RoleState::Switch { aggregator } => aggregator.buffered_blocks(),
        }
    }

    /// Retained send-pool copies of one stream, talker only.
    pub fn retained(&self, stream_id: StreamId) -> usize {
        match &self.state {
            RoleState::Talker { send_pool, .. } => send_pool.count(stream_id),
            RoleState::Switch { .. } => 0,
        }
    }

    /// Arm the talker's first wake-up. No-op on a switch.
    pub fn start(&mut self, ctx: &mut impl NodeContext) -> Result<(), TransportError> {
        match &mut self.state {
            RoleState::Talker { generator, .. } => {
                info!(
                    node = %self.name,
                    mode = %self.config.mode,
                    k = self.config.k,
                    m = self.config.m,
                    stream_cap = self.config.stream_cap,
                    "talker starting"
                );
                generator.start(ctx)
            }
            RoleState::Switch { .. } => Ok(()),
        }
    }

    pub fn handle(
        &mut self,
        event: NodeEvent,
        ctx: &mut impl NodeContext,
    ) -> Result<NodeOutcome, TransportError> {
        self.stats.messages_received += 1;
        let role = self.config.role;

        match (&mut self.state, event) {
            (
                RoleState::Talker {
                    generator,
                    send_pool,
                    ..
                },
                NodeEvent::Wake,
            ) => Ok(NodeOutcome::Wake(generator.on_wake(
                send_pool,
                &mut self.stats,
                ctx,
            ))),
            (
                RoleState::Talker {
                    acks, send_pool, ..
                },
                NodeEvent::Arrival {
                    message: Message::Ack(ack),
                    corrupted,
                },
            ) => Ok(NodeOutcome::Ack(acks.on_ack(
                ack,
                corrupted,
                &mut self.completed,
                send_pool,
                &mut self.stats,
            ))),
            (
                RoleState::Switch { aggregator },
                NodeEvent::Arrival {
                    message: Message::Data(block),
                    corrupted,
                },
            ) => Ok(NodeOutcome::Arrival(aggregator.on_arrival(
                block,
                corrupted,
                &mut self.completed,
                &mut self.stats,
                ctx,
            ))),
            (_, event) => {
                let kind = match &event {
                    NodeEvent::Wake => "timer",
                    NodeEvent::Arrival { message, .. } => match message.kind() {
                        MessageKind::Data => "data message",
                        MessageKind::Ack => "ack message",
                    },
                };
                error!(node = %self.name, %role, kind, "unexpected event");
                Err(TransportError::UnexpectedMessage { role, kind })
            }
        }
    }

    /// Running summary line.
    pub fn display_text(&self) -> String {
        format!(
            "rcvd: {} sent: {}",
            self.stats.messages_received, self.stats.blocks_sent
        )
    }

    /// End-of-run report. Talkers only; a switch has nothing to report.
    pub fn finish(&self) -> Option<RunSummary> {
        match &self.state {
            RoleState::Talker { .. } => {
                let summary = RunSummary::from_stats(&self.stats);
                info!(
                    node = %self.name,
                    streams_originated = summary.streams_originated,
                    streams_delivered = summary.streams_delivered,
                    delivery_ratio = ?summary.delivery_ratio,
                    "run finished"
                );
                Some(summary)
            }
            RoleState::Switch { .. } => None,
        }
    }
}

//! # Topology
//!
//! Two nodes and the channels between them:
//!
//! ```text
//!            links[0] ──►
//! talker     links[1] ──►     switch
//!            ...
//!         ◄── return_link (switch path 0)
//! ```

use std::fmt;

use serde::Serialize;

use crate::channel::{ChannelStats, DatarateChannel};
use crate::config::SimConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeId {
    Talker,
    Switch,
}

impl NodeId {
    pub const ALL: [NodeId; 2] = [NodeId::Talker, NodeId::Switch];

    /// The node at the far end of every egress path of `self`.
    pub fn peer(self) -> NodeId {
        match self {
            NodeId::Talker => NodeId::Switch,
            NodeId::Switch => NodeId::Talker,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            NodeId::Talker => 0,
            NodeId::Switch => 1,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Talker => f.write_str("talker"),
            NodeId::Switch => f.write_str("switch"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Topology {
    talker_egress: Vec<DatarateChannel>,
    switch_egress: Vec<DatarateChannel>,
}

impl Topology {
    pub fn new(talker_egress: Vec<DatarateChannel>, return_link: DatarateChannel) -> Self {
        Topology {
            talker_egress,
            switch_egress: vec![return_link],
        }
    }

    pub fn from_config(cfg: &SimConfig) -> Self {
        Topology::new(
            cfg.links.iter().map(DatarateChannel::from_config).collect(),
            DatarateChannel::from_config(&cfg.return_link),
        )
    }

    pub fn egress(&self, node: NodeId) -> &[DatarateChannel] {
        match node {
            NodeId::Talker => &self.talker_egress,
            NodeId::Switch => &self.switch_egress,
        }
    }

    pub fn egress_mut(&mut self, node: NodeId) -> &mut [DatarateChannel] {
        match node {
            NodeId::Talker => &mut self.talker_egress,
            NodeId::Switch => &mut self.switch_egress,
        }
    }

    pub fn channel_stats(&self, node: NodeId) -> Vec<ChannelStats> {
        self.egress(node).iter().map(|ch| ch.stats().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topology_shape() {
        let topo = Topology::from_config(&SimConfig::default());
        assert_eq!(topo.egress(NodeId::Talker).len(), 2);
        assert_eq!(topo.egress(NodeId::Switch).len(), 1);
        assert_eq!(NodeId::Talker.peer(), NodeId::Switch);
        assert_eq!(NodeId::Switch.peer(), NodeId::Talker);
    }
}

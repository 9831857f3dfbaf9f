use crate::core::execution::config::TopologyRules;
use crate::core::network::{Node, NodeRole};
use crate::core::types::Echelon;
use log::warn;

/// Centralized link and connectivity validation for network assembly
pub struct TopologyValidator;

impl TopologyValidator {
    /// Validate a link between two nodes under the given rules
    pub fn validate_link(rules: TopologyRules, source: &Node, sink: &Node) -> Result<(), String> {
        if source.id() == sink.id() {
            return Err(format!("node '{}' cannot supply itself", source.key()));
        }
        if rules == TopologyRules::Permissive {
            return Ok(());
        }

        let allowed = match (source.echelon(), sink.echelon()) {
            (Echelon::Supplier, sink_echelon) => sink_echelon == Echelon::Manufacturer,
            (_, Echelon::Supplier) | (_, Echelon::Manufacturer) => false,
            (source_echelon, sink_echelon) => sink_echelon.tier() > source_echelon.tier(),
        };
        if !allowed {
            return Err(format!(
                "cannot link {} '{}' to {} '{}'",
                source.echelon(),
                source.key(),
                sink.echelon(),
                sink.key()
            ));
        }
        Ok(())
    }

    /// Validate transport parameters of a link
    pub fn validate_transport(cost: f64, distance: Option<f64>) -> Result<(), String> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(format!("transport cost {} must be non-negative", cost));
        }
        if let Some(distance) = distance {
            if !distance.is_finite() || distance <= 0.0 {
                return Err(format!("distance {} must be positive", distance));
            }
        }
        Ok(())
    }

    /// Every node except a supplier needs something to order from. A manufacturer that
    /// needs no raw material is the one exception.
    pub fn validate_connected(node: &Node) -> Result<(), String> {
        if !node.inbound_links().is_empty() {
            return Ok(());
        }
        match node.role() {
            NodeRole::Supplier(_) => Ok(()),
            NodeRole::Manufacturer(m) if m.raw_per_unit == 0 => Ok(()),
            _ => Err(format!("node '{}' has no inbound link", node.key())),
        }
    }

    /// Warn when an upstream reorder point cannot cover one full order of the sink
    pub fn check_reorder_coverage(source: &Node, sink: &Node) {
        let Some(state) = source.replenishment() else {
            return;
        };
        let Some(reorder_point) = state.policy().reorder_point() else {
            return;
        };
        let sink_order = sink
            .replenishment()
            .map(|s| s.policy().max_order())
            .unwrap_or_else(|| sink.ledger().capacity());
        if reorder_point < sink_order {
            warn!(
                "{}: reorder point {} is below a full order of {} ({} units); expect backorders",
                source.key(),
                reorder_point,
                sink.key(),
                sink_order
            );
        }
    }
}

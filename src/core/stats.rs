//! Read-only metrics derived from ledgers, counters and orders.

use super::network::{Link, Node, NodeRole};
use super::types::{Echelon, Quantity, SimTime};
use serde::Serialize;

/// Customer-facing totals the engine keeps across all nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CustomerCounters {
    pub customers: u64,
    pub demand_units: Quantity,
    pub fulfilled_units: Quantity,
    pub shortage_units: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStatistics {
    pub node: String,
    pub name: String,
    pub echelon: Echelon,
    pub inventory_level: Quantity,
    pub raw_material_level: Option<Quantity>,
    pub inventory_cost: f64,
    pub transportation_cost: f64,
    pub production_cost: f64,
    pub procurement_cost: f64,
    pub total_cost: f64,
    pub units_sold: Quantity,
    pub units_produced: Quantity,
    pub revenue: f64,
    pub salvage_revenue: f64,
    pub profit: f64,
    pub orders_received: u64,
    pub demand_units: Quantity,
    pub shortage: Quantity,
    /// Units still waiting inside a tolerance window
    pub backorder: Quantity,
    /// Units delivered late but inside the tolerance window
    pub backorder_recovered: Quantity,
    pub waste: Quantity,
    pub overflow: Quantity,
    pub replenishment_orders: u64,
    /// Units sold per day
    pub throughput: f64,
    /// Profit per day
    pub average_profit: f64,
}

/// `amount` spread over the elapsed days, zero before any time has passed
fn per_day(amount: f64, time: SimTime) -> f64 {
    if time > 0.0 {
        amount / time
    } else {
        0.0
    }
}

impl NodeStatistics {
    pub(crate) fn from_node(node: &Node, open_backorder: Quantity, time: SimTime) -> Self {
        let counters = node.counters();
        let (raw_material_level, units_produced, raw_waste) = match node.role() {
            NodeRole::Manufacturer(m) => (Some(m.raw.level()), m.units_produced, m.raw.waste()),
            _ => (None, 0, 0),
        };

        let inventory_cost = node.holding_cost();
        let total_cost = inventory_cost
            + counters.transportation_cost
            + counters.production_cost
            + counters.procurement_cost;
        let profit = counters.revenue + counters.salvage_revenue - total_cost;

        Self {
            node: node.key().to_string(),
            name: node.name().to_string(),
            echelon: node.echelon(),
            inventory_level: node.level(),
            raw_material_level,
            inventory_cost,
            transportation_cost: counters.transportation_cost,
            production_cost: counters.production_cost,
            procurement_cost: counters.procurement_cost,
            total_cost,
            units_sold: counters.units_sold,
            units_produced,
            revenue: counters.revenue,
            salvage_revenue: counters.salvage_revenue,
            profit,
            orders_received: counters.orders_received,
            demand_units: counters.demand_units,
            shortage: counters.shortage_units,
            backorder: open_backorder,
            backorder_recovered: counters.backorder_recovered,
            waste: node.ledger().waste() + raw_waste + counters.overflow_waste,
            overflow: node.ledger().overflow(),
            replenishment_orders: node.replenishment().map_or(0, |r| r.orders_placed()),
            throughput: per_day(counters.units_sold as f64, time),
            average_profit: per_day(profit, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatistics {
    pub link: String,
    pub source: String,
    pub sink: String,
    pub shipments: u64,
    pub units_shipped: Quantity,
    pub units_in_transit: Quantity,
    pub transport_cost: f64,
    pub average_cost: f64,
    /// Shipments dispatched per day
    pub flow: f64,
    /// Share of the elapsed time the link spent carrying goods, summed over shipments
    pub utilization: f64,
}

impl LinkStatistics {
    pub(crate) fn from_link(link: &Link, source: &Node, sink: &Node, time: SimTime) -> Self {
        let average_cost = if link.shipments > 0 {
            link.transport_cost / link.shipments as f64
        } else {
            0.0
        };
        Self {
            link: link.label().to_string(),
            source: source.key().to_string(),
            sink: sink.key().to_string(),
            shipments: link.shipments,
            units_shipped: link.units_shipped,
            units_in_transit: link.units_in_transit,
            transport_cost: link.transport_cost,
            average_cost,
            flow: per_day(link.shipments as f64, time),
            utilization: per_day(link.lead_time_total, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStatistics {
    pub customers: u64,
    pub total_demand: Quantity,
    pub total_fulfilled: Quantity,
    pub total_shortage: Quantity,
    /// Customer units still waiting inside a tolerance window
    pub total_backorder: Quantity,
    pub total_waste: Quantity,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub net_profit: f64,
}

impl NetworkStatistics {
    pub(crate) fn aggregate(
        nodes: &[NodeStatistics],
        customers: &CustomerCounters,
        open_customer_backorder: Quantity,
    ) -> Self {
        let total_cost: f64 = nodes.iter().map(|n| n.total_cost).sum();
        let total_revenue: f64 = nodes.iter().map(|n| n.revenue + n.salvage_revenue).sum();
        Self {
            customers: customers.customers,
            total_demand: customers.demand_units,
            total_fulfilled: customers.fulfilled_units,
            total_shortage: customers.shortage_units,
            total_backorder: open_customer_backorder,
            total_waste: nodes.iter().map(|n| n.waste).sum(),
            total_cost,
            total_revenue,
            net_profit: total_revenue - total_cost,
        }
    }

    /// Share of customer demand handed out so far
    pub fn fill_rate(&self) -> f64 {
        if self.total_demand == 0 {
            return 1.0;
        }
        self.total_fulfilled as f64 / self.total_demand as f64
    }
}

/// Everything an analyst reads after (or during) a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub time: SimTime,
    pub events_processed: u64,
    pub nodes: Vec<NodeStatistics>,
    pub links: Vec<LinkStatistics>,
    pub network: NetworkStatistics,
}

impl StatisticsSnapshot {
    pub fn node(&self, key: &str) -> Option<&NodeStatistics> {
        self.nodes.iter().find(|n| n.node == key)
    }

    pub fn link(&self, label: &str) -> Option<&LinkStatistics> {
        self.links.iter().find(|l| l.link == label)
    }
}

/// Mean of a metric over several replications
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub runs: usize,
    pub mean_total_demand: f64,
    pub mean_total_fulfilled: f64,
    pub mean_total_shortage: f64,
    pub mean_fill_rate: f64,
    pub mean_total_cost: f64,
    pub mean_net_profit: f64,
    pub std_net_profit: f64,
}

impl ReplicationSummary {
    pub fn from_snapshots(snapshots: &[StatisticsSnapshot]) -> Self {
        let runs = snapshots.len();
        let mean = |f: &dyn Fn(&NetworkStatistics) -> f64| -> f64 {
            if runs == 0 {
                return 0.0;
            }
            snapshots.iter().map(|s| f(&s.network)).sum::<f64>() / runs as f64
        };

        let mean_net_profit = mean(&|n| n.net_profit);
        let std_net_profit = if runs > 1 {
            let var = snapshots
                .iter()
                .map(|s| (s.network.net_profit - mean_net_profit).powi(2))
                .sum::<f64>()
                / (runs - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Self {
            runs,
            mean_total_demand: mean(&|n| n.total_demand as f64),
            mean_total_fulfilled: mean(&|n| n.total_fulfilled as f64),
            mean_total_shortage: mean(&|n| n.total_shortage as f64),
            mean_fill_rate: mean(&|n| n.fill_rate()),
            mean_total_cost: mean(&|n| n.total_cost),
            mean_net_profit,
            std_net_profit,
        }
    }
}

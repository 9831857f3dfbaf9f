//! Serializable assembly descriptors.
//!
//! A [`NetworkSpec`] is plain data: ids are strings and samplers are
//! [`SamplerSpec`]s. [`SimulationBuilder`](super::SimulationBuilder) resolves and
//! validates it into a runnable simulation.

use crate::core::errors::SimError;
use crate::core::execution::config::SimulationConfig;
use crate::core::inventory::Product;
use crate::core::network::Supply;
use crate::core::replenishment::ReplenishmentPolicy;
use crate::core::sampling::SamplerSpec;
use crate::core::types::{Echelon, Quantity, SimTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    #[serde(default)]
    pub config: SimulationConfig,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub demands: Vec<DemandSpec>,
}

impl NetworkSpec {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Raw-material side of a manufacturer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialSpec {
    /// Product id of the raw material
    pub product: String,
    #[serde(default = "one_unit")]
    pub per_unit: Quantity,
    pub capacity: Quantity,
    #[serde(default)]
    pub initial_level: Quantity,
    #[serde(default)]
    pub holding_cost: f64,
}

impl RawMaterialSpec {
    pub fn new(product: impl Into<String>, per_unit: Quantity, capacity: Quantity) -> Self {
        Self {
            product: product.into(),
            per_unit,
            capacity,
            initial_level: 0,
            holding_cost: 0.0,
        }
    }

    pub fn with_initial_level(mut self, level: Quantity) -> Self {
        self.initial_level = level;
        self
    }

    pub fn with_holding_cost(mut self, rate: f64) -> Self {
        self.holding_cost = rate;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRoleSpec {
    Supplier {
        #[serde(default = "infinite_supply")]
        supply: Supply,
    },
    Manufacturer {
        raw_material: RawMaterialSpec,
        #[serde(default)]
        processing_time: SimTime,
    },
    Distributor,
    Warehouse,
    Retailer,
}

impl NodeRoleSpec {
    pub fn echelon(&self) -> Echelon {
        match self {
            NodeRoleSpec::Supplier { .. } => Echelon::Supplier,
            NodeRoleSpec::Manufacturer { .. } => Echelon::Manufacturer,
            NodeRoleSpec::Distributor => Echelon::Distributor,
            NodeRoleSpec::Warehouse => Echelon::Warehouse,
            NodeRoleSpec::Retailer => Echelon::Retailer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub role: NodeRoleSpec,
    /// Product id this node stocks and sells
    pub product: String,
    /// Not needed for an infinite supplier
    #[serde(default)]
    pub capacity: Option<Quantity>,
    /// Defaults to full
    #[serde(default)]
    pub initial_level: Option<Quantity>,
    #[serde(default)]
    pub holding_cost: f64,
    #[serde(default)]
    pub policy: Option<ReplenishmentPolicy>,
    /// How long upstream may take to fill this node's own orders
    #[serde(default)]
    pub order_tolerance: SimTime,
}

impl NodeSpec {
    fn with_role(id: impl Into<String>, role: NodeRoleSpec, product: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            location: None,
            role,
            product: product.into(),
            capacity: None,
            initial_level: None,
            holding_cost: 0.0,
            policy: None,
            order_tolerance: 0.0,
        }
    }

    /// A supplier that never runs out
    pub fn supplier(id: impl Into<String>, product: impl Into<String>) -> Self {
        Self::with_role(id, NodeRoleSpec::Supplier { supply: Supply::Infinite }, product)
    }

    /// A supplier with finite stock that restocks by extraction
    pub fn extracting_supplier(
        id: impl Into<String>,
        product: impl Into<String>,
        capacity: Quantity,
        quantity: Quantity,
        interval: SimTime,
    ) -> Self {
        Self::with_role(
            id,
            NodeRoleSpec::Supplier {
                supply: Supply::Extraction { quantity, interval },
            },
            product,
        )
        .with_capacity(capacity)
    }

    pub fn manufacturer(
        id: impl Into<String>,
        product: impl Into<String>,
        capacity: Quantity,
        raw_material: RawMaterialSpec,
        processing_time: SimTime,
    ) -> Self {
        Self::with_role(
            id,
            NodeRoleSpec::Manufacturer {
                raw_material,
                processing_time,
            },
            product,
        )
        .with_capacity(capacity)
    }

    pub fn distributor(id: impl Into<String>, product: impl Into<String>, capacity: Quantity) -> Self {
        Self::with_role(id, NodeRoleSpec::Distributor, product).with_capacity(capacity)
    }

    pub fn warehouse(id: impl Into<String>, product: impl Into<String>, capacity: Quantity) -> Self {
        Self::with_role(id, NodeRoleSpec::Warehouse, product).with_capacity(capacity)
    }

    pub fn retailer(id: impl Into<String>, product: impl Into<String>, capacity: Quantity) -> Self {
        Self::with_role(id, NodeRoleSpec::Retailer, product).with_capacity(capacity)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_capacity(mut self, capacity: Quantity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_initial_level(mut self, level: Quantity) -> Self {
        self.initial_level = Some(level);
        self
    }

    pub fn with_holding_cost(mut self, rate: f64) -> Self {
        self.holding_cost = rate;
        self
    }

    pub fn with_policy(mut self, policy: ReplenishmentPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_order_tolerance(mut self, tolerance: SimTime) -> Self {
        self.order_tolerance = tolerance;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Defaults to `source->sink`
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub sink: String,
    #[serde(default)]
    pub cost: f64,
    pub lead_time: SamplerSpec,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl LinkSpec {
    pub fn new(source: impl Into<String>, sink: impl Into<String>, lead_time: SamplerSpec) -> Self {
        Self {
            id: None,
            source: source.into(),
            sink: sink.into(),
            cost: 0.0,
            lead_time,
            distance: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub(crate) fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("{}->{}", self.source, self.sink))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSpec {
    /// Defaults to `demand@target`
    #[serde(default)]
    pub id: Option<String>,
    pub target: String,
    pub arrival: SamplerSpec,
    pub quantity: SamplerSpec,
    #[serde(default)]
    pub tolerance: SimTime,
}

impl DemandSpec {
    pub fn new(target: impl Into<String>, arrival: SamplerSpec, quantity: SamplerSpec) -> Self {
        Self {
            id: None,
            target: target.into(),
            arrival,
            quantity,
            tolerance: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: SimTime) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub(crate) fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("demand@{}", self.target))
    }
}

fn one_unit() -> Quantity {
    1
}

fn infinite_supply() -> Supply {
    Supply::Infinite
}

use serde::{Deserialize, Serialize};

/// A stock-keeping unit. Shared read-only between the nodes that carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Cost to make or acquire one unit
    pub unit_cost: f64,
    /// Price one unit is sold at
    pub sell_price: f64,
    /// Maximum age before a unit is wasted; `None` for non-perishables
    #[serde(default)]
    pub shelf_life: Option<f64>,
    /// Value recovered per wasted unit
    #[serde(default)]
    pub salvage_value: Option<f64>,
}

impl Product {
    pub fn new(id: impl Into<String>, unit_cost: f64, sell_price: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            unit_cost,
            sell_price,
            shelf_life: None,
            salvage_value: None,
        }
    }

    pub fn with_shelf_life(mut self, shelf_life: f64) -> Self {
        self.shelf_life = Some(shelf_life);
        self
    }

    pub fn with_salvage_value(mut self, salvage_value: f64) -> Self {
        self.salvage_value = Some(salvage_value);
        self
    }

    pub fn is_perishable(&self) -> bool {
        self.shelf_life.is_some()
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.unit_cost < 0.0 || !self.unit_cost.is_finite() {
            return Err(format!("unit cost {} must be finite and non-negative", self.unit_cost));
        }
        if self.sell_price < 0.0 || !self.sell_price.is_finite() {
            return Err(format!("sell price {} must be finite and non-negative", self.sell_price));
        }
        if let Some(life) = self.shelf_life {
            if !(life > 0.0) {
                return Err(format!("shelf life {} must be positive", life));
            }
        }
        if let Some(salvage) = self.salvage_value {
            if salvage < 0.0 {
                return Err(format!("salvage value {} cannot be negative", salvage));
            }
        }
        Ok(())
    }
}

//! In-memory draft of the order being composed.
//!
//! Owned by whoever drives the "new order" flow and passed by reference to
//! the code that edits it. `add`, `remove` and `clear` are the only
//! mutators. Nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::CreateOrderItem;

/// A product picked for the draft, with the stock seen when it was picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraftLine {
    /// Product id.
    pub id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub stock_at_selection: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_pct: Option<f64>,
}

impl OrderDraftLine {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity {
                sku: self.sku.clone(),
            });
        }
        if self.quantity > self.stock_at_selection {
            return Err(ValidationError::ExceedsStock {
                sku: self.sku.clone(),
                requested: self.quantity,
                available: self.stock_at_selection,
            });
        }
        Ok(())
    }

    /// `quantity * unit_price`, zero when the price is unknown.
    pub fn subtotal(&self) -> f64 {
        self.unit_price.unwrap_or(0.0) * self.quantity as f64
    }

    pub fn tax(&self) -> f64 {
        self.subtotal() * self.tax_pct.unwrap_or(0.0) / 100.0
    }

    fn to_item(&self) -> CreateOrderItem {
        CreateOrderItem {
            producto_id: self.id.clone(),
            cantidad: self.quantity,
            bodega_id: self.warehouse_id.clone(),
            precio_unitario: self.unit_price,
            porcentaje_iva: self.tax_pct,
            observaciones: self.observations.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    lines: Vec<OrderDraftLine>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line. Adding the same product twice keeps both lines.
    pub fn add(&mut self, line: OrderDraftLine) {
        self.lines.push(line);
    }

    /// Drop every line for product `id`.
    pub fn remove(&mut self, id: &str) {
        self.lines.retain(|line| line.id != id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[OrderDraftLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(OrderDraftLine::subtotal).sum()
    }

    pub fn tax_total(&self) -> f64 {
        self.lines.iter().map(OrderDraftLine::tax).sum()
    }

    pub fn total(&self) -> f64 {
        self.subtotal() + self.tax_total()
    }

    /// Fails on an empty draft or on the first line that fails
    /// `OrderDraftLine::validate`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lines.is_empty() {
            return Err(ValidationError::EmptyDraft);
        }
        self.lines.iter().try_for_each(OrderDraftLine::validate)
    }

    pub fn to_items(&self) -> Vec<CreateOrderItem> {
        self.lines.iter().map(OrderDraftLine::to_item).collect()
    }

    /// Warehouse of the first line that names one.
    pub fn first_warehouse(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| line.warehouse_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: i64) -> OrderDraftLine {
        OrderDraftLine {
            id: id.to_string(),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            quantity,
            stock_at_selection: 10,
            observations: None,
            warehouse_id: None,
            unit_price: Some(2.5),
            tax_pct: Some(20.0),
        }
    }

    #[test]
    fn add_then_remove_leaves_empty() {
        let mut draft = OrderDraft::new();
        draft.add(line("p-1", 1));
        draft.remove("p-1");
        assert!(draft.is_empty());
    }

    #[test]
    fn duplicate_products_are_kept() {
        let mut draft = OrderDraft::new();
        draft.add(line("p-1", 1));
        draft.add(line("p-1", 2));
        assert_eq!(draft.len(), 2);
        draft.remove("p-1");
        assert!(draft.is_empty());
    }

    #[test]
    fn remove_only_touches_matching_id() {
        let mut draft = OrderDraft::new();
        draft.add(line("p-1", 1));
        draft.add(line("p-2", 1));
        draft.remove("p-1");
        assert_eq!(draft.lines().len(), 1);
        assert_eq!(draft.lines()[0].id, "p-2");
        draft.remove("missing");
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn clear_always_empties() {
        let mut draft = OrderDraft::new();
        draft.clear();
        assert!(draft.is_empty());
        for i in 0..5 {
            draft.add(line(&i.to_string(), 1));
        }
        draft.clear();
        assert!(draft.is_empty());
    }

    #[test]
    fn totals_use_price_and_tax() {
        let mut draft = OrderDraft::new();
        draft.add(line("p-1", 4));
        let mut untaxed = line("p-2", 2);
        untaxed.tax_pct = None;
        draft.add(untaxed);
        assert_eq!(draft.subtotal(), 15.0);
        assert_eq!(draft.tax_total(), 2.0);
        assert_eq!(draft.total(), 17.0);
    }

    #[test]
    fn validate_rejects_empty_and_overstock() {
        let mut draft = OrderDraft::new();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyDraft));

        draft.add(line("p-1", 11));
        assert_eq!(
            draft.validate(),
            Err(ValidationError::ExceedsStock {
                sku: "SKU-p-1".to_string(),
                requested: 11,
                available: 10,
            })
        );

        draft.clear();
        draft.add(line("p-1", 0));
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::NonPositiveQuantity { .. })
        ));

        draft.clear();
        draft.add(line("p-1", 10));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn to_items_carries_line_fields() {
        let mut draft = OrderDraft::new();
        let mut l = line("p-9", 3);
        l.warehouse_id = Some("b-2".to_string());
        l.observations = Some("fragile".to_string());
        draft.add(l);
        let items = draft.to_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].producto_id, "p-9");
        assert_eq!(items[0].cantidad, 3);
        assert_eq!(items[0].bodega_id.as_deref(), Some("b-2"));
        assert_eq!(items[0].observaciones.as_deref(), Some("fragile"));
        assert_eq!(draft.first_warehouse(), Some("b-2"));
    }
}

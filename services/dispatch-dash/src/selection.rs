// services/dispatch-dash/src/selection.rs
//
// Order selection for route optimization

use svckit::errors::DashError;
use svckit::types::{OrderedMap, PendingOrder};

/// Selected order ids, kept in the order they were picked.
#[derive(Debug, Clone, Default)]
pub struct OrderSelection {
    available: Vec<String>,
    selected: Vec<String>,
}

impl OrderSelection {
    pub fn new(orders: &[PendingOrder]) -> Self {
        let mut selection = Self::default();
        selection.retain_known(orders);
        selection
    }

    /// Adopt a new pending-order list, dropping selections that no longer exist.
    pub fn retain_known(&mut self, orders: &[PendingOrder]) {
        self.available = orders.iter().map(|o| o.order_id.clone()).collect();
        let available = &self.available;
        self.selected.retain(|id| available.contains(id));
    }

    /// Flip one order; returns whether it is now selected.
    pub fn toggle(&mut self, order_id: &str) -> Result<bool, DashError> {
        if !self.available.iter().any(|id| id == order_id) {
            return Err(DashError::UnknownOrder(order_id.to_string()));
        }

        if let Some(pos) = self.selected.iter().position(|id| id == order_id) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(order_id.to_string());
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.available.clone();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Select everything, or clear if everything is already selected.
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.deselect_all();
        } else {
            self.select_all();
        }
    }

    pub fn toggle_all_label(&self) -> &'static str {
        if self.all_selected() {
            "Deselect All"
        } else {
            "Select All"
        }
    }

    fn all_selected(&self) -> bool {
        self.selected.len() == self.available.len()
    }

    pub fn is_selected(&self, order_id: &str) -> bool {
        self.selected.iter().any(|id| id == order_id)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Orders grouped by area; groups and members keep list order.
pub fn group_by_area(orders: &[PendingOrder]) -> OrderedMap<Vec<PendingOrder>> {
    let mut groups: Vec<(String, Vec<PendingOrder>)> = Vec::new();
    for order in orders {
        match groups.iter_mut().find(|(area, _)| *area == order.area) {
            Some((_, members)) => members.push(order.clone()),
            None => groups.push((order.area.clone(), vec![order.clone()])),
        }
    }
    groups.into_iter().collect()
}

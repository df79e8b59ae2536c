//! Meal plan consumption against kitchen stock.
//!
//! Validation and deduction are two separate passes over the store with no lock held between
//! them. [`ValidatedPlan`] can only come out of a clean [`InventoryUsageEngine::validate`], but
//! stock may still move before [`InventoryUsageEngine::apply`] runs, and a store failure half way
//! through `apply` leaves the earlier deductions in place.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::domain::{InventoryItem, InventoryItemId, MealPlan, MealPlanId, Quantity, Unit};
use super::repository::{InventoryRepository, MealPlanRepository};
use super::units::{convert, Conversion};
use crate::clock::Clock;
use crate::error::ErrorKind;
use crate::store::RepositoryError;

/// A single problem found while checking a plan against stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum UsageIssue {
    MissingItem {
        name: String,
    },
    /// `required` is already expressed in the stock item's unit.
    InsufficientItem {
        name: String,
        required: Quantity,
        available: Quantity,
    },
}

impl fmt::Display for UsageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageIssue::MissingItem { name } => write!(f, "{name} (not stocked)"),
            UsageIssue::InsufficientItem {
                name,
                required,
                available,
            } => write!(f, "{name} (need {required}, have {available})"),
        }
    }
}

/// Every issue found for one plan, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub plan_id: MealPlanId,
    pub issues: Vec<UsageIssue>,
}

impl UsageReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn missing_items(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                UsageIssue::MissingItem { name } => Some(name.as_str()),
                UsageIssue::InsufficientItem { .. } => None,
            })
            .collect()
    }

    pub fn insufficient_items(&self) -> Vec<&UsageIssue> {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, UsageIssue::InsufficientItem { .. }))
            .collect()
    }
}

/// Proof that a plan passed validation. Only [`InventoryUsageEngine::validate`] builds one,
/// and `apply` consumes it.
#[derive(Debug)]
pub struct ValidatedPlan {
    plan: MealPlan,
}

impl ValidatedPlan {
    pub fn plan(&self) -> &MealPlan {
        &self.plan
    }
}

/// One deduction made by `apply`, rendered as `Rice: 5kg → 3kg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedUsage {
    pub item_id: InventoryItemId,
    pub name: String,
    pub unit: Unit,
    pub before: Decimal,
    pub after: Decimal,
}

impl fmt::Display for AppliedUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} → {}",
            self.name,
            Quantity::new(self.before, self.unit),
            Quantity::new(self.after, self.unit)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageApplication {
    pub plan_id: MealPlanId,
    pub applied: Vec<AppliedUsage>,
}

impl UsageApplication {
    pub fn summary(&self) -> Vec<String> {
        self.applied.iter().map(ToString::to_string).collect()
    }
}

pub struct InventoryUsageEngine<I, M> {
    inventory: Arc<I>,
    plans: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<I, M> InventoryUsageEngine<I, M>
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    pub fn new(inventory: Arc<I>, plans: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inventory,
            plans,
            clock,
        }
    }

    /// Checks every ingredient line against stock and collects all issues before returning.
    /// Lines naming the same item are checked independently, not summed.
    pub fn check(&self, plan: &MealPlan) -> Result<UsageReport, UsageError> {
        let mut issues = Vec::new();
        for requirement in plan.requirements() {
            let Some(item) = self
                .inventory
                .find_by_name(&plan.property_id, &requirement.name)?
            else {
                issues.push(UsageIssue::MissingItem {
                    name: requirement.name.clone(),
                });
                continue;
            };

            let required = required_in_stock_unit(requirement.quantity, requirement.unit, &item)?;
            if item.quantity < required {
                issues.push(UsageIssue::InsufficientItem {
                    name: requirement.name.clone(),
                    required: Quantity::new(required, item.unit),
                    available: item.stock(),
                });
            }
        }
        Ok(UsageReport {
            plan_id: plan.id.clone(),
            issues,
        })
    }

    /// Runs [`check`](Self::check) and hands back a [`ValidatedPlan`] only when nothing is
    /// missing or short.
    pub fn validate(&self, plan: &MealPlan) -> Result<ValidatedPlan, UsageError> {
        let report = self.check(plan)?;
        if !report.is_clean() {
            warn!(
                plan_id = %plan.id,
                missing = report.missing_items().len(),
                insufficient = report.insufficient_items().len(),
                "meal plan blocked by inventory"
            );
            return Err(UsageError::Shortfall(report));
        }
        Ok(ValidatedPlan { plan: plan.clone() })
    }

    /// Deducts each ingredient line, looking every item up again and flooring stock at zero.
    /// Lines whose item has disappeared since validation are skipped.
    pub fn apply(&self, validated: ValidatedPlan) -> Result<UsageApplication, UsageError> {
        let plan = validated.plan;
        let mut applied = Vec::new();
        for requirement in plan.requirements() {
            let Some(mut item) = self
                .inventory
                .find_by_name(&plan.property_id, &requirement.name)?
            else {
                warn!(plan_id = %plan.id, name = %requirement.name, "item vanished before deduction");
                continue;
            };

            let deduction =
                required_in_stock_unit(requirement.quantity, requirement.unit, &item)?;
            let before = item.quantity;
            item.quantity = (before - deduction).max(Decimal::ZERO).normalize();
            item.last_updated = self.clock.now();
            self.inventory.update(item.clone())?;

            applied.push(AppliedUsage {
                item_id: item.id,
                name: requirement.name.clone(),
                unit: item.unit,
                before,
                after: item.quantity,
            });
        }
        info!(plan_id = %plan.id, items = applied.len(), "meal plan usage applied");
        Ok(UsageApplication {
            plan_id: plan.id,
            applied,
        })
    }

    /// Loads a plan, validates it and applies it only when validation is clean.
    pub fn apply_usage(&self, plan_id: &MealPlanId) -> Result<UsageApplication, UsageError> {
        let plan = self
            .plans
            .fetch(plan_id)?
            .ok_or_else(|| UsageError::PlanNotFound(plan_id.clone()))?;
        let validated = self.validate(&plan)?;
        self.apply(validated)
    }

    /// Manual stock correction. The result may not go below zero.
    pub fn adjust(
        &self,
        item_id: &InventoryItemId,
        delta: Decimal,
    ) -> Result<InventoryItem, UsageError> {
        let mut item = self
            .inventory
            .fetch(item_id)?
            .ok_or_else(|| UsageError::ItemNotFound(item_id.clone()))?;
        let Some(quantity) = item.quantity.checked_add(delta) else {
            warn!(item_id = %item_id, %delta, "adjustment overflows stock quantity");
            return Err(UsageError::Validation(
                "adjusted quantity is out of range".to_string(),
            ));
        };
        if quantity < Decimal::ZERO {
            warn!(item_id = %item_id, %delta, "adjustment would make stock negative");
            return Err(UsageError::Validation(
                "cannot reduce quantity below zero".to_string(),
            ));
        }
        item.quantity = quantity;
        item.last_updated = self.clock.now();
        self.inventory.update(item.clone())?;
        info!(item_id = %item_id, %delta, stock = %item.stock(), "inventory adjusted");
        Ok(item)
    }
}

fn required_in_stock_unit(
    amount: Decimal,
    unit: Unit,
    item: &InventoryItem,
) -> Result<Decimal, UsageError> {
    let conversion = Conversion::between(unit, item.unit);
    if conversion == Conversion::PassThrough {
        warn!(
            item = %item.name,
            from = unit.label(),
            to = item.unit.label(),
            "units of different kinds compared as written"
        );
    }
    convert(amount, unit, item.unit).ok_or_else(|| {
        UsageError::Validation(format!(
            "{amount}{} of {} is out of range in {}",
            unit.label(),
            item.name,
            item.unit.label()
        ))
    })
}

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("invalid inventory request: {0}")]
    Validation(String),
    #[error("inventory item {0} not found")]
    ItemNotFound(InventoryItemId),
    #[error("meal plan {0} not found")]
    PlanNotFound(MealPlanId),
    #[error("{}", shortfall_message(.0))]
    Shortfall(UsageReport),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn shortfall_message(report: &UsageReport) -> String {
    let missing = report.missing_items();
    if missing.is_empty() {
        "insufficient inventory".to_string()
    } else {
        format!(
            "some items are not stocked in inventory: {}",
            missing.join(", ")
        )
    }
}

impl UsageError {
    /// Missing items take precedence over shortages when a report has both.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UsageError::Validation(_) => ErrorKind::Validation,
            UsageError::ItemNotFound(_) | UsageError::PlanNotFound(_) => ErrorKind::NotFound,
            UsageError::Shortfall(report) if !report.missing_items().is_empty() => {
                ErrorKind::MissingInventoryItem
            }
            UsageError::Shortfall(_) => ErrorKind::InsufficientInventory,
            UsageError::Repository(err) => err.kind(),
        }
    }

    /// Offending items for the error body, when there are any.
    pub fn items(&self) -> Option<Value> {
        match self {
            UsageError::Shortfall(report) => Some(json!(report.issues)),
            _ => None,
        }
    }
}

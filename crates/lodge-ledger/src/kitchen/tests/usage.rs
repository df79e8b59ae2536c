use super::common::*;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ErrorKind;
use crate::kitchen::domain::{InventoryItemId, MealKind, MealPlanId, Quantity, Unit};
use crate::kitchen::memory::InMemoryMealPlanRepository;
use crate::kitchen::repository::InventoryRepository;
use crate::kitchen::router::KitchenServices;
use crate::kitchen::usage::{UsageError, UsageIssue};

#[test]
fn grams_against_kilogram_stock_reports_shortfall() {
    let harness = harness();
    let rice = stock(&harness.services, "Rice", Unit::Kg, dec!(5));
    let plan = plan(
        &harness.services,
        day(0),
        vec![meal(
            MealKind::Lunch,
            vec![ingredient("Rice", dec!(6000), Unit::G)],
        )],
    );

    let err = harness
        .services
        .usage
        .validate(&plan)
        .expect_err("6kg needed, 5kg stocked");
    assert_eq!(err.kind(), ErrorKind::InsufficientInventory);
    let UsageError::Shortfall(report) = &err else {
        panic!("expected shortfall, got {err:?}");
    };
    assert_eq!(
        report.issues,
        vec![UsageIssue::InsufficientItem {
            name: "Rice".to_string(),
            required: Quantity::new(dec!(6), Unit::Kg),
            available: Quantity::new(dec!(5), Unit::Kg),
        }]
    );
    assert_eq!(report.issues[0].to_string(), "Rice (need 6kg, have 5kg)");
    assert_eq!(quantity_of(&harness, &rice.id), dec!(5));
}

#[test]
fn apply_usage_is_rejected_when_validation_fails() {
    let harness = harness();
    let rice = stock(&harness.services, "Rice", Unit::Kg, dec!(5));
    let dal = stock(&harness.services, "Dal", Unit::Kg, dec!(3));
    let plan = plan(
        &harness.services,
        day(0),
        vec![meal(
            MealKind::Dinner,
            vec![
                ingredient("Dal", dec!(500), Unit::G),
                ingredient("Rice", dec!(6000), Unit::G),
            ],
        )],
    );

    assert!(matches!(
        harness.services.usage.apply_usage(&plan.id),
        Err(UsageError::Shortfall(_))
    ));
    assert_eq!(quantity_of(&harness, &rice.id), dec!(5));
    assert_eq!(quantity_of(&harness, &dal.id), dec!(3));
}

#[test]
fn validation_collects_every_issue() {
    let harness = harness();
    stock(&harness.services, "Milk", Unit::L, dec!(2));
    stock(&harness.services, "Eggs", Unit::Pcs, dec!(12));
    let plan = plan(
        &harness.services,
        day(0),
        vec![
            meal(
                MealKind::Breakfast,
                vec![
                    ingredient("Milk", dec!(2500), Unit::Ml),
                    ingredient("Bread", dec!(1), Unit::Pcs),
                ],
            ),
            meal(
                MealKind::Dinner,
                vec![
                    ingredient("Eggs", dec!(20), Unit::Pcs),
                    ingredient("Paneer", dec!(400), Unit::G),
                ],
            ),
        ],
    );

    let report = harness.services.usage.check(&plan).expect("report");
    assert_eq!(report.issues.len(), 4);
    assert_eq!(report.missing_items(), vec!["Bread", "Paneer"]);
    assert_eq!(report.insufficient_items().len(), 2);

    let err = harness
        .services
        .usage
        .validate(&plan)
        .expect_err("plan is blocked");
    assert_eq!(err.kind(), ErrorKind::MissingInventoryItem);
    assert!(err.to_string().contains("Bread, Paneer"));
    let items = err.items().expect("offending items");
    assert_eq!(items.as_array().map(Vec::len), Some(4));
    assert_eq!(items[0]["issue"], "insufficient_item");
    assert_eq!(items[1]["issue"], "missing_item");
}

#[test]
fn lookups_ignore_case() {
    let harness = harness();
    let rice = stock(&harness.services, "Basmati Rice", Unit::Kg, dec!(10));
    let plan = plan(
        &harness.services,
        day(0),
        vec![meal(
            MealKind::Lunch,
            vec![ingredient("basmati RICE", dec!(1500), Unit::G)],
        )],
    );

    let application = harness
        .services
        .usage
        .apply_usage(&plan.id)
        .expect("applied");
    assert_eq!(quantity_of(&harness, &rice.id), dec!(8.5));
    assert_eq!(application.summary(), vec!["basmati RICE: 10kg → 8.5kg"]);
}

#[test]
fn apply_deducts_converted_quantities_and_stamps_items() {
    let harness = harness();
    let milk = stock(&harness.services, "Milk", Unit::Ml, dec!(3000));
    let oil = stock(&harness.services, "Oil", Unit::L, dec!(2));
    let plan = plan(
        &harness.services,
        day(0),
        vec![
            meal(
                MealKind::Breakfast,
                vec![ingredient("Milk", dec!(1.5), Unit::L)],
            ),
            meal(MealKind::Dinner, vec![ingredient("Oil", dec!(250), Unit::Ml)]),
        ],
    );

    let validated = harness.services.usage.validate(&plan).expect("clean plan");
    assert_eq!(validated.plan().id, plan.id);
    let application = harness.services.usage.apply(validated).expect("applied");

    assert_eq!(application.applied.len(), 2);
    assert_eq!(quantity_of(&harness, &milk.id), dec!(1500));
    assert_eq!(quantity_of(&harness, &oil.id), dec!(1.75));
    let item = harness.services.catalog.get_item(&oil.id).expect("item");
    assert_eq!(item.last_updated, now());
}

#[test]
fn apply_floors_stock_at_zero() {
    let harness = harness();
    let onions = stock(&harness.services, "Onion", Unit::Kg, dec!(8));
    let first = plan(
        &harness.services,
        day(0),
        vec![meal(MealKind::Lunch, vec![ingredient("Onion", dec!(5), Unit::Kg)])],
    );
    let second = plan(
        &harness.services,
        day(1),
        vec![meal(MealKind::Lunch, vec![ingredient("Onion", dec!(8), Unit::Kg)])],
    );
    let engine = &harness.services.usage;

    let first_ok = engine.validate(&first).expect("first plan fits");
    let second_ok = engine.validate(&second).expect("second plan fits on its own");
    engine.apply(first_ok).expect("first applied");
    assert_eq!(quantity_of(&harness, &onions.id), dec!(3));

    let application = engine.apply(second_ok).expect("stale validation still applies");
    assert_eq!(quantity_of(&harness, &onions.id), dec!(0));
    assert_eq!(application.applied[0].before, dec!(3));
    assert_eq!(application.applied[0].after, dec!(0));
}

#[test]
fn repeated_lines_are_checked_one_by_one() {
    let harness = harness();
    let sugar = stock(&harness.services, "Sugar", Unit::Kg, dec!(1));
    let plan = plan(
        &harness.services,
        day(0),
        vec![
            meal(
                MealKind::Breakfast,
                vec![ingredient("Sugar", dec!(800), Unit::G)],
            ),
            meal(MealKind::Dinner, vec![ingredient("Sugar", dec!(800), Unit::G)]),
        ],
    );

    let application = harness
        .services
        .usage
        .apply_usage(&plan.id)
        .expect("each line fits on its own");
    assert_eq!(application.applied.len(), 2);
    assert_eq!(quantity_of(&harness, &sugar.id), dec!(0));
}

#[test]
fn store_failure_mid_apply_keeps_earlier_deductions() {
    let inventory = Arc::new(FlakyInventory::new(1));
    let services = KitchenServices::new(
        inventory.clone(),
        Arc::new(InMemoryMealPlanRepository::default()),
        clock(),
    );
    let rice = stock(&services, "Rice", Unit::Kg, dec!(5));
    let dal = stock(&services, "Dal", Unit::Kg, dec!(5));
    let plan = plan(
        &services,
        day(0),
        vec![meal(
            MealKind::Lunch,
            vec![
                ingredient("Rice", dec!(2), Unit::Kg),
                ingredient("Dal", dec!(1), Unit::Kg),
            ],
        )],
    );

    let err = services
        .usage
        .apply_usage(&plan.id)
        .expect_err("second update fails");
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    let quantity = |id: &InventoryItemId| {
        inventory
            .fetch(id)
            .expect("fetch")
            .expect("item present")
            .quantity
    };
    assert_eq!(quantity(&rice.id), dec!(3));
    assert_eq!(quantity(&dal.id), dec!(5));
}

#[test]
fn apply_usage_requires_a_known_plan() {
    let harness = harness();
    assert!(matches!(
        harness
            .services
            .usage
            .apply_usage(&MealPlanId("plan-missing".to_string())),
        Err(UsageError::PlanNotFound(_))
    ));
}

#[test]
fn adjust_changes_stock_but_never_below_zero() {
    let harness = harness();
    let rice = stock(&harness.services, "Rice", Unit::Kg, dec!(5));
    let engine = &harness.services.usage;

    let restocked = engine.adjust(&rice.id, dec!(20)).expect("restocked");
    assert_eq!(restocked.quantity, dec!(25));
    let used = engine.adjust(&rice.id, dec!(-25)).expect("emptied");
    assert_eq!(used.quantity, dec!(0));

    match engine.adjust(&rice.id, dec!(-0.5)) {
        Err(UsageError::Validation(message)) => assert!(message.contains("below zero")),
        other => panic!("expected negative stock rejection, got {other:?}"),
    }
    assert_eq!(quantity_of(&harness, &rice.id), dec!(0));
    assert!(matches!(
        engine.adjust(&InventoryItemId("item-missing".to_string()), dec!(1)),
        Err(UsageError::ItemNotFound(_))
    ));
}

#[test]
fn adjust_past_the_decimal_range_is_rejected() {
    let harness = harness();
    let salt = stock(&harness.services, "Salt", Unit::Kg, Decimal::MAX);

    match harness.services.usage.adjust(&salt.id, dec!(1)) {
        Err(UsageError::Validation(message)) => assert!(message.contains("out of range")),
        other => panic!("expected out-of-range rejection, got {other:?}"),
    }
    assert_eq!(quantity_of(&harness, &salt.id), Decimal::MAX);
}

#[test]
fn requirement_too_large_to_convert_is_a_validation_error() {
    let harness = harness();
    let sugar = stock(&harness.services, "Sugar", Unit::G, dec!(500));
    let plan = plan(
        &harness.services,
        day(0),
        vec![meal(
            MealKind::Breakfast,
            vec![ingredient("Sugar", Decimal::MAX, Unit::Kg)],
        )],
    );

    let err = harness
        .services
        .usage
        .validate(&plan)
        .expect_err("requirement overflows grams");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("out of range in g"));
    assert!(matches!(
        harness.services.usage.apply_usage(&plan.id),
        Err(UsageError::Validation(_))
    ));
    assert_eq!(quantity_of(&harness, &sugar.id), dec!(500));
}

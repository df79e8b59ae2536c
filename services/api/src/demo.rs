use crate::infra::{in_memory_services, MemoryKitchen, MemoryLodging};
use chrono::{Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use lodge_ledger::clock::FixedClock;
use lodge_ledger::config::PolicyConfig;
use lodge_ledger::error::AppError;
use lodge_ledger::kitchen::{
    IngredientRequirement, Meal, MealKind, NewInventoryItem, NewMealPlan, Unit,
};
use lodge_ledger::lodging::{
    NewRoom, NewTenant, Payment, PaymentMethod, PaymentRecording, PaymentType, RoomType,
};
use lodge_ledger::store::PropertyId;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Business date for the scenario (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Skip the kitchen inventory portion of the demo.
    #[arg(long)]
    pub(crate) skip_kitchen: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, skip_kitchen } = args;

    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let now = Utc.from_utc_datetime(&(date.and_time(NaiveTime::MIN) + Duration::hours(9)));
    let (lodging, kitchen) =
        in_memory_services(Arc::new(FixedClock(now)), PolicyConfig::default());
    let property = PropertyId("prop-demo".to_string());

    println!("Lodge ledger demo for {date}");
    lodging_walkthrough(&lodging, &property);

    if skip_kitchen {
        return Ok(());
    }
    kitchen_walkthrough(&kitchen, &property, date);
    Ok(())
}

fn lodging_walkthrough(lodging: &MemoryLodging, property: &PropertyId) {
    println!("\nRooms and tenancy");
    let room = match lodging.rooms.create_room(NewRoom {
        property_id: property.clone(),
        number: "101".to_string(),
        room_type: RoomType::Double,
        total_rent: Decimal::from(24_000),
        custom_capacity: None,
    }) {
        Ok(room) => room,
        Err(err) => {
            println!("  Room registration rejected: {err}");
            return;
        }
    };
    println!(
        "- Room {} ({}) | capacity {} | {} per seat | {}",
        room.number,
        room.room_type.label(),
        room.capacity,
        room.rent_per_seat,
        room.status.label()
    );

    let mut first_payments: Vec<Payment> = Vec::new();
    let mut residents = Vec::new();
    for (name, phone) in [
        ("Asha Rao", "9810000001"),
        ("Meera Iyer", "9810000002"),
        ("Kiran Das", "9810000003"),
    ] {
        let request = NewTenant {
            property_id: property.clone(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            room_id: Some(room.id.clone()),
            monthly_rent: None,
            security_deposit: None,
        };
        match lodging.tenancy.create_tenant(request) {
            Ok(created) => {
                let (occupancy, capacity) = created
                    .room
                    .as_ref()
                    .map_or((0, 0), |room| (room.occupancy, room.capacity));
                println!(
                    "- {} assigned to {} ({occupancy}/{capacity}) | rent {} | deposit {} | {} ledger entries",
                    created.tenant.name,
                    room.number,
                    created.tenant.monthly_rent,
                    created.tenant.security_deposit,
                    created.payments.len()
                );
                if first_payments.is_empty() {
                    first_payments = created.payments;
                }
                residents.push(created.tenant);
            }
            Err(err) => println!("  {name} rejected [{}]: {err}", err.kind().label()),
        }
    }

    println!("\nPayments");
    for payment in &first_payments {
        match lodging.ledger.mark_paid(&payment.id) {
            Ok(paid) => println!(
                "- {} {} marked {}{}",
                paid.payment_type.label(),
                paid.amount,
                paid.status.label(),
                if paid.is_locked { " (locked)" } else { "" }
            ),
            Err(err) => println!("  Could not settle {}: {err}", payment.id),
        }
    }
    if let Some(deposit) = first_payments
        .iter()
        .find(|payment| payment.payment_type == PaymentType::Deposit)
    {
        match lodging.ledger.mark_unpaid(&deposit.id) {
            Ok(_) => println!("  Deposit {} was reopened", deposit.id),
            Err(err) => println!("  Reopening deposit refused [{}]: {err}", err.kind().label()),
        }
    }
    if let Some(resident) = residents.get(1) {
        match lodging.ledger.record_payment(PaymentRecording {
            payment_type: PaymentType::Food,
            tenant_id: resident.id.clone(),
            property_id: property.clone(),
            room_id: None,
            amount: Decimal::from(3_500),
            method: PaymentMethod::Upi,
            reference: Some("UPI-20931".to_string()),
        }) {
            Ok(recorded) => println!(
                "- {} paid {} {} via UPI",
                resident.name,
                recorded.payment_type.label(),
                recorded.amount
            ),
            Err(err) => println!("  Recording refused: {err}"),
        }
    }

    let period = lodging.ledger.current_period();
    match lodging.ledger.monthly_status(&room.id, period) {
        Ok(status) => {
            println!(
                "\nRent collection for room {} ({:02}/{}): {} of {} ({}%, {:?})",
                status.room_number,
                status.period.month,
                status.period.year,
                status.total_paid,
                status.total_expected,
                status.percentage,
                status.collection
            );
            for line in &status.tenants {
                println!(
                    "  - {}: expected {} | {} | paid {}",
                    line.name,
                    line.expected_amount,
                    line.status.label(),
                    line.paid_amount
                );
            }
        }
        Err(err) => println!("  Rent collection unavailable: {err}"),
    }
}

fn kitchen_walkthrough(kitchen: &MemoryKitchen, property: &PropertyId, date: NaiveDate) {
    println!("\nKitchen inventory");
    let mut rice = None;
    for (name, unit, quantity, minimum) in [
        ("Rice", Unit::Kg, 5, 2),
        ("Dal", Unit::Kg, 3, 1),
        ("Milk", Unit::L, 4, 1),
    ] {
        match kitchen.catalog.create_item(NewInventoryItem {
            property_id: property.clone(),
            name: name.to_string(),
            unit,
            quantity: Decimal::from(quantity),
            min_quantity: Decimal::from(minimum),
            price_per_unit: Decimal::ZERO,
        }) {
            Ok(item) => {
                println!("- Stocked {} {}", item.name, item.stock());
                if item.name == "Rice" {
                    rice = Some(item.id);
                }
            }
            Err(err) => println!("  Stocking {name} refused: {err}"),
        }
    }

    let requirement = |name: &str, quantity: i64, unit: Unit| IngredientRequirement {
        name: name.to_string(),
        quantity: Decimal::from(quantity),
        unit,
    };
    let plan = match kitchen.catalog.create_plan(NewMealPlan {
        property_id: property.clone(),
        date,
        meals: vec![
            Meal {
                kind: MealKind::Breakfast,
                items: vec![requirement("Milk", 1_500, Unit::Ml)],
            },
            Meal {
                kind: MealKind::Lunch,
                items: vec![
                    requirement("Rice", 6_000, Unit::G),
                    requirement("Dal", 750, Unit::G),
                ],
            },
            Meal {
                kind: MealKind::Dinner,
                items: vec![requirement("Paneer", 400, Unit::G)],
            },
        ],
    }) {
        Ok(plan) => plan,
        Err(err) => {
            println!("  Meal plan rejected: {err}");
            return;
        }
    };

    match kitchen.usage.check(&plan) {
        Ok(report) if report.is_clean() => println!("- Plan {} fits current stock", plan.id),
        Ok(report) => {
            println!("- Plan {} is blocked:", plan.id);
            for issue in &report.issues {
                println!("    - {issue}");
            }
        }
        Err(err) => {
            println!("  Validation unavailable: {err}");
            return;
        }
    }

    println!("\nRestocking");
    if let Some(rice) = &rice {
        match kitchen.usage.adjust(rice, Decimal::from(5)) {
            Ok(item) => println!("- {} now {}", item.name, item.stock()),
            Err(err) => println!("  Restock refused: {err}"),
        }
    }
    match kitchen.catalog.create_item(NewInventoryItem {
        property_id: property.clone(),
        name: "Paneer".to_string(),
        unit: Unit::Kg,
        quantity: Decimal::ONE,
        min_quantity: Decimal::ZERO,
        price_per_unit: Decimal::ZERO,
    }) {
        Ok(item) => println!("- Stocked {} {}", item.name, item.stock()),
        Err(err) => println!("  Stocking Paneer refused: {err}"),
    }

    match kitchen.usage.apply_usage(&plan.id) {
        Ok(application) => {
            println!("\nApplied plan {}:", application.plan_id);
            for line in application.summary() {
                println!("    - {line}");
            }
        }
        Err(err) => println!("  Usage refused [{}]: {err}", err.kind().label()),
    }

    match kitchen.catalog.low_stock(property) {
        Ok(items) if items.is_empty() => println!("\nNo items at or below their minimum"),
        Ok(items) => {
            println!("\nLow stock:");
            for item in items {
                println!(
                    "    - {} {} (minimum {})",
                    item.name,
                    item.stock(),
                    item.min_quantity
                );
            }
        }
        Err(err) => println!("  Low-stock listing unavailable: {err}"),
    }
}

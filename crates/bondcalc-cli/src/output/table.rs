use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Schedule columns shown in table and CSV output, in display order.
pub const SCHEDULE_COLUMNS: [&str; 11] = [
    "period",
    "date",
    "grace",
    "indexed_capital",
    "coupon",
    "amortization",
    "installment",
    "premium",
    "tax_shield",
    "issuer_flow",
    "holder_flow",
];

/// Format output as tables using the tabled crate.
///
/// A full calculation result renders as an amortization schedule table
/// followed by a metrics table; a metrics-only result renders as a single
/// key/value table.
pub fn print_table(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(schedule)) = map.get("schedule") {
                print_schedule_table(schedule);
                if let Some(metrics) = map.get("metrics") {
                    println!();
                    print_flat_object(metrics);
                }
            } else {
                print_flat_object(result);
            }
        }
        _ => println!("{}", result),
    }

    print_footer(value);
}

fn print_schedule_table(schedule: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(SCHEDULE_COLUMNS);
    for row in schedule {
        if let Value::Object(map) = row {
            let record: Vec<String> = SCHEDULE_COLUMNS
                .iter()
                .map(|col| map.get(*col).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", value);
    }
}

fn print_footer(envelope: &Value) {
    let Some(map) = envelope.as_object() else {
        return;
    };

    if let Some(Value::Array(warnings)) = map.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(methodology)) = map.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

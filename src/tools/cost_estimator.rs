use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_args, schema_of, Tool};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CostEstimatorParams {
    /// Retail price per unit of measure (in USD), as returned by the Azure Retail Prices API retailPrice field
    pub unit_price: f64,
    /// The unit of measure for the price, e.g. '1 Hour', '1 GB', '1 Execution', '1 Month'
    pub unit_of_measure: String,
    /// Number of units consumed per month, e.g. 730 for a VM running 24/7 (hours), or 1000000 for 1M function executions
    pub quantity: f64,
    /// Optional label for this line item, e.g. 'D4s v5 VM - East US' or 'Azure Functions executions'
    #[serde(default)]
    pub label: String,
}

pub struct CostEstimator;

#[async_trait]
impl Tool for CostEstimator {
    fn name(&self) -> &'static str {
        "cost_estimator"
    }

    fn description(&self) -> &'static str {
        "Estimate monthly and annual Azure costs from a unit price and usage quantity. \
         Takes a unit price (from the Azure Retail Prices API), unit of measure, and monthly \
         quantity. Returns a formatted cost breakdown with monthly and annual totals."
    }

    fn parameters(&self) -> Value {
        schema_of::<CostEstimatorParams>()
    }

    async fn invoke(&self, args: Value) -> anyhow::Result<String> {
        let params: CostEstimatorParams = parse_args(args)?;
        Ok(estimate(&params))
    }
}

fn estimate(p: &CostEstimatorParams) -> String {
    let monthly = p.unit_price * p.quantity;
    let annual = monthly * 12.0;

    let mut out = String::new();
    if !p.label.is_empty() {
        out.push_str(&format!("**{}**\n", p.label));
    }
    out.push_str(&format!(
        "Unit price:    ${:.6} per {}\n",
        p.unit_price, p.unit_of_measure
    ));
    out.push_str(&format!(
        "Monthly usage: {} {}(s)\n",
        grouped(p.quantity, 2),
        p.unit_of_measure
    ));
    out.push_str("─────────────────────────────────\n");
    out.push_str(&format!("Monthly cost:  ${}\n", grouped(monthly, 4)));
    out.push_str(&format!("Annual cost:   ${}\n", grouped(annual, 4)));
    out
}

/// Fixed-point rendering with comma thousands separators
fn grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut digits = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            digits.push(',');
        }
        digits.push(c);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, digits, frac),
        None => format!("{}{}", sign, digits),
    }
}

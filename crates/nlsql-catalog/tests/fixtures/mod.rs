//! Test fixtures for sampler integration tests
//!
//! Row samples shaped like a small Brazilian e-commerce dataset.

#![allow(dead_code)]

use nlsql_catalog::DataSample;
use serde_json::json;

/// Customers with their city and state
pub fn customers_sample() -> DataSample {
    let mut sample = DataSample::new(vec![
        "customer_id".to_string(),
        "customer_unique_id".to_string(),
        "customer_city".to_string(),
        "customer_state".to_string(),
    ]);
    sample.push_row(vec![json!("06b8999e"), json!("861eff47"), json!("franca"), json!("SP")]);
    sample.push_row(vec![json!("18955e83"), json!("290c77bc"), json!("belo horizonte"), json!("MG")]);
    sample.push_row(vec![json!("4e7b3e00"), json!("060e732b"), json!("sao bernardo do campo"), json!("SP")]);
    sample.push_row(vec![json!("b2b6027b"), json!("259dac75"), json!("contagem"), json!("MG")]);
    sample.push_row(vec![json!("4f2d8ab1"), json!("345ecd01"), json!("campinas"), json!("SP")]);
    sample.push_row(vec![json!("879864df"), json!("4c93744c"), json!("uberlandia"), json!("MG")]);
    sample
}

/// Orders with a status column
pub fn orders_sample() -> DataSample {
    let mut sample = DataSample::new(vec![
        "order_id".to_string(),
        "customer_id".to_string(),
        "order_status".to_string(),
    ]);
    sample.push_row(vec![json!(1), json!("06b8999e"), json!("delivered")]);
    sample.push_row(vec![json!(2), json!("18955e83"), json!("shipped")]);
    sample.push_row(vec![json!(3), json!("4e7b3e00"), json!(null)]);
    sample
}

/// Products with an optional category
pub fn products_sample() -> DataSample {
    let mut sample = DataSample::new(vec![
        "product_id".to_string(),
        "product_category_name".to_string(),
        "product_weight_g".to_string(),
    ]);
    sample.push_row(vec![json!("1e9e8ef0"), json!("perfumaria"), json!(225)]);
    sample.push_row(vec![json!("3aa071139"), json!("artes"), json!(1000)]);
    sample
}

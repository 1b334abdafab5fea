//! Test fixtures for engine integration tests
//!
//! A tiny e-commerce schema: customers, orders and products, with canned
//! annotator responses and matching parsed annotations.

#![allow(dead_code)]

use nlsql_catalog::{DataSample, MockSampler};
use nlsql_core::{ColumnAnnotation, KnowledgeBase, TableAnnotation};
use nlsql_engine::{KnowledgeBaseBuilder, Pipeline, TableAnnotator};
use nlsql_llm::ScriptedCompletion;
use nlsql_prompt::PromptRenderer;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const ORDERS_RESPONSE: &str =
    r#"["Orders table.", [["order_id: numeric id, sample values: 1, 2"]]]"#;

pub const CUSTOMERS_RESPONSE: &str = r#"[
    "Customers and where they live. Each order gets its own customer_id.",
    [
        ["customer_id: key to the orders table, sample values: 06b8999e, 18955e83"],
        ["customer_unique_id: identifies a person across orders, sample values: 861eff47"],
        ["customer_state: two-letter state code, sample values: SP, MG"],
    ]
]"#;

pub const PRODUCTS_RESPONSE: &str =
    "['Products sold on the marketplace.', [['product_id: product key, sample values: 1e9e8ef0'], ['product_category_name: category in Portuguese, sample values: perfumaria, artes']]]";

pub fn prompts() -> Arc<PromptRenderer> {
    Arc::new(PromptRenderer::new().expect("built-in templates compile"))
}

/// One row, `{"order_id": 1, "status": "delivered"}`
pub fn orders_sample() -> DataSample {
    let mut sample = DataSample::new(vec!["order_id".to_string(), "status".to_string()]);
    sample.push_row(vec![json!(1), json!("delivered")]);
    sample
}

pub fn customers_sample() -> DataSample {
    let mut sample = DataSample::new(vec![
        "customer_id".to_string(),
        "customer_unique_id".to_string(),
        "customer_state".to_string(),
    ]);
    sample.push_row(vec![json!("06b8999e"), json!("861eff47"), json!("SP")]);
    sample.push_row(vec![json!("18955e83"), json!("290c77bc"), json!("MG")]);
    sample
}

pub fn products_sample() -> DataSample {
    let mut sample = DataSample::new(vec![
        "product_id".to_string(),
        "product_category_name".to_string(),
    ]);
    sample.push_row(vec![json!("1e9e8ef0"), json!("perfumaria")]);
    sample
}

pub async fn sampler_with_all_tables() -> MockSampler {
    let sampler = MockSampler::new();
    sampler.add_sample("customers", customers_sample()).await;
    sampler.add_sample("orders", orders_sample()).await;
    sampler.add_sample("products", products_sample()).await;
    sampler
}

pub fn purposes(tables: &[(&str, &str)]) -> BTreeMap<String, String> {
    tables
        .iter()
        .map(|(table, purpose)| (table.to_string(), purpose.to_string()))
        .collect()
}

pub fn builder(sampler: &MockSampler, llm: &ScriptedCompletion) -> KnowledgeBaseBuilder {
    let annotator = TableAnnotator::new(Arc::new(llm.clone()), prompts());
    KnowledgeBaseBuilder::new(Arc::new(sampler.clone()), annotator)
}

pub fn customers_annotation() -> TableAnnotation {
    TableAnnotation::new(
        "customers",
        "Customers and where they live. Each order gets its own customer_id.",
        vec![
            ColumnAnnotation::new(
                "customer_id",
                "key to the orders table",
                vec!["06b8999e".to_string(), "18955e83".to_string()],
            ),
            ColumnAnnotation::new(
                "customer_unique_id",
                "identifies a person across orders",
                vec!["861eff47".to_string()],
            ),
            ColumnAnnotation::new(
                "customer_state",
                "two-letter state code",
                vec!["SP".to_string(), "MG".to_string()],
            ),
        ],
    )
}

pub fn orders_annotation() -> TableAnnotation {
    TableAnnotation::new(
        "orders",
        "Orders table.",
        vec![ColumnAnnotation::new(
            "order_id",
            "numeric id",
            vec!["1".to_string(), "2".to_string()],
        )],
    )
}

pub fn products_annotation() -> TableAnnotation {
    TableAnnotation::new(
        "products",
        "Products sold on the marketplace.",
        vec![
            ColumnAnnotation::new("product_id", "product key", vec!["1e9e8ef0".to_string()]),
            ColumnAnnotation::new(
                "product_category_name",
                "category in Portuguese",
                vec!["perfumaria".to_string(), "artes".to_string()],
            ),
        ],
    )
}

pub fn store_kb() -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::from_annotations(vec![
        customers_annotation(),
        orders_annotation(),
        products_annotation(),
    ]))
}

pub fn pipeline(kb: Arc<KnowledgeBase>, llm: &ScriptedCompletion) -> Pipeline {
    Pipeline::with_service(kb, Arc::new(llm.clone()), nlsql_core::SqlDialect::MySql)
        .expect("built-in templates compile")
}

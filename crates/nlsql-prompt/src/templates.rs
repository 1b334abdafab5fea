//! Template sources
//!
//! Each conversation has a `.system` and a `.user` template. Names carry no
//! file extension so no auto-escaping is applied.

pub const ANNOTATE_SYSTEM: &str = "annotate.system";
pub const ANNOTATE_USER: &str = "annotate.user";
pub const ROUTE_SYSTEM: &str = "route.system";
pub const ROUTE_USER: &str = "route.user";
pub const SQLGEN_SYSTEM: &str = "sqlgen.system";
pub const SQLGEN_USER: &str = "sqlgen.user";

/// `(name, source)` pairs registered by [`crate::PromptRenderer::new`]
pub const ALL: &[(&str, &str)] = &[
    (ANNOTATE_SYSTEM, ANNOTATE_SYSTEM_SRC),
    (ANNOTATE_USER, ANNOTATE_USER_SRC),
    (ROUTE_SYSTEM, ROUTE_SYSTEM_SRC),
    (ROUTE_USER, ROUTE_USER_SRC),
    (SQLGEN_SYSTEM, SQLGEN_SYSTEM_SRC),
    (SQLGEN_USER, SQLGEN_USER_SRC),
];

const ANNOTATE_SYSTEM_SRC: &str = "\
You are a skilled data annotator. You write precise, detailed descriptions of SQL tables and their columns.
Output only what is requested, with no explanation or commentary.
Your descriptions feed a text-to-SQL system, so capture every meaningful detail visible in the table description and the sample rows.";

const ANNOTATE_USER_SRC: &str = "\
- Analyze the SQL table and its sample rows, then write a detailed description of the table as a whole.
- For each column, give a precise description of its role and data, followed by 1 or 2 representative sample values.
- Fold any hints from the table description into the column descriptions.
- Base every description on concrete column details, not generic statements.
{% if dataset_context %}
Context: {{ dataset_context }}
{% endif %}
Output format:
[\"<table description>\", [
    [\"<column_1>: description, sample values: v1, v2\"],
    [\"<column_2>: description, sample values: v1, v2\"]
]]

SQL table description:
{{ description }}

Sample rows from the table:
{{ data_sample }}";

const ROUTE_SYSTEM_SRC: &str = "\
You are a concise router for a text-to-SQL system. Given a user question and table descriptions, return only a JSON array of the table names needed to answer it. Output the JSON array and nothing else.";

const ROUTE_USER_SRC: &str = "\
Table descriptions:
{{ table_descriptions }}

Instructions:
1. Split the question into sub-questions.
2. For each sub-question, read every table description and decide which tables hold the required data.
3. Return a compact list of unique table names that together answer the full question.
4. Output must be a JSON array of strings, e.g. [\"tableA\",\"tableB\"]. Nothing else.

User question:
{{ question }}";

const SQLGEN_SYSTEM_SRC: &str = "\
You are an expert SQL assistant. Given the schema below, write one logically valid SQL query for the user question in the given dialect.
Output only the SQL query, with no headers or commentary.";

const SQLGEN_USER_SRC: &str = "\
Schema:
{{ schema }}

SQL dialect: {{ dialect }}

Instructions:
- Use DISTINCT when counting unique values.
- Use only the tables listed above.
- Consider the table columns and their example values.

User question:
{{ question }}";

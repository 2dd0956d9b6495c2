//! Shared test utilities: an in-memory executor for the plans verifiers emit.

#![allow(dead_code)]

use aggfuzz_verify::{
    AggregateCall, Column, DataType, Expr, NamedAggregate, PlanExecutor, PlanNode, Projection,
    RowBatch, Value, CANONICALIZE,
};
use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Row-at-a-time evaluation of [`PlanNode`]s.
///
/// Supports the functions the built-in verifiers use, plus `approx_distinct`
/// computed exactly so that end-to-end checks have a perfect estimator.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalExecutor;

impl PlanExecutor for LocalExecutor {
    fn execute(&self, plan: &PlanNode) -> Result<RowBatch> {
        evaluate(plan)?.into_batch()
    }
}

struct Table {
    names: Vec<String>,
    types: Vec<DataType>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn from_batch(batch: &RowBatch) -> Self {
        Self {
            names: batch.names().to_vec(),
            types: batch.columns().iter().map(|c| c.data_type().clone()).collect(),
            rows: batch.rows(),
        }
    }

    fn into_batch(self) -> Result<RowBatch> {
        let columns = self
            .types
            .iter()
            .enumerate()
            .map(|(i, ty)| Column::flat(ty.clone(), self.rows.iter().map(|r| r[i].clone()).collect()))
            .collect();
        Ok(RowBatch::try_new(self.names, columns)?)
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| anyhow!("unknown column '{}'", name))
    }
}

fn concat(tables: Vec<Table>) -> Table {
    let mut tables = tables.into_iter();
    let Some(mut first) = tables.next() else {
        return Table {
            names: vec![],
            types: vec![],
            rows: vec![],
        };
    };
    for table in tables {
        first.rows.extend(table.rows);
    }
    first
}

fn evaluate(plan: &PlanNode) -> Result<Table> {
    match plan {
        PlanNode::Values(batches) => Ok(concat(batches.iter().map(Table::from_batch).collect())),
        PlanNode::Union(inputs) => Ok(concat(
            inputs.iter().map(evaluate).collect::<Result<Vec<_>>>()?,
        )),
        PlanNode::Project { input, projections } => project(evaluate(input)?, projections),
        PlanNode::Aggregate {
            input,
            grouping_keys,
            aggregates,
        } => aggregate(evaluate(input)?, grouping_keys, aggregates),
    }
}

fn project(input: Table, projections: &[Projection]) -> Result<Table> {
    let rows = input
        .rows
        .iter()
        .map(|row| {
            projections
                .iter()
                .map(|p| eval(&p.expr, &input, row, &[]))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let types = projections
        .iter()
        .enumerate()
        .map(|(i, p)| -> Result<DataType> {
            match p.expr.as_column() {
            Some(name) => Ok(input.types[input.index_of(name)?].clone()),
            None => Ok(infer_type(rows.iter().map(|r| &r[i]))),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        names: projections.iter().map(|p| p.alias.clone()).collect(),
        types,
        rows,
    })
}

fn aggregate(input: Table, keys: &[String], aggregates: &[NamedAggregate]) -> Result<Table> {
    let key_indices = keys
        .iter()
        .map(|k| input.index_of(k))
        .collect::<Result<Vec<_>>>()?;

    // Nulls compare equal here, so they form a group of their own.
    let mut groups: BTreeMap<Vec<Value>, Vec<&Vec<Value>>> = BTreeMap::new();
    if keys.is_empty() {
        groups.insert(vec![], vec![]);
    }
    for row in &input.rows {
        let key = key_indices.iter().map(|i| row[*i].clone()).collect();
        groups.entry(key).or_default().push(row);
    }

    let mut rows = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut out = key;
        for named in aggregates {
            out.push(accumulate(&named.call, &input, &members)?);
        }
        rows.push(out);
    }

    let mut names = keys.to_vec();
    let mut types: Vec<DataType> = key_indices.iter().map(|i| input.types[*i].clone()).collect();
    for (offset, named) in aggregates.iter().enumerate() {
        names.push(named.alias.clone());
        types.push(infer_type(rows.iter().map(|r| &r[keys.len() + offset])));
    }

    Ok(Table { names, types, rows })
}

fn accumulate(call: &AggregateCall, input: &Table, rows: &[&Vec<Value>]) -> Result<Value> {
    let mut args: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(mask) = &call.mask {
            if row[input.index_of(mask)?] != Value::Boolean(true) {
                continue;
            }
        }
        args.push(
            call.args
                .iter()
                .map(|a| eval(a, input, row, &[]))
                .collect::<Result<Vec<_>>>()?,
        );
    }

    let first = |a: &Vec<Value>| a.first().cloned().unwrap_or(Value::Null);
    match call.function.as_str() {
        "count" | "approx_distinct" => {
            let non_null = args.iter().map(first).filter(|v| !v.is_null());
            let count = if call.distinct || call.function == "approx_distinct" {
                non_null.collect::<BTreeSet<_>>().len()
            } else {
                non_null.count()
            };
            Ok(Value::Bigint(count as i64))
        }
        "array_agg" => Ok(Value::Array(args.iter().map(first).collect())),
        "map_agg" => {
            let mut entries: Vec<(Value, Value)> = Vec::new();
            for a in &args {
                let (Some(k), Some(v)) = (a.first(), a.get(1)) else {
                    bail!("map_agg takes two arguments");
                };
                if !k.is_null() && entries.iter().all(|(e, _)| e != k) {
                    entries.push((k.clone(), v.clone()));
                }
            }
            Ok(Value::Map(entries))
        }
        other => bail!("unsupported aggregate '{}'", other),
    }
}

fn eval(expr: &Expr, input: &Table, row: &[Value], scope: &[(String, Value)]) -> Result<Value> {
    match expr {
        Expr::Column(name) => {
            if let Some((_, value)) = scope.iter().rev().find(|(n, _)| n == name) {
                return Ok(value.clone());
            }
            Ok(row[input.index_of(name)?].clone())
        }
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Subscript { base, key } => {
            let base = eval(base, input, row, scope)?;
            let key = eval(key, input, row, scope)?;
            match base {
                Value::Map(entries) => Ok(entries
                    .into_iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v)
                    .unwrap_or(Value::Null)),
                Value::Null => Ok(Value::Null),
                other => bail!("cannot subscript {}", other),
            }
        }
        Expr::Call { function, args } => call(function, args, input, row, scope),
        Expr::Lambda { .. } => bail!("lambda outside of a function call"),
        Expr::Placeholder => bail!("unresolved placeholder"),
    }
}

fn call(
    function: &str,
    args: &[Expr],
    input: &Table,
    row: &[Value],
    scope: &[(String, Value)],
) -> Result<Value> {
    if function == "transform_values" {
        let [map, Expr::Lambda { params, body }] = args else {
            bail!("transform_values takes a map and a lambda");
        };
        let [k, v] = params.as_slice() else {
            bail!("transform_values lambda takes two parameters");
        };
        return match eval(map, input, row, scope)? {
            Value::Map(entries) => {
                let mut transformed = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let mut inner = scope.to_vec();
                    inner.push((k.clone(), key.clone()));
                    inner.push((v.clone(), value));
                    transformed.push((key, eval(body, input, row, &inner)?));
                }
                Ok(Value::Map(transformed))
            }
            Value::Null => Ok(Value::Null),
            other => bail!("transform_values over {}", other),
        };
    }

    let [arg] = args else {
        bail!("{} takes one argument", function);
    };
    let value = eval(arg, input, row, scope)?;
    match (function, value) {
        (CANONICALIZE, value) => Ok(canonicalize(value)),
        ("array_sort", Value::Array(mut values)) => {
            values.sort();
            Ok(Value::Array(values))
        }
        ("map_keys", Value::Map(entries)) => {
            Ok(Value::Array(entries.into_iter().map(|(k, _)| k).collect()))
        }
        (_, Value::Null) => Ok(Value::Null),
        (function, value) => bail!("unsupported call {}({})", function, value),
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Array(mut values) => {
            values.sort();
            Value::Array(values)
        }
        Value::Map(mut entries) => {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Map(entries)
        }
        other => other,
    }
}

fn type_of(value: &Value) -> Option<DataType> {
    match value {
        Value::Null => None,
        Value::Boolean(_) => Some(DataType::Boolean),
        Value::Integer(_) => Some(DataType::Integer),
        Value::Bigint(_) => Some(DataType::Bigint),
        Value::Double(_) => Some(DataType::Double),
        Value::Varchar(_) => Some(DataType::Varchar),
        Value::Array(values) => Some(DataType::array(infer_type(values.iter()))),
        Value::Map(entries) => Some(DataType::map(
            infer_type(entries.iter().map(|(k, _)| k)),
            infer_type(entries.iter().map(|(_, v)| v)),
        )),
    }
}

/// Type of the first non-null value, BIGINT if there is none.
fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    values.filter_map(type_of).next().unwrap_or(DataType::Bigint)
}

// =============================================================================
// Batch builders
// =============================================================================

pub fn bigints(values: &[i64]) -> Column {
    Column::flat(
        DataType::Bigint,
        values.iter().map(|v| Value::Bigint(*v)).collect(),
    )
}

pub fn nullable_bigints(values: &[Option<i64>]) -> Column {
    Column::flat(
        DataType::Bigint,
        values
            .iter()
            .map(|v| v.map(Value::Bigint).unwrap_or(Value::Null))
            .collect(),
    )
}

pub fn batch(columns: Vec<(&str, Column)>) -> RowBatch {
    let (names, columns): (Vec<String>, Vec<Column>) = columns
        .into_iter()
        .map(|(name, column)| (name.to_string(), column))
        .unzip();
    RowBatch::try_new(names, columns).unwrap()
}

pub fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

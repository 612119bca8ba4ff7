//! Result merge strategies
//!
//! Combining several agents' partial results into one value. An empty
//! result set always merges to `null`.

use agent_runtime::MergeStrategy;
use serde_json::{Map, Number, Value};

/// Caller-supplied reducer used by the `aggregate` strategy
pub trait Aggregator: Send + Sync {
    fn aggregate(&self, results: Vec<Value>) -> Value;
}

/// Sums numbers, concatenates arrays and unions objects
///
/// Mixed result kinds are returned unchanged as an array.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAggregator;

impl Aggregator for DefaultAggregator {
    fn aggregate(&self, results: Vec<Value>) -> Value {
        if results.iter().all(Value::is_number) {
            return sum(&results);
        }
        if results.iter().all(Value::is_array) {
            return Value::Array(
                results
                    .into_iter()
                    .flat_map(|r| match r {
                        Value::Array(items) => items,
                        other => vec![other],
                    })
                    .collect(),
            );
        }
        if results.iter().all(Value::is_object) {
            let mut merged = Map::new();
            for result in results {
                if let Value::Object(fields) = result {
                    merged.extend(fields);
                }
            }
            return Value::Object(merged);
        }
        Value::Array(results)
    }
}

fn sum(numbers: &[Value]) -> Value {
    if numbers.iter().all(|n| n.is_i64()) {
        let total = numbers
            .iter()
            .filter_map(Value::as_i64)
            .try_fold(0i64, |acc, n| acc.checked_add(n));
        if let Some(total) = total {
            return Value::from(total);
        }
    }
    let total: f64 = numbers.iter().filter_map(Value::as_f64).sum();
    Number::from_f64(total).map(Value::Number).unwrap_or(Value::Null)
}

/// Merge `results` with `strategy`
pub fn merge(results: Vec<Value>, strategy: MergeStrategy, aggregator: &dyn Aggregator) -> Value {
    if results.is_empty() {
        return Value::Null;
    }
    match strategy {
        MergeStrategy::Concatenate => concatenate(results),
        MergeStrategy::Aggregate => aggregator.aggregate(results),
        MergeStrategy::Vote => vote(results),
    }
}

/// Join results in input order
///
/// All-string results become one text separated by blank lines; anything
/// else becomes an array, with array results flattened one level.
pub fn concatenate(results: Vec<Value>) -> Value {
    if results.is_empty() {
        return Value::Null;
    }
    if results.iter().all(Value::is_string) {
        let parts: Vec<&str> = results.iter().filter_map(Value::as_str).collect();
        return Value::String(parts.join("\n\n"));
    }

    let mut joined = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Value::Array(items) => joined.extend(items),
            other => joined.push(other),
        }
    }
    Value::Array(joined)
}

/// The result the largest group of identical results agrees on
///
/// Ties go to the group whose first member appears earliest.
pub fn vote(results: Vec<Value>) -> Value {
    let mut tallies: Vec<(Value, usize)> = Vec::new();
    for result in results {
        match tallies.iter_mut().find(|(candidate, _)| *candidate == result) {
            Some((_, count)) => *count += 1,
            None => tallies.push((result, 1)),
        }
    }

    let mut winner: Option<(Value, usize)> = None;
    for (candidate, count) in tallies {
        match &winner {
            Some((_, best)) if count <= *best => {}
            _ => winner = Some((candidate, count)),
        }
    }
    winner.map(|(value, _)| value).unwrap_or(Value::Null)
}

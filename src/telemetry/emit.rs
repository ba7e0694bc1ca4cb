use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::time::Instant;
use uuid::Uuid;

#[derive(Serialize, Default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl Meta {
    /// Elapsed time since `started`, tagged with the run's id.
    pub fn for_run(run_id: Uuid, started: Instant) -> Self {
        Self { duration_ms: Some(started.elapsed().as_millis()), run_id: Some(run_id.to_string()) }
    }
}

fn envelope<T: Serialize>(op: &str, apply: bool, key: &str, body: &T, meta: Option<Meta>) -> Result<Value> {
    let mut env = json!({ "op": op, "ok": true, "apply": apply, "meta": meta });
    env[key] = serde_json::to_value(body)?;
    Ok(env)
}

fn write_line(env: &Value) -> Result<()> {
    let mut out = io::stdout();
    serde_json::to_writer(&mut out, env)?;
    writeln!(&mut out)?;
    Ok(())
}

pub fn print_plan<T: Serialize>(op: &str, plan: &T, meta: Option<Meta>) -> Result<()> {
    write_line(&envelope(op, false, "plan", plan, meta)?)
}

pub fn print_result<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<()> {
    write_line(&envelope(op, true, "result", result, meta)?)
}

/// Invocation-level failure: the only case where callers see an error body.
pub fn print_error(op: &str, err: &anyhow::Error) -> Result<()> {
    write_line(&json!({ "op": op, "ok": false, "error": format!("{err:#}") }))
}

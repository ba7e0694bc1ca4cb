pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one typed context per operation
pub fn init() -> LogCtx<ops::init::Init> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn company() -> LogCtx<ops::company::Company> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn scan() -> LogCtx<ops::scan::Scan> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn jobs() -> LogCtx<ops::jobs::Jobs> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }

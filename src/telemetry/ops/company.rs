use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Company;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Add, Page, List }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Add => "add",
        Phase::Page => "page",
        Phase::List => "list",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Add => info_span!("add"),
        Phase::Page => info_span!("page"),
        Phase::List => info_span!("list"),
    }}
}

impl OpMarker for Company {
    const NAME: &'static str = "company";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("company") }
}

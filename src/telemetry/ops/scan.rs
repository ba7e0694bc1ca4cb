use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Scan;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Resolve, Target, Fetch, Extract, Enrich, Persist }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Resolve => "resolve",
        Phase::Target => "target",
        Phase::Fetch => "fetch",
        Phase::Extract => "extract",
        Phase::Enrich => "enrich",
        Phase::Persist => "persist",
    }}
    fn span(&self) -> Span { match self {
        Phase::Resolve => info_span!("resolve"),
        Phase::Target => info_span!("target"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Extract => info_span!("extract"),
        Phase::Enrich => info_span!("enrich"),
        Phase::Persist => info_span!("persist"),
    }}
}

impl OpMarker for Scan {
    const NAME: &'static str = "scan";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("scan") }
}

//! Terminal tables for rankings and score breakdowns

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use narrative_core::{ComponentInput, RankedNarrative, RegimeType, ScoreBreakdown, format_dollars};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn ranking_table(
    ranked: &[RankedNarrative<'_>],
    regime: RegimeType,
    flow_lookback: usize,
) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Rank",
        "Narrative",
        "Stage",
        "Alpha",
        "Regime fit",
        "Net flow",
        "Assets",
    ]);

    for entry in ranked {
        let narrative = entry.narrative;
        let fit = narrative
            .regime_score(regime)
            .map_or_else(|| "-".to_string(), |score| format!("{score:.1}"));

        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(narrative.name()),
            Cell::new(narrative.lifecycle_stage()),
            Cell::new(format!("{:.1}", entry.alpha_score)),
            Cell::new(fit),
            Cell::new(format_dollars(narrative.recent_net_flow(flow_lookback))),
            Cell::new(narrative.related_assets().join(", ")),
        ]);
    }
    table
}

fn describe_input(input: &ComponentInput) -> String {
    match input {
        ComponentInput::Stage(stage) => stage.to_string(),
        ComponentInput::NetFlow(Some(net)) => format_dollars(*net),
        ComponentInput::NetFlow(None) | ComponentInput::MomentumChange(None) => {
            "no history".to_string()
        }
        ComponentInput::Alignment { regime, score } => format!("{regime} {score:.1}"),
        ComponentInput::MomentumChange(Some(change)) => format!("{:+.1}%", change * 100.0),
    }
}

pub fn breakdown_table(breakdown: &ScoreBreakdown) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Component", "Input", "Score", "Weight", "Contribution"]);

    for component in &breakdown.components {
        table.add_row(vec![
            component.component.to_string(),
            describe_input(&component.input),
            format!("{:.1}", component.score),
            format!("{:.2}", component.weight),
            format!("{:.2}", component.contribution),
        ]);
    }
    table.add_row(vec![
        "total".to_string(),
        String::new(),
        String::new(),
        String::new(),
        format!("{:.2}", breakdown.alpha_score),
    ]);
    table
}

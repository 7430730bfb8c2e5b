//! Built-in demo dataset
//!
//! Five narratives spanning the lifecycle, each with ten hourly flows ending
//! one hour before `as_of`.

use chrono::{DateTime, Duration, Utc};
use narrative_core::{CapitalFlow, LifecycleStage, Narrative, Result};

/// Linear flow series: step `i` adds `i * step` to inflow and net flow and
/// `i * volume_step` to volume
struct FlowSeries {
    inflow: f64,
    outflow: f64,
    net_flow: f64,
    volume: f64,
    step: f64,
    volume_step: f64,
    sources: &'static [&'static str],
}

struct DemoNarrative {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    age: Duration,
    stage: LifecycleStage,
    tags: &'static [&'static str],
    assets: &'static [&'static str],
    sentiment: f64,
    attention: f64,
    flows: FlowSeries,
}

const FLOW_COUNT: i64 = 10;

fn demo_set() -> [DemoNarrative; 5] {
    [
        DemoNarrative {
            id: "ai-revolution-2024",
            name: "AI Revolution",
            description: "Artificial intelligence transforming productivity and business models",
            age: Duration::hours(12),
            stage: LifecycleStage::Formation,
            tags: &["tech", "innovation", "growth", "ai", "productivity"],
            assets: &["NVDA", "MSFT", "META"],
            sentiment: 0.8,
            attention: 0.6,
            flows: FlowSeries {
                inflow: 500_000.0,
                outflow: 200_000.0,
                net_flow: 300_000.0,
                volume: 1_000_000.0,
                step: 100_000.0,
                volume_step: 200_000.0,
                sources: &["institutional", "retail"],
            },
        },
        DemoNarrative {
            id: "energy-transition-2024",
            name: "Energy Transition",
            description: "Shift to renewable energy and infrastructure buildout",
            age: Duration::days(30),
            stage: LifecycleStage::Acceleration,
            tags: &["energy", "infrastructure", "commodities", "sustainability"],
            assets: &["ENPH", "FSLR", "NEE"],
            sentiment: 0.6,
            attention: 0.7,
            flows: FlowSeries {
                inflow: 2_000_000.0,
                outflow: 800_000.0,
                net_flow: 1_200_000.0,
                volume: 5_000_000.0,
                step: 500_000.0,
                volume_step: 1_000_000.0,
                sources: &["institutional"],
            },
        },
        DemoNarrative {
            id: "mag7-tech-2024",
            name: "Magnificent 7 Tech Dominance",
            description: "Large cap tech stocks dominating market returns",
            age: Duration::days(365),
            stage: LifecycleStage::Saturation,
            tags: &["tech", "mega-cap", "momentum"],
            assets: &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA"],
            sentiment: 0.3,
            attention: 0.9,
            flows: FlowSeries {
                inflow: 50_000_000.0,
                outflow: 48_000_000.0,
                net_flow: 2_000_000.0,
                volume: 100_000_000.0,
                step: 0.0,
                volume_step: 0.0,
                sources: &["institutional", "retail", "etf"],
            },
        },
        DemoNarrative {
            id: "crypto-winter-recovery-2024",
            name: "Crypto Winter Recovery",
            description: "Cryptocurrency market recovery after extended bear market",
            age: Duration::hours(48),
            stage: LifecycleStage::Formation,
            tags: &["crypto", "digital-assets", "hedge", "innovation"],
            assets: &["BTC", "ETH", "COIN"],
            sentiment: 0.4,
            attention: 0.3,
            flows: FlowSeries {
                inflow: 800_000.0,
                outflow: 400_000.0,
                net_flow: 400_000.0,
                volume: 2_000_000.0,
                step: 150_000.0,
                volume_step: 300_000.0,
                sources: &["retail", "hedge-funds"],
            },
        },
        DemoNarrative {
            id: "defensive-rotation-2024",
            name: "Defensive Rotation",
            description: "Rotation into defensive sectors amid economic uncertainty",
            age: Duration::days(7),
            stage: LifecycleStage::Acceleration,
            tags: &["defensive", "quality", "safe-haven", "value"],
            assets: &["JNJ", "PG", "KO", "WMT"],
            sentiment: 0.2,
            attention: 0.5,
            flows: FlowSeries {
                inflow: 3_000_000.0,
                outflow: 1_500_000.0,
                net_flow: 1_500_000.0,
                volume: 6_000_000.0,
                step: 400_000.0,
                volume_step: 800_000.0,
                sources: &["institutional"],
            },
        },
    ]
}

/// Demo narratives positioned relative to `as_of`
pub fn narratives(as_of: DateTime<Utc>) -> Result<Vec<Narrative>> {
    demo_set()
        .into_iter()
        .map(|demo| {
            let series = &demo.flows;
            let flows = (0..FLOW_COUNT)
                .map(|i| {
                    let offset = i as f64;
                    CapitalFlow::new(
                        demo.id,
                        as_of - Duration::hours(FLOW_COUNT - i),
                        series.inflow + offset * series.step,
                        series.outflow,
                        series.net_flow + offset * series.step,
                        series.volume + offset * series.volume_step,
                    )
                    .map(|flow| flow.with_sources(series.sources.iter().copied()))
                })
                .collect::<Result<Vec<_>>>()?;

            Narrative::builder(demo.id, demo.name)
                .description(demo.description)
                .created_at(as_of - demo.age)
                .updated_at(as_of)
                .lifecycle_stage(demo.stage)
                .tags(demo.tags.iter().copied())
                .related_assets(demo.assets.iter().copied())
                .sentiment_score(demo.sentiment)
                .attention_score(demo.attention)
                .capital_flows(flows)
                .build()
        })
        .collect()
}

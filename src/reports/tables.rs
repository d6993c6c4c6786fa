use cipherforge::bench::BenchmarkReport;
use cipherforge::metrics::MetricRegistry;
use cipherforge::search::RoundSweepOutcome;
use cipherforge::sequence::Contender;
use cipherforge::session::EvaluatedCandidate;
use cipherforge::transform::TransformRegistry;
use cipherforge::weights::WeightConfig;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn align_right(table: &mut Table, columns: std::ops::RangeInclusive<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn candidates(
    title: &str,
    ranked: &[EvaluatedCandidate],
    registry: &TransformRegistry,
    top: usize,
) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Sequence").add_attribute(Attribute::Bold),
        Cell::new("Score").fg(Color::Cyan),
        Cell::new("Passed").fg(Color::Green),
    ]);

    for (i, c) in ranked.iter().take(top).enumerate() {
        let passed = c.results.iter().filter(|r| r.passed).count();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(c.sequence.describe(registry)),
            Cell::new(format!("{:.4}", c.score)).fg(Color::Cyan),
            Cell::new(format!("{}/{}", passed, c.results.len())),
        ]);
    }
    align_right(&mut table, 2..=3);
    println!("\n{} ({} evaluated)\n{}", title, ranked.len(), table);
}

pub fn contenders(pool: &[Contender], registry: &TransformRegistry) {
    if pool.is_empty() {
        println!("\nContender pool is empty.");
        return;
    }
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Contender").add_attribute(Attribute::Bold),
        Cell::new("Aggregate").fg(Color::Cyan),
        Cell::new("Passed").fg(Color::Green),
    ]);
    for c in pool {
        table.add_row(vec![
            Cell::new(c.sequence.describe(registry)),
            Cell::new(format!("{:.4}", c.aggregate_score)).fg(Color::Cyan),
            Cell::new(format!("{}/{}", c.pass_count(), c.metrics.len())),
        ]);
    }
    align_right(&mut table, 1..=2);
    println!("\n{}", table);
}

pub fn weights(config: &WeightConfig) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Weight").fg(Color::Cyan),
    ]);
    for (name, w) in config.sorted_desc() {
        table.add_row(vec![Cell::new(name), Cell::new(format!("{:.4}", w))]);
    }
    align_right(&mut table, 1..=1);
    println!("\n{}", table);
}

pub fn metric_catalog(registry: &MetricRegistry) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Weight").fg(Color::Cyan),
        Cell::new("Ideal"),
        Cell::new("Threshold").fg(Color::Red),
    ]);
    for m in registry.metrics() {
        table.add_row(vec![
            Cell::new(&m.name),
            Cell::new(format!("{:.3}", m.weight)).fg(Color::Cyan),
            Cell::new(format!("{:.3}", m.baseline)),
            Cell::new(format!("{:.1}", m.threshold)).fg(Color::Red),
        ]);
    }
    align_right(&mut table, 1..=3);
    println!("\n{}", table);
}

pub fn round_sweep(outcome: &RoundSweepOutcome) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Global Rounds").add_attribute(Attribute::Bold),
        Cell::new("Score").fg(Color::Cyan),
    ]);
    for (rounds, score) in &outcome.per_round {
        let mut row_cell = Cell::new(rounds);
        if outcome.best_rounds == Some(*rounds) {
            row_cell = row_cell.fg(Color::Green).add_attribute(Attribute::Bold);
        }
        let score_cell = match score {
            Some(s) => Cell::new(format!("{:.4}", s)),
            None => Cell::new("not reversible").fg(Color::Red),
        };
        table.add_row(vec![row_cell, score_cell]);
    }
    align_right(&mut table, 0..=1);
    println!("\n{}", table);
}

pub fn benchmark(report: &BenchmarkReport) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Transform").add_attribute(Attribute::Bold),
        Cell::new("Fwd"),
        Cell::new("Inv"),
        Cell::new("Best (us)").fg(Color::Cyan),
        Cell::new("Round Trip"),
    ]);
    for p in &report.pairs {
        let trip = if p.reversible {
            Cell::new("ok").fg(Color::Green)
        } else {
            Cell::new("lossy").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&p.name),
            Cell::new(p.forward_id),
            Cell::new(p.inverse_id),
            Cell::new(format!("{:.2}", p.best.as_secs_f64() * 1e6)).fg(Color::Cyan),
            trip,
        ]);
    }
    align_right(&mut table, 1..=3);
    println!(
        "\n{}\nTotal of best times: {:.2} us",
        table,
        report.total_best.as_secs_f64() * 1e6
    );
}

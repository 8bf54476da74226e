use std::fmt::{self, Display, Formatter};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::fitted::FittedModel;
use crate::model::Family;
use crate::statistics::Interval;

/// Level of the intervals shown in the summary table.
const SUMMARY_LEVEL: f64 = 0.95;

fn styled(table: &mut Table) -> &mut Table {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
}

fn number(value: f64) -> Cell {
    let text = if value.is_finite() && value.abs() >= 1e4 {
        format!("{value:.3e}")
    } else {
        format!("{value:.4}")
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn interval_row(label: &str, interval: Option<Interval<f64>>) -> Vec<Cell> {
    let label = Cell::new(label).set_alignment(CellAlignment::Left);
    match interval {
        Some(iv) => vec![
            label,
            number(iv.estimate.unwrap_or(f64::NAN)),
            number(iv.lower),
            number(iv.upper),
        ],
        None => vec![
            label,
            Cell::new("n/a").set_alignment(CellAlignment::Right),
            Cell::new("").set_alignment(CellAlignment::Right),
            Cell::new("").set_alignment(CellAlignment::Right),
        ],
    }
}

impl FittedModel {
    /// Two stacked tables: model facts, then coefficients with 95% intervals.
    pub fn summary(&self) -> String {
        let spec = self.spec();

        let mut title_table = Table::new();
        styled(&mut title_table).add_row(vec![
            Cell::new(format!("Bag of Little Bootstraps: {} model", spec.family))
                .set_alignment(CellAlignment::Center),
        ]);

        let mut facts = Table::new();
        styled(&mut facts)
            .add_row(vec![Cell::new("Formula"), Cell::new(spec).set_alignment(CellAlignment::Right)])
            .add_row(vec![
                Cell::new("Partitions"),
                Cell::new(self.partitions()).set_alignment(CellAlignment::Right),
            ])
            .add_row(vec![
                Cell::new("Replicates per partition"),
                Cell::new(self.replicates()).set_alignment(CellAlignment::Right),
            ]);

        let lo = format!("{:.1}%", 50.0 * (1.0 - SUMMARY_LEVEL));
        let hi = format!("{:.1}%", 100.0 - 50.0 * (1.0 - SUMMARY_LEVEL));
        let mut table = Table::new();
        styled(&mut table).set_header(vec![
            Cell::new("Term").set_alignment(CellAlignment::Center),
            Cell::new("Estimate").set_alignment(CellAlignment::Center),
            Cell::new(lo).set_alignment(CellAlignment::Center),
            Cell::new(hi).set_alignment(CellAlignment::Center),
        ]);

        for name in self.names() {
            let interval = self.confidence_interval(name, SUMMARY_LEVEL).ok();
            table.add_row(interval_row(name, interval));
        }
        match spec.family {
            Family::Continuous => {
                let interval = self.dispersion_interval(SUMMARY_LEVEL).ok();
                table.add_row(interval_row("sigma", interval));
            }
            Family::Binary => {}
        }

        format!("{title_table}\n{facts}\n{table}")
    }
}

impl Display for FittedModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::BlbConfig;
    use crate::model::ModelSpec;
    use crate::sample::Partition;

    fn partition(shift: f64) -> Partition {
        let x: Vec<f64> = (0..25).map(|i| f64::from(i) * 0.2 + shift).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 1.0 + (v * 5.0).cos()).collect();
        let hit: Vec<f64> = x.iter().map(|v| if (v * 3.0).sin() > 0.2 { 1.0 } else { 0.0 }).collect();
        Partition::new([("x", x), ("y", y), ("hit", hit)]).unwrap()
    }

    #[test]
    fn linear_summary_lists_terms_and_sigma() {
        let config = BlbConfig::new().with_replicates(30).with_seed(1);
        let model = config.fit(&ModelSpec::linear("y", ["x"]), &[partition(0.0), partition(0.1)]).unwrap();
        let text = model.to_string();
        assert!(text.contains("Bag of Little Bootstraps: linear model"));
        assert!(text.contains("y ~ x"));
        assert!(text.contains("(Intercept)"));
        assert!(text.contains("sigma"));
        assert!(text.contains("2.5%") && text.contains("97.5%"));
    }

    #[test]
    fn logistic_summary_has_no_sigma() {
        let config = BlbConfig::new().with_replicates(20).with_seed(2);
        let model = config.fit(&ModelSpec::logistic("hit", ["x"]), &[partition(0.0), partition(0.05)]).unwrap();
        let text = model.summary();
        assert!(text.contains("logistic"));
        assert!(!text.contains("sigma"));
    }
}

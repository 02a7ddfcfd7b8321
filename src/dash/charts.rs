//! SVG chart rendering for the panels.
//!
//! All charts share one canvas size and one color palette so that the output
//! files look consistent across panels.

use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;

use poll_tables::{RankedStation, YearTotals};

use crate::dash::ScopeError;

const CHART_SIZE: (u32, u32) = (900, 600);

const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

fn pick_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

fn chart_err<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> ScopeError + '_ {
    move |e| ScopeError::Chart {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    }
}

/// One pie slice per party with a non-zero total. An empty totals list still
/// produces a titled, empty canvas.
pub fn pie_chart(path: &Path, title: &str, totals: &[(String, u64)]) -> Result<(), ScopeError> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err(path))?;
    let root = root
        .titled(title, ("sans-serif", 28))
        .map_err(chart_err(path))?;

    let slices: Vec<&(String, u64)> = totals.iter().filter(|(_, count)| *count > 0).collect();
    if !slices.is_empty() {
        let sizes: Vec<f64> = slices.iter().map(|(_, count)| *count as f64).collect();
        let labels: Vec<String> = slices.iter().map(|(party, _)| party.clone()).collect();
        let colors: Vec<RGBColor> = (0..slices.len()).map(pick_color).collect();
        let (w, h) = (CHART_SIZE.0 as i32, CHART_SIZE.1 as i32);
        let center = (w / 2, h / 2);
        let radius = w.min(h) as f64 * 0.35;
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style(("sans-serif", 18).into_font());
        pie.percentages(("sans-serif", 14).into_font());
        root.draw(&pie).map_err(chart_err(path))?;
    }
    root.present().map_err(chart_err(path))
}

/// One group of bars per year, one bar per party, with a legend mapping
/// colors to parties.
pub fn grouped_bar_chart(
    path: &Path,
    title: &str,
    parties: &[String],
    by_year: &[YearTotals],
) -> Result<(), ScopeError> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err(path))?;

    let max = by_year
        .iter()
        .flat_map(|yt| yt.totals.iter().map(|(_, count)| *count))
        .max()
        .unwrap_or(0)
        .max(1);
    // Each year gets one slot per party plus a spacer slot.
    let group = parties.len() as i32 + 1;
    let slots = (group * by_year.len() as i32).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0i32..slots, 0u64..max + max / 10 + 1)
        .map_err(chart_err(path))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc("Votes")
        .draw()
        .map_err(chart_err(path))?;

    for (pi, party) in parties.iter().enumerate() {
        let color = pick_color(pi);
        let bars: Vec<Rectangle<(i32, u64)>> = by_year
            .iter()
            .enumerate()
            .filter_map(|(yi, yt)| {
                let count = yt
                    .totals
                    .iter()
                    .find(|(p, _)| p == party)
                    .map(|(_, count)| *count)?;
                let x = yi as i32 * group + pi as i32;
                Some(Rectangle::new([(x, 0), (x + 1, count)], color.filled()))
            })
            .collect();
        chart
            .draw_series(bars)
            .map_err(chart_err(path))?
            .label(party)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }
    chart
        .draw_series(by_year.iter().enumerate().map(|(yi, yt)| {
            let x = yi as i32 * group + parties.len() as i32 / 2;
            Text::new(yt.year.to_string(), (x, 0u64), ("sans-serif", 18))
        }))
        .map_err(chart_err(path))?;
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(chart_err(path))?;
    root.present().map_err(chart_err(path))
}

/// One bar per ranked station, highest score first, with the station name
/// written under its bar.
pub fn bar_chart(path: &Path, title: &str, stations: &[RankedStation]) -> Result<(), ScopeError> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err(path))?;

    let max = stations
        .iter()
        .map(|s| s.value)
        .fold(0.0f64, f64::max)
        .max(1e-9);
    let count = (stations.len() as i32).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(140)
        .y_label_area_size(70)
        .build_cartesian_2d(0i32..count, 0f64..max * 1.1)
        .map_err(chart_err(path))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc("Score")
        .draw()
        .map_err(chart_err(path))?;

    chart
        .draw_series(stations.iter().enumerate().map(|(i, s)| {
            Rectangle::new(
                [(i as i32, 0.0), (i as i32 + 1, s.value)],
                BLUE.mix(0.4).filled(),
            )
        }))
        .map_err(chart_err(path))?;
    chart
        .draw_series(stations.iter().enumerate().map(|(i, s)| {
            Text::new(
                format!("{} ({})", s.name, s.code),
                (i as i32, 0.0),
                ("sans-serif", 14)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
        }))
        .map_err(chart_err(path))?;
    root.present().map_err(chart_err(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg_content(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_pie_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pie.svg");
        let totals = vec![
            ("PartyX".to_string(), 70u64),
            ("PartyY".to_string(), 80u64),
            ("PartyZ".to_string(), 0u64),
        ];
        pie_chart(&path, "Party Distribution for Year 2020", &totals).unwrap();
        let content = svg_content(&path);
        assert!(content.contains("<svg"));
        assert!(content.contains("Party Distribution for Year 2020"));
    }

    #[test]
    fn test_pie_chart_with_no_slices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        pie_chart(&path, "Party Distribution for Year 1999", &[]).unwrap();
        assert!(svg_content(&path).contains("<svg"));
    }

    #[test]
    fn test_grouped_bar_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compare.svg");
        let parties = vec!["PartyX".to_string(), "PartyY".to_string()];
        let by_year = vec![
            YearTotals {
                year: 2016,
                totals: vec![("PartyX".to_string(), 30), ("PartyY".to_string(), 50)],
            },
            YearTotals {
                year: 2020,
                totals: vec![("PartyX".to_string(), 70), ("PartyY".to_string(), 80)],
            },
        ];
        grouped_bar_chart(&path, "Party Distribution for Years 2016, 2020", &parties, &by_year)
            .unwrap();
        let content = svg_content(&path);
        assert!(content.contains("<svg"));
        assert!(content.contains("2016"));
        assert!(content.contains("2020"));
    }

    #[test]
    fn test_bar_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.svg");
        let stations = vec![
            RankedStation {
                code: "1".to_string(),
                name: "A".to_string(),
                value: 90.0,
            },
            RankedStation {
                code: "3".to_string(),
                name: "C".to_string(),
                value: 40.0,
            },
        ];
        bar_chart(&path, "Top 2 Stations for PartyX in 2016, 2020 (Number)", &stations).unwrap();
        assert!(svg_content(&path).contains("<svg"));
    }
}

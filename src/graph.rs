//! ### Graph
//! Renders dashboard series as png charts.

use anyhow::anyhow;
use chrono::NaiveDate;
use plotters::backend::BitMapBackend;
use plotters::chart::ChartBuilder;
use plotters::chart::SeriesLabelPosition;
use plotters::drawing::IntoDrawingArea;
use plotters::element::Pie;
use plotters::prelude::IntoSegmentedCoord;
use plotters::prelude::Rectangle;
use plotters::prelude::SegmentValue;
use plotters::series::Histogram;
use plotters::series::LineSeries;
use plotters::style::full_palette::BLUE_600;
use plotters::style::Color;
use plotters::style::IntoFont;
use plotters::style::Palette;
use plotters::style::Palette99;
use plotters::style::RGBColor;
use plotters::style::BLACK;
use plotters::style::WHITE;
use std::path::Path;

use crate::record::Record;

pub struct Graphing<'a> {
    path: &'a Path,
}

impl<'a> Graphing<'a> {
    const CHART_COLOR: RGBColor = WHITE;
    const SIZE: (u32, u32) = (1080, 720);

    pub fn new(path: &'a Path) -> Self {
        Graphing { path }
    }

    fn color(idx: usize) -> RGBColor {
        let (r, g, b) = Palette99::COLORS[idx % Palette99::COLORS.len()];
        RGBColor(r, g, b)
    }

    fn segment_end(idx: usize, len: usize) -> SegmentValue<usize> {
        if idx + 1 >= len {
            SegmentValue::Last
        } else {
            SegmentValue::Exact(idx + 1)
        }
    }

    /// One line per named series over a shared list of months.
    pub fn monthly_lines(
        &self,
        months: &[NaiveDate],
        series: &[(&str, Vec<f64>)],
        title: &str,
        y_desc: &str,
    ) -> anyhow::Result<()> {
        if months.is_empty() {
            return Err(anyhow!("No months to chart for {title:?}"));
        }
        let root = BitMapBackend::new(self.path, Self::SIZE).into_drawing_area();
        root.fill(&Self::CHART_COLOR)?;

        let y_max = series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .fold(0f64, f64::max);

        let mut chart = ChartBuilder::on(&root)
            .x_label_area_size(72)
            .y_label_area_size(96)
            .margin(20)
            .caption(title, ("sans-serif", 40.))
            .build_cartesian_2d(
                0..months.len().saturating_sub(1).max(1),
                0f64..(y_max * 1.1).max(1.),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(WHITE.mix(0.3))
            .y_desc(y_desc)
            .x_desc("Month")
            .axis_desc_style(("sans-serif", 30))
            .x_label_formatter(&|&idx| {
                months
                    .get(idx)
                    .map(|d| d.format("%Y-%m").to_string())
                    .unwrap_or_default()
            })
            .x_labels(months.len().min(24))
            .y_labels(10)
            .x_label_style(("sans-serif", 16))
            .y_label_style(("sans-serif", 16))
            .draw()?;

        for (idx, (label, values)) in series.iter().enumerate() {
            let color = Self::color(idx);
            chart
                .draw_series(LineSeries::new(
                    values.iter().copied().enumerate(),
                    color.stroke_width(3),
                ))?
                .label(*label)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 16))
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Stacked bars of yearly totals per category, as produced by
    /// `aggregate::yearly_by_category`.
    pub fn stacked_mix(&self, yearly: &[Record], title: &str, y_desc: &str) -> anyhow::Result<()> {
        let mut years: Vec<i32> = yearly.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        let mut categories: Vec<&str> = yearly
            .iter()
            .map(|r| r.category.as_deref().unwrap_or("Total"))
            .collect();
        categories.sort_unstable();
        categories.dedup();
        if years.is_empty() {
            return Err(anyhow!("No years to chart for {title:?}"));
        }

        let mut stacks = vec![0f64; years.len()];
        for r in yearly {
            if let Some(idx) = years.iter().position(|&y| y == r.year) {
                stacks[idx] += r.value;
            }
        }
        let y_max = stacks.iter().copied().fold(0f64, f64::max);

        let root = BitMapBackend::new(self.path, Self::SIZE).into_drawing_area();
        root.fill(&Self::CHART_COLOR)?;

        let mut chart = ChartBuilder::on(&root)
            .x_label_area_size(72)
            .y_label_area_size(96)
            .margin(20)
            .caption(title, ("sans-serif", 40.))
            .build_cartesian_2d(
                (0..years.len().saturating_sub(1)).into_segmented(),
                0f64..(y_max * 1.1).max(1.),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .x_desc("Year")
            .axis_desc_style(("sans-serif", 30))
            .x_label_formatter(&|seg| match seg {
                SegmentValue::Last | SegmentValue::Exact(_) => "".to_string(),
                SegmentValue::CenterOf(idx) => years
                    .get(*idx)
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
            })
            .x_labels(years.len() + 1)
            .y_labels(10)
            .x_label_style(("sans-serif", 16))
            .y_label_style(("sans-serif", 16))
            .draw()?;

        let mut bases = vec![0f64; years.len()];
        for (cat_idx, category) in categories.iter().enumerate() {
            let color = Self::color(cat_idx);
            let mut bars = Vec::new();
            for r in yearly
                .iter()
                .filter(|r| r.category.as_deref().unwrap_or("Total") == *category)
            {
                let Some(idx) = years.iter().position(|&y| y == r.year) else {
                    continue;
                };
                let base = bases[idx];
                bases[idx] += r.value;
                bars.push(Rectangle::new(
                    [
                        (SegmentValue::Exact(idx), base),
                        (Self::segment_end(idx, years.len()), base + r.value),
                    ],
                    color.filled(),
                ));
            }
            chart
                .draw_series(bars)?
                .label(*category)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(("sans-serif", 16))
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// One bar per category, e.g. total emissions by source.
    pub fn category_bars(
        &self,
        totals: &[(String, f64)],
        title: &str,
        y_desc: &str,
    ) -> anyhow::Result<()> {
        if totals.is_empty() {
            return Err(anyhow!("No categories to chart for {title:?}"));
        }
        let root = BitMapBackend::new(self.path, Self::SIZE).into_drawing_area();
        root.fill(&Self::CHART_COLOR)?;

        let max_total = totals.iter().fold(0f64, |acc, (_, v)| v.max(acc));

        let mut chart = ChartBuilder::on(&root)
            .x_label_area_size(72)
            .y_label_area_size(96)
            .margin(20)
            .caption(title, ("sans-serif", 40.))
            .build_cartesian_2d(
                (0..totals.len().saturating_sub(1)).into_segmented(),
                0f64..(max_total * 1.1).max(1.),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .axis_desc_style(("sans-serif", 30))
            .x_label_formatter(&|seg| match seg {
                SegmentValue::Last | SegmentValue::Exact(_) => "".to_string(),
                SegmentValue::CenterOf(idx) => totals
                    .get(*idx)
                    .map(|(label, _)| label.clone())
                    .unwrap_or_default(),
            })
            .x_labels(totals.len() + 1)
            .y_labels(10)
            .x_label_style(("sans-serif", 16))
            .y_label_style(("sans-serif", 16))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE_600.filled())
                .margin(10)
                .data(totals.iter().enumerate().map(|(idx, (_, val))| (idx, *val))),
        )?;

        root.present()?;
        Ok(())
    }

    /// Pie of `(category, value)` slices, the latest-value snapshot.
    pub fn snapshot_pie(&self, slices: &[(String, f64)], title: &str) -> anyhow::Result<()> {
        if slices.iter().all(|(_, v)| *v <= 0.) {
            return Err(anyhow!("Nothing to chart for {title:?}"));
        }
        let root = BitMapBackend::new(self.path, Self::SIZE).into_drawing_area();
        root.fill(&Self::CHART_COLOR)?;
        let root = root.titled(title, ("sans-serif", 40))?;

        let (width, height) = root.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = f64::from(width.min(height)) * 0.35;

        let sizes: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
        let labels: Vec<&str> = slices.iter().map(|(label, _)| label.as_str()).collect();
        let colors: Vec<RGBColor> = (0..slices.len()).map(Self::color).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style(("sans-serif", 20.).into_font().color(&BLACK));
        pie.percentages(("sans-serif", radius * 0.08).into_font().color(&WHITE));
        root.draw(&pie)?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_rejected_before_drawing() {
        let path = Path::new("unused.png");
        let graph = Graphing::new(path);
        assert!(graph.monthly_lines(&[], &[], "empty", "x").is_err());
        assert!(graph.stacked_mix(&[], "empty", "x").is_err());
        assert!(graph.category_bars(&[], "empty", "x").is_err());
        assert!(graph
            .snapshot_pie(&[("Residential".to_string(), 0.)], "empty")
            .is_err());
        assert!(!path.exists());
    }

    #[test]
    fn last_segment_closes_on_last() {
        assert!(matches!(Graphing::segment_end(0, 3), SegmentValue::Exact(1)));
        assert!(matches!(Graphing::segment_end(2, 3), SegmentValue::Last));
    }
}

//! PNG charts of lab results.
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveStyle {
    Line,
    Markers,
    /// consecutive point pairs are independent segments
    Segments,
}

#[derive(Debug, Clone)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: CurveStyle,
}

impl Curve {
    pub fn line(label: impl Into<String>, x: &[f64], y: &[f64]) -> Self {
        Curve {
            label: label.into(),
            points: x.iter().copied().zip(y.iter().copied()).collect(),
            style: CurveStyle::Line,
        }
    }

    pub fn markers(label: impl Into<String>, x: &[f64], y: &[f64]) -> Self {
        Curve {
            style: CurveStyle::Markers,
            ..Curve::line(label, x, y)
        }
    }

    pub fn segments(label: impl Into<String>, segments: &[((f64, f64), (f64, f64))]) -> Self {
        Curve {
            label: label.into(),
            points: segments.iter().flat_map(|(a, b)| [*a, *b]).collect(),
            style: CurveStyle::Segments,
        }
    }

    /// Vertical line `x = x0` over `[y0, y1]`.
    pub fn vertical(label: impl Into<String>, x0: f64, y0: f64, y1: f64) -> Self {
        Curve::line(label, &[x0, x0], &[y0, y1])
    }
}

#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub size: (u32, u32),
    pub curves: Vec<Curve>,
}

/// Padded bounds of all finite points.
pub fn data_range(curves: &[Curve]) -> Option<((f64, f64), (f64, f64))> {
    let finite = curves
        .iter()
        .flat_map(|c| c.points.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite());
    let (mut x_min, mut x_max, mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in finite {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    if x_min > x_max {
        return None;
    }
    let pad = |lo: f64, hi: f64| {
        let d = if hi > lo { 0.05 * (hi - lo) } else { 1.0 };
        (lo - d, hi + d)
    };
    Some((pad(x_min, x_max), pad(y_min, y_max)))
}

fn is_finite_point((x, y): &(f64, f64)) -> bool {
    x.is_finite() && y.is_finite()
}

/// Pairs of a segments curve with both ends finite; a trailing unpaired point is dropped.
pub fn finite_segments(points: &[(f64, f64)]) -> Vec<[(f64, f64); 2]> {
    points
        .chunks_exact(2)
        .filter(|pair| pair.iter().all(is_finite_point))
        .map(|pair| [pair[0], pair[1]])
        .collect()
}

pub fn plot_chart(path: &Path, figure: &Chart) -> Result<(), Box<dyn Error>> {
    let ((x_min, x_max), (y_min, y_max)) =
        data_range(&figure.curves).ok_or("nothing to plot: no finite points")?;
    let root_area = BitMapBackend::new(path, figure.size).into_drawing_area();
    root_area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root_area)
        .caption(&figure.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(&figure.x_desc)
        .y_desc(&figure.y_desc)
        .draw()?;

    for (idx, curve) in figure.curves.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let style = color.stroke_width(2);
        let points: Vec<(f64, f64)> = curve
            .points
            .iter()
            .copied()
            .filter(is_finite_point)
            .collect();
        let annotation = match curve.style {
            CurveStyle::Line => chart.draw_series(LineSeries::new(points, style))?,
            CurveStyle::Markers => {
                chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?
            }
            CurveStyle::Segments => chart.draw_series(
                finite_segments(&curve.points)
                    .into_iter()
                    .map(|[p, q]| PathElement::new(vec![p, q], style)),
            )?,
        };
        annotation
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root_area.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_ignores_non_finite_points_and_pads() {
        let curves = vec![
            Curve::line("a", &[0.0, 1.0, 2.0], &[1.0, f64::NAN, 3.0]),
            Curve::vertical("b", 1.0, -1.0, 1.0),
        ];
        let ((x0, x1), (y0, y1)) = data_range(&curves).unwrap();
        assert!((x0 + 0.1).abs() < 1e-12 && (x1 - 2.1).abs() < 1e-12);
        assert!((y0 + 1.2).abs() < 1e-12 && (y1 - 3.2).abs() < 1e-12);
    }

    #[test]
    fn degenerate_and_empty_ranges() {
        let single = vec![Curve::markers("p", &[2.0], &[5.0])];
        assert_eq!(data_range(&single), Some(((1.0, 3.0), (4.0, 6.0))));
        assert_eq!(data_range(&[Curve::line("e", &[], &[])]), None);
    }

    #[test]
    fn segments_are_flattened_in_pairs() {
        let curve = Curve::segments("zero", &[((0.0, 0.0), (1.0, 1.0)), ((2.0, 2.0), (3.0, 3.0))]);
        assert_eq!(curve.points.len(), 4);
        assert_eq!(curve.points[2], (2.0, 2.0));
        assert_eq!(curve.style, CurveStyle::Segments);
    }

    #[test]
    fn segments_with_non_finite_ends_are_skipped() {
        let curve = Curve::segments(
            "contour",
            &[
                ((0.0, 0.0), (1.0, 1.0)),
                ((f64::NAN, 0.0), (1.0, 2.0)),
                ((1.0, 1.0), (2.0, f64::INFINITY)),
                ((2.0, 2.0), (3.0, 3.0)),
            ],
        );
        let kept = finite_segments(&curve.points);
        assert_eq!(kept, vec![[(0.0, 0.0), (1.0, 1.0)], [(2.0, 2.0), (3.0, 3.0)]]);
        assert!(finite_segments(&[(0.0, 0.0)]).is_empty());
    }
}

//! Pure chart math: pairing a fetched row with the catalog, ordering the
//! entries, and laying out scales and bar geometry in cell units.

use crate::core::catalog::{SortVector, VariableCatalog};
use crate::core::error::CorrError;
use serde::{Deserialize, Serialize};

/// Bar color bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    NonNegative,
    Negative,
}

impl Sign {
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Sign::NonNegative
        } else {
            Sign::Negative
        }
    }
}

/// A (name, value) pair prepared for plotting
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub name: String,
    pub value: f64,
    /// Position of the variable in the catalog column order
    pub column: usize,
}

impl DisplayEntry {
    pub fn sign(&self) -> Sign {
        Sign::of(self.value)
    }
}

/// Correlation value as shown in tooltips
pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// Zip a fetched row with the catalog columns and drop the selected variable.
///
/// Fails with `CatalogMismatch` when the row length differs from the column
/// count; names and values are never paired on a guess.
pub fn pair_entries(
    catalog: &VariableCatalog,
    row: &[f64],
    selected: &str,
) -> Result<Vec<DisplayEntry>, CorrError> {
    if row.len() != catalog.len() {
        return Err(CorrError::CatalogMismatch {
            row: selected.to_string(),
            expected: catalog.len(),
            actual: row.len(),
        });
    }

    Ok(catalog
        .columns()
        .iter()
        .zip(row.iter().copied())
        .enumerate()
        .filter(|(_, (name, _))| name.as_str() != selected)
        .map(|(column, (name, value))| DisplayEntry {
            name: name.clone(),
            value,
            column,
        })
        .collect())
}

/// Order entries for display.
///
/// With a sort vector the entries follow its keys ascending; otherwise they
/// are sorted by descending absolute value. Both sorts are stable, so ties
/// keep catalog order.
pub fn order_entries(entries: &mut [DisplayEntry], sort_vector: Option<&SortVector>) {
    match sort_vector {
        Some(sv) => entries.sort_by(|a, b| sv.key(a.column).total_cmp(&sv.key(b.column))),
        None => entries.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs())),
    }
}

/// Continuous scale mapping a numeric domain onto a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return r0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Round tick values covering the domain, roughly `count` of them
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        let span = hi - lo;
        if count == 0 || span <= 0.0 {
            return vec![lo];
        }

        let m = count as f64;
        let mut step = 10f64.powf((span / m).log10().floor());
        let err = m / span * step;
        if err <= 0.15 {
            step *= 10.0;
        } else if err <= 0.35 {
            step *= 5.0;
        } else if err <= 0.75 {
            step *= 2.0;
        }

        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Categorical scale dividing a range into `count` uniform bands
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    offset: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    /// `padding` is the inner padding as a fraction of the step,
    /// `outer_padding` the padding before the first and after the last band
    pub fn new(count: usize, range: (f64, f64), padding: f64, outer_padding: f64) -> Self {
        let denominator = count as f64 - padding + 2.0 * outer_padding;
        if count == 0 || denominator <= 0.0 {
            return Self {
                offset: range.0,
                step: 0.0,
                bandwidth: 0.0,
            };
        }
        let step = (range.1 - range.0) / denominator;
        Self {
            offset: range.0 + step * outer_padding,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    pub fn position(&self, index: usize) -> f64 {
        self.offset + self.step * index as f64
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Layout constants for the correlation chart, in terminal cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Minimum width reserved per entry
    pub entry_width: f64,
    /// Cells trimmed from every band to separate adjacent bars
    pub bar_gap: f64,
    /// Inner band padding as a fraction of the band step
    pub band_padding: f64,
    pub outer_padding: f64,
    /// Offset of the first band from the value axis
    pub band_start: f64,
    /// Columns reserved on the left for the value axis
    pub axis_width: f64,
    pub top_margin: f64,
    /// Rows reserved below the plot for vertical labels
    pub label_rows: f64,
    pub y_ticks: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            entry_width: 2.0,
            bar_gap: 1.0,
            band_padding: 0.0,
            outer_padding: 0.0,
            band_start: 1.0,
            axis_width: 6.0,
            top_margin: 1.0,
            label_rows: 8.0,
            y_ticks: 5,
        }
    }
}

/// Cells `[start, end)` a band covers once rasterized, at least one wide.
///
/// Painting and hit-testing both go through this, so every drawn column
/// of a bar is hoverable.
pub fn column_span(x: f64, width: f64) -> (i64, i64) {
    let start = x.round() as i64;
    let end = ((x + width).round() as i64).max(start + 1);
    (start, end)
}

/// Axis-aligned rectangle in chart coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub x: f64,
    pub width: f64,
    pub y: f64,
    pub height: f64,
    pub sign: Sign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Horizontal anchor line at a fixed correlation value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLine {
    pub value: f64,
    pub y: f64,
    pub x1: f64,
    pub x2: f64,
    pub style: LineStyle,
}

/// Values at which the reference lines are drawn
pub const REFERENCE_VALUES: [f64; 3] = [-1.0, 0.0, 1.0];

/// Fully laid-out chart for one ordered entry sequence
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    /// Total width including the value axis; may exceed the container
    pub width: f64,
    pub height: f64,
    pub plot_top: f64,
    pub plot_height: f64,
    pub axis_width: f64,
    pub value_scale: LinearScale,
    pub band_scale: BandScale,
    pub bars: Vec<BarGeometry>,
    pub hit_regions: Vec<Extent>,
    pub lines: Vec<ReferenceLine>,
    pub ticks: Vec<f64>,
}

impl ChartGeometry {
    /// Lay out `entries` in a container of `container_width` x `container_height`
    pub fn compute(
        entries: &[DisplayEntry],
        container_width: f64,
        container_height: f64,
        config: &ChartConfig,
    ) -> Self {
        let width = container_width.max(entries.len() as f64 * config.entry_width);
        let height = container_height.max(0.0);
        let plot_top = config.top_margin;
        let plot_height = (height - config.top_margin - config.label_rows).max(0.0);

        let value_scale = LinearScale::new((-1.0, 1.0), (plot_height, 0.0));
        let band_scale = BandScale::new(
            entries.len(),
            (config.band_start, (width - config.axis_width).max(config.band_start)),
            config.band_padding,
            config.outer_padding,
        );

        let bandwidth = band_scale.bandwidth();
        let bar_width = if bandwidth > config.bar_gap {
            bandwidth - config.bar_gap
        } else {
            bandwidth.min(1.0)
        };
        let zero = value_scale.map(0.0);

        let mut bars = Vec::with_capacity(entries.len());
        let mut hit_regions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let value = entry.value.clamp(-1.0, 1.0);
            let x = config.axis_width + band_scale.position(index);
            bars.push(BarGeometry {
                x,
                width: bar_width,
                y: plot_top + value_scale.map(value.max(0.0)),
                height: (zero - value_scale.map(value)).abs(),
                sign: entry.sign(),
            });
            let (start, end) = column_span(x, bar_width);
            hit_regions.push(Extent {
                x: start as f64,
                y: plot_top,
                width: (end - start) as f64,
                height: value_scale.map(-1.0),
            });
        }

        let lines = REFERENCE_VALUES
            .iter()
            .map(|&value| ReferenceLine {
                value,
                y: plot_top + value_scale.map(value),
                x1: config.axis_width,
                x2: width,
                style: if value == 0.0 {
                    LineStyle::Solid
                } else {
                    LineStyle::Dashed
                },
            })
            .collect();

        let ticks = value_scale.ticks(config.y_ticks);

        Self {
            width,
            height,
            plot_top,
            plot_height,
            axis_width: config.axis_width,
            value_scale,
            band_scale,
            bars,
            hit_regions,
            lines,
            ticks,
        }
    }

    /// Index of the band whose hit region contains the cell holding the point
    pub fn band_at(&self, x: f64, y: f64) -> Option<usize> {
        let column = x.floor();
        self.hit_regions.iter().position(|r| r.contains(column, y))
    }

    pub fn entry_count(&self) -> usize {
        self.bars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::VariableId;
    use pretty_assertions::assert_eq;

    fn catalog(list: &[&str]) -> VariableCatalog {
        VariableCatalog::new(
            list.iter().map(|s| s.to_string()).collect(),
            (0..list.len() as i64).map(VariableId::new).collect(),
        )
        .unwrap()
    }

    fn names(entries: &[DisplayEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_xyz_scenario() {
        let cat = catalog(&["X", "Y", "Z"]);
        let mut entries = pair_entries(&cat, &[1.0, 0.3, -0.7], "X").unwrap();
        order_entries(&mut entries, None);

        assert_eq!(names(&entries), vec!["Z", "Y"]);
        assert_eq!(entries[0].value, -0.7);
        assert_eq!(entries[0].sign(), Sign::Negative);
        assert_eq!(entries[1].sign(), Sign::NonNegative);
    }

    #[test]
    fn test_self_entry_always_excluded() {
        let cat = catalog(&["A", "B", "C", "D"]);
        let row = [1.0, 0.5, -0.2, 0.1];
        for selected in cat.names() {
            let entries = pair_entries(&cat, &row, selected).unwrap();
            assert_eq!(entries.len(), cat.len() - 1);
            assert!(entries.iter().all(|e| &e.name != selected));
        }
    }

    #[test]
    fn test_single_variable_catalog_yields_no_entries() {
        let cat = catalog(&["only"]);
        let entries = pair_entries(&cat, &[1.0], "only").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let cat = catalog(&["X", "Y", "Z"]);
        let err = pair_entries(&cat, &[1.0, 0.3], "X").unwrap_err();
        assert!(matches!(
            err,
            CorrError::CatalogMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_abs_sort_is_stable_and_non_increasing() {
        let cat = catalog(&["S", "A", "B", "C", "D", "E"]);
        let row = [1.0, 0.4, -0.4, 0.9, 0.4, -0.1];
        let mut first = pair_entries(&cat, &row, "S").unwrap();
        let mut second = first.clone();
        order_entries(&mut first, None);
        order_entries(&mut second, None);

        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["C", "A", "B", "D", "E"]);
        for pair in first.windows(2) {
            assert!(pair[0].value.abs() >= pair[1].value.abs());
        }
    }

    #[test]
    fn test_sort_vector_overrides_magnitude() {
        let cat = catalog(&["S", "A", "B", "C"])
            .with_sort_vector(SortVector::new(vec![0.0, 3.0, 1.0, 2.0]))
            .unwrap();
        let mut entries = pair_entries(&cat, &[1.0, 0.9, 0.1, -0.5], "S").unwrap();
        order_entries(&mut entries, cat.sort_vector());

        assert_eq!(names(&entries), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_sort_vector_ties_keep_catalog_order() {
        let cat = catalog(&["S", "A", "B", "C"])
            .with_sort_vector(SortVector::new(vec![0.0, 1.0, 1.0, 0.5]))
            .unwrap();
        let mut entries = pair_entries(&cat, &[1.0, 0.1, 0.9, 0.2], "S").unwrap();
        order_entries(&mut entries, cat.sort_vector());

        assert_eq!(names(&entries), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_linear_scale_is_inverted() {
        let scale = LinearScale::new((-1.0, 1.0), (20.0, 0.0));
        assert_eq!(scale.map(1.0), 0.0);
        assert_eq!(scale.map(-1.0), 20.0);
        assert_eq!(scale.map(0.0), 10.0);
    }

    #[test]
    fn test_value_ticks() {
        let scale = LinearScale::new((-1.0, 1.0), (20.0, 0.0));
        assert_eq!(scale.ticks(5), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_band_scale_uniform_steps() {
        let scale = BandScale::new(3, (0.0, 30.0), 0.0, 0.0);
        assert_eq!(scale.step(), 10.0);
        assert_eq!(scale.bandwidth(), 10.0);
        assert_eq!(scale.position(2), 20.0);

        let padded = BandScale::new(2, (0.0, 10.0), 0.5, 0.25);
        // step = 10 / (2 - 0.5 + 0.5)
        assert_eq!(padded.step(), 5.0);
        assert_eq!(padded.bandwidth(), 2.5);
        assert_eq!(padded.position(0), 1.25);
    }

    #[test]
    fn test_width_never_compresses_below_entry_width() {
        let labels: Vec<String> = (0..41).map(|i| format!("v{i}")).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let cat = catalog(&refs);
        let row = vec![0.5; 41];
        let entries = pair_entries(&cat, &row, "v0").unwrap();
        let config = ChartConfig::default();

        let narrow = ChartGeometry::compute(&entries, 30.0, 24.0, &config);
        assert_eq!(narrow.width, 40.0 * config.entry_width);

        let wide = ChartGeometry::compute(&entries, 200.0, 24.0, &config);
        assert_eq!(wide.width, 200.0);
    }

    #[test]
    fn test_bar_geometry_is_diverging() {
        let cat = catalog(&["X", "Y", "Z"]);
        let mut entries = pair_entries(&cat, &[1.0, 0.5, -1.0], "X").unwrap();
        order_entries(&mut entries, None);
        let config = ChartConfig {
            top_margin: 0.0,
            label_rows: 0.0,
            ..ChartConfig::default()
        };
        let geometry = ChartGeometry::compute(&entries, 40.0, 20.0, &config);

        // Z = -1.0 hangs from the zero line down to the bottom
        let z = geometry.bars[0];
        assert_eq!((z.y, z.height), (10.0, 10.0));
        assert_eq!(z.sign, Sign::Negative);

        // Y = 0.5 rises from the zero line halfway to the top
        let y = geometry.bars[1];
        assert_eq!((y.y, y.height), (5.0, 5.0));
        assert_eq!(y.sign, Sign::NonNegative);

        // hit regions span the whole plot regardless of bar height
        for region in &geometry.hit_regions {
            assert_eq!(region.height, geometry.plot_height);
        }
    }

    #[test]
    fn test_reference_lines() {
        let geometry = ChartGeometry::compute(&[], 40.0, 20.0, &ChartConfig::default());
        let styles: Vec<(f64, LineStyle)> =
            geometry.lines.iter().map(|l| (l.value, l.style)).collect();
        assert_eq!(
            styles,
            vec![
                (-1.0, LineStyle::Dashed),
                (0.0, LineStyle::Solid),
                (1.0, LineStyle::Dashed),
            ]
        );
        assert!(geometry.bars.is_empty());
        assert_eq!(geometry.ticks.len(), 5);
    }

    #[test]
    fn test_geometry_is_deterministic() {
        let cat = catalog(&["A", "B", "C", "D"]);
        let mut entries = pair_entries(&cat, &[0.2, 1.0, -0.3, 0.3], "B").unwrap();
        order_entries(&mut entries, None);
        let config = ChartConfig::default();

        let first = ChartGeometry::compute(&entries, 50.0, 30.0, &config);
        let second = ChartGeometry::compute(&entries, 50.0, 30.0, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_band_hit_testing() {
        let cat = catalog(&["X", "Y", "Z"]);
        let entries = pair_entries(&cat, &[1.0, 0.05, -0.05], "X").unwrap();
        let geometry = ChartGeometry::compute(&entries, 40.0, 20.0, &ChartConfig::default());

        let first = geometry.hit_regions[0];
        // top of the column is hoverable even though the bar is tiny
        assert_eq!(geometry.band_at(first.x, first.y), Some(0));
        assert_eq!(geometry.band_at(0.0, first.y), None);
        assert_eq!(geometry.band_at(first.x, geometry.height + 1.0), None);
    }

    #[test]
    fn test_hit_regions_match_drawn_columns() {
        // fractional band step: 21 variables squeezed into 40 columns
        let entries: Vec<DisplayEntry> = (0..20)
            .map(|i| DisplayEntry {
                name: format!("v{i}"),
                value: if i % 2 == 0 { 0.5 } else { -0.5 },
                column: i,
            })
            .collect();
        let geometry = ChartGeometry::compute(&entries, 38.0, 22.0, &ChartConfig::default());
        assert!(geometry.band_scale.step().fract() != 0.0);

        let y = geometry.plot_top;
        for (index, bar) in geometry.bars.iter().enumerate() {
            let (start, end) = column_span(bar.x, bar.width);
            for column in start..end {
                assert_eq!(geometry.band_at(column as f64, y), Some(index));
                // anywhere inside the cell counts
                assert_eq!(geometry.band_at(column as f64 + 0.9, y), Some(index));
            }
        }
    }

    #[test]
    fn test_column_span_is_never_empty() {
        assert_eq!(column_span(10.3, 0.2), (10, 11));
        assert_eq!(column_span(15.25, 1.7), (15, 17));
        assert_eq!(column_span(2.0, 3.0), (2, 5));
    }

    #[test]
    fn test_format_value_two_decimals() {
        assert_eq!(format_value(0.3), "0.30");
        assert_eq!(format_value(-0.756), "-0.76");
        assert_eq!(format_value(1.0), "1.00");
    }
}

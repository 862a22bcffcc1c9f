//! Sliding-window history for live charts
//!
//! Every refresh tick appends one label to a shared axis and one value per
//! sampled entity to that entity's CPU and memory buffers. Buffers are
//! backfilled with zeros so every chart line spans the full window from the
//! moment an entity first appears.

use std::collections::{BTreeMap, VecDeque};

use crate::model::{EntityId, Metric, Sample};

/// Number of points kept per entity and metric
pub const DEFAULT_WINDOW: usize = 20;
pub const CPU_AXIS_MAX: f64 = 100.0;
/// Memory axis upper bound while every retained value is zero
pub const MEMORY_AXIS_FLOOR: f64 = 100.0;
pub const MEMORY_HEADROOM: f64 = 1.1;
pub const NO_DATA_LABEL: &str = "No Data";

/// Fixed-capacity FIFO of metric values
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryBuffer {
    cap: usize,
    values: VecDeque<f64>,
}

impl HistoryBuffer {
    /// Buffer holding `cap` zeros
    pub fn backfilled(cap: usize) -> Self {
        let mut values = VecDeque::with_capacity(cap + 1);
        values.resize(cap, 0.0);
        Self { cap, values }
    }

    /// Push a new value, dropping the oldest beyond capacity
    pub fn push(&mut self, v: f64) {
        self.values.push_back(v);
        while self.values.len() > self.cap {
            self.values.pop_front();
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}

/// Display colors handed out to entities in first-seen order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
}

pub const PALETTE: [SeriesColor; 8] = [
    SeriesColor::Red,
    SeriesColor::Green,
    SeriesColor::Yellow,
    SeriesColor::Blue,
    SeriesColor::Magenta,
    SeriesColor::Cyan,
    SeriesColor::White,
    SeriesColor::Grey,
];

/// Entity -> color mapping. Entries are never removed, so an entity keeps its
/// color for the lifetime of the process even after it disappears.
#[derive(Clone, Debug, Default)]
pub struct ColorAssignment {
    assigned: BTreeMap<EntityId, SeriesColor>,
}

impl ColorAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing color, or `PALETTE[assigned mod P]` for a first-seen entity
    pub fn assign(&mut self, id: &str) -> SeriesColor {
        if let Some(color) = self.assigned.get(id) {
            return *color;
        }
        let color = PALETTE[self.assigned.len() % PALETTE.len()];
        self.assigned.insert(id.to_string(), color);
        color
    }

    pub fn get(&self, id: &str) -> Option<SeriesColor> {
        self.assigned.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// One line of a chart, ready for rendering. `x.len() == y.len()` always.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    /// `None` for the "No Data" placeholder
    pub color: Option<SeriesColor>,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Clone, Debug)]
pub struct TimeSeriesStore {
    window: usize,
    timestamps: VecDeque<String>,
    cpu: BTreeMap<EntityId, HistoryBuffer>,
    memory: BTreeMap<EntityId, HistoryBuffer>,
    colors: ColorAssignment,
    /// Distinct entities of the latest tick, in sample order
    latest: Vec<EntityId>,
    memory_axis_max: f64,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            timestamps: VecDeque::with_capacity(window + 1),
            cpu: BTreeMap::new(),
            memory: BTreeMap::new(),
            colors: ColorAssignment::new(),
            latest: Vec::new(),
            memory_axis_max: MEMORY_AXIS_FLOOR,
        }
    }

    /// Record one tick labelled `label`
    pub fn ingest(&mut self, label: impl Into<String>, samples: &[Sample]) {
        self.timestamps.push_back(label.into());
        while self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }

        self.latest.clear();
        for sample in samples {
            let id = &sample.entity_id;
            self.colors.assign(id);
            self.cpu
                .entry(id.clone())
                .or_insert_with(|| HistoryBuffer::backfilled(self.window))
                .push(sample.cpu_percent);
            self.memory
                .entry(id.clone())
                .or_insert_with(|| HistoryBuffer::backfilled(self.window))
                .push(sample.memory_mb);
            if !self.latest.contains(id) {
                self.latest.push(id.clone());
            }
        }

        self.memory_axis_max = self.compute_memory_axis_max();
    }

    fn compute_memory_axis_max(&self) -> f64 {
        let peak = self
            .memory
            .values()
            .filter_map(HistoryBuffer::max)
            .fold(0.0_f64, f64::max);
        if peak > 0.0 {
            peak * MEMORY_HEADROOM
        } else {
            MEMORY_AXIS_FLOOR
        }
    }

    /// Chart lines for the entities sampled in the latest tick, or a single
    /// all-zero "No Data" line when the tick carried no samples
    pub fn series_for_chart(&self, metric: Metric) -> Vec<ChartSeries> {
        let axis: Vec<String> = self.timestamps.iter().cloned().collect();
        if self.latest.is_empty() {
            return vec![ChartSeries {
                label: NO_DATA_LABEL.into(),
                color: None,
                y: vec![0.0; axis.len()],
                x: axis,
            }];
        }

        let buffers = self.buffers(metric);
        self.latest
            .iter()
            .filter_map(|id| {
                let y = buffers.get(id)?.values();
                Some(ChartSeries {
                    label: id.clone(),
                    color: self.colors.get(id),
                    x: pad_axis(&axis, y.len()),
                    y,
                })
            })
            .collect()
    }

    /// `(min, max)` of the y axis
    pub fn axis_bounds(&self, metric: Metric) -> (f64, f64) {
        match metric {
            Metric::Cpu => (0.0, CPU_AXIS_MAX),
            Metric::Memory => (0.0, self.memory_axis_max),
        }
    }

    pub fn memory_axis_max(&self) -> f64 {
        self.memory_axis_max
    }

    /// Retained buffer for `id`, including entities that stopped reporting
    pub fn history(&self, id: &str, metric: Metric) -> Option<&HistoryBuffer> {
        self.buffers(metric).get(id)
    }

    pub fn color_of(&self, id: &str) -> Option<SeriesColor> {
        self.colors.get(id)
    }

    pub fn timestamps(&self) -> Vec<String> {
        self.timestamps.iter().cloned().collect()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Entities charted after the latest tick
    pub fn latest_entities(&self) -> &[EntityId] {
        &self.latest
    }

    fn buffers(&self, metric: Metric) -> &BTreeMap<EntityId, HistoryBuffer> {
        match metric {
            Metric::Cpu => &self.cpu,
            Metric::Memory => &self.memory,
        }
    }
}

impl Default for TimeSeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Left-pad `axis` with blank labels up to `len`
fn pad_axis(axis: &[String], len: usize) -> Vec<String> {
    let pad = len.saturating_sub(axis.len());
    let skip = axis.len().saturating_sub(len);
    std::iter::repeat_n(String::new(), pad)
        .chain(axis.iter().skip(skip).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(store: &mut TimeSeriesStore, n: usize, samples: &[Sample]) {
        store.ingest(format!("t{}", n), samples);
    }

    #[test]
    fn test_history_buffer_backfill_and_eviction() {
        let mut b = HistoryBuffer::backfilled(3);
        assert_eq!(b.values(), vec![0.0, 0.0, 0.0]);
        b.push(1.0);
        b.push(2.0);
        assert_eq!(b.values(), vec![0.0, 1.0, 2.0]);
        b.push(3.0);
        b.push(4.0);
        assert_eq!(b.len(), 3);
        assert_eq!(b.values(), vec![2.0, 3.0, 4.0]);
        assert_eq!(b.latest(), Some(4.0));
        assert_eq!(b.max(), Some(4.0));
    }

    #[test]
    fn test_window_bound_and_trailing_order() {
        let mut store = TimeSeriesStore::new();
        for n in 0..35 {
            tick(&mut store, n, &[Sample::new("a", n as f64, 2.0 * n as f64)]);
            let cpu = store.history("a", Metric::Cpu).unwrap();
            let mem = store.history("a", Metric::Memory).unwrap();
            assert_eq!(cpu.len(), DEFAULT_WINDOW);
            assert_eq!(mem.len(), DEFAULT_WINDOW);

            let ingested = n + 1;
            let k = ingested.min(DEFAULT_WINDOW);
            let expected: Vec<f64> = ((ingested - k)..ingested).map(|v| v as f64).collect();
            assert_eq!(cpu.values()[DEFAULT_WINDOW - k..].to_vec(), expected);
        }
        assert_eq!(store.timestamps().len(), DEFAULT_WINDOW);
        assert_eq!(store.timestamps().first().map(String::as_str), Some("t15"));
    }

    #[test]
    fn test_series_x_and_y_align() {
        let mut store = TimeSeriesStore::new();
        for n in 0..25 {
            let samples = if n % 3 == 0 {
                vec![]
            } else {
                vec![Sample::new("a", 1.0, 1.0), Sample::new("b", 2.0, 2.0)]
            };
            tick(&mut store, n, &samples);
            for metric in [Metric::Cpu, Metric::Memory] {
                for series in store.series_for_chart(metric) {
                    assert_eq!(series.x.len(), series.y.len());
                }
            }
        }
    }

    #[test]
    fn test_x_axis_is_left_padded() {
        let mut store = TimeSeriesStore::with_window(4);
        tick(&mut store, 1, &[Sample::new("a", 5.0, 5.0)]);
        tick(&mut store, 2, &[Sample::new("a", 6.0, 6.0)]);
        let series = &store.series_for_chart(Metric::Cpu)[0];
        assert_eq!(series.x, vec!["", "", "t1", "t2"]);
        assert_eq!(series.y, vec![0.0, 0.0, 5.0, 6.0]);
    }

    #[test]
    fn test_color_stability() {
        let mut store = TimeSeriesStore::new();
        tick(&mut store, 0, &[Sample::new("a", 1.0, 1.0), Sample::new("b", 1.0, 1.0)]);
        let a = store.color_of("a").unwrap();
        let b = store.color_of("b").unwrap();
        assert_eq!(a, SeriesColor::Red);
        assert_eq!(b, SeriesColor::Green);

        for n in 1..50 {
            let samples = if n % 2 == 0 {
                vec![Sample::new(format!("other{}", n), 1.0, 1.0)]
            } else {
                vec![Sample::new("a", 1.0, 1.0)]
            };
            tick(&mut store, n, &samples);
        }
        assert_eq!(store.color_of("a"), Some(a));
        assert_eq!(store.color_of("b"), Some(b));
    }

    #[test]
    fn test_palette_wraps_in_first_seen_order() {
        let mut colors = ColorAssignment::new();
        for i in 0..PALETTE.len() {
            assert_eq!(colors.assign(&format!("e{}", i)), PALETTE[i]);
        }
        assert_eq!(colors.assign("late"), PALETTE[0]);
        assert_eq!(colors.assign("e3"), PALETTE[3]);
        assert_eq!(colors.len(), PALETTE.len() + 1);
    }

    #[test]
    fn test_memory_axis_floor_when_all_zero() {
        let mut store = TimeSeriesStore::new();
        assert_eq!(store.memory_axis_max(), MEMORY_AXIS_FLOOR);
        tick(&mut store, 0, &[Sample::new("a", 50.0, 0.0)]);
        tick(&mut store, 1, &[Sample::new("a", 50.0, 0.0)]);
        assert_eq!(store.memory_axis_max(), 100.0);
        assert_eq!(store.axis_bounds(Metric::Cpu), (0.0, 100.0));
    }

    #[test]
    fn test_memory_axis_keeps_retained_peak() {
        let mut store = TimeSeriesStore::new();
        tick(&mut store, 0, &[Sample::new("a", 0.0, 500.0)]);
        tick(&mut store, 1, &[Sample::new("a", 0.0, 10.0)]);
        tick(&mut store, 2, &[Sample::new("a", 0.0, 20.0)]);
        assert!((store.memory_axis_max() - 550.0).abs() < 1e-9);
        assert_eq!(store.axis_bounds(Metric::Memory).1, store.memory_axis_max());
    }

    #[test]
    fn test_vanished_entity_freezes() {
        let mut store = TimeSeriesStore::new();
        tick(&mut store, 1, &[Sample::new("a", 10.0, 100.0), Sample::new("b", 20.0, 50.0)]);
        let b_before = store.history("b", Metric::Cpu).unwrap().clone();
        tick(&mut store, 2, &[Sample::new("a", 15.0, 120.0)]);

        let mut expected_cpu = vec![0.0; 18];
        expected_cpu.extend([10.0, 15.0]);
        let mut expected_mem = vec![0.0; 18];
        expected_mem.extend([100.0, 120.0]);
        assert_eq!(store.history("a", Metric::Cpu).unwrap().values(), expected_cpu);
        assert_eq!(store.history("a", Metric::Memory).unwrap().values(), expected_mem);

        let b_after = store.history("b", Metric::Cpu).unwrap();
        assert_eq!(b_after, &b_before);
        assert_eq!(b_after.latest(), Some(20.0));
        assert_eq!(store.history("b", Metric::Memory).unwrap().latest(), Some(50.0));

        assert!((store.memory_axis_max() - 132.0).abs() < 1e-9);

        let cpu = store.series_for_chart(Metric::Cpu);
        assert_eq!(cpu.len(), 1);
        assert_eq!(cpu[0].label, "a");
        assert_eq!(cpu[0].y, expected_cpu);
    }

    #[test]
    fn test_no_data_series_for_empty_ticks() {
        let mut store = TimeSeriesStore::new();
        for n in 0..3 {
            tick(&mut store, n, &[]);
            for metric in [Metric::Cpu, Metric::Memory] {
                let series = store.series_for_chart(metric);
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].label, NO_DATA_LABEL);
                assert_eq!(series[0].color, None);
                assert_eq!(series[0].x.len(), n + 1);
                assert_eq!(series[0].y, vec![0.0; n + 1]);
            }
        }
        assert_eq!(store.memory_axis_max(), MEMORY_AXIS_FLOOR);
    }

    #[test]
    fn test_duplicate_samples_chart_once() {
        let mut store = TimeSeriesStore::new();
        tick(&mut store, 0, &[Sample::new("a", 1.0, 1.0), Sample::new("a", 2.0, 2.0)]);
        let series = store.series_for_chart(Metric::Cpu);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].y.last().copied(), Some(2.0));
    }
}

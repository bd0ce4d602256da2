use std::time::{Duration, Instant};

use scheduler::Debouncer;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSpec {
    pub cols: usize,
    pub rows: usize,
}

/// Near-square layout: `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`.
pub fn compute_grid(count: usize) -> GridSpec {
    if count == 0 {
        return GridSpec { cols: 0, rows: 0 };
    }
    let cols = ceil_sqrt(count);
    GridSpec {
        cols,
        rows: count.div_ceil(cols),
    }
}

fn ceil_sqrt(value: usize) -> usize {
    let mut root = (value as f64).sqrt() as usize;
    while root.saturating_mul(root) < value {
        root += 1;
    }
    while root > 1 && (root - 1).saturating_mul(root - 1) >= value {
        root -= 1;
    }
    root
}

/// Receives the column/row templates of a CSS-grid-like container.
pub trait GridContainer {
    fn set_template(&mut self, columns: &str, rows: &str);
    fn clear_template(&mut self);
}

/// Container that just remembers the last template it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssGrid {
    pub columns: String,
    pub rows: String,
}

impl GridContainer for CssGrid {
    fn set_template(&mut self, columns: &str, rows: &str) {
        self.columns = columns.to_string();
        self.rows = rows.to_string();
    }

    fn clear_template(&mut self) {
        self.columns.clear();
        self.rows.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridStats {
    pub item_count: usize,
    pub cols: usize,
    pub rows: usize,
    pub total_cells: usize,
    pub empty_cells: usize,
    pub initialized: bool,
}

/// Applies `compute_grid` to a container and re-applies it once a burst of
/// viewport resizes has settled.
#[derive(Debug)]
pub struct GridSizer<C: GridContainer> {
    container: C,
    count: usize,
    initialized: bool,
    resize: Debouncer,
}

impl<C: GridContainer> GridSizer<C> {
    pub fn new(container: C, debounce: Duration) -> Self {
        Self {
            container,
            count: 0,
            initialized: false,
            resize: Debouncer::new(debounce),
        }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn grid(&self) -> GridSpec {
        compute_grid(self.count)
    }

    pub fn apply(&mut self, count: usize) {
        self.count = count;
        if count == 0 {
            self.container.clear_template();
            self.initialized = false;
            debug!("grid cleared");
            return;
        }

        let GridSpec { cols, rows } = compute_grid(count);
        self.container
            .set_template(&format!("repeat({cols}, 1fr)"), &format!("repeat({rows}, 1fr)"));
        self.initialized = true;
        info!(cols, rows, items = count, "grid updated");
    }

    /// Records a viewport resize; recomputation waits for `tick`.
    pub fn on_resize(&mut self, now: Instant) {
        self.resize.trigger(now);
    }

    /// Re-applies the layout once resizes have been quiet for the debounce
    /// window. Returns whether a recomputation ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.resize.poll(now) || !self.initialized {
            return false;
        }
        self.apply(self.count);
        true
    }

    pub fn resize_pending(&self) -> bool {
        self.resize.is_pending()
    }

    pub fn stats(&self) -> GridStats {
        let GridSpec { cols, rows } = self.grid();
        let total_cells = cols * rows;
        GridStats {
            item_count: self.count,
            cols,
            rows,
            total_cells,
            empty_cells: total_cells - self.count,
            initialized: self.initialized,
        }
    }

    pub fn destroy(&mut self) {
        self.resize.cancel();
        self.container.clear_template();
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_counts_map_to_expected_grids() {
        let cases = [(0, 0, 0), (1, 1, 1), (4, 2, 2), (5, 3, 2), (9, 3, 3), (10, 4, 3)];
        for (count, cols, rows) in cases {
            assert_eq!(compute_grid(count), GridSpec { cols, rows }, "count {count}");
        }
    }

    #[test]
    fn grid_always_has_room() {
        for count in 0..2_000 {
            let GridSpec { cols, rows } = compute_grid(count);
            assert!(cols * rows >= count, "count {count}");
            if count > 0 {
                assert!(cols >= rows);
                assert!((cols - 1) * (cols - 1) < count);
            }
        }
    }

    #[test]
    fn apply_writes_repeat_templates() {
        let mut sizer = GridSizer::new(CssGrid::default(), Duration::from_millis(250));
        sizer.apply(5);
        assert_eq!(sizer.container().columns, "repeat(3, 1fr)");
        assert_eq!(sizer.container().rows, "repeat(2, 1fr)");

        sizer.apply(0);
        assert_eq!(sizer.container(), &CssGrid::default());
        assert!(!sizer.stats().initialized);
    }

    #[test]
    fn resize_burst_recomputes_once() {
        #[derive(Default)]
        struct Counting {
            sets: usize,
        }
        impl GridContainer for Counting {
            fn set_template(&mut self, _columns: &str, _rows: &str) {
                self.sets += 1;
            }
            fn clear_template(&mut self) {}
        }

        let start = Instant::now();
        let mut sizer = GridSizer::new(Counting::default(), Duration::from_millis(250));
        sizer.apply(3);
        for offset in [0, 50, 100, 200] {
            sizer.on_resize(start + Duration::from_millis(offset));
            assert!(!sizer.tick(start + Duration::from_millis(offset)));
        }
        assert_eq!(sizer.container().sets, 1);
        assert!(!sizer.tick(start + Duration::from_millis(449)));
        assert!(sizer.tick(start + Duration::from_millis(450)));
        assert!(!sizer.tick(start + Duration::from_millis(900)));
        assert_eq!(sizer.container().sets, 2);
    }

    #[test]
    fn resize_before_first_layout_is_ignored() {
        let start = Instant::now();
        let mut sizer = GridSizer::new(CssGrid::default(), Duration::from_millis(10));
        sizer.on_resize(start);
        assert!(!sizer.tick(start + Duration::from_millis(20)));
        assert_eq!(sizer.container(), &CssGrid::default());
        assert!(!sizer.resize_pending());
    }

    #[test]
    fn stats_report_empty_cells() {
        let mut sizer = GridSizer::new(CssGrid::default(), Duration::from_millis(250));
        sizer.apply(7);
        assert_eq!(
            sizer.stats(),
            GridStats {
                item_count: 7,
                cols: 3,
                rows: 3,
                total_cells: 9,
                empty_cells: 2,
                initialized: true,
            }
        );
    }

    #[test]
    fn destroy_cancels_pending_resize() {
        let start = Instant::now();
        let mut sizer = GridSizer::new(CssGrid::default(), Duration::from_millis(250));
        sizer.apply(4);
        sizer.on_resize(start);
        sizer.destroy();
        assert!(!sizer.tick(start + Duration::from_secs(1)));
        assert_eq!(sizer.container(), &CssGrid::default());
    }
}

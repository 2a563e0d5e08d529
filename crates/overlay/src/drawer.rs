//! The overlay drawer: owns an object list, decides what to draw and
//! paints it onto three layers (primary, select, highlight).
//!
//! Small draws complete synchronously. A `VeryLarge` draw becomes a
//! [`DrawTask`] that paints one chunk per [`Drawer::step`], so a host event
//! loop (or [`Drawer::drive`] under tokio) can interleave other work.
//! Replacing the data or the view cancels the pending task.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use projection::CoordConverter;
use sky_common::{Color, Pt};
use tracing::{debug, error, info};

use crate::config::{DataType, DrawerConfig};
use crate::decimate::{decimate, DecimateParams, Decimator};
use crate::error::{DrawError, Result};
use crate::paint::{draw_object, viewport_point};
use crate::shape::{Connector, OverlayObject, Shape};
use crate::surface::DrawSurface;

static DRAWER_COUNT: AtomicU64 = AtomicU64::new(0);

/// The three independently cleared drawing layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Primary,
    Select,
    Highlight,
}

/// Result of advancing a chunked draw by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// More chunks remain.
    Continue,
    /// Nothing left to draw (or the cycle was aborted).
    Done,
    Canceled,
}

/// A cooperative, cancelable draw over a snapshot of the object list.
pub struct DrawTask {
    drawer_id: u64,
    data: Arc<Vec<OverlayObject>>,
    next: usize,
    max_chunk: usize,
    generation: u64,
    live_generation: Arc<AtomicU64>,
    canceled: Arc<AtomicBool>,
    converter: Arc<CoordConverter>,
    default_color: Color,
    connector: Option<Connector>,
    last_center: Option<Pt>,
    chunks: usize,
    optimized_chunks: usize,
}

struct Chunk {
    indices: Vec<usize>,
    optimize: bool,
}

impl DrawTask {
    /// Flag that cancels this task when set. Safe to share with other
    /// threads.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.canceled)
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// (objects consumed, objects total)
    pub fn progress(&self) -> (usize, usize) {
        (self.next, self.data.len())
    }

    pub fn chunks_drawn(&self) -> usize {
        self.chunks
    }

    /// Draw the next chunk onto `surface`.
    ///
    /// Fails with [`DrawError::ConcurrentModification`] when the drawer's
    /// data was swapped after this task took its snapshot.
    pub fn step<S: DrawSurface + ?Sized>(&mut self, surface: &mut S) -> Result<TaskStatus> {
        if self.is_canceled() {
            return Ok(TaskStatus::Canceled);
        }
        let live = self.live_generation.load(Ordering::SeqCst);
        if live != self.generation {
            return Err(DrawError::ConcurrentModification {
                expected: self.generation,
                found: live,
            });
        }
        if self.next >= self.data.len() {
            return Ok(TaskStatus::Done);
        }

        let chunk = self.next_chunk();
        if chunk.optimize {
            self.draw_chunk_optimized(&chunk.indices, surface);
            self.optimized_chunks += 1;
        } else {
            self.draw_chunk_normal(&chunk.indices, surface);
        }
        self.chunks += 1;

        if self.next >= self.data.len() {
            debug!(
                drawer = self.drawer_id,
                objects = self.data.len(),
                chunks = self.chunks,
                optimized = self.optimized_chunks,
                "Draw cycle complete"
            );
            Ok(TaskStatus::Done)
        } else {
            Ok(TaskStatus::Continue)
        }
    }

    /// Collect up to `max_chunk` drawable objects. Without a connector only
    /// visible objects count toward the chunk, and the chunk is batched into
    /// one path when every object shares color and a non-zero width.
    fn next_chunk(&mut self) -> Chunk {
        let data = Arc::clone(&self.data);
        let mut indices = Vec::with_capacity(self.max_chunk.min(data.len() - self.next));
        let mut optimize = self.connector.is_none();
        let mut style: Option<(Color, u32)> = None;

        while self.next < data.len() && indices.len() < self.max_chunk {
            let idx = self.next;
            self.next += 1;
            let obj = &data[idx];

            if self.connector.is_some() {
                indices.push(idx);
                continue;
            }
            if !should_draw(&self.converter, obj) {
                continue;
            }
            let color = obj.display_color(self.default_color, false);
            let (first_color, first_width) = *style.get_or_insert((color, obj.line_width));
            if optimize {
                optimize = obj.can_use_path_optimization()
                    && first_width > 0
                    && first_width == obj.line_width
                    && first_color == color;
            }
            indices.push(idx);
        }

        Chunk {
            optimize: optimize && !indices.is_empty(),
            indices,
        }
    }

    fn draw_chunk_optimized<S: DrawSurface + ?Sized>(&self, indices: &[usize], surface: &mut S) {
        let Some(&first) = indices.first() else {
            return;
        };
        let head = &self.data[first];
        surface.begin_path(head.display_color(self.default_color, false), head.line_width);
        for &idx in indices {
            let obj = &self.data[idx];
            draw_object(surface, &self.converter, obj, obj.display_color(self.default_color, false), true);
        }
        surface.draw_path();
    }

    fn draw_chunk_normal<S: DrawSurface + ?Sized>(&mut self, indices: &[usize], surface: &mut S) {
        for &idx in indices {
            let obj = &self.data[idx];
            let color = obj.display_color(self.default_color, false);
            draw_object(surface, &self.converter, obj, color, false);
            if let Some(connector) = self.connector {
                if let Some(last) = self.last_center {
                    draw_connector(
                        surface,
                        &self.converter,
                        &connector,
                        connector.color.unwrap_or(color),
                        &last,
                        &obj.center,
                    );
                }
                self.last_center = Some(obj.center);
            }
        }
    }
}

/// Points placed by world position are drawn only when they land in the
/// viewport; everything else is attempted.
fn should_draw(cc: &CoordConverter, obj: &OverlayObject) -> bool {
    match (&obj.shape, &obj.center) {
        (Shape::Point { .. }, Pt::World(_)) => cc.point_in_viewport(&obj.center),
        _ => true,
    }
}

fn draw_connector<S: DrawSurface + ?Sized>(
    surface: &mut S,
    cc: &CoordConverter,
    connector: &Connector,
    color: Color,
    from: &Pt,
    to: &Pt,
) {
    if let (Some(a), Some(b)) = (cc.to_world(from), cc.to_world(to)) {
        if cc.coords_wrap(&a, &b) {
            return;
        }
    }
    let (Some(p1), Some(p2)) = (viewport_point(cc, from), viewport_point(cc, to)) else {
        return;
    };
    surface.begin_path(color, connector.line_width);
    surface.move_to(p1.x, p1.y);
    surface.line_to(p2.x, p2.y);
    surface.draw_path();
}

/// Draws a list of overlay objects over an image.
pub struct Drawer<S: DrawSurface> {
    id: u64,
    config: DrawerConfig,
    data_type: DataType,
    connector: Option<Connector>,
    converter: Option<Arc<CoordConverter>>,
    data: Option<Arc<Vec<OverlayObject>>>,
    highlight_data: Vec<OverlayObject>,
    generation: Arc<AtomicU64>,
    primary: S,
    select: S,
    highlight: S,
    visible: bool,
    selected_found: bool,
    decimator: Decimator,
    task: Option<DrawTask>,
    pending_task: bool,
    last_error: Option<DrawError>,
}

impl<S: DrawSurface> Drawer<S> {
    pub fn new(config: DrawerConfig, primary: S, select: S, highlight: S) -> Self {
        Self {
            id: DRAWER_COUNT.fetch_add(1, Ordering::Relaxed),
            config,
            data_type: DataType::Normal,
            connector: None,
            converter: None,
            data: None,
            highlight_data: Vec::new(),
            generation: Arc::new(AtomicU64::new(0)),
            primary,
            select,
            highlight,
            visible: true,
            selected_found: false,
            decimator: Decimator::new(),
            task: None,
            pending_task: false,
            last_error: None,
        }
    }

    /// Process-unique id used in log fields.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    pub fn layer(&self, layer: Layer) -> &S {
        match layer {
            Layer::Primary => &self.primary,
            Layer::Select => &self.select,
            Layer::Highlight => &self.highlight,
        }
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut S {
        match layer {
            Layer::Primary => &mut self.primary,
            Layer::Select => &mut self.select,
            Layer::Highlight => &mut self.highlight,
        }
    }

    pub fn data(&self) -> Option<&Arc<Vec<OverlayObject>>> {
        self.data.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while a chunked draw has chunks left.
    pub fn is_drawing(&self) -> bool {
        self.task.is_some()
    }

    /// True while a draw big enough to warrant a progress indicator runs.
    pub fn has_pending_task(&self) -> bool {
        self.pending_task
    }

    /// Error that aborted the most recent draw cycle, if any.
    pub fn last_error(&self) -> Option<&DrawError> {
        self.last_error.as_ref()
    }

    /// Cancel flag of the running chunked draw.
    pub fn cancel_handle(&self) -> Option<Arc<AtomicBool>> {
        self.task.as_ref().map(DrawTask::cancel_flag)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub fn set_connector(&mut self, connector: Option<Connector>) {
        self.connector = connector;
    }

    pub fn set_decimation_enabled(&mut self, enabled: bool) {
        self.config.decimate = enabled;
    }

    pub fn set_default_color(&mut self, color: Color) {
        self.config.default_color = color;
    }

    /// Install a new view. Cancels any pending draw and redraws.
    pub fn set_view(&mut self, converter: CoordConverter) {
        self.converter = Some(Arc::new(converter));
        self.decimator.invalidate();
        self.cancel_redraw();
        self.redraw();
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Replace the object list wholesale and redraw.
    pub fn set_data(&mut self, data: Vec<OverlayObject>) {
        self.cancel_redraw();
        self.swap_data(data);
        self.redraw();
    }

    /// Replace the object list and repaint only the objects at `changed`
    /// on the primary layer. A chunked draw still reading the old list
    /// aborts at its next step.
    pub fn set_data_delta(&mut self, data: Vec<OverlayObject>, changed: &[usize]) {
        self.swap_data(data);
        let (Some(cc), Some(data)) = (self.converter.clone(), self.data.clone()) else {
            return;
        };
        if !self.can_draw() {
            return;
        }
        for &idx in changed {
            if let Some(obj) = data.get(idx) {
                let color = obj.display_color(self.config.default_color, true);
                draw_object(&mut self.primary, &cc, obj, color, false);
            }
        }
    }

    /// Replace the object list (with new selection flags) and repaint the
    /// select layer.
    pub fn update_select_layer(&mut self, data: Vec<OverlayObject>) {
        self.swap_data(data);
        self.redraw_selected(true);
    }

    /// Repaint the highlight layer with `highlight`.
    pub fn update_highlight_layer(&mut self, highlight: Vec<OverlayObject>) {
        self.highlight_data = highlight;
        self.redraw_highlight();
    }

    pub fn clear_select_layer(&mut self) {
        self.select.clear();
    }

    pub fn clear_highlight_layer(&mut self) {
        self.highlight.clear();
    }

    /// Drop the data and blank every layer.
    pub fn clear(&mut self) {
        self.data = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_redraw();
        self.decimator.invalidate();
        self.clear_layers();
        self.pending_task = false;
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.cancel_redraw();
            self.redraw();
        }
    }

    /// Mark the pending chunked draw canceled; its next step is a no-op.
    pub fn cancel_redraw(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            debug!(drawer = self.id, "Canceled pending draw");
        }
        self.pending_task = false;
    }

    fn swap_data(&mut self, data: Vec<OverlayObject>) {
        self.decimator.invalidate();
        self.data = Some(Arc::new(data));
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn can_draw(&self) -> bool {
        self.visible
            && self.converter.is_some()
            && self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    fn clear_layers(&mut self) {
        self.primary.clear();
        self.select.clear();
        self.highlight.clear();
    }

    // ------------------------------------------------------------------
    // Redraw
    // ------------------------------------------------------------------

    /// Redraw all three layers.
    pub fn redraw(&mut self) {
        self.redraw_primary();
        self.redraw_highlight();
        self.redraw_selected(false);
    }

    fn redraw_primary(&mut self) {
        self.clear_layers();
        if !self.can_draw() {
            self.pending_task = false;
            return;
        }
        let (Some(cc), Some(data)) = (self.converter.clone(), self.data.clone()) else {
            return;
        };

        let draw_data = if self.config.decimate {
            let params = DecimateParams::from_config(&self.config, self.config.colormap);
            self.decimator.decimate(&data, &cc, &params)
        } else {
            Arc::clone(&data)
        };

        let chunked =
            self.data_type == DataType::VeryLarge && data.len() > self.config.very_large_threshold;
        let max_chunk = if chunked {
            let points = draw_data.first().is_some_and(OverlayObject::is_point);
            self.config.chunk_size(points, self.primary.is_optimized())
        } else {
            usize::MAX
        };

        debug!(
            drawer = self.id,
            objects = data.len(),
            drawn = draw_data.len(),
            chunked,
            max_chunk,
            "Redraw primary"
        );

        if let Some(old) = self.task.take() {
            old.cancel();
        }
        self.last_error = None;
        let task = DrawTask {
            drawer_id: self.id,
            data: Arc::clone(&draw_data),
            next: 0,
            max_chunk,
            generation: self.generation.load(Ordering::SeqCst),
            live_generation: Arc::clone(&self.generation),
            canceled: Arc::new(AtomicBool::new(false)),
            converter: cc,
            default_color: self.config.default_color,
            connector: self.connector,
            last_center: None,
            chunks: 0,
            optimized_chunks: 0,
        };
        self.task = Some(task);

        if chunked {
            self.pending_task = draw_data.len() > self.config.task_threshold;
        } else {
            self.run_to_completion();
        }
    }

    fn redraw_selected(&mut self, force: bool) {
        if !force && !self.selected_found {
            return;
        }
        self.select.clear();
        if !self.can_draw() {
            return;
        }
        let (Some(cc), Some(data)) = (self.converter.clone(), self.data.clone()) else {
            return;
        };

        let selected: Vec<OverlayObject> = data.iter().filter(|o| o.selected).cloned().collect();
        let selected = if self.config.decimate {
            decimate(&selected, &cc, &DecimateParams::from_config(&self.config, false))
        } else {
            selected
        };
        for obj in &selected {
            let color = obj.display_color(self.config.default_color, true);
            draw_object(&mut self.select, &cc, obj, color, false);
        }
        self.selected_found = !selected.is_empty();
    }

    fn redraw_highlight(&mut self) {
        self.highlight.clear();
        if self.highlight_data.is_empty() || !self.visible {
            return;
        }
        let Some(cc) = self.converter.clone() else {
            return;
        };
        for obj in &self.highlight_data {
            let color = obj.display_color(self.config.default_color, true);
            draw_object(&mut self.highlight, &cc, obj, color, false);
        }
    }

    // ------------------------------------------------------------------
    // Chunk driver
    // ------------------------------------------------------------------

    /// Draw the next chunk of the pending primary draw.
    pub fn step(&mut self) -> TaskStatus {
        let Some(task) = self.task.as_mut() else {
            return TaskStatus::Done;
        };
        let status = match task.step(&mut self.primary) {
            Ok(status) => status,
            Err(e) => {
                let size = self.data.as_ref().map_or(0, |d| d.len());
                error!(drawer = self.id, size, error = %e, "Draw cycle aborted");
                self.last_error = Some(e);
                TaskStatus::Done
            }
        };
        if status != TaskStatus::Continue {
            if let Some(task) = self.task.take() {
                if status == TaskStatus::Done && self.pending_task {
                    info!(
                        drawer = self.id,
                        objects = task.progress().1,
                        chunks = task.chunks_drawn(),
                        "Large draw finished"
                    );
                }
            }
            self.pending_task = false;
        }
        status
    }

    /// Run the pending draw to the end without yielding.
    pub fn run_to_completion(&mut self) -> TaskStatus {
        loop {
            match self.step() {
                TaskStatus::Continue => continue,
                status => return status,
            }
        }
    }

    /// Run the pending draw, yielding to the tokio scheduler between
    /// chunks.
    pub async fn drive(&mut self) -> TaskStatus {
        loop {
            match self.step() {
                TaskStatus::Continue => tokio::task::yield_now().await,
                status => return status,
            }
        }
    }
}

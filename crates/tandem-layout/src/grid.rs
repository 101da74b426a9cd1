#![forbid(unsafe_code)]

//! Grid cell placement.
//!
//! [`GridProcessor`] resolves the ordered children of a grid and their
//! column and row spans into a dense, minimal cell matrix.
//!
//! # Algorithm
//!
//! Placement works in *flow* coordinates: the flow axis is bounded by the
//! declared size (columns for horizontal grids, rows for vertical ones), and
//! lines grow without bound along the other axis.
//!
//! 1. Walk children in order with a cursor that starts at `(0, 0)`.
//! 2. Clamp the flow span to the remainder of the line, then truncate it at
//!    the first cell already claimed in the current line. Earlier children
//!    always win and are never moved.
//! 3. Claim the rectangle and advance the cursor to the next unclaimed cell.
//! 4. Remove every line identical to the line before it, then every flow
//!    position identical to the one before it. Each removal shrinks the span
//!    of every cell crossing it by one and folds its extent into the
//!    surviving neighbour.
//! 5. Trim trailing empty positions and lines.
//!
//! The result is reported in real (column, row) coordinates regardless of
//! orientation.
//!
//! # Invariants
//!
//! - Every placed child owns at least one cell, and its cells form a
//!   rectangle whose top-left cell is its origin.
//! - No trailing column or row of the result is entirely empty.
//! - Spans reported at origins are effective (post-truncation, post-reduction).

use std::collections::BTreeMap;
use std::fmt;

use tandem_core::{
    ComponentId, ComponentTree, Extent, GridSpan, InvalidSpan, LayoutData, Orientation,
    PropertyName, PropertyValue, SpanAxis,
};

/// One child as seen by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridChild {
    pub component: ComponentId,
    pub column_span: GridSpan,
    pub row_span: GridSpan,
}

impl GridChild {
    #[must_use]
    pub fn new(component: ComponentId) -> Self {
        Self {
            component,
            column_span: GridSpan::ONE,
            row_span: GridSpan::ONE,
        }
    }

    /// Take spans from layout data (single cell when absent).
    #[must_use]
    pub fn from_layout_data(component: ComponentId, data: Option<&LayoutData>) -> Self {
        data.map_or_else(
            || Self::new(component),
            |data| Self {
                component,
                column_span: data.column_span,
                row_span: data.row_span,
            },
        )
    }

    fn validate(&self) -> Result<(), GridError> {
        for (axis, span) in [
            (SpanAxis::Column, self.column_span),
            (SpanAxis::Row, self.row_span),
        ] {
            if span == GridSpan::Cells(0) {
                return Err(GridError::InvalidSpan {
                    component: self.component,
                    source: InvalidSpan { axis, value: 0 },
                });
            }
        }
        Ok(())
    }
}

/// Input to the processor, detached from any tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSpec {
    /// Declared flow size; 0 lays all children out on a single line.
    pub size: usize,
    pub orientation: Orientation,
    pub children: Vec<GridChild>,
    pub column_widths: BTreeMap<usize, Extent>,
    pub row_heights: BTreeMap<usize, Extent>,
}

impl GridSpec {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Read a grid component: `Size`, `Orientation`, indexed extents, and the
    /// layout data of every visible child.
    pub fn from_tree(tree: &ComponentTree, grid: ComponentId) -> Result<Self, GridError> {
        if !tree.contains(grid) {
            return Err(GridError::MissingComponent { id: grid });
        }
        let size = match tree.property(grid, &PropertyName::Size) {
            Some(PropertyValue::Int(raw)) => {
                usize::try_from(*raw).map_err(|_| GridError::InvalidSize { grid, size: *raw })?
            }
            _ => 0,
        };
        let orientation = tree
            .property(grid, &PropertyName::Orientation)
            .and_then(PropertyValue::as_orientation)
            .unwrap_or_default();

        let mut column_widths = BTreeMap::new();
        let mut row_heights = BTreeMap::new();
        for (name, value) in tree.properties(grid) {
            let Some(extent) = value.as_extent() else {
                continue;
            };
            match name {
                PropertyName::ColumnWidth(index) => {
                    let _ = column_widths.insert(usize::from(*index), extent);
                }
                PropertyName::RowHeight(index) => {
                    let _ = row_heights.insert(usize::from(*index), extent);
                }
                _ => {}
            }
        }

        let children = tree
            .visible_children(grid)
            .map(|child| GridChild::from_layout_data(child, tree.layout_data(child)))
            .collect();

        Ok(Self {
            size,
            orientation,
            children,
            column_widths,
            row_heights,
        })
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: GridChild) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child with raw spans.
    pub fn with_spans(
        mut self,
        component: ComponentId,
        column_span: i32,
        row_span: i32,
    ) -> Result<Self, GridError> {
        let span = |axis, raw| {
            GridSpan::new(axis, raw).map_err(|source| GridError::InvalidSpan { component, source })
        };
        self.children.push(GridChild {
            component,
            column_span: span(SpanAxis::Column, column_span)?,
            row_span: span(SpanAxis::Row, row_span)?,
        });
        Ok(self)
    }

    #[must_use]
    pub fn with_column_width(mut self, index: usize, width: Extent) -> Self {
        let _ = self.column_widths.insert(index, width);
        self
    }

    #[must_use]
    pub fn with_row_height(mut self, index: usize, height: Extent) -> Self {
        let _ = self.row_heights.insert(index, height);
        self
    }

    fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    /// Extents along the flow axis and along the line axis.
    fn flow_extents(&self) -> (&BTreeMap<usize, Extent>, &BTreeMap<usize, Extent>) {
        if self.is_vertical() {
            (&self.row_heights, &self.column_widths)
        } else {
            (&self.column_widths, &self.row_heights)
        }
    }

    /// Spans as (flow, line).
    fn flow_spans(&self, child: &GridChild) -> (GridSpan, GridSpan) {
        if self.is_vertical() {
            (child.row_span, child.column_span)
        } else {
            (child.column_span, child.row_span)
        }
    }
}

/// A placed child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub component: ComponentId,
    /// Position in the processed child list.
    pub index: usize,
    pub column: usize,
    pub row: usize,
    pub column_span: u16,
    pub row_span: u16,
}

/// What occupies one matrix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSlot<'a> {
    Empty,
    /// Top-left cell of a child.
    Origin(&'a GridCell),
    /// Covered by a span whose origin lies elsewhere.
    Covered(&'a GridCell),
}

/// Resolved cell matrix of one grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridProcessor {
    x_size: usize,
    y_size: usize,
    /// Row-major, `y * x_size + x`; values index `cells`.
    slots: Vec<Option<usize>>,
    cells: Vec<GridCell>,
    column_widths: Vec<Option<Extent>>,
    row_heights: Vec<Option<Extent>>,
}

impl GridProcessor {
    /// Resolve a grid component of `tree`.
    pub fn new(tree: &ComponentTree, grid: ComponentId) -> Result<Self, GridError> {
        Self::compute(&GridSpec::from_tree(tree, grid)?)
    }

    /// Resolve a detached grid description.
    pub fn compute(spec: &GridSpec) -> Result<Self, GridError> {
        for child in &spec.children {
            child.validate()?;
        }
        if spec.children.is_empty() {
            return Ok(Self::empty());
        }

        // Columns past the sum of all flow spans would be trimmed anyway.
        let needed: usize = spec
            .children
            .iter()
            .map(|child| match spec.flow_spans(child).0 {
                GridSpan::Cells(n) => usize::from(n),
                GridSpan::Fill => 1,
            })
            .sum();
        let width = if spec.size == 0 {
            needed
        } else {
            spec.size.min(needed)
        };

        let mut matrix = FlowMatrix::new(width);
        matrix.place(spec);
        let (flow_extents, line_extents) = spec.flow_extents();
        matrix.flow_extents = (0..matrix.width)
            .map(|i| flow_extents.get(&i).copied())
            .collect();
        matrix.line_extents = (0..matrix.height)
            .map(|i| line_extents.get(&i).copied())
            .collect();
        matrix.reduce_lines();
        matrix.reduce_positions();
        matrix.trim();

        let grid = matrix.into_real(spec);
        tracing::trace!(
            children = spec.children.len(),
            x_size = grid.x_size,
            y_size = grid.y_size,
            "grid resolved"
        );
        Ok(grid)
    }

    fn empty() -> Self {
        Self {
            x_size: 0,
            y_size: 0,
            slots: Vec::new(),
            cells: Vec::new(),
            column_widths: Vec::new(),
            row_heights: Vec::new(),
        }
    }

    #[must_use]
    pub const fn grid_x_size(&self) -> usize {
        self.x_size
    }

    #[must_use]
    pub const fn grid_y_size(&self) -> usize {
        self.y_size
    }

    fn slot(&self, x: usize, y: usize) -> Option<&GridCell> {
        if x >= self.x_size || y >= self.y_size {
            return None;
        }
        self.slots[y * self.x_size + x].map(|i| &self.cells[i])
    }

    /// Occupancy of `(x, y)`; out-of-range positions are empty.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> GridSlot<'_> {
        match self.slot(x, y) {
            None => GridSlot::Empty,
            Some(cell) if cell.column == x && cell.row == y => GridSlot::Origin(cell),
            Some(cell) => GridSlot::Covered(cell),
        }
    }

    /// Child index covering `(x, y)`, origin or not.
    #[must_use]
    pub fn component_index(&self, x: usize, y: usize) -> Option<usize> {
        self.slot(x, y).map(|cell| cell.index)
    }

    /// Component covering `(x, y)`, origin or not.
    #[must_use]
    pub fn content(&self, x: usize, y: usize) -> Option<ComponentId> {
        self.slot(x, y).map(|cell| cell.component)
    }

    #[must_use]
    pub fn is_origin(&self, x: usize, y: usize) -> bool {
        matches!(self.cell(x, y), GridSlot::Origin(_))
    }

    /// Column span at an origin cell.
    #[must_use]
    pub fn x_span(&self, x: usize, y: usize) -> Option<u16> {
        match self.cell(x, y) {
            GridSlot::Origin(cell) => Some(cell.column_span),
            _ => None,
        }
    }

    /// Row span at an origin cell.
    #[must_use]
    pub fn y_span(&self, x: usize, y: usize) -> Option<u16> {
        match self.cell(x, y) {
            GridSlot::Origin(cell) => Some(cell.row_span),
            _ => None,
        }
    }

    /// Merged width of column `x`.
    #[must_use]
    pub fn column_width(&self, x: usize) -> Option<Extent> {
        self.column_widths.get(x).copied().flatten()
    }

    /// Merged height of row `y`.
    #[must_use]
    pub fn row_height(&self, y: usize) -> Option<Extent> {
        self.row_heights.get(y).copied().flatten()
    }

    /// Placed children in child order.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }
}

/// Placement matrix in flow coordinates: `pos` along the bounded axis,
/// `line` along the growing one.
struct FlowMatrix {
    width: usize,
    height: usize,
    slots: Vec<Option<usize>>,
    /// Per placed child: (flow span, line span).
    spans: Vec<(usize, usize)>,
    flow_extents: Vec<Option<Extent>>,
    line_extents: Vec<Option<Extent>>,
}

impl FlowMatrix {
    fn new(width: usize) -> Self {
        Self {
            width,
            height: 0,
            slots: Vec::new(),
            spans: Vec::new(),
            flow_extents: Vec::new(),
            line_extents: Vec::new(),
        }
    }

    fn get(&self, pos: usize, line: usize) -> Option<usize> {
        if line >= self.height {
            return None;
        }
        self.slots[line * self.width + pos]
    }

    fn ensure_height(&mut self, height: usize) {
        if height > self.height {
            self.height = height;
            self.slots.resize(height * self.width, None);
        }
    }

    fn place(&mut self, spec: &GridSpec) {
        let (mut pos, mut line) = (0, 0);
        self.ensure_height(1);
        for (index, child) in spec.children.iter().enumerate() {
            let (flow, across) = spec.flow_spans(child);
            let remaining = self.width - pos;
            let mut flow_span = match flow {
                GridSpan::Cells(n) => usize::from(n).min(remaining),
                // An auto-sized grid is a single line; `Fill` keeps one slot.
                GridSpan::Fill if spec.size == 0 => 1,
                GridSpan::Fill => remaining,
            };
            let line_span = match across {
                GridSpan::Cells(n) => usize::from(n),
                GridSpan::Fill => 1,
            };
            if let Some(claimed) = (pos + 1..pos + flow_span).find(|&p| self.get(p, line).is_some())
            {
                flow_span = claimed - pos;
            }

            self.ensure_height(line + line_span);
            for l in line..line + line_span {
                for p in pos..pos + flow_span {
                    let slot = &mut self.slots[l * self.width + p];
                    if slot.is_none() {
                        *slot = Some(index);
                    }
                }
            }
            self.spans.push((flow_span, line_span));

            if index + 1 < spec.children.len() {
                loop {
                    pos += 1;
                    if pos == self.width {
                        pos = 0;
                        line += 1;
                        self.ensure_height(line + 1);
                    }
                    if self.get(pos, line).is_none() {
                        break;
                    }
                }
            }
        }
    }

    fn distinct_in(&self, cells: impl Iterator<Item = Option<usize>>) -> Vec<usize> {
        let mut seen = Vec::new();
        for index in cells.flatten() {
            if !seen.contains(&index) {
                seen.push(index);
            }
        }
        seen
    }

    fn reduce_lines(&mut self) {
        let mut line = 1;
        while line < self.height {
            let identical = (0..self.width).all(|p| self.get(p, line) == self.get(p, line - 1));
            if !identical {
                line += 1;
                continue;
            }
            for index in self.distinct_in((0..self.width).map(|p| self.get(p, line))) {
                self.spans[index].1 -= 1;
            }
            let removed = self.line_extents.remove(line);
            self.line_extents[line - 1] = merge_extent(self.line_extents[line - 1], removed);
            let _ = self
                .slots
                .drain(line * self.width..(line + 1) * self.width);
            self.height -= 1;
        }
    }

    fn reduce_positions(&mut self) {
        let mut pos = 1;
        while pos < self.width {
            let identical = (0..self.height).all(|l| self.get(pos, l) == self.get(pos - 1, l));
            if !identical {
                pos += 1;
                continue;
            }
            for index in self.distinct_in((0..self.height).map(|l| self.get(pos, l))) {
                self.spans[index].0 -= 1;
            }
            let removed = self.flow_extents.remove(pos);
            self.flow_extents[pos - 1] = merge_extent(self.flow_extents[pos - 1], removed);
            self.remove_position(pos);
        }
    }

    fn remove_position(&mut self, pos: usize) {
        let width = self.width;
        let mut i = 0;
        self.slots.retain(|_| {
            let keep = i % width != pos;
            i += 1;
            keep
        });
        self.width -= 1;
    }

    fn trim(&mut self) {
        while self.width > 0 && (0..self.height).all(|l| self.get(self.width - 1, l).is_none()) {
            let _ = self.flow_extents.pop();
            self.remove_position(self.width - 1);
        }
        while self.height > 0 && (0..self.width).all(|p| self.get(p, self.height - 1).is_none()) {
            let _ = self.line_extents.pop();
            self.height -= 1;
            self.slots.truncate(self.height * self.width);
        }
    }

    fn into_real(self, spec: &GridSpec) -> GridProcessor {
        let vertical = spec.is_vertical();
        let (x_size, y_size) = if vertical {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };

        let mut slots = Vec::with_capacity(x_size * y_size);
        let mut origins: Vec<Option<(usize, usize)>> = vec![None; self.spans.len()];
        for y in 0..y_size {
            for x in 0..x_size {
                let slot = if vertical {
                    self.get(y, x)
                } else {
                    self.get(x, y)
                };
                if let Some(index) = slot
                    && origins[index].is_none()
                {
                    origins[index] = Some((x, y));
                }
                slots.push(slot);
            }
        }

        let cells = spec
            .children
            .iter()
            .zip(self.spans)
            .zip(origins)
            .enumerate()
            .map(|(index, ((child, (flow, line)), origin))| {
                let (column_span, row_span) = if vertical {
                    (line, flow)
                } else {
                    (flow, line)
                };
                let (column, row) = origin.unwrap_or_default();
                GridCell {
                    component: child.component,
                    index,
                    column,
                    row,
                    column_span: u16::try_from(column_span).unwrap_or(u16::MAX),
                    row_span: u16::try_from(row_span).unwrap_or(u16::MAX),
                }
            })
            .collect();

        let (column_widths, row_heights) = if vertical {
            (self.line_extents, self.flow_extents)
        } else {
            (self.flow_extents, self.line_extents)
        };

        GridProcessor {
            x_size,
            y_size,
            slots,
            cells,
            column_widths,
            row_heights,
        }
    }
}

/// Fold a removed extent into its surviving neighbour.
fn merge_extent(kept: Option<Extent>, removed: Option<Extent>) -> Option<Extent> {
    match (kept, removed) {
        (Some(kept), Some(removed)) => Some(kept.checked_add(removed).unwrap_or(kept)),
        (None, removed) => removed,
        (kept, None) => kept,
    }
}

/// Grid input errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    MissingComponent {
        id: ComponentId,
    },
    /// The declared `Size` is negative.
    InvalidSize {
        grid: ComponentId,
        size: i64,
    },
    InvalidSpan {
        component: ComponentId,
        source: InvalidSpan,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingComponent { id } => write!(f, "grid component {id} not found"),
            Self::InvalidSize { grid, size } => {
                write!(f, "grid {grid} has negative size {size}")
            }
            Self::InvalidSpan { component, source } => {
                write!(f, "child {component}: {source}")
            }
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSpan { source, .. } => Some(source),
            _ => None,
        }
    }
}

use super::ReadingOrderStrategy;
use crate::config::RestructuringConfig;
use crate::types::*;
use std::cmp::Ordering;

/// Band/column reading order
///
/// 1. Horizontal bands: blocks whose vertical extents overlap read together.
///    Consecutive bands are fused while they still share a column gutter, so
///    a two-column region stays one band however its blocks are stacked,
///    and a full-width heading closes it.
/// 2. Columns inside a band: blocks whose horizontal extents overlap.
/// 3. Bands top to bottom, columns left to right, blocks top to bottom.
/// 4. Fragment merging: a block split off its neighbour by segmentation
///    (a lone heading line, a stray last line) is folded back into it.
pub struct SpatialReadingOrder {
    config: RestructuringConfig,
}

/// Block plus its position in the source file, the final tie-breaker
type Indexed = (usize, LogicalBlock);

impl SpatialReadingOrder {
    pub fn new(config: RestructuringConfig) -> Self {
        Self { config }
    }
}

impl ReadingOrderStrategy for SpatialReadingOrder {
    fn reorder(&self, page: &Page) -> RestructuredPage {
        let blocks: Vec<Indexed> = page
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.lines.is_empty())
            .map(|(index, block)| (index, LogicalBlock::from_text_block(block)))
            .collect();

        let mut ordered = Vec::with_capacity(blocks.len());
        let bands = self.bands(blocks);
        let band_count = bands.len();
        for band in bands {
            for column in self.columns(band) {
                ordered.extend(column.into_iter().map(|(_, block)| block));
            }
        }

        if self.config.merge_fragments {
            let max_gap = self.config.max_gap_line_ratio * median_line_height(page);
            tracing::debug!(
                "   🧩 {}: {} bands, fragment merge gap {:.1}px",
                page.id,
                band_count,
                max_gap
            );
            ordered = self.merge_fragments(ordered, max_gap);
        }

        RestructuredPage {
            page_id: page.id.clone(),
            width: page.width,
            height: page.height,
            blocks: ordered,
            strategy: self.name().to_string(),
            degenerate: false,
        }
    }

    fn name(&self) -> &str {
        "spatial"
    }
}

impl SpatialReadingOrder {
    fn bands(&self, mut blocks: Vec<Indexed>) -> Vec<Vec<Indexed>> {
        blocks.sort_by(by_top);
        let slabs = sweep(
            blocks,
            |block| (block.1.bbox.y, block.1.bbox.bottom()),
            self.config.band_overlap_tolerance,
        );

        let mut bands: Vec<Vec<Indexed>> = Vec::new();
        for slab in slabs {
            let shares_gutter = bands.last().is_some_and(|band| {
                let combined: Vec<&Indexed> = band.iter().chain(slab.iter()).collect();
                self.columns(combined).len() > 1
            });
            match bands.last_mut() {
                Some(band) if shares_gutter => band.extend(slab),
                _ => bands.push(slab),
            }
        }
        bands
    }

    /// Split a band into columns, left to right, each sorted top to bottom
    fn columns<T: AsIndexed>(&self, mut band: Vec<T>) -> Vec<Vec<T>> {
        band.sort_by(|a, b| {
            let (a, b) = (a.indexed(), b.indexed());
            a.1.bbox.x.total_cmp(&b.1.bbox.x).then_with(|| by_top(a, b))
        });

        let mut columns = sweep(
            band,
            |block| {
                let bbox = block.indexed().1.bbox;
                (bbox.x, bbox.right())
            },
            self.config.column_overlap_tolerance,
        );
        for column in &mut columns {
            column.sort_by(|a, b| by_top(a.indexed(), b.indexed()));
        }
        columns
    }

    fn merge_fragments(&self, blocks: Vec<LogicalBlock>, max_gap: f32) -> Vec<LogicalBlock> {
        let mut merged: Vec<LogicalBlock> = Vec::new();
        let mut current: Option<LogicalBlock> = None;

        for block in blocks {
            match current.as_mut() {
                Some(cluster) if self.can_merge(cluster, &block, max_gap) => {
                    tracing::debug!("   🔗 merging block {} into {}", block.id, cluster.id);
                    cluster.absorb(block);
                }
                _ => {
                    if let Some(done) = current.replace(block) {
                        merged.push(done);
                    }
                }
            }
        }

        if let Some(cluster) = current {
            merged.push(cluster);
        }
        merged
    }

    fn can_merge(&self, cluster: &LogicalBlock, next: &LogicalBlock, max_gap: f32) -> bool {
        if !self.is_fragment(cluster) && !self.is_fragment(next) {
            return false;
        }

        if cluster.bbox.vertical_gap_to(&next.bbox) > max_gap {
            return false;
        }

        // The fragment must sit inside its block's column, or the merged
        // block would bridge a gutter and swallow the next column on reapply
        let tolerance = self.config.horizontal_alignment_tolerance;
        (self.is_fragment(next) && fits_within(&next.bbox, &cluster.bbox, tolerance))
            || (self.is_fragment(cluster) && fits_within(&cluster.bbox, &next.bbox, tolerance))
    }

    fn is_fragment(&self, block: &LogicalBlock) -> bool {
        (1..=self.config.max_fragment_lines).contains(&block.lines.len())
    }
}

/// Owned and borrowed blocks go through the same column split
trait AsIndexed {
    fn indexed(&self) -> &Indexed;
}

impl AsIndexed for Indexed {
    fn indexed(&self) -> &Indexed {
        self
    }
}

impl AsIndexed for &Indexed {
    fn indexed(&self) -> &Indexed {
        self
    }
}

/// Group sorted items into runs whose extents chain-overlap by more than `tolerance`
fn sweep<T>(items: Vec<T>, extent: impl Fn(&T) -> (f32, f32), tolerance: f32) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut group_end = f32::NEG_INFINITY;

    for item in items {
        let (start, end) = extent(&item);
        match groups.last_mut() {
            Some(group) if start < group_end - tolerance => {
                group_end = group_end.max(end);
                group.push(item);
            }
            _ => {
                group_end = end;
                groups.push(vec![item]);
            }
        }
    }

    groups
}

/// Horizontal extent of `inner` within that of `outer`, give or take `tolerance`
fn fits_within(inner: &BoundingBox, outer: &BoundingBox, tolerance: f32) -> bool {
    inner.x >= outer.x - tolerance && inner.right() <= outer.right() + tolerance
}

fn by_top(a: &Indexed, b: &Indexed) -> Ordering {
    a.1.bbox
        .y
        .total_cmp(&b.1.bbox.y)
        .then_with(|| a.1.bbox.x.total_cmp(&b.1.bbox.x))
        .then_with(|| a.0.cmp(&b.0))
}

/// Median height of the page's positioned lines (0 when none has a height)
fn median_line_height(page: &Page) -> f32 {
    let mut heights: Vec<f32> = page
        .lines()
        .map(|line| line.bbox.height)
        .filter(|height| *height > 0.0)
        .collect();
    if heights.is_empty() {
        return 0.0;
    }
    heights.sort_by(|a, b| a.total_cmp(b));
    heights[heights.len() / 2]
}

// Reading-order module - restores the logical line sequence of a page
// - mod.rs: ReadingOrderStrategy seam and the Restructurer failure policy
// - spatial_clustering.rs: band/column ordering with fragment merging

pub mod spatial_clustering;

pub use spatial_clustering::SpatialReadingOrder;

use crate::config::RestructuringConfig;
use crate::error::Warning;
use crate::types::{Page, RestructuredPage};

/// A reading-order strategy turns a page into a permutation plus re-grouping
/// of its lines. Implementations must never create, drop or edit a line.
pub trait ReadingOrderStrategy {
    fn reorder(&self, page: &Page) -> RestructuredPage;

    fn name(&self) -> &str;
}

/// Output of one restructuring pass
#[derive(Debug, Clone)]
pub struct Restructured {
    pub page: RestructuredPage,
    pub warnings: Vec<Warning>,
}

/// Applies a strategy, falling back to source order when geometry is unusable
pub struct Restructurer {
    strategy: Box<dyn ReadingOrderStrategy>,
}

impl Restructurer {
    pub fn new(strategy: Box<dyn ReadingOrderStrategy>) -> Self {
        Self { strategy }
    }

    pub fn spatial(config: &RestructuringConfig) -> Self {
        Self::new(Box::new(SpatialReadingOrder::new(config.clone())))
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn restructure(&self, page: &Page) -> Restructured {
        // Empty blocks are dropped anyway, their geometry does not matter
        let degenerate: Vec<String> = page
            .blocks
            .iter()
            .filter(|block| !block.lines.is_empty() && block.bbox.is_degenerate())
            .map(|block| block.id.clone())
            .collect();

        if !degenerate.is_empty() {
            let warning = Warning::DegenerateGeometry {
                page_id: page.id.clone(),
                block_ids: degenerate,
            }
            .emit();
            let mut restructured = RestructuredPage::passthrough(page);
            restructured.degenerate = true;
            return Restructured {
                page: restructured,
                warnings: vec![warning],
            };
        }

        let restructured = self.strategy.reorder(page);
        tracing::info!(
            "📐 {}: {} blocks → {} logical blocks ({})",
            page.id,
            page.blocks.len(),
            restructured.blocks.len(),
            self.strategy.name()
        );

        Restructured {
            page: restructured,
            warnings: Vec::new(),
        }
    }
}

use crate::block::Block;

/// The top-level parts of a Hansard, cut at the separating rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    /// Title and attendance.
    pub heading: Vec<Block>,
    /// The proceedings.
    pub content: Vec<Block>,
    /// Appendices and notes after the second rule.
    pub sidenote: Vec<Block>,
}

/// Assigns every block to a region by the number of rules before it. Rules
/// themselves belong to no region.
pub fn split_regions(blocks: &[Block]) -> Regions {
    let mut regions = Regions::default();
    let mut separators = 0;
    for block in blocks {
        if block.is_rule() {
            separators += 1;
            continue;
        }
        let region = match separators {
            0 => &mut regions.heading,
            1 => &mut regions.content,
            _ => &mut regions.sidenote,
        };
        region.push(block.clone());
    }
    log::debug!(
        "Regions: {} heading, {} content, {} sidenote block(s)",
        regions.heading.len(),
        regions.content.len(),
        regions.sidenote.len()
    );
    regions
}

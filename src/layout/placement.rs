//! Generation-by-generation packing of tables.

use super::dimensions::TableSize;
use super::{Direction, LayoutOptions};

/// Top-left corner of the first table
pub const ORIGIN: (f64, f64) = (20.0, 20.0);

/// Top-left corner of a table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Assign a position to every node.
///
/// `generations` must already be in placement order, each generation sorted.
/// `sizes` is indexed by node id. In TB mode a generation is a row packed
/// left to right and the next row starts below the tallest table of the
/// previous one; LR is the transpose.
pub fn place(
    generations: &[Vec<usize>],
    sizes: &[TableSize],
    opts: &LayoutOptions,
) -> Vec<Point> {
    let mut positions = vec![Point::default(); sizes.len()];

    // (main, cross): main advances per generation, cross within one
    let mut main = match opts.direction {
        Direction::TB => ORIGIN.1,
        Direction::LR => ORIGIN.0,
    };

    for generation in generations {
        let mut cross = match opts.direction {
            Direction::TB => ORIGIN.0,
            Direction::LR => ORIGIN.1,
        };
        let mut extent: f64 = 0.0;

        for &node in generation {
            let size = sizes[node];
            let (along, across) = match opts.direction {
                Direction::TB => (size.width, size.height),
                Direction::LR => (size.height, size.width),
            };

            positions[node] = match opts.direction {
                Direction::TB => Point { x: cross, y: main },
                Direction::LR => Point { x: main, y: cross },
            };

            cross += along + opts.node_gap;
            extent = extent.max(across);
        }

        main += extent + opts.rank_gap;
    }

    positions
}

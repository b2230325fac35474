//! Treemap Layout
//! Slice-and-dice layout of Region -> Category -> Sub-Category totals in a
//! unit square. Both renderers scale the tiles to their own canvas.

use crate::data::HierarchyTotal;
use std::collections::BTreeMap;

/// Rectangle in unit-square coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl TileRect {
    pub const UNIT: TileRect = TileRect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    pub fn area(&self) -> f64 {
        self.w * self.h
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub label: String,
    /// 0 = region, 1 = category, 2 = sub-category.
    pub depth: usize,
    pub sales: f64,
    pub rect: TileRect,
    /// Palette slot for sub-category tiles, by sorted sub-category name.
    pub color_index: Option<usize>,
}

type Categories = BTreeMap<String, BTreeMap<String, f64>>;

/// Lay out all tiles, parents before children. Non-positive totals get no tile.
pub fn layout(hierarchy: &[HierarchyTotal]) -> Vec<Tile> {
    let mut tree: BTreeMap<String, Categories> = BTreeMap::new();
    for node in hierarchy.iter().filter(|n| n.sales > 0.0) {
        *tree
            .entry(node.region.clone())
            .or_default()
            .entry(node.category.clone())
            .or_default()
            .entry(node.sub_category.clone())
            .or_insert(0.0) += node.sales;
    }

    let mut sub_categories: Vec<&str> = hierarchy
        .iter()
        .filter(|n| n.sales > 0.0)
        .map(|n| n.sub_category.as_str())
        .collect();
    sub_categories.sort_unstable();
    sub_categories.dedup();

    let mut tiles = Vec::new();
    let region_totals: Vec<f64> = tree
        .values()
        .map(|cats| cats.values().flat_map(|subs| subs.values()).sum())
        .collect();

    for ((region, categories), (rect, total)) in tree
        .iter()
        .zip(split(TileRect::UNIT, &region_totals, true).into_iter().zip(region_totals.iter()))
    {
        tiles.push(Tile {
            label: region.clone(),
            depth: 0,
            sales: *total,
            rect,
            color_index: None,
        });

        let category_totals: Vec<f64> = categories.values().map(|s| s.values().sum()).collect();
        for ((category, subs), (rect, total)) in categories
            .iter()
            .zip(split(rect, &category_totals, false).into_iter().zip(category_totals.iter()))
        {
            tiles.push(Tile {
                label: category.clone(),
                depth: 1,
                sales: *total,
                rect,
                color_index: None,
            });

            let sub_totals: Vec<f64> = subs.values().copied().collect();
            for ((sub_category, sales), rect) in subs.iter().zip(split(rect, &sub_totals, true)) {
                tiles.push(Tile {
                    label: sub_category.clone(),
                    depth: 2,
                    sales: *sales,
                    rect,
                    color_index: sub_categories.binary_search(&sub_category.as_str()).ok(),
                });
            }
        }
    }

    tiles
}

/// Divide `rect` proportionally to `values`, along x when `along_x`, else along y.
fn split(rect: TileRect, values: &[f64], along_x: bool) -> Vec<TileRect> {
    let total: f64 = values.iter().sum();
    let mut offset = 0.0;

    values
        .iter()
        .map(|v| {
            let share = if total > 0.0 { v / total } else { 0.0 };
            let tile = if along_x {
                TileRect {
                    x: rect.x + offset * rect.w,
                    y: rect.y,
                    w: share * rect.w,
                    h: rect.h,
                }
            } else {
                TileRect {
                    x: rect.x,
                    y: rect.y + offset * rect.h,
                    w: rect.w,
                    h: share * rect.h,
                }
            };
            offset += share;
            tile
        })
        .collect()
}

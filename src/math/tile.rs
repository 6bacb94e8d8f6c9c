use serde::Serialize;

/// A point on the tile grid: integer tile indices plus the fractional offset within the tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileCoord {
    pub tile_x: i64,
    pub tile_y: i64,
    pub offset_u: f64,
    pub offset_v: f64,
}

/// Folds fractional offsets into `[0, 1)`, carrying whole tiles into the tile indices.
///
/// Non-finite offsets are treated as 0.
pub fn normalize_point(tile_x: i64, tile_y: i64, offset_u: f64, offset_v: f64) -> TileCoord {
    let (tile_x, offset_u) = fold_axis(tile_x, offset_u);
    let (tile_y, offset_v) = fold_axis(tile_y, offset_v);
    TileCoord {
        tile_x,
        tile_y,
        offset_u,
        offset_v,
    }
}

fn fold_axis(tile: i64, offset: f64) -> (i64, f64) {
    if !offset.is_finite() {
        return (tile, 0.0);
    }
    let carry = offset.floor();
    let mut tile = tile.saturating_add(carry as i64);
    let mut offset = offset - carry;
    // Tiny negative offsets round up to exactly 1.0
    if offset >= 1.0 {
        tile = tile.saturating_add(1);
        offset = 0.0;
    }
    (tile, offset)
}

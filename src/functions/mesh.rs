use serde::Serialize;

use crate::functions::surface::SurfaceGrid;
use crate::FieldError;

/// Triangle mesh of a sampled surface in renderer coordinates, where the
/// second component is "up": vertex `(i, j)` sits at `[x[j], z[i][j], y[i]]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceMesh {
  pub positions: Vec<[f64; 3]>,
  pub indices: Vec<[u32; 3]>,
  /// RGB in `[0, 1]`, one per vertex.
  pub colors: Vec<[f64; 3]>,
}

impl SurfaceMesh {
  /// Build the mesh for `grid`. With `clamp = Some(c)` heights are limited
  /// to `[-c, c]` and colours span that band; otherwise colours span the
  /// grid's own height range.
  pub fn from_grid(
    grid: &SurfaceGrid,
    clamp: Option<f64>,
  ) -> Result<Self, FieldError> {
    let r = grid.resolution();
    let side = r + 1;
    if u32::try_from(side * side).is_err() {
      return Err(FieldError::InvalidResolution(r));
    }
    if let Some(c) = clamp {
      if !c.is_finite() {
        return Err(FieldError::RenderError(format!(
          "invalid height clamp {c}"
        )));
      }
    }

    let height = |z: f64| match clamp {
      Some(c) => z.clamp(-c.abs(), c.abs()),
      None => z,
    };
    let (lo, hi) = match clamp {
      Some(c) => (-c.abs(), c.abs()),
      None => grid.z_range(),
    };
    let span = hi - lo;

    let mut positions = Vec::with_capacity(side * side);
    let mut colors = Vec::with_capacity(side * side);
    for (i, row) in grid.z.iter().enumerate() {
      for (j, &z) in row.iter().enumerate() {
        let z = height(z);
        positions.push([grid.x[j], z, grid.y[i]]);
        let t = if span > 0.0 { (z - lo) / span } else { 0.5 };
        colors.push(height_color(t));
      }
    }

    let mut indices = Vec::with_capacity(2 * r * r);
    for i in 0..r {
      for j in 0..r {
        let a = (i * side + j) as u32;
        let b = a + 1;
        let c = a + side as u32;
        let d = c + 1;
        indices.push([a, b, c]);
        indices.push([b, d, c]);
      }
    }

    Ok(SurfaceMesh {
      positions,
      indices,
      colors,
    })
  }
}

/// Blue for low ground through to red for peaks: hue `(1 - t)·240°`.
pub fn height_color(t: f64) -> [f64; 3] {
  let t = t.clamp(0.0, 1.0);
  hsl_to_rgb((1.0 - t) * 240.0 / 360.0, 0.8, 0.6)
}

/// HSL with all components in `[0, 1]` to RGB.
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [f64; 3] {
  if s == 0.0 {
    return [l, l, l];
  }
  let q = if l <= 0.5 {
    l * (1.0 + s)
  } else {
    l + s - l * s
  };
  let p = 2.0 * l - q;
  [
    hue_to_rgb(p, q, h + 1.0 / 3.0),
    hue_to_rgb(p, q, h),
    hue_to_rgb(p, q, h - 1.0 / 3.0),
  ]
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
  let t = t.rem_euclid(1.0);
  if t < 1.0 / 6.0 {
    p + (q - p) * 6.0 * t
  } else if t < 0.5 {
    q
  } else if t < 2.0 / 3.0 {
    p + (q - p) * 6.0 * (2.0 / 3.0 - t)
  } else {
    p
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_rgb(actual: [f64; 3], expected: [f64; 3]) {
    for (a, e) in actual.iter().zip(expected.iter()) {
      assert!((a - e).abs() < 1e-9, "got {actual:?}, expected {expected:?}");
    }
  }

  #[test]
  fn lowest_point_is_blue() {
    // hsl(240°, 80%, 60%)
    assert_rgb(height_color(0.0), [0.28, 0.28, 0.92]);
  }

  #[test]
  fn highest_point_is_red() {
    // hsl(0°, 80%, 60%)
    assert_rgb(height_color(1.0), [0.92, 0.28, 0.28]);
  }

  #[test]
  fn grey_without_saturation() {
    assert_rgb(hsl_to_rgb(0.3, 0.0, 0.4), [0.4, 0.4, 0.4]);
  }
}

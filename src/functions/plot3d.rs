use crate::functions::surface::SurfaceGrid;
use crate::FieldError;

const DEFAULT_SIZE: u32 = 360;
/// Height of the box relative to its unit-square footprint.
const Z_SCALE: f64 = 0.4;

/// Options for `render_svg`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
  pub width: u32,
  pub height: u32,
  pub show_mesh: bool,
  /// Clip heights to this band instead of the data range.
  pub z_clip: Option<(f64, f64)>,
}

impl Default for PlotOptions {
  fn default() -> Self {
    PlotOptions {
      width: DEFAULT_SIZE,
      height: DEFAULT_SIZE,
      show_mesh: true,
      z_clip: None,
    }
  }
}

// --- 3D math types and helpers ---

#[derive(Clone, Copy)]
struct Point3D {
  x: f64,
  y: f64,
  z: f64,
}

struct Camera {
  azimuth: f64,
  elevation: f64,
}

impl Default for Camera {
  fn default() -> Self {
    Camera {
      azimuth: -1.07,
      elevation: 0.63,
    }
  }
}

struct Triangle {
  projected: [(f64, f64); 3],
  depth: f64,
  color: (u8, u8, u8),
}

/// Orthographic projection from a camera at spherical (azimuth, elevation).
fn project(p: Point3D, cam: &Camera) -> (f64, f64) {
  let (sa, ca) = cam.azimuth.sin_cos();
  let (se, ce) = cam.elevation.sin_cos();
  let screen_x = -p.x * sa + p.y * ca;
  let screen_y = -p.x * ca * se - p.y * sa * se + p.z * ce;
  (screen_x, screen_y)
}

/// Distance along the viewing direction; larger is further away.
fn depth(p: Point3D, cam: &Camera) -> f64 {
  let (sa, ca) = cam.azimuth.sin_cos();
  let (se, ce) = cam.elevation.sin_cos();
  -(p.x * ce * ca + p.y * ce * sa + p.z * se)
}

fn triangle_normal(v0: Point3D, v1: Point3D, v2: Point3D) -> [f64; 3] {
  let (ux, uy, uz) = (v1.x - v0.x, v1.y - v0.y, v1.z - v0.z);
  let (vx, vy, vz) = (v2.x - v0.x, v2.y - v0.y, v2.z - v0.z);
  let nx = uy * vz - uz * vy;
  let ny = uz * vx - ux * vz;
  let nz = ux * vy - uy * vx;
  let len = (nx * nx + ny * ny + nz * nz).sqrt();
  if len < 1e-15 {
    [0.0, 0.0, 1.0]
  } else {
    [nx / len, ny / len, nz / len]
  }
}

/// Height ramp shared with the mesh colours, as 8-bit RGB.
fn height_color(z_norm: f64) -> (u8, u8, u8) {
  let [r, g, b] = crate::functions::mesh::height_color(z_norm);
  (
    (r * 255.0).round() as u8,
    (g * 255.0).round() as u8,
    (b * 255.0).round() as u8,
  )
}

/// Ambient plus two-sided diffuse light from the upper left front.
fn apply_lighting(color: (u8, u8, u8), normal: [f64; 3]) -> (u8, u8, u8) {
  let (lx, ly, lz) = (0.4_f64, -0.5_f64, 0.76_f64);
  let len = (lx * lx + ly * ly + lz * lz).sqrt();
  let light = [lx / len, ly / len, lz / len];

  let dot = normal[0] * light[0] + normal[1] * light[1] + normal[2] * light[2];
  let ambient = 0.35;
  let intensity = (ambient + (1.0 - ambient) * dot.abs()).clamp(0.0, 1.0);

  let scale = |c: u8| (c as f64 * intensity).round() as u8;
  (scale(color.0), scale(color.1), scale(color.2))
}

/// Tick spacing of 1, 2 or 5 times a power of ten.
fn nice_step(range: f64, target_labels: usize) -> f64 {
  if range <= 0.0 || !range.is_finite() {
    return 0.0;
  }
  let raw = range / target_labels as f64;
  let mag = 10_f64.powf(raw.abs().log10().floor());
  let norm = raw / mag;
  let nice = if norm <= 1.0 {
    1.0
  } else if norm <= 2.0 {
    2.0
  } else if norm <= 5.0 {
    5.0
  } else {
    10.0
  };
  nice * mag
}

/// Tick label, without a fractional part for whole numbers.
fn format_tick(v: f64) -> String {
  if (v - v.round()).abs() < 1e-9 {
    format!("{}", v.round() as i64)
  } else {
    format!("{v:.1}")
  }
}

/// Render a sampled surface as an SVG document.
///
/// The grid is mapped into a `[-1, 1]² × [-Z_SCALE, Z_SCALE]` box, shaded
/// by height and drawn back to front.
pub fn render_svg(
  grid: &SurfaceGrid,
  options: &PlotOptions,
) -> Result<String, FieldError> {
  let n = grid.resolution();
  if n == 0 {
    return Err(FieldError::InvalidResolution(n));
  }
  if let Some((lo, hi)) = options.z_clip {
    if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
      return Err(FieldError::RenderError(format!(
        "invalid height clip [{lo}, {hi}]"
      )));
    }
  }
  let camera = Camera::default();

  let (z_lo, z_hi) = options.z_clip.unwrap_or_else(|| grid.z_range());
  let z_range = if (z_hi - z_lo).abs() < 1e-15 {
    1.0
  } else {
    z_hi - z_lo
  };

  let nx = |j: usize| (j as f64 / n as f64) * 2.0 - 1.0;
  let ny = |i: usize| (i as f64 / n as f64) * 2.0 - 1.0;
  let nz = |z: f64| ((z - z_lo) / z_range) * 2.0 * Z_SCALE - Z_SCALE;
  let vertex = |i: usize, j: usize| -> (Point3D, f64) {
    let z = grid.z[i][j].clamp(z_lo, z_hi);
    (
      Point3D {
        x: nx(j),
        y: ny(i),
        z: nz(z),
      },
      (z - z_lo) / z_range,
    )
  };

  let mut triangles = Vec::with_capacity(2 * n * n);
  for i in 0..n {
    for j in 0..n {
      let corners = [
        [vertex(i, j), vertex(i, j + 1), vertex(i + 1, j)],
        [vertex(i + 1, j + 1), vertex(i + 1, j), vertex(i, j + 1)],
      ];
      for [(v0, t0), (v1, t1), (v2, t2)] in corners {
        let base = height_color((t0 + t1 + t2) / 3.0);
        let color = apply_lighting(base, triangle_normal(v0, v1, v2));
        let center = Point3D {
          x: (v0.x + v1.x + v2.x) / 3.0,
          y: (v0.y + v1.y + v2.y) / 3.0,
          z: (v0.z + v1.z + v2.z) / 3.0,
        };
        triangles.push(Triangle {
          projected: [
            project(v0, &camera),
            project(v1, &camera),
            project(v2, &camera),
          ],
          depth: depth(center, &camera),
          color,
        });
      }
    }
  }

  // Painter's algorithm: furthest first
  triangles.sort_by(|a, b| b.depth.total_cmp(&a.depth));

  let x_range = (grid.x[0], grid.x[n]);
  let y_range = (grid.y[0], grid.y[n]);
  let z_axis = if (z_hi - z_lo).abs() < 1e-15 {
    (z_lo - 0.5, z_hi + 0.5)
  } else {
    (z_lo, z_hi)
  };

  generate_svg(&triangles, &camera, [x_range, y_range, z_axis], options)
}

fn generate_svg(
  triangles: &[Triangle],
  camera: &Camera,
  ranges: [(f64, f64); 3],
  options: &PlotOptions,
) -> Result<String, FieldError> {
  let corners = bounding_box_corners();
  let mut px_min = f64::INFINITY;
  let mut px_max = f64::NEG_INFINITY;
  let mut py_min = f64::INFINITY;
  let mut py_max = f64::NEG_INFINITY;
  let box_points = corners.iter().map(|&c| project(c, camera));
  for (px, py) in triangles
    .iter()
    .flat_map(|tri| tri.projected)
    .chain(box_points)
  {
    px_min = px_min.min(px);
    px_max = px_max.max(px);
    py_min = py_min.min(py);
    py_max = py_max.max(py);
  }

  let p_width = px_max - px_min;
  let p_height = py_max - py_min;
  if p_width < 1e-15 || p_height < 1e-15 {
    return Err(FieldError::RenderError("degenerate projection".into()));
  }

  let margin = 50.0;
  let draw_w = options.width as f64 - 2.0 * margin;
  let draw_h = options.height as f64 - 2.0 * margin;
  if draw_w <= 0.0 || draw_h <= 0.0 {
    return Err(FieldError::RenderError(format!(
      "image size {}x{} leaves no room to draw",
      options.width, options.height
    )));
  }
  let scale = (draw_w / p_width).min(draw_h / p_height);
  let cx = margin + draw_w / 2.0;
  let cy = margin + draw_h / 2.0;
  let p_cx = (px_min + px_max) / 2.0;
  let p_cy = (py_min + py_max) / 2.0;

  // SVG y grows downwards
  let to_svg = |(px, py): (f64, f64)| -> (f64, f64) {
    (cx + (px - p_cx) * scale, cy - (py - p_cy) * scale)
  };

  let mut svg = String::with_capacity(triangles.len() * 120 + 2000);
  svg.push_str(&format!(
    "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
    w = options.width,
    h = options.height
  ));
  svg.push_str(&format!(
    "<rect width=\"{}\" height=\"{}\" fill=\"white\"/>\n",
    options.width, options.height
  ));

  let mesh_attrs = if options.show_mesh {
    "stroke=\"#00000018\" stroke-width=\"0.5\""
  } else {
    "stroke=\"none\""
  };
  for tri in triangles {
    let (x0, y0) = to_svg(tri.projected[0]);
    let (x1, y1) = to_svg(tri.projected[1]);
    let (x2, y2) = to_svg(tri.projected[2]);
    let (r, g, b) = tri.color;
    svg.push_str(&format!(
      "<polygon points=\"{x0:.1},{y0:.1} {x1:.1},{y1:.1} {x2:.1},{y2:.1}\" fill=\"rgb({r},{g},{b})\" {mesh_attrs}/>\n"
    ));
  }

  draw_axes(&mut svg, camera, &to_svg, ranges);

  svg.push_str("</svg>");
  Ok(svg)
}

/// The 8 corners of the normalized plot box.
fn bounding_box_corners() -> [Point3D; 8] {
  let mut corners = [Point3D {
    x: 0.0,
    y: 0.0,
    z: 0.0,
  }; 8];
  for (k, corner) in corners.iter_mut().enumerate() {
    corner.x = if k & 1 == 0 { -1.0 } else { 1.0 };
    corner.y = if k & 2 == 0 { -1.0 } else { 1.0 };
    corner.z = if k & 4 == 0 { -Z_SCALE } else { Z_SCALE };
  }
  corners
}

/// Axis lines with ticks and labels along the three box edges that meet at
/// the bottom corner nearest the viewer.
fn draw_axes(
  svg: &mut String,
  camera: &Camera,
  to_svg: &dyn Fn((f64, f64)) -> (f64, f64),
  ranges: [(f64, f64); 3],
) {
  let axis_color = "#666666";
  let font_size = 10;

  let origin = bounding_box_corners()
    .into_iter()
    .filter(|corner| corner.z < 0.0)
    .min_by(|a, b| depth(*a, camera).total_cmp(&depth(*b, camera)))
    .unwrap_or(Point3D {
      x: -1.0,
      y: -1.0,
      z: -Z_SCALE,
    });

  let ends = [
    Point3D {
      x: -origin.x,
      ..origin
    },
    Point3D {
      y: -origin.y,
      ..origin
    },
    Point3D {
      z: Z_SCALE,
      ..origin
    },
  ];
  // An axis running from +1 to -1 in box space has its values reversed
  let flipped = [origin.x > ends[0].x, origin.y > ends[1].y, false];

  let (sx0, sy0) = to_svg(project(origin, camera));
  for ((end, (val_min, val_max)), flipped) in
    ends.into_iter().zip(ranges).zip(flipped)
  {
    let (sx1, sy1) = to_svg(project(end, camera));
    svg.push_str(&format!(
      "<line x1=\"{sx0:.1}\" y1=\"{sy0:.1}\" x2=\"{sx1:.1}\" y2=\"{sy1:.1}\" stroke=\"{axis_color}\" stroke-width=\"1\"/>\n"
    ));

    let step = nice_step(val_max - val_min, 4);
    let (dx, dy) = (sx1 - sx0, sy1 - sy0);
    let len = (dx * dx + dy * dy).sqrt();
    if step <= 0.0 || len <= 1.0 {
      continue;
    }
    let (perpx, perpy) = (-dy / len * 4.0, dx / len * 4.0);

    let mut tick = (val_min / step).ceil() * step;
    while tick <= val_max + step * 0.01 {
      let t_raw = ((tick - val_min) / (val_max - val_min)).clamp(0.0, 1.0);
      let t = if flipped { 1.0 - t_raw } else { t_raw };
      let pt = Point3D {
        x: origin.x + (end.x - origin.x) * t,
        y: origin.y + (end.y - origin.y) * t,
        z: origin.z + (end.z - origin.z) * t,
      };
      let (tx, ty) = to_svg(project(pt, camera));

      svg.push_str(&format!(
        "<line x1=\"{tx:.1}\" y1=\"{ty:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{axis_color}\" stroke-width=\"0.5\"/>\n",
        tx + perpx,
        ty + perpy
      ));
      svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"{font_size}\" fill=\"{axis_color}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>\n",
        tx + perpx * 3.0,
        ty + perpy * 3.0,
        format_tick(tick)
      ));

      tick += step;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn nice_step_rounds_up_to_1_2_5() {
    assert_eq!(nice_step(10.0, 4), 5.0);
    assert_eq!(nice_step(4.0, 4), 1.0);
    assert_eq!(nice_step(6.0, 4), 2.0);
    assert!((nice_step(0.3, 4) - 0.1).abs() < 1e-12);
  }

  #[test]
  fn nice_step_of_empty_range_is_zero() {
    assert_eq!(nice_step(0.0, 4), 0.0);
  }

  #[test]
  fn format_tick_drops_fraction_for_integers() {
    assert_eq!(format_tick(2.0), "2");
    assert_eq!(format_tick(-3.0000000001), "-3");
    assert_eq!(format_tick(0.5), "0.5");
  }

  #[test]
  fn box_has_eight_distinct_corners() {
    let corners = bounding_box_corners();
    for (a, ca) in corners.iter().enumerate() {
      for cb in &corners[a + 1..] {
        assert!(ca.x != cb.x || ca.y != cb.y || ca.z != cb.z);
      }
    }
  }
}

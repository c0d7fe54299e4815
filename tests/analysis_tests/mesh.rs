use super::*;

fn grid(formula: &str, resolution: usize) -> fieldcalc::SurfaceGrid {
  sample_surface(formula, &Rectangle::square(1.0), resolution).unwrap()
}

#[test]
fn vertex_and_triangle_counts() {
  let mesh = SurfaceMesh::from_grid(&grid("x*y", 3), None).unwrap();
  assert_eq!(mesh.positions.len(), 16);
  assert_eq!(mesh.colors.len(), 16);
  assert_eq!(mesh.indices.len(), 18);
}

#[test]
fn positions_put_height_second() {
  let grid = grid("x + 2*y", 3);
  let mesh = SurfaceMesh::from_grid(&grid, None).unwrap();
  for i in 0..=3 {
    for j in 0..=3 {
      let expected = [grid.x[j], grid.z[i][j], grid.y[i]];
      assert_eq!(mesh.positions[i * 4 + j], expected);
    }
  }
}

#[test]
fn indices_stay_in_bounds() {
  let mesh = SurfaceMesh::from_grid(&grid("x", 5), None).unwrap();
  let count = mesh.positions.len() as u32;
  assert!(mesh.indices.iter().flatten().all(|&index| index < count));
}

#[test]
fn clamp_limits_heights() {
  let mesh = SurfaceMesh::from_grid(&grid("10*x", 4), Some(1.0)).unwrap();
  assert!(mesh.positions.iter().all(|p| (-1.0..=1.0).contains(&p[1])));
  assert_eq!(mesh.positions[0][1], -1.0);
}

#[test]
fn colors_run_from_blue_to_red() {
  let mesh = SurfaceMesh::from_grid(&grid("x", 2), None).unwrap();
  // Vertex 0 sits at x = -1, the lowest point; vertex 2 at x = 1
  let [r, _, b] = mesh.colors[0];
  assert!(b > r);
  let [r, _, b] = mesh.colors[2];
  assert!(r > b);
}

#[test]
fn flat_surface_uses_the_middle_color() {
  let mesh = SurfaceMesh::from_grid(&grid("3", 2), None).unwrap();
  let middle = fieldcalc::functions::mesh::height_color(0.5);
  assert!(mesh.colors.iter().all(|&c| c == middle));
}

#[test]
fn non_finite_clamp_is_rejected() {
  let grid = grid("x", 2);
  for c in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
    assert!(matches!(
      SurfaceMesh::from_grid(&grid, Some(c)),
      Err(FieldError::RenderError(_))
    ));
  }
}

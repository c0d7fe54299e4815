use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fieldcalc::{
  double_integral, evaluate, format_number, gradient_field, render_svg,
  sample_surface, symbolic_partial, try_partial_derivative, Axis, Bindings,
  GradientVector, PlotOptions, Point, Rectangle, SurfaceMesh,
  DEFAULT_DECIMALS, DEFAULT_INTERVALS, DEFAULT_RESOLUTION, DEFAULT_STEP,
};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Decimals in formatted numbers
  #[arg(
    long,
    global = true,
    env = "FIELDCALC_DECIMALS",
    default_value_t = DEFAULT_DECIMALS
  )]
  decimals: usize,

  #[command(subcommand)]
  command: Commands,
}

/// Sampling rectangle; unset bounds fall back to [-5, 5].
#[derive(Args)]
struct DomainArgs {
  #[arg(long)]
  x_min: Option<f64>,
  #[arg(long)]
  x_max: Option<f64>,
  #[arg(long)]
  y_min: Option<f64>,
  #[arg(long)]
  y_max: Option<f64>,
}

impl DomainArgs {
  fn rectangle(&self) -> Rectangle {
    let default = Rectangle::default();
    Rectangle::new(
      (
        self.x_min.unwrap_or(default.x_min),
        self.x_max.unwrap_or(default.x_max),
      ),
      (
        self.y_min.unwrap_or(default.y_min),
        self.y_max.unwrap_or(default.y_max),
      ),
    )
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Evaluate a formula
  #[command(allow_negative_numbers = true)]
  Eval {
    formula: String,
    /// Variable binding, e.g. --var x=1.5
    #[arg(long = "var", value_parser = parse_binding)]
    vars: Vec<(String, f64)>,
  },
  /// Sample z = f(x, y) on a regular grid
  #[command(allow_negative_numbers = true)]
  Surface {
    formula: String,
    #[command(flatten)]
    domain: DomainArgs,
    #[arg(
      long,
      env = "FIELDCALC_RESOLUTION",
      default_value_t = DEFAULT_RESOLUTION
    )]
    resolution: usize,
    /// Also render the surface to this SVG file
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Print a triangle mesh instead of the raw grid
    #[arg(long)]
    mesh: bool,
    /// Clamp mesh heights to [-c, c]
    #[arg(long)]
    clamp: Option<f64>,
  },
  /// Numerical gradient at a point
  #[command(allow_negative_numbers = true)]
  Gradient {
    formula: String,
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    #[arg(long, default_value_t = DEFAULT_STEP)]
    step: f64,
  },
  /// Numerical partial derivative at a point
  #[command(allow_negative_numbers = true)]
  Derivative {
    formula: String,
    #[arg(long, default_value = "x")]
    axis: Axis,
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    #[arg(long, default_value_t = DEFAULT_STEP)]
    step: f64,
  },
  /// Double integral by Simpson's rule
  #[command(allow_negative_numbers = true)]
  Integrate {
    formula: String,
    #[command(flatten)]
    domain: DomainArgs,
    #[arg(
      long,
      env = "FIELDCALC_INTERVALS",
      default_value_t = DEFAULT_INTERVALS
    )]
    intervals: usize,
  },
  /// Symbolic partial derivatives
  Diff {
    formula: String,
    /// Differentiate with respect to these variables (default: x and y)
    #[arg(long = "var")]
    vars: Vec<String>,
  },
  /// Conditions under which the formula is real-valued
  Domain { formula: String },
  /// Gradient arrows over the sampling grid
  #[command(allow_negative_numbers = true)]
  Arrows {
    formula: String,
    #[command(flatten)]
    domain: DomainArgs,
    #[arg(
      long,
      env = "FIELDCALC_RESOLUTION",
      default_value_t = DEFAULT_RESOLUTION
    )]
    resolution: usize,
    /// Keep every n-th grid node
    #[arg(long, default_value_t = 5)]
    stride: usize,
  },
}

fn parse_binding(s: &str) -> Result<(String, f64), String> {
  let (name, value) = s
    .split_once('=')
    .ok_or_else(|| format!("expected name=value, got {s:?}"))?;
  let value = value
    .trim()
    .parse::<f64>()
    .map_err(|e| format!("invalid value for {name}: {e}"))?;
  Ok((name.trim().to_string(), value))
}

fn gradient_json(grad: &GradientVector, decimals: usize) -> Value {
  json!({
    "dx": format_number(grad.dx, decimals),
    "dy": format_number(grad.dy, decimals),
    "magnitude": format_number(grad.magnitude, decimals),
  })
}

fn run(cli: Cli) -> Result<Value> {
  let decimals = cli.decimals;
  let output = match cli.command {
    Commands::Eval { formula, vars } => {
      let bindings: Bindings = vars.into_iter().collect();
      let value = evaluate(&formula, &bindings)
        .with_context(|| format!("evaluating {formula:?}"))?;
      json!({ "value": format_number(value, decimals) })
    }
    Commands::Surface {
      formula,
      domain,
      resolution,
      svg,
      mesh,
      clamp,
    } => {
      let grid = sample_surface(&formula, &domain.rectangle(), resolution)?;
      if let Some(path) = svg {
        let document = render_svg(&grid, &PlotOptions::default())?;
        std::fs::write(&path, document)
          .with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote {}", path.display());
      }
      if mesh {
        serde_json::to_value(SurfaceMesh::from_grid(&grid, clamp)?)?
      } else {
        serde_json::to_value(&grid)?
      }
    }
    Commands::Gradient {
      formula,
      x,
      y,
      step,
    } => {
      let point = Point::new(x, y);
      let dx = try_partial_derivative(&formula, Axis::X, point, step)?;
      let dy = try_partial_derivative(&formula, Axis::Y, point, step)?;
      gradient_json(&GradientVector::new(dx, dy), decimals)
    }
    Commands::Derivative {
      formula,
      axis,
      x,
      y,
      step,
    } => {
      let value =
        try_partial_derivative(&formula, axis, Point::new(x, y), step)?;
      json!({ "axis": axis, "value": format_number(value, decimals) })
    }
    Commands::Integrate {
      formula,
      domain,
      intervals,
    } => {
      let rect = domain.rectangle();
      rect.validate()?;
      let value = double_integral(
        &formula,
        (rect.x_min, rect.x_max),
        (rect.y_min, rect.y_max),
        intervals,
      )?;
      json!({ "value": format_number(value, decimals) })
    }
    Commands::Diff { formula, vars } => {
      let vars = if vars.is_empty() {
        vec!["x".to_string(), "y".to_string()]
      } else {
        vars
      };
      let mut partials = serde_json::Map::new();
      for var in vars {
        let derivative = symbolic_partial(&formula, &var)
          .with_context(|| format!("differentiating with respect to {var}"))?;
        partials.insert(var, Value::String(derivative));
      }
      Value::Object(partials)
    }
    Commands::Domain { formula } => {
      serde_json::to_value(fieldcalc::analyze_domain(&formula)?)?
    }
    Commands::Arrows {
      formula,
      domain,
      resolution,
      stride,
    } => serde_json::to_value(gradient_field(
      &formula,
      &domain.rectangle(),
      resolution,
      stride,
    )?)?,
  };
  Ok(output)
}

fn main() {
  env_logger::Builder::from_env(
    env_logger::Env::default().default_filter_or("warn"),
  )
  .init();

  let cli = Cli::parse();
  let result = run(cli)
    .and_then(|output| Ok(serde_json::to_string_pretty(&output)?));
  match result {
    Ok(text) => println!("{text}"),
    Err(e) => {
      eprintln!("Error: {e:#}");
      std::process::exit(1);
    }
  }
}

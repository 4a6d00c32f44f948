use crate::geometry::Point3D;
use crate::math::{Camera, SHADOW_PLANE_Z};
use clap::{Parser, ValueEnum};
use std::time::Duration;
use thiserror::Error;

/// When the accumulated angles are applied to the geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RotationMode {
    /// Rotate only on frames with a rotation key held or a drag in progress
    Interactive,
    /// Spin about Y every frame, with input adding to it
    Always,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "cube-viewer")]
#[command(version, about = "Rotate a perspective-projected cube in the terminal")]
#[command(after_help = "Controls:\n  \
    Arrows        pitch / yaw\n  \
    z / x         roll\n  \
    + / -         rotation speed\n  \
    Left drag     pitch / yaw\n  \
    p             pause\n  \
    d             debug overlay\n  \
    q / Esc       quit")]
pub struct Args {
    /// Logical surface width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Logical surface height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Field of view factor
    #[arg(long, default_value_t = 256.0)]
    pub fov: f64,

    /// Camera distance from the projection plane
    #[arg(long, default_value_t = 4.0)]
    pub viewer_distance: f64,

    /// Light position used for the cast shadow, as x,y,z
    #[arg(long, value_parser = parse_point, default_value = "0.5,0.5,-8")]
    pub light: Point3D,

    /// Initial rotation speed in radians per frame
    #[arg(long, default_value_t = 0.01)]
    pub speed: f64,

    /// Radians of rotation per pixel of mouse drag
    #[arg(long, default_value_t = 0.01)]
    pub sensitivity: f64,

    #[arg(long, value_enum, default_value_t = RotationMode::Interactive)]
    pub mode: RotationMode,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("surface size must be non-zero, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("sensitivity must be finite, got {0}")]
    BadSensitivity(f64),
    #[error("light z must not equal the shadow plane z of -2")]
    LightOnShadowPlane,
    #[error("fps must be at least 1")]
    ZeroFps,
}

/// Validated session settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub camera: Camera,
    pub light: Point3D,
    pub speed: f64,
    pub sensitivity: f64,
    pub mode: RotationMode,
    pub fps: u32,
}

impl Config {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            camera: Camera::default(),
            light: Point3D::new(0.5, 0.5, -8.0),
            speed: 0.01,
            sensitivity: 0.01,
            mode: RotationMode::Interactive,
            fps: 60,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.width == 0 || args.height == 0 {
            return Err(ConfigError::EmptySurface {
                width: args.width,
                height: args.height,
            });
        }
        let fov = positive("fov", args.fov)?;
        let viewer_distance = positive("viewer distance", args.viewer_distance)?;
        let speed = positive("speed", args.speed)?;
        if !args.sensitivity.is_finite() {
            return Err(ConfigError::BadSensitivity(args.sensitivity));
        }
        if args.light.z == SHADOW_PLANE_Z {
            return Err(ConfigError::LightOnShadowPlane);
        }
        if args.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }

        Ok(Config {
            camera: Camera::new(fov, viewer_distance, args.width, args.height),
            light: args.light,
            speed,
            sensitivity: args.sensitivity,
            mode: args.mode,
            fps: args.fps,
        })
    }
}

/// Parses `x,y,z` into a point
pub fn parse_point(s: &str) -> Result<Point3D, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got {s:?}"));
    };
    let coord = |v: &str| {
        v.parse::<f64>()
            .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
    };
    Ok(Point3D::new(coord(*x)?, coord(*y)?, coord(*z)?))
}

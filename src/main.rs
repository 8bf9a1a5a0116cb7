//! geomstore - inspect, convert and generate binary mesh files
//!
//! ```text
//! geomstore info <file>
//! geomstore convert <in> <out> [interleaved|non-interleaved]
//! geomstore demo <out> [interleaved|non-interleaved]
//! geomstore config
//! ```

mod settings;

use std::path::Path;

use anyhow::{bail, Context, Result};
use geomstore_core::AttributeKind;
use geomstore_io::{write_mesh_file, MeshReader, WriteScheme};
use geomstore_mesh::{Mesh, VertexLayout};
use glam::{Vec2, Vec3};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::Settings;

const USAGE: &str = "usage: geomstore <info <file> | convert <in> <out> [scheme] | demo <out> [scheme] | config>";

fn main() -> Result<()> {
    // Settings decide the log level, so load them under a temporary subscriber.
    let bootstrap = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    let settings = tracing::subscriber::with_default(bootstrap, Settings::load);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .context("Invalid log level in settings")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["info", file] => print_info(Path::new(file)),
        ["convert", input, output, rest @ ..] => {
            let scheme = scheme_arg(rest, &settings)?;
            convert(Path::new(input), Path::new(output), scheme)
        }
        ["demo", output, rest @ ..] => {
            let scheme = scheme_arg(rest, &settings)?;
            let mesh = tetrahedron()?;
            write_mesh_file(output, &mesh, scheme)
                .with_context(|| format!("Failed to write {output}"))?;
            info!("Wrote demo tetrahedron to {output}");
            Ok(())
        }
        ["config"] => {
            let path = settings.save().context("Failed to save settings")?;
            info!("Settings written to {:?}", path);
            Ok(())
        }
        _ => bail!("{USAGE}"),
    }
}

fn scheme_arg(rest: &[&str], settings: &Settings) -> Result<WriteScheme> {
    match rest {
        [] => Ok(settings.codec.scheme),
        [scheme] => scheme.parse().map_err(anyhow::Error::msg),
        _ => bail!("{USAGE}"),
    }
}

fn print_info(path: &Path) -> Result<()> {
    let mut reader =
        MeshReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let header = reader
        .read_info()
        .with_context(|| format!("{} is not a valid mesh file", path.display()))?;

    info!(
        "{}: {} vertices ({} bytes each), {} indices",
        path.display(),
        header.vertex_count,
        header.vertex_size(),
        header.index_count
    );
    for attribute in &header.attributes {
        info!(
            "  {:<18} {:<7} offset {:>8}  stride {:>4}",
            attribute.kind.display_name(),
            attribute.shape.to_string(),
            attribute.offset,
            attribute.stride
        );
    }

    let mesh = reader
        .read_body(&header)
        .with_context(|| format!("Failed to read mesh data from {}", path.display()))?;
    if let Some((min, max)) = bounds(&mesh) {
        info!("  bounds {min} .. {max}");
    }
    info!(
        "  packed for upload: {} bytes per vertex",
        VertexLayout::from_mesh(&mesh).stride()
    );
    Ok(())
}

/// Axis-aligned bounds of a float3 position attribute.
fn bounds(mesh: &Mesh) -> Option<(Vec3, Vec3)> {
    let positions = mesh.zip::<&Vec3>(AttributeKind::Position).ok()?;
    positions.iter().fold(None, |acc, &p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })
}

fn convert(input: &Path, output: &Path, scheme: WriteScheme) -> Result<()> {
    let mesh = MeshReader::open(input)
        .and_then(|mut reader| reader.read_mesh())
        .with_context(|| format!("Failed to read {}", input.display()))?;
    write_mesh_file(output, &mesh, scheme)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Converted {} -> {} ({scheme:?})",
        input.display(),
        output.display()
    );
    Ok(())
}

/// Four-vertex tetrahedron with positions and zeroed texture coordinates.
fn tetrahedron() -> Result<Mesh> {
    let mut mesh = Mesh::with_vertices(4);
    mesh.create_attribute::<Vec3>(AttributeKind::Position)?
        .copy_from_slice(&[
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(0.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ]);
    mesh.create_attribute::<Vec2>(AttributeKind::TexCoord)?
        .fill(Vec2::ZERO);
    mesh.set_indices(vec![0, 1, 2, 0, 3, 1, 1, 3, 2, 2, 3, 0])?;
    Ok(mesh)
}

use crate::ir::Scene;
use crate::layout::{LayoutStats, Placement, PlacementLayout};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDump<'a> {
    pub width: f32,
    pub height: f32,
    pub curve: Vec<[f32; 2]>,
    pub placements: &'a [Placement],
    pub stats: LayoutStats,
}

impl<'a> PlacementDump<'a> {
    pub fn from_layout(layout: &'a PlacementLayout, scene: &Scene) -> Self {
        Self {
            width: scene.chart.width,
            height: scene.chart.height,
            curve: layout.curve_samples.iter().map(|(x, y)| [*x, *y]).collect(),
            placements: &layout.placements,
            stats: layout.stats,
        }
    }
}

pub fn dump_to_string(layout: &PlacementLayout, scene: &Scene, pretty: bool) -> anyhow::Result<String> {
    let dump = PlacementDump::from_layout(layout, scene);
    let json = if pretty {
        serde_json::to_string_pretty(&dump)?
    } else {
        serde_json::to_string(&dump)?
    };
    Ok(json)
}

/// Write the dump to `path`, or stdout when no path is given.
pub fn write_placement_dump(
    path: Option<&Path>,
    layout: &PlacementLayout,
    scene: &Scene,
    pretty: bool,
) -> anyhow::Result<()> {
    let dump = PlacementDump::from_layout(layout, scene);
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_json(&mut writer, &dump, pretty)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_json(&mut writer, &dump, pretty)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn write_json<W: Write>(writer: &mut W, dump: &PlacementDump<'_>, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, dump)?;
    } else {
        serde_json::to_writer(writer, dump)?;
    }
    Ok(())
}

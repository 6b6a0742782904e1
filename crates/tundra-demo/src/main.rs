//! Demo binary that walks a player across a procedural world and drives the chunk cache.
//!
//! Configuration is loaded from `terrain.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p tundra-demo` to simulate 600 frames.
//! Run with `cargo run -p tundra-demo -- --frames 3000 --log-level debug` for cache traces.

mod renderer;
mod world;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glam::{I64Vec2, Vec2, Vec3};
use tracing::{info, warn};
use tundra_config::{CliArgs, TerrainConfig};
use tundra_coords::{chunk_grid_index, world_to_cells};
use tundra_mesh::LodFlags;
use tundra_terrain::{ChunkManager, ChunkRequest};

use crate::renderer::CountingRenderer;
use crate::world::{ProceduralWorld, WorldParams};

const FRAME_TIME: f32 = 1.0 / 60.0;
/// World units per second.
const WALK_SPEED: f32 = 900.0;

/// One ring of equally sized chunks. Each ring tiles a square around the player and
/// leaves out the chunk the next ring in subdivides.
#[derive(Clone, Copy, Debug)]
struct Ring {
    chunk_size: f32,
    lod: u8,
    /// Edge length of the chunk this ring subdivides, or `None` for the outermost ring,
    /// which covers the 3 × 3 chunks around the player.
    parent_size: Option<f32>,
    /// Chunks within this many steps of the player's chunk form the active grid.
    active_radius: Option<i64>,
}

/// Innermost first.
const RINGS: [Ring; 3] = [
    Ring {
        chunk_size: 0.25,
        lod: 0,
        parent_size: Some(1.0),
        active_radius: Some(1),
    },
    Ring {
        chunk_size: 1.0,
        lod: 2,
        parent_size: Some(4.0),
        active_radius: None,
    },
    Ring {
        chunk_size: 4.0,
        lod: 4,
        parent_size: None,
        active_radius: None,
    },
];

impl Ring {
    /// Grid index of the first chunk and the number of chunks per side.
    fn region(&self, cells: Vec2) -> (I64Vec2, i64) {
        match self.parent_size {
            Some(parent) => {
                let span = (parent / self.chunk_size) as i64;
                (chunk_grid_index(cells, parent) * span, span)
            }
            None => (chunk_grid_index(cells, self.chunk_size) - I64Vec2::ONE, 3),
        }
    }
}

/// LOD of the innermost ring covering `point`, or `None` outside every ring.
fn lod_at(point: Vec2, cells: Vec2) -> Option<u8> {
    RINGS.iter().find_map(|ring| {
        let (origin, span) = ring.region(cells);
        let min = origin.as_vec2() * ring.chunk_size;
        let max = (origin + I64Vec2::splat(span)).as_vec2() * ring.chunk_size;
        (point.cmpge(min).all() && point.cmplt(max).all()).then_some(ring.lod)
    })
}

/// Stitching flags of the chunk at grid `index` of `ring`, with the player at `cells`.
///
/// Each neighbour's LOD is that of the ring actually covering it, which need not be the
/// adjacent ring: the player's chunk may sit in a corner of its parent. Vertex spacing
/// depends only on the LOD, so LODs of different rings compare directly.
fn ring_flags(ring: &Ring, index: I64Vec2, cells: Vec2) -> LodFlags {
    let neighbours = [I64Vec2::Y, I64Vec2::X, I64Vec2::NEG_Y, I64Vec2::NEG_X].map(|dir| {
        let center = ((index + dir).as_vec2() + Vec2::splat(0.5)) * ring.chunk_size;
        lod_at(center, cells)
    });
    LodFlags::from_neighbor_lods(ring.lod, neighbours)
}

/// Every chunk request of one frame, innermost ring first.
fn frame_requests(player: Vec3, cell_world_size: f32) -> Vec<ChunkRequest> {
    let cells = world_to_cells(player, cell_world_size);
    let mut requests = Vec::new();
    for (i, ring) in RINGS.iter().enumerate() {
        let (origin, span) = ring.region(cells);
        let player_chunk = chunk_grid_index(cells, ring.chunk_size);
        for dx in 0..span {
            for dy in 0..span {
                let index = origin + I64Vec2::new(dx, dy);
                // Covered by the ring inside.
                if i > 0 && index == player_chunk {
                    continue;
                }
                let steps = (index - player_chunk).abs();
                let active = ring
                    .active_radius
                    .is_some_and(|r| steps.x <= r && steps.y <= r);
                let center = (index.as_vec2() + Vec2::splat(0.5)) * ring.chunk_size;
                requests.push(
                    ChunkRequest::new(ring.chunk_size, center, ring.lod)
                        .with_lod_flags(ring_flags(ring, index, cells))
                        .with_active_grid(active)
                        .with_viewpoint(player)
                        .with_compile(i == 0),
                );
            }
        }
    }
    requests
}

/// Request every chunk of every ring. Returns the number of requests.
fn request_frame(manager: &mut ChunkManager, player: Vec3, cell_world_size: f32) -> usize {
    let requests = frame_requests(player, cell_world_size);
    for request in &requests {
        manager.get_chunk(request);
    }
    requests.len()
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tundra")
    });

    let mut config = TerrainConfig::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        TerrainConfig::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    tundra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        warn!("Invalid configuration ({e}), using defaults");
        config = TerrainConfig::default();
    }

    let params = WorldParams::default();
    let cell_world_size = params.cell_world_size;
    let world = Arc::new(ProceduralWorld::new(params));
    let renderer = Arc::new(CountingRenderer::default());
    let mut manager = ChunkManager::new(world.clone(), renderer.clone(), &config)
        .with_composite_renderer(renderer.clone())
        .with_displacement_renderer(renderer.clone());
    manager.set_worldspace("tundra");

    info!(
        frames = args.frames,
        subdivision = config.subdivision.enabled,
        tessellation = config.cache.tessellation,
        "Starting terrain walk"
    );

    let mut player = Vec3::new(100.0, 100.0, 0.0);
    for frame in 0..args.frames {
        manager.update_cache(frame as f64 * FRAME_TIME as f64);

        player.x += WALK_SPEED * FRAME_TIME;
        player.z = world.height(player.truncate().as_dvec2()) as f32;
        manager.set_player_position(player);
        manager.update_subdivision_tracker(FRAME_TIME);

        let requested = request_frame(&mut manager, player, cell_world_size);

        let interval = config.debug.stats_interval;
        if interval > 0 && frame % interval == 0 {
            let stats = manager.report_stats(frame);
            info!(requested, "{stats}");
        }
    }

    let stats = manager.report_stats(args.frames);
    let (pass_sets, composites, displacements) = renderer.totals();
    info!("{stats}");
    info!(pass_sets, composites, displacements, "Renderer submissions");
}

//! AR marker layout
//!
//! Turns a set of agents plus the viewer's position into overlay positions
//! expressed as viewport percentages. Agents with a GPS fix are projected
//! linearly around the screen centre; the rest are spread over a jittered grid.
//!
//! The projection is deliberately flat: one degree is 111 km on both axes and
//! there is no cos(latitude) correction on longitude. Sort order of existing
//! clients depends on these distances, so keep it that way.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::AgentRecord;

/// Percentage points per degree of offset from the viewer
pub const PROJECTION_SCALE: f64 = 5000.0;
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Safe inset every marker is clamped into
pub const MIN_PERCENT: f64 = 10.0;
pub const MAX_PERCENT: f64 = 90.0;

pub const GRID_MIN_PERCENT: f64 = 15.0;
pub const GRID_MAX_PERCENT: f64 = 85.0;
pub const GRID_JITTER: f64 = 10.0;

/// Range of the stand-in distance used to sort grid-placed markers
pub const SYNTHETIC_DISTANCE_MIN: f64 = 10.0;
pub const SYNTHETIC_DISTANCE_MAX: f64 = 110.0;

pub const DEFAULT_MAX_VISIBLE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl ViewerLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    fn is_valid(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Gps,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenMarker {
    pub agent_id: String,
    pub x: f64,
    pub y: f64,
    pub distance_meters: f64,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkerLayout {
    pub max_visible: usize,
}

impl Default for MarkerLayout {
    fn default() -> Self {
        Self {
            max_visible: DEFAULT_MAX_VISIBLE,
        }
    }
}

impl MarkerLayout {
    pub fn new(max_visible: usize) -> Self {
        Self { max_visible }
    }

    /// Lay out markers nearest first, at most `max_visible` of them.
    ///
    /// `rng` drives the grid jitter and synthetic distances; pass a seeded
    /// `StdRng` for reproducible output.
    pub fn layout<R: Rng + ?Sized>(
        &self,
        agents: &[AgentRecord],
        viewer: Option<ViewerLocation>,
        rng: &mut R,
    ) -> Vec<ScreenMarker> {
        let viewer = viewer.filter(ViewerLocation::is_valid);
        let mut markers = Vec::with_capacity(agents.len());
        let mut unplaced = Vec::new();

        for (index, agent) in agents.iter().enumerate() {
            let agent_id = agent
                .id
                .clone()
                .unwrap_or_else(|| format!("agent-{}", index));

            match (agent.coordinates(), viewer) {
                (Some((lat, lon)), Some(viewer)) => {
                    markers.push(project(agent_id, lat, lon, viewer, agent.distance_meters));
                }
                _ => unplaced.push((agent_id, agent.distance_meters)),
            }
        }

        let gps_count = markers.len();
        markers.extend(grid_markers(unplaced, rng));

        markers.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        markers.truncate(self.max_visible);

        debug!(
            "Laid out {} markers ({} by GPS, {} on grid fallback)",
            markers.len(),
            gps_count,
            agents.len() - gps_count
        );
        markers
    }

    /// Same as [`MarkerLayout::layout`] with a fixed seed
    pub fn layout_seeded(
        &self,
        agents: &[AgentRecord],
        viewer: Option<ViewerLocation>,
        seed: u64,
    ) -> Vec<ScreenMarker> {
        self.layout(agents, viewer, &mut StdRng::seed_from_u64(seed))
    }
}

/// Lay out with the thread-local RNG
pub fn layout_markers(
    agents: &[AgentRecord],
    viewer: Option<ViewerLocation>,
    max_visible: usize,
) -> Vec<ScreenMarker> {
    MarkerLayout::new(max_visible).layout(agents, viewer, &mut rand::thread_rng())
}

fn project(
    agent_id: String,
    lat: f64,
    lon: f64,
    viewer: ViewerLocation,
    known_distance: Option<f64>,
) -> ScreenMarker {
    let lat_diff = lat - viewer.latitude;
    let lon_diff = lon - viewer.longitude;

    let distance_meters = valid_distance(known_distance).unwrap_or_else(|| {
        let dy = lat_diff * METERS_PER_DEGREE;
        let dx = lon_diff * METERS_PER_DEGREE;
        (dx * dx + dy * dy).sqrt()
    });

    ScreenMarker {
        agent_id,
        x: clamp_percent(50.0 + lon_diff * PROJECTION_SCALE),
        y: clamp_percent(50.0 - lat_diff * PROJECTION_SCALE),
        distance_meters,
        placement: Placement::Gps,
    }
}

fn grid_markers<R: Rng + ?Sized>(
    unplaced: Vec<(String, Option<f64>)>,
    rng: &mut R,
) -> Vec<ScreenMarker> {
    let n = unplaced.len();
    if n == 0 {
        return Vec::new();
    }

    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = (n + cols - 1) / cols;
    let span = GRID_MAX_PERCENT - GRID_MIN_PERCENT;

    unplaced
        .into_iter()
        .enumerate()
        .map(|(i, (agent_id, known_distance))| {
            let col = i % cols;
            let row = i / cols;
            let base_x = GRID_MIN_PERCENT + (col as f64 + 0.5) * span / cols as f64;
            let base_y = GRID_MIN_PERCENT + (row as f64 + 0.5) * span / rows as f64;

            let x = clamp_percent(base_x + rng.gen_range(-GRID_JITTER..=GRID_JITTER));
            let y = clamp_percent(base_y + rng.gen_range(-GRID_JITTER..=GRID_JITTER));
            let distance_meters = valid_distance(known_distance).unwrap_or_else(|| {
                rng.gen_range(SYNTHETIC_DISTANCE_MIN..SYNTHETIC_DISTANCE_MAX)
            });

            ScreenMarker {
                agent_id,
                x,
                y,
                distance_meters,
                placement: Placement::Grid,
            }
        })
        .collect()
}

fn valid_distance(distance: Option<f64>) -> Option<f64> {
    distance.filter(|d| d.is_finite() && *d >= 0.0)
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(MIN_PERCENT, MAX_PERCENT)
}

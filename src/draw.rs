use clipterra_renderer::{DrawInstance, TerrainMaterial, TileMesh};

/// Receives the terrain's instanced draws.
pub trait DrawSubmitter {
    /// Draw `mesh` once per instance with `material`. `instances` is only valid for the duration of the call.
    fn draw_instanced(&mut self, material: &TerrainMaterial, mesh: &TileMesh, instances: &[DrawInstance]);
}

/// Records every draw. Useful for tests and for tools that want the instance lists without a GPU.
#[derive(Clone, Debug, Default)]
pub struct RecordedDraws {
    pub draws: Vec<RecordedDraw>,
}

#[derive(Clone, Debug)]
pub struct RecordedDraw {
    pub material: String,
    pub debug_view: bool,
    pub instances: Vec<DrawInstance>,
}

impl DrawSubmitter for RecordedDraws {
    fn draw_instanced(&mut self, material: &TerrainMaterial, _mesh: &TileMesh, instances: &[DrawInstance]) {
        self.draws.push(RecordedDraw {
            material: material.name.clone(),
            debug_view: material.is_debug_view(),
            instances: instances.to_vec(),
        });
    }
}

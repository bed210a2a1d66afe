use crate::assembly::SpentFuelAssembly;
use crate::camera::ComptonCamera;

pub type AssemblyId = usize;
pub type CameraId = usize;

/// Owner of the assemblies and cameras built for a setup, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    assemblies: Vec<SpentFuelAssembly>,
    cameras: Vec<ComptonCamera>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_assembly(&mut self, assembly: SpentFuelAssembly) -> AssemblyId {
        self.assemblies.push(assembly);
        self.assemblies.len() - 1
    }

    pub fn register_camera(&mut self, camera: ComptonCamera) -> CameraId {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    fn assembly_id(&self, name: &str) -> Option<AssemblyId> {
        let id = self.assemblies.iter().position(|a| a.name() == name);
        if id.is_none() {
            tracing::warn!("No SpentFuelAssembly exists named '{}'", name);
        }
        id
    }

    pub fn assembly(&self, name: &str) -> Option<&SpentFuelAssembly> {
        self.assembly_id(name).map(|id| &self.assemblies[id])
    }

    pub fn assembly_mut(&mut self, name: &str) -> Option<&mut SpentFuelAssembly> {
        self.assembly_id(name).map(move |id| &mut self.assemblies[id])
    }

    pub fn camera(&self, name: &str) -> Option<&ComptonCamera> {
        let camera = self.cameras.iter().find(|c| c.name() == name);
        if camera.is_none() {
            tracing::warn!("No ComptonCamera exists named '{}'", name);
        }
        camera
    }

    pub fn assemblies(&self) -> &[SpentFuelAssembly] {
        &self.assemblies
    }

    pub fn cameras(&self) -> &[ComptonCamera] {
        &self.cameras
    }
}
